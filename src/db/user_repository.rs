use async_trait::async_trait;
use uuid::Uuid;

use crate::models::user::{NewUser, PublicUser, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;
    async fn find_public_user_by_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PublicUser>, sqlx::Error>;
    async fn is_username_taken(&self, username: &str) -> Result<bool, sqlx::Error>;
    async fn create_user(
        &self,
        payload: &NewUser,
        password_hash: &str,
    ) -> Result<User, sqlx::Error>;
}
