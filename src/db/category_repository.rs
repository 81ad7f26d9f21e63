use async_trait::async_trait;
use uuid::Uuid;

use crate::models::category::Category;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error>;
    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<Category>, sqlx::Error>;
}
