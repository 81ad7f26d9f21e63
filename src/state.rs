use crate::config::Config;
use crate::db::{
    category_repository::CategoryRepository, complaint_repository::ComplaintRepository,
    user_repository::UserRepository,
};
use crate::services::attachments::AttachmentStore;
use crate::utils::jwt::JwtKeys;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub complaints: Arc<dyn ComplaintRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub attachments: Arc<AttachmentStore>,
    pub jwt_keys: Arc<JwtKeys>,
    pub config: Arc<Config>,
}
