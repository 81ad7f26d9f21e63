pub mod category_repository;
pub mod complaint_repository;
pub mod mock_db;
pub mod postgres_category_repository;
pub mod postgres_complaint_repository;
pub mod postgres_user_repository;
pub mod user_repository;
