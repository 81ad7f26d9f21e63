pub mod auth;
pub mod complaints;
pub mod dashboard;
