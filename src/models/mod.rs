pub mod category;
pub mod comment;
pub mod complaint;
pub mod forms;
pub mod history;
pub mod timestamps;
pub mod user;
