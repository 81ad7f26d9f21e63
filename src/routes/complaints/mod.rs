pub mod api;
pub mod assign;
pub mod comments;
pub mod create;
pub mod detail;
pub mod helpers;
pub mod list;
pub mod status;

pub use api::{api_complaints, api_stats};
pub use assign::assign_complaint;
pub use comments::add_comment;
pub use create::{handle_submit, submit_page};
pub use detail::complaint_detail;
pub use list::complaint_list;
pub use status::update_status;
