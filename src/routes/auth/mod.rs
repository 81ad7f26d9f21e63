pub mod claims;
pub mod login;
pub mod logout;
pub mod register;
pub mod session;

pub use login::{handle_login, login_page};
pub use logout::handle_logout;
pub use register::{handle_register, register_page};
pub use session::AuthSession;
