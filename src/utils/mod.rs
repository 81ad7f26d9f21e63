pub mod csrf;
pub mod jwt;
pub mod password;
pub mod ticket;
