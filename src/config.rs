use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub struct Config {
    pub database_url: String,
    pub frontend_origin: String,
    pub bind_addr: SocketAddr,
    pub attachment_dir: PathBuf,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok(); // Load .env file

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let frontend_origin = env::var("FRONTEND_ORIGIN").expect("FRONTEND_ORIGIN must be set");

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .expect("BIND_ADDR must be a host:port pair");

        let attachment_dir = env::var("ATTACHMENT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Config {
            database_url,
            frontend_origin,
            bind_addr,
            attachment_dir,
            cookie_secure,
        }
    }
}
