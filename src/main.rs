mod config;
mod db;
mod models;
mod responses;
mod routes;
mod services;
mod state;
pub mod utils;

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::{
    http::HeaderName,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use config::Config;
use db::postgres_category_repository::PostgresCategoryRepository;
use db::postgres_complaint_repository::PostgresComplaintRepository;
use db::postgres_user_repository::PostgresUserRepository;
use responses::JsonResponse;
use routes::auth::{handle_login, handle_logout, handle_register, login_page, register_page};
use routes::{
    complaints::{
        add_comment, api_complaints, api_stats, assign_complaint, complaint_detail,
        complaint_list, handle_submit, submit_page, update_status,
    },
    dashboard::dashboard,
};
use services::attachments::{AttachmentStore, ATTACHMENT_SUBDIR};
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utils::csrf::{get_csrf_token, validate_csrf, CSRF_HEADER};
use utils::jwt::JwtKeys;

use crate::db::{
    category_repository::CategoryRepository, complaint_repository::ComplaintRepository,
    user_repository::UserRepository,
};
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rate_limit_ms: u64 = std::env::var("RATE_LIMITER_MILLISECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        // Default: 200ms/token (~5 req/sec)
        .unwrap_or(200);
    let rate_limit_burst: u32 = std::env::var("RATE_LIMITER_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        // Default: allow short bursts during client polling
        .unwrap_or(20);
    let global_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(rate_limit_ms)
            .burst_size(rate_limit_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
                .into_response()
            })
            .finish()
            .unwrap(),
    );

    // Background task to cleanup old IPs
    let governor_limiter = global_governor_conf.limiter().clone();
    std::thread::spawn(move || {
        let interval = std::time::Duration::from_secs(60);
        loop {
            std::thread::sleep(interval);
            governor_limiter.retain_recent();
        }
    });

    let rate_limit_auth_s: u64 = std::env::var("RATE_LIMITER_AUTH_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(1);
    let rate_limit_auth_burst: u32 = std::env::var("RATE_LIMITER_AUTH_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(10);
    // Stricter limiter for the credential endpoints
    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(rate_limit_auth_s)
            .burst_size(rate_limit_auth_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
                .into_response()
            })
            .finish()
            .unwrap(),
    );

    let config = Arc::new(Config::from_env());

    let pg_pool = establish_connection(&config.database_url).await;
    sqlx::migrate!()
        .run(&pg_pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_keys = Arc::new(JwtKeys::from_env().expect("Failed to load JWT secret"));

    std::fs::create_dir_all(config.attachment_dir.join(ATTACHMENT_SUBDIR))
        .expect("Failed to create attachment directory");

    let user_repo = Arc::new(PostgresUserRepository {
        pool: pg_pool.clone(),
    }) as Arc<dyn UserRepository>;

    let complaint_repo = Arc::new(PostgresComplaintRepository {
        pool: pg_pool.clone(),
    }) as Arc<dyn ComplaintRepository>;

    let category_repo = Arc::new(PostgresCategoryRepository {
        pool: pg_pool.clone(),
    }) as Arc<dyn CategoryRepository>;

    let state = AppState {
        users: user_repo,
        complaints: complaint_repo,
        categories: category_repo,
        attachments: Arc::new(AttachmentStore::new(&config.attachment_dir)),
        jwt_keys,
        config: config.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)])
        .allow_credentials(true);

    // Double-submit cookie check on every unsafe method
    let csrf_layer = ServiceBuilder::new().layer(axum::middleware::from_fn(validate_csrf));

    // Credential endpoints sit behind the stricter limiter
    let auth_routes = Router::new()
        .route("/login/", get(login_page).post(handle_login))
        .route("/register/", get(register_page).post(handle_register))
        .layer(GovernorLayer {
            config: auth_governor_conf.clone(),
        });

    let app = Router::new()
        .route("/", get(root))
        .route("/logout/", get(handle_logout))
        .route("/dashboard/", get(dashboard))
        .route("/complaints/", get(complaint_list))
        .route("/complaint/create/", get(submit_page).post(handle_submit))
        .route("/complaint/{ticket_number}/", get(complaint_detail))
        .route("/api/complaints/", get(api_complaints))
        .route("/api/stats/", get(api_stats))
        .route("/api/complaint/{ticket_number}/status/", post(update_status))
        .route(
            "/api/complaint/{ticket_number}/assign/",
            post(assign_complaint),
        )
        .route("/api/complaint/{ticket_number}/comment/", post(add_comment))
        .route("/api/csrf/", get(get_csrf_token))
        .merge(auth_routes)
        .with_state(state)
        .layer(csrf_layer)
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer {
            config: global_governor_conf.clone(),
        })
        .layer(cors);

    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let addr = config.bind_addr;

    let listener = TcpListener::bind(addr).await.unwrap();
    println!("Listening at http://{}", addr);
    axum::serve(listener, make_service).await.unwrap();
}

/// A simple root route.
async fn root() -> Response {
    JsonResponse::success("Hello, CompDesk!").into_response()
}

/// Establish a connection to the database and verify it.
async fn establish_connection(database_url: &str) -> PgPool {
    let pool = PgPool::connect(database_url)
        .await
        .expect("Failed to connect to the database");

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .expect("Failed to verify database connection");

    info!("✅ Successfully connected to the database");
    pool
}
