mod agent;
mod db;
mod errors;
mod feed;
mod models;
mod routes;
mod service;
mod state;

use anyhow::Context;
use axum::{routing::get, routing::post, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::CompletionAgentService;
use crate::db::message_repository::MessageRepository;
use crate::db::room_repository::RoomRepository;
use crate::db::session_repository::SessionRepository;
use crate::db::user_repository::UserRepository;
use crate::feed::FeedHub;
use crate::routes::api_routes::{create_room_handler, list_messages_handler, list_rooms_handler};
use crate::routes::auth_routes::{login_handler, logout_handler, register_handler};
use crate::routes::ws_routes::{room_ws_handler, rooms_ws_handler};
use crate::service::auth_service::AuthService;
use crate::service::chat_service::ChatService;
use crate::service::room_service::RoomService;
use crate::state::AppState;

const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,tower_http=debug".into()),
        )
        .init();

    // ── Database ──────────────────────────────────────────────────────────────
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set (copy .env.example to .env)")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!("Database connection established and migrations applied");

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let api_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY must be set for the completion provider")?;
    let base_url = std::env::var("OPENAI_API_BASE_URL").ok();
    let model = std::env::var("PARLEY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

    let feed = FeedHub::new();
    let auth = AuthService::new(UserRepository::new(pool.clone()), SessionRepository::new(pool.clone()));
    let rooms = RoomService::new(RoomRepository::new(pool.clone()), feed.clone());
    let agent = CompletionAgentService::new(&api_key, base_url.as_deref(), &model)
        .context("Failed to build completion agent")?;
    let chat = ChatService::new(
        rooms.clone(),
        MessageRepository::new(pool.clone()),
        agent,
        feed.clone(),
    );

    let app_state = AppState { auth, rooms, chat, feed };

    // ── Router ────────────────────────────────────────────────────────────────
    let app = Router::new()
        // Auth
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        // Rooms & messages
        .route("/api/rooms", get(list_rooms_handler).post(create_room_handler))
        .route("/api/rooms/{id}/messages", get(list_messages_handler))
        // Live feeds
        .route("/ws/rooms", get(rooms_ws_handler))
        .route("/ws/rooms/{id}", get(room_ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // ── Listen ────────────────────────────────────────────────────────────────
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
