use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ritual_api::auth::{self, AppState, AppStateInner};
use ritual_api::generate::{self, GeneratorClient};
use ritual_api::middleware::require_auth;
use ritual_api::{plans, practices, ratings, slots};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ritual=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("RITUAL_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("RITUAL_DB_PATH").unwrap_or_else(|_| "ritual.db".into());
    let host = std::env::var("RITUAL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RITUAL_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = ritual_db::Database::open(&PathBuf::from(&db_path))?;

    // The generator is optional; without GENAI_API_KEY every other
    // route still works.
    let generator = GeneratorClient::from_env();
    if generator.is_none() {
        info!("GENAI_API_KEY not set; practice generator disabled");
    }

    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        generator,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/users", get(auth::get_users))
        .route("/users/{user_id}", get(auth::get_user))
        .route("/practices", get(practices::list_practices))
        .route("/practices", post(practices::create_practice))
        .route("/practices/generate", post(generate::generate_practices))
        .route("/practices/selected", get(practices::list_selected))
        .route("/practices/{practice_id}", get(practices::get_practice))
        .route("/practices/{practice_id}/select", post(practices::select_practice))
        .route("/practices/{practice_id}/select", delete(practices::unselect_practice))
        .route("/plans", post(plans::get_or_create_plan))
        .route("/plans", get(plans::list_plans))
        .route("/plans/{plan_id}/slots/generate", post(slots::generate_slots))
        .route("/slots", get(slots::list_slots))
        .route("/slots/{slot_id}/start", post(slots::start_slot))
        .route("/slots/{slot_id}/finish", post(slots::finish_slot))
        .route("/slots/{slot_id}/rating", post(ratings::create_rating))
        .route("/ratings", get(ratings::list_ratings))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Ritual server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
