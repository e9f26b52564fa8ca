// Routes module - wires every HTTP endpoint onto its handler

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;

/// Endpoint table, printed at startup
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/v1/markets", "List all prediction markets"),
    ("POST", "/api/v1/markets", "Create new market"),
    ("GET", "/api/v1/markets/:id", "Get market details"),
    ("POST", "/api/v1/markets/:id/bets", "Place bet"),
    ("GET", "/api/v1/markets/:id/bets", "List bets on a market"),
    ("POST", "/api/v1/markets/:id/resolve", "Resolve market and pay winners"),
    ("POST", "/api/v1/markets/:id/vote", "Cast a sentiment vote"),
    ("GET", "/health", "Health check"),
];

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // ===== CORE MARKET ENDPOINTS =====
        .route("/api/v1/markets", get(list_markets).post(create_market))
        .route("/api/v1/markets/:id", get(get_market))
        .route("/api/v1/markets/:id/vote", post(vote))
        // ===== BETTING ENDPOINTS =====
        .route("/api/v1/markets/:id/bets", get(list_bets).post(place_bet))
        // ===== SETTLEMENT ENDPOINTS =====
        .route("/api/v1/markets/:id/resolve", post(resolve_market))
        // ===== HEALTH CHECK =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
