// HTTP request handlers for the MoltyMarket API
//
// Each handler maps one route onto exactly one ledger operation.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::app_state::SharedState;
use crate::error::LedgerError;
use crate::models::*;

type ApiResult<T> = Result<Json<T>, LedgerError>;

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = match &self {
            LedgerError::Validation(_) | LedgerError::MarketClosed(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::AlreadyResolved { .. } => StatusCode::CONFLICT,
            LedgerError::StoreUnavailable(e) => {
                warn!("❌ Ledger store fault: {}", e);
                StatusCode::SERVICE_UNAVAILABLE
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// Malformed or mistyped bodies get the same JSON error shape as every other 400
impl From<JsonRejection> for LedgerError {
    fn from(rejection: JsonRejection) -> Self {
        LedgerError::validation(rejection.body_text())
    }
}

// ===== MARKET ENDPOINTS =====

/// GET /api/v1/markets
pub async fn list_markets(State(state): State<SharedState>) -> ApiResult<MarketListResponse> {
    let markets = state.registry.list()?;
    Ok(Json(MarketListResponse {
        count: markets.len(),
        markets,
    }))
}

/// POST /api/v1/markets
pub async fn create_market(
    State(state): State<SharedState>,
    payload: Result<Json<CreateMarketRequest>, JsonRejection>,
) -> ApiResult<MarketResponse> {
    let Json(payload) = payload?;
    let market = state.registry.create(payload)?;
    Ok(Json(MarketResponse { market }))
}

/// GET /api/v1/markets/:id
pub async fn get_market(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Market> {
    Ok(Json(state.registry.get(&id)?))
}

/// POST /api/v1/markets/:id/vote
pub async fn vote(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<VoteResponse> {
    let Json(payload) = payload?;
    let (market, total_votes) = state.registry.vote(&id, payload.choice.as_deref())?;
    Ok(Json(VoteResponse { market, total_votes }))
}

// ===== BETTING ENDPOINTS =====

/// POST /api/v1/markets/:id/bets
pub async fn place_bet(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<PlaceBetRequest>, JsonRejection>,
) -> ApiResult<PlaceBetResponse> {
    let Json(payload) = payload?;
    let (bet, market) = state.bet_book.place_bet(&id, payload)?;
    Ok(Json(PlaceBetResponse { bet, market }))
}

/// GET /api/v1/markets/:id/bets
pub async fn list_bets(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<BetListResponse> {
    let bets = state.bet_book.list_bets(&id)?;
    Ok(Json(BetListResponse { bets }))
}

// ===== SETTLEMENT ENDPOINTS =====

/// POST /api/v1/markets/:id/resolve
pub async fn resolve_market(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> ApiResult<ResolveResponse> {
    let Json(payload) = payload?;
    let resolution = state.settlement.resolve(&id, payload.outcome.as_deref())?;
    Ok(Json(ResolveResponse {
        market: resolution.market,
        total_winners: resolution.winners,
    }))
}

// ===== HEALTH CHECK =====

pub async fn health_check(State(state): State<SharedState>) -> ApiResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok",
        markets: state.registry.count()?,
        bets: state.bet_book.count()?,
        store: state.store.backend(),
        timestamp: Utc::now(),
    }))
}
