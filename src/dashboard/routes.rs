//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is the shared engine handle; the
//! handlers do nothing but translate HTTP to engine commands and map
//! game errors onto status codes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::GameEngine;
use crate::types::{CashOutReceipt, GameError, HistoryEntry, TableSnapshot};

pub type AppState = Arc<GameEngine>;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PlaceBetRequest {
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Game errors as HTTP responses: validation failures are 400, state
/// conflicts (wrong round/bet state) are 409.
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0 {
            GameError::InvalidAmount { .. } | GameError::InsufficientBalance { .. } => {
                StatusCode::BAD_REQUEST
            }
            GameError::RoundInProgress
            | GameError::AlreadyRunning
            | GameError::NoActiveBet
            | GameError::RoundNotRunning => StatusCode::CONFLICT,
        };
        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(engine): State<AppState>) -> Json<TableSnapshot> {
    Json(engine.snapshot().await)
}

/// GET /api/history
pub async fn get_history(State(engine): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(engine.history().await)
}

/// POST /api/bet
pub async fn place_bet(
    State(engine): State<AppState>,
    Json(req): Json<PlaceBetRequest>,
) -> Result<Json<TableSnapshot>, ApiError> {
    let snapshot = engine.place_bet(req.amount).await?;
    Ok(Json(snapshot))
}

/// POST /api/cashout
pub async fn cash_out(State(engine): State<AppState>) -> Result<Json<CashOutReceipt>, ApiError> {
    let receipt = engine.cash_out().await?;
    Ok(Json(receipt))
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}
