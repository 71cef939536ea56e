//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::{EventKind, EventRecord};
use crate::history::{self, LedgerStats, WithdrawalEntry};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProgramEventsResponse {
    pub program_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct WithdrawalsResponse {
    pub program_id: String,
    pub count: usize,
    /// Sum of all withdrawals, as a decimal string.
    pub total_withdrawn: String,
    pub withdrawals: Vec<WithdrawalEntry>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn internal_error(e: IndexerError) -> Response {
    error!("API request failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
///
/// Returns every indexed event, oldest first.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => Json(AllEventsResponse {
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /programs/:id/events`
pub async fn get_program_events(
    State(state): State<Arc<ApiState>>,
    Path(program_id): Path<String>,
) -> Response {
    match db::get_events_for_program(&state.pool, &program_id).await {
        Ok(events) => Json(ProgramEventsResponse {
            program_id,
            count: events.len(),
            events,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /programs/:id/withdrawals`
///
/// The program's withdrawal trail in the order the withdrawals happened.
pub async fn get_program_withdrawals(
    State(state): State<Arc<ApiState>>,
    Path(program_id): Path<String>,
) -> Response {
    let events = match db::get_program_events_of_type(
        &state.pool,
        &program_id,
        EventKind::FundWithdrawn.as_str(),
    )
    .await
    {
        Ok(events) => events,
        Err(e) => return internal_error(e),
    };

    match history::withdrawals(&events) {
        Ok((withdrawals, total)) => Json(WithdrawalsResponse {
            program_id,
            count: withdrawals.len(),
            total_withdrawn: total.to_string(),
            withdrawals,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// `GET /stats`
///
/// Pool totals rebuilt from the indexed events.
pub async fn get_stats(State(state): State<Arc<ApiState>>) -> Response {
    let stats = db::get_all_events(&state.pool)
        .await
        .and_then(|events| LedgerStats::from_events(&events));
    match stats {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => internal_error(e),
    }
}
