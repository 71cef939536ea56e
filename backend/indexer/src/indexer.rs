//! Background task that polls the Soroban RPC and writes decoded
//! fundraisers ledger events to the database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Run the polling loop until `shutdown` is cancelled.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(contract = %state.config.contract_id, "Indexer starting");

    let last_ledger = match db::get_last_ledger(&state.pool).await {
        Ok(v) => v,
        Err(e) => {
            warn!("Could not read saved ledger, starting fresh: {e}");
            0
        }
    };
    let mut cursor = match db::get_cursor_string(&state.pool).await {
        Ok(v) => v,
        Err(e) => {
            warn!("Could not read saved cursor: {e}");
            None
        }
    };

    let mut current_ledger = resume_ledger(last_ledger, state.config.start_ledger);
    info!("Resuming from ledger {current_ledger}");

    let interval = Duration::from_secs(state.config.poll_interval_secs);
    loop {
        let polled = tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = poll_once(&state, current_ledger, cursor.as_deref()) => polled,
        };

        match polled {
            Ok((next_ledger, next_cursor)) => {
                current_ledger = next_ledger;
                cursor = next_cursor;
            }
            Err(e) => error!("Indexer poll error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!(ledger = current_ledger, "Indexer stopped");
}

/// Pick the ledger to scan from: the saved one if any, else the configured start.
fn resume_ledger(saved: i64, configured: u32) -> u32 {
    u32::try_from(saved)
        .ok()
        .filter(|&l| l > 0)
        .unwrap_or(configured)
}

/// Perform a single poll iteration.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
    state: &IndexerState,
    start_ledger: u32,
    cursor: Option<&str>,
) -> Result<(u32, Option<String>)> {
    let config = &state.config;
    let (raw_events, next_cursor, latest_ledger) = rpc::fetch_events(
        &state.client,
        &config.rpc_url,
        &config.contract_id,
        start_ledger,
        cursor,
        config.events_per_page,
    )
    .await?;

    if !raw_events.is_empty() {
        let decoded = rpc::decode_events(&raw_events, &config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(
            raw = raw_events.len(),
            decoded = decoded.len(),
            inserted,
            "Stored ledger events"
        );
    }

    let next_ledger = next_start(start_ledger, latest_ledger);

    // Persist before returning so a restart resumes from the same point.
    db::save_cursor(&state.pool, i64::from(next_ledger), next_cursor.as_deref()).await?;

    Ok((next_ledger, next_cursor))
}

/// The scan start never moves backwards, even if the RPC reports an older tip.
fn next_start(start_ledger: u32, latest_ledger: Option<u64>) -> u32 {
    latest_ledger
        .and_then(|l| u32::try_from(l).ok())
        .map_or(start_ledger, |l| l.max(start_ledger))
}
