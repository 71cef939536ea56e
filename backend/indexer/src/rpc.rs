//! Soroban RPC client — polls `getEvents` and decodes ledger events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//!
//! ## Payload shapes
//!
//! Events are requested with `"xdrFormat": "json"`, so topics come back as
//! `topicJson` (`[{"symbol": "withdrawn"}, {"u64": "7"}]`) and the payload as
//! `valueJson`. The payload is a `#[contracttype]` struct, rendered as an
//! ScVal map (`{"map": [{"key": {"symbol": "amount"}, "val": {"i128": "5000"}}]}`).
//! [`flatten_sc_val`] turns that into plain JSON (`{"amount": "5000"}`)
//! before fields are read.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, LedgerEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// ScVal type tags that wrap a single value in the JSON encoding.
const SC_TAGS: &[&str] = &[
    "bool", "u32", "i32", "u64", "i64", "timepoint", "duration", "u128", "i128", "u256",
    "i256", "bytes", "string", "symbol", "address",
];

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[allow(dead_code)]
pub struct RawEvent {
    /// Topic list as ScVal JSON
    #[serde(default, alias = "topicJson")]
    pub topic: Vec<Value>,
    /// Event payload as ScVal JSON
    #[serde(default, alias = "valueJson")]
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger` — the ledger sequence to scan from (inclusive).
/// * `cursor`       — optional opaque pagination cursor from a previous response.
/// * `limit`        — maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = next_backoff(backoff);
                continue;
            }
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    warn!("Rate-limited by RPC (will retry in {backoff}s)");
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = next_backoff(backoff);
                    continue;
                }

                let body: RpcResponse = resp.json().await?;

                if let Some(err) = body.error {
                    // Code -32600 / -32601 are hard failures; everything else we retry
                    if err.code == -32600 || err.code == -32601 {
                        return Err(IndexerError::EventParse(format!(
                            "RPC hard error {}: {}",
                            err.code, err.message
                        )));
                    }
                    warn!(
                        "RPC soft error (will retry in {backoff}s): {} {}",
                        err.code, err.message
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = next_backoff(backoff);
                    continue;
                }

                let result = body.result.ok_or_else(|| {
                    IndexerError::EventParse("Empty result from getEvents".to_string())
                })?;

                debug!(
                    "Fetched {} events (latest_ledger={:?})",
                    result.events.len(),
                    result.latest_ledger
                );

                return Ok((result.events, result.cursor, result.latest_ledger));
            }
        }
    }
}

fn next_backoff(current: u64) -> u64 {
    (current * 2).min(MAX_BACKOFF_SECS)
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`LedgerEvent`] structs.
///
/// Events from failed contract calls are dropped: their effects were
/// reverted on chain.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<LedgerEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<LedgerEvent> {
    // Extract leading topic symbol to determine event type.
    let first_topic = raw.topic.first()?;
    let kind = EventKind::from_topic(&extract_symbol(first_topic));

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let data = flatten_sc_val(&raw.value);
    let program_id = raw
        .topic
        .get(1)
        .and_then(extract_topic_id)
        .or_else(|| extract_field(&data, &["program_id"]));

    let (actor, amount, memo) = decode_data(&data, kind);

    let event_id = raw.id.clone().unwrap_or_else(|| {
        format!(
            "{ledger}-{}-{}-{}",
            raw.tx_hash.as_deref().unwrap_or("-"),
            kind.as_str(),
            program_id.as_deref().unwrap_or("-")
        )
    });

    Some(LedgerEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        program_id,
        actor,
        amount,
        memo,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Pull `(actor, amount, memo)` out of a flattened event payload.
fn decode_data(value: &Value, kind: EventKind) -> (Option<String>, Option<String>, Option<String>) {
    match kind {
        EventKind::ProgramCreated => (
            extract_field(value, &["pic"]),
            extract_field(value, &["target"]),
            extract_field(value, &["name"]),
        ),
        EventKind::ProgramUpdated => (None, None, extract_field(value, &["name"])),
        EventKind::ProgramDeactivated => (None, None, extract_field(value, &["previous"])),
        EventKind::ProgramFinished => (None, None, None),
        EventKind::FundSent => (
            extract_field(value, &["donor", "sender", "address"]),
            extract_field(value, &["amount"]),
            None,
        ),
        EventKind::FundAllocated => (None, extract_field(value, &["amount"]), None),
        EventKind::FundWithdrawn => (
            extract_field(value, &["pic", "address"]),
            extract_field(value, &["amount"]),
            extract_field(value, &["history"]),
        ),
        EventKind::OwnerSet => (
            extract_field(value, &["new_owner"]),
            None,
            extract_field(value, &["previous"]),
        ),
        EventKind::Unknown => (None, None, None),
    }
}

/// Convert the ScVal JSON encoding into plain JSON; anything else is returned as is.
pub fn flatten_sc_val(value: &Value) -> Value {
    let obj = match value {
        Value::Object(obj) => obj,
        Value::String(s) if s == "void" => return Value::Null,
        _ => return value.clone(),
    };
    if obj.len() != 1 {
        return value.clone();
    }
    let Some((tag, inner)) = obj.iter().next() else {
        return value.clone();
    };

    match tag.as_str() {
        "map" => {
            let mut flat = Map::new();
            for entry in inner.as_array().into_iter().flatten() {
                let key = entry.get("key").map(flatten_sc_val);
                let val = entry.get("val").map(flatten_sc_val).unwrap_or(Value::Null);
                if let Some(Value::String(key)) = key {
                    flat.insert(key, val);
                }
            }
            Value::Object(flat)
        }
        "vec" => Value::Array(
            inner
                .as_array()
                .map(|items| items.iter().map(flatten_sc_val).collect())
                .unwrap_or_default(),
        ),
        "void" => Value::Null,
        "i128" | "u128" if inner.is_object() => {
            int128_parts(tag, inner).unwrap_or_else(|| value.clone())
        }
        tag if SC_TAGS.contains(&tag) => inner.clone(),
        _ => value.clone(),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(key) {
            let s = match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
            if s.is_some() {
                return s;
            }
        }
    }
    None
}

/// Extract the event name from the leading topic.
/// Accepts `{"symbol":"created"}`, `{"type":"symbol","value":"created"}`
/// or a bare string.
fn extract_symbol(topic: &Value) -> String {
    match topic {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("symbol")
            .or_else(|| obj.get("value"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        other => other.to_string(),
    }
}

/// Extract the program id from the second topic (`{"u64":"7"}`, `{"u64":7}` or bare).
fn extract_topic_id(topic: &Value) -> Option<String> {
    let flat = flatten_sc_val(topic);
    let inner = flat.get("value").unwrap_or(&flat);
    match inner {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 128-bit integers may be rendered as `{"hi": .., "lo": ..}` parts.
fn int128_parts(tag: &str, inner: &Value) -> Option<Value> {
    let hi = inner.get("hi")?;
    let lo = inner.get("lo")?.as_u64()?;
    let joined = match tag {
        "i128" => ((i128::from(hi.as_i64()?) << 64) | i128::from(lo)).to_string(),
        _ => ((u128::from(hi.as_u64()?) << 64) | u128::from(lo)).to_string(),
    };
    Some(Value::String(joined))
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
