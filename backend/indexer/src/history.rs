//! Ledger views rebuilt from indexed events.
//!
//! The contract keeps the authoritative state; these views let clients
//! read history without re-scanning contract storage. Amounts are summed as
//! `i128` to match the on-chain type.

use serde::Serialize;

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, EventRecord};

/// One withdrawal as seen through its `withdrawn` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalEntry {
    pub ledger: i64,
    pub timestamp: i64,
    pub pic: Option<String>,
    pub history: Option<String>,
    pub amount: String,
    pub tx_hash: Option<String>,
}

/// Lifetime totals reconstructed from events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub programs_created: u64,
    pub donations: u64,
    #[serde(serialize_with = "as_string")]
    pub total_donated: i128,
    #[serde(serialize_with = "as_string")]
    pub total_allocated: i128,
    #[serde(serialize_with = "as_string")]
    pub total_withdrawn: i128,
    #[serde(serialize_with = "as_string")]
    pub remaining_for_allocation: i128,
}

impl LedgerStats {
    pub fn from_events(events: &[EventRecord]) -> Result<Self> {
        let mut stats = LedgerStats::default();
        for ev in events {
            match ev.event_type.as_str() {
                "program_created" => stats.programs_created += 1,
                "fund_sent" => {
                    stats.donations += 1;
                    stats.total_donated = add(stats.total_donated, ev)?;
                }
                "fund_allocated" => stats.total_allocated = add(stats.total_allocated, ev)?,
                "fund_withdrawn" => stats.total_withdrawn = add(stats.total_withdrawn, ev)?,
                _ => {}
            }
        }
        stats.remaining_for_allocation = stats
            .total_donated
            .checked_sub(stats.total_allocated)
            .ok_or(IndexerError::Overflow("remaining_for_allocation"))?;
        Ok(stats)
    }
}

/// Turn a program's `fund_withdrawn` events into its audit trail.
pub fn withdrawals(events: &[EventRecord]) -> Result<(Vec<WithdrawalEntry>, i128)> {
    let mut total = 0i128;
    let mut entries = Vec::with_capacity(events.len());
    for ev in events
        .iter()
        .filter(|ev| ev.event_type == EventKind::FundWithdrawn.as_str())
    {
        total = add(total, ev)?;
        entries.push(WithdrawalEntry {
            ledger: ev.ledger,
            timestamp: ev.timestamp,
            pic: ev.actor.clone(),
            history: ev.memo.clone(),
            amount: ev.amount.clone().unwrap_or_default(),
            tx_hash: ev.tx_hash.clone(),
        });
    }
    Ok((entries, total))
}

fn add(total: i128, ev: &EventRecord) -> Result<i128> {
    let raw = ev.amount.as_deref().unwrap_or("");
    raw.parse::<i128>()
        .ok()
        .and_then(|amount| total.checked_add(amount))
        .ok_or_else(|| IndexerError::Amount {
            event_id: ev.event_id.clone(),
            value: raw.to_string(),
        })
}

fn as_string<S: serde::Serializer>(value: &i128, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
