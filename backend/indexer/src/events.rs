//! Canonical event types emitted by the Fundraisers ledger contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/fundraisers/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the ledger contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A program was registered (`created` topic).
    ProgramCreated,
    /// A registered program's details changed (`updated` topic).
    ProgramUpdated,
    /// A program was switched off (`deactvtd` topic).
    ProgramDeactivated,
    /// A fully drawn program was closed (`finished` topic).
    ProgramFinished,
    /// A donation entered the pool (`fund_sent` topic).
    FundSent,
    /// Pooled funds were earmarked to a program (`allocated` topic).
    FundAllocated,
    /// A PIC withdrew part of an allocation (`withdrawn` topic).
    FundWithdrawn,
    /// Ownership was set, transferred or renounced (`owner_set` topic).
    OwnerSet,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::ProgramCreated,
            "updated" => Self::ProgramUpdated,
            "deactvtd" => Self::ProgramDeactivated,
            "finished" => Self::ProgramFinished,
            "fund_sent" => Self::FundSent,
            "allocated" => Self::FundAllocated,
            "withdrawn" => Self::FundWithdrawn,
            "owner_set" => Self::OwnerSet,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgramCreated => "program_created",
            Self::ProgramUpdated => "program_updated",
            Self::ProgramDeactivated => "program_deactivated",
            Self::ProgramFinished => "program_finished",
            Self::FundSent => "fund_sent",
            Self::FundAllocated => "fund_allocated",
            Self::FundWithdrawn => "fund_withdrawn",
            Self::OwnerSet => "owner_set",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded ledger event, ready to be stored in the database.
///
/// `amount` is kept as a decimal string: token amounts are `i128` on chain
/// and do not fit SQLite's 64-bit integers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// RPC event id; unique per contract event.
    pub event_id: String,
    pub event_type: String,
    pub program_id: Option<String>,
    /// Donor, PIC or new owner, depending on the kind.
    pub actor: Option<String>,
    pub amount: Option<String>,
    /// Withdrawal justification or program name.
    pub memo: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub program_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub memo: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}
