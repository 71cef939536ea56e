//! # Types
//!
//! Shared data structures used across all modules of the Fundraisers ledger.
//!
//! ## Design decisions
//!
//! ### Details / State split
//!
//! A `Program` is internally stored as two separate ledger entries:
//!
//! - [`ProgramDetails`] — descriptive fields, `target` and `pic`; rewritten
//!   only by `update_program`.
//! - [`ProgramState`] — `status` and `allocated`; rewritten by every
//!   fund-moving call.
//!
//! The public API exposes the reconstructed [`Program`] struct for convenience.
//!
//! ### Status as a Finite-State Machine
//!
//! ```text
//! create ──► Registered ──► Allocated ──► Finished
//!                │               │            │
//!                └───────────────┴────────────┴──► Inactive
//! ```
//!
//! `Inactive` is reachable from every state and has no outgoing transition.

use soroban_sdk::{contracttype, Address, String};

/// Lifecycle status of a program.
///
/// Discriminants are part of the public interface and never change.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ProgramStatus {
    /// Switched off by the admin; terminal.
    Inactive = 0,
    /// Created; waiting for an allocation.
    Registered = 1,
    /// Pooled funds earmarked; the PIC may withdraw.
    Allocated = 2,
    /// Allocation fully drawn and closed by the admin.
    Finished = 3,
}

/// Caller-supplied fields for `create_program` and `update_program`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramInput {
    pub name: String,
    pub pic_name: String,
    pub target: i128,
    pub desc: String,
    pub pic: Address,
    pub category: String,
    pub program_link: String,
    pub photo_url: String,
}

/// Descriptive program data plus the funding target and PIC.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramDetails {
    pub id: u64,
    pub name: String,
    pub pic_name: String,
    pub target: i128,
    pub desc: String,
    pub pic: Address,
    pub category: String,
    pub program_link: String,
    pub photo_url: String,
}

/// Mutable accounting state, updated on allocation and withdrawal.
///
/// Kept small so that frequent writes (withdrawals) are cheap.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramState {
    pub status: ProgramStatus,
    pub allocated: i128,
}

/// Full on-chain representation of a fundraising program.
///
/// Used as the public API return type; reconstructed internally from
/// the split `ProgramDetails` + `ProgramState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Program {
    /// Sequential identifier, assigned at creation.
    pub id: u64,
    pub name: String,
    /// Display name of the person in charge.
    pub pic_name: String,
    /// Amount the program aims to raise, in the token's smallest unit.
    pub target: i128,
    pub desc: String,
    /// Address allowed to withdraw the program's allocation.
    pub pic: Address,
    /// Current lifecycle status.
    pub status: ProgramStatus,
    /// Allocated and not yet withdrawn.
    pub allocated: i128,
    /// Informational only; not validated against a closed set.
    pub category: String,
    pub program_link: String,
    pub photo_url: String,
}

impl Program {
    pub fn from_parts(details: ProgramDetails, state: ProgramState) -> Self {
        Program {
            id: details.id,
            name: details.name,
            pic_name: details.pic_name,
            target: details.target,
            desc: details.desc,
            pic: details.pic,
            status: state.status,
            allocated: state.allocated,
            category: details.category,
            program_link: details.program_link,
            photo_url: details.photo_url,
        }
    }
}

/// One entry of a program's withdrawal audit trail. Never mutated.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalRecord {
    /// Ledger close time of the withdrawal, in seconds.
    pub timestamp: u64,
    /// Justification supplied by the PIC.
    pub history: String,
    pub amount: i128,
}

/// Snapshot of the pooled-fund counters.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundStatus {
    /// Lifetime donations received.
    pub total_managed: i128,
    /// Lifetime amount earmarked to programs.
    pub total_allocated: i128,
    /// `total_managed - total_allocated`.
    pub remaining_for_allocation: i128,
    /// Donation tokens currently held by the ledger.
    pub contract_balance: i128,
}
