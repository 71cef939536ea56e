//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the ledger:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key              | Type      | Description                           |
//! |------------------|-----------|---------------------------------------|
//! | `Owner`          | `Address` | Admin; absent once renounced          |
//! | `DonationToken`  | `Address` | Token pulled on donation, set once    |
//! | `ProgramCount`   | `u64`     | Auto-increment program ID counter     |
//! | `TotalManaged`   | `i128`    | Lifetime donations received           |
//! | `TotalAllocated` | `i128`    | Lifetime amount allocated to programs |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                 | Type               | Description                        |
//! |---------------------|--------------------|------------------------------------|
//! | `ProgDetails(id)`   | `ProgramDetails`   | Descriptive fields, target, PIC    |
//! | `ProgState(id)`     | `ProgramState`     | Status and remaining allocation    |
//! | `HistoryLen(id)`    | `u32`              | Number of withdrawal records       |
//! | `History(id, i)`    | `WithdrawalRecord` | The `i`-th withdrawal of program   |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! The withdrawal log is append-only: nothing in this module rewrites or
//! removes a `History` entry once written.

use soroban_sdk::{contracttype, panic_with_error, Address, Env, Vec};

use crate::types::{Program, ProgramDetails, ProgramState, WithdrawalRecord};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Administrative address (Instance).
    Owner,
    /// Donation token contract (Instance).
    DonationToken,
    /// Global auto-increment counter for program IDs (Instance).
    ProgramCount,
    /// Lifetime inflow of donations (Instance).
    TotalManaged,
    /// Lifetime allocations (Instance).
    TotalAllocated,
    /// Program details keyed by ID (Persistent).
    ProgDetails(u64),
    /// Program accounting state keyed by ID (Persistent).
    ProgState(u64),
    /// Withdrawal log length keyed by program ID (Persistent).
    HistoryLen(u64),
    /// Withdrawal log entry keyed by program ID and position (Persistent).
    History(u64, u32),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// The donation token is written exactly once, by `init`.
pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::DonationToken)
}

pub fn set_donation_token(env: &Env, token: &Address) {
    env.storage()
        .instance()
        .set(&DataKey::DonationToken, token);
    bump_instance(env);
}

/// Panics with `Error::NotInitialized` before `init`.
pub fn get_donation_token(env: &Env) -> Address {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::DonationToken)
        .unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
}

pub fn set_owner(env: &Env, owner: &Address) {
    env.storage().instance().set(&DataKey::Owner, owner);
    bump_instance(env);
}

/// Drop the owner entry; admin-only calls are disabled from then on.
pub fn remove_owner(env: &Env) {
    env.storage().instance().remove(&DataKey::Owner);
    bump_instance(env);
}

/// Current owner, or `None` once ownership has been renounced.
pub fn get_owner(env: &Env) -> Option<Address> {
    bump_instance(env);
    env.storage().instance().get(&DataKey::Owner)
}

/// Atomically reads, increments, and stores the program counter.
/// Returns the ID to use for the *current* program (pre-increment value).
pub fn get_and_increment_program_id(env: &Env) -> u64 {
    bump_instance(env);
    let current = program_count(env);
    let next = current
        .checked_add(1)
        .unwrap_or_else(|| panic_with_error!(env, Error::Overflow));
    env.storage()
        .instance()
        .set(&DataKey::ProgramCount, &next);
    current
}

/// Number of programs ever created. IDs are `0..program_count`.
pub fn program_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::ProgramCount)
        .unwrap_or(0)
}

pub fn total_managed(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalManaged)
        .unwrap_or(0)
}

pub fn total_allocated(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalAllocated)
        .unwrap_or(0)
}

/// Add a donation to the lifetime inflow. Returns the new total.
pub fn add_total_managed(env: &Env, amount: i128) -> i128 {
    let total = checked_add(env, total_managed(env), amount);
    env.storage()
        .instance()
        .set(&DataKey::TotalManaged, &total);
    bump_instance(env);
    total
}

/// Add an allocation to the lifetime allocated total. Returns the new total.
pub fn add_total_allocated(env: &Env, amount: i128) -> i128 {
    let total = checked_add(env, total_allocated(env), amount);
    env.storage()
        .instance()
        .set(&DataKey::TotalAllocated, &total);
    bump_instance(env);
    total
}

pub fn checked_add(env: &Env, a: i128, b: i128) -> i128 {
    a.checked_add(b)
        .unwrap_or_else(|| panic_with_error!(env, Error::Overflow))
}

pub fn checked_sub(env: &Env, a: i128, b: i128) -> i128 {
    a.checked_sub(b)
        .unwrap_or_else(|| panic_with_error!(env, Error::Overflow))
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Save details and initial state for a new program.
pub fn save_program(env: &Env, details: &ProgramDetails, state: &ProgramState) {
    save_program_details(env, details);
    save_program_state(env, details.id, state);
}

/// Load the full `Program` by combining details and state.
/// Panics with `Error::ProgramNotFound` if the program does not exist.
pub fn load_program(env: &Env, id: u64) -> Program {
    let details = load_program_details(env, id);
    let state = load_program_state(env, id);
    Program::from_parts(details, state)
}

pub fn load_program_details(env: &Env, id: u64) -> ProgramDetails {
    let key = DataKey::ProgDetails(id);
    let details: ProgramDetails = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| panic_with_error!(env, Error::ProgramNotFound));
    bump_persistent(env, &key);
    details
}

pub fn load_program_state(env: &Env, id: u64) -> ProgramState {
    let key = DataKey::ProgState(id);
    let state: ProgramState = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| panic_with_error!(env, Error::ProgramNotFound));
    bump_persistent(env, &key);
    state
}

pub fn save_program_details(env: &Env, details: &ProgramDetails) {
    let key = DataKey::ProgDetails(details.id);
    env.storage().persistent().set(&key, details);
    bump_persistent(env, &key);
}

pub fn save_program_state(env: &Env, id: u64, state: &ProgramState) {
    let key = DataKey::ProgState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

// ── Withdrawal log ───────────────────────────────────────────────────

pub fn history_len(env: &Env, program_id: u64) -> u32 {
    let key = DataKey::HistoryLen(program_id);
    let len: u32 = env.storage().persistent().get(&key).unwrap_or(0);
    if len > 0 {
        bump_persistent(env, &key);
    }
    len
}

/// Append `record` to the program's log and return its position.
pub fn push_withdrawal(env: &Env, program_id: u64, record: &WithdrawalRecord) -> u32 {
    let index = history_len(env, program_id);
    let entry_key = DataKey::History(program_id, index);
    env.storage().persistent().set(&entry_key, record);
    bump_persistent(env, &entry_key);

    let len_key = DataKey::HistoryLen(program_id);
    let next = index
        .checked_add(1)
        .unwrap_or_else(|| panic_with_error!(env, Error::Overflow));
    env.storage().persistent().set(&len_key, &next);
    bump_persistent(env, &len_key);
    index
}

/// All withdrawal records of a program, oldest first.
pub fn load_history(env: &Env, program_id: u64) -> Vec<WithdrawalRecord> {
    let mut records = Vec::new(env);
    for index in 0..history_len(env, program_id) {
        let key = DataKey::History(program_id, index);
        if let Some(record) = env.storage().persistent().get(&key) {
            bump_persistent(env, &key);
            records.push_back(record);
        }
    }
    records
}
