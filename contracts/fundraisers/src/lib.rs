//! # Fundraisers Ledger Contract
//!
//! A pooled-donation ledger. Donors send a single donation token into a shared
//! pool; the admin earmarks pooled funds to individual programs; each
//! program's Person In Charge (PIC) withdraws against that allocation with a
//! recorded justification.
//!
//! | Phase        | Entry Point(s)                                                  |
//! |--------------|-----------------------------------------------------------------|
//! | Bootstrap    | [`Fundraisers::init`]                                           |
//! | Ownership    | `transfer_ownership`, `renounce_ownership`                      |
//! | Programs     | `create_program`, `update_program`, `deactivate_program`, `mark_program_as_finished` |
//! | Funding      | [`Fundraisers::send_fund`]                                      |
//! | Allocation   | [`Fundraisers::allocate_fund`]                                  |
//! | Withdrawal   | [`Fundraisers::withdraw_fund`]                                  |
//! | Queries      | `get_all_programs`, `get_program`, `get_program_history`, `get_fund_status`, ... |
//!
//! ## Accounting
//!
//! `total_managed_fund` is lifetime inflow and `total_allocated` is lifetime
//! allocation; both only grow. The pool available for new allocations is
//! their difference, and an allocation moves exactly one program's `target`
//! out of it. A program's `allocated` balance only shrinks afterwards, via
//! withdrawals.
//!
//! ## Architecture
//!
//! Authorization lives in [`access`], storage layout in [`storage`], event
//! payloads in [`events`]. This file holds the entry points and the
//! transition rules.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, token, Address, Env, String, Vec,
};

mod access;
pub mod events;
mod storage;
mod types;

#[cfg(test)]
mod test_fund_accounting;

pub use types::{FundStatus, Program, ProgramInput, ProgramStatus, WithdrawalRecord};
use types::{ProgramDetails, ProgramState};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized         = 1,
    NotInitialized             = 2,
    NotAdmin                   = 3,
    NotPic                     = 4,
    ProgramNotFound            = 5,
    EmptyName                  = 6,
    InvalidTarget              = 7,
    InvalidPic                 = 8,
    InvalidAmount              = 9,
    EmptyHistory               = 10,
    InsufficientFundToAllocate = 11,
    AmountExceedsAllocated     = 12,
    ProgramNotRegistered       = 13,
    ProgramNotAllocated        = 14,
    AllocationOutstanding      = 15,
    InvalidOwner               = 16,
    Overflow                   = 17,
}

#[contract]
pub struct Fundraisers;

#[contractimpl]
impl Fundraisers {
    // ─────────────────────────────────────────────────────────
    // Initialisation and ownership
    // ─────────────────────────────────────────────────────────

    /// Set the admin and the donation token.
    ///
    /// Must be called exactly once immediately after deployment.
    /// Subsequent calls panic with `Error::AlreadyInitialized`.
    pub fn init(env: Env, owner: Address, donation_token: Address) {
        if storage::is_initialized(&env) {
            panic_with_error!(&env, Error::AlreadyInitialized);
        }
        owner.require_auth();

        storage::set_donation_token(&env, &donation_token);
        storage::set_owner(&env, &owner);
        events::emit_owner_set(&env, None, Some(owner));
    }

    /// Hand the admin role to `new_owner`.
    pub fn transfer_ownership(env: Env, caller: Address, new_owner: Address) {
        access::require_owner(&env, &caller);
        if new_owner == env.current_contract_address() {
            panic_with_error!(&env, Error::InvalidOwner);
        }

        storage::set_owner(&env, &new_owner);
        events::emit_owner_set(&env, Some(caller), Some(new_owner));
    }

    /// Give up the admin role for good. Every admin-only entry point fails
    /// with `Error::NotAdmin` afterwards.
    pub fn renounce_ownership(env: Env, caller: Address) {
        access::require_owner(&env, &caller);

        storage::remove_owner(&env);
        events::emit_owner_set(&env, Some(caller), None);
    }

    // ─────────────────────────────────────────────────────────
    // Program registry
    // ─────────────────────────────────────────────────────────

    /// Register a new program in `Registered` status.
    ///
    /// - `caller` must be the admin.
    /// - `name` must be non-empty, `target` positive, and `pic` must not be
    ///   this contract.
    pub fn create_program(env: Env, caller: Address, input: ProgramInput) -> Program {
        access::require_owner(&env, &caller);
        validate_input(&env, &input);

        let id = storage::get_and_increment_program_id(&env);
        let details = details_from_input(id, input);
        let state = ProgramState {
            status: ProgramStatus::Registered,
            allocated: 0,
        };
        storage::save_program(&env, &details, &state);

        events::emit_program_created(
            &env,
            id,
            details.name.clone(),
            details.target,
            details.pic.clone(),
        );
        Program::from_parts(details, state)
    }

    /// Replace the descriptive fields, target and PIC of a `Registered` program.
    pub fn update_program(env: Env, caller: Address, program_id: u64, input: ProgramInput) -> Program {
        access::require_owner(&env, &caller);
        let state = storage::load_program_state(&env, program_id);
        if state.status != ProgramStatus::Registered {
            panic_with_error!(&env, Error::ProgramNotRegistered);
        }
        validate_input(&env, &input);

        let details = details_from_input(program_id, input);
        storage::save_program_details(&env, &details);

        events::emit_program_updated(
            &env,
            program_id,
            details.name.clone(),
            details.pic_name.clone(),
        );
        Program::from_parts(details, state)
    }

    /// Switch a program off. Allowed from any status; `Inactive` is terminal.
    ///
    /// Deactivating an `Allocated` program strands its undrawn `allocated`
    /// balance: the PIC can no longer withdraw it and it does not return to
    /// the pool, since `total_allocated` never decreases.
    pub fn deactivate_program(env: Env, caller: Address, program_id: u64) {
        access::require_owner(&env, &caller);
        let mut state = storage::load_program_state(&env, program_id);

        let previous = state.status;
        state.status = ProgramStatus::Inactive;
        storage::save_program_state(&env, program_id, &state);

        events::emit_program_deactivated(&env, program_id, previous);
    }

    /// Close an `Allocated` program whose allocation has been fully withdrawn.
    pub fn mark_program_as_finished(env: Env, caller: Address, program_id: u64) {
        access::require_owner(&env, &caller);
        let mut state = storage::load_program_state(&env, program_id);

        if state.status != ProgramStatus::Allocated {
            panic_with_error!(&env, Error::ProgramNotAllocated);
        }
        if state.allocated != 0 {
            panic_with_error!(&env, Error::AllocationOutstanding);
        }

        state.status = ProgramStatus::Finished;
        storage::save_program_state(&env, program_id, &state);

        events::emit_program_finished(&env, program_id);
    }

    // ─────────────────────────────────────────────────────────
    // Fund movement
    // ─────────────────────────────────────────────────────────

    /// Donate `amount` of the donation token to the shared pool.
    ///
    /// `donor` must have approved this contract for at least `amount`
    /// beforehand; the tokens are pulled with `transfer_from`. A missing
    /// allowance or balance fails with the token contract's own error.
    pub fn send_fund(env: Env, donor: Address, amount: i128) {
        access::require_initialized(&env);
        donor.require_auth();
        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let this = env.current_contract_address();
        let token_client = token::Client::new(&env, &storage::get_donation_token(&env));
        token_client.transfer_from(&this, &donor, &this, &amount);

        storage::add_total_managed(&env, amount);

        events::emit_fund_sent(&env, donor, amount);
    }

    /// Earmark `target` from the pool to a `Registered` program.
    ///
    /// Succeeds when the pool holds at least the program's target
    /// (boundary inclusive). A program is allocated at most once.
    pub fn allocate_fund(env: Env, caller: Address, program_id: u64) {
        access::require_owner(&env, &caller);
        let details = storage::load_program_details(&env, program_id);
        let mut state = storage::load_program_state(&env, program_id);

        if state.status != ProgramStatus::Registered {
            panic_with_error!(&env, Error::ProgramNotRegistered);
        }
        if available_for_allocation(&env) < details.target {
            panic_with_error!(&env, Error::InsufficientFundToAllocate);
        }

        state.allocated = storage::checked_add(&env, state.allocated, details.target);
        state.status = ProgramStatus::Allocated;
        storage::save_program_state(&env, program_id, &state);
        storage::add_total_allocated(&env, details.target);

        events::emit_fund_allocated(&env, program_id, details.target);
    }

    /// Withdraw `amount` of a program's allocation to its PIC.
    ///
    /// - `caller` must be the program's PIC.
    /// - `history` is the justification kept in the audit trail; non-empty.
    /// - `0 < amount <= allocated`.
    pub fn withdraw_fund(env: Env, caller: Address, program_id: u64, history: String, amount: i128) {
        let details = storage::load_program_details(&env, program_id);
        access::require_pic(&env, &caller, &details);

        if history.len() == 0 {
            panic_with_error!(&env, Error::EmptyHistory);
        }
        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let mut state = storage::load_program_state(&env, program_id);
        if state.status != ProgramStatus::Allocated {
            panic_with_error!(&env, Error::ProgramNotAllocated);
        }
        if amount > state.allocated {
            panic_with_error!(&env, Error::AmountExceedsAllocated);
        }

        state.allocated = storage::checked_sub(&env, state.allocated, amount);
        storage::save_program_state(&env, program_id, &state);
        storage::push_withdrawal(
            &env,
            program_id,
            &WithdrawalRecord {
                timestamp: env.ledger().timestamp(),
                history: history.clone(),
                amount,
            },
        );

        let token_client = token::Client::new(&env, &storage::get_donation_token(&env));
        token_client.transfer(&env.current_contract_address(), &caller, &amount);

        events::emit_fund_withdrawn(&env, program_id, caller, history, amount);
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Every program ever created, in id order, including inactive ones.
    pub fn get_all_programs(env: Env) -> Vec<Program> {
        let mut programs = Vec::new(&env);
        for id in 0..storage::program_count(&env) {
            programs.push_back(storage::load_program(&env, id));
        }
        programs
    }

    /// Retrieve a program by its ID.
    pub fn get_program(env: Env, program_id: u64) -> Program {
        storage::load_program(&env, program_id)
    }

    /// Withdrawal records of a program, oldest first.
    pub fn get_program_history(env: Env, program_id: u64) -> Vec<WithdrawalRecord> {
        if program_id >= storage::program_count(&env) {
            panic_with_error!(&env, Error::ProgramNotFound);
        }
        storage::load_history(&env, program_id)
    }

    pub fn total_programs_created(env: Env) -> u64 {
        storage::program_count(&env)
    }

    pub fn total_managed_fund(env: Env) -> i128 {
        storage::total_managed(&env)
    }

    pub fn total_allocated(env: Env) -> i128 {
        storage::total_allocated(&env)
    }

    pub fn remaining_fund_for_allocation(env: Env) -> i128 {
        available_for_allocation(&env)
    }

    /// Donation tokens currently held by this contract.
    pub fn contract_balance(env: Env) -> i128 {
        let token_client = token::Client::new(&env, &storage::get_donation_token(&env));
        token_client.balance(&env.current_contract_address())
    }

    pub fn get_fund_status(env: Env) -> FundStatus {
        FundStatus {
            total_managed: storage::total_managed(&env),
            total_allocated: storage::total_allocated(&env),
            remaining_for_allocation: available_for_allocation(&env),
            contract_balance: Self::contract_balance(env),
        }
    }

    /// Current admin, `None` once renounced.
    pub fn owner(env: Env) -> Option<Address> {
        storage::get_owner(&env)
    }

    pub fn donation_token(env: Env) -> Address {
        storage::get_donation_token(&env)
    }
}

fn available_for_allocation(env: &Env) -> i128 {
    storage::checked_sub(env, storage::total_managed(env), storage::total_allocated(env))
}

fn validate_input(env: &Env, input: &ProgramInput) {
    if input.name.len() == 0 {
        panic_with_error!(env, Error::EmptyName);
    }
    if input.target <= 0 {
        panic_with_error!(env, Error::InvalidTarget);
    }
    // Funds sent to the ledger itself could never be withdrawn again.
    if input.pic == env.current_contract_address() {
        panic_with_error!(env, Error::InvalidPic);
    }
}

fn details_from_input(id: u64, input: ProgramInput) -> ProgramDetails {
    ProgramDetails {
        id,
        name: input.name,
        pic_name: input.pic_name,
        target: input.target,
        desc: input.desc,
        pic: input.pic,
        category: input.category,
        program_link: input.program_link,
        photo_url: input.photo_url,
    }
}
