//! # Events
//!
//! Every state-changing entry point publishes exactly one event. Off-chain
//! observers (see `backend/indexer`) rebuild program history from these
//! without re-reading contract storage.
//!
//! | Topic                    | Data                   |
//! |--------------------------|------------------------|
//! | `("created", id)`        | [`ProgramCreated`]     |
//! | `("updated", id)`        | [`ProgramUpdated`]     |
//! | `("deactvtd", id)`       | [`ProgramDeactivated`] |
//! | `("finished", id)`       | [`ProgramFinished`]    |
//! | `("fund_sent",)`         | [`FundSent`]           |
//! | `("allocated", id)`      | [`FundAllocated`]      |
//! | `("withdrawn", id)`      | [`FundWithdrawn`]      |
//! | `("owner_set",)`         | [`OwnerSet`]           |

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

use crate::types::ProgramStatus;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramCreated {
    pub program_id: u64,
    pub name: String,
    pub target: i128,
    pub pic: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramUpdated {
    pub program_id: u64,
    pub name: String,
    pub pic_name: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramDeactivated {
    pub program_id: u64,
    /// Status the program held before deactivation.
    pub previous: ProgramStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramFinished {
    pub program_id: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundSent {
    pub donor: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundAllocated {
    pub program_id: u64,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundWithdrawn {
    pub program_id: u64,
    pub pic: Address,
    pub history: String,
    pub amount: i128,
}

/// `new_owner` is `None` after renouncement.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OwnerSet {
    pub previous: Option<Address>,
    pub new_owner: Option<Address>,
}

pub fn emit_program_created(env: &Env, program_id: u64, name: String, target: i128, pic: Address) {
    env.events().publish(
        (symbol_short!("created"), program_id),
        ProgramCreated {
            program_id,
            name,
            target,
            pic,
        },
    );
}

pub fn emit_program_updated(env: &Env, program_id: u64, name: String, pic_name: String) {
    env.events().publish(
        (symbol_short!("updated"), program_id),
        ProgramUpdated {
            program_id,
            name,
            pic_name,
        },
    );
}

pub fn emit_program_deactivated(env: &Env, program_id: u64, previous: ProgramStatus) {
    env.events().publish(
        (symbol_short!("deactvtd"), program_id),
        ProgramDeactivated {
            program_id,
            previous,
        },
    );
}

pub fn emit_program_finished(env: &Env, program_id: u64) {
    env.events().publish(
        (symbol_short!("finished"), program_id),
        ProgramFinished { program_id },
    );
}

pub fn emit_fund_sent(env: &Env, donor: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("fund_sent"),), FundSent { donor, amount });
}

pub fn emit_fund_allocated(env: &Env, program_id: u64, amount: i128) {
    env.events().publish(
        (symbol_short!("allocated"), program_id),
        FundAllocated { program_id, amount },
    );
}

pub fn emit_fund_withdrawn(
    env: &Env,
    program_id: u64,
    pic: Address,
    history: String,
    amount: i128,
) {
    env.events().publish(
        (symbol_short!("withdrawn"), program_id),
        FundWithdrawn {
            program_id,
            pic,
            history,
            amount,
        },
    );
}

pub fn emit_owner_set(env: &Env, previous: Option<Address>, new_owner: Option<Address>) {
    env.events().publish(
        (symbol_short!("owner_set"),),
        OwnerSet {
            previous,
            new_owner,
        },
    );
}
