//! Role guards.
//!
//! Two roles exist and both are plain address comparisons:
//!
//! - **Admin**: the single stored owner. Transferable; once renounced no
//!   address passes [`require_owner`] again.
//! - **PIC**: per program, the `pic` recorded in its details.
//!
//! Every guard first requires the caller's signature, then compares.

use soroban_sdk::{panic_with_error, Address, Env};

use crate::storage;
use crate::types::ProgramDetails;
use crate::Error;

/// Panics with `Error::NotAdmin` unless `caller` is the current owner.
pub fn require_owner(env: &Env, caller: &Address) {
    require_initialized(env);
    caller.require_auth();
    match storage::get_owner(env) {
        Some(owner) if owner == *caller => {}
        _ => panic_with_error!(env, Error::NotAdmin),
    }
}

/// Panics with `Error::NotPic` unless `caller` is the program's PIC.
pub fn require_pic(env: &Env, caller: &Address, details: &ProgramDetails) {
    caller.require_auth();
    if details.pic != *caller {
        panic_with_error!(env, Error::NotPic);
    }
}

/// Panics with `Error::NotInitialized` before `init` has run.
pub fn require_initialized(env: &Env) {
    if !storage::is_initialized(env) {
        panic_with_error!(env, Error::NotInitialized);
    }
}
