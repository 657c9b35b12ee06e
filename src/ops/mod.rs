//! Operation handlers (SPEC_FULL.md §4.4-§4.11), one submodule per family.
//!
//! Shared argument-extraction and pre-check helpers live here; each
//! handler is otherwise self-contained and commits at most once.

mod freeze;
mod mined;
mod spend;
mod state;
mod unspend;

pub use freeze::{freeze, reassign, unfreeze};
pub use mined::set_mined;
pub use spend::{spend, spend_multi};
pub use state::{
    increment_spent_extra_recs, set_conflicting, set_delete_at_height, set_locked, preserve_until,
};

use crate::bins;
use crate::errors::EngineError;
use crate::value::Value;
use crate::Record;

pub fn arg_i64(args: &[Value], idx: usize) -> Result<i64, EngineError> {
    args.get(idx)
        .and_then(Value::as_i64)
        .ok_or_else(|| EngineError::invalid_parameter(format!("argument {} must be an integer", idx)))
}

pub fn arg_bool(args: &[Value], idx: usize) -> Result<bool, EngineError> {
    args.get(idx)
        .and_then(Value::as_bool)
        .ok_or_else(|| EngineError::invalid_parameter(format!("argument {} must be a boolean", idx)))
}

pub fn arg_bytes<'a>(args: &'a [Value], idx: usize) -> Result<&'a [u8], EngineError> {
    args.get(idx)
        .and_then(Value::as_bytes)
        .ok_or_else(|| EngineError::invalid_parameter(format!("argument {} must be bytes", idx)))
}

pub fn arg_list<'a>(args: &'a [Value], idx: usize) -> Result<&'a [Value], EngineError> {
    args.get(idx)
        .and_then(Value::as_list)
        .ok_or_else(|| EngineError::invalid_parameter(format!("argument {} must be a list", idx)))
}

/// The gate sequence shared by `spend`/`spendMulti` (§4.4 steps 3-6).
/// `unspend` takes no `ignore_conflicting`/`ignore_locked` arguments and so
/// skips this gate entirely, going straight to UTXO-level validation.
/// Host-nil and zero-bin checks happen earlier, at dispatch (§4.1).
pub fn precheck_spend_gates(
    record: &dyn Record,
    ignore_conflicting: bool,
    ignore_locked: bool,
    current_block_height: i64,
) -> Result<(), EngineError> {
    use crate::errors::ErrorCode;

    if bins::get_bool_or(record, bins::CREATING, false) {
        return Err(EngineError::new(ErrorCode::Creating, "record is still being created"));
    }
    if !ignore_conflicting && bins::get_bool_or(record, bins::CONFLICTING, false) {
        return Err(EngineError::new(ErrorCode::Conflicting, "transaction is conflicting"));
    }
    if !ignore_locked && bins::get_bool_or(record, bins::LOCKED, false) {
        return Err(EngineError::new(ErrorCode::Locked, "spends are refused"));
    }
    if let Some(spending_height) = bins::get_i64(record, bins::SPENDING_HEIGHT) {
        if spending_height > 0 && spending_height > current_block_height {
            return Err(EngineError::new(
                ErrorCode::CoinbaseImmature,
                format!(
                    "coinbase not mature until block {} (current {})",
                    spending_height, current_block_height
                ),
            ));
        }
    }
    Ok(())
}

/// `blockIDs` for the response map, only when non-empty (§4.4).
pub fn response_block_ids(record: &dyn Record) -> Vec<i64> {
    bins::get_block_ids(record)
}
