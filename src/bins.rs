//! Bin name constants and typed accessor helpers over `&dyn Record`.
//!
//! Centralising the string literals here keeps `ops/*` free of stray typos
//! and gives every handler the same reading of "absent" vs "present but
//! wrong type".

use crate::value::{MapKey, Value};
use crate::Record;
use std::collections::BTreeMap;

pub const UTXOS: &str = "utxos";
pub const SPENT_UTXOS: &str = "spentUtxos";
pub const RECORD_UTXOS: &str = "recordUtxos";
pub const UTXO_SPENDABLE_IN: &str = "utxoSpendableIn";
pub const DELETED_CHILDREN: &str = "deletedChildren";
pub const CREATING: &str = "creating";
pub const CONFLICTING: &str = "conflicting";
pub const LOCKED: &str = "locked";
pub const SPENDING_HEIGHT: &str = "spendingHeight";
pub const BLOCK_IDS: &str = "blockIDs";
pub const BLOCK_HEIGHTS: &str = "blockHeights";
pub const SUBTREE_IDXS: &str = "subtreeIdxs";
pub const UNMINED_SINCE: &str = "unminedSince";
pub const EXTERNAL: &str = "external";
pub const TOTAL_EXTRA_RECS: &str = "totalExtraRecs";
pub const SPENT_EXTRA_RECS: &str = "spentExtraRecs";
pub const DELETE_AT_HEIGHT: &str = "deleteAtHeight";
pub const PRESERVE_UNTIL: &str = "preserveUntil";
pub const REASSIGNMENTS: &str = "reassignments";
pub const LAST_SPENT_STATE: &str = "lastSpentState";

/// Read an integer bin, treating absent/nil as `default`.
pub fn get_i64_or(record: &dyn Record, bin: &str, default: i64) -> i64 {
    record.get(bin).and_then(Value::as_i64).unwrap_or(default)
}

/// Read an integer bin if present and non-nil.
pub fn get_i64(record: &dyn Record, bin: &str) -> Option<i64> {
    record.get(bin).and_then(Value::as_i64)
}

/// Read a bool bin, treating absent/nil as `false`.
pub fn get_bool_or(record: &dyn Record, bin: &str, default: bool) -> bool {
    record.get(bin).and_then(Value::as_bool).unwrap_or(default)
}

pub fn is_present_non_nil(record: &dyn Record, bin: &str) -> bool {
    !matches!(record.get(bin), None | Some(Value::Nil))
}

/// `blockIDs` as a fresh `Vec<i64>`, empty if absent.
pub fn get_block_ids(record: &dyn Record) -> Vec<i64> {
    record
        .get(BLOCK_IDS)
        .and_then(Value::as_list)
        .map(|l| l.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

pub fn get_int_map(record: &dyn Record, bin: &str) -> BTreeMap<i64, i64> {
    let mut out = BTreeMap::new();
    if let Some(m) = record.get(bin).and_then(Value::as_map) {
        for (k, v) in m {
            if let (MapKey::Int(k), Some(v)) = (k, v.as_i64()) {
                out.insert(*k, v);
            }
        }
    }
    out
}

pub fn get_str_bool_map(record: &dyn Record, bin: &str) -> BTreeMap<String, bool> {
    let mut out = BTreeMap::new();
    if let Some(m) = record.get(bin).and_then(Value::as_map) {
        for (k, v) in m {
            if let MapKey::Str(k) = k {
                out.insert(k.clone(), v.as_bool().unwrap_or(false));
            }
        }
    }
    out
}
