//! Delete-at-height evaluator (SPEC_FULL.md §4.9).
//!
//! Shared by every handler that can affect deletion eligibility. `setMined`
//! inlines the same decision through [`evaluate_core`] with locally-known
//! `block_count`/`is_on_longest_chain` rather than re-reading the bins.

use crate::bins;
use crate::response::Signal;
use crate::value::Value;
use crate::Record;

/// Result of a DAH evaluation: the signal to report (if any) and the
/// child-record count the caller should propagate it to.
pub struct DahResult {
    pub signal: Option<Signal>,
    pub child_count: i64,
}

impl DahResult {
    fn none() -> Self {
        DahResult { signal: None, child_count: 0 }
    }
}

/// Run the evaluator reading `blockIDs`/`unminedSince` fresh from the record.
pub fn evaluate(
    record: &mut dyn Record,
    current_block_height: i64,
    block_height_retention: i64,
) -> DahResult {
    let has_block_ids = !bins::get_block_ids(record).is_empty();
    let is_on_longest_chain = !bins::is_present_non_nil(record, bins::UNMINED_SINCE);
    evaluate_core(record, current_block_height, block_height_retention, has_block_ids, is_on_longest_chain)
}

/// The shared decision procedure, parameterised over the two values
/// `setMined` already knows locally. Must stay bit-identical to `evaluate`
/// under those substitutions.
pub fn evaluate_core(
    record: &mut dyn Record,
    current_block_height: i64,
    block_height_retention: i64,
    has_block_ids: bool,
    is_on_longest_chain: bool,
) -> DahResult {
    if block_height_retention == 0 {
        return DahResult::none();
    }
    if bins::is_present_non_nil(record, bins::PRESERVE_UNTIL) {
        return DahResult::none();
    }
    let new_delete_height = current_block_height + block_height_retention;

    if bins::get_bool_or(record, bins::CONFLICTING, false) {
        if !bins::is_present_non_nil(record, bins::DELETE_AT_HEIGHT) {
            record.set(bins::DELETE_AT_HEIGHT, Value::Int(new_delete_height));
            if bins::is_present_non_nil(record, bins::EXTERNAL) {
                if let Some(total) = bins::get_i64(record, bins::TOTAL_EXTRA_RECS) {
                    return DahResult { signal: Some(Signal::DahSet), child_count: total };
                }
            }
        }
        return DahResult::none();
    }

    let total_extra_recs = bins::get_i64(record, bins::TOTAL_EXTRA_RECS);

    if total_extra_recs.is_none() {
        let spent_utxos = bins::get_i64_or(record, bins::SPENT_UTXOS, 0);
        let record_utxos = bins::get_i64_or(record, bins::RECORD_UTXOS, 0);
        let current_state = if spent_utxos == record_utxos { Signal::AllSpent } else { Signal::NotAllSpent };
        let last_state = match record.get(bins::LAST_SPENT_STATE).and_then(Value::as_str) {
            Some("ALLSPENT") => Signal::AllSpent,
            _ => Signal::NotAllSpent,
        };
        if current_state != last_state {
            record.set(bins::LAST_SPENT_STATE, Value::Str(current_state.as_str().to_string()));
            return DahResult { signal: Some(current_state), child_count: 0 };
        }
        return DahResult::none();
    }

    let total_extra_recs = total_extra_recs.unwrap();
    let spent_extra_recs = bins::get_i64_or(record, bins::SPENT_EXTRA_RECS, 0);
    let spent_utxos = bins::get_i64_or(record, bins::SPENT_UTXOS, 0);
    let record_utxos = bins::get_i64_or(record, bins::RECORD_UTXOS, 0);
    let all_spent = total_extra_recs == spent_extra_recs && spent_utxos == record_utxos;

    if all_spent && has_block_ids && is_on_longest_chain {
        let existing = bins::get_i64(record, bins::DELETE_AT_HEIGHT);
        if existing.is_none() || existing.unwrap() < new_delete_height {
            record.set(bins::DELETE_AT_HEIGHT, Value::Int(new_delete_height));
            if bins::is_present_non_nil(record, bins::EXTERNAL) {
                return DahResult { signal: Some(Signal::DahSet), child_count: total_extra_recs };
            }
        }
        return DahResult { signal: None, child_count: total_extra_recs };
    }

    if bins::is_present_non_nil(record, bins::DELETE_AT_HEIGHT) {
        record.remove(bins::DELETE_AT_HEIGHT);
        if bins::is_present_non_nil(record, bins::EXTERNAL) {
            return DahResult { signal: Some(Signal::DahUnset), child_count: total_extra_recs };
        }
    }
    DahResult { signal: None, child_count: total_extra_recs }
}
