//! UTXO byte encoding and the per-UTXO primitives (SPEC_FULL.md §3, §4.2-4.3).
//!
//! A UTXO is 32 bytes (unspent) or 68 bytes (spent-or-frozen: 32-byte hash
//! followed by 36 bytes of spending data). Frozen is the all-0xFF spending
//! pattern; anything else in those 36 bytes is a genuine spend.

use crate::bins;
use crate::errors::{EngineError, ErrorCode};
use crate::value::Value;
use std::collections::BTreeMap;

pub const HASH_LEN: usize = 32;
pub const SPENDING_DATA_LEN: usize = 36;
pub const UNSPENT_LEN: usize = HASH_LEN;
pub const SPENT_LEN: usize = HASH_LEN + SPENDING_DATA_LEN;

const FROZEN_PATTERN: [u8; SPENDING_DATA_LEN] = [0xFF; SPENDING_DATA_LEN];

pub fn is_frozen_pattern(spending_data: &[u8]) -> bool {
    spending_data == FROZEN_PATTERN
}

/// Build a 68-byte spent-or-frozen UTXO encoding.
pub fn encode_spent(hash: &[u8], spending_data: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(SPENT_LEN);
    v.extend_from_slice(hash);
    v.extend_from_slice(spending_data);
    v
}

pub fn encode_frozen(hash: &[u8]) -> Vec<u8> {
    encode_spent(hash, &FROZEN_PATTERN)
}

/// Hex encoding of spending data per §6: the txid (first 32 bytes)
/// byte-reversed as 64 lowercase hex chars, then the 4-byte vin index in
/// original order as 8 lowercase hex chars. 72 characters total.
pub fn spending_data_hex(spending_data: &[u8]) -> String {
    debug_assert_eq!(spending_data.len(), SPENDING_DATA_LEN);
    let mut reversed = spending_data[..HASH_LEN].to_vec();
    reversed.reverse();
    let mut s = hex::encode(reversed);
    s.push_str(&hex::encode(&spending_data[HASH_LEN..]));
    s
}

/// The `deletedChildren` key derived from spending data: the reversed
/// 32-byte txid prefix of [`spending_data_hex`].
pub fn child_txid_hex(spending_data: &[u8]) -> String {
    spending_data_hex(spending_data)[..HASH_LEN * 2].to_string()
}

/// Result of [`get_and_validate`]: a validated UTXO entry and, if already
/// spent-or-frozen, a borrow over its spending-data bytes.
pub struct ValidatedUtxo<'a> {
    pub utxo: &'a [u8],
    pub spending_data: Option<&'a [u8]>,
}

/// Look up `utxos[offset]` and confirm it starts with `expected_hash`
/// (§4.2).
pub fn get_and_validate<'a>(
    utxos: &'a [Value],
    offset: i64,
    expected_hash: &[u8],
) -> Result<ValidatedUtxo<'a>, EngineError> {
    if expected_hash.len() != HASH_LEN {
        return Err(EngineError::new(
            ErrorCode::UtxoInvalidSize,
            "expected hash must be 32 bytes",
        ));
    }
    if offset < 0 || offset as usize >= utxos.len() {
        return Err(EngineError::new(ErrorCode::UtxoNotFound, "utxo offset out of range"));
    }
    let entry = &utxos[offset as usize];
    let bytes = entry.as_bytes().ok_or_else(|| {
        EngineError::new(ErrorCode::UtxoInvalidSize, "utxo entry is not bytes")
    })?;
    if bytes.len() != UNSPENT_LEN && bytes.len() != SPENT_LEN {
        return Err(EngineError::new(
            ErrorCode::UtxoInvalidSize,
            format!("utxo entry has invalid length {}", bytes.len()),
        ));
    }
    if bytes[..HASH_LEN] != *expected_hash {
        return Err(EngineError::new(ErrorCode::UtxoHashMismatch, "utxo hash mismatch"));
    }
    let spending_data = if bytes.len() == SPENT_LEN { Some(&bytes[HASH_LEN..]) } else { None };
    Ok(ValidatedUtxo { utxo: bytes, spending_data })
}

/// Outcome of [`spend_single_utxo`].
pub enum SpendOutcome {
    Ok,
    Skip,
    Error(EngineError),
}

/// The per-UTXO spend primitive (§4.3). Mutates `utxos[offset]` in place
/// on `Ok`; leaves it untouched on `Skip` and `Error`.
pub fn spend_single_utxo(
    utxos: &mut [Value],
    deleted_children: &BTreeMap<String, bool>,
    utxo_spendable_in: &BTreeMap<i64, i64>,
    offset: i64,
    utxo_hash: &[u8],
    spending_data: &[u8],
    current_block_height: i64,
) -> SpendOutcome {
    if spending_data.len() != SPENDING_DATA_LEN {
        return SpendOutcome::Error(EngineError::new(
            ErrorCode::UtxoInvalidSize,
            "spending data must be 36 bytes",
        ));
    }

    let validated = match get_and_validate(utxos, offset, utxo_hash) {
        Ok(v) => v,
        Err(e) => return SpendOutcome::Error(e),
    };

    if let Some(existing) = validated.spending_data {
        if is_frozen_pattern(existing) {
            return SpendOutcome::Error(EngineError::new(ErrorCode::Frozen, "utxo is frozen"));
        }
        if existing == spending_data {
            let txid = child_txid_hex(existing);
            if deleted_children.get(&txid).copied().unwrap_or(false) {
                return SpendOutcome::Error(
                    EngineError::new(ErrorCode::InvalidSpend, "spending child has been deleted")
                        .with_spending_data(spending_data_hex(existing)),
                );
            }
            return SpendOutcome::Skip;
        }
        return SpendOutcome::Error(
            EngineError::new(ErrorCode::Spent, "utxo already spent")
                .with_spending_data(spending_data_hex(existing)),
        );
    }

    if let Some(spendable_at) = utxo_spendable_in.get(&offset) {
        if *spendable_at >= current_block_height {
            return SpendOutcome::Error(EngineError::new(
                ErrorCode::FrozenUntil,
                format!("UTXO is not spendable until block {}", spendable_at),
            ));
        }
    }

    utxos[offset as usize] = Value::Bytes(encode_spent(utxo_hash, spending_data));
    SpendOutcome::Ok
}

pub fn deleted_children_from(record: &dyn crate::Record) -> BTreeMap<String, bool> {
    bins::get_str_bool_map(record, bins::DELETED_CHILDREN)
}

pub fn utxo_spendable_in_from(record: &dyn crate::Record) -> BTreeMap<i64, i64> {
    bins::get_int_map(record, bins::UTXO_SPENDABLE_IN)
}
