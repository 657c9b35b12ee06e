//! `freeze`, `unfreeze`, `reassign` (SPEC_FULL.md §4.7).

use super::{arg_bytes, arg_i64};
use crate::bins;
use crate::errors::{EngineError, ErrorCode};
use crate::response::Response;
use crate::utxo;
use crate::value::{MapKey, Value};
use crate::{Host, Record};
use std::collections::BTreeMap;

pub fn freeze(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let offset = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let utxo_hash = match arg_bytes(args, 1) {
        Ok(v) => v.to_vec(),
        Err(e) => return Response::error(e).into_value(),
    };

    let mut utxos = match record.get(bins::UTXOS).and_then(Value::as_list) {
        Some(l) => l.to_vec(),
        None => {
            return Response::error(EngineError::new(ErrorCode::UtxosNotFound, "utxos bin missing"))
                .into_value()
        }
    };

    let validated = match utxo::get_and_validate(&utxos, offset, &utxo_hash) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    if let Some(spending_data) = validated.spending_data {
        if utxo::is_frozen_pattern(spending_data) {
            return Response::error(EngineError::new(ErrorCode::AlreadyFrozen, "utxo already frozen"))
                .into_value();
        }
        return Response::error(
            EngineError::new(ErrorCode::Spent, "utxo already spent")
                .with_spending_data(utxo::spending_data_hex(spending_data)),
        )
        .into_value();
    }

    utxos[offset as usize] = Value::Bytes(utxo::encode_frozen(&utxo_hash));
    record.set(bins::UTXOS, Value::List(utxos));

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }
    Response::ok().into_value()
}

pub fn unfreeze(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let offset = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let utxo_hash = match arg_bytes(args, 1) {
        Ok(v) => v.to_vec(),
        Err(e) => return Response::error(e).into_value(),
    };

    let mut utxos = match record.get(bins::UTXOS).and_then(Value::as_list) {
        Some(l) => l.to_vec(),
        None => {
            return Response::error(EngineError::new(ErrorCode::UtxosNotFound, "utxos bin missing"))
                .into_value()
        }
    };

    let validated = match utxo::get_and_validate(&utxos, offset, &utxo_hash) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    let is_frozen = validated.spending_data.map(utxo::is_frozen_pattern).unwrap_or(false);
    if !is_frozen {
        return Response::error(EngineError::new(ErrorCode::UtxoNotFrozen, "utxo is not frozen"))
            .into_value();
    }

    utxos[offset as usize] = Value::Bytes(utxo_hash);
    record.set(bins::UTXOS, Value::List(utxos));

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }
    Response::ok().into_value()
}

pub fn reassign(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let offset = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let utxo_hash = match arg_bytes(args, 1) {
        Ok(v) => v.to_vec(),
        Err(e) => return Response::error(e).into_value(),
    };
    let new_utxo_hash = match arg_bytes(args, 2) {
        Ok(v) => v.to_vec(),
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height = match arg_i64(args, 3) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let spendable_after = match arg_i64(args, 4) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    let mut utxos = match record.get(bins::UTXOS).and_then(Value::as_list) {
        Some(l) => l.to_vec(),
        None => {
            return Response::error(EngineError::new(ErrorCode::UtxosNotFound, "utxos bin missing"))
                .into_value()
        }
    };

    let validated = match utxo::get_and_validate(&utxos, offset, &utxo_hash) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    let is_frozen = validated.spending_data.map(utxo::is_frozen_pattern).unwrap_or(false);
    if !is_frozen {
        return Response::error(EngineError::new(ErrorCode::UtxoNotFrozen, "utxo is not frozen"))
            .into_value();
    }

    utxos[offset as usize] = Value::Bytes(new_utxo_hash.clone());
    record.set(bins::UTXOS, Value::List(utxos));

    let mut reassignments = record
        .get(bins::REASSIGNMENTS)
        .and_then(Value::as_list)
        .map(|l| l.to_vec())
        .unwrap_or_default();
    let mut entry = BTreeMap::new();
    entry.insert(MapKey::Str("offset".into()), Value::Int(offset));
    entry.insert(MapKey::Str("utxoHash".into()), Value::Bytes(utxo_hash));
    entry.insert(MapKey::Str("newUtxoHash".into()), Value::Bytes(new_utxo_hash));
    entry.insert(MapKey::Str("blockHeight".into()), Value::Int(block_height));
    reassignments.push(Value::Map(entry));
    record.set(bins::REASSIGNMENTS, Value::List(reassignments));

    let mut spendable_in = bins::get_int_map(record, bins::UTXO_SPENDABLE_IN);
    spendable_in.insert(offset, block_height + spendable_after);
    let mut map = BTreeMap::new();
    for (k, v) in spendable_in {
        map.insert(MapKey::Int(k), Value::Int(v));
    }
    record.set(bins::UTXO_SPENDABLE_IN, Value::Map(map));

    let record_utxos = bins::get_i64_or(record, bins::RECORD_UTXOS, 0);
    record.set(bins::RECORD_UTXOS, Value::Int(record_utxos + 1));

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }
    Response::ok().into_value()
}
