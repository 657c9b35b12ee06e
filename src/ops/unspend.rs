//! `unspend` (SPEC_FULL.md §4.6).

use super::{arg_i64, arg_bytes, response_block_ids};
use crate::bins;
use crate::dah;
use crate::errors::{EngineError, ErrorCode};
use crate::response::Response;
use crate::utxo;
use crate::value::Value;
use crate::{Host, Record};

pub fn unspend(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let offset = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let utxo_hash = match arg_bytes(args, 1) {
        Ok(v) => v.to_vec(),
        Err(e) => return Response::error(e).into_value(),
    };
    let current_block_height = match arg_i64(args, 2) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height_retention = match arg_i64(args, 3) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    if !matches!(record.get(bins::UTXOS), Some(Value::List(_))) {
        return Response::error(EngineError::new(ErrorCode::UtxosNotFound, "utxos bin missing"))
            .into_value();
    }

    let mut utxos = record.get(bins::UTXOS).and_then(Value::as_list).unwrap().to_vec();

    let validated = match utxo::get_and_validate(&utxos, offset, &utxo_hash) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    let mut decrement = false;
    if let Some(spending_data) = validated.spending_data {
        if utxo::is_frozen_pattern(spending_data) {
            return Response::error(EngineError::new(ErrorCode::Frozen, "utxo is frozen")).into_value();
        }
        decrement = true;
    }

    if decrement {
        utxos[offset as usize] = Value::Bytes(utxo_hash.clone());
        record.set(bins::UTXOS, Value::List(utxos));
        let spent = bins::get_i64_or(record, bins::SPENT_UTXOS, 0);
        record.set(bins::SPENT_UTXOS, Value::Int((spent - 1).max(0)));
    }

    let dah_result = dah::evaluate(record, current_block_height, block_height_retention);

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }

    Response::ok()
        .with_block_ids(response_block_ids(record))
        .with_signal(dah_result.signal, dah_result.child_count)
        .into_value()
}
