//! `spend` and `spendMulti` (SPEC_FULL.md §4.4, §4.5).

use super::{arg_bool, arg_bytes, arg_i64, arg_list, precheck_spend_gates, response_block_ids};
use crate::bins;
use crate::dah;
use crate::errors::{EngineError, ErrorCode};
use crate::response::Response;
use crate::utxo::{self, SpendOutcome};
use crate::value::{MapKey, Value};
use crate::{Host, Record};
use std::collections::BTreeMap;

pub fn spend(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let offset = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let utxo_hash = match arg_bytes(args, 1) {
        Ok(v) => v.to_vec(),
        Err(e) => return Response::error(e).into_value(),
    };
    let spending_data = match arg_bytes(args, 2) {
        Ok(v) => v.to_vec(),
        Err(e) => return Response::error(e).into_value(),
    };
    let ignore_conflicting = arg_bool(args, 3).unwrap_or(false);
    let ignore_locked = arg_bool(args, 4).unwrap_or(false);
    let current_block_height = match arg_i64(args, 5) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height_retention = match arg_i64(args, 6) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    if let Err(e) = precheck_spend_gates(record, ignore_conflicting, ignore_locked, current_block_height) {
        return Response::error(e).into_value();
    }

    if !matches!(record.get(bins::UTXOS), Some(Value::List(_))) {
        return Response::error(EngineError::new(ErrorCode::UtxosNotFound, "utxos bin missing"))
            .into_value();
    }

    let deleted_children = utxo::deleted_children_from(record);
    let spendable_in = utxo::utxo_spendable_in_from(record);

    let mut utxos = match record.get(bins::UTXOS).and_then(Value::as_list) {
        Some(l) => l.to_vec(),
        None => unreachable!("checked above"),
    };

    let outcome = utxo::spend_single_utxo(
        &mut utxos,
        &deleted_children,
        &spendable_in,
        offset,
        &utxo_hash,
        &spending_data,
        current_block_height,
    );

    let item_error = match outcome {
        SpendOutcome::Ok => {
            record.set(bins::UTXOS, Value::List(utxos));
            let spent = bins::get_i64_or(record, bins::SPENT_UTXOS, 0);
            record.set(bins::SPENT_UTXOS, Value::Int(spent + 1));
            None
        }
        SpendOutcome::Skip => None,
        SpendOutcome::Error(e) => Some(e),
    };

    if let Some(err) = item_error {
        let mut errors = BTreeMap::new();
        errors.insert(0, err);
        return Response::from_item_errors(errors)
            .with_block_ids(response_block_ids(record))
            .into_value();
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

struct SpendItem {
    idx: i64,
    offset: i64,
    utxo_hash: Vec<u8>,
    spending_data: Vec<u8>,
}

fn parse_spend_item(batch_idx: usize, value: &Value) -> Option<SpendItem> {
    let map = value.as_map()?;
    let offset = map.get(&MapKey::Str("offset".into()))?.as_i64()?;
    let utxo_hash = map.get(&MapKey::Str("utxoHash".into()))?.as_bytes()?.to_vec();
    let spending_data = map.get(&MapKey::Str("spendingData".into()))?.as_bytes()?.to_vec();
    let idx = map
        .get(&MapKey::Str("idx".into()))
        .and_then(Value::as_i64)
        .unwrap_or(batch_idx as i64);
    Some(SpendItem { idx, offset, utxo_hash, spending_data })
}

pub fn spend_multi(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let spends = match arg_list(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let ignore_conflicting = arg_bool(args, 1).unwrap_or(false);
    let ignore_locked = arg_bool(args, 2).unwrap_or(false);
    let current_block_height = match arg_i64(args, 3) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height_retention = match arg_i64(args, 4) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    if let Err(e) = precheck_spend_gates(record, ignore_conflicting, ignore_locked, current_block_height) {
        return Response::error(e).into_value();
    }

    if !matches!(record.get(bins::UTXOS), Some(Value::List(_))) {
        return Response::error(EngineError::new(ErrorCode::UtxosNotFound, "utxos bin missing"))
            .into_value();
    }

    let deleted_children = utxo::deleted_children_from(record);
    let spendable_in = utxo::utxo_spendable_in_from(record);
    let mut utxos = match record.get(bins::UTXOS).and_then(Value::as_list) {
        Some(l) => l.to_vec(),
        None => unreachable!("checked above"),
    };

    let mut errors = BTreeMap::new();
    let mut ok_count: i64 = 0;

    for (batch_idx, item) in spends.iter().enumerate() {
        let Some(parsed) = parse_spend_item(batch_idx, item) else { continue };
        let outcome = utxo::spend_single_utxo(
            &mut utxos,
            &deleted_children,
            &spendable_in,
            parsed.offset,
            &parsed.utxo_hash,
            &parsed.spending_data,
            current_block_height,
        );
        match outcome {
            SpendOutcome::Ok => ok_count += 1,
            SpendOutcome::Skip => {}
            SpendOutcome::Error(e) => {
                errors.insert(parsed.idx, e);
            }
        }
    }

    record.set(bins::UTXOS, Value::List(utxos));
    if ok_count > 0 {
        let spent = bins::get_i64_or(record, bins::SPENT_UTXOS, 0);
        record.set(bins::SPENT_UTXOS, Value::Int(spent + ok_count));
    }

    let dah_result = dah::evaluate(record, current_block_height, block_height_retention);

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }

    Response::from_item_errors(errors)
        .with_block_ids(response_block_ids(record))
        .with_signal(dah_result.signal, dah_result.child_count)
        .into_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FailOnceHost, MockRecord};

    fn hash(byte: u8) -> Vec<u8> {
        vec![byte; 32]
    }

    fn spending(byte: u8) -> Vec<u8> {
        vec![byte; 36]
    }

    fn status_of(v: &Value) -> String {
        v.as_map().unwrap().get(&MapKey::Str("status".into())).unwrap().as_str().unwrap().to_string()
    }

    #[test]
    fn spend_replaces_utxo_and_increments_counter() {
        let mut record = MockRecord::with_bins([(bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))]))]);
        let mut host = crate::testutil::MockHost::new();
        let args = vec![
            Value::Int(0),
            Value::Bytes(hash(0)),
            Value::Bytes(spending(0xEE)),
            Value::Bool(false),
            Value::Bool(false),
            Value::Int(1000),
            Value::Int(100),
        ];
        let response = spend(&mut record, &args, &mut host);
        assert_eq!(status_of(&response), "OK");
        assert_eq!(bins::get_i64_or(&record, bins::SPENT_UTXOS, -1), 1);
    }

    /// Exercises the `UPDATE_FAILED` path: the first commit attempt fails,
    /// which must surface as an ERROR response with that error code rather
    /// than a silently-applied mutation.
    #[test]
    fn commit_failure_surfaces_update_failed() {
        let mut record = MockRecord::with_bins([(bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))]))]);
        let mut host = FailOnceHost::new();
        let args = vec![
            Value::Int(0),
            Value::Bytes(hash(0)),
            Value::Bytes(spending(0xEE)),
            Value::Bool(false),
            Value::Bool(false),
            Value::Int(1000),
            Value::Int(100),
        ];
        let response = spend(&mut record, &args, &mut host);
        let map = response.as_map().unwrap();
        assert_eq!(status_of(&response), "ERROR");
        assert_eq!(
            map.get(&MapKey::Str("errorCode".into())).unwrap().as_str(),
            Some("UPDATE_FAILED")
        );
        assert_eq!(host.commit_count(), 1);

        let retry = spend(&mut record, &args, &mut host);
        assert_eq!(status_of(&retry), "OK");
        assert_eq!(host.commit_count(), 2);
    }

    #[test]
    fn spend_multi_accumulates_errors_and_skips_malformed_items() {
        let mut record = MockRecord::with_bins([(
            bins::UTXOS,
            Value::List(vec![Value::Bytes(hash(0)), Value::Bytes(hash(1))]),
        )]);
        let mut host = crate::testutil::MockHost::new();

        let mut ok_item = BTreeMap::new();
        ok_item.insert(MapKey::Str("offset".into()), Value::Int(0));
        ok_item.insert(MapKey::Str("utxoHash".into()), Value::Bytes(hash(0)));
        ok_item.insert(MapKey::Str("spendingData".into()), Value::Bytes(spending(0xAA)));

        let mut mismatch_item = BTreeMap::new();
        mismatch_item.insert(MapKey::Str("offset".into()), Value::Int(1));
        mismatch_item.insert(MapKey::Str("utxoHash".into()), Value::Bytes(hash(9)));
        mismatch_item.insert(MapKey::Str("spendingData".into()), Value::Bytes(spending(0xBB)));
        mismatch_item.insert(MapKey::Str("idx".into()), Value::Int(7));

        let malformed_item = Value::Map(BTreeMap::new());

        let args = vec![
            Value::List(vec![Value::Map(ok_item), malformed_item, Value::Map(mismatch_item)]),
            Value::Bool(false),
            Value::Bool(false),
            Value::Int(1000),
            Value::Int(100),
        ];
        let response = spend_multi(&mut record, &args, &mut host);
        assert_eq!(status_of(&response), "ERROR");
        assert_eq!(bins::get_i64_or(&record, bins::SPENT_UTXOS, -1), 1);

        let errors = response.as_map().unwrap().get(&MapKey::Str("errors".into())).unwrap().as_map().unwrap();
        assert!(errors.contains_key(&MapKey::Int(7)));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn spend_multi_all_ok_returns_ok_status() {
        let mut record = MockRecord::with_bins([(
            bins::UTXOS,
            Value::List(vec![Value::Bytes(hash(0)), Value::Bytes(hash(1))]),
        )]);
        let mut host = crate::testutil::MockHost::new();

        let mut item0 = BTreeMap::new();
        item0.insert(MapKey::Str("offset".into()), Value::Int(0));
        item0.insert(MapKey::Str("utxoHash".into()), Value::Bytes(hash(0)));
        item0.insert(MapKey::Str("spendingData".into()), Value::Bytes(spending(0xAA)));

        let mut item1 = BTreeMap::new();
        item1.insert(MapKey::Str("offset".into()), Value::Int(1));
        item1.insert(MapKey::Str("utxoHash".into()), Value::Bytes(hash(1)));
        item1.insert(MapKey::Str("spendingData".into()), Value::Bytes(spending(0xBB)));

        let args = vec![
            Value::List(vec![Value::Map(item0), Value::Map(item1)]),
            Value::Bool(false),
            Value::Bool(false),
            Value::Int(1000),
            Value::Int(100),
        ];
        let response = spend_multi(&mut record, &args, &mut host);
        assert_eq!(status_of(&response), "OK");
        assert_eq!(bins::get_i64_or(&record, bins::SPENT_UTXOS, -1), 2);
    }
}
