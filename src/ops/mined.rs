//! `setMined`, including its inlined DAH path (SPEC_FULL.md §4.10).

use super::{arg_bool, arg_i64, response_block_ids};
use crate::bins;
use crate::dah;
use crate::errors::{EngineError, ErrorCode};
use crate::response::Response;
use crate::value::Value;
use crate::{Host, Record};

pub fn set_mined(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let block_id = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height = match arg_i64(args, 1) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let subtree_idx = match arg_i64(args, 2) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let current_block_height = match arg_i64(args, 3) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height_retention = match arg_i64(args, 4) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let on_longest_chain = arg_bool(args, 5).unwrap_or(true);
    let unset_mined = arg_bool(args, 6).unwrap_or(false);

    let mut block_ids = bins::get_block_ids(record);
    let mut block_heights: Vec<i64> = record
        .get(bins::BLOCK_HEIGHTS)
        .and_then(Value::as_list)
        .map(|l| l.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    let mut subtree_idxs: Vec<i64> = record
        .get(bins::SUBTREE_IDXS)
        .and_then(Value::as_list)
        .map(|l| l.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();

    if unset_mined {
        if let Some(pos) = block_ids.iter().position(|&id| id == block_id) {
            block_ids.remove(pos);
            if pos < block_heights.len() {
                block_heights.remove(pos);
            }
            if pos < subtree_idxs.len() {
                subtree_idxs.remove(pos);
            }
        }
    } else if !block_ids.contains(&block_id) {
        block_ids.push(block_id);
        block_heights.push(block_height);
        subtree_idxs.push(subtree_idx);
    }

    let block_count = block_ids.len();

    record.set(bins::BLOCK_IDS, Value::List(block_ids.iter().copied().map(Value::Int).collect()));
    record.set(
        bins::BLOCK_HEIGHTS,
        Value::List(block_heights.iter().copied().map(Value::Int).collect()),
    );
    record.set(bins::SUBTREE_IDXS, Value::List(subtree_idxs.iter().copied().map(Value::Int).collect()));

    if block_count > 0 && on_longest_chain {
        record.remove(bins::UNMINED_SINCE);
    } else if block_count == 0 {
        record.set(bins::UNMINED_SINCE, Value::Int(current_block_height));
    }

    if bins::is_present_non_nil(record, bins::LOCKED) {
        record.set(bins::LOCKED, Value::Bool(false));
    }
    if bins::is_present_non_nil(record, bins::CREATING) {
        record.remove(bins::CREATING);
    }

    // `blockIDs`/`unminedSince` were just written above, so re-reading them
    // here (via `dah::evaluate`) is already equivalent to an inlined
    // evaluator seeded with the locally-known `block_count`/`on_longest_chain`.
    let dah_result = dah::evaluate(record, current_block_height, block_height_retention);

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }

    Response::ok()
        .with_block_ids(response_block_ids(record))
        .with_signal(dah_result.signal, dah_result.child_count)
        .into_value()
}
