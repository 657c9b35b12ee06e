//! Record-state operations (SPEC_FULL.md §4.11): `setConflicting`,
//! `preserveUntil`, `setLocked`, `incrementSpentExtraRecs`,
//! `setDeleteAtHeight`.

use super::{arg_bool, arg_i64};
use crate::bins;
use crate::dah;
use crate::errors::{EngineError, ErrorCode};
use crate::response::{Response, Signal};
use crate::value::Value;
use crate::{Host, Record};

pub fn set_conflicting(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let set_value = match arg_bool(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let current_block_height = match arg_i64(args, 1) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height_retention = match arg_i64(args, 2) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    record.set(bins::CONFLICTING, Value::Bool(set_value));
    let dah_result = dah::evaluate(record, current_block_height, block_height_retention);

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }
    Response::ok().with_signal(dah_result.signal, dah_result.child_count).into_value()
}

pub fn preserve_until(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let block_height = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    record.remove(bins::DELETE_AT_HEIGHT);
    record.set(bins::PRESERVE_UNTIL, Value::Int(block_height));

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }

    let mut response = Response::ok();
    if bins::is_present_non_nil(record, bins::EXTERNAL) {
        response = response.with_signal(Some(Signal::Preserve), 0);
    }
    response.into_value()
}

pub fn set_locked(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let set_value = match arg_bool(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    record.set(bins::LOCKED, Value::Bool(set_value));
    if set_value {
        record.remove(bins::DELETE_AT_HEIGHT);
    }

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }

    let child_count = bins::get_i64_or(record, bins::TOTAL_EXTRA_RECS, 0);
    Response::ok().with_child_count(child_count).into_value()
}

pub fn increment_spent_extra_recs(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let inc = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let current_block_height = match arg_i64(args, 1) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height_retention = match arg_i64(args, 2) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    let total_extra_recs = match bins::get_i64(record, bins::TOTAL_EXTRA_RECS) {
        Some(v) => v,
        None => {
            return Response::error(EngineError::invalid_parameter("totalExtraRecs is not set"))
                .into_value()
        }
    };

    let spent_extra_recs = bins::get_i64_or(record, bins::SPENT_EXTRA_RECS, 0);
    let new_value = spent_extra_recs + inc;
    if new_value < 0 || new_value > total_extra_recs {
        return Response::error(EngineError::invalid_parameter(format!(
            "spentExtraRecs {} out of range [0, {}]",
            new_value, total_extra_recs
        )))
        .into_value();
    }

    record.set(bins::SPENT_EXTRA_RECS, Value::Int(new_value));
    let dah_result = dah::evaluate(record, current_block_height, block_height_retention);

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }
    Response::ok().with_signal(dah_result.signal, dah_result.child_count).into_value()
}

pub fn set_delete_at_height(record: &mut dyn Record, args: &[Value], host: &mut dyn Host) -> Value {
    let current_block_height = match arg_i64(args, 0) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };
    let block_height_retention = match arg_i64(args, 1) {
        Ok(v) => v,
        Err(e) => return Response::error(e).into_value(),
    };

    let dah_result = dah::evaluate(record, current_block_height, block_height_retention);

    if host.commit(record) != 0 {
        return Response::error(EngineError::new(ErrorCode::UpdateFailed, "commit failed")).into_value();
    }
    Response::ok().with_signal(dah_result.signal, dah_result.child_count).into_value()
}
