//! Dispatch and the module-facing registration interface (SPEC_FULL.md
//! §4.1, §6).

use crate::config::ModuleConfig;
use crate::errors::{EngineError, ErrorCode};
use crate::metrics;
use crate::ops;
use crate::response::Response;
use crate::value::{MapKey, Value};
use crate::{Host, Record};
use tracing::{debug, warn};

/// A configuration-update event delivered through `update` (§6). Only
/// `Configure` is meaningful; every other event is a no-op.
pub enum Event {
    Configure(ModuleConfig),
    Other,
}

/// `validate(...)` (§6): the engine has no user-supplied code to
/// validate, so this is an unconditional success.
pub fn validate() -> Result<(), EngineError> {
    Ok(())
}

/// `update(event)` (§6): apply a `CONFIGURE` event under the
/// process-wide write lock; anything else is a no-op.
pub fn update(event: Event) {
    if let Event::Configure(config) = event {
        crate::config::apply_configure_event(config);
    }
}

/// The module-state latch (§5, §6). Real serialisation of
/// configuration-update visibility happens inside `config`'s own
/// `RwLock`; these three entry points exist so a host can bracket an
/// invocation the way the registration interface expects.
pub fn lock_read() {}
pub fn lock_write() {}
pub fn unlock() {}

/// First-character bucket dispatch (§4.1, §9): cheap to extend, and the
/// twelve names partition cleanly by first letter except the five
/// `set*`/`spend*` names, which fall through to a full-string match.
fn dispatch_handler(
    name: &str,
) -> Option<fn(&mut dyn Record, &[Value], &mut dyn Host) -> Value> {
    let mut chars = name.chars();
    match chars.next()? {
        'f' if name == "freeze" => Some(ops::freeze),
        'i' if name == "incrementSpentExtraRecs" => Some(ops::increment_spent_extra_recs),
        'p' if name == "preserveUntil" => Some(ops::preserve_until),
        'r' if name == "reassign" => Some(ops::reassign),
        's' => match name {
            "spend" => Some(ops::spend),
            "spendMulti" => Some(ops::spend_multi),
            "setMined" => Some(ops::set_mined),
            "setConflicting" => Some(ops::set_conflicting),
            "setLocked" => Some(ops::set_locked),
            "setDeleteAtHeight" => Some(ops::set_delete_at_height),
            _ => None,
        },
        'u' => match name {
            "unspend" => Some(ops::unspend),
            "unfreeze" => Some(ops::unfreeze),
            _ => None,
        },
        _ => None,
    }
}

fn response_error_code(value: &Value) -> Option<String> {
    value
        .as_map()?
        .get(&MapKey::Str("errorCode".into()))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn response_signal(value: &Value) -> Option<String> {
    value
        .as_map()?
        .get(&MapKey::Str("signal".into()))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn response_is_ok(value: &Value) -> bool {
    value
        .as_map()
        .and_then(|m| m.get(&MapKey::Str("status".into())))
        .and_then(Value::as_str)
        == Some("OK")
}

/// The dispatch entry point (§4.1). `function_name` and `host` model the
/// possibility of a nil handle from the host side.
pub fn apply_record(
    record: &mut dyn Record,
    function_name: Option<&str>,
    args: &[Value],
    host: Option<&mut dyn Host>,
) -> Result<Value, String> {
    let name = function_name.ok_or_else(|| "function name required".to_string())?;

    let handler = dispatch_handler(name).ok_or_else(|| format!("unknown function: {}", name))?;

    debug!(op = name, "dispatching record operation");
    let _timer = metrics::start_op_timer(name);
    metrics::record_dispatch(name);

    let Some(host) = host else {
        let response =
            Response::error(EngineError::new(ErrorCode::InvalidParameter, "host handle is nil"))
                .into_value();
        metrics::record_response(Some(ErrorCode::InvalidParameter.as_str()));
        return Ok(response);
    };

    if record.num_bins() == 0 {
        let response =
            Response::error(EngineError::new(ErrorCode::TxNotFound, "record not found")).into_value();
        metrics::record_response(Some(ErrorCode::TxNotFound.as_str()));
        return Ok(response);
    }

    let response = handler(record, args, host);

    let error_code = response_error_code(&response);
    if let Some(signal) = response_signal(&response) {
        metrics::record_signal(&signal);
    }
    if !response_is_ok(&response) {
        warn!(op = name, error_code = error_code.as_deref().unwrap_or(""), "non-OK response");
    }
    metrics::record_response(error_code.as_deref());

    Ok(response)
}
