//! Response map construction (SPEC_FULL.md §6).
//!
//! Every handler terminates in one of these maps rather than raising; the
//! dispatch-level failures (unknown function name, nil function name) are
//! the one case that stays outside this type (see `dispatch::apply_record`).

use crate::errors::EngineError;
use crate::value::{MapKey, Value};
use std::collections::BTreeMap;

/// A signal the caller must act on (cross-record follow-up).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    DahSet,
    DahUnset,
    AllSpent,
    NotAllSpent,
    Preserve,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::DahSet => "DAHSET",
            Signal::DahUnset => "DAHUNSET",
            Signal::AllSpent => "ALLSPENT",
            Signal::NotAllSpent => "NOTALLSPENT",
            Signal::Preserve => "PRESERVE",
        }
    }
}

fn error_to_value(err: &EngineError) -> Value {
    let mut m = BTreeMap::new();
    m.insert(MapKey::Str("errorCode".into()), Value::Str(err.code.as_str().to_string()));
    m.insert(MapKey::Str("message".into()), Value::Str(err.message.clone()));
    if let Some(hex) = &err.spending_data {
        m.insert(MapKey::Str("spendingData".into()), Value::Str(hex.clone()));
    }
    Value::Map(m)
}

/// Builder for a response map. Construct with [`Response::ok`] or
/// [`Response::error`], attach the optional fields that apply, then call
/// [`Response::into_value`].
#[derive(Debug, Clone)]
pub struct Response {
    ok: bool,
    top_error: Option<EngineError>,
    item_errors: BTreeMap<i64, EngineError>,
    block_ids: Option<Vec<i64>>,
    signal: Option<Signal>,
    child_count: Option<i64>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            ok: true,
            top_error: None,
            item_errors: BTreeMap::new(),
            block_ids: None,
            signal: None,
            child_count: None,
        }
    }

    pub fn error(err: EngineError) -> Self {
        Self {
            ok: false,
            top_error: Some(err),
            item_errors: BTreeMap::new(),
            block_ids: None,
            signal: None,
            child_count: None,
        }
    }

    /// Build a `spendMulti`-style response: OK iff `item_errors` is empty.
    pub fn from_item_errors(item_errors: BTreeMap<i64, EngineError>) -> Self {
        Self {
            ok: item_errors.is_empty(),
            top_error: None,
            item_errors,
            block_ids: None,
            signal: None,
            child_count: None,
        }
    }

    pub fn with_block_ids(mut self, block_ids: Vec<i64>) -> Self {
        if !block_ids.is_empty() {
            self.block_ids = Some(block_ids);
        }
        self
    }

    pub fn with_signal(mut self, signal: Option<Signal>, child_count: i64) -> Self {
        if let Some(sig) = signal {
            self.signal = Some(sig);
            if child_count > 0 {
                self.child_count = Some(child_count);
            }
        }
        self
    }

    /// Unconditionally attach `childCount`, used by `setLocked` which reports
    /// it regardless of whether a signal fired.
    pub fn with_child_count(mut self, child_count: i64) -> Self {
        self.child_count = Some(child_count);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn into_value(self) -> Value {
        let mut m = BTreeMap::new();
        m.insert(
            MapKey::Str("status".into()),
            Value::Str(if self.ok { "OK" } else { "ERROR" }.to_string()),
        );
        if let Some(err) = &self.top_error {
            let Value::Map(fields) = error_to_value(err) else { unreachable!() };
            for (k, v) in fields {
                m.insert(k, v);
            }
        }
        if !self.item_errors.is_empty() {
            let mut errs = BTreeMap::new();
            for (idx, err) in &self.item_errors {
                errs.insert(MapKey::Int(*idx), error_to_value(err));
            }
            m.insert(MapKey::Str("errors".into()), Value::Map(errs));
        }
        if let Some(ids) = self.block_ids {
            m.insert(
                MapKey::Str("blockIDs".into()),
                Value::List(ids.into_iter().map(Value::Int).collect()),
            );
        }
        if let Some(signal) = self.signal {
            m.insert(MapKey::Str("signal".into()), Value::Str(signal.as_str().to_string()));
        }
        if let Some(count) = self.child_count {
            m.insert(MapKey::Str("childCount".into()), Value::Int(count));
        }
        Value::Map(m)
    }
}
