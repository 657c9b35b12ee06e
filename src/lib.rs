//! Per-transaction UTXO state engine: a server-side record processor that
//! dispatches named operations against the bins of a single transaction
//! record (see `SPEC_FULL.md`).
//!
//! The engine never owns storage; it is driven entirely through the
//! [`Record`]/[`Host`] traits, so it can be embedded in any key-value
//! store willing to implement that narrow interface.

pub mod bins;
pub mod config;
pub mod dah;
mod dispatch;
pub mod errors;
pub mod metrics;
mod ops;
pub mod response;
pub mod telemetry;
pub mod testutil;
pub mod utxo;
pub mod value;

pub use dispatch::{apply_record, lock_read, lock_write, unlock, update, validate, Event};
pub use errors::{EngineError, ErrorCode};
pub use response::{Response, Signal};
pub use value::{Host, MapKey, Record, Value};
