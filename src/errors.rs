//! Error taxonomy for the engine (SPEC_FULL.md §6, §7).
//!
//! Every error carries a stable machine-readable [`ErrorCode`] plus a human
//! `message`. Callers match on the code; the message is for logs only.

use std::fmt;

/// The closed set of error identifiers the engine can emit, exactly as they
/// appear on the wire in a response map's `errorCode` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    TxNotFound,
    Conflicting,
    Locked,
    Creating,
    Frozen,
    AlreadyFrozen,
    FrozenUntil,
    CoinbaseImmature,
    Spent,
    InvalidSpend,
    UtxosNotFound,
    UtxoNotFound,
    UtxoInvalidSize,
    UtxoHashMismatch,
    UtxoNotFrozen,
    InvalidParameter,
    UpdateFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::TxNotFound => "TX_NOT_FOUND",
            ErrorCode::Conflicting => "CONFLICTING",
            ErrorCode::Locked => "LOCKED",
            ErrorCode::Creating => "CREATING",
            ErrorCode::Frozen => "FROZEN",
            ErrorCode::AlreadyFrozen => "ALREADY_FROZEN",
            ErrorCode::FrozenUntil => "FROZEN_UNTIL",
            ErrorCode::CoinbaseImmature => "COINBASE_IMMATURE",
            ErrorCode::Spent => "SPENT",
            ErrorCode::InvalidSpend => "INVALID_SPEND",
            ErrorCode::UtxosNotFound => "UTXOS_NOT_FOUND",
            ErrorCode::UtxoNotFound => "UTXO_NOT_FOUND",
            ErrorCode::UtxoInvalidSize => "UTXO_INVALID_SIZE",
            ErrorCode::UtxoHashMismatch => "UTXO_HASH_MISMATCH",
            ErrorCode::UtxoNotFrozen => "UTXO_NOT_FROZEN",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::UpdateFailed => "UPDATE_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single engine error. `spending_data` is only populated for
/// `SPENT`/`INVALID_SPEND`, carrying the hex encoding described in §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
    pub spending_data: Option<String>,
}

impl EngineError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            spending_data: None,
        }
    }

    pub fn with_spending_data(mut self, hex: String) -> Self {
        self.spending_data = Some(hex);
        self
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParameter, message)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_strings_match_wire_format() {
        assert_eq!(ErrorCode::TxNotFound.as_str(), "TX_NOT_FOUND");
        assert_eq!(ErrorCode::UtxoHashMismatch.as_str(), "UTXO_HASH_MISMATCH");
        assert_eq!(ErrorCode::UpdateFailed.as_str(), "UPDATE_FAILED");
    }

    #[test]
    fn display_includes_code_and_message() {
        let e = EngineError::new(ErrorCode::Locked, "spends are refused");
        assert_eq!(e.to_string(), "LOCKED: spends are refused");
    }
}
