use thiserror::Error;

/// Typed error hierarchy for the borrow cycle.
///
/// Library-internal errors use specific variants; the binary wraps with
/// `anyhow::Context` for propagation.
#[derive(Error, Debug)]
pub enum BorrowError {
    // -- Submission ---------------------------------------------------------
    #[error("transaction rejected: {reason}")]
    TransactionRejected { reason: String },

    #[error("confirmation timed out after {timeout_seconds}s (tx: {tx_hash})")]
    ConfirmationTimeout { tx_hash: String, timeout_seconds: u64 },

    #[error("insufficient allowance for {asset}: have {current}, need {required}")]
    InsufficientAllowance {
        asset: String,
        current: String,
        required: String,
    },

    // -- Pricing ------------------------------------------------------------
    #[error("price oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },

    #[error("price stale: {age_seconds}s old (max {max_seconds}s)")]
    StalePrice { age_seconds: u64, max_seconds: u64 },

    #[error("invalid oracle rate: {rate}")]
    InvalidPrice { rate: String },

    // -- Sizing -------------------------------------------------------------
    #[error("no borrow capacity available")]
    NoBorrowCapacity,

    #[error("arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // -- Pool ---------------------------------------------------------------
    #[error("unsupported interest rate mode: {mode}")]
    UnsupportedRateMode { mode: u8 },

    #[error("account position unavailable: {reason}")]
    PositionUnavailable { reason: String },

    #[error("RPC read failed ({operation}): {reason}")]
    RpcUnavailable { operation: String, reason: String },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    Alloy(#[from] alloy::transports::TransportError),
}

/// Cloneable failure reason carried by `WorkflowState::Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    TransactionRejected,
    ConfirmationTimeout,
    InsufficientAllowance,
    OracleUnavailable,
    StalePrice,
    InvalidPrice,
    NoBorrowCapacity,
    ArithmeticOverflow,
    InvalidAmount,
    UnsupportedRateMode,
    PositionUnavailable,
    RpcUnavailable,
    Config,
}

impl BorrowError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::TransactionRejected { .. } => FailureKind::TransactionRejected,
            Self::ConfirmationTimeout { .. } => FailureKind::ConfirmationTimeout,
            Self::InsufficientAllowance { .. } => FailureKind::InsufficientAllowance,
            Self::OracleUnavailable { .. } => FailureKind::OracleUnavailable,
            Self::StalePrice { .. } => FailureKind::StalePrice,
            Self::InvalidPrice { .. } => FailureKind::InvalidPrice,
            Self::NoBorrowCapacity => FailureKind::NoBorrowCapacity,
            Self::ArithmeticOverflow { .. } => FailureKind::ArithmeticOverflow,
            Self::InvalidAmount { .. } => FailureKind::InvalidAmount,
            Self::UnsupportedRateMode { .. } => FailureKind::UnsupportedRateMode,
            Self::PositionUnavailable { .. } => FailureKind::PositionUnavailable,
            Self::RpcUnavailable { .. } | Self::Alloy(_) => FailureKind::RpcUnavailable,
            Self::Config(_) => FailureKind::Config,
        }
    }

    /// Read-side failures that may be retried with backoff. Nothing that
    /// touches a submitted transaction qualifies.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::OracleUnavailable { .. }
                | Self::PositionUnavailable { .. }
                | Self::RpcUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_are_transient() {
        assert!(BorrowError::OracleUnavailable { reason: "x".into() }.is_transient());
        assert!(BorrowError::PositionUnavailable { reason: "x".into() }.is_transient());
        assert!(BorrowError::RpcUnavailable {
            operation: "allowance".into(),
            reason: "x".into()
        }
        .is_transient());
    }

    #[test]
    fn test_submissions_are_not_transient() {
        assert!(!BorrowError::TransactionRejected { reason: "nonce".into() }.is_transient());
        assert!(!BorrowError::ConfirmationTimeout {
            tx_hash: "0x1".into(),
            timeout_seconds: 60
        }
        .is_transient());
        assert!(!BorrowError::NoBorrowCapacity.is_transient());
        assert!(!BorrowError::StalePrice { age_seconds: 10, max_seconds: 5 }.is_transient());
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(BorrowError::NoBorrowCapacity.kind(), FailureKind::NoBorrowCapacity);
        assert_eq!(
            BorrowError::UnsupportedRateMode { mode: 1 }.kind(),
            FailureKind::UnsupportedRateMode
        );
        assert_eq!(
            BorrowError::ConfirmationTimeout { tx_hash: "0x1".into(), timeout_seconds: 1 }.kind(),
            FailureKind::ConfirmationTimeout
        );
    }
}
