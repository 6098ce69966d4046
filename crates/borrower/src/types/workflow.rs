use alloy::primitives::B256;
use std::fmt;

use crate::errors::FailureKind;

/// Borrow-cycle state machine.
///
/// `Start → Deposited → PositionKnown → Priced → Sized → Borrowed → Repaid → Done`,
/// with `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    Start,
    Deposited,
    PositionKnown,
    Priced,
    Sized,
    Borrowed,
    Repaid,
    Done,
    Failed(FailureKind),
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Deposited => "DEPOSITED",
            Self::PositionKnown => "POSITION_KNOWN",
            Self::Priced => "PRICED",
            Self::Sized => "SIZED",
            Self::Borrowed => "BORROWED",
            Self::Repaid => "REPAID",
            Self::Done => "DONE",
            Self::Failed(_) => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Successor on the happy path; `None` once terminal.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::Deposited),
            Self::Deposited => Some(Self::PositionKnown),
            Self::PositionKnown => Some(Self::Priced),
            Self::Priced => Some(Self::Sized),
            Self::Sized => Some(Self::Borrowed),
            Self::Borrowed => Some(Self::Repaid),
            Self::Repaid => Some(Self::Done),
            Self::Done | Self::Failed(_) => None,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(kind) => write!(f, "FAILED({kind:?})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A submitted, not yet confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTx {
    pub tx_hash: B256,
    pub required_confirmations: u64,
}

/// Receipt summary once the required confirmation depth is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: B256,
    pub block_number: u64,
    pub confirmations: u64,
    pub gas_used: u64,
}
