//! Error Types for proxyvote
//!
//! Typed errors carrying enough context to tell which vote, account or
//! amount caused a rejection. Every failing operation aborts with no state
//! change, except the per-entry skips inside batched proxy casting.

use crate::access_control::Permission;
use crate::traits::ScriptError;
use crate::types::{Address, VoteId, Weight};

/// Result type alias for proxyvote operations
pub type VotingResult<T> = Result<T, VotingError>;

/// Main error enum for all proxyvote errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VotingError {
    // ============ Vote Lifecycle Errors ============
    /// Vote id out of range
    NoSuchVote { vote_id: VoteId },

    /// Account holds no weight at the snapshot
    NoVotingPower { account: Address },

    /// Vote closed, executed, or voter not entitled
    CanNotVote { vote_id: VoteId, voter: Address },

    /// Outcome not decided, or already executed
    CanNotExecute { vote_id: VoteId },

    /// Sender may not forward scripts to this ledger
    CanNotForward { sender: Address },

    /// The action runner rejected the execution script
    ScriptFailed { vote_id: VoteId, error: ScriptError },

    /// Ledger instance not supplied to a proxy operation
    UnknownInstance { instance: Address },

    // ============ Authorization Errors ============
    /// Sender lacks a permission on a guarded operation
    Unauthorized { permission: Permission, sender: Address },

    /// Only the wallet principal may call this
    SenderNotPrincipal { expected: Address, actual: Address },

    /// Only the pool representative may call this
    SenderNotRepresentative { expected: Address, actual: Address },

    /// Sender is not a wallet created by the registry
    SenderNotProxyWallet { sender: Address },

    /// Sender is blacklisted by the representative
    BlacklistedSender { sender: Address },

    // ============ Delegation Errors ============
    /// No delegation layer grants this representative
    RepresentativeNotAllowed {
        principal: Address,
        representative: Address,
    },

    /// Representative cast attempted too close to the vote close
    WithinOverruleWindow { vote_id: VoteId },

    /// A status is already recorded for this principal
    VoteAlreadyCast { vote_id: VoteId, voter: Address },

    // ============ Custody Errors ============
    /// Pulling tokens from the principal failed
    TransferFromFailed { token: Address, amount: Weight },

    /// Returning tokens to the principal failed
    WithdrawFailed { token: Address, amount: Weight },

    /// Withdrawal exceeds the delegated allowance
    DisallowedAmountUnavailable { available: Weight, requested: Weight },

    // ============ Input Errors ============
    /// Batch arrays differ in length
    BatchLengthMismatch,

    /// Batch exceeds the fixed maximum
    BatchTooLarge { len: usize, max: usize },

    /// Policy change violates `quorum <= support < 100%` or window bounds
    InvalidPolicy { reason: PolicyErrorReason },

    /// Setting a policy to its current value
    NoOpChange,

    /// Malformed argument
    InvalidInput,

    // ============ Math Errors ============
    /// Arithmetic overflow
    Overflow,

    /// Arithmetic underflow
    Underflow,
}

/// Why a policy value was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyErrorReason {
    /// Support would fall below the quorum
    SupportBelowQuorum,
    /// Support must stay below 100%
    SupportTooBig,
    /// Quorum would exceed the support
    QuorumAboveSupport,
    /// Window longer than the vote duration
    OverruleWindowTooLong,
    /// Vote duration of zero
    ZeroVoteTime,
}

impl VotingError {
    /// Get error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoSuchVote { .. } => "E001_NO_SUCH_VOTE",
            Self::NoVotingPower { .. } => "E002_NO_VOTING_POWER",
            Self::CanNotVote { .. } => "E003_CAN_NOT_VOTE",
            Self::CanNotExecute { .. } => "E004_CAN_NOT_EXECUTE",
            Self::CanNotForward { .. } => "E005_CAN_NOT_FORWARD",
            Self::ScriptFailed { .. } => "E006_SCRIPT_FAILED",
            Self::UnknownInstance { .. } => "E007_UNKNOWN_INSTANCE",
            Self::Unauthorized { .. } => "E010_UNAUTHORIZED",
            Self::SenderNotPrincipal { .. } => "E011_SENDER_NOT_PRINCIPAL",
            Self::SenderNotRepresentative { .. } => "E012_SENDER_NOT_REPRESENTATIVE",
            Self::SenderNotProxyWallet { .. } => "E013_SENDER_NOT_PROXY_WALLET",
            Self::BlacklistedSender { .. } => "E014_BLACKLISTED_SENDER",
            Self::RepresentativeNotAllowed { .. } => "E020_REPRESENTATIVE_NOT_ALLOWED",
            Self::WithinOverruleWindow { .. } => "E021_WITHIN_OVERRULE_WINDOW",
            Self::VoteAlreadyCast { .. } => "E022_VOTE_ALREADY_CAST",
            Self::TransferFromFailed { .. } => "E030_TRANSFER_FROM_FAILED",
            Self::WithdrawFailed { .. } => "E031_WITHDRAW_FAILED",
            Self::DisallowedAmountUnavailable { .. } => "E032_AMOUNT_UNAVAILABLE",
            Self::BatchLengthMismatch => "E040_BATCH_LENGTH_MISMATCH",
            Self::BatchTooLarge { .. } => "E041_BATCH_TOO_LARGE",
            Self::InvalidPolicy { .. } => "E042_INVALID_POLICY",
            Self::NoOpChange => "E043_NO_OP_CHANGE",
            Self::InvalidInput => "E044_INVALID_INPUT",
            Self::Overflow => "E050_OVERFLOW",
            Self::Underflow => "E051_UNDERFLOW",
        }
    }

    /// Returns true if this error is recoverable (caller can fix it by
    /// waiting, topping up, or resubmitting differently)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::CanNotExecute { .. } => true,               // Wait for the outcome
            Self::TransferFromFailed { .. } => true,          // Approve the pool first
            Self::DisallowedAmountUnavailable { .. } => true, // Withdraw less
            Self::BatchTooLarge { .. } => true,               // Split the batch
            Self::BatchLengthMismatch => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            VotingError::NoSuchVote { vote_id: 0 },
            VotingError::NoVotingPower { account: [0u8; 32] },
            VotingError::CanNotVote { vote_id: 0, voter: [0u8; 32] },
            VotingError::CanNotExecute { vote_id: 0 },
            VotingError::CanNotForward { sender: [0u8; 32] },
            VotingError::ScriptFailed { vote_id: 0, error: ScriptError { action_index: 0 } },
            VotingError::UnknownInstance { instance: [0u8; 32] },
            VotingError::Unauthorized { permission: Permission::CreateVotes, sender: [0u8; 32] },
            VotingError::SenderNotPrincipal { expected: [0u8; 32], actual: [1u8; 32] },
            VotingError::SenderNotRepresentative { expected: [0u8; 32], actual: [1u8; 32] },
            VotingError::SenderNotProxyWallet { sender: [0u8; 32] },
            VotingError::BlacklistedSender { sender: [0u8; 32] },
            VotingError::RepresentativeNotAllowed { principal: [0u8; 32], representative: [1u8; 32] },
            VotingError::WithinOverruleWindow { vote_id: 0 },
            VotingError::VoteAlreadyCast { vote_id: 0, voter: [0u8; 32] },
            VotingError::TransferFromFailed { token: [0u8; 32], amount: 1 },
            VotingError::WithdrawFailed { token: [0u8; 32], amount: 1 },
            VotingError::DisallowedAmountUnavailable { available: 0, requested: 1 },
            VotingError::BatchLengthMismatch,
            VotingError::BatchTooLarge { len: 101, max: 100 },
            VotingError::InvalidPolicy { reason: PolicyErrorReason::SupportTooBig },
            VotingError::NoOpChange,
            VotingError::InvalidInput,
            VotingError::Overflow,
            VotingError::Underflow,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(VotingError::CanNotExecute { vote_id: 3 }.is_recoverable());
        assert!(VotingError::BatchTooLarge { len: 101, max: 100 }.is_recoverable());
        assert!(!VotingError::VoteAlreadyCast { vote_id: 3, voter: [2u8; 32] }.is_recoverable());
        assert!(!VotingError::WithinOverruleWindow { vote_id: 3 }.is_recoverable());
    }
}
