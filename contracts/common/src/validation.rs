//! Input Validation
//!
//! Shared checks for policy values and batch inputs. Each returns the
//! first violated rule as a typed error.

use crate::constants::{pct::PCT_BASE, voting::MAX_BATCH_LEN};
use crate::errors::{PolicyErrorReason, VotingError, VotingResult};
use crate::types::Pct;

fn policy(reason: PolicyErrorReason) -> VotingError {
    VotingError::InvalidPolicy { reason }
}

pub fn validate_vote_time(vote_time: u64) -> VotingResult<()> {
    if vote_time == 0 {
        return Err(policy(PolicyErrorReason::ZeroVoteTime));
    }
    Ok(())
}

/// Support must satisfy `quorum <= support < 100%`
pub fn validate_support_pct(support: Pct, quorum: Pct) -> VotingResult<()> {
    if support >= PCT_BASE {
        return Err(policy(PolicyErrorReason::SupportTooBig));
    }
    if support < quorum {
        return Err(policy(PolicyErrorReason::SupportBelowQuorum));
    }
    Ok(())
}

/// Quorum must not exceed support
pub fn validate_quorum_pct(quorum: Pct, support: Pct) -> VotingResult<()> {
    if quorum > support {
        return Err(policy(PolicyErrorReason::QuorumAboveSupport));
    }
    Ok(())
}

pub fn validate_overrule_window(overrule_window: u64, vote_time: u64) -> VotingResult<()> {
    if overrule_window > vote_time {
        return Err(policy(PolicyErrorReason::OverruleWindowTooLong));
    }
    Ok(())
}

/// Check that parallel batch arrays agree in length and respect the cap
///
/// Length agreement is checked before the cap. Returns the common length.
pub fn validate_batch(lengths: &[usize]) -> VotingResult<usize> {
    let len = lengths.first().copied().unwrap_or(0);
    if lengths.iter().any(|l| *l != len) {
        return Err(VotingError::BatchLengthMismatch);
    }
    if len > MAX_BATCH_LEN {
        return Err(VotingError::BatchTooLarge {
            len,
            max: MAX_BATCH_LEN,
        });
    }
    Ok(len)
}
