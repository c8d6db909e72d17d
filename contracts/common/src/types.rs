//! Core Types for proxyvote
//!
//! Shared data structures used across all contracts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::voting;
use crate::errors::VotingResult;
use crate::math::{is_value_pct, safe_add_weight};
use crate::validation;
use crate::{BTreeMap, String, Vec};

/// 32-byte account / contract address
pub type Address = [u8; 32];

/// Sequential vote identifier within one ledger
pub type VoteId = u64;

/// Token weight (balances, tallies)
pub type Weight = u128;

/// Fixed-point percentage where `PCT_BASE` is 100%
pub type Pct = u64;

/// Seconds on the caller-supplied clock
pub type Timestamp = u64;

// ============================================================================
// Call Context
// ============================================================================

/// Who is calling and when
///
/// The clock and block height are read once at the start of an operation
/// and never polled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub timestamp: Timestamp,
    pub block_height: u64,
}

impl CallContext {
    pub fn new(sender: Address, timestamp: Timestamp, block_height: u64) -> Self {
        Self {
            sender,
            timestamp,
            block_height,
        }
    }

    /// Same clock, different caller. Used when a proxy calls into a ledger.
    pub fn with_sender(&self, sender: Address) -> Self {
        Self { sender, ..*self }
    }

    /// Checkpoint used for weight lookups of a vote created in this call:
    /// the block before, so weight moved in the creating block is excluded.
    pub fn snapshot_block(&self) -> u64 {
        self.block_height.saturating_sub(1)
    }
}

// ============================================================================
// Voter State
// ============================================================================

/// Per (vote, account) ballot status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum VoterState {
    #[default]
    Absent = 0,
    Yea = 1,
    Nay = 2,
}

impl VoterState {
    pub fn from_support(support: bool) -> Self {
        if support {
            Self::Yea
        } else {
            Self::Nay
        }
    }

    pub fn has_voted(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

// ============================================================================
// Voting Settings
// ============================================================================

/// Ledger policy; each vote freezes a copy at creation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct VotingSettings {
    /// Share of cast weight that must be yea
    pub support_required_pct: Pct,
    /// Share of total weight that must participate
    pub min_accept_quorum_pct: Pct,
    /// Vote duration in seconds
    pub vote_time: u64,
    /// Trailing part of `vote_time` closed to representatives
    pub overrule_window: u64,
    pub early_execution_allowed: bool,
}

impl VotingSettings {
    /// Validated settings with the default overrule window and early
    /// execution flag
    pub fn new(
        support_required_pct: Pct,
        min_accept_quorum_pct: Pct,
        vote_time: u64,
    ) -> VotingResult<Self> {
        let settings = Self {
            support_required_pct,
            min_accept_quorum_pct,
            vote_time,
            overrule_window: voting::DEFAULT_OVERRULE_WINDOW,
            early_execution_allowed: voting::DEFAULT_EARLY_EXECUTION,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_overrule_window(mut self, overrule_window: u64) -> VotingResult<Self> {
        validation::validate_overrule_window(overrule_window, self.vote_time)?;
        self.overrule_window = overrule_window;
        Ok(self)
    }

    pub fn with_early_execution(mut self, allowed: bool) -> Self {
        self.early_execution_allowed = allowed;
        self
    }

    /// Check every invariant between the fields
    pub fn validate(&self) -> VotingResult<()> {
        validation::validate_vote_time(self.vote_time)?;
        validation::validate_support_pct(self.support_required_pct, self.min_accept_quorum_pct)?;
        validation::validate_quorum_pct(self.min_accept_quorum_pct, self.support_required_pct)?;
        validation::validate_overrule_window(self.overrule_window, self.vote_time)
    }
}

// ============================================================================
// Vote
// ============================================================================

/// A proposal and its running tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub executed: bool,
    pub start_date: Timestamp,
    pub snapshot_block: u64,
    /// Policy frozen at creation
    pub settings: VotingSettings,
    pub yea: Weight,
    pub nay: Weight,
    /// Total supply at the snapshot
    pub voting_power: Weight,
    pub execution_script: Vec<u8>,
    pub creator: Address,
    pub metadata: String,
    pub voters: BTreeMap<Address, VoterState>,
}

impl Vote {
    pub fn end_date(&self) -> Timestamp {
        self.start_date.saturating_add(self.settings.vote_time)
    }

    /// Open until `vote_time` has elapsed, unless executed early
    pub fn is_open(&self, now: Timestamp) -> bool {
        now < self.end_date() && !self.executed
    }

    /// Open and inside the trailing window reserved for principals
    pub fn within_overrule_window(&self, now: Timestamp) -> bool {
        self.within_window(now, self.settings.overrule_window)
    }

    /// Open and inside the last `window` seconds. Proxies apply their own
    /// window through this.
    pub fn within_window(&self, now: Timestamp, window: u64) -> bool {
        self.is_open(now) && now >= self.end_date().saturating_sub(window)
    }

    pub fn voter_state(&self, voter: &Address) -> VoterState {
        self.voters.get(voter).copied().unwrap_or_default()
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voter_state(voter).has_voted()
    }

    /// Weight cast so far, yea plus nay
    pub fn cast_weight(&self) -> Weight {
        self.yea.saturating_add(self.nay)
    }

    /// yea / (yea + nay) strictly above the frozen support
    pub fn support_reached(&self) -> bool {
        is_value_pct(self.yea, self.cast_weight(), self.settings.support_required_pct)
    }

    /// (yea + nay) / voting_power strictly above the frozen quorum
    pub fn quorum_reached(&self) -> bool {
        is_value_pct(
            self.cast_weight(),
            self.voting_power,
            self.settings.min_accept_quorum_pct,
        )
    }

    pub fn is_decided(&self) -> bool {
        self.support_reached() && self.quorum_reached()
    }

    /// Decided and either ended or allowed to execute early
    pub fn can_execute(&self, now: Timestamp) -> bool {
        if self.executed {
            return false;
        }
        let period_over = now >= self.end_date();
        (period_over || self.settings.early_execution_allowed) && self.is_decided()
    }

    /// Move `voter` to `state` with `weight`, removing any prior ballot
    /// from the tally first
    pub fn record_ballot(
        &mut self,
        voter: Address,
        state: VoterState,
        weight: Weight,
    ) -> VotingResult<()> {
        match self.voter_state(&voter) {
            VoterState::Yea => self.yea = self.yea.saturating_sub(weight),
            VoterState::Nay => self.nay = self.nay.saturating_sub(weight),
            VoterState::Absent => {}
        }
        match state {
            VoterState::Yea => self.yea = safe_add_weight(self.yea, weight)?,
            VoterState::Nay => self.nay = safe_add_weight(self.nay, weight)?,
            VoterState::Absent => {}
        }
        self.voters.insert(voter, state);
        Ok(())
    }
}
