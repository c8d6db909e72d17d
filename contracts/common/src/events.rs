//! Protocol Events for proxyvote
//!
//! Events are emitted during contract execution and can be indexed
//! off-chain for audit trails and vote dashboards.

use crate::access_control::Permission;
use crate::types::{Address, Pct, VoteId, Weight};
use crate::{String, Vec};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Vote lifecycle (0x01 - 0x1F)
    StartVote = 0x01,
    CastVote = 0x02,
    ExecuteVote = 0x03,

    // Ledger policy (0x20 - 0x3F)
    ChangeSupportRequired = 0x20,
    ChangeMinQuorum = 0x21,
    ChangeEarlyExecution = 0x22,
    ChangeOverruleWindow = 0x23,
    SetPermission = 0x24,

    // Delegation (0x40 - 0x5F)
    ChangeRepresentative = 0x40,
    ChangeInstanceRepresentative = 0x41,
    ChangeVoteRepresentative = 0x42,

    // Custody (0x60 - 0x7F)
    ProxyWithdraw = 0x60,
    PoolDelegate = 0x61,
    PoolWithdraw = 0x62,
    ChangeBlacklist = 0x63,

    // Registry (0x80 - 0x9F)
    NewProxyWallet = 0x80,
    NewRepresentativeProxy = 0x81,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum VotingEvent {
    // ============ Vote Lifecycle ============
    /// New vote created
    StartVote {
        instance: Address,
        vote_id: VoteId,
        creator: Address,
        metadata: String,
        /// sha256 of the execution script
        script_hash: [u8; 32],
        block_height: u64,
    },

    /// Ballot recorded for `voter`
    CastVote {
        instance: Address,
        vote_id: VoteId,
        voter: Address,
        support: bool,
        weight: Weight,
        /// Set when a representative cast on the voter's behalf
        representative: Option<Address>,
        block_height: u64,
    },

    /// Vote executed, script handed to the runner
    ExecuteVote {
        instance: Address,
        vote_id: VoteId,
        block_height: u64,
    },

    // ============ Ledger Policy ============
    ChangeSupportRequired {
        instance: Address,
        support_required_pct: Pct,
        block_height: u64,
    },

    ChangeMinQuorum {
        instance: Address,
        min_accept_quorum_pct: Pct,
        block_height: u64,
    },

    ChangeEarlyExecution {
        instance: Address,
        early_execution_allowed: bool,
        block_height: u64,
    },

    ChangeOverruleWindow {
        instance: Address,
        previous: u64,
        overrule_window: u64,
        block_height: u64,
    },

    SetPermission {
        instance: Address,
        permission: Permission,
        grantee: Address,
        granted: bool,
        block_height: u64,
    },

    // ============ Delegation ============
    ChangeRepresentative {
        principal: Address,
        representative: Address,
        previous: bool,
        allowed: bool,
        block_height: u64,
    },

    ChangeInstanceRepresentative {
        principal: Address,
        representative: Address,
        instance: Address,
        previous: bool,
        allowed: bool,
        block_height: u64,
    },

    ChangeVoteRepresentative {
        principal: Address,
        representative: Address,
        instance: Address,
        vote_id: VoteId,
        previous: bool,
        allowed: bool,
        block_height: u64,
    },

    // ============ Custody ============
    /// Principal wallet returned tokens to its principal
    ProxyWithdraw {
        wallet: Address,
        token: Address,
        amount: Weight,
        block_height: u64,
    },

    /// Principal moved tokens into a representative pool
    PoolDelegate {
        principal: Address,
        token: Address,
        amount: Weight,
        /// Principal's pooled allowance after the call
        total_amount: Weight,
        block_height: u64,
    },

    PoolWithdraw {
        principal: Address,
        token: Address,
        amount: Weight,
        total_amount: Weight,
        block_height: u64,
    },

    ChangeBlacklist {
        representative: Address,
        principal: Address,
        blacklisted: bool,
        block_height: u64,
    },

    // ============ Registry ============
    NewProxyWallet {
        registry: Address,
        wallet: Address,
        principal: Address,
        overrule_window: u64,
        block_height: u64,
    },

    NewRepresentativeProxy {
        registry: Address,
        proxy: Address,
        representative: Address,
        overrule_window: u64,
        block_height: u64,
    },
}

impl VotingEvent {
    /// Get the event type
    pub fn event_type(&self) -> EventType {
        match self {
            Self::StartVote { .. } => EventType::StartVote,
            Self::CastVote { .. } => EventType::CastVote,
            Self::ExecuteVote { .. } => EventType::ExecuteVote,
            Self::ChangeSupportRequired { .. } => EventType::ChangeSupportRequired,
            Self::ChangeMinQuorum { .. } => EventType::ChangeMinQuorum,
            Self::ChangeEarlyExecution { .. } => EventType::ChangeEarlyExecution,
            Self::ChangeOverruleWindow { .. } => EventType::ChangeOverruleWindow,
            Self::SetPermission { .. } => EventType::SetPermission,
            Self::ChangeRepresentative { .. } => EventType::ChangeRepresentative,
            Self::ChangeInstanceRepresentative { .. } => EventType::ChangeInstanceRepresentative,
            Self::ChangeVoteRepresentative { .. } => EventType::ChangeVoteRepresentative,
            Self::ProxyWithdraw { .. } => EventType::ProxyWithdraw,
            Self::PoolDelegate { .. } => EventType::PoolDelegate,
            Self::PoolWithdraw { .. } => EventType::PoolWithdraw,
            Self::ChangeBlacklist { .. } => EventType::ChangeBlacklist,
            Self::NewProxyWallet { .. } => EventType::NewProxyWallet,
            Self::NewRepresentativeProxy { .. } => EventType::NewRepresentativeProxy,
        }
    }

    /// Get block height when event occurred
    pub fn block_height(&self) -> u64 {
        match self {
            Self::StartVote { block_height, .. }
            | Self::CastVote { block_height, .. }
            | Self::ExecuteVote { block_height, .. }
            | Self::ChangeSupportRequired { block_height, .. }
            | Self::ChangeMinQuorum { block_height, .. }
            | Self::ChangeEarlyExecution { block_height, .. }
            | Self::ChangeOverruleWindow { block_height, .. }
            | Self::SetPermission { block_height, .. }
            | Self::ChangeRepresentative { block_height, .. }
            | Self::ChangeInstanceRepresentative { block_height, .. }
            | Self::ChangeVoteRepresentative { block_height, .. }
            | Self::ProxyWithdraw { block_height, .. }
            | Self::PoolDelegate { block_height, .. }
            | Self::PoolWithdraw { block_height, .. }
            | Self::ChangeBlacklist { block_height, .. }
            | Self::NewProxyWallet { block_height, .. }
            | Self::NewRepresentativeProxy { block_height, .. } => *block_height,
        }
    }

    /// Serialize event to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<VotingEvent>,
}

impl EventLog {
    /// Create new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event
    pub fn emit(&mut self, event: VotingEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[VotingEvent] {
        &self.events
    }

    /// Consume log and return events
    pub fn into_events(self) -> Vec<VotingEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&VotingEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn count_of(&self, event_type: EventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&VotingEvent> {
        self.events.last()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every event after the first `len`, undoing a failed operation
    pub fn truncate_to(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
