//! Delegation Registry
//!
//! Three independent permission layers, all owned by the principal who
//! grants them:
//! - global: `(principal, representative)`
//! - instance: `(principal, representative, instance)`
//! - vote: `(principal, representative, instance, vote_id)`
//!
//! A representative is authorized for a vote if any layer grants it.
//! Entries never expire; the principal revokes them explicitly.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::debug;

use proxyvote_common::{
    events::{EventLog, VotingEvent},
    types::{Address, VoteId},
    BTreeSet,
};

#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct DelegationRegistry {
    full: BTreeSet<(Address, Address)>,
    instance: BTreeSet<(Address, Address, Address)>,
    vote: BTreeSet<(Address, Address, Address, VoteId)>,
}

fn toggle<K: Ord>(set: &mut BTreeSet<K>, key: K, allowed: bool) -> bool {
    if allowed {
        !set.insert(key)
    } else {
        set.remove(&key)
    }
}

impl DelegationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Mutators ============

    /// Allow or revoke `representative` for every vote of every instance
    ///
    /// Idempotent; the event always carries the previous and new value.
    pub fn set_representative(
        &mut self,
        events: &mut EventLog,
        block_height: u64,
        principal: Address,
        representative: Address,
        allowed: bool,
    ) {
        let previous = toggle(&mut self.full, (principal, representative), allowed);
        debug!(previous, allowed, "representative changed");
        events.emit(VotingEvent::ChangeRepresentative {
            principal,
            representative,
            previous,
            allowed,
            block_height,
        });
    }

    /// Allow or revoke `representative` for every vote of one instance
    pub fn set_instance_representative(
        &mut self,
        events: &mut EventLog,
        block_height: u64,
        principal: Address,
        representative: Address,
        instance: Address,
        allowed: bool,
    ) {
        let previous = toggle(
            &mut self.instance,
            (principal, representative, instance),
            allowed,
        );
        debug!(previous, allowed, "instance representative changed");
        events.emit(VotingEvent::ChangeInstanceRepresentative {
            principal,
            representative,
            instance,
            previous,
            allowed,
            block_height,
        });
    }

    /// Allow or revoke `representative` for a single vote
    #[allow(clippy::too_many_arguments)]
    pub fn set_vote_representative(
        &mut self,
        events: &mut EventLog,
        block_height: u64,
        principal: Address,
        representative: Address,
        instance: Address,
        vote_id: VoteId,
        allowed: bool,
    ) {
        let previous = toggle(
            &mut self.vote,
            (principal, representative, instance, vote_id),
            allowed,
        );
        debug!(previous, allowed, vote_id, "vote representative changed");
        events.emit(VotingEvent::ChangeVoteRepresentative {
            principal,
            representative,
            instance,
            vote_id,
            previous,
            allowed,
            block_height,
        });
    }

    // ============ Queries ============

    pub fn is_representative(&self, principal: &Address, representative: &Address) -> bool {
        self.full.contains(&(*principal, *representative))
    }

    pub fn is_instance_representative(
        &self,
        principal: &Address,
        representative: &Address,
        instance: &Address,
    ) -> bool {
        self.instance
            .contains(&(*principal, *representative, *instance))
    }

    pub fn is_vote_representative(
        &self,
        principal: &Address,
        representative: &Address,
        instance: &Address,
        vote_id: VoteId,
    ) -> bool {
        self.vote
            .contains(&(*principal, *representative, *instance, vote_id))
    }

    /// True if any layer grants `representative` for this vote
    pub fn is_authorized(
        &self,
        principal: &Address,
        representative: &Address,
        instance: &Address,
        vote_id: VoteId,
    ) -> bool {
        self.is_representative(principal, representative)
            || self.is_instance_representative(principal, representative, instance)
            || self.is_vote_representative(principal, representative, instance, vote_id)
    }
}
