//! Representative Casting
//!
//! Lets a representative record a ballot for a principal who trusts it.
//! The ballot is written against the principal, so a principal that
//! already voted (directly or through any representative) can no longer be
//! proxied, while the principal's own later ballot always replaces a
//! proxied one.
//!
//! Representatives lose access during the overrule window at the end of
//! each vote.

use tracing::{debug, warn};

use proxyvote_common::{
    errors::{VotingError, VotingResult},
    traits::VotingPowerSource,
    types::{Address, CallContext, Timestamp, VoteId, Weight},
    validation,
};

use crate::ledger::VoteLedger;

impl VoteLedger {
    /// Whether `representative` may cast for `principal` on `vote_id` now
    ///
    /// Fails only when the vote does not exist.
    pub fn can_cast_on_behalf(
        &self,
        now: Timestamp,
        power: &dyn VotingPowerSource,
        vote_id: VoteId,
        principal: &Address,
        representative: &Address,
    ) -> VotingResult<bool> {
        self.get_vote(vote_id)?;
        Ok(self
            .check_cast_on_behalf(now, power, vote_id, principal, representative)
            .is_ok())
    }

    /// Validate a representative cast and return the principal's weight
    fn check_cast_on_behalf(
        &self,
        now: Timestamp,
        power: &dyn VotingPowerSource,
        vote_id: VoteId,
        principal: &Address,
        representative: &Address,
    ) -> VotingResult<Weight> {
        // 1. Vote must exist
        let vote = self.get_vote(vote_id)?;

        // 2. A distinct, trusted representative
        if principal == representative
            || !self
                .delegations
                .is_authorized(principal, representative, &self.instance(), vote_id)
        {
            return Err(VotingError::RepresentativeNotAllowed {
                principal: *principal,
                representative: *representative,
            });
        }

        // 3. Vote still open
        if !vote.is_open(now) {
            return Err(VotingError::CanNotVote {
                vote_id,
                voter: *principal,
            });
        }

        // 4. Principal has weight at the snapshot
        let weight = power.balance_of_at(principal, vote.snapshot_block);
        if weight == 0 {
            return Err(VotingError::NoVotingPower {
                account: *principal,
            });
        }

        // 5. Outside the window reserved for the principal
        if vote.within_overrule_window(now) {
            return Err(VotingError::WithinOverruleWindow { vote_id });
        }

        // 6. Nobody voted for this principal yet
        if vote.has_voted(principal) {
            return Err(VotingError::VoteAlreadyCast {
                vote_id,
                voter: *principal,
            });
        }

        Ok(weight)
    }

    /// Cast `principal`'s weight as the sending representative
    pub fn cast_on_behalf(
        &mut self,
        ctx: &CallContext,
        power: &dyn VotingPowerSource,
        vote_id: VoteId,
        principal: Address,
        support: bool,
    ) -> VotingResult<Weight> {
        let weight = self
            .check_cast_on_behalf(ctx.timestamp, power, vote_id, &principal, &ctx.sender)
            .inspect_err(|err| warn!(vote_id, code = err.code(), "representative cast rejected"))?;
        self.record_cast(ctx, vote_id, principal, support, weight, Some(ctx.sender))?;
        Ok(weight)
    }

    /// Cast for many (vote, principal) pairs in one call
    ///
    /// Only the batch shape can fail the whole call: the three slices must
    /// have equal length, at most `MAX_BATCH_LEN`. Entries that fail any
    /// per-entry check, including a missing vote, are skipped and the rest
    /// still land. Returns the number of ballots recorded.
    pub fn cast_on_behalf_of_many(
        &mut self,
        ctx: &CallContext,
        power: &dyn VotingPowerSource,
        vote_ids: &[VoteId],
        principals: &[Address],
        supports: &[bool],
    ) -> VotingResult<usize> {
        let len = validation::validate_batch(&[vote_ids.len(), principals.len(), supports.len()])?;

        let mut cast = 0;
        for index in 0..len {
            let (vote_id, principal, support) = (vote_ids[index], principals[index], supports[index]);
            let outcome = self
                .check_cast_on_behalf(ctx.timestamp, power, vote_id, &principal, &ctx.sender)
                .and_then(|weight| {
                    self.record_cast(ctx, vote_id, principal, support, weight, Some(ctx.sender))
                });
            match outcome {
                Ok(()) => cast += 1,
                Err(err) => debug!(index, vote_id, code = err.code(), "batch entry skipped"),
            }
        }
        debug!(len, cast, "batch cast finished");
        Ok(cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxyvote_common::constants::{pct::ONE_PERCENT, time::ONE_DAY};
    use proxyvote_common::events::{EventType, VotingEvent};
    use proxyvote_common::testing::{CheckpointToken, RecordingRunner};
    use proxyvote_common::types::{VoterState, VotingSettings};
    use proxyvote_common::String;

    const INSTANCE: Address = [0xA0; 32];
    const OVERRULE_WINDOW: u64 = ONE_DAY;
    const VOTE_TIME: u64 = 5 * ONE_DAY;

    fn creator() -> Address {
        [1u8; 32]
    }

    fn principal() -> Address {
        [2u8; 32]
    }

    fn other_principal() -> Address {
        [3u8; 32]
    }

    fn representative() -> Address {
        [4u8; 32]
    }

    fn other_representative() -> Address {
        [5u8; 32]
    }

    fn broke() -> Address {
        [6u8; 32]
    }

    struct Fixture {
        ledger: VoteLedger,
        token: CheckpointToken,
        vote_id: VoteId,
    }

    fn setup() -> Fixture {
        let settings = VotingSettings::new(50 * ONE_PERCENT, 20 * ONE_PERCENT, VOTE_TIME)
            .unwrap()
            .with_overrule_window(OVERRULE_WINDOW)
            .unwrap();
        let mut ledger = VoteLedger::new(INSTANCE, [9u8; 32], settings).unwrap();

        let mut token = CheckpointToken::new([0xAA; 32]);
        token.set_block(1);
        token.mint(creator(), 10);
        token.mint(principal(), 40);
        token.mint(other_principal(), 50);
        token.set_block(2);

        let mut runner = RecordingRunner::new();
        let vote_id = ledger
            .new_vote_ext(&at(creator(), 0), &token, &mut runner, vec![], String::new(), false, false)
            .unwrap();

        for p in [principal(), other_principal(), broke()] {
            ledger.set_representative(&at(p, 0), representative(), true);
        }

        Fixture { ledger, token, vote_id }
    }

    fn at(sender: Address, timestamp: u64) -> CallContext {
        CallContext::new(sender, timestamp, 2)
    }

    #[test]
    fn test_cast_on_behalf_records_against_principal() {
        let mut f = setup();
        let weight = f
            .ledger
            .cast_on_behalf(&at(representative(), 10), &f.token, f.vote_id, principal(), false)
            .unwrap();

        assert_eq!(weight, 40);
        let vote = f.ledger.get_vote(f.vote_id).unwrap();
        assert_eq!(vote.nay, 40);
        assert_eq!(vote.voter_state(&principal()), VoterState::Nay);
        assert_eq!(vote.voter_state(&representative()), VoterState::Absent);
        assert!(matches!(
            f.ledger.events().last(),
            Some(VotingEvent::CastVote { representative: Some(r), .. }) if *r == representative()
        ));
    }

    #[test]
    fn test_unauthorized_representative() {
        let mut f = setup();
        assert_eq!(
            f.ledger
                .cast_on_behalf(&at(other_representative(), 10), &f.token, f.vote_id, principal(), true),
            Err(VotingError::RepresentativeNotAllowed {
                principal: principal(),
                representative: other_representative(),
            })
        );
        // Principal cannot represent itself
        f.ledger.set_representative(&at(principal(), 0), principal(), true);
        assert!(matches!(
            f.ledger.cast_on_behalf(&at(principal(), 10), &f.token, f.vote_id, principal(), true),
            Err(VotingError::RepresentativeNotAllowed { .. })
        ));
    }

    #[test]
    fn test_vote_and_instance_layers() {
        let mut f = setup();
        f.ledger
            .set_vote_representative(&at(principal(), 0), other_representative(), f.vote_id, true);
        assert!(f
            .ledger
            .can_cast_on_behalf(10, &f.token, f.vote_id, &principal(), &other_representative())
            .unwrap());
        assert!(f.ledger.is_vote_representative_of(&principal(), &other_representative(), f.vote_id));

        // Grant for another ledger does not reach this one
        f.ledger
            .set_instance_representative(&at(other_principal(), 0), other_representative(), [0xB0; 32], true);
        assert!(!f
            .ledger
            .can_cast_on_behalf(10, &f.token, f.vote_id, &other_principal(), &other_representative())
            .unwrap());

        f.ledger
            .set_instance_representative(&at(other_principal(), 0), other_representative(), INSTANCE, true);
        assert!(f.ledger.is_instance_representative_of(&other_principal(), &other_representative()));
        assert!(f
            .ledger
            .can_cast_on_behalf(10, &f.token, f.vote_id, &other_principal(), &other_representative())
            .unwrap());
    }

    #[test]
    fn test_zero_weight_principal() {
        let mut f = setup();
        assert_eq!(
            f.ledger.cast_on_behalf(&at(representative(), 10), &f.token, f.vote_id, broke(), true),
            Err(VotingError::NoVotingPower { account: broke() })
        );
    }

    #[test]
    fn test_overrule_window_boundaries() {
        let f = setup();
        let window_start = VOTE_TIME - OVERRULE_WINDOW;
        let check = |now| {
            f.ledger
                .can_cast_on_behalf(now, &f.token, f.vote_id, &principal(), &representative())
                .unwrap()
        };

        assert!(check(window_start - 1));
        assert!(!check(window_start));
        assert!(!check(VOTE_TIME - 1));
        assert!(!check(VOTE_TIME));
        assert!(!check(VOTE_TIME + 1));

        assert!(f.ledger.within_overrule_window(window_start, f.vote_id).unwrap());
        assert!(!f.ledger.within_overrule_window(VOTE_TIME, f.vote_id).unwrap());
    }

    #[test]
    fn test_window_error_kinds() {
        let mut f = setup();
        assert_eq!(
            f.ledger.cast_on_behalf(&at(representative(), VOTE_TIME - 1), &f.token, f.vote_id, principal(), true),
            Err(VotingError::WithinOverruleWindow { vote_id: f.vote_id })
        );
        assert_eq!(
            f.ledger.cast_on_behalf(&at(representative(), VOTE_TIME + 1), &f.token, f.vote_id, principal(), true),
            Err(VotingError::CanNotVote { vote_id: f.vote_id, voter: principal() })
        );
    }

    #[test]
    fn test_one_active_cast_per_principal() {
        let mut f = setup();
        f.ledger.set_representative(&at(principal(), 0), other_representative(), true);
        f.ledger
            .cast_on_behalf(&at(representative(), 10), &f.token, f.vote_id, principal(), false)
            .unwrap();

        // Another representative cannot overwrite
        assert_eq!(
            f.ledger
                .cast_on_behalf(&at(other_representative(), 11), &f.token, f.vote_id, principal(), true),
            Err(VotingError::VoteAlreadyCast { vote_id: f.vote_id, voter: principal() })
        );
        // Neither can the same one
        assert!(f
            .ledger
            .cast_on_behalf(&at(representative(), 11), &f.token, f.vote_id, principal(), true)
            .is_err());

        // The principal always can, even inside the window
        f.ledger
            .cast_vote(&at(principal(), VOTE_TIME - 1), &f.token, f.vote_id, true)
            .unwrap();
        let vote = f.ledger.get_vote(f.vote_id).unwrap();
        assert_eq!((vote.yea, vote.nay), (40, 0));
    }

    #[test]
    fn test_principal_vote_blocks_representative() {
        let mut f = setup();
        f.ledger.cast_vote(&at(principal(), 1), &f.token, f.vote_id, true).unwrap();
        assert!(!f
            .ledger
            .can_cast_on_behalf(2, &f.token, f.vote_id, &principal(), &representative())
            .unwrap());
    }

    #[test]
    fn test_missing_vote() {
        let mut f = setup();
        assert_eq!(
            f.ledger.can_cast_on_behalf(0, &f.token, 7, &principal(), &representative()),
            Err(VotingError::NoSuchVote { vote_id: 7 })
        );
        assert_eq!(
            f.ledger.cast_on_behalf(&at(representative(), 0), &f.token, 7, principal(), true),
            Err(VotingError::NoSuchVote { vote_id: 7 })
        );
    }

    #[test]
    fn test_batch_skips_invalid_entries() {
        let mut f = setup();
        let vote_id = f.vote_id;
        let events_before = f.ledger.events().count_of(EventType::CastVote);

        let cast = f
            .ledger
            .cast_on_behalf_of_many(
                &at(representative(), 10),
                &f.token,
                &[vote_id, vote_id, vote_id],
                &[principal(), other_principal(), creator()],
                &[true, false, true],
            )
            .unwrap();

        assert_eq!(cast, 2);
        assert_eq!(f.ledger.events().count_of(EventType::CastVote) - events_before, 2);
        let vote = f.ledger.get_vote(vote_id).unwrap();
        assert_eq!((vote.yea, vote.nay), (40, 50));
        assert!(!vote.has_voted(&creator()));
    }

    #[test]
    fn test_batch_skips_missing_votes_and_duplicates() {
        let mut f = setup();
        let cast = f
            .ledger
            .cast_on_behalf_of_many(
                &at(representative(), 10),
                &f.token,
                &[f.vote_id, 42, f.vote_id],
                &[principal(), other_principal(), principal()],
                &[true, true, false],
            )
            .unwrap();
        assert_eq!(cast, 1);
        assert_eq!(f.ledger.get_vote(f.vote_id).unwrap().yea, 40);
    }

    #[test]
    fn test_batch_shape_aborts() {
        let mut f = setup();
        let ids = vec![f.vote_id; 101];
        let principals = vec![principal(); 101];
        let supports = vec![true; 101];

        assert_eq!(
            f.ledger
                .cast_on_behalf_of_many(&at(representative(), 10), &f.token, &ids, &principals, &supports),
            Err(VotingError::BatchTooLarge { len: 101, max: 100 })
        );
        assert_eq!(
            f.ledger
                .cast_on_behalf_of_many(&at(representative(), 10), &f.token, &ids[..2], &principals[..1], &supports[..2]),
            Err(VotingError::BatchLengthMismatch)
        );
        assert!(!f.ledger.get_vote(f.vote_id).unwrap().has_voted(&principal()));
    }
}
