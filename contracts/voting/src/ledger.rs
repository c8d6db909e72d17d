//! Vote Ledger
//!
//! Owns the proposals of one voting instance. Each vote freezes the ledger
//! policy and total supply at creation, tallies weighted ballots read at
//! the vote snapshot, and hands its script to the action runner exactly
//! once when decided.
//!
//! Every operation validates before mutating. Operations that may call the
//! action runner record a rollback point first and restore it if the
//! runner fails, so a failed call leaves no trace.

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use proxyvote_common::{
    access_control::{self, AccessControlState, Permission},
    errors::{VotingError, VotingResult},
    events::{EventLog, VotingEvent},
    traits::{ActionRunner, VotingPowerSource},
    types::{Address, CallContext, Timestamp, Vote, VoteId, VoterState, VotingSettings, Weight},
    validation, BTreeMap, String, Vec,
};

use crate::delegation::DelegationRegistry;

/// sha256 of an execution script, as carried by `StartVote`
pub fn script_hash(script: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(script);
    hasher.finalize().into()
}

#[derive(Debug, Clone)]
pub struct VoteLedger {
    instance: Address,
    settings: VotingSettings,
    acl: AccessControlState,
    votes: Vec<Vote>,
    pub(crate) delegations: DelegationRegistry,
    pub(crate) events: EventLog,
}

impl VoteLedger {
    /// Initialize a ledger at `instance`
    ///
    /// `manager` receives every policy permission; vote creation is open to
    /// anyone until the manager revokes it.
    pub fn new(instance: Address, manager: Address, settings: VotingSettings) -> VotingResult<Self> {
        settings.validate()?;
        info!(
            support = settings.support_required_pct,
            quorum = settings.min_accept_quorum_pct,
            vote_time = settings.vote_time,
            "voting ledger initialized"
        );
        Ok(Self {
            instance,
            settings,
            acl: AccessControlState::with_defaults(manager),
            votes: Vec::new(),
            delegations: DelegationRegistry::new(),
            events: EventLog::new(),
        })
    }

    // ============ Reads ============

    pub fn instance(&self) -> Address {
        self.instance
    }

    /// Current policy, applied to votes created from now on
    pub fn settings(&self) -> &VotingSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn acl(&self) -> &AccessControlState {
        &self.acl
    }

    pub fn delegations(&self) -> &DelegationRegistry {
        &self.delegations
    }

    pub fn votes_length(&self) -> u64 {
        self.votes.len() as u64
    }

    pub fn get_vote(&self, vote_id: VoteId) -> VotingResult<&Vote> {
        usize::try_from(vote_id)
            .ok()
            .and_then(|index| self.votes.get(index))
            .ok_or(VotingError::NoSuchVote { vote_id })
    }

    fn vote_mut(&mut self, vote_id: VoteId) -> VotingResult<&mut Vote> {
        usize::try_from(vote_id)
            .ok()
            .and_then(|index| self.votes.get_mut(index))
            .ok_or(VotingError::NoSuchVote { vote_id })
    }

    pub fn get_voter_state(&self, vote_id: VoteId, voter: &Address) -> VotingResult<VoterState> {
        Ok(self.get_vote(vote_id)?.voter_state(voter))
    }

    /// Open and `voter` holds weight at the snapshot
    pub fn can_vote(
        &self,
        now: Timestamp,
        power: &dyn VotingPowerSource,
        vote_id: VoteId,
        voter: &Address,
    ) -> VotingResult<bool> {
        let vote = self.get_vote(vote_id)?;
        Ok(vote.is_open(now) && power.balance_of_at(voter, vote.snapshot_block) > 0)
    }

    pub fn can_execute(&self, now: Timestamp, vote_id: VoteId) -> VotingResult<bool> {
        Ok(self.get_vote(vote_id)?.can_execute(now))
    }

    pub fn within_overrule_window(&self, now: Timestamp, vote_id: VoteId) -> VotingResult<bool> {
        Ok(self.get_vote(vote_id)?.within_overrule_window(now))
    }

    // ============ Vote Creation ============

    /// Create a vote and cast the creator's yea, executing if that decides it
    pub fn new_vote(
        &mut self,
        ctx: &CallContext,
        power: &dyn VotingPowerSource,
        runner: &mut dyn ActionRunner,
        execution_script: Vec<u8>,
        metadata: String,
    ) -> VotingResult<VoteId> {
        self.new_vote_ext(ctx, power, runner, execution_script, metadata, true, true)
    }

    /// Create a vote snapshotting weight at the previous block
    ///
    /// With `cast_vote` the creator's yea is recorded in the same call; with
    /// `executes_if_decided` as well, a vote decided by that ballot runs its
    /// script immediately.
    #[allow(clippy::too_many_arguments)]
    pub fn new_vote_ext(
        &mut self,
        ctx: &CallContext,
        power: &dyn VotingPowerSource,
        runner: &mut dyn ActionRunner,
        execution_script: Vec<u8>,
        metadata: String,
        cast_vote: bool,
        executes_if_decided: bool,
    ) -> VotingResult<VoteId> {
        // 1. Creation permission
        access_control::require_permission(&self.acl, &ctx.sender, Permission::CreateVotes)?;

        // 2. Creator must hold weight at the snapshot
        let snapshot_block = ctx.snapshot_block();
        let creator_weight = power.balance_of_at(&ctx.sender, snapshot_block);
        let voting_power = power.total_supply_at(snapshot_block);
        if creator_weight == 0 || voting_power == 0 {
            warn!(snapshot_block, "vote creation without voting power");
            return Err(VotingError::NoVotingPower {
                account: ctx.sender,
            });
        }

        // 3. Freeze policy and record the vote
        let vote_id = self.votes_length();
        let events_mark = self.events.len();
        let hash = script_hash(&execution_script);
        self.votes.push(Vote {
            id: vote_id,
            executed: false,
            start_date: ctx.timestamp,
            snapshot_block,
            settings: self.settings,
            yea: 0,
            nay: 0,
            voting_power,
            execution_script,
            creator: ctx.sender,
            metadata: metadata.clone(),
            voters: BTreeMap::new(),
        });
        self.events.emit(VotingEvent::StartVote {
            instance: self.instance,
            vote_id,
            creator: ctx.sender,
            metadata,
            script_hash: hash,
            block_height: ctx.block_height,
        });
        info!(vote_id, voting_power, "vote started");

        // 4. Creator ballot, undone together with the vote on failure
        if cast_vote {
            let outcome = self
                .record_cast(ctx, vote_id, ctx.sender, true, creator_weight, None)
                .and_then(|_| {
                    if executes_if_decided {
                        self.execute_if_decided(ctx, runner, vote_id)
                    } else {
                        Ok(())
                    }
                });
            if let Err(err) = outcome {
                self.votes.pop();
                self.events.truncate_to(events_mark);
                return Err(err);
            }
        }

        Ok(vote_id)
    }

    /// Holds `CreateVotes`
    pub fn can_forward(&self, sender: &Address) -> bool {
        access_control::has_permission(&self.acl, sender, Permission::CreateVotes)
    }

    /// Create a vote for `script` with empty metadata
    pub fn forward(
        &mut self,
        ctx: &CallContext,
        power: &dyn VotingPowerSource,
        runner: &mut dyn ActionRunner,
        script: Vec<u8>,
    ) -> VotingResult<VoteId> {
        if !self.can_forward(&ctx.sender) {
            warn!("forward rejected");
            return Err(VotingError::CanNotForward { sender: ctx.sender });
        }
        self.new_vote(ctx, power, runner, script, String::new())
    }

    // ============ Casting ============

    /// Cast the sender's ballot, optionally executing if it decides the vote
    ///
    /// A repeat ballot replaces the previous one.
    pub fn vote(
        &mut self,
        ctx: &CallContext,
        power: &dyn VotingPowerSource,
        runner: &mut dyn ActionRunner,
        vote_id: VoteId,
        support: bool,
        executes_if_decided: bool,
    ) -> VotingResult<Weight> {
        let weight = self.check_direct_cast(ctx, power, vote_id)?;

        let rollback = self.get_vote(vote_id)?.clone();
        let events_mark = self.events.len();
        let outcome = self
            .record_cast(ctx, vote_id, ctx.sender, support, weight, None)
            .and_then(|_| {
                if executes_if_decided {
                    self.execute_if_decided(ctx, runner, vote_id)
                } else {
                    Ok(())
                }
            });
        if let Err(err) = outcome {
            *self.vote_mut(vote_id)? = rollback;
            self.events.truncate_to(events_mark);
            return Err(err);
        }
        Ok(weight)
    }

    /// Cast the sender's ballot without executing
    ///
    /// This is the entry point proxies use when voting as themselves.
    pub fn cast_vote(
        &mut self,
        ctx: &CallContext,
        power: &dyn VotingPowerSource,
        vote_id: VoteId,
        support: bool,
    ) -> VotingResult<Weight> {
        let weight = self.check_direct_cast(ctx, power, vote_id)?;
        self.record_cast(ctx, vote_id, ctx.sender, support, weight, None)?;
        Ok(weight)
    }

    fn check_direct_cast(
        &self,
        ctx: &CallContext,
        power: &dyn VotingPowerSource,
        vote_id: VoteId,
    ) -> VotingResult<Weight> {
        let vote = self.get_vote(vote_id)?;
        if !vote.is_open(ctx.timestamp) {
            warn!(vote_id, "cast on closed vote");
            return Err(VotingError::CanNotVote {
                vote_id,
                voter: ctx.sender,
            });
        }
        let weight = power.balance_of_at(&ctx.sender, vote.snapshot_block);
        if weight == 0 {
            warn!(vote_id, "cast without voting power");
            return Err(VotingError::NoVotingPower {
                account: ctx.sender,
            });
        }
        Ok(weight)
    }

    /// Write a validated ballot for `voter` and emit `CastVote`
    pub(crate) fn record_cast(
        &mut self,
        ctx: &CallContext,
        vote_id: VoteId,
        voter: Address,
        support: bool,
        weight: Weight,
        representative: Option<Address>,
    ) -> VotingResult<()> {
        let instance = self.instance;
        let vote = self.vote_mut(vote_id)?;
        vote.record_ballot(voter, VoterState::from_support(support), weight)?;
        debug!(vote_id, support, weight, yea = vote.yea, nay = vote.nay, "ballot recorded");
        self.events.emit(VotingEvent::CastVote {
            instance,
            vote_id,
            voter,
            support,
            weight,
            representative,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    // ============ Execution ============

    /// Execute a decided vote; anyone may call this
    pub fn execute_vote(
        &mut self,
        ctx: &CallContext,
        runner: &mut dyn ActionRunner,
        vote_id: VoteId,
    ) -> VotingResult<()> {
        if !self.get_vote(vote_id)?.can_execute(ctx.timestamp) {
            warn!(vote_id, "vote not executable");
            return Err(VotingError::CanNotExecute { vote_id });
        }
        self.run_execution(ctx, runner, vote_id)
    }

    fn execute_if_decided(
        &mut self,
        ctx: &CallContext,
        runner: &mut dyn ActionRunner,
        vote_id: VoteId,
    ) -> VotingResult<()> {
        if self.get_vote(vote_id)?.can_execute(ctx.timestamp) {
            self.run_execution(ctx, runner, vote_id)?;
        }
        Ok(())
    }

    /// Mark executed, then run the script
    ///
    /// The flag is set before the runner is called so that anything the
    /// script calls back into sees the vote as final.
    fn run_execution(
        &mut self,
        ctx: &CallContext,
        runner: &mut dyn ActionRunner,
        vote_id: VoteId,
    ) -> VotingResult<()> {
        let instance = self.instance;

        let vote = self.vote_mut(vote_id)?;
        vote.executed = true;
        let result = runner.run(&vote.execution_script);

        if let Err(error) = result {
            vote.executed = false;
            warn!(vote_id, action = error.action_index, "execution script failed");
            return Err(VotingError::ScriptFailed { vote_id, error });
        }

        self.events.emit(VotingEvent::ExecuteVote {
            instance,
            vote_id,
            block_height: ctx.block_height,
        });
        info!(vote_id, "vote executed");
        Ok(())
    }

    // ============ Policy ============

    pub fn change_support_required_pct(&mut self, ctx: &CallContext, support: u64) -> VotingResult<()> {
        access_control::require_permission(&self.acl, &ctx.sender, Permission::ModifySupport)?;
        validation::validate_support_pct(support, self.settings.min_accept_quorum_pct)?;

        self.settings.support_required_pct = support;
        self.events.emit(VotingEvent::ChangeSupportRequired {
            instance: self.instance,
            support_required_pct: support,
            block_height: ctx.block_height,
        });
        info!(support, "support required changed");
        Ok(())
    }

    pub fn change_min_accept_quorum_pct(&mut self, ctx: &CallContext, quorum: u64) -> VotingResult<()> {
        access_control::require_permission(&self.acl, &ctx.sender, Permission::ModifyQuorum)?;
        validation::validate_quorum_pct(quorum, self.settings.support_required_pct)?;

        self.settings.min_accept_quorum_pct = quorum;
        self.events.emit(VotingEvent::ChangeMinQuorum {
            instance: self.instance,
            min_accept_quorum_pct: quorum,
            block_height: ctx.block_height,
        });
        info!(quorum, "minimum quorum changed");
        Ok(())
    }

    pub fn change_early_execution_allowed(
        &mut self,
        ctx: &CallContext,
        allowed: bool,
    ) -> VotingResult<()> {
        access_control::require_permission(&self.acl, &ctx.sender, Permission::ModifyEarlyExecution)?;
        if self.settings.early_execution_allowed == allowed {
            return Err(VotingError::NoOpChange);
        }

        self.settings.early_execution_allowed = allowed;
        self.events.emit(VotingEvent::ChangeEarlyExecution {
            instance: self.instance,
            early_execution_allowed: allowed,
            block_height: ctx.block_height,
        });
        info!(allowed, "early execution changed");
        Ok(())
    }

    pub fn change_overrule_window(&mut self, ctx: &CallContext, window: u64) -> VotingResult<()> {
        access_control::require_permission(&self.acl, &ctx.sender, Permission::ModifyOverruleWindow)?;
        validation::validate_overrule_window(window, self.settings.vote_time)?;

        let previous = self.settings.overrule_window;
        self.settings.overrule_window = window;
        self.events.emit(VotingEvent::ChangeOverruleWindow {
            instance: self.instance,
            previous,
            overrule_window: window,
            block_height: ctx.block_height,
        });
        info!(previous, window, "overrule window changed");
        Ok(())
    }

    // ============ Permissions ============

    pub fn grant_permission(
        &mut self,
        ctx: &CallContext,
        permission: Permission,
        grantee: Address,
    ) -> VotingResult<()> {
        access_control::grant_permission(&mut self.acl, &ctx.sender, permission, grantee)?;
        self.emit_permission(ctx, permission, grantee, true);
        Ok(())
    }

    pub fn revoke_permission(
        &mut self,
        ctx: &CallContext,
        permission: Permission,
        grantee: Address,
    ) -> VotingResult<()> {
        access_control::revoke_permission(&mut self.acl, &ctx.sender, permission, &grantee)?;
        self.emit_permission(ctx, permission, grantee, false);
        Ok(())
    }

    fn emit_permission(&mut self, ctx: &CallContext, permission: Permission, grantee: Address, granted: bool) {
        self.events.emit(VotingEvent::SetPermission {
            instance: self.instance,
            permission,
            grantee,
            granted,
            block_height: ctx.block_height,
        });
    }

    // ============ Delegation ============

    /// Sender trusts `representative` for every vote
    pub fn set_representative(&mut self, ctx: &CallContext, representative: Address, allowed: bool) {
        self.delegations.set_representative(
            &mut self.events,
            ctx.block_height,
            ctx.sender,
            representative,
            allowed,
        );
    }

    /// Sender trusts `representative` for votes of `instance`
    pub fn set_instance_representative(
        &mut self,
        ctx: &CallContext,
        representative: Address,
        instance: Address,
        allowed: bool,
    ) {
        self.delegations.set_instance_representative(
            &mut self.events,
            ctx.block_height,
            ctx.sender,
            representative,
            instance,
            allowed,
        );
    }

    /// Sender trusts `representative` for one vote of this ledger
    pub fn set_vote_representative(
        &mut self,
        ctx: &CallContext,
        representative: Address,
        vote_id: VoteId,
        allowed: bool,
    ) {
        let instance = self.instance;
        self.delegations.set_vote_representative(
            &mut self.events,
            ctx.block_height,
            ctx.sender,
            representative,
            instance,
            vote_id,
            allowed,
        );
    }

    pub fn is_representative_of(&self, principal: &Address, representative: &Address) -> bool {
        self.delegations.is_representative(principal, representative)
    }

    pub fn is_instance_representative_of(&self, principal: &Address, representative: &Address) -> bool {
        self.delegations
            .is_instance_representative(principal, representative, &self.instance)
    }

    pub fn is_vote_representative_of(
        &self,
        principal: &Address,
        representative: &Address,
        vote_id: VoteId,
    ) -> bool {
        self.delegations
            .is_vote_representative(principal, representative, &self.instance, vote_id)
    }
}
