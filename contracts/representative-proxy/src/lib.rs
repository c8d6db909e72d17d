//! Representative Pool Proxy
//!
//! A pool owned by one representative. Principals move tokens into the
//! pool with [`RepresentativePoolProxy::delegate`] and take them back with
//! [`RepresentativePoolProxy::withdraw`]; the representative votes the
//! pool's whole balance as a single ballot per vote.
//!
//! Invariant: for each token, the sum of pooled allowances equals what the
//! pool holds of that token.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use proxyvote_common::{
    errors::{VotingError, VotingResult},
    events::{EventLog, VotingEvent},
    math::{safe_add_weight, safe_sub_weight},
    traits::{ActionRunner, TokenCustody, VotingPowerSource},
    types::{Address, CallContext, VoteId, Weight},
    validation, BTreeMap, BTreeSet, String, Vec,
};
use proxyvote_voting::VoteLedger;

// ============ Pool Config ============

/// Immutable pool identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PoolConfig {
    /// Address the pool holds tokens and votes as
    pub address: Address,
    /// Owner of the pool
    pub representative: Address,
    /// Trailing part of each vote in which the pool stops casting
    pub overrule_window: u64,
}

#[derive(Debug, Clone)]
pub struct RepresentativePoolProxy {
    config: PoolConfig,
    /// (principal, token) -> pooled amount
    allowances: BTreeMap<(Address, Address), Weight>,
    blacklist: BTreeSet<Address>,
    events: EventLog,
}

impl RepresentativePoolProxy {
    pub fn new(address: Address, representative: Address, overrule_window: u64) -> Self {
        info!(overrule_window, "representative pool created");
        Self {
            config: PoolConfig {
                address,
                representative,
                overrule_window,
            },
            allowances: BTreeMap::new(),
            blacklist: BTreeSet::new(),
            events: EventLog::new(),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn representative(&self) -> Address {
        self.config.representative
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    fn ensure_representative(&self, ctx: &CallContext) -> VotingResult<()> {
        if ctx.sender != self.config.representative {
            warn!("pool call from non-representative");
            return Err(VotingError::SenderNotRepresentative {
                expected: self.config.representative,
                actual: ctx.sender,
            });
        }
        Ok(())
    }

    // ============ Custody ============

    /// Move `amount` of `token` from the sender into the pool
    ///
    /// The sender must have approved the pool for at least `amount`.
    /// Returns the sender's pooled total afterwards.
    pub fn delegate(
        &mut self,
        ctx: &CallContext,
        custody: &mut dyn TokenCustody,
        token: Address,
        amount: Weight,
    ) -> VotingResult<Weight> {
        // 1. Amount must be positive
        if amount == 0 {
            return Err(VotingError::InvalidInput);
        }

        // 2. Representative may refuse the sender
        if self.blacklist.contains(&ctx.sender) {
            warn!("delegation from blacklisted principal");
            return Err(VotingError::BlacklistedSender { sender: ctx.sender });
        }

        // 3. Total must stay representable before any tokens move
        let key = (ctx.sender, token);
        let total = safe_add_weight(self.allowance_of(&ctx.sender, &token), amount)?;

        // 4. Take custody
        let pool = self.config.address;
        if !custody.transfer_from(&token, &pool, &ctx.sender, &pool, amount) {
            warn!(amount, "delegation transfer failed");
            return Err(VotingError::TransferFromFailed { token, amount });
        }

        self.allowances.insert(key, total);
        self.events.emit(VotingEvent::PoolDelegate {
            principal: ctx.sender,
            token,
            amount,
            total_amount: total,
            block_height: ctx.block_height,
        });
        info!(amount, total, "delegated to pool");
        Ok(total)
    }

    /// Return `amount` of the sender's pooled `token`
    ///
    /// Returns the sender's pooled total afterwards.
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        custody: &mut dyn TokenCustody,
        token: Address,
        amount: Weight,
    ) -> VotingResult<Weight> {
        // 1. Enough pooled by this sender
        let available = self.allowance_of(&ctx.sender, &token);
        if amount > available {
            return Err(VotingError::DisallowedAmountUnavailable {
                available,
                requested: amount,
            });
        }
        let remaining = safe_sub_weight(available, amount)?;

        // 2. Give custody back
        if !custody.transfer(&token, &self.config.address, &ctx.sender, amount) {
            warn!(amount, "pool withdraw transfer failed");
            return Err(VotingError::WithdrawFailed { token, amount });
        }

        if remaining == 0 {
            self.allowances.remove(&(ctx.sender, token));
        } else {
            self.allowances.insert((ctx.sender, token), remaining);
        }
        self.events.emit(VotingEvent::PoolWithdraw {
            principal: ctx.sender,
            token,
            amount,
            total_amount: remaining,
            block_height: ctx.block_height,
        });
        info!(amount, remaining, "withdrawn from pool");
        Ok(remaining)
    }

    pub fn allowance_of(&self, principal: &Address, token: &Address) -> Weight {
        self.allowances
            .get(&(*principal, *token))
            .copied()
            .unwrap_or(0)
    }

    /// Principal has a non-zero pooled amount of `token`
    pub fn is_allowed_by(&self, principal: &Address, token: &Address) -> bool {
        self.allowance_of(principal, token) > 0
    }

    /// Sum of every principal's pooled `token`
    pub fn pooled_weight(&self, token: &Address) -> Weight {
        self.allowances
            .iter()
            .filter(|((_, t), _)| t == token)
            .map(|(_, amount)| *amount)
            .fold(0, Weight::saturating_add)
    }

    // ============ Blacklist ============

    pub fn blacklist_principal(
        &mut self,
        ctx: &CallContext,
        principal: Address,
        blacklisted: bool,
    ) -> VotingResult<()> {
        self.ensure_representative(ctx)?;
        if blacklisted {
            self.blacklist.insert(principal);
        } else {
            self.blacklist.remove(&principal);
        }
        self.events.emit(VotingEvent::ChangeBlacklist {
            representative: self.config.representative,
            principal,
            blacklisted,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    pub fn is_blacklisted(&self, principal: &Address) -> bool {
        self.blacklist.contains(principal)
    }

    // ============ Voting ============

    /// Create a vote as the pool; the pool does not cast
    pub fn new_vote(
        &mut self,
        ctx: &CallContext,
        ledger: &mut VoteLedger,
        power: &dyn VotingPowerSource,
        runner: &mut dyn ActionRunner,
        execution_script: Vec<u8>,
        metadata: String,
    ) -> VotingResult<VoteId> {
        self.ensure_representative(ctx)?;
        ledger.new_vote_ext(
            &ctx.with_sender(self.config.address),
            power,
            runner,
            execution_script,
            metadata,
            false,
            false,
        )
    }

    /// Cast the pool's snapshot weight on several votes at once
    ///
    /// Entry `i` votes `supports[i]` on vote `vote_ids[i]` of the ledger
    /// whose instance is `instances[i]`. Every entry is checked before any
    /// ballot is written, so one bad entry fails the whole call.
    #[allow(clippy::too_many_arguments)]
    pub fn proxy_votes(
        &mut self,
        ctx: &CallContext,
        ledgers: &mut [&mut VoteLedger],
        power: &dyn VotingPowerSource,
        instances: &[Address],
        vote_ids: &[VoteId],
        supports: &[bool],
    ) -> VotingResult<Weight> {
        self.ensure_representative(ctx)?;
        let len = validation::validate_batch(&[instances.len(), vote_ids.len(), supports.len()])?;

        // 1. Validate every entry
        let pool = self.config.address;
        let mut targets = Vec::with_capacity(len);
        let mut seen = BTreeSet::new();
        for index in 0..len {
            let (instance, vote_id) = (instances[index], vote_ids[index]);
            let slot = ledgers
                .iter()
                .position(|l| l.instance() == instance)
                .ok_or(VotingError::UnknownInstance { instance })?;
            let vote = ledgers[slot].get_vote(vote_id)?;

            if !vote.is_open(ctx.timestamp) {
                return Err(VotingError::CanNotVote { vote_id, voter: pool });
            }
            if power.balance_of_at(&pool, vote.snapshot_block) == 0 {
                return Err(VotingError::NoVotingPower { account: pool });
            }
            if vote.within_window(ctx.timestamp, self.config.overrule_window) {
                return Err(VotingError::WithinOverruleWindow { vote_id });
            }
            if vote.has_voted(&pool) || !seen.insert((instance, vote_id)) {
                return Err(VotingError::VoteAlreadyCast { vote_id, voter: pool });
            }
            targets.push((slot, vote_id, supports[index]));
        }

        // 2. Cast
        let as_pool = ctx.with_sender(pool);
        let mut total = 0;
        for (slot, vote_id, support) in targets {
            let weight = ledgers[slot].cast_vote(&as_pool, power, vote_id, support)?;
            total = safe_add_weight(total, weight)?;
            debug!(vote_id, support, weight, "pool ballot cast");
        }
        info!(len, total, "pool votes cast");
        Ok(total)
    }
}
