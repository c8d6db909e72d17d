//! Principal Proxy Wallet
//!
//! A wallet owned by one principal that holds the principal's tokens and
//! votes with them on any ledger.
//!
//! - The principal creates votes, votes directly (always, even inside the
//!   overrule window), and withdraws tokens
//! - Representatives trusted by the wallet cast once per vote through
//!   [`PrincipalProxyWallet::proxy_vote`], outside the wallet's own
//!   overrule window and only while the wallet has not voted
//!
//! From a ledger's point of view the wallet address is the voter.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use proxyvote_common::{
    errors::{VotingError, VotingResult},
    events::{EventLog, VotingEvent},
    traits::{ActionRunner, TokenCustody, VotingPowerSource},
    types::{Address, CallContext, Timestamp, VoteId, Weight},
    String, Vec,
};
use proxyvote_voting::{DelegationRegistry, VoteLedger};

// ============ Wallet Config ============

/// Immutable wallet identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct WalletConfig {
    /// Address the wallet votes and holds tokens as
    pub address: Address,
    /// Owner of the wallet
    pub principal: Address,
    /// Trailing part of each vote closed to representatives
    pub overrule_window: u64,
}

#[derive(Debug, Clone)]
pub struct PrincipalProxyWallet {
    config: WalletConfig,
    delegations: DelegationRegistry,
    events: EventLog,
}

impl PrincipalProxyWallet {
    pub fn new(address: Address, principal: Address, overrule_window: u64) -> Self {
        info!(overrule_window, "principal proxy wallet created");
        Self {
            config: WalletConfig {
                address,
                principal,
                overrule_window,
            },
            delegations: DelegationRegistry::new(),
            events: EventLog::new(),
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn principal(&self) -> Address {
        self.config.principal
    }

    pub fn overrule_window(&self) -> u64 {
        self.config.overrule_window
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    fn ensure_principal(&self, ctx: &CallContext) -> VotingResult<()> {
        if ctx.sender != self.config.principal {
            warn!("wallet call from non-principal");
            return Err(VotingError::SenderNotPrincipal {
                expected: self.config.principal,
                actual: ctx.sender,
            });
        }
        Ok(())
    }

    // ============ Delegation ============

    pub fn set_full_representative(
        &mut self,
        ctx: &CallContext,
        representative: Address,
        allowed: bool,
    ) -> VotingResult<()> {
        self.ensure_principal(ctx)?;
        self.delegations.set_representative(
            &mut self.events,
            ctx.block_height,
            self.config.address,
            representative,
            allowed,
        );
        Ok(())
    }

    pub fn set_instance_representative(
        &mut self,
        ctx: &CallContext,
        representative: Address,
        instance: Address,
        allowed: bool,
    ) -> VotingResult<()> {
        self.ensure_principal(ctx)?;
        self.delegations.set_instance_representative(
            &mut self.events,
            ctx.block_height,
            self.config.address,
            representative,
            instance,
            allowed,
        );
        Ok(())
    }

    pub fn set_vote_representative(
        &mut self,
        ctx: &CallContext,
        representative: Address,
        instance: Address,
        vote_id: VoteId,
        allowed: bool,
    ) -> VotingResult<()> {
        self.ensure_principal(ctx)?;
        self.delegations.set_vote_representative(
            &mut self.events,
            ctx.block_height,
            self.config.address,
            representative,
            instance,
            vote_id,
            allowed,
        );
        Ok(())
    }

    pub fn is_representative_fully_allowed(&self, representative: &Address) -> bool {
        self.delegations
            .is_representative(&self.config.address, representative)
    }

    pub fn is_representative_allowed_for_instance(
        &self,
        representative: &Address,
        instance: &Address,
    ) -> bool {
        self.delegations
            .is_instance_representative(&self.config.address, representative, instance)
    }

    pub fn is_representative_allowed_for_vote(
        &self,
        representative: &Address,
        instance: &Address,
        vote_id: VoteId,
    ) -> bool {
        self.delegations
            .is_vote_representative(&self.config.address, representative, instance, vote_id)
    }

    /// True if any layer trusts `representative` for this vote
    pub fn is_authorized(&self, representative: &Address, instance: &Address, vote_id: VoteId) -> bool {
        self.delegations
            .is_authorized(&self.config.address, representative, instance, vote_id)
    }

    // ============ Voting ============

    /// Create a vote as the wallet; the wallet does not cast
    pub fn new_vote(
        &mut self,
        ctx: &CallContext,
        ledger: &mut VoteLedger,
        power: &dyn VotingPowerSource,
        runner: &mut dyn ActionRunner,
        execution_script: Vec<u8>,
        metadata: String,
    ) -> VotingResult<VoteId> {
        self.ensure_principal(ctx)?;
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

    /// Principal's direct ballot, replacing any earlier one
    #[allow(clippy::too_many_arguments)]
    pub fn vote(
        &mut self,
        ctx: &CallContext,
        ledger: &mut VoteLedger,
        power: &dyn VotingPowerSource,
        runner: &mut dyn ActionRunner,
        vote_id: VoteId,
        support: bool,
        executes_if_decided: bool,
    ) -> VotingResult<Weight> {
        self.ensure_principal(ctx)?;
        ledger.vote(
            &ctx.with_sender(self.config.address),
            power,
            runner,
            vote_id,
            support,
            executes_if_decided,
        )
    }

    /// Representative ballot, once per vote and outside the overrule window
    pub fn proxy_vote(
        &mut self,
        ctx: &CallContext,
        ledger: &mut VoteLedger,
        power: &dyn VotingPowerSource,
        vote_id: VoteId,
        support: bool,
    ) -> VotingResult<Weight> {
        self.check_proxy_vote(ctx, ledger, vote_id)?;
        let weight = ledger.cast_vote(&ctx.with_sender(self.config.address), power, vote_id, support)?;
        info!(vote_id, support, weight, "representative voted through wallet");
        Ok(weight)
    }

    /// Every rejection `proxy_vote` can raise before reaching the ledger
    pub fn check_proxy_vote(
        &self,
        ctx: &CallContext,
        ledger: &VoteLedger,
        vote_id: VoteId,
    ) -> VotingResult<()> {
        // 1. Representative must be trusted for this vote
        if !self.is_authorized(&ctx.sender, &ledger.instance(), vote_id) {
            warn!(vote_id, "wallet representative not allowed");
            return Err(VotingError::RepresentativeNotAllowed {
                principal: self.config.address,
                representative: ctx.sender,
            });
        }

        // 2. Outside the wallet's overrule window
        let vote = ledger.get_vote(vote_id)?;
        if vote.within_window(ctx.timestamp, self.config.overrule_window) {
            return Err(VotingError::WithinOverruleWindow { vote_id });
        }

        // 3. Wallet has not voted
        if vote.has_voted(&self.config.address) {
            return Err(VotingError::VoteAlreadyCast {
                vote_id,
                voter: self.config.address,
            });
        }
        Ok(())
    }

    pub fn has_not_voted_yet(&self, ledger: &VoteLedger, vote_id: VoteId) -> VotingResult<bool> {
        Ok(!ledger.get_vote(vote_id)?.has_voted(&self.config.address))
    }

    /// Inside this wallet's window for `vote_id`
    pub fn within_overrule_window(
        &self,
        ledger: &VoteLedger,
        now: Timestamp,
        vote_id: VoteId,
    ) -> VotingResult<bool> {
        Ok(ledger
            .get_vote(vote_id)?
            .within_window(now, self.config.overrule_window))
    }

    // ============ Custody ============

    /// Return `amount` of `token` to the principal
    pub fn withdraw(
        &mut self,
        ctx: &CallContext,
        custody: &mut dyn TokenCustody,
        token: Address,
        amount: Weight,
    ) -> VotingResult<()> {
        self.ensure_principal(ctx)?;
        if !custody.transfer(&token, &self.config.address, &self.config.principal, amount) {
            warn!(amount, "wallet withdraw failed");
            return Err(VotingError::WithdrawFailed { token, amount });
        }
        self.events.emit(VotingEvent::ProxyWithdraw {
            wallet: self.config.address,
            token,
            amount,
            block_height: ctx.block_height,
        });
        info!(amount, "wallet withdraw");
        Ok(())
    }
}

#[cfg(test)]
mod integration_tests;
