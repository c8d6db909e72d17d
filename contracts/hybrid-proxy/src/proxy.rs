//! Hybrid Representative Proxy
//!
//! A representative's voting handle for wallets created by the same
//! [`ProxyWalletRegistry`]. Wallets name the proxy through
//! [`HybridRepresentation::set_hybrid_representative`]; the proxy then
//! votes through each of them with the wallet's own weight, under the
//! wallet's own overrule window.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use proxyvote_common::{
    errors::{VotingError, VotingResult},
    events::{EventLog, VotingEvent},
    math::safe_add_weight,
    traits::VotingPowerSource,
    types::{Address, CallContext, VoteId, Weight},
    validation, BTreeSet, Vec,
};
use proxyvote_principal_proxy::PrincipalProxyWallet;
use proxyvote_voting::VoteLedger;

use crate::registry::ProxyWalletRegistry;

// ============ Config ============

/// Immutable proxy identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct HybridConfig {
    /// Address the proxy calls wallets as
    pub address: Address,
    /// Owner of the proxy
    pub representative: Address,
    /// Registry whose wallets the proxy accepts
    pub registry: Address,
    /// Trailing part of each vote in which the proxy stops casting
    pub overrule_window: u64,
}

/// Delegation layer a wallet grants to a hybrid proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationScope {
    /// Every vote of every instance
    Full,
    /// Every vote of one instance
    Instance(Address),
    /// One vote of one instance
    Vote(Address, VoteId),
}

#[derive(Debug, Clone)]
pub struct HybridRepresentativeProxy {
    config: HybridConfig,
    /// Wallets that named this proxy
    wallets: BTreeSet<Address>,
    blacklist: BTreeSet<Address>,
    events: EventLog,
}

impl HybridRepresentativeProxy {
    pub fn new(
        address: Address,
        representative: Address,
        registry: Address,
        overrule_window: u64,
    ) -> Self {
        Self {
            config: HybridConfig {
                address,
                representative,
                registry,
                overrule_window,
            },
            wallets: BTreeSet::new(),
            blacklist: BTreeSet::new(),
            events: EventLog::new(),
        }
    }

    pub fn config(&self) -> &HybridConfig {
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

    pub fn is_tracking(&self, wallet: &Address) -> bool {
        self.wallets.contains(wallet)
    }

    pub fn tracked_count(&self) -> usize {
        self.wallets.len()
    }

    fn ensure_representative(&self, ctx: &CallContext) -> VotingResult<()> {
        if ctx.sender != self.config.representative {
            warn!("hybrid proxy call from non-representative");
            return Err(VotingError::SenderNotRepresentative {
                expected: self.config.representative,
                actual: ctx.sender,
            });
        }
        Ok(())
    }

    // ============ Wallet Tracking ============

    /// Called by a wallet (as `ctx.sender`) granting or revoking a layer
    ///
    /// Revoking one layer may leave others in place, so a revoke keeps the
    /// wallet tracked; `proxy_votes` rechecks the layers per vote.
    pub fn accept_wallet(
        &mut self,
        ctx: &CallContext,
        registry: &ProxyWalletRegistry,
        allowed: bool,
    ) -> VotingResult<()> {
        // 1. Only wallets from our registry
        if registry.address() != self.config.registry
            || !registry.is_valid_proxy_wallet(&ctx.sender)
        {
            warn!("representation from unregistered wallet");
            return Err(VotingError::SenderNotProxyWallet { sender: ctx.sender });
        }

        // 2. Representative may refuse the wallet
        if allowed && self.blacklist.contains(&ctx.sender) {
            warn!("representation from blacklisted wallet");
            return Err(VotingError::BlacklistedSender { sender: ctx.sender });
        }

        if allowed && self.wallets.insert(ctx.sender) {
            debug!("wallet tracked by hybrid proxy");
        }
        Ok(())
    }

    /// Refuse (or readmit) a wallet; refusing also stops voting through it
    pub fn blacklist_wallet(
        &mut self,
        ctx: &CallContext,
        wallet: Address,
        blacklisted: bool,
    ) -> VotingResult<()> {
        self.ensure_representative(ctx)?;
        if blacklisted {
            self.blacklist.insert(wallet);
            self.wallets.remove(&wallet);
        } else {
            self.blacklist.remove(&wallet);
        }
        self.events.emit(VotingEvent::ChangeBlacklist {
            representative: self.config.representative,
            principal: wallet,
            blacklisted,
            block_height: ctx.block_height,
        });
        Ok(())
    }

    pub fn is_blacklisted(&self, wallet: &Address) -> bool {
        self.blacklist.contains(wallet)
    }

    // ============ Voting ============

    /// Vote through every tracked wallet on several votes at once
    ///
    /// For entry `i`, each tracked wallet in `wallets` whose layers trust
    /// this proxy for (`instances[i]`, `vote_ids[i]`) casts `supports[i]`
    /// with its own weight. Wallets without weight at the snapshot are
    /// skipped. Every ballot is checked before any is written; a wallet
    /// that already voted or is inside its overrule window fails the whole
    /// call. Returns the total weight cast.
    #[allow(clippy::too_many_arguments)]
    pub fn proxy_votes(
        &mut self,
        ctx: &CallContext,
        wallets: &mut [&mut PrincipalProxyWallet],
        ledgers: &mut [&mut VoteLedger],
        power: &dyn VotingPowerSource,
        instances: &[Address],
        vote_ids: &[VoteId],
        supports: &[bool],
    ) -> VotingResult<Weight> {
        self.ensure_representative(ctx)?;
        let len = validation::validate_batch(&[instances.len(), vote_ids.len(), supports.len()])?;

        // 1. Plan every ballot
        let proxy = self.config.address;
        let as_proxy = ctx.with_sender(proxy);
        let mut ballots = Vec::new();
        let mut seen = BTreeSet::new();
        for index in 0..len {
            let (instance, vote_id) = (instances[index], vote_ids[index]);
            let slot = ledgers
                .iter()
                .position(|l| l.instance() == instance)
                .ok_or(VotingError::UnknownInstance { instance })?;
            let ledger = &*ledgers[slot];
            let vote = ledger.get_vote(vote_id)?;

            if vote.within_window(ctx.timestamp, self.config.overrule_window) {
                return Err(VotingError::WithinOverruleWindow { vote_id });
            }

            for (position, wallet) in wallets.iter().enumerate() {
                let address = wallet.address();
                if !self.wallets.contains(&address) || !wallet.is_authorized(&proxy, &instance, vote_id) {
                    continue;
                }
                if !vote.is_open(ctx.timestamp) {
                    return Err(VotingError::CanNotVote { vote_id, voter: address });
                }
                if power.balance_of_at(&address, vote.snapshot_block) == 0 {
                    debug!(vote_id, "skipping wallet without weight");
                    continue;
                }
                wallet.check_proxy_vote(&as_proxy, ledger, vote_id)?;
                if !seen.insert((address, instance, vote_id)) {
                    return Err(VotingError::VoteAlreadyCast { vote_id, voter: address });
                }
                ballots.push((position, slot, vote_id, supports[index]));
            }
        }

        // 2. Cast through the wallets
        let mut total = 0;
        for &(position, slot, vote_id, support) in &ballots {
            let weight = wallets[position].proxy_vote(&as_proxy, &mut *ledgers[slot], power, vote_id, support)?;
            total = safe_add_weight(total, weight)?;
        }
        info!(ballots = ballots.len(), total, "hybrid proxy votes cast");
        Ok(total)
    }
}

// ============ Wallet Side ============

/// Linking a wallet to a hybrid proxy, notifying the proxy
pub trait HybridRepresentation {
    fn set_hybrid_representative(
        &mut self,
        ctx: &CallContext,
        registry: &ProxyWalletRegistry,
        proxy: &mut HybridRepresentativeProxy,
        scope: RepresentationScope,
        allowed: bool,
    ) -> VotingResult<()>;
}

impl HybridRepresentation for PrincipalProxyWallet {
    fn set_hybrid_representative(
        &mut self,
        ctx: &CallContext,
        registry: &ProxyWalletRegistry,
        proxy: &mut HybridRepresentativeProxy,
        scope: RepresentationScope,
        allowed: bool,
    ) -> VotingResult<()> {
        // 1. Only the owner links its wallet
        if ctx.sender != self.principal() {
            return Err(VotingError::SenderNotPrincipal {
                expected: self.principal(),
                actual: ctx.sender,
            });
        }

        // 2. The proxy vets the wallet before anything is recorded
        proxy.accept_wallet(&ctx.with_sender(self.address()), registry, allowed)?;

        // 3. Record the layer
        let representative = proxy.address();
        match scope {
            RepresentationScope::Full => self.set_full_representative(ctx, representative, allowed),
            RepresentationScope::Instance(instance) => {
                self.set_instance_representative(ctx, representative, instance, allowed)
            }
            RepresentationScope::Vote(instance, vote_id) => {
                self.set_vote_representative(ctx, representative, instance, vote_id, allowed)
            }
        }
    }
}
