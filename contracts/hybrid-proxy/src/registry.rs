//! Proxy Wallet Registry
//!
//! Creates principal wallets and hybrid representative proxies and
//! remembers which addresses it created. Addresses are derived
//! deterministically from the registry address and a running nonce.

use sha2::{Digest, Sha256};
use tracing::info;

use proxyvote_common::{
    constants::domains,
    errors::{VotingError, VotingResult},
    events::{EventLog, VotingEvent},
    types::{Address, CallContext},
    BTreeSet,
};
use proxyvote_principal_proxy::PrincipalProxyWallet;

use crate::proxy::HybridRepresentativeProxy;

#[derive(Debug, Clone)]
pub struct ProxyWalletRegistry {
    address: Address,
    nonce: u64,
    wallets: BTreeSet<Address>,
    proxies: BTreeSet<Address>,
    events: EventLog,
}

impl ProxyWalletRegistry {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            nonce: 0,
            wallets: BTreeSet::new(),
            proxies: BTreeSet::new(),
            events: EventLog::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Derive the next contract address
    ///
    /// address = sha256(domain || registry || nonce_le)
    fn next_address(&mut self, domain: &[u8]) -> VotingResult<Address> {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(self.address);
        hasher.update(self.nonce.to_le_bytes());
        self.nonce = self.nonce.checked_add(1).ok_or(VotingError::Overflow)?;
        Ok(hasher.finalize().into())
    }

    /// Create a wallet owned by the sender
    pub fn new_proxy_wallet(
        &mut self,
        ctx: &CallContext,
        overrule_window: u64,
    ) -> VotingResult<PrincipalProxyWallet> {
        let wallet = self.next_address(domains::PROXY_WALLET)?;
        self.wallets.insert(wallet);
        self.events.emit(VotingEvent::NewProxyWallet {
            registry: self.address,
            wallet,
            principal: ctx.sender,
            overrule_window,
            block_height: ctx.block_height,
        });
        info!(overrule_window, "proxy wallet registered");
        Ok(PrincipalProxyWallet::new(wallet, ctx.sender, overrule_window))
    }

    /// Create a representative proxy run by the sender
    pub fn new_representative_proxy(
        &mut self,
        ctx: &CallContext,
        overrule_window: u64,
    ) -> VotingResult<HybridRepresentativeProxy> {
        let proxy = self.next_address(domains::REPRESENTATIVE_PROXY)?;
        self.proxies.insert(proxy);
        self.events.emit(VotingEvent::NewRepresentativeProxy {
            registry: self.address,
            proxy,
            representative: ctx.sender,
            overrule_window,
            block_height: ctx.block_height,
        });
        info!(overrule_window, "representative proxy registered");
        Ok(HybridRepresentativeProxy::new(
            proxy,
            ctx.sender,
            self.address,
            overrule_window,
        ))
    }

    pub fn is_valid_proxy_wallet(&self, wallet: &Address) -> bool {
        self.wallets.contains(wallet)
    }

    pub fn is_valid_representative_proxy(&self, proxy: &Address) -> bool {
        self.proxies.contains(proxy)
    }

    pub fn wallets_count(&self) -> usize {
        self.wallets.len()
    }
}
