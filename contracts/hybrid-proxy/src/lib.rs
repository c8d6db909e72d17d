//! Hybrid Proxy Voting
//!
//! Principals keep their tokens in their own [`PrincipalProxyWallet`]s, and
//! representatives run a [`HybridRepresentativeProxy`] that votes through
//! every wallet naming it. Both are created by a [`ProxyWalletRegistry`],
//! which is how a proxy recognises genuine wallets.
//!
//! Unlike the pooled variant, weight never leaves the principal's wallet,
//! and each wallet keeps its own overrule window.

pub mod proxy;
pub mod registry;


pub use proxy::{HybridConfig, HybridRepresentation, HybridRepresentativeProxy, RepresentationScope};
pub use registry::ProxyWalletRegistry;

pub use proxyvote_principal_proxy::PrincipalProxyWallet;
