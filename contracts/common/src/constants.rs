//! Protocol Constants
//!
//! All magic numbers and default configuration values for proxyvote.

/// Fixed-point percentages
pub mod pct {
    /// 100% (10^18)
    pub const PCT_BASE: u64 = 1_000_000_000_000_000_000;

    /// 1%
    pub const ONE_PERCENT: u64 = PCT_BASE / 100;

    /// 50%
    pub const HALF: u64 = PCT_BASE / 2;
}

/// Durations in seconds
pub mod time {
    pub const ONE_MINUTE: u64 = 60;
    pub const ONE_HOUR: u64 = 60 * ONE_MINUTE;
    pub const ONE_DAY: u64 = 24 * ONE_HOUR;
}

/// Voting defaults and limits
pub mod voting {
    /// Upper bound on entries in one batched proxy cast
    pub const MAX_BATCH_LEN: usize = 100;

    /// Overrule window applied when none is configured
    pub const DEFAULT_OVERRULE_WINDOW: u64 = 0;

    /// Early execution is enabled on fresh ledgers
    pub const DEFAULT_EARLY_EXECUTION: bool = true;
}

/// Access control
pub mod acl {
    /// Grantee meaning "any sender"
    pub const ANY_ADDRESS: [u8; 32] = [0xff; 32];
}

/// Address derivation domain tags (hashed with sha256)
pub mod domains {
    pub const PROXY_WALLET: &[u8] = b"proxyvote/proxy-wallet";
    pub const REPRESENTATIVE_PROXY: &[u8] = b"proxyvote/representative-proxy";
}

// Re-export commonly used constants at module level
pub use pct::PCT_BASE;
pub use time::ONE_DAY;
pub use voting::MAX_BATCH_LEN;
pub use acl::ANY_ADDRESS;
