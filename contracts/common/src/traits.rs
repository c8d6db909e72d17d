//! External Collaborators
//!
//! The governance core never stores balances or runs actions itself. It
//! reads weights from a [`VotingPowerSource`], moves tokens through
//! [`TokenCustody`], and hands approved scripts to an [`ActionRunner`].

use crate::types::{Address, Weight};

/// Checkpointed token balances
pub trait VotingPowerSource {
    /// Balance of `account` as of block `snapshot`
    fn balance_of_at(&self, account: &Address, snapshot: u64) -> Weight;

    /// Total supply as of block `snapshot`
    fn total_supply_at(&self, snapshot: u64) -> Weight;
}

/// Failure reported by an [`ActionRunner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptError {
    /// Position of the first action that failed
    pub action_index: u32,
}

/// Executes an approved action script, all-or-nothing
pub trait ActionRunner {
    fn run(&mut self, script: &[u8]) -> Result<(), ScriptError>;
}

/// Token transfers used by the proxies to take and return custody
///
/// Both calls report success as a bool, mirroring token contracts that
/// signal failure through their return value.
pub trait TokenCustody {
    /// Move `amount` of `token` held by `from` to `to`
    fn transfer(&mut self, token: &Address, from: &Address, to: &Address, amount: Weight) -> bool;

    /// Move `amount` of `token` from `from` to `to` using the allowance
    /// `from` granted to `spender`
    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Weight,
    ) -> bool;
}
