//! Test doubles for the external collaborators
//!
//! Enabled for this crate's own tests and, through the `test-utils`
//! feature, for the contract crates' tests.

use crate::traits::{ActionRunner, ScriptError, TokenCustody, VotingPowerSource};
use crate::types::{Address, Weight};
use crate::{BTreeMap, Vec};

/// Checkpointed balances on a block clock
///
/// Writes land at the current block; reads at a snapshot see the last
/// write at or before it.
#[derive(Debug, Clone, Default)]
pub struct CheckpointToken {
    address: Address,
    block: u64,
    balances: BTreeMap<Address, Vec<(u64, Weight)>>,
    supply: Vec<(u64, Weight)>,
    /// (owner, spender) -> amount
    allowances: BTreeMap<(Address, Address), Weight>,
    fail_transfers: bool,
}

fn value_at(checkpoints: &[(u64, Weight)], snapshot: u64) -> Weight {
    checkpoints
        .iter()
        .rev()
        .find(|(block, _)| *block <= snapshot)
        .map(|(_, value)| *value)
        .unwrap_or(0)
}

fn latest(checkpoints: &[(u64, Weight)]) -> Weight {
    checkpoints.last().map(|(_, value)| *value).unwrap_or(0)
}

fn write(checkpoints: &mut Vec<(u64, Weight)>, block: u64, value: Weight) {
    match checkpoints.last_mut() {
        Some((last_block, last_value)) if *last_block == block => *last_value = value,
        _ => checkpoints.push((block, value)),
    }
}

impl CheckpointToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    /// Advance the clock; must not go backwards
    pub fn set_block(&mut self, block: u64) {
        self.block = self.block.max(block);
    }

    pub fn mint(&mut self, to: Address, amount: Weight) {
        let balance = self.balance_of(&to) + amount;
        let supply = self.total_supply() + amount;
        write(self.balances.entry(to).or_default(), self.block, balance);
        write(&mut self.supply, self.block, supply);
    }

    pub fn balance_of(&self, account: &Address) -> Weight {
        self.balances.get(account).map(|c| latest(c)).unwrap_or(0)
    }

    pub fn total_supply(&self) -> Weight {
        latest(&self.supply)
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: Weight) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Weight {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Make every following transfer report failure
    pub fn set_fail_transfers(&mut self, fail: bool) {
        self.fail_transfers = fail;
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: Weight) -> bool {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return false;
        }
        let block = self.block;
        write(self.balances.entry(*from).or_default(), block, from_balance - amount);
        let to_balance = self.balance_of(to) + amount;
        write(self.balances.entry(*to).or_default(), block, to_balance);
        true
    }
}

impl VotingPowerSource for CheckpointToken {
    fn balance_of_at(&self, account: &Address, snapshot: u64) -> Weight {
        self.balances
            .get(account)
            .map(|c| value_at(c, snapshot))
            .unwrap_or(0)
    }

    fn total_supply_at(&self, snapshot: u64) -> Weight {
        value_at(&self.supply, snapshot)
    }
}

impl TokenCustody for CheckpointToken {
    fn transfer(&mut self, token: &Address, from: &Address, to: &Address, amount: Weight) -> bool {
        if self.fail_transfers || *token != self.address {
            return false;
        }
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Weight,
    ) -> bool {
        if self.fail_transfers || *token != self.address {
            return false;
        }
        let allowance = self.allowance(from, spender);
        if allowance < amount || !self.move_balance(from, to, amount) {
            return false;
        }
        self.allowances.insert((*from, *spender), allowance - amount);
        true
    }
}

/// Records every script it runs; fails on a poison byte
///
/// Each byte of a script is treated as one action.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    executed: Vec<Vec<u8>>,
    poison: Option<u8>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that rejects any script containing `action`
    pub fn failing_on(action: u8) -> Self {
        Self {
            executed: Vec::new(),
            poison: Some(action),
        }
    }

    pub fn runs(&self) -> usize {
        self.executed.len()
    }

    pub fn executed(&self) -> &[Vec<u8>] {
        &self.executed
    }
}

impl ActionRunner for RecordingRunner {
    fn run(&mut self, script: &[u8]) -> Result<(), ScriptError> {
        if let Some(poison) = self.poison {
            if let Some(index) = script.iter().position(|action| *action == poison) {
                return Err(ScriptError {
                    action_index: index as u32,
                });
            }
        }
        self.executed.push(script.to_vec());
        Ok(())
    }
}
