//! Voting Contract
//!
//! Snapshot-weighted votes with representative delegation.
//!
//! - [`VoteLedger`] creates votes, tallies ballots, and executes approved
//!   scripts exactly once
//! - [`DelegationRegistry`] records which representatives a principal
//!   trusts, globally, per ledger instance, or per vote
//! - The casting controller (`casting`) lets representatives vote for
//!   principals outside the overrule window, singly or in batches

pub mod casting;
pub mod delegation;
pub mod ledger;


pub use delegation::DelegationRegistry;
pub use ledger::{script_hash, VoteLedger};
