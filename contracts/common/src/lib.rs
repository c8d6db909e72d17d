//! proxyvote Common Library
//!
//! Shared types, constants, and utilities for all proxyvote contracts.
//!
//! ## Model
//!
//! Every contract in the workspace is a plain state struct mutated by
//! operations that take a [`CallContext`] (sender, clock, block height).
//! Operations validate first and then apply, so a failed call leaves the
//! state untouched:
//! - **Snapshots**: voting weight is read from a [`VotingPowerSource`] at the
//!   block before a vote was created
//! - **Frozen policy**: each vote owns a copy of the [`VotingSettings`] in
//!   force when it was created
//! - **Events**: every state transition is recorded in an [`EventLog`]
//! - **Collaborators**: token custody and action execution are consumed
//!   through the traits in [`traits`]
//!
//! This crate is `no_std` compatible (with `alloc`) when built without the
//! default `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::{BTreeMap, BTreeSet}, string::String, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::{BTreeMap, BTreeSet}, string::String, vec::Vec};

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod traits;
pub mod access_control;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;


// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use traits::*;
pub use access_control::*;
pub use validation::*;
