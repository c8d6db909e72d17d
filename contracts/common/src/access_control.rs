//! Access Control Module
//!
//! Permission list guarding vote creation and policy changes on a ledger.
//!
//! A permission is granted either to a specific address or to
//! [`ANY_ADDRESS`], which matches every sender. Holders of
//! [`Permission::ManagePermissions`] grant and revoke the rest.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::acl::ANY_ADDRESS;
use crate::errors::{VotingError, VotingResult};
use crate::types::Address;
use crate::BTreeSet;

// ============================================================================
// Types
// ============================================================================

/// Guarded ledger operations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Permission {
    /// Create votes and forward scripts
    CreateVotes = 0,
    /// Change the required support
    ModifySupport = 1,
    /// Change the minimum quorum
    ModifyQuorum = 2,
    /// Change the overrule window
    ModifyOverruleWindow = 3,
    /// Toggle early execution
    ModifyEarlyExecution = 4,
    /// Grant and revoke permissions
    ManagePermissions = 5,
}

impl Permission {
    /// Permissions changing ledger policy
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Permission::ModifySupport
                | Permission::ModifyQuorum
                | Permission::ModifyOverruleWindow
                | Permission::ModifyEarlyExecution
        )
    }
}

/// Granted (permission, grantee) pairs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessControlState {
    grants: BTreeSet<(Permission, Address)>,
}

impl AccessControlState {
    /// Empty list; nothing is permitted
    pub fn new() -> Self {
        Self::default()
    }

    /// Anyone may create votes; `manager` holds every other permission
    pub fn with_defaults(manager: Address) -> Self {
        let mut state = Self::new();
        state.grants.insert((Permission::CreateVotes, ANY_ADDRESS));
        for permission in [
            Permission::ModifySupport,
            Permission::ModifyQuorum,
            Permission::ModifyOverruleWindow,
            Permission::ModifyEarlyExecution,
            Permission::ManagePermissions,
        ] {
            state.grants.insert((permission, manager));
        }
        state
    }

    pub fn grants_count(&self) -> usize {
        self.grants.len()
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Check whether `who` holds `permission`, directly or through ANY_ADDRESS
pub fn has_permission(state: &AccessControlState, who: &Address, permission: Permission) -> bool {
    state.grants.contains(&(permission, *who)) || state.grants.contains(&(permission, ANY_ADDRESS))
}

/// Fail with `Unauthorized` unless `who` holds `permission`
pub fn require_permission(
    state: &AccessControlState,
    who: &Address,
    permission: Permission,
) -> VotingResult<()> {
    if !has_permission(state, who, permission) {
        warn!(?permission, "permission denied");
        return Err(VotingError::Unauthorized {
            permission,
            sender: *who,
        });
    }
    Ok(())
}

/// Grant `permission` to `grantee`
///
/// Returns false if the grant already existed.
pub fn grant_permission(
    state: &mut AccessControlState,
    caller: &Address,
    permission: Permission,
    grantee: Address,
) -> VotingResult<bool> {
    require_permission(state, caller, Permission::ManagePermissions)?;
    let inserted = state.grants.insert((permission, grantee));
    debug!(?permission, inserted, "permission granted");
    Ok(inserted)
}

/// Revoke `permission` from `grantee`
///
/// Revoking from ANY_ADDRESS does not touch explicit grants.
pub fn revoke_permission(
    state: &mut AccessControlState,
    caller: &Address,
    permission: Permission,
    grantee: &Address,
) -> VotingResult<bool> {
    require_permission(state, caller, Permission::ManagePermissions)?;
    let removed = state.grants.remove(&(permission, *grantee));
    debug!(?permission, removed, "permission revoked");
    Ok(removed)
}
