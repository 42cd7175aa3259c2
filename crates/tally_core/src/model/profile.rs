//! User profile and owner-scope partitioning.
//!
//! # Responsibility
//! - Define the authenticated profile record delivered by the identity
//!   collaborator.
//! - Map the active session onto exactly one storage partition.
//!
//! # Invariants
//! - Exactly one owner scope is active at a time; there is no multi-scope
//!   merge.
//! - The identity collaborator is the sole source of truth for `is_premium`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Storage partition key for unauthenticated use.
pub const GUEST_STORAGE_ID: &str = "guest";

/// Profile for an authenticated user.
///
/// Created on successful authentication, destroyed on account deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub is_premium: bool,
}

/// The partition of stored data the application is currently reading and
/// writing: either the guest pseudo-user or an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerScope {
    Guest,
    User(String),
}

impl OwnerScope {
    /// Scope for an authenticated profile.
    pub fn for_profile(profile: &UserProfile) -> Self {
        Self::User(profile.uid.clone())
    }

    /// Key under which this scope's data is partitioned in storage.
    pub fn storage_id(&self) -> &str {
        match self {
            Self::Guest => GUEST_STORAGE_ID,
            Self::User(uid) => uid.as_str(),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}

impl Display for OwnerScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_id())
    }
}
