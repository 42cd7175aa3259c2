//! Identity collaborator boundary and the local mock implementation.
//!
//! # Responsibility
//! - Define the authentication surface the application depends on.
//! - Classify authentication failures into a small fixed set of reasons.
//! - Enforce caller-side credential validation before any collaborator I/O.
//!
//! # Invariants
//! - The collaborator is the sole source of truth for `is_premium`.
//! - Credential validation failures never reach the collaborator.

use crate::model::profile::UserProfile;
use crate::repo::blob_repo::BlobRepository;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Storage key for the active session profile.
pub const SESSION_KEY: &str = "auth/session";
/// Storage key for the mock account registry.
pub const USERS_KEY: &str = "auth/users";

/// Minimum password length, enforced by the caller, not the collaborator.
pub const MIN_PASSWORD_CHARS: usize = 6;

pub type AuthResult<T> = Result<T, AuthError>;

/// Third-party identity providers the app can sign in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    Apple,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Apple => "apple",
        }
    }
}

/// Authentication failure reasons surfaced to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Caller-side validation: password shorter than `MIN_PASSWORD_CHARS`.
    PasswordTooShort,
    /// Caller-side validation: registration without a display name.
    MissingName,
    AlreadyRegistered,
    NotFound,
    WrongPassword,
    /// Generic collaborator failure.
    Other(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PasswordTooShort => write!(
                f,
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            ),
            Self::MissingName => write!(f, "a display name is required"),
            Self::AlreadyRegistered => write!(f, "this email is already registered"),
            Self::NotFound => write!(f, "no account found for this email"),
            Self::WrongPassword => write!(f, "incorrect password"),
            Self::Other(message) => write!(f, "authentication failed: {message}"),
        }
    }
}

impl Error for AuthError {}

/// Rejects passwords the UI must never send to the collaborator.
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// Registration-only validation on top of `validate_password`.
pub fn validate_registration(name: &str, password: &str) -> AuthResult<()> {
    validate_password(password)?;
    if name.trim().is_empty() {
        return Err(AuthError::MissingName);
    }
    Ok(())
}

/// Authentication surface consumed by the state controller.
///
/// `load_session` is a one-shot read of the persisted session: the local
/// collaborator has no live session stream, matching the local store's
/// one-shot subscription shape.
pub trait IdentityProvider: Send + Sync {
    fn sign_in_with_provider(&self, provider: ProviderKind) -> AuthResult<UserProfile>;
    fn register_with_password(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> AuthResult<UserProfile>;
    fn login_with_password(&self, email: &str, password: &str) -> AuthResult<UserProfile>;
    fn logout(&self) -> AuthResult<()>;
    fn delete_account(&self, uid: &str) -> AuthResult<()>;
    fn load_session(&self) -> AuthResult<Option<UserProfile>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredAccount {
    profile: UserProfile,
    // Plain text is acceptable only because this collaborator is the local
    // development mock; a real deployment replaces this implementation.
    password: String,
}

/// Local mock collaborator backed by the blob repository.
///
/// Registered accounts live under `auth/users`; the active session under
/// `auth/session`. Provider sign-in yields fixed demo profiles.
pub struct LocalIdentity {
    repo: Arc<dyn BlobRepository>,
}

impl LocalIdentity {
    pub fn new(repo: Arc<dyn BlobRepository>) -> Self {
        Self { repo }
    }

    fn load_users(&self) -> AuthResult<BTreeMap<String, StoredAccount>> {
        match self.repo.get(USERS_KEY).map_err(backend_failure)? {
            Some(raw) => serde_json::from_str(&raw).map_err(backend_failure),
            None => Ok(BTreeMap::new()),
        }
    }

    fn save_users(&self, users: &BTreeMap<String, StoredAccount>) -> AuthResult<()> {
        let raw = serde_json::to_string(users).map_err(backend_failure)?;
        self.repo.put(USERS_KEY, &raw).map_err(backend_failure)
    }

    fn save_session(&self, profile: &UserProfile) -> AuthResult<()> {
        let raw = serde_json::to_string(profile).map_err(backend_failure)?;
        self.repo.put(SESSION_KEY, &raw).map_err(backend_failure)
    }

    fn demo_profile(provider: ProviderKind) -> UserProfile {
        match provider {
            ProviderKind::Google => UserProfile {
                uid: "demo-google".to_string(),
                email: Some("demo@tally.app".to_string()),
                display_name: Some("Demo User".to_string()),
                photo_url: None,
                is_premium: false,
            },
            ProviderKind::Apple => UserProfile {
                uid: "demo-apple".to_string(),
                email: Some("user@icloud.com".to_string()),
                display_name: Some("Apple User".to_string()),
                photo_url: None,
                is_premium: false,
            },
        }
    }
}

impl IdentityProvider for LocalIdentity {
    fn sign_in_with_provider(&self, provider: ProviderKind) -> AuthResult<UserProfile> {
        let profile = Self::demo_profile(provider);
        self.save_session(&profile)?;
        info!(
            "event=auth_sign_in module=session status=ok provider={}",
            provider.as_str()
        );
        Ok(profile)
    }

    fn register_with_password(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> AuthResult<UserProfile> {
        let email = email.trim().to_string();
        let mut users = self.load_users()?;
        if users.contains_key(&email) {
            return Err(AuthError::AlreadyRegistered);
        }

        let profile = UserProfile {
            uid: format!("user-{}", Uuid::new_v4()),
            email: Some(email.clone()),
            display_name: Some(name.trim().to_string()),
            photo_url: None,
            is_premium: false,
        };
        users.insert(
            email,
            StoredAccount {
                profile: profile.clone(),
                password: password.to_string(),
            },
        );
        self.save_users(&users)?;
        self.save_session(&profile)?;
        info!(
            "event=auth_register module=session status=ok uid={}",
            profile.uid
        );
        Ok(profile)
    }

    fn login_with_password(&self, email: &str, password: &str) -> AuthResult<UserProfile> {
        let users = self.load_users()?;
        let account = users.get(email.trim()).ok_or(AuthError::NotFound)?;
        if account.password != password {
            return Err(AuthError::WrongPassword);
        }
        self.save_session(&account.profile)?;
        info!(
            "event=auth_login module=session status=ok uid={}",
            account.profile.uid
        );
        Ok(account.profile.clone())
    }

    fn logout(&self) -> AuthResult<()> {
        self.repo.delete(SESSION_KEY).map_err(backend_failure)
    }

    fn delete_account(&self, uid: &str) -> AuthResult<()> {
        let mut users = self.load_users()?;
        users.retain(|_, account| account.profile.uid != uid);
        self.save_users(&users)?;
        self.repo.delete(SESSION_KEY).map_err(backend_failure)?;
        info!("event=auth_delete_account module=session status=ok uid={uid}");
        Ok(())
    }

    fn load_session(&self) -> AuthResult<Option<UserProfile>> {
        match self.repo.get(SESSION_KEY).map_err(backend_failure)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(backend_failure)?)),
            None => Ok(None),
        }
    }
}

fn backend_failure(err: impl Display) -> AuthError {
    AuthError::Other(err.to_string())
}
