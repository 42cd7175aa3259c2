//! Goal store facade: one capability interface over two persistence
//! backends.
//!
//! # Responsibility
//! - Define the `GoalStore` contract the state controller writes through.
//! - Select exactly one backend at startup from configuration.
//!
//! # Invariants
//! - Backend choice is fixed for the process lifetime; call sites never
//!   branch on the backend.
//! - `subscribe` hands back a cancellation handle; callers must cancel it
//!   when switching owner scope so delivery cannot leak into a stale
//!   context.

pub mod hosted;
pub mod local;

use crate::model::goal::Goal;
use crate::model::profile::OwnerScope;
use crate::repo::blob_repo::{BlobRepository, RepoError};
use hosted::{HostedStore, RemoteCollection};
use local::LocalStore;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

/// Callback receiving a full goal-list snapshot for the subscribed owner.
pub type GoalListCallback = Box<dyn Fn(Vec<Goal>) + Send + Sync>;

/// Storage-layer error taxonomy.
#[derive(Debug)]
pub enum StoreError {
    /// Local persistence failure.
    Repo(RepoError),
    /// Persisted blob could not be encoded/decoded.
    Codec(serde_json::Error),
    /// Remote backend failure, already flattened to a message.
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "goal blob codec failure: {err}"),
            Self::Backend(message) => write!(f, "store backend failure: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Backend(_) => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// Cancellation handle returned by `GoalStore::subscribe`.
///
/// Cancels on drop as well; `unsubscribe` exists for call sites that want
/// the cancellation to be visible in the flow.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle for backends whose delivery ends on its own (one-shot reads).
    pub fn no_op() -> Self {
        Self { cancel: None }
    }

    /// Cancels delivery explicitly.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Storage contract the application state controller writes through.
pub trait GoalStore: Send + Sync {
    /// Starts delivery of goal-list snapshots for one owner scope.
    ///
    /// Hosted backends deliver repeatedly; the local backend delivers exactly
    /// once per call and never again until re-invoked.
    fn subscribe(&self, owner: &OwnerScope, callback: GoalListCallback)
        -> StoreResult<Subscription>;

    /// Persists a new goal and returns the stored record, including any
    /// backend-assigned id.
    fn add(&self, owner: &OwnerScope, goal: &Goal) -> StoreResult<Goal>;

    /// Full-record overwrite by id. An unknown id is not an error.
    fn update(&self, owner: &OwnerScope, goal: &Goal) -> StoreResult<()>;

    /// Removes one goal. No tombstoning.
    fn delete(&self, owner: &OwnerScope, goal_id: &str) -> StoreResult<()>;

    /// Overwrites the owner's entire list; array position is display order.
    fn replace_all(&self, owner: &OwnerScope, goals: &[Goal]) -> StoreResult<()>;

    /// Drops the owner's whole partition (account deletion).
    fn clear(&self, owner: &OwnerScope) -> StoreResult<()>;
}

/// Storage key for an owner's goal list blob.
pub fn goals_key(owner: &OwnerScope) -> String {
    format!("goals/{}", owner.storage_id())
}

/// Which backend the process runs against. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Local,
    Hosted,
}

/// Startup configuration for the store facade.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Optional artificial delay before the local backend's one-shot
    /// subscription read, mirroring a network round trip.
    pub simulated_latency: Option<Duration>,
}

/// Builds the configured backend.
///
/// # Errors
/// - `Backend` when the hosted backend is selected without a remote
///   collection collaborator.
pub fn open_store(
    config: &StoreConfig,
    repo: Arc<dyn BlobRepository>,
    remote: Option<Arc<dyn RemoteCollection>>,
) -> StoreResult<Arc<dyn GoalStore>> {
    match config.backend {
        StoreBackend::Local => Ok(Arc::new(match config.simulated_latency {
            Some(latency) => LocalStore::with_simulated_latency(repo, latency),
            None => LocalStore::new(repo),
        })),
        StoreBackend::Hosted => {
            let collection = remote.ok_or_else(|| {
                StoreError::Backend(
                    "hosted backend selected without a remote collection".to_string(),
                )
            })?;
            Ok(Arc::new(HostedStore::new(collection)))
        }
    }
}
