//! Hosted goal store backend.
//!
//! # Responsibility
//! - Adapt the `GoalStore` contract onto a remote per-document collection
//!   collaborator.
//! - Keep the degraded bulk-write semantics of the remote API explicit.
//!
//! # Invariants
//! - `replace_all` issues N individual upserts; there is no atomic
//!   multi-document transaction.
//! - Every persisted document carries the owner stamp.

use crate::model::goal::Goal;
use crate::model::profile::OwnerScope;
use crate::store::{GoalListCallback, GoalStore, StoreResult, Subscription};
use log::debug;
use std::sync::Arc;

/// External document-store collaborator, scoped per owner id.
///
/// A deployment wires a live client here; tests wire an in-memory fake that
/// pushes snapshots on every write. Watch snapshots are expected newest
/// created first.
pub trait RemoteCollection: Send + Sync {
    /// Creates a document and returns the stored record with its assigned id.
    fn insert(&self, owner: &str, goal: &Goal) -> StoreResult<Goal>;

    /// Creates or overwrites a document under its existing id.
    fn upsert(&self, owner: &str, goal: &Goal) -> StoreResult<()>;

    /// Deletes one document. Unknown ids are not an error.
    fn remove(&self, owner: &str, goal_id: &str) -> StoreResult<()>;

    /// Starts live snapshot delivery for one owner.
    fn watch(&self, owner: &str, callback: GoalListCallback) -> StoreResult<Subscription>;

    /// Deletes every document belonging to one owner.
    fn clear_owner(&self, owner: &str) -> StoreResult<()>;
}

/// Facade over the remote collection collaborator.
pub struct HostedStore {
    collection: Arc<dyn RemoteCollection>,
}

impl HostedStore {
    pub fn new(collection: Arc<dyn RemoteCollection>) -> Self {
        Self { collection }
    }

    fn stamped(goal: &Goal, owner: &OwnerScope) -> Goal {
        let mut stored = goal.clone();
        stored.owner_id = Some(owner.storage_id().to_string());
        stored
    }
}

impl GoalStore for HostedStore {
    fn subscribe(
        &self,
        owner: &OwnerScope,
        callback: GoalListCallback,
    ) -> StoreResult<Subscription> {
        debug!("event=store_subscribe module=store backend=hosted owner={owner}");
        self.collection.watch(owner.storage_id(), callback)
    }

    fn add(&self, owner: &OwnerScope, goal: &Goal) -> StoreResult<Goal> {
        self.collection
            .insert(owner.storage_id(), &Self::stamped(goal, owner))
    }

    fn update(&self, owner: &OwnerScope, goal: &Goal) -> StoreResult<()> {
        self.collection
            .upsert(owner.storage_id(), &Self::stamped(goal, owner))
    }

    fn delete(&self, owner: &OwnerScope, goal_id: &str) -> StoreResult<()> {
        self.collection.remove(owner.storage_id(), goal_id)
    }

    fn replace_all(&self, owner: &OwnerScope, goals: &[Goal]) -> StoreResult<()> {
        // Degrades to per-document upserts: a failure mid-loop leaves the
        // collection partially written, exactly like the remote API.
        for goal in goals {
            self.collection
                .upsert(owner.storage_id(), &Self::stamped(goal, owner))?;
        }
        debug!(
            "event=store_replace_all module=store backend=hosted owner={owner} count={}",
            goals.len()
        );
        Ok(())
    }

    fn clear(&self, owner: &OwnerScope) -> StoreResult<()> {
        self.collection.clear_owner(owner.storage_id())
    }
}
