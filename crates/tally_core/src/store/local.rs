//! Local goal store backend.
//!
//! # Responsibility
//! - Persist each owner's goal list as one ordered JSON blob.
//! - Simulate the hosted backend's subscription shape with a one-shot read.
//!
//! # Invariants
//! - The blob's array order is the display order.
//! - `subscribe` delivers exactly once per call; the returned handle is a
//!   no-op because there is nothing left to cancel.

use crate::model::goal::Goal;
use crate::model::profile::OwnerScope;
use crate::repo::blob_repo::BlobRepository;
use crate::store::{goals_key, GoalListCallback, GoalStore, StoreResult, Subscription};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Durable key-value backend for guest use and offline deployments.
pub struct LocalStore {
    repo: Arc<dyn BlobRepository>,
    simulated_latency: Option<Duration>,
}

impl LocalStore {
    pub fn new(repo: Arc<dyn BlobRepository>) -> Self {
        Self {
            repo,
            simulated_latency: None,
        }
    }

    /// Adds an artificial delay before the subscription read, mirroring the
    /// network round trip a hosted deployment would pay.
    pub fn with_simulated_latency(repo: Arc<dyn BlobRepository>, latency: Duration) -> Self {
        Self {
            repo,
            simulated_latency: Some(latency),
        }
    }

    fn load(&self, owner: &OwnerScope) -> StoreResult<Vec<Goal>> {
        match self.repo.get(&goals_key(owner))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, owner: &OwnerScope, goals: &[Goal]) -> StoreResult<()> {
        let raw = serde_json::to_string(goals)?;
        self.repo.put(&goals_key(owner), &raw)?;
        Ok(())
    }
}

impl GoalStore for LocalStore {
    fn subscribe(
        &self,
        owner: &OwnerScope,
        callback: GoalListCallback,
    ) -> StoreResult<Subscription> {
        if let Some(latency) = self.simulated_latency {
            std::thread::sleep(latency);
        }
        let goals = self.load(owner)?;
        debug!(
            "event=store_subscribe module=store backend=local owner={owner} count={}",
            goals.len()
        );
        callback(goals);
        Ok(Subscription::no_op())
    }

    fn add(&self, owner: &OwnerScope, goal: &Goal) -> StoreResult<Goal> {
        let mut goals = self.load(owner)?;
        let mut stored = goal.clone();
        // The local backend assigns no ids of its own; the caller-generated
        // id is the persisted id.
        stored.owner_id = Some(owner.storage_id().to_string());
        goals.insert(0, stored.clone());
        self.save(owner, &goals)?;
        Ok(stored)
    }

    fn update(&self, owner: &OwnerScope, goal: &Goal) -> StoreResult<()> {
        let mut goals = self.load(owner)?;
        match goals.iter().position(|candidate| candidate.id == goal.id) {
            Some(index) => {
                let mut stored = goal.clone();
                stored.owner_id = Some(owner.storage_id().to_string());
                goals[index] = stored;
                self.save(owner, &goals)
            }
            None => {
                warn!(
                    "event=store_update module=store backend=local owner={owner} status=miss id={}",
                    goal.id
                );
                Ok(())
            }
        }
    }

    fn delete(&self, owner: &OwnerScope, goal_id: &str) -> StoreResult<()> {
        let mut goals = self.load(owner)?;
        goals.retain(|goal| goal.id != goal_id);
        self.save(owner, &goals)
    }

    fn replace_all(&self, owner: &OwnerScope, goals: &[Goal]) -> StoreResult<()> {
        self.save(owner, goals)
    }

    fn clear(&self, owner: &OwnerScope) -> StoreResult<()> {
        self.repo.delete(&goals_key(owner))?;
        Ok(())
    }
}
