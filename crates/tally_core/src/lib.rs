//! Core domain logic for tally, a personal goal-progress tracker.
//! This crate is the single source of truth for business invariants.

pub mod controller;
pub mod db;
pub mod gesture;
pub mod image;
pub mod logging;
pub mod model;
pub mod repo;
pub mod session;
pub mod settings;
pub mod store;

pub use controller::{AppController, CreateGoalError, SessionError, FREE_TIER_GOAL_LIMIT};
pub use gesture::{reorder_goals, DragMachine, DragPhase, ReorderRequest};
pub use image::{goal_image_prompt, DisabledImageGenerator, ImageGenerator};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::goal::{Category, Goal, GoalDraft, GoalId, GoalValidationError, Timeframe};
pub use model::profile::{OwnerScope, UserProfile};
pub use model::settings::{AppSettings, Language, NotificationSettings};
pub use repo::blob_repo::{BlobRepository, RepoError, RepoResult, SqliteBlobRepository};
pub use session::{
    AuthError, AuthResult, IdentityProvider, LocalIdentity, ProviderKind, MIN_PASSWORD_CHARS,
};
pub use settings::{SettingsError, SettingsState};
pub use store::hosted::{HostedStore, RemoteCollection};
pub use store::local::LocalStore;
pub use store::{
    open_store, GoalListCallback, GoalStore, StoreBackend, StoreConfig, StoreError, StoreResult,
    Subscription,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
