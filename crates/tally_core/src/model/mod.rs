//! Domain model for goal tracking.
//!
//! # Responsibility
//! - Define the canonical records used by core business logic.
//! - Keep wire-level field names stable for persisted blobs.
//!
//! # Invariants
//! - Every goal is identified by a stable `GoalId`.
//! - `0 <= current_count <= target_count` holds after every mutation.

pub mod goal;
pub mod profile;
pub mod settings;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in epoch milliseconds.
///
/// All model timestamps (`created_at`, `last_updated`) use this resolution.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
