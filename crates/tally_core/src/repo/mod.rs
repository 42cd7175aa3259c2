//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the key-value blob access contract used by every storage
//!   consumer (goal store, settings, identity mock).
//! - Isolate SQLite details from business orchestration.
//!
//! # Invariants
//! - Repository construction verifies schema readiness instead of failing
//!   lazily on first use.

pub mod blob_repo;
