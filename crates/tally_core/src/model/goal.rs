//! Goal domain model.
//!
//! # Responsibility
//! - Define the canonical goal record shared by every storage backend.
//! - Provide clamped counter mutations and archive lifecycle helpers.
//!
//! # Invariants
//! - `id` is immutable once assigned and never reused for another goal.
//! - `current_count` stays inside `[0, target_count]` after every mutation.
//! - Persisted field names stay camelCase for blob compatibility.

use crate::model::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a goal.
///
/// Kept as opaque text rather than a UUID type: locally created goals use
/// UUIDv4 strings, but hosted backends may assign their own document ids and
/// both shapes must survive a round trip unchanged.
pub type GoalId = String;

/// Reset cadence for a goal's counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    #[serde(rename = "No Limit")]
    NoLimit,
}

impl Timeframe {
    /// Wire/diagnostic name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Yearly => "Yearly",
            Self::NoLimit => "No Limit",
        }
    }

    /// Parses the wire name back into a timeframe.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Daily" => Some(Self::Daily),
            "Weekly" => Some(Self::Weekly),
            "Monthly" => Some(Self::Monthly),
            "Quarterly" => Some(Self::Quarterly),
            "Yearly" => Some(Self::Yearly),
            "No Limit" => Some(Self::NoLimit),
            _ => None,
        }
    }
}

/// Fixed goal category set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Finance,
    Groceries,
    Restaurants,
    Travel,
    Health,
    Shopping,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Finance => "Finance",
            Self::Groceries => "Groceries",
            Self::Restaurants => "Restaurants",
            Self::Travel => "Travel",
            Self::Health => "Health",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Finance" => Some(Self::Finance),
            "Groceries" => Some(Self::Groceries),
            "Restaurants" => Some(Self::Restaurants),
            "Travel" => Some(Self::Travel),
            "Health" => Some(Self::Health),
            "Shopping" => Some(Self::Shopping),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    /// All categories in display order.
    pub fn all() -> [Category; 7] {
        [
            Self::Finance,
            Self::Groceries,
            Self::Restaurants,
            Self::Travel,
            Self::Health,
            Self::Shopping,
            Self::Other,
        ]
    }
}

/// Validation failures for goal drafts.
///
/// Raised before any I/O; these never reach a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Target count must be a positive integer.
    ZeroTarget,
}

impl Display for GoalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "goal title cannot be empty"),
            Self::ZeroTarget => write!(f, "goal target count must be at least 1"),
        }
    }
}

impl Error for GoalValidationError {}

/// Caller-supplied payload for creating a goal.
///
/// Identity, counters and timestamps are assigned at creation time, never by
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
    pub target_count: u32,
    pub timeframe: Option<Timeframe>,
    pub category: Option<Category>,
    pub is_recurring: bool,
}

impl GoalDraft {
    /// Rejects drafts that must never be persisted.
    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.title.trim().is_empty() {
            return Err(GoalValidationError::EmptyTitle);
        }
        if self.target_count == 0 {
            return Err(GoalValidationError::ZeroTarget);
        }
        Ok(())
    }
}

/// Canonical goal record.
///
/// Serialized field names match the persisted blob format exactly; list
/// position inside a persisted goal array is the display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub current_count: u32,
    pub target_count: u32,
    pub timeframe: Timeframe,
    pub category: Category,
    pub is_recurring: bool,
    pub is_archived: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds; touched by every counter/archive mutation.
    pub last_updated: i64,
    /// Storage partition owner; stamped by the store, absent on optimistic
    /// entries that have not been persisted yet.
    #[serde(
        default,
        rename = "userId",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<String>,
}

impl Goal {
    /// Builds a new goal from a draft, assigning a locally generated id and
    /// default lifecycle fields.
    ///
    /// # Contract
    /// - `current_count = 0`, `is_archived = false`.
    /// - `created_at == last_updated == now`.
    /// - Missing timeframe/category fall back to `Monthly`/`Other`.
    pub fn from_draft(draft: GoalDraft) -> Result<Self, GoalValidationError> {
        draft.validate()?;
        let now = now_epoch_ms();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            link: draft.link,
            image_url: draft.image_url,
            current_count: 0,
            target_count: draft.target_count,
            timeframe: draft.timeframe.unwrap_or(Timeframe::Monthly),
            category: draft.category.unwrap_or(Category::Other),
            is_recurring: draft.is_recurring,
            is_archived: false,
            created_at: now,
            last_updated: now,
            owner_id: None,
        })
    }

    /// Applies a signed counter delta, clamped into `[0, target_count]`.
    ///
    /// Touches `last_updated` even when the clamped value is unchanged, so a
    /// bounded counter still records the interaction time.
    pub fn apply_delta(&mut self, delta: i32) {
        let next = i64::from(self.current_count) + i64::from(delta);
        self.current_count = next.clamp(0, i64::from(self.target_count)) as u32;
        self.last_updated = now_epoch_ms();
    }

    /// Re-establishes the counter invariant on a full-record overwrite.
    pub fn clamp_count(&mut self) {
        if self.current_count > self.target_count {
            self.current_count = self.target_count;
        }
    }

    /// Flips the archived flag and records the toggle time.
    pub fn toggle_archived(&mut self) {
        self.is_archived = !self.is_archived;
        self.last_updated = now_epoch_ms();
    }

    /// Whether this goal counts against the active-goal limit.
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }

    /// Whether the counter has reached its target.
    pub fn is_complete(&self) -> bool {
        self.current_count >= self.target_count
    }
}
