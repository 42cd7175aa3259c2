//! FFI use-case API for UI-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to the UI host via FRB.
//! - Keep error semantics simple for early-stage UI integration.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Each call runs against the local backend under one per-process DB path.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tally_core::db::open_db;
use tally_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppController, Category, Goal, GoalDraft, LocalIdentity, LocalStore, SqliteBlobRepository,
    Timeframe,
};

const APP_DB_FILE_NAME: &str = "tally_app.sqlite3";
static APP_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Goal record shape crossing the FFI boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FfiGoal {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_url: Option<String>,
    pub current_count: u32,
    pub target_count: u32,
    /// Wire name, e.g. `Monthly` or `No Limit`.
    pub timeframe: String,
    pub category: String,
    pub is_recurring: bool,
    pub is_archived: bool,
    pub created_at: i64,
    pub last_updated: i64,
}

impl From<Goal> for FfiGoal {
    fn from(goal: Goal) -> Self {
        Self {
            id: goal.id,
            title: goal.title,
            description: goal.description,
            link: goal.link,
            image_url: goal.image_url,
            current_count: goal.current_count,
            target_count: goal.target_count,
            timeframe: goal.timeframe.as_str().to_string(),
            category: goal.category.as_str().to_string(),
            is_recurring: goal.is_recurring,
            is_archived: goal.is_archived,
            created_at: goal.created_at,
            last_updated: goal.last_updated,
        }
    }
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalListResponse {
    pub items: Vec<FfiGoal>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic action response envelope for goal mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalActionResponse {
    pub ok: bool,
    pub goal_id: Option<String>,
    pub message: String,
}

impl GoalActionResponse {
    fn success(message: impl Into<String>, goal_id: Option<String>) -> Self {
        Self {
            ok: true,
            goal_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            goal_id: None,
            message: message.into(),
        }
    }
}

/// Lists goals for the active owner scope in display order.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn goals_list() -> GoalListResponse {
    match with_controller(|controller| Ok(controller.goals())) {
        Ok(goals) => {
            let message = if goals.is_empty() {
                "No goals.".to_string()
            } else {
                format!("{} goal(s).", goals.len())
            };
            GoalListResponse {
                items: goals.into_iter().map(FfiGoal::from).collect(),
                message,
            }
        }
        Err(err) => GoalListResponse {
            items: Vec::new(),
            message: format!("goals_list failed: {err}"),
        },
    }
}

/// Creates a goal from UI form input.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns the persisted goal id on success; limit and validation
///   failures arrive as `ok=false` with a displayable message.
#[flutter_rust_bridge::frb(sync)]
#[allow(clippy::too_many_arguments)]
pub fn goal_create(
    title: String,
    target_count: u32,
    timeframe: String,
    category: String,
    description: Option<String>,
    link: Option<String>,
    is_recurring: bool,
) -> GoalActionResponse {
    let Some(timeframe) = Timeframe::parse(&timeframe) else {
        return GoalActionResponse::failure(format!("unknown timeframe `{timeframe}`"));
    };
    let Some(category) = Category::parse(&category) else {
        return GoalActionResponse::failure(format!("unknown category `{category}`"));
    };

    let draft = GoalDraft {
        title,
        description,
        link,
        image_url: None,
        target_count,
        timeframe: Some(timeframe),
        category: Some(category),
        is_recurring,
    };

    let created = with_controller(|controller| {
        controller.create_goal(draft).map_err(|err| err.to_string())
    });
    match created {
        Ok(goal) => GoalActionResponse::success("Goal created.", Some(goal.id)),
        Err(err) => GoalActionResponse::failure(format!("goal_create failed: {err}")),
    }
}

/// Applies a clamped counter delta to one goal.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; unknown ids succeed as a no-op, matching core semantics.
#[flutter_rust_bridge::frb(sync)]
pub fn goal_adjust_count(goal_id: String, delta: i32) -> GoalActionResponse {
    let adjusted = with_controller(|controller| {
        controller.adjust_count(&goal_id, delta);
        Ok(())
    });
    match adjusted {
        Ok(()) => GoalActionResponse::success("Count updated.", Some(goal_id)),
        Err(err) => GoalActionResponse::failure(format!("goal_adjust_count failed: {err}")),
    }
}

/// Flips one goal's archived flag.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn goal_toggle_archive(goal_id: String) -> GoalActionResponse {
    let toggled = with_controller(|controller| {
        controller.toggle_archive(&goal_id);
        Ok(())
    });
    match toggled {
        Ok(()) => GoalActionResponse::success("Archive state updated.", Some(goal_id)),
        Err(err) => GoalActionResponse::failure(format!("goal_toggle_archive failed: {err}")),
    }
}

/// Deletes one goal permanently.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn goal_delete(goal_id: String) -> GoalActionResponse {
    let deleted = with_controller(|controller| {
        controller.delete_goal(&goal_id);
        Ok(())
    });
    match deleted {
        Ok(()) => GoalActionResponse::success("Goal deleted.", Some(goal_id)),
        Err(err) => GoalActionResponse::failure(format!("goal_delete failed: {err}")),
    }
}

fn resolve_app_db_path() -> PathBuf {
    APP_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("TALLY_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(APP_DB_FILE_NAME)
        })
        .clone()
}

fn with_controller<T>(
    f: impl FnOnce(&mut AppController) -> Result<T, String>,
) -> Result<T, String> {
    let db_path = resolve_app_db_path();
    log::debug!(
        "event=ffi_call module=ffi status=start db_path={}",
        db_path.display()
    );
    let conn = open_db(&db_path).map_err(|err| format!("app DB open failed: {err}"))?;
    let repo = Arc::new(
        SqliteBlobRepository::try_new(conn).map_err(|err| format!("repo init failed: {err}"))?,
    );
    let store = Arc::new(LocalStore::new(repo.clone()));
    let identity = Arc::new(LocalIdentity::new(repo));

    let mut controller = AppController::new(store, identity);
    controller
        .bootstrap()
        .map_err(|err| format!("bootstrap failed: {err}"))?;
    f(&mut controller)
}
