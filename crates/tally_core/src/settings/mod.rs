//! Process-wide settings state.
//!
//! # Responsibility
//! - Load settings once at startup (stored blob or fixed defaults).
//! - Persist on every change, never on a timer.
//!
//! # Invariants
//! - No ambient globals: the state object is constructed explicitly and
//!   passed where needed.
//! - A corrupt persisted blob is an error, not a silent reset.

use crate::model::settings::{AppSettings, Language, NotificationSettings};
use crate::repo::blob_repo::{BlobRepository, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Storage key for the settings blob.
pub const SETTINGS_KEY: &str = "settings";

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug)]
pub enum SettingsError {
    Repo(RepoError),
    Codec(serde_json::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "settings blob codec failure: {err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Codec(err) => Some(err),
        }
    }
}

impl From<RepoError> for SettingsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// Explicitly initialized settings holder.
pub struct SettingsState {
    repo: Arc<dyn BlobRepository>,
    current: AppSettings,
}

impl SettingsState {
    /// Loads persisted settings, falling back to defaults when absent.
    pub fn init(repo: Arc<dyn BlobRepository>) -> SettingsResult<Self> {
        let current = match repo.get(SETTINGS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => AppSettings::default(),
        };
        Ok(Self { repo, current })
    }

    pub fn current(&self) -> AppSettings {
        self.current
    }

    /// Applies a change and persists immediately.
    pub fn update(&mut self, apply: impl FnOnce(&mut AppSettings)) -> SettingsResult<()> {
        apply(&mut self.current);
        self.persist()
    }

    pub fn set_language(&mut self, language: Language) -> SettingsResult<()> {
        self.update(|settings| settings.language = language)
    }

    pub fn set_notifications(
        &mut self,
        notifications: NotificationSettings,
    ) -> SettingsResult<()> {
        self.update(|settings| settings.notifications = notifications)
    }

    /// Restores and persists the first-run defaults.
    pub fn reset_to_default(&mut self) -> SettingsResult<()> {
        self.current = AppSettings::default();
        self.persist()
    }

    fn persist(&self) -> SettingsResult<()> {
        let raw = serde_json::to_string(&self.current)?;
        self.repo.put(SETTINGS_KEY, &raw)?;
        Ok(())
    }
}
