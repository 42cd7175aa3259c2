//! Application settings records.

use serde::{Deserialize, Serialize};

/// UI language selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "cs")]
    Cs,
}

/// Four independent notification toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub daily_reminder: bool,
    /// Notify when a goal has not been updated for a while.
    pub inactivity_alert: bool,
    pub weekly_report: bool,
    pub marketing: bool,
}

/// Process-wide settings blob, persisted independently of any owner scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub language: Language,
    pub notifications: NotificationSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            language: Language::En,
            notifications: NotificationSettings {
                daily_reminder: false,
                inactivity_alert: true,
                weekly_report: false,
                marketing: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppSettings, Language};

    #[test]
    fn defaults_match_first_run_state() {
        let settings = AppSettings::default();
        assert_eq!(settings.language, Language::En);
        assert!(!settings.notifications.daily_reminder);
        assert!(settings.notifications.inactivity_alert);
        assert!(!settings.notifications.weekly_report);
        assert!(settings.notifications.marketing);
    }

    #[test]
    fn language_serializes_to_short_codes() {
        let json = serde_json::to_string(&AppSettings::default()).unwrap();
        assert!(json.contains("\"language\":\"en\""));
        assert!(json.contains("\"dailyReminder\":false"));
    }
}
