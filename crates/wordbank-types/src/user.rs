//! User profile, preferences and learning stats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// The authenticated user as returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub stats: UserStats,
}

/// User-editable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub theme: Theme,
    /// Words to practise per day
    pub daily_goal: u32,
    pub notifications_enabled: bool,
    /// ISO 639-1 code of the language definitions are shown in
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            daily_goal: 10,
            notifications_enabled: true,
            language: "en".to_string(),
            updated_at: None,
        }
    }
}

/// Partial update for [`UserPreferences`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl UserPreferences {
    /// Shallow-merges `patch` into these preferences and stamps `updated_at`.
    pub fn apply(&mut self, patch: &PreferencesPatch, now: DateTime<Utc>) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(goal) = patch.daily_goal {
            self.daily_goal = goal;
        }
        if let Some(enabled) = patch.notifications_enabled {
            self.notifications_enabled = enabled;
        }
        if let Some(language) = &patch.language {
            self.language.clone_from(language);
        }
        self.updated_at = Some(now);
    }
}

/// Learning progress counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub words_learned: u32,
    pub streak_days: u32,
    pub quizzes_taken: u32,
    pub correct_answers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update for [`UserStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_learned: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quizzes_taken: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<u32>,
}

impl UserStats {
    /// Shallow-merges `patch` into these stats and stamps `updated_at`.
    pub fn apply(&mut self, patch: &StatsPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.words_learned {
            self.words_learned = v;
        }
        if let Some(v) = patch.streak_days {
            self.streak_days = v;
        }
        if let Some(v) = patch.quizzes_taken {
            self.quizzes_taken = v;
        }
        if let Some(v) = patch.correct_answers {
            self.correct_answers = v;
        }
        self.updated_at = Some(now);
    }
}
