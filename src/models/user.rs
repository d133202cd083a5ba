use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Category cap for the free tier.
pub const MAX_CATEGORIES_FREE: i32 = 3;
/// Category cap for Premium ("effectively unbounded").
pub const MAX_CATEGORIES_PREMIUM: i32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn from_db_str(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(AppError::unknown_variant("theme", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    pub theme: Theme,
    pub language: String,
    pub notifications_enabled: bool,
    pub is_premium: bool,
    pub max_categories: i32,
    pub last_sync_time: Option<i64>,
}

impl UserSettings {
    /// Defaults written at first sign-in.
    pub fn new(user_id: &str, language: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            theme: Theme::System,
            language: language.to_string(),
            notifications_enabled: true,
            is_premium: false,
            max_categories: MAX_CATEGORIES_FREE,
            last_sync_time: None,
        }
    }

    pub fn can_create_category(&self, current_count: i32) -> bool {
        current_count < self.max_categories
    }

    pub fn category_limit_text(&self) -> String {
        if self.is_premium {
            "∞".to_string()
        } else {
            self.max_categories.to_string()
        }
    }

    pub fn tier_limit(is_premium: bool) -> i32 {
        if is_premium {
            MAX_CATEGORIES_PREMIUM
        } else {
            MAX_CATEGORIES_FREE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_allows_three_categories() {
        let s = UserSettings::new("u1", "en");
        assert!(s.can_create_category(2));
        assert!(!s.can_create_category(3));
        assert_eq!(s.category_limit_text(), "3");
    }

    #[test]
    fn premium_shows_unbounded_limit() {
        let mut s = UserSettings::new("u1", "en");
        s.is_premium = true;
        s.max_categories = UserSettings::tier_limit(true);
        assert_eq!(s.category_limit_text(), "∞");
        assert!(s.can_create_category(500));
    }

    #[test]
    fn theme_parsing_is_case_insensitive() {
        assert_eq!(Theme::from_db_str("Dark").unwrap(), Theme::Dark);
        assert!(Theme::from_db_str("neon").is_err());
    }
}
