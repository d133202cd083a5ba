use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    Streak,          // consecutive days with blocks
    TotalHours,      // hours over the trailing year
    CategoryMastery, // hours in a single category
    PerfectWeek,     // >= 90% of the week's blocks completed
    EarlyBird,       // actual start before 08:00
    NightOwl,        // actual start after 22:00
}

impl AchievementType {
    pub const ALL: [AchievementType; 6] = [
        AchievementType::Streak,
        AchievementType::TotalHours,
        AchievementType::CategoryMastery,
        AchievementType::PerfectWeek,
        AchievementType::EarlyBird,
        AchievementType::NightOwl,
    ];

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AchievementType::Streak => "streak",
            AchievementType::TotalHours => "total_hours",
            AchievementType::CategoryMastery => "category_mastery",
            AchievementType::PerfectWeek => "perfect_week",
            AchievementType::EarlyBird => "early_bird",
            AchievementType::NightOwl => "night_owl",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.to_db_str() == s)
            .ok_or_else(|| AppError::unknown_variant("achievement type", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    pub fn from_db_str(s: &str) -> AppResult<Self> {
        match s {
            "common" => Ok(Rarity::Common),
            "rare" => Ok(Rarity::Rare),
            "epic" => Ok(Rarity::Epic),
            "legendary" => Ok(Rarity::Legendary),
            other => Err(AppError::unknown_variant("rarity", other)),
        }
    }

    pub fn color_hex(&self) -> &'static str {
        match self {
            Rarity::Common => "#808080",
            Rarity::Rare => "#4169E1",
            Rarity::Epic => "#9370DB",
            Rarity::Legendary => "#FFD700",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub kind: AchievementType,
    pub title: String,
    pub description: String,
    pub rarity: Rarity,
    pub is_unlocked: bool,
    pub progress: i32,
    pub max_progress: i32,
    pub unlocked_at: Option<i64>,
}

impl Achievement {
    fn seed(
        id: &str,
        kind: AchievementType,
        title: &str,
        description: &str,
        rarity: Rarity,
        max_progress: i32,
    ) -> Self {
        Self {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            description: description.to_string(),
            rarity,
            is_unlocked: false,
            progress: 0,
            max_progress,
            unlocked_at: None,
        }
    }

    pub fn progress_percent(&self) -> i32 {
        if self.max_progress <= 0 {
            return if self.is_unlocked { 100 } else { 0 };
        }
        let pct = i64::from(self.progress) * 100 / i64::from(self.max_progress);
        i32::try_from(pct.clamp(0, 100)).unwrap_or(0)
    }

    pub fn can_unlock(&self, current_progress: i32) -> bool {
        current_progress >= self.max_progress && !self.is_unlocked
    }
}

/// The fixed achievement catalogue seeded once per database.
pub fn catalogue() -> Vec<Achievement> {
    use AchievementType::*;
    use Rarity::*;

    vec![
        Achievement::seed("streak_3", Streak, "Beginner", "3 days in a row", Common, 3),
        Achievement::seed("streak_7", Streak, "On a roll", "7 days in a row", Rare, 7),
        Achievement::seed("streak_30", Streak, "Discipline master", "30 days in a row", Epic, 30),
        Achievement::seed("streak_100", Streak, "Legend", "100 days in a row", Legendary, 100),
        Achievement::seed("hours_50", TotalHours, "First steps", "50 productive hours", Common, 50),
        Achievement::seed("hours_200", TotalHours, "Serious approach", "200 productive hours", Rare, 200),
        Achievement::seed("hours_1000", TotalHours, "Master", "1000 productive hours", Epic, 1000),
        Achievement::seed("category_10", CategoryMastery, "Specialist", "10 hours in one category", Rare, 10),
        Achievement::seed("perfect_week", PerfectWeek, "Perfect week", "Everything planned for a week done", Epic, 100),
        Achievement::seed("early_bird", EarlyBird, "Early bird", "Start working before 08:00", Common, 1),
        Achievement::seed("night_owl", NightOwl, "Night owl", "Work after 22:00", Common, 1),
    ]
}
