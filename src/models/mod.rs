//! Domain records mirroring the storage schema.

pub mod achievement;
pub mod category;
pub mod stats;
pub mod time_block;
pub mod user;

pub use achievement::{Achievement, AchievementType, Rarity};
pub use category::Category;
pub use stats::{CategoryStat, StatisticsData, TodayStats};
pub use time_block::TimeBlock;
pub use user::{Theme, UserSettings};
