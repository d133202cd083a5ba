pub mod achievements;
pub mod categories;
pub mod jobs;
pub mod log;
pub mod migrate;
pub mod outbox;
pub mod pool;
pub mod stats;
pub mod time_blocks;
pub mod user_settings;
pub mod watch;
