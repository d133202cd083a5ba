//! Use-case layer: one `XxxLogic` struct per area, called by the CLI handlers.

pub mod achievements;
pub mod backup;
pub mod blocks;
pub mod categories;
pub mod config;
pub mod jobs;
pub mod log;
pub mod statistics;
pub mod sync;
pub mod user;
