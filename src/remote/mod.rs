//! Remote document store and authentication.
//!
//! Each user owns one profile document plus the `timeBlocks`, `categories`
//! and `achievements` subcollections, keyed by record id.

pub mod auth;
pub mod file;
pub mod memory;

use crate::errors::{AppError, AppResult};
use crate::models::UserSettings;
use serde_json::Value;

pub use auth::{AuthProvider, LocalAuth};
pub use file::FileRemote;
pub use memory::MemoryRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    TimeBlocks,
    Categories,
    Achievements,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::TimeBlocks,
        Collection::Categories,
        Collection::Achievements,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::TimeBlocks => "timeBlocks",
            Collection::Categories => "categories",
            Collection::Achievements => "achievements",
        }
    }
}

pub trait RemoteStore {
    fn put_profile(&self, user_id: &str, settings: &UserSettings) -> AppResult<()>;
    fn get_profile(&self, user_id: &str) -> AppResult<Option<UserSettings>>;
    fn delete_profile(&self, user_id: &str) -> AppResult<()>;

    /// Create or overwrite one document.
    fn put(&self, user_id: &str, coll: Collection, id: &str, doc: &Value) -> AppResult<()>;
    /// Removing a missing document is not an error.
    fn delete(&self, user_id: &str, coll: Collection, id: &str) -> AppResult<()>;
    fn list(&self, user_id: &str, coll: Collection) -> AppResult<Vec<Value>>;
}

/// Ids end up in file names: reject anything that could escape the tree.
pub(crate) fn check_key(kind: &str, key: &str) -> AppResult<()> {
    if key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0'])
    {
        return Err(AppError::Remote(format!("invalid {kind} '{key}'")));
    }
    Ok(())
}
