//! In-process remote, used by tests and when no remote directory is set.

use super::{Collection, RemoteStore, check_key};
use crate::errors::{AppError, AppResult};
use crate::models::UserSettings;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

type DocKey = (String, Collection, String);

#[derive(Default)]
pub struct MemoryRemote {
    profiles: RefCell<BTreeMap<String, UserSettings>>,
    docs: RefCell<BTreeMap<DocKey, Value>>,
    /// Writes left before every call starts failing; `None` never fails.
    fail_after: Cell<Option<usize>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` more writes succeed, then fail all of them.
    pub fn fail_after(&self, n: usize) {
        self.fail_after.set(Some(n));
    }

    pub fn heal(&self) {
        self.fail_after.set(None);
    }

    pub fn doc_count(&self, user_id: &str, coll: Collection) -> usize {
        self.docs
            .borrow()
            .keys()
            .filter(|(u, c, _)| u == user_id && *c == coll)
            .count()
    }

    pub fn get(&self, user_id: &str, coll: Collection, id: &str) -> Option<Value> {
        self.docs
            .borrow()
            .get(&(user_id.to_string(), coll, id.to_string()))
            .cloned()
    }

    fn tick(&self) -> AppResult<()> {
        match self.fail_after.get() {
            Some(0) => Err(AppError::Remote("remote unavailable".into())),
            Some(n) => {
                self.fail_after.set(Some(n - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl RemoteStore for MemoryRemote {
    fn put_profile(&self, user_id: &str, settings: &UserSettings) -> AppResult<()> {
        check_key("user id", user_id)?;
        self.tick()?;
        self.profiles
            .borrow_mut()
            .insert(user_id.to_string(), settings.clone());
        Ok(())
    }

    fn get_profile(&self, user_id: &str) -> AppResult<Option<UserSettings>> {
        Ok(self.profiles.borrow().get(user_id).cloned())
    }

    fn delete_profile(&self, user_id: &str) -> AppResult<()> {
        self.tick()?;
        self.profiles.borrow_mut().remove(user_id);
        Ok(())
    }

    fn put(&self, user_id: &str, coll: Collection, id: &str, doc: &Value) -> AppResult<()> {
        check_key("user id", user_id)?;
        check_key("document id", id)?;
        self.tick()?;
        self.docs
            .borrow_mut()
            .insert((user_id.to_string(), coll, id.to_string()), doc.clone());
        Ok(())
    }

    fn delete(&self, user_id: &str, coll: Collection, id: &str) -> AppResult<()> {
        self.tick()?;
        self.docs
            .borrow_mut()
            .remove(&(user_id.to_string(), coll, id.to_string()));
        Ok(())
    }

    fn list(&self, user_id: &str, coll: Collection) -> AppResult<Vec<Value>> {
        Ok(self
            .docs
            .borrow()
            .iter()
            .filter(|((u, c, _), _)| u == user_id && *c == coll)
            .map(|(_, v)| v.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn injected_failure_kicks_in_after_budget() {
        let r = MemoryRemote::new();
        r.fail_after(1);
        assert!(r.put("u", Collection::Categories, "a", &json!({})).is_ok());
        assert!(r.put("u", Collection::Categories, "b", &json!({})).is_err());
        r.heal();
        assert!(r.put("u", Collection::Categories, "b", &json!({})).is_ok());
        assert_eq!(r.doc_count("u", Collection::Categories), 2);
    }
}
