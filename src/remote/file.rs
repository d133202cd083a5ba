//! Directory-backed remote: `users/<uid>/profile.json` and
//! `users/<uid>/<collection>/<id>.json`.

use super::{Collection, RemoteStore, check_key};
use crate::errors::AppResult;
use crate::models::UserSettings;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FileRemote {
    root: PathBuf,
}

impl FileRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &str) -> AppResult<PathBuf> {
        check_key("user id", user_id)?;
        Ok(self.root.join("users").join(user_id))
    }

    fn doc_path(&self, user_id: &str, coll: Collection, id: &str) -> AppResult<PathBuf> {
        check_key("document id", id)?;
        Ok(self
            .user_dir(user_id)?
            .join(coll.as_str())
            .join(format!("{id}.json")))
    }
}

/// Write through a temp file so readers never see half a document.
fn write_json(path: &Path, value: &Value) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> AppResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl RemoteStore for FileRemote {
    fn put_profile(&self, user_id: &str, settings: &UserSettings) -> AppResult<()> {
        let path = self.user_dir(user_id)?.join("profile.json");
        write_json(&path, &serde_json::to_value(settings)?)
    }

    fn get_profile(&self, user_id: &str) -> AppResult<Option<UserSettings>> {
        let path = self.user_dir(user_id)?.join("profile.json");
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_profile(&self, user_id: &str) -> AppResult<()> {
        remove_if_exists(&self.user_dir(user_id)?.join("profile.json"))
    }

    fn put(&self, user_id: &str, coll: Collection, id: &str, doc: &Value) -> AppResult<()> {
        write_json(&self.doc_path(user_id, coll, id)?, doc)
    }

    fn delete(&self, user_id: &str, coll: Collection, id: &str) -> AppResult<()> {
        remove_if_exists(&self.doc_path(user_id, coll, id)?)
    }

    /// Documents sorted by file name.
    fn list(&self, user_id: &str, coll: Collection) -> AppResult<Vec<Value>> {
        let dir = self.user_dir(user_id)?.join(coll.as_str());
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let p = entry?.path();
            if p.extension().is_some_and(|ext| ext == "json") {
                paths.push(p);
            }
        }
        paths.sort();

        let mut out = Vec::with_capacity(paths.len());
        for p in paths {
            out.push(serde_json::from_str(&fs::read_to_string(&p)?)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn documents_live_under_user_collection() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FileRemote::new(dir.path());

        remote
            .put("u1", Collection::TimeBlocks, "b1", &json!({"id": "b1"}))
            .unwrap();
        assert!(dir.path().join("users/u1/timeBlocks/b1.json").exists());

        let docs = remote.list("u1", Collection::TimeBlocks).unwrap();
        assert_eq!(docs, vec![json!({"id": "b1"})]);

        remote.delete("u1", Collection::TimeBlocks, "b1").unwrap();
        remote.delete("u1", Collection::TimeBlocks, "b1").unwrap();
        assert!(remote.list("u1", Collection::TimeBlocks).unwrap().is_empty());
    }

    #[test]
    fn profile_round_trip_and_missing_profile() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FileRemote::new(dir.path());
        assert!(remote.get_profile("u1").unwrap().is_none());

        let s = UserSettings::new("u1", "en");
        remote.put_profile("u1", &s).unwrap();
        assert_eq!(remote.get_profile("u1").unwrap(), Some(s));
    }

    #[test]
    fn path_traversal_ids_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let remote = FileRemote::new(dir.path());
        assert!(
            remote
                .put("u1", Collection::Categories, "../x", &json!({}))
                .is_err()
        );
    }
}
