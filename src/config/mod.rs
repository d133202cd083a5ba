use crate::errors::{AppError, AppResult};
use crate::utils::path::resolve_in;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub mod migrate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// light | dark | system
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Push pending changes after every mutating command.
    #[serde(default)]
    pub sync_on_write: bool,
    /// Category cap applied when nobody is signed in.
    #[serde(default = "default_free_category_limit")]
    pub free_category_limit: i32,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_remote_dir() -> String {
    Config::config_dir().join("remote").to_string_lossy().to_string()
}
fn default_category() -> String {
    "cat_work".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_theme() -> String {
    "system".to_string()
}
fn default_free_category_limit() -> i32 {
    crate::models::user::MAX_CATEGORIES_FREE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            remote_dir: default_remote_dir(),
            default_category: default_category(),
            language: default_language(),
            theme: default_theme(),
            sync_on_write: false,
            free_category_limit: default_free_category_limit(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("timeblocks")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".timeblocks")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("timeblocks.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("timeblocks.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Initialize configuration and database files.
    /// In test mode the config file is left untouched.
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = match custom_name {
            Some(name) => resolve_in(&dir, &name),
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Self::default()
        };

        if !is_test {
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        println!("✅ Database:    {:?}", db_path);

        Ok(config)
    }

    pub fn remote_root(&self) -> PathBuf {
        PathBuf::from(&self.remote_dir)
    }
}
