use crate::config::Config;
use crate::config::migrate::{migrate_config, missing_keys};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};
use std::path::Path;

pub struct ConfigLogic;

impl ConfigLogic {
    /// Dump the effective configuration (file values plus CLI overrides).
    pub fn print(cfg: &Config) -> AppResult<()> {
        println!("📄 Current configuration:\n");
        println!("{}", serde_yaml::to_string(cfg)?);
        Ok(())
    }

    /// Report keys missing from the config file. Returns them as well.
    pub fn check(path: &Path) -> AppResult<Vec<String>> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "config file not found: {} (run `timeblocks init`)",
                path.display()
            )));
        }

        let missing = missing_keys(path)?;
        if missing.is_empty() {
            success("Config file is complete.");
        } else {
            warning(format!(
                "Missing key(s): {} (run `timeblocks config --migrate`)",
                missing.join(", ")
            ));
        }
        Ok(missing)
    }

    pub fn migrate(path: &Path) -> AppResult<Vec<String>> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        migrate_config(path)
    }
}
