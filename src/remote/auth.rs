//! Authentication provider.
//!
//! [`LocalAuth`] keeps accounts next to the remote documents
//! (`<remote>/accounts.json`) and the active session in the config directory
//! (`session.yaml`), so every command invocation sees the same signed-in user.

use crate::errors::{AppError, AppResult};
use crate::utils::time::now_millis;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

const MIN_PASSWORD_LEN: usize = 6;

pub trait AuthProvider {
    fn current_user_id(&self) -> Option<String>;
    fn is_signed_in(&self) -> bool {
        self.current_user_id().is_some()
    }
    /// Create an account and sign it in. Returns the new user id.
    fn sign_up(&mut self, email: &str, password: &str) -> AppResult<String>;
    fn sign_in(&mut self, email: &str, password: &str) -> AppResult<String>;
    /// Sign in with a token issued at sign-up.
    fn sign_in_with_token(&mut self, token: &str) -> AppResult<String>;
    fn sign_out(&mut self) -> AppResult<()>;
    /// Receives `true`/`false` on every sign-in/sign-out.
    fn subscribe(&mut self) -> Receiver<bool>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    user_id: String,
    email: String,
    salt: String,
    password_sha256: String,
    token: String,
    created_at: i64,
    #[serde(default)]
    last_login: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Session {
    user_id: Option<String>,
    email: Option<String>,
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct LocalAuth {
    accounts_file: PathBuf,
    session_file: PathBuf,
    session: Session,
    listeners: Vec<Sender<bool>>,
}

impl LocalAuth {
    /// Load the persisted session, if any.
    pub fn open(remote_root: &Path, config_dir: &Path) -> AppResult<Self> {
        let session_file = config_dir.join("session.yaml");
        let session = match fs::read_to_string(&session_file) {
            Ok(s) => serde_yaml::from_str(&s)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Session::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            accounts_file: remote_root.join("accounts.json"),
            session_file,
            session,
            listeners: Vec::new(),
        })
    }

    pub fn current_email(&self) -> Option<&str> {
        self.session.email.as_deref()
    }

    /// Token for `sign_in_with_token`, only for the signed-in account.
    pub fn current_token(&self) -> AppResult<Option<String>> {
        let Some(uid) = &self.session.user_id else {
            return Ok(None);
        };
        Ok(self
            .load_accounts()?
            .into_iter()
            .find(|a| &a.user_id == uid)
            .map(|a| a.token))
    }

    fn load_accounts(&self) -> AppResult<Vec<Account>> {
        match fs::read_to_string(&self.accounts_file) {
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_accounts(&self, accounts: &[Account]) -> AppResult<()> {
        if let Some(parent) = self.accounts_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.accounts_file, serde_json::to_vec_pretty(accounts)?)?;
        Ok(())
    }

    fn save_session(&self) -> AppResult<()> {
        if let Some(parent) = self.session_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.session_file, serde_yaml::to_string(&self.session)?)?;
        Ok(())
    }

    fn notify(&mut self, signed_in: bool) {
        self.listeners.retain(|tx| tx.send(signed_in).is_ok());
    }

    /// Record the login on the account and persist the session.
    fn start_session(&mut self, mut accounts: Vec<Account>, idx: usize) -> AppResult<String> {
        accounts[idx].last_login = Some(now_millis());
        self.save_accounts(&accounts)?;

        let acc = &accounts[idx];
        self.session = Session {
            user_id: Some(acc.user_id.clone()),
            email: Some(acc.email.clone()),
        };
        self.save_session()?;

        let uid = acc.user_id.clone();
        tracing::debug!(user_id = %uid, "signed in");
        self.notify(true);
        Ok(uid)
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::Auth(format!("invalid email '{email}'"))),
    }
}

impl AuthProvider for LocalAuth {
    fn current_user_id(&self) -> Option<String> {
        self.session.user_id.clone()
    }

    fn sign_up(&mut self, email: &str, password: &str) -> AppResult<String> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Auth(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let mut accounts = self.load_accounts()?;
        if accounts.iter().any(|a| a.email == email) {
            return Err(AppError::Auth(format!("account '{email}' already exists")));
        }

        let salt = uuid::Uuid::new_v4().simple().to_string();
        accounts.push(Account {
            user_id: uuid::Uuid::new_v4().simple().to_string(),
            password_sha256: digest(&salt, password),
            salt,
            email,
            token: uuid::Uuid::new_v4().to_string(),
            created_at: now_millis(),
            last_login: None,
        });

        let idx = accounts.len() - 1;
        self.start_session(accounts, idx)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> AppResult<String> {
        let email = normalize_email(email)?;
        let accounts = self.load_accounts()?;

        let idx = accounts
            .iter()
            .position(|a| a.email == email && a.password_sha256 == digest(&a.salt, password))
            .ok_or_else(|| AppError::Auth("wrong email or password".into()))?;

        self.start_session(accounts, idx)
    }

    fn sign_in_with_token(&mut self, token: &str) -> AppResult<String> {
        let accounts = self.load_accounts()?;
        let idx = accounts
            .iter()
            .position(|a| a.token == token.trim())
            .ok_or_else(|| AppError::Auth("unknown token".into()))?;

        self.start_session(accounts, idx)
    }

    fn sign_out(&mut self) -> AppResult<()> {
        self.session = Session::default();
        match fs::remove_file(&self.session_file) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.notify(false);
        Ok(())
    }

    fn subscribe(&mut self) -> Receiver<bool> {
        let (tx, rx) = mpsc::channel();
        self.listeners.push(tx);
        rx
    }
}
