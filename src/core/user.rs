use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::user_settings as repo;
use crate::errors::{AppError, AppResult};
use crate::models::{Theme, UserSettings};
use crate::remote::AuthProvider;

/// Per-user settings, tier switching and the auth flows that create them.
pub struct UserLogic;

impl UserLogic {
    pub fn initialize(pool: &mut DbPool, user_id: &str, language: &str) -> AppResult<bool> {
        repo::initialize(pool, user_id, language)
    }

    pub fn get(pool: &DbPool, user_id: &str) -> AppResult<UserSettings> {
        repo::get_settings(&pool.conn, user_id)?
            .ok_or_else(|| AppError::not_found("User settings", user_id))
    }

    pub fn update_theme(pool: &mut DbPool, user_id: &str, theme: Theme) -> AppResult<()> {
        repo::update_theme(pool, user_id, theme)
    }

    pub fn update_language(pool: &mut DbPool, user_id: &str, language: &str) -> AppResult<()> {
        let language = language.trim();
        if language.is_empty() {
            return Err(AppError::Validation("language cannot be blank".into()));
        }
        repo::update_language(pool, user_id, language)
    }

    pub fn update_notifications(pool: &mut DbPool, user_id: &str, enabled: bool) -> AppResult<()> {
        repo::update_notifications(pool, user_id, enabled)
    }

    /// Switch tier; the category cap follows the tier.
    pub fn set_premium(pool: &mut DbPool, user_id: &str, is_premium: bool) -> AppResult<()> {
        let max = UserSettings::tier_limit(is_premium);
        repo::update_premium(pool, user_id, is_premium, max)?;
        ttlog_quiet(
            &pool.conn,
            "premium",
            user_id,
            if is_premium { "Premium enabled" } else { "Premium disabled" },
        );
        Ok(())
    }

    pub fn update_max_categories(pool: &mut DbPool, user_id: &str, max: i32) -> AppResult<()> {
        if max < 0 {
            return Err(AppError::Validation("max categories cannot be negative".into()));
        }
        repo::update_max_categories(pool, user_id, max)
    }

    pub fn update_last_sync(pool: &mut DbPool, user_id: &str, at: i64) -> AppResult<()> {
        repo::update_last_sync(pool, user_id, at)
    }

    pub fn delete(pool: &mut DbPool, user_id: &str) -> AppResult<()> {
        repo::delete_settings(pool, user_id)
    }

    /// Category cap for the signed-in user, or `fallback` when nobody is.
    pub fn category_limit(pool: &DbPool, user_id: Option<&str>, fallback: i32) -> AppResult<i32> {
        match user_id {
            Some(uid) => Ok(repo::get_settings(&pool.conn, uid)?
                .map(|s| s.max_categories)
                .unwrap_or(fallback)),
            None => Ok(fallback),
        }
    }
}

/// Sign-in flows. A successful sign-in makes sure the settings row exists.
pub struct AuthLogic;

impl AuthLogic {
    pub fn sign_up(
        auth: &mut dyn AuthProvider,
        pool: &mut DbPool,
        email: &str,
        password: &str,
        language: &str,
    ) -> AppResult<String> {
        let uid = auth.sign_up(email, password)?;
        Self::after_sign_in(pool, &uid, language, "sign_up")?;
        Ok(uid)
    }

    pub fn sign_in(
        auth: &mut dyn AuthProvider,
        pool: &mut DbPool,
        email: &str,
        password: &str,
        language: &str,
    ) -> AppResult<String> {
        let uid = auth.sign_in(email, password)?;
        Self::after_sign_in(pool, &uid, language, "sign_in")?;
        Ok(uid)
    }

    pub fn sign_in_with_token(
        auth: &mut dyn AuthProvider,
        pool: &mut DbPool,
        token: &str,
        language: &str,
    ) -> AppResult<String> {
        let uid = auth.sign_in_with_token(token)?;
        Self::after_sign_in(pool, &uid, language, "sign_in")?;
        Ok(uid)
    }

    pub fn sign_out(auth: &mut dyn AuthProvider, pool: &DbPool) -> AppResult<()> {
        let uid = auth.current_user_id();
        auth.sign_out()?;
        if let Some(uid) = uid {
            ttlog_quiet(&pool.conn, "sign_out", &uid, "Signed out");
        }
        Ok(())
    }

    /// Signed-in user id, if any.
    pub fn status(auth: &dyn AuthProvider) -> Option<String> {
        auth.current_user_id()
    }

    fn after_sign_in(pool: &mut DbPool, uid: &str, language: &str, op: &str) -> AppResult<()> {
        if UserLogic::initialize(pool, uid, language)? {
            tracing::info!(user_id = uid, "settings initialised");
        }
        ttlog_quiet(&pool.conn, op, uid, "Signed in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::LocalAuth;

    #[test]
    fn premium_toggles_category_cap() {
        let mut pool = DbPool::open_in_memory().unwrap();
        UserLogic::initialize(&mut pool, "u1", "en").unwrap();

        UserLogic::set_premium(&mut pool, "u1", true).unwrap();
        assert_eq!(UserLogic::get(&pool, "u1").unwrap().max_categories, 999);
        assert_eq!(UserLogic::category_limit(&pool, Some("u1"), 3).unwrap(), 999);

        UserLogic::set_premium(&mut pool, "u1", false).unwrap();
        assert_eq!(UserLogic::get(&pool, "u1").unwrap().max_categories, 3);
        assert_eq!(UserLogic::category_limit(&pool, None, 3).unwrap(), 3);
    }

    #[test]
    fn sign_up_creates_settings_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut auth = LocalAuth::open(&dir.path().join("r"), &dir.path().join("c")).unwrap();
        let mut pool = DbPool::open_in_memory().unwrap();

        let uid = AuthLogic::sign_up(&mut auth, &mut pool, "f@example.com", "abcdef", "it").unwrap();
        assert_eq!(UserLogic::get(&pool, &uid).unwrap().language, "it");
        assert_eq!(AuthLogic::status(&auth), Some(uid));

        AuthLogic::sign_out(&mut auth, &pool).unwrap();
        assert!(AuthLogic::status(&auth).is_none());
    }

    #[test]
    fn blank_language_is_rejected() {
        let mut pool = DbPool::open_in_memory().unwrap();
        UserLogic::initialize(&mut pool, "u1", "en").unwrap();
        assert!(UserLogic::update_language(&mut pool, "u1", " ").is_err());
    }
}
