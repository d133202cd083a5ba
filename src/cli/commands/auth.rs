use crate::cli::parser::{AuthAction, Commands};
use crate::config::Config;
use crate::core::user::{AuthLogic, UserLogic};
use crate::errors::{AppError, AppResult};
use crate::remote::AuthProvider;
use crate::ui::messages::{info, success};

use super::{open_auth, open_pool, sync_after_write};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Auth { action } = cmd else {
        return Ok(());
    };
    let mut auth = open_auth(cfg)?;

    match action {
        AuthAction::SignUp { email, password } => {
            let mut pool = open_pool(cfg)?;
            let uid = AuthLogic::sign_up(&mut auth, &mut pool, email, password, &cfg.language)?;
            success(format!("Account created, signed in as {email} ({uid})."));
            if let Some(token) = auth.current_token()? {
                info(format!("Sign-in token: {token}"));
            }
            sync_after_write(&mut pool, cfg);
        }

        AuthAction::SignIn { email, password } => {
            let mut pool = open_pool(cfg)?;
            let uid = AuthLogic::sign_in(&mut auth, &mut pool, email, password, &cfg.language)?;
            success(format!("Signed in as {email} ({uid})."));
        }

        AuthAction::Token { token } => {
            let mut pool = open_pool(cfg)?;
            let uid = AuthLogic::sign_in_with_token(&mut auth, &mut pool, token, &cfg.language)?;
            success(format!("Signed in ({uid})."));
        }

        AuthAction::SignOut => {
            if !auth.is_signed_in() {
                info("Not signed in.");
                return Ok(());
            }
            let pool = open_pool(cfg)?;
            AuthLogic::sign_out(&mut auth, &pool)?;
            success("Signed out.");
        }

        AuthAction::Status => match AuthLogic::status(&auth) {
            Some(uid) => {
                let email = auth.current_email().unwrap_or("?");
                println!("Signed in as {email} ({uid})");
            }
            None => println!("Not signed in"),
        },

        AuthAction::DeleteData => {
            let uid = auth.current_user_id().ok_or(AppError::NotSignedIn)?;
            let mut pool = open_pool(cfg)?;
            UserLogic::delete(&mut pool, &uid)?;
            // Push the tombstone before the session goes away.
            sync_after_write(&mut pool, cfg);
            AuthLogic::sign_out(&mut auth, &pool)?;
            success("User settings deleted and signed out.");
        }
    }

    Ok(())
}
