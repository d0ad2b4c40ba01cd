//! Session glue: the only thing stored in the session is the signed-in
//! [`AuthUser`]. Everything else is loaded fresh per request.

use crate::AuthUser;
use tower_sessions::Session;

const SESSION_USER_KEY: &str = "auth_user";

pub async fn sign_in(session: &Session, user: &AuthUser) -> anyhow::Result<()> {
    session.insert(SESSION_USER_KEY, user.clone()).await?;
    Ok(())
}

pub async fn current_user(session: &Session) -> Option<AuthUser> {
    session.get::<AuthUser>(SESSION_USER_KEY).await.ok().flatten()
}

pub async fn sign_out(session: &Session) {
    if let Err(e) = session.flush().await {
        log::error!("Failed to clear session: {e}");
    }
}
