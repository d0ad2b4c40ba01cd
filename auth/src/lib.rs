mod password;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

pub use password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};

/// A signed-in identity as the rest of the application sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Email address is not valid")]
    InvalidEmail,
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("identity provider failure")]
    Provider(#[from] anyhow::Error),
}

/// Issues and checks identities. Substitutable so demo mode and tests run
/// without Postgres.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError>;

    /// `Ok(None)` means unknown email or wrong password; the two are not
    /// distinguished on purpose.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthUser>, IdentityError>;

    /// Compensating action for a failed provisioning step after signup.
    async fn remove(&self, user_id: Uuid) -> Result<(), IdentityError>;
}

fn validate_email(email: &str) -> Result<(), IdentityError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(IdentityError::InvalidEmail);
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') {
        return Err(IdentityError::InvalidEmail);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), IdentityError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(IdentityError::WeakPassword);
    }
    Ok(())
}

pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS auth_users (
                user_id UUID PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        validate_email(email)?;
        validate_password(password)?;

        let user_id = Uuid::new_v4();
        let password_hash = hash_password(password, None).await?;

        let result = sqlx::query(
            r#"INSERT INTO auth_users (user_id, email, password_hash)
               VALUES ($1, $2, $3)
               ON CONFLICT (email) DO NOTHING"#,
        )
        .bind(user_id)
        .bind(email)
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(anyhow::Error::from)?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::EmailTaken);
        }

        Ok(AuthUser {
            user_id,
            email: email.to_string(),
        })
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthUser>, IdentityError> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "select user_id, password_hash from auth_users where email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::from)?;

        let Some((user_id, password_hash)) = row else {
            return Ok(None);
        };

        if verify_password(password, &password_hash).await? {
            Ok(Some(AuthUser {
                user_id,
                email: email.to_string(),
            }))
        } else {
            Ok(None)
        }
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), IdentityError> {
        sqlx::query("delete from auth_users where user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(())
    }
}

/// In-memory identities for demo mode and tests. Uses a reduced bcrypt
/// cost so test suites stay fast.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    users: Mutex<HashMap<Uuid, (String, String)>>,
}

const MEMORY_BCRYPT_COST: u32 = 4;

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, IdentityError> {
        validate_email(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password, Some(MEMORY_BCRYPT_COST)).await?;
        let mut users = self.users.lock().expect("identity map poisoned");
        if users.values().any(|(e, _)| e == email) {
            return Err(IdentityError::EmailTaken);
        }
        let user_id = Uuid::new_v4();
        users.insert(user_id, (email.to_string(), password_hash));
        Ok(AuthUser {
            user_id,
            email: email.to_string(),
        })
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthUser>, IdentityError> {
        let found = {
            let users = self.users.lock().expect("identity map poisoned");
            users
                .iter()
                .find(|(_, (e, _))| e == email)
                .map(|(id, (e, hash))| (*id, e.clone(), hash.clone()))
        };
        let Some((user_id, email, hash)) = found else {
            return Ok(None);
        };
        if verify_password(password, &hash).await? {
            Ok(Some(AuthUser { user_id, email }))
        } else {
            Ok(None)
        }
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.users
            .lock()
            .expect("identity map poisoned")
            .remove(&user_id);
        Ok(())
    }
}
