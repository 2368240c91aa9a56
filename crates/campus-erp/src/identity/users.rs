use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};

use super::password::{PasswordError, PasswordHasher};
use super::session::{Role, Session};
use crate::storage::{is_constraint_violation, Database, StorageError};

/// Whether an account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Locked,
}

impl AccountStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Locked => "LOCKED",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(AccountStatus::Active),
            "LOCKED" => Some(AccountStatus::Locked),
            _ => None,
        }
    }
}

/// A row of `auth_db.users_auth` without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub status: AccountStatus,
    pub last_login: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("username must not be blank")]
    BlankUsername,
    #[error("user {0} already exists")]
    DuplicateUser(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account {0} is locked")]
    Locked(String),
    #[error("user {0} does not exist")]
    UnknownUser(String),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for IdentityError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}

const ACCOUNT_COLUMNS: &str = "user_id, username, role, status, last_login";

/// Credential store over the attached auth schema.
pub struct UserDirectory {
    db: Arc<Database>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl UserDirectory {
    pub fn new(
        db: Arc<Database>,
        hasher: PasswordHasher,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { db, hasher, clock }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Hash `password` and store a new ACTIVE account.
    pub fn create_user(
        &self,
        username: &str,
        role: Role,
        password: &str,
    ) -> Result<UserAccount, IdentityError> {
        let password_hash = self.hasher.hash(password)?;
        self.db
            .with_conn(|conn| insert_user(conn, username, role, &password_hash))
    }

    /// Verify credentials and stamp `last_login` on success.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Session, IdentityError> {
        let stored = self.db.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS}, password_hash FROM auth_db.users_auth
                     WHERE username = ?1"
                ),
                [username.trim()],
                |row| Ok((account_from_row(row)?, row.get::<_, String>(5)?)),
            )
            .optional()
            .map_err(IdentityError::from)
        })?;

        // Unknown users and wrong passwords look the same to the caller.
        let Some((account, password_hash)) = stored else {
            debug!(username, "login rejected: unknown user");
            return Err(IdentityError::InvalidCredentials);
        };
        if !self.hasher.verify(password, &password_hash)? {
            debug!(username, "login rejected: password mismatch");
            return Err(IdentityError::InvalidCredentials);
        }
        if account.status == AccountStatus::Locked {
            debug!(username, "login rejected: account locked");
            return Err(IdentityError::Locked(account.username));
        }

        let now = self.clock.utc().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE auth_db.users_auth SET last_login = ?1 WHERE user_id = ?2",
                params![now, account.user_id],
            )
            .map_err(IdentityError::from)
        })?;
        info!(user_id = account.user_id, role = %account.role, "user signed in");

        Ok(Session {
            user_id: account.user_id,
            username: account.username,
            role: account.role,
        })
    }

    pub fn set_status(&self, username: &str, status: AccountStatus) -> Result<(), IdentityError> {
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE auth_db.users_auth SET status = ?1 WHERE username = ?2",
                params![status.label(), username],
            )
            .map_err(IdentityError::from)
        })?;
        if changed == 0 {
            return Err(IdentityError::UnknownUser(username.to_string()));
        }
        info!(username, status = status.label(), "account status changed");
        Ok(())
    }

    /// Replace the stored hash after checking the current password.
    pub fn change_password(
        &self,
        username: &str,
        current: &str,
        replacement: &str,
    ) -> Result<(), IdentityError> {
        let session = self.authenticate(username, current)?;
        let password_hash = self.hasher.hash(replacement)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE auth_db.users_auth SET password_hash = ?1 WHERE user_id = ?2",
                params![password_hash, session.user_id],
            )
            .map_err(IdentityError::from)
        })?;
        Ok(())
    }

    pub fn user(&self, username: &str) -> Result<Option<UserAccount>, IdentityError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM auth_db.users_auth WHERE username = ?1"),
                [username],
                account_from_row,
            )
            .optional()
            .map_err(IdentityError::from)
        })
    }

    pub fn users(&self) -> Result<Vec<UserAccount>, IdentityError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM auth_db.users_auth ORDER BY username"
            ))?;
            let rows = stmt.query_map([], account_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Last successful sign-in, parsed back from storage.
    pub fn last_login(&self, username: &str) -> Result<Option<DateTime<Utc>>, IdentityError> {
        let stamp = self.user(username)?.and_then(|account| account.last_login);
        Ok(stamp
            .and_then(|value| DateTime::parse_from_rfc3339(&value).ok())
            .map(|value| value.with_timezone(&Utc)))
    }
}

/// Insert an account row with an already-computed hash.
pub(crate) fn insert_user(
    conn: &Connection,
    username: &str,
    role: Role,
    password_hash: &str,
) -> Result<UserAccount, IdentityError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(IdentityError::BlankUsername);
    }
    let inserted = conn.execute(
        "INSERT INTO auth_db.users_auth (username, role, password_hash) VALUES (?1, ?2, ?3)",
        params![username, role.label(), password_hash],
    );
    match inserted {
        Ok(_) => {}
        Err(err) if is_constraint_violation(&err) => {
            return Err(IdentityError::DuplicateUser(username.to_string()))
        }
        Err(err) => return Err(err.into()),
    }
    let user_id = conn.last_insert_rowid();
    info!(user_id, username, role = %role, "user created");
    Ok(UserAccount {
        user_id,
        username: username.to_string(),
        role,
        status: AccountStatus::Active,
        last_login: None,
    })
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<UserAccount> {
    let role: String = row.get(2)?;
    let status: String = row.get(3)?;
    Ok(UserAccount {
        user_id: row.get(0)?,
        username: row.get(1)?,
        role: Role::parse(&role).ok_or_else(|| invalid_text(2, role.clone()))?,
        status: AccountStatus::parse(&status).ok_or_else(|| invalid_text(3, status.clone()))?,
        last_login: row.get(4)?,
    })
}

fn invalid_text(column: usize, value: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        format!("unexpected value {value}").into(),
    )
}
