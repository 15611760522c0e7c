// Account Directory
// Registration, login, logout, and the single current-session pointer

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{get_json, set_json, KeyValueStore, StoreError, SESSION_KEY, USERS_KEY};

// ============================================================================
// TYPES
// ============================================================================

/// A registered account.
///
/// Passwords are never stored: each account carries a random salt and the
/// SHA-256 digest of salt + password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub salt: String,
    pub password_hash: String,
}

impl Account {
    /// Create an account with a fresh UUID identity and a salted digest
    /// of the given password.
    pub fn create(email: &str, password: &str) -> Self {
        let salt = uuid::Uuid::new_v4().to_string();
        let password_hash = hash_password(&salt, password);

        Account {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            salt,
            password_hash,
        }
    }

    /// Constant-time check of a candidate password against the stored digest.
    pub fn verify_password(&self, password: &str) -> bool {
        let candidate = hash_password(&self.salt, password);
        constant_time_eq(candidate.as_bytes(), self.password_hash.as_bytes())
    }
}

/// The currently logged-in account reference. Password material excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub email: String,
}

impl From<&Account> for Session {
    fn from(account: &Account) -> Self {
        Session {
            id: account.id.clone(),
            email: account.email.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already in use")]
    DuplicateEmail,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ============================================================================
// ACCOUNT DIRECTORY
// ============================================================================

/// The mapping of registered accounts plus the current-session pointer,
/// both persisted in the injected store under [`USERS_KEY`] / [`SESSION_KEY`].
pub struct AccountDirectory<S> {
    store: S,
}

impl<S: KeyValueStore> AccountDirectory<S> {
    pub fn new(store: S) -> Self {
        AccountDirectory { store }
    }

    /// Register a new account and establish a session for it.
    ///
    /// Fails with [`AuthError::DuplicateEmail`] when any existing account
    /// already uses the email (case-sensitive, linear scan).
    pub fn register(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut accounts = self.accounts()?;

        if accounts.iter().any(|a| a.email == email) {
            debug!(email, "registration rejected: email already in use");
            return Err(AuthError::DuplicateEmail);
        }

        let account = Account::create(email, password);
        let session = Session::from(&account);

        accounts.push(account);
        set_json(&self.store, USERS_KEY, &accounts)?;
        set_json(&self.store, SESSION_KEY, &session)?;

        info!(email, id = %session.id, "account registered");
        Ok(session)
    }

    /// Log in with email and password; first matching account wins.
    ///
    /// Fails with [`AuthError::InvalidCredentials`] when no account matches
    /// both the email and the password.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let accounts = self.accounts()?;

        let account = accounts
            .iter()
            .find(|a| a.email == email && a.verify_password(password))
            .ok_or(AuthError::InvalidCredentials)?;

        let session = Session::from(account);
        set_json(&self.store, SESSION_KEY, &session)?;

        info!(email, id = %session.id, "login");
        Ok(session)
    }

    /// Clear the session pointer. Idempotent.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.remove(SESSION_KEY)?;
        debug!("session cleared");
        Ok(())
    }

    /// Read the current session pointer, if any. Used by callers as the
    /// access guard for every ledger operation.
    pub fn current_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(get_json(&self.store, SESSION_KEY)?)
    }

    /// All registered accounts, empty when nothing has been persisted yet.
    fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(get_json(&self.store, USERS_KEY)?.unwrap_or_default())
    }

    /// Number of registered accounts.
    pub fn account_count(&self) -> Result<usize, AuthError> {
        Ok(self.accounts()?.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================
