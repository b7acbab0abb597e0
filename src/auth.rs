//! User accounts: registration, login and the persisted CLI session.

use crate::core::currency::CurrencyCode;
use crate::core::error::CoreError;
use crate::core::portfolio::{Portfolio, User};
use crate::store::UserStore;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 4;

fn hash_password(password: &str, salt: &str) -> String {
    let digest = hmac_sha256::Hash::hash(format!("{password}{salt}").as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn verify_password(user: &User, password: &str) -> bool {
    hash_password(password, &user.salt) == user.password_hash
}

pub struct UserManager<'a> {
    store: &'a dyn UserStore,
}

impl<'a> UserManager<'a> {
    pub fn new(store: &'a dyn UserStore) -> Self {
        Self { store }
    }

    /// Creates a user with a salted password hash and a portfolio seeded
    /// with the starting balance in the settlement currency.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        seed_currency: &CurrencyCode,
        seed_balance: f64,
    ) -> Result<User, CoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::InvalidUsername);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(CoreError::WeakPassword(MIN_PASSWORD_LEN));
        }
        if self.store.get_user(username)?.is_some() {
            return Err(CoreError::UserExists(username.to_string()));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let user = User {
            id: self.store.next_user_id()?,
            username: username.to_string(),
            password_hash: hash_password(password, &salt),
            salt,
            registered_at: Utc::now(),
            portfolio: Portfolio::seeded(seed_currency.clone(), seed_balance),
            trades: Vec::new(),
        };
        self.store.put_user(&user)?;

        info!(user = %user.username, user_id = user.id, "User registered");
        Ok(user)
    }

    /// Verifies credentials and records the session.
    pub fn login(&self, username: &str, password: &str) -> Result<User, CoreError> {
        debug!(user = %username, "Login attempt");
        let user = self
            .store
            .get_user(username.trim())?
            .ok_or_else(|| CoreError::UserNotFound(username.to_string()))?;

        if !verify_password(&user, password) {
            warn!(user = %username, "Invalid password");
            return Err(CoreError::InvalidPassword);
        }

        self.store.set_session(Some(&user.username))?;
        info!(user = %user.username, user_id = user.id, "User logged in");
        Ok(user)
    }

    pub fn logout(&self) -> Result<Option<String>, CoreError> {
        let current = self.store.session()?;
        self.store.set_session(None)?;
        if let Some(name) = &current {
            info!(user = %name, "User logged out");
        }
        Ok(current)
    }

    /// The logged-in user, or `NotLoggedIn`.
    pub fn current_user(&self) -> Result<User, CoreError> {
        let username = self.store.session()?.ok_or(CoreError::NotLoggedIn)?;
        self.store
            .get_user(&username)?
            .ok_or(CoreError::UserNotFound(username))
    }
}
