//! Persistence for the rate table, user accounts and the CLI session.
//!
//! The core treats storage as an injected capability: `disk` backs the real
//! application with a fjall keyspace, `memory` backs tests. Values are JSON
//! documents in both.

pub mod disk;
pub mod memory;

use crate::core::portfolio::User;
use crate::core::rates::RateTable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] fjall::Error),

    #[error("failed to encode or decode stored data: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Rate-cache persistence. Failure to save is surfaced but must not corrupt
/// the in-memory table.
pub trait RatesStore: Send + Sync {
    fn load(&self) -> Result<Option<RateTable>, StoreError>;
    fn save(&self, table: &RateTable) -> Result<(), StoreError>;
}

/// User documents keyed by username, plus the active login session.
pub trait UserStore: Send + Sync {
    fn get_user(&self, username: &str) -> Result<Option<User>, StoreError>;
    fn put_user(&self, user: &User) -> Result<(), StoreError>;
    fn next_user_id(&self) -> Result<u64, StoreError>;

    fn session(&self) -> Result<Option<String>, StoreError>;
    fn set_session(&self, username: Option<&str>) -> Result<(), StoreError>;
}
