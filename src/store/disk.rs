use crate::core::portfolio::User;
use crate::core::rates::RateTable;
use crate::store::{RatesStore, StoreError, UserStore};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tracing::debug;

const RATES_KEY: &str = "current";
const SESSION_KEY: &str = "current";

/// Durable store backed by a fjall keyspace with one partition per concern.
pub struct DiskStore {
    _keyspace: Keyspace,
    rates: PartitionHandle,
    users: PartitionHandle,
    session: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let keyspace = fjall::Config::new(path).open()?;
        let rates = keyspace.open_partition("rates", PartitionCreateOptions::default())?;
        let users = keyspace.open_partition("users", PartitionCreateOptions::default())?;
        let session = keyspace.open_partition("session", PartitionCreateOptions::default())?;
        debug!(path = %path.display(), "Opened data store");
        Ok(Self {
            _keyspace: keyspace,
            rates,
            users,
            session,
        })
    }
}

impl RatesStore for DiskStore {
    fn load(&self) -> Result<Option<RateTable>, StoreError> {
        match self.rates.get(RATES_KEY)? {
            Some(raw) => {
                let table: RateTable = serde_json::from_slice(&raw)?;
                debug!(pairs = table.len(), "Loaded rate table");
                Ok(Some(table))
            }
            None => Ok(None),
        }
    }

    fn save(&self, table: &RateTable) -> Result<(), StoreError> {
        self.rates.insert(RATES_KEY, serde_json::to_vec(table)?)?;
        debug!(pairs = table.len(), "Saved rate table");
        Ok(())
    }
}

impl UserStore for DiskStore {
    fn get_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        match self.users.get(username)? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .insert(user.username.as_str(), serde_json::to_vec(user)?)?;
        Ok(())
    }

    fn next_user_id(&self) -> Result<u64, StoreError> {
        let mut max_id = 0;
        for kv in self.users.iter() {
            let (_, raw) = kv?;
            let user: User = serde_json::from_slice(&raw)?;
            max_id = max_id.max(user.id);
        }
        Ok(max_id + 1)
    }

    fn session(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .session
            .get(SESSION_KEY)?
            .map(|raw| String::from_utf8_lossy(&raw).into_owned()))
    }

    fn set_session(&self, username: Option<&str>) -> Result<(), StoreError> {
        match username {
            Some(name) => self.session.insert(SESSION_KEY, name)?,
            None => self.session.remove(SESSION_KEY)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyCode;
    use crate::core::portfolio::Portfolio;
    use chrono::Utc;
    use tempfile::tempdir;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn sample_user(id: u64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            password_hash: "hash".to_string(),
            salt: "salt".to_string(),
            registered_at: Utc::now(),
            portfolio: Portfolio::seeded(code("USD"), 1000.0),
            trades: Vec::new(),
        }
    }

    #[test]
    fn test_rates_round_trip() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        assert!(store.load().unwrap().is_none());

        let mut table = RateTable::new(code("USD"));
        table
            .upsert(&code("BTC"), &code("USD"), 59337.21, Utc::now(), "test")
            .unwrap();
        store.save(&table).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded.lookup(&code("BTC"), &code("USD")).unwrap().rate,
            59337.21
        );
    }

    #[test]
    fn test_users_and_ids() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        assert_eq!(store.next_user_id().unwrap(), 1);

        store.put_user(&sample_user(1, "alice")).unwrap();
        store.put_user(&sample_user(2, "bob")).unwrap();

        assert_eq!(store.next_user_id().unwrap(), 3);
        let alice = store.get_user("alice").unwrap().unwrap();
        assert_eq!(alice.portfolio.balance(&code("USD")), 1000.0);
        assert!(store.get_user("carol").unwrap().is_none());
    }

    #[test]
    fn test_session_lifecycle() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        assert!(store.session().unwrap().is_none());

        store.set_session(Some("alice")).unwrap();
        assert_eq!(store.session().unwrap().as_deref(), Some("alice"));

        store.set_session(None).unwrap();
        assert!(store.session().unwrap().is_none());
    }
}
