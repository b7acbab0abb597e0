use crate::core::portfolio::User;
use crate::core::rates::RateTable;
use crate::store::{RatesStore, StoreError, UserStore};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory store for tests; mirrors `DiskStore` semantics.
#[derive(Default)]
pub struct MemoryStore {
    rates: Mutex<Option<RateTable>>,
    users: Mutex<HashMap<String, User>>,
    session: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatesStore for MemoryStore {
    fn load(&self) -> Result<Option<RateTable>, StoreError> {
        Ok(self.rates.lock().unwrap().clone())
    }

    fn save(&self, table: &RateTable) -> Result<(), StoreError> {
        *self.rates.lock().unwrap() = Some(table.clone());
        Ok(())
    }
}

impl UserStore for MemoryStore {
    fn get_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .lock()
            .unwrap()
            .insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn next_user_id(&self) -> Result<u64, StoreError> {
        let max_id = self
            .users
            .lock()
            .unwrap()
            .values()
            .map(|u| u.id)
            .max()
            .unwrap_or(0);
        Ok(max_id + 1)
    }

    fn session(&self) -> Result<Option<String>, StoreError> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn set_session(&self, username: Option<&str>) -> Result<(), StoreError> {
        *self.session.lock().unwrap() = username.map(str::to_string);
        Ok(())
    }
}
