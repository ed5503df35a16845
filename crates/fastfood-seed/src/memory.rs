//! In-memory [`SeedStore`] for tests and dry runs.
//!
//! The whole state is serializable so it can stand in for a database dump.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SeedError, SeedResult};
use crate::records::{Customer, MenuItem, Restaurant, UserRecord};
use crate::store::SeedStore;

/// Rows held by a [`MemoryStore`], in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryState {
    pub restaurants: Vec<Restaurant>,
    pub users: Vec<UserRecord>,
    pub customers: Vec<Customer>,
    /// `(restaurant natural key, item)` pairs.
    pub menu_items: Vec<(String, MenuItem)>,
}

/// Cloneable handle to shared in-memory state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SeedResult<MemoryState> {
        Ok(self.lock()?.clone())
    }

    /// Replace all rows with `state`.
    pub fn replace(&self, state: MemoryState) -> SeedResult<()> {
        *self.lock()? = state;
        Ok(())
    }

    pub fn to_json(&self) -> SeedResult<Vec<u8>> {
        serde_json::to_vec(&*self.lock()?).map_err(|e| SeedError::Corrupt(e.to_string()))
    }

    pub fn load_json(&self, bytes: &[u8]) -> SeedResult<()> {
        let state: MemoryState =
            serde_json::from_slice(bytes).map_err(|e| SeedError::Corrupt(e.to_string()))?;
        self.replace(state)
    }

    fn lock(&self) -> SeedResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| SeedError::Database("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SeedStore for MemoryStore {
    async fn first_restaurant(&self) -> SeedResult<Option<Restaurant>> {
        Ok(self.lock()?.restaurants.first().cloned())
    }

    async fn insert_restaurant(&self, restaurant: &Restaurant) -> SeedResult<()> {
        let mut state = self.lock()?;
        if state
            .restaurants
            .iter()
            .any(|r| r.external_id == restaurant.external_id)
        {
            return Err(SeedError::Database(format!(
                "duplicate restaurant {}",
                restaurant.external_id
            )));
        }
        state.restaurants.push(restaurant.clone());
        Ok(())
    }

    async fn find_user(&self, username: &str) -> SeedResult<Option<UserRecord>> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: &UserRecord) -> SeedResult<()> {
        let mut state = self.lock()?;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(SeedError::Database(format!("duplicate user {}", user.username)));
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn customer_exists(&self, email: &str) -> SeedResult<bool> {
        Ok(self.lock()?.customers.iter().any(|c| c.email == email))
    }

    async fn insert_customer(&self, customer: &Customer) -> SeedResult<()> {
        self.lock()?.customers.push(customer.clone());
        Ok(())
    }

    async fn menu_item_exists(&self, restaurant_id: &str, name: &str) -> SeedResult<bool> {
        Ok(self
            .lock()?
            .menu_items
            .iter()
            .any(|(r, item)| r == restaurant_id && item.name == name))
    }

    async fn insert_menu_item(&self, restaurant_id: &str, item: &MenuItem) -> SeedResult<()> {
        self.lock()?
            .menu_items
            .push((restaurant_id.to_string(), item.clone()));
        Ok(())
    }
}
