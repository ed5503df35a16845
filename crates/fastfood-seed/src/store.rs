//! The store the seeder writes to.

use async_trait::async_trait;

use crate::error::SeedResult;
use crate::records::{Customer, MenuItem, Restaurant, UserRecord};

/// Typed, parameterized access to the records the seeder manages.
///
/// Existence checks and inserts are separate calls; callers check first
/// and only insert when absent.
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// The oldest restaurant, if any exists.
    async fn first_restaurant(&self) -> SeedResult<Option<Restaurant>>;

    async fn insert_restaurant(&self, restaurant: &Restaurant) -> SeedResult<()>;

    async fn find_user(&self, username: &str) -> SeedResult<Option<UserRecord>>;

    async fn insert_user(&self, user: &UserRecord) -> SeedResult<()>;

    async fn customer_exists(&self, email: &str) -> SeedResult<bool>;

    async fn insert_customer(&self, customer: &Customer) -> SeedResult<()>;

    async fn menu_item_exists(&self, restaurant_id: &str, name: &str) -> SeedResult<bool>;

    async fn insert_menu_item(&self, restaurant_id: &str, item: &MenuItem) -> SeedResult<()>;
}
