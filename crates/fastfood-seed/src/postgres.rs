//! Postgres-backed [`SeedStore`].
//!
//! All values are bound as query parameters; nothing is interpolated into
//! SQL text.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use fastfood_core::DatabaseSettings;

use crate::error::SeedResult;
use crate::records::{Customer, MenuItem, Restaurant, UserRecord};
use crate::store::SeedStore;

/// Idempotent schema applied by [`PgSeedStore::migrate`].
pub const SCHEMA: &str = include_str!("../sql/schema.sql");

#[derive(Clone)]
pub struct PgSeedStore {
    pool: PgPool,
}

impl PgSeedStore {
    /// Connect with the given settings. One connection is enough: seeding
    /// is sequential.
    pub async fn connect(settings: &DatabaseSettings) -> SeedResult<Self> {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.name);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        debug!(host = %settings.host, port = settings.port, db = %settings.name, "connected to database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema.
    pub async fn migrate(&self) -> SeedResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        info!("database schema applied");
        Ok(())
    }
}

#[async_trait]
impl SeedStore for PgSeedStore {
    async fn first_restaurant(&self) -> SeedResult<Option<Restaurant>> {
        let row = sqlx::query(
            "SELECT external_id, name, address, phone, email FROM restaurants ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Restaurant {
                external_id: row.try_get("external_id")?,
                name: row.try_get("name")?,
                address: row.try_get("address")?,
                phone: row.try_get("phone")?,
                email: row.try_get("email")?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_restaurant(&self, restaurant: &Restaurant) -> SeedResult<()> {
        sqlx::query(
            "INSERT INTO restaurants (external_id, name, address, phone, email) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&restaurant.external_id)
        .bind(&restaurant.name)
        .bind(&restaurant.address)
        .bind(&restaurant.phone)
        .bind(&restaurant.email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user(&self, username: &str) -> SeedResult<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT u.username, u.email, u.password_hash, u.role, r.external_id, u.is_active \
             FROM users u LEFT JOIN restaurants r ON r.id = u.restaurant_id \
             WHERE u.username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let role: String = row.try_get("role")?;
        Ok(Some(UserRecord {
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role: role.parse()?,
            restaurant_id: row.try_get("external_id")?,
            is_active: row.try_get("is_active")?,
        }))
    }

    async fn insert_user(&self, user: &UserRecord) -> SeedResult<()> {
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role, restaurant_id, is_active) \
             VALUES ($1, $2, $3, $4, (SELECT id FROM restaurants WHERE external_id = $5), $6)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.restaurant_id)
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn customer_exists(&self, email: &str) -> SeedResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_customer(&self, customer: &Customer) -> SeedResult<()> {
        sqlx::query("INSERT INTO customers (name, email, phone) VALUES ($1, $2, $3)")
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.phone)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn menu_item_exists(&self, restaurant_id: &str, name: &str) -> SeedResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM menu_items m \
             JOIN restaurants r ON r.id = m.restaurant_id \
             WHERE r.external_id = $1 AND m.name = $2)",
        )
        .bind(restaurant_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_menu_item(&self, restaurant_id: &str, item: &MenuItem) -> SeedResult<()> {
        sqlx::query(
            "INSERT INTO menu_items (restaurant_id, name, description, price, category, is_available) \
             VALUES ((SELECT id FROM restaurants WHERE external_id = $1), $2, $3, \
                     CAST($4 AS NUMERIC) / 100, $5, $6)",
        )
        .bind(restaurant_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price_cents)
        .bind(&item.category)
        .bind(item.available)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
