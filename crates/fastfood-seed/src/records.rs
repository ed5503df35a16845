//! Seed records and the fixed baseline/sample data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SeedError;

/// Natural key of the default restaurant.
pub const DEFAULT_RESTAURANT_ID: &str = "default";

/// Reserved username of the privileged account.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password set on the admin account when it is first created.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@fastfood.local";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Employee,
    Driver,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
            Role::Driver => "driver",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            "driver" => Ok(Role::Driver),
            "user" => Ok(Role::User),
            other => Err(SeedError::Corrupt(format!("unknown role {other:?}"))),
        }
    }
}

/// A restaurant (the tenant every account belongs to).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Natural key.
    pub external_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Natural key.
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    /// Natural key of the owning restaurant.
    pub restaurant_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    /// Natural key.
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Natural key together with the owning restaurant.
    pub name: String,
    pub description: String,
    /// Price in cents; never negative.
    pub price_cents: i64,
    pub category: String,
    pub available: bool,
}

pub fn default_restaurant() -> Restaurant {
    Restaurant {
        external_id: DEFAULT_RESTAURANT_ID.to_string(),
        name: "FastFood Central".to_string(),
        address: Some("1 Main Street".to_string()),
        phone: Some("+1-555-0100".to_string()),
        email: Some("central@fastfood.local".to_string()),
    }
}

pub fn sample_customers() -> Vec<Customer> {
    [
        ("John Doe", "john.doe@example.com", "+1-555-0101"),
        ("Jane Smith", "jane.smith@example.com", "+1-555-0102"),
        ("Bob Johnson", "bob.johnson@example.com", "+1-555-0103"),
    ]
    .into_iter()
    .map(|(name, email, phone)| Customer {
        name: name.to_string(),
        email: email.to_string(),
        phone: Some(phone.to_string()),
    })
    .collect()
}

pub fn sample_menu_items() -> Vec<MenuItem> {
    [
        ("Classic Burger", "Beef patty, lettuce, tomato, house sauce", 899, "burgers"),
        ("Chicken Sandwich", "Crispy chicken breast with pickles", 799, "sandwiches"),
        ("French Fries", "Golden fries with sea salt", 349, "sides"),
        ("Caesar Salad", "Romaine, parmesan, croutons", 649, "salads"),
        ("Chocolate Shake", "Hand-spun chocolate milkshake", 499, "drinks"),
    ]
    .into_iter()
    .map(|(name, description, price_cents, category)| MenuItem {
        name: name.to_string(),
        description: description.to_string(),
        price_cents,
        category: category.to_string(),
        available: true,
    })
    .collect()
}
