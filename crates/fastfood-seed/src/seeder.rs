//! Idempotent seeding of baseline and sample records.

use tracing::{debug, info};

use fastfood_core::Mode;

use crate::error::SeedResult;
use crate::password::hash_password;
use crate::records::*;
use crate::store::SeedStore;

/// What a seeding pass inserted. All zero/false on a re-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedOutcome {
    pub restaurant_created: bool,
    pub admin_created: bool,
    pub customers_created: u32,
    pub menu_items_created: u32,
}

impl SeedOutcome {
    pub fn is_noop(&self) -> bool {
        *self == SeedOutcome::default()
    }
}

/// Make sure a restaurant and the admin account exist.
///
/// Creates the default restaurant only when no restaurant exists at all,
/// and the admin only when no user holds the reserved admin username. An
/// existing admin is never modified.
pub async fn ensure_baseline<S>(store: &S) -> SeedResult<SeedOutcome>
where
    S: SeedStore + ?Sized,
{
    let mut outcome = SeedOutcome::default();

    let restaurant = match store.first_restaurant().await? {
        Some(existing) => {
            debug!(restaurant = %existing.external_id, "restaurant present");
            existing
        }
        None => {
            let restaurant = default_restaurant();
            store.insert_restaurant(&restaurant).await?;
            info!(restaurant = %restaurant.external_id, "created default restaurant");
            outcome.restaurant_created = true;
            restaurant
        }
    };

    if store.find_user(DEFAULT_ADMIN_USERNAME).await?.is_some() {
        debug!(username = DEFAULT_ADMIN_USERNAME, "admin account present");
    } else {
        let admin = UserRecord {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password_hash: hash_password(DEFAULT_ADMIN_PASSWORD)?,
            role: Role::Admin,
            restaurant_id: Some(restaurant.external_id.clone()),
            is_active: true,
        };
        store.insert_user(&admin).await?;
        info!(username = DEFAULT_ADMIN_USERNAME, "created admin account");
        outcome.admin_created = true;
    }

    Ok(outcome)
}

/// Insert the illustrative customers and menu items that are missing.
///
/// Each record is checked by its natural key, so partial prior runs are
/// completed rather than duplicated. Requires a restaurant to exist.
pub async fn ensure_sample_data<S>(store: &S) -> SeedResult<SeedOutcome>
where
    S: SeedStore + ?Sized,
{
    let mut outcome = SeedOutcome::default();

    for customer in sample_customers() {
        if !store.customer_exists(&customer.email).await? {
            store.insert_customer(&customer).await?;
            outcome.customers_created += 1;
        }
    }

    let Some(restaurant) = store.first_restaurant().await? else {
        debug!("no restaurant, skipping sample menu");
        return Ok(outcome);
    };

    for item in sample_menu_items() {
        if !store
            .menu_item_exists(&restaurant.external_id, &item.name)
            .await?
        {
            store
                .insert_menu_item(&restaurant.external_id, &item)
                .await?;
            outcome.menu_items_created += 1;
        }
    }

    info!(
        customers = outcome.customers_created,
        menu_items = outcome.menu_items_created,
        "sample data seeded"
    );
    Ok(outcome)
}

/// Baseline seeding, plus sample data in development mode.
pub async fn seed<S>(store: &S, mode: Mode) -> SeedResult<SeedOutcome>
where
    S: SeedStore + ?Sized,
{
    let mut outcome = ensure_baseline(store).await?;
    if mode == Mode::Development {
        let samples = ensure_sample_data(store).await?;
        outcome.customers_created = samples.customers_created;
        outcome.menu_items_created = samples.menu_items_created;
    }
    Ok(outcome)
}
