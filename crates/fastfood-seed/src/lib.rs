//! fastfood-seed: schema migration and idempotent seeding.
//!
//! Seeding goes through the [`SeedStore`] trait: parameterized queries
//! against Postgres ([`PgSeedStore`]) or an in-memory store
//! ([`MemoryStore`]) for tests and dry runs.
//!
//! Every insert is preceded by an existence check on the record's natural
//! key, so running the seeder on every startup never produces duplicates
//! and never touches an existing admin's credentials.

pub mod error;
pub mod memory;
pub mod password;
pub mod postgres;
pub mod records;
pub mod seeder;
pub mod store;

pub use error::{SeedError, SeedResult};
pub use memory::{MemoryState, MemoryStore};
pub use postgres::PgSeedStore;
pub use records::*;
pub use seeder::{SeedOutcome, ensure_baseline, ensure_sample_data, seed};
pub use store::SeedStore;
