//! Token store: one refresh token per external user id.
//!
//! PostgreSQL when a database is configured, an in-memory map otherwise.

pub mod acquire;
pub mod db;
pub mod memory;
mod repository;

pub use acquire::acquire_refresh_token;
pub use db::PgTokenStore;
pub use memory::InMemoryTokenStore;
pub use repository::{TokenRecord, TokenRepository};
