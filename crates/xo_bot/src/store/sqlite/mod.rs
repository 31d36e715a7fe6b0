//! SQLite session store built on diesel.

mod models;
mod repository;
mod schema;

pub use repository::SqliteStore;
