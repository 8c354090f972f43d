//! Local store for notes

mod migrations;
mod sqlite;
mod store;

pub use sqlite::SqliteLocalStore;
pub use store::{LocalStore, StoreChange};
