//! Storage backends for the short-code mapping table.

pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use wormhole_core::repository::{
    Acquired, InsertOutcome, ReadRepository, Repository, Result, ShortcodeEntry,
};
pub use wormhole_core::StorageError;
