//! Storage module for chain document persistence

pub mod persistence;

pub use persistence::{load_from_file, save_to_file, ChainDocument, DocumentConfig, StorageError};
