//! In-memory catalog storage.
//!
//! A [`CatalogStore`] is validated once at construction and never mutated.
//! A [`CatalogHandle`] lets the composition root swap in a whole new store
//! while searches keep reading the snapshot they started with.

mod handle;
pub mod seed;
mod store;

pub use handle::*;
pub use store::*;

use thiserror::Error;

/// Catalog load errors. All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record at position {0} has an empty id")]
    EmptyId(usize),

    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    #[error("Record {0} has an empty name")]
    EmptyName(String),

    #[error("Record {0} has no categories")]
    MissingCategories(String),

    #[error("Record {0} has a non-finite popularity score")]
    InvalidPopularity(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;
