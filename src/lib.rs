//! # Stakeholders - Stakeholder Relationship Repository
//!
//! Registry of organizations/individuals connected by a directed
//! parent → child relation kept in its own table.
//!
//! Stakeholders provides:
//! - Entity store over the `stakeholder` table (dual numeric/uuid lookup)
//! - Relation store over `stakeholder_relations` (link/unlink, related-id sets)
//! - One-hop graph expansion (parents and children, never deeper)
//! - An async listing/filtering facade with an explicit transaction scope

pub mod identifier;
pub mod stakeholder;
pub mod relation;
pub mod listing;
pub mod storage;
pub mod graph;
pub mod registry;
pub mod config;
pub mod output;

// Re-exports for convenient access
pub use identifier::Identifier;
pub use stakeholder::{AttrValue, Attributes, Column, Filter, Stakeholder};
pub use relation::{LinkRequest, Relation, RelationType};
pub use listing::{Listing, Page};
pub use storage::{DbStats, EntityStore, RelationStore, SqliteStore, StakeholderStore};
pub use graph::GraphQuery;
pub use registry::StakeholderRegistry;

/// Result type alias for stakeholder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for stakeholder operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Ambiguous identifier: {0:?}")]
    AmbiguousIdentifier(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Database connection lock poisoned")]
    ConnectionPoisoned,
}

impl Error {
    /// Map a write failure from the backing store.
    ///
    /// Constraint violations become [`Error::Validation`]; anything else stays
    /// a storage error.
    pub fn from_write(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, _)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Validation(err.to_string())
            }
            other => Error::Storage(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
