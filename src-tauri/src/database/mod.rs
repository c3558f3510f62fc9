//! Document store module
//!
//! This module provides all access to the remote document database:
//! - The [`DocumentStore`] seam and its Firestore and in-memory backends
//! - Model definitions
//! - Repository layer for typed complaint and profile operations

pub mod firestore;
pub mod memory;
pub mod models;
pub mod repository;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use models::*;
pub use repository::Repository;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Field map of one document; timestamps are RFC 3339 strings
pub type Fields = Map<String, Value>;

/// A document read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filters plus an optional single ordering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }
}

/// Remote document database.
///
/// Every write targets a single document. Fields named in
/// `server_timestamps` are set by the store to its own clock at write time.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `None` when it does not exist
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Create a document under a fresh id and return that id
    async fn create(
        &self,
        collection: &str,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<String>;

    /// Merge `fields` into an existing document; `NotFound` when absent
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<()>;

    /// Run a query. With an ordering, documents lacking the field are left out.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;
}
