//! Base repository trait for database operations.

use std::collections::HashMap;

use crate::db::errors::Result;

/// Common CRUD surface shared by the table repositories.
///
/// A repository wraps a borrowed `PgConnection` (usually a transaction) and is the only place SQL
/// for its table is written. Request and response types are kept separate so the database layer
/// never depends on the shape of the API payloads.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID, `None` if it does not exist
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// Fetch several entities at once, keyed by ID. Missing IDs are simply absent from the map.
    async fn get_bulk(&mut self, ids: &[Self::Id]) -> Result<HashMap<Self::Id, Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Delete an entity by ID, returning whether a row was removed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Partially update an entity. Fails with `NotFound` when the ID does not exist.
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
