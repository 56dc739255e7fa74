//! Database layer for data persistence and access.
//!
//! SQLx over PostgreSQL, organised with the Repository pattern:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (api::handlers, one transaction per request)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries, predicates appended via QueryBuilder)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - requests, responses and projections)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database record structures
//! - [`errors`]: Database-specific error types
//!
//! # Migrations
//!
//! Schema migrations live in `migrations/` and are embedded by [`crate::migrator`]:
//!
//! ```ignore
//! roster::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
