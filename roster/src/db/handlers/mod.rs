//! Repository implementations for database access.
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations through [`Repository`]
//! - Builds its queries with `sqlx::QueryBuilder`, binding every value
//! - Returns models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Members`]: member CRUD plus predicate-driven search, projections, aggregates and bulk
//!   statements
//! - [`Teams`]: team CRUD and lookup by name
//!
//! # Usage
//!
//! ```ignore
//! use roster::db::handlers::{Members, Repository};
//! use roster::search::MemberSearchCondition;
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Members::new(&mut tx);
//!
//!     let condition = MemberSearchCondition::default().with_team_name("teamA");
//!     let rows = repo.search(&condition).await?;
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod members;
pub mod repository;
pub mod teams;

pub use members::{Assignment, JoinKind, MemberFilter, MemberQuery, Members, OrderBy};
pub use repository::Repository;
pub use teams::{TeamFilter, Teams};
