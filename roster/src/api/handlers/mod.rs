//! Axum route handlers.
//!
//! Handlers extract query parameters and JSON bodies, call the repositories in
//! [`crate::db::handlers`] and map the results onto the API models. Errors flow out as
//! [`crate::errors::Error`], which renders the HTTP response.
//!
//! - [`members`]: member search (plain and paginated) and member CRUD
//! - [`teams`]: team CRUD

pub mod members;
pub mod teams;
