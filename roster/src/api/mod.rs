//! HTTP API.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # Routes
//!
//! - `GET /v1/members`: search members, every criterion optional
//! - `GET /v2/members`: the same search, paginated with `skip` / `limit`
//! - `POST /v1/members`, `GET|PATCH|DELETE /v1/members/{id}`
//! - `GET|POST /v1/teams`, `GET|PATCH|DELETE /v1/teams/{id}`
//!
//! The OpenAPI document is served at `/openapi.json`.

pub mod handlers;
pub mod models;
