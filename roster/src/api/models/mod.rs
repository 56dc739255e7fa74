//! API request and response data models.
//!
//! API models are kept apart from the database models so the JSON contract and the storage
//! representation can change independently. Everything here derives `utoipa::ToSchema` and ends up
//! in the generated OpenAPI document.
//!
//! - [`members`]: member payloads, search query parameters and the joined search row
//! - [`teams`]: team payloads
//! - [`pagination`]: `skip` / `limit` parameters and the paginated envelope

pub mod members;
pub mod pagination;
pub mod teams;
