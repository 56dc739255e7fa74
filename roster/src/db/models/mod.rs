//! Database record structures.
//!
//! Each submodule holds the request types a repository accepts (`*CreateDBRequest`,
//! `*UpdateDBRequest`) and the response types it returns (`*DBResponse` plus query projections).
//! API models convert into the request types with `From`, and the API layer converts the
//! responses back out:
//!
//! ```ignore
//! use roster::api::models::teams::TeamResponse;
//!
//! let db_team: TeamDBResponse = /* ... */;
//! let api_response: TeamResponse = db_team.into();
//! ```

pub mod members;
pub mod teams;
