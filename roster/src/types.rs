//! Common type definitions.
//!
//! # ID Types
//!
//! Entity IDs are `BIGSERIAL` primary keys wrapped in type aliases so signatures say which table
//! they point at:
//!
//! - [`MemberId`]: Member identifier
//! - [`TeamId`]: Team identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// Type aliases for IDs
pub type MemberId = i64;
pub type TeamId = i64;

/// Sort direction for ORDER BY terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Where NULL values land in an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NullsOrder {
    /// Let the database decide (PostgreSQL: last for ASC, first for DESC)
    #[default]
    Default,
    First,
    Last,
}

impl fmt::Display for NullsOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullsOrder::Default => Ok(()),
            NullsOrder::First => write!(f, " NULLS FIRST"),
            NullsOrder::Last => write!(f, " NULLS LAST"),
        }
    }
}
