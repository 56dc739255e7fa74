//! Database models for teams.

use crate::api::models::teams::{TeamCreate, TeamUpdate};
use crate::types::TeamId;
use chrono::{DateTime, Utc};

/// Database request for creating a new team
#[derive(Debug, Clone)]
pub struct TeamCreateDBRequest {
    pub name: String,
}

impl From<TeamCreate> for TeamCreateDBRequest {
    fn from(create: TeamCreate) -> Self {
        Self { name: create.name }
    }
}

/// Database request for updating a team
#[derive(Debug, Clone, Default)]
pub struct TeamUpdateDBRequest {
    pub name: Option<String>,
}

impl From<TeamUpdate> for TeamUpdateDBRequest {
    fn from(update: TeamUpdate) -> Self {
        Self { name: update.name }
    }
}

/// Database response for a team
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDBResponse {
    pub id: TeamId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
