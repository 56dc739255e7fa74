//! API request/response models for teams.

use super::pagination::Pagination;
use crate::db::models::teams::TeamDBResponse;
use crate::types::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing teams
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListTeamsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Request body for creating a team
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamCreate {
    /// Team name (must be unique)
    #[schema(example = "teamA")]
    pub name: String,
}

/// Request body for updating a team. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TeamUpdate {
    #[schema(example = "teamC")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TeamResponse {
    pub id: TeamId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TeamDBResponse> for TeamResponse {
    fn from(db: TeamDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
