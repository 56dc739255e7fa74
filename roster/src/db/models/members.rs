//! Database models for members and the projections the member queries return.

use crate::api::models::members::{MemberCreate, MemberUpdate};
use crate::types::{MemberId, TeamId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new member
#[derive(Debug, Clone)]
pub struct MemberCreateDBRequest {
    pub name: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
}

impl MemberCreateDBRequest {
    pub fn new(name: impl Into<String>, age: i32, team_id: Option<TeamId>) -> Self {
        Self {
            name: Some(name.into()),
            age,
            team_id,
        }
    }
}

impl From<MemberCreate> for MemberCreateDBRequest {
    fn from(create: MemberCreate) -> Self {
        Self {
            name: create.name,
            age: create.age.unwrap_or_default(),
            team_id: create.team_id,
        }
    }
}

/// Database request for updating a member. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdateDBRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    /// `Some(None)` detaches the member from its team
    pub team_id: Option<Option<TeamId>>,
}

impl From<MemberUpdate> for MemberUpdateDBRequest {
    fn from(update: MemberUpdate) -> Self {
        Self {
            name: update.name,
            age: update.age,
            team_id: update.team_id,
        }
    }
}

/// Database response for a member
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDBResponse {
    pub id: MemberId,
    pub name: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of a member search: the member joined with its (optional) team
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MemberTeamDBResponse {
    pub member_id: MemberId,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
}

/// Name and age only
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MemberDto {
    pub name: Option<String>,
    pub age: i32,
}

/// Member name exposed under a different alias, paired with the oldest age across all members
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserDto {
    pub user_name: Option<String>,
    pub age: i32,
}

/// Aggregates over every member's age. All but `count` are `None` when there are no members.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MemberAgeStats {
    pub count: i64,
    pub sum: Option<i64>,
    pub avg: Option<f64>,
    pub max: Option<i32>,
    pub min: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TeamAgeAverage {
    pub team_name: String,
    pub average_age: f64,
}
