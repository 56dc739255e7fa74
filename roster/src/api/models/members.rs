//! API request/response models for members and member search.

use super::pagination::Pagination;
use crate::db::models::members::{MemberDBResponse, MemberTeamDBResponse};
use crate::search::MemberSearchCondition;
use crate::types::{MemberId, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the paginated member search: the search criteria plus `skip` / `limit`
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct SearchMembersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub condition: MemberSearchCondition,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// A member joined with its team. Team fields are `null` when the member has no team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberTeamDto {
    pub member_id: MemberId,
    #[schema(example = "member1")]
    pub username: Option<String>,
    #[schema(example = 10)]
    pub age: i32,
    pub team_id: Option<TeamId>,
    #[schema(example = "teamA")]
    pub team_name: Option<String>,
}

impl From<MemberTeamDBResponse> for MemberTeamDto {
    fn from(row: MemberTeamDBResponse) -> Self {
        Self {
            member_id: row.member_id,
            username: row.username,
            age: row.age,
            team_id: row.team_id,
            team_name: row.team_name,
        }
    }
}

/// Request body for creating a member
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberCreate {
    #[schema(example = "member1")]
    pub name: Option<String>,
    /// Defaults to 0
    #[schema(example = 10)]
    pub age: Option<i32>,
    pub team_id: Option<TeamId>,
}

/// Request body for updating a member. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    /// Team (None = no change, Some(None) = leave the team, Some(id) = move)
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    #[schema(value_type = Option<Option<TeamId>>)]
    pub team_id: Option<Option<TeamId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: MemberId,
    pub name: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MemberDBResponse> for MemberResponse {
    fn from(db: MemberDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            age: db.age,
            team_id: db.team_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_combines_criteria_and_paging() {
        let query: SearchMembersQuery = serde_urlencoded::from_str("teamName=teamA&ageGoe=10&skip=2&limit=5").unwrap();
        assert_eq!(
            query.condition,
            MemberSearchCondition::default().with_team_name("teamA").with_age_goe(10)
        );
        assert_eq!(query.pagination.params(), (2, 5));

        let empty: SearchMembersQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(empty.condition, MemberSearchCondition::default());
        assert_eq!(empty.pagination.params(), (0, 10));
    }

    #[test]
    fn test_member_update_distinguishes_null_team_from_absent() {
        let absent: MemberUpdate = serde_json::from_str(r#"{"age": 12}"#).unwrap();
        assert_eq!(absent.team_id, None);

        let cleared: MemberUpdate = serde_json::from_str(r#"{"teamId": null}"#).unwrap();
        assert_eq!(cleared.team_id, Some(None));

        let moved: MemberUpdate = serde_json::from_str(r#"{"teamId": 7}"#).unwrap();
        assert_eq!(moved.team_id, Some(Some(7)));
    }

    #[test]
    fn test_member_team_dto_serializes_camel_case() {
        let dto = MemberTeamDto {
            member_id: 1,
            username: Some("member1".to_string()),
            age: 10,
            team_id: None,
            team_name: None,
        };
        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            serde_json::json!({
                "memberId": 1,
                "username": "member1",
                "age": 10,
                "teamId": null,
                "teamName": null
            })
        );
    }
}
