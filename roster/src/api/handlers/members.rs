use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::Acquire;

use crate::{
    AppState,
    api::models::{
        members::{MemberCreate, MemberResponse, MemberTeamDto, MemberUpdate, SearchMembersQuery},
        pagination::PaginatedResponse,
    },
    db::{
        handlers::{Members, Repository},
        models::members::{MemberCreateDBRequest, MemberUpdateDBRequest},
    },
    errors::{Error, Result},
    search::MemberSearchCondition,
    types::MemberId,
};

fn require_non_negative_age(age: i32) -> Result<()> {
    if age < 0 {
        Err(Error::BadRequest {
            message: "age must not be negative".to_string(),
        })
    } else {
        Ok(())
    }
}

/// Search members by name, team name and age range. Every parameter is optional; blank names are
/// ignored.
#[utoipa::path(
    get,
    path = "/v1/members",
    tag = "members",
    summary = "Search members",
    params(MemberSearchCondition),
    responses(
        (status = 200, description = "Matching members with their team", body = Vec<MemberTeamDto>),
        (status = 400, description = "Malformed query parameters"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_members(
    State(state): State<AppState>,
    Query(condition): Query<MemberSearchCondition>,
) -> Result<Json<Vec<MemberTeamDto>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Members::new(&mut conn).search(&condition).await?;

    Ok(Json(rows.into_iter().map(MemberTeamDto::from).collect()))
}

/// Paginated member search
#[utoipa::path(
    get,
    path = "/v2/members",
    tag = "members",
    summary = "Search members (paginated)",
    params(SearchMembersQuery),
    responses(
        (status = 200, description = "One page of matching members", body = PaginatedResponse<MemberTeamDto>),
        (status = 400, description = "Malformed query parameters"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn search_members_page(
    State(state): State<AppState>,
    Query(query): Query<SearchMembersQuery>,
) -> Result<Json<PaginatedResponse<MemberTeamDto>>> {
    let (skip, limit) = query.pagination.params();

    // Page and count read from the same snapshot
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let (rows, total_count) = {
        let mut repo = Members::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        repo.search_page(&query.condition, skip, limit).await?
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(MemberTeamDto::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/v1/members",
    tag = "members",
    summary = "Create member",
    request_body = MemberCreate,
    responses(
        (status = 201, description = "Member created", body = MemberResponse),
        (status = 400, description = "Invalid request or unknown team"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_member(State(state): State<AppState>, Json(create): Json<MemberCreate>) -> Result<(StatusCode, Json<MemberResponse>)> {
    if let Some(age) = create.age {
        require_non_negative_age(age)?;
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let member = Members::new(&mut conn).create(&MemberCreateDBRequest::from(create)).await?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

#[utoipa::path(
    get,
    path = "/v1/members/{member_id}",
    tag = "members",
    summary = "Get member",
    params(("member_id" = i64, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member details", body = MemberResponse),
        (status = 404, description = "Member not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn get_member(State(state): State<AppState>, Path(member_id): Path<MemberId>) -> Result<Json<MemberResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match Members::new(&mut conn).get_by_id(member_id).await? {
        Some(member) => Ok(Json(MemberResponse::from(member))),
        None => Err(Error::NotFound {
            resource: "Member".to_string(),
            id: member_id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/members/{member_id}",
    tag = "members",
    summary = "Update member",
    request_body = MemberUpdate,
    params(("member_id" = i64, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 400, description = "Invalid request or unknown team"),
        (status = 404, description = "Member not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn update_member(
    State(state): State<AppState>,
    Path(member_id): Path<MemberId>,
    Json(update): Json<MemberUpdate>,
) -> Result<Json<MemberResponse>> {
    if let Some(age) = update.age {
        require_non_negative_age(age)?;
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let member = Members::new(&mut conn)
        .update(member_id, &MemberUpdateDBRequest::from(update))
        .await?;

    Ok(Json(MemberResponse::from(member)))
}

#[utoipa::path(
    delete,
    path = "/v1/members/{member_id}",
    tag = "members",
    summary = "Delete member",
    params(("member_id" = i64, Path, description = "Member ID")),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 404, description = "Member not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn delete_member(State(state): State<AppState>, Path(member_id): Path<MemberId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Members::new(&mut conn).delete(member_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Member".to_string(),
            id: member_id.to_string(),
        })
    }
}
