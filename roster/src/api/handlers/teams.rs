use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sqlx::Acquire;

use crate::{
    AppState,
    api::models::{
        pagination::PaginatedResponse,
        teams::{ListTeamsQuery, TeamCreate, TeamResponse, TeamUpdate},
    },
    db::{
        handlers::{Repository, TeamFilter, Teams},
        models::teams::{TeamCreateDBRequest, TeamUpdateDBRequest},
    },
    errors::{Error, Result},
    search::condition::has_text,
    types::TeamId,
};

fn require_name(name: &str) -> Result<()> {
    if has_text(name) {
        Ok(())
    } else {
        Err(Error::BadRequest {
            message: "team name must not be blank".to_string(),
        })
    }
}

#[utoipa::path(
    get,
    path = "/v1/teams",
    tag = "teams",
    summary = "List teams",
    params(ListTeamsQuery),
    responses(
        (status = 200, description = "Teams ordered by name", body = PaginatedResponse<TeamResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_teams(State(state): State<AppState>, Query(query): Query<ListTeamsQuery>) -> Result<Json<PaginatedResponse<TeamResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let (teams, total_count) = {
        let mut repo = Teams::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?);
        let teams = repo.list(&TeamFilter::new(skip, limit)).await?;
        let total_count = repo.count().await?;
        (teams, total_count)
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(PaginatedResponse::new(
        teams.into_iter().map(TeamResponse::from).collect(),
        total_count,
        skip,
        limit,
    )))
}

#[utoipa::path(
    post,
    path = "/v1/teams",
    tag = "teams",
    summary = "Create team",
    request_body = TeamCreate,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Blank name"),
        (status = 409, description = "A team with this name already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_team(State(state): State<AppState>, Json(create): Json<TeamCreate>) -> Result<(StatusCode, Json<TeamResponse>)> {
    require_name(&create.name)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let team = Teams::new(&mut conn).create(&TeamCreateDBRequest::from(create)).await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(team))))
}

#[utoipa::path(
    get,
    path = "/v1/teams/{team_id}",
    tag = "teams",
    summary = "Get team",
    params(("team_id" = i64, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team details", body = TeamResponse),
        (status = 404, description = "Team not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(team_id = %team_id))]
pub async fn get_team(State(state): State<AppState>, Path(team_id): Path<TeamId>) -> Result<Json<TeamResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match Teams::new(&mut conn).get_by_id(team_id).await? {
        Some(team) => Ok(Json(TeamResponse::from(team))),
        None => Err(Error::NotFound {
            resource: "Team".to_string(),
            id: team_id.to_string(),
        }),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/teams/{team_id}",
    tag = "teams",
    summary = "Rename team",
    request_body = TeamUpdate,
    params(("team_id" = i64, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 400, description = "Blank name"),
        (status = 404, description = "Team not found"),
        (status = 409, description = "A team with this name already exists"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(team_id = %team_id))]
pub async fn update_team(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
    Json(update): Json<TeamUpdate>,
) -> Result<Json<TeamResponse>> {
    if let Some(name) = &update.name {
        require_name(name)?;
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let team = Teams::new(&mut conn).update(team_id, &TeamUpdateDBRequest::from(update)).await?;

    Ok(Json(TeamResponse::from(team)))
}

/// Delete a team. Its members stay, without a team.
#[utoipa::path(
    delete,
    path = "/v1/teams/{team_id}",
    tag = "teams",
    summary = "Delete team",
    params(("team_id" = i64, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 404, description = "Team not found"),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all, fields(team_id = %team_id))]
pub async fn delete_team(State(state): State<AppState>, Path(team_id): Path<TeamId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Teams::new(&mut conn).delete(team_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Team".to_string(),
            id: team_id.to_string(),
        })
    }
}
