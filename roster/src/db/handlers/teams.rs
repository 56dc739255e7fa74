//! Database repository for teams.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::teams::{TeamCreateDBRequest, TeamDBResponse, TeamUpdateDBRequest},
};
use crate::types::TeamId;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

/// Filter for listing teams
#[derive(Debug, Clone)]
pub struct TeamFilter {
    pub skip: i64,
    pub limit: i64,
}

impl TeamFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Team {
    pub team_id: TeamId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Team> for TeamDBResponse {
    fn from(team: Team) -> Self {
        Self {
            id: team.team_id,
            name: team.name,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

pub struct Teams<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Teams<'c> {
    type CreateRequest = TeamCreateDBRequest;
    type UpdateRequest = TeamUpdateDBRequest;
    type Response = TeamDBResponse;
    type Id = TeamId;
    type Filter = TeamFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let team = sqlx::query_as::<_, Team>("INSERT INTO teams (name) VALUES ($1) RETURNING *")
            .bind(&request.name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(TeamDBResponse::from(team))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE team_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(team.map(TeamDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: &[TeamId]) -> Result<HashMap<TeamId, TeamDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let teams = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE team_id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(teams.into_iter().map(|t| (t.team_id, TeamDBResponse::from(t))).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM teams ORDER BY name LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        tracing::debug!("Executing SQL: {}", query.sql());

        let teams = query.build_query_as::<Team>().fetch_all(&mut *self.db).await?;

        Ok(teams.into_iter().map(TeamDBResponse::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM teams WHERE team_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams SET
                name = COALESCE($2, name),
                updated_at = NOW()
            WHERE team_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(TeamDBResponse::from(team))
    }
}

impl<'c> Teams<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<TeamDBResponse>> {
        let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(team.map(TeamDBResponse::from))
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams").fetch_one(&mut *self.db).await?;
        Ok(count)
    }
}
