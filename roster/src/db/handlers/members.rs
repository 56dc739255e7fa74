//! Database repository for members.
//!
//! Besides the [`Repository`] CRUD surface this is where search predicates meet SQL: every query
//! below aliases `members` as `m` and, when needed, `teams` as `t`, so a [`Predicate`] built from
//! [`Column`]s can be appended directly with [`push_where`].

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::members::{
        MemberAgeStats, MemberCreateDBRequest, MemberDBResponse, MemberDto, MemberTeamDBResponse, MemberUpdateDBRequest,
        TeamAgeAverage, UserDto,
    },
};
use crate::search::{
    MemberSearchCondition, compose, compose_with_builder,
    predicate::{Column, Entity, Operand, Predicate, push_where},
};
use crate::types::{MemberId, NullsOrder, SortDirection, TeamId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

const MEMBER_TEAM_SELECT: &str = "SELECT m.member_id, m.name AS username, m.age, t.team_id, t.name AS team_name \
     FROM members m LEFT JOIN teams t ON m.team_id = t.team_id";

const MEMBER_TEAM_COUNT: &str = "SELECT COUNT(*) FROM members m LEFT JOIN teams t ON m.team_id = t.team_id";

/// Filter for listing members
#[derive(Debug, Clone)]
pub struct MemberFilter {
    pub skip: i64,
    pub limit: i64,
}

impl MemberFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

/// How `teams` is joined onto `members`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Only members with a team
    Inner,
    /// Every member, team columns NULL when there is no team
    Left,
}

impl JoinKind {
    fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => " INNER JOIN teams t ON m.team_id = t.team_id",
            JoinKind::Left => " LEFT JOIN teams t ON m.team_id = t.team_id",
        }
    }
}

/// One ORDER BY term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub direction: SortDirection,
    pub nulls: NullsOrder,
}

/// Query over member entities.
///
/// The join onto `teams` is added only when asked for, or when the filter or ordering reads a team
/// column (in which case it is a left join).
#[derive(Debug, Clone, Default)]
pub struct MemberQuery {
    pub filter: Option<Predicate>,
    pub join: Option<JoinKind>,
    pub order_by: Vec<OrderBy>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl MemberQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Replace the filter; `None` matches every member
    pub fn filter_opt(mut self, predicate: Option<Predicate>) -> Self {
        self.filter = predicate;
        self
    }

    pub fn inner_join_team(mut self) -> Self {
        self.join = Some(JoinKind::Inner);
        self
    }

    pub fn left_join_team(mut self) -> Self {
        self.join = Some(JoinKind::Left);
        self
    }

    pub fn order_by(self, column: Column, direction: SortDirection) -> Self {
        self.order_by_nulls(column, direction, NullsOrder::Default)
    }

    pub fn order_by_nulls(mut self, column: Column, direction: SortDirection, nulls: NullsOrder) -> Self {
        self.order_by.push(OrderBy { column, direction, nulls });
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn effective_join(&self) -> Option<JoinKind> {
        if self.join.is_some() {
            return self.join;
        }
        let filter_needs_team = self.filter.as_ref().is_some_and(Predicate::references_team);
        let order_needs_team = self.order_by.iter().any(|o| o.column.entity() == Entity::Team);
        (filter_needs_team || order_needs_team).then_some(JoinKind::Left)
    }
}

/// A `SET` clause entry for [`Members::bulk_update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// `column = value`
    Set { column: Column, value: Operand },
    /// `column = column + amount`
    Add { column: Column, amount: i32 },
    /// `column = NULL`
    SetNull { column: Column },
}

impl Assignment {
    pub fn set(column: Column, value: impl Into<Operand>) -> Self {
        Assignment::Set {
            column,
            value: value.into(),
        }
    }

    pub fn add(column: Column, amount: i32) -> Self {
        Assignment::Add { column, amount }
    }

    pub fn set_null(column: Column) -> Self {
        Assignment::SetNull { column }
    }

    pub fn column(&self) -> Column {
        match self {
            Assignment::Set { column, .. } | Assignment::Add { column, .. } | Assignment::SetNull { column } => *column,
        }
    }

    fn push_to(&self, query: &mut QueryBuilder<'_, Postgres>) {
        let column = self.column();
        query.push(column.name());
        query.push(" = ");
        match self {
            Assignment::Set { value, .. } => value.push_bind_to(query),
            Assignment::Add { amount, .. } => {
                query.push(column.qualified());
                query.push(" + ");
                query.push_bind(*amount);
            }
            Assignment::SetNull { .. } => {
                query.push("NULL");
            }
        }
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Member {
    pub member_id: MemberId,
    pub name: Option<String>,
    pub age: i32,
    pub team_id: Option<TeamId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Member> for MemberDBResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.member_id,
            name: member.name,
            age: member.age,
            team_id: member.team_id,
            created_at: member.created_at,
            updated_at: member.updated_at,
        }
    }
}

pub struct Members<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Members<'c> {
    type CreateRequest = MemberCreateDBRequest;
    type UpdateRequest = MemberUpdateDBRequest;
    type Response = MemberDBResponse;
    type Id = MemberId;
    type Filter = MemberFilter;

    #[instrument(skip(self, request), fields(name = ?request.name, age = request.age), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let member = sqlx::query_as::<_, Member>("INSERT INTO members (name, age, team_id) VALUES ($1, $2, $3) RETURNING *")
            .bind(&request.name)
            .bind(request.age)
            .bind(request.team_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(MemberDBResponse::from(member))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE member_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(member.map(MemberDBResponse::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: &[MemberId]) -> Result<HashMap<MemberId, MemberDBResponse>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let members = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE member_id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(members.into_iter().map(|m| (m.member_id, MemberDBResponse::from(m))).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = MemberQuery::new()
            .order_by(Column::MemberId, SortDirection::Asc)
            .offset(filter.skip)
            .limit(filter.limit);
        self.find(&query).await
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM members WHERE member_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members SET
                name = COALESCE($2, name),
                age = COALESCE($3, age),
                team_id = CASE WHEN $4 THEN $5 ELSE team_id END,
                updated_at = NOW()
            WHERE member_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(request.age)
        .bind(request.team_id.is_some())
        .bind(request.team_id.flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(MemberDBResponse::from(member))
    }
}

impl<'c> Members<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn find_by_name(&mut self, name: &str) -> Result<Vec<MemberDBResponse>> {
        let query = MemberQuery::new()
            .filter(Column::MemberName.eq(name))
            .order_by(Column::MemberId, SortDirection::Asc);
        self.find(&query).await
    }

    /// Run a [`MemberQuery`]. Without an explicit ordering rows come back by member id.
    #[instrument(skip(self, query), fields(filter = ?query.filter.as_ref().map(ToString::to_string)), err)]
    pub async fn find(&mut self, query: &MemberQuery) -> Result<Vec<MemberDBResponse>> {
        let mut sql = QueryBuilder::<Postgres>::new("SELECT m.* FROM members m");

        if let Some(join) = query.effective_join() {
            sql.push(join.as_sql());
        }

        push_where(&mut sql, query.filter.as_ref());

        sql.push(" ORDER BY ");
        if query.order_by.is_empty() {
            sql.push("m.member_id");
        } else {
            let mut terms = sql.separated(", ");
            for term in &query.order_by {
                terms.push(format!("{} {}{}", term.column.qualified(), term.direction, term.nulls));
            }
        }

        if let Some(limit) = query.limit {
            sql.push(" LIMIT ");
            sql.push_bind(limit);
        }
        if let Some(offset) = query.offset {
            sql.push(" OFFSET ");
            sql.push_bind(offset);
        }

        tracing::debug!("Executing SQL: {}", sql.sql());

        let members = sql.build_query_as::<Member>().fetch_all(&mut *self.db).await?;

        Ok(members.into_iter().map(MemberDBResponse::from).collect())
    }

    /// Number of members matching `filter`, all members when `None`
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: Option<&Predicate>) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM members m");
        if filter.is_some_and(Predicate::references_team) {
            query.push(JoinKind::Left.as_sql());
        }
        push_where(&mut query, filter);

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;
        Ok(count)
    }

    /// Members joined with their team, filtered by `condition`
    #[instrument(skip(self), err)]
    pub async fn search(&mut self, condition: &MemberSearchCondition) -> Result<Vec<MemberTeamDBResponse>> {
        let predicate = compose(condition);
        self.search_rows(predicate.as_ref(), None).await
    }

    /// Same rows as [`Members::search`], with the predicate assembled by the accumulating builder
    #[instrument(skip(self), err)]
    pub async fn search_by_builder(&mut self, condition: &MemberSearchCondition) -> Result<Vec<MemberTeamDBResponse>> {
        let predicate = compose_with_builder(condition);
        self.search_rows(predicate.as_ref(), None).await
    }

    /// One page of search rows together with the total number of matching rows
    #[instrument(skip(self), err)]
    pub async fn search_page(
        &mut self,
        condition: &MemberSearchCondition,
        skip: i64,
        limit: i64,
    ) -> Result<(Vec<MemberTeamDBResponse>, i64)> {
        let predicate = compose(condition);
        let rows = self.search_rows(predicate.as_ref(), Some((skip, limit))).await?;

        let mut count = QueryBuilder::<Postgres>::new(MEMBER_TEAM_COUNT);
        push_where(&mut count, predicate.as_ref());
        let total: i64 = count.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok((rows, total))
    }

    async fn search_rows(&mut self, predicate: Option<&Predicate>, page: Option<(i64, i64)>) -> Result<Vec<MemberTeamDBResponse>> {
        match predicate {
            Some(p) => tracing::debug!("Searching members where {}", p),
            None => tracing::debug!("Searching members without a filter"),
        }

        let mut query = QueryBuilder::<Postgres>::new(MEMBER_TEAM_SELECT);
        push_where(&mut query, predicate);
        query.push(" ORDER BY m.member_id");
        if let Some((skip, limit)) = page {
            query.push(" LIMIT ");
            query.push_bind(limit);
            query.push(" OFFSET ");
            query.push_bind(skip);
        }

        tracing::debug!("Executing SQL: {}", query.sql());

        let rows = query.build_query_as::<MemberTeamDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(rows)
    }

    /// Name and age of the members matching `filter`
    #[instrument(skip(self, filter), err)]
    pub async fn member_dtos(&mut self, filter: Option<&Predicate>) -> Result<Vec<MemberDto>> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT m.name, m.age FROM members m");
        if filter.is_some_and(Predicate::references_team) {
            query.push(JoinKind::Left.as_sql());
        }
        push_where(&mut query, filter);
        query.push(" ORDER BY m.member_id");

        let dtos = query.build_query_as::<MemberDto>().fetch_all(&mut *self.db).await?;
        Ok(dtos)
    }

    /// Every member's name, each paired with the maximum age over all members
    #[instrument(skip(self), err)]
    pub async fn user_dtos_with_max_age(&mut self) -> Result<Vec<UserDto>> {
        let dtos = sqlx::query_as::<_, UserDto>(
            r#"
            SELECT m.name AS user_name, (SELECT MAX(ms.age) FROM members ms) AS age
            FROM members m
            ORDER BY m.member_id
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(dtos)
    }

    /// Distinct member names, NULL last
    #[instrument(skip(self), err)]
    pub async fn distinct_names(&mut self) -> Result<Vec<Option<String>>> {
        let names: Vec<Option<String>> = sqlx::query_scalar("SELECT DISTINCT m.name FROM members m ORDER BY m.name NULLS LAST")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(names)
    }

    #[instrument(skip(self), err)]
    pub async fn age_stats(&mut self) -> Result<MemberAgeStats> {
        let stats = sqlx::query_as::<_, MemberAgeStats>(
            r#"
            SELECT
                COUNT(*) AS count,
                SUM(m.age) AS sum,
                AVG(m.age)::float8 AS avg,
                MAX(m.age) AS max,
                MIN(m.age) AS min
            FROM members m
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(stats)
    }

    /// Average member age per team, keeping teams whose average lies within `low..=high`.
    /// Members without a team are not counted.
    #[instrument(skip(self), err)]
    pub async fn team_age_averages(&mut self, low: f64, high: f64) -> Result<Vec<TeamAgeAverage>> {
        let averages = sqlx::query_as::<_, TeamAgeAverage>(
            r#"
            SELECT t.name AS team_name, AVG(m.age)::float8 AS average_age
            FROM members m
            INNER JOIN teams t ON m.team_id = t.team_id
            GROUP BY t.name
            HAVING AVG(m.age)::float8 BETWEEN $1 AND $2
            ORDER BY t.name
            "#,
        )
        .bind(low)
        .bind(high)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(averages)
    }

    /// Apply `assignments` to every member matching `filter` (every member when `None`) in a single
    /// statement, returning the number of rows changed.
    ///
    /// Both the assignments and the filter may only reference member columns, and the member id
    /// cannot be assigned.
    #[instrument(skip(self, assignments, filter), fields(filter = ?filter.map(ToString::to_string)), err)]
    pub async fn bulk_update(&mut self, assignments: &[Assignment], filter: Option<&Predicate>) -> Result<u64> {
        if assignments.is_empty() {
            return Err(DbError::UnsupportedPredicate {
                reason: "bulk update needs at least one assignment".to_string(),
            });
        }
        if let Some(assignment) = assignments
            .iter()
            .find(|a| a.column().entity() != Entity::Member || a.column() == Column::MemberId)
        {
            return Err(DbError::UnsupportedPredicate {
                reason: format!("cannot assign {}", assignment.column().qualified()),
            });
        }
        ensure_member_only(filter, "bulk update")?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE members AS m SET ");
        for assignment in assignments {
            assignment.push_to(&mut query);
            query.push(", ");
        }
        query.push("updated_at = NOW()");
        push_where(&mut query, filter);

        tracing::debug!("Executing SQL: {}", query.sql());

        let result = query.build().execute(&mut *self.db).await?;
        tracing::info!("Bulk updated {} members", result.rows_affected());

        Ok(result.rows_affected())
    }

    /// Delete every member matching `filter` (every member when `None`), returning the number of
    /// rows removed
    #[instrument(skip(self, filter), fields(filter = ?filter.map(ToString::to_string)), err)]
    pub async fn bulk_delete(&mut self, filter: Option<&Predicate>) -> Result<u64> {
        ensure_member_only(filter, "bulk delete")?;

        let mut query = QueryBuilder::<Postgres>::new("DELETE FROM members AS m");
        push_where(&mut query, filter);

        let result = query.build().execute(&mut *self.db).await?;
        tracing::info!("Bulk deleted {} members", result.rows_affected());

        Ok(result.rows_affected())
    }
}

fn ensure_member_only(filter: Option<&Predicate>, statement: &str) -> Result<()> {
    match filter {
        Some(predicate) if predicate.references_team() => Err(DbError::UnsupportedPredicate {
            reason: format!("{statement} cannot filter on team columns: {predicate}"),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::all_eq;
    use crate::test_utils::{create_test_member, create_test_team, seed_fixtures};
    use sqlx::{Acquire, PgPool};

    fn usernames(rows: &[MemberTeamDBResponse]) -> Vec<&str> {
        rows.iter().filter_map(|r| r.username.as_deref()).collect()
    }

    fn names(members: &[MemberDBResponse]) -> Vec<Option<&str>> {
        members.iter().map(|m| m.name.as_deref()).collect()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_get_update_delete(pool: PgPool) {
        let team = create_test_team(&pool, "teamA").await;

        let mut tx = pool.begin().await.unwrap();
        {
            let mut repo = Members::new(tx.acquire().await.unwrap());

            let created = repo
                .create(&MemberCreateDBRequest::new("member1", 10, Some(team.id)))
                .await
                .unwrap();
            assert_eq!(created.name.as_deref(), Some("member1"));
            assert_eq!(created.team_id, Some(team.id));

            let fetched = repo.get_by_id(created.id).await.unwrap().expect("member should exist");
            assert_eq!(fetched, created);

            let updated = repo
                .update(
                    created.id,
                    &MemberUpdateDBRequest {
                        age: Some(11),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.age, 11);
            assert_eq!(updated.name.as_deref(), Some("member1"));
            assert_eq!(updated.team_id, Some(team.id));

            let detached = repo
                .update(
                    created.id,
                    &MemberUpdateDBRequest {
                        team_id: Some(None),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(detached.team_id, None);
            assert_eq!(detached.age, 11);

            let rejoined = repo
                .update(
                    created.id,
                    &MemberUpdateDBRequest {
                        team_id: Some(Some(team.id)),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(rejoined.team_id, Some(team.id));

            assert!(matches!(
                repo.update(created.id + 1000, &MemberUpdateDBRequest::default()).await,
                Err(DbError::NotFound)
            ));

            assert!(repo.delete(created.id).await.unwrap());
            assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        }
        tx.commit().await.unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_unknown_team_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let err = repo
            .create(&MemberCreateDBRequest::new("member1", 10, Some(4242)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "got {err:?}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_team_detaches_members(pool: PgPool) {
        let fixtures = seed_fixtures(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        sqlx::query("DELETE FROM teams WHERE team_id = $1")
            .bind(fixtures.team_a.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let mut repo = Members::new(&mut conn);
        let member1 = repo.get_by_id(fixtures.members[0].id).await.unwrap().unwrap();
        assert_eq!(member1.team_id, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_bulk_and_list(pool: PgPool) {
        let fixtures = seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let ids: Vec<_> = fixtures.members.iter().map(|m| m.id).collect();
        let bulk = repo.get_bulk(&ids).await.unwrap();
        assert_eq!(bulk.len(), 4);
        assert_eq!(bulk[&ids[2]].name.as_deref(), Some("member3"));

        let page = repo.list(&MemberFilter::new(1, 2)).await.unwrap();
        assert_eq!(names(&page), vec![Some("member2"), Some("member3")]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_by_name(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let found = repo.find_by_name("member1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].age, 10);

        assert!(repo.find_by_name("nobody").await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_without_criteria_returns_every_member(pool: PgPool) {
        let fixtures = seed_fixtures(&pool).await;
        create_test_member(&pool, Some("loner"), 50, None).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let rows = repo.search(&MemberSearchCondition::default()).await.unwrap();
        assert_eq!(usernames(&rows), vec!["member1", "member2", "member3", "member4", "loner"]);

        assert_eq!(rows[0].team_id, Some(fixtures.team_a.id));
        assert_eq!(rows[0].team_name.as_deref(), Some("teamA"));
        assert_eq!(rows[3].team_name.as_deref(), Some("teamB"));

        // Left join keeps the member without a team
        assert_eq!(rows[4].team_id, None);
        assert_eq!(rows[4].team_name, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_by_team_and_age_range(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let condition = MemberSearchCondition::default()
            .with_member_name("")
            .with_team_name("teamB")
            .with_age_goe(35)
            .with_age_loe(40);
        let rows = repo.search(&condition).await.unwrap();
        assert_eq!(usernames(&rows), vec!["member4"]);

        let by_name = repo
            .search(&MemberSearchCondition::default().with_member_name("member1"))
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].age, 10);

        let reversed = repo
            .search(&MemberSearchCondition::default().with_age_goe(40).with_age_loe(10))
            .await
            .unwrap();
        assert!(reversed.is_empty());

        let equal = repo
            .search(&MemberSearchCondition::default().with_age_goe(20).with_age_loe(20))
            .await
            .unwrap();
        assert_eq!(usernames(&equal), vec!["member2"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_team_filter_excludes_members_without_team(pool: PgPool) {
        seed_fixtures(&pool).await;
        create_test_member(&pool, Some("loner"), 15, None).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let rows = repo
            .search(&MemberSearchCondition::default().with_team_name("teamA"))
            .await
            .unwrap();
        assert_eq!(usernames(&rows), vec!["member1", "member2"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_strategies_agree(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let conditions = [
            MemberSearchCondition::default(),
            MemberSearchCondition::default().with_member_name("member2"),
            MemberSearchCondition::default().with_team_name("teamA").with_age_goe(15),
            MemberSearchCondition::default().with_team_name(" ").with_age_loe(30),
        ];
        for condition in conditions {
            let composed = repo.search(&condition).await.unwrap();
            let built = repo.search_by_builder(&condition).await.unwrap();
            assert_eq!(composed, built, "condition {condition:?}");
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_page(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let (rows, total) = repo.search_page(&MemberSearchCondition::default(), 1, 2).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(usernames(&rows), vec!["member2", "member3"]);

        let (rows, total) = repo
            .search_page(&MemberSearchCondition::default().with_team_name("teamB"), 0, 10)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(usernames(&rows), vec!["member3", "member4"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_sorts_with_nulls_last(pool: PgPool) {
        create_test_member(&pool, None, 100, None).await;
        create_test_member(&pool, Some("member5"), 100, None).await;
        create_test_member(&pool, Some("member6"), 100, None).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let query = MemberQuery::new()
            .filter(Column::MemberAge.eq(100))
            .order_by(Column::MemberAge, SortDirection::Desc)
            .order_by_nulls(Column::MemberName, SortDirection::Asc, NullsOrder::Last);
        let members = repo.find(&query).await.unwrap();
        assert_eq!(names(&members), vec![Some("member5"), Some("member6"), None]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_paging(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let query = MemberQuery::new()
            .order_by(Column::MemberName, SortDirection::Desc)
            .offset(1)
            .limit(2);
        let members = repo.find(&query).await.unwrap();
        assert_eq!(names(&members), vec![Some("member3"), Some("member2")]);
        assert_eq!(repo.count(None).await.unwrap(), 4);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_joins(pool: PgPool) {
        seed_fixtures(&pool).await;
        create_test_member(&pool, Some("loner"), 25, None).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let in_team_a = repo
            .find(&MemberQuery::new().filter(Column::TeamName.eq("teamA")))
            .await
            .unwrap();
        assert_eq!(names(&in_team_a), vec![Some("member1"), Some("member2")]);

        let with_team = repo.find(&MemberQuery::new().inner_join_team()).await.unwrap();
        assert_eq!(with_team.len(), 4);

        let everyone = repo.find(&MemberQuery::new().left_join_team()).await.unwrap();
        assert_eq!(everyone.len(), 5);

        let by_team_name = repo
            .find(&MemberQuery::new().order_by_nulls(Column::TeamName, SortDirection::Desc, NullsOrder::Last))
            .await
            .unwrap();
        assert_eq!(by_team_name.last().and_then(|m| m.name.as_deref()), Some("loner"));

        assert_eq!(repo.count(Some(&Column::TeamName.eq("teamB"))).await.unwrap(), 2);
        assert_eq!(repo.count(Some(&Column::MemberTeamId.is_null())).await.unwrap(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_with_all_eq(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let found = repo
            .find(&MemberQuery::new().filter_opt(all_eq(Some("member1"), Some(10))))
            .await
            .unwrap();
        assert_eq!(names(&found), vec![Some("member1")]);

        let everyone = repo.find(&MemberQuery::new().filter_opt(all_eq(None, None))).await.unwrap();
        assert_eq!(everyone.len(), 4);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_projections(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let dtos = repo.member_dtos(None).await.unwrap();
        assert_eq!(dtos.len(), 4);
        assert_eq!(
            dtos[0],
            MemberDto {
                name: Some("member1".to_string()),
                age: 10
            }
        );

        let team_b = repo.member_dtos(Some(&Column::TeamName.eq("teamB"))).await.unwrap();
        assert_eq!(team_b.iter().map(|d| d.age).collect::<Vec<_>>(), vec![30, 40]);

        let users = repo.user_dtos_with_max_age().await.unwrap();
        assert_eq!(users.len(), 4);
        assert!(users.iter().all(|u| u.age == 40));
        assert_eq!(users[1].user_name.as_deref(), Some("member2"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_distinct_names(pool: PgPool) {
        seed_fixtures(&pool).await;
        create_test_member(&pool, Some("member1"), 11, None).await;
        create_test_member(&pool, None, 12, None).await;

        let mut conn = pool.acquire().await.unwrap();
        let names = Members::new(&mut conn).distinct_names().await.unwrap();
        assert_eq!(
            names,
            vec![
                Some("member1".to_string()),
                Some("member2".to_string()),
                Some("member3".to_string()),
                Some("member4".to_string()),
                None
            ]
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_aggregates(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let empty = Members::new(&mut conn).age_stats().await.unwrap();
        assert_eq!(
            empty,
            MemberAgeStats {
                count: 0,
                sum: None,
                avg: None,
                max: None,
                min: None
            }
        );
        drop(conn);

        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let stats = Members::new(&mut conn).age_stats().await.unwrap();
        assert_eq!(
            stats,
            MemberAgeStats {
                count: 4,
                sum: Some(100),
                avg: Some(25.0),
                max: Some(40),
                min: Some(10)
            }
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_team_age_averages(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let averages = repo.team_age_averages(0.0, 100.0).await.unwrap();
        assert_eq!(
            averages,
            vec![
                TeamAgeAverage {
                    team_name: "teamA".to_string(),
                    average_age: 15.0
                },
                TeamAgeAverage {
                    team_name: "teamB".to_string(),
                    average_age: 35.0
                },
            ]
        );

        let filtered = repo.team_age_averages(10.0, 20.0).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].team_name, "teamA");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bulk_update_sets_value(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let changed = repo
            .bulk_update(
                &[Assignment::set(Column::MemberName, "non-member")],
                Some(&Column::MemberAge.lt(21)),
            )
            .await
            .unwrap();
        assert_eq!(changed, 2);

        let renamed = repo.find_by_name("non-member").await.unwrap();
        assert_eq!(renamed.iter().map(|m| m.age).collect::<Vec<_>>(), vec![10, 20]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bulk_update_adds_to_every_row(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let changed = repo.bulk_update(&[Assignment::add(Column::MemberAge, 1)], None).await.unwrap();
        assert_eq!(changed, 4);

        let member1 = repo.find_by_name("member1").await.unwrap();
        assert_eq!(member1[0].age, 11);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bulk_update_can_clear_team(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let changed = repo
            .bulk_update(&[Assignment::set_null(Column::MemberTeamId)], Some(&Column::MemberAge.goe(30)))
            .await
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(repo.count(Some(&Column::MemberTeamId.is_null())).await.unwrap(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bulk_statements_reject_team_columns(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let team_filter = Column::TeamName.eq("teamA");
        assert!(matches!(
            repo.bulk_update(&[Assignment::add(Column::MemberAge, 1)], Some(&team_filter)).await,
            Err(DbError::UnsupportedPredicate { .. })
        ));
        assert!(matches!(
            repo.bulk_update(&[Assignment::set(Column::TeamName, "x")], None).await,
            Err(DbError::UnsupportedPredicate { .. })
        ));
        assert!(matches!(
            repo.bulk_update(&[Assignment::set(Column::MemberId, 1_i64)], None).await,
            Err(DbError::UnsupportedPredicate { .. })
        ));
        assert!(matches!(repo.bulk_update(&[], None).await, Err(DbError::UnsupportedPredicate { .. })));
        assert!(matches!(
            repo.bulk_delete(Some(&team_filter)).await,
            Err(DbError::UnsupportedPredicate { .. })
        ));

        // Nothing was touched
        assert_eq!(repo.age_stats().await.unwrap().sum, Some(100));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bulk_delete(pool: PgPool) {
        seed_fixtures(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Members::new(&mut conn);

        let deleted = repo.bulk_delete(Some(&Column::MemberAge.gt(18))).await.unwrap();
        assert_eq!(deleted, 3);

        let remaining = repo.find(&MemberQuery::new()).await.unwrap();
        assert_eq!(names(&remaining), vec![Some("member1")]);
    }

    #[test]
    fn test_assignment_rendering() {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE members AS m SET ");
        Assignment::add(Column::MemberAge, 1).push_to(&mut query);
        query.push(", ");
        Assignment::set(Column::MemberName, "x").push_to(&mut query);
        query.push(", ");
        Assignment::set_null(Column::MemberTeamId).push_to(&mut query);
        assert_eq!(
            query.sql(),
            "UPDATE members AS m SET age = m.age + $1, name = $2, team_id = NULL"
        );
    }

    #[test]
    fn test_join_inferred_from_team_columns() {
        assert_eq!(MemberQuery::new().effective_join(), None);
        assert_eq!(
            MemberQuery::new().filter(Column::MemberAge.gt(1)).effective_join(),
            None
        );
        assert_eq!(
            MemberQuery::new().filter(Column::TeamName.eq("a")).effective_join(),
            Some(JoinKind::Left)
        );
        assert_eq!(
            MemberQuery::new()
                .order_by(Column::TeamName, SortDirection::Asc)
                .effective_join(),
            Some(JoinKind::Left)
        );
        assert_eq!(
            MemberQuery::new()
                .filter(Column::TeamName.eq("a"))
                .inner_join_team()
                .effective_join(),
            Some(JoinKind::Inner)
        );
    }
}
