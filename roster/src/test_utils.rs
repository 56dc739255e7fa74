//! Test utilities shared by the repository and handler tests.

use crate::{
    config::{Config, DatabaseConfig, PoolSettings},
    db::{
        handlers::{Members, Repository, Teams},
        models::{
            members::{MemberCreateDBRequest, MemberDBResponse},
            teams::{TeamCreateDBRequest, TeamDBResponse},
        },
    },
    types::TeamId,
};
use axum_test::TestServer;
use sqlx::PgPool;

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            // The pool is handed in directly, so this is never dialed
            url: "postgres://unused".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 1,
                ..Default::default()
            },
        },
        ..Default::default()
    }
}

pub async fn create_test_team(pool: &PgPool, name: &str) -> TeamDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Teams::new(&mut conn)
        .create(&TeamCreateDBRequest { name: name.to_string() })
        .await
        .expect("Failed to create test team")
}

pub async fn create_test_member(pool: &PgPool, name: Option<&str>, age: i32, team_id: Option<TeamId>) -> MemberDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let request = MemberCreateDBRequest {
        name: name.map(str::to_string),
        age,
        team_id,
    };
    Members::new(&mut conn).create(&request).await.expect("Failed to create test member")
}

/// The standard search fixture set.
pub struct Fixtures {
    pub team_a: TeamDBResponse,
    pub team_b: TeamDBResponse,
    /// member1..member4, in creation order
    pub members: Vec<MemberDBResponse>,
}

/// `teamA` holds member1 (10) and member2 (20); `teamB` holds member3 (30) and member4 (40).
pub async fn seed_fixtures(pool: &PgPool) -> Fixtures {
    let team_a = create_test_team(pool, "teamA").await;
    let team_b = create_test_team(pool, "teamB").await;

    let mut members = Vec::with_capacity(4);
    for (name, age, team) in [
        ("member1", 10, &team_a),
        ("member2", 20, &team_a),
        ("member3", 30, &team_b),
        ("member4", 40, &team_b),
    ] {
        members.push(create_test_member(pool, Some(name), age, Some(team.id)).await);
    }

    Fixtures { team_a, team_b, members }
}
