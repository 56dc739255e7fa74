//! # roster: team and member directory with dynamic search
//!
//! `roster` stores teams and their members in PostgreSQL and serves them over a small HTTP API.
//! Its centerpiece is member search: callers pass any subset of member name, team name and an age
//! range, and only the criteria that are actually present end up in the SQL `WHERE` clause.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! [sqlx](https://github.com/launchbadge/sqlx) for persistence.
//!
//! The **search layer** ([`search`]) is pure. [`search::MemberSearchCondition`] holds the optional
//! criteria, and [`search::compose`] turns it into an optional [`search::Predicate`]: `None` when
//! nothing was supplied, otherwise the conjunction of exactly the supplied criteria. Predicates know
//! how to append themselves to a `sqlx::QueryBuilder` with bound parameters.
//!
//! The **database layer** ([`db`]) follows the repository pattern. [`db::handlers::Members`] and
//! [`db::handlers::Teams`] borrow a `PgConnection` and own all SQL for their tables, including
//! joined projections, aggregates and predicate-driven bulk updates and deletes.
//!
//! The **API layer** ([`api`]) exposes `/v1/members` (plain search), `/v2/members` (paginated
//! search) and CRUD routes for members and teams. The OpenAPI document is served at
//! `/openapi.json`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use roster::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = roster::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     roster::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! Migrations run automatically on startup. To run them by hand:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! roster::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod search;
pub mod telemetry;
#[cfg(test)]
mod test_utils;
pub mod types;

use crate::{
    api::handlers::{members, teams},
    config::CorsOrigin,
    db::{
        handlers::{Members, Repository, Teams},
        models::{members::MemberCreateDBRequest, teams::TeamCreateDBRequest},
    },
    openapi::ApiDoc,
};
use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::get,
};
use bon::Builder;
pub use config::Config;
use sqlx::{
    ConnectOptions, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::{str::FromStr, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;

pub use types::{MemberId, TeamId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the roster database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

const SAMPLE_MEMBER_COUNT: i32 = 100;

/// Seed two teams and a hundred members for local experimentation.
///
/// Members are named `member0` through `member99`, aged by their index and alternate between
/// `teamA` and `teamB`. Nothing happens if any team already exists, so repeated startups are safe.
#[instrument(skip_all, err)]
pub async fn seed_sample_data(pool: &PgPool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    {
        let mut teams = Teams::new(&mut tx);
        if teams.count().await? > 0 {
            info!("Teams already present, skipping sample data");
            return Ok(());
        }
    }

    let team_a = Teams::new(&mut tx).create(&TeamCreateDBRequest { name: "teamA".to_string() }).await?;
    let team_b = Teams::new(&mut tx).create(&TeamCreateDBRequest { name: "teamB".to_string() }).await?;

    let mut members = Members::new(&mut tx);
    for i in 0..SAMPLE_MEMBER_COUNT {
        let team = if i % 2 == 0 { &team_a } else { &team_b };
        members
            .create(&MemberCreateDBRequest::new(format!("member{i}"), i, Some(team.id)))
            .await?;
    }

    tx.commit().await?;
    info!("Seeded sample data: 2 teams, {} members", SAMPLE_MEMBER_COUNT);
    Ok(())
}

/// Connect to PostgreSQL using the configured pool settings and run migrations.
///
/// Statements slower than `slow_statement_threshold_ms` are logged at WARN through sqlx's `log`
/// integration.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool_settings = &config.database.pool;
    let connect_options = PgConnectOptions::from_str(&config.database.url)?.log_slow_statements(
        log::LevelFilter::Warn,
        Duration::from_millis(config.slow_statement_threshold_ms),
    );

    let pool = PgPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .min_connections(pool_settings.min_connections)
        .acquire_timeout(pool_settings.acquire_timeout())
        .idle_timeout(pool_settings.idle_timeout())
        .max_lifetime(pool_settings.max_lifetime())
        .connect_with(connect_options)
        .await?;

    migrator().run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // `AllowOrigin::list` rejects "*", so a wildcard entry switches to `Any`
    let allow_origin = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the router with every API route, the OpenAPI document, CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/v1/members", get(members::search_members).post(members::create_member))
        .route(
            "/v1/members/{member_id}",
            get(members::get_member).patch(members::update_member).delete(members::delete_member),
        )
        .route("/v2/members", get(members::search_members_page))
        .route("/v1/teams", get(teams::list_teams).post(teams::create_team))
        .route(
            "/v1/teams/{team_id}",
            get(teams::get_team).patch(teams::update_team).delete(teams::delete_team),
        )
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled service: pool, state and router.
///
/// 1. **Create**: [`Application::new`] connects, migrates and optionally seeds sample data
/// 2. **Serve**: [`Application::serve`] binds the configured address and handles requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and the pool closes
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], but reuse an existing pool instead of connecting.
    ///
    /// Migrations are still applied to the supplied pool.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting roster with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => {
                migrator().run(&pool).await?;
                pool
            }
            None => setup_database(&config).await?,
        };

        if config.seed_sample_data {
            seed_sample_data(&pool).await?;
        }

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Roster listening on http://{}, available at http://localhost:{}", bind_addr, self.config.port);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::seed_sample_data;
    use crate::{
        db::handlers::{Members, Teams},
        search::{MemberSearchCondition, predicate::Column},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_seed_sample_data_runs_once(pool: PgPool) {
        seed_sample_data(&pool).await.unwrap();
        seed_sample_data(&pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(Teams::new(&mut conn).count().await.unwrap(), 2);
        assert_eq!(Members::new(&mut conn).count(None).await.unwrap(), 100);

        let condition = MemberSearchCondition::default().with_team_name("teamA").with_age_loe(9);
        let rows = Members::new(&mut conn).search(&condition).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.username.as_deref().unwrap_or_default()).collect();
        assert_eq!(names, vec!["member0", "member2", "member4", "member6", "member8"]);

        let odd = Members::new(&mut conn).count(Some(&Column::TeamName.eq("teamB"))).await.unwrap();
        assert_eq!(odd, 50);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_seed_skipped_when_teams_exist(pool: PgPool) {
        create_test_team(&pool, "existing").await;
        seed_sample_data(&pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(Teams::new(&mut conn).count().await.unwrap(), 1);
        assert_eq!(Members::new(&mut conn).count(None).await.unwrap(), 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_openapi_document_is_served(pool: PgPool) {
        let app = create_test_app(pool).await;

        let response = app.get("/openapi.json").await;
        response.assert_status_ok();
        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/v1/members"].is_object());
        assert!(doc["paths"]["/v2/members"].is_object());
        assert!(doc["paths"]["/v1/teams/{team_id}"].is_object());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_route_is_not_found(pool: PgPool) {
        let app = create_test_app(pool).await;

        app.get("/v1/nothing-here")
            .expect_failure()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
