//! OpenAPI document for the HTTP API, served at `/openapi.json`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(title = "roster", description = "Team and member directory with dynamic member search"),
    paths(
        api::handlers::members::search_members,
        api::handlers::members::search_members_page,
        api::handlers::members::create_member,
        api::handlers::members::get_member,
        api::handlers::members::update_member,
        api::handlers::members::delete_member,
        api::handlers::teams::list_teams,
        api::handlers::teams::create_team,
        api::handlers::teams::get_team,
        api::handlers::teams::update_team,
        api::handlers::teams::delete_team,
    ),
    components(
        schemas(
            api::models::members::MemberTeamDto,
            api::models::members::MemberCreate,
            api::models::members::MemberUpdate,
            api::models::members::MemberResponse,
            api::models::teams::TeamCreate,
            api::models::teams::TeamUpdate,
            api::models::teams::TeamResponse,
            api::models::pagination::PaginatedResponse<api::models::members::MemberTeamDto>,
            api::models::pagination::PaginatedResponse<api::models::teams::TeamResponse>,
            crate::search::MemberSearchCondition,
        )
    ),
    tags(
        (name = "members", description = "Member search and management"),
        (name = "teams", description = "Team management"),
    )
)]
pub struct ApiDoc;
