use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/conversations", conversation_routes())
        .nest("/queries", query_routes())
        .nest("/responses", rating_routes())
        .nest("/admin", admin_routes())
        .routes(routes!(handlers::settings::get_settings))
        .routes(routes!(handlers::settings::list_models))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn conversation_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::conversation::list_conversations,
            handlers::conversation::create_conversation
        ))
        .routes(routes!(
            handlers::conversation::get_conversation,
            handlers::conversation::update_conversation,
            handlers::conversation::delete_conversation
        ))
        .routes(routes!(handlers::query::submit_query))
}

fn query_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::query::get_query_responses))
}

fn rating_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::rating::select_rank))
        .routes(routes!(
            handlers::rating::set_rating,
            handlers::rating::clear_rating
        ))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::list_ratings))
        .routes(routes!(handlers::admin::analytics))
        .routes(routes!(handlers::admin::export_csv))
        .routes(routes!(handlers::admin::get_system_prompt))
        .routes(routes!(handlers::admin::list_users))
        .routes(routes!(handlers::admin::update_user_role))
}
