mod v1;

use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/v1", v1::routes())
        .merge(privileged_routes())
}

/// Same-origin write endpoints used by the admin panel.
fn privileged_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::settings::toggle_model))
        .routes(routes!(handlers::settings::update_app_setting))
        .routes(routes!(handlers::settings::update_system_prompt))
}
