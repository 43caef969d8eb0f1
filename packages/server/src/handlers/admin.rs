use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::analytics::{engagement, head_to_head, model_rankings};
use common::csv::export_ratings;
use common::role::{PERM_ANALYTICS_VIEW, PERM_SETTINGS_MANAGE, PERM_USER_MANAGE};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::profile;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::admin::*;
use crate::models::settings::SystemPromptResponse;
use crate::state::AppState;
use crate::utils::ratings::load_rating_records;
use crate::utils::settings::active_system_prompt;

#[utoipa::path(
    get,
    path = "/ratings",
    tag = "Admin",
    operation_id = "listRatings",
    summary = "List rating rows with their question, response and rater",
    description = "Rows are newest first. Omit `page` and `per_page` to load every matching row.",
    params(RatingListQuery),
    responses(
        (status = 200, description = "Rating rows", body = RatingListResponse),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing analytics:view (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_ratings(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RatingListQuery>,
) -> Result<Json<RatingListResponse>, AppError> {
    auth_user.require_permission(PERM_ANALYTICS_VIEW)?;
    validate_rating_list_query(&query)?;

    let (data, pagination) = load_rating_records(&state.db, &query).await?;
    Ok(Json(RatingListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/analytics",
    tag = "Admin",
    operation_id = "getAnalytics",
    summary = "Aggregate model rankings, head-to-head and engagement",
    description = "Aggregates are computed over the loaded rows only. With pagination they describe that page, not the whole dataset.",
    params(RatingListQuery),
    responses(
        (status = 200, description = "Aggregates", body = AnalyticsResponse),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing analytics:view (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn analytics(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RatingListQuery>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    auth_user.require_permission(PERM_ANALYTICS_VIEW)?;
    validate_rating_list_query(&query)?;

    let (rows, pagination) = load_rating_records(&state.db, &query).await?;
    Ok(Json(AnalyticsResponse {
        rows_analyzed: rows.len(),
        rankings: model_rankings(&rows),
        head_to_head: head_to_head(&rows),
        engagement: engagement(&rows),
        pagination,
    }))
}

#[utoipa::path(
    get,
    path = "/ratings/export",
    tag = "Admin",
    operation_id = "exportRatings",
    summary = "Download the loaded rating rows as CSV",
    description = "Columns: Date, User, Question, Model, Rank, Response. With pagination only the requested page is exported.",
    params(RatingListQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing analytics:view (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn export_csv(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RatingListQuery>,
) -> Result<Response, AppError> {
    auth_user.require_permission(PERM_ANALYTICS_VIEW)?;
    validate_rating_list_query(&query)?;

    let (rows, _) = load_rating_records(&state.db, &query).await?;
    let filename = format!("ratings-{}.csv", chrono::Utc::now().format("%Y-%m-%d"));
    info!(rows = rows.len(), "Exporting ratings");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        export_ratings(&rows),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/system-prompt",
    tag = "Admin",
    operation_id = "getSystemPrompt",
    summary = "Get the active system prompt",
    responses(
        (status = 200, description = "Active prompt", body = SystemPromptResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Permission denied (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No active prompt (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_system_prompt(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SystemPromptResponse>, AppError> {
    if !auth_user.has_permission(PERM_ANALYTICS_VIEW)
        && !auth_user.has_permission(PERM_SETTINGS_MANAGE)
    {
        return Err(AppError::PermissionDenied);
    }

    active_system_prompt(&state.db)
        .await?
        .map(|p| Json(p.into()))
        .ok_or_else(|| AppError::NotFound("No active system prompt".into()))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List users",
    responses(
        (status = 200, description = "Users ordered by ID", body = Vec<UserListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing user:manage (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserListItem>>, AppError> {
    auth_user.require_permission(PERM_USER_MANAGE)?;

    let users = profile::Entity::find()
        .order_by_asc(profile::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    tag = "Admin",
    operation_id = "updateUserRole",
    summary = "Change a user's role",
    description = "Takes effect at the user's next login. Callers cannot change their own role.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = UserListItem),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing user:manage (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Own role (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(target_id = id))]
pub async fn update_user_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<Json<UserListItem>, AppError> {
    auth_user.require_permission(PERM_USER_MANAGE)?;
    if id == auth_user.user_id {
        return Err(AppError::Conflict("Cannot change your own role".into()));
    }

    let user = profile::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let mut active: profile::ActiveModel = user.into();
    active.role = Set(payload.role);
    let user = active.update(&state.db).await?;

    info!(role = %user.role, "User role changed");
    Ok(Json(user.into()))
}
