use axum::Json;
use axum::extract::State;
use common::role::PERM_SETTINGS_MANAGE;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{app_setting, enabled_model, system_prompt};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::settings::*;
use crate::state::AppState;
use crate::utils::settings::{active_system_prompt, list_models as load_models, list_settings};

/// Name given to a system prompt created through the update endpoint.
const DEFAULT_PROMPT_NAME: &str = "Default";

#[utoipa::path(
    post,
    path = "/toggle-model",
    tag = "Settings",
    operation_id = "toggleModel",
    summary = "Enable or disable a model",
    description = "Creates the model row when it does not exist yet.",
    request_body = ToggleModelRequest,
    responses(
        (status = 200, description = "Model updated", body = EnabledModelResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing settings:manage (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(model = %payload.model_name))]
pub async fn toggle_model(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ToggleModelRequest>,
) -> Result<Json<EnabledModelResponse>, AppError> {
    auth_user.require_permission(PERM_SETTINGS_MANAGE)?;
    validate_toggle_model(&payload)?;

    let model_name = payload.model_name.trim().to_string();
    let display_name = payload.display_name.as_deref().map(str::trim);

    let mut update_columns = vec![enabled_model::Column::Enabled, enabled_model::Column::UpdatedAt];
    if display_name.is_some() {
        update_columns.push(enabled_model::Column::DisplayName);
    }

    enabled_model::Entity::insert(enabled_model::ActiveModel {
        model_name: Set(model_name.clone()),
        display_name: Set(display_name.unwrap_or(&model_name).to_string()),
        enabled: Set(payload.enabled),
        updated_at: Set(chrono::Utc::now()),
    })
    .on_conflict(
        OnConflict::column(enabled_model::Column::ModelName)
            .update_columns(update_columns)
            .to_owned(),
    )
    .exec_without_returning(&state.db)
    .await?;

    let row = enabled_model::Entity::find_by_id(model_name)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Model row missing after upsert".into()))?;

    info!(enabled = row.enabled, "Model toggled");
    Ok(Json(row.into()))
}

#[utoipa::path(
    post,
    path = "/update-app-setting",
    tag = "Settings",
    operation_id = "updateAppSetting",
    summary = "Change an application setting",
    request_body = UpdateAppSettingRequest,
    responses(
        (status = 200, description = "Setting stored", body = AppSettingResponse),
        (status = 400, description = "Unknown key or wrong value type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing settings:manage (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(key = %payload.key))]
pub async fn update_app_setting(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateAppSettingRequest>,
) -> Result<Json<AppSettingResponse>, AppError> {
    auth_user.require_permission(PERM_SETTINGS_MANAGE)?;
    validate_app_setting(&payload)?;

    app_setting::Entity::insert(app_setting::ActiveModel {
        key: Set(payload.key.clone()),
        value: Set(payload.value),
        updated_at: Set(chrono::Utc::now()),
    })
    .on_conflict(
        OnConflict::column(app_setting::Column::Key)
            .update_columns([app_setting::Column::Value, app_setting::Column::UpdatedAt])
            .to_owned(),
    )
    .exec_without_returning(&state.db)
    .await?;

    let row = app_setting::Entity::find_by_id(payload.key)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("Setting row missing after upsert".into()))?;

    info!(value = %row.value, "App setting updated");
    Ok(Json(row.into()))
}

#[utoipa::path(
    post,
    path = "/update-system-prompt",
    tag = "Settings",
    operation_id = "updateSystemPrompt",
    summary = "Replace the active system prompt",
    description = "Updates the active prompt in place, or creates one when none is active. An empty prompt sends no system message.",
    request_body = UpdateSystemPromptRequest,
    responses(
        (status = 200, description = "Prompt stored", body = SystemPromptResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Missing settings:manage (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_system_prompt(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateSystemPromptRequest>,
) -> Result<Json<SystemPromptResponse>, AppError> {
    auth_user.require_permission(PERM_SETTINGS_MANAGE)?;
    validate_system_prompt(&payload)?;

    let now = chrono::Utc::now();
    let name = payload.name.map(|n| n.trim().to_string());

    let txn = state.db.begin().await?;
    let model = match active_system_prompt(&txn).await? {
        Some(existing) => {
            let mut active: system_prompt::ActiveModel = existing.into();
            active.content = Set(payload.content);
            if let Some(name) = name {
                active.name = Set(name);
            }
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            system_prompt::ActiveModel {
                name: Set(name.unwrap_or_else(|| DEFAULT_PROMPT_NAME.to_string())),
                content: Set(payload.content),
                is_active: Set(true),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };
    txn.commit().await?;

    info!(prompt_id = model.id, chars = model.content.len(), "System prompt updated");
    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/settings",
    tag = "Settings",
    operation_id = "listSettings",
    summary = "List application settings",
    description = "Every known setting, with its default applied when it was never stored.",
    responses(
        (status = 200, description = "Settings", body = Vec<AppSettingResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_settings(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AppSettingResponse>>, AppError> {
    Ok(Json(list_settings(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/models",
    tag = "Settings",
    operation_id = "listModels",
    summary = "List models and whether they answer new questions",
    description = "Falls back to the built-in default list when no model has been stored or the table cannot be read.",
    responses(
        (status = 200, description = "Models", body = ModelListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_models(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Json<ModelListResponse> {
    let (models, fallback) = load_models(&state.db).await;
    Json(ModelListResponse { models, fallback })
}
