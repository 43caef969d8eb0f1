use common::settings::{DEFAULT_MODELS, find_setting};
use sea_orm::*;
use serde_json::Value;
use tracing::warn;

use crate::entity::{app_setting, enabled_model, system_prompt};
use crate::error::AppError;
use crate::models::settings::{AppSettingResponse, EnabledModelResponse};

/// Every stored model row, or the built-in defaults when the table is empty or unreachable.
///
/// The second element is true when the defaults were used.
pub async fn list_models<C: ConnectionTrait>(db: &C) -> (Vec<EnabledModelResponse>, bool) {
    let rows = enabled_model::Entity::find()
        .order_by_asc(enabled_model::Column::ModelName)
        .all(db)
        .await;

    match rows {
        Ok(rows) if !rows.is_empty() => (rows.into_iter().map(Into::into).collect(), false),
        Ok(_) => (DEFAULT_MODELS.iter().map(Into::into).collect(), true),
        Err(e) => {
            warn!(error = %e, "Failed to load enabled models, using defaults");
            (DEFAULT_MODELS.iter().map(Into::into).collect(), true)
        }
    }
}

/// Names of the models that answer new questions.
pub async fn active_model_names<C: ConnectionTrait>(db: &C) -> Vec<String> {
    let (models, _) = list_models(db).await;
    models
        .into_iter()
        .filter(|m| m.enabled)
        .map(|m| m.model_name)
        .collect()
}

/// Current value of a known setting, falling back to its default.
pub async fn setting_value<C: ConnectionTrait>(db: &C, key: &str) -> Value {
    let default = find_setting(key)
        .map(|def| (def.default)())
        .unwrap_or(Value::Null);

    match app_setting::Entity::find_by_id(key.to_string()).one(db).await {
        Ok(Some(row)) => row.value,
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "Failed to load app setting, using default");
            default
        }
    }
}

pub async fn setting_bool<C: ConnectionTrait>(db: &C, key: &str) -> bool {
    setting_value(db, key).await.as_bool().unwrap_or(false)
}

/// All known settings with stored values or defaults applied.
pub async fn list_settings<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<AppSettingResponse>, AppError> {
    let stored = app_setting::Entity::find().all(db).await?;

    Ok(common::settings::KNOWN_SETTINGS
        .iter()
        .map(|def| {
            match stored.iter().find(|row| row.key == def.key) {
                Some(row) => AppSettingResponse::from(row.clone()),
                None => AppSettingResponse {
                    key: def.key.to_string(),
                    value: (def.default)(),
                    description: def.description.to_string(),
                    updated_at: None,
                },
            }
        })
        .collect())
}

/// The prompt sent as the system message, if one is active.
pub async fn active_system_prompt<C: ConnectionTrait>(
    db: &C,
) -> Result<Option<system_prompt::Model>, AppError> {
    Ok(system_prompt::Entity::find()
        .filter(system_prompt::Column::IsActive.eq(true))
        .order_by_desc(system_prompt::Column::UpdatedAt)
        .one(db)
        .await?)
}
