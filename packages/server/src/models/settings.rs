use chrono::{DateTime, Utc};
use common::settings::{DefaultModel, find_setting};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{app_setting, enabled_model, system_prompt};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ToggleModelRequest {
    #[schema(example = "openai/gpt-4o-mini")]
    pub model_name: String,
    pub enabled: bool,
    /// Defaults to the model name for new rows; kept for existing rows when omitted.
    pub display_name: Option<String>,
}

pub fn validate_toggle_model(req: &ToggleModelRequest) -> Result<(), AppError> {
    let name = req.model_name.trim();
    if name.is_empty() || name.len() > 200 {
        return Err(AppError::Validation(
            "model_name must be 1-200 characters".into(),
        ));
    }
    if let Some(ref display) = req.display_name
        && (display.trim().is_empty() || display.len() > 200)
    {
        return Err(AppError::Validation(
            "display_name must be 1-200 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnabledModelResponse {
    pub model_name: String,
    pub display_name: String,
    pub enabled: bool,
    /// Absent for built-in defaults that were never stored.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<enabled_model::Model> for EnabledModelResponse {
    fn from(m: enabled_model::Model) -> Self {
        Self {
            model_name: m.model_name,
            display_name: m.display_name,
            enabled: m.enabled,
            updated_at: Some(m.updated_at),
        }
    }
}

impl From<&DefaultModel> for EnabledModelResponse {
    fn from(m: &DefaultModel) -> Self {
        Self {
            model_name: m.model_name.to_string(),
            display_name: m.display_name.to_string(),
            enabled: true,
            updated_at: None,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ModelListResponse {
    pub models: Vec<EnabledModelResponse>,
    /// True when the built-in default list was returned instead of stored rows.
    pub fallback: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateAppSettingRequest {
    #[schema(example = "require_rating_before_next_message")]
    pub key: String,
    #[schema(value_type = Object, example = json!(true))]
    pub value: Value,
}

pub fn validate_app_setting(req: &UpdateAppSettingRequest) -> Result<(), AppError> {
    let def = find_setting(&req.key)
        .ok_or_else(|| AppError::Validation(format!("Unknown setting '{}'", req.key)))?;
    if !def.accepts(&req.value) {
        return Err(AppError::Validation(format!(
            "Setting '{}' expects a {:?} value",
            req.key, def.kind
        )));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AppSettingResponse {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: Value,
    pub description: String,
    /// Absent when the default is in effect.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<app_setting::Model> for AppSettingResponse {
    fn from(m: app_setting::Model) -> Self {
        let description = find_setting(&m.key)
            .map(|def| def.description.to_string())
            .unwrap_or_default();
        Self {
            key: m.key,
            value: m.value,
            description,
            updated_at: Some(m.updated_at),
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateSystemPromptRequest {
    #[schema(example = "You are a helpful teaching assistant.")]
    pub content: String,
    pub name: Option<String>,
}

pub fn validate_system_prompt(req: &UpdateSystemPromptRequest) -> Result<(), AppError> {
    if req.content.chars().count() > 20_000 {
        return Err(AppError::Validation(
            "System prompt must be at most 20000 characters".into(),
        ));
    }
    if let Some(ref name) = req.name
        && (name.trim().is_empty() || name.chars().count() > 100)
    {
        return Err(AppError::Validation("Name must be 1-100 characters".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SystemPromptResponse {
    pub id: i32,
    pub name: String,
    pub content: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<system_prompt::Model> for SystemPromptResponse {
    fn from(m: system_prompt::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            content: m.content,
            is_active: m.is_active,
            updated_at: m.updated_at,
        }
    }
}
