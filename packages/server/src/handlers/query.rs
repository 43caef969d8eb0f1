use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::QueryStatus;
use common::role::PERM_CONVERSATION_USE;
use common::settings::REQUIRE_RATING_BEFORE_NEXT_MESSAGE;
use sea_orm::*;
use tracing::{info, instrument, warn};

use crate::entity::{conversation, query, response};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::generation::{GenerationRequest, generate_all};
use crate::models::conversation::*;
use crate::models::shared::truncate_chars;
use crate::state::AppState;
use crate::utils::conversation::{
    build_query_views, find_conversation, history_for_model, latest_group_complete, list_queries,
    require_owner, require_read_access, responses_by_query, reveals_model_names,
};
use crate::utils::settings::{active_model_names, active_system_prompt, setting_bool};

#[utoipa::path(
    post,
    path = "/{id}/queries",
    tag = "Conversations",
    operation_id = "submitQuery",
    summary = "Ask a question to every enabled model",
    description = "Sends the question with the conversation history to every enabled model concurrently, then stores the question together with each successful answer. Models that fail are skipped; the query is `failed` only when none answered. When `require_rating_before_next_message` is on, the previous question's responses must all be ranked first.",
    params(("id" = i32, Path, description = "Conversation ID")),
    request_body = SubmitQueryRequest,
    responses(
        (status = 201, description = "Question answered", body = QueryView),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Conversation not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Previous responses are not fully ranked (RATING_REQUIRED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(conversation_id = id, user_id = auth_user.user_id))]
pub async fn submit_query(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SubmitQueryRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERM_CONVERSATION_USE)?;
    validate_submit_query(&payload)?;

    let conv = find_conversation(&state.db, id).await?;
    require_owner(&auth_user, &conv)?;

    if setting_bool(&state.db, REQUIRE_RATING_BEFORE_NEXT_MESSAGE).await
        && !latest_group_complete(&state.db, id, auth_user.user_id).await?
    {
        return Err(AppError::RatingRequired);
    }

    let models = active_model_names(&state.db).await;
    if models.is_empty() {
        return Err(AppError::Validation("No models are enabled".into()));
    }

    let prior = list_queries(&state.db, id).await?;
    let prior_ids: Vec<i32> = prior.iter().map(|q| q.id).collect();
    let prior_responses = responses_by_query(&state.db, &prior_ids).await?;
    let system_prompt = active_system_prompt(&state.db)
        .await?
        .map(|p| p.content)
        .filter(|c| !c.trim().is_empty());

    let content = payload.content.trim().to_string();
    let asked_at = chrono::Utc::now();

    let requests: Vec<GenerationRequest> = models
        .iter()
        .map(|model| GenerationRequest {
            model: model.clone(),
            system_prompt: system_prompt.clone(),
            history: history_for_model(&prior, &prior_responses, model),
            question: content.clone(),
        })
        .collect();
    let results = generate_all(state.generator.as_ref(), &requests).await;
    let answers: Vec<(String, String)> = requests
        .iter()
        .zip(results)
        .filter_map(|(req, result)| result.ok().map(|text| (req.model.clone(), text)))
        .collect();
    let succeeded = answers.len();
    let status = QueryStatus::from_generated(succeeded);

    // Question and answers are written in one transaction; no query is stored
    // without its final status.
    let txn = state.db.begin().await?;
    let now = chrono::Utc::now();
    let q = query::ActiveModel {
        content: Set(content.clone()),
        status: Set(status),
        conversation_id: Set(id),
        created_at: Set(asked_at),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if !answers.is_empty() {
        let rows = answers
            .into_iter()
            .map(|(model_name, text)| response::ActiveModel {
                model_name: Set(model_name),
                content: Set(text),
                query_id: Set(q.id),
                created_at: Set(now),
                ..Default::default()
            });
        response::Entity::insert_many(rows)
            .exec_without_returning(&txn)
            .await?;
    }

    let auto_title = prior.is_empty() && conv.title == conversation::DEFAULT_TITLE;
    let mut c: conversation::ActiveModel = conv.into();
    if auto_title {
        c.title = Set(truncate_chars(&content, AUTO_TITLE_CHARS));
    }
    c.updated_at = Set(now);
    c.update(&txn).await?;

    txn.commit().await?;

    if status == QueryStatus::Failed {
        warn!(query_id = q.id, models = models.len(), "No model answered");
    } else {
        info!(query_id = q.id, succeeded, models = models.len(), "Query answered");
    }

    let view = build_query_views(&state.db, vec![q], auth_user.user_id, false)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Query view missing after insert".into()))?;

    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/{id}/responses",
    tag = "Conversations",
    operation_id = "getQueryResponses",
    summary = "Get the anonymized responses to one question",
    description = "Responses are reshuffled on every read. True model names are included only for callers with `analytics:view` reading another user's conversation.",
    params(("id" = i32, Path, description = "Query ID")),
    responses(
        (status = 200, description = "Query with responses", body = QueryView),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Query not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(query_id = id))]
pub async fn get_query_responses(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<QueryView>, AppError> {
    let q = query::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Query not found".into()))?;
    let conv = find_conversation(&state.db, q.conversation_id)
        .await
        .map_err(|_| AppError::NotFound("Query not found".into()))?;
    require_read_access(&auth_user, &conv)
        .map_err(|_| AppError::NotFound("Query not found".into()))?;

    let reveal = reveals_model_names(&auth_user, &conv);
    build_query_views(&state.db, vec![q], auth_user.user_id, reveal)
        .await?
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Query not found".into()))
}
