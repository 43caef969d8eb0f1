use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::role::PERM_CONVERSATION_USE;
use common::search;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{conversation, query};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::conversation::*;
use crate::models::shared::validate_title;
use crate::state::AppState;
use crate::utils::conversation::{
    build_query_views, delete_conversation_tree, find_conversation, list_queries, require_owner,
    require_read_access, reveals_model_names,
};

#[utoipa::path(
    get,
    path = "/",
    tag = "Conversations",
    operation_id = "listConversations",
    summary = "List the caller's conversations",
    description = "Returns the caller's conversations, most recently updated first. `search` filters case-insensitively on the title and on question text.",
    params(ConversationListQuery),
    responses(
        (status = 200, description = "Conversations", body = Vec<ConversationListItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, params), fields(user_id = auth_user.user_id))]
pub async fn list_conversations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ConversationListQuery>,
) -> Result<Json<Vec<ConversationListItem>>, AppError> {
    auth_user.require_permission(PERM_CONVERSATION_USE)?;

    let conversations = conversation::Entity::find()
        .filter(conversation::Column::UserId.eq(auth_user.user_id))
        .order_by_desc(conversation::Column::UpdatedAt)
        .order_by_desc(conversation::Column::Id)
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = conversations.iter().map(|c| c.id).collect();
    let mut queries: HashMap<i32, Vec<query::Model>> = HashMap::new();
    if !ids.is_empty() {
        for q in query::Entity::find()
            .filter(query::Column::ConversationId.is_in(ids))
            .order_by_asc(query::Column::CreatedAt)
            .order_by_asc(query::Column::Id)
            .all(&state.db)
            .await?
        {
            queries.entry(q.conversation_id).or_default().push(q);
        }
    }

    let loaded: Vec<ConversationWithQueries> = conversations
        .into_iter()
        .map(|c| ConversationWithQueries {
            queries: queries.remove(&c.id).unwrap_or_default(),
            conversation: c,
        })
        .collect();

    let term = params.search.as_deref().unwrap_or_default();
    Ok(Json(
        search::filter(loaded, term)
            .into_iter()
            .map(ConversationListItem::from)
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Conversations",
    operation_id = "createConversation",
    summary = "Start a new conversation",
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateConversationRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PERM_CONVERSATION_USE)?;
    validate_create_conversation(&payload)?;

    let now = chrono::Utc::now();
    let title = payload
        .title
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| conversation::DEFAULT_TITLE.to_string());

    let model = conversation::ActiveModel {
        title: Set(title),
        user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ConversationResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Conversations",
    operation_id = "getConversation",
    summary = "Get a conversation with its anonymized response groups",
    description = "Each question's responses are shuffled on every read and labeled \"Model A\", \"Model B\", ... by position. True model names are included only for callers with `analytics:view` reading another user's conversation. Returns 404 for conversations the caller cannot read.",
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation details", body = ConversationDetail),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Conversation not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn get_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ConversationDetail>, AppError> {
    let conv = find_conversation(&state.db, id).await?;
    require_read_access(&auth_user, &conv)?;

    let queries = list_queries(&state.db, id).await?;
    let reveal = reveals_model_names(&auth_user, &conv);
    let views = build_query_views(&state.db, queries, auth_user.user_id, reveal).await?;

    Ok(Json(ConversationDetail {
        id: conv.id,
        title: conv.title,
        created_at: conv.created_at,
        updated_at: conv.updated_at,
        queries: views,
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Conversations",
    operation_id = "renameConversation",
    summary = "Rename a conversation",
    params(("id" = i32, Path, description = "Conversation ID")),
    request_body = UpdateConversationRequest,
    responses(
        (status = 200, description = "Conversation renamed", body = ConversationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Conversation not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn update_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateConversationRequest>,
) -> Result<Json<ConversationResponse>, AppError> {
    validate_title(&payload.title)?;

    let conv = find_conversation(&state.db, id).await?;
    require_owner(&auth_user, &conv)?;

    let mut active: conversation::ActiveModel = conv.into();
    active.title = Set(payload.title.trim().to_string());
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Conversations",
    operation_id = "deleteConversation",
    summary = "Delete a conversation",
    description = "Permanently deletes the conversation with its questions, responses and ratings.",
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 204, description = "Conversation deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Conversation not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let conv = find_conversation(&txn, id).await?;
    require_owner(&auth_user, &conv)?;

    delete_conversation_tree(&txn, id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
