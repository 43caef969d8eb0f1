use std::collections::HashMap;

use common::anonymize::anonymize;
use common::ranking::RankingBoard;
use common::role::PERM_ANALYTICS_VIEW;
use sea_orm::sea_query::LockType;
use sea_orm::*;

use crate::entity::{conversation, query, rating, response};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::conversation::{QueryView, ResponseView};

/// Look up a conversation by ID, returning 404 if not found.
pub async fn find_conversation<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<conversation::Model, AppError> {
    conversation::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))
}

/// Only the owner may write to a conversation. Others get 404 to prevent enumeration.
pub fn require_owner(auth_user: &AuthUser, conv: &conversation::Model) -> Result<(), AppError> {
    if conv.user_id == auth_user.user_id {
        Ok(())
    } else {
        Err(AppError::NotFound("Conversation not found".into()))
    }
}

/// The owner and analytics viewers may read a conversation.
pub fn require_read_access(
    auth_user: &AuthUser,
    conv: &conversation::Model,
) -> Result<(), AppError> {
    if conv.user_id == auth_user.user_id || auth_user.has_permission(PERM_ANALYTICS_VIEW) {
        Ok(())
    } else {
        Err(AppError::NotFound("Conversation not found".into()))
    }
}

/// True model names are shown to analytics viewers reading someone else's
/// conversation. Owners always rank blind, whatever their role.
pub fn reveals_model_names(auth_user: &AuthUser, conv: &conversation::Model) -> bool {
    conv.user_id != auth_user.user_id && auth_user.has_permission(PERM_ANALYTICS_VIEW)
}

/// Queries of a conversation in submission order.
pub async fn list_queries<C: ConnectionTrait>(
    db: &C,
    conversation_id: i32,
) -> Result<Vec<query::Model>, AppError> {
    Ok(query::Entity::find()
        .filter(query::Column::ConversationId.eq(conversation_id))
        .order_by_asc(query::Column::CreatedAt)
        .order_by_asc(query::Column::Id)
        .all(db)
        .await?)
}

/// Sibling responses of each query, keyed by query ID, in insertion order.
pub async fn responses_by_query<C: ConnectionTrait>(
    db: &C,
    query_ids: &[i32],
) -> Result<HashMap<i32, Vec<response::Model>>, AppError> {
    if query_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = response::Entity::find()
        .filter(response::Column::QueryId.is_in(query_ids.iter().copied()))
        .order_by_asc(response::Column::Id)
        .all(db)
        .await?;

    let mut grouped: HashMap<i32, Vec<response::Model>> = HashMap::new();
    for row in rows {
        grouped.entry(row.query_id).or_default().push(row);
    }
    Ok(grouped)
}

/// `(response_id, rank)` pairs a user has stored for the given responses.
pub async fn user_ranks<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    response_ids: &[i32],
) -> Result<Vec<(i32, i32)>, AppError> {
    if response_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(rating::Entity::find()
        .filter(rating::Column::UserId.eq(user_id))
        .filter(rating::Column::ResponseId.is_in(response_ids.iter().copied()))
        .select_only()
        .column(rating::Column::ResponseId)
        .column(rating::Column::Rank)
        .into_tuple()
        .all(db)
        .await?)
}

/// Build anonymized views for `queries` as seen by `viewer_id`.
///
/// Every call reshuffles; labels are never stored. `reveal` adds true model names.
pub async fn build_query_views<C: ConnectionTrait>(
    db: &C,
    queries: Vec<query::Model>,
    viewer_id: i32,
    reveal: bool,
) -> Result<Vec<QueryView>, AppError> {
    let query_ids: Vec<i32> = queries.iter().map(|q| q.id).collect();
    let mut grouped = responses_by_query(db, &query_ids).await?;
    let response_ids: Vec<i32> = grouped.values().flatten().map(|r| r.id).collect();
    let ranks = user_ranks(db, viewer_id, &response_ids).await?;

    let mut views = Vec::with_capacity(queries.len());
    for q in queries {
        let group = grouped.remove(&q.id).unwrap_or_default();
        let board = RankingBoard::with_ranks(group.iter().map(|r| r.id), ranks.iter().copied());

        let responses = anonymize(group)
            .into_iter()
            .map(|a| ResponseView {
                id: a.item.id,
                label: a.label,
                position: a.position,
                my_rank: board.rank_of(a.item.id),
                model_name: reveal.then_some(a.item.model_name),
                content: a.item.content,
            })
            .collect();

        views.push(QueryView {
            id: q.id,
            content: q.content,
            status: q.status,
            created_at: q.created_at,
            responses,
            fully_ranked: board.is_complete(),
        });
    }
    Ok(views)
}

/// The ranking board of one response's sibling group, loaded for `user_id`.
pub struct LoadedGroup {
    pub response: response::Model,
    pub conversation: conversation::Model,
    pub board: RankingBoard,
}

/// Load the response, its conversation and the caller's board over its siblings.
///
/// The parent query row is locked `FOR UPDATE`, so concurrent rank writes on the
/// same group serialize and each sees the other's committed ranks.
pub async fn load_group<C: ConnectionTrait>(
    db: &C,
    response_id: i32,
    user_id: i32,
) -> Result<LoadedGroup, AppError> {
    let not_found = || AppError::NotFound("Response not found".into());

    let response = response::Entity::find_by_id(response_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let parent = query::Entity::find_by_id(response.query_id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    let conversation = conversation::Entity::find_by_id(parent.conversation_id)
        .one(db)
        .await?
        .ok_or_else(not_found)?;

    let sibling_ids: Vec<i32> = response::Entity::find()
        .filter(response::Column::QueryId.eq(response.query_id))
        .select_only()
        .column(response::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    let ranks = user_ranks(db, user_id, &sibling_ids).await?;

    Ok(LoadedGroup {
        response,
        conversation,
        board: RankingBoard::with_ranks(sibling_ids, ranks),
    })
}

/// Whether the user has ranked every response to the latest query of a conversation.
///
/// A conversation without queries, or whose latest query has no responses, is complete.
pub async fn latest_group_complete<C: ConnectionTrait>(
    db: &C,
    conversation_id: i32,
    user_id: i32,
) -> Result<bool, AppError> {
    let Some(latest) = query::Entity::find()
        .filter(query::Column::ConversationId.eq(conversation_id))
        .order_by_desc(query::Column::CreatedAt)
        .order_by_desc(query::Column::Id)
        .one(db)
        .await?
    else {
        return Ok(true);
    };

    let response_ids: Vec<i32> = response::Entity::find()
        .filter(response::Column::QueryId.eq(latest.id))
        .select_only()
        .column(response::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    let ranks = user_ranks(db, user_id, &response_ids).await?;

    Ok(RankingBoard::with_ranks(response_ids, ranks).is_complete())
}

/// Prior turns of a conversation as answered by `model_name`, oldest first.
pub fn history_for_model(
    queries: &[query::Model],
    responses: &HashMap<i32, Vec<response::Model>>,
    model_name: &str,
) -> Vec<(String, String)> {
    queries
        .iter()
        .filter_map(|q| {
            responses
                .get(&q.id)?
                .iter()
                .find(|r| r.model_name == model_name)
                .map(|r| (q.content.clone(), r.content.clone()))
        })
        .collect()
}

/// Delete a conversation and everything beneath it, ratings first.
pub async fn delete_conversation_tree<C: ConnectionTrait>(
    db: &C,
    conversation_id: i32,
) -> Result<(), AppError> {
    let query_ids: Vec<i32> = query::Entity::find()
        .filter(query::Column::ConversationId.eq(conversation_id))
        .select_only()
        .column(query::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    if !query_ids.is_empty() {
        let response_ids: Vec<i32> = response::Entity::find()
            .filter(response::Column::QueryId.is_in(query_ids.clone()))
            .select_only()
            .column(response::Column::Id)
            .into_tuple()
            .all(db)
            .await?;

        if !response_ids.is_empty() {
            rating::Entity::delete_many()
                .filter(rating::Column::ResponseId.is_in(response_ids))
                .exec(db)
                .await?;
        }
        response::Entity::delete_many()
            .filter(response::Column::QueryId.is_in(query_ids.clone()))
            .exec(db)
            .await?;
        query::Entity::delete_many()
            .filter(query::Column::Id.is_in(query_ids))
            .exec(db)
            .await?;
    }

    conversation::Entity::delete_by_id(conversation_id)
        .exec(db)
        .await?;
    Ok(())
}
