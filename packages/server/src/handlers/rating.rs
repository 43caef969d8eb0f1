use axum::Json;
use axum::extract::{Path, State};
use common::ranking::RankChange;
use common::role::PERM_CONVERSATION_USE;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::rating;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::rating::*;
use crate::state::AppState;
use crate::utils::conversation::{LoadedGroup, load_group, require_owner};

/// Load the caller's board for a response they own, inside `txn`.
async fn owned_group(
    txn: &DatabaseTransaction,
    auth_user: &AuthUser,
    response_id: i32,
) -> Result<LoadedGroup, AppError> {
    auth_user.require_permission(PERM_CONVERSATION_USE)?;
    let group = load_group(txn, response_id, auth_user.user_id).await?;
    require_owner(auth_user, &group.conversation)
        .map_err(|_| AppError::NotFound("Response not found".into()))?;
    Ok(group)
}

/// Insert or update the caller's rating row. `feedback` is only written when given.
async fn upsert_rating(
    txn: &DatabaseTransaction,
    response_id: i32,
    user_id: i32,
    rank: i32,
    feedback: Option<Option<String>>,
) -> Result<(), AppError> {
    let now = chrono::Utc::now();
    let mut update_columns = vec![rating::Column::Rank, rating::Column::UpdatedAt];
    if feedback.is_some() {
        update_columns.push(rating::Column::Feedback);
    }

    rating::Entity::insert(rating::ActiveModel {
        response_id: Set(response_id),
        user_id: Set(user_id),
        rank: Set(rank),
        feedback: Set(feedback.flatten()),
        created_at: Set(now),
        updated_at: Set(now),
    })
    .on_conflict(
        OnConflict::columns([rating::Column::ResponseId, rating::Column::UserId])
            .update_columns(update_columns)
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;
    Ok(())
}

async fn delete_rating(
    txn: &DatabaseTransaction,
    response_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    rating::Entity::delete_many()
        .filter(rating::Column::ResponseId.eq(response_id))
        .filter(rating::Column::UserId.eq(user_id))
        .exec(txn)
        .await?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/{id}/rank",
    tag = "Ratings",
    operation_id = "selectRank",
    summary = "Select a rank for a response (toggle)",
    description = "Selecting the rank the response already holds clears it. A rank held by a sibling response must be deselected there first. Ranks run from 1 (best) to the number of responses in the group.",
    params(("id" = i32, Path, description = "Response ID")),
    request_body = SelectRankRequest,
    responses(
        (status = 200, description = "Rank updated", body = RatingResponse),
        (status = 400, description = "Rank out of range (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Response not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Rank held by a sibling (RANK_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(response_id = id, user_id = auth_user.user_id))]
pub async fn select_rank(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SelectRankRequest>,
) -> Result<Json<RatingResponse>, AppError> {
    let txn = state.db.begin().await?;
    let mut group = owned_group(&txn, &auth_user, id).await?;

    let change = group.board.select(id, payload.rank)?;
    match change {
        RankChange::Set(rank) => upsert_rating(&txn, id, auth_user.user_id, rank, None).await?,
        RankChange::Cleared => delete_rating(&txn, id, auth_user.user_id).await?,
        RankChange::Unchanged(_) => {}
    }
    txn.commit().await?;

    info!(?change, "Rank selected");
    Ok(Json(rating_response(id, &group, change)))
}

#[utoipa::path(
    put,
    path = "/{id}/rating",
    tag = "Ratings",
    operation_id = "setRating",
    summary = "Set the caller's rank for a response",
    description = "Idempotent upsert of the caller's single rating for this response. Setting the same rank again leaves it in place.",
    params(("id" = i32, Path, description = "Response ID")),
    request_body = SetRatingRequest,
    responses(
        (status = 200, description = "Rating stored", body = RatingResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Response not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Rank held by a sibling (RANK_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(response_id = id, user_id = auth_user.user_id))]
pub async fn set_rating(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SetRatingRequest>,
) -> Result<Json<RatingResponse>, AppError> {
    validate_feedback(payload.feedback.as_deref())?;

    let txn = state.db.begin().await?;
    let mut group = owned_group(&txn, &auth_user, id).await?;

    let change = group.board.assign(id, payload.rank)?;
    upsert_rating(
        &txn,
        id,
        auth_user.user_id,
        payload.rank,
        Some(payload.feedback),
    )
    .await?;
    txn.commit().await?;

    Ok(Json(rating_response(id, &group, change)))
}

#[utoipa::path(
    delete,
    path = "/{id}/rating",
    tag = "Ratings",
    operation_id = "clearRating",
    summary = "Remove the caller's rank for a response",
    params(("id" = i32, Path, description = "Response ID")),
    responses(
        (status = 200, description = "Rating removed", body = RatingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Response not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(response_id = id, user_id = auth_user.user_id))]
pub async fn clear_rating(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RatingResponse>, AppError> {
    let txn = state.db.begin().await?;
    let mut group = owned_group(&txn, &auth_user, id).await?;

    let change = match group.board.clear(id)? {
        Some(_) => {
            delete_rating(&txn, id, auth_user.user_id).await?;
            RatingChange::Cleared
        }
        None => RatingChange::Unchanged,
    };
    txn.commit().await?;

    Ok(Json(RatingResponse {
        response_id: id,
        rank: None,
        change,
        group_complete: group.board.is_complete(),
    }))
}

fn rating_response(response_id: i32, group: &LoadedGroup, change: RankChange) -> RatingResponse {
    RatingResponse {
        response_id,
        rank: group.board.rank_of(response_id),
        change: match change {
            RankChange::Set(_) => RatingChange::Set,
            RankChange::Cleared => RatingChange::Cleared,
            RankChange::Unchanged(_) => RatingChange::Unchanged,
        },
        group_complete: group.board.is_complete(),
    }
}
