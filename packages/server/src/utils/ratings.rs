use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use common::analytics::RatingRecord;
use sea_orm::*;

use crate::entity::{profile, query, rating, response};
use crate::error::AppError;
use crate::models::admin::RatingListQuery;
use crate::models::shared::{Pagination, page_params};

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Rating rows matching the filters, newest first, joined with their
/// response, question and rater.
///
/// Pagination is applied to ratings before the join, so an export or an
/// aggregate over a paginated request sees only that page.
pub async fn load_rating_records<C: ConnectionTrait>(
    db: &C,
    filter: &RatingListQuery,
) -> Result<(Vec<RatingRecord>, Option<Pagination>), AppError> {
    let mut select = rating::Entity::find();
    if let Some(from) = filter.from {
        select = select.filter(rating::Column::CreatedAt.gte(start_of(from)));
    }
    if let Some(to) = filter.to.and_then(|d| d.checked_add_days(Days::new(1))) {
        select = select.filter(rating::Column::CreatedAt.lt(start_of(to)));
    }
    let select = select
        .order_by_desc(rating::Column::CreatedAt)
        .order_by_asc(rating::Column::ResponseId)
        .order_by_asc(rating::Column::UserId);

    let (ratings, pagination) = match page_params(filter.page, filter.per_page) {
        Some((page, per_page)) => {
            let total = select.clone().count(db).await?;
            let rows = select
                .offset(Some((page - 1) * per_page))
                .limit(Some(per_page))
                .all(db)
                .await?;
            (rows, Some(Pagination::new(page, per_page, total)))
        }
        None => (select.all(db).await?, None),
    };

    if ratings.is_empty() {
        return Ok((Vec::new(), pagination));
    }

    let response_ids: Vec<i32> = ratings.iter().map(|r| r.response_id).collect();
    let responses: HashMap<i32, response::Model> = response::Entity::find()
        .filter(response::Column::Id.is_in(response_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let query_ids: Vec<i32> = responses.values().map(|r| r.query_id).collect();
    let queries: HashMap<i32, query::Model> = query::Entity::find()
        .filter(query::Column::Id.is_in(query_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    let user_ids: Vec<i32> = ratings.iter().map(|r| r.user_id).collect();
    let emails: HashMap<i32, String> = profile::Entity::find()
        .filter(profile::Column::Id.is_in(user_ids))
        .select_only()
        .column(profile::Column::Id)
        .column(profile::Column::Email)
        .into_tuple::<(i32, String)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let records = ratings
        .into_iter()
        .filter_map(|rating| {
            let resp = responses.get(&rating.response_id)?;
            let question = queries.get(&resp.query_id)?;
            Some(RatingRecord {
                response_id: rating.response_id,
                query_id: question.id,
                user_id: rating.user_id,
                user_email: emails.get(&rating.user_id).cloned().unwrap_or_default(),
                model_name: resp.model_name.clone(),
                rank: rating.rank,
                question: question.content.clone(),
                response: resp.content.clone(),
                created_at: rating.created_at,
            })
        })
        .collect();

    Ok((records, pagination))
}
