use chrono::{DateTime, NaiveDate, Utc};
use common::Role;
use common::analytics::{Engagement, HeadToHead, ModelRankStats, RatingRecord};
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::error::AppError;

/// Filters shared by the rating list, analytics and CSV export.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct RatingListQuery {
    /// 1-based page. Omit both `page` and `per_page` to load every matching row.
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 50)]
    pub per_page: Option<u64>,
    /// Inclusive start date (UTC) of the rating.
    #[param(example = "2024-09-01")]
    pub from: Option<NaiveDate>,
    /// Inclusive end date (UTC) of the rating.
    #[param(example = "2024-12-31")]
    pub to: Option<NaiveDate>,
}

pub fn validate_rating_list_query(query: &RatingListQuery) -> Result<(), AppError> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && to < from
    {
        return Err(AppError::Validation("`to` must not be before `from`".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RatingListResponse {
    pub data: Vec<RatingRecord>,
    /// Absent when every matching row was loaded.
    pub pagination: Option<Pagination>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnalyticsResponse {
    /// Number of rating rows the aggregates were computed over.
    pub rows_analyzed: usize,
    pub rankings: Vec<ModelRankStats>,
    pub head_to_head: HeadToHead,
    pub engagement: Engagement,
    pub pagination: Option<Pagination>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListItem {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::profile::Model> for UserListItem {
    fn from(m: crate::entity::profile::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            role: m.role,
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}
