use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Toggle-style rank selection.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SelectRankRequest {
    /// 1 is best. Selecting the rank already held clears it.
    #[schema(example = 1)]
    pub rank: i32,
}

/// Overwrite-style rating write.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetRatingRequest {
    #[schema(example = 2)]
    pub rank: i32,
    pub feedback: Option<String>,
}

pub fn validate_feedback(feedback: Option<&str>) -> Result<(), AppError> {
    if let Some(feedback) = feedback
        && feedback.chars().count() > 2000
    {
        return Err(AppError::Validation(
            "Feedback must be at most 2000 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RatingChange {
    Set,
    Cleared,
    Unchanged,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RatingResponse {
    pub response_id: i32,
    /// Rank now stored for the caller, or null when cleared.
    pub rank: Option<i32>,
    pub change: RatingChange,
    /// Every sibling response now holds a rank from the caller.
    pub group_complete: bool,
}
