use serde::Serialize;

use crate::error::AppError;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 50)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 1)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Highest page accepted. Keeps `(page - 1) * per_page` well inside `u64`.
pub const MAX_PAGE: u64 = 1_000_000;

/// Clamp optional page parameters. Returns `None` when neither was given.
pub fn page_params(page: Option<u64>, per_page: Option<u64>) -> Option<(u64, u64)> {
    if page.is_none() && per_page.is_none() {
        return None;
    }
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let per_page = per_page.unwrap_or(50).clamp(1, 500);
    Some((page, per_page))
}

/// Validate a trimmed title (1-200 Unicode characters).
pub fn validate_title(title: &str) -> Result<(), AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 200 {
        return Err(AppError::Validation(
            "Title must be 1-200 characters".into(),
        ));
    }
    Ok(())
}

/// Truncate to at most `max` characters, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
