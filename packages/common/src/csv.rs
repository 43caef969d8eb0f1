use crate::analytics::RatingRecord;

pub const EXPORT_HEADER: &str = "Date,User,Question,Model,Rank,Response";

/// Quote a text field, doubling embedded double quotes.
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render the loaded rating rows as CSV: a header plus exactly one line per row.
///
/// Only the rows passed in are exported; a paginated caller gets one page.
pub fn export_ratings(rows: &[RatingRecord]) -> String {
    let mut out = String::with_capacity(EXPORT_HEADER.len() + 1 + rows.len() * 128);
    out.push_str(EXPORT_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&row.created_at.format("%Y-%m-%d %H:%M:%S").to_string());
        out.push(',');
        out.push_str(&quote(&row.user_email));
        out.push(',');
        out.push_str(&quote(&row.question));
        out.push(',');
        out.push_str(&quote(&row.model_name));
        out.push(',');
        out.push_str(&row.rank.to_string());
        out.push(',');
        out.push_str(&quote(&row.response));
        out.push('\n');
    }
    out
}
