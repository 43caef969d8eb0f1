use chrono::{DateTime, Utc};
use common::QueryStatus;
use common::search::Searchable;
use serde::{Deserialize, Serialize};

use super::shared::validate_title;
use crate::entity::{conversation, query};
use crate::error::AppError;

/// Longest accepted question.
pub const MAX_QUERY_CHARS: usize = 20_000;

/// Characters of the first question used as an automatic title.
pub const AUTO_TITLE_CHARS: usize = 50;

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CreateConversationRequest {
    /// Defaults to "New Conversation"; replaced by the first question if left unset.
    #[schema(example = "Ownership questions")]
    pub title: Option<String>,
}

pub fn validate_create_conversation(req: &CreateConversationRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateConversationRequest {
    #[schema(example = "Lifetimes")]
    pub title: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ConversationListQuery {
    /// Case-insensitive substring matched against titles and question text.
    #[param(example = "borrow")]
    pub search: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitQueryRequest {
    #[schema(example = "Explain the borrow checker in two sentences.")]
    pub content: String,
}

pub fn validate_submit_query(req: &SubmitQueryRequest) -> Result<(), AppError> {
    let content = req.content.trim();
    if content.is_empty() || content.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::Validation(format!(
            "Content must be 1-{MAX_QUERY_CHARS} characters"
        )));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ConversationResponse {
    pub id: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<conversation::Model> for ConversationResponse {
    fn from(m: conversation::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A conversation together with its loaded questions, for listing and search.
pub struct ConversationWithQueries {
    pub conversation: conversation::Model,
    pub queries: Vec<query::Model>,
}

impl Searchable for ConversationWithQueries {
    fn search_texts(&self) -> Vec<&str> {
        std::iter::once(self.conversation.title.as_str())
            .chain(self.queries.iter().map(|q| q.content.as_str()))
            .collect()
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ConversationListItem {
    pub id: i32,
    pub title: String,
    pub query_count: usize,
    /// Most recent question, if any.
    pub last_query: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConversationWithQueries> for ConversationListItem {
    fn from(c: ConversationWithQueries) -> Self {
        Self {
            id: c.conversation.id,
            title: c.conversation.title,
            query_count: c.queries.len(),
            last_query: c.queries.last().map(|q| q.content.clone()),
            created_at: c.conversation.created_at,
            updated_at: c.conversation.updated_at,
        }
    }
}

/// A response as shown to a rater: positional label, no model identity.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ResponseView {
    pub id: i32,
    /// "Model A", "Model B", ... by shuffled position.
    #[schema(example = "Model A")]
    pub label: String,
    pub position: usize,
    pub content: String,
    /// The caller's rank for this response.
    pub my_rank: Option<i32>,
    /// True model identity; present only for analytics viewers reading another
    /// user's conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QueryView {
    pub id: i32,
    pub content: String,
    pub status: QueryStatus,
    pub created_at: DateTime<Utc>,
    pub responses: Vec<ResponseView>,
    /// Every response in the group holds a rank from the caller.
    pub fully_ranked: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ConversationDetail {
    pub id: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub queries: Vec<QueryView>,
}
