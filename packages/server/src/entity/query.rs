use common::QueryStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A question submitted to every enabled model.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "query")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub status: QueryStatus,

    pub conversation_id: i32,
    #[sea_orm(belongs_to, from = "conversation_id", to = "id")]
    pub conversation: HasOne<super::conversation::Entity>,

    #[sea_orm(has_many)]
    pub responses: HasMany<super::response::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
