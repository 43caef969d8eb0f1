use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One model's answer to a query. `model_name` is hidden from non-admin views.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "response")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub model_name: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub query_id: i32,
    #[sea_orm(belongs_to, from = "query_id", to = "id")]
    pub query: HasOne<super::query::Entity>,

    #[sea_orm(has_many)]
    pub ratings: HasMany<super::rating::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
