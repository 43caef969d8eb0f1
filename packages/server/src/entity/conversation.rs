use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Title given to conversations created without one.
pub const DEFAULT_TITLE: &str = "New Conversation";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::profile::Entity>,

    #[sea_orm(has_many)]
    pub queries: HasMany<super::query::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
