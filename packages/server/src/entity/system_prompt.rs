use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_prompt")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// The active prompt is sent as the system message of every generation.
    pub is_active: bool,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
