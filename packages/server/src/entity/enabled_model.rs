use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enabled_model")]
pub struct Model {
    /// Upstream model identifier, e.g. `openai/gpt-4o-mini`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub model_name: String,
    pub display_name: String,
    pub enabled: bool,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
