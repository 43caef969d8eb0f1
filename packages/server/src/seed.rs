use common::Role;
use common::settings::{DEFAULT_MODELS, KNOWN_SETTINGS};
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::config::SeedConfig;
use crate::entity::{app_setting, enabled_model, profile, query, rating, response, system_prompt};
use crate::models::auth::{normalize_email, validate_email, validate_password};
use crate::utils::hash::hash_password;

const DEFAULT_SYSTEM_PROMPT_NAME: &str = "Default";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for students. Answer clearly and concisely.";

/// Seed the default model list, app settings and system prompt.
///
/// Existing rows are never overwritten.
pub async fn seed_defaults(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now();

    let mut models_inserted = 0u32;
    for model in DEFAULT_MODELS {
        let result = enabled_model::Entity::insert(enabled_model::ActiveModel {
            model_name: Set(model.model_name.to_string()),
            display_name: Set(model.display_name.to_string()),
            enabled: Set(true),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(enabled_model::Column::ModelName)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

        match result {
            Ok(n) if n > 0 => models_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }
    if models_inserted > 0 {
        info!("Seeded {} default models", models_inserted);
    }

    for def in KNOWN_SETTINGS {
        let result = app_setting::Entity::insert(app_setting::ActiveModel {
            key: Set(def.key.to_string()),
            value: Set((def.default)()),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(app_setting::Column::Key)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    let has_prompt = system_prompt::Entity::find()
        .filter(system_prompt::Column::IsActive.eq(true))
        .count(db)
        .await?
        > 0;
    if !has_prompt {
        system_prompt::ActiveModel {
            name: Set(DEFAULT_SYSTEM_PROMPT_NAME.to_string()),
            content: Set(DEFAULT_SYSTEM_PROMPT.to_string()),
            is_active: Set(true),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!("Seeded default system prompt");
    }

    Ok(())
}

/// Create the bootstrap admin account when configured and the email is unused.
pub async fn seed_admin(db: &DatabaseConnection, seed: &SeedConfig) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&seed.admin_email, &seed.admin_password) else {
        return Ok(());
    };

    let email = normalize_email(email);
    if validate_email(&email).is_err() || validate_password(password).is_err() {
        warn!("Seed admin credentials are invalid, skipping");
        return Ok(());
    }

    let exists = profile::Entity::find()
        .filter(profile::Column::Email.eq(email.as_str()))
        .count(db)
        .await?
        > 0;
    if exists {
        return Ok(());
    }

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("Password hash error: {e}"))?;
    profile::ActiveModel {
        email: Set(email.clone()),
        password: Set(hash),
        role: Set(Role::Admin),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(email = %email, "Seeded admin account");
    Ok(())
}

/// Ensure required database indexes exist.
///
/// Schema-sync only creates the indexes implied by keys, so lookup indexes
/// are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements = [
        (
            "idx_rating_created",
            Index::create()
                .if_not_exists()
                .name("idx_rating_created")
                .table(rating::Entity)
                .col(rating::Column::CreatedAt)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_response_query",
            Index::create()
                .if_not_exists()
                .name("idx_response_query")
                .table(response::Entity)
                .col(response::Column::QueryId)
                .to_string(PostgresQueryBuilder),
        ),
        (
            "idx_query_conversation_created",
            Index::create()
                .if_not_exists()
                .name("idx_query_conversation_created")
                .table(query::Entity)
                .col(query::Column::ConversationId)
                .col(query::Column::CreatedAt)
                .to_string(PostgresQueryBuilder),
        ),
    ];

    for (name, stmt) in statements {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
