#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission to own conversations, submit questions and rank responses.
pub const PERM_CONVERSATION_USE: &str = "conversation:use";
/// Permission to read de-anonymized ratings and aggregate analytics.
pub const PERM_ANALYTICS_VIEW: &str = "analytics:view";
/// Permission to change enabled models, app settings and the system prompt.
pub const PERM_SETTINGS_MANAGE: &str = "settings:manage";
/// Permission to list users and change their roles.
pub const PERM_USER_MANAGE: &str = "user:manage";

/// Role of a user profile.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Default role for newly registered users.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "student"))]
    Student,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "instructor"))]
    Instructor,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "admin"))]
    Admin,
}

impl Role {
    pub const ALL: &'static [Role] = &[Self::Student, Self::Instructor, Self::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }

    /// Permissions granted to this role. Embedded into issued tokens.
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Self::Student => &[PERM_CONVERSATION_USE],
            Self::Instructor => &[PERM_CONVERSATION_USE, PERM_ANALYTICS_VIEW],
            Self::Admin => &[
                PERM_CONVERSATION_USE,
                PERM_ANALYTICS_VIEW,
                PERM_SETTINGS_MANAGE,
                PERM_USER_MANAGE,
            ],
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid role '{}'. Valid values: {}",
            self.invalid,
            Role::ALL
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError {
                invalid: s.to_string(),
            }),
        }
    }
}
