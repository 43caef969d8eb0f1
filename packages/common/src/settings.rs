use serde::Serialize;
use serde_json::Value;

/// When true, a new question is refused until the latest response group is fully ranked.
pub const REQUIRE_RATING_BEFORE_NEXT_MESSAGE: &str = "require_rating_before_next_message";

/// Expected JSON type of a setting value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
}

/// A known application setting.
#[derive(Clone, Copy, Debug)]
pub struct SettingDef {
    pub key: &'static str,
    pub kind: SettingKind,
    pub default: fn() -> Value,
    pub description: &'static str,
}

pub const KNOWN_SETTINGS: &[SettingDef] = &[SettingDef {
    key: REQUIRE_RATING_BEFORE_NEXT_MESSAGE,
    kind: SettingKind::Bool,
    default: || Value::Bool(false),
    description: "Block new questions until every response to the latest one is ranked",
}];

pub fn find_setting(key: &str) -> Option<&'static SettingDef> {
    KNOWN_SETTINGS.iter().find(|def| def.key == key)
}

impl SettingDef {
    /// Check that `value` has the JSON type this setting expects.
    pub fn accepts(&self, value: &Value) -> bool {
        match self.kind {
            SettingKind::Bool => value.is_boolean(),
        }
    }
}

/// A model answering new questions when the enabled-model table is empty or unreachable.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DefaultModel {
    pub model_name: &'static str,
    pub display_name: &'static str,
}

pub const DEFAULT_MODELS: &[DefaultModel] = &[
    DefaultModel {
        model_name: "openai/gpt-4o-mini",
        display_name: "GPT-4o mini",
    },
    DefaultModel {
        model_name: "anthropic/claude-3.5-haiku",
        display_name: "Claude 3.5 Haiku",
    },
    DefaultModel {
        model_name: "google/gemini-flash-1.5",
        display_name: "Gemini 1.5 Flash",
    },
];
