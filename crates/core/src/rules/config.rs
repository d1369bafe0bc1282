//! JSON rule-set configuration.
//!
//! Rule sets can be described by catalog rule names instead of being built
//! in code:
//!
//! ```json
//! { "trigger": "blur",
//!   "fields": { "phone": [ { "rule": "required", "label": "phone" },
//!                          { "rule": "phone_number" } ] } }
//! ```

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use super::catalog::{Catalog, RuleArgs, RuleOptions};
use super::{RuleDescriptor, RuleSet, Trigger, ValueType};
use crate::error::CoreError;

/// A whole rule set, field by field.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetConfig {
    /// Trigger hint applied to every rule; `null` for none.
    #[serde(default = "default_trigger")]
    pub trigger: Option<Trigger>,
    pub fields: IndexMap<String, Vec<RuleConfig>>,
}

fn default_trigger() -> Option<Trigger> {
    RuleOptions::default().trigger
}

/// One rule, named after its catalog builder or a custom shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleConfig {
    UserId(LabeledConfig),
    Account(LabeledConfig),
    Nickname(LabeledConfig),
    Required(LabeledConfig),
    PhoneNumber(LabeledConfig),
    Email(LabeledConfig),
    PhoneNumberOrEmail(LabeledConfig),
    Password(LabeledConfig),
    Captcha(LabeledConfig),
    IdNumber(LabeledConfig),
    Selected(LabeledConfig),
    Pattern { pattern: String, message: String },
    Type { value_type: ValueType, message: String },
    Length { len: usize, message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabeledConfig {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<&LabeledConfig> for RuleArgs {
    fn from(config: &LabeledConfig) -> Self {
        RuleArgs {
            label: config.label.clone(),
            message: config.message.clone(),
        }
    }
}

impl RuleConfig {
    /// Build the descriptor through `catalog`.
    pub fn build(&self, field: &str, catalog: &Catalog) -> Result<RuleDescriptor, CoreError> {
        let rule = match self {
            Self::UserId(c) => catalog.user_id(c.into()),
            Self::Account(c) => catalog.account(c.into()),
            Self::Nickname(c) => catalog.nickname(c.into()),
            Self::Required(c) => catalog.required(c.into()),
            Self::PhoneNumber(c) => catalog.phone_number(c.into()),
            Self::Email(c) => catalog.email(c.into()),
            Self::PhoneNumberOrEmail(c) => catalog.phone_number_or_email(c.into()),
            Self::Password(c) => catalog.password(c.into()),
            Self::Captcha(c) => catalog.captcha(c.into()),
            Self::IdNumber(c) => catalog.id_number(c.into()),
            Self::Selected(c) => catalog.selected(c.into()),
            Self::Pattern { pattern, message } => {
                let re = Regex::new(pattern).map_err(|e| CoreError::InvalidRule {
                    field: field.to_string(),
                    reason: format!("Invalid regex pattern: {e}"),
                })?;
                catalog.pattern(re, message.clone())
            }
            Self::Type {
                value_type,
                message,
            } => catalog.value_type(*value_type, message.clone()),
            Self::Length { len, message } => catalog.length(*len, message.clone()),
        };
        Ok(rule)
    }
}

impl RuleSet {
    /// Build a rule set from its JSON configuration.
    pub fn from_config(config: &RuleSetConfig) -> Result<RuleSet, CoreError> {
        let catalog = Catalog::new(RuleOptions {
            trigger: config.trigger,
        });
        let mut rules = RuleSet::new();
        for (field, entries) in &config.fields {
            let built = entries
                .iter()
                .map(|entry| entry.build(field, &catalog))
                .collect::<Result<Vec<_>, _>>()?;
            rules.insert(field.clone(), built);
        }
        Ok(rules)
    }

    /// Parse and build a rule set from a JSON string.
    pub fn from_json(json: &str) -> Result<RuleSet, CoreError> {
        let config: RuleSetConfig = serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Invalid rule set JSON: {e}")))?;
        Self::from_config(&config)
    }
}
