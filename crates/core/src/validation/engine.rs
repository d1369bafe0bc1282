//! Rule-evaluation engine.
//!
//! [`RuleEngine`] is the seam between the validation engine and whatever
//! evaluates rules. [`DescriptorEngine`] is the built-in implementation that
//! interprets [`RuleDescriptor`]s directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::{RuleContext, RuleDescriptor, RuleKind, RuleSet};
use crate::types::{is_empty_value, Model};

/// One failing rule, as reported by an engine pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The engine itself failed, as opposed to reporting validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineFault {
    #[error("malformed {rule} rule on field {field}: {reason}")]
    MalformedRule {
        field: String,
        rule: &'static str,
        reason: String,
    },

    #[error("{0}")]
    Backend(String),
}

/// Evaluates a rule set against a model.
///
/// Returns `Ok(None)` when nothing failed, otherwise the failures in
/// evaluation order (fields in rule-set order, rules in declaration order).
#[async_trait]
pub trait RuleEngine: Send + Sync {
    async fn evaluate(
        &self,
        rules: &RuleSet,
        model: &Model,
    ) -> Result<Option<Vec<ValidationError>>, EngineFault>;
}

// ---------------------------------------------------------------------------
// DescriptorEngine
// ---------------------------------------------------------------------------

/// Built-in engine interpreting [`RuleKind`]s.
///
/// Every failing rule of a field is reported; declarative rules skip empty
/// values and leave presence to [`RuleKind::Required`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorEngine;

#[async_trait]
impl RuleEngine for DescriptorEngine {
    async fn evaluate(
        &self,
        rules: &RuleSet,
        model: &Model,
    ) -> Result<Option<Vec<ValidationError>>, EngineFault> {
        let mut errors = Vec::new();

        for (field, field_rules) in rules.iter() {
            let value = model.get(field);
            let ctx = RuleContext { field, model };
            for rule in field_rules {
                if !evaluate_single_rule(rule, &ctx, value).await? {
                    errors.push(ValidationError::new(field, rule.message()));
                }
            }
        }

        Ok(if errors.is_empty() { None } else { Some(errors) })
    }
}

/// `Ok(true)` when the rule passes.
async fn evaluate_single_rule(
    rule: &RuleDescriptor,
    ctx: &RuleContext<'_>,
    value: Option<&Value>,
) -> Result<bool, EngineFault> {
    match rule.kind() {
        RuleKind::Required => Ok(evaluate_required(value)),
        RuleKind::Predicate(predicate) => {
            let value = value.unwrap_or(&Value::Null);
            Ok(predicate.check(ctx, value).await)
        }
        _ if is_empty_value(value) => Ok(true),
        RuleKind::Pattern(re) => match value {
            Some(Value::String(s)) => Ok(re.is_match(s)),
            Some(Value::Number(n)) => Ok(re.is_match(&n.to_string())),
            _ => Err(malformed(rule, ctx, "pattern needs a string or number value")),
        },
        RuleKind::Type(value_type) => Ok(value.is_some_and(|v| value_type.matches(v))),
        RuleKind::Length(len) => match value {
            Some(Value::String(s)) => Ok(s.chars().count() == *len),
            Some(Value::Array(items)) => Ok(items.len() == *len),
            Some(Value::Number(n)) => Ok(n.as_f64() == Some(*len as f64)),
            _ => Err(malformed(rule, ctx, "length needs a string, array or number value")),
        },
    }
}

fn evaluate_required(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        _ => true,
    }
}

fn malformed(rule: &RuleDescriptor, ctx: &RuleContext<'_>, reason: &str) -> EngineFault {
    EngineFault::MalformedRule {
        field: ctx.field.to_string(),
        rule: rule.kind().name(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::{Catalog, RuleArgs};
    use crate::rules::{Predicate, ValueType};
    use assert_matches::assert_matches;
    use regex::Regex;
    use serde_json::json;

    fn model(pairs: &[(&str, Value)]) -> Model {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn rule(kind: RuleKind, message: &str) -> RuleDescriptor {
        RuleDescriptor::new(kind, message)
    }

    #[tokio::test]
    async fn no_errors_is_none() {
        let rules = RuleSet::new().field("name", vec![rule(RuleKind::Required, "required")]);
        let result = DescriptorEngine
            .evaluate(&rules, &model(&[("name", json!("Alice"))]))
            .await
            .expect("evaluate");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn required_fails_on_empty_shapes() {
        let rules = RuleSet::new().field("f", vec![rule(RuleKind::Required, "required")]);
        for value in [json!(null), json!(""), json!([]), json!({})] {
            let errors = DescriptorEngine
                .evaluate(&rules, &model(&[("f", value)]))
                .await
                .expect("evaluate");
            assert_eq!(errors, Some(vec![ValidationError::new("f", "required")]));
        }
        let missing = DescriptorEngine
            .evaluate(&rules, &Model::new())
            .await
            .expect("evaluate");
        assert!(missing.is_some());
    }

    #[tokio::test]
    async fn reports_every_failure_in_order() {
        let rules = RuleSet::new()
            .field(
                "code",
                vec![
                    rule(RuleKind::Pattern(Regex::new(r"^\d+$").expect("regex")), "digits"),
                    rule(RuleKind::Length(6), "six"),
                ],
            )
            .field("mail", vec![rule(RuleKind::Type(ValueType::Email), "email")]);
        let errors = DescriptorEngine
            .evaluate(
                &rules,
                &model(&[("code", json!("ab")), ("mail", json!("nope"))]),
            )
            .await
            .expect("evaluate")
            .expect("errors");
        assert_eq!(
            errors,
            vec![
                ValidationError::new("code", "digits"),
                ValidationError::new("code", "six"),
                ValidationError::new("mail", "email"),
            ]
        );
    }

    #[tokio::test]
    async fn declarative_rules_skip_empty_values() {
        let rules = RuleSet::new().field(
            "mail",
            vec![
                rule(RuleKind::Type(ValueType::Email), "email"),
                rule(RuleKind::Length(3), "len"),
            ],
        );
        let result = DescriptorEngine
            .evaluate(&rules, &model(&[("mail", json!(""))]))
            .await
            .expect("evaluate");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn predicate_runs_on_missing_value() {
        let rules = RuleSet::new().field(
            "agree",
            vec![rule(
                RuleKind::Predicate(Predicate::sync(|_, v| v == &json!(true))),
                "must agree",
            )],
        );
        let errors = DescriptorEngine
            .evaluate(&rules, &Model::new())
            .await
            .expect("evaluate");
        assert_eq!(errors, Some(vec![ValidationError::new("agree", "must agree")]));
    }

    #[tokio::test]
    async fn predicate_sees_whole_model() {
        let rules = RuleSet::new().field(
            "confirm",
            vec![rule(
                RuleKind::Predicate(Predicate::sync(|ctx, v| ctx.model.get("password") == Some(v))),
                "mismatch",
            )],
        );
        let ok = DescriptorEngine
            .evaluate(
                &rules,
                &model(&[("password", json!("abc123")), ("confirm", json!("abc123"))]),
            )
            .await
            .expect("evaluate");
        assert!(ok.is_none());
    }

    #[tokio::test]
    async fn length_counts_characters() {
        let rules = RuleSet::new().field("code", vec![rule(RuleKind::Length(2), "len")]);
        let ok = DescriptorEngine
            .evaluate(&rules, &model(&[("code", json!("验证"))]))
            .await
            .expect("evaluate");
        assert!(ok.is_none());
    }

    #[tokio::test]
    async fn length_on_boolean_is_fault() {
        let rules = RuleSet::new().field("flag", vec![rule(RuleKind::Length(6), "len")]);
        let fault = DescriptorEngine
            .evaluate(&rules, &model(&[("flag", json!(true))]))
            .await
            .unwrap_err();
        assert_matches!(fault, EngineFault::MalformedRule { ref field, rule: "len", .. } if field == "flag");
    }

    #[tokio::test]
    async fn catalog_rules_through_engine() {
        let c = Catalog::default();
        let rules = RuleSet::new().field(
            "phone",
            vec![
                c.required(RuleArgs::label("phone")),
                c.phone_number(RuleArgs::default()),
            ],
        );
        let errors = DescriptorEngine
            .evaluate(&rules, &model(&[("phone", json!("12"))]))
            .await
            .expect("evaluate");
        assert_eq!(
            errors,
            Some(vec![ValidationError::new("phone", "Invalid phone number format")])
        );
    }

    #[tokio::test]
    async fn non_ascii_id_number_is_an_error_not_a_fault() {
        let c = Catalog::default();
        let rules = RuleSet::new().field("id", vec![c.id_number(RuleArgs::default())]);
        let errors = DescriptorEngine
            .evaluate(&rules, &model(&[("id", json!("110105194\u{0967}12310"))]))
            .await
            .expect("evaluate");
        assert_eq!(errors, Some(vec![ValidationError::new("id", "Invalid ID number")]));
    }
}
