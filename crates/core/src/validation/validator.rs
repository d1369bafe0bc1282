//! Validation engine: runs a rule engine over a form and reconciles the
//! result into the form's error map.

use std::sync::Arc;

use serde_json::Value;

use super::engine::{DescriptorEngine, RuleEngine, ValidationError};
use super::form::Form;
use crate::error::CoreError;
use crate::rules::RuleSet;
use crate::types::Model;

/// What to do when the rule engine itself fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Log the fault and leave the error map unchanged. The caller sees
    /// [`ValidationOutcome::Suppressed`], not an error.
    #[default]
    FailOpen,
    /// Return [`CoreError::EngineFault`]; the error map is still unchanged.
    Surface,
}

/// Result of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The pass was written to the error map.
    Reconciled {
        errors: Option<Vec<ValidationError>>,
    },
    /// The field has no rules; nothing was evaluated or written.
    Skipped,
    /// A newer pass of the same scope started first; nothing was written.
    Superseded,
    /// The engine faulted and [`FaultPolicy::FailOpen`] swallowed it.
    Suppressed,
}

/// Runs validation passes against [`Form`]s.
#[derive(Clone)]
pub struct FormValidator {
    engine: Arc<dyn RuleEngine>,
    policy: FaultPolicy,
}

impl Default for FormValidator {
    fn default() -> Self {
        Self::new(DescriptorEngine)
    }
}

impl FormValidator {
    pub fn new(engine: impl RuleEngine + 'static) -> Self {
        Self::with_engine(Arc::new(engine))
    }

    pub fn with_engine(engine: Arc<dyn RuleEngine>) -> Self {
        Self {
            engine,
            policy: FaultPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FaultPolicy {
        self.policy
    }

    /// Validate one field (`Some`) or the whole form (`None`).
    pub async fn validate(
        &self,
        form: &Form,
        field: Option<&str>,
    ) -> Result<ValidationOutcome, CoreError> {
        self.validate_with(form, field, |_, _, _| {}).await
    }

    /// Like [`validate`](Self::validate), then hands the raw engine errors,
    /// the evaluated model and the rules to `callback`.
    ///
    /// The callback runs after every pass that reached reconciliation,
    /// superseded or not. It never runs after an engine fault.
    pub async fn validate_with<F>(
        &self,
        form: &Form,
        field: Option<&str>,
        callback: F,
    ) -> Result<ValidationOutcome, CoreError>
    where
        F: FnOnce(Option<&[ValidationError]>, &Model, &RuleSet),
    {
        let scoped;
        let rules: &RuleSet = match field {
            Some(name) if !form.rules().contains(name) => {
                tracing::debug!(field = name, "No rules for field, skipping validation");
                return Ok(ValidationOutcome::Skipped);
            }
            Some(name) => {
                scoped = form.rules().only(name);
                &scoped
            }
            None => form.rules(),
        };

        let ticket = form.issue_ticket(field);
        let model = form.model();

        let errors = match self.engine.evaluate(rules, &model).await {
            Ok(errors) => errors,
            Err(fault) => match self.policy {
                FaultPolicy::FailOpen => {
                    tracing::warn!(
                        field = field.unwrap_or("*"),
                        error = %fault,
                        "Rule engine fault suppressed (fail-open)",
                    );
                    return Ok(ValidationOutcome::Suppressed);
                }
                FaultPolicy::Surface => return Err(fault.into()),
            },
        };

        let applied = form.reconcile(field, ticket, errors.as_deref());
        tracing::debug!(
            field = field.unwrap_or("*"),
            error_count = errors.as_ref().map_or(0, Vec::len),
            applied,
            "Validation pass finished",
        );

        callback(errors.as_deref(), &model, form.rules());

        if applied {
            Ok(ValidationOutcome::Reconciled { errors })
        } else {
            Ok(ValidationOutcome::Superseded)
        }
    }

    /// Empty `field` in the model, then re-validate just that field.
    pub async fn clear_input(
        &self,
        form: &Form,
        field: &str,
    ) -> Result<ValidationOutcome, CoreError> {
        form.set_value(field, Value::String(String::new()));
        self.validate(form, Some(field)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::{Catalog, RuleArgs};
    use crate::validation::engine::EngineFault;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;

    struct FaultyEngine;

    #[async_trait]
    impl RuleEngine for FaultyEngine {
        async fn evaluate(
            &self,
            _rules: &RuleSet,
            _model: &Model,
        ) -> Result<Option<Vec<ValidationError>>, EngineFault> {
            Err(EngineFault::Backend("boom".to_string()))
        }
    }

    fn signup_form() -> Form {
        let c = Catalog::default();
        let rules = RuleSet::new()
            .field("name", vec![c.required(RuleArgs::label("name"))])
            .field(
                "phone",
                vec![
                    c.required(RuleArgs::label("phone")),
                    c.phone_number(RuleArgs::default()),
                ],
            );
        let model: Model = [
            ("name".to_string(), json!("")),
            ("phone".to_string(), json!("12")),
        ]
        .into_iter()
        .collect();
        Form::new(rules, model)
    }

    #[tokio::test]
    async fn whole_form_pass_fills_errors() {
        let form = signup_form();
        let outcome = FormValidator::default()
            .validate(&form, None)
            .await
            .expect("validate");
        assert_matches!(outcome, ValidationOutcome::Reconciled { errors: Some(ref e) } if e.len() == 2);
        assert_eq!(form.error("name").as_deref(), Some("Please enter name"));
        assert_eq!(
            form.error("phone").as_deref(),
            Some("Invalid phone number format")
        );
    }

    #[tokio::test]
    async fn field_pass_leaves_siblings() {
        let form = signup_form();
        let validator = FormValidator::default();
        validator.validate(&form, None).await.expect("validate");

        form.set_value("phone", "138 1234 5678");
        validator
            .validate(&form, Some("phone"))
            .await
            .expect("validate");

        assert_eq!(form.error("phone").as_deref(), Some(""));
        assert_eq!(form.error("name").as_deref(), Some("Please enter name"));
    }

    #[tokio::test]
    async fn unknown_field_is_skipped() {
        let form = signup_form();
        let before = form.errors();
        let outcome = FormValidator::default()
            .validate(&form, Some("ghost"))
            .await
            .expect("validate");
        assert_eq!(outcome, ValidationOutcome::Skipped);
        assert_eq!(form.errors(), before);
        assert!(form.errors().get("ghost").is_none());
    }

    #[tokio::test]
    async fn callback_receives_raw_errors() {
        let form = signup_form();
        let mut seen = None;
        FormValidator::default()
            .validate_with(&form, None, |errors, model, rules| {
                seen = Some((
                    errors.map(<[ValidationError]>::to_vec),
                    model.len(),
                    rules.len(),
                ));
            })
            .await
            .expect("validate");
        let (errors, model_len, rules_len) = seen.expect("callback ran");
        assert_eq!(errors.map(|e| e.len()), Some(2));
        assert_eq!(model_len, 2);
        assert_eq!(rules_len, 2);
    }

    #[tokio::test]
    async fn fail_open_suppresses_fault() {
        let form = signup_form();
        let before = form.errors();
        let mut called = false;
        let outcome = FormValidator::new(FaultyEngine)
            .validate_with(&form, None, |_, _, _| called = true)
            .await
            .expect("fault suppressed");
        assert_eq!(outcome, ValidationOutcome::Suppressed);
        assert!(!called);
        assert_eq!(form.errors(), before);
    }

    #[tokio::test]
    async fn surface_policy_returns_fault() {
        let form = signup_form();
        let before = form.errors();
        let result = FormValidator::new(FaultyEngine)
            .with_policy(FaultPolicy::Surface)
            .validate(&form, Some("name"))
            .await;
        assert_matches!(result, Err(CoreError::EngineFault(EngineFault::Backend(_))));
        assert_eq!(form.errors(), before);
    }

    #[tokio::test]
    async fn clear_input_empties_and_revalidates() {
        let form = signup_form();
        form.set_value("name", "Alice");
        let validator = FormValidator::default();
        validator.validate(&form, None).await.expect("validate");
        assert_eq!(form.error("name").as_deref(), Some(""));

        validator
            .clear_input(&form, "name")
            .await
            .expect("clear input");
        assert_eq!(form.value("name"), Some(json!("")));
        assert_eq!(form.error("name").as_deref(), Some("Please enter name"));
        assert_eq!(
            form.error("phone").as_deref(),
            Some("Invalid phone number format")
        );
    }
}
