use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use formkit_core::types::Model;
use formkit_core::{ErrorMap, FaultPolicy, Form, FormValidator, RuleSet, ValidationOutcome};

pub struct ValidateArgs<'a> {
    pub rules: &'a Path,
    pub model: &'a Path,
    pub field: Option<&'a str>,
    pub surface_faults: bool,
}

/// Print the resulting error map. Exits non-zero when any field failed.
pub async fn validate(args: ValidateArgs<'_>) -> anyhow::Result<ExitCode> {
    let errors = run(&args).await?;
    println!("{}", serde_json::to_string_pretty(&errors)?);

    Ok(if errors.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run(args: &ValidateArgs<'_>) -> anyhow::Result<ErrorMap> {
    let rules_json = tokio::fs::read_to_string(args.rules)
        .await
        .with_context(|| format!("reading rules from {}", args.rules.display()))?;
    let model_json = tokio::fs::read_to_string(args.model)
        .await
        .with_context(|| format!("reading model from {}", args.model.display()))?;

    let rules = RuleSet::from_json(&rules_json)?;
    let model: Model = serde_json::from_str(&model_json)
        .with_context(|| format!("{} is not a JSON object", args.model.display()))?;

    let policy = if args.surface_faults {
        FaultPolicy::Surface
    } else {
        FaultPolicy::FailOpen
    };

    let form = Form::new(rules, model);
    let outcome = FormValidator::default()
        .with_policy(policy)
        .validate(&form, args.field)
        .await?;

    match outcome {
        ValidationOutcome::Skipped => {
            tracing::warn!(field = args.field.unwrap_or("*"), "Field has no rules")
        }
        ValidationOutcome::Suppressed => {
            tracing::warn!("Rule engine fault ignored, errors left unchanged")
        }
        _ => {}
    }

    Ok(form.errors())
}
