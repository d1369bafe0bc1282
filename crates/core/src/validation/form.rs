//! Live form state and the error-map transitions applied to it.
//!
//! A [`Form`] owns the current [`FormSnapshot`] (model plus error map) and
//! publishes every change through a `tokio::sync::watch` channel. The error
//! map is only ever replaced through the pure copy-on-write transitions on
//! [`ErrorMap`], applied by the validation engine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use super::engine::ValidationError;
use crate::rules::RuleSet;
use crate::types::{FieldName, Model};

// ---------------------------------------------------------------------------
// ErrorMap
// ---------------------------------------------------------------------------

/// Field name to current error message (`""` when the field is valid).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap {
    entries: IndexMap<FieldName, String>,
}

impl ErrorMap {
    /// One empty entry per rule field, in rule-set order.
    pub fn for_rules(rules: &RuleSet) -> Self {
        Self {
            entries: rules
                .field_names()
                .map(|name| (name.to_string(), String::new()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(String::as_str)
    }

    /// Whether any entry holds a message.
    pub fn has_errors(&self) -> bool {
        self.entries.values().any(|m| !m.is_empty())
    }

    /// First failing field in declaration order, with its message.
    pub fn first_error(&self) -> Option<(&str, &str)> {
        self.iter().find(|(_, message)| !message.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field-scoped transition: only `field` changes, set to its first
    /// reported message or `""`.
    pub fn with_field_result(&self, field: &str, errors: Option<&[ValidationError]>) -> ErrorMap {
        let message = errors
            .and_then(|errors| errors.iter().find(|e| e.field == field))
            .map(|e| e.message.clone())
            .unwrap_or_default();

        let mut next = self.clone();
        next.entries.insert(field.to_string(), message);
        next
    }

    /// Whole-form transition: every entry is cleared, then each field takes
    /// the first message reported for it. Later errors for a field that
    /// already failed are discarded, as are errors for unknown fields.
    pub fn reconciled(&self, errors: Option<&[ValidationError]>) -> ErrorMap {
        let mut next = self.clone();
        for message in next.entries.values_mut() {
            message.clear();
        }

        for error in errors.unwrap_or_default() {
            if let Some(message) = next.entries.get_mut(&error.field) {
                if message.is_empty() {
                    message.clone_from(&error.message);
                }
            }
        }
        next
    }
}

// ---------------------------------------------------------------------------
// FormSnapshot
// ---------------------------------------------------------------------------

/// Immutable view of a form at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub model: Model,
    pub errors: ErrorMap,
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// Scope of a validation pass: the whole form, or one field.
type Scope = Option<FieldName>;

#[derive(Debug, Default)]
struct Tickets {
    next: u64,
    latest: HashMap<Scope, u64>,
}

/// A live form: read-only rules plus the current snapshot.
///
/// All writes go through the snapshot channel, so each form has a single
/// writer at a time and subscribers always see whole transitions.
#[derive(Debug)]
pub struct Form {
    rules: Arc<RuleSet>,
    state: watch::Sender<FormSnapshot>,
    tickets: Mutex<Tickets>,
}

impl Form {
    pub fn new(rules: RuleSet, model: Model) -> Self {
        Self::with_shared_rules(Arc::new(rules), model)
    }

    /// Build a form over a rule set shared with other forms.
    pub fn with_shared_rules(rules: Arc<RuleSet>, model: Model) -> Self {
        let errors = ErrorMap::for_rules(&rules);
        let (state, _) = watch::channel(FormSnapshot { model, errors });
        Self {
            rules,
            state,
            tickets: Mutex::new(Tickets::default()),
        }
    }

    pub fn rules(&self) -> &Arc<RuleSet> {
        &self.rules
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.state.borrow().clone()
    }

    pub fn model(&self) -> Model {
        self.state.borrow().model.clone()
    }

    pub fn errors(&self) -> ErrorMap {
        self.state.borrow().errors.clone()
    }

    pub fn value(&self, field: &str) -> Option<Value> {
        self.state.borrow().model.get(field).cloned()
    }

    pub fn error(&self, field: &str) -> Option<String> {
        self.state.borrow().errors.get(field).map(str::to_string)
    }

    /// Set one model value. Errors are left alone until the next pass.
    pub fn set_value(&self, field: impl Into<FieldName>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        self.state.send_modify(|snapshot| {
            snapshot.model.insert(field, value);
        });
    }

    /// Replace the whole model.
    pub fn set_model(&self, model: Model) {
        self.state.send_modify(|snapshot| snapshot.model = model);
    }

    /// Receive every future snapshot.
    pub fn subscribe(&self) -> watch::Receiver<FormSnapshot> {
        self.state.subscribe()
    }

    /// Start a pass for `scope`, superseding any earlier pass of that scope.
    pub(crate) fn issue_ticket(&self, field: Option<&str>) -> u64 {
        let mut tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);
        tickets.next += 1;
        let ticket = tickets.next;
        tickets.latest.insert(field.map(str::to_string), ticket);
        ticket
    }

    /// Apply a finished pass. Returns `false` when a newer pass of the same
    /// scope has started since `ticket` was issued.
    pub(crate) fn reconcile(
        &self,
        field: Option<&str>,
        ticket: u64,
        errors: Option<&[ValidationError]>,
    ) -> bool {
        let tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);
        let scope = field.map(str::to_string);
        if tickets.latest.get(&scope) != Some(&ticket) {
            return false;
        }

        self.state.send_if_modified(|snapshot| {
            let next = match field {
                Some(field) => snapshot.errors.with_field_result(field, errors),
                None => snapshot.errors.reconciled(errors),
            };
            if next == snapshot.errors {
                false
            } else {
                snapshot.errors = next;
                true
            }
        });
        true
    }
}
