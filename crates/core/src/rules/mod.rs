//! Rule descriptors and rule sets.
//!
//! A [`RuleDescriptor`] is an immutable description of one constraint on one
//! field. The constraint itself is a tagged [`RuleKind`] so evaluators can
//! handle every shape exhaustively.

pub mod catalog;
pub mod config;
pub mod id_number;

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{ValidateEmail, ValidateUrl};

use crate::types::{FieldName, Model};

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// UI hint for when a rule should be re-checked.
///
/// The engine itself evaluates every rule regardless of its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Blur,
    Change,
    Submit,
}

impl Trigger {
    /// Stable string representation matching serde's `rename_all = "lowercase"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blur => "blur",
            Self::Change => "change",
            Self::Submit => "submit",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ValueType
// ---------------------------------------------------------------------------

/// Type tag for [`RuleKind::Type`] rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
    Email,
    Url,
}

impl ValueType {
    /// Whether `value` is of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.as_f64().is_some_and(|n| n.fract() == 0.0),
            Self::Float => value.as_f64().is_some_and(|n| n.fract() != 0.0),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Email => value.as_str().is_some_and(|s| s.validate_email()),
            Self::Url => value.as_str().is_some_and(|s| s.validate_url()),
        }
    }
}

// ---------------------------------------------------------------------------
// Predicate
// ---------------------------------------------------------------------------

/// What an embedded predicate sees besides the value under test.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub field: &'a str,
    pub model: &'a Model,
}

type SyncCheck = dyn Fn(&RuleContext<'_>, &Value) -> bool + Send + Sync;
type AsyncCheck = dyn Fn(&RuleContext<'_>, &Value) -> BoxFuture<'static, bool> + Send + Sync;

/// A check that cannot be expressed declaratively.
///
/// Async predicates receive borrowed arguments and must clone whatever the
/// returned future needs.
#[derive(Clone)]
pub enum Predicate {
    Sync(Arc<SyncCheck>),
    Async(Arc<AsyncCheck>),
}

impl Predicate {
    pub fn sync<F>(check: F) -> Self
    where
        F: Fn(&RuleContext<'_>, &Value) -> bool + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(check))
    }

    pub fn from_async<F>(check: F) -> Self
    where
        F: Fn(&RuleContext<'_>, &Value) -> BoxFuture<'static, bool> + Send + Sync + 'static,
    {
        Self::Async(Arc::new(check))
    }

    /// Run the predicate; `true` means the value passes.
    pub async fn check(&self, ctx: &RuleContext<'_>, value: &Value) -> bool {
        match self {
            Self::Sync(check) => check(ctx, value),
            Self::Async(check) => check(ctx, value).await,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Predicate::Sync(..)"),
            Self::Async(_) => f.write_str("Predicate::Async(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// RuleDescriptor
// ---------------------------------------------------------------------------

/// The constraint a rule applies.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// String value must match the pattern.
    Pattern(Regex),
    /// Value must be of the given type.
    Type(ValueType),
    /// Value must be present and non-empty.
    Required,
    /// Exact length: characters for strings, elements for arrays, value for numbers.
    Length(usize),
    /// Embedded check.
    Predicate(Predicate),
}

impl RuleKind {
    /// Short name used in logs and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pattern(_) => "pattern",
            Self::Type(_) => "type",
            Self::Required => "required",
            Self::Length(_) => "len",
            Self::Predicate(_) => "validator",
        }
    }
}

/// One immutable validation constraint for one field.
#[derive(Debug, Clone)]
pub struct RuleDescriptor {
    kind: RuleKind,
    message: String,
    trigger: Option<Trigger>,
}

impl RuleDescriptor {
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trigger: None,
        }
    }

    /// Attach a trigger hint (builder style, consumes the descriptor).
    pub fn with_trigger(mut self, trigger: Option<Trigger>) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trigger(&self) -> Option<Trigger> {
        self.trigger
    }
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// Ordered mapping of field name to its ordered rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: IndexMap<FieldName, Vec<RuleDescriptor>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the rules of a field, builder style.
    pub fn field(mut self, name: impl Into<FieldName>, rules: Vec<RuleDescriptor>) -> Self {
        self.insert(name, rules);
        self
    }

    pub fn insert(&mut self, name: impl Into<FieldName>, rules: Vec<RuleDescriptor>) {
        self.fields.insert(name.into(), rules);
    }

    pub fn get(&self, field: &str) -> Option<&[RuleDescriptor]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleDescriptor])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// The sub-set holding only `field`'s rules (empty if unknown).
    pub fn only(&self, field: &str) -> RuleSet {
        let mut fields = IndexMap::new();
        if let Some((name, rules)) = self.fields.get_key_value(field) {
            fields.insert(name.clone(), rules.clone());
        }
        RuleSet { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(FieldName, Vec<RuleDescriptor>)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (FieldName, Vec<RuleDescriptor>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
