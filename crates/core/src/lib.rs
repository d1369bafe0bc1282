//! Form-interaction core: rule catalog, rule evaluation and the
//! validation engine that reconciles per-field error state.
//!
//! - [`rules`]: immutable [`RuleDescriptor`](rules::RuleDescriptor)s, the
//!   builder [`Catalog`](rules::catalog::Catalog), the ID-number checksum and
//!   the JSON rule-set format.
//! - [`validation`]: the [`RuleEngine`](validation::engine::RuleEngine) seam,
//!   the live [`Form`](validation::form::Form) and the
//!   [`FormValidator`](validation::validator::FormValidator).

pub mod error;
pub mod rules;
pub mod types;
pub mod validation;

pub use error::CoreError;
pub use rules::catalog::{Catalog, RuleArgs, RuleOptions};
pub use rules::{RuleDescriptor, RuleKind, RuleSet, Trigger, ValueType};
pub use validation::engine::{DescriptorEngine, EngineFault, RuleEngine, ValidationError};
pub use validation::form::{ErrorMap, Form, FormSnapshot};
pub use validation::validator::{FaultPolicy, FormValidator, ValidationOutcome};
