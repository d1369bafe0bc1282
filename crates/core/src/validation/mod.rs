//! Asynchronous form validation.
//!
//! Provides the rule-engine seam, the live form state with its error-map
//! transitions, and the validator that ties them together.

pub mod engine;
pub mod form;
pub mod validator;
