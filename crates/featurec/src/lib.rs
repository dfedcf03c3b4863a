//! # featurec
//!
//! A build-time feature-flag compiler. It reads a definitions file of
//! compile-time switches and emits two artifacts every translation unit of the
//! host application builds against:
//!
//! * a guard header that neutralizes hand-set externals, propagates
//!   implications in one linear preprocessor pass and derives computed flags;
//! * a validation/reflection source unit that fails the application build on
//!   unmet requirements and lists the enabled features at runtime.
//!
//! ```text
//! definitions ──parse──▶ RuleSet ──validate──▶ ValidatedRuleSet ──plan──▶ [Directive] ──render──▶ text
//! ```
//!
//! ## Example
//!
//! ```rust
//! use featurec::{EmitOptions, compile};
//!
//! let artifacts = compile("A\nB\nA implies B\n", &EmitOptions::default()).unwrap();
//! assert!(artifacts.header.contains("#if defined(A) && !defined(B)"));
//! assert!(artifacts.source.contains("\"B\","));
//! ```

pub mod config;
pub mod emit;
pub mod engine;
pub mod error;
mod expr;
mod graph;
pub mod model;
pub mod output;
pub mod parser;

pub use crate::emit::{Artifacts, Directive, EmitOptions, IncludePath, Plan};
pub use crate::error::{GenerateError, GenerateErrorExt, ParseErrors, ValidationError, Violation};
pub use crate::model::{FeatureKind, FeatureName, RuleSet, ValidatedRuleSet};

/// Parses, validates and renders a definitions document without touching the filesystem.
///
/// # Errors
/// Returns [`GenerateError::Parse`] or [`GenerateError::Validation`] carrying
/// every problem found in the document.
pub fn compile(text: &str, options: &EmitOptions) -> error::Result<Artifacts> {
    let rules = parser::parse(text)?;
    let validated = engine::validate(rules)?;
    emit::plan(&validated, options).render()
}
