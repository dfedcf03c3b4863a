//! Code emitter.
//!
//! [`plan`] lowers a [`ValidatedRuleSet`] into a list of typed [`Directive`]s
//! per artifact; [`writer::render`] is the only place that knows the literal
//! preprocessor layout.

pub mod writer;

use crate::error::Result;
use crate::model::{FeatureName, ValidatedRuleSet};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// `asctime(3)` layout, e.g. `Sun Oct 18 09:05:00 2026`.
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Target of an `#include`; `<...>` marks a system include.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct IncludePath {
    pub path: String,
    pub system: bool,
}

impl IncludePath {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')).map_or_else(
            || Self { path: raw.trim_matches('"').to_owned(), system: false },
            |inner| Self { path: inner.to_owned(), system: true },
        )
    }
}

impl From<String> for IncludePath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl fmt::Display for IncludePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.system { write!(f, "<{}>", self.path) } else { write!(f, "\"{}\"", self.path) }
    }
}

/// Everything about the output that does not come from the definitions file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Generator name shown in the banner.
    pub generator: String,
    /// Generation time shown in the banner; `None` omits the line.
    pub timestamp: Option<DateTime<Utc>>,
    /// Definitions file name users are told to edit instead.
    pub definitions: String,
    pub guard: String,
    pub build_config: IncludePath,
    pub user_config: Option<IncludePath>,
    pub config_header: IncludePath,
    pub table: String,
    pub count: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            generator: "featurec".to_owned(),
            timestamp: None,
            definitions: "features.def".to_owned(),
            guard: "FEATURECONFIG_HPP".to_owned(),
            build_config: IncludePath::parse("<cmake_config.hpp>"),
            user_config: Some(IncludePath::parse("myconfig-final.hpp")),
            config_header: IncludePath::parse("config.hpp"),
            table: "FEATURES".to_owned(),
            count: "NUM_FEATURES".to_owned(),
        }
    }
}

/// One unit of generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Banner { generator: String, timestamp: Option<String>, definitions: String },
    IncludeGuardBegin(String),
    IncludeGuardEnd(String),
    Section(&'static str),
    Include(IncludePath),
    /// Drops any definition of an external made outside the build system.
    UndefGuard(FeatureName),
    ImplicationBlock { antecedent: FeatureName, consequent: FeatureName },
    DerivationBlock { feature: FeatureName, human: String, rendered: String },
    RequirementBlock { feature: FeatureName, human: String, rendered: String },
    /// `extern` declarations of the name table and its length.
    NameTableDecl { table: String, count: String },
    NameTableBegin { table: String },
    NameTableEntry(FeatureName),
    NameTableEnd { table: String, count: String },
}

/// The directive lists of both artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub header: Vec<Directive>,
    pub source: Vec<Directive>,
}

/// Rendered artifact text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub header: String,
    pub source: String,
}

impl Plan {
    /// # Errors
    /// Returns an error only if formatting into memory fails.
    pub fn render(&self) -> Result<Artifacts> {
        Ok(Artifacts {
            header: writer::render(&self.header)?,
            source: writer::render(&self.source)?,
        })
    }
}

/// Lowers a validated rule set into both artifacts' directives.
#[must_use]
pub fn plan(rules: &ValidatedRuleSet, options: &EmitOptions) -> Plan {
    Plan { header: plan_header(rules, options), source: plan_source(rules, options) }
}

fn banner(options: &EmitOptions) -> Directive {
    Directive::Banner {
        generator: options.generator.clone(),
        timestamp: options.timestamp.map(|t| t.format(ASCTIME).to_string()),
        definitions: options.definitions.clone(),
    }
}

fn plan_header(rules: &ValidatedRuleSet, options: &EmitOptions) -> Vec<Directive> {
    let mut out = vec![
        banner(options),
        Directive::IncludeGuardBegin(options.guard.clone()),
        Directive::Include(options.build_config.clone()),
    ];
    out.extend(options.user_config.iter().cloned().map(Directive::Include));

    out.push(Directive::Section("Guards for externals"));
    out.extend(rules.externals().iter().cloned().map(Directive::UndefGuard));

    out.push(Directive::Section("Definitions from the build system"));
    out.push(Directive::Include(options.build_config.clone()));

    out.push(Directive::Section("Handle implications"));
    out.extend(rules.implications().iter().map(|rule| Directive::ImplicationBlock {
        antecedent: rule.antecedent.clone(),
        consequent: rule.consequent.clone(),
    }));

    out.push(Directive::Section("Warn when derived switches are specified manually"));
    out.extend(rules.derivations().iter().map(|rule| Directive::DerivationBlock {
        feature: rule.feature.clone(),
        human: rule.expr.human.clone(),
        rendered: rule.expr.rendered.clone(),
    }));

    out.push(Directive::NameTableDecl { table: options.table.clone(), count: options.count.clone() });
    out.push(Directive::IncludeGuardEnd(options.guard.clone()));
    out
}

fn plan_source(rules: &ValidatedRuleSet, options: &EmitOptions) -> Vec<Directive> {
    let mut out = vec![banner(options), Directive::Include(options.config_header.clone())];

    out.push(Directive::Section("Handle requirements"));
    out.extend(rules.requirements().iter().map(|rule| Directive::RequirementBlock {
        feature: rule.feature.clone(),
        human: rule.expr.human.clone(),
        rendered: rule.expr.rendered.clone(),
    }));

    out.push(Directive::Section("Feature list"));
    out.push(Directive::NameTableBegin { table: options.table.clone() });
    out.extend(rules.features().cloned().map(Directive::NameTableEntry));
    out.push(Directive::NameTableEnd { table: options.table.clone(), count: options.count.clone() });
    out
}
