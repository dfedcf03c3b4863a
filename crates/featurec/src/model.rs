//! Rule-set data model shared by the parser, the engine and the emitter.

use std::borrow::Borrow;
use std::fmt;
use strum_macros::{AsRefStr, Display};

/// A feature identifier: `[A-Z_][A-Z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureName(String);

impl FeatureName {
    /// Returns `Some` if `raw` is a well-formed feature identifier.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        Self::is_valid(raw).then(|| Self(raw.to_owned()))
    }

    /// Checks the identifier grammar without allocating.
    #[must_use]
    pub fn is_valid(raw: &str) -> bool {
        let mut chars = raw.chars();
        chars.next().is_some_and(|c| c.is_ascii_uppercase() || c == '_')
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FeatureName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FeatureName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Who controls the value of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum FeatureKind {
    /// Set by the surrounding build system only.
    External,
    /// A plain switch the user may set.
    Basic,
    /// Computed from other features, never set directly.
    Derived,
}

/// A conditional expression attached to a derivation or requirement.
///
/// The expression is never evaluated here. `human` is the text as written
/// (whitespace collapsed), `rendered` is ready to be pasted into `#if`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub human: String,
    pub rendered: String,
    /// Referenced feature names, in order of first appearance.
    pub references: Vec<FeatureName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: FeatureName,
    pub kind: FeatureKind,
    pub line: usize,
}

/// If `antecedent` is defined, `consequent` must become defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicationRule {
    pub antecedent: FeatureName,
    pub consequent: FeatureName,
    pub line: usize,
}

/// `feature` is defined automatically whenever `expr` holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationRule {
    pub feature: FeatureName,
    pub expr: Expr,
    pub line: usize,
}

/// If `feature` is defined, `expr` must hold or the application build fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementRule {
    pub feature: FeatureName,
    pub expr: Expr,
    pub line: usize,
}

/// Everything a definitions document declares, exactly as written.
///
/// Nothing here has been checked beyond syntax; see [`crate::engine::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub declarations: Vec<Declaration>,
    pub implications: Vec<ImplicationRule>,
    pub derivations: Vec<DerivationRule>,
    pub requirements: Vec<RequirementRule>,
}

/// A rule set that passed every consistency check, with rules in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRuleSet {
    pub(crate) externals: Vec<FeatureName>,
    pub(crate) basics: Vec<FeatureName>,
    pub(crate) derived: Vec<FeatureName>,
    pub(crate) implications: Vec<ImplicationRule>,
    pub(crate) derivations: Vec<DerivationRule>,
    pub(crate) requirements: Vec<RequirementRule>,
}

impl ValidatedRuleSet {
    #[must_use]
    pub fn externals(&self) -> &[FeatureName] {
        &self.externals
    }

    #[must_use]
    pub fn basics(&self) -> &[FeatureName] {
        &self.basics
    }

    #[must_use]
    pub fn derived(&self) -> &[FeatureName] {
        &self.derived
    }

    /// Implications in topological order of their antecedents.
    #[must_use]
    pub fn implications(&self) -> &[ImplicationRule] {
        &self.implications
    }

    /// Derivations in topological order of the derived features.
    #[must_use]
    pub fn derivations(&self) -> &[DerivationRule] {
        &self.derivations
    }

    #[must_use]
    pub fn requirements(&self) -> &[RequirementRule] {
        &self.requirements
    }

    /// Every feature: externals, then basics, then derived, each in declaration order.
    pub fn features(&self) -> impl Iterator<Item = &FeatureName> {
        self.externals.iter().chain(&self.basics).chain(&self.derived)
    }
}
