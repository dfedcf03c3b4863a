use crate::model::{FeatureKind, FeatureName};
use std::borrow::Cow;
use std::fmt;
use strum_macros::Display;

/// Why a definitions line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SyntaxReason {
    #[strum(to_string = "invalid feature name")]
    InvalidName,
    #[strum(to_string = "unexpected token")]
    UnexpectedToken,
    #[strum(to_string = "expected a feature name")]
    ExpectedName,
    #[strum(to_string = "expected an expression")]
    ExpectedExpression,
    #[strum(to_string = "expected an operand")]
    ExpectedOperand,
    #[strum(to_string = "expected an operator")]
    ExpectedOperator,
    #[strum(to_string = "unbalanced parenthesis")]
    UnbalancedParen,
    #[strum(to_string = "unterminated block comment")]
    UnterminatedComment,
}

/// A single syntax error in a definitions document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {reason} at `{token}`")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    /// The offending token, or `end of line`.
    pub token: String,
    pub reason: SyntaxReason,
}

impl ParseError {
    pub(crate) fn new(line: usize, token: impl Into<String>, reason: SyntaxReason) -> Self {
        Self { line, token: token.into(), reason }
    }
}

/// Every syntax error found in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors(pub(crate) Vec<ParseError>);

impl ParseErrors {
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.0
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} syntax error(s) in feature definitions:", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

/// The rule kind an unresolved reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RuleKind {
    Implication,
    Derivation,
    Requirement,
}

/// A feature used in a role its kind forbids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    ExternalDerived,
    ImpliedExternal { by: FeatureName },
    ImpliedDerived { by: FeatureName },
    DerivedAntecedent { implies: FeatureName },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExternalDerived => f.write_str("is external and cannot also be derived"),
            Self::ImpliedExternal { by } => {
                write!(f, "is external and cannot be implied by `{by}`")
            },
            Self::ImpliedDerived { by } => write!(f, "is derived and cannot be implied by `{by}`"),
            Self::DerivedAntecedent { implies } => {
                write!(f, "is derived and cannot imply `{implies}`")
            },
        }
    }
}

/// A structural problem found by the consistency engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("line {line}: `{name}` declared as {kind} is already declared as {first_kind} on line {first_line}")]
    Duplicate {
        name: FeatureName,
        kind: FeatureKind,
        line: usize,
        first_kind: FeatureKind,
        first_line: usize,
    },

    #[error("line {line}: {rule} references undeclared feature `{name}`")]
    Unresolved { name: FeatureName, rule: RuleKind, line: usize },

    #[error("line {line}: `{name}` {conflict}")]
    KindConflict { name: FeatureName, conflict: Conflict, line: usize },

    #[error("dependency cycle between {}", join_names(members))]
    Cycle { members: Vec<FeatureName> },
}

impl Violation {
    /// The feature names this violation is about.
    #[must_use]
    pub fn names(&self) -> Vec<&FeatureName> {
        match self {
            Self::Duplicate { name, .. }
            | Self::Unresolved { name, .. }
            | Self::KindConflict { name, .. } => vec![name],
            Self::Cycle { members } => members.iter().collect(),
        }
    }
}

fn join_names(names: &[FeatureName]) -> String {
    names.iter().map(FeatureName::as_str).collect::<Vec<_>>().join(", ")
}

/// Every violation found while validating one rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub(crate) violations: Vec<Violation>,
}

impl ValidationError {
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) in feature definitions:", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors that abort a generator run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("I/O error{}: {source}", format_context(context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error(transparent)]
    Parse(#[from] ParseErrors),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Internal generator error{}: {message}", format_context(context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<std::io::Error> for GenerateError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, context: None }
    }
}

impl From<fmt::Error> for GenerateError {
    fn from(_: fmt::Error) -> Self {
        Self::Internal { message: "failed to format generated text".into(), context: None }
    }
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;

/// Attaches a human-readable context to generator errors.
pub trait GenerateErrorExt<T> {
    /// # Errors
    /// Returns the original error, wrapped as [`GenerateError`] with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T>;
}

impl<T> GenerateErrorExt<T> for Result<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                GenerateError::Io { context: c, .. } | GenerateError::Internal { context: c, .. } => {
                    *c = Some(context.into());
                },
                GenerateError::Parse(_) | GenerateError::Validation(_) => {},
            }
            e
        })
    }
}

impl<T> GenerateErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| GenerateError::Io { source, context: Some(context.into()) })
    }
}

pub(crate) fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
