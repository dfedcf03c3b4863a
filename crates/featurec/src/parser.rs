//! Definitions file parser.
//!
//! The format is line oriented:
//!
//! ```text
//! /* Electrostatics */
//! external FFTW
//! ELECTROSTATICS
//! ROTATIONAL_INERTIA implies ROTATION
//! P3M equals ELECTROSTATICS and FFTW
//! THOLE requires ELECTROSTATICS
//! ```
//!
//! `//` and `#` start line comments, `/* ... */` may span lines. Every syntax
//! error in the document is reported, not just the first.

use crate::error::{ParseError, ParseErrors, SyntaxReason};
use crate::expr::{END_OF_LINE, parse_expr};
use crate::model::{
    Declaration, DerivationRule, FeatureKind, FeatureName, ImplicationRule, RequirementRule,
    RuleSet,
};

const EXTERNAL: &str = "external";
const IMPLIES: &str = "implies";
const EQUALS: &str = "equals";
const REQUIRES: &str = "requires";

/// Parses a definitions document into a [`RuleSet`].
///
/// # Errors
/// Returns [`ParseErrors`] carrying every malformed line of the document.
pub fn parse(text: &str) -> Result<RuleSet, ParseErrors> {
    let mut rules = RuleSet::default();
    let mut errors = Vec::new();
    let mut open_block = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = strip_comments(raw, line, &mut open_block);
        if content.trim().is_empty() {
            continue;
        }
        if let Err(error) = parse_line(content.trim(), line, &mut rules) {
            errors.push(error);
        }
    }

    if let Some(line) = open_block {
        errors.push(ParseError::new(line, "/*", SyntaxReason::UnterminatedComment));
    }

    if errors.is_empty() {
        tracing::debug!(
            declarations = rules.declarations.len(),
            implications = rules.implications.len(),
            derivations = rules.derivations.len(),
            requirements = rules.requirements.len(),
            "Parsed feature definitions"
        );
        Ok(rules)
    } else {
        Err(ParseErrors(errors))
    }
}

/// Removes comments from one physical line. `open_block` carries the line a
/// still-open `/*` started on.
fn strip_comments(raw: &str, line: usize, open_block: &mut Option<usize>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    loop {
        if open_block.is_some() {
            let Some(end) = rest.find("*/") else {
                return out;
            };
            *open_block = None;
            rest = &rest[end + 2..];
            out.push(' ');
        }

        let line_comment = [rest.find("//"), rest.find('#')].into_iter().flatten().min();
        match rest.find("/*") {
            Some(start) if line_comment.is_none_or(|lc| start < lc) => {
                out.push_str(&rest[..start]);
                *open_block = Some(line);
                rest = &rest[start + 2..];
            },
            _ => {
                out.push_str(&rest[..line_comment.unwrap_or(rest.len())]);
                return out;
            },
        }
    }
}

fn parse_line(content: &str, line: usize, rules: &mut RuleSet) -> Result<(), ParseError> {
    let (head, rest) = split_word(content);

    if head == EXTERNAL {
        let (raw, extra) = split_word(rest);
        if raw.is_empty() {
            return Err(ParseError::new(line, END_OF_LINE, SyntaxReason::ExpectedName));
        }
        if !extra.is_empty() {
            let (token, _) = split_word(extra);
            return Err(ParseError::new(line, token, SyntaxReason::UnexpectedToken));
        }
        let name = feature_name(raw, line)?;
        rules.declarations.push(Declaration { name, kind: FeatureKind::External, line });
        return Ok(());
    }

    let name = feature_name(head, line)?;
    let (keyword, tail) = split_word(rest);

    match keyword {
        "" => {
            rules.declarations.push(Declaration { name, kind: FeatureKind::Basic, line });
        },
        IMPLIES => {
            let consequents = tail
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(|part| feature_name(part, line))
                .collect::<Result<Vec<_>, _>>()?;
            if consequents.is_empty() {
                return Err(ParseError::new(line, END_OF_LINE, SyntaxReason::ExpectedName));
            }
            rules.implications.extend(consequents.into_iter().map(|consequent| {
                ImplicationRule { antecedent: name.clone(), consequent, line }
            }));
        },
        EQUALS => {
            let expr = parse_expr(tail, line)?;
            rules.declarations.push(Declaration {
                name: name.clone(),
                kind: FeatureKind::Derived,
                line,
            });
            rules.derivations.push(DerivationRule { feature: name, expr, line });
        },
        REQUIRES => {
            let expr = parse_expr(tail, line)?;
            rules.requirements.push(RequirementRule { feature: name, expr, line });
        },
        other => return Err(ParseError::new(line, other, SyntaxReason::UnexpectedToken)),
    }

    Ok(())
}

/// Splits off the first whitespace-delimited word; both parts are trimmed.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    text.find(char::is_whitespace)
        .map_or((text, ""), |end| (&text[..end], text[end..].trim_start()))
}

fn feature_name(raw: &str, line: usize) -> Result<FeatureName, ParseError> {
    FeatureName::new(raw).ok_or_else(|| ParseError::new(line, raw, SyntaxReason::InvalidName))
}
