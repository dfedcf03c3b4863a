//! Tokenizing and rendering of derivation/requirement expressions.
//!
//! Expressions are opaque to the rest of the generator: they are checked for
//! shape, their feature names are collected, and they are rendered into
//! preprocessor syntax. Nothing is ever evaluated.

use crate::error::{ParseError, SyntaxReason};
use crate::model::{Expr, FeatureName};

pub(crate) const END_OF_LINE: &str = "end of line";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Name(&'a str),
    And,
    Or,
    Not,
    Open,
    Close,
}

impl Token<'_> {
    fn rendered(self) -> String {
        match self {
            Token::Name(name) => format!("defined({name})"),
            Token::And => "&&".to_owned(),
            Token::Or => "||".to_owned(),
            Token::Not => "!".to_owned(),
            Token::Open => "(".to_owned(),
            Token::Close => ")".to_owned(),
        }
    }

    fn text(self) -> &'static str {
        match self {
            Token::Name(_) => "name",
            Token::And => "&&",
            Token::Or => "||",
            Token::Not => "!",
            Token::Open => "(",
            Token::Close => ")",
        }
    }
}

/// Parses the text following `equals`/`requires` on definitions line `line`.
pub(crate) fn parse_expr(text: &str, line: usize) -> Result<Expr, ParseError> {
    let tokens = tokenize(text, line)?;
    check_shape(&tokens, line)?;

    let mut references: Vec<FeatureName> = Vec::new();
    for token in &tokens {
        if let Token::Name(raw) = token {
            if !references.iter().any(|r| r.as_str() == *raw) {
                let name = FeatureName::new(raw)
                    .ok_or_else(|| ParseError::new(line, *raw, SyntaxReason::InvalidName))?;
                references.push(name);
            }
        }
    }

    Ok(Expr {
        human: text.split_whitespace().collect::<Vec<_>>().join(" "),
        rendered: render(&tokens),
        references,
    })
}

fn tokenize(text: &str, line: usize) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {},
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '!' => tokens.push(Token::Not),
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(ParseError::new(line, c, SyntaxReason::UnexpectedToken));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            },
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some((i, next)) =
                    chars.next_if(|&(_, next)| next.is_ascii_alphanumeric() || next == '_')
                {
                    end = i + next.len_utf8();
                }
                let word = &text[start..end];
                tokens.push(match word {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ if FeatureName::is_valid(word) => Token::Name(word),
                    _ => return Err(ParseError::new(line, word, SyntaxReason::InvalidName)),
                });
            },
            other => return Err(ParseError::new(line, other, SyntaxReason::UnexpectedToken)),
        }
    }

    Ok(tokens)
}

fn check_shape(tokens: &[Token<'_>], line: usize) -> Result<(), ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::new(line, END_OF_LINE, SyntaxReason::ExpectedExpression));
    }

    let mut expect_operand = true;
    let mut depth = 0usize;

    for &token in tokens {
        let shown = match token {
            Token::Name(name) => name,
            other => other.text(),
        };
        match token {
            Token::Name(_) | Token::Not | Token::Open if !expect_operand => {
                return Err(ParseError::new(line, shown, SyntaxReason::ExpectedOperator));
            },
            Token::And | Token::Or | Token::Close if expect_operand => {
                return Err(ParseError::new(line, shown, SyntaxReason::ExpectedOperand));
            },
            Token::Name(_) => expect_operand = false,
            Token::Not => {},
            Token::Open => depth += 1,
            Token::And | Token::Or => expect_operand = true,
            Token::Close => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ParseError::new(line, ")", SyntaxReason::UnbalancedParen))?;
            },
        }
    }

    if expect_operand {
        return Err(ParseError::new(line, END_OF_LINE, SyntaxReason::ExpectedOperand));
    }
    if depth > 0 {
        return Err(ParseError::new(line, "(", SyntaxReason::UnbalancedParen));
    }
    Ok(())
}

fn render(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    let mut previous: Option<Token<'_>> = None;
    for &token in tokens {
        let glued = matches!(previous, None | Some(Token::Open | Token::Not))
            || token == Token::Close;
        if !glued {
            out.push(' ');
        }
        out.push_str(&token.rendered());
        previous = Some(token);
    }
    out
}
