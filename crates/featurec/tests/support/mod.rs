//! A deliberately small model of a C preprocessor: one linear pass, no macro
//! expansion, just enough to run generated guard code the way a compiler would.
#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct Preprocessor {
    defined: BTreeSet<String>,
    files: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct Outcome {
    pub defined: BTreeSet<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Active non-directive lines, in order.
    pub text: Vec<String>,
}

impl Outcome {
    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Names listed as `"NAME",` in the active text.
    pub fn table_entries(&self) -> Vec<String> {
        self.text
            .iter()
            .filter_map(|line| line.strip_prefix('"')?.strip_suffix("\",").map(ToOwned::to_owned))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    parent_active: bool,
    taken: bool,
    active: bool,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Like `-DNAME` on the command line.
    pub fn define(mut self, name: &str) -> Self {
        self.defined.insert(name.to_owned());
        self
    }

    /// Registers an includable file under its bare path (no `<>` or quotes).
    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_owned(), contents.to_owned());
        self
    }

    pub fn run(self, source: &str) -> Outcome {
        let mut outcome = Outcome { defined: self.defined.clone(), ..Outcome::default() };
        self.process(source, &mut outcome, 0);
        outcome
    }

    fn process(&self, source: &str, outcome: &mut Outcome, depth: usize) {
        assert!(depth < 16, "include nesting too deep");
        let mut stack: Vec<Frame> = Vec::new();

        for raw in source.lines() {
            let line = raw.trim();
            let active = stack.last().is_none_or(|f| f.active);

            let Some(directive) = line.strip_prefix('#') else {
                if active && !line.is_empty() {
                    outcome.text.push(line.to_owned());
                }
                continue;
            };
            let directive = directive.trim_start();
            let (keyword, rest) = directive.split_once(char::is_whitespace).unwrap_or((directive, ""));
            let rest = rest.trim();

            match keyword {
                "ifdef" | "ifndef" | "if" => {
                    let cond = active
                        && match keyword {
                            "ifdef" => outcome.defined.contains(rest),
                            "ifndef" => !outcome.defined.contains(rest),
                            _ => evaluate(rest, &outcome.defined),
                        };
                    stack.push(Frame { parent_active: active, taken: cond, active: cond });
                },
                "elif" => {
                    let frame = stack.last_mut().expect("#elif without #if");
                    if frame.taken || !frame.parent_active {
                        frame.active = false;
                    } else {
                        frame.active = evaluate(rest, &outcome.defined);
                        frame.taken = frame.active;
                    }
                },
                "else" => {
                    let frame = stack.last_mut().expect("#else without #if");
                    frame.active = frame.parent_active && !frame.taken;
                    frame.taken = true;
                },
                "endif" => {
                    stack.pop().expect("#endif without #if");
                },
                _ if !active => {},
                "define" => {
                    let name = rest.split_whitespace().next().expect("#define needs a name");
                    outcome.defined.insert(name.to_owned());
                },
                "undef" => {
                    outcome.defined.remove(rest);
                },
                "include" => {
                    let path = rest.trim_matches(|c| c == '<' || c == '>' || c == '"');
                    if let Some(contents) = self.files.get(path) {
                        self.process(contents, outcome, depth + 1);
                    }
                },
                "warning" => outcome.warnings.push(rest.to_owned()),
                "error" => outcome.errors.push(rest.to_owned()),
                other => panic!("unsupported directive #{other}"),
            }
        }

        assert!(stack.is_empty(), "unterminated conditional");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Ident(String),
    Number(i64),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Vec<Tok> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Tok::Open);
                i += 1;
            },
            ')' => {
                tokens.push(Tok::Close);
                i += 1;
            },
            '!' => {
                tokens.push(Tok::Not);
                i += 1;
            },
            '&' | '|' => {
                assert_eq!(chars.get(i + 1), Some(&c), "single {c} in #if");
                tokens.push(if c == '&' { Tok::And } else { Tok::Or });
                i += 2;
            },
            _ if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().collect();
                tokens.push(Tok::Number(digits.parse().expect("number")));
            },
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Tok::Ident(chars[start..i].iter().collect()));
            },
            other => panic!("unexpected character {other:?} in #if"),
        }
    }
    tokens
}

fn evaluate(expr: &str, defined: &BTreeSet<String>) -> bool {
    let tokens = tokenize(expr);
    let mut parser = ExprParser { tokens: &tokens, pos: 0, defined };
    let value = parser.or();
    assert_eq!(parser.pos, tokens.len(), "trailing tokens in #if {expr}");
    value
}

#[derive(Debug)]
struct ExprParser<'a> {
    tokens: &'a [Tok],
    pos: usize,
    defined: &'a BTreeSet<String>,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        tok
    }

    fn or(&mut self) -> bool {
        let mut value = self.and();
        while self.peek() == Some(&Tok::Or) {
            self.bump();
            let rhs = self.and();
            value = value || rhs;
        }
        value
    }

    fn and(&mut self) -> bool {
        let mut value = self.unary();
        while self.peek() == Some(&Tok::And) {
            self.bump();
            let rhs = self.unary();
            value = value && rhs;
        }
        value
    }

    fn unary(&mut self) -> bool {
        if self.peek() == Some(&Tok::Not) {
            self.bump();
            return !self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> bool {
        match self.bump() {
            Tok::Open => {
                let value = self.or();
                assert_eq!(self.bump(), Tok::Close, "missing )");
                value
            },
            Tok::Number(n) => n != 0,
            Tok::Ident(name) if name == "defined" => {
                let parenthesized = self.peek() == Some(&Tok::Open);
                if parenthesized {
                    self.bump();
                }
                let Tok::Ident(target) = self.bump() else { panic!("defined needs a name") };
                if parenthesized {
                    assert_eq!(self.bump(), Tok::Close, "missing ) after defined");
                }
                self.defined.contains(&target)
            },
            // Identifiers that are not macros evaluate to 0.
            Tok::Ident(_) => false,
            other => panic!("unexpected token {other:?} in #if"),
        }
    }
}
