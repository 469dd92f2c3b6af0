//! Branch predicate extraction from method bodies.
//!
//! Extraction is language specific and lives behind `PredicateParser`; the
//! executor and solvers only ever see `ParsedPredicate`s. Predicates the
//! parser cannot reduce to one comparison are dropped, never reported as
//! errors: an unrecognized shape shrinks the branch set and nothing else.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use pathforge_ir::path::{ConstraintOp, PathCondition, Value};

/// One recognized `if` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPredicate {
    /// 1-based line within the body.
    pub line: u32,
    pub variable: String,
    pub op: ConstraintOp,
    pub value: Value,
}

impl ParsedPredicate {
    /// The predicate as a path condition with the given polarity.
    pub fn condition(&self, negated: bool) -> PathCondition {
        PathCondition::new(self.variable.clone(), self.op, self.value.clone()).with_negated(negated)
    }
}

/// Per-language predicate extraction.
pub trait PredicateParser: Send + Sync {
    /// Recognized predicates in textual order.
    fn extract(&self, body: &str) -> Vec<ParsedPredicate>;

    /// Number of `if` sites, recognized or not.
    fn count_sites(&self, body: &str) -> usize;

    fn language(&self) -> &str;
}

static IF_SITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bif\s*\(").expect("if-site regex"));

static COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s*(==|!=|<=|>=|<|>)\s*(.+)$").expect("comparison regex")
});

static INSTANCE_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+instanceof\s+([\w.]+(?:<[^>]*>)?)$").expect("instanceof regex")
});

static EQUALS_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(!?)\s*([\w.]+)\.equals\((.+)\)$").expect("equals regex")
});

static BARE_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(!?)\s*([A-Za-z_][\w.]*(?:\(\))?)$").expect("flag regex")
});

/// Java (and Java-like) predicate parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaPredicateParser;

impl PredicateParser for JavaPredicateParser {
    fn extract(&self, body: &str) -> Vec<ParsedPredicate> {
        let mut predicates = Vec::new();

        for site in IF_SITE.find_iter(body) {
            let open = site.end() - 1;
            let Some(inner) = balanced_parens(body, open) else {
                tracing::debug!(offset = open, "unterminated if predicate dropped");
                continue;
            };
            let line = line_of(body, site.start());

            match parse_condition(inner) {
                Some((variable, op, value)) => predicates.push(ParsedPredicate {
                    line,
                    variable,
                    op,
                    value,
                }),
                None => {
                    tracing::debug!(line, predicate = inner.trim(), "unrecognized predicate dropped");
                }
            }
        }

        predicates
    }

    fn count_sites(&self, body: &str) -> usize {
        IF_SITE.find_iter(body).count()
    }

    fn language(&self) -> &str {
        "java"
    }
}

/// Reduce one predicate's text to `(variable, op, literal)`.
pub fn parse_condition(text: &str) -> Option<(String, ConstraintOp, Value)> {
    let text = strip_outer_parens(text.trim());
    if text.is_empty() || text.contains("&&") || text.contains("||") {
        return None;
    }

    if let Some(caps) = INSTANCE_OF.captures(text) {
        return Some((
            caps[1].trim().to_string(),
            ConstraintOp::InstanceOf,
            Value::Symbol(caps[2].to_string()),
        ));
    }

    if let Some(caps) = EQUALS_CALL.captures(text) {
        let op = if caps[1].is_empty() {
            ConstraintOp::Eq
        } else {
            ConstraintOp::Neq
        };
        return Some((caps[2].to_string(), op, Value::parse_literal(&caps[3])));
    }

    if let Some(caps) = COMPARISON.captures(text) {
        let (lhs, token, rhs) = (caps[1].trim(), &caps[2], caps[3].trim());
        // One comparison per predicate; `a < b < c` and friends are dropped.
        if COMPARISON.is_match(rhs) {
            return None;
        }
        let op = match token {
            "==" => ConstraintOp::Eq,
            "!=" => ConstraintOp::Neq,
            "<=" => ConstraintOp::Le,
            ">=" => ConstraintOp::Ge,
            "<" => ConstraintOp::Lt,
            _ => ConstraintOp::Gt,
        };
        return comparison(lhs, op, rhs);
    }

    if let Some(caps) = BARE_FLAG.captures(text) {
        let expected = caps[1].is_empty();
        return Some((caps[2].to_string(), ConstraintOp::Eq, Value::Bool(expected)));
    }

    None
}

fn comparison(lhs: &str, op: ConstraintOp, rhs: &str) -> Option<(String, ConstraintOp, Value)> {
    if lhs.is_empty() || rhs.is_empty() {
        return None;
    }

    let (variable, op, literal) = if is_literal(lhs) && !is_literal(rhs) {
        (rhs, op.mirrored(), lhs)
    } else {
        (lhs, op, rhs)
    };

    let value = Value::parse_literal(literal);
    let op = match (op, &value) {
        (ConstraintOp::Eq, Value::Null) => ConstraintOp::IsNull,
        (ConstraintOp::Neq, Value::Null) => ConstraintOp::IsNotNull,
        (op, _) => op,
    };
    Some((variable.to_string(), op, value))
}

fn is_literal(text: &str) -> bool {
    !matches!(Value::parse_literal(text), Value::Symbol(_))
}

fn strip_outer_parens(mut text: &str) -> &str {
    while text.starts_with('(') && text.ends_with(')') {
        match balanced_parens(text, 0) {
            Some(inner) if inner.len() == text.len() - 2 => text = inner.trim(),
            _ => break,
        }
    }
    text
}

/// Text between the `(` at `open` and its matching `)`. String and char
/// literals are skipped.
pub fn balanced_parens(text: &str, open: usize) -> Option<&str> {
    balanced(text, open, b'(', b')')
}

/// Text between the `{` at `open` and its matching `}`.
pub fn balanced_braces(text: &str, open: usize) -> Option<&str> {
    balanced(text, open, b'{', b'}')
}

fn balanced(text: &str, open: usize, open_ch: u8, close_ch: u8) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&open_ch) {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            _ if b == open_ch => depth += 1,
            _ if b == close_ch => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn line_of(text: &str, offset: usize) -> u32 {
    text[..offset].bytes().filter(|&b| b == b'\n').count() as u32 + 1
}
