//! Branch predicates and the paths built from them.
//!
//! A `PathCondition` is one atomic predicate plus a polarity. An
//! `ExecutionPath` is an ordered conjunction of conditions: one route
//! through a method body. Both are plain values; the solver fills in
//! `is_feasible` and `input_values` once, after which paths are read-only.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison shape of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    IsNull,
    IsNotNull,
    InstanceOf,
}

impl ConstraintOp {
    /// Source-level operator token.
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Eq => "==",
            ConstraintOp::Neq => "!=",
            ConstraintOp::Lt => "<",
            ConstraintOp::Le => "<=",
            ConstraintOp::Gt => ">",
            ConstraintOp::Ge => ">=",
            ConstraintOp::IsNull => "== null",
            ConstraintOp::IsNotNull => "!= null",
            ConstraintOp::InstanceOf => "instanceof",
        }
    }

    /// The operator obtained by swapping the operands (`3 < x` is `x > 3`).
    pub fn mirrored(self) -> Self {
        match self {
            ConstraintOp::Lt => ConstraintOp::Gt,
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Gt => ConstraintOp::Lt,
            ConstraintOp::Ge => ConstraintOp::Le,
            other => other,
        }
    }

    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            ConstraintOp::Lt | ConstraintOp::Le | ConstraintOp::Gt | ConstraintOp::Ge
        )
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A concrete literal, either parsed from source or synthesized by a solver.
///
/// Derives `Ord` so value sets can live in `BTreeSet`s and iterate in a
/// stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    /// Some non-null object whose identity does not matter.
    NonNull,
    Bool(bool),
    Int(i64),
    Str(String),
    /// An identifier or expression the parser could not reduce to a literal.
    Symbol(String),
}

impl Value {
    /// Parse a source literal. Anything that is not a recognizable literal
    /// becomes a `Symbol` carrying the trimmed text.
    pub fn parse_literal(text: &str) -> Value {
        let text = text.trim();
        match text {
            "null" => return Value::Null,
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }

        if let Some(inner) = strip_quotes(text, '"').or_else(|| strip_quotes(text, '\'')) {
            return Value::Str(inner.to_string());
        }

        let digits = text
            .strip_suffix('L')
            .or_else(|| text.strip_suffix('l'))
            .unwrap_or(text)
            .replace('_', "");
        if let Ok(i) = digits.parse::<i64>() {
            return Value::Int(i);
        }

        Value::Symbol(text.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn strip_quotes(text: &str, quote: char) -> Option<&str> {
    if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::NonNull => f.write_str("new Object()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::Symbol(s) => f.write_str(s),
        }
    }
}

/// One atomic predicate with a polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathCondition {
    pub variable: String,
    pub op: ConstraintOp,
    pub value: Value,
    /// When true the path takes the false side of the predicate.
    pub negated: bool,
}

impl PathCondition {
    pub fn new(variable: impl Into<String>, op: ConstraintOp, value: Value) -> Self {
        Self {
            variable: variable.into(),
            op,
            value,
            negated: false,
        }
    }

    /// The same predicate with the given polarity.
    pub fn with_negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    /// Render as `var OP value`, wrapped in `!(...)` when negated.
    pub fn to_expression(&self) -> String {
        let expr = match self.op {
            ConstraintOp::IsNull => format!("{} == null", self.variable),
            ConstraintOp::IsNotNull => format!("{} != null", self.variable),
            ConstraintOp::InstanceOf => format!("{} instanceof {}", self.variable, self.value),
            op => format!("{} {} {}", self.variable, op, self.value),
        };
        if self.negated {
            format!("!({expr})")
        } else {
            expr
        }
    }
}

impl fmt::Display for PathCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_expression())
    }
}

/// One route through a method: the conjunction of its conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPath {
    pub id: String,
    pub conditions: Vec<PathCondition>,
    pub is_feasible: bool,
    /// Solver bindings, sorted by variable name.
    pub input_values: BTreeMap<String, Value>,
    /// 1-based body lines of the predicates this path passes through.
    pub covered_statements: Vec<u32>,
}

impl ExecutionPath {
    pub fn new(id: impl Into<String>, conditions: Vec<PathCondition>) -> Self {
        Self {
            id: id.into(),
            conditions,
            is_feasible: true,
            input_values: BTreeMap::new(),
            covered_statements: Vec::new(),
        }
    }

    /// All conditions joined with `&&`. A branch-free path renders as `true`.
    pub fn get_path_constraint(&self) -> String {
        if self.conditions.is_empty() {
            return "true".to_string();
        }
        self.conditions
            .iter()
            .map(PathCondition::to_expression)
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals() {
        assert_eq!(Value::parse_literal("null"), Value::Null);
        assert_eq!(Value::parse_literal(" 42 "), Value::Int(42));
        assert_eq!(Value::parse_literal("-7"), Value::Int(-7));
        assert_eq!(Value::parse_literal("10L"), Value::Int(10));
        assert_eq!(Value::parse_literal("1_000"), Value::Int(1000));
        assert_eq!(Value::parse_literal("\"abc\""), Value::Str("abc".into()));
        assert_eq!(Value::parse_literal("'c'"), Value::Str("c".into()));
        assert_eq!(Value::parse_literal("false"), Value::Bool(false));
        assert_eq!(
            Value::parse_literal("Integer.MAX_VALUE"),
            Value::Symbol("Integer.MAX_VALUE".into())
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Str("a\"b".into()).to_string(), "\"a\\\"b\"");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Int(-3).to_string(), "-3");
    }

    #[test]
    fn test_mirrored_ops() {
        assert_eq!(ConstraintOp::Lt.mirrored(), ConstraintOp::Gt);
        assert_eq!(ConstraintOp::Ge.mirrored(), ConstraintOp::Le);
        assert_eq!(ConstraintOp::Eq.mirrored(), ConstraintOp::Eq);
    }
}
