//! Greedy per-variable input synthesis.
//!
//! Walks a path's conditions in order and keeps one binding per variable,
//! overwritten by every later condition on the same variable. Conflicting
//! conditions are not detected: this is a synthesis heuristic, not a
//! consistency checker (see `SatSolver` for that).

use std::collections::BTreeMap;

use pathforge_ir::path::{ConstraintOp, ExecutionPath, PathCondition, Value};

use super::{SolveResult, Solver, SolverCapabilities};

/// Suffix appended to a string literal to obtain a different string.
pub const DIFFERENT_SUFFIX: &str = "_different";

/// Default for an ordering predicate whose literal is not an integer.
const LESS_FALLBACK: i64 = 0;
const GREATER_FALLBACK: i64 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl GreedySolver {
    pub fn new() -> Self {
        Self
    }

    /// Synthesize a binding for one condition.
    ///
    /// `None` only when no value of the literal's type can satisfy the
    /// condition (an integer bound at the edge of the i64 range).
    pub fn synthesize(cond: &PathCondition) -> Option<Value> {
        let negated = cond.negated;
        match cond.op {
            ConstraintOp::IsNull => Some(if negated { Value::NonNull } else { Value::Null }),
            ConstraintOp::IsNotNull => Some(if negated { Value::Null } else { Value::NonNull }),
            ConstraintOp::Eq => Some(if negated {
                different_value(&cond.value)
            } else {
                cond.value.clone()
            }),
            ConstraintOp::Neq => Some(if negated {
                cond.value.clone()
            } else {
                different_value(&cond.value)
            }),
            ConstraintOp::Lt | ConstraintOp::Le => match cond.value.as_int() {
                // x < c, x <= c  -> c - 1;  !(x < c), !(x <= c) -> c + 1
                Some(c) if !negated => c.checked_sub(1).map(Value::Int),
                Some(c) => c.checked_add(1).map(Value::Int),
                None => Some(Value::Int(LESS_FALLBACK)),
            },
            ConstraintOp::Gt | ConstraintOp::Ge => match cond.value.as_int() {
                Some(c) if !negated => c.checked_add(1).map(Value::Int),
                Some(c) => c.checked_sub(1).map(Value::Int),
                None => Some(Value::Int(GREATER_FALLBACK)),
            },
            ConstraintOp::InstanceOf => Some(if negated {
                Value::Null
            } else {
                instance_of(&cond.value)
            }),
        }
    }
}

impl Solver for GreedySolver {
    fn solve(&self, path: &ExecutionPath) -> SolveResult {
        let mut bindings = BTreeMap::new();
        for cond in &path.conditions {
            match Self::synthesize(cond) {
                Some(value) => {
                    bindings.insert(cond.variable.clone(), value);
                }
                None => return SolveResult::infeasible(),
            }
        }
        SolveResult::feasible(bindings)
    }

    fn capabilities(&self) -> SolverCapabilities {
        SolverCapabilities {
            detects_conflicts: false,
            sound_bindings: false,
        }
    }

    fn name(&self) -> &str {
        "greedy"
    }
}

/// A value guaranteed to differ from `value`.
pub fn different_value(value: &Value) -> Value {
    match value {
        Value::Int(i) => Value::Int(i.checked_add(1).unwrap_or(i - 1)),
        Value::Str(s) => Value::Str(format!("{s}{DIFFERENT_SUFFIX}")),
        Value::Symbol(s) => Value::Symbol(format!("{s}{DIFFERENT_SUFFIX}")),
        Value::Bool(b) => Value::Bool(!b),
        Value::Null => Value::NonNull,
        Value::NonNull => Value::Null,
    }
}

/// The synthesized instance for `x instanceof T`.
pub fn instance_of(type_name: &Value) -> Value {
    let name = match type_name {
        Value::Symbol(s) | Value::Str(s) => s.clone(),
        other => other.to_string(),
    };
    Value::Symbol(format!("new {name}()"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve_one(cond: PathCondition) -> SolveResult {
        GreedySolver.solve(&ExecutionPath::new("p", vec![cond]))
    }

    #[test]
    fn test_eq_binds_literal_and_negation_differs() {
        let cond = PathCondition::new("x", ConstraintOp::Eq, Value::Int(5));
        let result = solve_one(cond.clone());
        assert!(result.feasible);
        assert_eq!(result.bindings["x"], Value::Int(5));

        let result = solve_one(cond.with_negated(true));
        assert!(result.feasible);
        assert_ne!(result.bindings["x"], Value::Int(5));
    }

    #[test]
    fn test_neq_strings() {
        let cond = PathCondition::new("s", ConstraintOp::Neq, Value::Str("a".into()));
        assert_eq!(solve_one(cond.clone()).bindings["s"], Value::Str("a_different".into()));
        assert_eq!(solve_one(cond.with_negated(true)).bindings["s"], Value::Str("a".into()));
    }

    #[test]
    fn test_ordering_rules() {
        let lt = PathCondition::new("n", ConstraintOp::Lt, Value::Int(10));
        assert_eq!(solve_one(lt.clone()).bindings["n"], Value::Int(9));
        assert_eq!(solve_one(lt.with_negated(true)).bindings["n"], Value::Int(11));

        let ge = PathCondition::new("n", ConstraintOp::Ge, Value::Int(10));
        assert_eq!(solve_one(ge.clone()).bindings["n"], Value::Int(11));
        assert_eq!(solve_one(ge.with_negated(true)).bindings["n"], Value::Int(9));
    }

    #[test]
    fn test_null_rules() {
        let cond = PathCondition::new("o", ConstraintOp::IsNull, Value::Null);
        assert_eq!(solve_one(cond.clone()).bindings["o"], Value::Null);
        assert_eq!(solve_one(cond.with_negated(true)).bindings["o"], Value::NonNull);

        let cond = PathCondition::new("o", ConstraintOp::IsNotNull, Value::Null);
        assert_eq!(solve_one(cond).bindings["o"], Value::NonNull);
    }

    #[test]
    fn test_unsupported_literal_falls_back_to_default() {
        let cond = PathCondition::new("n", ConstraintOp::Gt, Value::Symbol("LIMIT".into()));
        let result = solve_one(cond);
        assert!(result.feasible);
        assert_eq!(result.bindings["n"], Value::Int(1));
    }

    #[test]
    fn test_later_condition_overwrites_binding() {
        let path = ExecutionPath::new(
            "p",
            vec![
                PathCondition::new("x", ConstraintOp::Eq, Value::Int(1)),
                PathCondition::new("x", ConstraintOp::Eq, Value::Int(2)),
            ],
        );
        let result = GreedySolver.solve(&path);
        assert!(result.feasible);
        assert_eq!(result.bindings["x"], Value::Int(2));
    }

    #[test]
    fn test_integer_edge_is_infeasible() {
        let cond = PathCondition::new("x", ConstraintOp::Lt, Value::Int(i64::MIN));
        let result = solve_one(cond);
        assert!(!result.feasible);
        assert!(result.bindings.is_empty());
    }

    #[test]
    fn test_empty_path_is_trivially_feasible() {
        let result = GreedySolver.solve(&ExecutionPath::new("p", vec![]));
        assert!(result.feasible);
        assert!(result.bindings.is_empty());
    }
}
