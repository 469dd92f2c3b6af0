pub mod greedy;
pub mod sat;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pathforge_ir::path::{ExecutionPath, PathCondition, Value};

pub use greedy::GreedySolver;
pub use sat::SatSolver;

/// Outcome of solving one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub feasible: bool,
    /// Variable name -> synthesized input (sorted for determinism).
    pub bindings: BTreeMap<String, Value>,
}

impl SolveResult {
    pub fn feasible(bindings: BTreeMap<String, Value>) -> Self {
        Self {
            feasible: true,
            bindings,
        }
    }

    pub fn infeasible() -> Self {
        Self {
            feasible: false,
            bindings: BTreeMap::new(),
        }
    }
}

/// What a solver backend can promise about its verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverCapabilities {
    /// Reports `feasible = false` when conditions on one variable conflict.
    pub detects_conflicts: bool,
    /// Every `feasible = true` verdict comes with bindings that no condition
    /// of the path rejects. Conditions `holds` cannot judge (unresolved
    /// symbols, instances of unknown classes) are assumed satisfied.
    pub sound_bindings: bool,
}

/// Path solver seam. Implementations never fail: infeasibility is reported
/// through `SolveResult::feasible`, internal trouble degrades to a weaker
/// answer.
pub trait Solver: Send + Sync {
    fn solve(&self, path: &ExecutionPath) -> SolveResult;

    fn capabilities(&self) -> SolverCapabilities;

    /// Backend name (for logs).
    fn name(&self) -> &str;
}

/// Evaluate one condition (polarity included) against a concrete value.
///
/// `None` means the value cannot be judged against the literal (an
/// unresolved symbol, an instance of an unknown class). Ordering
/// comparisons against an integer literal are never satisfied by a
/// non-integer value, in either polarity.
pub fn holds(cond: &PathCondition, value: &Value) -> Option<bool> {
    use pathforge_ir::path::ConstraintOp;

    let raw = match cond.op {
        ConstraintOp::Eq | ConstraintOp::Neq => {
            if matches!(cond.value, Value::Symbol(_)) && value != &cond.value {
                return None;
            }
            let equal = value == &cond.value;
            if cond.op == ConstraintOp::Eq {
                equal
            } else {
                !equal
            }
        }
        ConstraintOp::Lt | ConstraintOp::Le | ConstraintOp::Gt | ConstraintOp::Ge => {
            let literal = cond.value.as_int()?;
            let Some(v) = value.as_int() else {
                return Some(false);
            };
            match cond.op {
                ConstraintOp::Lt => v < literal,
                ConstraintOp::Le => v <= literal,
                ConstraintOp::Gt => v > literal,
                _ => v >= literal,
            }
        }
        ConstraintOp::IsNull => value.is_null(),
        ConstraintOp::IsNotNull => !value.is_null(),
        ConstraintOp::InstanceOf => {
            if value.is_null() {
                false
            } else if value == &greedy::instance_of(&cond.value) {
                true
            } else {
                return None;
            }
        }
    };
    Some(raw != cond.negated)
}
