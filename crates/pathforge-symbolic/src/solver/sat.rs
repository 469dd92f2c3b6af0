//! SAT-backed consistency checking for execution paths.
//!
//! Encoding strategy:
//! - Every variable a path mentions becomes a one-hot group over a finite
//!   candidate set: each literal the path compares it against, integer
//!   literals ±1, `null`, and a non-null sentinel. Exactly-one clauses
//!   (at-least-one + pairwise at-most-one) keep each group single-valued.
//! - Each condition becomes one clause: the disjunction of the candidates
//!   it admits.
//!
//! A candidate a condition cannot be judged against (see `holds`) is
//! admitted, so a path over unresolved symbols is reported feasible rather
//! than pruned.
//!
//! For single-variable integer comparisons the candidate set hits every
//! region the literals carve the number line into, so UNSAT really means
//! no integer input satisfies the path.

use std::collections::{BTreeMap, BTreeSet};

use varisat::{solver::Solver as VarisatSolver, ExtendFormula, Lit, Var};

use pathforge_ir::path::{ConstraintOp, ExecutionPath, PathCondition, Value};

use super::greedy::{different_value, instance_of, GreedySolver};
use super::{holds, SolveResult, Solver, SolverCapabilities};

/// Errors from the SAT backend.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("SAT backend error: {0}")]
    Backend(String),

    #[error("SAT but no model returned")]
    MissingModel,
}

/// One path variable, one-hot over its candidate values.
#[derive(Debug, Clone)]
pub struct EncodedVariable {
    /// Ordered list of (candidate, SAT variable).
    pub variants: Vec<(Value, Var)>,
}

/// A path translated into CNF.
#[derive(Debug, Default)]
pub struct EncodedPath {
    pub variables: BTreeMap<String, EncodedVariable>,
    /// Exactly-one clauses per variable.
    pub structural_clauses: Vec<Vec<Lit>>,
    /// One clause per condition.
    pub condition_clauses: Vec<Vec<Lit>>,
}

/// Candidate values for one variable, given the conditions that mention it.
pub fn candidate_values<'a>(conditions: impl IntoIterator<Item = &'a PathCondition>) -> BTreeSet<Value> {
    let mut candidates = BTreeSet::from([Value::Null, Value::NonNull]);

    for cond in conditions {
        match cond.op {
            ConstraintOp::IsNull | ConstraintOp::IsNotNull => {}
            ConstraintOp::InstanceOf => {
                candidates.insert(instance_of(&cond.value));
            }
            ConstraintOp::Eq | ConstraintOp::Neq => {
                candidates.insert(cond.value.clone());
                candidates.insert(different_value(&cond.value));
                if let Some(c) = cond.value.as_int() {
                    candidates.extend(c.checked_sub(1).map(Value::Int));
                }
            }
            ConstraintOp::Lt | ConstraintOp::Le | ConstraintOp::Gt | ConstraintOp::Ge => {
                if let Some(c) = cond.value.as_int() {
                    candidates.insert(Value::Int(c));
                    candidates.extend(c.checked_sub(1).map(Value::Int));
                    candidates.extend(c.checked_add(1).map(Value::Int));
                } else {
                    candidates.insert(Value::Int(0));
                    candidates.insert(Value::Int(1));
                }
            }
        }
    }

    candidates
}

/// Encode a path's variables and conditions into SAT clauses.
pub fn encode_path(path: &ExecutionPath) -> EncodedPath {
    let mut by_variable: BTreeMap<&str, Vec<&PathCondition>> = BTreeMap::new();
    for cond in &path.conditions {
        by_variable.entry(cond.variable.as_str()).or_default().push(cond);
    }

    let mut encoded = EncodedPath::default();
    let mut next_var: usize = 0;

    // BTreeMap iteration keeps variable numbering deterministic.
    for (name, conds) in &by_variable {
        let variants: Vec<(Value, Var)> = candidate_values(conds.iter().copied())
            .into_iter()
            .map(|value| {
                let var = Var::from_index(next_var);
                next_var += 1;
                (value, var)
            })
            .collect();

        // At-least-one.
        encoded
            .structural_clauses
            .push(variants.iter().map(|(_, v)| v.positive()).collect());
        // At-most-one, pairwise.
        for i in 0..variants.len() {
            for j in (i + 1)..variants.len() {
                encoded
                    .structural_clauses
                    .push(vec![variants[i].1.negative(), variants[j].1.negative()]);
            }
        }

        encoded
            .variables
            .insert(name.to_string(), EncodedVariable { variants });
    }

    for cond in &path.conditions {
        let Some(enc) = encoded.variables.get(&cond.variable) else {
            continue;
        };
        // A candidate the condition cannot be judged against stays admissible.
        let clause: Vec<Lit> = enc
            .variants
            .iter()
            .filter(|(value, _)| holds(cond, value) != Some(false))
            .map(|(_, var)| var.positive())
            .collect();
        encoded.condition_clauses.push(clause);
    }

    encoded
}

/// Decode a SAT model back to variable bindings.
fn decode_model(encoded: &EncodedPath, model: &[Lit]) -> BTreeMap<String, Value> {
    let positive: BTreeSet<usize> = model
        .iter()
        .filter(|l| l.is_positive())
        .map(|l| l.var().index())
        .collect();

    let mut bindings = BTreeMap::new();
    for (name, enc) in &encoded.variables {
        if let Some((value, _)) = enc
            .variants
            .iter()
            .find(|(_, var)| positive.contains(&var.index()))
        {
            bindings.insert(name.clone(), value.clone());
        }
    }
    bindings
}

/// Decide a path with the SAT backend alone.
pub fn check_path(path: &ExecutionPath) -> Result<SolveResult, SolverError> {
    let encoded = encode_path(path);
    let mut solver = VarisatSolver::new();
    for clause in encoded
        .structural_clauses
        .iter()
        .chain(&encoded.condition_clauses)
    {
        solver.add_clause(clause);
    }

    match solver.solve() {
        Ok(true) => {
            let model = solver.model().ok_or(SolverError::MissingModel)?;
            Ok(SolveResult::feasible(decode_model(&encoded, &model)))
        }
        Ok(false) => Ok(SolveResult::infeasible()),
        Err(e) => Err(SolverError::Backend(e.to_string())),
    }
}

/// True when every condition admits the binding of its variable.
pub fn bindings_satisfy(path: &ExecutionPath, bindings: &BTreeMap<String, Value>) -> bool {
    path.conditions.iter().all(|cond| {
        bindings
            .get(&cond.variable)
            .is_some_and(|value| holds(cond, value) != Some(false))
    })
}

/// Greedy synthesis first; SAT decides only when the greedy bindings do not
/// satisfy the whole path.
#[derive(Debug, Clone, Copy, Default)]
pub struct SatSolver {
    greedy: GreedySolver,
}

impl SatSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Solver for SatSolver {
    fn solve(&self, path: &ExecutionPath) -> SolveResult {
        let greedy = self.greedy.solve(path);
        if greedy.feasible && bindings_satisfy(path, &greedy.bindings) {
            return greedy;
        }

        match check_path(path) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(path = %path.id, error = %e, "SAT backend failed, keeping greedy verdict");
                greedy
            }
        }
    }

    fn capabilities(&self) -> SolverCapabilities {
        SolverCapabilities {
            detects_conflicts: true,
            sound_bindings: true,
        }
    }

    fn name(&self) -> &str {
        "sat"
    }
}
