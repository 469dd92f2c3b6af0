//! Bounded path enumeration over a method body's branch predicates.
//!
//! For B recognized predicates the executor walks path masks
//! `0..min(2^B, MAX_PATHS)`. Bit j of a mask set means predicate j is taken
//! on its false side. Methods with more than four recognized predicates are
//! therefore only partially enumerated and their coverage estimate is an
//! under-approximation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pathforge_ir::path::{ExecutionPath, PathCondition, Value};
use pathforge_ir::types::{BranchSide, BranchTarget};

use crate::predicate::{JavaPredicateParser, ParsedPredicate, PredicateParser};
use crate::solver::{GreedySolver, Solver};

/// Hard cap on enumerated paths per method.
pub const MAX_PATHS: usize = 16;

/// Branch type recorded on registered targets.
pub const IF_BRANCH: &str = "if";

/// One side of one predicate that no feasible path reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncoveredBranch {
    /// Index of the predicate in textual order.
    pub predicate: usize,
    pub line: u32,
    pub side: BranchSide,
    /// The condition that would take this side.
    pub condition: PathCondition,
}

impl UncoveredBranch {
    /// e.g. `line 4 true_branch: x == 0`
    pub fn describe(&self) -> String {
        format!("line {} {}: {}", self.line, self.side.label(), self.condition.to_expression())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolicExecutionResult {
    pub method_name: String,
    /// Recognized predicates.
    pub branch_count: usize,
    /// `if` sites whose predicate could not be parsed.
    pub dropped_predicates: usize,
    pub total_paths: usize,
    pub feasible_paths: usize,
    pub infeasible_paths: usize,
    pub coverage_estimate: f64,
    pub paths: Vec<ExecutionPath>,
    pub uncovered_branches: Vec<UncoveredBranch>,
    /// Per variable, distinct values bound by feasible paths in path order.
    pub suggested_inputs: BTreeMap<String, Vec<Value>>,
    /// True when the path cap cut enumeration short.
    pub truncated: bool,
}

impl SymbolicExecutionResult {
    pub fn feasible(&self) -> impl Iterator<Item = &ExecutionPath> {
        self.paths.iter().filter(|p| p.is_feasible)
    }
}

/// Symbolic executor, generic over the predicate parser and the solver.
#[derive(Debug, Clone, Default)]
pub struct SymbolicExecutor<S = GreedySolver, P = JavaPredicateParser> {
    solver: S,
    parser: P,
}

impl SymbolicExecutor {
    /// Greedy solver, Java predicates.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Solver, P: PredicateParser> SymbolicExecutor<S, P> {
    pub fn with_parts(solver: S, parser: P) -> Self {
        Self { solver, parser }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Enumerate, solve and score the paths of one method body.
    pub fn analyze_method(&self, method_name: &str, body: &str) -> SymbolicExecutionResult {
        let predicates = self.parser.extract(body);
        let branch_count = predicates.len();
        let dropped_predicates = self.parser.count_sites(body).saturating_sub(branch_count);
        if dropped_predicates > 0 {
            tracing::debug!(
                method = method_name,
                dropped = dropped_predicates,
                language = self.parser.language(),
                "predicates outside the branch set"
            );
        }

        let path_count = path_count(branch_count);
        let truncated = path_count < full_path_count(branch_count);
        if truncated {
            tracing::debug!(
                method = method_name,
                branches = branch_count,
                enumerated = path_count,
                "path cap reached, coverage under-approximated"
            );
        }

        let mut paths = Vec::with_capacity(path_count);
        // attempted[j] = (true side reached, false side reached)
        let mut attempted = vec![(false, false); branch_count];

        for mask in 0..path_count {
            let conditions: Vec<PathCondition> = predicates
                .iter()
                .enumerate()
                .map(|(j, pred)| pred.condition(takes_false_side(mask, j)))
                .collect();

            let mut path = ExecutionPath::new(format!("{method_name}_path_{mask}"), conditions);
            path.covered_statements = predicates.iter().map(|p| p.line).collect();

            let result = self.solver.solve(&path);
            path.is_feasible = result.feasible;
            path.input_values = result.bindings;

            if path.is_feasible {
                for (j, seen) in attempted.iter_mut().enumerate() {
                    if takes_false_side(mask, j) {
                        seen.1 = true;
                    } else {
                        seen.0 = true;
                    }
                }
            }
            paths.push(path);
        }

        let uncovered_branches = uncovered(&predicates, &attempted);
        let coverage_estimate = if branch_count == 0 {
            1.0
        } else {
            let sides = 2 * branch_count;
            (sides - uncovered_branches.len()) as f64 / sides as f64
        };

        let feasible_paths = paths.iter().filter(|p| p.is_feasible).count();
        let suggested_inputs = suggested_inputs(&paths);

        tracing::debug!(
            method = method_name,
            solver = self.solver.name(),
            paths = paths.len(),
            feasible = feasible_paths,
            coverage = coverage_estimate,
            "method analyzed"
        );

        SymbolicExecutionResult {
            method_name: method_name.to_string(),
            branch_count,
            dropped_predicates,
            total_paths: paths.len(),
            feasible_paths,
            infeasible_paths: paths.len() - feasible_paths,
            coverage_estimate,
            paths,
            uncovered_branches,
            suggested_inputs,
            truncated,
        }
    }

    /// One branch target per recognized predicate.
    pub fn branch_targets(&self, class_name: &str, method_name: &str, body: &str) -> Vec<BranchTarget> {
        self.parser
            .extract(body)
            .iter()
            .map(|p| BranchTarget::new(class_name, method_name, p.line, IF_BRANCH))
            .collect()
    }
}

/// Paths enumerated for `branches` predicates, capped.
pub fn path_count(branches: usize) -> usize {
    full_path_count(branches).min(MAX_PATHS)
}

fn full_path_count(branches: usize) -> usize {
    u32::try_from(branches)
        .ok()
        .and_then(|b| 1usize.checked_shl(b))
        .unwrap_or(usize::MAX)
}

fn takes_false_side(mask: usize, predicate: usize) -> bool {
    u32::try_from(predicate)
        .ok()
        .and_then(|j| mask.checked_shr(j))
        .is_some_and(|bits| bits & 1 == 1)
}

fn uncovered(predicates: &[ParsedPredicate], attempted: &[(bool, bool)]) -> Vec<UncoveredBranch> {
    let mut out = Vec::new();
    for (j, (pred, &(true_seen, false_seen))) in predicates.iter().zip(attempted).enumerate() {
        for (seen, side, negated) in [
            (true_seen, BranchSide::True, false),
            (false_seen, BranchSide::False, true),
        ] {
            if !seen {
                out.push(UncoveredBranch {
                    predicate: j,
                    line: pred.line,
                    side,
                    condition: pred.condition(negated),
                });
            }
        }
    }
    out
}

fn suggested_inputs(paths: &[ExecutionPath]) -> BTreeMap<String, Vec<Value>> {
    let mut inputs: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for path in paths.iter().filter(|p| p.is_feasible) {
        for (var, value) in &path.input_values {
            let values = inputs.entry(var.clone()).or_default();
            if !values.contains(value) {
                values.push(value.clone());
            }
        }
    }
    inputs
}
