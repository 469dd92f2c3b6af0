//! Cross-checking an external test suite against symbolic paths.
//!
//! `TestValidator` works on one method: it enumerates the method's paths,
//! extracts the suite's `@Test` units and decides, per feasible path,
//! whether some test's literal inputs drive execution down it. Every path
//! or branch side left uncovered becomes a gap with a skeleton test.
//! `HybridValidator` repeats that over every method of a class and merges
//! the suggestions into one ranked list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pathforge_ir::path::{ExecutionPath, PathCondition, Value};
use pathforge_ir::types::{BranchSide, ClassInfo};
use pathforge_symbolic::executor::{SymbolicExecutionResult, SymbolicExecutor, UncoveredBranch};
use pathforge_symbolic::predicate::{JavaPredicateParser, PredicateParser};
use pathforge_symbolic::solver::{holds, GreedySolver, Solver};

use crate::extract::{extract_method_body, extract_tests, ExtractedTest};

// ── Scoring constants ────────────────────────────────────────────────

pub const TEST_RATIO_WEIGHT: f64 = 0.4;
pub const COVERAGE_WEIGHT: f64 = 0.6;

pub const BASE_PRIORITY: u32 = 50;
pub const BRANCH_GAP_BONUS: u32 = 20;
pub const PATH_GAP_BONUS: u32 = 10;
pub const LOW_SCORE_BONUS: u32 = 30;
pub const MEDIUM_SCORE_BONUS: u32 = 15;
pub const LOW_SCORE: f64 = 50.0;
pub const MEDIUM_SCORE: f64 = 70.0;

// ── Report types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoverageGap {
    /// A predicate side no feasible path reaches.
    UncoveredBranch {
        line: u32,
        side: BranchSide,
        condition: PathCondition,
        description: String,
    },
    /// A feasible path no extracted test drives.
    UncoveredPath {
        path_id: String,
        constraint: String,
        inputs: BTreeMap<String, Value>,
        description: String,
    },
}

impl CoverageGap {
    pub fn description(&self) -> &str {
        match self {
            CoverageGap::UncoveredBranch { description, .. }
            | CoverageGap::UncoveredPath { description, .. } => description,
        }
    }

    pub fn priority_bonus(&self) -> u32 {
        match self {
            CoverageGap::UncoveredBranch { .. } => BRANCH_GAP_BONUS,
            CoverageGap::UncoveredPath { .. } => PATH_GAP_BONUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    AddBranchTest,
    AddPathTest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub method: String,
    pub description: String,
    pub inputs: BTreeMap<String, Value>,
    /// Skeleton JUnit method.
    pub suggested_code: String,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodValidation {
    pub method: String,
    pub symbolic: SymbolicExecutionResult,
    /// `@Test` units found in the suite.
    pub test_path_count: usize,
    pub gaps: Vec<CoverageGap>,
    pub suggestions: Vec<Suggestion>,
    /// In [0, 100].
    pub validation_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub class_name: String,
    pub validations: Vec<MethodValidation>,
    /// Mean of the method scores, 0 when no method had a body.
    pub overall_score: f64,
    /// All methods' suggestions, highest priority first.
    pub suggestions: Vec<Suggestion>,
}

// ── Single-method validation ─────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TestValidator<S = GreedySolver, P = JavaPredicateParser> {
    executor: SymbolicExecutor<S, P>,
}

impl TestValidator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Solver, P: PredicateParser> TestValidator<S, P> {
    pub fn with_executor(executor: SymbolicExecutor<S, P>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &SymbolicExecutor<S, P> {
        &self.executor
    }

    pub fn validate_test_coverage(
        &self,
        test_code: &str,
        method_name: &str,
        method_body: &str,
    ) -> MethodValidation {
        let tests = extract_tests(test_code);
        self.validate_extracted(&tests, method_name, method_body)
    }

    fn validate_extracted(
        &self,
        tests: &[ExtractedTest],
        method_name: &str,
        method_body: &str,
    ) -> MethodValidation {
        let symbolic = self.executor.analyze_method(method_name, method_body);

        let mut gaps: Vec<CoverageGap> = symbolic.uncovered_branches.iter().map(branch_gap).collect();
        gaps.extend(
            symbolic
                .feasible()
                .filter(|path| !tests.iter().any(|t| test_covers_path(t, path)))
                .map(path_gap),
        );

        let validation_score = validation_score(tests.len(), symbolic.feasible_paths, symbolic.coverage_estimate);
        let score_bonus = score_bonus(validation_score);

        let suggestions = gaps
            .iter()
            .map(|gap| suggestion(gap, method_name, &symbolic, BASE_PRIORITY + gap.priority_bonus() + score_bonus))
            .collect();

        tracing::debug!(
            method = method_name,
            tests = tests.len(),
            gaps = gaps.len(),
            score = validation_score,
            "method validated"
        );

        MethodValidation {
            method: method_name.to_string(),
            symbolic,
            test_path_count: tests.len(),
            gaps,
            suggestions,
            validation_score,
        }
    }
}

/// `100·(0.4·min(1, tests / feasible) + 0.6·coverage)`. A method with no
/// feasible path counts as one so the ratio stays finite.
pub fn validation_score(tests: usize, feasible_paths: usize, coverage: f64) -> f64 {
    let ratio = (tests as f64 / feasible_paths.max(1) as f64).min(1.0);
    100.0 * (TEST_RATIO_WEIGHT * ratio + COVERAGE_WEIGHT * coverage)
}

/// Priority added to every suggestion of a method scoring `score`.
pub fn score_bonus(score: f64) -> u32 {
    if score < LOW_SCORE {
        LOW_SCORE_BONUS
    } else if score < MEDIUM_SCORE {
        MEDIUM_SCORE_BONUS
    } else {
        0
    }
}

/// A test drives a path when, for every variable the path constrains, one
/// of the test's literal values for it passes all of that variable's
/// conditions. Conditions the value cannot be judged against pass. A
/// branch-free path is driven by any test.
///
/// A constrained variable the test never binds leaves the path uncovered:
/// an unbound input is not evidence that the test reaches the path.
pub fn test_covers_path(test: &ExtractedTest, path: &ExecutionPath) -> bool {
    let mut by_variable: BTreeMap<&str, Vec<&PathCondition>> = BTreeMap::new();
    for cond in &path.conditions {
        by_variable.entry(cond.variable.as_str()).or_default().push(cond);
    }

    by_variable.into_iter().all(|(variable, conditions)| {
        test.input_values.get(variable).is_some_and(|values| {
            values
                .iter()
                .any(|v| conditions.iter().all(|c| condition_satisfied(c, v)))
        })
    })
}

pub fn condition_satisfied(cond: &PathCondition, value: &Value) -> bool {
    holds(cond, value) != Some(false)
}

fn branch_gap(branch: &UncoveredBranch) -> CoverageGap {
    CoverageGap::UncoveredBranch {
        line: branch.line,
        side: branch.side,
        condition: branch.condition.clone(),
        description: format!("Uncovered branch at {}", branch.describe()),
    }
}

fn path_gap(path: &ExecutionPath) -> CoverageGap {
    CoverageGap::UncoveredPath {
        path_id: path.id.clone(),
        constraint: path.get_path_constraint(),
        inputs: path.input_values.clone(),
        description: format!("No test drives path {}: {}", path.id, path.get_path_constraint()),
    }
}

// ── Suggestions ──────────────────────────────────────────────────────

fn suggestion(gap: &CoverageGap, method: &str, symbolic: &SymbolicExecutionResult, priority: u32) -> Suggestion {
    let (kind, test_name, goal, inputs) = match gap {
        CoverageGap::UncoveredBranch { line, side, condition, .. } => {
            let inputs = symbolic
                .suggested_inputs
                .iter()
                .filter_map(|(var, values)| values.first().map(|v| (var.clone(), v.clone())))
                .collect();
            (
                SuggestionKind::AddBranchTest,
                format!("test{}_line{}_{}", capitalize(method), line, side_suffix(*side)),
                condition.to_expression(),
                inputs,
            )
        }
        CoverageGap::UncoveredPath { path_id, constraint, inputs, .. } => (
            SuggestionKind::AddPathTest,
            format!("test_{path_id}"),
            constraint.clone(),
            inputs.clone(),
        ),
    };

    Suggestion {
        kind,
        method: method.to_string(),
        description: gap.description().to_string(),
        suggested_code: skeleton(&test_name, method, &goal, &inputs),
        inputs,
        priority,
    }
}

fn side_suffix(side: BranchSide) -> &'static str {
    match side {
        BranchSide::True => "true",
        BranchSide::False => "false",
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Skeleton JUnit 5 method that arranges `inputs` and leaves act/assert
/// to the author. Inputs on expressions (`s.length()`) become comments.
fn skeleton(test_name: &str, method: &str, goal: &str, inputs: &BTreeMap<String, Value>) -> String {
    let mut code = format!(
        "@Test\n@DisplayName(\"{method}: {}\")\nvoid {test_name}() {{\n    // Arrange\n",
        goal.replace('"', "'")
    );
    for (var, value) in inputs {
        let line = if !is_identifier(var) {
            format!("    // {var} = {value}\n")
        } else if value.is_null() {
            format!("    Object {var} = null;\n")
        } else {
            format!("    var {var} = {value};\n")
        };
        code.push_str(&line);
    }
    code.push_str(&format!(
        "\n    // Act\n    // call {method} so that {goal}\n\n    // Assert\n}}"
    ));
    code
}

// ── Class-level validation ───────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct HybridValidator<S = GreedySolver, P = JavaPredicateParser> {
    validator: TestValidator<S, P>,
}

impl HybridValidator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Solver, P: PredicateParser> HybridValidator<S, P> {
    pub fn with_validator(validator: TestValidator<S, P>) -> Self {
        Self { validator }
    }

    /// Validate `test_sources` against every method of `class`. A method's
    /// body comes from its metadata when present, otherwise from
    /// `source_code`; methods with no body are skipped.
    pub fn validate_and_enhance<T: AsRef<str>>(
        &self,
        test_sources: &[T],
        source_code: &str,
        class: &ClassInfo,
    ) -> ValidationReport {
        let tests: Vec<ExtractedTest> = test_sources
            .iter()
            .flat_map(|src| extract_tests(src.as_ref()))
            .collect();

        let mut validations = Vec::new();
        for method in &class.methods {
            let body = match method.body.as_deref() {
                Some(body) if !body.trim().is_empty() => body.to_string(),
                _ => extract_method_body(source_code, &method.name),
            };
            if body.is_empty() {
                tracing::debug!(method = %method.name, "no body found, skipped");
                continue;
            }
            validations.push(self.validator.validate_extracted(&tests, &method.name, &body));
        }

        let overall_score = if validations.is_empty() {
            0.0
        } else {
            validations.iter().map(|v| v.validation_score).sum::<f64>() / validations.len() as f64
        };

        let mut suggestions: Vec<Suggestion> = validations
            .iter()
            .flat_map(|v| v.suggestions.iter().cloned())
            .collect();
        suggestions.sort_by(|a, b| b.priority.cmp(&a.priority));

        ValidationReport {
            class_name: class.class_name.clone(),
            validations,
            overall_score,
            suggestions,
        }
    }
}
