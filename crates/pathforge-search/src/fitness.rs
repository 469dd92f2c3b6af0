//! Fitness scoring.
//!
//! `fitness = 0.5·branch_coverage + 0.3·assertion_density + 0.2·complexity`.
//! The weights are fixed so selection pressure does not drift between runs.
//! Branch coverage is a static proxy: a target counts as covered when its
//! method name appears in the test's code.

use serde::{Deserialize, Serialize};

use pathforge_ir::types::{BranchTarget, TestCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    BranchCoverage,
    AssertionDensity,
    Complexity,
}

impl Objective {
    pub const ALL: [Objective; 3] = [
        Objective::BranchCoverage,
        Objective::AssertionDensity,
        Objective::Complexity,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Objective::BranchCoverage => 0.5,
            Objective::AssertionDensity => 0.3,
            Objective::Complexity => 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FitnessCalculator {
    targets: Vec<BranchTarget>,
}

impl FitnessCalculator {
    pub fn new(targets: Vec<BranchTarget>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[BranchTarget] {
        &self.targets
    }

    /// Fraction of registered targets the test mentions. With no targets
    /// registered there is nothing left to cover and the score is 1.0.
    pub fn calculate_branch_coverage(&self, test: &TestCase) -> f64 {
        if self.targets.is_empty() {
            return 1.0;
        }
        let covered = self.targets.iter().filter(|t| mentions(test, t)).count();
        covered as f64 / self.targets.len() as f64
    }

    pub fn score(&self, test: &TestCase, objective: Objective) -> f64 {
        match objective {
            Objective::BranchCoverage => self.calculate_branch_coverage(test),
            Objective::AssertionDensity => assertion_density(test),
            Objective::Complexity => complexity_score(test),
        }
    }

    /// Weighted sum over `objectives`, clamped into [0, 1].
    pub fn calculate_fitness(&self, test: &TestCase, objectives: &[Objective]) -> f64 {
        let total: f64 = objectives
            .iter()
            .map(|&o| o.weight() * self.score(test, o))
            .sum();
        if total.is_nan() {
            0.0
        } else {
            total.clamp(0.0, 1.0)
        }
    }

    pub fn fitness(&self, test: &TestCase) -> f64 {
        self.calculate_fitness(test, &Objective::ALL)
    }

    /// Mark every target the test mentions as covered by it.
    pub fn record_coverage(&mut self, test: &TestCase) {
        for target in &mut self.targets {
            if mentions(test, target) {
                target.mark_covered(&test.id);
            }
        }
    }
}

fn mentions(test: &TestCase, target: &BranchTarget) -> bool {
    test.code.contains(&target.method_name)
}

/// `min(1, assertions / max(1, non-blank lines))`
pub fn assertion_density(test: &TestCase) -> f64 {
    let lines = test.non_blank_lines().max(1);
    (test.assertions.len() as f64 / lines as f64).min(1.0)
}

/// 0.5 under 5 lines, 1.0 up to 20, then linear decay to 0 at 70.
pub fn complexity_score(test: &TestCase) -> f64 {
    let lines = test.non_blank_lines();
    if lines < 5 {
        0.5
    } else if lines <= 20 {
        1.0
    } else {
        (1.0 - (lines - 20) as f64 / 50.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathforge_ir::types::TestKind;

    fn test_with(code: &str, assertions: usize) -> TestCase {
        TestCase::new(
            "t",
            TestKind::MethodCall,
            code,
            "add",
            "Calculator",
            vec!["assertTrue(x)".to_string(); assertions],
        )
    }

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("line{i};")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_complexity_shape() {
        assert_eq!(complexity_score(&test_with(&lines(4), 0)), 0.5);
        assert_eq!(complexity_score(&test_with(&lines(5), 0)), 1.0);
        assert_eq!(complexity_score(&test_with(&lines(20), 0)), 1.0);
        assert!((complexity_score(&test_with(&lines(45), 0)) - 0.5).abs() < 1e-12);
        assert_eq!(complexity_score(&test_with(&lines(200), 0)), 0.0);
    }

    #[test]
    fn test_assertion_density_ignores_blank_lines() {
        let t = test_with("a;\n\n\nb;", 1);
        assert_eq!(assertion_density(&t), 0.5);
        let dense = test_with("a;", 4);
        assert_eq!(assertion_density(&dense), 1.0);
    }

    #[test]
    fn test_branch_coverage_is_textual() {
        let calc = FitnessCalculator::new(vec![
            BranchTarget::new("Calculator", "add", 2, "if"),
            BranchTarget::new("Calculator", "divide", 5, "if"),
        ]);
        let t = test_with("target.add(1, 2);", 0);
        assert_eq!(calc.calculate_branch_coverage(&t), 0.5);
    }

    #[test]
    fn test_no_targets_means_full_coverage() {
        let calc = FitnessCalculator::default();
        assert_eq!(calc.calculate_branch_coverage(&test_with("x;", 0)), 1.0);
    }

    #[test]
    fn test_weighted_sum() {
        let calc = FitnessCalculator::default();
        // 1 assertion over 5 lines, mid-size body
        let t = test_with(&lines(5), 1);
        let expected = 0.5 * 1.0 + 0.3 * 0.2 + 0.2 * 1.0;
        assert!((calc.fitness(&t) - expected).abs() < 1e-12);
        assert!((calc.calculate_fitness(&t, &[Objective::Complexity]) - 0.2).abs() < 1e-12);
        assert_eq!(calc.calculate_fitness(&t, &[]), 0.0);
    }

    #[test]
    fn test_record_coverage_marks_targets() {
        let mut calc = FitnessCalculator::new(vec![BranchTarget::new("Calculator", "add", 2, "if")]);
        calc.record_coverage(&test_with("target.add(1, 2);", 0));
        assert!(calc.targets()[0].covered);
        assert_eq!(calc.targets()[0].covering_tests, vec!["t".to_string()]);
    }
}
