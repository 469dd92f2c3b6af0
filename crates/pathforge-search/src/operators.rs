//! Text-level genetic operators.
//!
//! Both operators work on the line-based rendering of a test. Children are
//! not guaranteed to compile; validity checking belongs to whoever runs the
//! generated code. Parents are never modified: every child is a new
//! `TestCase` under a freshly derived id.

use std::sync::LazyLock;

use rand::{Rng, RngCore};
use regex::Regex;

use pathforge_ir::ids::IdGenerator;
use pathforge_ir::types::TestCase;

/// Largest offset applied to a perturbed integer literal.
pub const MAX_LITERAL_OFFSET: i64 = 10;

/// Chance that the assertion-flip operator actually flips.
pub const ASSERTION_FLIP_PROBABILITY: f64 = 0.3;

const ACT_MARKER: &str = "// Act";
const BOUNDARY_MARKER: &str = "// Act - boundary test\n    // Act";

static INT_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("int literal regex"));

static ASSERTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(assertTrue|assertFalse|assertEquals|assertNotEquals|assertNotNull|assertNull)\b")
        .expect("assertion regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    PerturbLiteral,
    FlipAssertion,
    BoundaryMarker,
}

impl Mutation {
    pub const ALL: [Mutation; 3] = [
        Mutation::PerturbLiteral,
        Mutation::FlipAssertion,
        Mutation::BoundaryMarker,
    ];
}

/// The semantic inverse of an assertion call name.
pub fn inverse_assertion(name: &str) -> Option<&'static str> {
    Some(match name {
        "assertTrue" => "assertFalse",
        "assertFalse" => "assertTrue",
        "assertEquals" => "assertNotEquals",
        "assertNotEquals" => "assertEquals",
        "assertNotNull" => "assertNull",
        "assertNull" => "assertNotNull",
        _ => return None,
    })
}

/// Apply one uniformly chosen mutation operator.
pub fn mutate(test: &TestCase, rng: &mut dyn RngCore, ids: &IdGenerator) -> TestCase {
    let op = Mutation::ALL[rng.gen_range(0..Mutation::ALL.len())];
    apply_mutation(test, op, rng, ids)
}

/// Apply a specific mutation operator.
pub fn apply_mutation(
    test: &TestCase,
    op: Mutation,
    rng: &mut dyn RngCore,
    ids: &IdGenerator,
) -> TestCase {
    let mut assertions = test.assertions.clone();
    let code = match op {
        Mutation::PerturbLiteral => perturb_literal(&test.code, rng),
        Mutation::FlipAssertion => {
            if rng.gen_bool(ASSERTION_FLIP_PROBABILITY) {
                flip_assertion(&test.code, &mut assertions)
            } else {
                test.code.clone()
            }
        }
        Mutation::BoundaryMarker => boundary_marker(&test.code),
    };

    let mut child = TestCase::new(
        ids.derive(&test.id, "mut"),
        test.kind,
        code,
        test.target_method.clone(),
        test.target_class.clone(),
        assertions,
    );
    child.dependencies = test.dependencies.clone();
    child
}

/// Shift one randomly chosen integer literal by an offset in [-10, 10].
fn perturb_literal(code: &str, rng: &mut dyn RngCore) -> String {
    let literals: Vec<_> = INT_LITERAL.find_iter(code).collect();
    if literals.is_empty() {
        return code.to_string();
    }

    let target = literals[rng.gen_range(0..literals.len())];
    let offset = rng.gen_range(-MAX_LITERAL_OFFSET..=MAX_LITERAL_OFFSET);
    let Ok(old) = target.as_str().parse::<i64>() else {
        return code.to_string();
    };

    let mut out = String::with_capacity(code.len() + 2);
    out.push_str(&code[..target.start()]);
    out.push_str(&old.saturating_add(offset).to_string());
    out.push_str(&code[target.end()..]);
    out
}

/// Invert the first assertion call in `code` and the matching entry of the
/// assertion list.
fn flip_assertion(code: &str, assertions: &mut [String]) -> String {
    let Some(found) = ASSERTION.find(code) else {
        return code.to_string();
    };
    let Some(inverse) = inverse_assertion(found.as_str()) else {
        return code.to_string();
    };

    if let Some(entry) = assertions.iter_mut().find(|a| {
        ASSERTION
            .find(a.as_str())
            .is_some_and(|m| m.as_str() == found.as_str())
    }) {
        let flipped = ASSERTION.replace(entry.as_str(), inverse).into_owned();
        *entry = flipped;
    }

    let mut out = String::with_capacity(code.len() + 3);
    out.push_str(&code[..found.start()]);
    out.push_str(inverse);
    out.push_str(&code[found.end()..]);
    out
}

fn boundary_marker(code: &str) -> String {
    if code.contains("MAX_VALUE") || code.contains("MIN_VALUE") {
        code.to_string()
    } else {
        code.replacen(ACT_MARKER, BOUNDARY_MARKER, 1)
    }
}

/// Single-point crossover on code lines. Assertion lists are split at the
/// same relative position.
pub fn crossover(
    first: &TestCase,
    second: &TestCase,
    rng: &mut dyn RngCore,
    ids: &IdGenerator,
) -> (TestCase, TestCase) {
    let lines1: Vec<&str> = first.code.split('\n').collect();
    let lines2: Vec<&str> = second.code.split('\n').collect();

    let shortest = lines1.len().min(lines2.len());
    let point = if shortest > 1 {
        rng.gen_range(1..shortest)
    } else {
        shortest
    };

    let cut1 = proportional_cut(first.assertions.len(), point, lines1.len());
    let cut2 = proportional_cut(second.assertions.len(), point, lines2.len());

    let child = |head: &TestCase,
                 head_lines: &[&str],
                 head_cut: usize,
                 tail: &TestCase,
                 tail_lines: &[&str],
                 tail_cut: usize| {
        let code = head_lines[..point]
            .iter()
            .chain(&tail_lines[point..])
            .copied()
            .collect::<Vec<_>>()
            .join("\n");
        let assertions = head.assertions[..head_cut]
            .iter()
            .chain(&tail.assertions[tail_cut..])
            .cloned()
            .collect();
        let mut test = TestCase::new(
            ids.derive(&head.id, "x"),
            head.kind,
            code,
            head.target_method.clone(),
            head.target_class.clone(),
            assertions,
        );
        test.dependencies = head.dependencies.clone();
        test
    };

    let child1 = child(first, &lines1, cut1, second, &lines2, cut2);
    let child2 = child(second, &lines2, cut2, first, &lines1, cut1);
    (child1, child2)
}

fn proportional_cut(len: usize, point: usize, lines: usize) -> usize {
    if lines == 0 {
        0
    } else {
        (len * point / lines).min(len)
    }
}

/// Number of lines in the rendered test.
pub fn line_count(test: &TestCase) -> usize {
    test.code.split('\n').count()
}
