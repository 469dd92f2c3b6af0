//! Hybrid test generation: searched tests plus externally written ones.
//!
//! External tests arrive as opaque method sources (typically written by a
//! language model). They are wrapped as `TestCase`s with a fixed prior
//! fitness, pooled with the engine's archive, de-duplicated and rendered
//! into one JUnit 5 class.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use pathforge_ir::ids::IdGenerator;
use pathforge_ir::parse::parse_class_info;
use pathforge_ir::types::{ClassInfo, TestCase, TestKind};
use pathforge_search::config::SbstConfig;
use pathforge_search::engine::SbstEngine;

use crate::error::CoreError;
use crate::extract::{assertion_calls, method_calls};

/// Fitness assigned to external tests; they are never evaluated.
pub const EXTERNAL_FITNESS: f64 = 0.8;

/// Target recorded when an external test calls nothing recognizable.
pub const UNKNOWN_TARGET: &str = "unknown";

/// Calls that belong to the test harness rather than the class under test.
const HARNESS_PREFIXES: [&str; 4] = ["assert", "verify", "when", "mock"];

static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//[^\n]*").expect("comment pattern"));

static DISPLAY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@DisplayName\s*\([^)]*\)").expect("display name pattern"));

static TEST_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"void\s+\w+\s*\(\s*\)").expect("test name pattern"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

#[derive(Debug, Clone)]
pub struct HybridTestGenerator {
    class: ClassInfo,
    config: SbstConfig,
    external_tests: Vec<String>,
}

impl HybridTestGenerator {
    pub fn new(class: ClassInfo, config: SbstConfig, external_tests: Vec<String>) -> Self {
        Self {
            class,
            config,
            external_tests,
        }
    }

    /// Same as `new`, decoding the class metadata from JSON.
    pub fn from_json(json: &str, config: SbstConfig, external_tests: Vec<String>) -> Result<Self, CoreError> {
        Ok(Self::new(parse_class_info(json)?, config, external_tests))
    }

    pub fn class_info(&self) -> &ClassInfo {
        &self.class
    }

    /// Run the search, add the external tests and drop duplicates. Searched
    /// tests come first, so a duplicate external test loses to them.
    pub fn generate_optimized_tests(&self) -> Result<Vec<TestCase>, CoreError> {
        let mut engine = SbstEngine::new(self.class.clone(), self.config.clone())?;
        let mut tests = engine.evolve();
        let searched = tests.len();
        tests.extend(self.convert_external_tests());

        let unique = remove_redundant_tests(tests);
        tracing::info!(
            class = %self.class.class_name,
            searched,
            external = self.external_tests.len(),
            kept = unique.len(),
            "hybrid tests assembled"
        );
        Ok(unique)
    }

    pub fn convert_external_tests(&self) -> Vec<TestCase> {
        let ids = IdGenerator::new();
        self.external_tests
            .iter()
            .map(|code| {
                let mut test = TestCase::new(
                    ids.fresh("external_test"),
                    TestKind::MethodCall,
                    code.as_str(),
                    extract_target_method(code),
                    self.class.class_name.as_str(),
                    assertion_calls(code),
                );
                test.set_fitness(EXTERNAL_FITNESS);
                test
            })
            .collect()
    }

    /// A complete JUnit 5 test class holding `tests`, with a `target`
    /// field initialized before each test.
    pub fn generate_test_class(&self, tests: &[TestCase]) -> String {
        let class_name = &self.class.class_name;
        let mut out = String::new();
        if !self.class.package.is_empty() {
            out.push_str(&format!("package {};\n\n", self.class.package));
        }
        out.push_str(
            "import org.junit.jupiter.api.Test;\n\
             import org.junit.jupiter.api.DisplayName;\n\
             import org.junit.jupiter.api.BeforeEach;\n\
             import static org.junit.jupiter.api.Assertions.*;\n\
             import static org.mockito.Mockito.*;\n\n",
        );
        out.push_str(&format!("public class {class_name}Test {{\n\n"));
        out.push_str(&format!("    private {class_name} target;\n\n"));
        out.push_str(&format!(
            "    @BeforeEach\n    void setUp() {{\n        target = new {class_name}();\n    }}\n"
        ));
        for test in tests {
            out.push('\n');
            out.push_str(&indent(&test.code));
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

/// First called method that is not part of the test harness.
pub fn extract_target_method(code: &str) -> String {
    method_calls(code)
        .into_iter()
        .find(|name| !HARNESS_PREFIXES.iter().any(|p| name.starts_with(p)))
        .unwrap_or_else(|| UNKNOWN_TARGET.to_string())
}

/// `target_method:code` with comments, display names and the test's own
/// method name removed and whitespace collapsed.
pub fn test_signature(test: &TestCase) -> String {
    let code = LINE_COMMENT.replace_all(&test.code, "");
    let code = DISPLAY_NAME.replace_all(&code, "");
    let code = TEST_NAME.replace_all(&code, "void test()");
    let code = WHITESPACE.replace_all(&code, " ");
    format!("{}:{}", test.target_method, code.trim())
}

/// Keep the first test of each signature, order preserved.
pub fn remove_redundant_tests(tests: Vec<TestCase>) -> Vec<TestCase> {
    let mut seen = HashSet::new();
    tests
        .into_iter()
        .filter(|t| seen.insert(test_signature(t)))
        .collect()
}

fn indent(code: &str) -> String {
    code.lines()
        .map(|line| if line.trim().is_empty() { String::new() } else { format!("    {line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test(id: &str, code: &str, target: &str) -> TestCase {
        TestCase::new(id, TestKind::MethodCall, code, target, "Calculator", Vec::new())
    }

    #[test]
    fn test_target_skips_harness_calls() {
        assert_eq!(
            extract_target_method("Mockito.when(x.get()); Assertions.assertEquals(1, calc.add(0, 1));"),
            "get"
        );
        assert_eq!(extract_target_method("org.junit.Assert.assertTrue(ok);"), "unknown");
        assert_eq!(extract_target_method("int a = 1;"), "unknown");
    }

    #[test]
    fn test_signature_ignores_comments_names_and_spacing() {
        let a = test(
            "a",
            "@Test\n@DisplayName(\"first\")\nvoid test_add_1() {\n    // Act\n    target.add(1, 2);\n}",
            "add",
        );
        let b = test("b", "@Test void other() {   target.add(1,  2); }", "add");
        assert_eq!(test_signature(&a), test_signature(&b));

        let c = test("c", "@Test void other() { target.add(1, 3); }", "add");
        assert_ne!(test_signature(&a), test_signature(&c));
    }

    #[test]
    fn test_same_code_different_target_is_kept() {
        let tests = vec![test("a", "x();", "add"), test("b", "x();", "divide"), test("c", "x();", "add")];
        let kept: Vec<String> = remove_redundant_tests(tests).into_iter().map(|t| t.id).collect();
        assert_eq!(kept, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_indent_leaves_blank_lines_empty() {
        assert_eq!(indent("a\n\nb"), "    a\n\n    b");
    }
}
