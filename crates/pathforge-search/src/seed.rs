//! Seed test generation from class metadata.
//!
//! For every matching method the generator emits:
//! 1. One normal-path test: type-defaulted arguments, an assertion on the
//!    result chosen by return type.
//! 2. Up to two boundary tests per parameter, each wrapped in
//!    `assertDoesNotThrow`.
//! 3. One exception test: null (or zero) arguments wrapped in
//!    `assertThrows`.
//!
//! Tests are rendered as JUnit 5 methods.

use rand::RngCore;

use pathforge_ir::ids::IdGenerator;
use pathforge_ir::types::{ClassInfo, MethodInfo, TestCase, TestKind};

use crate::operators;

/// Method filter matching every method.
pub const ALL_METHODS: &str = "*";

/// Boundary tests emitted per parameter.
pub const BOUNDARY_TESTS_PER_PARAM: usize = 2;

/// Language-specific source of seed tests and genetic operators.
pub trait TestGenerator: Send + Sync {
    /// Seed tests for `target_method` (or every method, for `"*"`) of
    /// `target_class`. A class the generator does not know yields nothing.
    fn generate(&self, target_class: &str, target_method: &str, ids: &IdGenerator) -> Vec<TestCase>;

    fn mutate(&self, test: &TestCase, rng: &mut dyn RngCore, ids: &IdGenerator) -> TestCase;

    fn crossover(
        &self,
        first: &TestCase,
        second: &TestCase,
        rng: &mut dyn RngCore,
        ids: &IdGenerator,
    ) -> (TestCase, TestCase);

    fn class_info(&self) -> &ClassInfo;
}

#[derive(Debug, Clone)]
pub struct JavaTestGenerator {
    class: ClassInfo,
}

impl JavaTestGenerator {
    pub fn new(class: ClassInfo) -> Self {
        Self { class }
    }

    fn tests_for_method(&self, method: &MethodInfo, ids: &IdGenerator) -> Vec<TestCase> {
        let mut tests = vec![self.normal_test(method, ids)];
        tests.extend(self.boundary_tests(method, ids));
        tests.push(self.exception_test(method, ids));
        tests
    }

    fn normal_test(&self, method: &MethodInfo, ids: &IdGenerator) -> TestCase {
        let id = ids.fresh(&format!("test_{}", method.name));
        let args = default_args(method).join(", ");
        let call = format!("target.{}({args})", method.name);
        let assertions: Vec<String> = result_assertion(&method.return_type).into_iter().collect();

        let act = if method.return_type == "void" {
            format!("    {call};")
        } else {
            format!("    {} result = {call};", method.return_type)
        };

        let mut code = self.header(&id, &format!("test{}Normal", method.name));
        code.push_str("    // Act\n");
        code.push_str(&act);
        code.push('\n');
        if !assertions.is_empty() {
            code.push_str("\n    // Assert\n");
            for assertion in &assertions {
                code.push_str(&format!("    {assertion};\n"));
            }
        }
        code.push('}');

        TestCase::new(id, TestKind::MethodCall, code, &method.name, &self.class.class_name, assertions)
    }

    fn boundary_tests(&self, method: &MethodInfo, ids: &IdGenerator) -> Vec<TestCase> {
        let mut tests = Vec::new();
        for (i, param) in method.parameters.iter().enumerate() {
            for value in boundary_values(&param.param_type)
                .iter()
                .take(BOUNDARY_TESTS_PER_PARAM)
            {
                let id = ids.fresh(&format!("test_{}_boundary", method.name));
                let mut args = default_args(method);
                args[i] = value.to_string();

                let mut code =
                    self.header(&id, &format!("test{}Boundary_{}", method.name, param.name));
                code.push_str("    // Act & Assert\n");
                code.push_str(&format!(
                    "    assertDoesNotThrow(() -> target.{}({}));\n}}",
                    method.name,
                    args.join(", ")
                ));

                tests.push(TestCase::new(
                    id,
                    TestKind::MethodCall,
                    code,
                    &method.name,
                    &self.class.class_name,
                    vec!["assertDoesNotThrow".to_string()],
                ));
            }
        }
        tests
    }

    fn exception_test(&self, method: &MethodInfo, ids: &IdGenerator) -> TestCase {
        let id = ids.fresh(&format!("test_{}_exception", method.name));
        let args: Vec<String> = method
            .parameters
            .iter()
            .map(|p| {
                if is_primitive(&p.param_type) {
                    default_value(&p.param_type)
                } else {
                    "null".to_string()
                }
            })
            .collect();

        let mut code = self.header(&id, &format!("test{}Exception", method.name));
        code.push_str("    // Act & Assert\n");
        code.push_str(&format!(
            "    assertThrows(Exception.class, () -> target.{}({}));\n}}",
            method.name,
            args.join(", ")
        ));

        TestCase::new(
            id,
            TestKind::MethodCall,
            code,
            &method.name,
            &self.class.class_name,
            vec!["assertThrows".to_string()],
        )
    }

    /// Annotations, signature and the Arrange block.
    fn header(&self, id: &str, display_name: &str) -> String {
        let class = &self.class.class_name;
        format!(
            "@Test\n@DisplayName(\"{display_name}\")\nvoid {id}() {{\n    // Arrange\n    {class} target = new {class}();\n\n"
        )
    }
}

impl TestGenerator for JavaTestGenerator {
    fn generate(&self, target_class: &str, target_method: &str, ids: &IdGenerator) -> Vec<TestCase> {
        if target_class != ALL_METHODS && target_class != self.class.class_name {
            return Vec::new();
        }
        self.class
            .methods
            .iter()
            .filter(|m| target_method == ALL_METHODS || m.name == target_method)
            .flat_map(|m| self.tests_for_method(m, ids))
            .collect()
    }

    fn mutate(&self, test: &TestCase, rng: &mut dyn RngCore, ids: &IdGenerator) -> TestCase {
        operators::mutate(test, rng, ids)
    }

    fn crossover(
        &self,
        first: &TestCase,
        second: &TestCase,
        rng: &mut dyn RngCore,
        ids: &IdGenerator,
    ) -> (TestCase, TestCase) {
        operators::crossover(first, second, rng, ids)
    }

    fn class_info(&self) -> &ClassInfo {
        &self.class
    }
}

// ── Type tables ──────────────────────────────────────────────────────

const PRIMITIVES: &[&str] = &["int", "long", "double", "float", "boolean", "char", "byte", "short"];

pub fn is_primitive(type_name: &str) -> bool {
    PRIMITIVES.contains(&type_name.trim())
}

/// Java expression used as the default argument for a parameter type.
pub fn default_value(type_name: &str) -> String {
    let type_name = type_name.trim();
    let known = match type_name {
        "int" | "byte" | "short" => "0",
        "long" => "0L",
        "double" => "0.0",
        "float" => "0.0f",
        "boolean" => "false",
        "char" => "'\\0'",
        "String" => "\"test\"",
        "Integer" => "Integer.valueOf(0)",
        "Long" => "Long.valueOf(0L)",
        "Double" => "Double.valueOf(0.0)",
        "Boolean" => "Boolean.FALSE",
        "List" => "Collections.emptyList()",
        "Map" => "Collections.emptyMap()",
        "Set" => "Collections.emptySet()",
        _ => "",
    };
    if !known.is_empty() {
        return known.to_string();
    }

    if type_name.ends_with("[]") {
        return format!("new {type_name}{{}}");
    }
    if let Some((base, _)) = type_name.split_once('<') {
        match base.trim() {
            "List" => return "Collections.emptyList()".to_string(),
            "Map" => return "Collections.emptyMap()".to_string(),
            "Set" => return "Collections.emptySet()".to_string(),
            _ => {}
        }
    }
    "null".to_string()
}

/// Edge-case argument literals for a type, most interesting first.
pub fn boundary_values(type_name: &str) -> &'static [&'static str] {
    match type_name.trim() {
        "int" => &["Integer.MAX_VALUE", "Integer.MIN_VALUE", "0", "-1", "1"],
        "long" => &["Long.MAX_VALUE", "Long.MIN_VALUE", "0L", "-1L", "1L"],
        "double" => &["Double.MAX_VALUE", "Double.MIN_VALUE", "0.0", "-1.0", "1.0", "Double.NaN"],
        "float" => &["Float.MAX_VALUE", "Float.MIN_VALUE", "0.0f", "-1.0f", "1.0f", "Float.NaN"],
        "boolean" => &["true", "false"],
        "char" => &["Character.MAX_VALUE", "Character.MIN_VALUE"],
        "String" => &["\"\"", "\" \"", "\"null\"", "\"a\"", "\"test_value_123\""],
        _ => &["null"],
    }
}

/// Post-call assertion for a return type; `None` for `void`.
pub fn result_assertion(return_type: &str) -> Option<String> {
    let return_type = return_type.trim();
    match return_type {
        "void" | "" => None,
        "boolean" => Some("assertTrue(result)".to_string()),
        t if is_primitive(t) => Some(format!("assertEquals({}, result)", default_value(t))),
        _ => Some("assertNotNull(result)".to_string()),
    }
}

fn default_args(method: &MethodInfo) -> Vec<String> {
    method
        .parameters
        .iter()
        .map(|p| default_value(&p.param_type))
        .collect()
}
