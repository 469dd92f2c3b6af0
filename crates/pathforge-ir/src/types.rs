use serde::{Deserialize, Serialize};

use crate::ids::IdGenerator;

// ── Class metadata (input) ───────────────────────────────────────────

/// Class-level metadata produced by an upstream static-analysis pass.
/// The search core only reads it; it never parses source for metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassInfo {
    pub class_name: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParamInfo>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    /// Raw body text, when the caller has it. Used to register branch targets.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_return_type() -> String {
    "void".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

// ── Branch targets ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchSide {
    True,
    False,
}

impl BranchSide {
    pub fn label(self) -> &'static str {
        match self {
            BranchSide::True => "true_branch",
            BranchSide::False => "false_branch",
        }
    }
}

/// One recognized predicate of one analyzed method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchTarget {
    pub class_name: String,
    pub method_name: String,
    pub line: u32,
    pub branch_type: String,
    pub covered: bool,
    pub covering_tests: Vec<String>,
}

impl BranchTarget {
    pub fn new(class_name: &str, method_name: &str, line: u32, branch_type: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            line,
            branch_type: branch_type.to_string(),
            covered: false,
            covering_tests: Vec::new(),
        }
    }

    /// `Class.method:line`
    pub fn branch_id(&self) -> String {
        format!("{}.{}:{}", self.class_name, self.method_name, self.line)
    }

    pub fn mark_covered(&mut self, test_id: &str) {
        self.covered = true;
        if !self.covering_tests.iter().any(|t| t == test_id) {
            self.covering_tests.push(test_id.to_string());
        }
    }
}

// ── Test cases ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    MethodCall,
    Constructor,
    FieldAccess,
    Assertion,
}

/// The unit of search: one generated test method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub kind: TestKind,
    pub code: String,
    pub target_method: String,
    pub target_class: String,
    /// Always within [0, 1].
    pub fitness: f64,
    pub coverage: f64,
    pub mutation_score: f64,
    pub assertions: Vec<String>,
    pub dependencies: Vec<String>,
}

impl TestCase {
    pub fn new(
        id: impl Into<String>,
        kind: TestKind,
        code: impl Into<String>,
        target_method: impl Into<String>,
        target_class: impl Into<String>,
        assertions: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            code: code.into(),
            target_method: target_method.into(),
            target_class: target_class.into(),
            fitness: 0.0,
            coverage: 0.0,
            mutation_score: 0.0,
            assertions,
            dependencies: Vec::new(),
        }
    }

    /// Lines with something other than whitespace on them.
    pub fn non_blank_lines(&self) -> usize {
        self.code.lines().filter(|l| !l.trim().is_empty()).count()
    }

    /// Store a fitness value, clamped into [0, 1].
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = if fitness.is_nan() {
            0.0
        } else {
            fitness.clamp(0.0, 1.0)
        };
    }
}

/// Population member: a test case plus search bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    pub test_case: TestCase,
    pub age: u32,
    pub rank: usize,
    pub crowding_distance: f64,
}

impl Chromosome {
    pub fn new(test_case: TestCase) -> Self {
        Self {
            test_case,
            age: 0,
            rank: 0,
            crowding_distance: 0.0,
        }
    }

    /// Deep copy under a freshly derived id. The copy owns its own lists.
    pub fn copy(&self, ids: &IdGenerator) -> Chromosome {
        let mut test_case = self.test_case.clone();
        test_case.id = ids.derive(&self.test_case.id, "copy");
        Chromosome {
            test_case,
            age: self.age,
            rank: self.rank,
            crowding_distance: self.crowding_distance,
        }
    }
}
