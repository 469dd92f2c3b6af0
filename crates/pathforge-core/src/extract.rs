//! Lightweight pattern extraction over Java source text.
//!
//! Nothing here builds a syntax tree. Method bodies are found by their
//! declaration header and closed by brace matching; test units are found
//! by their `@Test` annotation. Inputs the patterns do not recognize are
//! skipped, never reported.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use pathforge_ir::path::Value;
use pathforge_symbolic::predicate::balanced_braces;

static TEST_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"@Test\b(?:\s*\([^)]*\))?\s*(?:@\w+(?:\s*\([^)]*\))?\s*)*(?:(?:public|protected|private)\s+)?(?:void\s+)?(\w+)\s*\([^)]*\)\s*(?:throws\s+[\w.,\s]+?)?\s*\{",
    )
    .expect("test header pattern")
});

static ASSERTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(assert\w+)\s*\(").expect("assertion pattern"));

static METHOD_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(\w+)\s*\(").expect("method call pattern"));

static LITERAL_BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b([A-Za-z_]\w*)\s*=\s*(-?\d+[lL]?|"(?:[^"\\\n]|\\.)*"|null|true|false)"#)
        .expect("literal binding pattern")
});

/// One `@Test` method found in a test source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTest {
    pub name: String,
    /// Body text between the method's braces.
    pub body: String,
    pub assertion_count: usize,
    /// Called method names, first occurrence order, no repeats.
    pub method_calls: Vec<String>,
    /// Literal values assigned to each local, in source order.
    pub input_values: BTreeMap<String, Vec<Value>>,
}

/// Body of `method_name` in `source`, braces included. Empty when no
/// declaration header matches or its braces never balance.
pub fn extract_method_body(source: &str, method_name: &str) -> String {
    let pattern = format!(
        r"(?:(?:public|private|protected|static|final|synchronized|abstract)\s+)*[\w<>\[\],.?]+\s+{}\s*\([^)]*\)\s*(?:throws\s+[\w.,\s]+?)?\s*\{{",
        regex::escape(method_name)
    );
    let Ok(header) = Regex::new(&pattern) else {
        return String::new();
    };

    for found in header.find_iter(source) {
        let open = found.end() - 1;
        if let Some(inner) = balanced_braces(source, open) {
            return source[open..open + inner.len() + 2].to_string();
        }
    }
    String::new()
}

/// Every `@Test` unit in `source`, in order of appearance.
pub fn extract_tests(source: &str) -> Vec<ExtractedTest> {
    let mut tests = Vec::new();
    for caps in TEST_HEADER.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let open = whole.end() - 1;
        let Some(body) = balanced_braces(source, open) else {
            tracing::debug!(test = name.as_str(), "unterminated test body skipped");
            continue;
        };
        tests.push(ExtractedTest {
            name: name.as_str().to_string(),
            body: body.to_string(),
            assertion_count: ASSERTION_CALL.find_iter(body).count(),
            method_calls: method_calls(body),
            input_values: literal_bindings(body),
        });
    }
    tests
}

/// Names of the assertion calls in `code`, in order.
pub fn assertion_calls(code: &str) -> Vec<String> {
    ASSERTION_CALL
        .captures_iter(code)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn method_calls(code: &str) -> Vec<String> {
    let mut calls: Vec<String> = Vec::new();
    for caps in METHOD_CALL.captures_iter(code) {
        if let Some(name) = caps.get(1) {
            if !calls.iter().any(|c| c == name.as_str()) {
                calls.push(name.as_str().to_string());
            }
        }
    }
    calls
}

/// `name = literal` assignments. A literal glued to more identifier text
/// (`x = nullable`, `n = 5f`) is not a literal and is skipped.
pub fn literal_bindings(code: &str) -> BTreeMap<String, Vec<Value>> {
    let mut bindings: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for caps in LITERAL_BINDING.captures_iter(code) {
        let (Some(name), Some(literal)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let glued = code[literal.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
        if glued {
            continue;
        }
        bindings
            .entry(name.as_str().to_string())
            .or_default()
            .push(Value::parse_literal(literal.as_str()));
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
public class Account {
    private int balance;

    public boolean withdraw(int amount) {
        if (amount > balance) {
            return false;
        }
        String note = "}";
        balance -= amount;
        return true;
    }

    static int fee() { return 2; }
}
"#;

    #[test]
    fn test_extract_method_body_balances_braces() {
        let body = extract_method_body(SOURCE, "withdraw");
        assert!(body.starts_with('{'));
        assert!(body.ends_with('}'));
        assert!(body.contains("return true;"));
        assert!(!body.contains("fee"));
    }

    #[test]
    fn test_extract_method_body_without_modifiers_match() {
        assert_eq!(extract_method_body(SOURCE, "fee"), "{ return 2; }");
    }

    #[test]
    fn test_missing_method_is_empty() {
        assert_eq!(extract_method_body(SOURCE, "deposit"), "");
        assert_eq!(extract_method_body("", "withdraw"), "");
    }

    #[test]
    fn test_extract_tests() {
        let suite = r#"
class AccountTest {
    @Test
    @DisplayName("overdraw")
    void overdraw() {
        Account a = new Account();
        int amount = 500;
        assertFalse(a.withdraw(amount));
        assertEquals(0, a.getBalance());
    }

    @Test
    public void nothing() throws Exception {
        Object o = null;
        boolean flag = true;
    }

    void helper() {}
}
"#;
        let tests = extract_tests(suite);
        assert_eq!(tests.len(), 2);

        let first = &tests[0];
        assert_eq!(first.name, "overdraw");
        assert_eq!(first.assertion_count, 2);
        assert_eq!(first.method_calls, vec!["withdraw".to_string(), "getBalance".to_string()]);
        assert_eq!(first.input_values["amount"], vec![Value::Int(500)]);

        let second = &tests[1];
        assert_eq!(second.name, "nothing");
        assert_eq!(second.assertion_count, 0);
        assert_eq!(second.input_values["o"], vec![Value::Null]);
        assert_eq!(second.input_values["flag"], vec![Value::Bool(true)]);
    }

    #[test]
    fn test_literal_bindings_skip_comparisons_and_glued_text() {
        let b = literal_bindings("x = 1; x = -3; s = \"a b\"; if (y == 2) {} z = nullable; w = 4.5;");
        assert_eq!(b["x"], vec![Value::Int(1), Value::Int(-3)]);
        assert_eq!(b["s"], vec![Value::Str("a b".into())]);
        assert!(!b.contains_key("y"));
        assert!(!b.contains_key("z"));
        assert!(!b.contains_key("w"));
    }

    #[test]
    fn test_assertion_calls_in_order() {
        assert_eq!(
            assertion_calls("assertTrue(a); x(); assertNull(b);"),
            vec!["assertTrue".to_string(), "assertNull".to_string()]
        );
    }
}
