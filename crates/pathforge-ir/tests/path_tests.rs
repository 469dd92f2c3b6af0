use pathforge_ir::path::{ConstraintOp, ExecutionPath, PathCondition, Value};

#[test]
fn test_to_expression_plain_and_negated() {
    let cond = PathCondition::new("x", ConstraintOp::Lt, Value::Int(10));
    assert_eq!(cond.to_expression(), "x < 10");
    assert_eq!(cond.clone().with_negated(true).to_expression(), "!(x < 10)");
}

#[test]
fn test_to_expression_null_and_instanceof() {
    let is_null = PathCondition::new("name", ConstraintOp::IsNull, Value::Null);
    assert_eq!(is_null.to_expression(), "name == null");

    let not_null = PathCondition::new("name", ConstraintOp::IsNotNull, Value::Null).with_negated(true);
    assert_eq!(not_null.to_expression(), "!(name != null)");

    let inst = PathCondition::new(
        "shape",
        ConstraintOp::InstanceOf,
        Value::Symbol("Circle".into()),
    );
    assert_eq!(inst.to_expression(), "shape instanceof Circle");
}

#[test]
fn test_string_literal_rendering() {
    let cond = PathCondition::new("mode", ConstraintOp::Eq, Value::Str("fast".into()));
    assert_eq!(cond.to_expression(), "mode == \"fast\"");
}

#[test]
fn test_path_constraint_joins_with_and() {
    let path = ExecutionPath::new(
        "path_1",
        vec![
            PathCondition::new("x", ConstraintOp::Eq, Value::Int(0)),
            PathCondition::new("y", ConstraintOp::Gt, Value::Int(3)).with_negated(true),
        ],
    );
    assert_eq!(path.get_path_constraint(), "x == 0 && !(y > 3)");
}

#[test]
fn test_branch_free_path_constraint() {
    let path = ExecutionPath::new("path_1", vec![]);
    assert_eq!(path.get_path_constraint(), "true");
    assert!(path.is_feasible);
}

#[test]
fn test_path_serializes() {
    let path = ExecutionPath::new(
        "path_7",
        vec![PathCondition::new("flag", ConstraintOp::Eq, Value::Bool(true))],
    );
    let json = serde_json::to_value(&path).unwrap();
    assert_eq!(json["id"], "path_7");
    assert_eq!(json["conditions"][0]["op"], "eq");
    assert_eq!(json["conditions"][0]["value"]["kind"], "bool");
}
