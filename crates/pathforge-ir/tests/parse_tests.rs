use pathforge_ir::parse::{parse_class_info, ParseError};

#[test]
fn test_parse_class_info_from_file() {
    let json = include_str!("fixtures/calculator.json");
    let info = parse_class_info(json).unwrap();
    assert_eq!(info.class_name, "Calculator");
    assert_eq!(info.package, "com.example.math");
    assert_eq!(info.methods.len(), 4);
    assert_eq!(info.fields.len(), 1);

    let divide = &info.methods[1];
    assert_eq!(divide.parameters[1].param_type, "int");
    assert!(divide.body.as_deref().unwrap().contains("if (y == 0)"));
}

#[test]
fn test_parse_defaults() {
    let json = include_str!("fixtures/calculator.json");
    let info = parse_class_info(json).unwrap();

    let reset = &info.methods[3];
    assert_eq!(reset.return_type, "void");
    assert!(reset.parameters.is_empty());
    assert!(reset.body.is_none());
}

#[test]
fn test_parse_invalid_json() {
    let result = parse_class_info("not json at all");
    assert!(matches!(result, Err(ParseError::Json(_))));
}

#[test]
fn test_parse_blank_class_name() {
    let result = parse_class_info(r#"{ "class_name": "  " }"#);
    assert!(matches!(result, Err(ParseError::MissingClassName)));
}
