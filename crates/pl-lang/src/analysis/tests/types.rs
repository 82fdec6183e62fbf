use super::*;

fn incompatible(op: &str, left: ValueType, right: ValueType) -> ParseErrorKind {
    ParseErrorKind::IncompatibleTypes {
        op: op.into(),
        left,
        right,
    }
}

// ---------------------------------------------------------------------------
// Binary operands
// ---------------------------------------------------------------------------

#[test]
fn ordering_requires_identical_types() {
    let kinds = error_kinds(&rule_src(r#"to_long("1") > "a""#, ""));
    assert_eq!(kinds, vec![incompatible(">", ValueType::Long, ValueType::String)]);

    let kinds = error_kinds(&rule_src("1 <= 2.5", ""));
    assert_eq!(kinds, vec![incompatible("<=", ValueType::Long, ValueType::Double)]);
}

#[test]
fn logical_operands_must_match() {
    let kinds = error_kinds(&rule_src(r#"has_field("a") && to_string(1)"#, ""));
    assert_eq!(
        kinds,
        vec![incompatible("&&", ValueType::Boolean, ValueType::String)]
    );

    let kinds = error_kinds(&rule_src(r#"1 || has_field("a")"#, ""));
    assert_eq!(
        kinds,
        vec![incompatible("||", ValueType::Long, ValueType::Boolean)]
    );
}

#[test]
fn matching_operands_pass() {
    parse_ok(&rule_src(r#"to_long("1") > 0 && has_field("a")"#, ""));
    parse_ok(&rule_src(r#""a" < "b" || not has_field("c")"#, ""));
}

#[test]
fn equality_accepts_any_operand_types() {
    parse_ok(&rule_src(r#"to_long("1") == "1""#, ""));
    parse_ok(&rule_src(r#"$message.x != 2.0"#, ""));
    parse_ok(&rule_src(r#"[1] == {a: 1}"#, ""));
}

#[test]
fn nested_mismatches_are_all_reported() {
    let kinds = error_kinds(&rule_src(r#"(1 > "a") || ("b" < 2.0)"#, ""));
    assert_eq!(
        kinds,
        vec![
            incompatible(">", ValueType::Long, ValueType::String),
            incompatible("<", ValueType::String, ValueType::Double),
        ]
    );
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[test]
fn argument_type_must_be_assignable() {
    let kinds = error_kinds(&rule_src("true", r#"concat(1, "b");"#));
    assert_eq!(
        kinds,
        vec![ParseErrorKind::IncompatibleArgumentType {
            function: "concat".into(),
            param: "first".into(),
            expected: ValueType::String,
            actual: ValueType::Long,
        }]
    );
}

#[test]
fn any_parameter_accepts_everything() {
    parse_ok(&rule_src("true", "to_string([1, 2]);\nto_string({k: true});"));
}

#[test]
fn unbound_optional_parameter_is_not_checked() {
    parse_ok(&rule_src(r#"to_long("5") > 1"#, ""));
}

#[test]
fn message_field_values_are_untyped() {
    let kinds = error_kinds(&rule_src("true", "concat($message.a, \"b\");"));
    assert_eq!(
        kinds,
        vec![ParseErrorKind::IncompatibleArgumentType {
            function: "concat".into(),
            param: "first".into(),
            expected: ValueType::String,
            actual: ValueType::Any,
        }]
    );
    parse_ok(&rule_src("true", "concat(to_string($message.a), \"b\");"));
}

// ---------------------------------------------------------------------------
// Message references
// ---------------------------------------------------------------------------

#[test]
fn message_subscript_must_be_string() {
    let kinds = error_kinds(&rule_src(r#"$message[1] == "x""#, ""));
    assert_eq!(
        kinds,
        vec![ParseErrorKind::IncompatibleType {
            expected: ValueType::String,
            actual: ValueType::Long,
        }]
    );
    parse_ok(&rule_src(r#"$message["x"] == "x""#, ""));
}

#[test]
fn message_subscript_accepts_string_variable() {
    parse_ok(&rule_src(
        "true",
        "let name = \"target\";\nset_field(name, $message[name]);",
    ));
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

#[test]
fn variable_types_flow_from_definitions() {
    let src = rule_src(
        "true",
        "let n = to_long(\"5\");\nlet m = n;\nset_field(\"x\", concat(m, \"y\"));",
    );
    let kinds = error_kinds(&src);
    assert_eq!(
        kinds,
        vec![ParseErrorKind::IncompatibleArgumentType {
            function: "concat".into(),
            param: "first".into(),
            expected: ValueType::String,
            actual: ValueType::Long,
        }]
    );
}

#[test]
fn annotated_references_carry_their_type() {
    let src = rule_src("true", "let s = to_string(1);\nset_field(s, s);");
    let rule = parse_ok(&src);
    let call = call_of(&rule.then[1]);
    let field = call.args.get("field").unwrap();
    assert_eq!(
        field.kind,
        ExprKind::VarRef {
            name: "s".into(),
            ty: ValueType::String,
        }
    );
}

#[test]
fn undeclared_variable_is_reported() {
    let kinds = error_kinds(&rule_src("true", "set_field(\"x\", missing);"));
    assert_eq!(
        kinds,
        vec![ParseErrorKind::UndeclaredVariable {
            name: "missing".into(),
        }]
    );
}

#[test]
fn variable_must_be_declared_before_use() {
    let kinds = error_kinds(&rule_src("true", "set_field(\"x\", later);\nlet later = 1;"));
    assert_eq!(
        kinds,
        vec![ParseErrorKind::UndeclaredVariable {
            name: "later".into(),
        }]
    );
}

#[test]
fn first_assignment_defines_the_type() {
    let src = rule_src(
        "true",
        "let v = \"text\";\nlet v = 1;\nset_field(\"x\", concat(v, \"!\"));",
    );
    let rule = parse_ok(&src);
    assert_eq!(rule.then.len(), 3);
}

#[test]
fn field_access_names_are_not_variables() {
    parse_ok(&rule_src("true", "let m = {a: 1};\nset_field(\"x\", m.a);"));
}
