use super::*;
use crate::analysis::trace;
use crate::ast::{CmpOp, Message};
use crate::tree::SourcePos;

#[test]
fn end_to_end_rule() {
    let src = r#"rule "r1" when to_long($message.field) > 5 then set_field("x", "y"); end"#;
    let rule = parse_ok(src);
    assert_eq!(rule.name, "r1");
    assert!(matches!(
        rule.when.expr().kind,
        ExprKind::Comparison { op: CmpOp::Gt, .. }
    ));
    assert_eq!(rule.then.len(), 1);
    let Statement::Function(expr) = &rule.then[0] else {
        panic!("expected function statement");
    };
    let ExprKind::FunctionCall(call) = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(call.name(), "set_field");

    let mut ctx = EvalContext::new(Message::new().with_field("field", 10i64));
    assert!(rule.apply(&mut ctx).unwrap());
    assert_eq!(ctx.message.field("x"), Some(&Value::from("y")));
}

#[test]
fn rule_actions_run_in_order() {
    let src = rule_src(
        "true",
        r#"let greeting = concat("hello ", to_string($message.user));
set_field("greeting", greeting);
set_field("greeting", concat(greeting, "!"));"#,
    );
    let rule = parse_ok(&src);
    let mut ctx = EvalContext::new(Message::new().with_field("user", "ada"));
    assert!(rule.apply(&mut ctx).unwrap());
    assert_eq!(
        ctx.message.field("greeting"),
        Some(&Value::from("hello ada!"))
    );
    assert_eq!(ctx.vars.get("greeting"), Some(&Value::from("hello ada")));
}

#[test]
fn unmatched_rule_runs_no_actions() {
    let rule = parse_ok(&rule_src("false", r#"set_field("x", 1);"#));
    let mut ctx = EvalContext::default();
    assert!(!rule.apply(&mut ctx).unwrap());
    assert!(ctx.message.field("x").is_none());
}

#[test]
fn every_independent_error_is_reported() {
    let src = rule_src("x == 1", "set_field(\"a\", y);\nconcat(\"only\");");
    let failure = parser().parse_rule(&src).unwrap_err();
    let kinds: Vec<_> = failure.kinds().cloned().collect();
    assert_eq!(
        kinds,
        vec![
            ParseErrorKind::UndeclaredVariable { name: "x".into() },
            ParseErrorKind::UndeclaredVariable { name: "y".into() },
            ParseErrorKind::WrongNumberOfArgs {
                function: "concat".into(),
                expected: 2,
                actual: 1,
            },
        ]
    );
    let lines: Vec<usize> = failure.errors.iter().map(|e| e.line()).collect();
    assert_eq!(lines, vec![2, 4, 5]);
}

#[test]
fn unknown_functions_are_reported_and_analysis_continues() {
    let src = rule_src("is_bogus($message.a)", "missing_fn(1);\nconcat(1, \"b\");");
    let kinds = error_kinds(&src);
    assert_eq!(kinds.len(), 3);
    assert_eq!(
        kinds[0],
        ParseErrorKind::UndeclaredFunction {
            name: "is_bogus".into(),
        }
    );
    assert_eq!(
        kinds[1],
        ParseErrorKind::UndeclaredFunction {
            name: "missing_fn".into(),
        }
    );
    assert!(matches!(
        kinds[2],
        ParseErrorKind::IncompatibleArgumentType { .. }
    ));
}

#[test]
fn identical_diagnostics_are_kept_once() {
    let src = rule_src("true", "nope();");
    let tree = rule_tree(&src);
    let mut ctx = analyze_rule(&tree);
    let first = ctx.errors()[0].clone();
    ctx.add_error(first);
    assert_eq!(ctx.errors().len(), 1);
}

#[test]
fn many_diagnostics_keep_insertion_order_without_repeats() {
    let src = rule_src("true", "");
    let tree = rule_tree(&src);
    let mut ctx = analyze_rule(&tree);
    let errors: Vec<ParseError> = (1..=300)
        .map(|line| {
            ParseError::error(
                SourcePos::new(line, 1),
                None,
                ParseErrorKind::UndeclaredVariable {
                    name: format!("v{line}"),
                },
            )
        })
        .collect();
    for error in errors.iter().chain(errors.iter().rev()) {
        ctx.add_error(error.clone());
    }
    assert_eq!(ctx.errors(), errors.as_slice());
}

#[test]
fn same_error_at_different_positions_is_kept() {
    let failure = parser()
        .parse_rule(&rule_src("nope() == nope()", ""))
        .unwrap_err();
    assert_eq!(failure.errors.len(), 2);
    assert_ne!(failure.errors[0].pos, failure.errors[1].pos);
}

#[test]
fn parsing_is_idempotent() {
    let parser = parser();
    let good = rule_src(r#"has_field("a") && to_long($message.n) >= 2"#, r#"set_field("b", [1, 2.5]);"#);
    assert_eq!(parser.parse_rule(&good), parser.parse_rule(&good));

    let bad = rule_src("x > 1", "nope(y);");
    let first = parser.parse_rule(&bad).unwrap_err();
    let second = parser.parse_rule(&bad).unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn grammar_failure_is_the_only_error() {
    let failure = parser()
        .parse_rule("rule \"r\" when then end")
        .unwrap_err();
    assert_eq!(failure.errors.len(), 1);
    let err = &failure.errors[0];
    assert!(matches!(err.kind, ParseErrorKind::SyntaxError { .. }));
    assert_eq!((err.line(), err.column()), (1, 15));
    assert!(err.node.is_none());
}

#[test]
fn out_of_range_integer_is_reported() {
    let kinds = error_kinds(&rule_src("99999999999999999999 > 1", ""));
    assert_eq!(kinds.len(), 1);
    assert!(matches!(kinds[0], ParseErrorKind::SyntaxError { .. }));
}

#[test]
fn failure_display_lists_errors() {
    let failure = parser()
        .parse_rule(&rule_src("true", "nope();"))
        .unwrap_err();
    let text = failure.to_string();
    assert!(text.starts_with("1 error(s) while parsing"));
    assert!(text.contains("error: line 4:1: unknown function `nope`"));
}

#[test]
fn rule_display() {
    let rule = parse_ok(r#"rule "show" when $message.a == 1 then let v = {k: "x"}; set_field(field: "o", value: v); end"#);
    assert_eq!(
        rule.to_string(),
        "rule \"show\"\nwhen\n  $message.a == 1\nthen\n  let v = {\"k\": \"x\"};\n  set_field(field: \"o\", value: v);\nend"
    );
}

#[test]
fn trace_shows_types_and_skips_pass_through_nodes() {
    let src = rule_src(r#"(to_long("3") > 1)"#, "");
    let tree = rule_tree(&src);
    let ctx = analyze_rule(&tree);
    let text = trace(&ctx);
    assert!(text.starts_with("(rule (name \"test\")"));
    assert!(text.contains("(cmp:boolean \">\" (call:long \"to_long\""));
    assert!(!text.contains("paren"));
}

#[test]
fn parsing_under_trace_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    let parser = parser();
    let src = rule_src(r#"has_field("a")"#, r#"set_field("b", 1);"#);
    let traced = tracing::subscriber::with_default(subscriber, || parser.parse_rule(&src));
    assert_eq!(traced, parser.parse_rule(&src));
}
