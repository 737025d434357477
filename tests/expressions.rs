//! End-to-end pipeline semantics: tokenize -> postfix -> evaluate
//! against the bundled key/value context.

use whence::{evaluate_expression, KeyValueContext, Value};

/// The demo state the whole suite evaluates against.
fn demo_context() -> KeyValueContext {
    let mut context = KeyValueContext::new();
    context.set("editorLangId", "typescript");
    context.set("resourceScheme", "untitled");
    context.set("gitOpenRepositoryCount", 1.0);
    context.set("workspaceFolderCount", 1.0);
    context.set("resourceFilename", "readme1.md");
    context.set("supportedFolders", vec!["readme.md", "main.ts"]);
    context.set("isMac", true);
    context.set("isWin", false);
    context
}

fn eval(expression: &str) -> bool {
    evaluate_expression(expression, &demo_context())
        .unwrap_or_else(|e| panic!("'{}' failed: {}", expression, e))
}

// ============================================================================
// Demo Expression Table
// ============================================================================

#[test]
fn test_demo_expression_table() {
    let expressions: &[(&str, bool)] = &[
        ("editorLangId == 'typescript' || editorLangId === 'typescript'", true),
        ("editorLangId != 'typescript' || editorLangId !== 'typescript'", false),
        ("resourceScheme =~ /file/", false),
        ("editorLangId == 'typescript' && isMac", true),
        ("resourceFilename in supportedFolders", false),
        ("resourceFilename not in supportedFolders", true),
        ("workspaceFolderCount > 0 && gitOpenRepositoryCount < 2", true),
        ("workspaceFolderCount > 0 && (gitOpenRepositoryCount >= 1 || isMac)", true),
        ("workspaceFolderCount > 0 && (gitOpenRepositoryCount > 1 || isWin)", false),
        ("isMac", true),
        ("isWin", false),
        ("__undefined_identifer", false),
    ];

    for (expression, expected) in expressions {
        assert_eq!(
            eval(expression),
            *expected,
            "'{}' should evaluate to {}",
            expression,
            expected
        );
    }
}

// ============================================================================
// Precedence and Associativity
// ============================================================================

#[test]
fn test_and_binds_tighter_than_or() {
    let mut context = KeyValueContext::new();
    context.set("a", true);
    context.set("b", false);
    context.set("c", false);

    // (a && b) || c, never a && (b || c)
    assert!(!evaluate_expression("a && b || c", &context).unwrap());
    assert_eq!(
        evaluate_expression("a && b || c", &context).unwrap(),
        evaluate_expression("(a && b) || c", &context).unwrap()
    );

    // c=true flips the unbracketed form through the OR arm
    context.set("c", true);
    assert!(evaluate_expression("a && b || c", &context).unwrap());
}

#[test]
fn test_bracket_override_diverges() {
    // a=false, b=false, c=true: unbracketed true, bracketed false
    let mut context = KeyValueContext::new();
    context.set("a", false);
    context.set("b", false);
    context.set("c", true);
    assert!(evaluate_expression("a && b || c", &context).unwrap());
    assert!(!evaluate_expression("a && (b || c)", &context).unwrap());
}

#[test]
fn test_left_associative_chain_matches_explicit_grouping() {
    let mut context = KeyValueContext::new();
    for (name, value) in [("a", true), ("b", true), ("c", false)] {
        context.set(name, value);
    }
    assert_eq!(
        evaluate_expression("a && b && c", &context).unwrap(),
        evaluate_expression("(a && b) && c", &context).unwrap()
    );

    context.set("c", true);
    assert!(evaluate_expression("a && b && c", &context).unwrap());
    assert!(evaluate_expression("(a && b) && c", &context).unwrap());
}

#[test]
fn test_negation_grouping_diverges() {
    let mut context = KeyValueContext::new();
    context.set("a", true);
    context.set("b", true);

    // a=true, b=true is the case where the two groupings disagree
    assert!(!evaluate_expression("!(a || b)", &context).unwrap());
    assert!(evaluate_expression("!a || b", &context).unwrap());
}

#[test]
fn test_double_negation() {
    let mut context = KeyValueContext::new();
    context.set("a", true);
    assert!(evaluate_expression("!!a", &context).unwrap());
    assert!(!evaluate_expression("!!!a", &context).unwrap());
}

#[test]
fn test_comparison_binds_tighter_than_logic() {
    // Parses as (count > 0) && (count < 2), not count > (0 && count) ...
    let mut context = KeyValueContext::new();
    context.set("count", 1.0);
    assert!(evaluate_expression("count > 0 && count < 2", &context).unwrap());
    assert!(!evaluate_expression("count > 1 && count < 2", &context).unwrap());
}

// ============================================================================
// Literals and Operand Kinds
// ============================================================================

#[test]
fn test_numeric_comparisons() {
    assert!(eval("workspaceFolderCount >= 1"));
    assert!(eval("workspaceFolderCount <= 1"));
    assert!(!eval("workspaceFolderCount > 1"));
    assert!(eval("gitOpenRepositoryCount < 1.5"));
    assert!(!eval("gitOpenRepositoryCount == 2"));
}

#[test]
fn test_string_literal_equality() {
    assert!(eval("editorLangId == 'typescript'"));
    assert!(!eval("editorLangId == 'rust'"));
    assert!(eval("editorLangId != 'rust'"));
}

#[test]
fn test_regex_match_against_state() {
    assert!(eval("resourceScheme =~ /^unt/"));
    assert!(eval("resourceFilename =~ /readme/"));
    assert!(!eval("resourceScheme =~ /file/"));
}

#[test]
fn test_membership_against_state() {
    assert!(!eval("resourceFilename in supportedFolders"));
    assert!(eval("resourceFilename not in supportedFolders"));
    // A name that is actually present
    let mut context = demo_context();
    context.set("resourceFilename", "readme.md");
    assert!(evaluate_expression("resourceFilename in supportedFolders", &context).unwrap());
    assert!(!evaluate_expression("resourceFilename not in supportedFolders", &context).unwrap());
}

#[test]
fn test_bare_value_truthiness() {
    let mut context = KeyValueContext::new();
    context.set("emptyText", "");
    context.set("zero", 0.0);
    context.set("someText", "x");
    context.set("list", Vec::<String>::new());

    assert!(!evaluate_expression("emptyText", &context).unwrap());
    assert!(!evaluate_expression("zero", &context).unwrap());
    assert!(evaluate_expression("someText", &context).unwrap());
    assert!(evaluate_expression("list", &context).unwrap());
}

// ============================================================================
// Determinism and Degenerate Inputs
// ============================================================================

#[test]
fn test_evaluation_is_deterministic() {
    let expression = "workspaceFolderCount > 0 && (gitOpenRepositoryCount >= 1 || isMac)";
    let context = demo_context();
    let first = evaluate_expression(expression, &context).unwrap();
    for _ in 0..10 {
        assert_eq!(evaluate_expression(expression, &context).unwrap(), first);
    }
}

#[test]
fn test_empty_input_evaluates_false() {
    let context = demo_context();
    assert!(!evaluate_expression("", &context).unwrap());
    assert!(!evaluate_expression("   ", &context).unwrap());
}

#[test]
fn test_unknown_identifier_is_falsy() {
    assert!(!eval("__undefined_identifer"));
    assert!(eval("!__undefined_identifer"));
    assert!(eval("isMac || __undefined_identifer"));
    assert!(!eval("isMac && __undefined_identifer"));
}

#[test]
fn test_deep_bracket_nesting() {
    let mut context = KeyValueContext::new();
    context.set("a", true);
    assert!(evaluate_expression("((((a))))", &context).unwrap());
    assert!(!evaluate_expression("!((((a))))", &context).unwrap());
}

#[test]
fn test_values_importable_directly() {
    let mut context = KeyValueContext::new();
    context.set("n", Value::Number(3.0));
    context.set("names", Value::from(vec!["x", "y"]));
    assert!(evaluate_expression("n > 2 && 'x' in names", &context).unwrap());
}

#[test]
fn test_integer_bindings_compare_numerically() {
    // Integers go in through From<i64> and land on the number tier
    let mut context = KeyValueContext::new();
    context.set("folderCount", 3i64);
    assert_eq!(context.get("folderCount"), Some(&Value::Number(3.0)));
    assert!(evaluate_expression("folderCount > 2.5", &context).unwrap());
    assert!(evaluate_expression("folderCount == 3", &context).unwrap());
}
