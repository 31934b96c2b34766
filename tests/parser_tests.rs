use php_syntax::ast::{
    BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, StringKind,
};
use php_syntax::Parser;

fn parse(source: &str) -> Program {
    let mut parser = Parser::new(source.as_bytes(), false, 0);
    parser.parse_program().expect("program should parse")
}

fn parse_err(source: &str) -> php_syntax::ParseError {
    let mut parser = Parser::new(source.as_bytes(), false, 0);
    parser.parse_program().expect_err("program should not parse")
}

/// The single expression of a `<?php expr;` program.
fn expr_of(source: &str) -> Expr {
    let program = parse(source);
    for stmt in program.statements {
        if let StmtKind::Expr(expr) = stmt.kind {
            return expr;
        }
    }
    panic!("no expression statement in {:?}", source);
}

fn as_binary(expr: &Expr) -> (&BinaryOp, &Expr, &Expr) {
    match &expr.kind {
        ExprKind::Binary { op, lhs, rhs } => (op, lhs, rhs),
        other => panic!("expected binary, got {:?}", other),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let expr = expr_of("<?php 1 + 2 * 3;");
    let (op, lhs, rhs) = as_binary(&expr);
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(lhs.kind, ExprKind::IntLit(1)));
    let (op2, ..) = as_binary(rhs);
    assert_eq!(*op2, BinaryOp::Mul);
}

#[test]
fn concat_sits_with_additive() {
    let expr = expr_of("<?php 'a' . 1 + 2;");
    // Left associative: ('a' . 1) + 2.
    let (op, lhs, _) = as_binary(&expr);
    assert_eq!(*op, BinaryOp::Add);
    let (op2, ..) = as_binary(lhs);
    assert_eq!(*op2, BinaryOp::Concat);
}

#[test]
fn pow_is_right_associative() {
    let expr = expr_of("<?php 2 ** 3 ** 2;");
    let (op, lhs, rhs) = as_binary(&expr);
    assert_eq!(*op, BinaryOp::Pow);
    assert!(matches!(lhs.kind, ExprKind::IntLit(2)));
    let (op2, ..) = as_binary(rhs);
    assert_eq!(*op2, BinaryOp::Pow);
}

#[test]
fn unary_minus_binds_looser_than_pow() {
    // -2 ** 2 parses as -(2 ** 2).
    let expr = expr_of("<?php -2 ** 2;");
    match &expr.kind {
        ExprKind::Unary { expr: inner, .. } => {
            let (op, ..) = as_binary(inner);
            assert_eq!(*op, BinaryOp::Pow);
        }
        other => panic!("expected unary, got {:?}", other),
    }
}

#[test]
fn assignment_is_right_associative() {
    let expr = expr_of("<?php $a = $b = 1;");
    match &expr.kind {
        ExprKind::Assign { value, .. } => {
            assert!(matches!(value.kind, ExprKind::Assign { .. }));
        }
        other => panic!("expected assign, got {:?}", other),
    }
}

#[test]
fn ternary_supports_elided_middle() {
    let expr = expr_of("<?php $a ?: 'x';");
    match &expr.kind {
        ExprKind::Ternary { then_branch, .. } => assert!(then_branch.is_none()),
        other => panic!("expected ternary, got {:?}", other),
    }
}

#[test]
fn ternary_is_right_associative() {
    let expr = expr_of("<?php $a ? 1 : $b ? 2 : 3;");
    match &expr.kind {
        ExprKind::Ternary { else_branch, .. } => {
            assert!(matches!(else_branch.kind, ExprKind::Ternary { .. }));
        }
        other => panic!("expected ternary, got {:?}", other),
    }
}

#[test]
fn coalesce_is_right_associative() {
    let expr = expr_of("<?php $a ?? $b ?? $c;");
    match &expr.kind {
        ExprKind::Coalesce { rhs, .. } => {
            assert!(matches!(rhs.kind, ExprKind::Coalesce { .. }));
        }
        other => panic!("expected coalesce, got {:?}", other),
    }
}

#[test]
fn keyword_logic_binds_looser_than_assignment() {
    // $a = 1 and 2 parses as ($a = 1) and 2.
    let expr = expr_of("<?php $a = 1 and 2;");
    let (op, lhs, _) = as_binary(&expr);
    assert_eq!(*op, BinaryOp::And);
    assert!(matches!(lhs.kind, ExprKind::Assign { .. }));
}

#[test]
fn call_and_subscript_chains() {
    let expr = expr_of("<?php f(1)[2];");
    match &expr.kind {
        ExprKind::Subscript { target, .. } => {
            assert!(matches!(target.kind, ExprKind::Call { .. }));
        }
        other => panic!("expected subscript, got {:?}", other),
    }
}

#[test]
fn trailing_comma_in_argument_list() {
    let expr = expr_of("<?php f(1, 2,);");
    match &expr.kind {
        ExprKind::Call { args, .. } => assert_eq!(args.len(), 2),
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn assignment_rejects_non_lvalues() {
    let err = parse_err("<?php 1 = 2;");
    assert!(err.message.contains("variables"));

    let err = parse_err("<?php f() = 2;");
    assert!(err.message.contains("variables"));
}

#[test]
fn subscript_assignments_are_lvalues() {
    assert!(matches!(
        expr_of("<?php $a[0] = 1;").kind,
        ExprKind::Assign { .. }
    ));
    assert!(matches!(
        expr_of("<?php $$a = 1;").kind,
        ExprKind::Assign { .. }
    ));
}

#[test]
fn missing_semicolon_is_reported_with_position() {
    let err = parse_err("<?php $a = 1\n$b = 2;");
    assert!(err.message.contains("syntax error"));
    let source = "<?php $a = 1\n$b = 2;";
    let file = php_syntax::SourceFile::new("t.php", source.as_bytes().to_vec());
    assert_eq!(err.render(&file), format!("{} in t.php:2:1", err.message));
}

#[test]
fn node_ids_are_monotonic() {
    let program = parse("<?php $a = 1 + 2; echo $a;");
    let mut seen = Vec::new();
    fn walk_stmt(stmt: &Stmt, seen: &mut Vec<u32>) {
        seen.push(stmt.id);
        if let StmtKind::Expr(e) = &stmt.kind {
            seen.push(e.id);
        }
    }
    for stmt in &program.statements {
        walk_stmt(stmt, &mut seen);
    }
    for id in &seen {
        assert!(*id < program.next_id);
    }
    let mut sorted = seen.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), seen.len(), "ids must be unique");
}

#[test]
fn node_position_precedes_children() {
    let expr = expr_of("<?php 1 + 2 * 3;");
    fn check(expr: &Expr) {
        if let ExprKind::Binary { lhs, rhs, .. } = &expr.kind {
            assert!(expr.span.start <= lhs.span.start);
            assert!(expr.span.start <= rhs.span.start);
            check(lhs);
            check(rhs);
        }
    }
    check(&expr);
}

#[test]
fn alt_syntax_if() {
    let program = parse("<?php if ($a): echo 1; elseif ($b): echo 2; else: echo 3; endif;");
    assert!(program
        .statements
        .iter()
        .any(|s| matches!(s.kind, StmtKind::If { .. })));
}

#[test]
fn alt_syntax_loops() {
    parse("<?php while ($a): echo 1; endwhile;");
    parse("<?php for (;;): break; endfor;");
    parse("<?php foreach ($a as $v): echo $v; endforeach;");
}

#[test]
fn foreach_with_key() {
    let program = parse("<?php foreach ($a as $k => $v) {}");
    match &program.statements[1].kind {
        StmtKind::Foreach { key_var, .. } => assert!(key_var.is_some()),
        other => panic!("expected foreach, got {:?}", other),
    }
}

#[test]
fn function_declaration_with_types_and_defaults() {
    let program = parse("<?php function f(int|string $x, $y = 1): int { return $x; }");
    let decl = program
        .statements
        .iter()
        .find_map(|s| match &s.kind {
            StmtKind::Function(decl) => Some(decl.clone()),
            _ => None,
        })
        .expect("function declaration");
    assert_eq!(decl.name, "f");
    assert_eq!(decl.params.len(), 2);
    assert_eq!(decl.params[0].types, vec!["int", "string"]);
    assert!(decl.params[1].default.is_some());
    assert_eq!(decl.return_types, vec!["int"]);
}

#[test]
fn nullable_type_shorthand() {
    let program = parse("<?php function f(?int $x) {}");
    if let StmtKind::Function(decl) = &program.statements[1].kind {
        assert_eq!(decl.params[0].types, vec!["null", "int"]);
    } else {
        panic!("expected function");
    }
}

#[test]
fn const_declaration_list() {
    let program = parse("<?php const A = 1, B = 2;");
    match &program.statements[1].kind {
        StmtKind::Const(consts) => {
            assert_eq!(consts.len(), 2);
            assert_eq!(consts[0].0, "A");
        }
        other => panic!("expected const, got {:?}", other),
    }
}

#[test]
fn global_and_declare_statements() {
    parse("<?php global $a, $b;");
    parse("<?php declare(strict_types=1);");
    parse("<?php declare(ticks=1) { echo 1; }");
}

#[test]
fn class_declarations_parse() {
    let program = parse(
        "<?php class Foo extends Bar implements Baz {
            public $x = 1;
            const C = 2;
            function m($a) { return $a; }
        }",
    );
    match &program.statements[1].kind {
        StmtKind::Class(decl) => {
            assert_eq!(decl.name, "Foo");
            assert_eq!(decl.extends.as_deref(), Some("Bar"));
            assert_eq!(decl.members.len(), 3);
        }
        other => panic!("expected class, got {:?}", other),
    }
    parse("<?php interface I { function m(); }");
    parse("<?php trait T { function m() {} }");
}

#[test]
fn array_literals() {
    let expr = expr_of("<?php [1, 'k' => 2, 3,];");
    match &expr.kind {
        ExprKind::ArrayLit(items) => {
            assert_eq!(items.len(), 3);
            assert!(items[0].key.is_none());
            assert!(items[1].key.is_some());
        }
        other => panic!("expected array literal, got {:?}", other),
    }
    assert!(matches!(
        expr_of("<?php array(1, 2);").kind,
        ExprKind::ArrayLit(_)
    ));
}

#[test]
fn intrinsics_parse_to_dedicated_nodes() {
    assert!(matches!(expr_of("<?php isset($a, $b);").kind, ExprKind::Isset(_)));
    assert!(matches!(expr_of("<?php empty($a);").kind, ExprKind::Empty(_)));
    assert!(matches!(expr_of("<?php unset($a);").kind, ExprKind::Unset(_)));
    assert!(matches!(expr_of("<?php eval('1;');").kind, ExprKind::Eval(_)));
    assert!(matches!(expr_of("<?php exit(1);").kind, ExprKind::Exit(_)));
    assert!(matches!(expr_of("<?php die;").kind, ExprKind::Exit(None)));
}

#[test]
fn include_forms() {
    use php_syntax::ast::IncludeKind;
    for (source, kind) in [
        ("<?php include 'a.php';", IncludeKind::Include),
        ("<?php include_once 'a.php';", IncludeKind::IncludeOnce),
        ("<?php require 'a.php';", IncludeKind::Require),
        ("<?php require_once 'a.php';", IncludeKind::RequireOnce),
    ] {
        match expr_of(source).kind {
            ExprKind::Include { kind: k, .. } => assert_eq!(k, kind),
            other => panic!("expected include, got {:?}", other),
        }
    }
}

#[test]
fn string_literal_kinds() {
    match expr_of("<?php 'a\\'b';").kind {
        ExprKind::StringLit { kind, value } => {
            assert_eq!(kind, StringKind::SingleQuoted);
            assert_eq!(value, b"a'b");
        }
        other => panic!("expected string, got {:?}", other),
    }
    match expr_of("<?php \"a$b\";").kind {
        ExprKind::StringLit { kind, value } => {
            assert_eq!(kind, StringKind::DoubleQuoted);
            assert_eq!(value, b"a$b");
        }
        other => panic!("expected string, got {:?}", other),
    }
    match expr_of("<?php <<<EOT\nbody\nEOT;").kind {
        ExprKind::StringLit { kind, value } => {
            assert_eq!(kind, StringKind::Heredoc);
            assert_eq!(value, b"body");
        }
        other => panic!("expected string, got {:?}", other),
    }
    match expr_of("<?php <<<'EOT'\n$raw\nEOT;").kind {
        ExprKind::StringLit { kind, value } => {
            assert_eq!(kind, StringKind::Nowdoc);
            assert_eq!(value, b"$raw");
        }
        other => panic!("expected string, got {:?}", other),
    }
}

#[test]
fn integer_literal_values() {
    assert!(matches!(expr_of("<?php 42;").kind, ExprKind::IntLit(42)));
    assert!(matches!(expr_of("<?php 0x2A;").kind, ExprKind::IntLit(42)));
    assert!(matches!(expr_of("<?php 0b101010;").kind, ExprKind::IntLit(42)));
    assert!(matches!(expr_of("<?php 052;").kind, ExprKind::IntLit(42)));
}

#[test]
fn overflowing_integer_degrades_to_float() {
    assert!(matches!(
        expr_of("<?php 99999999999999999999;").kind,
        ExprKind::FloatLit(_)
    ));
}

#[test]
fn invalid_octal_is_a_parse_error() {
    assert!(parse_err("<?php 08;").message.contains("octal"));
}

#[test]
fn unset_cast_is_rejected() {
    assert!(parse_err("<?php (unset)$a;").message.contains("unset"));
}

#[test]
fn double_colon_is_unsupported() {
    assert!(parse_err("<?php A::b;").message.contains("::"));
}

#[test]
fn break_levels() {
    let program = parse("<?php break 2;");
    match &program.statements[1].kind {
        StmtKind::Break(Some(level)) => {
            assert!(matches!(level.kind, ExprKind::IntLit(2)))
        }
        other => panic!("expected break 2, got {:?}", other),
    }
}

#[test]
fn text_between_code_regions() {
    let program = parse("<?php echo 1; ?>mid<?php echo 2;");
    let texts: Vec<_> = program
        .statements
        .iter()
        .filter(|s| matches!(s.kind, StmtKind::Text(_)))
        .collect();
    assert_eq!(texts.len(), 1);
}
