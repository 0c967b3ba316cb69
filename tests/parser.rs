//! End-to-end tests driving the concrete `Lexer` through `Container::parse`
//! and inspecting the resulting AST/scope structure.

use ravi_ast::ast::node::{BinOp, Expr, Stat};
use ravi_ast::ast::ravi_type::RaviTag;
use ravi_ast::ast::symbol::Symbol;
use ravi_ast::error::ParseError;
use ravi_ast::{parse, parse_named, parse_with_mode};

fn body_of(container: &ravi_ast::Container) -> Vec<ravi_ast::ast::node::StatId> {
    let ast = container.ast();
    let main = container.main_function().expect("chunk has a main function");
    ast.functions.get(main).body.clone()
}

#[test]
fn upvalue_backfills_through_intermediate_functions() {
    let src = r#"
        local function outer()
            local x = 1
            local function middle()
                local function inner()
                    return x
                end
                return inner
            end
            return middle
        end
    "#;
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let interner = container.interner();

    let carriers: Vec<_> = ast
        .functions
        .iter()
        .filter(|(_, f)| {
            f.upvalues.iter().any(|&u| {
                matches!(ast.symbols.get(u), Symbol::Upvalue { name, .. } if interner.resolve(*name) == "x")
            })
        })
        .collect();
    // Both `middle` (an intermediate function that never mentions `x`
    // itself) and `inner` (the actual reference site) must carry a
    // backfilled upvalue; `outer` owns the local directly and isn't one
    // of these.
    assert_eq!(carriers.len(), 2, "expected middle and inner to both capture x");

    for (_, f) in &carriers {
        let upvalue = f
            .upvalues
            .iter()
            .copied()
            .find(|&u| matches!(ast.symbols.get(u), Symbol::Upvalue { name, .. } if interner.resolve(*name) == "x"))
            .unwrap();
        let Symbol::Upvalue { captured_local, .. } = ast.symbols.get(upvalue) else {
            unreachable!()
        };
        // Every upvalue on the chain must reference the root LOCAL
        // directly, never an intermediate upvalue (invariant 2).
        assert!(matches!(ast.symbols.get(*captured_local), Symbol::Local { .. }));
    }
}

#[test]
fn shadowed_local_resolves_to_innermost_declaration() {
    let src = r#"
        local x = 1
        do
            local x = 2
            return x
        end
    "#;
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let body = body_of(&container);

    let Stat::Local { symbols: outer_syms, .. } = ast.stats.get(body[0]) else {
        panic!("expected outer local")
    };
    let outer_x = outer_syms[0];

    let Stat::Do { body: do_body, .. } = ast.stats.get(body[1]) else {
        panic!("expected do block")
    };
    let Stat::Local { symbols: inner_syms, .. } = ast.stats.get(do_body[0]) else {
        panic!("expected inner local")
    };
    let inner_x = inner_syms[0];

    let Stat::Return { exprs } = ast.stats.get(do_body[1]) else {
        panic!("expected return")
    };
    let Expr::SymbolRef { symbol } = ast.exprs.get(exprs[0]) else {
        panic!("expected symbol ref")
    };

    assert_eq!(*symbol, inner_x, "return should resolve to the shadowing local");
    assert_ne!(*symbol, outer_x);
}

#[test]
fn typed_locals_carry_their_declared_ravi_type() {
    let src = "local a: integer\nlocal b: number[]\n";
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let body = body_of(&container);

    let Stat::Local { symbols, .. } = ast.stats.get(body[0]) else {
        panic!()
    };
    let Symbol::Local { ravi_type, .. } = ast.symbols.get(symbols[0]) else {
        panic!()
    };
    assert_eq!(ravi_type.tag, RaviTag::Integer);

    let Stat::Local { symbols, .. } = ast.stats.get(body[1]) else {
        panic!()
    };
    let Symbol::Local { ravi_type, .. } = ast.symbols.get(symbols[0]) else {
        panic!()
    };
    assert_eq!(ravi_type.tag, RaviTag::ArrayFloat);
}

#[test]
fn method_declaration_injects_self_as_first_parameter() {
    let src = "function obj:method(a)\nend\n";
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let interner = container.interner();
    let body = body_of(&container);

    let Stat::FunctionStmt { method, function, .. } = ast.stats.get(body[0]) else {
        panic!("expected function statement")
    };
    assert_eq!(method.map(|n| interner.resolve(n).to_string()), Some("method".to_string()));

    let f = ast.functions.get(*function);
    assert!(f.is_method);
    assert_eq!(f.params.len(), 2);
    let Symbol::Local { name, .. } = ast.symbols.get(f.params[0]) else {
        panic!()
    };
    assert_eq!(interner.resolve(*name), "self");
    let Symbol::Local { name, .. } = ast.symbols.get(f.params[1]) else {
        panic!()
    };
    assert_eq!(interner.resolve(*name), "a");
}

#[test]
fn expression_precedence_builds_the_expected_tree_shape() {
    let src = "return 1 + 2 * 3, 2 ^ 3 ^ 4\n";
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let body = body_of(&container);

    let Stat::Return { exprs } = ast.stats.get(body[0]) else {
        panic!()
    };

    // `1 + 2 * 3` — `*` binds tighter than `+`, so the tree leans right
    // under the addition.
    let Expr::Binary { op: BinOp::Add, right, .. } = ast.exprs.get(exprs[0]) else {
        panic!("expected a top-level addition")
    };
    assert!(matches!(ast.exprs.get(*right), Expr::Binary { op: BinOp::Mul, .. }));

    // `2 ^ 3 ^ 4` — `^` is right-associative, so it also leans right.
    let Expr::Binary { op: BinOp::Pow, right, .. } = ast.exprs.get(exprs[1]) else {
        panic!("expected a top-level power")
    };
    assert!(matches!(ast.exprs.get(*right), Expr::Binary { op: BinOp::Pow, .. }));
}

#[test]
fn unbound_name_becomes_a_fresh_global() {
    let src = "local a = 1\nreturn a, b\n";
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let body = body_of(&container);

    let Stat::Local { symbols, .. } = ast.stats.get(body[0]) else {
        panic!()
    };
    let a_local = symbols[0];

    let Stat::Return { exprs } = ast.stats.get(body[1]) else {
        panic!()
    };
    let Expr::SymbolRef { symbol: a_ref } = ast.exprs.get(exprs[0]) else {
        panic!()
    };
    let Expr::SymbolRef { symbol: b_ref } = ast.exprs.get(exprs[1]) else {
        panic!()
    };

    assert_eq!(*a_ref, a_local);
    assert!(matches!(ast.symbols.get(*b_ref), Symbol::Global { .. }));
}

#[test]
fn goto_resolves_forward_to_a_later_label_in_the_same_function() {
    let src = r#"
        do
            goto skip
            local unreachable = 1
            ::skip::
        end
    "#;
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let body = body_of(&container);

    let Stat::Do { body: do_body, .. } = ast.stats.get(body[0]) else {
        panic!()
    };
    let Stat::Goto { target, .. } = ast.stats.get(do_body[0]) else {
        panic!()
    };
    let Stat::Label { symbol: label_symbol } = ast.stats.get(do_body[2]) else {
        panic!()
    };
    assert_eq!(*target, Some(*label_symbol));
}

#[test]
fn unresolvable_goto_is_left_unresolved_rather_than_erroring() {
    let src = "goto nowhere\n";
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let body = body_of(&container);
    let Stat::Goto { target, .. } = ast.stats.get(body[0]) else {
        panic!()
    };
    assert_eq!(*target, None);
}

#[test]
fn break_resolves_structurally_against_the_enclosing_loop_scope() {
    let src = r#"
        while true do
            break
        end
    "#;
    let container = parse(src).expect("parses");
    let ast = container.ast();
    let body = body_of(&container);

    let Stat::While { scope: loop_scope, body: while_body, .. } = ast.stats.get(body[0]) else {
        panic!("expected while loop")
    };
    let Stat::Break { scope } = ast.stats.get(while_body[0]) else {
        panic!("expected break")
    };
    assert_eq!(*scope, *loop_scope);
}

#[test]
fn break_outside_any_loop_is_a_syntax_error() {
    let err = parse("break\n").expect_err("break with an empty loop stack should fail");
    match err {
        ParseError::Syntax(e) => assert_eq!(e.message, "break outside a loop"),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn too_many_locals_in_one_statement_is_a_syntax_error() {
    let names: Vec<String> = (0..201).map(|i| format!("a{i}")).collect();
    let src = format!("local {}\n", names.join(", "));
    let err = parse(&src).expect_err("201 locals should exceed the cap");
    match err {
        ParseError::Syntax(e) => assert_eq!(e.message, "too many local variables"),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn overlong_user_type_name_is_rejected() {
    let long_name = "a".repeat(128);
    let src = format!("local x: {long_name}\n");
    let err = parse(&src).expect_err("128-byte user type name should be rejected");
    match err {
        ParseError::Syntax(e) => assert_eq!(e.message, "User defined type name is too long"),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn mode_mismatch_is_reported_without_touching_the_lexer() {
    let err = parse_with_mode("local x = 1", "chunk", "b").expect_err("binary-only mode should fail");
    match err {
        ParseError::ModeMismatch(mode) => assert_eq!(mode, "b"),
        other => panic!("expected a mode mismatch, got {other:?}"),
    }
}

#[test]
fn release_is_idempotent_and_clears_the_dump() {
    let mut container = parse_named("local x = 1", "chunk").expect("parses");
    assert!(!container.is_released());
    let before = container.tostring();
    assert!(!before.is_empty());

    container.release();
    assert!(container.is_released());
    assert_eq!(container.tostring(), "");

    // Calling release again must not panic or change anything further.
    container.release();
    assert!(container.is_released());
}

#[test]
fn tostring_is_deterministic_for_identical_input() {
    let src = "local function f(a, b)\n  return a + b\nend\n";
    let first = parse(src).expect("parses").tostring();
    let second = parse(src).expect("parses").tostring();
    assert_eq!(first, second);
}

/// An `io::Write` sink shared with the subscriber under test, so the
/// assertions below can inspect what actually got logged rather than
/// just trusting that the `tracing` call sites exist.
#[derive(Clone, Default)]
struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedBuf {
    type Writer = SharedBuf;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("log output is UTF-8")
    }
}

#[test]
fn tracing_logs_entry_and_exit_for_a_successful_parse() {
    let buf = SharedBuf::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_max_level(tracing::Level::TRACE)
        .without_time()
        .with_target(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        parse_named("local x = 1", "chunk").expect("parses");
    });

    let output = buf.contents();
    assert!(output.contains("parsing chunk"), "missing entry event: {output}");
    assert!(output.contains("parse complete"), "missing exit event: {output}");
}

#[test]
fn tracing_logs_the_real_failure_site_on_syntax_error() {
    let buf = SharedBuf::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buf.clone())
        .with_max_level(tracing::Level::TRACE)
        .without_time()
        .with_target(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let err = parse_named("if true then", "chunk").expect_err("unterminated if should fail");
        assert!(matches!(err, ParseError::Syntax(_)));
    });

    let output = buf.contents();
    assert!(output.contains("parse failed"), "missing failure event: {output}");
}
