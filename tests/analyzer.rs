use std::{rc::Rc, sync::Arc};

use ember::{
    analyzer::{
        analyze,
        dump::dump_module,
        error::{ErrorKind, SemanticError},
        scope::{FuncInfo, Variable},
        AnalyzerConfig,
    },
    parser::{
        ast::{ExprNode, ExprType, FuncNode, Module, StmtNode, StmtType},
        Parser,
    },
    source::EmberSource,
};
use expect_test::expect;
use lasso::Rodeo;
use serde_json::Value;

struct Analyzed {
    module: Module,
    errors: Vec<SemanticError>,
    interner: Rodeo,
}

fn run_with(code: &str, config: &AnalyzerConfig) -> Analyzed {
    let src = Rc::new(EmberSource::from_string("main", code));
    let mut interner = Rodeo::default();
    let mut module = Parser::new(&src, &mut interner)
        .parse()
        .unwrap_or_else(|e| panic!("parse failed: {:?}", e.area()));
    let errors = analyze(&mut module, &mut interner, config).expect("internal scope error");
    Analyzed {
        module,
        errors,
        interner,
    }
}

fn run(code: &str) -> Analyzed {
    run_with(code, &AnalyzerConfig::default())
}

fn kinds(errors: &[SemanticError]) -> Vec<ErrorKind> {
    errors.iter().map(|e| e.kind()).collect()
}

fn rendered(errors: &[SemanticError]) -> String {
    errors.iter().map(|e| format!("{}\n", e)).collect()
}

fn named_fn(stmt: &StmtNode) -> &FuncNode {
    match &stmt.typ {
        StmtType::Fn { func, .. } => func,
        other => panic!("expected a named function, got {:?}", other),
    }
}

fn let_value(stmt: &StmtNode) -> &ExprNode {
    match &stmt.typ {
        StmtType::Let { value, .. } => value,
        other => panic!("expected a let, got {:?}", other),
    }
}

fn fn_literal(expr: &ExprNode) -> &FuncNode {
    match &expr.typ {
        ExprType::Function(func) => func,
        other => panic!("expected a function literal, got {:?}", other),
    }
}

fn returned(stmt: &StmtNode) -> &ExprNode {
    match &stmt.typ {
        StmtType::Return(Some(v)) => v,
        other => panic!("expected a return, got {:?}", other),
    }
}

fn ident_var(expr: &ExprNode) -> Variable {
    match &expr.typ {
        ExprType::Var(ident) => ident.var.expect("identifier was not resolved"),
        ExprType::This(node) => node.var.expect("this was not resolved"),
        other => panic!("expected an identifier, got {:?}", other),
    }
}

/// Collects every `ident`/`this` node of a dump.
fn dumped_refs<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if matches!(map.get("kind"), Some(Value::String(k)) if k == "ident" || k == "this") {
                out.push(value);
            }
            map.values().for_each(|v| dumped_refs(v, out));
        }
        Value::Array(items) => items.iter().for_each(|v| dumped_refs(v, out)),
        _ => {}
    }
}

#[test]
fn well_scoped_program_resolves_every_reference() {
    let a = run(r#"
        import helper from "lib/helper";
        const limit = 10;
        let total = 0;
        fn add(n) { total += n; return total; }
        for i in range(limit) {
            if i % 2 == 0 { add(i); } else { continue; }
        }
        let counter = struct {
            count: 0,
            bump: fn() { this.count++; return this; },
        };
        try { helper(counter.bump()); } catch err { print(err); } finally { total = 0; }
        while total < limit { total = total + 1; break; }
    "#);
    assert_eq!(a.errors, vec![]);

    let dump: Value = serde_json::from_str(&dump_module(&a.module, &a.interner)).unwrap();
    let mut refs = vec![];
    dumped_refs(&dump, &mut refs);
    assert!(refs.len() > 15);
    for r in refs {
        assert!(
            !r["var"].is_null() || r["builtin"] == true,
            "unresolved reference {}",
            r
        );
    }
}

#[test]
fn capture_chain_has_one_link_per_function() {
    let a = run("
        let x = 1;
        fn outer() {
            fn middle() {
                fn inner() { return x + x; }
            }
        }
    ");
    assert_eq!(a.errors, vec![]);

    let x = match &a.module.stmts[0].typ {
        StmtType::Let { name, .. } => name.var.unwrap(),
        _ => unreachable!(),
    };
    let outer = named_fn(&a.module.stmts[1]);
    let middle = named_fn(&outer.body[0]);
    let inner = named_fn(&middle.body[0]);

    let chain: Vec<&FuncInfo> = vec![&outer.info, &middle.info, &inner.info];
    let mut parent = x;
    for info in chain {
        assert_eq!(info.capture_count(), 1);
        assert_eq!(info.parent_captures, vec![parent]);
        let cell = info.captures[0];
        assert!(cell.is_capture);
        assert_eq!(cell.slot, 0);
        assert_ne!(cell, parent);
        parent = cell;
    }

    let ExprType::Op(left, _, right) = &returned(&inner.body[0]).typ else {
        panic!("expected a binary expression");
    };
    assert_eq!(ident_var(left), parent);
    assert_eq!(ident_var(right), parent);
}

#[test]
fn capture_memoization_spans_sibling_references() {
    let a = run("
        let x = 1;
        fn f() {
            let g = fn() { return x; };
            return x;
        }
    ");
    assert_eq!(a.errors, vec![]);

    let f = named_fn(&a.module.stmts[1]);
    let g = fn_literal(let_value(&f.body[0]));
    // `g` chained through `f` first; `f`'s own read reuses that link
    assert_eq!(f.info.capture_count(), 1);
    assert_eq!(g.info.parent_captures, vec![f.info.captures[0]]);
    assert_eq!(ident_var(returned(&f.body[1])), f.info.captures[0]);
}

#[test]
fn captures_inherit_constness() {
    let a = run("const c = 1; let v = 2; fn f() { return c + v; }");
    assert_eq!(a.errors, vec![]);

    let f = named_fn(&a.module.stmts[2]);
    assert!(f.info.captures[0].is_const);
    assert!(!f.info.captures[1].is_const);
}

#[test]
fn duplicate_symbol_in_same_scope() {
    let a = run("let a = 1; const a = 1;");
    assert_eq!(kinds(&a.errors), [ErrorKind::DuplicateSymbol]);
    assert_eq!(a.errors[0].symbol(), Some("a"));
}

#[test]
fn duplicate_declaration_keeps_the_first_binding() {
    let a = run("let a = 1; const a = 1; a = 2;");
    assert_eq!(kinds(&a.errors), [ErrorKind::DuplicateSymbol]);

    let StmtType::Let { name: first, .. } = &a.module.stmts[0].typ else {
        panic!("expected a let");
    };
    let StmtType::Let { name: second, .. } = &a.module.stmts[1].typ else {
        panic!("expected a const");
    };
    assert_eq!(second.var, None);

    let StmtType::Expr(ExprNode {
        typ: ExprType::Assign { target, .. },
        ..
    }) = &a.module.stmts[2].typ
    else {
        panic!("expected an assignment");
    };
    let target = ident_var(target);
    assert_eq!(Some(target), first.var);
    assert!(!target.is_const);
    assert_eq!(a.module.info.vars, vec![target]);
}

#[test]
fn shadowing_in_nested_scopes_is_allowed() {
    let a = run("let a = 1; { let a = 2; { const a = 3; } } fn f(a) { return a; }");
    assert_eq!(a.errors, vec![]);
    assert_eq!(a.module.info.local_count, 4);
}

#[test]
fn parameters_share_the_function_scope() {
    let a = run("fn f(a, a) { let a = 1; }");
    assert_eq!(
        kinds(&a.errors),
        [ErrorKind::DuplicateSymbol, ErrorKind::DuplicateSymbol]
    );
}

#[test]
fn assignment_to_const() {
    let a = run("const a = 1; a = 1;");
    assert_eq!(kinds(&a.errors), [ErrorKind::ImmutableAssignment]);
    assert_eq!(a.errors[0].symbol(), Some("a"));
}

#[test]
fn compound_and_postfix_updates_check_constness() {
    let a = run("const c = 1; c += 1; c--; import m from \"mod\"; m++; fn f() {} f = 2; print = 3;");
    assert_eq!(
        kinds(&a.errors),
        [ErrorKind::ImmutableAssignment; 5]
    );
}

#[test]
fn undefined_reads_and_writes_are_all_reported() {
    let a = run("a = a;");
    expect![[r#"
        symbol `a` is not defined, at main:1:1
        symbol `a` is not defined, at main:1:5
    "#]]
    .assert_eq(&rendered(&a.errors));
}

#[test]
fn assignment_does_not_declare() {
    let a = run("x = 1; x;");
    assert_eq!(
        kinds(&a.errors),
        [ErrorKind::UndefinedSymbol, ErrorKind::UndefinedSymbol]
    );
}

#[test]
fn let_initializer_cannot_see_its_own_name() {
    let a = run("let a = a;");
    assert_eq!(kinds(&a.errors), [ErrorKind::UndefinedSymbol]);
}

#[test]
fn loop_control_outside_loops() {
    let a = run("break;\ncontinue;\nwhile true { break; continue; }");
    expect![[r#"
        `break` outside of a loop, at main:1:1
        `continue` outside of a loop, at main:2:1
    "#]]
    .assert_eq(&rendered(&a.errors));
}

#[test]
fn functions_do_not_inherit_enclosing_loops() {
    let a = run("while true { let g = fn() { break; }; for x in [] { continue; } }");
    assert_eq!(kinds(&a.errors), [ErrorKind::BreakOutsideLoop]);
}

#[test]
fn this_outside_struct() {
    let a = run("let a = this;");
    assert_eq!(kinds(&a.errors), [ErrorKind::ThisOutsideStruct]);
}

#[test]
fn this_gets_a_slot_per_struct() {
    let a = run("
        let s = struct {
            me: this,
            again: this,
            left: struct { me: this },
            right: struct { me: this },
        };
    ");
    assert_eq!(a.errors, vec![]);

    let ExprType::Struct(outer) = &let_value(&a.module.stmts[0]).typ else {
        panic!("expected a struct literal");
    };
    let own = ident_var(&outer.fields[0].value);
    assert_eq!(ident_var(&outer.fields[1].value), own);
    assert!(own.is_const && !own.is_capture);
    assert_eq!(outer.scope.vars, vec![own]);

    let nested: Vec<Variable> = outer.fields[2..]
        .iter()
        .map(|f| match &f.value.typ {
            ExprType::Struct(inner) => ident_var(&inner.fields[0].value),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(
        [own.slot, nested[0].slot, nested[1].slot],
        [0, 1, 2]
    );
    // `s` itself comes after the three self bindings
    assert_eq!(a.module.info.local_count, 4);
}

#[test]
fn methods_capture_this() {
    let a = run("
        fn make() {
            let n = 0;
            return struct {
                get: fn() { return this; },
                also: fn() { return this; },
            };
        }
    ");
    assert_eq!(a.errors, vec![]);

    let make = named_fn(&a.module.stmts[0]);
    let ExprType::Struct(node) = &returned(&make.body[1]).typ else {
        panic!("expected a struct literal");
    };
    let own = node.scope.vars[0];
    assert_eq!(own.slot, 1);
    assert_eq!(make.info.local_count, 2);

    for field in &node.fields {
        let method = fn_literal(&field.value);
        assert_eq!(method.info.parent_captures, vec![own]);
        let cell = ident_var(returned(&method.body[0]));
        assert!(cell.is_capture && cell.is_const);
        assert_eq!(cell, method.info.captures[0]);
    }
}

#[test]
fn capture_counts_and_order() {
    let a = run("
        let a = 1;
        let b = 2;
        fn pure(x) { return x * 2; }
        let both = fn() { return b + a + b; };
    ");
    assert_eq!(a.errors, vec![]);

    let pure = named_fn(&a.module.stmts[2]);
    assert_eq!(pure.info.capture_count(), 0);
    assert!(pure.info.parent_captures.is_empty());

    let both = fn_literal(let_value(&a.module.stmts[3]));
    assert_eq!(both.info.capture_count(), 2);
    let names: Vec<&str> = both
        .info
        .parent_captures
        .iter()
        .map(|v| a.interner.resolve(&v.symbol))
        .collect();
    assert_eq!(names, ["b", "a"]);
    assert_eq!(
        both.info.captures.iter().map(|v| v.slot).collect::<Vec<_>>(),
        [0, 1]
    );
}

#[test]
fn for_loop_allocates_binding_and_iterator() {
    let a = run("for b in [] {}");
    assert_eq!(a.errors, vec![]);
    assert_eq!(a.module.info.local_count, 2);

    let StmtType::For {
        names,
        iterator,
        scope,
        ..
    } = &a.module.stmts[0].typ
    else {
        panic!("expected a for loop");
    };
    let (bound, hidden) = (names[0].var.unwrap(), iterator.unwrap());
    assert_eq!((bound.slot, hidden.slot), (0, 1));
    assert!(!hidden.is_const);
    assert_eq!(scope.vars, vec![bound, hidden]);
}

#[test]
fn nested_for_loops_use_distinct_iterators() {
    let a = run("for a in [] { for b in [] { for c in [] { a + b + c; } } }");
    assert_eq!(a.errors, vec![]);
    assert_eq!(a.module.info.local_count, 6);

    let mut names = vec![];
    let mut stmt = &a.module.stmts[0];
    while let StmtType::For { iterator, body, .. } = &stmt.typ {
        names.push(a.interner.resolve(&iterator.unwrap().symbol).to_string());
        match body.stmts.first() {
            Some(next) => stmt = next,
            None => break,
        }
    }
    assert_eq!(names, ["$iter0", "$iter1", "$iter2"]);
}

#[test]
fn sibling_functions_can_recurse_mutually() {
    let a = run("
        fn even(n) { if n == 0 { return true; } return odd(n - 1); }
        fn odd(n) { if n == 0 { return false; } return even(n - 1); }
        even(10);
    ");
    assert_eq!(a.errors, vec![]);

    let even = named_fn(&a.module.stmts[0]);
    let odd = named_fn(&a.module.stmts[1]);
    let captured = |f: &FuncNode| a.interner.resolve(&f.info.captures[0].symbol).to_string();
    assert_eq!(captured(even), "odd");
    assert_eq!(captured(odd), "even");
    assert!(even.info.captures[0].is_const);
}

#[test]
fn catch_binding_is_scoped_to_the_catch_block() {
    let a = run("try { throw 1; } catch e { print(e); } print(e);");
    assert_eq!(kinds(&a.errors), [ErrorKind::UndefinedSymbol]);
    assert_eq!(a.errors[0].symbol(), Some("e"));

    let StmtType::Try {
        catch: Some(catch), ..
    } = &a.module.stmts[0].typ
    else {
        panic!("expected try/catch");
    };
    assert_eq!(catch.scope.vars, vec![catch.name.var.unwrap()]);
}

#[test]
fn too_many_locals_is_reported_once_per_function() {
    let config = AnalyzerConfig {
        max_locals: 2,
        ..Default::default()
    };
    let a = run_with(
        "let a = 1; let b = 2; let c = 3; let d = 4; fn f(x, y) { let z = 1; }",
        &config,
    );
    assert_eq!(
        kinds(&a.errors),
        [ErrorKind::TooManyLocals, ErrorKind::TooManyLocals]
    );
    assert_eq!(a.module.info.local_count, 2);
}

#[test]
fn custom_builtins() {
    let config = AnalyzerConfig {
        builtins: Arc::new(["emit".to_string()].into_iter().collect()),
        ..Default::default()
    };
    let a = run_with("emit(1); print(2);", &config);
    assert_eq!(kinds(&a.errors), [ErrorKind::UndefinedSymbol]);
    assert_eq!(a.errors[0].symbol(), Some("print"));
}

#[test]
fn errors_accumulate_across_the_module() {
    let a = run("
        let a = 1;
        let a = 2;
        const k = 0;
        k = 1;
        missing();
        break;
        this;
    ");
    assert_eq!(
        kinds(&a.errors),
        [
            ErrorKind::DuplicateSymbol,
            ErrorKind::ImmutableAssignment,
            ErrorKind::UndefinedSymbol,
            ErrorKind::BreakOutsideLoop,
            ErrorKind::ThisOutsideStruct,
        ]
    );
}

#[test]
fn variable_ids_restart_for_every_run() {
    let code = "let x = 1; fn f() { return struct { v: x, me: this }; }";
    let first = run(code);
    let second = run(code);
    assert_eq!(
        dump_module(&first.module, &first.interner),
        dump_module(&second.module, &second.interner)
    );
}

#[test]
fn local_declared_after_a_capture_takes_over() {
    let a = run("let a = 1; fn f() { let g = a; let a = 2; return a; }");
    assert_eq!(a.errors, vec![]);

    let f = named_fn(&a.module.stmts[1]);
    let earlier = ident_var(let_value(&f.body[0]));
    assert!(earlier.is_capture);

    let StmtType::Let { name, .. } = &f.body[1].typ else {
        panic!("expected a let");
    };
    let local = name.var.unwrap();
    let read = ident_var(returned(&f.body[2]));
    assert_eq!(read, local);
    assert!(!read.is_capture);
    assert_eq!(read.slot, 1);
    assert_eq!(f.info.captures, vec![earlier]);
}

#[test]
fn capture_overflow_is_reported_once() {
    let config = AnalyzerConfig {
        max_locals: 1,
        ..AnalyzerConfig::default()
    };
    let a = run_with(
        "let a = 1;
         fn() {
             let b = 2;
             fn() { let x = a + b; let y = 3; };
         };",
        &config,
    );
    assert_eq!(kinds(&a.errors), [ErrorKind::TooManyLocals]);

    let StmtType::Expr(outer) = &a.module.stmts[1].typ else {
        panic!("expected an expression statement");
    };
    let outer = fn_literal(outer);
    let StmtType::Expr(inner) = &outer.body[1].typ else {
        panic!("expected an expression statement");
    };
    let inner = fn_literal(inner);

    // `a` fits the single capture slot, `b` does not
    let StmtType::Let { name: x, value, .. } = &inner.body[0].typ else {
        panic!("expected a let");
    };
    let ExprType::Op(left, _, right) = &value.typ else {
        panic!("expected a binary expression");
    };
    assert!(ident_var(left).is_capture);
    assert!(matches!(&right.typ, ExprType::Var(ident) if ident.var.is_none() && !ident.builtin));

    // the function is out of slots, later declarations are refused silently
    let StmtType::Let { name: y, .. } = &inner.body[1].typ else {
        panic!("expected a let");
    };
    assert_eq!((x.var, y.var), (None, None));
    assert_eq!(inner.info.capture_count(), 1);
    assert_eq!(inner.info.local_count, 0);

    assert_eq!(outer.info.capture_count(), 1);
    assert_eq!(outer.info.local_count, 1);
}

#[test]
fn while_loop_has_its_own_scope() {
    let a = run("while true { let x = 1; }");
    assert_eq!(a.errors, vec![]);

    let StmtType::While { body, scope, .. } = &a.module.stmts[0].typ else {
        panic!("expected a while loop");
    };
    assert!(scope.vars.is_empty());
    assert_eq!(body.scope.vars.len(), 1);
    assert_eq!(a.module.info.local_count, 1);
}
