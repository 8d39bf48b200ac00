//! Integration tests for fun-to-CPS conversion.
//!
//! These exercise:
//! - Literal, record, select, and switch conversion shapes
//! - The calling convention (return points, continuation parameters)
//! - Primitive dispatch by arity, including the call/cc special case
//! - The memoized fun-to-CPS variable mapping
//! - The binding-tag uniqueness invariant
//! - Fatal contract violations (unsupported shapes)

use pretty_assertions::assert_eq;
use rill_common::VarSupply;
use rill_cps::{convert, walk, Exp, Path, Value};
use rill_fun as fun;
use rill_prim::Op;

// ── Helpers ────────────────────────────────────────────────────────────

/// Convert a single top-level expression with a fresh session.
fn convert_one(exp: fun::Exp) -> (Exp, rill_common::Var) {
    let mut supply = VarSupply::new();
    convert(vec![exp], &mut supply)
}

/// Collect the tags of every binding site in the tree: `Fix` entry names
/// and parameters, `Record` and `Select` bindings, and `Primop` results.
fn bound_tags(exp: &Exp) -> Vec<u32> {
    let mut tags = Vec::new();
    walk(exp, &mut |e| match e {
        Exp::Fix(fix) => {
            for d in &fix.fns {
                tags.push(d.name.tag);
                tags.extend(d.params.iter().map(|p| p.tag));
            }
        }
        Exp::Record(r) => tags.push(r.binding.tag),
        Exp::Select(s) => tags.push(s.binding.tag),
        Exp::Primop(p) => tags.extend(p.results.iter().map(|w| w.tag)),
        _ => {}
    });
    tags
}

// ── Literals and sequencing ────────────────────────────────────────────

/// An integer unit delivers itself to the exit continuation.
#[test]
fn int_literal_goes_to_exit() {
    let (exp, exit) = convert_one(fun::Exp::Int(7));
    assert_eq!(exp, Exp::app(Value::Var(exit), vec![Value::Int(7)]));
}

#[test]
fn string_literal_goes_to_exit() {
    let (exp, exit) = convert_one(fun::Exp::Str("hello".into()));
    assert_eq!(
        exp,
        Exp::app(Value::Var(exit), vec![Value::Str("hello".into())])
    );
}

/// An empty compilation sequence still produces a complete program.
#[test]
fn empty_sequence_exits_with_zero() {
    let mut supply = VarSupply::new();
    let (exp, exit) = convert(vec![], &mut supply);
    assert_eq!(exp, Exp::app(Value::Var(exit), vec![Value::Int(0)]));
}

/// Earlier units run for effect; only the last unit's value reaches the
/// exit continuation.
#[test]
fn sequence_discards_intermediate_values() {
    let mut supply = VarSupply::new();
    let (exp, exit) = convert(vec![fun::Exp::Int(1), fun::Exp::Int(2)], &mut supply);
    assert_eq!(exp, Exp::app(Value::Var(exit), vec![Value::Int(2)]));
}

// ── Records and selection ──────────────────────────────────────────────

#[test]
fn record_binds_fresh_var_with_trivial_paths() {
    let (exp, exit) = convert_one(fun::Exp::Record(vec![fun::Exp::Int(1), fun::Exp::Int(2)]));
    let Exp::Record(r) = exp else {
        panic!("expected a record node, got {exp}");
    };
    assert_eq!(r.fields.len(), 2);
    assert!(r.fields.iter().all(|f| f.path == Path::Off(0)));
    assert_eq!(r.fields[0].value, Value::Int(1));
    assert_eq!(r.fields[1].value, Value::Int(2));
    assert_eq!(
        *r.body,
        Exp::app(Value::Var(exit), vec![Value::Var(r.binding)])
    );
}

/// The empty record carries no information and converts to an integer.
#[test]
fn empty_record_is_integer_zero() {
    let (exp, exit) = convert_one(fun::Exp::Record(vec![]));
    assert_eq!(exp, Exp::app(Value::Var(exit), vec![Value::Int(0)]));
}

#[test]
fn select_projects_from_converted_record() {
    let rec = fun::Exp::Record(vec![fun::Exp::Int(10), fun::Exp::Int(20)]);
    let (exp, exit) = convert_one(fun::Exp::select(1, rec));
    let Exp::Record(r) = exp else {
        panic!("expected a record node");
    };
    let Exp::Select(s) = *r.body else {
        panic!("expected a select under the record");
    };
    assert_eq!(s.index, 1);
    assert_eq!(s.record, Value::Var(r.binding));
    assert_eq!(
        *s.body,
        Exp::app(Value::Var(exit), vec![Value::Var(s.binding)])
    );
}

// ── Functions and application ──────────────────────────────────────────

/// A lambda becomes a single-entry `Fix` whose body tail-calls the added
/// continuation parameter; both uses of the source parameter map to the
/// same CPS variable.
#[test]
fn lambda_gets_continuation_parameter() {
    let mut supply = VarSupply::new();
    let x = supply.fresh("x");
    let lam = fun::Exp::lambda(x.clone(), fun::Exp::Var(x));
    let (exp, exit) = convert(vec![lam], &mut supply);

    let Exp::Fix(fix) = exp else {
        panic!("expected a fix");
    };
    assert_eq!(fix.fns.len(), 1);
    let def = &fix.fns[0];
    assert_eq!(def.params.len(), 2, "parameter plus continuation");
    let (param, kont) = (&def.params[0], &def.params[1]);
    assert_eq!(
        def.body,
        Exp::app(Value::Var(kont.clone()), vec![Value::Var(param.clone())]),
        "body returns the parameter through the continuation"
    );
    assert_eq!(
        *fix.body,
        Exp::app(Value::Var(exit), vec![Value::Var(def.name.clone())]),
        "the function itself is the expression's value"
    );
}

/// An ordinary call reifies its return point as a fresh function and
/// passes it as the extra argument.
#[test]
fn application_reifies_return_point() {
    let mut supply = VarSupply::new();
    let x = supply.fresh("x");
    let identity = fun::Exp::lambda(x.clone(), fun::Exp::Var(x));
    let call = fun::Exp::app(identity, fun::Exp::Int(5));
    let (exp, exit) = convert(vec![call], &mut supply);

    let Exp::Fix(outer) = exp else {
        panic!("expected return-point fix");
    };
    assert_eq!(outer.fns.len(), 1);
    let ret = &outer.fns[0];
    assert_eq!(ret.params.len(), 1);
    assert_eq!(
        ret.body,
        Exp::app(Value::Var(exit), vec![Value::Var(ret.params[0].clone())])
    );

    let Exp::Fix(inner) = *outer.body else {
        panic!("expected callee fix");
    };
    let callee = &inner.fns[0];
    assert_eq!(
        *inner.body,
        Exp::app(
            Value::Var(callee.name.clone()),
            vec![Value::Int(5), Value::Var(ret.name.clone())]
        ),
        "call passes the argument and the return point"
    );
}

/// Functions in one `Fix` group see each other through the same memoized
/// variable mapping.
#[test]
fn fix_group_shares_scope() {
    let mut supply = VarSupply::new();
    let f = supply.fresh("f");
    let g = supply.fresh("g");
    let a = supply.fresh("a");
    let b = supply.fresh("b");
    // fix f(a) = g(a); g(b) = b in f(0)
    let program = fun::Exp::fix(
        vec![f.clone(), g.clone()],
        vec![
            fun::Lambda {
                param: a.clone(),
                body: fun::Exp::app(fun::Exp::Var(g), fun::Exp::Var(a)),
            },
            fun::Lambda {
                param: b.clone(),
                body: fun::Exp::Var(b),
            },
        ],
        fun::Exp::app(fun::Exp::Var(f), fun::Exp::Int(0)),
    );
    let (exp, _exit) = convert(vec![program], &mut supply);

    let Exp::Fix(fix) = exp else {
        panic!("expected a fix");
    };
    assert_eq!(fix.fns.len(), 2);
    let g_cps = fix.fns[1].name.clone();
    // f's body calls g through a return-point fix; find the App and check
    // the callee is the same variable g is bound to.
    let mut saw_call_to_g = false;
    walk(&fix.fns[0].body, &mut |e| {
        if let Exp::App(app) = e {
            if app.callee == Value::Var(g_cps.clone()) {
                saw_call_to_g = true;
            }
        }
    });
    assert!(saw_call_to_g, "f's body must reference the converted g");
}

// ── Switches ───────────────────────────────────────────────────────────

/// A boolean switch becomes an inequality test against zero whose arms
/// join through a fresh join-point function.
#[test]
fn boolean_switch_builds_join_point() {
    let program = fun::Exp::cond(fun::Exp::Int(1), fun::Exp::Int(10), fun::Exp::Int(20));
    let (exp, exit) = convert_one(program);

    let Exp::Fix(fix) = exp else {
        panic!("expected the join fix");
    };
    let join = &fix.fns[0];
    assert_eq!(join.params.len(), 1);
    assert_eq!(
        join.body,
        Exp::app(Value::Var(exit), vec![Value::Var(join.params[0].clone())])
    );

    let Exp::Primop(test) = *fix.body else {
        panic!("expected the ineq primop");
    };
    assert_eq!(test.op, Op::Ineq);
    assert_eq!(test.args, vec![Value::Int(1), Value::Int(0)]);
    assert!(test.results.is_empty());
    assert_eq!(test.conts.len(), 2);
    // Branch 0 is taken when the scrutinee differs from zero (the "true"
    // arm, i.e. the front end's default); branch 1 is the zero case.
    assert_eq!(
        test.conts[0],
        Exp::app(Value::Var(join.name.clone()), vec![Value::Int(10)])
    );
    assert_eq!(
        test.conts[1],
        Exp::app(Value::Var(join.name.clone()), vec![Value::Int(20)])
    );
}

// ── Primitives ─────────────────────────────────────────────────────────

/// A unary effect primitive continues with the dummy undefined value.
#[test]
fn println_continues_with_undefined() {
    let call = fun::Exp::app(fun::Exp::Prim(Op::Println), fun::Exp::Str("hi".into()));
    let (exp, exit) = convert_one(call);
    let Exp::Primop(p) = exp else {
        panic!("expected a primop");
    };
    assert_eq!(p.op, Op::Println);
    assert_eq!(p.args, vec![Value::Str("hi".into())]);
    assert!(p.results.is_empty());
    assert_eq!(p.conts.len(), 1);
    assert_eq!(
        p.conts[0],
        Exp::app(Value::Var(exit), vec![Value::Undefined])
    );
}

/// Multi-argument primitives flatten their record argument into the
/// argument list; no record is allocated.
#[test]
fn add_flattens_argument_record() {
    let call = fun::Exp::app(
        fun::Exp::Prim(Op::Add),
        fun::Exp::Record(vec![fun::Exp::Int(2), fun::Exp::Int(3)]),
    );
    let (exp, exit) = convert_one(call);
    let Exp::Primop(p) = exp else {
        panic!("expected a primop");
    };
    assert_eq!(p.op, Op::Add);
    assert_eq!(p.args, vec![Value::Int(2), Value::Int(3)]);
    assert_eq!(p.results.len(), 1);
    assert_eq!(
        p.conts[0],
        Exp::app(Value::Var(exit), vec![Value::Var(p.results[0].clone())])
    );
}

// ── Call/cc ────────────────────────────────────────────────────────────

/// Call/cc reifies the current continuation once as a return point and
/// builds an escape function that re-enters it, ignoring the continuation
/// the calling convention hands the escape call.
#[test]
fn callcc_builds_escape_function() {
    let mut supply = VarSupply::new();
    let c = supply.fresh("c");
    let body = fun::Exp::app(fun::Exp::Var(c.clone()), fun::Exp::Int(42));
    let program = fun::Exp::app(fun::Exp::Prim(Op::Callcc), fun::Exp::lambda(c, body));
    let (exp, exit) = convert(vec![program], &mut supply);

    let Exp::Fix(fix) = exp else {
        panic!("expected the callcc fix");
    };
    assert_eq!(fix.fns.len(), 2, "return point plus escape function");
    let (ret, escape) = (&fix.fns[0], &fix.fns[1]);
    assert_eq!(ret.params.len(), 1);
    assert_eq!(
        ret.body,
        Exp::app(Value::Var(exit), vec![Value::Var(ret.params[0].clone())])
    );
    assert_eq!(escape.params.len(), 2, "escaping value plus ignored continuation");
    assert_eq!(
        escape.body,
        Exp::app(
            Value::Var(ret.name.clone()),
            vec![Value::Var(escape.params[0].clone())]
        )
    );

    // The argument function receives the escape procedure and the return
    // point through the ordinary calling convention.
    let Exp::Fix(arg_fix) = *fix.body else {
        panic!("expected the argument lambda's fix");
    };
    let g = &arg_fix.fns[0];
    assert_eq!(
        *arg_fix.body,
        Exp::app(
            Value::Var(g.name.clone()),
            vec![
                Value::Var(escape.name.clone()),
                Value::Var(ret.name.clone())
            ]
        )
    );
}

// ── Invariants ─────────────────────────────────────────────────────────

/// No two binding sites in a converted tree share a tag.
#[test]
fn binding_tags_are_unique() {
    let mut supply = VarSupply::new();
    let x = supply.fresh("x");
    let c = supply.fresh("c");
    let program = fun::Exp::app(
        fun::Exp::Prim(Op::Callcc),
        fun::Exp::lambda(
            c.clone(),
            fun::Exp::cond(
                fun::Exp::Int(1),
                fun::Exp::app(fun::Exp::Var(c), fun::Exp::Int(42)),
                fun::Exp::app(
                    fun::Exp::lambda(x.clone(), fun::Exp::Var(x)),
                    fun::Exp::Record(vec![fun::Exp::Int(1), fun::Exp::Int(2)]),
                ),
            ),
        ),
    );
    let (exp, _) = convert(vec![program], &mut supply);

    let mut tags = bound_tags(&exp);
    let total = tags.len();
    tags.sort_unstable();
    tags.dedup();
    assert_eq!(tags.len(), total, "duplicate binding tag in {exp}");
}

/// Re-converting the same fun variable yields the same CPS variable
/// within one session, and a fresh one across sessions.
#[test]
fn variable_mapping_is_per_session() {
    let mut supply = VarSupply::new();
    let x = supply.fresh("x");
    let program = || fun::Exp::lambda(x.clone(), fun::Exp::Var(x.clone()));

    let (first, _) = convert(vec![program()], &mut VarSupply::new());
    let (second, _) = convert(vec![program()], &mut VarSupply::new());
    // Identical fresh sessions mint identical tags deterministically.
    assert_eq!(first, second);
}

// ── Contract violations ────────────────────────────────────────────────

#[test]
#[should_panic(expected = "internal compiler error")]
fn bare_primitive_is_rejected() {
    convert_one(fun::Exp::Prim(Op::Add));
}

#[test]
#[should_panic(expected = "internal compiler error")]
fn non_record_argument_to_binary_primitive_is_rejected() {
    convert_one(fun::Exp::app(fun::Exp::Prim(Op::Add), fun::Exp::Int(1)));
}

#[test]
#[should_panic(expected = "internal compiler error")]
fn non_boolean_switch_is_rejected() {
    let sw = fun::Exp::Switch(Box::new(fun::Switch {
        value: fun::Exp::Int(1),
        cases: vec![
            fun::Case {
                value: 0,
                body: fun::Exp::Int(1),
            },
            fun::Case {
                value: 1,
                body: fun::Exp::Int(2),
            },
        ],
        default: None,
    }));
    convert_one(sw);
}

#[test]
#[should_panic(expected = "internal compiler error")]
fn unimplemented_comparison_is_rejected() {
    let call = fun::Exp::app(
        fun::Exp::Prim(Op::Lt),
        fun::Exp::Record(vec![fun::Exp::Int(1), fun::Exp::Int(2)]),
    );
    convert_one(call);
}
