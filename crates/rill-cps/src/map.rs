//! Generic traversals over CPS trees.
//!
//! Every optimizer pass and the substitution primitive are built from
//! these four combinators. `map`/`walk` visit expressions depth first,
//! starting with the root; `map_values`/`walk_values` visit every value
//! position (and only value positions: binders are structural and are
//! never visited, which is exactly what substitution needs).

use crate::exp::{App, Exp, Field, Fix, FnDef, Primop, Record, Select, Switch, Value};

/// Rebuild `exp` by applying `f` to every expression node, outermost
/// first. Children of the node `f` returns are traversed in turn.
pub fn map(exp: Exp, f: &mut dyn FnMut(Exp) -> Exp) -> Exp {
    match f(exp) {
        Exp::App(app) => Exp::App(app),
        Exp::Fix(Fix { fns, body }) => Exp::Fix(Fix {
            fns: fns
                .into_iter()
                .map(|d| FnDef {
                    name: d.name,
                    params: d.params,
                    body: map(d.body, f),
                })
                .collect(),
            body: Box::new(map(*body, f)),
        }),
        Exp::Primop(Primop {
            op,
            args,
            results,
            conts,
        }) => Exp::Primop(Primop {
            op,
            args,
            results,
            conts: conts.into_iter().map(|e| map(e, f)).collect(),
        }),
        Exp::Record(Record {
            fields,
            binding,
            body,
        }) => Exp::Record(Record {
            fields,
            binding,
            body: Box::new(map(*body, f)),
        }),
        Exp::Select(Select {
            index,
            record,
            binding,
            body,
        }) => Exp::Select(Select {
            index,
            record,
            binding,
            body: Box::new(map(*body, f)),
        }),
        Exp::Switch(Switch { value, branches }) => Exp::Switch(Switch {
            value,
            branches: branches.into_iter().map(|e| map(e, f)).collect(),
        }),
    }
}

/// Rebuild `exp` by applying `f` to every value position.
pub fn map_values(exp: Exp, f: &mut dyn FnMut(Value) -> Value) -> Exp {
    match exp {
        Exp::App(App { callee, args }) => Exp::App(App {
            callee: f(callee),
            args: args.into_iter().map(|v| f(v)).collect(),
        }),
        Exp::Fix(Fix { fns, body }) => Exp::Fix(Fix {
            fns: fns
                .into_iter()
                .map(|d| FnDef {
                    name: d.name,
                    params: d.params,
                    body: map_values(d.body, f),
                })
                .collect(),
            body: Box::new(map_values(*body, f)),
        }),
        Exp::Primop(Primop {
            op,
            args,
            results,
            conts,
        }) => Exp::Primop(Primop {
            op,
            args: args.into_iter().map(|v| f(v)).collect(),
            results,
            conts: conts.into_iter().map(|e| map_values(e, f)).collect(),
        }),
        Exp::Record(Record {
            fields,
            binding,
            body,
        }) => Exp::Record(Record {
            fields: fields
                .into_iter()
                .map(|fld| Field {
                    value: f(fld.value),
                    path: fld.path,
                })
                .collect(),
            binding,
            body: Box::new(map_values(*body, f)),
        }),
        Exp::Select(Select {
            index,
            record,
            binding,
            body,
        }) => Exp::Select(Select {
            index,
            record: f(record),
            binding,
            body: Box::new(map_values(*body, f)),
        }),
        Exp::Switch(Switch { value, branches }) => Exp::Switch(Switch {
            value: f(value),
            branches: branches.into_iter().map(|e| map_values(e, f)).collect(),
        }),
    }
}

/// Apply `f` to every expression node, outermost first.
pub fn walk(exp: &Exp, f: &mut dyn FnMut(&Exp)) {
    f(exp);
    match exp {
        Exp::App(_) => {}
        Exp::Fix(fix) => {
            for d in &fix.fns {
                walk(&d.body, f);
            }
            walk(&fix.body, f);
        }
        Exp::Primop(p) => {
            for e in &p.conts {
                walk(e, f);
            }
        }
        Exp::Record(r) => walk(&r.body, f),
        Exp::Select(s) => walk(&s.body, f),
        Exp::Switch(sw) => {
            for e in &sw.branches {
                walk(e, f);
            }
        }
    }
}

/// Apply `f` to every value position in `exp`.
pub fn walk_values(exp: &Exp, f: &mut dyn FnMut(&Value)) {
    match exp {
        Exp::App(app) => {
            f(&app.callee);
            for v in &app.args {
                f(v);
            }
        }
        Exp::Fix(fix) => {
            for d in &fix.fns {
                walk_values(&d.body, f);
            }
            walk_values(&fix.body, f);
        }
        Exp::Primop(p) => {
            for v in &p.args {
                f(v);
            }
            for e in &p.conts {
                walk_values(e, f);
            }
        }
        Exp::Record(r) => {
            for fld in &r.fields {
                f(&fld.value);
            }
            walk_values(&r.body, f);
        }
        Exp::Select(s) => {
            f(&s.record);
            walk_values(&s.body, f);
        }
        Exp::Switch(sw) => {
            f(&sw.value);
            for e in &sw.branches {
                walk_values(e, f);
            }
        }
    }
}
