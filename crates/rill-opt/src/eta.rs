//! Eta-reduction.
//!
//! A `Fix` entry of the form `f(x1 … xn) = g(x1 … xn)` is a pure
//! forwarding wrapper: calling `f` is indistinguishable from calling `g`.
//! The entry is dropped and every occurrence of `f` in the enclosing
//! scope is replaced by `g`.
//!
//! One redex per `Fix` per sweep: dropping several at once could dangle a
//! wrapper that forwards to a sibling wrapper dropped in the same sweep.
//! Chains resolve across the fixed-point iterations instead.

use rill_cps::{map, Exp, Fix, FnDef, Value};

use crate::subst;

/// One eta-reduction sweep over the whole tree.
pub fn eta_reduce(exp: Exp) -> Exp {
    map(exp, &mut |exp| match exp {
        Exp::Fix(Fix { mut fns, body }) => {
            let redex = fns
                .iter()
                .enumerate()
                .find_map(|(i, d)| forward_target(d).map(|t| (i, t)));
            let Some((i, target)) = redex else {
                return Exp::Fix(Fix { fns, body });
            };
            let dropped = fns.remove(i);
            let formals = [dropped.name];
            let actuals = [target];
            if fns.is_empty() {
                subst(*body, &formals, &actuals)
            } else {
                subst(Exp::Fix(Fix { fns, body }), &formals, &actuals)
            }
        }
        other => other,
    })
}

/// The value `g` if `d` is an eta-redex `f(x⃗) = g(x⃗)`, where `g` is
/// neither a parameter nor `f` itself.
fn forward_target(d: &FnDef) -> Option<Value> {
    let Exp::App(app) = &d.body else {
        return None;
    };
    if app.args.len() != d.params.len() {
        return None;
    }
    let forwards = app
        .args
        .iter()
        .zip(&d.params)
        .all(|(a, p)| matches!(a, Value::Var(v) if v == p));
    if !forwards {
        return None;
    }
    if let Value::Var(g) = &app.callee {
        if *g == d.name || d.params.contains(g) {
            return None;
        }
    }
    Some(app.callee.clone())
}
