//! Beta-contraction.
//!
//! A `Fix`-bound function whose only occurrence anywhere in the tree is a
//! single call is inlined at that call, and its entry deleted. The
//! affine, call-only criterion keeps substitution trivially safe: the
//! body is moved, never duplicated, so variable-tag uniqueness survives
//! without renaming.

use rustc_hash::FxHashMap;

use rill_cps::{map, walk, walk_values, Exp, Fix, FnDef, Value};

use crate::subst;

/// Perform at most one contraction; the fixed-point driver iterates.
pub fn beta_contract(exp: Exp) -> Exp {
    let census = take_census(&exp);
    for tag in &census.order {
        let uses = census.uses.get(tag).copied().unwrap_or(0);
        let calls = census.calls.get(tag).copied().unwrap_or(0);
        if uses == 1 && calls == 1 {
            let def = census.defs[tag].clone();
            return remove_entry(inline_call(exp, &def), &def);
        }
    }
    exp
}

#[derive(Default)]
struct Census {
    /// Value occurrences per variable tag, call positions included.
    uses: FxHashMap<u32, usize>,
    /// Call-position occurrences per variable tag.
    calls: FxHashMap<u32, usize>,
    /// The `Fix` entry bound to each tag, if any.
    defs: FxHashMap<u32, FnDef>,
    /// `Fix`-bound tags in tree order, for deterministic candidate choice.
    order: Vec<u32>,
}

fn take_census(exp: &Exp) -> Census {
    let mut census = Census::default();
    walk_values(exp, &mut |v| {
        if let Value::Var(w) = v {
            *census.uses.entry(w.tag).or_default() += 1;
        }
    });
    walk(exp, &mut |e| match e {
        Exp::App(app) => {
            if let Value::Var(v) = &app.callee {
                *census.calls.entry(v.tag).or_default() += 1;
            }
        }
        Exp::Fix(fix) => {
            for d in &fix.fns {
                census.order.push(d.name.tag);
                census.defs.insert(d.name.tag, d.clone());
            }
        }
        _ => {}
    });
    census
}

/// Replace the call of `def.name` with `def`'s body, actuals substituted
/// for formals.
fn inline_call(exp: Exp, def: &FnDef) -> Exp {
    map(exp, &mut |e| match e {
        Exp::App(app) if matches!(&app.callee, Value::Var(v) if *v == def.name) => {
            subst(def.body.clone(), &def.params, &app.args)
        }
        other => other,
    })
}

/// Delete `def`'s entry from the `Fix` that binds it; a `Fix` left with no
/// entries collapses to its body.
fn remove_entry(exp: Exp, def: &FnDef) -> Exp {
    map(exp, &mut |e| match e {
        Exp::Fix(Fix { fns, body }) => {
            let fns: Vec<FnDef> = fns.into_iter().filter(|d| d.name != def.name).collect();
            if fns.is_empty() {
                *body
            } else {
                Exp::Fix(Fix { fns, body })
            }
        }
        other => other,
    })
}
