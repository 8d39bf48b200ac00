//! Dead-variable elimination.
//!
//! Bindings whose variable has no remaining occurrence are dropped: `Fix`
//! entries, `Record` allocations, `Select` projections, and pure
//! `Primop`s. An impure operator is never removed: its side effect must
//! still happen even when nobody reads the result.

use rill_common::Var;
use rill_cps::{map, Exp, Fix, FnDef, Primop};

use crate::occurs;

/// One dead-variable sweep over the whole tree.
pub fn remove_dead(exp: Exp) -> Exp {
    map(exp, &mut |exp| match exp {
        Exp::Fix(fix) => {
            // An entry referenced from any sibling body (its own
            // included) or from the fix body stays.
            let keep: Vec<bool> = fix.fns.iter().map(|d| fix_mentions(&fix, &d.name)).collect();
            if keep.iter().all(|&k| k) {
                return Exp::Fix(fix);
            }
            let Fix { fns, body } = fix;
            let fns: Vec<FnDef> = fns
                .into_iter()
                .zip(keep)
                .filter_map(|(d, k)| k.then_some(d))
                .collect();
            if fns.is_empty() {
                *body
            } else {
                Exp::Fix(Fix { fns, body })
            }
        }
        Exp::Primop(p) => {
            let removable = p.op.is_pure()
                && p.conts.len() == 1
                && !p
                    .results
                    .iter()
                    .any(|w| p.conts.iter().any(|e| occurs(e, w)));
            if removable {
                let Primop { mut conts, .. } = p;
                conts.remove(0)
            } else {
                Exp::Primop(p)
            }
        }
        Exp::Record(r) => {
            if occurs(&r.body, &r.binding) {
                Exp::Record(r)
            } else {
                *r.body
            }
        }
        Exp::Select(s) => {
            if occurs(&s.body, &s.binding) {
                Exp::Select(s)
            } else {
                *s.body
            }
        }
        other => other,
    })
}

fn fix_mentions(fix: &Fix, var: &Var) -> bool {
    fix.fns.iter().any(|d| occurs(&d.body, var)) || occurs(&fix.body, var)
}
