//! Local term-rewriting optimizations over CPS trees.
//!
//! Four independent, semantics-preserving passes (eta-reduction,
//! beta-contraction, select-folding, and dead-variable elimination) each
//! run to a local fixed point, with the whole sequence iterated to a
//! global fixed point. Passes interact: select-folding exposes dead
//! selects, beta-contraction turns functions into eta-redexes, so the
//! outer loop keeps re-running the sequence until a full cycle changes
//! nothing.
//!
//! Fixed points are detected by structural comparison, O(tree size) per
//! check. Fine at this scale; an implementation for large inputs would
//! track a dirty bit per rewrite instead, preserving the same final tree.
//!
//! Substitution never renames: variable tags are globally unique (no two
//! binding sites collide) and beta-contraction only inlines functions
//! with a single call-position use, so no subtree is ever duplicated.

mod beta;
mod dead;
mod eta;
mod select;

pub use beta::beta_contract;
pub use dead::remove_dead;
pub use eta::eta_reduce;
pub use select::fold_selects;

use rill_common::Var;
use rill_cps::{map_values, walk_values, Exp, Value};

/// Optimize `exp` until no pass can improve it further.
pub fn optimize(mut exp: Exp) -> Exp {
    loop {
        let before = exp.clone();
        exp = run_to_fixpoint(exp, eta_reduce);
        exp = run_to_fixpoint(exp, beta_contract);
        exp = run_to_fixpoint(exp, fold_selects);
        exp = run_to_fixpoint(exp, remove_dead);
        if exp == before {
            return exp;
        }
    }
}

/// Apply one pass repeatedly until the tree stops changing.
fn run_to_fixpoint(mut exp: Exp, pass: fn(Exp) -> Exp) -> Exp {
    loop {
        let next = pass(exp.clone());
        if next == exp {
            return exp;
        }
        exp = next;
    }
}

/// B{v⃗ ↦ a⃗}: replace every value-position occurrence of `formals[i]`
/// with `actuals[i]`. Structural positions (binders) are untouched.
pub(crate) fn subst(exp: Exp, formals: &[Var], actuals: &[Value]) -> Exp {
    map_values(exp, &mut |v| {
        if let Value::Var(w) = &v {
            if let Some(i) = formals.iter().position(|formal| formal == w) {
                return actuals[i].clone();
            }
        }
        v
    })
}

/// Whether `var` occurs in any value position of `exp`.
pub(crate) fn occurs(exp: &Exp, var: &Var) -> bool {
    let mut found = false;
    walk_values(exp, &mut |v| {
        if let Value::Var(w) = v {
            if w == var {
                found = true;
            }
        }
    });
    found
}
