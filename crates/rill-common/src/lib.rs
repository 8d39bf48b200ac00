//! Shared plumbing for the Rill compiler.
//!
//! This crate holds the pieces every stage of the pipeline needs: the
//! [`Var`] identity type, the per-session [`VarSupply`] tag allocator, and
//! the [`ice!`] macro for reporting internal invariant violations.

pub mod var;

pub use var::{Var, VarSupply};

/// Report an internal compiler error and abort.
///
/// The middle-end sits behind a front end that is assumed to have produced
/// well-formed IR, so every malformed shape it encounters is a bug in the
/// compiler, never in user input. Callers are expected to name the node or
/// operator that triggered the failure:
///
/// ```should_panic
/// use rill_common::ice;
/// ice!("no conversion rule for node {:?}", "Prim");
/// ```
///
/// A surrounding driver can catch the unwind and report it separately from
/// source-level diagnostics.
#[macro_export]
macro_rules! ice {
    ($($arg:tt)*) => {
        panic!("internal compiler error: {}", format_args!($($arg)*))
    };
}
