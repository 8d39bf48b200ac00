//! Primitive operations.
//!
//! A closed table of the operators the language exposes, tagged with the
//! argument and result counts the CPS converter dispatches on and the
//! purity flag the optimizer uses to justify deleting unused bindings.
//!
//! New operators added here must also be added to the dispatch in every
//! backend (the reference evaluator included) in the same change; the
//! exhaustive matches turn a missed backend into a compile error.

use std::fmt;

use rill_common::ice;
use serde::Serialize;

/// A primitive operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Op {
    /// Write one value and a newline to the program's output.
    Println,
    Add,
    Sub,
    Mul,
    /// Integer division.
    Quo,
    /// Less-than. Declared but intentionally unimplemented: no backend
    /// evaluates it, and the converter has no rule producing it.
    Lt,
    /// Integer inequality test; branches rather than producing a value.
    Ineq,
    /// Call-with-current-continuation. Variable arity; converted as a
    /// special case, never through the generic arity dispatch.
    Callcc,
}

impl Op {
    /// The number of arguments the operation takes.
    ///
    /// # Panics
    ///
    /// Asking for the arity of [`Op::Callcc`] is a configuration error:
    /// the converter must special-case it before reaching arity dispatch.
    pub fn arg_count(self) -> usize {
        match self {
            Op::Println => 1,
            Op::Add | Op::Sub | Op::Mul | Op::Quo | Op::Lt | Op::Ineq => 2,
            Op::Callcc => ice!("arity of {} is not defined", self),
        }
    }

    /// The number of results the operation yields. Zero-result operations
    /// either branch (comparisons) or are run purely for effect.
    ///
    /// # Panics
    ///
    /// Same contract as [`Op::arg_count`].
    pub fn result_count(self) -> usize {
        match self {
            Op::Add | Op::Sub | Op::Mul | Op::Quo => 1,
            Op::Println | Op::Lt | Op::Ineq => 0,
            Op::Callcc => ice!("result count of {} is not defined", self),
        }
    }

    /// Whether the operation has no side effect beyond producing its
    /// result. A pure operation whose results go unused may be deleted.
    pub fn is_pure(self) -> bool {
        matches!(self, Op::Lt | Op::Ineq)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Println => "println",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Quo => "quo",
            Op::Lt => "lt",
            Op::Ineq => "ineq",
            Op::Callcc => "callcc",
        };
        f.write_str(name)
    }
}
