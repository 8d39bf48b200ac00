//! The CPS tree.
//!
//! Every control transfer is an explicit tail call: an [`Exp`] never
//! "returns" a value through a call stack. Each non-`App` node binds zero
//! or more variables in the scope of its continuation sub-expressions.
//!
//! Trees are plain owned values. Rewrites build new trees instead of
//! mutating shared substructure, so references held across a rewrite (for
//! fixed-point comparison) stay valid.

use rill_common::Var;
use rill_prim::Op;
use serde::Serialize;

/// An atomic value position in the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Var(Var),
    Int(i64),
    Str(String),
    /// Dummy result delivered to the continuation of a zero-result
    /// primitive.
    Undefined,
    /// Code label. Reserved for backends; no current pass produces or
    /// consumes one.
    Label(u32),
}

/// A continuation expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Exp {
    /// Tail call. Terminal: carries no continuation of its own.
    App(App),
    Fix(Fix),
    Primop(Primop),
    Record(Record),
    Select(Select),
    Switch(Switch),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct App {
    pub callee: Value,
    pub args: Vec<Value>,
}

/// One function bound by a [`Fix`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FnDef {
    pub name: Var,
    pub params: Vec<Var>,
    pub body: Exp,
}

/// Mutually recursive function bindings: every entry name is in scope in
/// all entry bodies and in `body`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fix {
    pub fns: Vec<FnDef>,
    pub body: Box<Exp>,
}

/// A primitive application. `conts` has one element for effectful and
/// arithmetic operators, two (taken / not taken) for branching
/// comparisons; `results` binds in each continuation's scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Primop {
    pub op: Op,
    pub args: Vec<Value>,
    pub results: Vec<Var>,
    pub conts: Vec<Exp>,
}

/// Access path of a record field.
///
/// Only `Off(0)` is ever constructed today. `Sel` is kept in the model for
/// nested records; reaching one at a point of use is an internal error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Path {
    Off(i32),
    Sel(i32, Box<Path>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub value: Value,
    pub path: Path,
}

/// Allocates a flat tuple of `fields`, binding `binding` to it in the
/// scope of `body`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub fields: Vec<Field>,
    pub binding: Var,
    pub body: Box<Exp>,
}

/// Binds `binding` to field `index` of `record` in the scope of `body`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Select {
    pub index: usize,
    pub record: Value,
    pub binding: Var,
    pub body: Box<Exp>,
}

/// Proceeds with `branches[value]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switch {
    pub value: Value,
    pub branches: Vec<Exp>,
}

impl Exp {
    pub fn app(callee: Value, args: Vec<Value>) -> Exp {
        Exp::App(App { callee, args })
    }

    pub fn fix(fns: Vec<FnDef>, body: Exp) -> Exp {
        Exp::Fix(Fix {
            fns,
            body: Box::new(body),
        })
    }
}

impl Field {
    /// A field at the trivial offset, the only path the converter emits.
    pub fn at_root(value: Value) -> Field {
        Field {
            value,
            path: Path::Off(0),
        }
    }
}
