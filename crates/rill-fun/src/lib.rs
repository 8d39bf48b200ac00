//! The "fun" IR: a small direct-style functional intermediate
//! representation, analogous to the mini-ML lambda language in the
//! Standard ML of New Jersey compiler.
//!
//! Front-end lowering produces one `Exp` per compiled unit, fully
//! name-resolved: every binder carries a globally unique [`Var`] tag from
//! the session's `VarSupply`. The CPS converter consumes each expression
//! exactly once, by value.

use rill_common::Var;
use rill_prim::Op;
use serde::Serialize;

/// A direct-style expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Exp {
    Var(Var),
    Int(i64),
    Str(String),
    /// A primitive operator in callee position. A bare `Prim` anywhere
    /// else has no conversion rule.
    Prim(Op),
    /// Single-parameter lambda.
    Fn(Box<Lambda>),
    /// Mutually recursive named functions.
    Fix(Box<Fix>),
    App(Box<App>),
    /// Flat tuple; fields addressed by position.
    Record(Vec<Exp>),
    /// Positional field projection.
    Select(usize, Box<Exp>),
    Switch(Box<Switch>),
}

/// A single-parameter function body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lambda {
    pub param: Var,
    pub body: Exp,
}

/// `names[i]` is bound to `fns[i]`; all names are in scope within every
/// function body and within `body`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fix {
    pub names: Vec<Var>,
    pub fns: Vec<Lambda>,
    pub body: Exp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct App {
    pub callee: Exp,
    pub arg: Exp,
}

/// Multiway dispatch on an integer scrutinee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switch {
    pub value: Exp,
    pub cases: Vec<Case>,
    pub default: Option<Exp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Case {
    pub value: i64,
    pub body: Exp,
}

impl Switch {
    /// A boolean switch has exactly one case, valued 0, and a default.
    /// This is the only switch shape the converter handles today.
    pub fn is_boolean(&self) -> bool {
        self.cases.len() == 1 && self.cases[0].value == 0 && self.default.is_some()
    }
}

impl Exp {
    pub fn lambda(param: Var, body: Exp) -> Exp {
        Exp::Fn(Box::new(Lambda { param, body }))
    }

    pub fn fix(names: Vec<Var>, fns: Vec<Lambda>, body: Exp) -> Exp {
        Exp::Fix(Box::new(Fix { names, fns, body }))
    }

    pub fn app(callee: Exp, arg: Exp) -> Exp {
        Exp::App(Box::new(App { callee, arg }))
    }

    pub fn select(index: usize, record: Exp) -> Exp {
        Exp::Select(index, Box::new(record))
    }

    /// A two-way branch in the front end's encoding: the zero case is the
    /// "false" arm and the default is the "true" arm.
    pub fn cond(value: Exp, then_arm: Exp, else_arm: Exp) -> Exp {
        Exp::Switch(Box::new(Switch {
            value,
            cases: vec![Case {
                value: 0,
                body: else_arm,
            }],
            default: Some(then_arm),
        }))
    }
}
