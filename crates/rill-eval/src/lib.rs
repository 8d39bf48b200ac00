//! Reference evaluator for CPS programs, derived from the denotational
//! semantics of the representation.
//!
//! A CPS program never returns through a call stack: every `App` node is
//! a tail call. Evaluating one with ordinary recursion would grow native
//! stack in proportion to the source program's call structure, so the
//! evaluator is an iterative trampoline instead. [`run`] walks the
//! straight-line binding nodes of a block in a loop, and every `App`
//! yields a pending call (closure plus arguments) that the driver loop
//! pops and enters. Native stack usage stays constant no matter how deep
//! the program recurses.
//!
//! Backends consuming the CPS tree are held to the same contract; this
//! evaluator doubles as its executable description.

use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use rill_common::{ice, Var};
use rill_cps::{Exp, FnDef, Path, Value};
use rill_prim::Op;

/// The final value a program delivers to its exit continuation, projected
/// out of the evaluator's internal representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Int(i64),
    Str(String),
    Record(Vec<Answer>),
    /// A function escaped as the final value; its closure is not
    /// observable from outside the run.
    Fn,
    Undefined,
}

/// Run `exp` to completion, delivering output to `out`.
///
/// `exit` is the exit continuation variable returned by conversion; the
/// value the program passes to it becomes the [`Answer`].
///
/// # Panics
///
/// A malformed tree (applying a non-function, selecting from a
/// non-record, an out-of-range switch, a nested record path) is an
/// internal error and aborts. Only genuine output failures surface as
/// `io::Error`.
pub fn run(exp: &Exp, exit: &Var, out: &mut dyn Write) -> io::Result<Answer> {
    let env = Env::empty().bind(exit.tag, DValue::Fn(FnRef::Exit));
    let mut step = block(exp, env, out)?;
    loop {
        let Step::Call(callee, args) = step;
        match callee {
            DValue::Fn(FnRef::Exit) => {
                let Some(result) = args.into_iter().next() else {
                    ice!("exit continuation called without a value");
                };
                return Ok(answer(&result));
            }
            DValue::Fn(FnRef::Closure(closure)) => {
                let def = &closure.fns[closure.index];
                if def.params.len() != args.len() {
                    ice!(
                        "{} called with {} arguments, expects {}",
                        def.name,
                        args.len(),
                        def.params.len()
                    );
                }
                // Rebuild the recursive scope lazily: every sibling of the
                // fix group is re-bound over the environment the group
                // closed over, then the parameters go on top.
                let mut env = bind_fix(&closure.env, closure.fns);
                for (param, arg) in def.params.iter().zip(args) {
                    env = env.bind(param.tag, arg);
                }
                step = block(&def.body, env, out)?;
            }
            other => ice!("application of non-function value {}", other),
        }
    }
}

/// A pending tail call: the one thing a block evaluates to.
enum Step<'a> {
    Call(DValue<'a>, Vec<DValue<'a>>),
}

/// A denotable value. Borrows the program tree; nothing in a run outlives
/// the caller's CPS expression.
#[derive(Clone)]
enum DValue<'a> {
    Int(i64),
    Str(&'a str),
    /// Shared field vector plus a view offset, so offset paths can
    /// re-point a record without copying it.
    Record(Rc<Vec<DValue<'a>>>, usize),
    Fn(FnRef<'a>),
    Undefined,
}

#[derive(Clone)]
enum FnRef<'a> {
    Closure(Rc<Closure<'a>>),
    Exit,
}

/// One entry of a `Fix` group, closed over the environment the group was
/// evaluated in.
struct Closure<'a> {
    fns: &'a [FnDef],
    index: usize,
    env: Env<'a>,
}

/// Persistent environment: a shared cons-list keyed by variable tag.
#[derive(Clone)]
struct Env<'a>(Option<Rc<Frame<'a>>>);

struct Frame<'a> {
    tag: u32,
    value: DValue<'a>,
    parent: Env<'a>,
}

impl<'a> Env<'a> {
    fn empty() -> Env<'a> {
        Env(None)
    }

    fn bind(&self, tag: u32, value: DValue<'a>) -> Env<'a> {
        Env(Some(Rc::new(Frame {
            tag,
            value,
            parent: self.clone(),
        })))
    }

    fn lookup(&self, var: &Var) -> DValue<'a> {
        let mut cursor = &self.0;
        while let Some(frame) = cursor {
            if frame.tag == var.tag {
                return frame.value.clone();
            }
            cursor = &frame.parent.0;
        }
        ice!("unbound variable {}", var)
    }
}

/// Bind every entry of a fix group into `env`. Closures capture the
/// pre-group environment; the recursive knot is re-tied at each call.
fn bind_fix<'a>(env: &Env<'a>, fns: &'a [FnDef]) -> Env<'a> {
    let mut bound = env.clone();
    for (index, def) in fns.iter().enumerate() {
        bound = bound.bind(
            def.name.tag,
            DValue::Fn(FnRef::Closure(Rc::new(Closure {
                fns,
                index,
                env: env.clone(),
            }))),
        );
    }
    bound
}

/// Evaluate the straight-line spine of a block (every node except `App`
/// binds and continues) until the next tail call.
fn block<'a>(mut exp: &'a Exp, mut env: Env<'a>, out: &mut dyn Write) -> io::Result<Step<'a>> {
    loop {
        match exp {
            Exp::App(app) => {
                let callee = resolve(&env, &app.callee);
                let args = app.args.iter().map(|v| resolve(&env, v)).collect();
                return Ok(Step::Call(callee, args));
            }
            Exp::Fix(fix) => {
                env = bind_fix(&env, &fix.fns);
                exp = &fix.body;
            }
            Exp::Record(r) => {
                let fields: Vec<DValue<'a>> = r
                    .fields
                    .iter()
                    .map(|f| fetch(resolve(&env, &f.value), &f.path))
                    .collect();
                env = env.bind(r.binding.tag, DValue::Record(Rc::new(fields), 0));
                exp = &r.body;
            }
            Exp::Select(s) => {
                let DValue::Record(fields, offset) = resolve(&env, &s.record) else {
                    ice!("select {} from non-record value", s.index);
                };
                let Some(value) = fields.get(offset + s.index).cloned() else {
                    ice!(
                        "select index {} out of range for record of {}",
                        s.index,
                        fields.len()
                    );
                };
                env = env.bind(s.binding.tag, value);
                exp = &s.body;
            }
            Exp::Switch(sw) => {
                let DValue::Int(i) = resolve(&env, &sw.value) else {
                    ice!("switch on non-integer value");
                };
                let branch = usize::try_from(i).ok().and_then(|i| sw.branches.get(i));
                let Some(branch) = branch else {
                    ice!("switch discriminant {} out of range", i);
                };
                exp = branch;
            }
            Exp::Primop(p) => {
                let args: Vec<DValue<'a>> = p.args.iter().map(|v| resolve(&env, v)).collect();
                let (branch, results) = eval_prim(p.op, &args, out)?;
                let Some(cont) = p.conts.get(branch) else {
                    ice!("{} branched to missing continuation {}", p.op, branch);
                };
                if results.len() != p.results.len() {
                    ice!(
                        "{} produced {} results, binds {}",
                        p.op,
                        results.len(),
                        p.results.len()
                    );
                }
                for (w, value) in p.results.iter().zip(results) {
                    env = env.bind(w.tag, value);
                }
                exp = cont;
            }
        }
    }
}

fn resolve<'a>(env: &Env<'a>, v: &'a Value) -> DValue<'a> {
    match v {
        Value::Var(var) => env.lookup(var),
        Value::Int(n) => DValue::Int(*n),
        Value::Str(s) => DValue::Str(s),
        Value::Undefined => DValue::Undefined,
        Value::Label(l) => ice!("label L{} reached the evaluator", l),
    }
}

/// Apply a record field path. Only offsets are addressable; nested paths
/// are outside the supported subset.
fn fetch<'a>(value: DValue<'a>, path: &Path) -> DValue<'a> {
    match path {
        Path::Off(0) => value,
        Path::Off(n) => {
            let DValue::Record(fields, offset) = value else {
                ice!("offset path into non-record value");
            };
            let offset = offset as i64 + i64::from(*n);
            if offset < 0 {
                ice!("record offset underflow");
            }
            DValue::Record(fields, offset as usize)
        }
        Path::Sel(..) => ice!("nested record paths are not supported"),
    }
}

/// Execute one primitive: returns the continuation branch to take and the
/// values to bind to the operation's result variables.
fn eval_prim<'a>(
    op: Op,
    args: &[DValue<'a>],
    out: &mut dyn Write,
) -> io::Result<(usize, Vec<DValue<'a>>)> {
    match op {
        Op::Println => {
            let [arg] = args else {
                ice!("println takes one argument, got {}", args.len());
            };
            writeln!(out, "{}", arg)?;
            Ok((0, vec![]))
        }
        Op::Add => {
            let (a, b) = int_args(op, args);
            Ok((0, vec![DValue::Int(a.wrapping_add(b))]))
        }
        Op::Sub => {
            let (a, b) = int_args(op, args);
            Ok((0, vec![DValue::Int(a.wrapping_sub(b))]))
        }
        Op::Mul => {
            let (a, b) = int_args(op, args);
            Ok((0, vec![DValue::Int(a.wrapping_mul(b))]))
        }
        Op::Quo => {
            let (a, b) = int_args(op, args);
            if b == 0 {
                ice!("division by zero");
            }
            Ok((0, vec![DValue::Int(a.wrapping_div(b))]))
        }
        Op::Ineq => {
            let (a, b) = int_args(op, args);
            // Branch 0 is the not-equal arm.
            Ok((if a != b { 0 } else { 1 }, vec![]))
        }
        Op::Lt => ice!("lt has no evaluation rule"),
        Op::Callcc => ice!("callcc must be eliminated by conversion"),
    }
}

fn int_args(op: Op, args: &[DValue<'_>]) -> (i64, i64) {
    match args {
        [DValue::Int(a), DValue::Int(b)] => (*a, *b),
        _ => ice!("{} takes two integer arguments", op),
    }
}

fn answer(value: &DValue<'_>) -> Answer {
    match value {
        DValue::Int(n) => Answer::Int(*n),
        DValue::Str(s) => Answer::Str((*s).to_string()),
        DValue::Record(fields, offset) => {
            Answer::Record(fields.iter().skip(*offset).map(answer).collect())
        }
        DValue::Fn(_) => Answer::Fn,
        DValue::Undefined => Answer::Undefined,
    }
}

impl fmt::Display for DValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DValue::Int(n) => write!(f, "{}", n),
            DValue::Str(s) => f.write_str(s),
            DValue::Undefined => f.write_str("undefined"),
            DValue::Fn(_) => f.write_str("<function>"),
            DValue::Record(fields, offset) => {
                for (i, v) in fields.iter().skip(*offset).enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
        }
    }
}
