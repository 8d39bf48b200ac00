//! Conversion from the direct-style fun IR into CPS.
//!
//! The converter is itself written in continuation-passing style at the
//! meta level: [`Conv::conv`] takes a fun expression and a continuation
//! `k`, a one-shot closure from the CPS value the expression evaluates to
//! to the CPS expression for "what happens next", and returns a complete
//! CPS expression. Threading `k` through the rules is what flattens
//! direct-style nesting into an explicit chain of tail calls.
//!
//! The converter is total over the fun grammar the front end actually
//! produces. Any other shape is a contract violation between front end and
//! middle-end and aborts via `ice!`.

use rill_common::{ice, Var, VarSupply};
use rill_fun as fun;
use rill_prim::Op;
use rustc_hash::FxHashMap;

use crate::exp::{Exp, Field, FnDef, Primop, Record, Select, Value};

/// Meta-continuation: given the value a fun expression evaluated to,
/// produce the rest of the CPS program.
type Cont<'s> = Box<dyn FnOnce(&mut Conv<'s>, Value) -> Exp + 's>;

/// Meta-continuation over a list of values, used when several operands
/// are evaluated left to right (record fields, primitive argument lists).
type ListCont<'s> = Box<dyn FnOnce(&mut Conv<'s>, Vec<Value>) -> Exp + 's>;

/// Convert an ordered sequence of top-level fun expressions (one per
/// compiled unit, in link order) into a single CPS expression plus its
/// exit continuation variable.
///
/// Units are sequenced by converting each one with a continuation that
/// proceeds into the next, so the `Fix` scopes of earlier units lexically
/// enclose everything that follows. Intermediate unit values are
/// discarded; the last unit's value is delivered to the exit continuation.
/// Wiring the exit variable to an actual halt action is the caller's
/// responsibility.
pub fn convert(units: Vec<fun::Exp>, supply: &mut VarSupply) -> (Exp, Var) {
    let exit = supply.fresh("exit");
    let mut conv = Conv {
        supply,
        vars: FxHashMap::default(),
    };
    let exp = conv.units(units.into_iter(), exit.clone());
    (exp, exit)
}

struct Conv<'s> {
    supply: &'s mut VarSupply,
    /// Memoized fun-variable-to-CPS-variable mapping, keyed by tag.
    /// Scoped to one `convert` call; sharing it across compilations would
    /// alias identities between unrelated programs.
    vars: FxHashMap<u32, Var>,
}

impl<'s> Conv<'s> {
    fn units(&mut self, mut rest: std::vec::IntoIter<fun::Exp>, exit: Var) -> Exp {
        let Some(first) = rest.next() else {
            return Exp::app(Value::Var(exit), vec![Value::Int(0)]);
        };
        if rest.len() == 0 {
            self.conv(
                first,
                Box::new(move |_, v| Exp::app(Value::Var(exit), vec![v])),
            )
        } else {
            self.conv(first, Box::new(move |me, _| me.units(rest, exit)))
        }
    }

    /// The CPS counterpart of a fun variable, minted on first use.
    fn cps_var(&mut self, v: &Var) -> Var {
        if let Some(w) = self.vars.get(&v.tag) {
            return w.clone();
        }
        let w = self.supply.fresh(&v.name);
        self.vars.insert(v.tag, w.clone());
        w
    }

    fn conv(&mut self, exp: fun::Exp, k: Cont<'s>) -> Exp {
        match exp {
            fun::Exp::Var(v) => {
                let v = self.cps_var(&v);
                k(self, Value::Var(v))
            }
            fun::Exp::Int(n) => k(self, Value::Int(n)),
            fun::Exp::Str(s) => k(self, Value::Str(s)),
            fun::Exp::Prim(op) => ice!("primitive {} used outside call position", op),

            fun::Exp::Record(elems) => {
                // The empty record carries no information; it converts to
                // an integer without allocating.
                if elems.is_empty() {
                    return k(self, Value::Int(0));
                }
                self.conv_list(
                    elems.into_iter(),
                    Vec::new(),
                    Box::new(move |me, vs| {
                        let binding = me.supply.fresh("");
                        let body = k(me, Value::Var(binding.clone()));
                        Exp::Record(Record {
                            fields: vs.into_iter().map(Field::at_root).collect(),
                            binding,
                            body: Box::new(body),
                        })
                    }),
                )
            }

            fun::Exp::Select(index, rec) => self.conv(
                *rec,
                Box::new(move |me, record| {
                    let binding = me.supply.fresh("");
                    let body = k(me, Value::Var(binding.clone()));
                    Exp::Select(Select {
                        index,
                        record,
                        binding,
                        body: Box::new(body),
                    })
                }),
            ),

            fun::Exp::Switch(sw) => self.conv_switch(*sw, k),
            fun::Exp::App(app) => self.conv_app(*app, k),

            fun::Exp::Fix(fix) => {
                let fix = *fix;
                let fns = self.conv_fix_fns(fix.names, fix.fns);
                let body = self.conv(fix.body, k);
                Exp::fix(fns, body)
            }

            fun::Exp::Fn(lam) => {
                let lam = *lam;
                let name = self.supply.fresh("");
                let kvar = self.supply.fresh("");
                let param = self.cps_var(&lam.param);
                let ret = kvar.clone();
                let fn_body = self.conv(
                    lam.body,
                    Box::new(move |_, z| Exp::app(Value::Var(ret), vec![z])),
                );
                let body = k(self, Value::Var(name.clone()));
                Exp::fix(
                    vec![FnDef {
                        name,
                        params: vec![param, kvar],
                        body: fn_body,
                    }],
                    body,
                )
            }
        }
    }

    /// Boolean switch: one case valued 0 plus a default. The scrutinee is
    /// tested against zero with a branching `Ineq`; both arms close by
    /// tail-calling a fresh join function that resumes `k` with the
    /// switch's result.
    fn conv_switch(&mut self, sw: fun::Switch, k: Cont<'s>) -> Exp {
        let fun::Switch {
            value,
            mut cases,
            default,
        } = sw;
        let (zero_arm, default_arm) = match (cases.pop(), default) {
            (Some(case), Some(default)) if case.value == 0 && cases.is_empty() => {
                (case.body, default)
            }
            _ => ice!("no conversion rule for non-boolean switch"),
        };
        self.conv(
            value,
            Box::new(move |me, v| {
                let join = me.supply.fresh("");
                let x = me.supply.fresh("");
                let jt = join.clone();
                let jf = join.clone();
                let taken = me.conv(
                    default_arm,
                    Box::new(move |_, z| Exp::app(Value::Var(jt), vec![z])),
                );
                let not_taken = me.conv(
                    zero_arm,
                    Box::new(move |_, z| Exp::app(Value::Var(jf), vec![z])),
                );
                let join_body = k(me, Value::Var(x.clone()));
                Exp::fix(
                    vec![FnDef {
                        name: join,
                        params: vec![x],
                        body: join_body,
                    }],
                    Exp::Primop(Primop {
                        op: Op::Ineq,
                        args: vec![v, Value::Int(0)],
                        results: vec![],
                        conts: vec![taken, not_taken],
                    }),
                )
            }),
        )
    }

    fn conv_app(&mut self, app: fun::App, k: Cont<'s>) -> Exp {
        let fun::App { callee, arg } = app;
        match callee {
            fun::Exp::Prim(Op::Callcc) => self.conv_callcc(arg, k),
            fun::Exp::Prim(op) => self.conv_primop(op, arg, k),
            callee => {
                // An ordinary call: reify "what happens after the call
                // returns" as a return-point function passed alongside the
                // argument.
                let ret = self.supply.fresh("");
                let x = self.supply.fresh("");
                let retv = ret.clone();
                let body = self.conv(
                    callee,
                    Box::new(move |me, f| {
                        me.conv(
                            arg,
                            Box::new(move |_, v| Exp::app(f, vec![v, Value::Var(retv)])),
                        )
                    }),
                );
                let ret_body = k(self, Value::Var(x.clone()));
                Exp::fix(
                    vec![FnDef {
                        name: ret,
                        params: vec![x],
                        body: ret_body,
                    }],
                    body,
                )
            }
        }
    }

    /// Primitive application, dispatched on declared arity and result
    /// count. `Callcc` never reaches here.
    fn conv_primop(&mut self, op: Op, arg: fun::Exp, k: Cont<'s>) -> Exp {
        match (op.arg_count(), op.result_count()) {
            (1, 0) => self.conv(
                arg,
                Box::new(move |me, v| {
                    let body = k(me, Value::Undefined);
                    Exp::Primop(Primop {
                        op,
                        args: vec![v],
                        results: vec![],
                        conts: vec![body],
                    })
                }),
            ),
            (1, 1) => self.conv(
                arg,
                Box::new(move |me, v| {
                    let w = me.supply.fresh("");
                    let body = k(me, Value::Var(w.clone()));
                    Exp::Primop(Primop {
                        op,
                        args: vec![v],
                        results: vec![w],
                        conts: vec![body],
                    })
                }),
            ),
            (n, 1) if n > 1 => match arg {
                // The front end passes multiple arguments as a record
                // literal; the operands flatten into the argument list
                // without allocating the record.
                fun::Exp::Record(elems) => self.conv_list(
                    elems.into_iter(),
                    Vec::new(),
                    Box::new(move |me, vs| {
                        let w = me.supply.fresh("");
                        let body = k(me, Value::Var(w.clone()));
                        Exp::Primop(Primop {
                            op,
                            args: vs,
                            results: vec![w],
                            conts: vec![body],
                        })
                    }),
                ),
                arg => ice!("argument of {} must be a record literal, got {:?}", op, arg),
            },
            (n, r) => ice!("no conversion rule for {} ({} args, {} results)", op, n, r),
        }
    }

    /// Call-with-current-continuation.
    ///
    /// The current meta-continuation is reified once as the return point
    /// `r`; the escape function `kp` takes an escaping value plus the
    /// continuation the calling convention hands it (ignored) and re-enters
    /// `r`. The call/cc argument then receives `kp` as its ordinary
    /// argument, so invoking the escape procedure anywhere, even after the
    /// enclosing call has returned in direct-style terms, resumes `r` with
    /// the escaped value.
    fn conv_callcc(&mut self, arg: fun::Exp, k: Cont<'s>) -> Exp {
        let ret = self.supply.fresh("");
        let x = self.supply.fresh("");
        let escape = self.supply.fresh("");
        let v = self.supply.fresh("");
        let j = self.supply.fresh("");
        let retc = ret.clone();
        let escc = escape.clone();
        let body = self.conv(
            arg,
            Box::new(move |_, g| Exp::app(g, vec![Value::Var(escc), Value::Var(retc)])),
        );
        let ret_body = k(self, Value::Var(x.clone()));
        Exp::fix(
            vec![
                FnDef {
                    name: ret.clone(),
                    params: vec![x],
                    body: ret_body,
                },
                FnDef {
                    name: escape,
                    params: vec![v.clone(), j],
                    body: Exp::app(Value::Var(ret), vec![Value::Var(v)]),
                },
            ],
            body,
        )
    }

    /// Convert `rest` left to right, accumulating the operand values, then
    /// hand the full list to `k`.
    fn conv_list(
        &mut self,
        mut rest: std::vec::IntoIter<fun::Exp>,
        mut acc: Vec<Value>,
        k: ListCont<'s>,
    ) -> Exp {
        match rest.next() {
            None => k(self, acc),
            Some(first) => self.conv(
                first,
                Box::new(move |me, v| {
                    acc.push(v);
                    me.conv_list(rest, acc, k)
                }),
            ),
        }
    }

    /// Mutually recursive function group. Each function keeps its own
    /// parameter and gains a fresh continuation parameter its converted
    /// body tail-calls with the result.
    fn conv_fix_fns(&mut self, names: Vec<Var>, fns: Vec<fun::Lambda>) -> Vec<FnDef> {
        if names.len() != fns.len() {
            ice!(
                "fix binds {} names to {} functions",
                names.len(),
                fns.len()
            );
        }
        names
            .into_iter()
            .zip(fns)
            .map(|(name, lam)| {
                let name = self.cps_var(&name);
                let param = self.cps_var(&lam.param);
                let kvar = self.supply.fresh("");
                let ret = kvar.clone();
                let body = self.conv(
                    lam.body,
                    Box::new(move |_, z| Exp::app(Value::Var(ret), vec![z])),
                );
                FnDef {
                    name,
                    params: vec![param, kvar],
                    body,
                }
            })
            .collect()
    }
}
