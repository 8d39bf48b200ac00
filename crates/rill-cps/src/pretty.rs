//! Human-readable rendering of CPS trees.
//!
//! One binding per line, bodies indented under their binders. Used by
//! drivers in debug mode and by test failure output; the format is not a
//! stable interface.

use std::fmt;

use crate::exp::{Exp, Path, Value};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Var(v) => write!(f, "{}", v),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Undefined => f.write_str("undefined"),
            Value::Label(l) => write!(f, "L{}", l),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Path::Off(n) => write!(f, "+{}", n),
            Path::Sel(i, rest) => write!(f, ".{}{}", i, rest),
        }
    }
}

impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_exp(f, self, 0)
    }
}

fn write_exp(f: &mut fmt::Formatter<'_>, exp: &Exp, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match exp {
        Exp::App(app) => {
            write!(f, "{}{}(", pad, app.callee)?;
            write_values(f, &app.args)?;
            writeln!(f, ")")
        }
        Exp::Fix(fix) => {
            for d in &fix.fns {
                write!(f, "{}fix {}(", pad, d.name)?;
                for (i, p) in d.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                writeln!(f, ") =")?;
                write_exp(f, &d.body, depth + 1)?;
            }
            writeln!(f, "{}in", pad)?;
            write_exp(f, &fix.body, depth)
        }
        Exp::Primop(p) => {
            write!(f, "{}", pad)?;
            if !p.results.is_empty() {
                for (i, w) in p.results.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", w)?;
                }
                f.write_str(" = ")?;
            }
            write!(f, "{}(", p.op)?;
            write_values(f, &p.args)?;
            if p.conts.len() == 1 {
                writeln!(f, ")")?;
                write_exp(f, &p.conts[0], depth)
            } else {
                writeln!(f, ") ?")?;
                for e in &p.conts {
                    write_exp(f, e, depth + 1)?;
                }
                Ok(())
            }
        }
        Exp::Record(r) => {
            write!(f, "{}{} = record(", pad, r.binding)?;
            for (i, fld) in r.fields.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", fld.value)?;
                if fld.path != Path::Off(0) {
                    write!(f, "{}", fld.path)?;
                }
            }
            writeln!(f, ")")?;
            write_exp(f, &r.body, depth)
        }
        Exp::Select(s) => {
            writeln!(f, "{}{} = select {} {}", pad, s.binding, s.index, s.record)?;
            write_exp(f, &s.body, depth)
        }
        Exp::Switch(sw) => {
            writeln!(f, "{}switch {} {{", pad, sw.value)?;
            for (i, e) in sw.branches.iter().enumerate() {
                writeln!(f, "{}  case {}:", pad, i)?;
                write_exp(f, e, depth + 2)?;
            }
            writeln!(f, "{}}}", pad)
        }
    }
}

fn write_values(f: &mut fmt::Formatter<'_>, vs: &[Value]) -> fmt::Result {
    for (i, v) in vs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", v)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exp::{Field, FnDef, Record};
    use rill_common::VarSupply;

    #[test]
    fn renders_bindings_one_per_line() {
        let mut supply = VarSupply::new();
        let w = supply.fresh("w");
        let f = supply.fresh("f");
        let x = supply.fresh("x");
        let exp = Exp::fix(
            vec![FnDef {
                name: f.clone(),
                params: vec![x.clone()],
                body: Exp::Record(Record {
                    fields: vec![Field::at_root(Value::Var(x)), Field::at_root(Value::Int(2))],
                    binding: w.clone(),
                    body: Box::new(Exp::app(Value::Var(w), vec![Value::Undefined])),
                }),
            }],
            Exp::app(Value::Var(f), vec![Value::Int(0)]),
        );
        let text = exp.to_string();
        assert_eq!(
            text,
            "fix f.2(x.3) =\n  w.1 = record(x.3, 2)\n  w.1(undefined)\nin\nf.2(0)\n"
        );
    }
}
