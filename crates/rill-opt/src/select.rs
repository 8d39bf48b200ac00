//! Select-folding.
//!
//! A `Select` that projects from a record whose fields are statically
//! known, because it sits in the continuation of the `Record` node that
//! bound its operand, is eliminated: every use of the select's binding is
//! replaced by the field value itself.

use rill_cps::{map, Exp, Field, Path, Record, Select, Value};

use crate::subst;

/// One select-folding sweep over the whole tree.
pub fn fold_selects(exp: Exp) -> Exp {
    map(exp, &mut |exp| match exp {
        Exp::Record(Record {
            fields,
            binding,
            body,
        }) => {
            let body = map(*body, &mut |e| match e {
                Exp::Select(s) if matches!(&s.record, Value::Var(v) if *v == binding) => {
                    fold_one(&fields, s)
                }
                other => other,
            });
            Exp::Record(Record {
                fields,
                binding,
                body: Box::new(body),
            })
        }
        other => other,
    })
}

/// Substitute the known field for the select's binding. Only fields at
/// the trivial offset fold; anything else is left for the backend (which
/// will reject paths it cannot address). An out-of-range index folds to
/// the undefined value.
fn fold_one(fields: &[Field], s: Select) -> Exp {
    let field = match fields.get(s.index) {
        Some(field) => field.clone(),
        None => Field::at_root(Value::Undefined),
    };
    if field.path != Path::Off(0) {
        return Exp::Select(s);
    }
    subst(*s.body, &[s.binding], &[field.value])
}
