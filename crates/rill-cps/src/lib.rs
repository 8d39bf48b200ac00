//! The CPS intermediate representation and the fun-to-CPS converter.
//!
//! Downstream of front-end lowering, this crate is the entry into the
//! middle-end: [`convert`] turns a sequence of fun-IR units into one CPS
//! expression whose every control transfer is an explicit tail call. The
//! optimizer rewrites that tree; backends and the reference evaluator
//! consume it through an iterative trampoline (a CPS program never
//! returns through the native stack).

pub mod convert;
pub mod exp;
pub mod map;
mod pretty;

pub use convert::convert;
pub use exp::{App, Exp, Field, Fix, FnDef, Path, Primop, Record, Select, Switch, Value};
pub use map::{map, map_values, walk, walk_values};

/// Serialize a CPS tree as pretty-printed JSON, for debug dumps and
/// external tooling.
pub fn to_json(exp: &Exp) -> String {
    serde_json::to_string_pretty(exp).expect("CPS trees always serialize")
}
