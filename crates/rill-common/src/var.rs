//! Variable identities and the tag supply.
//!
//! A [`Var`] is identified by a numeric tag that is unique across one
//! compilation session. The optional name exists only for diagnostics;
//! equality, ordering, and hashing all go through the tag so that two
//! variables that happen to share a source name never alias.

use std::fmt;

use serde::Serialize;

/// A variable identity.
///
/// Tags are nonzero and unique for the lifetime of a compilation session.
/// This uniqueness is what lets the optimizer substitute values for
/// variables without capture-avoiding renaming: no two binding sites can
/// ever collide.
#[derive(Debug, Clone, Serialize)]
pub struct Var {
    /// Unique numeric tag. Nonzero for every valid variable.
    pub tag: u32,
    /// Diagnostic name; empty for compiler-introduced temporaries.
    pub name: String,
}

impl Var {
    pub fn new(tag: u32, name: impl Into<String>) -> Var {
        Var {
            tag,
            name: name.into(),
        }
    }
}

// Identity is the tag alone. The name is display-only and must not take
// part in equality or hashing.
impl PartialEq for Var {
    fn eq(&self, other: &Var) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Var {}

impl std::hash::Hash for Var {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "v{}", self.tag)
        } else {
            write!(f, "{}.{}", self.name, self.tag)
        }
    }
}

/// Allocator for fresh variable tags.
///
/// One supply belongs to one compilation session and is passed by `&mut`
/// into every stage that introduces variables. It must never be reset
/// mid-compilation; independent compilations each get their own supply so
/// that units later linked together cannot alias identities.
#[derive(Debug, Default)]
pub struct VarSupply {
    next: u32,
}

impl VarSupply {
    pub fn new() -> VarSupply {
        VarSupply::default()
    }

    /// Mint a variable with a fresh tag. `name` is diagnostic only and may
    /// be empty.
    pub fn fresh(&mut self, name: &str) -> Var {
        self.next += 1;
        Var::new(self.next, name)
    }
}
