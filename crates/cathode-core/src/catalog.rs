//! Builtin function type metadata.
//!
//! The full function metadata table (parameters, defaults, enums) lives
//! outside this crate. The graph-integrity code only needs to know whether an
//! identifier names a builtin function type, and which type a builtin
//! inherits from.

use std::collections::{HashMap, HashSet};

use crate::composite::Program;
use crate::id::Identifier;

/// Longest inheritance chain followed before giving up.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Read-only view of the builtin function type table.
pub trait FunctionCatalog {
    /// Returns `true` if `function` is a known builtin function type.
    fn is_builtin(&self, function: Identifier) -> bool;

    /// The type `function` inherits from, if it has a base.
    fn base_type(&self, function: Identifier) -> Option<Identifier>;
}

/// Returns `true` if a function entity calling `function` has a valid target:
/// an existing composite, a builtin type, or a type whose inheritance chain
/// reaches a builtin.
pub fn is_known_function(
    catalog: &dyn FunctionCatalog,
    program: &Program,
    function: Identifier,
) -> bool {
    if program.contains_composite(function) {
        return true;
    }
    let mut current = function;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if catalog.is_builtin(current) {
            return true;
        }
        match catalog.base_type(current) {
            Some(base) => current = base,
            None => return false,
        }
    }
    false
}

/// In-memory [`FunctionCatalog`].
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    builtins: HashSet<Identifier>,
    bases: HashMap<Identifier, Identifier>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog of builtin types from their names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = StaticCatalog::new();
        for name in names {
            catalog.add_builtin(Identifier::from_name(name.as_ref()));
        }
        catalog
    }

    pub fn add_builtin(&mut self, function: Identifier) -> &mut Self {
        self.builtins.insert(function);
        self
    }

    /// Records that `function` inherits from `base`.
    pub fn add_inheritance(&mut self, function: Identifier, base: Identifier) -> &mut Self {
        self.bases.insert(function, base);
        self
    }
}

impl FunctionCatalog for StaticCatalog {
    fn is_builtin(&self, function: Identifier) -> bool {
        self.builtins.contains(&function)
    }

    fn base_type(&self, function: Identifier) -> Option<Identifier> {
        self.bases.get(&function).copied()
    }
}
