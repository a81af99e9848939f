//! Symbols: named, typed handles shared by reference across the bound IR.
//!
//! The binder allocates one symbol per declaration and every use site holds
//! an [`Rc`] to that same allocation, so identity survives lowering: the
//! variable listed in a scope-exit collection marker is pointer-equal to the
//! one in its declaration statement. The lowerer itself looks at exactly two
//! things in here: [`VariableSymbol::is_global`] and type fingerprints.

use std::rc::Rc;

use indexmap::IndexMap;

/// Where a variable lives.
///
/// Globals are declared at program scope; everything else is `Local` or
/// `Parameter`. Global-ness is the only scope bit the lowerer inspects:
/// globals never appear in collection markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum VariableScope {
    Global,
    Local,
    Parameter,
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VariableSymbol {
    pub name: String,
    /// Set for `const`-style declarations; the middle-end carries it through
    /// for the emitter but never acts on it.
    pub read_only: bool,
    pub ty: Rc<TypeSymbol>,
    pub scope: VariableScope,
}

impl VariableSymbol {
    #[must_use]
    pub fn global(name: impl Into<String>, read_only: bool, ty: Rc<TypeSymbol>) -> Rc<Self> {
        Self::with_scope(name, read_only, ty, VariableScope::Global)
    }

    #[must_use]
    pub fn local(name: impl Into<String>, read_only: bool, ty: Rc<TypeSymbol>) -> Rc<Self> {
        Self::with_scope(name, read_only, ty, VariableScope::Local)
    }

    #[must_use]
    pub fn parameter(name: impl Into<String>, ty: Rc<TypeSymbol>) -> Rc<Self> {
        Self::with_scope(name, false, ty, VariableScope::Parameter)
    }

    fn with_scope(name: impl Into<String>, read_only: bool, ty: Rc<TypeSymbol>, scope: VariableScope) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            read_only,
            ty,
            scope,
        })
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.scope == VariableScope::Global
    }
}

/// A function, with its parameters already bound as `Parameter`-scoped
/// variable symbols in declaration order.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FunctionSymbol {
    pub name: String,
    pub parameters: Vec<Rc<VariableSymbol>>,
    pub return_type: Rc<TypeSymbol>,
    pub public: bool,
}

impl FunctionSymbol {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Rc<VariableSymbol>>,
        return_type: Rc<TypeSymbol>,
        public: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            parameters,
            return_type,
            public,
        })
    }
}

/// A stable identity for a type.
///
/// Two type symbols describe the same type iff their fingerprints are equal,
/// even when the symbols are separate allocations. Fingerprints are the only
/// type comparison the middle-end performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A type descriptor: a name plus ordered sub-types (element type of an
/// array, pointee of a pointer, …).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TypeSymbol {
    pub name: String,
    pub sub_types: Vec<Rc<TypeSymbol>>,
}

impl TypeSymbol {
    #[must_use]
    pub fn new(name: impl Into<String>, sub_types: Vec<Rc<TypeSymbol>>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            sub_types,
        })
    }

    /// Builds the stable identity of this type from its name and the
    /// fingerprints of its sub-types. Deterministic within a run (and across
    /// runs, since nothing address-dependent is mixed in).
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut out = self.name.clone();
        if !self.sub_types.is_empty() {
            out.push('<');
            for (i, sub) in self.sub_types.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(sub.fingerprint().as_str());
            }
            out.push('>');
        }
        Fingerprint(out)
    }

    /// The single sub-type of a container type (array element, pointee).
    ///
    /// # Panics
    ///
    /// Panics if the type carries no sub-type; the binder only hands
    /// container-typed operands to the accessors that call this.
    #[must_use]
    pub fn inner(&self) -> Rc<TypeSymbol> {
        self.sub_types
            .first()
            .cloned()
            .expect("container type carries its element type")
    }
}

/// A class: an ordered field table plus the instance type it produces.
///
/// The lowerer treats classes opaquely; only the expressions stored in class
/// operands are rewritten.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassSymbol {
    pub name: String,
    pub fields: IndexMap<String, Rc<TypeSymbol>>,
}

impl ClassSymbol {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: IndexMap<String, Rc<TypeSymbol>>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            fields,
        })
    }

    /// The type of an instance of this class.
    #[must_use]
    pub fn instance_type(&self) -> Rc<TypeSymbol> {
        TypeSymbol::new(self.name.clone(), vec![])
    }
}

/// A plain-data struct: ordered fields, no behavior.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StructSymbol {
    pub name: String,
    pub fields: IndexMap<String, Rc<TypeSymbol>>,
}

impl StructSymbol {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: IndexMap<String, Rc<TypeSymbol>>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            fields,
        })
    }

    /// The type of a value of this struct.
    #[must_use]
    pub fn instance_type(&self) -> Rc<TypeSymbol> {
        TypeSymbol::new(self.name.clone(), vec![])
    }
}

/// An enum: named integer members in declaration order.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EnumSymbol {
    pub name: String,
    pub members: IndexMap<String, i64>,
}

impl EnumSymbol {
    #[must_use]
    pub fn new(name: impl Into<String>, members: IndexMap<String, i64>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            members,
        })
    }
}

/// A named collection of exported functions.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PackageSymbol {
    pub name: String,
    pub functions: Vec<Rc<FunctionSymbol>>,
}

impl PackageSymbol {
    #[must_use]
    pub fn new(name: impl Into<String>, functions: Vec<Rc<FunctionSymbol>>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            functions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn fingerprints_compare_structurally() {
        // Separately constructed symbols for the same type are the same type.
        assert_eq!(builtins::int().fingerprint(), builtins::int().fingerprint());
        assert_ne!(builtins::int().fingerprint(), builtins::long().fingerprint());

        let a = builtins::array(builtins::int());
        let b = builtins::array(builtins::int());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), builtins::array(builtins::byte()).fingerprint());
    }

    #[test]
    fn nested_fingerprints_spell_out_sub_types() {
        let ty = builtins::pointer(builtins::array(builtins::string()));
        assert_eq!(ty.fingerprint().as_str(), "pointer<array<string>>");
    }

    #[test]
    fn scope_classification() {
        let global = VariableSymbol::global("g", false, builtins::int());
        let local = VariableSymbol::local("l", false, builtins::int());
        let param = VariableSymbol::parameter("p", builtins::int());
        assert!(global.is_global());
        assert!(!local.is_global());
        assert!(!param.is_global());
        assert_eq!(param.scope.to_string(), "parameter");
    }
}
