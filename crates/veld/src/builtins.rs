//! The builtin type catalog.
//!
//! Builtins are ordinary [`TypeSymbol`]s identified by fingerprint, so the
//! constructors here can hand out fresh allocations: two calls to [`int`]
//! yield distinct `Rc`s that compare as the same type. The lowerer needs
//! `void` (terminal-return injection), `int`, `byte`, and `long` (literal
//! folding and counted-range loops); the rest round out the surface the
//! binder types expressions with.

use std::rc::Rc;

use crate::symbols::TypeSymbol;

#[must_use]
pub fn void() -> Rc<TypeSymbol> {
    TypeSymbol::new("void", vec![])
}

#[must_use]
pub fn boolean() -> Rc<TypeSymbol> {
    TypeSymbol::new("bool", vec![])
}

#[must_use]
pub fn byte() -> Rc<TypeSymbol> {
    TypeSymbol::new("byte", vec![])
}

#[must_use]
pub fn int() -> Rc<TypeSymbol> {
    TypeSymbol::new("int", vec![])
}

#[must_use]
pub fn long() -> Rc<TypeSymbol> {
    TypeSymbol::new("long", vec![])
}

#[must_use]
pub fn float() -> Rc<TypeSymbol> {
    TypeSymbol::new("float", vec![])
}

#[must_use]
pub fn string() -> Rc<TypeSymbol> {
    TypeSymbol::new("string", vec![])
}

/// The type of an expression that failed to bind. Earlier phases report the
/// diagnostic; the node itself still needs a type to flow through the IR.
#[must_use]
pub fn error() -> Rc<TypeSymbol> {
    TypeSymbol::new("error", vec![])
}

/// A started thread, joinable by the runtime.
#[must_use]
pub fn thread() -> Rc<TypeSymbol> {
    TypeSymbol::new("thread", vec![])
}

#[must_use]
pub fn array(element: Rc<TypeSymbol>) -> Rc<TypeSymbol> {
    TypeSymbol::new("array", vec![element])
}

#[must_use]
pub fn pointer(pointee: Rc<TypeSymbol>) -> Rc<TypeSymbol> {
    TypeSymbol::new("pointer", vec![pointee])
}

/// The type of a first-class function reference: parameter types in order,
/// then the return type.
#[must_use]
pub fn function(parameters: Vec<Rc<TypeSymbol>>, return_type: Rc<TypeSymbol>) -> Rc<TypeSymbol> {
    let mut sub_types = parameters;
    sub_types.push(return_type);
    TypeSymbol::new("fn", sub_types)
}
