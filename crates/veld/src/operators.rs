//! Resolved operator descriptors.
//!
//! The binder turns a token like `<=` into a [`BinaryOperator`] carrying the
//! operand types it was resolved against and the result type it produces.
//! The lowerer never re-resolves operators; it copies descriptors into
//! rebuilt nodes, and binds two of its own when desugaring counted-range
//! loops (`int <= int` and `int + int`).

use std::rc::Rc;

use crate::{builtins, symbols::TypeSymbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize)]
pub enum BinaryOperatorKind {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulus,
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    LogicalAnd,
    LogicalOr,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

impl BinaryOperatorKind {
    /// Comparison operators produce `bool` regardless of operand type.
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equals | Self::NotEquals | Self::Less | Self::LessEquals | Self::Greater | Self::GreaterEquals
        )
    }
}

/// A binary operator resolved against its operand types.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BinaryOperator {
    pub kind: BinaryOperatorKind,
    pub left: Rc<TypeSymbol>,
    pub right: Rc<TypeSymbol>,
    pub result: Rc<TypeSymbol>,
}

impl BinaryOperator {
    /// Resolves `kind` for the given operand types, or `None` when the
    /// combination is not defined. The binder reports `None` as a type
    /// error; the lowerer only ever binds integer `+` and `<=`, which are
    /// always defined.
    #[must_use]
    pub fn bind(kind: BinaryOperatorKind, left: Rc<TypeSymbol>, right: Rc<TypeSymbol>) -> Option<Self> {
        if left.fingerprint() != right.fingerprint() {
            return None;
        }

        let result = if kind.is_comparison() {
            builtins::boolean()
        } else {
            match kind {
                BinaryOperatorKind::LogicalAnd | BinaryOperatorKind::LogicalOr
                    if left.fingerprint() != builtins::boolean().fingerprint() =>
                {
                    return None;
                }
                _ => left.clone(),
            }
        };

        Some(Self {
            kind,
            left,
            right,
            result,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize)]
pub enum UnaryOperatorKind {
    Identity,
    Negation,
    LogicalNot,
    BitwiseNot,
}

/// A unary operator resolved against its operand type.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UnaryOperator {
    pub kind: UnaryOperatorKind,
    pub operand: Rc<TypeSymbol>,
    pub result: Rc<TypeSymbol>,
}

impl UnaryOperator {
    #[must_use]
    pub fn bind(kind: UnaryOperatorKind, operand: Rc<TypeSymbol>) -> Option<Self> {
        let boolean = builtins::boolean();
        let result = match kind {
            UnaryOperatorKind::LogicalNot => {
                if operand.fingerprint() != boolean.fingerprint() {
                    return None;
                }
                boolean
            }
            UnaryOperatorKind::Identity | UnaryOperatorKind::Negation | UnaryOperatorKind::BitwiseNot => {
                operand.clone()
            }
        };

        Some(Self { kind, operand, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_results_in_bool() {
        let op = BinaryOperator::bind(BinaryOperatorKind::LessEquals, builtins::int(), builtins::int()).unwrap();
        assert_eq!(op.result.fingerprint(), builtins::boolean().fingerprint());
    }

    #[test]
    fn arithmetic_keeps_operand_type() {
        let op = BinaryOperator::bind(BinaryOperatorKind::Addition, builtins::long(), builtins::long()).unwrap();
        assert_eq!(op.result.fingerprint(), builtins::long().fingerprint());
    }

    #[test]
    fn mismatched_operands_do_not_bind() {
        assert!(BinaryOperator::bind(BinaryOperatorKind::Addition, builtins::int(), builtins::long()).is_none());
        assert!(BinaryOperator::bind(BinaryOperatorKind::LogicalAnd, builtins::int(), builtins::int()).is_none());
    }

    #[test]
    fn logical_not_requires_bool() {
        assert!(UnaryOperator::bind(UnaryOperatorKind::LogicalNot, builtins::int()).is_none());
        let op = UnaryOperator::bind(UnaryOperatorKind::Negation, builtins::float()).unwrap();
        assert_eq!(op.result.fingerprint(), builtins::float().fingerprint());
    }
}
