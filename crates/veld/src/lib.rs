#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "byte folding truncates on purpose")]
#![expect(clippy::cast_sign_loss, reason = "byte folding reinterprets negatives on purpose")]
#![expect(clippy::too_many_arguments, reason = "statement payloads pass through whole")]

mod bound;
pub mod builtins;
mod label;
mod lower;
mod operators;
mod program;
mod span;
mod symbols;
mod trace;
mod validate;

pub use crate::{
    bound::{ArrayInitializer, BoundExpression, BoundStatement, LiteralValue, TernaryLabels, VariableDeclaration},
    label::{Label, LabelAllocator},
    lower::{Lowerer, can_fall_through, declared_locals},
    operators::{BinaryOperator, BinaryOperatorKind, UnaryOperator, UnaryOperatorKind},
    program::{BoundFunction, BoundProgram},
    span::TextSpan,
    symbols::{
        ClassSymbol, EnumSymbol, Fingerprint, FunctionSymbol, PackageSymbol, StructSymbol, TypeSymbol, VariableScope,
        VariableSymbol,
    },
    trace::{LowerEvent, LowerTracer, NoopTracer, RecordingTracer, StderrTracer},
    validate::{ValidateError, check_lowered},
};
