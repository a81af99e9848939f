//! Structural checks over lowered function bodies.
//!
//! The lowerer's output contract is narrow: one flat block, no structured
//! control flow, every referenced label defined exactly once, void bodies
//! ending in a bare return, collection markers listing only locals. This
//! module re-checks all of that after the fact. The production pipeline
//! never needs it — the checks hold by construction — but the test suite
//! runs every lowered body through it, and it is a handy debugging net when
//! changing the pass.

use ahash::{AHashMap, AHashSet};

use crate::{
    bound::{BoundExpression, BoundStatement},
    builtins,
    label::Label,
    symbols::FunctionSymbol,
};

/// A violation of the lowered-output contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    /// The body handed in was not a `Block` at all.
    NotABlock { kind: String },
    /// A `Block` survived flattening.
    NestedBlock,
    /// A structured statement (`If`, `While`, `For`, `FromTo`) survived
    /// desugaring.
    StructuredStatement { kind: String },
    /// A goto or conditional goto references a label no `Label` statement
    /// defines.
    UndefinedLabel { label: Label },
    /// Two `Label` statements share a name.
    DuplicateLabel { label: Label },
    /// A void function's body does not end in a bare `Return`.
    MissingTerminalReturn { function: String },
    /// A collection marker lists a global variable.
    GlobalInCollection { variable: String },
    /// A collection marker with no variables; the lowerer never emits one.
    EmptyCollection,
    /// A ternary expression with no branch labels attached.
    UnannotatedTernary,
}

impl std::fmt::Display for ValidateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotABlock { kind } => write!(f, "lowered body is a {kind}, not a block"),
            Self::NestedBlock => write!(f, "nested block survived flattening"),
            Self::StructuredStatement { kind } => write!(f, "structured statement {kind} survived lowering"),
            Self::UndefinedLabel { label } => write!(f, "branch references undefined label {label}"),
            Self::DuplicateLabel { label } => write!(f, "label {label} defined more than once"),
            Self::MissingTerminalReturn { function } => {
                write!(f, "void function {function} does not end in a bare return")
            }
            Self::GlobalInCollection { variable } => {
                write!(f, "collection marker lists global variable {variable}")
            }
            Self::EmptyCollection => write!(f, "collection marker lists no variables"),
            Self::UnannotatedTernary => write!(f, "ternary expression has no branch labels"),
        }
    }
}

impl std::error::Error for ValidateError {}

/// Checks a lowered function body against the output contract, returning
/// the first violation found.
pub fn check_lowered(function: &FunctionSymbol, body: &BoundStatement) -> Result<(), ValidateError> {
    let BoundStatement::Block { statements, .. } = body else {
        return Err(ValidateError::NotABlock {
            kind: body.to_string(),
        });
    };

    let mut defined: AHashMap<Label, usize> = AHashMap::new();
    let mut referenced: AHashSet<Label> = AHashSet::new();

    for statement in statements {
        match statement {
            BoundStatement::Block { .. } => return Err(ValidateError::NestedBlock),
            BoundStatement::If { .. }
            | BoundStatement::While { .. }
            | BoundStatement::For { .. }
            | BoundStatement::FromTo { .. } => {
                return Err(ValidateError::StructuredStatement {
                    kind: statement.to_string(),
                });
            }
            BoundStatement::Label { label, .. } => {
                *defined.entry(label.clone()).or_insert(0) += 1;
            }
            BoundStatement::Goto { label, .. } => {
                referenced.insert(label.clone());
            }
            BoundStatement::ConditionalGoto {
                condition,
                if_label,
                else_label,
                ..
            } => {
                referenced.insert(if_label.clone());
                referenced.insert(else_label.clone());
                check_expression(condition)?;
            }
            BoundStatement::Expression { expression, .. } => check_expression(expression)?,
            BoundStatement::VariableDeclaration(decl) => {
                if let Some(initializer) = &decl.initializer {
                    check_expression(initializer)?;
                }
            }
            BoundStatement::Return { expression, .. } => {
                if let Some(expression) = expression {
                    check_expression(expression)?;
                }
            }
            BoundStatement::GarbageCollection { variables, .. } => {
                if variables.is_empty() {
                    return Err(ValidateError::EmptyCollection);
                }
                if let Some(global) = variables.iter().find(|variable| variable.is_global()) {
                    return Err(ValidateError::GlobalInCollection {
                        variable: global.name.clone(),
                    });
                }
            }
        }
    }

    for (label, count) in &defined {
        if *count > 1 {
            return Err(ValidateError::DuplicateLabel { label: label.clone() });
        }
    }
    if let Some(label) = referenced.iter().find(|label| !defined.contains_key(*label)) {
        return Err(ValidateError::UndefinedLabel { label: label.clone() });
    }

    if function.return_type.fingerprint() == builtins::void().fingerprint() {
        let terminal_is_bare_return = matches!(statements.last(), Some(BoundStatement::Return { expression: None, .. }));
        if !terminal_is_bare_return {
            return Err(ValidateError::MissingTerminalReturn {
                function: function.name.clone(),
            });
        }
    }
    Ok(())
}

/// Walks an expression tree looking for ternaries that lowering failed to
/// annotate with branch labels.
fn check_expression(expression: &BoundExpression) -> Result<(), ValidateError> {
    match expression {
        BoundExpression::Error { .. }
        | BoundExpression::Literal { .. }
        | BoundExpression::Variable { .. }
        | BoundExpression::Function { .. }
        | BoundExpression::Thread { .. } => Ok(()),
        BoundExpression::Assignment { value, .. } => check_expression(value),
        BoundExpression::Unary { operand, .. }
        | BoundExpression::Reference { operand, .. }
        | BoundExpression::Dereference { operand, .. } => check_expression(operand),
        BoundExpression::Binary { left, right, .. } => {
            check_expression(left)?;
            check_expression(right)
        }
        BoundExpression::Call { arguments, .. }
        | BoundExpression::PackageCall { arguments, .. }
        | BoundExpression::Make { arguments, .. } => arguments.iter().try_for_each(check_expression),
        BoundExpression::Conversion { operand, .. } => check_expression(operand),
        BoundExpression::TypeCall { base, arguments, .. } | BoundExpression::ClassCall { base, arguments, .. } => {
            check_expression(base)?;
            arguments.iter().try_for_each(check_expression)
        }
        BoundExpression::ClassFieldAccess { base, .. } | BoundExpression::ClassDestruction { base, .. } => {
            check_expression(base)
        }
        BoundExpression::ClassFieldAssignment { base, value, .. } => {
            check_expression(base)?;
            check_expression(value)
        }
        BoundExpression::ArrayAccess { base, index, .. } => {
            check_expression(base)?;
            check_expression(index)
        }
        BoundExpression::ArrayAssignment { base, index, value, .. } => {
            check_expression(base)?;
            check_expression(index)?;
            check_expression(value)
        }
        BoundExpression::MakeArray { initializer, .. } => match initializer {
            crate::bound::ArrayInitializer::Literal(elements) => elements.iter().try_for_each(check_expression),
            crate::bound::ArrayInitializer::Sized(length) => check_expression(length),
        },
        BoundExpression::MakeStruct { literals, .. } => literals.iter().try_for_each(check_expression),
        BoundExpression::Ternary {
            condition,
            then_value,
            else_value,
            labels,
            ..
        } => {
            if labels.is_none() {
                return Err(ValidateError::UnannotatedTernary);
            }
            check_expression(condition)?;
            check_expression(then_value)?;
            check_expression(else_value)
        }
    }
}
