//! The bound intermediate representation.
//!
//! This is the tree the binder emits after name resolution and type checking:
//! every node carries resolved symbols, operator descriptors, and a source
//! span. Statements and expressions are closed enums — a transformation that
//! matches on them is checked for completeness by the compiler, so a node
//! kind can never silently slip through a pass.
//!
//! Before lowering, bodies contain the structured constructs (`Block`, `If`,
//! `While`, `For`, `FromTo`). After lowering, a body is a single flat `Block`
//! whose children draw only from `Expression`, `VariableDeclaration`,
//! `Label`, `Goto`, `ConditionalGoto`, `Return`, and `GarbageCollection`.

use std::{fmt, rc::Rc};

use crate::{
    builtins,
    label::Label,
    operators::{BinaryOperator, UnaryOperator},
    span::TextSpan,
    symbols::{ClassSymbol, FunctionSymbol, PackageSymbol, StructSymbol, TypeSymbol, VariableSymbol},
};

/// A compile-time constant, tagged with the builtin type it carries.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum LiteralValue {
    Bool(bool),
    Byte(u8),
    Int(i32),
    Long(i64),
    Float(f64),
    String(String),
}

impl LiteralValue {
    #[must_use]
    pub fn ty(&self) -> Rc<TypeSymbol> {
        match self {
            Self::Bool(_) => builtins::boolean(),
            Self::Byte(_) => builtins::byte(),
            Self::Int(_) => builtins::int(),
            Self::Long(_) => builtins::long(),
            Self::Float(_) => builtins::float(),
            Self::String(_) => builtins::string(),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Byte(value) => write!(f, "{value}b"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Long(value) => write!(f, "{value}l"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// A variable declaration, usable both as a statement and as the loop-header
/// declaration of a `For`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VariableDeclaration {
    pub variable: Rc<VariableSymbol>,
    pub initializer: Option<BoundExpression>,
    pub span: TextSpan,
}

/// The three branch targets the emitter uses to translate a ternary.
///
/// Lowering does not desugar the ternary expression — it is value-producing
/// and the middle-end has no way to introduce a temporary mid-expression —
/// so it mints the labels here and the emitter finishes the job against its
/// SSA builder.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TernaryLabels {
    pub if_label: Label,
    pub else_label: Label,
    pub end_label: Label,
}

/// How a `MakeArray` is initialized: element-by-element from a literal list,
/// or zeroed to a runtime-computed length.
#[derive(Debug, Clone, serde::Serialize)]
pub enum ArrayInitializer {
    Literal(Vec<BoundExpression>),
    Sized(Box<BoundExpression>),
}

/// A bound statement.
#[derive(Debug, Clone, strum::Display, serde::Serialize)]
pub enum BoundStatement {
    Block {
        statements: Vec<BoundStatement>,
        span: TextSpan,
    },
    Expression {
        expression: BoundExpression,
        span: TextSpan,
    },
    VariableDeclaration(VariableDeclaration),
    If {
        condition: BoundExpression,
        then_branch: Box<BoundStatement>,
        else_branch: Option<Box<BoundStatement>>,
        span: TextSpan,
    },
    /// Loop labels are allocated by the binder so that `break`/`continue`
    /// statements in the body can be bound to gotos before lowering runs.
    While {
        condition: BoundExpression,
        body: Box<BoundStatement>,
        break_label: Label,
        continue_label: Label,
        span: TextSpan,
    },
    For {
        declaration: VariableDeclaration,
        condition: BoundExpression,
        action: Box<BoundStatement>,
        body: Box<BoundStatement>,
        break_label: Label,
        continue_label: Label,
        span: TextSpan,
    },
    /// Counted range: `var` runs from the lower bound to the upper bound
    /// inclusive, stepping by one.
    FromTo {
        variable: Rc<VariableSymbol>,
        lower_bound: BoundExpression,
        upper_bound: BoundExpression,
        body: Box<BoundStatement>,
        break_label: Label,
        continue_label: Label,
        span: TextSpan,
    },
    Label {
        label: Label,
        span: TextSpan,
    },
    Goto {
        label: Label,
        span: TextSpan,
    },
    /// Total branch: exactly one of the two labels is taken, there is no
    /// fall-through out of a conditional goto.
    ConditionalGoto {
        condition: BoundExpression,
        if_label: Label,
        else_label: Label,
        span: TextSpan,
    },
    Return {
        expression: Option<BoundExpression>,
        span: TextSpan,
    },
    /// Scope-exit marker: tells the emitter to invoke the runtime's
    /// decrement/collect hook on each listed variable, in declaration order.
    /// Only the lowerer creates these.
    GarbageCollection {
        variables: Vec<Rc<VariableSymbol>>,
        span: TextSpan,
    },
}

impl BoundStatement {
    #[must_use]
    pub fn span(&self) -> TextSpan {
        match self {
            Self::Block { span, .. }
            | Self::Expression { span, .. }
            | Self::If { span, .. }
            | Self::While { span, .. }
            | Self::For { span, .. }
            | Self::FromTo { span, .. }
            | Self::Label { span, .. }
            | Self::Goto { span, .. }
            | Self::ConditionalGoto { span, .. }
            | Self::Return { span, .. }
            | Self::GarbageCollection { span, .. } => *span,
            Self::VariableDeclaration(decl) => decl.span,
        }
    }

    /// Renders the statement tree as an indented dump, one node per line.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out
    }

    fn write(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match self {
            Self::Block { statements, .. } => {
                out.push_str(&format!("{pad}Block\n"));
                for statement in statements {
                    statement.write(out, indent + 1);
                }
            }
            Self::Expression { expression, .. } => {
                out.push_str(&format!("{pad}Expression\n"));
                expression.write(out, indent + 1);
            }
            Self::VariableDeclaration(decl) => {
                out.push_str(&format!(
                    "{pad}VariableDeclaration {}: {}\n",
                    decl.variable.name,
                    decl.variable.ty.fingerprint().as_str()
                ));
                if let Some(initializer) = &decl.initializer {
                    initializer.write(out, indent + 1);
                }
            }
            Self::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                out.push_str(&format!("{pad}If\n"));
                condition.write(out, indent + 1);
                then_branch.write(out, indent + 1);
                if let Some(else_branch) = else_branch {
                    else_branch.write(out, indent + 1);
                }
            }
            Self::While {
                condition,
                body,
                break_label,
                continue_label,
                ..
            } => {
                out.push_str(&format!("{pad}While break={break_label} continue={continue_label}\n"));
                condition.write(out, indent + 1);
                body.write(out, indent + 1);
            }
            Self::For {
                declaration,
                condition,
                action,
                body,
                break_label,
                continue_label,
                ..
            } => {
                out.push_str(&format!("{pad}For break={break_label} continue={continue_label}\n"));
                Self::VariableDeclaration(declaration.clone()).write(out, indent + 1);
                condition.write(out, indent + 1);
                action.write(out, indent + 1);
                body.write(out, indent + 1);
            }
            Self::FromTo {
                variable,
                lower_bound,
                upper_bound,
                body,
                break_label,
                continue_label,
                ..
            } => {
                out.push_str(&format!(
                    "{pad}FromTo {} break={break_label} continue={continue_label}\n",
                    variable.name
                ));
                lower_bound.write(out, indent + 1);
                upper_bound.write(out, indent + 1);
                body.write(out, indent + 1);
            }
            Self::Label { label, .. } => out.push_str(&format!("{pad}Label {label}\n")),
            Self::Goto { label, .. } => out.push_str(&format!("{pad}Goto {label}\n")),
            Self::ConditionalGoto {
                condition,
                if_label,
                else_label,
                ..
            } => {
                out.push_str(&format!("{pad}ConditionalGoto {if_label} {else_label}\n"));
                condition.write(out, indent + 1);
            }
            Self::Return { expression, .. } => {
                out.push_str(&format!("{pad}Return\n"));
                if let Some(expression) = expression {
                    expression.write(out, indent + 1);
                }
            }
            Self::GarbageCollection { variables, .. } => {
                let names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
                out.push_str(&format!("{pad}GarbageCollection [{}]\n", names.join(", ")));
            }
        }
    }
}

/// A bound expression.
///
/// Every variant reports the type the binder resolved for it through
/// [`BoundExpression::ty`]; the lowerer rebuilds nodes with rewritten
/// children but never re-types them.
#[derive(Debug, Clone, strum::Display, serde::Serialize)]
pub enum BoundExpression {
    /// Placeholder left behind by a binding failure already reported as a
    /// diagnostic.
    Error {
        span: TextSpan,
    },
    Literal {
        value: LiteralValue,
        span: TextSpan,
    },
    Variable {
        variable: Rc<VariableSymbol>,
        span: TextSpan,
    },
    Assignment {
        variable: Rc<VariableSymbol>,
        value: Box<BoundExpression>,
        span: TextSpan,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<BoundExpression>,
        span: TextSpan,
    },
    Binary {
        left: Box<BoundExpression>,
        op: BinaryOperator,
        right: Box<BoundExpression>,
        span: TextSpan,
    },
    Call {
        function: Rc<FunctionSymbol>,
        arguments: Vec<BoundExpression>,
        span: TextSpan,
    },
    /// Call of a function exported by a named package.
    PackageCall {
        package: Rc<PackageSymbol>,
        function: Rc<FunctionSymbol>,
        arguments: Vec<BoundExpression>,
        span: TextSpan,
    },
    Conversion {
        to: Rc<TypeSymbol>,
        operand: Box<BoundExpression>,
        span: TextSpan,
    },
    /// Builtin method call on a value (`x.string()`, `arr.length()`, …).
    TypeCall {
        base: Box<BoundExpression>,
        function: Rc<FunctionSymbol>,
        arguments: Vec<BoundExpression>,
        span: TextSpan,
    },
    /// Method call on a class instance.
    ClassCall {
        base: Box<BoundExpression>,
        function: Rc<FunctionSymbol>,
        arguments: Vec<BoundExpression>,
        span: TextSpan,
    },
    ClassFieldAccess {
        base: Box<BoundExpression>,
        field: Rc<VariableSymbol>,
        span: TextSpan,
    },
    ClassFieldAssignment {
        base: Box<BoundExpression>,
        field: Rc<VariableSymbol>,
        value: Box<BoundExpression>,
        span: TextSpan,
    },
    /// Explicit destruction of a class instance.
    ClassDestruction {
        base: Box<BoundExpression>,
        span: TextSpan,
    },
    ArrayAccess {
        base: Box<BoundExpression>,
        index: Box<BoundExpression>,
        is_pointer: bool,
        span: TextSpan,
    },
    ArrayAssignment {
        base: Box<BoundExpression>,
        index: Box<BoundExpression>,
        value: Box<BoundExpression>,
        is_pointer: bool,
        span: TextSpan,
    },
    /// Class instantiation.
    Make {
        class: Rc<ClassSymbol>,
        arguments: Vec<BoundExpression>,
        span: TextSpan,
    },
    MakeArray {
        element_type: Rc<TypeSymbol>,
        initializer: ArrayInitializer,
        span: TextSpan,
    },
    MakeStruct {
        struct_type: Rc<StructSymbol>,
        literals: Vec<BoundExpression>,
        span: TextSpan,
    },
    /// First-class reference to a function.
    Function {
        function: Rc<FunctionSymbol>,
        span: TextSpan,
    },
    /// Thread-entry reference; the runtime starts `function` on a new thread.
    Thread {
        function: Rc<FunctionSymbol>,
        span: TextSpan,
    },
    /// `cond ? a : b`. Kept as an expression through lowering; the lowerer
    /// fills `labels` and the emitter branches on them.
    Ternary {
        condition: Box<BoundExpression>,
        then_value: Box<BoundExpression>,
        else_value: Box<BoundExpression>,
        labels: Option<TernaryLabels>,
        span: TextSpan,
    },
    /// Take-address of a value.
    Reference {
        operand: Box<BoundExpression>,
        span: TextSpan,
    },
    Dereference {
        operand: Box<BoundExpression>,
        span: TextSpan,
    },
}

impl BoundExpression {
    #[must_use]
    pub fn span(&self) -> TextSpan {
        match self {
            Self::Error { span }
            | Self::Literal { span, .. }
            | Self::Variable { span, .. }
            | Self::Assignment { span, .. }
            | Self::Unary { span, .. }
            | Self::Binary { span, .. }
            | Self::Call { span, .. }
            | Self::PackageCall { span, .. }
            | Self::Conversion { span, .. }
            | Self::TypeCall { span, .. }
            | Self::ClassCall { span, .. }
            | Self::ClassFieldAccess { span, .. }
            | Self::ClassFieldAssignment { span, .. }
            | Self::ClassDestruction { span, .. }
            | Self::ArrayAccess { span, .. }
            | Self::ArrayAssignment { span, .. }
            | Self::Make { span, .. }
            | Self::MakeArray { span, .. }
            | Self::MakeStruct { span, .. }
            | Self::Function { span, .. }
            | Self::Thread { span, .. }
            | Self::Ternary { span, .. }
            | Self::Reference { span, .. }
            | Self::Dereference { span, .. } => *span,
        }
    }

    /// The resolved type of this expression.
    #[must_use]
    pub fn ty(&self) -> Rc<TypeSymbol> {
        match self {
            Self::Error { .. } => builtins::error(),
            Self::Literal { value, .. } => value.ty(),
            Self::Variable { variable, .. } | Self::Assignment { variable, .. } => variable.ty.clone(),
            Self::Unary { op, .. } => op.result.clone(),
            Self::Binary { op, .. } => op.result.clone(),
            Self::Call { function, .. }
            | Self::PackageCall { function, .. }
            | Self::TypeCall { function, .. }
            | Self::ClassCall { function, .. } => function.return_type.clone(),
            Self::Conversion { to, .. } => to.clone(),
            Self::ClassFieldAccess { field, .. } | Self::ClassFieldAssignment { field, .. } => field.ty.clone(),
            Self::ClassDestruction { .. } => builtins::void(),
            Self::ArrayAccess { base, is_pointer, .. } | Self::ArrayAssignment { base, is_pointer, .. } => {
                let base_ty = if *is_pointer { base.ty().inner() } else { base.ty() };
                base_ty.inner()
            }
            Self::Make { class, .. } => class.instance_type(),
            Self::MakeArray { element_type, .. } => builtins::array(element_type.clone()),
            Self::MakeStruct { struct_type, .. } => struct_type.instance_type(),
            Self::Function { function, .. } => builtins::function(
                function.parameters.iter().map(|p| p.ty.clone()).collect(),
                function.return_type.clone(),
            ),
            Self::Thread { .. } => builtins::thread(),
            Self::Ternary { then_value, .. } => then_value.ty(),
            Self::Reference { operand, .. } => builtins::pointer(operand.ty()),
            Self::Dereference { operand, .. } => operand.ty().inner(),
        }
    }

    #[must_use]
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    fn write(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match self {
            Self::Error { .. } => out.push_str(&format!("{pad}Error\n")),
            Self::Literal { value, .. } => out.push_str(&format!("{pad}Literal {value}\n")),
            Self::Variable { variable, .. } => out.push_str(&format!("{pad}Variable {}\n", variable.name)),
            Self::Assignment { variable, value, .. } => {
                out.push_str(&format!("{pad}Assignment {}\n", variable.name));
                value.write(out, indent + 1);
            }
            Self::Unary { op, operand, .. } => {
                out.push_str(&format!("{pad}Unary {}\n", op.kind));
                operand.write(out, indent + 1);
            }
            Self::Binary { left, op, right, .. } => {
                out.push_str(&format!("{pad}Binary {}\n", op.kind));
                left.write(out, indent + 1);
                right.write(out, indent + 1);
            }
            Self::Call { function, arguments, .. } => {
                out.push_str(&format!("{pad}Call {}\n", function.name));
                for argument in arguments {
                    argument.write(out, indent + 1);
                }
            }
            Self::PackageCall {
                package,
                function,
                arguments,
                ..
            } => {
                out.push_str(&format!("{pad}PackageCall {}::{}\n", package.name, function.name));
                for argument in arguments {
                    argument.write(out, indent + 1);
                }
            }
            Self::Conversion { to, operand, .. } => {
                out.push_str(&format!("{pad}Conversion -> {}\n", to.fingerprint().as_str()));
                operand.write(out, indent + 1);
            }
            Self::TypeCall {
                base,
                function,
                arguments,
                ..
            }
            | Self::ClassCall {
                base,
                function,
                arguments,
                ..
            } => {
                out.push_str(&format!("{pad}{} {}\n", self, function.name));
                base.write(out, indent + 1);
                for argument in arguments {
                    argument.write(out, indent + 1);
                }
            }
            Self::ClassFieldAccess { base, field, .. } => {
                out.push_str(&format!("{pad}ClassFieldAccess {}\n", field.name));
                base.write(out, indent + 1);
            }
            Self::ClassFieldAssignment { base, field, value, .. } => {
                out.push_str(&format!("{pad}ClassFieldAssignment {}\n", field.name));
                base.write(out, indent + 1);
                value.write(out, indent + 1);
            }
            Self::ClassDestruction { base, .. } => {
                out.push_str(&format!("{pad}ClassDestruction\n"));
                base.write(out, indent + 1);
            }
            Self::ArrayAccess { base, index, .. } => {
                out.push_str(&format!("{pad}ArrayAccess\n"));
                base.write(out, indent + 1);
                index.write(out, indent + 1);
            }
            Self::ArrayAssignment { base, index, value, .. } => {
                out.push_str(&format!("{pad}ArrayAssignment\n"));
                base.write(out, indent + 1);
                index.write(out, indent + 1);
                value.write(out, indent + 1);
            }
            Self::Make { class, arguments, .. } => {
                out.push_str(&format!("{pad}Make {}\n", class.name));
                for argument in arguments {
                    argument.write(out, indent + 1);
                }
            }
            Self::MakeArray {
                element_type,
                initializer,
                ..
            } => {
                out.push_str(&format!("{pad}MakeArray {}\n", element_type.fingerprint().as_str()));
                match initializer {
                    ArrayInitializer::Literal(elements) => {
                        for element in elements {
                            element.write(out, indent + 1);
                        }
                    }
                    ArrayInitializer::Sized(length) => length.write(out, indent + 1),
                }
            }
            Self::MakeStruct {
                struct_type, literals, ..
            } => {
                out.push_str(&format!("{pad}MakeStruct {}\n", struct_type.name));
                for literal in literals {
                    literal.write(out, indent + 1);
                }
            }
            Self::Function { function, .. } => out.push_str(&format!("{pad}Function {}\n", function.name)),
            Self::Thread { function, .. } => out.push_str(&format!("{pad}Thread {}\n", function.name)),
            Self::Ternary {
                condition,
                then_value,
                else_value,
                labels,
                ..
            } => {
                match labels {
                    Some(labels) => out.push_str(&format!(
                        "{pad}Ternary {} {} {}\n",
                        labels.if_label, labels.else_label, labels.end_label
                    )),
                    None => out.push_str(&format!("{pad}Ternary\n")),
                }
                condition.write(out, indent + 1);
                then_value.write(out, indent + 1);
                else_value.write(out, indent + 1);
            }
            Self::Reference { operand, .. } => {
                out.push_str(&format!("{pad}Reference\n"));
                operand.write(out, indent + 1);
            }
            Self::Dereference { operand, .. } => {
                out.push_str(&format!("{pad}Dereference\n"));
                operand.write(out, indent + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_literal(value: i32) -> BoundExpression {
        BoundExpression::Literal {
            value: LiteralValue::Int(value),
            span: TextSpan::EMPTY,
        }
    }

    #[test]
    fn literal_types() {
        assert_eq!(
            LiteralValue::Byte(7).ty().fingerprint(),
            builtins::byte().fingerprint()
        );
        assert_eq!(
            LiteralValue::String("x".to_owned()).ty().fingerprint(),
            builtins::string().fingerprint()
        );
    }

    #[test]
    fn expression_types_follow_symbols() {
        let variable = VariableSymbol::local("x", false, builtins::long());
        let expr = BoundExpression::Variable {
            variable,
            span: TextSpan::EMPTY,
        };
        assert_eq!(expr.ty().fingerprint(), builtins::long().fingerprint());

        let reference = BoundExpression::Reference {
            operand: expr.boxed(),
            span: TextSpan::EMPTY,
        };
        assert_eq!(reference.ty().fingerprint().as_str(), "pointer<long>");
    }

    #[test]
    fn array_access_strips_to_the_element() {
        let variable = VariableSymbol::local("xs", false, builtins::array(builtins::int()));
        let access = BoundExpression::ArrayAccess {
            base: BoundExpression::Variable {
                variable,
                span: TextSpan::EMPTY,
            }
            .boxed(),
            index: int_literal(0).boxed(),
            is_pointer: false,
            span: TextSpan::EMPTY,
        };
        assert_eq!(access.ty().fingerprint(), builtins::int().fingerprint());
    }

    #[test]
    fn dump_renders_the_tree() {
        let variable = VariableSymbol::local("x", false, builtins::int());
        let statement = BoundStatement::Block {
            statements: vec![BoundStatement::VariableDeclaration(VariableDeclaration {
                variable,
                initializer: Some(int_literal(3)),
                span: TextSpan::EMPTY,
            })],
            span: TextSpan::EMPTY,
        };
        assert_eq!(statement.dump(), "Block\n  VariableDeclaration x: int\n    Literal 3\n");
    }

    #[test]
    fn variant_names_display() {
        let statement = BoundStatement::Return {
            expression: None,
            span: TextSpan::EMPTY,
        };
        assert_eq!(statement.to_string(), "Return");
        assert_eq!(int_literal(1).to_string(), "Literal");
    }
}
