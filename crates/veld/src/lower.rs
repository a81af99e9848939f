//! The lowering pass: structured control flow to flat, jump-based form.
//!
//! Lowering runs in two phases over a bound function body:
//!
//! 1. **Rewrite** — a recursive transformation that desugars `If`, `While`,
//!    `For`, and `FromTo` into labels, gotos, and conditional gotos, while
//!    rebuilding every expression with rewritten children (folding integer
//!    literal conversions and minting branch labels for ternaries on the
//!    way).
//! 2. **Flatten** — an iterative walk that dissolves every nested `Block`
//!    into one linear statement list, inserts a garbage-collection marker at
//!    each scope exit for the locals that scope declared, and appends a bare
//!    `Return` to void functions whose last statement could fall through.
//!
//! The result is a single flat `Block` the emitter can translate statement
//! by statement. Inputs are assumed semantically valid — the binder has
//! already resolved and type-checked everything — so the pass is total and
//! raises no errors.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    bound::{ArrayInitializer, BoundExpression, BoundStatement, LiteralValue, TernaryLabels, VariableDeclaration},
    builtins,
    label::{Label, LabelAllocator},
    operators::{BinaryOperator, BinaryOperatorKind},
    span::TextSpan,
    symbols::{FunctionSymbol, TypeSymbol, VariableSymbol},
    trace::{self, LowerEvent, LowerTracer, NoopTracer},
};

/// Whether control can reach the statement following `statement`.
///
/// Only meaningful for fully lowered statements: `Return` and `Goto` never
/// fall through, everything else can. `ConditionalGoto` is counted as
/// falling through even though it always branches; the classification is
/// only ever applied to the final statement of a flattened body, and the
/// desugarings all end loops and conditionals with a `Label`, so a
/// conditional goto never sits in that position.
#[must_use]
pub fn can_fall_through(statement: &BoundStatement) -> bool {
    !matches!(
        statement,
        BoundStatement::Return { .. } | BoundStatement::Goto { .. }
    )
}

/// The non-global variables declared directly in `statements`, in
/// declaration order. Declarations inside nested blocks belong to those
/// blocks' scopes and are not included.
#[must_use]
pub fn declared_locals(statements: &[BoundStatement]) -> Vec<Rc<VariableSymbol>> {
    statements
        .iter()
        .filter_map(|statement| match statement {
            BoundStatement::VariableDeclaration(decl) if !decl.variable.is_global() => Some(decl.variable.clone()),
            _ => None,
        })
        .collect()
}

/// The lowering pass. Holds the compilation's label allocator and an
/// observer; construct one per function or reuse across a whole program.
pub struct Lowerer<'a, T: LowerTracer = NoopTracer> {
    labels: &'a mut LabelAllocator,
    tracer: T,
}

impl<'a> Lowerer<'a> {
    #[must_use]
    pub fn new(labels: &'a mut LabelAllocator) -> Self {
        Self {
            labels,
            tracer: NoopTracer,
        }
    }
}

impl<'a, T: LowerTracer> Lowerer<'a, T> {
    #[must_use]
    pub fn with_tracer(labels: &'a mut LabelAllocator, tracer: T) -> Self {
        Self { labels, tracer }
    }

    /// Consumes the lowerer and returns its tracer, so recorded events can
    /// be inspected after a run.
    #[must_use]
    pub fn into_tracer(self) -> T {
        self.tracer
    }

    /// Lowers one function body to a flat block.
    pub fn lower(&mut self, function: &Rc<FunctionSymbol>, statement: BoundStatement) -> BoundStatement {
        self.tracer.on_event(trace::function_started(function));
        let rewritten = self.rewrite_statement(statement);
        let flat = self.flatten(function, rewritten);
        let count = match &flat {
            BoundStatement::Block { statements, .. } => statements.len(),
            _ => unreachable!("flatten always returns a block"),
        };
        self.tracer.on_event(trace::function_finished(function, count));
        flat
    }

    // === Phase 1: rewrite ===

    fn rewrite_statement(&mut self, statement: BoundStatement) -> BoundStatement {
        match statement {
            BoundStatement::Block { statements, span } => BoundStatement::Block {
                statements: statements
                    .into_iter()
                    .map(|statement| self.rewrite_statement(statement))
                    .collect(),
                span,
            },
            BoundStatement::VariableDeclaration(decl) => {
                BoundStatement::VariableDeclaration(self.rewrite_declaration(decl))
            }
            BoundStatement::If {
                condition,
                then_branch,
                else_branch,
                span,
            } => self.rewrite_if(condition, then_branch, else_branch, span),
            BoundStatement::While {
                condition,
                body,
                break_label,
                continue_label,
                span,
            } => self.rewrite_while(condition, body, break_label, continue_label, span),
            BoundStatement::For {
                declaration,
                condition,
                action,
                body,
                break_label,
                continue_label,
                span,
            } => self.rewrite_for(declaration, condition, action, body, break_label, continue_label, span),
            BoundStatement::FromTo {
                variable,
                lower_bound,
                upper_bound,
                body,
                break_label,
                continue_label,
                span,
            } => self.rewrite_from_to(variable, lower_bound, upper_bound, body, break_label, continue_label, span),
            BoundStatement::Label { .. } | BoundStatement::Goto { .. } | BoundStatement::GarbageCollection { .. } => {
                statement
            }
            BoundStatement::ConditionalGoto {
                condition,
                if_label,
                else_label,
                span,
            } => BoundStatement::ConditionalGoto {
                condition: self.rewrite_expression(condition),
                if_label,
                else_label,
                span,
            },
            BoundStatement::Return { expression, span } => BoundStatement::Return {
                expression: expression.map(|expression| self.rewrite_expression(expression)),
                span,
            },
            BoundStatement::Expression { expression, span } => BoundStatement::Expression {
                expression: self.rewrite_expression(expression),
                span,
            },
        }
    }

    fn rewrite_declaration(&mut self, decl: VariableDeclaration) -> VariableDeclaration {
        match decl.initializer {
            Some(initializer) => VariableDeclaration {
                variable: decl.variable,
                initializer: Some(self.rewrite_expression(initializer)),
                span: decl.span,
            },
            None => decl,
        }
    }

    /// `if <condition> { <then> }` becomes
    ///
    /// ```text
    /// condGoto <condition> then, end
    /// then:
    ///   <then>
    /// goto end
    /// end:
    /// ```
    ///
    /// and with an else branch
    ///
    /// ```text
    /// condGoto <condition> then, else
    /// then:
    ///   <then>
    /// goto end
    /// else:
    ///   <else>
    /// goto end
    /// end:
    /// ```
    fn rewrite_if(
        &mut self,
        condition: BoundExpression,
        then_branch: Box<BoundStatement>,
        else_branch: Option<Box<BoundStatement>>,
        span: TextSpan,
    ) -> BoundStatement {
        let result = match else_branch {
            None => {
                let then_label = self.labels.fresh();
                let end_label = self.labels.fresh();
                BoundStatement::Block {
                    statements: vec![
                        BoundStatement::ConditionalGoto {
                            condition,
                            if_label: then_label.clone(),
                            else_label: end_label.clone(),
                            span,
                        },
                        BoundStatement::Label {
                            label: then_label,
                            span,
                        },
                        *then_branch,
                        BoundStatement::Goto {
                            label: end_label.clone(),
                            span,
                        },
                        BoundStatement::Label { label: end_label, span },
                    ],
                    span,
                }
            }
            Some(else_branch) => {
                let then_label = self.labels.fresh();
                let else_label = self.labels.fresh();
                let end_label = self.labels.fresh();
                BoundStatement::Block {
                    statements: vec![
                        BoundStatement::ConditionalGoto {
                            condition,
                            if_label: then_label.clone(),
                            else_label: else_label.clone(),
                            span,
                        },
                        BoundStatement::Label {
                            label: then_label,
                            span,
                        },
                        *then_branch,
                        BoundStatement::Goto {
                            label: end_label.clone(),
                            span,
                        },
                        BoundStatement::Label {
                            label: else_label,
                            span,
                        },
                        *else_branch,
                        BoundStatement::Goto {
                            label: end_label.clone(),
                            span,
                        },
                        BoundStatement::Label { label: end_label, span },
                    ],
                    span,
                }
            }
        };

        self.tracer.on_event(LowerEvent::Desugared { construct: "if" });
        self.rewrite_statement(result)
    }

    /// `while <condition> { <body> }` becomes a rotated loop with the test
    /// at the bottom, entered through a jump to the test:
    ///
    /// ```text
    /// goto continue
    /// body:
    ///   <body>
    /// goto continue
    /// continue:
    /// condGoto <condition> body, break
    /// break:
    /// ```
    ///
    /// The body-tail `goto continue` is redundant when the body falls
    /// through; it stays because the emitter expects every loop body to end
    /// in an explicit branch.
    fn rewrite_while(
        &mut self,
        condition: BoundExpression,
        body: Box<BoundStatement>,
        break_label: Label,
        continue_label: Label,
        span: TextSpan,
    ) -> BoundStatement {
        let body_label = self.labels.fresh();

        let result = BoundStatement::Block {
            statements: vec![
                BoundStatement::Goto {
                    label: continue_label.clone(),
                    span,
                },
                BoundStatement::Label {
                    label: body_label.clone(),
                    span,
                },
                *body,
                BoundStatement::Goto {
                    label: continue_label.clone(),
                    span,
                },
                BoundStatement::Label {
                    label: continue_label,
                    span,
                },
                BoundStatement::ConditionalGoto {
                    condition,
                    if_label: body_label,
                    else_label: break_label.clone(),
                    span,
                },
                BoundStatement::Label {
                    label: break_label,
                    span,
                },
            ],
            span,
        };

        self.tracer.on_event(LowerEvent::Desugared { construct: "while" });
        self.rewrite_statement(result)
    }

    /// A C-style `for` becomes a while whose body runs the step after the
    /// original body. The for's own continue label sits just before the
    /// step, so `continue` inside the loop still executes the step; the
    /// synthesized while gets a fresh continue label for its rotated test.
    fn rewrite_for(
        &mut self,
        declaration: VariableDeclaration,
        condition: BoundExpression,
        action: Box<BoundStatement>,
        body: Box<BoundStatement>,
        break_label: Label,
        continue_label: Label,
        span: TextSpan,
    ) -> BoundStatement {
        let condition = self.rewrite_expression(condition);

        let while_body = BoundStatement::Block {
            statements: vec![
                *body,
                BoundStatement::Goto {
                    label: continue_label.clone(),
                    span,
                },
                BoundStatement::Label {
                    label: continue_label,
                    span,
                },
                *action,
            ],
            span,
        };
        let while_statement = BoundStatement::While {
            condition,
            body: Box::new(while_body),
            break_label,
            continue_label: self.labels.fresh(),
            span,
        };

        let declaration = self.rewrite_declaration(declaration);

        let result = BoundStatement::Block {
            statements: vec![BoundStatement::VariableDeclaration(declaration), while_statement],
            span,
        };

        self.tracer.on_event(LowerEvent::Desugared { construct: "for" });
        self.rewrite_statement(result)
    }

    /// A counted range `from <lo> to <hi>` becomes
    ///
    /// ```text
    /// var <v> = <lo>
    /// var upperBound = <hi>        // evaluated once
    /// while <v> <= upperBound {
    ///   <body>
    ///   continue:
    ///   <v> = <v> + 1
    /// }
    /// ```
    ///
    /// with the increment inside the body ahead of the rotated test, so the
    /// loop variable has already stepped when the condition runs.
    fn rewrite_from_to(
        &mut self,
        variable: Rc<VariableSymbol>,
        lower_bound: BoundExpression,
        upper_bound: BoundExpression,
        body: Box<BoundStatement>,
        break_label: Label,
        continue_label: Label,
        span: TextSpan,
    ) -> BoundStatement {
        let lower_bound = self.rewrite_expression(lower_bound);
        let upper_bound = self.rewrite_expression(upper_bound);

        let declaration = VariableDeclaration {
            variable: variable.clone(),
            initializer: Some(lower_bound),
            span,
        };
        let upper_symbol = VariableSymbol::local("upperBound", true, builtins::int());
        let upper_declaration = VariableDeclaration {
            variable: upper_symbol.clone(),
            initializer: Some(upper_bound),
            span,
        };

        let variable_expression = BoundExpression::Variable {
            variable: variable.clone(),
            span,
        };
        let less_equals = BinaryOperator::bind(BinaryOperatorKind::LessEquals, builtins::int(), builtins::int())
            .expect("integer comparison is always defined");
        let condition = BoundExpression::Binary {
            left: variable_expression.clone().boxed(),
            op: less_equals,
            right: BoundExpression::Variable {
                variable: upper_symbol,
                span,
            }
            .boxed(),
            span,
        };

        let plus = BinaryOperator::bind(BinaryOperatorKind::Addition, builtins::int(), builtins::int())
            .expect("integer addition is always defined");
        let increment = BoundStatement::Expression {
            expression: BoundExpression::Assignment {
                variable,
                value: BoundExpression::Binary {
                    left: variable_expression.boxed(),
                    op: plus,
                    right: BoundExpression::Literal {
                        value: LiteralValue::Int(1),
                        span,
                    }
                    .boxed(),
                    span,
                }
                .boxed(),
                span,
            },
            span,
        };

        let while_body = BoundStatement::Block {
            statements: vec![
                *body,
                BoundStatement::Goto {
                    label: continue_label.clone(),
                    span,
                },
                BoundStatement::Label {
                    label: continue_label,
                    span,
                },
                increment,
            ],
            span,
        };
        let while_statement = BoundStatement::While {
            condition,
            body: Box::new(while_body),
            break_label,
            continue_label: self.labels.fresh(),
            span,
        };

        let result = BoundStatement::Block {
            statements: vec![
                BoundStatement::VariableDeclaration(declaration),
                BoundStatement::VariableDeclaration(upper_declaration),
                while_statement,
            ],
            span,
        };

        self.tracer.on_event(LowerEvent::Desugared { construct: "from-to" });
        self.rewrite_statement(result)
    }

    fn rewrite_expression(&mut self, expression: BoundExpression) -> BoundExpression {
        match expression {
            BoundExpression::Error { .. }
            | BoundExpression::Literal { .. }
            | BoundExpression::Variable { .. }
            | BoundExpression::Function { .. }
            | BoundExpression::Thread { .. } => expression,
            BoundExpression::Assignment { variable, value, span } => BoundExpression::Assignment {
                variable,
                value: self.rewrite_boxed(value),
                span,
            },
            BoundExpression::Unary { op, operand, span } => BoundExpression::Unary {
                op,
                operand: self.rewrite_boxed(operand),
                span,
            },
            BoundExpression::Binary { left, op, right, span } => BoundExpression::Binary {
                left: self.rewrite_boxed(left),
                op,
                right: self.rewrite_boxed(right),
                span,
            },
            BoundExpression::Call {
                function,
                arguments,
                span,
            } => BoundExpression::Call {
                function,
                arguments: self.rewrite_all(arguments),
                span,
            },
            BoundExpression::PackageCall {
                package,
                function,
                arguments,
                span,
            } => BoundExpression::PackageCall {
                package,
                function,
                arguments: self.rewrite_all(arguments),
                span,
            },
            BoundExpression::Conversion { to, operand, span } => self.rewrite_conversion(to, operand, span),
            BoundExpression::TypeCall {
                base,
                function,
                arguments,
                span,
            } => BoundExpression::TypeCall {
                base: self.rewrite_boxed(base),
                function,
                arguments: self.rewrite_all(arguments),
                span,
            },
            BoundExpression::ClassCall {
                base,
                function,
                arguments,
                span,
            } => BoundExpression::ClassCall {
                base: self.rewrite_boxed(base),
                function,
                arguments: self.rewrite_all(arguments),
                span,
            },
            BoundExpression::ClassFieldAccess { base, field, span } => BoundExpression::ClassFieldAccess {
                base: self.rewrite_boxed(base),
                field,
                span,
            },
            BoundExpression::ClassFieldAssignment {
                base,
                field,
                value,
                span,
            } => BoundExpression::ClassFieldAssignment {
                base: self.rewrite_boxed(base),
                field,
                value: self.rewrite_boxed(value),
                span,
            },
            BoundExpression::ClassDestruction { base, span } => BoundExpression::ClassDestruction {
                base: self.rewrite_boxed(base),
                span,
            },
            BoundExpression::ArrayAccess {
                base,
                index,
                is_pointer,
                span,
            } => BoundExpression::ArrayAccess {
                base: self.rewrite_boxed(base),
                index: self.rewrite_boxed(index),
                is_pointer,
                span,
            },
            BoundExpression::ArrayAssignment {
                base,
                index,
                value,
                is_pointer,
                span,
            } => BoundExpression::ArrayAssignment {
                base: self.rewrite_boxed(base),
                index: self.rewrite_boxed(index),
                value: self.rewrite_boxed(value),
                is_pointer,
                span,
            },
            BoundExpression::Make { class, arguments, span } => BoundExpression::Make {
                class,
                arguments: self.rewrite_all(arguments),
                span,
            },
            BoundExpression::MakeArray {
                element_type,
                initializer,
                span,
            } => BoundExpression::MakeArray {
                element_type,
                initializer: match initializer {
                    ArrayInitializer::Literal(elements) => ArrayInitializer::Literal(self.rewrite_all(elements)),
                    ArrayInitializer::Sized(length) => ArrayInitializer::Sized(self.rewrite_boxed(length)),
                },
                span,
            },
            BoundExpression::MakeStruct {
                struct_type,
                literals,
                span,
            } => BoundExpression::MakeStruct {
                struct_type,
                literals: self.rewrite_all(literals),
                span,
            },
            BoundExpression::Ternary {
                condition,
                then_value,
                else_value,
                labels: _,
                span,
            } => {
                let labels = TernaryLabels {
                    if_label: self.labels.fresh(),
                    else_label: self.labels.fresh(),
                    end_label: self.labels.fresh(),
                };
                self.tracer.on_event(LowerEvent::TernaryAnnotated {
                    end_label: labels.end_label.clone(),
                });
                BoundExpression::Ternary {
                    condition,
                    then_value,
                    else_value,
                    labels: Some(labels),
                    span,
                }
            }
            BoundExpression::Reference { operand, span } => BoundExpression::Reference {
                operand: self.rewrite_boxed(operand),
                span,
            },
            BoundExpression::Dereference { operand, span } => BoundExpression::Dereference {
                operand: self.rewrite_boxed(operand),
                span,
            },
        }
    }

    /// Rewrites a conversion, folding integer literals into the target type
    /// where the value is known at compile time: an `int` literal converted
    /// to `byte` truncates modulo 256 (the host's int-to-u8 conversion), and
    /// one converted to `long` widens losslessly.
    fn rewrite_conversion(
        &mut self,
        to: Rc<TypeSymbol>,
        operand: Box<BoundExpression>,
        span: TextSpan,
    ) -> BoundExpression {
        let operand = self.rewrite_expression(*operand);

        if let BoundExpression::Literal {
            value: LiteralValue::Int(value),
            span: literal_span,
        } = operand
        {
            if to.fingerprint() == builtins::byte().fingerprint() {
                self.tracer.on_event(LowerEvent::LiteralFolded {
                    value,
                    to: to.fingerprint().as_str().to_owned(),
                });
                return BoundExpression::Literal {
                    value: LiteralValue::Byte(value as u8),
                    span: literal_span,
                };
            }
            if to.fingerprint() == builtins::long().fingerprint() {
                self.tracer.on_event(LowerEvent::LiteralFolded {
                    value,
                    to: to.fingerprint().as_str().to_owned(),
                });
                return BoundExpression::Literal {
                    value: LiteralValue::Long(i64::from(value)),
                    span: literal_span,
                };
            }
        }

        BoundExpression::Conversion {
            to,
            operand: operand.boxed(),
            span,
        }
    }

    fn rewrite_boxed(&mut self, expression: Box<BoundExpression>) -> Box<BoundExpression> {
        Box::new(self.rewrite_expression(*expression))
    }

    fn rewrite_all(&mut self, expressions: Vec<BoundExpression>) -> Vec<BoundExpression> {
        expressions
            .into_iter()
            .map(|expression| self.rewrite_expression(expression))
            .collect()
    }

    // === Phase 2: flatten ===

    /// Dissolves nested blocks into one linear list, closing each scope with
    /// a collection marker for the locals it declared.
    fn flatten(&mut self, function: &Rc<FunctionSymbol>, statement: BoundStatement) -> BoundStatement {
        let span = statement.span();
        let mut statements: Vec<BoundStatement> = Vec::new();
        let mut stack: Vec<BoundStatement> = vec![statement];
        let mut root = true;

        while let Some(current) = stack.pop() {
            match current {
                BoundStatement::Block {
                    statements: children, ..
                } => {
                    // Only the block's own locals; nested blocks close their
                    // own scopes when they are popped.
                    let variables = declared_locals(&children);

                    // Reversed so that popping yields source order.
                    let mut local: SmallVec<[BoundStatement; 8]> = SmallVec::with_capacity(children.len());
                    for child in children.into_iter().rev() {
                        local.push(child);
                    }

                    // Pushed beneath the block's statements, the marker
                    // surfaces after all of them: exactly at scope exit. The
                    // root block is the function body itself; its locals live
                    // until the emitter's function epilogue.
                    if !variables.is_empty() && !root {
                        self.tracer.on_event(LowerEvent::CollectionInserted {
                            variables: variables.len(),
                        });
                        stack.push(BoundStatement::GarbageCollection {
                            variables,
                            span: TextSpan::EMPTY,
                        });
                    }

                    stack.extend(local);
                    root = false;
                }
                current => statements.push(current),
            }
        }

        if function.return_type.fingerprint() == builtins::void().fingerprint()
            && statements.last().is_none_or(can_fall_through)
        {
            self.tracer.on_event(LowerEvent::ReturnSynthesized);
            statements.push(BoundStatement::Return {
                expression: None,
                span: TextSpan::EMPTY,
            });
        }

        BoundStatement::Block { statements, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bool_literal(value: bool) -> BoundExpression {
        BoundExpression::Literal {
            value: LiteralValue::Bool(value),
            span: TextSpan::EMPTY,
        }
    }

    fn int_literal(value: i32) -> BoundExpression {
        BoundExpression::Literal {
            value: LiteralValue::Int(value),
            span: TextSpan::EMPTY,
        }
    }

    fn void_function(name: &str) -> Rc<FunctionSymbol> {
        FunctionSymbol::new(name, vec![], builtins::void(), false)
    }

    fn goto(label: &Label) -> BoundStatement {
        BoundStatement::Goto {
            label: label.clone(),
            span: TextSpan::EMPTY,
        }
    }

    #[test]
    fn returns_and_gotos_do_not_fall_through() {
        let mut labels = LabelAllocator::new();
        let target = labels.fresh();
        assert!(!can_fall_through(&BoundStatement::Return {
            expression: None,
            span: TextSpan::EMPTY,
        }));
        assert!(!can_fall_through(&goto(&target)));
        assert!(can_fall_through(&BoundStatement::Label {
            label: target.clone(),
            span: TextSpan::EMPTY,
        }));
        // Counted as falling through even though the branch is total; the
        // classification only ever runs on a flattened body's final
        // statement, which is never a conditional goto.
        assert!(can_fall_through(&BoundStatement::ConditionalGoto {
            condition: bool_literal(true),
            if_label: target.clone(),
            else_label: target,
            span: TextSpan::EMPTY,
        }));
    }

    #[test]
    fn declared_locals_skips_globals_and_keeps_order() {
        let a = VariableSymbol::local("a", false, builtins::int());
        let g = VariableSymbol::global("g", false, builtins::int());
        let b = VariableSymbol::local("b", false, builtins::int());
        let statements = vec![
            BoundStatement::VariableDeclaration(VariableDeclaration {
                variable: a.clone(),
                initializer: None,
                span: TextSpan::EMPTY,
            }),
            BoundStatement::VariableDeclaration(VariableDeclaration {
                variable: g,
                initializer: None,
                span: TextSpan::EMPTY,
            }),
            BoundStatement::VariableDeclaration(VariableDeclaration {
                variable: b.clone(),
                initializer: None,
                span: TextSpan::EMPTY,
            }),
        ];

        let locals = declared_locals(&statements);
        assert_eq!(locals.len(), 2);
        assert!(Rc::ptr_eq(&locals[0], &a));
        assert!(Rc::ptr_eq(&locals[1], &b));
    }

    #[test]
    fn int_to_byte_literal_folds_modulo_256() {
        let mut labels = LabelAllocator::new();
        let mut lowerer = Lowerer::new(&mut labels);

        let folded = lowerer.rewrite_expression(BoundExpression::Conversion {
            to: builtins::byte(),
            operand: int_literal(257).boxed(),
            span: TextSpan::EMPTY,
        });
        assert!(matches!(
            folded,
            BoundExpression::Literal {
                value: LiteralValue::Byte(1),
                ..
            }
        ));

        let negative = lowerer.rewrite_expression(BoundExpression::Conversion {
            to: builtins::byte(),
            operand: int_literal(-1).boxed(),
            span: TextSpan::EMPTY,
        });
        assert!(matches!(
            negative,
            BoundExpression::Literal {
                value: LiteralValue::Byte(255),
                ..
            }
        ));
    }

    #[test]
    fn int_to_long_literal_widens() {
        let mut labels = LabelAllocator::new();
        let mut lowerer = Lowerer::new(&mut labels);

        let folded = lowerer.rewrite_expression(BoundExpression::Conversion {
            to: builtins::long(),
            operand: int_literal(40).boxed(),
            span: TextSpan::EMPTY,
        });
        assert!(matches!(
            folded,
            BoundExpression::Literal {
                value: LiteralValue::Long(40),
                ..
            }
        ));
    }

    #[test]
    fn non_literal_conversions_are_preserved() {
        let mut labels = LabelAllocator::new();
        let mut lowerer = Lowerer::new(&mut labels);

        let variable = VariableSymbol::local("x", false, builtins::int());
        let kept = lowerer.rewrite_expression(BoundExpression::Conversion {
            to: builtins::byte(),
            operand: BoundExpression::Variable {
                variable,
                span: TextSpan::EMPTY,
            }
            .boxed(),
            span: TextSpan::EMPTY,
        });
        assert!(matches!(kept, BoundExpression::Conversion { .. }));

        // Conversions to targets other than byte/long keep even literals.
        let to_float = lowerer.rewrite_expression(BoundExpression::Conversion {
            to: builtins::float(),
            operand: int_literal(3).boxed(),
            span: TextSpan::EMPTY,
        });
        assert!(matches!(to_float, BoundExpression::Conversion { .. }));
    }

    #[test]
    fn ternary_gets_three_fresh_labels_without_desugaring() {
        let mut labels = LabelAllocator::new();
        let mut lowerer = Lowerer::new(&mut labels);

        let annotated = lowerer.rewrite_expression(BoundExpression::Ternary {
            condition: int_literal(1).boxed(),
            then_value: int_literal(2).boxed(),
            else_value: int_literal(3).boxed(),
            labels: None,
            span: TextSpan::EMPTY,
        });

        let BoundExpression::Ternary { labels: Some(labels), .. } = annotated else {
            panic!("ternary survives rewriting with labels attached");
        };
        assert_eq!(labels.if_label.as_str(), "Label1");
        assert_eq!(labels.else_label.as_str(), "Label2");
        assert_eq!(labels.end_label.as_str(), "Label3");
    }

    #[test]
    fn rewriting_a_lowered_body_is_a_no_op() {
        let mut labels = LabelAllocator::new();
        let function = void_function("f");
        let x = VariableSymbol::local("x", false, builtins::int());

        let body = BoundStatement::Block {
            statements: vec![BoundStatement::If {
                condition: bool_literal(true),
                then_branch: Box::new(BoundStatement::VariableDeclaration(VariableDeclaration {
                    variable: x,
                    initializer: Some(int_literal(0)),
                    span: TextSpan::EMPTY,
                })),
                else_branch: None,
                span: TextSpan::EMPTY,
            }],
            span: TextSpan::EMPTY,
        };

        let mut lowerer = Lowerer::new(&mut labels);
        let lowered = lowerer.lower(&function, body);
        let again = lowerer.rewrite_statement(lowered.clone());
        assert_eq!(again.dump(), lowered.dump());
    }

    #[test]
    fn empty_void_body_gains_a_terminal_return() {
        let mut labels = LabelAllocator::new();
        let function = void_function("f");
        let body = BoundStatement::Block {
            statements: vec![],
            span: TextSpan::EMPTY,
        };

        let lowered = Lowerer::new(&mut labels).lower(&function, body);
        let BoundStatement::Block { statements, .. } = &lowered else {
            panic!("lowering returns a block");
        };
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            statements[0],
            BoundStatement::Return { expression: None, .. }
        ));
    }

    #[test]
    fn non_void_bodies_get_no_injected_return() {
        let mut labels = LabelAllocator::new();
        let function = FunctionSymbol::new("f", vec![], builtins::int(), false);
        let body = BoundStatement::Block {
            statements: vec![BoundStatement::Return {
                expression: Some(int_literal(3)),
                span: TextSpan::EMPTY,
            }],
            span: TextSpan::EMPTY,
        };

        let lowered = Lowerer::new(&mut labels).lower(&function, body);
        let BoundStatement::Block { statements, .. } = &lowered else {
            panic!("lowering returns a block");
        };
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            statements[0],
            BoundStatement::Return {
                expression: Some(_),
                ..
            }
        ));
    }
}
