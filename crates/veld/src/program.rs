//! The bound program: the per-function body table the driver lowers in
//! place.
//!
//! The binder produces one [`BoundFunction`] per declared function, in
//! declaration order, each holding the structured body it bound. The driver
//! calls [`BoundProgram::lower`] once, after which every body is a flat
//! block ready for the emitter.

use std::rc::Rc;

use crate::{
    bound::BoundStatement,
    label::LabelAllocator,
    lower::Lowerer,
    span::TextSpan,
    symbols::FunctionSymbol,
    trace::LowerTracer,
};

/// A function together with its (structured or lowered) body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BoundFunction {
    pub symbol: Rc<FunctionSymbol>,
    pub body: BoundStatement,
}

/// All functions of a compilation unit, in declaration order.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BoundProgram {
    pub functions: Vec<BoundFunction>,
}

impl BoundProgram {
    #[must_use]
    pub fn new(functions: Vec<BoundFunction>) -> Self {
        Self { functions }
    }

    /// Looks up a function's body by symbol identity.
    #[must_use]
    pub fn body_of(&self, symbol: &Rc<FunctionSymbol>) -> Option<&BoundStatement> {
        self.functions
            .iter()
            .find(|function| Rc::ptr_eq(&function.symbol, symbol))
            .map(|function| &function.body)
    }

    /// Lowers every function body in place. One allocator serves the whole
    /// program, so labels stay unique across functions.
    pub fn lower(&mut self, labels: &mut LabelAllocator) {
        let mut lowerer = Lowerer::new(labels);
        self.lower_with(&mut lowerer);
    }

    /// Like [`BoundProgram::lower`], with a caller-supplied lowerer (and
    /// therefore tracer).
    pub fn lower_with<T: LowerTracer>(&mut self, lowerer: &mut Lowerer<'_, T>) {
        for function in &mut self.functions {
            let body = std::mem::replace(
                &mut function.body,
                BoundStatement::Block {
                    statements: vec![],
                    span: TextSpan::EMPTY,
                },
            );
            function.body = lowerer.lower(&function.symbol, body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bound::{BoundExpression, LiteralValue},
        builtins,
    };

    fn int_function(name: &str, value: i32) -> BoundFunction {
        BoundFunction {
            symbol: FunctionSymbol::new(name, vec![], builtins::int(), true),
            body: BoundStatement::Block {
                statements: vec![BoundStatement::Return {
                    expression: Some(BoundExpression::Literal {
                        value: LiteralValue::Int(value),
                        span: TextSpan::EMPTY,
                    }),
                    span: TextSpan::EMPTY,
                }],
                span: TextSpan::EMPTY,
            },
        }
    }

    #[test]
    fn lowers_every_body_in_place() {
        let mut program = BoundProgram::new(vec![int_function("a", 1), int_function("b", 2)]);
        let mut labels = LabelAllocator::new();
        program.lower(&mut labels);

        for function in &program.functions {
            let BoundStatement::Block { statements, .. } = &function.body else {
                panic!("lowered body is a block");
            };
            assert_eq!(statements.len(), 1);
            assert!(matches!(statements[0], BoundStatement::Return { .. }));
        }
    }

    #[test]
    fn body_lookup_is_by_symbol_identity() {
        let program = BoundProgram::new(vec![int_function("a", 1)]);
        let symbol = program.functions[0].symbol.clone();
        assert!(program.body_of(&symbol).is_some());

        let twin = FunctionSymbol::new("a", vec![], builtins::int(), true);
        assert!(program.body_of(&twin).is_none());
    }
}
