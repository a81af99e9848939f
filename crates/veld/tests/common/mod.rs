//! Shared builders for lowering tests.
//!
//! Bodies are assembled the way the binder would emit them: symbols shared
//! through `Rc`, loop labels pre-allocated from the same allocator the
//! lowerer will draw from, every node carrying a span.

use std::rc::Rc;

use veld::{
    BoundExpression, BoundStatement, FunctionSymbol, LiteralValue, TextSpan, VariableDeclaration, VariableSymbol,
    builtins,
};

pub fn void_function(name: &str) -> Rc<FunctionSymbol> {
    FunctionSymbol::new(name, vec![], builtins::void(), false)
}

pub fn int_local(name: &str) -> Rc<VariableSymbol> {
    VariableSymbol::local(name, false, builtins::int())
}

pub fn bool_local(name: &str) -> Rc<VariableSymbol> {
    VariableSymbol::local(name, false, builtins::boolean())
}

pub fn variable(symbol: &Rc<VariableSymbol>) -> BoundExpression {
    BoundExpression::Variable {
        variable: symbol.clone(),
        span: TextSpan::EMPTY,
    }
}

pub fn int_literal(value: i32) -> BoundExpression {
    BoundExpression::Literal {
        value: LiteralValue::Int(value),
        span: TextSpan::EMPTY,
    }
}

pub fn expression_statement(expression: BoundExpression) -> BoundStatement {
    BoundStatement::Expression {
        expression,
        span: TextSpan::EMPTY,
    }
}

pub fn declare(symbol: &Rc<VariableSymbol>, initializer: Option<BoundExpression>) -> BoundStatement {
    BoundStatement::VariableDeclaration(VariableDeclaration {
        variable: symbol.clone(),
        initializer,
        span: TextSpan::EMPTY,
    })
}

pub fn block(statements: Vec<BoundStatement>) -> BoundStatement {
    BoundStatement::Block {
        statements,
        span: TextSpan::EMPTY,
    }
}

/// The child statements of a lowered body.
pub fn statements_of(body: &BoundStatement) -> &[BoundStatement] {
    match body {
        BoundStatement::Block { statements, .. } => statements,
        other => panic!("lowered body is always a block, got {other}"),
    }
}
