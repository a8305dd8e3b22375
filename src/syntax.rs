mod expr;
mod expr_parser;
mod lexer;
mod parser;
mod printer;
mod stmt;
mod token;

pub use expr::{BinaryOp, Expression, Identifier, Literal, LogicalOp, UnaryOp};
pub use lexer::scan;
pub use parser::{parse, Parser};
pub use stmt::{FnDecl, Statement};
pub use token::{Keyword, Operator, Token, TokenKind};

use crate::error::PResult;

/// Precedence of an infix operator; higher binds tighter.
pub(crate) type Precedence = u8;

pub(crate) trait ExprParser<'src> {
    fn parse_expr(&mut self) -> PResult<Expression>;
    fn parse_assignment_expr(&mut self) -> PResult<Expression>;
    fn parse_expr_with_precedence(&mut self, min_prec: Precedence) -> PResult<Expression>;
    fn parse_unary_expr(&mut self) -> PResult<Expression>;
    fn parse_call_expr(&mut self) -> PResult<Expression>;
    fn parse_primary_expr(&mut self) -> PResult<Expression>;
    fn parse_grouping_expr(&mut self) -> PResult<Expression>;
}
