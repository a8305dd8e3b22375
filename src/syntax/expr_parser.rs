use super::{
    expr::{BinaryOp, Expression, Identifier, Literal, LogicalOp, UnaryOp},
    token::{Keyword, Operator, TokenKind},
    ExprParser, Parser, Precedence,
};
use crate::{
    error::{ErrorKind, PResult},
    stack::ensure_sufficient_stack,
};

const PREC_OR: Precedence = 1;
const PREC_AND: Precedence = 2;
const PREC_EQUALITY: Precedence = 3;
const PREC_COMPARISON: Precedence = 4;
const PREC_TERM: Precedence = 5;
const PREC_FACTOR: Precedence = 6;

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn infix(kind: TokenKind) -> Option<(Infix, Precedence)> {
    use Operator::*;

    let entry = match kind {
        TokenKind::Kw(Keyword::Or) => (Infix::Logical(LogicalOp::Or), PREC_OR),
        TokenKind::Kw(Keyword::And) => (Infix::Logical(LogicalOp::And), PREC_AND),
        TokenKind::Op(EqualEqual) => (Infix::Binary(BinaryOp::Equal), PREC_EQUALITY),
        TokenKind::Op(BangEqual) => (Infix::Binary(BinaryOp::NotEqual), PREC_EQUALITY),
        TokenKind::Op(Greater) => (Infix::Binary(BinaryOp::Greater), PREC_COMPARISON),
        TokenKind::Op(GreaterEqual) => (Infix::Binary(BinaryOp::GreaterEqual), PREC_COMPARISON),
        TokenKind::Op(Less) => (Infix::Binary(BinaryOp::Less), PREC_COMPARISON),
        TokenKind::Op(LessEqual) => (Infix::Binary(BinaryOp::LessEqual), PREC_COMPARISON),
        TokenKind::Op(Plus) => (Infix::Binary(BinaryOp::Add), PREC_TERM),
        TokenKind::Op(Minus) => (Infix::Binary(BinaryOp::Subtract), PREC_TERM),
        TokenKind::Op(Star) => (Infix::Binary(BinaryOp::Multiply), PREC_FACTOR),
        TokenKind::Op(Slash) => (Infix::Binary(BinaryOp::Divide), PREC_FACTOR),
        _ => return None,
    };
    Some(entry)
}

impl<'src> ExprParser<'src> for Parser<'src> {
    fn parse_expr(&mut self) -> PResult<Expression> {
        ensure_sufficient_stack(|| self.nested(|p| p.parse_assignment_expr()))
    }

    fn parse_assignment_expr(&mut self) -> PResult<Expression> {
        let expr = self.parse_expr_with_precedence(PREC_OR)?;

        if !self.at(TokenKind::Eq) {
            return Ok(expr);
        }
        let equals = self.bump();
        let value = self.parse_expr()?;

        match expr {
            Expression::Variable(target) => Ok(Expression::Assignment {
                target,
                value: Box::new(value),
            }),
            _ => Err(Self::error_at(&equals, ErrorKind::InvalidAssignmentTarget)),
        }
    }

    fn parse_expr_with_precedence(&mut self, min_prec: Precedence) -> PResult<Expression> {
        let mut lhs = self.parse_unary_expr()?;

        // Each operator in a chain adds a level to the left-leaning tree.
        self.restoring_depth(|p| {
            while let Some((op, prec)) = infix(p.peek().kind) {
                if prec < min_prec {
                    break;
                }
                p.descend()?;
                let line = p.bump().line;

                // All infix operators are left-associative.
                let rhs = Box::new(p.parse_expr_with_precedence(prec + 1)?);
                let lhs_expr = Box::new(lhs);

                lhs = match op {
                    Infix::Binary(op) => Expression::Binary {
                        lhs: lhs_expr,
                        op,
                        rhs,
                        line,
                    },
                    Infix::Logical(op) => Expression::Logical {
                        lhs: lhs_expr,
                        op,
                        rhs,
                    },
                };
            }

            Ok(lhs)
        })
    }

    fn parse_unary_expr(&mut self) -> PResult<Expression> {
        let op = match self.peek().kind {
            TokenKind::Op(Operator::Bang) => UnaryOp::Not,
            TokenKind::Op(Operator::Minus) => UnaryOp::Negate,
            _ => return self.parse_call_expr(),
        };
        let line = self.bump().line;
        let operand = ensure_sufficient_stack(|| self.nested(|p| p.parse_unary_expr()))?;

        Ok(Expression::Unary {
            op,
            operand: Box::new(operand),
            line,
        })
    }

    fn parse_call_expr(&mut self) -> PResult<Expression> {
        let mut expr = self.parse_primary_expr()?;

        self.restoring_depth(|p| {
            while p.eat_if(TokenKind::LParen) {
                p.descend()?;
                let args = p.parse_rep(TokenKind::RParen, |p| p.parse_expr())?;
                let paren = p.expect(TokenKind::RParen, "Expect ')' after arguments.")?;

                expr = Expression::Call {
                    callee: Box::new(expr),
                    args,
                    line: paren.line,
                };
            }

            Ok(expr)
        })
    }

    fn parse_primary_expr(&mut self) -> PResult<Expression> {
        let token = self.peek();

        let expr = match token.kind {
            TokenKind::Kw(Keyword::True) => Expression::Literal(Literal::Boolean(true)),
            TokenKind::Kw(Keyword::False) => Expression::Literal(Literal::Boolean(false)),
            TokenKind::Kw(Keyword::Nil) => Expression::Literal(Literal::Nil),
            TokenKind::Number | TokenKind::String => match &token.literal {
                Some(literal) => Expression::Literal(literal.clone()),
                None => {
                    return Err(Self::error_at(
                        token,
                        ErrorKind::UnexpectedToken("Expect literal value.".into()),
                    ))
                }
            },
            TokenKind::Identifier => Expression::Variable(Identifier::new(token.lexeme, token.line)),
            TokenKind::LParen => {
                self.bump();
                return self.parse_grouping_expr();
            }
            _ => {
                return Err(Self::error_at(
                    token,
                    ErrorKind::UnexpectedToken("Expect expression.".into()),
                ))
            }
        };

        self.bump();
        Ok(expr)
    }

    fn parse_grouping_expr(&mut self) -> PResult<Expression> {
        let expr = self.parse_expr()?;
        self.expect(TokenKind::RParen, "Expect ')' after expression.")?;
        Ok(Expression::Grouping(Box::new(expr)))
    }
}
