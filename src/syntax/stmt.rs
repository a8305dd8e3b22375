use std::rc::Rc;

use super::expr::{Expression, Identifier};

#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: Identifier,
    pub params: Vec<Identifier>,
    pub body: Vec<Statement>,
}

impl FnDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    Print {
        value: Expression,
        line: usize,
    },
    VarDecl {
        name: Identifier,
        init: Option<Expression>,
    },
    Block(Vec<Statement>),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    /// Shared so that function values created from it can outlive the
    /// program that declared them.
    FnDecl(Rc<FnDecl>),
    Return {
        value: Option<Expression>,
        line: usize,
    },
}
