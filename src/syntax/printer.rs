//! Parenthesised prefix rendering of the AST, used by the `ast` debug dump
//! and by tests to compare trees compactly.

use std::fmt;

use super::{expr::Expression, stmt::Statement};

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => write!(f, "{literal}"),
            Self::Grouping(inner) => write!(f, "(group {inner})"),
            Self::Unary { op, operand, .. } => write!(f, "({} {operand})", op.symbol()),
            Self::Binary { lhs, op, rhs, .. } => write!(f, "({} {lhs} {rhs})", op.symbol()),
            Self::Logical { lhs, op, rhs } => write!(f, "({} {lhs} {rhs})", op.symbol()),
            Self::Variable(id) => write!(f, "{}", id.name),
            Self::Assignment { target, value } => write!(f, "(= {} {value})", target.name),
            Self::Call { callee, args, .. } => {
                write!(f, "(call {callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expr) => write!(f, "(; {expr})"),
            Self::Print { value, .. } => write!(f, "(print {value})"),
            Self::VarDecl { name, init: None } => write!(f, "(var {})", name.name),
            Self::VarDecl {
                name,
                init: Some(init),
            } => write!(f, "(var {} {init})", name.name),
            Self::Block(statements) => {
                write!(f, "(block")?;
                for stmt in statements {
                    write!(f, " {stmt}")?;
                }
                write!(f, ")")
            }
            Self::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => write!(f, "(if {condition} {then_branch} {else_branch})"),
                None => write!(f, "(if {condition} {then_branch})"),
            },
            Self::While { condition, body } => write!(f, "(while {condition} {body})"),
            Self::FnDecl(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "(fun {} ({})", decl.name.name, params.join(" "))?;
                for stmt in &decl.body {
                    write!(f, " {stmt}")?;
                }
                write!(f, ")")
            }
            Self::Return { value: None, .. } => write!(f, "(return)"),
            Self::Return {
                value: Some(value), ..
            } => write!(f, "(return {value})"),
        }
    }
}
