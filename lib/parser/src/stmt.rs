use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use scanner::Token;

use crate::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    Expression(Expr<'a>),
    Print(Expr<'a>),
    Var { name: Token<'a>, initializer: Option<Expr<'a>> },
    Block(Vec<Stmt<'a>>),
    If { condition: Expr<'a>, then_branch: Box<Stmt<'a>>, else_branch: Option<Box<Stmt<'a>>> },
}

impl Display for Stmt<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression(expr) => write!(f, "{expr};"),
            Stmt::Print(expr) => write!(f, "(print {expr})"),
            Stmt::Var { name, initializer: None } => write!(f, "(var {name})"),
            Stmt::Var { name, initializer: Some(init) } => write!(f, "(var {name} {init})"),
            Stmt::Block(stmts) => {
                write!(f, "(block")?;
                if !stmts.is_empty() {
                    write!(f, " {}", stmts.iter().join(" "))?;
                }
                write!(f, ")")
            }
            Stmt::If { condition, then_branch, else_branch: None } => {
                write!(f, "(if {condition} {then_branch})")
            }
            Stmt::If { condition, then_branch, else_branch: Some(else_branch) } => {
                write!(f, "(if {condition} {then_branch} {else_branch})")
            }
        }
    }
}
