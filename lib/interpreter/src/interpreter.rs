use std::io::{self, stdout, Stdout, Write};

use cursor::Line;
use errors::{At, LoxError, Reporter};
use parser::{Expr, LiteralValue, Stmt};
use scanner::{Token, TokenData};

mod value;
pub use value::Value;

mod environment;
pub use environment::Environment;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorType {
    #[error("Operand must be a number")]
    OperandMustBeNumber,
    #[error("Operand must be a number or a string")]
    OperandMustBeNumberOrString,
    #[error("Variable {0} is undefined")]
    UndefinedVariable(String),
}

impl RuntimeErrorType {
    fn at(self, token: &Token) -> RuntimeError {
        RuntimeError { error: self, line: token.line(), at: token.at() }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct RuntimeError {
    pub error: RuntimeErrorType,
    pub line: Line,
    pub at: At,
}

impl From<RuntimeError> for LoxError {
    fn from(e: RuntimeError) -> Self {
        LoxError::new(e.line, e.at, e.error)
    }
}

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Tree-walking interpreter. `print` output goes to `output`, global bindings live as long
/// as the interpreter does.
#[derive(Debug)]
pub struct Interpreter<W = Stdout> {
    environment: Environment,
    output: W,
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Self::new(stdout())
    }
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        Self { environment: Environment::default(), output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Scans, parses and, if no compile-time error was reported, executes `source`.
    pub fn run_source(&mut self, source: &str, reporter: &mut dyn Reporter) -> io::Result<()> {
        let tokens = scanner::scan(source, reporter);
        let stmts = parser::parse(tokens, reporter);

        if reporter.had_error() {
            log::debug!("Not running {} statement(s) due to compile errors", stmts.len());
            return Ok(());
        }

        self.interpret(&stmts, reporter)
    }

    /// Executes `stmts` in order. The first runtime error is sent to `reporter` and
    /// stops execution; only failing to write output is returned as an error.
    pub fn interpret(&mut self, stmts: &[Stmt], reporter: &mut dyn Reporter) -> io::Result<()> {
        for stmt in stmts {
            match self.execute(stmt) {
                Ok(()) => (),
                Err(Error::Runtime(e)) => {
                    reporter.runtime_error(e.into());
                    return Ok(());
                }
                Err(Error::Io(e)) => return Err(e),
            }
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<()> {
        log::trace!("Executing {}", stmt);
        match stmt {
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                Ok(())
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme(), value);
                Ok(())
            }
            Stmt::Block(stmts) => {
                self.environment.push_scope();
                let result = stmts.iter().try_for_each(|stmt| self.execute(stmt));
                self.environment.pop_scope();
                result
            }
            Stmt::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        use TokenData::*;
        match expr {
            Expr::Literal(LiteralValue::Number(n)) => Ok((*n).into()),
            Expr::Literal(LiteralValue::Str(s)) => Ok((*s).into()),
            Expr::Literal(LiteralValue::Boolean(b)) => Ok((*b).into()),
            Expr::Literal(LiteralValue::Nil) => Ok(Value::Nil),

            Expr::Grouping(expr) => self.evaluate(expr),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match (operator.data, right) {
                    (Minus, Value::Number(n)) => Ok((-n).into()),
                    (Minus, _) => Err(RuntimeErrorType::OperandMustBeNumber.at(operator).into()),
                    (Bang, v) => Ok((!v.is_truthy()).into()),
                    _ => unreachable!("Not a unary operator: {}", operator),
                }
            }

            Expr::Variable(name) => Ok(self.environment.get(name)?.clone()),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(name, value.clone())?;
                Ok(value)
            }

            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                match (operator.data, left, right) {
                    (EqualEqual, l, r) => Ok((l == r).into()),
                    (BangEqual, l, r) => Ok((l != r).into()),

                    (Plus, Value::Str(l), Value::Str(r)) => Ok((l + &r).into()),
                    (Plus, Value::Number(l), Value::Number(r)) => Ok((l + r).into()),
                    (Plus, _, _) => {
                        Err(RuntimeErrorType::OperandMustBeNumberOrString.at(operator).into())
                    }

                    (Minus, Value::Number(l), Value::Number(r)) => Ok((l - r).into()),
                    (Star, Value::Number(l), Value::Number(r)) => Ok((l * r).into()),
                    // IEEE semantics, dividing by zero is not an error
                    (Slash, Value::Number(l), Value::Number(r)) => Ok((l / r).into()),

                    (Greater, Value::Number(l), Value::Number(r)) => Ok((l > r).into()),
                    (GreaterEqual, Value::Number(l), Value::Number(r)) => Ok((l >= r).into()),
                    (Less, Value::Number(l), Value::Number(r)) => Ok((l < r).into()),
                    (LessEqual, Value::Number(l), Value::Number(r)) => Ok((l <= r).into()),

                    (Minus | Star | Slash | Greater | GreaterEqual | Less | LessEqual, _, _) => {
                        Err(RuntimeErrorType::OperandMustBeNumber.at(operator).into())
                    }

                    _ => unreachable!("Not a binary operator: {}", operator),
                }
            }
        }
    }
}
