mod expr;
mod stmt;

use cursor::Line;
use errors::{At, LoxError, Reporter};
pub use expr::{Expr, LiteralValue};
use scanner::{Token, TokenData};
pub use stmt::Stmt;

use TokenData::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParserErrorType {
    #[error("Expected an expression")]
    ExpectedExpression,
    #[error("Expected variable name")]
    ExpectedVariableName,
    #[error("Expected ';' after {0}")]
    ExpectedSemicolonAfter(&'static str),
    #[error("Expected '(' after '{0}'")]
    ExpectedLeftParen(&'static str),
    #[error("Expected ')' after {0}")]
    ExpectedRightParen(&'static str),
    #[error("Expected '}}' after block")]
    ExpectedRightBrace,
    #[error("Invalid assignment target")]
    InvalidAssignmentTarget,
}

impl ParserErrorType {
    fn at(self, token: &Token) -> ParserError {
        ParserError { error: self, line: token.line(), at: token.at() }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct ParserError {
    pub error: ParserErrorType,
    pub line: Line,
    pub at: At,
}

impl From<ParserError> for LoxError {
    fn from(e: ParserError) -> Self {
        LoxError::new(e.line, e.at, e.error)
    }
}

type Result<T> = std::result::Result<T, ParserError>;

/// Parses `tokens`, sending every syntax error to `reporter`.
///
/// Declarations that failed to parse are left out of the returned statements.
pub fn parse<'a>(tokens: Vec<Token<'a>>, reporter: &mut dyn Reporter) -> Vec<Stmt<'a>> {
    let (stmts, errors) = Parser::new(tokens).parse();
    for e in errors {
        reporter.error(e.into());
    }
    stmts
}

#[derive(Debug)]
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
    errors: Vec<ParserError>,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.last().map(|t| t.data) != Some(Eof) {
            let line = tokens.last().map(Token::line).unwrap_or_default();
            tokens.push(Token::new(Eof, "", line));
        }
        Self { tokens, current: 0, errors: Vec::new() }
    }

    pub fn parse(mut self) -> (Vec<Stmt<'a>>, Vec<ParserError>) {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            stmts.extend(self.declaration());
        }
        (stmts, self.errors)
    }

    fn declaration(&mut self) -> Option<Stmt<'a>> {
        let stmt = if self.advance_if(Var).is_some() {
            self.var_declaration()
        } else {
            self.statement()
        };

        match stmt {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                log::debug!("Hit error: {:?}, syncing...", e);
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt<'a>> {
        let name = self.consume(Identifier, ParserErrorType::ExpectedVariableName)?;

        let initializer = match self.advance_if(Equal) {
            Some(_) => Some(self.expression()?),
            None => None,
        };

        self.consume(
            Semicolon,
            ParserErrorType::ExpectedSemicolonAfter("variable declaration"),
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt<'a>> {
        if self.advance_if(Print).is_some() {
            return self.print_statement();
        }

        if self.advance_if(LeftBrace).is_some() {
            return Ok(Stmt::Block(self.block()?));
        }

        if self.advance_if(If).is_some() {
            return self.if_statement();
        }

        self.expression_statement()
    }

    fn if_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume(LeftParen, ParserErrorType::ExpectedLeftParen("if"))?;
        let condition = self.expression()?;
        self.consume(RightParen, ParserErrorType::ExpectedRightParen("condition"))?;

        let then_branch = Box::new(self.statement()?);

        let else_branch = match self.advance_if(Else) {
            Some(_) => Some(self.statement()?),
            None => None,
        }
        .map(Box::new);

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn block(&mut self) -> Result<Vec<Stmt<'a>>> {
        let mut stmts = Vec::new();

        while !self.check(RightBrace) && !self.is_at_end() {
            stmts.extend(self.declaration());
        }

        self.consume(RightBrace, ParserErrorType::ExpectedRightBrace)?;
        Ok(stmts)
    }

    fn print_statement(&mut self) -> Result<Stmt<'a>> {
        let value = self.expression()?;
        self.consume(Semicolon, ParserErrorType::ExpectedSemicolonAfter("value"))?;
        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt<'a>> {
        let value = self.expression()?;
        self.consume(Semicolon, ParserErrorType::ExpectedSemicolonAfter("expression"))?;
        Ok(Stmt::Expression(value))
    }

    fn expression(&mut self) -> Result<Expr<'a>> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr<'a>> {
        let expr = self.equality()?;

        if let Some(equals) = self.advance_if(Equal) {
            let value = Box::new(self.assignment()?);

            if let Expr::Variable(name) = &expr {
                return Ok(Expr::Assign { name: name.clone(), value });
            }

            // Not in panic mode: we know exactly where we are, so just record it
            self.errors.push(ParserErrorType::InvalidAssignmentTarget.at(&equals));
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.comparison()?;

        while let BangEqual | EqualEqual = self.peek().data {
            let operator = self.advance();
            let right = Box::new(self.comparison()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.term()?;

        while let Greater | GreaterEqual | Less | LessEqual = self.peek().data {
            let operator = self.advance();
            let right = Box::new(self.term()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.factor()?;

        while let Plus | Minus = self.peek().data {
            let operator = self.advance();
            let right = Box::new(self.factor()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.unary()?;

        while let Star | Slash = self.peek().data {
            let operator = self.advance();
            let right = Box::new(self.unary()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>> {
        if let Minus | Bang = self.peek().data {
            let operator = self.advance();
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { operator, right });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        let expr = match self.peek().data {
            False => Expr::Literal(LiteralValue::Boolean(false)),
            True => Expr::Literal(LiteralValue::Boolean(true)),
            Nil => Expr::Literal(LiteralValue::Nil),
            Number(n) => Expr::Literal(LiteralValue::Number(n)),
            Str(s) => Expr::Literal(LiteralValue::Str(s)),
            Identifier => Expr::Variable(self.peek().clone()),
            LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(RightParen, ParserErrorType::ExpectedRightParen("expression"))?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => return Err(ParserErrorType::ExpectedExpression.at(self.peek())),
        };

        self.advance();
        Ok(expr)
    }

    /// Discards tokens until we're (probably) at the start of the next statement.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().data == Semicolon {
                return;
            }

            if let Class | Fun | Var | For | If | While | Print | Return = self.peek().data {
                return;
            }

            log::trace!("Syncing... skipping {:?}", self.peek());
            self.advance();
        }
    }
}

// Helpers
impl<'a> Parser<'a> {
    fn peek(&self) -> &Token<'a> {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token<'a> {
        &self.tokens[self.current - 1]
    }

    fn is_at_end(&self) -> bool {
        self.peek().data == Eof
    }

    /// Only meant for tokens without a payload.
    fn check(&self, data: TokenData) -> bool {
        debug_assert!(!matches!(data, Number(_) | Str(_)));
        self.peek().data == data
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn advance_if(&mut self, data: TokenData) -> Option<Token<'a>> {
        self.check(data).then(|| self.advance())
    }

    fn consume(&mut self, data: TokenData, error: ParserErrorType) -> Result<Token<'a>> {
        match self.advance_if(data) {
            Some(token) => Ok(token),
            None => Err(error.at(self.peek())),
        }
    }
}

#[cfg(test)]
mod tests {
    use errors::Diagnostics;
    use itertools::Itertools;
    use pretty_assertions::assert_eq;
    use scanner::Scanner;

    use super::*;

    fn parse_source(source: &str) -> (Vec<Stmt<'_>>, Vec<String>) {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        assert_eq!(scan_errors, vec![]);

        let mut diagnostics = Diagnostics::new();
        let stmts = parse(tokens, &mut diagnostics);
        let errors = diagnostics.errors().iter().map(|e| e.to_string()).collect_vec();
        (stmts, errors)
    }

    fn parse_ok(source: &str) -> String {
        let (stmts, errors) = parse_source(source);
        assert_eq!(errors, Vec::<String>::new());
        stmts.iter().join("\n")
    }

    #[test]
    fn precedence() {
        assert_eq!(parse_ok("1 + 2 * 3;"), "(+ 1 (* 2 3));");
        assert_eq!(parse_ok("1 * 2 + 3;"), "(+ (* 1 2) 3);");
        assert_eq!(parse_ok("(1 + 2) * 3;"), "(* (group (+ 1 2)) 3);");
        assert_eq!(parse_ok("1 < 2 == 3 >= 4;"), "(== (< 1 2) (>= 3 4));");
        assert_eq!(parse_ok("-1 - -2;"), "(- (- 1) (- 2));");
        assert_eq!(parse_ok("!!true != false;"), "(!= (! (! true)) false);");
    }

    #[test]
    fn binary_operators_are_left_associative() {
        assert_eq!(parse_ok("1 - 2 - 3;"), "(- (- 1 2) 3);");
        assert_eq!(parse_ok("8 / 4 / 2;"), "(/ (/ 8 4) 2);");
        assert_eq!(parse_ok("a == b == c;"), "(== (== a b) c);");
    }

    #[test]
    fn multiplication_is_right_operand_of_addition() {
        let (stmts, _) = parse_source("1 + 2 * 3;");
        let Stmt::Expression(Expr::Binary { left, operator, right }) = &stmts[0] else {
            panic!("Expected binary expression, got {:?}", stmts[0]);
        };
        assert_eq!(operator.data, Plus);
        assert_eq!(**left, Expr::Literal(LiteralValue::Number(1.0)));
        assert!(matches!(**right, Expr::Binary { ref operator, .. } if operator.data == Star));
    }

    #[test]
    fn literals() {
        assert_eq!(parse_ok("1.5;"), "1.5;");
        assert_eq!(parse_ok("\"str\";"), "\"str\";");
        assert_eq!(parse_ok("nil;"), "nil;");
        assert_eq!(parse_ok("true; false;"), "true;\nfalse;");
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(parse_ok("a = b = c;"), "(assign a (assign b c));");
        assert_eq!(parse_ok("a = 1 + 2;"), "(assign a (+ 1 2));");
        assert_eq!(parse_ok("itsABoolean = !true;"), "(assign itsABoolean (! true));");
    }

    #[test]
    fn invalid_assignment_target() {
        for (source, expected) in
            [("1 = 1;", "1;"), ("(x) = 1;", "(group x);"), ("1 + 2 = 3;", "(+ 1 2);")]
        {
            let (stmts, errors) = parse_source(source);
            assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target"]);
            assert_eq!(stmts.iter().join("\n"), expected);
        }
    }

    #[test]
    fn invalid_assignment_target_does_not_synchronize() {
        let (stmts, errors) = parse_source("1 = 2; print 3;");
        assert_eq!(errors.len(), 1);
        assert_eq!(stmts.iter().join("\n"), "1;\n(print 3)");
    }

    #[test]
    fn statements() {
        assert_eq!(parse_ok("print 1;"), "(print 1)");
        assert_eq!(parse_ok("var a;"), "(var a)");
        assert_eq!(parse_ok("var a = 1;"), "(var a 1)");
        assert_eq!(parse_ok("{}"), "(block)");
        assert_eq!(parse_ok("{ var a = 1; { print a; } }"), "(block (var a 1) (block (print a)))");
        assert_eq!(parse_ok("if (a) print 1;"), "(if a (print 1))");
        assert_eq!(parse_ok("if (a) print 1; else print 2;"), "(if a (print 1) (print 2))");
        assert_eq!(
            parse_ok("if (a) if (b) print 1; else print 2;"),
            "(if a (if b (print 1) (print 2)))"
        );
    }

    #[test]
    fn missing_semicolon() {
        let (stmts, errors) = parse_source("var a = 1");
        assert_eq!(stmts, vec![]);
        assert_eq!(
            errors,
            vec!["[line 1] Error at end: Expected ';' after variable declaration"]
        );

        let (_, errors) = parse_source("print 1");
        assert_eq!(errors, vec!["[line 1] Error at end: Expected ';' after value"]);
    }

    #[test]
    fn expected_expression() {
        let (_, errors) = parse_source("variableName = var c;");
        assert_eq!(errors, vec!["[line 1] Error at 'var': Expected an expression"]);

        let (_, errors) = parse_source("variableName = { 5 };");
        assert_eq!(errors[0], "[line 1] Error at '{': Expected an expression");
    }

    #[test]
    fn if_requires_parens() {
        let (_, errors) = parse_source("if a) print 1;");
        assert_eq!(errors, vec!["[line 1] Error at 'a': Expected '(' after 'if'"]);

        let (_, errors) = parse_source("if (a print 1;");
        assert_eq!(errors, vec!["[line 1] Error at 'print': Expected ')' after condition"]);
    }

    #[test]
    fn unclosed_block() {
        let (stmts, errors) = parse_source("{ print 1;");
        assert_eq!(stmts, vec![]);
        assert_eq!(errors, vec!["[line 1] Error at end: Expected '}' after block"]);
    }

    #[test]
    fn synchronize_after_error() {
        let (stmts, errors) = parse_source("var a = 1 var b = 2;\nvar c = 3");
        assert_eq!(stmts, vec![]);
        assert_eq!(
            errors,
            vec![
                "[line 1] Error at 'var': Expected ';' after variable declaration",
                "[line 2] Error at end: Expected ';' after variable declaration",
            ]
        );
    }

    #[test]
    fn parsing_continues_after_error() {
        let (stmts, errors) = parse_source("1 +;\nprint 2;\nvar = 3;\nprint 4;");
        assert_eq!(
            errors,
            vec![
                "[line 1] Error at ';': Expected an expression",
                "[line 3] Error at '=': Expected variable name",
            ]
        );
        assert_eq!(stmts.iter().join("\n"), "(print 2)\n(print 4)");
    }

    #[test]
    fn errors_inside_blocks_only_drop_the_declaration() {
        let (stmts, errors) = parse_source("{ var = 1; print 2; }");
        assert_eq!(errors, vec!["[line 1] Error at '=': Expected variable name"]);
        assert_eq!(stmts.iter().join("\n"), "(block (print 2))");
    }

    #[test]
    fn synchronizes_on_statement_keywords() {
        let (stmts, errors) = parse_source("(1 if (true) print 1;");
        assert_eq!(errors, vec!["[line 1] Error at 'if': Expected ')' after expression"]);
        // The `if` itself is swallowed, `print` is the next statement start
        assert_eq!(stmts.iter().join("\n"), "(print 1)");

        let (stmts, errors) = parse_source("* 2\nprint 1;");
        assert_eq!(errors, vec!["[line 1] Error at '*': Expected an expression"]);
        assert_eq!(stmts.iter().join("\n"), "(print 1)");
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_ok(""), "");
        let (stmts, errors) = Parser::new(vec![]).parse();
        assert_eq!((stmts, errors), (vec![], vec![]));
    }
}
