use cursor::{Cursor, Line};
use errors::Reporter;

pub mod token;
pub use token::{keyword, Literal, Token, TokenData, TokenType};
use TokenData::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanErrorType {
    #[error("Unexpected character '{0}'.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct ScanError {
    pub error: ScanErrorType,
    pub line: Line,
}

pub struct Scanner<'a> {
    start: Cursor<'a>,
    current: Cursor<'a>,
    tokens: Vec<Token<'a>>,
    errors: Vec<ScanError>,
}

/// Scans `source`, sending every lexical error to `reporter`.
///
/// The returned tokens always end with exactly one [`TokenData::Eof`], even if errors occurred.
pub fn scan<'a>(source: &'a str, reporter: &mut dyn Reporter) -> Vec<Token<'a>> {
    let (tokens, errors) = Scanner::new(source).scan_tokens();
    for e in errors {
        reporter.lexical_error(e.line, &e.error.to_string());
    }
    tokens
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            start: Cursor::new(source),
            current: Cursor::new(source),
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn scan_tokens(mut self) -> (Vec<Token<'a>>, Vec<ScanError>) {
        loop {
            self.start = self.current.clone();
            let Some(c) = self.current.next() else {
                break;
            };
            self.scan_token(c);
        }

        self.add_token(Eof);
        (self.tokens, self.errors)
    }

    fn scan_token(&mut self, c: char) {
        match c {
            '(' => self.add_token(LeftParen),
            ')' => self.add_token(RightParen),
            '{' => self.add_token(LeftBrace),
            '}' => self.add_token(RightBrace),
            ',' => self.add_token(Comma),
            '.' => self.add_token(Dot),
            '-' => self.add_token(Minus),
            '+' => self.add_token(Plus),
            ';' => self.add_token(Semicolon),
            '*' => self.add_token(Star),

            '!' => self.add_token_if_matches('=', BangEqual, Bang),
            '=' => self.add_token_if_matches('=', EqualEqual, Equal),
            '<' => self.add_token_if_matches('=', LessEqual, Less),
            '>' => self.add_token_if_matches('=', GreaterEqual, Greater),

            '/' => {
                if self.current.advance_if('/') {
                    // Stop in front of the newline so the line counter still sees it
                    self.current.advance_while(|c| c != '\n');
                } else {
                    self.add_token(Slash)
                }
            }

            '"' => self.string(),

            d if d.is_ascii_digit() => self.number(),

            a if is_alpha(a) => self.identifier(),

            ' ' | '\r' | '\t' | '\n' => (),

            c => self.error(ScanErrorType::UnexpectedCharacter(c), self.start.line()),
        }
    }

    fn lexeme(&self) -> &'a str {
        self.start.slice_until(&self.current)
    }

    fn add_token(&mut self, data: TokenData<'a>) {
        let token = Token::new(data, self.lexeme(), self.start.line());
        log::trace!("Scanned {:?}", token);
        self.tokens.push(token);
    }

    fn add_token_if_matches(
        &mut self,
        expected: char,
        matched: TokenData<'a>,
        otherwise: TokenData<'a>,
    ) {
        if self.current.advance_if(expected) {
            self.add_token(matched)
        } else {
            self.add_token(otherwise)
        }
    }

    fn error(&mut self, error: ScanErrorType, line: Line) {
        log::debug!("Scan error on line {line}: {error}");
        self.errors.push(ScanError { error, line });
    }

    fn string(&mut self) {
        self.current.advance_while(|c| c != '"');

        if !self.current.advance_if('"') {
            self.error(ScanErrorType::UnterminatedString, self.current.line());
            return;
        }

        let lexeme = self.lexeme();
        self.add_token(Str(&lexeme[1..lexeme.len() - 1]));
    }

    fn number(&mut self) {
        self.current.advance_while(|c| c.is_ascii_digit());

        if self.current.peek() == Some('.')
            && self.current.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.current.next();
            self.current.advance_while(|c| c.is_ascii_digit());
        }

        match self.lexeme().parse() {
            Ok(n) => self.add_token(Number(n)),
            Err(_) => unreachable!("Digit runs always parse as f64"),
        }
    }

    fn identifier(&mut self) {
        self.current.advance_while(|c| is_alpha(c) || c.is_ascii_digit());
        self.add_token(keyword(self.lexeme()).unwrap_or(Identifier));
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
