use tracing::trace;

use crate::diagnostics::Diagnostic;
use crate::token::{Token, TokenKind, keyword_kind};

/// Pull-model scanner. `next_token` always yields a token (END_OF_FILE
/// once the input is exhausted, ERROR_TOKEN for characters no rule
/// matches) and never aborts; lexical faults accumulate on the lexer.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            diagnostics: Vec::new(),
        }
    }

    pub fn next_token(&mut self) -> Token {
        while self.peek_char().is_some() {
            self.skip_whitespace();

            let Some(c) = self.peek_char() else { break };
            match c {
                '%' => self.skip_comment(),
                '\n' => {
                    // The NEWLINE token reports the line it ends, not the
                    // line it starts.
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    return Token::new(TokenKind::Newline, "\n", line, column);
                }
                '"' => return self.scan_string(),
                c if c.is_ascii_digit() => return self.scan_number(),
                c if c.is_alphabetic() || c == '_' => return self.scan_identifier(),
                _ => return self.scan_operator(),
            }
        }

        Token::new(TokenKind::EndOfFile, "", self.line, self.column)
    }

    /// Lexical diagnostics recorded so far, in scan order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' || !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn scan_string(&mut self) -> Token {
        let start_column = self.column;
        self.advance(); // opening quote

        let mut value = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                break;
            }
            if c == '\\' {
                self.advance();
                if let Some(escaped) = self.peek_char() {
                    let decoded = match escaped {
                        'n' => '\n',
                        't' => '\t',
                        '\\' => '\\',
                        '"' => '"',
                        other => other,
                    };
                    value.push(decoded);
                    self.advance();
                }
            } else {
                value.push(c);
                self.advance();
            }
        }

        if self.peek_char() == Some('"') {
            self.advance(); // closing quote
        } else {
            self.diagnostics.push(Diagnostic::lex(
                "Unterminated string literal",
                self.line,
                start_column,
            ));
        }

        Token::new(TokenKind::StringLiteral, value, self.line, start_column)
    }

    fn scan_number(&mut self) -> Token {
        let (line, start_column, start) = (self.line, self.column, self.pos);
        self.consume_digits();

        // A dot only extends the literal when a digit follows; otherwise
        // it stays behind as punctuation.
        if self.peek_char() == Some('.') && self.second_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.consume_digits();
            let lexeme = &self.input[start..self.pos];
            return Token::new(TokenKind::FloatNumber, lexeme, line, start_column);
        }

        let lexeme = &self.input[start..self.pos];
        Token::new(TokenKind::Number, lexeme, line, start_column)
    }

    fn scan_identifier(&mut self) -> Token {
        let (line, start_column, start) = (self.line, self.column, self.pos);
        while let Some(c) = self.peek_char() {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            self.advance();
        }

        let lexeme = &self.input[start..self.pos];
        match keyword_kind(lexeme) {
            Some(kind) => Token::new(kind, lexeme, line, start_column),
            None => Token::new(TokenKind::Identifier, lexeme, line, start_column),
        }
    }

    // No modulo arm here: `%` always opens a comment in next_token, so
    // the Modulo kind is reserved but never scanned.
    fn scan_operator(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let Some(current) = self.advance() else {
            return Token::new(TokenKind::EndOfFile, "", line, column);
        };

        let (kind, lexeme) = match current {
            '+' => {
                if self.eat('+') {
                    (TokenKind::Increment, "++")
                } else {
                    (TokenKind::Plus, "+")
                }
            }
            '-' => {
                if self.eat('-') {
                    (TokenKind::Decrement, "--")
                } else if self.eat('>') {
                    (TokenKind::Arrow, "->")
                } else {
                    (TokenKind::Minus, "-")
                }
            }
            '*' => {
                if self.eat('*') {
                    (TokenKind::Power, "**")
                } else {
                    (TokenKind::Multiply, "*")
                }
            }
            '/' => (TokenKind::Divide, "/"),
            '=' => {
                if self.eat('=') {
                    (TokenKind::Equal, "==")
                } else {
                    (TokenKind::Assign, "=")
                }
            }
            '!' => {
                if self.eat('=') {
                    (TokenKind::NotEqual, "!=")
                } else {
                    (TokenKind::LogicalNot, "!")
                }
            }
            '<' => {
                if self.eat('=') {
                    (TokenKind::LessEqual, "<=")
                } else if self.eat('<') {
                    (TokenKind::LeftShift, "<<")
                } else {
                    (TokenKind::Less, "<")
                }
            }
            '>' => {
                if self.eat('=') {
                    (TokenKind::GreaterEqual, ">=")
                } else if self.eat('>') {
                    (TokenKind::RightShift, ">>")
                } else {
                    (TokenKind::Greater, ">")
                }
            }
            '&' => {
                if self.eat('&') {
                    (TokenKind::LogicalAnd, "&&")
                } else {
                    (TokenKind::BitwiseAnd, "&")
                }
            }
            '|' => {
                if self.eat('|') {
                    (TokenKind::LogicalOr, "||")
                } else {
                    (TokenKind::BitwiseOr, "|")
                }
            }
            '^' => (TokenKind::BitwiseXor, "^"),
            '(' => (TokenKind::LParen, "("),
            ')' => (TokenKind::RParen, ")"),
            '{' => (TokenKind::LBrace, "{"),
            '}' => (TokenKind::RBrace, "}"),
            '[' => (TokenKind::LBracket, "["),
            ']' => (TokenKind::RBracket, "]"),
            ';' => (TokenKind::Semicolon, ";"),
            ',' => (TokenKind::Comma, ","),
            '.' => (TokenKind::Dot, "."),
            ':' => (TokenKind::Colon, ":"),
            '?' => (TokenKind::Question, "?"),
            other => {
                trace!(character = ?other, line, column, "illegal character");
                self.diagnostics.push(Diagnostic::lex(
                    format!("Illegal character '{other}'"),
                    line,
                    column,
                ));
                return Token::new(TokenKind::ErrorToken, other.to_string(), line, column);
            }
        };

        Token::new(kind, lexeme, line, column)
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_ascii_digit() {
                break;
            }
            self.advance();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn second_char(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}
