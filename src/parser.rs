use tracing::debug;

use crate::ast::{BinaryOp, Builtin, DataType, Expression, Program, Statement, UnaryOp};
use crate::diagnostics::Diagnostic;
use crate::lexer::Lexer;
use crate::symbol_table::SymbolTable;
use crate::token::{Token, TokenKind};

/// Recursive-descent parser with semantic hooks.
///
/// Construction tokenizes the whole source eagerly, dropping NEWLINE
/// tokens and keeping the trailing END_OF_FILE; lexical diagnostics land
/// at the front of the diagnostic list. `parse` then descends the token
/// buffer once, recording declared names in the flat symbol table and
/// checking every identifier reference against it. Nothing here throws:
/// faults become diagnostics and the descent recovers in place, so one
/// pass reports as many problems as it can.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::Newline => continue,
                TokenKind::EndOfFile => {
                    tokens.push(token);
                    break;
                }
                _ => tokens.push(token),
            }
        }
        let diagnostics = lexer.take_diagnostics();
        debug!(tokens = tokens.len(), lex_diagnostics = diagnostics.len(), "tokenized");

        Self {
            tokens,
            pos: 0,
            symbols: SymbolTable::new(),
            diagnostics,
        }
    }

    /// Runs the descent. Returns the Program root, or None when the
    /// program header itself was missing; diagnostics and the symbol
    /// table stay readable on the parser either way. Single-shot: one
    /// parser instance parses its source once.
    pub fn parse(&mut self) -> Option<Program> {
        let program = self.parse_program();
        debug!(
            diagnostics = self.diagnostics.len(),
            symbols = self.symbols.len(),
            "parse finished"
        );
        program
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The NEWLINE-free token buffer, END_OF_FILE included.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    // ---- grammar ----

    fn parse_program(&mut self) -> Option<Program> {
        if !self.match_any(&[TokenKind::Main, TokenKind::Nexus]) {
            self.parse_error_at_current("Expected 'main' or 'nexus' keyword");
            return None;
        }

        if !self.match_kind(TokenKind::LBrace) {
            self.parse_error_at_current("Expected '{' after 'main'");
            return None;
        }

        let declarations = self.parse_declarations();
        let statements = self.parse_statements();

        if !self.match_kind(TokenKind::RBrace) {
            self.parse_error_at_current("Expected '}' at end of program");
        }
        if !self.check(TokenKind::EndOfFile) {
            self.parse_error_at_current("Unexpected token after program end");
        }

        Some(Program {
            name: "main".to_string(),
            declarations,
            statements,
        })
    }

    fn parse_declarations(&mut self) -> Vec<Statement> {
        let mut declarations = Vec::new();
        while self.check(TokenKind::Var) || self.check(TokenKind::Shard) {
            if let Some(declaration) = self.parse_declaration() {
                declarations.push(declaration);
            }
        }
        declarations
    }

    fn parse_declaration(&mut self) -> Option<Statement> {
        if !self.match_any(&[TokenKind::Var, TokenKind::Shard]) {
            self.parse_error_at_current("Expected 'var' keyword");
            return None;
        }

        let data_type = if self.match_any(&[TokenKind::Int, TokenKind::Core]) {
            DataType::Int
        } else if self.match_any(&[TokenKind::Float, TokenKind::Flux]) {
            DataType::Float
        } else if self.match_any(&[TokenKind::Bool, TokenKind::Sig]) {
            DataType::Bool
        } else if self.match_any(&[TokenKind::String, TokenKind::Glyph]) {
            DataType::String
        } else {
            self.parse_error_at_current("Expected type specifier");
            return None;
        };

        let mut identifiers = Vec::new();
        let mut initializers = Vec::new();
        loop {
            if !self.check(TokenKind::Identifier) {
                self.parse_error_at_current("Expected identifier");
                return None;
            }
            let id = self.advance();
            self.declare_identifier(&id.lexeme, data_type, id.line, id.column);
            identifiers.push(id.lexeme);

            if self.match_kind(TokenKind::Assign) {
                match self.parse_expression() {
                    Some(initializer) => initializers.push(Some(initializer)),
                    None => {
                        self.parse_error_at_current("Expected expression after '='");
                        return None;
                    }
                }
            } else {
                initializers.push(None);
            }

            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        if !self.match_kind(TokenKind::Semicolon) {
            self.parse_error_at_current("Expected ';' after declaration");
        }

        Some(Statement::Declaration {
            data_type,
            identifiers,
            initializers,
        })
    }

    fn parse_statements(&mut self) -> Vec<Statement> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EndOfFile) {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
        }
        statements
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.peek().kind {
            TokenKind::Var | TokenKind::Shard => self.parse_declaration(),
            TokenKind::Identifier => self.parse_assignment(),
            TokenKind::If | TokenKind::Probe => {
                self.advance();
                self.parse_if_statement()
            }
            TokenKind::While | TokenKind::Pulse => {
                self.advance();
                self.parse_while_loop()
            }
            TokenKind::For | TokenKind::Cycle => {
                self.advance();
                self.parse_for_loop()
            }
            TokenKind::Return => {
                self.advance();
                self.parse_return_statement()
            }
            TokenKind::Input | TokenKind::Listen => {
                self.advance();
                self.parse_input_statement()
            }
            TokenKind::Output | TokenKind::Broadcast => {
                self.advance();
                self.parse_output_statement()
            }
            _ => {
                // Advance one token so a bad statement cannot stall the pass.
                self.parse_error_at_current("Unexpected token in statement");
                self.advance();
                None
            }
        }
    }

    /// Assignment rule, also used verbatim as the for-loop head: the
    /// current token is taken as the target unconditionally and its
    /// lexeme checked against the symbol table.
    fn parse_assignment(&mut self) -> Option<Statement> {
        let id = self.advance();
        self.validate_identifier(&id.lexeme, id.line, id.column);

        if !self.match_kind(TokenKind::Assign) {
            self.parse_error_at_current("Expected '=' in assignment");
            return None;
        }

        let expression = self.parse_expression();

        if !self.match_kind(TokenKind::Semicolon) {
            self.parse_error_at_current("Expected ';' after assignment");
        }

        Some(Statement::Assignment {
            identifier: id.lexeme,
            expression,
        })
    }

    fn parse_if_statement(&mut self) -> Option<Statement> {
        if !self.match_kind(TokenKind::LParen) {
            self.parse_error_at_current("Expected '(' after 'if'");
            return None;
        }

        let condition = self.parse_expression();

        if !self.match_kind(TokenKind::RParen) {
            self.parse_error_at_current("Expected ')' after condition");
            return None;
        }
        if !self.match_kind(TokenKind::LBrace) {
            self.parse_error_at_current("Expected '{' after if condition");
            return None;
        }

        let then_branch = self.parse_statements();

        if !self.match_kind(TokenKind::RBrace) {
            self.parse_error_at_current("Expected '}' after if block");
        }

        let mut else_branch = Vec::new();
        if self.match_any(&[TokenKind::Else, TokenKind::Fallback]) {
            if !self.match_kind(TokenKind::LBrace) {
                self.parse_error_at_current("Expected '{' after 'else'");
                return None;
            }
            else_branch = self.parse_statements();
            if !self.match_kind(TokenKind::RBrace) {
                self.parse_error_at_current("Expected '}' after else block");
            }
        }

        Some(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while_loop(&mut self) -> Option<Statement> {
        if !self.match_kind(TokenKind::LParen) {
            self.parse_error_at_current("Expected '(' after 'while'");
            return None;
        }

        let condition = self.parse_expression();

        if !self.match_kind(TokenKind::RParen) {
            self.parse_error_at_current("Expected ')' after condition");
            return None;
        }
        if !self.match_kind(TokenKind::LBrace) {
            self.parse_error_at_current("Expected '{' after while condition");
            return None;
        }

        let body = self.parse_statements();

        if !self.match_kind(TokenKind::RBrace) {
            self.parse_error_at_current("Expected '}' after while block");
        }

        Some(Statement::While { condition, body })
    }

    fn parse_for_loop(&mut self) -> Option<Statement> {
        if !self.match_kind(TokenKind::LParen) {
            self.parse_error_at_current("Expected '(' after 'for'");
            return None;
        }

        // The head requires a full assignment (target, '=', expression,
        // ';'); an initializer that is only a declaration is not part of
        // the language.
        let initialization = self.parse_assignment().map(Box::new);
        let condition = self.parse_expression();

        if !self.match_kind(TokenKind::Semicolon) {
            self.parse_error_at_current("Expected ';' after for condition");
        }

        let increment = self.parse_expression();

        if !self.match_kind(TokenKind::RParen) {
            self.parse_error_at_current("Expected ')' after for clauses");
            return None;
        }
        if !self.match_kind(TokenKind::LBrace) {
            self.parse_error_at_current("Expected '{' after for");
            return None;
        }

        let body = self.parse_statements();

        if !self.match_kind(TokenKind::RBrace) {
            self.parse_error_at_current("Expected '}' after for block");
        }

        Some(Statement::For {
            initialization,
            condition,
            increment,
            body,
        })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression();

        if !self.match_kind(TokenKind::Semicolon) {
            self.parse_error_at_current("Expected ';' after return");
        }

        Some(Statement::Return { expression })
    }

    fn parse_input_statement(&mut self) -> Option<Statement> {
        if !self.check(TokenKind::Identifier) {
            self.parse_error_at_current("Expected identifier after 'input'");
            return None;
        }

        let id = self.advance();
        self.validate_identifier(&id.lexeme, id.line, id.column);
        self.expect(TokenKind::Semicolon, "Expected ';' after input");

        Some(Statement::Call {
            function: Builtin::Input,
            arguments: vec![Expression::Identifier(id.lexeme)],
        })
    }

    fn parse_output_statement(&mut self) -> Option<Statement> {
        let argument = self.parse_expression();
        self.expect(TokenKind::Semicolon, "Expected ';' after output");

        Some(Statement::Call {
            function: Builtin::Output,
            arguments: argument.into_iter().collect(),
        })
    }

    // ---- expressions, lowest precedence first ----

    fn parse_expression(&mut self) -> Option<Expression> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Option<Expression> {
        let mut left = self.parse_logical_and()?;
        while self.match_any(&[TokenKind::LogicalOr, TokenKind::Or, TokenKind::Either]) {
            let Some(right) = self.parse_logical_and() else {
                return Some(left);
            };
            left = Expression::binary(BinaryOp::Or, left, right);
        }
        Some(left)
    }

    fn parse_logical_and(&mut self) -> Option<Expression> {
        let mut left = self.parse_equality()?;
        while self.match_any(&[TokenKind::LogicalAnd, TokenKind::And, TokenKind::Join]) {
            let Some(right) = self.parse_equality() else {
                return Some(left);
            };
            left = Expression::binary(BinaryOp::And, left, right);
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> Option<Expression> {
        let mut left = self.parse_comparison()?;
        while self.match_any(&[TokenKind::Equal, TokenKind::NotEqual]) {
            let op = if self.previous().kind == TokenKind::Equal {
                BinaryOp::Equal
            } else {
                BinaryOp::NotEqual
            };
            let Some(right) = self.parse_comparison() else {
                return Some(left);
            };
            left = Expression::binary(op, left, right);
        }
        Some(left)
    }

    fn parse_comparison(&mut self) -> Option<Expression> {
        let mut left = self.parse_addition()?;
        while self.match_any(&[
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ]) {
            let op = match self.previous().kind {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                _ => BinaryOp::GreaterEqual,
            };
            let Some(right) = self.parse_addition() else {
                return Some(left);
            };
            left = Expression::binary(op, left, right);
        }
        Some(left)
    }

    fn parse_addition(&mut self) -> Option<Expression> {
        let mut left = self.parse_multiplication()?;
        while self.match_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = if self.previous().kind == TokenKind::Plus {
                BinaryOp::Add
            } else {
                BinaryOp::Sub
            };
            let Some(right) = self.parse_multiplication() else {
                return Some(left);
            };
            left = Expression::binary(op, left, right);
        }
        Some(left)
    }

    fn parse_multiplication(&mut self) -> Option<Expression> {
        let mut left = self.parse_unary()?;
        while self.match_any(&[
            TokenKind::Multiply,
            TokenKind::Divide,
            TokenKind::Modulo,
            TokenKind::Power,
        ]) {
            let op = match self.previous().kind {
                TokenKind::Multiply => BinaryOp::Mul,
                TokenKind::Divide => BinaryOp::Div,
                TokenKind::Modulo => BinaryOp::Rem,
                _ => BinaryOp::Pow,
            };
            let Some(right) = self.parse_unary() else {
                return Some(left);
            };
            left = Expression::binary(op, left, right);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expression> {
        if self.match_any(&[
            TokenKind::LogicalNot,
            TokenKind::Not,
            TokenKind::Void,
            TokenKind::Minus,
        ]) {
            let op = if self.previous().kind == TokenKind::Minus {
                UnaryOp::Neg
            } else {
                UnaryOp::Not
            };
            let operand = self.parse_unary()?;
            return Some(Expression::unary(op, operand));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Expression> {
        match self.peek().kind {
            TokenKind::Number => {
                let token = self.advance();
                Some(Expression::literal(token.lexeme, DataType::Int))
            }
            TokenKind::FloatNumber => {
                let token = self.advance();
                Some(Expression::literal(token.lexeme, DataType::Float))
            }
            TokenKind::StringLiteral => {
                let token = self.advance();
                Some(Expression::literal(token.lexeme, DataType::String))
            }
            TokenKind::True => {
                self.advance();
                Some(Expression::literal("true", DataType::Bool))
            }
            TokenKind::False => {
                self.advance();
                Some(Expression::literal("false", DataType::Bool))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                self.validate_identifier(&token.lexeme, token.line, token.column);
                Some(Expression::Identifier(token.lexeme))
            }
            TokenKind::LParen => {
                self.advance();
                let expression = self.parse_expression();
                if !self.match_kind(TokenKind::RParen) {
                    self.parse_error_at_current("Expected ')' after expression");
                }
                expression
            }
            _ => {
                self.parse_error_at_current("Unexpected token in expression");
                self.advance();
                None
            }
        }
    }

    // ---- semantic hooks ----

    fn declare_identifier(&mut self, name: &str, ty: DataType, line: usize, column: usize) {
        if let Err(duplicate) = self.symbols.insert(name, ty, line, column) {
            self.diagnostics
                .push(Diagnostic::semantic(duplicate.to_string(), line, column));
        }
    }

    fn validate_identifier(&mut self, name: &str, line: usize, column: usize) {
        if !self.symbols.exists(name) {
            self.diagnostics.push(Diagnostic::semantic(
                format!("Symbol '{name}' not declared"),
                line,
                column,
            ));
        }
    }

    // ---- cursor ----

    fn peek(&self) -> &Token {
        // The buffer always ends with END_OF_FILE, so clamping the cursor
        // keeps reporting that token once the descent runs past the end.
        let index = self.pos.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_any(&mut self, kinds: &[TokenKind]) -> bool {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Records a missing-token diagnostic without moving the cursor when
    /// the expected token is absent, so parsing resumes as if it had been
    /// present.
    fn expect(&mut self, kind: TokenKind, message: &str) -> bool {
        if self.match_kind(kind) {
            true
        } else {
            self.parse_error_at_current(message);
            false
        }
    }

    fn parse_error_at_current(&mut self, message: &str) {
        let (line, column) = {
            let token = self.peek();
            (token.line, token.column)
        };
        self.diagnostics
            .push(Diagnostic::parse(message, line, column));
    }
}
