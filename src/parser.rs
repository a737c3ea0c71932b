use std::rc::Rc;

use crate::ast::*;
use crate::error::{Error, ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};

#[derive(Debug, PartialEq, Clone, Copy, PartialOrd)]
pub enum Precedence {
    Lowest,
    Assign,      // =
    Logical,     // and or
    Equals,      // == !=
    LessGreater, // < > <= >=
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x !x
    Call,        // f(x)
    Index,       // xs[i]
    Range,       // a..b
}

fn token_to_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Assign => Precedence::Assign,
        TokenKind::Or | TokenKind::And => Precedence::Logical,
        TokenKind::Equal | TokenKind::NotEqual => Precedence::Equals,
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
            Precedence::LessGreater
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash => Precedence::Product,
        TokenKind::LeftParen => Precedence::Call,
        TokenKind::LeftBracket => Precedence::Index,
        TokenKind::DotDot => Precedence::Range,
        _ => Precedence::Lowest,
    }
}

type ParseResult<T> = Result<T, Error>;

/// Pratt parser over a pull-based [`Lexer`].
///
/// The parser is an iterator of top-level statements: each call to `next`
/// reads only as many tokens as the statement needs plus one token of
/// lookahead, so a caller evaluating statement by statement observes lexical
/// and syntax errors at the point they occur. After the first error the
/// iterator is exhausted.
pub struct Parser {
    lexer: Lexer,
    curr: Token,
    peek: Token,
    primed: bool,
    finished: bool,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Parser {
            lexer,
            curr: Token::new(TokenKind::Eof, "", 1),
            peek: Token::new(TokenKind::Eof, "", 1),
            primed: false,
            finished: false,
        }
    }

    pub fn parse_program(&mut self) -> ParseResult<Program> {
        self.collect()
    }

    fn next_token(&mut self) -> ParseResult<()> {
        let next = self.lexer.advance()?;
        self.curr = std::mem::replace(&mut self.peek, next);
        Ok(())
    }

    fn next_statement(&mut self) -> ParseResult<Option<Node>> {
        if self.primed {
            // Step past the last token of the previous statement.
            self.next_token()?;
        } else {
            self.next_token()?;
            self.next_token()?;
            self.primed = true;
        }
        while self.curr_token_is(TokenKind::Semicolon) {
            self.next_token()?;
        }
        if self.curr_token_is(TokenKind::Eof) {
            return Ok(None);
        }
        self.parse_expression(Precedence::Lowest).map(Some)
    }

    fn curr_token_is(&self, kind: TokenKind) -> bool {
        self.curr.is(kind)
    }

    fn peek_token_is(&self, kind: TokenKind) -> bool {
        self.peek.is(kind)
    }

    fn error(&self, token: &Token, kind: ParseErrorKind) -> Error {
        ParseError::new(token.line, kind).into()
    }

    fn peek_error(&self, want: impl ToString) -> Error {
        self.error(
            &self.peek,
            ParseErrorKind::UnexpectedToken {
                want: want.to_string(),
                got: self.peek.kind,
            },
        )
    }

    fn expect_peek(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.peek_token_is(kind) {
            self.next_token()
        } else {
            Err(self.peek_error(kind))
        }
    }

    fn expect_peek_identifier(&mut self) -> ParseResult<String> {
        self.expect_peek(TokenKind::Identifier)?;
        Ok(self.curr.text.clone())
    }

    fn peek_precedence(&self) -> Precedence {
        token_to_precedence(self.peek.kind)
    }

    fn curr_precedence(&self) -> Precedence {
        token_to_precedence(self.curr.kind)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Node> {
        let mut left = self.parse_prefix()?;

        while precedence < self.peek_precedence() {
            self.next_token()?;
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Node> {
        match self.curr.kind {
            TokenKind::Identifier => Ok(Node::Identifier(self.curr.text.clone())),
            TokenKind::String => Ok(Node::String(self.curr.text.clone())),
            TokenKind::Integer => match self.curr.text.parse::<i64>() {
                Ok(value) => Ok(Node::Integer(value)),
                Err(_) => Err(self.invalid_number()),
            },
            TokenKind::Float => match self.curr.text.parse::<f64>() {
                Ok(value) => Ok(Node::Float(value)),
                Err(_) => Err(self.invalid_number()),
            },
            TokenKind::True => Ok(Node::Boolean(true)),
            TokenKind::False => Ok(Node::Boolean(false)),
            TokenKind::Minus | TokenKind::Bang => self.parse_prefix_expression(),
            TokenKind::LeftParen => {
                self.next_token()?;
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::LeftBracket => Ok(Node::Array(self.parse_list(TokenKind::RightBracket)?)),
            TokenKind::LeftBrace => self.parse_map_literal(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::For => self.parse_for_expression(),
            TokenKind::Fn => self.parse_function_literal(),
            TokenKind::Return => {
                self.next_token()?;
                let value = self.parse_expression(Precedence::Lowest)?;
                Ok(Node::Return(Box::new(value)))
            }
            TokenKind::Print | TokenKind::Println => {
                let newline = self.curr_token_is(TokenKind::Println);
                self.expect_peek(TokenKind::LeftParen)?;
                let arguments = self.parse_list(TokenKind::RightParen)?;
                Ok(Node::Print { arguments, newline })
            }
            TokenKind::Swap => {
                self.expect_peek(TokenKind::LeftParen)?;
                self.next_token()?;
                let left = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::Comma)?;
                self.next_token()?;
                let right = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RightParen)?;
                Ok(Node::Swap(Box::new(left), Box::new(right)))
            }
            TokenKind::Input => Ok(Node::Input(Box::new(self.parse_single_argument()?))),
            TokenKind::Len => Ok(Node::Len(Box::new(self.parse_single_argument()?))),
            TokenKind::Import => Ok(Node::Import(Box::new(self.parse_single_argument()?))),
            kind => Err(self.error(&self.curr, ParseErrorKind::NoPrefixParser(kind))),
        }
    }

    fn parse_infix(&mut self, left: Node) -> ParseResult<Node> {
        match self.curr.kind {
            TokenKind::LeftParen => Ok(Node::Call {
                function: Box::new(left),
                arguments: self.parse_list(TokenKind::RightParen)?,
            }),
            TokenKind::LeftBracket => {
                self.next_token()?;
                let index = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenKind::RightBracket)?;
                Ok(Node::Index {
                    subject: Box::new(left),
                    index: Box::new(index),
                })
            }
            TokenKind::DotDot => self.parse_range(left),
            TokenKind::Assign => {
                self.next_token()?;
                let value = self.parse_expression(Precedence::Lowest)?;
                Ok(Node::Assign {
                    target: Box::new(left),
                    value: Box::new(value),
                })
            }
            _ => self.parse_infix_expression(left),
        }
    }

    fn invalid_number(&self) -> Error {
        self.error(
            &self.curr,
            ParseErrorKind::InvalidNumber(self.curr.text.clone()),
        )
    }

    fn parse_prefix_expression(&mut self) -> ParseResult<Node> {
        let prefix = match self.curr.kind {
            TokenKind::Bang => Prefix::Bang,
            _ => Prefix::Minus,
        };

        self.next_token()?;
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Node::Prefix(prefix, Box::new(right)))
    }

    fn parse_infix_expression(&mut self, left: Node) -> ParseResult<Node> {
        let infix = match self.curr.kind {
            TokenKind::Plus => Infix::Plus,
            TokenKind::Minus => Infix::Minus,
            TokenKind::Star => Infix::Product,
            TokenKind::Slash => Infix::ForwardSlash,
            TokenKind::Equal => Infix::Equal,
            TokenKind::NotEqual => Infix::DoesNotEqual,
            TokenKind::Less => Infix::LessThan,
            TokenKind::Greater => Infix::GreaterThan,
            TokenKind::LessEqual => Infix::LTOrEqual,
            TokenKind::GreaterEqual => Infix::GTOrEqual,
            TokenKind::And => Infix::And,
            TokenKind::Or => Infix::Or,
            kind => return Err(self.error(&self.curr, ParseErrorKind::NoPrefixParser(kind))),
        };

        let precedence = self.curr_precedence();
        self.next_token()?;
        let right = self.parse_expression(precedence)?;
        Ok(Node::Infix(infix, Box::new(left), Box::new(right)))
    }

    /// `from..to` or `from..to:step`; the upper bound extends as far as a
    /// full expression does.
    fn parse_range(&mut self, from: Node) -> ParseResult<Node> {
        self.next_token()?;
        let to = self.parse_expression(Precedence::Lowest)?;
        let step = if self.peek_token_is(TokenKind::Colon) {
            self.next_token()?;
            self.next_token()?;
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        } else {
            None
        };
        Ok(Node::Range {
            from: Box::new(from),
            to: Box::new(to),
            step,
        })
    }

    /// Comma-separated expressions up to `end`. Expects `curr` on the opening
    /// delimiter and leaves it on `end`.
    fn parse_list(&mut self, end: TokenKind) -> ParseResult<Vec<Node>> {
        let mut items = vec![];

        if self.peek_token_is(end) {
            self.next_token()?;
            return Ok(items);
        }

        self.next_token()?;
        items.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token_is(TokenKind::Comma) {
            self.next_token()?;
            self.next_token()?;
            items.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(end)?;
        Ok(items)
    }

    /// The single parenthesized argument of `input`, `len` and `import`.
    fn parse_single_argument(&mut self) -> ParseResult<Node> {
        self.expect_peek(TokenKind::LeftParen)?;
        self.next_token()?;
        let argument = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RightParen)?;
        Ok(argument)
    }

    fn parse_map_literal(&mut self) -> ParseResult<Node> {
        let mut pairs = Vec::new();

        if self.peek_token_is(TokenKind::RightBrace) {
            self.next_token()?;
            return Ok(Node::Map(pairs));
        }

        loop {
            self.next_token()?;
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Colon)?;
            self.next_token()?;
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.peek_token_is(TokenKind::Comma) {
                self.next_token()?;
            } else {
                break;
            }
        }

        self.expect_peek(TokenKind::RightBrace)?;
        Ok(Node::Map(pairs))
    }

    /// Statements up to the matching `}`. Expects `curr` on `{` and leaves it
    /// on `}`.
    fn parse_block_statement(&mut self) -> ParseResult<Program> {
        let mut statements = vec![];
        self.next_token()?;

        while !self.curr_token_is(TokenKind::RightBrace) {
            if self.curr_token_is(TokenKind::Eof) {
                return Err(self.error(&self.curr, ParseErrorKind::UnterminatedBlock));
            }
            if !self.curr_token_is(TokenKind::Semicolon) {
                statements.push(self.parse_expression(Precedence::Lowest)?);
            }
            self.next_token()?;
        }

        Ok(statements)
    }

    fn parse_if_expression(&mut self) -> ParseResult<Node> {
        self.next_token()?;
        let condition = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let consequence = self.parse_block_statement()?;

        let mut alternative = None;
        if self.peek_token_is(TokenKind::Else) {
            self.next_token()?;
            if self.peek_token_is(TokenKind::If) {
                self.next_token()?;
                alternative = Some(vec![self.parse_if_expression()?]);
            } else {
                self.expect_peek(TokenKind::LeftBrace)?;
                alternative = Some(self.parse_block_statement()?);
            }
        }

        Ok(Node::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    /// `for k[, v] in target { body }`. The repeated `for` keyword of older
    /// scripts (`for k for target`) is accepted in place of `in`.
    fn parse_for_expression(&mut self) -> ParseResult<Node> {
        let key = self.expect_peek_identifier()?;
        let value = if self.peek_token_is(TokenKind::Comma) {
            self.next_token()?;
            Some(self.expect_peek_identifier()?)
        } else {
            None
        };

        let separator = self.peek_token_is(TokenKind::For)
            || (self.peek_token_is(TokenKind::Identifier) && self.peek.text == "in");
        if !separator {
            return Err(self.peek_error("'in'"));
        }
        self.next_token()?;

        self.next_token()?;
        let target = self.parse_expression(Precedence::Lowest)?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Node::For {
            key,
            value,
            target: Box::new(target),
            body,
        })
    }

    fn parse_function_literal(&mut self) -> ParseResult<Node> {
        let name = if self.peek_token_is(TokenKind::Identifier) {
            self.next_token()?;
            Some(self.curr.text.clone())
        } else {
            None
        };

        self.expect_peek(TokenKind::LeftParen)?;
        let parameters = self.parse_fn_parameters()?;

        self.expect_peek(TokenKind::LeftBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Node::Function(Rc::new(FunctionLiteral {
            name,
            parameters,
            body,
        })))
    }

    fn parse_fn_parameters(&mut self) -> ParseResult<Vec<String>> {
        let mut parameters = vec![];

        if self.peek_token_is(TokenKind::RightParen) {
            self.next_token()?;
            return Ok(parameters);
        }

        parameters.push(self.expect_peek_identifier()?);
        while self.peek_token_is(TokenKind::Comma) {
            self.next_token()?;
            parameters.push(self.expect_peek_identifier()?);
        }

        self.expect_peek(TokenKind::RightParen)?;
        Ok(parameters)
    }
}

impl Iterator for Parser {
    type Item = ParseResult<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_statement() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
