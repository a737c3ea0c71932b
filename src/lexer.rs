use std::fmt;

use phf::phf_map;

use crate::error::{ScanError, ScanErrorKind};

#[rustfmt::skip]
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum TokenKind {
    // Literals
    Identifier,
    String,
    Integer,
    Float,

    // Keywords
    Fn, Print, Println, Return, True, False, If, Else,
    For, Swap, Input, Len, Import, Or, And,

    // Operators
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Bang,         // !
    Assign,       // =
    Equal,        // ==
    NotEqual,     // !=
    Greater,      // >
    GreaterEqual, // >=
    Less,         // <
    LessEqual,    // <=
    DotDot,       // ..

    // Delimiters
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Colon,        // :
    Semicolon,    // ;

    Eof,
}

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "fn" => TokenKind::Fn,
    "print" => TokenKind::Print,
    "println" => TokenKind::Println,
    "return" => TokenKind::Return,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "for" => TokenKind::For,
    "swap" => TokenKind::Swap,
    "input" => TokenKind::Input,
    "len" => TokenKind::Len,
    "import" => TokenKind::Import,
    "or" => TokenKind::Or,
    "and" => TokenKind::And,
};

#[derive(PartialEq, Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Single-pass scanner. Tokens are produced on demand by [`Lexer::advance`];
/// once the input is exhausted every further call yields `Eof`.
#[derive(Debug)]
pub struct Lexer {
    input: Vec<char>,
    cur: usize,
    line: usize,
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl Lexer {
    pub fn new(input: &str) -> Lexer {
        Lexer {
            input: input.chars().collect(),
            cur: 0,
            line: 1,
        }
    }

    fn ch(&self) -> Option<char> {
        self.input.get(self.cur).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.cur + 1).copied()
    }

    fn read(&mut self) {
        if self.ch() == Some('\n') {
            self.line += 1;
        }
        if self.cur < self.input.len() {
            self.cur += 1;
        }
    }

    fn text(&self, start: usize) -> String {
        self.input[start..self.cur].iter().collect()
    }

    /// Skips whitespace, `// line` and `/* block */` comments.
    fn skip_trivia(&mut self) -> Result<(), ScanError> {
        while let Some(c) = self.ch() {
            match (c, self.peek()) {
                (c, _) if c.is_whitespace() => self.read(),
                ('/', Some('/')) => {
                    while !matches!(self.ch(), Some('\n') | None) {
                        self.read();
                    }
                }
                ('/', Some('*')) => {
                    let line = self.line;
                    self.read();
                    self.read();
                    loop {
                        match (self.ch(), self.peek()) {
                            (Some('*'), Some('/')) => {
                                self.read();
                                self.read();
                                break;
                            }
                            (Some(_), _) => self.read(),
                            (None, _) => {
                                return Err(ScanError::new(
                                    line,
                                    ScanErrorKind::UnterminatedBlockComment,
                                ))
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn read_string(&mut self) -> Result<Token, ScanError> {
        let line = self.line;
        // Consume the opening double quote.
        self.read();
        let mut result = String::new();

        loop {
            match self.ch() {
                None => return Err(ScanError::new(line, ScanErrorKind::UnterminatedString)),
                Some('"') => break,
                Some('\\') => {
                    let escaped = match self.peek() {
                        Some('"') => Some('"'),
                        Some('n') => Some('\n'),
                        Some('t') => Some('\t'),
                        Some('r') => Some('\r'),
                        Some('\\') => Some('\\'),
                        _ => None,
                    };
                    match escaped {
                        Some(c) => {
                            result.push(c);
                            self.read();
                        }
                        None => result.push('\\'),
                    }
                }
                Some(c) => result.push(c),
            }
            self.read();
        }

        // Consume the closing double quote.
        self.read();
        Ok(Token::new(TokenKind::String, result, line))
    }

    fn read_number(&mut self) -> Token {
        let start = self.cur;
        let mut kind = TokenKind::Integer;
        while let Some(c) = self.ch() {
            if c.is_ascii_digit() {
                self.read();
            } else if c == '.' && kind == TokenKind::Integer && self.peek() != Some('.') {
                // `1..10` leaves the dots for the range operator.
                kind = TokenKind::Float;
                self.read();
            } else {
                break;
            }
        }
        Token::new(kind, self.text(start), self.line)
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.cur;
        while self.ch().is_some_and(is_identifier_char) {
            self.read();
        }
        let literal = self.text(start);
        let kind = KEYWORDS
            .get(literal.as_str())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        Token::new(kind, literal, self.line)
    }

    pub fn advance(&mut self) -> Result<Token, ScanError> {
        self.skip_trivia()?;
        let line = self.line;
        let start = self.cur;

        let ch = match self.ch() {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Eof, "", line)),
        };

        let kind = match ch {
            '"' => return self.read_string(),
            c if c.is_ascii_digit() => return Ok(self.read_number()),
            c if is_identifier_start(c) => return Ok(self.read_identifier()),
            '=' => self.pick_pair('=', TokenKind::Equal, TokenKind::Assign),
            '!' => self.pick_pair('=', TokenKind::NotEqual, TokenKind::Bang),
            '>' => self.pick_pair('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '<' => self.pick_pair('=', TokenKind::LessEqual, TokenKind::Less),
            '.' if self.peek() == Some('.') => {
                self.read();
                TokenKind::DotDot
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            c => return Err(ScanError::new(line, ScanErrorKind::UnexpectedCharacter(c))),
        };

        self.read();
        Ok(Token::new(kind, self.text(start), line))
    }

    /// Consumes `second` if it follows, choosing between a two-character
    /// operator and its one-character prefix.
    fn pick_pair(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek() == Some(second) {
            self.read();
            double
        } else {
            single
        }
    }
}

/// Scans a whole source text, including the trailing `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ScanError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.advance()?;
        let done = token.is(TokenKind::Eof);
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let symbol = match self {
            Identifier => "identifier",
            String => "string",
            Integer => "integer",
            Float => "float",
            Fn => "'fn'",
            Print => "'print'",
            Println => "'println'",
            Return => "'return'",
            True => "'true'",
            False => "'false'",
            If => "'if'",
            Else => "'else'",
            For => "'for'",
            Swap => "'swap'",
            Input => "'input'",
            Len => "'len'",
            Import => "'import'",
            Or => "'or'",
            And => "'and'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Bang => "'!'",
            Assign => "'='",
            Equal => "'=='",
            NotEqual => "'!='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            Less => "'<'",
            LessEqual => "'<='",
            DotDot => "'..'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            LeftBracket => "'['",
            RightBracket => "']'",
            Comma => "','",
            Colon => "':'",
            Semicolon => "';'",
            Eof => "end of input",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "\"{}\"", self.text),
            TokenKind::Eof => write!(f, "{}", self.kind),
            _ => write!(f, "{}", self.text),
        }
    }
}
