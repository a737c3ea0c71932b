use std::fmt;
use std::path::PathBuf;

use crate::lexer::TokenKind;

/// Top-level error returned by every entry point of the interpreter.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Lexical error: {0}")]
    Lexical(#[from] ScanError),
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// Process exit status for a script that failed with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Lexical(_) | Error::Syntax(_) => 65,
            // Report the failure inside an imported script by its own class.
            Error::Runtime(RuntimeError::Import { source, .. }) => source.exit_code(),
            Error::Runtime(_) => 70,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("line {line}: {kind}")]
pub struct ScanError {
    pub line: usize,
    pub kind: ScanErrorKind,
}

impl ScanError {
    pub fn new(line: usize, kind: ScanErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, PartialEq)]
pub enum ScanErrorKind {
    UnterminatedString,
    UnterminatedBlockComment,
    UnexpectedCharacter(char),
}

impl fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ScanErrorKind::*;
        match self {
            UnterminatedString => write!(f, "Unterminated string"),
            UnterminatedBlockComment => write!(f, "Unterminated block comment"),
            UnexpectedCharacter(c) => write!(f, "Unexpected character '{c}'"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken { want: String, got: TokenKind },
    NoPrefixParser(TokenKind),
    InvalidNumber(String),
    UnterminatedBlock,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ParseErrorKind::*;
        match self {
            UnexpectedToken { want, got } => write!(f, "Expected {want}, got {got}"),
            NoPrefixParser(got) => write!(f, "No prefix parse function for {got}"),
            InvalidNumber(text) => write!(f, "Invalid number literal '{text}'"),
            UnterminatedBlock => write!(f, "Unterminated block, expected '}}'"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    /// An operator, builtin or assignment applied to values it does not support.
    #[error("{0}")]
    Type(String),
    #[error("Undefined identifier '{0}'")]
    Reference(String),
    #[error("Integer division by zero")]
    DivisionByZero,
    #[error("Maximum call depth of {0} exceeded")]
    RecursionLimit(usize),
    #[error("Console I/O failed: {0}")]
    Console(#[from] std::io::Error),
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A failure inside an imported script.
    #[error("In import '{}': {source}", path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl RuntimeError {
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type(message.into())
    }
}
