pub mod ast;
pub mod builtin;
pub mod cli;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;

pub use environment::Environment;
pub use error::Error;
pub use evaluator::Interpreter;
pub use object::Value;
