//! Payload side of the builtin forms: `print`/`println`/`input` formatting,
//! `len`, ranges and indexing, and reading scripts for `import`.
pub mod collection;
pub mod console;
pub mod import;
