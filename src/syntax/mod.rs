//! Parsing, AST, and serialization for the Go-style sources the rewriter
//! operates on. The rewriter itself only depends on the tree in [`ast`];
//! any frontend producing the same tree works unchanged.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

pub use parser::parse_file;
pub use printer::print_file;
