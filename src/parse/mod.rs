pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use self::parser::{parse_program, Parser};
