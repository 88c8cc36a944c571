/*
LIL'C front-end core.

parse holds the tree (ast), the token carriers handed over by lexing, and a reader for the
concrete syntax. unparse turns a tree back into canonical source text.
*/

pub mod error;
pub mod parse;
pub mod unparse;

pub use error::{Error, ParseError};
pub use parse::ast;
pub use parse::parse_program;
pub use unparse::{render, unparse, STEP};
