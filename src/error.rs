use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Syntax error reported by the reader, at a 1-based line and column.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new<S: Into<String>>(line: usize, column: usize, message: S) -> ParseError {
        ParseError{line: line, column: column, message: message.into()}
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse error at {0}")]
    Parse(#[from] ParseError),
    #[error("output sink refused the text")]
    Fmt(#[from] fmt::Error),
    #[error("{}: unparsed text does not read back as the same tree", path.display())]
    RoundTrip { path: PathBuf },
}

impl Error {
    /// Process exit code for the command line driver.
    pub fn exit_code(&self) -> i32 {
        match *self {
            Error::Io{..} => -2,
            Error::Parse(_) | Error::RoundTrip{..} => 1,
            Error::Fmt(_) => -1,
        }
    }
}
