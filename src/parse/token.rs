// Token carriers produced by lexing. Leaf nodes copy their payload out of these at
// construction and never keep the token around.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdToken {
    pub line: usize,
    pub column: usize,
    pub value: String,
}

impl IdToken {
    pub fn new<S: Into<String>>(line: usize, column: usize, value: S) -> IdToken {
        IdToken{line: line, column: column, value: value.into()}
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntLitToken {
    pub line: usize,
    pub column: usize,
    pub value: u32,
}

impl IntLitToken {
    pub fn new(line: usize, column: usize, value: u32) -> IntLitToken {
        IntLitToken{line: line, column: column, value: value}
    }
}

/// String literal as written in the source, quotes and escapes included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrLitToken {
    pub line: usize,
    pub column: usize,
    pub value: String,
}

impl StrLitToken {
    pub fn new<S: Into<String>>(line: usize, column: usize, value: S) -> StrLitToken {
        StrLitToken{line: line, column: column, value: value.into()}
    }
}
