use crate::parse::ast;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_until};
use nom::character::complete::{char, multispace1};
use nom::combinator::{not, value, verify};
use nom::error::{ErrorKind, ParseError, VerboseError, VerboseErrorKind};
use nom::multi::many0;
use nom::sequence::{delimited, preceded, terminated};
use nom::IResult;
use once_cell::sync::Lazy;
use regex::Regex;

pub type PResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

pub const KEYWORDS: [&str; 12] = [
    "int", "bool", "void", "struct", "true", "false", "read", "write", "if", "else", "while", "return",
];

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").expect("identifier pattern"));
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+").expect("integer pattern"));
static STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"(?:[^"\\\n]|\\[^\n])*""#).expect("string pattern"));

fn block_comment(i: &str) -> PResult<&str> {
    delimited(tag("/*"), take_until("*/"), tag("*/"))(i)
}

fn line_comment(i: &str) -> PResult<&str> {
    preceded(tag("//"), take_till(|c: char| c == '\n'))(i)
}

/// Whitespace and comments. Never fails.
pub fn space(i: &str) -> PResult<()> {
    value((), many0(alt((multispace1, line_comment, block_comment))))(i)
}

/// Skips leading whitespace and comments before `inner`.
pub fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    preceded(space, inner)
}

// Anchored patterns only: the match always starts at the head of the input.
fn re_find<'a>(re: &'static Regex) -> impl Fn(&'a str) -> PResult<'a, &'a str> {
    move |i: &'a str| match re.find(i) {
        Some(m) => Ok((&i[m.end()..], &i[..m.end()])),
        None => Err(nom::Err::Error(VerboseError::from_error_kind(i, ErrorKind::RegexpFind))),
    }
}

fn failure<'a, O>(at: &'a str, message: &'static str) -> PResult<'a, O> {
    Err(nom::Err::Failure(VerboseError{errors: vec![(at, VerboseErrorKind::Context(message))]}))
}

// Keywords
pub fn keyword<'a>(kwd: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    ws(verify(re_find(&IDENTIFIER), move |s: &str| s == kwd))
}

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

// Identifiers
pub fn ident_text(i: &str) -> PResult<&str> {
    verify(re_find(&IDENTIFIER), |s: &str| !is_keyword(s))(i)
}

pub fn int_text(i: &str) -> PResult<&str> {
    re_find(&INTEGER)(i)
}

/// Raw string literal, quotes included.
pub fn str_text(i: &str) -> PResult<&str> {
    if !i.starts_with('"') {
        return Err(nom::Err::Error(VerboseError::from_char(i, '"')));
    }
    let raw = match STRING.find(i) {
        Some(m) => &i[..m.end()],
        None => return failure(i, "unterminated string literal"),
    };
    let mut chars = raw.char_indices();
    while let Some((_, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, 'n')) | Some((_, 't')) | Some((_, '\'')) | Some((_, '"')) | Some((_, '\\')) => {}
                Some((at, _)) => return failure(&i[at - 1..], "bad escape in string literal"),
                None => return failure(i, "unterminated string literal"),
            }
        }
    }
    Ok((&i[raw.len()..], raw))
}

/// Punctuation, after whitespace.
pub fn symbol<'a>(sym: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    ws(tag(sym))
}

/// `=` but not `==`.
pub fn assign_symbol(i: &str) -> PResult<&str> {
    ws(terminated(tag("="), not(char('='))))(i)
}

pub fn unary_op(i: &str) -> PResult<ast::UnaryOp> {
    ws(alt((
        value(ast::UnaryOp::Not, terminated(tag("!"), not(char('=')))),
        value(ast::UnaryOp::Minus, tag("-")),
    )))(i)
}

pub fn binary_op_mul(i: &str) -> PResult<ast::BinaryOp> {
    ws(alt((
        value(ast::BinaryOp::Times, tag("*")),
        value(ast::BinaryOp::Divide, tag("/")),
    )))(i)
}

pub fn binary_op_arith(i: &str) -> PResult<ast::BinaryOp> {
    ws(alt((
        value(ast::BinaryOp::Plus, tag("+")),
        value(ast::BinaryOp::Minus, tag("-")),
    )))(i)
}

pub fn binary_op_compare(i: &str) -> PResult<ast::BinaryOp> {
    ws(alt((
        value(ast::BinaryOp::Equals, tag("==")),
        value(ast::BinaryOp::NotEquals, tag("!=")),
        value(ast::BinaryOp::LessEq, tag("<=")),
        value(ast::BinaryOp::GreaterEq, tag(">=")),
        value(ast::BinaryOp::Less, tag("<")),
        value(ast::BinaryOp::Greater, tag(">")),
    )))(i)
}

pub fn binary_op_and(i: &str) -> PResult<ast::BinaryOp> {
    value(ast::BinaryOp::And, symbol("&&"))(i)
}

pub fn binary_op_or(i: &str) -> PResult<ast::BinaryOp> {
    value(ast::BinaryOp::Or, symbol("||"))(i)
}
