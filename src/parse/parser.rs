use crate::error::ParseError;
use crate::parse::ast;
use crate::parse::ast::{AssignExp, Body, CallExp, Decl, Exp, FnDecl, FormalDecl, Program, Stmt, StructDecl, Type, VarDecl};
use crate::parse::lexer::*;
use crate::parse::token::{IdToken, IntLitToken, StrLitToken};
use nom::branch::alt;
use nom::combinator::{cut, map, opt, value};
use nom::error::{context, VerboseError, VerboseErrorKind};
use nom::multi::{many0, separated_list0};
use nom::sequence::delimited;
use std::cell::Cell;
use tracing::{debug, trace, warn};

/// Reads a whole compilation unit.
pub fn parse_program(src: &str) -> Result<Program, ParseError> {
    Parser::new(src).program()
}

/// How deep the reader lets expressions and blocks nest.
pub const MAX_DEPTH: usize = 100;

/*
Scannerless recursive descent over the source text. Every rule is a method so that tokens can be
stamped with their line and column: all the slices handed around are suffixes of `src`, which
turns a remaining input into an offset.

The descent uses the call stack, so nested rules count their depth and give up with a parse
error past MAX_DEPTH.
*/
pub struct Parser<'s> {
    src: &'s str,
    line_starts: Vec<usize>,
    depth: Cell<usize>,
}

impl<'s> Parser<'s> {
    pub fn new(src: &'s str) -> Parser<'s> {
        let mut line_starts = vec![0];
        line_starts.extend(src.match_indices('\n').map(|(at, _)| at + 1));
        Parser{src: src, line_starts: line_starts, depth: Cell::new(0)}
    }

    /// 1-based line and column of the head of `rest`.
    pub fn position(&self, rest: &str) -> (usize, usize) {
        let offset = self.src.len() - rest.len();
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line - 1];
        (line, self.src[start..offset].chars().count() + 1)
    }

    pub fn program(&self) -> Result<Program, ParseError> {
        let mut decls = Vec::new();
        let mut i = self.src;
        loop {
            let (rest, ()) = space(i).map_err(|e| self.error(e))?;
            if rest.is_empty() {
                break;
            }
            let (rest, decl) = self.decl(rest).map_err(|e| self.error(e))?;
            trace!(kind = ?ast::Node::Decl(&decl).kind(), "declaration");
            decls.push(decl);
            i = rest;
        }
        debug!(decls = decls.len(), "parsed program");
        Ok(Program::new(decls.into()))
    }

    // Runs `rule` one nesting level deeper.
    fn nested<O, F>(&self, i: &'s str, message: &'static str, rule: F) -> PResult<'s, O>
    where
        F: FnOnce(&'s str) -> PResult<'s, O>,
    {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            let (at, ()) = space(i)?;
            warn!(limit = MAX_DEPTH, "{}", message);
            return Err(nom::Err::Failure(VerboseError{errors: vec![(at, VerboseErrorKind::Context(message))]}));
        }
        self.depth.set(depth + 1);
        let res = rule(i);
        self.depth.set(depth);
        res
    }

    fn error(&self, err: nom::Err<VerboseError<&'s str>>) -> ParseError {
        match err {
            nom::Err::Incomplete(_) => {
                let (line, column) = self.position("");
                ParseError::new(line, column, "unexpected end of input")
            }
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let at = e.errors.first().map(|&(at, _)| at).unwrap_or(self.src);
                let (at, ()) = space(at).unwrap_or((at, ()));
                let (line, column) = self.position(at);
                let message = e.errors.iter().find_map(|(_, kind)| match kind {
                    VerboseErrorKind::Context(c) => Some(*c),
                    _ => None,
                });
                match message {
                    Some(m) => ParseError::new(line, column, m),
                    None if at.is_empty() => ParseError::new(line, column, "unexpected end of input"),
                    None => ParseError::new(line, column, "syntax error"),
                }
            }
        }
    }

    // Declarations

    pub fn decl(&self, i: &'s str) -> PResult<'s, Decl> {
        context(
            "expected declaration",
            alt((
                map(|i| self.struct_decl(i), Decl::Struct),
                map(|i| self.var_decl(i), Decl::Var),
                map(|i| self.fn_decl(i), Decl::Fn),
            )),
        )(i)
    }

    fn struct_decl(&self, i: &'s str) -> PResult<'s, StructDecl> {
        let (i, _) = keyword("struct")(i)?;
        let (i, id) = self.id(i)?;
        let (i, _) = symbol("{")(i)?;
        let (i, fields) = self.nested(i, "declarations nested too deeply", many0(|i| self.decl(i)))?;
        let (i, _) = context("expected '}'", cut(symbol("}")))(i)?;
        let (i, _) = context("expected ';'", cut(symbol(";")))(i)?;
        Ok((i, StructDecl::new(id, fields.into())))
    }

    fn var_decl(&self, i: &'s str) -> PResult<'s, VarDecl> {
        let (i, typ) = self.typ(i)?;
        let (i, id) = self.id(i)?;
        let (i, _) = symbol(";")(i)?;
        let size = match typ {
            Type::Struct(_) => 0,
            _ => VarDecl::NOT_STRUCT,
        };
        Ok((i, VarDecl::new(typ, id, size)))
    }

    fn fn_decl(&self, i: &'s str) -> PResult<'s, FnDecl> {
        let (i, ret) = self.typ(i)?;
        let (i, id) = self.id(i)?;
        let (i, _) = context("expected ';' or '('", symbol("("))(i)?;
        let (i, formals) = cut(separated_list0(symbol(","), |i| self.formal(i)))(i)?;
        let (i, _) = context("expected ')'", cut(symbol(")")))(i)?;
        let (i, body) = cut(|i| self.body(i))(i)?;
        Ok((i, FnDecl::new(ret, id, formals.into(), body)))
    }

    fn formal(&self, i: &'s str) -> PResult<'s, FormalDecl> {
        let (i, typ) = self.typ(i)?;
        let (i, id) = context("expected parameter name", cut(|i| self.id(i)))(i)?;
        Ok((i, FormalDecl::new(typ, id)))
    }

    pub fn typ(&self, i: &'s str) -> PResult<'s, Type> {
        alt((
            value(Type::Int, keyword("int")),
            value(Type::Bool, keyword("bool")),
            value(Type::Void, keyword("void")),
            |i| self.struct_type(i),
        ))(i)
    }

    fn struct_type(&self, i: &'s str) -> PResult<'s, Type> {
        let (i, _) = keyword("struct")(i)?;
        let (i, id) = self.id(i)?;
        Ok((i, Type::Struct(id)))
    }

    /// `{ decls stmts }`
    fn body(&self, i: &'s str) -> PResult<'s, Body> {
        let (i, _) = context("expected '{'", symbol("{"))(i)?;
        let (i, (decls, stmts)) = self.nested(i, "blocks nested too deeply", |i| {
            let (i, decls) = many0(|i| self.decl(i))(i)?;
            let (i, stmts) = many0(|i| self.stmt(i))(i)?;
            Ok((i, (decls, stmts)))
        })?;
        let (i, _) = context("expected '}'", cut(symbol("}")))(i)?;
        Ok((i, Body::new(decls.into(), stmts.into())))
    }

    // Statements

    pub fn stmt(&self, i: &'s str) -> PResult<'s, Stmt> {
        alt((
            |i| self.if_stmt(i),
            |i| self.while_stmt(i),
            |i| self.return_stmt(i),
            |i| self.read_stmt(i),
            |i| self.write_stmt(i),
            |i| self.simple_stmt(i),
        ))(i)
    }

    fn condition(&self, i: &'s str) -> PResult<'s, Exp> {
        context(
            "expected parenthesized condition",
            cut(delimited(symbol("("), |i| self.exp(i), symbol(")"))),
        )(i)
    }

    fn if_stmt(&self, i: &'s str) -> PResult<'s, Stmt> {
        let (i, _) = keyword("if")(i)?;
        let (i, cond) = self.condition(i)?;
        let (i, then_body) = cut(|i| self.body(i))(i)?;
        match opt(keyword("else"))(i)? {
            (i, Some(_)) => {
                let (i, else_body) = cut(|i| self.body(i))(i)?;
                Ok((i, Stmt::IfElse(cond, then_body, else_body)))
            }
            (i, None) => Ok((i, Stmt::If(cond, then_body))),
        }
    }

    fn while_stmt(&self, i: &'s str) -> PResult<'s, Stmt> {
        let (i, _) = keyword("while")(i)?;
        let (i, cond) = self.condition(i)?;
        let (i, body) = cut(|i| self.body(i))(i)?;
        Ok((i, Stmt::While(cond, body)))
    }

    fn return_stmt(&self, i: &'s str) -> PResult<'s, Stmt> {
        let (i, _) = keyword("return")(i)?;
        let (i, e) = opt(|i| self.exp(i))(i)?;
        let (i, _) = context("expected ';'", cut(symbol(";")))(i)?;
        Ok((i, Stmt::Return(e)))
    }

    fn read_stmt(&self, i: &'s str) -> PResult<'s, Stmt> {
        let (i, _) = keyword("read")(i)?;
        let (i, target) = context("expected location", cut(|i| self.loc(i)))(i)?;
        let (i, _) = context("expected ';'", cut(symbol(";")))(i)?;
        Ok((i, Stmt::Read(target)))
    }

    fn write_stmt(&self, i: &'s str) -> PResult<'s, Stmt> {
        let (i, _) = keyword("write")(i)?;
        let (i, e) = context("expected expression", cut(|i| self.exp(i)))(i)?;
        let (i, _) = context("expected ';'", cut(symbol(";")))(i)?;
        Ok((i, Stmt::Write(e)))
    }

    // f(...);  loc++;  loc--;  loc = exp;
    fn simple_stmt(&self, i: &'s str) -> PResult<'s, Stmt> {
        match self.call(i) {
            Ok((rest, call)) => {
                let (rest, _) = context("expected ';'", cut(symbol(";")))(rest)?;
                return Ok((rest, Stmt::Call(call)));
            }
            Err(nom::Err::Error(_)) => {}
            Err(e) => return Err(e),
        }
        let (i, target) = self.loc(i)?;
        let (i, stmt) = if let Ok((i, _)) = symbol("++")(i) {
            (i, Stmt::PostInc(target))
        } else if let Ok((i, _)) = symbol("--")(i) {
            (i, Stmt::PostDec(target))
        } else if let Ok((i, _)) = assign_symbol(i) {
            let (i, v) = context("expected expression", cut(|i| self.exp(i)))(i)?;
            (i, Stmt::Assign(AssignExp::new(target, v)))
        } else {
            let (at, ()) = space(i)?;
            return Err(nom::Err::Failure(VerboseError{
                errors: vec![(at, VerboseErrorKind::Context("expected '++', '--' or '='"))],
            }));
        };
        let (i, _) = context("expected ';'", cut(symbol(";")))(i)?;
        Ok((i, stmt))
    }

    // Expressions

    /// Assignment binds loosest and associates to the right.
    pub fn exp(&self, i: &'s str) -> PResult<'s, Exp> {
        if let Ok((rest, target)) = self.loc(i) {
            if let Ok((rest, _)) = assign_symbol(rest) {
                let (rest, v) = context("expected expression", cut(|i| self.sub_exp(i)))(rest)?;
                return Ok((rest, Exp::Assign(AssignExp::new(target, v))));
            }
        }
        self.or_exp(i)
    }

    // An expression one nesting level down.
    fn sub_exp(&self, i: &'s str) -> PResult<'s, Exp> {
        self.nested(i, "expression nested too deeply", |i| self.exp(i))
    }

    // Left associative chain `next (op next)*`.
    fn left_assoc(
        &self,
        i: &'s str,
        next: fn(&Self, &'s str) -> PResult<'s, Exp>,
        op: fn(&'s str) -> PResult<'s, ast::BinaryOp>,
    ) -> PResult<'s, Exp> {
        let (mut i, mut lhs) = next(self, i)?;
        loop {
            match op(i) {
                Ok((rest, bop)) => {
                    let (rest, rhs) = context("expected operand", cut(|i| next(self, i)))(rest)?;
                    lhs = Exp::binary(bop, lhs, rhs);
                    i = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((i, lhs)),
                Err(e) => return Err(e),
            }
        }
    }

    fn or_exp(&self, i: &'s str) -> PResult<'s, Exp> {
        self.left_assoc(i, Self::and_exp, binary_op_or)
    }

    fn and_exp(&self, i: &'s str) -> PResult<'s, Exp> {
        self.left_assoc(i, Self::compare, binary_op_and)
    }

    fn compare(&self, i: &'s str) -> PResult<'s, Exp> {
        self.left_assoc(i, Self::arith, binary_op_compare)
    }

    fn arith(&self, i: &'s str) -> PResult<'s, Exp> {
        self.left_assoc(i, Self::term, binary_op_arith)
    }

    fn term(&self, i: &'s str) -> PResult<'s, Exp> {
        self.left_assoc(i, Self::factor, binary_op_mul)
    }

    fn factor(&self, i: &'s str) -> PResult<'s, Exp> {
        match unary_op(i) {
            Ok((rest, op)) => {
                let (rest, e) = context(
                    "expected operand",
                    cut(|i| self.nested(i, "expression nested too deeply", |i| self.factor(i))),
                )(rest)?;
                Ok((rest, Exp::unary(op, e)))
            }
            Err(nom::Err::Error(_)) => self.atom(i),
            Err(e) => Err(e),
        }
    }

    fn atom(&self, i: &'s str) -> PResult<'s, Exp> {
        context(
            "expected expression",
            alt((
                map(|i| self.int_lit(i), Exp::IntLit),
                map(|i| self.str_lit(i), Exp::StrLit),
                value(Exp::True, keyword("true")),
                value(Exp::False, keyword("false")),
                map(|i| self.call(i), Exp::Call),
                |i| self.loc(i),
                delimited(symbol("("), |i| self.sub_exp(i), context("expected ')'", cut(symbol(")")))),
            )),
        )(i)
    }

    /// `id(.id)*`
    pub fn loc(&self, i: &'s str) -> PResult<'s, Exp> {
        let (mut i, base) = self.id(i)?;
        let mut e = Exp::Id(base);
        loop {
            match symbol(".")(i) {
                Ok((rest, _)) => {
                    let (rest, field) = context("expected field name", cut(|i| self.id(i)))(rest)?;
                    e = Exp::dot(e, field);
                    i = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((i, e)),
                Err(err) => return Err(err),
            }
        }
    }

    fn call(&self, i: &'s str) -> PResult<'s, CallExp> {
        let (i, callee) = self.id(i)?;
        let (i, _) = symbol("(")(i)?;
        let (i, args) = cut(separated_list0(symbol(","), |i| self.sub_exp(i)))(i)?;
        let (i, _) = context("expected ')'", cut(symbol(")")))(i)?;
        Ok((i, CallExp::new(callee, args.into())))
    }

    // Leaves

    pub fn id(&self, i: &'s str) -> PResult<'s, ast::Id> {
        let (i, ()) = space(i)?;
        let (line, column) = self.position(i);
        let (i, name) = context("expected identifier", ident_text)(i)?;
        Ok((i, ast::Id::new(&IdToken::new(line, column, name))))
    }

    fn int_lit(&self, i: &'s str) -> PResult<'s, ast::IntLit> {
        let (i, ()) = space(i)?;
        let (line, column) = self.position(i);
        let (i, text) = int_text(i)?;
        let value = match text.parse::<u32>() {
            Ok(v) => v,
            Err(_) => {
                warn!(line, column, literal = text, "integer literal too large, using {}", u32::MAX);
                u32::MAX
            }
        };
        Ok((i, ast::IntLit::new(&IntLitToken::new(line, column, value))))
    }

    fn str_lit(&self, i: &'s str) -> PResult<'s, ast::StrLit> {
        let (i, ()) = space(i)?;
        let (line, column) = self.position(i);
        let (i, raw) = str_text(i)?;
        Ok((i, ast::StrLit::new(&StrLitToken::new(line, column, raw))))
    }
}
