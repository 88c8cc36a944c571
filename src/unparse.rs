/*
Canonical source text from a tree.

The traversal keeps its own work stack instead of recursing, so the depth of the program being
printed is bounded by memory rather than by the call stack. A node is expanded into the
sequence of text fragments and child nodes that make up its rendering; the sequence is pushed
in reverse so that popping yields it in order. Indentation travels with each pushed node.

Conventions:
  - one declaration or statement per line, prefixed by indent * STEP spaces;
  - nested bodies (function, struct fields, if/else branches, while) are one level deeper and
    their closing brace is back at the opening line's level;
  - unary and binary expressions are fully parenthesized, as is every operand that does not
    already carry its own parentheses: `a + b * c` prints as `((a) + ((b) * (c)))`.
*/

use crate::parse::ast::*;
use std::fmt;
use std::fmt::Write;
use tracing::debug;

/// Spaces per indentation level.
pub const STEP: usize = 4;

enum Item<'a> {
    Node(Node<'a>, usize),
    // Parenthesized unless it brings its own parentheses.
    Operand(&'a Exp),
    Text(&'a str),
    Int(u32),
    Indent(usize),
}

struct Renderer<'w, W: Write> {
    out: &'w mut W,
    nodes: usize,
    written: usize,
}

impl<'w, W: Write> Renderer<'w, W> {
    fn new(out: &'w mut W) -> Self {
        Renderer{out: out, nodes: 0, written: 0}
    }

    fn emit(&mut self, s: &str) -> fmt::Result {
        self.written += s.len();
        self.out.write_str(s)
    }

    fn run(&mut self, root: Node, indent: usize) -> fmt::Result {
        let mut stack = vec![Item::Node(root, indent)];
        while let Some(item) = stack.pop() {
            match item {
                Item::Node(node, indent) => {
                    self.nodes += 1;
                    let parts = expand(node, indent);
                    stack.extend(parts.into_iter().rev());
                }
                Item::Operand(e) => match *e {
                    Exp::Unary(..) | Exp::Binary(..) => stack.push(Item::Node(Node::Exp(e), 0)),
                    _ => {
                        stack.push(Item::Text(")"));
                        stack.push(Item::Node(Node::Exp(e), 0));
                        stack.push(Item::Text("("));
                    }
                },
                Item::Text(s) => self.emit(s)?,
                Item::Int(v) => self.emit(&v.to_string())?,
                Item::Indent(level) => {
                    let width = level * STEP;
                    self.written += width;
                    write!(self.out, "{:width$}", "", width = width)?;
                }
            }
        }
        Ok(())
    }
}

// `elems` separated by ", ".
fn comma_separated<'a, I>(elems: I, indent: usize) -> Vec<Item<'a>>
where
    I: Iterator<Item = Node<'a>>,
{
    let mut parts = Vec::new();
    for (n, node) in elems.enumerate() {
        if n > 0 {
            parts.push(Item::Text(", "));
        }
        parts.push(Item::Node(node, indent));
    }
    parts
}

fn nested(node: Node, indent: usize) -> Item {
    Item::Node(node, indent + 1)
}

// The rendering of a single node, as text fragments and children still to expand.
fn expand(node: Node, indent: usize) -> Vec<Item> {
    use self::Item::{Indent, Int, Operand, Text};

    match node {
        Node::Program(p) => vec![Item::Node(Node::DeclList(&p.decls), indent)],
        Node::DeclList(list) => list
            .iter()
            .map(|decl| match *decl {
                Decl::Formal(ref f) => panic!("parameter `{}` declared outside a parameter list", f.id.name),
                _ => Item::Node(Node::Decl(decl), indent),
            })
            .collect(),
        Node::StmtList(list) => list.iter().map(|s| Item::Node(Node::Stmt(s), indent)).collect(),
        Node::FormalsList(list) => comma_separated(list.iter().map(Node::Formal), indent),
        Node::ExpList(list) => comma_separated(list.iter().map(Node::Exp), indent),
        Node::Body(body) => vec![
            Item::Node(Node::DeclList(&body.decls), indent),
            Item::Node(Node::StmtList(&body.stmts), indent),
        ],
        Node::Decl(decl) => match *decl {
            Decl::Var(ref v) => vec![
                Indent(indent),
                Item::Node(Node::Type(&v.typ), indent),
                Text(" "),
                Item::Node(Node::Id(&v.id), indent),
                Text(";\n"),
            ],
            Decl::Fn(ref f) => vec![
                Indent(indent),
                Item::Node(Node::Type(&f.ret), indent),
                Text(" "),
                Item::Node(Node::Id(&f.id), indent),
                Text("("),
                Item::Node(Node::FormalsList(&f.formals), indent),
                Text(") {\n"),
                nested(Node::Body(&f.body), indent),
                Indent(indent),
                Text("}\n"),
            ],
            Decl::Formal(ref f) => expand(Node::Formal(f), indent),
            Decl::Struct(ref s) => vec![
                Indent(indent),
                Text("struct "),
                Item::Node(Node::Id(&s.id), indent),
                Text(" {\n"),
                nested(Node::DeclList(&s.fields), indent),
                Indent(indent),
                Text("};\n"),
            ],
        },
        Node::Formal(f) => vec![
            Item::Node(Node::Type(&f.typ), indent),
            Text(" "),
            Item::Node(Node::Id(&f.id), indent),
        ],
        Node::Type(typ) => match *typ {
            Type::Int => vec![Text("int")],
            Type::Bool => vec![Text("bool")],
            Type::Void => vec![Text("void")],
            Type::Struct(ref id) => vec![Text("struct "), Item::Node(Node::Id(id), indent)],
        },
        Node::Stmt(stmt) => match *stmt {
            Stmt::Assign(ref a) => vec![Indent(indent), Item::Node(Node::Assign(a), indent), Text(";\n")],
            Stmt::PostInc(ref e) => vec![Indent(indent), Item::Node(Node::Exp(e), indent), Text("++;\n")],
            Stmt::PostDec(ref e) => vec![Indent(indent), Item::Node(Node::Exp(e), indent), Text("--;\n")],
            Stmt::Read(ref e) => vec![Indent(indent), Text("read "), Item::Node(Node::Exp(e), indent), Text(";\n")],
            Stmt::Write(ref e) => vec![Indent(indent), Text("write "), Item::Node(Node::Exp(e), indent), Text(";\n")],
            Stmt::If(ref cond, ref body) => vec![
                Indent(indent),
                Text("if ("),
                Item::Node(Node::Exp(cond), indent),
                Text(") {\n"),
                nested(Node::Body(body), indent),
                Indent(indent),
                Text("}\n"),
            ],
            Stmt::IfElse(ref cond, ref then_body, ref else_body) => vec![
                Indent(indent),
                Text("if ("),
                Item::Node(Node::Exp(cond), indent),
                Text(") {\n"),
                nested(Node::Body(then_body), indent),
                Indent(indent),
                Text("} else {\n"),
                nested(Node::Body(else_body), indent),
                Indent(indent),
                Text("}\n"),
            ],
            Stmt::While(ref cond, ref body) => vec![
                Indent(indent),
                Text("while ("),
                Item::Node(Node::Exp(cond), indent),
                Text(") {\n"),
                nested(Node::Body(body), indent),
                Indent(indent),
                Text("}\n"),
            ],
            Stmt::Call(ref c) => vec![Indent(indent), Item::Node(Node::Call(c), indent), Text(";\n")],
            Stmt::Return(None) => vec![Indent(indent), Text("return;\n")],
            Stmt::Return(Some(ref e)) => {
                vec![Indent(indent), Text("return "), Item::Node(Node::Exp(e), indent), Text(";\n")]
            }
        },
        Node::Exp(exp) => match *exp {
            Exp::IntLit(lit) => vec![Int(lit.value)],
            Exp::StrLit(ref lit) => vec![Text(&lit.value)],
            Exp::True => vec![Text("true")],
            Exp::False => vec![Text("false")],
            Exp::Id(ref id) => vec![Text(&id.name)],
            Exp::DotAccess(ref base, ref field) => vec![
                Item::Node(Node::Exp(base), indent),
                Text("."),
                Item::Node(Node::Id(field), indent),
            ],
            Exp::Assign(ref a) => expand(Node::Assign(a), indent),
            Exp::Call(ref c) => expand(Node::Call(c), indent),
            Exp::Unary(op, ref e) => vec![Text("("), Text(op.symbol()), Operand(e), Text(")")],
            Exp::Binary(op, ref lhs, ref rhs) => vec![
                Text("("),
                Operand(lhs),
                Text(" "),
                Text(op.symbol()),
                Text(" "),
                Operand(rhs),
                Text(")"),
            ],
        },
        Node::Id(id) => vec![Text(&id.name)],
        Node::Assign(a) => vec![
            Item::Node(Node::Exp(&a.target), indent),
            Text(" = "),
            Item::Node(Node::Exp(&a.value), indent),
        ],
        Node::Call(c) => vec![
            Item::Node(Node::Id(&c.callee), indent),
            Text("("),
            Item::Node(Node::ExpList(&c.args), indent),
            Text(")"),
        ],
    }
}

/// Writes the rendering of `node` at indentation level `indent` to `out`.
///
/// Panics if the tree breaks a structural invariant the type system cannot express, such as
/// a parameter declaration in a declaration list.
pub fn render<W: Write>(node: Node, out: &mut W, indent: usize) -> fmt::Result {
    Renderer::new(out).run(node, indent)
}

/// Writes the whole program to `out`: one top-level declaration per line, the last one
/// terminated by a line break. An empty program writes nothing.
pub fn unparse<W: Write>(root: &Program, out: &mut W) -> fmt::Result {
    let mut r = Renderer::new(out);
    r.run(Node::Program(root), 0)?;
    debug!(nodes = r.nodes, bytes = r.written, "unparsed program");
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        unparse(self, f)
    }
}

impl<'a> fmt::Display for Node<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        render(*self, f, 0)
    }
}
