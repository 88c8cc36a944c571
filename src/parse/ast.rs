/*
Abstract syntax tree of a LIL'C compilation unit.

Each grammar category is a closed enum (Decl, Type, Stmt, Exp), fixed arity constructs are
structs and the four list nodes are newtypes over Vec. Children are owned exclusively and moved
in at construction; nothing in this crate mutates a tree once it is built.

Node is a borrowed view over any of the above, with a flat NodeKind tag, so that passes other
than the unparser can match on every construct without knowing the concrete Rust type.
*/

use crate::parse::token::{IdToken, IntLitToken, StrLitToken};
use std::mem;

pub type Ident = String;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Id {
    pub name: Ident,
}

impl Id {
    pub fn new(token: &IdToken) -> Id {
        Id{name: token.value.clone()}
    }

    pub fn named<S: Into<Ident>>(name: S) -> Id {
        Id{name: name.into()}
    }
}

/// Literals are unsigned: `-5` is a unary minus applied to `5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntLit {
    pub value: u32,
}

impl IntLit {
    pub fn new(token: &IntLitToken) -> IntLit {
        IntLit{value: token.value}
    }
}

/// Raw literal text, quotes and escapes included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrLit {
    pub value: String,
}

impl StrLit {
    pub fn new(token: &StrLitToken) -> StrLit {
        StrLit{value: token.value.clone()}
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Times,
    Divide,
    And,
    Or,
    Equals,
    NotEquals,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Divide => "/",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
        }
    }
}

// List nodes: ordered, homogeneous, possibly empty.
macro_rules! list_node {
    ($name:ident, $elem:ty) => {
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name(pub Vec<$elem>);

        impl $name {
            pub fn new(elems: Vec<$elem>) -> $name {
                $name(elems)
            }

            pub fn iter(&self) -> ::std::slice::Iter<$elem> {
                self.0.iter()
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<Vec<$elem>> for $name {
            fn from(elems: Vec<$elem>) -> $name {
                $name(elems)
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $elem;
            type IntoIter = ::std::slice::Iter<'a, $elem>;

            fn into_iter(self) -> Self::IntoIter {
                self.0.iter()
            }
        }
    };
}

list_node!(DeclList, Decl);
list_node!(FormalsList, FormalDecl);
list_node!(StmtList, Stmt);
list_node!(ExpList, Exp);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    pub decls: DeclList,
}

impl Program {
    pub fn new(decls: DeclList) -> Program {
        Program{decls: decls}
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decl {
    Var(VarDecl),
    Fn(FnDecl),
    Formal(FormalDecl),
    Struct(StructDecl),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarDecl {
    pub typ: Type,
    pub id: Id,
    /// NOT_STRUCT for a plain declaration, otherwise the struct size/variant.
    pub size: i32,
}

impl VarDecl {
    pub const NOT_STRUCT: i32 = -1;

    pub fn new(typ: Type, id: Id, size: i32) -> VarDecl {
        VarDecl{typ: typ, id: id, size: size}
    }

    pub fn plain(typ: Type, id: Id) -> VarDecl {
        VarDecl::new(typ, id, VarDecl::NOT_STRUCT)
    }

    pub fn is_struct(&self) -> bool {
        self.size != VarDecl::NOT_STRUCT
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FnDecl {
    pub ret: Type,
    pub id: Id,
    pub formals: FormalsList,
    pub body: Body,
}

impl FnDecl {
    pub fn new(ret: Type, id: Id, formals: FormalsList, body: Body) -> FnDecl {
        FnDecl{ret: ret, id: id, formals: formals, body: body}
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormalDecl {
    pub typ: Type,
    pub id: Id,
}

impl FormalDecl {
    pub fn new(typ: Type, id: Id) -> FormalDecl {
        FormalDecl{typ: typ, id: id}
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDecl {
    pub id: Id,
    pub fields: DeclList,
}

impl StructDecl {
    pub fn new(id: Id, fields: DeclList) -> StructDecl {
        StructDecl{id: id, fields: fields}
    }
}

/// Declarations followed by statements: a function body, a branch or a loop body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Body {
    pub decls: DeclList,
    pub stmts: StmtList,
}

impl Body {
    pub fn new(decls: DeclList, stmts: StmtList) -> Body {
        Body{decls: decls, stmts: stmts}
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Bool,
    Void,
    Struct(Id),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    Assign(AssignExp),
    PostInc(Exp),
    PostDec(Exp),
    Read(Exp),
    Write(Exp),
    If(Exp, Body),
    IfElse(Exp, Body, Body),
    While(Exp, Body),
    Call(CallExp),
    Return(Option<Exp>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exp {
    IntLit(IntLit),
    StrLit(StrLit),
    True,
    False,
    Id(Id),
    DotAccess(Box<Exp>, Id),
    Assign(AssignExp),
    Call(CallExp),
    Unary(UnaryOp, Box<Exp>),
    Binary(BinaryOp, Box<Exp>, Box<Exp>),
}

impl Exp {
    pub fn unary(op: UnaryOp, e: Exp) -> Exp {
        Exp::Unary(op, Box::new(e))
    }

    pub fn binary(op: BinaryOp, lhs: Exp, rhs: Exp) -> Exp {
        Exp::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn dot(base: Exp, field: Id) -> Exp {
        Exp::DotAccess(Box::new(base), field)
    }

    // Moves the inner sub-expressions out, leaving `true` in their place.
    fn detach_children(&mut self, out: &mut Vec<Exp>) {
        fn take(e: &mut Exp, out: &mut Vec<Exp>) {
            if !e.is_leaf() {
                out.push(mem::replace(e, Exp::True));
            }
        }

        match *self {
            Exp::DotAccess(ref mut e, _) | Exp::Unary(_, ref mut e) => take(e, out),
            Exp::Binary(_, ref mut lhs, ref mut rhs) => {
                take(lhs, out);
                take(rhs, out);
            }
            Exp::Assign(ref mut a) => {
                take(&mut a.target, out);
                take(&mut a.value, out);
            }
            Exp::Call(ref mut c) => out.append(&mut c.args.0),
            Exp::IntLit(_) | Exp::StrLit(_) | Exp::True | Exp::False | Exp::Id(_) => {}
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(*self, Exp::IntLit(_) | Exp::StrLit(_) | Exp::True | Exp::False | Exp::Id(_))
    }
}

// Long field chains and operator nests would otherwise be freed by one call frame per level.
impl Drop for Exp {
    fn drop(&mut self) {
        if self.is_leaf() {
            return;
        }
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut e) = pending.pop() {
            e.detach_children(&mut pending);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignExp {
    pub target: Box<Exp>,
    pub value: Box<Exp>,
}

impl AssignExp {
    pub fn new(target: Exp, value: Exp) -> AssignExp {
        AssignExp{target: Box::new(target), value: Box::new(value)}
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallExp {
    pub callee: Id,
    pub args: ExpList,
}

impl CallExp {
    pub fn new(callee: Id, args: ExpList) -> CallExp {
        CallExp{callee: callee, args: args}
    }
}

/// Every grammar construct, flattened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    DeclList,
    FormalsList,
    StmtList,
    ExpList,
    Body,
    VarDecl,
    FnDecl,
    FormalDecl,
    StructDecl,
    IntType,
    BoolType,
    VoidType,
    StructType,
    AssignStmt,
    PostIncStmt,
    PostDecStmt,
    ReadStmt,
    WriteStmt,
    IfStmt,
    IfElseStmt,
    WhileStmt,
    CallStmt,
    ReturnStmt,
    IntLit,
    StrLit,
    True,
    False,
    Id,
    DotAccess,
    Assign,
    CallExp,
    UnaryMinus,
    Not,
    Plus,
    Minus,
    Times,
    Divide,
    And,
    Or,
    Equals,
    NotEquals,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

#[derive(Clone, Copy, Debug)]
pub enum Node<'a> {
    Program(&'a Program),
    DeclList(&'a DeclList),
    FormalsList(&'a FormalsList),
    StmtList(&'a StmtList),
    ExpList(&'a ExpList),
    Body(&'a Body),
    Decl(&'a Decl),
    Formal(&'a FormalDecl),
    Type(&'a Type),
    Stmt(&'a Stmt),
    Exp(&'a Exp),
    Id(&'a Id),
    Assign(&'a AssignExp),
    Call(&'a CallExp),
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> NodeKind {
        match *self {
            Node::Program(_) => NodeKind::Program,
            Node::DeclList(_) => NodeKind::DeclList,
            Node::FormalsList(_) => NodeKind::FormalsList,
            Node::StmtList(_) => NodeKind::StmtList,
            Node::ExpList(_) => NodeKind::ExpList,
            Node::Body(_) => NodeKind::Body,
            Node::Decl(decl) => match *decl {
                Decl::Var(_) => NodeKind::VarDecl,
                Decl::Fn(_) => NodeKind::FnDecl,
                Decl::Formal(_) => NodeKind::FormalDecl,
                Decl::Struct(_) => NodeKind::StructDecl,
            },
            Node::Formal(_) => NodeKind::FormalDecl,
            Node::Type(typ) => match *typ {
                Type::Int => NodeKind::IntType,
                Type::Bool => NodeKind::BoolType,
                Type::Void => NodeKind::VoidType,
                Type::Struct(_) => NodeKind::StructType,
            },
            Node::Stmt(stmt) => match *stmt {
                Stmt::Assign(_) => NodeKind::AssignStmt,
                Stmt::PostInc(_) => NodeKind::PostIncStmt,
                Stmt::PostDec(_) => NodeKind::PostDecStmt,
                Stmt::Read(_) => NodeKind::ReadStmt,
                Stmt::Write(_) => NodeKind::WriteStmt,
                Stmt::If(..) => NodeKind::IfStmt,
                Stmt::IfElse(..) => NodeKind::IfElseStmt,
                Stmt::While(..) => NodeKind::WhileStmt,
                Stmt::Call(_) => NodeKind::CallStmt,
                Stmt::Return(_) => NodeKind::ReturnStmt,
            },
            Node::Exp(exp) => match *exp {
                Exp::IntLit(_) => NodeKind::IntLit,
                Exp::StrLit(_) => NodeKind::StrLit,
                Exp::True => NodeKind::True,
                Exp::False => NodeKind::False,
                Exp::Id(_) => NodeKind::Id,
                Exp::DotAccess(..) => NodeKind::DotAccess,
                Exp::Assign(_) => NodeKind::Assign,
                Exp::Call(_) => NodeKind::CallExp,
                Exp::Unary(UnaryOp::Minus, _) => NodeKind::UnaryMinus,
                Exp::Unary(UnaryOp::Not, _) => NodeKind::Not,
                Exp::Binary(op, ..) => match op {
                    BinaryOp::Plus => NodeKind::Plus,
                    BinaryOp::Minus => NodeKind::Minus,
                    BinaryOp::Times => NodeKind::Times,
                    BinaryOp::Divide => NodeKind::Divide,
                    BinaryOp::And => NodeKind::And,
                    BinaryOp::Or => NodeKind::Or,
                    BinaryOp::Equals => NodeKind::Equals,
                    BinaryOp::NotEquals => NodeKind::NotEquals,
                    BinaryOp::Less => NodeKind::Less,
                    BinaryOp::Greater => NodeKind::Greater,
                    BinaryOp::LessEq => NodeKind::LessEq,
                    BinaryOp::GreaterEq => NodeKind::GreaterEq,
                },
            },
            Node::Id(_) => NodeKind::Id,
            Node::Assign(_) => NodeKind::Assign,
            Node::Call(_) => NodeKind::CallExp,
        }
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<Node<'a>> {
        match *self {
            Node::Program(p) => vec![Node::DeclList(&p.decls)],
            Node::DeclList(l) => l.iter().map(Node::Decl).collect(),
            Node::FormalsList(l) => l.iter().map(Node::Formal).collect(),
            Node::StmtList(l) => l.iter().map(Node::Stmt).collect(),
            Node::ExpList(l) => l.iter().map(Node::Exp).collect(),
            Node::Body(b) => vec![Node::DeclList(&b.decls), Node::StmtList(&b.stmts)],
            Node::Decl(decl) => match *decl {
                Decl::Var(ref v) => vec![Node::Type(&v.typ), Node::Id(&v.id)],
                Decl::Fn(ref f) => vec![
                    Node::Type(&f.ret),
                    Node::Id(&f.id),
                    Node::FormalsList(&f.formals),
                    Node::Body(&f.body),
                ],
                Decl::Formal(ref f) => Node::Formal(f).children(),
                Decl::Struct(ref s) => vec![Node::Id(&s.id), Node::DeclList(&s.fields)],
            },
            Node::Formal(f) => vec![Node::Type(&f.typ), Node::Id(&f.id)],
            Node::Type(typ) => match *typ {
                Type::Struct(ref id) => vec![Node::Id(id)],
                _ => Vec::new(),
            },
            Node::Stmt(stmt) => match *stmt {
                Stmt::Assign(ref a) => vec![Node::Assign(a)],
                Stmt::PostInc(ref e)
                | Stmt::PostDec(ref e)
                | Stmt::Read(ref e)
                | Stmt::Write(ref e)
                | Stmt::Return(Some(ref e)) => vec![Node::Exp(e)],
                Stmt::Return(None) => Vec::new(),
                Stmt::If(ref cond, ref body) | Stmt::While(ref cond, ref body) => {
                    vec![Node::Exp(cond), Node::Body(body)]
                }
                Stmt::IfElse(ref cond, ref then_body, ref else_body) => {
                    vec![Node::Exp(cond), Node::Body(then_body), Node::Body(else_body)]
                }
                Stmt::Call(ref c) => vec![Node::Call(c)],
            },
            Node::Exp(exp) => match *exp {
                Exp::IntLit(_) | Exp::StrLit(_) | Exp::True | Exp::False | Exp::Id(_) => Vec::new(),
                Exp::DotAccess(ref base, ref field) => vec![Node::Exp(base), Node::Id(field)],
                Exp::Assign(ref a) => Node::Assign(a).children(),
                Exp::Call(ref c) => Node::Call(c).children(),
                Exp::Unary(_, ref e) => vec![Node::Exp(e)],
                Exp::Binary(_, ref lhs, ref rhs) => vec![Node::Exp(lhs), Node::Exp(rhs)],
            },
            Node::Id(_) => Vec::new(),
            Node::Assign(a) => vec![Node::Exp(&a.target), Node::Exp(&a.value)],
            Node::Call(c) => vec![Node::Id(&c.callee), Node::ExpList(&c.args)],
        }
    }

    /// Pre-order traversal of the subtree rooted here.
    pub fn walk(self) -> Walk<'a> {
        Walk{stack: vec![self]}
    }
}

// Explicit stack so that deeply nested trees do not exhaust the call stack.
pub struct Walk<'a> {
    stack: Vec<Node<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Node<'a>> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Id {
        Id::named(name)
    }

    #[test]
    fn leaves_copy_token_payload() {
        let tok = IdToken::new(3, 7, "counter");
        assert_eq!(Id::new(&tok).name, "counter");
        assert_eq!(IntLit::new(&IntLitToken::new(1, 1, 42)).value, 42);
        assert_eq!(StrLit::new(&StrLitToken::new(1, 1, "\"hi\\n\"")).value, "\"hi\\n\"");
    }

    #[test]
    fn sentinel_marks_plain_declarations() {
        let plain = VarDecl::plain(Type::Int, id("x"));
        assert_eq!(plain.size, VarDecl::NOT_STRUCT);
        assert!(!plain.is_struct());

        let point = VarDecl::new(Type::Struct(id("Point")), id("p"), 0);
        assert!(point.is_struct());
    }

    #[test]
    fn kinds_are_fine_grained() {
        let sum = Exp::binary(BinaryOp::Plus, Exp::Id(id("a")), Exp::True);
        assert_eq!(Node::Exp(&sum).kind(), NodeKind::Plus);
        assert_eq!(Node::Exp(&Exp::unary(UnaryOp::Not, Exp::False)).kind(), NodeKind::Not);
        assert_eq!(Node::Type(&Type::Struct(id("P"))).kind(), NodeKind::StructType);
        assert_eq!(Node::Stmt(&Stmt::Return(None)).kind(), NodeKind::ReturnStmt);
    }

    #[test]
    fn children_follow_source_order() {
        let f = FnDecl::new(
            Type::Void,
            id("f"),
            FormalsList::new(vec![FormalDecl::new(Type::Int, id("n"))]),
            Body::default(),
        );
        let decl = Decl::Fn(f);
        let kinds: Vec<NodeKind> = Node::Decl(&decl).children().iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::VoidType, NodeKind::Id, NodeKind::FormalsList, NodeKind::Body]);
    }

    #[test]
    fn walk_visits_every_node_once() {
        // a.b = f(1);
        let stmt = Stmt::Assign(AssignExp::new(
            Exp::dot(Exp::Id(id("a")), id("b")),
            Exp::Call(CallExp::new(id("f"), ExpList::new(vec![Exp::IntLit(IntLit{value: 1})]))),
        ));
        let kinds: Vec<NodeKind> = Node::Stmt(&stmt).walk().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::AssignStmt,
                NodeKind::Assign,
                NodeKind::DotAccess,
                NodeKind::Id,
                NodeKind::Id,
                NodeKind::CallExp,
                NodeKind::Id,
                NodeKind::ExpList,
                NodeKind::IntLit,
            ]
        );
    }

    #[test]
    fn long_chains_drop_without_recursing() {
        let mut e = Exp::Id(id("s"));
        for n in 0..1_000_000 {
            e = match n % 4 {
                0 => Exp::dot(e, id("f")),
                1 => Exp::unary(UnaryOp::Minus, e),
                2 => Exp::binary(BinaryOp::Plus, Exp::True, e),
                _ => Exp::Call(CallExp::new(id("g"), vec![e, Exp::False].into())),
            };
        }
        let stmt = Stmt::Write(e);
        assert_eq!(Node::Stmt(&stmt).kind(), NodeKind::WriteStmt);
        drop(stmt);
    }

    #[test]
    fn clones_survive_dropping_the_original() {
        let a = Exp::Assign(AssignExp::new(Exp::dot(Exp::Id(id("p")), id("x")), Exp::unary(UnaryOp::Not, Exp::True)));
        let copy = a.clone();
        drop(a);
        assert_eq!(Node::Exp(&copy).walk().count(), 6);
    }

    #[test]
    fn empty_program_has_only_its_list() {
        let p = Program::new(DeclList::default());
        assert_eq!(Node::Program(&p).walk().count(), 2);
    }
}
