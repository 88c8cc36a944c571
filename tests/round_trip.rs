// Generated trees must read back unchanged from their own canonical text.

use lilc::ast::*;
use lilc::parse::lexer::KEYWORDS;
use lilc::{parse_program, STEP};
use proptest::collection::vec;
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,5}".prop_filter("keyword", |s| !KEYWORDS.contains(&s.as_str()))
}

fn id() -> impl Strategy<Value = Id> {
    name().prop_map(Id::named)
}

// id(.id)*
fn loc() -> impl Strategy<Value = Exp> {
    (id(), vec(id(), 0..3)).prop_map(|(base, fields)| fields.into_iter().fold(Exp::Id(base), Exp::dot))
}

fn unary_op() -> impl Strategy<Value = UnaryOp> {
    prop_oneof![Just(UnaryOp::Minus), Just(UnaryOp::Not)]
}

fn binary_op() -> impl Strategy<Value = BinaryOp> {
    prop_oneof![
        Just(BinaryOp::Plus),
        Just(BinaryOp::Minus),
        Just(BinaryOp::Times),
        Just(BinaryOp::Divide),
        Just(BinaryOp::And),
        Just(BinaryOp::Or),
        Just(BinaryOp::Equals),
        Just(BinaryOp::NotEquals),
        Just(BinaryOp::Less),
        Just(BinaryOp::Greater),
        Just(BinaryOp::LessEq),
        Just(BinaryOp::GreaterEq),
    ]
}

fn exp() -> impl Strategy<Value = Exp> {
    let leaf = prop_oneof![
        any::<u32>().prop_map(|v| Exp::IntLit(IntLit{value: v})),
        "[a-z ]{0,6}".prop_map(|s| Exp::StrLit(StrLit{value: format!("\"{}\\n\"", s)})),
        Just(Exp::True),
        Just(Exp::False),
        loc(),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (unary_op(), inner.clone()).prop_map(|(op, e)| Exp::unary(op, e)),
            (binary_op(), inner.clone(), inner.clone()).prop_map(|(op, l, r)| Exp::binary(op, l, r)),
            (loc(), inner.clone()).prop_map(|(t, v)| Exp::Assign(AssignExp::new(t, v))),
            (id(), vec(inner, 0..3)).prop_map(|(f, args)| Exp::Call(CallExp::new(f, args.into()))),
        ]
    })
}

fn var_decl() -> impl Strategy<Value = Decl> {
    prop_oneof![
        (prop_oneof![Just(Type::Int), Just(Type::Bool)], id())
            .prop_map(|(t, n)| Decl::Var(VarDecl::plain(t, n))),
        (id(), id()).prop_map(|(s, n)| Decl::Var(VarDecl::new(Type::Struct(s), n, 0))),
    ]
}

fn simple_stmt() -> impl Strategy<Value = Stmt> {
    prop_oneof![
        (loc(), exp()).prop_map(|(t, v)| Stmt::Assign(AssignExp::new(t, v))),
        loc().prop_map(Stmt::PostInc),
        loc().prop_map(Stmt::PostDec),
        loc().prop_map(Stmt::Read),
        exp().prop_map(Stmt::Write),
        (id(), vec(exp(), 0..3)).prop_map(|(f, args)| Stmt::Call(CallExp::new(f, args.into()))),
        proptest::option::of(exp()).prop_map(Stmt::Return),
    ]
}

fn body(stmts: BoxedStrategy<Stmt>) -> impl Strategy<Value = Body> {
    (vec(var_decl(), 0..2), vec(stmts, 0..3)).prop_map(|(d, s)| Body::new(d.into(), s.into()))
}

fn stmt() -> impl Strategy<Value = Stmt> {
    simple_stmt().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            (exp(), body(inner.clone())).prop_map(|(c, b)| Stmt::If(c, b)),
            (exp(), body(inner.clone()), body(inner.clone())).prop_map(|(c, t, e)| Stmt::IfElse(c, t, e)),
            (exp(), body(inner)).prop_map(|(c, b)| Stmt::While(c, b)),
        ]
    })
}

fn formal() -> impl Strategy<Value = FormalDecl> {
    (prop_oneof![Just(Type::Int), Just(Type::Bool), id().prop_map(Type::Struct)], id())
        .prop_map(|(t, n)| FormalDecl::new(t, n))
}

fn top_decl() -> impl Strategy<Value = Decl> {
    prop_oneof![
        var_decl(),
        (id(), vec(var_decl(), 0..3)).prop_map(|(n, fields)| Decl::Struct(StructDecl::new(n, fields.into()))),
        (
            prop_oneof![Just(Type::Int), Just(Type::Bool), Just(Type::Void)],
            id(),
            vec(formal(), 0..3),
            vec(var_decl(), 0..3),
            vec(stmt(), 0..4),
        )
            .prop_map(|(ret, n, formals, decls, stmts)| {
                Decl::Fn(FnDecl::new(ret, n, formals.into(), Body::new(decls.into(), stmts.into())))
            }),
    ]
}

fn program() -> impl Strategy<Value = Program> {
    vec(top_decl(), 0..4).prop_map(|decls| Program::new(decls.into()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn reparsing_unparsed_text_gives_the_same_tree(p in program()) {
        let text = p.to_string();
        let back = parse_program(&text).map_err(|e| TestCaseError::fail(format!("{}\n{}", e, text)))?;
        prop_assert_eq!(back, p);
    }

    #[test]
    fn canonical_text_is_a_fixpoint(p in program()) {
        let text = p.to_string();
        let again = parse_program(&text).map_err(|e| TestCaseError::fail(e.to_string()))?.to_string();
        prop_assert_eq!(again, text);
    }

    #[test]
    fn lines_are_indented_by_whole_steps(p in program()) {
        let text = p.to_string();
        for line in text.lines() {
            let indent = line.len() - line.trim_start_matches(' ').len();
            prop_assert_eq!(indent % STEP, 0, "{:?}", line);
            prop_assert!(!line.trim().is_empty(), "blank line in\n{}", text);
        }
        if !text.is_empty() {
            prop_assert!(text.ends_with('\n'));
        }
    }

    #[test]
    fn sentinel_matches_the_declared_type(d in var_decl()) {
        if let Decl::Var(ref v) = d {
            let is_struct_type = matches!(v.typ, Type::Struct(_));
            prop_assert_eq!(v.size == VarDecl::NOT_STRUCT, !is_struct_type);
            prop_assert_eq!(v.is_struct(), is_struct_type);
        }
    }
}
