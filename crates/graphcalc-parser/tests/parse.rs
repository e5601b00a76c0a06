use graphcalc_parser::{parse, BinOp, Constant, Expr, Function, TreeKind, UnOp};

fn num(s: &str) -> Box<Expr> {
    Box::new(Expr::Number(s.into()))
}

fn var() -> Box<Expr> {
    Box::new(Expr::Var("x".into()))
}

#[test]
fn implicit_multiplication_matches_explicit() {
    let implicit = parse("2x", "x").unwrap();
    let explicit = parse("2*x", "x").unwrap();
    assert_eq!(implicit, explicit);
    assert_eq!(
        implicit.kind,
        TreeKind::Expression(Expr::Binary(num("2"), BinOp::Mul, var()))
    );
}

#[test]
fn implicit_multiplication_forms() {
    assert_eq!(parse("2(x+1)", "x").unwrap(), parse("2*(x+1)", "x").unwrap());
    assert_eq!(
        parse("(x+1)(x-1)", "x").unwrap(),
        parse("(x+1)*(x-1)", "x").unwrap()
    );
    assert_eq!(parse("2 sin(x)", "x").unwrap(), parse("2*sin(x)", "x").unwrap());
    assert_eq!(parse("x pi", "x").unwrap(), parse("x*pi", "x").unwrap());
}

#[test]
fn implicit_operand_binds_its_own_power() {
    assert_eq!(parse("2x^2", "x").unwrap(), parse("2*(x^2)", "x").unwrap());
}

#[test]
fn caret_and_double_star_are_the_same_operator() {
    assert_eq!(parse("x^2", "x").unwrap(), parse("x**2", "x").unwrap());
}

#[test]
fn power_is_right_associative() {
    let tree = parse("x^2^3", "x").unwrap();
    assert_eq!(
        tree.kind,
        TreeKind::Expression(Expr::Binary(
            var(),
            BinOp::Pow,
            Box::new(Expr::Binary(num("2"), BinOp::Pow, num("3")))
        ))
    );
}

#[test]
fn power_binds_tighter_than_unary_minus() {
    let tree = parse("-x^2", "x").unwrap();
    assert_eq!(
        tree.kind,
        TreeKind::Expression(Expr::Unary(
            UnOp::Minus,
            Box::new(Expr::Binary(var(), BinOp::Pow, num("2")))
        ))
    );
}

#[test]
fn equation_splits_into_sides() {
    let tree = parse("3*x+1 = 2*x+8", "x").unwrap();
    assert!(tree.is_equation());
    assert_eq!(tree.lhs(), parse("3*x+1", "x").unwrap().lhs());
    assert_eq!(tree.rhs(), parse("2*x+8", "x").unwrap().expression());
}

#[test]
fn functions_and_constants_resolve_through_the_table() {
    let tree = parse("log(x, 2) + golden", "x").unwrap();
    assert_eq!(
        tree.kind,
        TreeKind::Expression(Expr::Binary(
            Box::new(Expr::Call(Function::Log, vec![Expr::Var("x".into()), Expr::Number("2".into())])),
            BinOp::Add,
            Box::new(Expr::Const(Constant::Golden))
        ))
    );
}

#[test]
fn other_variable_names_are_supported() {
    let tree = parse("sin(t) + t", "t").unwrap();
    assert_eq!(tree.variable, "t");
    assert!(parse("sin(x)", "t").is_err());
}

#[test]
fn parsing_is_deterministic() {
    let a = parse("sqrt(x)/(1+x^2)", "x").unwrap();
    let b = parse("sqrt(x)/(1+x^2)", "x").unwrap();
    assert_eq!(a, b);
}

#[test]
fn tree_serializes_with_serde() {
    let tree = parse("abs(x) = 1", "x").unwrap();
    let json = serde_json::to_string(&tree).unwrap();
    let back: graphcalc_parser::ExpressionTree = serde_json::from_str(&json).unwrap();
    assert_eq!(tree, back);
}

#[test]
fn float_literals_render_back_into_the_grammar() {
    for v in [2.5, -0.125, 1e300, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
        let rendered = Expr::number(v).to_string();
        let tree = parse(&rendered, "x").unwrap_or_else(|e| panic!("{rendered}: {e}"));
        assert_eq!(tree.kind, TreeKind::Expression(Expr::number(v)), "{rendered}");
    }
    assert_eq!(Expr::number(f64::NAN).to_string(), "inf - inf");
}
