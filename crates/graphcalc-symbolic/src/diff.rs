//! Symbolic differentiation
//!
//! Results are not simplified; run them through a [`StagedNormalizer`]
//! before printing or solving.
//!
//! [`StagedNormalizer`]: crate::normalize::StagedNormalizer

use graphcalc_parser::{Constant, Function};

use crate::coeff::Coefficient;
use crate::expr::{SymExpr, SymExprKind};

/// `d e / d var`, or `None` when `e` calls a function with no closed-form
/// derivative (`gamma`, `beta`, `factorial`) on an argument that depends on
/// `var`.
pub fn derivative(e: &SymExpr, var: &str) -> Option<SymExpr> {
    if !e.mentions(var) {
        return Some(SymExpr::int(0));
    }
    Some(match e.kind.as_ref() {
        SymExprKind::Num(_) | SymExprKind::Const(_) => SymExpr::int(0),
        SymExprKind::Var(_) => SymExpr::int(1),
        SymExprKind::Neg(inner) => SymExpr::neg(derivative(inner, var)?),
        SymExprKind::Add(terms) => SymExpr::add(
            terms
                .iter()
                .map(|t| derivative(t, var))
                .collect::<Option<Vec<_>>>()?,
        ),
        SymExprKind::Mul(factors) => {
            let mut terms = Vec::with_capacity(factors.len());
            for (i, f) in factors.iter().enumerate() {
                if !f.mentions(var) {
                    continue;
                }
                let mut product = factors.clone();
                product[i] = derivative(f, var)?;
                terms.push(SymExpr::mul(product));
            }
            SymExpr::add(terms)
        }
        SymExprKind::Pow(base, exp) => power_rule(base, exp, var)?,
        SymExprKind::Func(f, args) => chain_rule(*f, args, var)?,
    })
}

fn power_rule(base: &SymExpr, exp: &SymExpr, var: &str) -> Option<SymExpr> {
    let db = derivative(base, var)?;
    if !exp.mentions(var) {
        // n * b^(n-1) * b'
        let lowered = match exp.as_coeff() {
            Some(c) => SymExpr::num(*c - Coefficient::ONE),
            None => exp.clone() - SymExpr::int(1),
        };
        return Some(SymExpr::mul(vec![
            exp.clone(),
            SymExpr::pow(base.clone(), lowered),
            db,
        ]));
    }
    let de = derivative(exp, var)?;
    let ln_base = SymExpr::call(Function::Ln, base.clone());
    let whole = SymExpr::pow(base.clone(), exp.clone());
    if !base.mentions(var) {
        return Some(SymExpr::mul(vec![whole, ln_base, de]));
    }
    // b^e * (e' ln b + e b' / b)
    Some(
        whole
            * SymExpr::add(vec![
                de * ln_base,
                SymExpr::mul(vec![exp.clone(), db, base.clone().recip()]),
            ]),
    )
}

fn chain_rule(f: Function, args: &[SymExpr], var: &str) -> Option<SymExpr> {
    let u = args.first()?.clone();
    if f == Function::Log && args.len() == 2 {
        let rewritten = SymExpr::call(Function::Ln, u)
            * SymExpr::call(Function::Ln, args[1].clone()).recip();
        return derivative(&rewritten, var);
    }
    let du = derivative(&u, var)?;
    let call = |g: Function| SymExpr::call(g, u.clone());
    let sq = |e: SymExpr| SymExpr::pow(e, SymExpr::int(2));
    let one_minus_u2 = SymExpr::int(1) - sq(u.clone());
    let outer = match f {
        Function::Sin => call(Function::Cos),
        Function::Cos => -call(Function::Sin),
        Function::Tan => sq(call(Function::Sec)),
        Function::Sec => call(Function::Sec) * call(Function::Tan),
        Function::Csc => -(call(Function::Csc) * call(Function::Cot)),
        Function::Cot => -sq(call(Function::Csc)),
        Function::Asin => SymExpr::pow(one_minus_u2, SymExpr::rational(-1, 2)),
        Function::Acos => -SymExpr::pow(one_minus_u2, SymExpr::rational(-1, 2)),
        Function::Atan => (SymExpr::int(1) + sq(u.clone())).recip(),
        Function::Sinh => call(Function::Cosh),
        Function::Cosh => call(Function::Sinh),
        Function::Tanh => SymExpr::int(1) - sq(call(Function::Tanh)),
        Function::Ln | Function::Log => u.clone().recip(),
        Function::Sqrt => SymExpr::rational(1, 2) * call(Function::Sqrt).recip(),
        Function::Exp => call(Function::Exp),
        // d|u| = u / |u|, undefined at 0
        Function::Abs => u.clone() * call(Function::Abs).recip(),
        Function::Erf => erf_kernel(&u),
        Function::Erfc => -erf_kernel(&u),
        Function::Gamma | Function::Beta | Function::Factorial => return None,
    };
    Some(outer * du)
}

/// `2/sqrt(pi) * exp(-u^2)`
fn erf_kernel(u: &SymExpr) -> SymExpr {
    SymExpr::mul(vec![
        SymExpr::int(2),
        SymExpr::pow(SymExpr::constant(Constant::Pi), SymExpr::rational(-1, 2)),
        SymExpr::call(
            Function::Exp,
            -SymExpr::pow(u.clone(), SymExpr::int(2)),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower;
    use crate::normalize::StagedNormalizer;
    use graphcalc_eval::{compile_expr, EvalOptions};
    use graphcalc_parser::parse;

    fn d(src: &str) -> Option<SymExpr> {
        let tree = parse(src, "x").unwrap();
        let e = lower(tree.lhs()).unwrap();
        derivative(&e, "x").map(|d| StagedNormalizer::default().normalize(d))
    }

    fn numeric_check(src: &str, at: f64) {
        let tree = parse(src, "x").unwrap();
        let f = compile_expr(tree.lhs(), "x").unwrap();
        let df = compile_expr(&crate::lower::to_expr(&d(src).unwrap()), "x").unwrap();
        let opts = EvalOptions::default();
        let h = 1e-6;
        let expected = (f.eval(at + h, &opts).to_f64() - f.eval(at - h, &opts).to_f64()) / (2.0 * h);
        let got = df.eval(at, &opts).to_f64();
        assert!(
            (got - expected).abs() < 1e-5 * (1.0 + expected.abs()),
            "{src}: {got} vs {expected}"
        );
    }

    #[test]
    fn polynomial_derivative_is_canonical() {
        assert_eq!(d("x^3 - 3x").unwrap().to_string(), "3*x^2 - 3");
        assert_eq!(d("5").unwrap().to_string(), "0");
    }

    #[test]
    fn chain_rule_matches_finite_differences() {
        for src in [
            "sin(2x)",
            "cos(x^2)",
            "tan(x)",
            "sec(x)",
            "csc(x)",
            "cot(x)",
            "asin(x/2)",
            "acos(x/2)",
            "atan(x)",
            "sinh(x)",
            "cosh(x)",
            "tanh(x)",
            "ln(x)",
            "log(x, 2)",
            "sqrt(x)",
            "exp(-x)",
            "abs(x)",
            "erf(x)",
            "erfc(x)",
            "x^x",
            "2^x",
            "1/(x-2)",
        ] {
            numeric_check(src, 0.7);
        }
    }

    #[test]
    fn special_functions_without_closed_form() {
        assert!(d("gamma(x)").is_none());
        assert!(d("factorial(x)").is_none());
        assert!(d("beta(x, 2)").is_none());
        assert_eq!(d("gamma(3)").unwrap().to_string(), "0");
    }
}
