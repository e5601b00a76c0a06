//! Univariate polynomials and rational functions over [`Coefficient`].

use graphcalc_eval::{compile_expr, EvalOptions, SampleValue};

use crate::coeff::Coefficient;
use crate::expr::{SymExpr, SymExprKind};
use crate::lower::to_expr;
use crate::numeric::Budget;

/// Largest numerator or denominator degree [`as_rational`] will build.
/// Higher-degree residuals are left to the numeric scan.
pub const MAX_DEGREE: usize = 64;

/// Coefficients in ascending order: `coeffs[i]` multiplies `x^i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    coeffs: Vec<Coefficient>,
}

impl Polynomial {
    pub fn new(coeffs: Vec<Coefficient>) -> Self {
        let mut p = Polynomial { coeffs };
        p.trim();
        p
    }

    pub fn constant(c: Coefficient) -> Self {
        Self::new(vec![c])
    }

    pub fn x() -> Self {
        Self::new(vec![Coefficient::ZERO, Coefficient::ONE])
    }

    fn trim(&mut self) {
        while self.coeffs.last().is_some_and(|c| c.is_zero()) {
            self.coeffs.pop();
        }
    }

    pub fn coeffs(&self) -> &[Coefficient] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree; the zero polynomial reports 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn leading(&self) -> Coefficient {
        self.coeffs.last().copied().unwrap_or(Coefficient::ZERO)
    }

    pub fn is_exact(&self) -> bool {
        self.coeffs.iter().all(Coefficient::is_exact)
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(other.coeffs.len());
        let at = |p: &Polynomial, i: usize| p.coeffs.get(i).copied().unwrap_or(Coefficient::ZERO);
        Polynomial::new((0..n).map(|i| at(self, i) + at(other, i)).collect())
    }

    pub fn neg(&self) -> Polynomial {
        Polynomial::new(self.coeffs.iter().map(|c| -*c).collect())
    }

    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::new(Vec::new());
        }
        let mut out = vec![Coefficient::ZERO; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] = out[i + j] + *a * *b;
            }
        }
        Polynomial::new(out)
    }

    pub fn scale(&self, c: Coefficient) -> Polynomial {
        Polynomial::new(self.coeffs.iter().map(|a| *a * c).collect())
    }

    /// Product under [`MAX_DEGREE`], charged one budget step.
    fn bounded_mul(&self, other: &Polynomial, budget: &mut Budget) -> Option<Polynomial> {
        if self.degree() + other.degree() > MAX_DEGREE || !budget.tick() {
            return None;
        }
        Some(self.mul(other))
    }

    /// `self^n` by repeated squaring, under [`MAX_DEGREE`].
    fn bounded_pow(&self, n: u64, budget: &mut Budget) -> Option<Polynomial> {
        if (self.degree() as u64).checked_mul(n)? > MAX_DEGREE as u64 {
            return None;
        }
        let mut acc = Polynomial::constant(Coefficient::ONE);
        let mut base = self.clone();
        let mut n = n;
        while n > 0 {
            if n & 1 == 1 {
                acc = acc.bounded_mul(&base, budget)?;
            }
            n >>= 1;
            if n > 0 {
                base = base.bounded_mul(&base, budget)?;
            }
        }
        Some(acc)
    }

    pub fn derivative(&self) -> Polynomial {
        Polynomial::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| *c * Coefficient::int(i as i64))
                .collect(),
        )
    }

    /// Horner evaluation in exact arithmetic.
    pub fn eval_exact(&self, x: Coefficient) -> Coefficient {
        self.coeffs
            .iter()
            .rev()
            .fold(Coefficient::ZERO, |acc, c| acc * x + *c)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c.to_f64())
    }

    /// Scale used to judge whether `eval(x)` is numerically zero.
    pub fn magnitude_at(&self, x: f64) -> f64 {
        let ax = x.abs().max(1.0);
        self.coeffs
            .iter()
            .enumerate()
            .map(|(i, c)| c.to_f64().abs() * ax.powi(i as i32))
            .sum::<f64>()
            .max(f64::MIN_POSITIVE)
    }

    pub fn vanishes_at(&self, x: f64, exact: Option<Coefficient>) -> bool {
        if let (Some(r), true) = (exact, self.is_exact()) {
            return self.eval_exact(r).is_zero();
        }
        self.eval(x).abs() <= 1e-9 * self.magnitude_at(x)
    }

    /// Divide by `(x - r)`, discarding the remainder.
    pub fn deflate(&self, r: Coefficient) -> Polynomial {
        let n = self.coeffs.len();
        if n < 2 {
            return Polynomial::new(Vec::new());
        }
        let mut quotient = vec![Coefficient::ZERO; n - 1];
        let mut carry = Coefficient::ZERO;
        for i in (1..n).rev() {
            carry = self.coeffs[i] + carry * r;
            quotient[i - 1] = carry;
        }
        Polynomial::new(quotient)
    }

    /// Multiplicity of `x` as a root, judged numerically through successive
    /// derivatives.
    pub fn multiplicity(&self, x: f64, exact: Option<Coefficient>) -> usize {
        let mut p = self.clone();
        let mut m = 0;
        while !p.is_zero() && p.vanishes_at(x, exact) {
            m += 1;
            p = p.derivative();
        }
        m
    }
}

/// `num / den` with a non-zero denominator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalFunction {
    pub num: Polynomial,
    pub den: Polynomial,
}

impl RationalFunction {
    fn poly(p: Polynomial) -> Self {
        RationalFunction {
            num: p,
            den: Polynomial::constant(Coefficient::ONE),
        }
    }

    fn add(&self, o: &RationalFunction, budget: &mut Budget) -> Option<RationalFunction> {
        if self.den == o.den {
            return Some(RationalFunction {
                num: self.num.add(&o.num),
                den: self.den.clone(),
            });
        }
        Some(RationalFunction {
            num: self
                .num
                .bounded_mul(&o.den, budget)?
                .add(&o.num.bounded_mul(&self.den, budget)?),
            den: self.den.bounded_mul(&o.den, budget)?,
        })
    }

    fn mul(&self, o: &RationalFunction, budget: &mut Budget) -> Option<RationalFunction> {
        Some(RationalFunction {
            num: self.num.bounded_mul(&o.num, budget)?,
            den: self.den.bounded_mul(&o.den, budget)?,
        })
    }

    fn pow(&self, n: u64, budget: &mut Budget) -> Option<RationalFunction> {
        Some(RationalFunction {
            num: self.num.bounded_pow(n, budget)?,
            den: self.den.bounded_pow(n, budget)?,
        })
    }

    fn recip(&self) -> Option<RationalFunction> {
        if self.num.is_zero() {
            return None;
        }
        Some(RationalFunction {
            num: self.den.clone(),
            den: self.num.clone(),
        })
    }

    fn neg(&self) -> RationalFunction {
        RationalFunction {
            num: self.num.neg(),
            den: self.den.clone(),
        }
    }

    /// Make the denominator monic so coefficients stay small.
    fn normalized(self) -> RationalFunction {
        let lead = self.den.leading();
        if lead.is_zero() || lead.is_one() {
            return self;
        }
        let inv = lead.recip();
        RationalFunction {
            num: self.num.scale(inv),
            den: self.den.scale(inv),
        }
    }

    pub fn is_polynomial(&self) -> bool {
        self.den.degree() == 0
    }
}

/// Numeric value of a variable-free expression, when it is real.
/// Trigonometric subterms follow `options.angle_unit`.
fn constant_value(e: &SymExpr, options: &EvalOptions) -> Option<Coefficient> {
    if let Some(c) = e.as_coeff() {
        return Some(*c);
    }
    // Any variable name works here since the expression mentions none.
    let program = compile_expr(&to_expr(e), "x").ok()?;
    match program.eval(0.0, options) {
        SampleValue::Real(v) => Some(Coefficient::float(v)),
        _ => None,
    }
}

/// View `e` as a rational function of `var`, if it is one of degree at most
/// [`MAX_DEGREE`]. Every polynomial product is charged to `budget`; `None`
/// also covers running out of it.
pub fn as_rational(
    e: &SymExpr,
    var: &str,
    options: &EvalOptions,
    budget: &mut Budget,
) -> Option<RationalFunction> {
    if !e.mentions(var) {
        return constant_value(e, options).map(|c| RationalFunction::poly(Polynomial::constant(c)));
    }
    let rf = match e.kind.as_ref() {
        SymExprKind::Var(_) => RationalFunction::poly(Polynomial::x()),
        SymExprKind::Neg(inner) => as_rational(inner, var, options, budget)?.neg(),
        SymExprKind::Add(terms) => {
            let mut acc = RationalFunction::poly(Polynomial::new(Vec::new()));
            for t in terms {
                acc = acc.add(&as_rational(t, var, options, budget)?, budget)?;
            }
            acc
        }
        SymExprKind::Mul(factors) => {
            let mut acc = RationalFunction::poly(Polynomial::constant(Coefficient::ONE));
            for f in factors {
                acc = acc.mul(&as_rational(f, var, options, budget)?, budget)?;
            }
            acc
        }
        SymExprKind::Pow(base, exp) => {
            if exp.mentions(var) {
                return None;
            }
            let n = constant_value(exp, options)?.as_integer()?;
            let raised = as_rational(base, var, options, budget)?.pow(n.unsigned_abs(), budget)?;
            if n < 0 {
                raised.recip()?
            } else {
                raised
            }
        }
        SymExprKind::Num(_) | SymExprKind::Const(_) | SymExprKind::Func(..) => return None,
    };
    Some(rf.normalized())
}
