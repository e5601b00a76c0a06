//! Real roots of a univariate polynomial.
//!
//! Exact polynomials go through rational-root search with deflation, then
//! closed forms for what is left of degree two or less. A leftover cubic is
//! solved with Cardano's formula (the trigonometric form when it has three
//! real roots). Anything else falls back to the eigenvalues of the companion
//! matrix. Numeric roots are polished with Newton steps and dropped unless
//! the polynomial actually vanishes there.

use nalgebra::DMatrix;
use num_complex::Complex64;
use tracing::debug;

use crate::coeff::{format_decimal, gcd, Coefficient};
use crate::numeric::Budget;
use crate::poly::Polynomial;

// Rational-root search and surd extraction give up above these magnitudes
const MAX_FACTOR: i128 = 10_000_000_000;
const MAX_SURD: i128 = 1_000_000_000_000;
const IMAG_ZERO_TOL: f64 = 1e-7;
const DEDUP_TOL: f64 = 1e-7;
// Multiple of the Horner rounding bound a residual may reach
const RESIDUAL_SLACK: f64 = 4.0;
// QR sweeps allowed per companion-matrix row
const SCHUR_SWEEPS_PER_ROW: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct PolyRoot {
    /// Display form: a rational, a surd such as `1/2 - sqrt(5)/2`, or a
    /// decimal for roots found numerically.
    pub exact: String,
    pub approx: f64,
    /// Exact value when the root is rational.
    pub value: Option<Coefficient>,
}

impl PolyRoot {
    pub fn rational(c: Coefficient) -> Self {
        if !c.is_exact() {
            return Self::numeric(c.to_f64());
        }
        PolyRoot {
            exact: c.to_string(),
            approx: c.to_f64(),
            value: Some(c),
        }
    }

    pub fn numeric(x: f64) -> Self {
        let x = if x.abs() < 1e-12 { 0.0 } else { x };
        PolyRoot {
            exact: format_decimal(x),
            approx: x,
            value: None,
        }
    }

    fn surd(exact: String, approx: f64) -> Self {
        PolyRoot {
            exact,
            approx,
            value: None,
        }
    }

    /// Whether the root is known in closed form rather than approximated.
    pub fn is_exact(&self) -> bool {
        self.rank() > 0
    }

    /// Preference when two roots coincide: rational, then surd, then decimal.
    fn rank(&self) -> u8 {
        match self.value {
            Some(_) => 2,
            None if self.exact != format_decimal(self.approx) => 1,
            None => 0,
        }
    }
}

/// Distinct real roots of `p`, ascending. The zero polynomial and non-zero
/// constants have none. Search steps are charged to `budget`; `None` means
/// it ran out.
pub fn real_roots(p: &Polynomial, budget: &mut Budget) -> Option<Vec<PolyRoot>> {
    let mut roots = Vec::new();
    if p.is_zero() {
        return Some(roots);
    }
    let zeros = p.coeffs().iter().take_while(|c| c.is_zero()).count();
    let mut rest = if zeros > 0 {
        roots.push(PolyRoot::rational(Coefficient::ZERO));
        Polynomial::new(p.coeffs()[zeros..].to_vec())
    } else {
        p.clone()
    };
    if rest.is_exact() {
        rest = rational_roots(rest, &mut roots, budget)?;
    }
    match rest.degree() {
        0 => {}
        1 => roots.push(linear_root(&rest)),
        2 => roots.extend(quadratic_roots(&rest)),
        3 => roots.extend(cubic_roots(&rest).into_iter().map(PolyRoot::numeric)),
        _ => {
            if !budget.tick() {
                return None;
            }
            roots.extend(companion_roots(&rest).into_iter().map(PolyRoot::numeric));
        }
    }
    Some(sort_and_dedup(roots))
}

pub(crate) fn sort_and_dedup(mut roots: Vec<PolyRoot>) -> Vec<PolyRoot> {
    roots.sort_by(|a, b| a.approx.total_cmp(&b.approx));
    let mut out: Vec<PolyRoot> = Vec::with_capacity(roots.len());
    for root in roots {
        match out.last_mut() {
            Some(last) if (last.approx - root.approx).abs() <= DEDUP_TOL * (1.0 + last.approx.abs()) => {
                if root.rank() > last.rank() {
                    *last = root;
                }
            }
            _ => out.push(root),
        }
    }
    out
}

fn linear_root(p: &Polynomial) -> PolyRoot {
    let c = p.coeffs();
    PolyRoot::rational(-c[0] / c[1])
}

/// Multiply through by the common denominator and divide out the content.
fn integer_coefficients(p: &Polynomial) -> Option<Vec<i128>> {
    let mut lcm: i128 = 1;
    for c in p.coeffs() {
        let Coefficient::Rational(_, d) = c else {
            return None;
        };
        let d = *d as i128;
        lcm = lcm.checked_mul(d / gcd(lcm, d))?;
    }
    let ints = p
        .coeffs()
        .iter()
        .map(|c| match c {
            Coefficient::Rational(n, d) => (*n as i128).checked_mul(lcm / *d as i128),
            Coefficient::Float(_) => None,
        })
        .collect::<Option<Vec<_>>>()?;
    let content = ints.iter().fold(0, |g, &n| gcd(g, n)).max(1);
    Some(ints.into_iter().map(|n| n / content).collect())
}

fn divisors(n: i128) -> Vec<i128> {
    let n = n.abs();
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = 1;
    while d * d <= n {
        if n % d == 0 {
            small.push(d);
            if d * d != n {
                large.push(n / d);
            }
        }
        d += 1;
    }
    small.extend(large.into_iter().rev());
    small
}

/// Strip every rational root while the degree is above two, returning the
/// deflated remainder.
fn rational_roots(mut p: Polynomial, roots: &mut Vec<PolyRoot>, budget: &mut Budget) -> Option<Polynomial> {
    while p.degree() > 2 {
        let Some(ints) = integer_coefficients(&p) else {
            break;
        };
        let (a0, an) = (ints[0], ints[ints.len() - 1]);
        if a0.abs() > MAX_FACTOR || an.abs() > MAX_FACTOR {
            break;
        }
        let dens = divisors(an);
        let mut found = None;
        let candidates = divisors(a0).into_iter().flat_map(|num| {
            dens.iter()
                .flat_map(move |&den| [(num, den), (-num, den)])
        });
        for (num, den) in candidates {
            if !budget.tick() {
                return None;
            }
            let c = Coefficient::rational(num as i64, den as i64);
            if p.eval_exact(c).is_zero() {
                found = Some(c);
                break;
            }
        }
        let Some(r) = found else {
            break;
        };
        debug!(root = %r, degree = p.degree(), "rational root");
        roots.push(PolyRoot::rational(r));
        while p.degree() > 0 && p.eval_exact(r).is_zero() {
            if !budget.tick() {
                return None;
            }
            p = p.deflate(r);
        }
    }
    Some(p)
}

/// Split `m > 0` as `s^2 * r` with `r` square-free.
fn square_part(mut m: i128) -> (i128, i128) {
    let (mut s, mut r) = (1, 1);
    let mut f = 2;
    while f * f <= m {
        let mut e = 0;
        while m % f == 0 {
            m /= f;
            e += 1;
        }
        s *= f.pow(e / 2);
        if e % 2 == 1 {
            r *= f;
        }
        f += 1;
    }
    (s, r * m)
}

fn quadratic_roots(p: &Polynomial) -> Vec<PolyRoot> {
    let c = p.coeffs();
    let (a, b, k) = (c[2], c[1], c[0]);
    if p.is_exact() {
        if let Some(roots) = exact_quadratic(a, b, k) {
            return roots;
        }
    }
    let (a, b, k) = (a.to_f64(), b.to_f64(), k.to_f64());
    let disc = b * b - 4.0 * a * k;
    let tol = 1e-12 * (b * b + (4.0 * a * k).abs());
    if disc < -tol {
        return Vec::new();
    }
    if disc.abs() <= tol {
        return vec![PolyRoot::numeric(-b / (2.0 * a))];
    }
    // Avoid cancellation between -b and sqrt(disc).
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    let q = if q == 0.0 { -0.5 * disc.sqrt() } else { q };
    let mut roots = vec![PolyRoot::numeric(q / a)];
    if q != 0.0 {
        roots.push(PolyRoot::numeric(k / q));
    }
    roots
}

fn exact_quadratic(a: Coefficient, b: Coefficient, k: Coefficient) -> Option<Vec<PolyRoot>> {
    let two_a = Coefficient::int(2) * a;
    let vertex = -b / two_a;
    let disc = b * b - Coefficient::int(4) * a * k;
    let Coefficient::Rational(n, d) = disc else {
        return None;
    };
    if !vertex.is_exact() {
        return None;
    }
    if n < 0 {
        return Some(Vec::new());
    }
    if n == 0 {
        return Some(vec![PolyRoot::rational(vertex)]);
    }
    let m = (n as i128).checked_mul(d as i128)?;
    if m > MAX_SURD {
        return None;
    }
    // sqrt(n/d) = s*sqrt(r)/d
    let (s, r) = square_part(m);
    let half_width = Coefficient::int(i64::try_from(s).ok()?) / (Coefficient::int(d) * two_a.abs());
    if r == 1 {
        return Some(vec![
            PolyRoot::rational(vertex - half_width),
            PolyRoot::rational(vertex + half_width),
        ]);
    }
    let Coefficient::Rational(qn, qd) = half_width else {
        return None;
    };
    let mut term = if qn == 1 {
        format!("sqrt({r})")
    } else {
        format!("{qn}*sqrt({r})")
    };
    if qd != 1 {
        term.push_str(&format!("/{qd}"));
    }
    let offset = half_width.to_f64() * (r as f64).sqrt();
    let v = vertex.to_f64();
    let (lo, hi) = if vertex.is_zero() {
        (format!("-{term}"), term)
    } else {
        (format!("{vertex} - {term}"), format!("{vertex} + {term}"))
    };
    Some(vec![
        PolyRoot::surd(lo, v - offset),
        PolyRoot::surd(hi, v + offset),
    ])
}

/// Real roots of a cubic by Cardano's method.
fn cubic_roots(p: &Polynomial) -> Vec<f64> {
    let c: Vec<f64> = p.coeffs().iter().map(Coefficient::to_f64).collect();
    let (a, b, d) = (c[2] / c[3], c[1] / c[3], c[0] / c[3]);
    // x = t - a/3 turns x^3 + a x^2 + b x + d into t^3 + pt + q
    let shift = a / 3.0;
    let depressed_p = b - a * a / 3.0;
    let depressed_q = 2.0 * a * a * a / 27.0 - a * b / 3.0 + d;
    let disc = (depressed_q / 2.0).powi(2) + (depressed_p / 3.0).powi(3);

    let ts: Vec<f64> = if depressed_p == 0.0 && depressed_q == 0.0 {
        vec![0.0]
    } else if disc > 0.0 {
        let sq = disc.sqrt();
        vec![(-depressed_q / 2.0 + sq).cbrt() + (-depressed_q / 2.0 - sq).cbrt()]
    } else {
        let r = 2.0 * (-depressed_p / 3.0).sqrt();
        let arg = 3.0 * depressed_q / (2.0 * depressed_p) * (-3.0 / depressed_p).sqrt();
        let phi = arg.clamp(-1.0, 1.0).acos() / 3.0;
        (0..3)
            .map(|k| r * (phi - 2.0 * std::f64::consts::PI * k as f64 / 3.0).cos())
            .collect()
    };

    let dp = p.derivative();
    ts.into_iter()
        .map(|t| t - shift)
        .filter(|x| x.is_finite())
        .filter_map(|x| refine(p, &dp, x))
        .collect()
}

/// Real eigenvalues of the companion matrix.
fn companion_roots(p: &Polynomial) -> Vec<f64> {
    // Descending order, leading coefficient first.
    let coeffs: Vec<Complex64> = p
        .coeffs()
        .iter()
        .rev()
        .map(|c| Complex64::new(c.to_f64(), 0.0))
        .collect();
    let degree = coeffs.len() - 1;
    let leading = coeffs[0];
    let mut companion = DMatrix::<Complex64>::zeros(degree, degree);
    for row in 1..degree {
        companion[(row, row - 1)] = Complex64::new(1.0, 0.0);
    }
    for (idx, coeff) in coeffs.iter().enumerate().skip(1) {
        companion[(0, idx - 1)] = -(*coeff) / leading;
    }
    let Some(eigenvalues) = companion
        .try_schur(f64::EPSILON, SCHUR_SWEEPS_PER_ROW * degree)
        .and_then(|schur| schur.eigenvalues())
    else {
        debug!(degree, "companion matrix eigenvalues did not converge");
        return Vec::new();
    };
    let dp = p.derivative();
    eigenvalues
        .iter()
        .filter(|z| z.re.is_finite() && z.im.abs() <= IMAG_ZERO_TOL * (1.0 + z.re.abs()))
        .filter_map(|z| refine(p, &dp, z.re))
        .collect()
}

/// Polish `x0` and keep it only if `p` vanishes there to working precision.
fn refine(p: &Polynomial, dp: &Polynomial, x0: f64) -> Option<f64> {
    let x = polish(p, dp, x0);
    let rounding = (p.degree() + 1) as f64 * f64::EPSILON * p.magnitude_at(x);
    if p.eval(x).abs() <= RESIDUAL_SLACK * rounding {
        Some(x)
    } else {
        debug!(candidate = x, residual = p.eval(x), "residual does not vanish, candidate dropped");
        None
    }
}

fn polish(p: &Polynomial, dp: &Polynomial, x0: f64) -> f64 {
    let mut x = x0;
    for _ in 0..16 {
        let slope = dp.eval(x);
        if slope == 0.0 {
            break;
        }
        let step = p.eval(x) / slope;
        if !step.is_finite() {
            break;
        }
        x -= step;
        if step.abs() <= 1e-15 * (1.0 + x.abs()) {
            break;
        }
    }
    if p.eval(x).abs() <= p.eval(x0).abs() {
        x
    } else {
        x0
    }
}
