//! Numeric coefficients of symbolic expressions
//!
//! Literals typed by the user are kept as exact rationals so closed-form roots
//! come out exact. Irrational constants and anything that overflows `i64`
//! falls back to `f64`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub(crate) fn gcd(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Coefficient {
    /// `num / den`, reduced, `den > 0`
    Rational(i64, i64),
    Float(f64),
}

impl Coefficient {
    pub const ZERO: Coefficient = Coefficient::Rational(0, 1);
    pub const ONE: Coefficient = Coefficient::Rational(1, 1);

    pub fn int(n: i64) -> Self {
        Coefficient::Rational(n, 1)
    }

    /// Reduced rational, or a float when the reduced form does not fit `i64`.
    pub fn rational(num: i64, den: i64) -> Self {
        Self::from_i128(num as i128, den as i128)
    }

    fn from_i128(num: i128, den: i128) -> Self {
        if den == 0 {
            return Coefficient::Float(match num.cmp(&0) {
                Ordering::Greater => f64::INFINITY,
                Ordering::Less => f64::NEG_INFINITY,
                Ordering::Equal => f64::NAN,
            });
        }
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den).max(1);
        let (n, d) = (sign * num / g, sign * den / g);
        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(n), Ok(d)) => Coefficient::Rational(n, d),
            _ => Coefficient::Float(n as f64 / d as f64),
        }
    }

    /// Integral floats become exact integers.
    pub fn float(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
            Coefficient::int(f as i64)
        } else {
            Coefficient::Float(f)
        }
    }

    /// Exact value of a decimal literal such as `2.50` or `1e-3`; falls back
    /// to `f64` when the digits do not fit.
    pub fn from_decimal_str(text: &str) -> Option<Self> {
        let approx: f64 = text.parse().ok()?;
        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(at) => (&text[..at], text[at + 1..].parse::<i32>().ok()?),
            None => (text, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let digits = format!("{int_part}{frac_part}");
        let scale = exponent - frac_part.len() as i32;
        let exact = digits.parse::<i128>().ok().and_then(|num| {
            if scale >= 0 {
                10i128
                    .checked_pow(scale as u32)
                    .and_then(|p| num.checked_mul(p))
                    .map(|n| (n, 1))
            } else {
                10i128.checked_pow((-scale) as u32).map(|d| (num, d))
            }
        });
        Some(match exact {
            Some((n, d)) => match Self::from_i128(n, d) {
                Coefficient::Float(_) => Coefficient::Float(approx),
                c => c,
            },
            None => Coefficient::float(approx),
        })
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Coefficient::Rational(..))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Coefficient::Rational(n, _) => *n == 0,
            Coefficient::Float(f) => *f == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Coefficient::Rational(1, 1))
    }

    pub fn is_negative(&self) -> bool {
        self.to_f64() < 0.0
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Coefficient::Rational(_, 1))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Coefficient::Rational(n, 1) => Some(*n),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Coefficient::Rational(n, d) => *n as f64 / *d as f64,
            Coefficient::Float(f) => *f,
        }
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            -*self
        } else {
            *self
        }
    }

    pub fn recip(&self) -> Self {
        Coefficient::ONE / *self
    }

    pub fn pow_int(&self, exp: i64) -> Self {
        if exp < 0 {
            return self.pow_int(-exp).recip();
        }
        match self {
            Coefficient::Rational(n, d) => {
                let Ok(e) = u32::try_from(exp) else {
                    return Coefficient::Float(self.to_f64().powf(exp as f64));
                };
                match ((*n as i128).checked_pow(e), (*d as i128).checked_pow(e)) {
                    (Some(n), Some(d)) => Self::from_i128(n, d),
                    _ => Coefficient::Float(self.to_f64().powi(e as i32)),
                }
            }
            Coefficient::Float(f) => Coefficient::Float(f.powf(exp as f64)),
        }
    }

    /// `self^exp`, exact for integer exponents.
    pub fn pow(&self, exp: &Coefficient) -> Self {
        match exp.as_integer() {
            Some(e) if e.abs() <= 1024 => self.pow_int(e),
            _ => Coefficient::float(self.to_f64().powf(exp.to_f64())),
        }
    }

    fn binary(self, rhs: Self, exact: impl Fn(i128, i128, i128, i128) -> Option<(i128, i128)>, approx: impl Fn(f64, f64) -> f64) -> Self {
        if let (Coefficient::Rational(a, b), Coefficient::Rational(c, d)) = (self, rhs) {
            if let Some((n, d)) = exact(a as i128, b as i128, c as i128, d as i128) {
                return Self::from_i128(n, d);
            }
        }
        Coefficient::float(approx(self.to_f64(), rhs.to_f64()))
    }
}

impl PartialEq for Coefficient {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Coefficient::Rational(a, b), Coefficient::Rational(c, d)) => a == c && b == d,
            (Coefficient::Float(x), Coefficient::Float(y)) => {
                x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())
            }
            _ => false,
        }
    }
}

impl Eq for Coefficient {}

impl std::hash::Hash for Coefficient {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Coefficient::Rational(n, d) => {
                state.write_u8(0);
                n.hash(state);
                d.hash(state);
            }
            Coefficient::Float(f) => {
                state.write_u8(1);
                f.to_bits().hash(state);
            }
        }
    }
}

impl PartialOrd for Coefficient {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coefficient {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_f64().total_cmp(&other.to_f64())
    }
}

impl Default for Coefficient {
    fn default() -> Self {
        Coefficient::ZERO
    }
}

impl From<i64> for Coefficient {
    fn from(n: i64) -> Self {
        Coefficient::int(n)
    }
}

impl From<f64> for Coefficient {
    fn from(f: f64) -> Self {
        Coefficient::float(f)
    }
}

impl Neg for Coefficient {
    type Output = Coefficient;

    fn neg(self) -> Self::Output {
        match self {
            Coefficient::Rational(n, d) => Self::from_i128(-(n as i128), d as i128),
            Coefficient::Float(f) => Coefficient::Float(-f),
        }
    }
}

impl Add for Coefficient {
    type Output = Coefficient;

    fn add(self, rhs: Self) -> Self::Output {
        self.binary(
            rhs,
            |a, b, c, d| Some((a.checked_mul(d)?.checked_add(c.checked_mul(b)?)?, b.checked_mul(d)?)),
            |x, y| x + y,
        )
    }
}

impl Sub for Coefficient {
    type Output = Coefficient;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Mul for Coefficient {
    type Output = Coefficient;

    fn mul(self, rhs: Self) -> Self::Output {
        self.binary(
            rhs,
            |a, b, c, d| Some((a.checked_mul(c)?, b.checked_mul(d)?)),
            |x, y| x * y,
        )
    }
}

impl Div for Coefficient {
    type Output = Coefficient;

    fn div(self, rhs: Self) -> Self::Output {
        self.binary(
            rhs,
            |a, b, c, d| Some((a.checked_mul(d)?, b.checked_mul(c)?)),
            |x, y| x / y,
        )
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coefficient::Rational(n, 1) => write!(f, "{n}"),
            Coefficient::Rational(n, d) => write!(f, "{n}/{d}"),
            Coefficient::Float(v) => f.write_str(&format_decimal(*v)),
        }
    }
}

/// Render a float with at most 12 significant fractional digits and no
/// trailing zeros. Negative zero prints as `0`.
pub fn format_decimal(v: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    let text = format!("{v:.12}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        t => t.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_arithmetic_stays_exact() {
        let a = Coefficient::rational(1, 2);
        let b = Coefficient::rational(1, 3);
        assert_eq!(a + b, Coefficient::rational(5, 6));
        assert_eq!(a - b, Coefficient::rational(1, 6));
        assert_eq!(a * b, Coefficient::rational(1, 6));
        assert_eq!(a / b, Coefficient::rational(3, 2));
        assert_eq!(Coefficient::rational(4, -6), Coefficient::rational(-2, 3));
    }

    #[test]
    fn powers() {
        let a = Coefficient::rational(2, 3);
        assert_eq!(a.pow_int(2), Coefficient::rational(4, 9));
        assert_eq!(a.pow_int(-1), Coefficient::rational(3, 2));
        assert_eq!(Coefficient::int(4).pow(&Coefficient::rational(1, 2)), Coefficient::int(2));
    }

    #[test]
    fn division_by_zero_is_non_finite() {
        let q = Coefficient::int(1) / Coefficient::ZERO;
        assert!(q.to_f64().is_infinite());
    }

    #[test]
    fn overflow_falls_back_to_float() {
        let big = Coefficient::int(i64::MAX);
        let sum = big + big;
        assert!(!sum.is_exact());
        assert!((sum.to_f64() - 2.0 * i64::MAX as f64).abs() < 1e4);
    }

    #[test]
    fn decimal_literals_are_exact() {
        assert_eq!(Coefficient::from_decimal_str("2.5"), Some(Coefficient::rational(5, 2)));
        assert_eq!(Coefficient::from_decimal_str("0.1"), Some(Coefficient::rational(1, 10)));
        assert_eq!(Coefficient::from_decimal_str("1e3"), Some(Coefficient::int(1000)));
        assert_eq!(Coefficient::from_decimal_str(".25"), Some(Coefficient::rational(1, 4)));
        assert_eq!(Coefficient::from_decimal_str("2.5E-2"), Some(Coefficient::rational(1, 40)));
        assert_eq!(Coefficient::from_decimal_str("x"), None);
    }

    #[test]
    fn decimal_formatting() {
        assert_eq!(format_decimal(3.0), "3");
        assert_eq!(format_decimal(std::f64::consts::PI), "3.14159265359");
        assert_eq!(format_decimal(-1e-17), "0");
        assert_eq!(format_decimal(-0.5), "-0.5");
    }
}
