use graphcalc_parser::Function;
use num_complex::Complex64;
use std::f64::consts::PI;

use crate::compiler::{Op, Program};
use crate::special;
use crate::{AngleUnit, EvalOptions};

const NAN: Complex64 = Complex64::new(f64::NAN, 0.0);

fn real(v: f64) -> Complex64 {
    Complex64::new(v, 0.0)
}

fn as_real(v: Complex64) -> Option<f64> {
    (v.im == 0.0).then_some(v.re)
}

impl Program {
    /// Run the program for one sample. Never fails: domain errors and
    /// singularities come back as NaN or infinities.
    pub fn run(&self, x: f64, opts: &EvalOptions) -> Complex64 {
        let mut stack: Vec<Complex64> = Vec::with_capacity(self.max_stack);
        // Balanced by construction in the compiler; an empty pop reads as NaN.
        let pop = |stack: &mut Vec<Complex64>| stack.pop().unwrap_or(NAN);

        for op in &self.ops {
            let value = match *op {
                Op::PushConst(idx) => self.constants.get(idx).copied().map(real).unwrap_or(NAN),
                Op::LoadVar => real(x),
                Op::Neg => -pop(&mut stack),
                Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Pow => {
                    let b = pop(&mut stack);
                    let a = pop(&mut stack);
                    binary(*op, a, b)
                }
                Op::Call(func, argc) => {
                    let mut args = [NAN; 2];
                    for slot in args[..argc.min(2)].iter_mut().rev() {
                        *slot = pop(&mut stack);
                    }
                    call(func, &args[..argc.min(2)], opts.angle_unit)
                }
            };
            stack.push(admit(value, opts));
        }

        pop(&mut stack)
    }
}

/// Apply the real-only policy to an intermediate value.
fn admit(v: Complex64, opts: &EvalOptions) -> Complex64 {
    if !opts.complex_results && v.im != 0.0 {
        NAN
    } else {
        v
    }
}

fn binary(op: Op, a: Complex64, b: Complex64) -> Complex64 {
    if let (Some(x), Some(y)) = (as_real(a), as_real(b)) {
        return match op {
            Op::Add => real(x + y),
            Op::Sub => real(x - y),
            Op::Mul => real(x * y),
            Op::Div => real(x / y),
            Op::Pow => pow_real(x, y),
            _ => NAN,
        };
    }
    match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div => a / b,
        Op::Pow => {
            if a.re == 0.0 && a.im == 0.0 {
                pow_zero(b)
            } else {
                a.powc(b)
            }
        }
        _ => NAN,
    }
}

/// `0^b`, following the real rule on the sign of `Re(b)`. A purely
/// imaginary exponent has no limit.
fn pow_zero(b: Complex64) -> Complex64 {
    if b.re > 0.0 {
        real(0.0)
    } else if b.re < 0.0 {
        real(f64::INFINITY)
    } else if b.im == 0.0 {
        real(1.0)
    } else {
        NAN
    }
}

/// Real powers stay real whenever the result is; a negative base with a
/// fractional exponent takes the principal complex value.
fn pow_real(x: f64, y: f64) -> Complex64 {
    if x >= 0.0 || y.fract() == 0.0 || !x.is_finite() || !y.is_finite() {
        real(x.powf(y))
    } else {
        real(x).powf(y)
    }
}

fn call(func: Function, args: &[Complex64], unit: AngleUnit) -> Complex64 {
    let Some(&first) = args.first() else {
        return NAN;
    };
    let z = if func.is_forward_trig() && unit == AngleUnit::Degrees {
        first * (PI / 180.0)
    } else {
        first
    };

    if func.is_special() {
        return special_call(func, args);
    }

    match as_real(z) {
        Some(x) => real_call(func, x, args),
        None => complex_call(func, z, args),
    }
}

fn special_call(func: Function, args: &[Complex64]) -> Complex64 {
    let reals: Option<Vec<f64>> = args.iter().copied().map(as_real).collect();
    let Some(reals) = reals else {
        return NAN;
    };
    let value = match (func, reals.as_slice()) {
        (Function::Gamma, [x]) => special::gamma(*x),
        (Function::Factorial, [x]) => special::factorial(*x),
        (Function::Erf, [x]) => special::erf(*x),
        (Function::Erfc, [x]) => special::erfc(*x),
        (Function::Beta, [a, b]) => special::beta(*a, *b),
        _ => f64::NAN,
    };
    real(value)
}

fn real_call(func: Function, x: f64, args: &[Complex64]) -> Complex64 {
    match func {
        Function::Sin => real(x.sin()),
        Function::Cos => real(x.cos()),
        Function::Tan => real(x.tan()),
        Function::Sec => real(1.0 / x.cos()),
        Function::Csc => real(1.0 / x.sin()),
        Function::Cot => real(1.0 / x.tan()),
        Function::Atan => real(x.atan()),
        Function::Sinh => real(x.sinh()),
        Function::Cosh => real(x.cosh()),
        Function::Tanh => real(x.tanh()),
        Function::Exp => real(x.exp()),
        Function::Abs => real(x.abs()),
        Function::Asin | Function::Acos if x.abs() > 1.0 => complex_call(func, real(x), args),
        Function::Asin => real(x.asin()),
        Function::Acos => real(x.acos()),
        Function::Sqrt if x < 0.0 => Complex64::new(0.0, (-x).sqrt()),
        Function::Sqrt => real(x.sqrt()),
        Function::Ln => ln_real(x),
        Function::Log => match args.get(1) {
            None => ln_real(x),
            Some(&base) => match as_real(base) {
                Some(b) if x >= 0.0 && b >= 0.0 => real(x.ln() / b.ln()),
                _ => ln_complex(real(x)) / ln_complex(base),
            },
        },
        Function::Gamma | Function::Erf | Function::Erfc | Function::Beta | Function::Factorial => {
            special_call(func, args)
        }
    }
}

fn ln_real(x: f64) -> Complex64 {
    if x >= 0.0 || x.is_nan() {
        real(x.ln())
    } else {
        Complex64::new((-x).ln(), PI)
    }
}

fn ln_complex(z: Complex64) -> Complex64 {
    match as_real(z) {
        Some(x) => ln_real(x),
        None => z.ln(),
    }
}

fn complex_call(func: Function, z: Complex64, args: &[Complex64]) -> Complex64 {
    match func {
        Function::Sin => z.sin(),
        Function::Cos => z.cos(),
        Function::Tan => z.tan(),
        Function::Sec => z.cos().inv(),
        Function::Csc => z.sin().inv(),
        Function::Cot => z.tan().inv(),
        Function::Asin => z.asin(),
        Function::Acos => z.acos(),
        Function::Atan => z.atan(),
        Function::Sinh => z.sinh(),
        Function::Cosh => z.cosh(),
        Function::Tanh => z.tanh(),
        Function::Exp => z.exp(),
        Function::Abs => real(z.norm()),
        Function::Sqrt => z.sqrt(),
        Function::Ln => z.ln(),
        Function::Log => match args.get(1) {
            None => z.ln(),
            Some(&base) => z.ln() / ln_complex(base),
        },
        Function::Gamma | Function::Erf | Function::Erfc | Function::Beta | Function::Factorial => {
            special_call(func, args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_base_with_fractional_exponent_goes_complex() {
        let v = pow_real(-8.0, 1.0 / 3.0);
        assert!(v.im != 0.0);
        assert!((v.norm() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn integer_exponent_stays_real() {
        assert_eq!(pow_real(-2.0, 3.0), real(-8.0));
        assert_eq!(pow_real(0.0, -1.0), real(f64::INFINITY));
    }

    #[test]
    fn zero_base_in_the_complex_branch() {
        let zero = Complex64::new(0.0, 0.0);
        assert_eq!(binary(Op::Pow, zero, Complex64::new(2.0, 1.0)), real(0.0));
        assert_eq!(binary(Op::Pow, zero, Complex64::new(-2.0, 1.0)), real(f64::INFINITY));
        assert!(binary(Op::Pow, zero, Complex64::new(0.0, 1.0)).re.is_nan());
        assert_eq!(pow_zero(zero), real(1.0));
    }

    #[test]
    fn log_of_zero_is_negative_infinity() {
        assert_eq!(ln_real(0.0), real(f64::NEG_INFINITY));
    }

    #[test]
    fn special_functions_reject_complex_arguments() {
        let z = Complex64::new(1.0, 1.0);
        assert!(special_call(Function::Gamma, &[z]).re.is_nan());
    }
}
