//! The closed table of names a formula may call or reference.
//!
//! Both back-ends key off [`Function`]: the evaluator dispatches on it and the
//! symbolic solver lowers and differentiates through it. Nothing outside this
//! table is ever callable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ParseError;

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Ln,
    Log,
    Sqrt,
    Exp,
    Abs,
    Sec,
    Csc,
    Cot,
    Gamma,
    Erf,
    Erfc,
    Beta,
    Factorial,
}

impl Function {
    pub const ALL: [Function; 22] = [
        Function::Sin,
        Function::Cos,
        Function::Tan,
        Function::Asin,
        Function::Acos,
        Function::Atan,
        Function::Sinh,
        Function::Cosh,
        Function::Tanh,
        Function::Ln,
        Function::Log,
        Function::Sqrt,
        Function::Exp,
        Function::Abs,
        Function::Sec,
        Function::Csc,
        Function::Cot,
        Function::Gamma,
        Function::Erf,
        Function::Erfc,
        Function::Beta,
        Function::Factorial,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Ln => "ln",
            Function::Log => "log",
            Function::Sqrt => "sqrt",
            Function::Exp => "exp",
            Function::Abs => "abs",
            Function::Sec => "sec",
            Function::Csc => "csc",
            Function::Cot => "cot",
            Function::Gamma => "gamma",
            Function::Erf => "erf",
            Function::Erfc => "erfc",
            Function::Beta => "beta",
            Function::Factorial => "factorial",
        }
    }

    pub fn from_name(name: &str) -> Option<Function> {
        Function::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Accepted argument counts as `(min, max)`.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Function::Log => (1, 2),
            Function::Beta => (2, 2),
            _ => (1, 1),
        }
    }

    pub fn accepts(&self, argc: usize) -> bool {
        let (min, max) = self.arity();
        (min..=max).contains(&argc)
    }

    /// Trig functions whose argument is an angle. These are the ones that
    /// change meaning under degree mode.
    pub fn is_forward_trig(&self) -> bool {
        matches!(
            self,
            Function::Sin
                | Function::Cos
                | Function::Tan
                | Function::Sec
                | Function::Csc
                | Function::Cot
        )
    }

    pub fn is_special(&self) -> bool {
        matches!(
            self,
            Function::Gamma | Function::Erf | Function::Erfc | Function::Beta | Function::Factorial
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constant {
    Pi,
    E,
    Inf,
    Golden,
}

impl Constant {
    pub const ALL: [Constant; 4] = [Constant::Pi, Constant::E, Constant::Inf, Constant::Golden];

    pub fn name(&self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
            Constant::Inf => "inf",
            Constant::Golden => "golden",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
            Constant::Inf => f64::INFINITY,
            Constant::Golden => (1.0 + 5.0_f64.sqrt()) / 2.0,
        }
    }

    pub fn from_name(name: &str) -> Option<Constant> {
        Constant::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn is_reserved(name: &str) -> bool {
    Function::from_name(name).is_some() || Constant::from_name(name).is_some()
}

/// Check that `name` can serve as the free variable of a formula.
pub fn validate_variable(name: &str) -> Result<(), ParseError> {
    let mut chars = name.chars();
    let well_formed = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !well_formed {
        return Err(ParseError {
            message: format!("'{name}' is not a valid variable name"),
            position: 0,
            found_token: Some(name.to_string()),
            expected: Some("a single identifier".to_string()),
        });
    }
    if is_reserved(name) {
        return Err(ParseError {
            message: format!("'{name}' is reserved and cannot be used as the variable"),
            position: 0,
            found_token: Some(name.to_string()),
            expected: None,
        });
    }
    Ok(())
}
