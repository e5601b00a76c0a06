//! Tree-to-bytecode compiler
//!
//! A formula is compiled once into a flat stack program and then run per
//! sample. The only callable targets are entries of the parser's
//! [`Function`] table.

use graphcalc_parser::{BinOp, Expr, Function, UnOp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::EvaluationError;

/// Bytecode instruction for the sample evaluator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Push a constant onto the stack
    PushConst(usize),
    /// Push the current sample
    LoadVar,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Neg,
    /// Pop `argc` arguments, push the result
    Call(Function, usize),
}

/// Compiled stack program for one formula in one variable.
#[derive(Debug, Clone)]
pub struct Program {
    pub ops: Vec<Op>,
    pub constants: Vec<f64>,
    pub variable: String,
    pub max_stack: usize,
}

#[derive(Debug)]
pub struct Compiler<'a> {
    variable: &'a str,
    constants: Vec<f64>,
    // f64 bits -> index
    const_map: HashMap<u64, usize>,
    ops: Vec<Op>,
    depth: usize,
    max_stack: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(variable: &'a str) -> Self {
        Compiler {
            variable,
            constants: Vec::new(),
            const_map: HashMap::new(),
            ops: Vec::new(),
            depth: 0,
            max_stack: 0,
        }
    }

    pub fn compile(mut self, expr: &Expr) -> Result<Program, EvaluationError> {
        self.compile_expr(expr)?;
        Ok(Program {
            ops: self.ops,
            constants: self.constants,
            variable: self.variable.to_string(),
            max_stack: self.max_stack,
        })
    }

    fn add_constant(&mut self, value: f64) -> usize {
        let bits = value.to_bits();
        if let Some(&idx) = self.const_map.get(&bits) {
            return idx;
        }
        let idx = self.constants.len();
        self.constants.push(value);
        self.const_map.insert(bits, idx);
        idx
    }

    fn push(&mut self, op: Op) {
        self.ops.push(op);
        self.depth += 1;
        self.max_stack = self.max_stack.max(self.depth);
    }

    fn reduce(&mut self, op: Op, consumed: usize) {
        self.ops.push(op);
        self.depth = self.depth + 1 - consumed;
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), EvaluationError> {
        match expr {
            Expr::Number(text) => {
                let value: f64 = text.parse().map_err(|_| {
                    EvaluationError::new(format!("invalid numeric literal '{text}'"), expr)
                })?;
                let idx = self.add_constant(value);
                self.push(Op::PushConst(idx));
            }
            Expr::Const(c) => {
                let idx = self.add_constant(c.value());
                self.push(Op::PushConst(idx));
            }
            Expr::Var(name) => {
                if name != self.variable {
                    return Err(EvaluationError::new(
                        format!(
                            "free identifier '{name}' is not the bound variable '{}'",
                            self.variable
                        ),
                        expr,
                    ));
                }
                self.push(Op::LoadVar);
            }
            Expr::Unary(UnOp::Plus, inner) => self.compile_expr(inner)?,
            Expr::Unary(UnOp::Minus, inner) => {
                self.compile_expr(inner)?;
                self.reduce(Op::Neg, 1);
            }
            Expr::Binary(lhs, op, rhs) => {
                self.compile_expr(lhs)?;
                self.compile_expr(rhs)?;
                let op = match op {
                    BinOp::Add => Op::Add,
                    BinOp::Sub => Op::Sub,
                    BinOp::Mul => Op::Mul,
                    BinOp::Div => Op::Div,
                    BinOp::Pow => Op::Pow,
                };
                self.reduce(op, 2);
            }
            Expr::Call(func, args) => {
                if !func.accepts(args.len()) {
                    let (min, max) = func.arity();
                    let expected = if min == max {
                        format!("{min}")
                    } else {
                        format!("{min} to {max}")
                    };
                    return Err(EvaluationError::new(
                        format!(
                            "function '{func}' expects {expected} argument(s), got {}",
                            args.len()
                        ),
                        expr,
                    ));
                }
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.reduce(Op::Call(*func, args.len()), args.len());
            }
        }
        Ok(())
    }
}

pub fn compile_expr(expr: &Expr, variable: &str) -> Result<Program, EvaluationError> {
    let program = Compiler::new(variable).compile(expr)?;
    tracing::debug!(
        ops = program.ops.len(),
        constants = program.constants.len(),
        max_stack = program.max_stack,
        "compiled expression"
    );
    Ok(program)
}
