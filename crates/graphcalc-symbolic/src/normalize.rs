//! Staged normalization pipeline
//!
//! Each pass is a bottom-up rewrite. The default pipeline produces the
//! canonical form the solver and the derivative printer work from: no nested
//! sums or products, negation folded into coefficients, constants merged,
//! like terms and like factors collected, terms in a stable order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::coeff::Coefficient;
use crate::expr::{SymExpr, SymExprKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormPass {
    /// `-e` becomes `-1 * e`, `-(-e)` becomes `e`
    FoldNeg,
    /// Flatten nested Add/Mul
    Flatten,
    /// Merge numeric constants in sums, products and powers
    MergeConstants,
    /// `x^0`, `x^1`, `0^n`, `1^x`, `(x^a)^n`
    SimplifyPowers,
    /// Distribute products over sums, small integer powers of sums
    Expand,
    /// `2x + 3x = 5x`
    CollectLikeTerms,
    /// `x * x^2 = x^3`
    CollectLikeFactors,
    /// Stable term and factor order
    Sort,
}

/// Record of one pass: sizes before and after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormStep {
    pub pass: NormPass,
    pub before_size: usize,
    pub after_size: usize,
}

#[derive(Debug, Clone)]
pub struct StagedNormalizer {
    passes: Vec<NormPass>,
    /// Whole-pipeline repetitions until a fixed point.
    max_rounds: usize,
}

// `(a + b)^n` is expanded only up to this power
const MAX_EXPAND_POWER: i64 = 6;

impl StagedNormalizer {
    pub fn new(passes: Vec<NormPass>) -> Self {
        StagedNormalizer {
            passes,
            max_rounds: 4,
        }
    }

    /// Canonical form without distributing products.
    pub fn simplify() -> Self {
        Self::new(vec![
            NormPass::FoldNeg,
            NormPass::Flatten,
            NormPass::MergeConstants,
            NormPass::SimplifyPowers,
            NormPass::CollectLikeFactors,
            NormPass::CollectLikeTerms,
            NormPass::MergeConstants,
            NormPass::Sort,
        ])
    }

    /// Fully expanded canonical form.
    pub fn expand() -> Self {
        Self::new(vec![
            NormPass::FoldNeg,
            NormPass::Flatten,
            NormPass::MergeConstants,
            NormPass::SimplifyPowers,
            NormPass::Expand,
            NormPass::Flatten,
            NormPass::CollectLikeFactors,
            NormPass::MergeConstants,
            NormPass::CollectLikeTerms,
            NormPass::MergeConstants,
            NormPass::Sort,
        ])
    }

    pub fn normalize(&self, expr: SymExpr) -> SymExpr {
        self.normalize_traced(expr).0
    }

    /// Normalize and return the per-pass trace of the final round.
    pub fn normalize_traced(&self, expr: SymExpr) -> (SymExpr, Vec<NormStep>) {
        let mut current = expr;
        let mut trace = Vec::new();
        for _ in 0..self.max_rounds {
            trace.clear();
            let start = current.clone();
            for &pass in &self.passes {
                let before_size = current.node_count();
                current = apply_pass(&current, pass);
                trace.push(NormStep {
                    pass,
                    before_size,
                    after_size: current.node_count(),
                });
            }
            if current == start {
                break;
            }
        }
        (current, trace)
    }
}

impl Default for StagedNormalizer {
    fn default() -> Self {
        Self::expand()
    }
}

fn apply_pass(expr: &SymExpr, pass: NormPass) -> SymExpr {
    let rewrite: fn(SymExpr) -> SymExpr = match pass {
        NormPass::FoldNeg => fold_neg,
        NormPass::Flatten => flatten,
        NormPass::MergeConstants => merge_constants,
        NormPass::SimplifyPowers => simplify_powers,
        NormPass::Expand => expand,
        NormPass::CollectLikeTerms => collect_like_terms,
        NormPass::CollectLikeFactors => collect_like_factors,
        NormPass::Sort => sort_terms,
    };
    bottom_up(expr, rewrite)
}

/// Rewrite children first, then the node itself.
fn bottom_up(expr: &SymExpr, rewrite: fn(SymExpr) -> SymExpr) -> SymExpr {
    let rebuilt = match expr.kind.as_ref() {
        SymExprKind::Num(_) | SymExprKind::Const(_) | SymExprKind::Var(_) => expr.clone(),
        SymExprKind::Add(terms) => {
            SymExpr::add(terms.iter().map(|t| bottom_up(t, rewrite)).collect())
        }
        SymExprKind::Mul(factors) => {
            SymExpr::mul(factors.iter().map(|f| bottom_up(f, rewrite)).collect())
        }
        SymExprKind::Pow(b, e) => SymExpr::pow(bottom_up(b, rewrite), bottom_up(e, rewrite)),
        SymExprKind::Neg(inner) => SymExpr::neg(bottom_up(inner, rewrite)),
        SymExprKind::Func(f, args) => {
            SymExpr::func(*f, args.iter().map(|a| bottom_up(a, rewrite)).collect())
        }
    };
    rewrite(rebuilt)
}

fn fold_neg(e: SymExpr) -> SymExpr {
    match e.kind.as_ref() {
        SymExprKind::Neg(inner) => match inner.kind.as_ref() {
            SymExprKind::Neg(x) => x.clone(),
            SymExprKind::Num(c) => SymExpr::num(-*c),
            _ => SymExpr::mul(vec![SymExpr::int(-1), inner.clone()]),
        },
        _ => e,
    }
}

fn flatten(e: SymExpr) -> SymExpr {
    match e.kind.as_ref() {
        SymExprKind::Add(terms) => {
            let mut out = Vec::with_capacity(terms.len());
            for t in terms {
                match t.kind.as_ref() {
                    SymExprKind::Add(inner) => out.extend(inner.iter().cloned()),
                    _ => out.push(t.clone()),
                }
            }
            SymExpr::add(out)
        }
        SymExprKind::Mul(factors) => {
            let mut out = Vec::with_capacity(factors.len());
            for f in factors {
                match f.kind.as_ref() {
                    SymExprKind::Mul(inner) => out.extend(inner.iter().cloned()),
                    _ => out.push(f.clone()),
                }
            }
            SymExpr::mul(out)
        }
        _ => e,
    }
}

fn merge_constants(e: SymExpr) -> SymExpr {
    match e.kind.as_ref() {
        SymExprKind::Add(terms) => {
            let mut sum = Coefficient::ZERO;
            let mut rest = Vec::new();
            for t in terms {
                match t.as_coeff() {
                    Some(c) => sum = sum + *c,
                    None => rest.push(t.clone()),
                }
            }
            if !sum.is_zero() || rest.is_empty() {
                rest.insert(0, SymExpr::num(sum));
            }
            SymExpr::add(rest)
        }
        SymExprKind::Mul(factors) => {
            let mut prod = Coefficient::ONE;
            let mut rest = Vec::new();
            for f in factors {
                match f.as_coeff() {
                    Some(c) => prod = prod * *c,
                    None => rest.push(f.clone()),
                }
            }
            if prod.is_zero() {
                return SymExpr::int(0);
            }
            if !prod.is_one() || rest.is_empty() {
                rest.insert(0, SymExpr::num(prod));
            }
            SymExpr::mul(rest)
        }
        SymExprKind::Pow(base, exp) => match (base.as_coeff(), exp.as_coeff()) {
            // Only fold when the result stays exact or both sides were floats
            // already; `2^(1/2)` keeps its symbolic form.
            (Some(b), Some(x)) if x.is_integer() || (!b.is_exact() && !x.is_exact()) => {
                SymExpr::num(b.pow(x))
            }
            (Some(b), Some(x)) if !x.is_integer() => {
                let folded = b.pow(x);
                if folded.is_exact() {
                    SymExpr::num(folded)
                } else {
                    e
                }
            }
            _ => e,
        },
        _ => e,
    }
}

fn simplify_powers(e: SymExpr) -> SymExpr {
    let SymExprKind::Pow(base, exp) = e.kind.as_ref() else {
        return e;
    };
    if exp.is_zero() || base.is_one() {
        return SymExpr::int(1);
    }
    if exp.is_one() {
        return base.clone();
    }
    if base.is_zero() && exp.as_coeff().is_some_and(|c| !c.is_negative()) {
        return SymExpr::int(0);
    }
    // (b^a)^n = b^(a*n) for integer n
    if let (SymExprKind::Pow(inner_base, inner_exp), Some(n)) =
        (base.kind.as_ref(), exp.as_coeff())
    {
        if n.is_integer() {
            if let Some(a) = inner_exp.as_coeff() {
                if a.is_integer() {
                    return SymExpr::pow(inner_base.clone(), SymExpr::num(*a * *n));
                }
            }
        }
    }
    // (a*b)^n = a^n * b^n for integer n
    if let (SymExprKind::Mul(factors), Some(n)) = (base.kind.as_ref(), exp.as_coeff()) {
        if n.is_integer() {
            return SymExpr::mul(
                factors
                    .iter()
                    .map(|f| SymExpr::pow(f.clone(), exp.clone()))
                    .collect(),
            );
        }
    }
    e
}

fn expand(e: SymExpr) -> SymExpr {
    match e.kind.as_ref() {
        SymExprKind::Mul(factors) => {
            let Some(idx) = factors
                .iter()
                .position(|f| matches!(f.kind.as_ref(), SymExprKind::Add(_)))
            else {
                return e;
            };
            let SymExprKind::Add(terms) = factors[idx].kind.as_ref() else {
                return e;
            };
            let distributed = terms
                .iter()
                .map(|t| {
                    let mut fs = factors.clone();
                    fs[idx] = t.clone();
                    expand(flatten(SymExpr::mul(fs)))
                })
                .collect();
            flatten(SymExpr::add(distributed))
        }
        SymExprKind::Pow(base, exp) => {
            let n = exp.as_coeff().and_then(|c| c.as_integer());
            match (base.kind.as_ref(), n) {
                (SymExprKind::Add(_), Some(n)) if (2..=MAX_EXPAND_POWER).contains(&n) => {
                    let mut acc = base.clone();
                    for _ in 1..n {
                        acc = expand(flatten(SymExpr::mul(vec![acc, base.clone()])));
                    }
                    acc
                }
                _ => e,
            }
        }
        _ => e,
    }
}

/// Split a term into its numeric coefficient and the remaining product.
fn split_coeff(term: &SymExpr) -> (Coefficient, SymExpr) {
    match term.kind.as_ref() {
        SymExprKind::Num(c) => (*c, SymExpr::int(1)),
        SymExprKind::Mul(factors) => {
            let mut coeff = Coefficient::ONE;
            let mut rest = Vec::new();
            for f in factors {
                match f.as_coeff() {
                    Some(c) => coeff = coeff * *c,
                    None => rest.push(f.clone()),
                }
            }
            (coeff, SymExpr::mul(rest))
        }
        _ => (Coefficient::ONE, term.clone()),
    }
}

fn collect_like_terms(e: SymExpr) -> SymExpr {
    let SymExprKind::Add(terms) = e.kind.as_ref() else {
        return e;
    };
    // Keep first-seen order so the result is deterministic before sorting.
    let mut order: Vec<SymExpr> = Vec::new();
    let mut groups: HashMap<SymExpr, Coefficient> = HashMap::new();
    for t in terms {
        let (c, base) = split_coeff(t);
        match groups.get_mut(&base) {
            Some(sum) => *sum = *sum + c,
            None => {
                order.push(base.clone());
                groups.insert(base, c);
            }
        }
    }
    let mut out = Vec::with_capacity(order.len());
    for base in order {
        let c = groups.get(&base).copied().unwrap_or(Coefficient::ZERO);
        if c.is_zero() {
            continue;
        }
        if base.is_one() {
            out.push(SymExpr::num(c));
        } else if c.is_one() {
            out.push(base);
        } else {
            let mut factors = vec![SymExpr::num(c)];
            match base.kind.as_ref() {
                SymExprKind::Mul(fs) => factors.extend(fs.iter().cloned()),
                _ => factors.push(base),
            }
            out.push(SymExpr::mul(factors));
        }
    }
    SymExpr::add(out)
}

fn split_power(factor: &SymExpr) -> (SymExpr, SymExpr) {
    match factor.kind.as_ref() {
        SymExprKind::Pow(b, e) => (b.clone(), e.clone()),
        _ => (factor.clone(), SymExpr::int(1)),
    }
}

fn collect_like_factors(e: SymExpr) -> SymExpr {
    let SymExprKind::Mul(factors) = e.kind.as_ref() else {
        return e;
    };
    let mut order: Vec<SymExpr> = Vec::new();
    let mut exps: HashMap<SymExpr, Vec<SymExpr>> = HashMap::new();
    for f in factors {
        if f.is_num() {
            order.push(f.clone());
            continue;
        }
        let (base, exp) = split_power(f);
        match exps.get_mut(&base) {
            Some(list) => list.push(exp),
            None => {
                order.push(base.clone());
                exps.insert(base, vec![exp]);
            }
        }
    }
    let mut out = Vec::with_capacity(order.len());
    for base in order {
        let Some(list) = exps.remove(&base) else {
            // numeric factor, or a base already emitted
            if base.is_num() {
                out.push(base);
            }
            continue;
        };
        let exp = if list.len() == 1 {
            list.into_iter().next().unwrap_or_else(|| SymExpr::int(1))
        } else {
            merge_constants(SymExpr::add(list))
        };
        out.push(simplify_powers(SymExpr::pow(base, exp)));
    }
    SymExpr::mul(out)
}

fn sort_terms(e: SymExpr) -> SymExpr {
    match e.kind.as_ref() {
        SymExprKind::Add(terms) => {
            let mut sorted = terms.clone();
            sorted.sort_by(compare_terms);
            SymExpr::add(sorted)
        }
        SymExprKind::Mul(factors) => {
            let mut sorted = factors.clone();
            sorted.sort_by(compare_exprs);
            SymExpr::mul(sorted)
        }
        _ => e,
    }
}

/// Polynomial-style order for sums: higher degree first, constants last.
fn compare_terms(a: &SymExpr, b: &SymExpr) -> std::cmp::Ordering {
    let degree = |t: &SymExpr| -> f64 {
        let (_, rest) = split_coeff(t);
        match rest.kind.as_ref() {
            SymExprKind::Num(_) => 0.0,
            SymExprKind::Pow(_, e) => e.as_coeff().map(|c| c.to_f64()).unwrap_or(1.0),
            SymExprKind::Mul(fs) => fs
                .iter()
                .map(|f| split_power(f).1.as_coeff().map(|c| c.to_f64()).unwrap_or(1.0))
                .sum(),
            _ => 1.0,
        }
    };
    degree(b)
        .total_cmp(&degree(a))
        .then_with(|| compare_exprs(&split_coeff(a).1, &split_coeff(b).1))
}

/// Order: numbers, constants, variables, powers, products, sums, negations, calls.
fn compare_exprs(a: &SymExpr, b: &SymExpr) -> std::cmp::Ordering {
    use std::cmp::Ordering::Equal;

    let rank = |e: &SymExpr| -> u8 {
        match e.kind.as_ref() {
            SymExprKind::Num(_) => 0,
            SymExprKind::Const(_) => 1,
            SymExprKind::Var(_) => 2,
            SymExprKind::Pow(..) => 3,
            SymExprKind::Mul(_) => 4,
            SymExprKind::Add(_) => 5,
            SymExprKind::Neg(_) => 6,
            SymExprKind::Func(..) => 7,
        }
    };
    let by_rank = rank(a).cmp(&rank(b));
    if by_rank != Equal {
        return by_rank;
    }
    match (a.kind.as_ref(), b.kind.as_ref()) {
        (SymExprKind::Num(x), SymExprKind::Num(y)) => x.cmp(y),
        (SymExprKind::Const(x), SymExprKind::Const(y)) => x.name().cmp(y.name()),
        (SymExprKind::Var(x), SymExprKind::Var(y)) => x.cmp(y),
        (SymExprKind::Pow(ba, ea), SymExprKind::Pow(bb, eb)) => {
            compare_exprs(ba, bb).then_with(|| compare_exprs(ea, eb))
        }
        (SymExprKind::Func(fa, xa), SymExprKind::Func(fb, xb)) => fa
            .name()
            .cmp(fb.name())
            .then_with(|| compare_lists(xa, xb)),
        (SymExprKind::Add(xa), SymExprKind::Add(xb))
        | (SymExprKind::Mul(xa), SymExprKind::Mul(xb)) => compare_lists(xa, xb),
        (SymExprKind::Neg(x), SymExprKind::Neg(y)) => compare_exprs(x, y),
        _ => Equal,
    }
}

fn compare_lists(a: &[SymExpr], b: &[SymExpr]) -> std::cmp::Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| compare_exprs(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}
