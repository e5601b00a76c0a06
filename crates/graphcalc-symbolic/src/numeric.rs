//! Numeric root search for residuals that are not rational functions.

use graphcalc_scale::{sample_coordinates, Domain, ScaleMode};
use std::time::{Duration, Instant};

/// Step and wall-clock limit shared by every stage of one solve.
#[derive(Debug)]
pub struct Budget {
    steps: usize,
    max_steps: usize,
    deadline: Instant,
    exhausted: bool,
}

impl Budget {
    pub fn new(max_steps: usize, timeout: Duration) -> Self {
        Budget {
            steps: 0,
            max_steps,
            deadline: Instant::now() + timeout,
            exhausted: false,
        }
    }

    /// Spend one step. Returns `false` once either limit is hit; it stays
    /// `false` afterwards.
    pub fn tick(&mut self) -> bool {
        if !self.exhausted {
            self.steps += 1;
            self.exhausted = self.steps > self.max_steps || Instant::now() >= self.deadline;
        }
        !self.exhausted
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Zeros and poles found across the domain.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scan {
    pub roots: Vec<f64>,
    pub poles: Vec<f64>,
}

const MAX_BISECTIONS: usize = 200;
const MAX_GOLDEN_STEPS: usize = 200;
// A dip in |f| is refined only if the parabola through its samples falls
// below this fraction of the larger neighbour.
const TANGENT_DIP: f64 = 1e-2;
const TANGENT_TOL: f64 = 1e-9;
// Offset, relative to |x|, at which a candidate zero is cross-checked
const CONFIRM_STEP: f64 = 1e-6;

/// Sample `f` on `points` evenly spaced coordinates, bisect every sign change
/// and classify the limit point. Roots where `f` touches zero without
/// crossing show up as dips in `|f|` and are refined by golden-section
/// search. `None` means the budget ran out.
pub fn scan<F>(f: F, domain: Domain, points: usize, budget: &mut Budget) -> Option<Scan>
where
    F: Fn(f64) -> f64,
{
    let xs = sample_coordinates(ScaleMode::Linear, domain.start, domain.end, points.max(2)).ok()?;
    let mut ys = Vec::with_capacity(xs.len());
    for &x in &xs {
        if !budget.tick() {
            return None;
        }
        ys.push(f(x));
    }

    let mut out = Scan::default();
    for i in 0..xs.len() {
        if ys[i] == 0.0 {
            out.roots.push(xs[i]);
            continue;
        }
        if let Some(root) = touch_root(&f, &xs, &ys, i, budget)? {
            out.roots.push(root);
        }
        let Some((&x1, &y1)) = xs.get(i + 1).zip(ys.get(i + 1)) else {
            continue;
        };
        let y0 = ys[i];
        if y1 == 0.0 || !y0.is_finite() || !y1.is_finite() || (y0 < 0.0) == (y1 < 0.0) {
            continue;
        }
        let c = bisect(&f, xs[i], x1, y0, budget)?;
        let fc = f(c);
        let c = if c.abs() < 1e-12 { 0.0 } else { c };
        if fc.abs() <= 1e-6 * (1.0 + y0.abs().min(y1.abs())) {
            out.roots.push(c);
        } else {
            out.poles.push(c);
        }
    }
    Some(out)
}

/// Check a zero of `f` found by other means. A sign change across `x` is
/// bisected down to the crossing and a dip of `|f|` to nearly zero keeps
/// `x`. Anything else is rejected, as is running out of budget.
pub fn confirm_root<F>(f: &F, x: f64, budget: &mut Budget) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    let h = CONFIRM_STEP * (1.0 + x.abs());
    let (left, mid, right) = (f(x - h), f(x), f(x + h));
    if mid == 0.0 {
        return Some(x);
    }
    if !(left.is_finite() && mid.is_finite() && right.is_finite()) {
        return None;
    }
    if (left < 0.0) != (right < 0.0) {
        return bisect(f, x - h, x + h, left, budget);
    }
    let dip = mid.abs() <= left.abs().min(right.abs());
    (dip && mid.abs() <= CONFIRM_STEP * (1.0 + left.abs().max(right.abs()))).then_some(x)
}

/// A zero where `|f|` dips to nothing at sample `i` without changing sign.
/// The outer `None` means the budget ran out.
fn touch_root<F>(f: &F, xs: &[f64], ys: &[f64], i: usize, budget: &mut Budget) -> Option<Option<f64>>
where
    F: Fn(f64) -> f64,
{
    if i == 0 || i + 1 >= xs.len() {
        return Some(None);
    }
    let (ya, yb, yc) = (ys[i - 1], ys[i], ys[i + 1]);
    if !(ya.is_finite() && yb.is_finite() && yc.is_finite()) || ya == 0.0 || yc == 0.0 {
        return Some(None);
    }
    if (ya < 0.0) != (yb < 0.0) || (yb < 0.0) != (yc < 0.0) {
        return Some(None);
    }
    let (a, b, c) = (ya.abs(), yb.abs(), yc.abs());
    if !(b < a && b <= c) {
        return Some(None);
    }
    // Lowest value of the parabola through the three samples
    let curvature = a - 2.0 * b + c;
    let vertex = if curvature > 0.0 {
        b - (c - a).powi(2) / (8.0 * curvature)
    } else {
        b
    };
    if vertex > TANGENT_DIP * a.max(c) {
        return Some(None);
    }
    let x = golden_min(f, xs[i - 1], xs[i + 1], budget)?;
    if f(x).abs() <= TANGENT_TOL * (1.0 + a.min(c)) {
        Some(Some(if x.abs() < 1e-12 { 0.0 } else { x }))
    } else {
        Some(None)
    }
}

/// Minimum of `|f|` on `[lo, hi]`.
fn golden_min<F>(f: &F, mut lo: f64, mut hi: f64, budget: &mut Budget) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    const INV_PHI: f64 = 0.618_033_988_749_894_9;
    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let (mut f1, mut f2) = (f(x1).abs(), f(x2).abs());
    for _ in 0..MAX_GOLDEN_STEPS {
        if !budget.tick() {
            return None;
        }
        if f1 == 0.0 {
            return Some(x1);
        }
        if hi - lo <= f64::EPSILON * (1.0 + lo.abs().max(hi.abs())) {
            break;
        }
        if f1 <= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_PHI * (hi - lo);
            f1 = f(x1).abs();
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_PHI * (hi - lo);
            f2 = f(x2).abs();
        }
    }
    Some(if f1 <= f2 { x1 } else { x2 })
}

fn bisect<F>(f: &F, a: f64, b: f64, fa: f64, budget: &mut Budget) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    let (mut lo, mut hi, mut flo) = (a, b, fa);
    for _ in 0..MAX_BISECTIONS {
        if !budget.tick() {
            return None;
        }
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let fm = f(mid);
        if fm == 0.0 {
            return Some(mid);
        }
        if fm.is_nan() {
            break;
        }
        if (fm < 0.0) == (flo < 0.0) {
            lo = mid;
            flo = fm;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> Budget {
        Budget::new(100_000, Duration::from_secs(5))
    }

    #[test]
    fn sine_zeros() {
        let scan = scan(f64::sin, Domain::new(-1.0, 4.0), 500, &mut budget()).unwrap();
        assert_eq!(scan.roots.len(), 2);
        assert!(scan.roots[0].abs() < 1e-9);
        assert!((scan.roots[1] - std::f64::consts::PI).abs() < 1e-9);
        assert!(scan.poles.is_empty());
    }

    #[test]
    fn poles_are_not_roots() {
        let scan = scan(|x| 1.0 / (x - 0.31), Domain::new(-1.0, 1.0), 101, &mut budget()).unwrap();
        assert!(scan.roots.is_empty());
        assert_eq!(scan.poles.len(), 1);
        assert!((scan.poles[0] - 0.31).abs() < 1e-9);
    }

    #[test]
    fn touching_zeros_are_found() {
        let scan = scan(|x| x.sin().powi(2), Domain::new(-1.0, 7.0), 800, &mut budget()).unwrap();
        let expected = [0.0, std::f64::consts::PI, 2.0 * std::f64::consts::PI];
        assert_eq!(scan.roots.len(), 3, "{:?}", scan.roots);
        for (got, want) in scan.roots.iter().zip(expected) {
            assert!((got - want).abs() < 1e-7, "{got} vs {want}");
        }
        assert!(scan.poles.is_empty());
    }

    #[test]
    fn near_misses_are_not_zeros() {
        let scan = scan(|x| x * x + 1e-3, Domain::new(-1.0, 1.0), 101, &mut budget()).unwrap();
        assert!(scan.roots.is_empty());
        let scan = super::scan(|x| x.cos() + 2.0, Domain::new(-10.0, 10.0), 2_000, &mut budget()).unwrap();
        assert!(scan.roots.is_empty());
    }

    #[test]
    fn confirmation_tightens_crossings_and_rejects_misses() {
        let f = |x: f64| (x + 1.0).powi(20) * (x + 2.0).powi(20) - 1.0;
        let rough = -0.381_966_004_995_418_4;
        let x = confirm_root(&f, rough, &mut budget()).unwrap();
        assert!((x - (5f64.sqrt() - 3.0) / 2.0).abs() < 1e-13, "{x}");
        assert_eq!(confirm_root(&f, -3.350_492_979_796_300_6, &mut budget()), None);

        let double = |x: f64| (x * x - 2.0).powi(2);
        let x = confirm_root(&double, 2f64.sqrt() + 1e-9, &mut budget()).unwrap();
        assert!((x - 2f64.sqrt()).abs() < 1e-8);
    }

    #[test]
    fn exhausted_budget_gives_up() {
        let mut tight = Budget::new(10, Duration::from_secs(5));
        assert!(scan(f64::sin, Domain::new(-1.0, 4.0), 500, &mut tight).is_none());
        assert!(tight.is_exhausted());
        assert!(!tight.tick());
    }

    #[test]
    fn zero_timeout_exhausts_immediately() {
        let mut b = Budget::new(1_000, Duration::ZERO);
        assert!(!b.tick());
    }
}
