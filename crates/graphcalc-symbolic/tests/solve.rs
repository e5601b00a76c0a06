use graphcalc_parser::parse;
use graphcalc_scale::Domain;
use graphcalc_symbolic::{solve, Root, Solver, SolverConfig};
use std::time::Instant;

fn roots(src: &str) -> Vec<Root> {
    roots_in(src, Domain::default())
}

fn roots_in(src: &str, domain: Domain) -> Vec<Root> {
    let tree = parse(src, "x").unwrap();
    solve(&tree, None, domain).unwrap()
}

fn exact(src: &str) -> Vec<String> {
    roots(src).into_iter().map(|r| r.exact).collect()
}

#[test]
fn linear_equation() {
    let r = roots("3*x+1 = 2*x+8");
    assert_eq!(r.len(), 1);
    assert_eq!(r[0].exact, "7");
    assert_eq!(r[0].approx, 7.0);
    assert_eq!(r[0].intersection_of, None);
}

#[test]
fn quadratic_roots_sorted_ascending() {
    let r = roots("x^2 - 4 = 0");
    let approx: Vec<f64> = r.iter().map(|r| r.approx).collect();
    assert_eq!(approx, vec![-2.0, 2.0]);
}

#[test]
fn surd_forms() {
    assert_eq!(exact("x^2 = 2"), vec!["-sqrt(2)", "sqrt(2)"]);
    let r = roots("x^2 = 2");
    assert!((r[1].approx - std::f64::consts::SQRT_2).abs() < 1e-12);
}

#[test]
fn holes_are_not_solutions() {
    assert_eq!(exact("(x^2-1)/(x-1) = 0"), vec!["-1"]);
}

#[test]
fn complex_only_roots_are_excluded() {
    assert!(roots("x^2 + 1 = 0").is_empty());
}

#[test]
fn expression_without_equals_is_solved_against_zero() {
    assert_eq!(exact("x^2 - 5x + 6"), vec!["2", "3"]);
}

#[test]
fn repeated_root_reported_once() {
    assert_eq!(exact("(x - 3)^2 = 0"), vec!["3"]);
}

#[test]
fn roots_outside_domain_are_dropped() {
    let r = roots_in("x^2 - 4", Domain::new(0.0, 5.0));
    assert_eq!(r.len(), 1);
    assert_eq!(r[0].exact, "2");
}

#[test]
fn no_root_is_not_an_error() {
    assert!(roots("5 = 3").is_empty());
    assert!(roots("exp(x) = 0").is_empty());
}

#[test]
fn transcendental_roots_found_numerically() {
    let r = roots_in("sin(x) = 0", Domain::new(-1.0, 4.0));
    assert_eq!(r.len(), 2);
    assert_eq!(r[0].exact, "0");
    assert_eq!(r[0].approx, 0.0);
    assert!((r[1].approx - std::f64::consts::PI).abs() < 1e-9);
    assert!(r[1].exact.starts_with("3.14159265"));
}

#[test]
fn tangent_poles_are_rejected() {
    let r = roots_in("tan(x)", Domain::new(1.0, 4.0));
    assert_eq!(r.len(), 1);
    assert!((r[0].approx - std::f64::consts::PI).abs() < 1e-9);
}

#[test]
fn curve_intersection_is_tagged() {
    let f = parse("x^2", "x").unwrap();
    let g = parse("x + 2", "x").unwrap();
    let r = Solver::default()
        .intersect(&f, &g, "line", Domain::default())
        .unwrap();
    let exact: Vec<&str> = r.iter().map(|r| r.exact.as_str()).collect();
    assert_eq!(exact, vec!["-1", "2"]);
    assert!(r.iter().all(|r| r.intersection_of.as_deref() == Some("line")));
}

#[test]
fn numeric_fallback_can_be_disabled() {
    let solver = Solver::new(SolverConfig {
        numeric_fallback: false,
        ..SolverConfig::default()
    });
    let tree = parse("cos(x)", "x").unwrap();
    assert!(solver.solve(&tree, None, Domain::default()).unwrap().is_empty());
}

#[test]
fn exhausted_budget_means_no_solution() {
    let solver = Solver::new(SolverConfig {
        max_steps: 5,
        ..SolverConfig::default()
    });
    let tree = parse("sin(x)", "x").unwrap();
    assert!(solver.solve(&tree, None, Domain::default()).unwrap().is_empty());
}

#[test]
fn degree_mode_solving() {
    let solver = Solver::new(SolverConfig {
        angle_unit: graphcalc_eval::AngleUnit::Degrees,
        ..SolverConfig::default()
    });
    let tree = parse("sin(x) = 0", "x").unwrap();
    let r = solver.solve(&tree, None, Domain::new(90.0, 270.0)).unwrap();
    assert_eq!(r.len(), 1);
    assert!((r[0].approx - 180.0).abs() < 1e-6);
}

fn approx_in(src: &str, domain: Domain) -> Vec<f64> {
    roots_in(src, domain).into_iter().map(|r| r.approx).collect()
}

fn assert_close(got: &[f64], want: &[f64], tol: f64) {
    assert_eq!(got.len(), want.len(), "{got:?} vs {want:?}");
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < tol, "{got:?} vs {want:?}");
    }
}

#[test]
fn every_reported_root_zeroes_the_residual() {
    let cases: [(&str, fn(f64) -> f64); 6] = [
        ("(x+1)^20*(x+2)^20 = 1", |x| ((x + 1.0) * (x + 2.0)).powi(20) - 1.0),
        ("(x+1)^12*(x-2)^12 = 5", |x| ((x + 1.0) * (x - 2.0)).powi(12) - 5.0),
        ("x^7 - 3x^5 + x - 1", |x| x.powi(7) - 3.0 * x.powi(5) + x - 1.0),
        ("(x^2-2)*(x^2-3)*(x-1/3)", |x| (x * x - 2.0) * (x * x - 3.0) * (x - 1.0 / 3.0)),
        ("x^5 = pi", |x| x.powi(5) - std::f64::consts::PI),
        ("(x-1)^2*(x+4)^3*(x^2-7)", |x| (x - 1.0).powi(2) * (x + 4.0).powi(3) * (x * x - 7.0)),
    ];
    for (src, f) in cases {
        let found = roots(src);
        assert!(!found.is_empty(), "{src}");
        for root in found {
            let x = root.approx;
            let h = 1e-6 * (1.0 + x.abs());
            let crosses = (f(x - h) < 0.0) != (f(x + h) < 0.0);
            let touches = f(x).abs() <= f(x - h).abs().min(f(x + h).abs());
            assert!(crosses || touches, "{src}: {x} is not a root");
        }
    }
}

#[test]
fn clustered_high_degree_roots() {
    let golden = [(-3.0 - 5f64.sqrt()) / 2.0, (5f64.sqrt() - 3.0) / 2.0];
    assert_close(&approx_in("(x+1)^20*(x+2)^20 = 1", Domain::default()), &golden, 1e-9);
    assert_close(&approx_in("(x+1)^64*(x+2)^64 = 1", Domain::default()), &golden, 1e-9);
}

#[test]
fn products_past_the_degree_cap_stay_within_the_timeout() {
    let config = SolverConfig::default();
    let tree = parse("(x+1)^64*(x+2)^64*(x+3)^64 = 1", "x").unwrap();
    let started = Instant::now();
    let found = Solver::new(config.clone()).solve(&tree, None, Domain::default()).unwrap();
    assert!(started.elapsed() < config.timeout(), "took {:?}", started.elapsed());

    assert_eq!(found.len(), 2, "{found:?}");
    for root in found {
        let x = root.approx;
        let g = (x + 1.0) * (x + 2.0) * (x + 3.0);
        assert!((g.abs() - 1.0).abs() < 1e-9, "{x}");
    }
}

#[test]
fn polynomial_expansion_counts_against_the_budget() {
    let tree = parse("(x+1)^60 = 1", "x").unwrap();
    let tight = Solver::new(SolverConfig {
        max_steps: 3,
        ..SolverConfig::default()
    });
    assert!(tight.solve(&tree, None, Domain::default()).unwrap().is_empty());

    let found: Vec<String> = Solver::default()
        .solve(&tree, None, Domain::default())
        .unwrap()
        .into_iter()
        .map(|r| r.exact)
        .collect();
    assert_eq!(found, vec!["-2", "0"]);
}

#[test]
fn degree_mode_folds_constants_in_degrees() {
    let solver = Solver::new(SolverConfig {
        angle_unit: graphcalc_eval::AngleUnit::Degrees,
        ..SolverConfig::default()
    });
    let tree = parse("x = sin(30)", "x").unwrap();
    let r = solver.solve(&tree, None, Domain::default()).unwrap();
    assert_eq!(r.len(), 1);
    assert!((r[0].approx - 0.5).abs() < 1e-12, "{}", r[0].approx);
    assert_eq!(r[0].exact, "0.5");

    let r = Solver::default().solve(&tree, None, Domain::default()).unwrap();
    assert!((r[0].approx - 30f64.sin()).abs() < 1e-12);
}

#[test]
fn touching_roots_of_transcendental_residuals() {
    let pi = std::f64::consts::PI;
    assert_close(
        &approx_in("sin(x)^2 = 0", Domain::default()),
        &[-3.0 * pi, -2.0 * pi, -pi, 0.0, pi, 2.0 * pi, 3.0 * pi],
        1e-6,
    );
    assert_close(&approx_in("cos(x) = 1", Domain::default()), &[-2.0 * pi, 0.0, 2.0 * pi], 1e-6);
    assert_close(&approx_in("exp(x)*(x-1)^2 = 0", Domain::default()), &[1.0], 1e-6);
}

#[test]
fn near_tangent_without_contact_has_no_root() {
    assert!(roots("sin(x)^2 + 0.001 = 0").is_empty());
    assert!(roots("cos(x) = 1.001").is_empty());
}
