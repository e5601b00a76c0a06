use chrono::{TimeZone, Utc};
use graphcalc_model::{deserialize, serialize, Comment, GraphDefinition, GraphLibrary};
use graphcalc_scale::{Domain, ScaleMode};
use proptest::prelude::*;

fn full_graph() -> GraphDefinition {
    let created = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let mut g = GraphDefinition::new("wave", "sin(2*pi*t/1000)", "t", Domain::new(0.0, 1000.0), ScaleMode::Parametric)
        .with_range(Domain::new(-1.5, 1.5))
        .with_millisecond_mode(true)
        .with_created_at(created);
    g.push_comment(Comment::new("teacher-1", "label the period", created));
    g.push_comment(Comment::new(
        "teacher-2",
        "nice",
        Utc.timestamp_opt(1_700_000_100, 1).unwrap(),
    ));
    g
}

#[test]
fn value_round_trip_is_lossless() {
    let g = full_graph();
    let back = deserialize(serialize(&g).unwrap()).unwrap();
    assert_eq!(back, g);
    assert!(back.millisecond_mode);
    assert_eq!(back.comments[1].text, "nice");
    assert_eq!(back.created_at.timestamp_subsec_nanos(), 123_456_789);
}

#[test]
fn json_text_round_trip() {
    let g = GraphDefinition::new("p", "x^2", "x", Domain::new(-2.0, 2.0), ScaleMode::Log);
    let text = g.to_json().unwrap();
    assert_eq!(GraphDefinition::from_json(&text).unwrap(), g);
}

#[test]
fn library_keeps_order() {
    let mut lib = GraphLibrary::new();
    lib.upsert(full_graph());
    lib.upsert(GraphDefinition::new("a-second", "x", "x", Domain::default(), ScaleMode::Linear));
    let text = lib.to_json().unwrap();
    assert!(text.trim_start().starts_with('['));
    let back = GraphLibrary::from_json(&text).unwrap();
    assert_eq!(back, lib);
    assert_eq!(back.names().collect::<Vec<_>>(), vec!["wave", "a-second"]);
}

#[test]
fn missing_expression_is_an_error() {
    assert!(GraphDefinition::from_json(r#"{"name": "x"}"#).is_err());
}

// Every finite f64, both signs, subnormals included
fn finite() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

fn domain() -> impl Strategy<Value = Domain> {
    (finite(), finite()).prop_map(|(start, end)| Domain::new(start, end))
}

proptest! {
    #[test]
    fn json_text_keeps_every_bit_of_a_domain(d in domain(), r in domain()) {
        let g = GraphDefinition::new("g", "x", "x", d, ScaleMode::Linear).with_range(r);
        let back = GraphDefinition::from_json(&g.to_json().unwrap()).unwrap();
        prop_assert_eq!(back.domain.start.to_bits(), d.start.to_bits());
        prop_assert_eq!(back.domain.end.to_bits(), d.end.to_bits());
        prop_assert_eq!(back, g);
    }

    #[test]
    fn library_text_keeps_every_bit(domains in prop::collection::vec(domain(), 1..8)) {
        let mut lib = GraphLibrary::new();
        for (i, d) in domains.iter().enumerate() {
            lib.upsert(GraphDefinition::new(format!("g{i}"), "x", "x", *d, ScaleMode::Linear));
        }
        let back = GraphLibrary::from_json(&lib.to_json().unwrap()).unwrap();
        prop_assert_eq!(back, lib);
    }
}

#[test]
fn awkward_floats_survive_json_text() {
    for v in [2.291_712_365_432_881e-9, 0.1 + 0.2, f64::MAX, f64::MIN_POSITIVE, 5e-324, -1.7976931348623157e308] {
        let g = GraphDefinition::new("g", "x", "x", Domain::new(v, -v), ScaleMode::Linear);
        let back = GraphDefinition::from_json(&g.to_json().unwrap()).unwrap();
        assert_eq!(back.domain.start.to_bits(), v.to_bits(), "{v:e}");
    }
}
