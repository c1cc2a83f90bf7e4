//! End-to-end scenarios over the built-in operator set.

use pavise::{
    call, lit, tmpl, tref, var, var_of, ActionSink, EngineBuilder, FieldMap, Phase, TemplateDef,
    Value, ValueSeq,
};

#[derive(Default)]
struct Announcer {
    announced: Vec<(String, String)>,
}

impl ActionSink for Announcer {
    fn on_match(&mut self, rule: &str, values: &ValueSeq) {
        self.announced.push((rule.to_owned(), values.to_string()));
    }
}

#[test]
fn method_match_announces() {
    let engine = EngineBuilder::new()
        .rule_in(
            "basic1",
            Phase::RequestHeader,
            call("rx", vec![lit("GET"), var("REQUEST_METHOD")]),
        )
        .build()
        .unwrap();

    let fields = FieldMap::new().set("REQUEST_METHOD", "GET");
    let mut txn = engine.transaction(&fields);
    let mut sink = Announcer::default();
    let outcomes = txn.advance_with(Phase::RequestHeader, &mut sink);

    assert!(outcomes[0].matched());
    assert_eq!(sink.announced, vec![("basic1".to_owned(), "['GET']".to_owned())]);
}

#[test]
fn method_mismatch_is_empty_not_error() {
    let engine = EngineBuilder::new()
        .rule("basic1", call("rx", vec![lit("GET"), var("REQUEST_METHOD")]))
        .build()
        .unwrap();

    let fields = FieldMap::new().set("REQUEST_METHOD", "POST");
    let mut txn = engine.transaction(&fields);
    let outcomes = txn.advance(Phase::RequestHeader);

    assert!(!outcomes[0].matched());
    assert_eq!(outcomes[0].values(), Some(&ValueSeq::empty()));
}

#[test]
fn string_replace_wrapped_in_predicate() {
    // (p (string_replace_rx 'a' 'b' 'bar')) announces with value 'bbr'.
    let engine = EngineBuilder::new()
        .rule(
            "srr1",
            call(
                "string_replace_rx",
                vec![lit("a"), lit("b"), lit("bar")],
            ),
        )
        .build()
        .unwrap();

    let fields = FieldMap::new();
    let mut txn = engine.transaction(&fields);
    let outcomes = txn.advance(Phase::RequestHeader);
    assert_eq!(outcomes[0].values(), Some(&ValueSeq::one("bbr")));
}

#[test]
fn filtered_concatenation_preserves_order() {
    // rx 'a' over the concatenation of 'a', 'ab', 'cb' keeps the matching
    // inputs in order of appearance.
    let engine = EngineBuilder::new()
        .rule(
            "foperator",
            call(
                "rx",
                vec![
                    lit("a"),
                    call("cat", vec![lit("a"), lit("ab"), lit("cb")]),
                ],
            ),
        )
        .build()
        .unwrap();

    let fields = FieldMap::new();
    let mut txn = engine.transaction(&fields);
    let outcomes = txn.advance(Phase::RequestHeader);
    let values = outcomes[0].values().unwrap();
    assert_eq!(values.to_string(), "['a' 'ab']");
}

#[test]
fn get_field_template_equals_direct_var() {
    let get_field = TemplateDef::new("getField", &["name"], var_of(tref("name")));
    let engine = EngineBuilder::new()
        .template(get_field)
        .rule(
            "templated",
            call(
                "rx",
                vec![lit("GET"), tmpl("getField", vec![lit("REQUEST_METHOD")])],
            ),
        )
        .rule(
            "direct",
            call("rx", vec![lit("GET"), var("REQUEST_METHOD")]),
        )
        .build()
        .unwrap();

    // The two rules share one DAG root after expansion and interning.
    assert_eq!(engine.render_rule("templated"), engine.render_rule("direct"));

    let fields = FieldMap::new().set("REQUEST_METHOD", "GET");
    let mut txn = engine.transaction(&fields);
    let outcomes = txn.advance(Phase::RequestHeader);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].values(), outcomes[1].values());
    assert!(outcomes.iter().all(|o| o.matched()));
}

#[test]
fn concatenation_over_absent_fields_keeps_present_content() {
    let engine = EngineBuilder::new()
        .rule(
            "r",
            call("cat", vec![var("MISSING"), var("REQUEST_METHOD")]),
        )
        .build()
        .unwrap();

    let fields = FieldMap::new().set("REQUEST_METHOD", "GET");
    let mut txn = engine.transaction(&fields);
    let outcomes = txn.advance(Phase::RequestHeader);
    assert_eq!(outcomes[0].values(), Some(&ValueSeq::one("GET")));
}

#[test]
fn response_rule_waits_for_its_phase() {
    let engine = EngineBuilder::new()
        .rule(
            "body_probe",
            call("rx", vec![lit("(?i)select"), var("RESPONSE_BODY")]),
        )
        .build()
        .unwrap();
    assert_eq!(engine.rule_phase("body_probe"), Some(Phase::ResponseBody));

    let fields = FieldMap::new().set_at(
        "RESPONSE_BODY",
        Phase::ResponseBody,
        "SELECT * FROM users",
    );
    let mut txn = engine.transaction(&fields);

    assert!(txn.advance(Phase::RequestHeader).is_empty());
    assert!(txn.advance(Phase::RequestBody).is_empty());
    assert!(txn.advance(Phase::ResponseHeader).is_empty());

    let outcomes = txn.advance(Phase::ResponseBody);
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].matched());
}

#[test]
fn predicate_wrap_normalizes_match_to_bool() {
    let engine = EngineBuilder::new()
        .rule(
            "wrapped",
            call("p", vec![call("rx", vec![lit("GET"), var("REQUEST_METHOD")])]),
        )
        .build()
        .unwrap();

    let hit = FieldMap::new().set("REQUEST_METHOD", "GET");
    let mut txn = engine.transaction(&hit);
    let outcomes = txn.advance(Phase::RequestHeader);
    assert_eq!(outcomes[0].values(), Some(&ValueSeq::one(Value::Bool(true))));

    let miss = FieldMap::new().set("REQUEST_METHOD", "POST");
    let mut txn = engine.transaction(&miss);
    let outcomes = txn.advance(Phase::RequestHeader);
    assert_eq!(
        outcomes[0].values(),
        Some(&ValueSeq::one(Value::Bool(false)))
    );
    assert!(!outcomes[0].matched());
}

#[test]
fn capture_groups_extract_submatches() {
    let engine = EngineBuilder::new()
        .rule(
            "kv",
            call(
                "rx_capture",
                vec![lit("(\\w+)=(\\w+)"), var("REQUEST_URI")],
            ),
        )
        .build()
        .unwrap();

    let fields = FieldMap::new().set("REQUEST_URI", "/path?user=admin");
    let mut txn = engine.transaction(&fields);
    let outcomes = txn.advance(Phase::RequestHeader);
    assert_eq!(outcomes[0].values().unwrap().to_string(), "['user' 'admin']");
}

#[test]
fn list_field_values_flow_through_matchers() {
    let engine = EngineBuilder::new()
        .rule("r", call("rx", vec![lit("^a"), var("ARGS_GET")]))
        .build()
        .unwrap();

    let fields = FieldMap::new().set(
        "ARGS_GET",
        vec![
            Value::from("alpha"),
            Value::from("beta"),
            Value::from("attack"),
        ],
    );
    let mut txn = engine.transaction(&fields);
    let outcomes = txn.advance(Phase::RequestHeader);
    assert_eq!(outcomes[0].values().unwrap().to_string(), "['alpha' 'attack']");
}
