use std::sync::Arc;
use std::thread;

use pavise::{call, lit, var, EngineBuilder, FieldMap, Phase};

#[test]
fn shared_engine_evaluates_across_threads() {
    let engine = Arc::new(
        EngineBuilder::new()
            .rule(
                "method_get",
                call("rx", vec![lit("^GET$"), var("REQUEST_METHOD")]),
            )
            .rule(
                "uri_probe",
                call("rx", vec![lit("(?i)union"), var("REQUEST_URI")]),
            )
            .build()
            .unwrap(),
    );

    let mut handles = vec![];

    // Thread 1: plain GET, no probe.
    let shared = Arc::clone(&engine);
    handles.push(thread::spawn(move || {
        let fields = FieldMap::new()
            .set("REQUEST_METHOD", "GET")
            .set("REQUEST_URI", "/index.html");
        let mut txn = shared.transaction(&fields);
        let outcomes = txn.advance(Phase::RequestHeader);
        (outcomes[0].matched(), outcomes[1].matched())
    }));

    // Thread 2: POST carrying an injection probe.
    let shared = Arc::clone(&engine);
    handles.push(thread::spawn(move || {
        let fields = FieldMap::new()
            .set("REQUEST_METHOD", "POST")
            .set("REQUEST_URI", "/search?q=1+UNION+SELECT");
        let mut txn = shared.transaction(&fields);
        let outcomes = txn.advance(Phase::RequestHeader);
        (outcomes[0].matched(), outcomes[1].matched())
    }));

    // Thread 3: both conditions hold.
    let shared = Arc::clone(&engine);
    handles.push(thread::spawn(move || {
        let fields = FieldMap::new()
            .set("REQUEST_METHOD", "GET")
            .set("REQUEST_URI", "/q?x=union");
        let mut txn = shared.transaction(&fields);
        let outcomes = txn.advance(Phase::RequestHeader);
        (outcomes[0].matched(), outcomes[1].matched())
    }));

    let results: Vec<(bool, bool)> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    assert_eq!(results[0], (true, false));
    assert_eq!(results[1], (false, true));
    assert_eq!(results[2], (true, true));
}

#[test]
fn many_concurrent_transactions_stay_independent() {
    let engine = Arc::new(
        EngineBuilder::new()
            .rule("echo", var("REQUEST_URI"))
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let shared = Arc::clone(&engine);
            thread::spawn(move || {
                let uri = format!("/page/{i}");
                let fields = FieldMap::new().set("REQUEST_URI", uri.as_str());
                let mut txn = shared.transaction(&fields);
                let outcomes = txn.advance(Phase::RequestHeader);
                outcomes[0].values().unwrap().to_string()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let rendered = handle.join().expect("thread panicked");
        assert_eq!(rendered, format!("['/page/{i}']"));
    }
}
