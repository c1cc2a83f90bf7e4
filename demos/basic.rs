use pavise::{call, lit, var, EngineBuilder, FieldMap, Phase};

fn main() {
    let engine = EngineBuilder::new()
        .rule(
            "method_is_get",
            call("rx", vec![lit("^GET$"), var("REQUEST_METHOD")]),
        )
        .rule(
            "sqli_probe",
            call("rx", vec![lit("(?i)union\\s+select"), var("REQUEST_URI")]),
        )
        .build()
        .expect("failed to build engine");

    println!("{engine}");

    let fields = FieldMap::new()
        .set("REQUEST_METHOD", "GET")
        .set("REQUEST_URI", "/search?q=1 UNION SELECT password");

    let mut txn = engine.transaction(&fields);
    for outcome in txn.advance(Phase::RequestHeader) {
        println!("{outcome}");
    }
}
