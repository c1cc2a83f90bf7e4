use pavise::{call, lit, tmpl, tref, var_of, ActionSink, EngineBuilder, FieldMap, Phase, ValueSeq};

struct Announce;

impl ActionSink for Announce {
    fn on_match(&mut self, rule: &str, values: &ValueSeq) {
        println!("ANNOUNCE {rule}: {values}");
    }
}

fn main() {
    let engine = EngineBuilder::new()
        .define("getField", &["name"], var_of(tref("name")))
        .rule(
            "early_probe",
            call(
                "rx",
                vec![lit("^POST$"), tmpl("getField", vec![lit("REQUEST_METHOD")])],
            ),
        )
        .rule(
            "leak_check",
            call(
                "rx",
                vec![lit("(?i)internal error"), tmpl("getField", vec![lit("RESPONSE_BODY")])],
            ),
        )
        .build()
        .expect("failed to build engine");

    for id in engine.rule_ids() {
        let phase = engine.rule_phase(id).expect("known rule");
        println!("{id} bound to {phase}");
    }

    let fields = FieldMap::new()
        .set("REQUEST_METHOD", "POST")
        .set_at("RESPONSE_BODY", Phase::ResponseBody, "Internal Error: db");

    let mut txn = engine.transaction(&fields);
    let mut sink = Announce;
    for phase in Phase::ALL {
        txn.advance_with(phase, &mut sink);
    }
}
