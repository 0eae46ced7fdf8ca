//! Config-driven report sinks.

mod common;

use common::FlatHost;
use lockstep_core::{parse_config, Harness, RunStatus};

#[test]
fn config_installs_json_and_junit_sinks() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("out/report.json");
    let junit = dir.path().join("out/junit.xml");
    let yaml = format!(
        "version: 1\nsuite: sinks\nreport:\n  console: false\n  json: {}\n  junit: {}\n",
        json.display(),
        junit.display()
    );
    let cfg = parse_config(&yaml).unwrap();

    let mut h = Harness::from_config(cfg, FlatHost::new(&[("main", "")])).unwrap();
    h.module("io");
    h.test("writes", |h| {
        h.equals("2", 2, "loose by default");
        h.not_equals(1, 1, "same");
        Ok(())
    });
    let report = h.run_to_completion().unwrap();
    assert_eq!(report.summary.as_ref().unwrap().status, RunStatus::Fail);

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(parsed["suite"], "sinks");
    assert_eq!(parsed["run_id"], report.run_id.as_str());
    assert_eq!(parsed["records"][0]["name"], "io module: writes");
    assert_eq!(parsed["summary"]["failed"], 1);

    let xml = std::fs::read_to_string(&junit).unwrap();
    assert!(xml.contains(r#"classname="io""#));
    assert!(xml.contains("both arguments are: 1"));
}
