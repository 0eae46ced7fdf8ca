//! Tests run strictly one after another, whatever their bodies schedule.

mod common;

use common::FlatHost;
use lockstep_core::{Harness, HarnessConfig};
use std::cell::RefCell;
use std::rc::Rc;

fn harness() -> Harness {
    common::init_tracing();
    Harness::new(
        HarnessConfig::default(),
        FlatHost::new(&[("main", ""), ("foo", ""), ("bar", "")]),
    )
}

#[test]
fn phases_never_interleave() {
    let mut h = harness();
    let log = Rc::new(RefCell::new(Vec::new()));

    for name in ["a", "b", "c"] {
        let l = log.clone();
        h.test(name, move |h| {
            l.borrow_mut().push(format!("{name}:start"));
            let token = h.block(false)?;
            let l = l.clone();
            // later tests get shorter delays; they must still wait their turn
            let delay = match name {
                "a" => 300,
                "b" => 200,
                _ => 100,
            };
            h.set_timeout(delay, move |h| {
                l.borrow_mut().push(format!("{name}:end"));
                h.ok(true, name);
                h.unblock(token).unwrap();
            });
            Ok(())
        });
    }

    let report = h.run_to_completion().unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["a:start", "a:end", "b:start", "b:end", "c:start", "c:end"]
    );
    assert_eq!(h.now_ms(), 600);
    let names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(report.summary.unwrap().total, 3);
}

#[test]
fn summary_is_the_last_step() {
    let mut h = harness();
    let seen = Rc::new(RefCell::new(None));
    let s = seen.clone();
    h.test("only", move |h| {
        *s.borrow_mut() = Some(h.report().summary.is_some());
        Ok(())
    });
    h.run_all();
    assert_eq!(*seen.borrow(), Some(false));
    assert!(h.report().summary.is_some());
    assert!(h.report().summary.as_ref().unwrap().to_string().ends_with("0 of 0 failed"));
}

#[test]
fn element_helpers_reach_the_host() {
    let host = FlatHost::new(&[("main", ""), ("foo", ""), ("bar", "")]);
    let events = host.events.clone();
    let mut h = Harness::new(HarnessConfig::default(), host);

    h.test("elements", |h| {
        h.element_found("div", &["main", "foo", "bar"], "all divs");
        h.element_found("#foo", &["foo"], "by id");
        let foo = h.host().element_by_id("foo").unwrap();
        h.trigger_event(&foo, "click")?;
        let (found, expected) = (h.q(&["foo", "missing"]), h.q(&["foo", "gone"]));
        h.assert_sequence(found, expected, "null for unknown ids");
        Ok(())
    });

    let report = h.run_to_completion().unwrap();
    let record = &report.records[0];
    assert_eq!(record.failed, 0, "{:?}", record.assertions);
    assert_eq!(record.assertions[0].message, "all divs (div)");
    assert_eq!(*events.borrow(), vec!["div#foo:click".to_string()]);
}
