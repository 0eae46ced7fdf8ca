//! Test registration and the run lifecycle.
//!
//! Each registered test becomes two queue steps: the body, then the reporting step. Because
//! both go through the synchronization queue, a test that suspends the queue holds back its
//! own reporting and every later test until it resumes or times out.

use crate::errors::HarnessError;
use crate::harness::Harness;
use crate::report::RunReport;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub type TestBody = Box<dyn FnOnce(&mut Harness) -> anyhow::Result<()>>;

pub struct TestCase {
    pub name: String,
    pub module: Option<String>,
    pub body: TestBody,
    /// Hidden tests run their body but are never reported.
    pub hidden: bool,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&mut Harness) -> anyhow::Result<()> + 'static,
    {
        Self {
            name: name.into(),
            module: None,
            body: Box::new(body),
            hidden: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// `"<module> module: <name>"`, or the bare name outside a module.
    pub fn display_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{module} module: {}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Tests registered from now on belong to `name`.
    pub fn module(&mut self, name: impl Into<String>) {
        let name = name.into();
        debug!(module = %name, "module started");
        self.current_module = Some(name);
    }

    pub fn test<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: FnOnce(&mut Harness) -> anyhow::Result<()> + 'static,
    {
        let mut case = TestCase::new(name, body);
        case.module = self.current_module.clone();
        self.register(case);
    }

    pub fn hidden_test<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: FnOnce(&mut Harness) -> anyhow::Result<()> + 'static,
    {
        let mut case = TestCase::new(name, body).hidden();
        case.module = self.current_module.clone();
        self.register(case);
    }

    pub fn register(&mut self, case: TestCase) {
        if !case.hidden {
            if let Some(pause_ms) = self.config.pause_between_tests_ms {
                self.register(TestCase::new("pause", move |h: &mut Harness| {
                    let token = h.block(true)?;
                    h.unblock_after(token, pause_ms);
                    Ok(())
                })
                .hidden());
            }
        }

        let TestCase {
            name,
            module,
            body,
            hidden,
        } = case;
        let display_name = match &module {
            Some(m) => format!("{m} module: {name}"),
            None => name,
        };
        debug!(test = %display_name, hidden, "test registered");

        let label = display_name.clone();
        self.enqueue(move |h| h.execute_body(&label, body));
        self.enqueue(move |h| h.finish_test(&display_name, module.as_deref(), hidden));
    }

    /// Number of assertions the running test is expected to make.
    pub fn expect(&mut self, count: usize) {
        self.expected = Some(count);
    }

    fn execute_body(&mut self, name: &str, body: TestBody) {
        self.assertions.reset();
        self.expected = None;
        if let Err(e) = body(self) {
            let n = self.assertions.len() + 1;
            error!(test = %name, error = %e, "test died");
            self.assertions.record(false, format!("Died on test #{n}: {e}"));
        }
    }

    fn finish_test(&mut self, name: &str, module: Option<&str>, hidden: bool) {
        self.reset();
        let expected = self.expected.take();
        if hidden {
            self.assertions.reset();
            return;
        }
        if let Some(n) = expected {
            let ran = self.assertions.len();
            if n != ran {
                self.assertions.record(
                    false,
                    format!("Expected {n} assertions, but {ran} were run"),
                );
            }
        }
        let assertions = self.assertions.take();
        let record = self.reporter.report(name, module, assertions);
        debug!(test = %name, passed = record.passed, failed = record.failed, "test finished");
    }

    /// Start the run: snapshot the fixture, open the queue and append the final summary step.
    pub fn run_all(&mut self) {
        if self.started_at.is_some() {
            warn!("run_all called twice; ignoring");
            return;
        }
        info!(
            suite = %self.config.suite,
            steps = self.queue.len(),
            "test run started"
        );
        self.started_at = Some(Instant::now());
        if let Err(e) = self.fixture.snapshot(self.host.as_ref()) {
            warn!(
                container = %self.fixture.container_id(),
                error = %e,
                "fixture snapshot failed; tests are not isolated"
            );
        }
        self.queue.start();
        self.enqueue(Harness::finish_run);
    }

    fn finish_run(&mut self) {
        let elapsed_ms = self
            .started_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or_default();
        let virtual_ms = self.now_ms();
        let summary = self.reporter.finalize(elapsed_ms, virtual_ms);
        info!(
            elapsed_ms,
            virtual_ms,
            failed = summary.failed,
            total = summary.total,
            status = ?summary.status,
            "test run finished"
        );
    }

    /// `run_all`, then drive the virtual clock until no timers remain.
    pub fn run_to_completion(&mut self) -> Result<RunReport, HarnessError> {
        self.run_all();
        self.flush()?;
        if !self.reporter.is_finalized() {
            warn!(pending = self.queue.len(), "run did not finish; queue still blocked");
        }
        Ok(self.report().clone())
    }
}
