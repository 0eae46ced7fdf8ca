use crate::assert::AssertionCollector;
use crate::compare::Value;
use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::fixture::FixtureManager;
use crate::host::{ElementRef, Host, HostError};
use crate::queue::SyncQueue;
use crate::report::console::ConsoleSink;
use crate::report::json::JsonSink;
use crate::report::junit::JunitSink;
use crate::report::{ReportSink, Reporter, RunReport, Stats};
use crate::timers::TimerQueue;
use std::time::Instant;
use tracing::warn;

/// State of one test run.
///
/// Every component operation goes through this context: there is no ambient run state.
/// The harness is single-threaded; steps, test bodies and timer callbacks all receive
/// `&mut Harness` and run one at a time.
pub struct Harness {
    pub(crate) config: HarnessConfig,
    pub(crate) host: Box<dyn Host>,
    pub(crate) queue: SyncQueue,
    pub(crate) timers: TimerQueue,
    pub(crate) assertions: AssertionCollector,
    pub(crate) expected: Option<usize>,
    pub(crate) current_module: Option<String>,
    pub(crate) fixture: FixtureManager,
    pub(crate) reporter: Reporter,
    pub(crate) started_at: Option<Instant>,
}

impl Harness {
    /// Harness without report sinks. Records are still collected in [`Harness::report`].
    pub fn new(config: HarnessConfig, host: impl Host + 'static) -> Self {
        let fixture = FixtureManager::new(config.fixture_id.clone());
        let reporter = Reporter::new(&config.suite);
        Self {
            config,
            host: Box::new(host),
            queue: SyncQueue::default(),
            timers: TimerQueue::default(),
            assertions: AssertionCollector::default(),
            expected: None,
            current_module: None,
            fixture,
            reporter,
            started_at: None,
        }
    }

    /// Validate `config` and install the sinks its `report` section asks for.
    pub fn from_config(config: HarnessConfig, host: impl Host + 'static) -> Result<Self, HarnessError> {
        config.validate()?;
        let report = config.report.clone();
        let mut harness = Self::new(config, host);
        if report.console {
            harness.add_sink(ConsoleSink);
        }
        if let Some(path) = report.json {
            harness.add_sink(JsonSink::new(path));
        }
        if let Some(path) = report.junit {
            harness.add_sink(JunitSink::new(path));
        }
        Ok(harness)
    }

    pub fn add_sink(&mut self, sink: impl ReportSink + 'static) {
        self.reporter.add_sink(Box::new(sink));
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    /// Records and summary produced so far.
    pub fn report(&self) -> &RunReport {
        self.reporter.run_report()
    }

    pub fn stats(&self) -> Stats {
        self.reporter.stats()
    }

    pub fn current_module(&self) -> Option<&str> {
        self.current_module.as_deref()
    }

    /// Put the fixture container back to its run-start content.
    pub fn reset(&mut self) {
        if let Err(e) = self.fixture.restore(self.host.as_mut()) {
            warn!(
                container = %self.fixture.container_id(),
                error = %e,
                "fixture restore failed"
            );
        }
    }

    /// Elements with the given ids, `null` for ids the document does not know.
    pub fn q(&self, ids: &[&str]) -> Value {
        Value::Seq(
            ids.iter()
                .map(|id| self.host.element_by_id(id).into())
                .collect(),
        )
    }

    pub fn trigger_event(&mut self, element: &ElementRef, event_type: &str) -> Result<(), HostError> {
        self.host.dispatch_event(element, event_type)
    }
}
