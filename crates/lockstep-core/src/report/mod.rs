pub mod console;
pub mod json;
pub mod junit;

use crate::assert::AssertionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionDetail {
    pub status: AssertionStatus,
    pub message: String,
}

/// One finished, visible test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Display name, module prefix included.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    pub assertions: Vec<AssertionDetail>,
}

impl TestRecord {
    pub fn status(&self) -> RunStatus {
        if self.failed == 0 {
            RunStatus::Pass
        } else {
            RunStatus::Fail
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionDetail> {
        self.assertions
            .iter()
            .filter(|a| a.status == AssertionStatus::Fail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pass,
    Fail,
}

/// Aggregate assertion counts across the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Wall-clock time of the run.
    pub elapsed_ms: u64,
    /// Virtual clock at the end of the run; includes every simulated wait and timeout.
    #[serde(default)]
    pub virtual_ms: u64,
    pub failed: usize,
    pub total: usize,
    pub status: RunStatus,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ms, {} of {} failed",
            self.elapsed_ms, self.failed, self.total
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub records: Vec<TestRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

/// Receives records as tests finish and the full report when the run ends.
pub trait ReportSink {
    fn test_finished(&mut self, _record: &TestRecord) {}

    fn run_finished(&mut self, report: &RunReport) -> anyhow::Result<()>;
}

pub struct Reporter {
    stats: Stats,
    report: RunReport,
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Reporter {
    pub fn new(suite: &str) -> Self {
        Self {
            stats: Stats::default(),
            report: RunReport {
                run_id: uuid::Uuid::new_v4().to_string(),
                suite: suite.to_string(),
                started_at: Utc::now(),
                records: Vec::new(),
                summary: None,
            },
            sinks: Vec::new(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn run_report(&self) -> &RunReport {
        &self.report
    }

    pub fn is_finalized(&self) -> bool {
        self.report.summary.is_some()
    }

    /// Turn a finished test's assertions into a record and fold them into the stats.
    pub fn report(
        &mut self,
        name: &str,
        module: Option<&str>,
        assertions: Vec<AssertionResult>,
    ) -> TestRecord {
        let total = assertions.len();
        let failed = assertions.iter().filter(|a| !a.passed).count();
        self.stats.total += total;
        self.stats.failed += failed;

        let record = TestRecord {
            name: name.to_string(),
            module: module.map(str::to_string),
            passed: total - failed,
            failed,
            total,
            assertions: assertions
                .into_iter()
                .map(|a| AssertionDetail {
                    status: if a.passed {
                        AssertionStatus::Pass
                    } else {
                        AssertionStatus::Fail
                    },
                    message: a.message,
                })
                .collect(),
        };
        for sink in &mut self.sinks {
            sink.test_finished(&record);
        }
        self.report.records.push(record.clone());
        record
    }

    /// Close the run. Sink failures are logged; they never fail the run.
    pub fn finalize(&mut self, elapsed_ms: u64, virtual_ms: u64) -> RunSummary {
        let summary = RunSummary {
            elapsed_ms,
            virtual_ms,
            failed: self.stats.failed,
            total: self.stats.total,
            status: if self.stats.failed == 0 {
                RunStatus::Pass
            } else {
                RunStatus::Fail
            },
        };
        self.report.summary = Some(summary.clone());
        for sink in &mut self.sinks {
            if let Err(e) = sink.run_finished(&self.report) {
                warn!(error = %e, "report sink failed");
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn result(passed: bool, message: &str) -> AssertionResult {
        AssertionResult {
            passed,
            message: message.to_string(),
        }
    }

    #[derive(Default, Clone)]
    struct Recording {
        names: Rc<RefCell<Vec<String>>>,
        finished: Rc<RefCell<usize>>,
    }

    impl ReportSink for Recording {
        fn test_finished(&mut self, record: &TestRecord) {
            self.names.borrow_mut().push(record.name.clone());
        }

        fn run_finished(&mut self, _report: &RunReport) -> anyhow::Result<()> {
            *self.finished.borrow_mut() += 1;
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn report_partitions_and_accumulates() {
        let mut reporter = Reporter::new("suite");
        let record = reporter.report(
            "a",
            None,
            vec![result(true, "one"), result(false, "two"), result(true, "three")],
        );
        assert_eq!(reporter.run_report().records.last(), Some(&record));
        assert_eq!((record.passed, record.failed, record.total), (2, 1, 3));
        assert_eq!(record.status(), RunStatus::Fail);
        assert_eq!(record.failures().count(), 1);
        assert_eq!(record.assertions[1].status, AssertionStatus::Fail);

        reporter.report("b", Some("m"), vec![result(true, "ok")]);
        assert_eq!(reporter.stats(), Stats { total: 4, failed: 1 });
        assert_eq!(reporter.run_report().records.len(), 2);
    }

    #[test]
    fn finalize_summarizes_and_survives_sink_errors() {
        let mut reporter = Reporter::new("suite");
        let sink = Recording::default();
        reporter.add_sink(Box::new(sink.clone()));
        reporter.report("a", None, vec![result(true, "fine")]);

        let summary = reporter.finalize(12, 3_000);
        assert_eq!(summary.status, RunStatus::Pass);
        assert_eq!(summary.virtual_ms, 3_000);
        assert_eq!(summary.to_string(), "12 ms, 0 of 1 failed");
        assert!(reporter.is_finalized());
        assert_eq!(*sink.names.borrow(), vec!["a".to_string()]);
        assert_eq!(*sink.finished.borrow(), 1);
    }

    #[test]
    fn empty_test_passes() {
        let mut reporter = Reporter::new("suite");
        let record = reporter.report("nothing", None, Vec::new());
        assert_eq!(record.total, 0);
        assert_eq!(record.status(), RunStatus::Pass);
    }
}
