use crate::report::{ReportSink, RunReport, RunStatus, RunSummary, TestRecord};

/// One line per test: `✅ name (failed, passed, total)`.
#[must_use]
pub fn format_test_line(record: &TestRecord) -> String {
    let icon = match record.status() {
        RunStatus::Pass => "✅",
        RunStatus::Fail => "❌",
    };
    format!(
        "{} {} ({}, {}, {})",
        icon, record.name, record.failed, record.passed, record.total
    )
}

/// The test line followed by every failed assertion, indented.
#[must_use]
pub fn format_test_lines(record: &TestRecord) -> Vec<String> {
    let mut lines = vec![format_test_line(record)];
    for failure in record.failures() {
        for (i, part) in failure.message.lines().enumerate() {
            let bullet = if i == 0 { "    - " } else { "      " };
            lines.push(format!("{}{}", bullet, part.trim_start()));
        }
    }
    lines
}

#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    format!(
        "Tests completed in {} milliseconds. {} of {} assertions failed.",
        summary.elapsed_ms, summary.failed, summary.total
    )
}

/// Prints test lines and the closing summary to stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn test_finished(&mut self, record: &TestRecord) {
        for line in format_test_lines(record) {
            eprintln!("{}", line);
        }
    }

    fn run_finished(&mut self, report: &RunReport) -> anyhow::Result<()> {
        if let Some(summary) = &report.summary {
            eprintln!();
            eprintln!("{}", format_summary(summary));
        }
        Ok(())
    }
}
