use crate::report::{ReportSink, RunReport};
use std::path::{Path, PathBuf};

pub fn write_json(report: &RunReport, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

/// Writes the finished report as pretty JSON.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonSink {
    fn run_finished(&mut self, report: &RunReport) -> anyhow::Result<()> {
        write_json(report, &self.path)
    }
}
