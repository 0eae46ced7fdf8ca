use crate::report::{ReportSink, RunReport};
use std::path::{Path, PathBuf};

pub fn write_junit(report: &RunReport, out: &Path) -> anyhow::Result<()> {
    let failures = report.records.iter().filter(|r| r.failed > 0).count();
    let time = report
        .summary
        .as_ref()
        .map(|s| s.elapsed_ms as f64 / 1000.0)
        .unwrap_or_default();

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<testsuite name="{}" tests="{}" failures="{}" time="{:.3}">"#,
        escape(&report.suite),
        report.records.len(),
        failures,
        time
    ));
    xml.push('\n');

    for r in &report.records {
        let classname = r.module.as_deref().unwrap_or(&report.suite);
        xml.push_str(&format!(
            r#"  <testcase name="{}" classname="{}" assertions="{}">"#,
            escape(&r.name),
            escape(classname),
            r.total
        ));
        if r.failed > 0 {
            let messages: Vec<&str> = r.failures().map(|a| a.message.as_str()).collect();
            xml.push_str(&format!(
                r#"<failure message="{} of {} assertions failed">{}</failure>"#,
                r.failed,
                r.total,
                escape(&messages.join("\n"))
            ));
        }
        xml.push_str("</testcase>\n");
    }

    xml.push_str("</testsuite>\n");
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, xml)?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[derive(Debug, Clone)]
pub struct JunitSink {
    path: PathBuf,
}

impl JunitSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JunitSink {
    fn run_finished(&mut self, report: &RunReport) -> anyhow::Result<()> {
        write_junit(report, &self.path)
    }
}
