//! Plain-text rendering of findings for terminals and logs.

use crate::enums::Severity;
use crate::finding::{Finding, Summary};
use serde_json::Value;
use std::fmt::Write;

fn tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "ERROR",
        Severity::Warning => "WARNING",
        Severity::Info => "INFO",
    }
}

/// Renders one finding:
///
/// ```text
/// [ERROR] Required field 'email' is hidden
///   <explanation>
///   at: steps[0].fields[1], steps[0].fields[1].showIf
///   reproducer: {"plan":"free"}
///   fix 1: ...
/// ```
pub fn format_finding(finding: &Finding) -> String {
    let mut out = format!("[{}] {}\n", tag(finding.severity), finding.title);
    if !finding.explanation.is_empty() {
        let _ = writeln!(out, "  {}", finding.explanation);
    }
    if !finding.json_paths.is_empty() {
        let _ = writeln!(out, "  at: {}", finding.json_paths.join(", "));
    }
    let _ = writeln!(
        out,
        "  reproducer: {}",
        Value::Object(finding.reproducer_state.clone())
    );
    for (i, fix) in finding.fix_guidance.iter().enumerate() {
        let _ = writeln!(out, "  fix {}: {}", i + 1, fix);
    }
    out
}

/// One line: total plus the count per severity.
pub fn format_summary(findings: &[Finding]) -> String {
    let s = Summary::of(findings);
    format!(
        "{} finding(s): {} error(s), {} warning(s), {} info",
        s.total(),
        s.errors,
        s.warnings,
        s.infos
    )
}
