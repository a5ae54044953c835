//! Report generation: JSON and Markdown output
//!
//! Transforms an `AuditReport` into machine-readable JSON (the flat
//! per-finding records consumers read) or a human-readable Markdown review
//! document.

pub mod json;
pub mod markdown;

use crate::engine::AuditReport;
use crate::BrandGuardResult;
use std::path::Path;

/// Output format for the audit report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Structured JSON (machine-readable)
    Json,
    /// Markdown with summary, per-page findings and review items
    Markdown,
}

/// Write a report in the specified format
pub fn write_report(report: &AuditReport, format: ReportFormat, output: &Path) -> BrandGuardResult<()> {
    let content = render_report(report, format)?;
    std::fs::write(output, content)?;
    tracing::info!("Wrote {:?} report to {}", format, output.display());
    Ok(())
}

/// Render a report to a string
pub fn render_report(report: &AuditReport, format: ReportFormat) -> BrandGuardResult<String> {
    match format {
        ReportFormat::Json => json::render(report),
        ReportFormat::Markdown => markdown::render(report),
    }
}
