//! JSON report renderer
//!
//! Findings are emitted as flat records:
//! `{id, pageNumber, type, message, level, status, coordinates:{x,y,width,height}}`.

use crate::engine::scoring::ComplianceStatus;
use crate::engine::AuditReport;
use crate::inspection::InspectionResult;
use crate::BrandGuardResult;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    run_id: String,
    document_id: &'a str,
    document_name: &'a str,
    kit_version: u32,
    kit_digest: &'a str,
    score: u8,
    status: ComplianceStatus,
    gate_passed: bool,
    pages_audited: usize,
    regions_evaluated: usize,
    regions_skipped: usize,
    review_items: &'a [String],
    results: &'a [InspectionResult],
    content_digest: &'a str,
    completed_at: String,
    engine_version: &'a str,
}

/// Render an audit report as pretty-printed JSON
pub fn render(report: &AuditReport) -> BrandGuardResult<String> {
    let run = &report.run;
    let doc = JsonReport {
        run_id: run.id.to_string(),
        document_id: &run.document_id,
        document_name: &run.document_name,
        kit_version: run.kit_version,
        kit_digest: &run.kit_digest,
        score: run.score,
        status: run.status,
        gate_passed: report.gate_passed,
        pages_audited: report.pages_audited,
        regions_evaluated: report.regions_evaluated,
        regions_skipped: report.regions_skipped,
        review_items: &report.review_items,
        results: &run.results,
        content_digest: &run.content_digest,
        completed_at: run.completed_at.to_rfc3339(),
        engine_version: &report.engine_version,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Just the finding records, as a JSON array
pub fn render_results(results: &[InspectionResult]) -> BrandGuardResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}
