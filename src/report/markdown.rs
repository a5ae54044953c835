//! Markdown report renderer
//!
//! Produces a review document with a summary table, level breakdown,
//! per-page findings and the logo rules left for human review.

use crate::engine::scoring::ComplianceStatus;
use crate::engine::AuditReport;
use crate::inspection::{InspectionLevel, InspectionResult};
use crate::BrandGuardResult;
use std::collections::BTreeMap;

/// Render an audit report as Markdown
pub fn render(report: &AuditReport) -> BrandGuardResult<String> {
    let run = &report.run;
    let mut md = String::with_capacity(8192);

    md.push_str("# Brand Compliance Report\n\n");

    md.push_str("| Field | Value |\n|---|---|\n");
    md.push_str(&format!("| **Document** | `{}` |\n", truncate(&run.document_name, 80)));
    md.push_str(&format!(
        "| **Brand Kit** | v{} (`{}`) |\n",
        run.kit_version,
        truncate(&run.kit_digest, 12)
    ));
    md.push_str(&format!("| **Score** | **{}** / 100 |\n", run.score));
    md.push_str(&format!("| **Status** | {} |\n", status_badge(run.status)));
    md.push_str(&format!("| **Pages Audited** | {} |\n", report.pages_audited));
    md.push_str(&format!("| **Regions Evaluated** | {} |\n", report.regions_evaluated));
    if report.regions_skipped > 0 {
        md.push_str(&format!(
            "| **Regions Skipped** | {} (malformed bounding box) |\n",
            report.regions_skipped
        ));
    }
    md.push_str(&format!("| **Duration** | {}ms |\n", report.duration_ms));
    if !report.gate_passed {
        md.push_str("| **Policy Gate** | ❌ **FAILED** |\n");
    }
    md.push('\n');

    // Summary
    md.push_str("## Summary\n\n");
    let findings: Vec<&InspectionResult> = run.results.iter().filter(|r| !r.is_pass()).collect();
    if findings.is_empty() {
        md.push_str(&format!(
            "✅ **No brand violations.** {} check(s) passed.\n\n",
            run.results.len()
        ));
    } else {
        md.push_str(&format!(
            "⚠️ **{} finding(s)** out of {} check(s).\n\n",
            findings.len(),
            run.results.len()
        ));
        md.push_str("| Level | Count |\n|---|---:|\n");
        for level in [InspectionLevel::Critical, InspectionLevel::Medium, InspectionLevel::Low] {
            let count = findings.iter().filter(|r| r.level() == level).count();
            if count > 0 {
                md.push_str(&format!("| {} | {} |\n", level_icon(level), count));
            }
        }
        md.push('\n');
    }

    // Findings by page
    if !findings.is_empty() {
        md.push_str("## Findings\n\n");
        let mut by_page: BTreeMap<u32, Vec<&InspectionResult>> = BTreeMap::new();
        for r in &findings {
            by_page.entry(r.page_number()).or_default().push(r);
        }
        for (page, results) in by_page {
            md.push_str(&format!("### Page {}\n\n", page));
            md.push_str("| Level | Type | Location (x, y, w, h) | Message |\n");
            md.push_str("|-------|------|----------------------|---------|\n");
            for r in results {
                let c = r.coordinates();
                md.push_str(&format!(
                    "| {} | `{}` | {:.2}, {:.2}, {:.2}, {:.2} | {} |\n",
                    level_icon(r.level()),
                    r.inspection_type(),
                    c.x,
                    c.y,
                    c.width,
                    c.height,
                    truncate(&r.message().replace('|', "\\|"), 160)
                ));
            }
            md.push('\n');
        }
    }

    if !report.review_items.is_empty() {
        md.push_str("## Manual Review\n\n");
        md.push_str("These logo rules cannot be verified automatically:\n\n");
        for item in &report.review_items {
            md.push_str(&format!("- {}\n", item));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(&format!(
        "*Generated by brandguard v{} · run `{}` · content digest `{}`*\n",
        report.engine_version,
        run.id,
        truncate(&run.content_digest, 16)
    ));

    Ok(md)
}

fn level_icon(level: InspectionLevel) -> &'static str {
    match level {
        InspectionLevel::Critical => "🔴 Critical",
        InspectionLevel::Medium => "🟡 Medium",
        InspectionLevel::Low => "🔵 Low",
        InspectionLevel::Pass => "✅ Pass",
    }
}

fn status_badge(status: ComplianceStatus) -> &'static str {
    match status {
        ComplianceStatus::Compliant => "✅ Compliant",
        ComplianceStatus::ActionRequired => "🟡 Action Required",
        ComplianceStatus::Critical => "🔴 Critical",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(max).collect::<String>())
    }
}
