//! # BrandGuard Engine: stage orchestration
//!
//! The pipeline is a chain of explicit stage functions, each taking and
//! returning immutable data:
//!
//! - `ingest::DocumentTextExtractor`: document → pages (one capability call)
//! - `builder::BrandKitBuilder`: guideline pages → `BrandKit`
//! - `rules::ComplianceRuleSet::compile`: kit → read-only rule set
//! - [`AuditEngine`]: pages + rules → `InspectionResult[]` (rayon across pages)
//! - [`scoring`]: results → score + status
//! - [`history`]: append-only `AuditRun` record, in-flight guard
//!
//! [`BrandGuardEngine`] chains them for callers that want the whole flow.

pub mod checks;
pub mod history;
pub mod scoring;

use crate::ai::{ChatCapability, ChatCapabilityConfig, DocumentCapability, InterpretCapability};
use crate::brand::{BrandKit, BrandKitRegistry};
use crate::builder::BrandKitBuilder;
use crate::ingest::{Document, DocumentTextExtractor, PageContent};
use crate::inspection::{BoundingBox, InspectionResult};
use crate::policy::PolicyEngine;
use crate::rules::ComplianceRuleSet;
use crate::{BrandGuardError, BrandGuardResult};
use chrono::{DateTime, Utc};
use checks::{build_region_checks, RegionCheck, RegionContext, DEFAULT_LOGO_RATIO_TOLERANCE};
use history::{AuditHistory, InFlightAudits};
use rayon::prelude::*;
use scoring::ComplianceStatus;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

// ─── Audit Engine ──────────────────────────────────────────────────

/// Output of one audit pass over extracted pages
#[derive(Debug, Clone, Default)]
pub struct AuditOutcome {
    /// Page order, then reading order, then check order
    pub results: Vec<InspectionResult>,
    pub regions_evaluated: usize,
    /// Regions dropped for a missing or malformed bounding box
    pub regions_skipped: usize,
}

#[derive(Default)]
struct PageOutcome {
    results: Vec<InspectionResult>,
    evaluated: usize,
    skipped: usize,
}

/// Runs region checks over candidate pages
pub struct AuditEngine {
    checks: Vec<Box<dyn RegionCheck>>,
    logo_ratio_tolerance: f64,
}

impl AuditEngine {
    pub fn new() -> Self {
        Self {
            checks: build_region_checks(),
            logo_ratio_tolerance: DEFAULT_LOGO_RATIO_TOLERANCE,
        }
    }

    /// Checks disabled by policy are left out entirely
    pub fn from_policy(policy: &PolicyEngine) -> Self {
        let checks = build_region_checks()
            .into_iter()
            .filter(|c| policy.is_check_enabled(c.inspection_type()))
            .collect();
        Self {
            checks,
            logo_ratio_tolerance: policy.config().logo_ratio_tolerance,
        }
    }

    /// Audit pages against a compiled rule set. Pure; pages run in parallel
    /// and are collected back in page order.
    pub fn audit(&self, pages: &[PageContent], rules: &ComplianceRuleSet) -> AuditOutcome {
        let mut ordered: Vec<&PageContent> = pages.iter().collect();
        ordered.sort_by_key(|p| p.page_number);

        let per_page: Vec<PageOutcome> = ordered
            .par_iter()
            .map(|page| self.audit_page(page, rules))
            .collect();

        let mut outcome = AuditOutcome::default();
        for page in per_page {
            outcome.results.extend(page.results);
            outcome.regions_evaluated += page.evaluated;
            outcome.regions_skipped += page.skipped;
        }
        outcome
    }

    fn audit_page(&self, page: &PageContent, rules: &ComplianceRuleSet) -> PageOutcome {
        let mut out = PageOutcome::default();

        let mut regions: Vec<(BoundingBox, &crate::ingest::Region)> = Vec::with_capacity(page.regions.len());
        for (index, region) in page.regions.iter().enumerate() {
            match region.bbox.filter(BoundingBox::is_valid) {
                Some(bbox) => regions.push((bbox, region)),
                None => {
                    out.skipped += 1;
                    tracing::warn!(
                        "Page {}: skipping region {} ({:?}): missing or malformed bounding box",
                        page.page_number,
                        index,
                        region.kind
                    );
                }
            }
        }
        // Stable: regions at the same position keep extraction order
        regions.sort_by(|a, b| a.0.reading_order(&b.0));

        for (bbox, region) in regions {
            let ctx = RegionContext {
                page,
                region,
                bbox,
                rules,
                logo_ratio_tolerance: self.logo_ratio_tolerance,
            };
            let before = out.results.len();
            for check in &self.checks {
                if let Some(verdict) = check.evaluate(&ctx) {
                    out.results.push(InspectionResult::new(
                        page.page_number,
                        check.inspection_type(),
                        verdict.level,
                        verdict.message,
                        bbox,
                    ));
                }
            }
            if out.results.len() > before {
                out.evaluated += 1;
            } else {
                tracing::debug!(
                    "Page {}: region at ({:.3}, {:.3}) has nothing checkable",
                    page.page_number,
                    bbox.x,
                    bbox.y
                );
            }
        }
        out
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Audit Run ─────────────────────────────────────────────────────

/// One complete audit of a document against one kit version. Never
/// mutated after it is recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRun {
    pub id: Uuid,
    pub document_id: String,
    pub document_name: String,
    pub kit_id: Uuid,
    pub kit_version: u32,
    pub kit_digest: String,
    pub results: Vec<InspectionResult>,
    pub score: u8,
    pub status: ComplianceStatus,
    /// SHA-256 over result content (ids excluded): equal for identical audits
    pub content_digest: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// SHA-256 over each result's content key, in order
pub fn results_digest(results: &[InspectionResult]) -> String {
    let mut hasher = Sha256::new();
    for result in results {
        hasher.update(result.content_key().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Audit run plus the run-time context a report needs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub run: Arc<AuditRun>,
    pub pages_audited: usize,
    pub regions_evaluated: usize,
    pub regions_skipped: usize,
    /// Logo rules that were not machine-checked
    pub review_items: Vec<String>,
    /// Whether the run clears the project's policy gate
    pub gate_passed: bool,
    pub duration_ms: u64,
    pub engine_version: String,
}

// ─── Facade ────────────────────────────────────────────────────────

/// Chains extraction, kit building, compilation, audit and scoring
pub struct BrandGuardEngine {
    extractor: DocumentTextExtractor,
    builder: BrandKitBuilder,
    audit_engine: AuditEngine,
    policy: PolicyEngine,
    registry: BrandKitRegistry,
    history: AuditHistory,
    in_flight: Arc<InFlightAudits>,
}

impl BrandGuardEngine {
    pub fn new(
        document: Arc<dyn DocumentCapability>,
        interpret: Arc<dyn InterpretCapability>,
        policy: PolicyEngine,
    ) -> Self {
        let extractor = DocumentTextExtractor::new(document)
            .with_limits(policy.extraction_limits())
            .with_retry(policy.retry_policy());
        let builder = BrandKitBuilder::new(interpret)
            .with_retry(policy.retry_policy())
            .with_default_tolerance(policy.config().default_color_tolerance);
        Self {
            extractor,
            builder,
            audit_engine: AuditEngine::from_policy(&policy),
            policy,
            registry: BrandKitRegistry::new(),
            history: AuditHistory::new(),
            in_flight: Arc::new(InFlightAudits::new()),
        }
    }

    /// Engine backed by the chat capability, keys from the environment
    pub fn with_chat_capability(policy: PolicyEngine) -> Self {
        let chat = Arc::new(ChatCapability::new(ChatCapabilityConfig {
            timeout_seconds: policy.config().request_timeout_secs,
            ..Default::default()
        }));
        Self::new(chat.clone(), chat, policy)
    }

    /// Chat-backed engine with policy loaded from `root`
    pub fn from_project_root(root: &Path) -> Self {
        Self::with_chat_capability(PolicyEngine::from_project_root(root))
    }

    pub fn registry(&self) -> &BrandKitRegistry {
        &self.registry
    }

    pub fn history(&self) -> &AuditHistory {
        &self.history
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// Guideline document → published brand kit (next version)
    pub async fn ingest_guidelines(&self, guideline: &Document) -> BrandGuardResult<Arc<BrandKit>> {
        tracing::info!("Ingesting guideline '{}'", guideline.name);
        let pages = self.extractor.extract(guideline).await?;
        let mut kit = self.builder.build(&pages).await?;
        if kit.name.is_none() {
            kit = kit.with_name(guideline.name.clone());
        }
        Ok(self.registry.publish(kit))
    }

    /// Audit a document against a specific published kit version
    pub async fn audit_version(&self, document: &Document, version: u32) -> BrandGuardResult<AuditReport> {
        let kit = self
            .registry
            .get(version)
            .ok_or(BrandGuardError::KitNotFound(version))?;
        self.audit(document, &kit).await
    }

    /// Audit a document against a kit. Duplicate concurrent audits of the
    /// same (document, kit version) are rejected; a run is recorded only
    /// when the audit completes.
    pub async fn audit(&self, document: &Document, kit: &BrandKit) -> BrandGuardResult<AuditReport> {
        let _guard = self
            .in_flight
            .try_acquire(&document.id, kit.version)
            .ok_or_else(|| BrandGuardError::AuditInProgress {
                document_id: document.id.clone(),
                kit_version: kit.version,
            })?;

        let start = std::time::Instant::now();
        let started_at = Utc::now();
        tracing::info!("═══════════════════════════════════════════════════════");
        tracing::info!("Audit: '{}' against kit v{}", document.name, kit.version);
        tracing::info!("═══════════════════════════════════════════════════════");

        let pages = self.extractor.extract(document).await?;
        let rules = ComplianceRuleSet::compile(kit);
        let outcome = self.audit_engine.audit(&pages, &rules);
        if outcome.regions_skipped > 0 {
            tracing::warn!(
                "{} region(s) skipped for malformed bounding boxes",
                outcome.regions_skipped
            );
        }

        let (score, status) = scoring::aggregate(&outcome.results);
        let gate_passed = self.policy.gate(score, status);
        let content_digest = results_digest(&outcome.results);
        let finding_count = outcome.results.iter().filter(|r| !r.is_pass()).count();

        let run = self.history.record(AuditRun {
            id: Uuid::new_v4(),
            document_id: document.id.clone(),
            document_name: document.name.clone(),
            kit_id: kit.id,
            kit_version: kit.version,
            kit_digest: rules.kit_digest.clone(),
            results: outcome.results,
            score,
            status,
            content_digest,
            started_at,
            completed_at: Utc::now(),
        });

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Audit complete: {} checks, {} findings, score={}/100 ({}), gate {}, {}ms",
            run.results.len(),
            finding_count,
            score,
            status,
            if gate_passed { "passed" } else { "FAILED" },
            duration_ms
        );

        Ok(AuditReport {
            run,
            pages_audited: pages.len(),
            regions_evaluated: outcome.regions_evaluated,
            regions_skipped: outcome.regions_skipped,
            review_items: rules.advisory_logo_rules.clone(),
            gate_passed,
            duration_ms,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Audit independent documents concurrently; one result per document,
    /// in input order
    pub async fn audit_batch(
        &self,
        documents: &[Document],
        kit: &BrandKit,
    ) -> Vec<BrandGuardResult<AuditReport>> {
        tracing::info!("Batch audit: {} document(s) against kit v{}", documents.len(), kit.version);
        futures::future::join_all(documents.iter().map(|doc| self.audit(doc, kit))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::{BrandColor, BrandTypography, ColorUsage, VoiceProfile};
    use crate::ingest::Region;
    use crate::inspection::{InspectionLevel, InspectionType};
    use crate::policy::PolicyConfig;

    fn rules() -> ComplianceRuleSet {
        let kit = BrandKit::from_parts(
            vec![BrandColor::new("Aubergine", "#4A154B", ColorUsage::Core).unwrap()],
            vec![BrandTypography::new("Lato", ["Bold"], None).unwrap()],
            vec![],
            VoiceProfile::new(vec![], vec!["guaranteed".into()]),
            Some(10.0),
        );
        ComplianceRuleSet::compile(&kit)
    }

    fn bbox(x: f64, y: f64) -> BoundingBox {
        BoundingBox::new(x, y, 0.2, 0.1).unwrap()
    }

    #[test]
    fn test_results_ordered_by_page_then_reading_order() {
        let pages = vec![
            PageContent::new(2, vec![Region::text(bbox(0.0, 0.0), "page two")]),
            PageContent::new(
                1,
                vec![
                    Region::text(bbox(0.5, 0.5), "bottom"),
                    Region::text(bbox(0.6, 0.1), "top right"),
                    Region::text(bbox(0.1, 0.1), "top left"),
                ],
            ),
        ];
        let outcome = AuditEngine::new().audit(&pages, &rules());
        let order: Vec<(u32, f64, f64)> = outcome
            .results
            .iter()
            .map(|r| (r.page_number(), r.coordinates().x, r.coordinates().y))
            .collect();
        assert_eq!(
            order,
            vec![(1, 0.1, 0.1), (1, 0.6, 0.1), (1, 0.5, 0.5), (2, 0.0, 0.0)]
        );
        assert_eq!(outcome.regions_evaluated, 4);
    }

    #[test]
    fn test_one_result_per_applicable_check_in_fixed_order() {
        let region = Region::text(bbox(0.1, 0.1), "Guaranteed")
            .with_color("#4A154B")
            .with_font("Lato", Some("Bold"));
        let outcome = AuditEngine::new().audit(&[PageContent::new(1, vec![region])], &rules());
        let types: Vec<InspectionType> = outcome.results.iter().map(|r| r.inspection_type()).collect();
        assert_eq!(
            types,
            vec![InspectionType::Color, InspectionType::Font, InspectionType::TextBody]
        );
        assert_eq!(outcome.results[2].level(), InspectionLevel::Critical);
    }

    #[test]
    fn test_malformed_regions_skipped() {
        let mut spilling = Region::text(bbox(0.0, 0.0), "spills");
        spilling.bbox = Some(BoundingBox { x: 0.9, y: 0.0, width: 0.5, height: 0.1 });
        let missing = Region {
            text: Some("no box".into()),
            ..Default::default()
        };
        let ok = Region::text(bbox(0.0, 0.0), "fine");
        let outcome = AuditEngine::new().audit(&[PageContent::new(1, vec![spilling, missing, ok])], &rules());
        assert_eq!(outcome.regions_skipped, 2);
        assert_eq!(outcome.results.len(), 1);
    }

    #[test]
    fn test_policy_disables_checks() {
        let policy = PolicyEngine::new(PolicyConfig {
            disabled_checks: vec![InspectionType::TextBody],
            ..Default::default()
        });
        let region = Region::text(bbox(0.1, 0.1), "Guaranteed").with_color("#4A154B");
        let outcome = AuditEngine::from_policy(&policy).audit(&[PageContent::new(1, vec![region])], &rules());
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].inspection_type(), InspectionType::Color);
    }

    #[test]
    fn test_results_digest_ignores_ids() {
        let pages = vec![PageContent::new(1, vec![Region::text(bbox(0.1, 0.1), "hello")])];
        let engine = AuditEngine::new();
        let a = engine.audit(&pages, &rules());
        let b = engine.audit(&pages, &rules());
        assert_ne!(a.results[0].id(), b.results[0].id());
        assert_eq!(results_digest(&a.results), results_digest(&b.results));
    }
}
