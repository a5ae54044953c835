//! Document ingestion: bytes in, page-indexed regions out
//!
//! `DocumentTextExtractor` wraps an external OCR/document-understanding
//! capability. It makes exactly one capability call per document (never
//! per page), retries transient failures, and enforces a page ceiling to
//! bound cost.
//!
//! ```text
//!  Document ──► format sniff ──► PDF page pre-flight ──► capability.extract
//!                  │ unknown          │ > max_pages          │ (retry/backoff)
//!                  ▼                  ▼                      ▼
//!            ExtractionError    ExtractionError     PageContent[] (sorted,
//!                                                    ceiling re-checked)
//! ```

pub mod detector;
pub mod retry;

pub use detector::DocumentFormat;
pub use retry::RetryPolicy;

use crate::ai::DocumentCapability;
use crate::inspection::BoundingBox;
use crate::{BrandGuardError, BrandGuardResult, Stage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Default page ceiling
pub const DEFAULT_MAX_PAGES: usize = 200;

// ─── Input ─────────────────────────────────────────────────────────

/// A document to ingest or audit
#[derive(Debug, Clone)]
pub struct Document {
    /// Caller-assigned identifier (used for in-flight tracking and history)
    pub id: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(id: impl Into<String>, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bytes,
        }
    }

    /// Read a document from disk; the file name doubles as id and name
    pub fn from_path(path: &Path) -> BrandGuardResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(path.display().to_string(), name, bytes))
    }

    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_magic_bytes(&self.bytes)
    }
}

// ─── Extracted Content ─────────────────────────────────────────────

/// What kind of content a region holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    #[default]
    Text,
    Logo,
    Image,
    Shape,
}

/// Font as detected on a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSample {
    pub family: String,
    #[serde(default)]
    pub weight: Option<String>,
}

/// One layout region on a page. The bounding box is left unvalidated
/// here: the audit engine skips regions whose box is missing or malformed.
/// A box that does not decode becomes `None` and an unknown kind becomes
/// `Shape`, so one bad region never rejects its page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(default, deserialize_with = "lenient_bbox")]
    pub bbox: Option<BoundingBox>,
    #[serde(default, deserialize_with = "lenient_kind")]
    pub kind: RegionKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub font: Option<FontSample>,
    /// Dominant color sampled from the region, as hex
    #[serde(default)]
    pub color: Option<String>,
}

fn lenient_bbox<'de, D>(deserializer: D) -> Result<Option<BoundingBox>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(raw) {
        Ok(bbox) => Ok(Some(bbox)),
        Err(e) => {
            tracing::debug!("Dropping undecodable region box: {}", e);
            Ok(None)
        }
    }
}

fn lenient_kind<'de, D>(deserializer: D) -> Result<RegionKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(RegionKind::default());
    }
    let kind = raw
        .as_str()
        .and_then(|k| serde_json::from_value(serde_json::Value::String(k.to_lowercase())).ok());
    Ok(kind.unwrap_or_else(|| {
        tracing::debug!("Unknown region kind {}, treating as shape", raw);
        RegionKind::Shape
    }))
}

impl Region {
    pub fn text(bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self {
            bbox: Some(bbox),
            kind: RegionKind::Text,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn logo(bbox: BoundingBox) -> Self {
        Self {
            bbox: Some(bbox),
            kind: RegionKind::Logo,
            ..Default::default()
        }
    }

    pub fn with_font(mut self, family: impl Into<String>, weight: Option<&str>) -> Self {
        self.font = Some(FontSample {
            family: family.into(),
            weight: weight.map(str::to_string),
        });
        self
    }

    pub fn with_color(mut self, hex: impl Into<String>) -> Self {
        self.color = Some(hex.into());
        self
    }

    pub fn with_kind(mut self, kind: RegionKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Page-indexed extraction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    /// 1-based
    pub page_number: u32,
    /// Page size in points (used to turn relative boxes into aspect ratios)
    #[serde(default = "default_page_width")]
    pub width: f64,
    #[serde(default = "default_page_height")]
    pub height: f64,
    #[serde(default)]
    pub regions: Vec<Region>,
}

/// US Letter
fn default_page_width() -> f64 {
    612.0
}
fn default_page_height() -> f64 {
    792.0
}

impl PageContent {
    pub fn new(page_number: u32, regions: Vec<Region>) -> Self {
        Self {
            page_number,
            width: default_page_width(),
            height: default_page_height(),
            regions,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// All region text on the page, in extraction order
    pub fn full_text(&self) -> String {
        self.regions
            .iter()
            .filter_map(|r| r.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ─── Extractor ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionLimits {
    pub max_pages: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Turns a document into page-indexed text + layout regions
#[derive(Clone)]
pub struct DocumentTextExtractor {
    capability: Arc<dyn DocumentCapability>,
    limits: ExtractionLimits,
    retry: RetryPolicy,
}

impl DocumentTextExtractor {
    pub fn new(capability: Arc<dyn DocumentCapability>) -> Self {
        Self {
            capability,
            limits: ExtractionLimits::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExtractionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Extract pages from a document. Pure apart from the single
    /// capability call.
    pub async fn extract(&self, document: &Document) -> BrandGuardResult<Vec<PageContent>> {
        if document.bytes.is_empty() {
            return Err(BrandGuardError::extraction(
                Stage::Extraction,
                format!("document '{}' is empty", document.name),
            ));
        }

        let format = document.format();
        if format == DocumentFormat::Unknown {
            return Err(BrandGuardError::extraction(
                Stage::Extraction,
                format!(
                    "document '{}' is not a PDF or supported image format",
                    document.name
                ),
            ));
        }

        if format == DocumentFormat::Pdf {
            if let Some(pages) = detector::count_pdf_pages(&document.bytes) {
                self.check_ceiling(document, pages)?;
            }
        }

        tracing::info!(
            "Extracting '{}' ({}, {} bytes) via {}",
            document.name,
            format,
            document.bytes.len(),
            self.capability.name()
        );

        let label = format!("extract '{}'", document.name);
        let mut pages = self
            .retry
            .run(&label, || self.capability.extract(document))
            .await
            .map_err(|e| {
                BrandGuardError::extraction(
                    Stage::Extraction,
                    format!("{} failed on '{}': {}", self.capability.name(), document.name, e),
                )
            })?;

        self.check_ceiling(document, pages.len())?;

        if let Some(bad) = pages.iter().find(|p| p.page_number == 0) {
            return Err(BrandGuardError::extraction(
                Stage::Extraction,
                format!(
                    "{} returned page number {} for '{}' (pages are 1-based)",
                    self.capability.name(),
                    bad.page_number,
                    document.name
                ),
            ));
        }
        pages.sort_by_key(|p| p.page_number);

        tracing::info!(
            "Extracted {} page(s), {} region(s) from '{}'",
            pages.len(),
            pages.iter().map(|p| p.regions.len()).sum::<usize>(),
            document.name
        );
        Ok(pages)
    }

    fn check_ceiling(&self, document: &Document, pages: usize) -> BrandGuardResult<()> {
        if pages > self.limits.max_pages {
            return Err(BrandGuardError::extraction(
                Stage::Extraction,
                format!(
                    "document '{}' has {} pages, exceeding the {}-page ceiling",
                    document.name, pages, self.limits.max_pages
                ),
            ));
        }
        Ok(())
    }
}
