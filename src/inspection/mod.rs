//! Inspection findings: the audit engine's output records
//!
//! One `InspectionResult` per (region, check). Absence of a problem is a
//! PASS-level record, never an omission, so the audit trail is complete.
//! Records are immutable once emitted: fields are private and only the
//! engine constructs them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slack allowed on `x + width` / `y + height` for extractor rounding
pub const BBOX_EPSILON: f64 = 1e-3;

// ─── Location ──────────────────────────────────────────────────────

/// Region location relative to page size, all components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Validate and build. `None` when any component is non-finite, outside
    /// [0, 1], or the box spills past the page edge by more than epsilon.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Option<Self> {
        let bbox = Self { x, y, width, height };
        bbox.is_valid().then_some(bbox)
    }

    pub fn is_valid(&self) -> bool {
        let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        unit(self.x)
            && unit(self.y)
            && unit(self.width)
            && unit(self.height)
            && self.x + self.width <= 1.0 + BBOX_EPSILON
            && self.y + self.height <= 1.0 + BBOX_EPSILON
    }

    /// Top-to-bottom, then left-to-right
    pub fn reading_order(&self, other: &Self) -> std::cmp::Ordering {
        self.y
            .total_cmp(&other.y)
            .then_with(|| self.x.total_cmp(&other.x))
    }
}

// ─── Taxonomy ──────────────────────────────────────────────────────

/// What aspect of the brand a finding concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionType {
    Color,
    Font,
    Logo,
    Spacing,
    Imagery,
    TextBody,
}

impl std::fmt::Display for InspectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Color => write!(f, "COLOR"),
            Self::Font => write!(f, "FONT"),
            Self::Logo => write!(f, "LOGO"),
            Self::Spacing => write!(f, "SPACING"),
            Self::Imagery => write!(f, "IMAGERY"),
            Self::TextBody => write!(f, "TEXT_BODY"),
        }
    }
}

/// Finding severity. `Pass` is the "nothing wrong" level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionLevel {
    Pass,
    Low,
    Medium,
    Critical,
}

impl std::fmt::Display for InspectionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    Pass,
    Fail,
}

impl From<InspectionLevel> for InspectionStatus {
    /// PASS iff level is PASS
    fn from(level: InspectionLevel) -> Self {
        match level {
            InspectionLevel::Pass => Self::Pass,
            _ => Self::Fail,
        }
    }
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

// ─── Finding ───────────────────────────────────────────────────────

/// A single finding tied to a page region.
///
/// Serialized as the flat record
/// `{id, pageNumber, type, message, level, status, coordinates:{x,y,width,height}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionResult {
    id: String,
    page_number: u32,
    #[serde(rename = "type")]
    inspection_type: InspectionType,
    message: String,
    level: InspectionLevel,
    status: InspectionStatus,
    coordinates: BoundingBox,
}

impl InspectionResult {
    pub(crate) fn new(
        page_number: u32,
        inspection_type: InspectionType,
        level: InspectionLevel,
        message: impl Into<String>,
        coordinates: BoundingBox,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            page_number,
            inspection_type,
            message: message.into(),
            level,
            status: InspectionStatus::from(level),
            coordinates,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 1-based
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn inspection_type(&self) -> InspectionType {
        self.inspection_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn level(&self) -> InspectionLevel {
        self.level
    }

    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn coordinates(&self) -> BoundingBox {
        self.coordinates
    }

    pub fn is_pass(&self) -> bool {
        self.status == InspectionStatus::Pass
    }

    /// Everything except the id: equal across re-audits of the same input
    pub fn content_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{:.6},{:.6},{:.6},{:.6}",
            self.page_number,
            self.inspection_type,
            self.level,
            self.message,
            self.coordinates.x,
            self.coordinates.y,
            self.coordinates.width,
            self.coordinates.height
        )
    }
}

impl std::fmt::Display for InspectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[p{} {} {}] {}",
            self.page_number, self.inspection_type, self.level, self.message
        )
    }
}
