//! # brandguard: Brand Compliance Extraction & Audit Engine
//!
//! Turns a brand-guideline document into a structured, machine-checkable
//! brand kit, then audits candidate documents (marketing PDFs, slides,
//! social images) against it, producing per-page, per-region findings
//! with severity, location and an aggregate compliance score.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      BrandGuardEngine                        │
//! │                                                              │
//! │  Document ──► DocumentTextExtractor ──► PageContent[]        │
//! │                (1 capability call,         │                 │
//! │                 retry + page ceiling)      │                 │
//! │                      ┌─────────────────────┴──────┐          │
//! │          guideline   ▼                  candidate ▼          │
//! │             BrandKitBuilder               AuditEngine        │
//! │          (interpret + validate)   (color/font/text/logo      │
//! │                      │              checks, rayon per page)  │
//! │                      ▼                        │              │
//! │          BrandKit ─► ComplianceRuleSet ───────┘              │
//! │        (registry,      (compiled once        │              │
//! │         versioned)      per audit)           ▼              │
//! │                                   InspectionResult[]         │
//! │                                              │              │
//! │                              ScoreAggregator ▼ AuditHistory  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! External OCR and language-understanding calls sit behind the
//! [`ai::DocumentCapability`] and [`ai::InterpretCapability`] traits, so
//! every deterministic stage runs in tests against fixed-output stubs.

pub mod ai;
pub mod brand;
pub mod builder;
pub mod engine;
pub mod ingest;
pub mod inspection;
pub mod policy;
pub mod report;
pub mod rules;

// Re-exports for convenience
pub use ai::{CapabilityError, DocumentCapability, InterpretCapability};
pub use brand::{BrandColor, BrandKit, BrandKitRegistry, BrandLogoRule, BrandTypography, ColorUsage};
pub use builder::BrandKitBuilder;
pub use engine::scoring::{aggregate, ComplianceStatus};
pub use engine::{AuditEngine, AuditReport, AuditRun, BrandGuardEngine};
pub use ingest::{Document, DocumentTextExtractor, PageContent, Region};
pub use inspection::{BoundingBox, InspectionLevel, InspectionResult, InspectionStatus, InspectionType};
pub use policy::{PolicyConfig, PolicyEngine};
pub use report::{render_report, write_report, ReportFormat};
pub use rules::ComplianceRuleSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage an error originated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extraction,
    Build,
    Compile,
    Audit,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extraction => write!(f, "extraction"),
            Self::Build => write!(f, "build"),
            Self::Compile => write!(f, "compile"),
            Self::Audit => write!(f, "audit"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BrandGuardError {
    /// Document unreadable, oversized, or the external capability failed permanently
    #[error("[{stage}] extraction failed: {cause}")]
    Extraction { stage: Stage, cause: String },

    /// Guideline yielded no usable structured data at all
    #[error("[build] schema validation failed: {cause}")]
    SchemaValidation { cause: String },

    #[error("[audit] audit already in flight for document '{document_id}' against kit v{kit_version}")]
    AuditInProgress { document_id: String, kit_version: u32 },

    #[error("[audit] brand kit v{0} not found")]
    KitNotFound(u32),

    #[error("Policy error: {0}")]
    PolicyError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl BrandGuardError {
    pub fn extraction(stage: Stage, cause: impl Into<String>) -> Self {
        Self::Extraction {
            stage,
            cause: cause.into(),
        }
    }

    /// Stage the error belongs to, when it is an engine-raised error
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Extraction { stage, .. } => Some(*stage),
            Self::SchemaValidation { .. } => Some(Stage::Build),
            Self::AuditInProgress { .. } | Self::KitNotFound(_) => Some(Stage::Audit),
            Self::PolicyError(_) | Self::Io(_) | Self::SerdeError(_) => None,
        }
    }
}

pub type BrandGuardResult<T> = Result<T, BrandGuardError>;
