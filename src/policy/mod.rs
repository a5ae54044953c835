//! Policy engine: `.brandguard.toml` project configuration
//!
//! Controls extraction bounds (page ceiling, retries, timeouts), default
//! color tolerance, logo ratio tolerance, which checks run, and the gate a
//! run must clear (minimum score, fail on CRITICAL). This is what makes an
//! audit usable as a CI step.

use crate::engine::scoring::ComplianceStatus;
use crate::ingest::{ExtractionLimits, RetryPolicy, DEFAULT_MAX_PAGES};
use crate::inspection::InspectionType;
use crate::{BrandGuardError, BrandGuardResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Project-level configuration (loaded from `.brandguard.toml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Documents with more pages are rejected before extraction
    pub max_pages: usize,

    /// Retries after the first attempt on transient capability failures
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_factor: u32,

    /// Per-request timeout for capability calls
    pub request_timeout_secs: u64,

    /// ΔE tolerance when the guideline states none
    pub default_color_tolerance: f64,

    /// Relative slack on logo aspect ratios (0.05 = ±5%)
    pub logo_ratio_tolerance: f64,

    /// Checks to skip entirely, e.g. `["TEXT_BODY"]`
    pub disabled_checks: Vec<InspectionType>,

    /// Gate: minimum score for the run to pass
    pub min_score: u8,

    /// Gate: any CRITICAL status fails the run
    pub fail_on_critical: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_retries: 2,
            backoff_base_ms: 1000,
            backoff_factor: 2,
            request_timeout_secs: 60,
            default_color_tolerance: crate::brand::DEFAULT_COLOR_TOLERANCE,
            logo_ratio_tolerance: crate::engine::checks::DEFAULT_LOGO_RATIO_TOLERANCE,
            disabled_checks: vec![],
            min_score: 0,
            fail_on_critical: true,
        }
    }
}

/// Evaluates audit runs against project policy
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    config: PolicyConfig,
    disabled: HashSet<InspectionType>,
}

impl PolicyEngine {
    /// Load policy from a TOML file
    pub fn from_file(path: &Path) -> BrandGuardResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PolicyConfig = toml::from_str(&content).map_err(|e| {
            BrandGuardError::PolicyError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Self::validated(config)
    }

    /// Try `.brandguard.toml`, then `brandguard.toml`, else defaults
    pub fn from_project_root(root: &Path) -> Self {
        for file_name in [".brandguard.toml", "brandguard.toml"] {
            let policy_path = root.join(file_name);
            if !policy_path.exists() {
                continue;
            }
            match Self::from_file(&policy_path) {
                Ok(engine) => {
                    tracing::info!("Loaded policy from {}", policy_path.display());
                    return engine;
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}; using defaults", policy_path.display(), e);
                }
            }
        }
        Self::new(PolicyConfig::default())
    }

    pub fn new(config: PolicyConfig) -> Self {
        let disabled = config.disabled_checks.iter().copied().collect();
        Self { config, disabled }
    }

    /// Reject values that would make the engine misbehave
    fn validated(config: PolicyConfig) -> BrandGuardResult<Self> {
        if config.max_pages == 0 {
            return Err(BrandGuardError::PolicyError("max_pages must be at least 1".into()));
        }
        if !(config.default_color_tolerance.is_finite() && config.default_color_tolerance > 0.0) {
            return Err(BrandGuardError::PolicyError(
                "default_color_tolerance must be a positive number".into(),
            ));
        }
        if !(config.logo_ratio_tolerance.is_finite() && config.logo_ratio_tolerance >= 0.0) {
            return Err(BrandGuardError::PolicyError(
                "logo_ratio_tolerance must be a non-negative number".into(),
            ));
        }
        if config.min_score > 100 {
            return Err(BrandGuardError::PolicyError("min_score must be within 0-100".into()));
        }
        Ok(Self::new(config))
    }

    pub fn is_check_enabled(&self, check: InspectionType) -> bool {
        !self.disabled.contains(&check)
    }

    /// Whether a run with this score and status clears the project gate
    pub fn gate(&self, score: u8, status: ComplianceStatus) -> bool {
        if self.config.fail_on_critical && status == ComplianceStatus::Critical {
            return false;
        }
        score >= self.config.min_score
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.config.max_retries,
            base_delay: Duration::from_millis(self.config.backoff_base_ms),
            factor: self.config.backoff_factor,
            attempt_timeout: Duration::from_secs(self.config.request_timeout_secs.max(1)),
            ..Default::default()
        }
    }

    pub fn extraction_limits(&self) -> ExtractionLimits {
        ExtractionLimits {
            max_pages: self.config.max_pages,
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}
