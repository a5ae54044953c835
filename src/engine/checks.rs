//! Region checks: one independent check per inspection type
//!
//! Each check decides whether it applies to a region and, if so, returns
//! exactly one verdict. The audit engine runs them in a fixed order
//! (COLOR, FONT, TEXT_BODY, LOGO, IMAGERY) so output is reproducible.

use crate::brand::{typography, Rgb};
use crate::ingest::{PageContent, Region, RegionKind};
use crate::inspection::{BoundingBox, InspectionLevel, InspectionType};
use crate::rules::ComplianceRuleSet;

/// Default relative tolerance on logo aspect ratios (±5%)
pub const DEFAULT_LOGO_RATIO_TOLERANCE: f64 = 0.05;

/// Everything a check may look at for one region
pub struct RegionContext<'a> {
    pub page: &'a PageContent,
    pub region: &'a Region,
    /// Validated box of `region`
    pub bbox: BoundingBox,
    pub rules: &'a ComplianceRuleSet,
    pub logo_ratio_tolerance: f64,
}

/// Outcome of one check on one region
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub level: InspectionLevel,
    pub message: String,
}

impl Verdict {
    fn new(level: InspectionLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    fn pass(message: impl Into<String>) -> Self {
        Self::new(InspectionLevel::Pass, message)
    }
}

/// A single check run against every region.
///
/// Checks are:
/// - **Stateless**: `evaluate()` takes `&self` and a read-only context
/// - **Thread-safe**: pages are evaluated in parallel via rayon
/// - **Total**: when a check applies, it yields exactly one verdict
pub trait RegionCheck: Send + Sync {
    fn inspection_type(&self) -> InspectionType;

    /// `None` when the check does not apply to this region
    fn evaluate(&self, ctx: &RegionContext<'_>) -> Option<Verdict>;
}

/// All checks, in output order
pub fn build_region_checks() -> Vec<Box<dyn RegionCheck>> {
    vec![
        Box::new(ColorCheck),
        Box::new(FontCheck),
        Box::new(TextBodyCheck),
        Box::new(LogoCheck),
        Box::new(ImageryCheck),
    ]
}

// ─── Color ─────────────────────────────────────────────────────────

/// Sampled color vs. nearest palette color, by CIE76 ΔE
pub struct ColorCheck;

impl RegionCheck for ColorCheck {
    fn inspection_type(&self) -> InspectionType {
        InspectionType::Color
    }

    fn evaluate(&self, ctx: &RegionContext<'_>) -> Option<Verdict> {
        let raw = ctx.region.color.as_deref()?;
        let Some(sample) = Rgb::from_hex(raw) else {
            tracing::warn!(
                "Page {}: ignoring unparseable sampled color '{}'",
                ctx.page.page_number,
                raw
            );
            return None;
        };
        let nearest = ctx.rules.nearest_color(sample)?;

        let tolerance = ctx.rules.color_tolerance;
        let distance = nearest.distance;
        let allowed = nearest.color;
        let named = format!("{} ({})", allowed.name, allowed.hex);
        let sample = sample.to_hex();

        let mut verdict = if distance <= tolerance {
            Verdict::pass(format!(
                "Color {} matches {} at ΔE {:.1} (tolerance {:.1})",
                sample, named, distance, tolerance
            ))
        } else if distance <= 2.0 * tolerance {
            Verdict::new(
                InspectionLevel::Medium,
                format!(
                    "Color {} is close to but outside the palette: nearest is {} at ΔE {:.1} (tolerance {:.1})",
                    sample, named, distance, tolerance
                ),
            )
        } else {
            Verdict::new(
                InspectionLevel::Critical,
                format!(
                    "Color {} is not a brand color: nearest is {} at ΔE {:.1} (tolerance {:.1})",
                    sample, named, distance, tolerance
                ),
            )
        };

        if let Some(rule) = &allowed.text_color_rule {
            verdict.message.push_str(&format!("; {} pairing rule: {}", allowed.name, rule));
        }
        Some(verdict)
    }
}

// ─── Font ──────────────────────────────────────────────────────────

/// Detected family/weight vs. the approved typography
pub struct FontCheck;

impl RegionCheck for FontCheck {
    fn inspection_type(&self) -> InspectionType {
        InspectionType::Font
    }

    fn evaluate(&self, ctx: &RegionContext<'_>) -> Option<Verdict> {
        let font = ctx.region.font.as_ref()?;
        let family = font.family.trim();
        if family.is_empty() || ctx.rules.families.is_empty() {
            return None;
        }

        let Some(allowed) = ctx.rules.family(family) else {
            let approved: Vec<&str> = ctx.rules.families.values().map(|f| f.family.as_str()).collect();
            return Some(Verdict::new(
                InspectionLevel::Critical,
                format!(
                    "Unrecognized font family '{}' (approved: {})",
                    family,
                    approved.join(", ")
                ),
            ));
        };

        let Some(raw_weight) = font.weight.as_deref().filter(|w| !w.trim().is_empty()) else {
            return Some(Verdict::pass(format!(
                "Font family {} is approved (weight not detected)",
                allowed.family
            )));
        };

        let weight = typography::normalize_weight(raw_weight);
        if allowed.weights.contains(&weight) {
            Some(Verdict::pass(format!("Font {} {} is approved", allowed.family, weight)))
        } else {
            let weights: Vec<&str> = allowed.weights.iter().map(String::as_str).collect();
            Some(Verdict::new(
                InspectionLevel::Medium,
                format!(
                    "Weight '{}' is not approved for {} (allowed: {})",
                    weight,
                    allowed.family,
                    weights.join(", ")
                ),
            ))
        }
    }
}

// ─── Text Body ─────────────────────────────────────────────────────

/// Region text vs. forbidden keywords (whole word, case-insensitive)
pub struct TextBodyCheck;

impl RegionCheck for TextBodyCheck {
    fn inspection_type(&self) -> InspectionType {
        InspectionType::TextBody
    }

    fn evaluate(&self, ctx: &RegionContext<'_>) -> Option<Verdict> {
        let text = ctx.region.text.as_deref().filter(|t| !t.trim().is_empty())?;
        let hits = ctx.rules.keyword_hits(text);
        if hits.is_empty() {
            return Some(Verdict::pass("No forbidden keywords"));
        }
        let quoted: Vec<String> = hits.iter().map(|k| format!("\"{}\"", k)).collect();
        Some(Verdict::new(
            InspectionLevel::Critical,
            format!("Forbidden keyword(s) found: {}", quoted.join(", ")),
        ))
    }
}

// ─── Logo ──────────────────────────────────────────────────────────

/// Logo aspect ratio vs. allowed ratios. Textual rules are quoted for
/// manual review and never change the verdict.
pub struct LogoCheck;

impl LogoCheck {
    /// Width/height in page units
    fn aspect_ratio(ctx: &RegionContext<'_>) -> Option<f64> {
        let width = ctx.bbox.width * ctx.page.width;
        let height = ctx.bbox.height * ctx.page.height;
        (width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite())
            .then(|| width / height)
    }
}

impl RegionCheck for LogoCheck {
    fn inspection_type(&self) -> InspectionType {
        InspectionType::Logo
    }

    fn evaluate(&self, ctx: &RegionContext<'_>) -> Option<Verdict> {
        if ctx.region.kind != RegionKind::Logo {
            return None;
        }
        let rules = ctx.rules;

        let ratio_note = if rules.logo_ratios.is_empty() {
            None
        } else {
            let allowed: Vec<String> = rules.logo_ratios.iter().map(|r| format!("{:.2}:1", r)).collect();
            let Some(ratio) = Self::aspect_ratio(ctx) else {
                return Some(Verdict::new(
                    InspectionLevel::Critical,
                    format!(
                        "Logo box has zero area; cannot match approved ratio(s) {}",
                        allowed.join(", ")
                    ),
                ));
            };
            let matched = rules
                .logo_ratios
                .iter()
                .find(|allowed| ((ratio - **allowed) / **allowed).abs() <= ctx.logo_ratio_tolerance);
            match matched {
                Some(allowed_ratio) => Some(format!(
                    "Logo aspect ratio {:.2}:1 matches approved {:.2}:1",
                    ratio, allowed_ratio
                )),
                None => {
                    return Some(Verdict::new(
                        InspectionLevel::Critical,
                        format!(
                            "Logo aspect ratio {:.2}:1 does not match approved ratio(s) {} within ±{:.0}%",
                            ratio,
                            allowed.join(", "),
                            ctx.logo_ratio_tolerance * 100.0
                        ),
                    ))
                }
            }
        };

        if !rules.advisory_logo_rules.is_empty() {
            let prefix = ratio_note.map(|n| format!("{}. ", n)).unwrap_or_default();
            return Some(Verdict::pass(format!(
                "{}Manual review needed for {} logo rule(s): {}",
                prefix,
                rules.advisory_logo_rules.len(),
                rules.advisory_logo_rules.join("; ")
            )));
        }

        Some(Verdict::pass(
            ratio_note.unwrap_or_else(|| "Logo present; no machine-checkable logo rules".to_string()),
        ))
    }
}

// ─── Imagery ───────────────────────────────────────────────────────

/// Records image regions so they appear in the audit trail. Imagery rules
/// need scene understanding and are not evaluated.
pub struct ImageryCheck;

impl RegionCheck for ImageryCheck {
    fn inspection_type(&self) -> InspectionType {
        InspectionType::Imagery
    }

    fn evaluate(&self, ctx: &RegionContext<'_>) -> Option<Verdict> {
        (ctx.region.kind == RegionKind::Image)
            .then(|| Verdict::pass("Image region recorded; imagery rules are not machine-checked"))
    }
}
