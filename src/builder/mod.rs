//! BrandKitBuilder: guideline pages in, validated BrandKit out
//!
//! The interpretation capability is asked for a record matching a fixed
//! schema, but its output is treated as untrusted input. Every field is
//! validated before it reaches the kit:
//!
//! ```text
//!  colors[].hex        ──► ^#?[0-9A-Fa-f]{6}$      (drop + warn on mismatch)
//!  colors[].usage      ──► CORE|SECONDARY|ACCENT    (invalid → SECONDARY + warn)
//!  typography[].weights──► weight vocabulary       (unknown kept verbatim)
//!  logoRules[].polarity──► DO|DONT                  (drop + warn on mismatch)
//!  colorTolerance      ──► finite, > 0              (else policy default)
//! ```
//!
//! Ingestion only fails when nothing usable survives: no colors and no
//! typography.

use crate::ai::{InterpretCapability, SchemaContract};
use crate::brand::{
    BrandColor, BrandKit, BrandLogoRule, BrandTypography, ColorUsage, LogoPolarity, VoiceProfile,
    DEFAULT_COLOR_TOLERANCE,
};
use crate::ingest::{PageContent, RetryPolicy};
use crate::{BrandGuardError, BrandGuardResult, Stage};
use serde_json::Value;
use std::sync::Arc;

/// Schema contract for guideline interpretation
pub fn brand_kit_contract() -> SchemaContract {
    SchemaContract {
        name: "brand_kit",
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "colors": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["hex"],
                        "properties": {
                            "name": { "type": "string" },
                            "hex": { "type": "string", "pattern": "^#?[0-9A-Fa-f]{6}$" },
                            "usage": { "enum": ["CORE", "SECONDARY", "ACCENT"] },
                            "textColorRule": { "type": "string" }
                        }
                    }
                },
                "typography": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["family", "weights"],
                        "properties": {
                            "family": { "type": "string" },
                            "weights": { "type": "array", "items": { "type": "string" } },
                            "useCase": { "type": "string" }
                        }
                    }
                },
                "logoRules": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["text", "polarity"],
                        "properties": {
                            "text": { "type": "string" },
                            "polarity": { "enum": ["DO", "DONT"] }
                        }
                    }
                },
                "voice": {
                    "type": "object",
                    "properties": {
                        "attributes": { "type": "array", "items": { "type": "string" } },
                        "forbiddenKeywords": { "type": "array", "items": { "type": "string" } }
                    }
                },
                "colorTolerance": { "type": "number" }
            },
            "required": ["colors", "typography"]
        }),
        instructions: "Extract the brand kit from the brand guideline below.\n\n\
            - `colors`: every palette color with its hex value. `usage` is CORE for the \
            primary brand colors, SECONDARY for supporting colors and ACCENT for highlights. \
            Include any rule about which text color may sit on it as `textColorRule`.\n\
            - `typography`: every approved font family with its allowed weights and what it \
            is used for (headlines, body, ...).\n\
            - `logoRules`: every logo usage rule, with `polarity` DO for requirements and \
            DONT for prohibitions. Quote aspect ratios exactly (e.g. \"4:1\").\n\
            - `voice`: tone-of-voice attributes and any words or phrases the brand never uses.\n\
            - `colorTolerance`: only if the guideline states an explicit color tolerance."
            .to_string(),
    }
}

/// Turns extracted guideline pages into a [`BrandKit`]
pub struct BrandKitBuilder {
    capability: Arc<dyn InterpretCapability>,
    retry: RetryPolicy,
    default_tolerance: f64,
}

impl BrandKitBuilder {
    pub fn new(capability: Arc<dyn InterpretCapability>) -> Self {
        Self {
            capability,
            retry: RetryPolicy::default(),
            default_tolerance: DEFAULT_COLOR_TOLERANCE,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Tolerance used when the guideline does not state one
    pub fn with_default_tolerance(mut self, tolerance: f64) -> Self {
        if tolerance.is_finite() && tolerance > 0.0 {
            self.default_tolerance = tolerance;
        }
        self
    }

    /// Build a kit from guideline pages. One interpretation call per
    /// guideline; transient capability failures are retried.
    pub async fn build(&self, pages: &[PageContent]) -> BrandGuardResult<BrandKit> {
        if !pages.iter().any(has_guideline_signal) {
            return Err(BrandGuardError::SchemaValidation {
                cause: "guideline contains no extractable text or color samples".to_string(),
            });
        }

        let contract = brand_kit_contract();
        tracing::info!(
            "Interpreting {} guideline page(s) via {}",
            pages.len(),
            self.capability.name()
        );

        let raw = self
            .retry
            .run("interpret guideline", || {
                self.capability.interpret(pages, &contract)
            })
            .await
            .map_err(|e| {
                BrandGuardError::extraction(
                    Stage::Build,
                    format!("{} failed: {}", self.capability.name(), e),
                )
            })?;

        self.validate(&raw)
    }

    /// Validate an untrusted interpretation record into a kit
    pub fn validate(&self, raw: &Value) -> BrandGuardResult<BrandKit> {
        if !raw.is_object() {
            return Err(BrandGuardError::SchemaValidation {
                cause: "interpretation did not return an object".to_string(),
            });
        }

        let colors = parse_colors(raw);
        let typography = parse_typography(raw);

        if colors.is_empty() && typography.is_empty() {
            return Err(BrandGuardError::SchemaValidation {
                cause: "guideline yielded no colors and no typography".to_string(),
            });
        }
        if colors.is_empty() {
            tracing::warn!("Guideline yielded no colors; accepting partial brand kit");
        }
        if typography.is_empty() {
            tracing::warn!("Guideline yielded no typography; accepting partial brand kit");
        }

        let logo_rules = parse_logo_rules(raw);
        let voice = parse_voice(raw);
        let tolerance = raw
            .get("colorTolerance")
            .and_then(Value::as_f64)
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or(self.default_tolerance);

        let mut kit = BrandKit::from_parts(colors, typography, logo_rules, voice, Some(tolerance));
        if let Some(name) = non_empty_str(raw.get("name")) {
            kit = kit.with_name(name);
        }

        tracing::info!(
            "Built brand kit: {} colors, {} families, {} logo rules ({} machine-checkable ratios), {} forbidden keywords",
            kit.colors.len(),
            kit.typography.len(),
            kit.logo.rules.len(),
            kit.logo.allowed_ratios.len(),
            kit.voice.forbidden_keywords.len()
        );
        Ok(kit)
    }
}

// ─── Field Validation ──────────────────────────────────────────────

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn items<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|e| non_empty_str(Some(e)))
            .collect(),
        // "Bold, Regular" as a single string
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_colors(raw: &Value) -> Vec<BrandColor> {
    let mut colors = Vec::new();
    for entry in items(raw, "colors") {
        let name = non_empty_str(entry.get("name")).unwrap_or_default();
        let Some(hex) = non_empty_str(entry.get("hex")) else {
            tracing::warn!("Dropping color '{}': no hex value", name);
            continue;
        };

        let usage = match non_empty_str(entry.get("usage")) {
            None => ColorUsage::Secondary,
            Some(raw_usage) => ColorUsage::parse(&raw_usage).unwrap_or_else(|| {
                tracing::warn!(
                    "Color '{}' has unknown usage '{}'; treating as SECONDARY",
                    name,
                    raw_usage
                );
                ColorUsage::Secondary
            }),
        };

        match BrandColor::new(name.as_str(), &hex, usage) {
            Some(color) => {
                let color = match non_empty_str(entry.get("textColorRule")) {
                    Some(rule) => color.with_text_rule(rule),
                    None => color,
                };
                colors.push(color);
            }
            None => tracing::warn!("Dropping color '{}': invalid hex '{}'", name, hex),
        }
    }
    colors
}

fn parse_typography(raw: &Value) -> Vec<BrandTypography> {
    let mut fonts = Vec::new();
    for entry in items(raw, "typography") {
        let Some(family) = non_empty_str(entry.get("family")) else {
            tracing::warn!("Dropping typography entry without a family");
            continue;
        };
        let weights = string_list(entry.get("weights"));
        let use_case = non_empty_str(entry.get("useCase"));
        match BrandTypography::new(&family, &weights, use_case) {
            Some(font) => fonts.push(font),
            None => tracing::warn!("Dropping typography '{}': no allowed weights", family),
        }
    }
    fonts
}

fn parse_logo_rules(raw: &Value) -> Vec<BrandLogoRule> {
    let mut rules = Vec::new();
    for entry in items(raw, "logoRules") {
        let Some(text) = non_empty_str(entry.get("text")) else {
            continue;
        };
        let polarity = non_empty_str(entry.get("polarity"))
            .as_deref()
            .and_then(LogoPolarity::parse);
        match polarity {
            Some(polarity) => rules.push(BrandLogoRule::new(text, polarity)),
            None => tracing::warn!("Dropping logo rule '{}': polarity is not DO or DONT", text),
        }
    }
    rules
}

/// A page can feed interpretation if any region carries text or a color
/// sample (swatch pages have no text at all)
fn has_guideline_signal(page: &PageContent) -> bool {
    page.regions.iter().any(|r| {
        r.text.as_deref().is_some_and(|t| !t.trim().is_empty())
            || r.color.as_deref().is_some_and(|c| !c.trim().is_empty())
    })
}

fn parse_voice(raw: &Value) -> VoiceProfile {
    let voice = raw.get("voice");
    let attributes = string_list(voice.and_then(|v| v.get("attributes")));
    let mut keywords = string_list(voice.and_then(|v| v.get("forbiddenKeywords")));
    // Tolerate a flat top-level list
    keywords.extend(string_list(raw.get("forbiddenKeywords")));
    VoiceProfile::new(attributes, keywords)
}
