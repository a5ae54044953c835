//! Brand kit data model
//!
//! A `BrandKit` is the structured, machine-checkable form of a brand
//! guideline: palette, typography, logo rules and voice constraints.
//! Kits are built once per guideline ingestion and never mutated after;
//! re-ingestion publishes a new version through the [`registry`].

pub mod color;
pub mod typography;
pub mod registry;

pub use color::{canonical_hex, delta_e, Cmyk, Lab, Rgb};
pub use registry::BrandKitRegistry;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Default "close enough" threshold, in CIE76 ΔE units
pub const DEFAULT_COLOR_TOLERANCE: f64 = 10.0;

// ─── Colors ────────────────────────────────────────────────────────

/// Where a color sits in the palette hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorUsage {
    Core,
    Secondary,
    Accent,
}

impl ColorUsage {
    /// Set-membership parse; `None` for anything outside the enum
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "CORE" | "PRIMARY" => Some(Self::Core),
            "SECONDARY" => Some(Self::Secondary),
            "ACCENT" | "TERTIARY" => Some(Self::Accent),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColorUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => write!(f, "CORE"),
            Self::Secondary => write!(f, "SECONDARY"),
            Self::Accent => write!(f, "ACCENT"),
        }
    }
}

/// A single palette entry. `hex` is authoritative; `rgb`/`cmyk` are derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandColor {
    pub name: String,
    /// `#RRGGBB`, uppercase
    pub hex: String,
    pub rgb: Rgb,
    pub cmyk: Cmyk,
    pub usage: ColorUsage,
    /// Free-text pairing rule, e.g. "white text only"
    pub text_color_rule: Option<String>,
}

impl BrandColor {
    /// Build a color from an untrusted hex string. Returns `None` when the
    /// hex does not validate.
    pub fn new(name: impl Into<String>, hex: &str, usage: ColorUsage) -> Option<Self> {
        let hex = canonical_hex(hex)?;
        let rgb = Rgb::from_hex(&hex)?;
        Some(Self {
            name: name.into().trim().to_string(),
            hex,
            rgb,
            cmyk: rgb.to_cmyk(),
            usage,
            text_color_rule: None,
        })
    }

    pub fn with_text_rule(mut self, rule: impl Into<String>) -> Self {
        let rule = rule.into();
        self.text_color_rule = if rule.trim().is_empty() {
            None
        } else {
            Some(rule.trim().to_string())
        };
        self
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    /// Name for messages: the color name, or the hex when unnamed
    pub fn label(&self) -> &str {
        if self.has_name() {
            &self.name
        } else {
            &self.hex
        }
    }
}

// ─── Typography ────────────────────────────────────────────────────

/// An approved font family and its allowed weights
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandTypography {
    pub family: String,
    /// Never empty
    pub weights: BTreeSet<String>,
    pub use_case: Option<String>,
}

impl BrandTypography {
    /// Returns `None` when no usable weight is supplied.
    pub fn new<I, S>(family: &str, weights: I, use_case: Option<String>) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let family = family.split_whitespace().collect::<Vec<_>>().join(" ");
        if family.is_empty() {
            return None;
        }
        let weights: BTreeSet<String> = weights
            .into_iter()
            .map(|w| typography::normalize_weight(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        if weights.is_empty() {
            return None;
        }
        Some(Self {
            family,
            weights,
            use_case: use_case.filter(|u| !u.trim().is_empty()),
        })
    }
}

// ─── Logo ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogoPolarity {
    Do,
    Dont,
}

impl LogoPolarity {
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_uppercase();
        match key.as_str() {
            "DO" => Some(Self::Do),
            "DONT" | "DONOT" => Some(Self::Dont),
            _ => None,
        }
    }
}

static RATIO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?::|/|x|×|by)\s*(\d+(?:\.\d+)?)").expect("valid ratio regex")
});

static DECIMAL_RATIO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)aspect\s*ratio\D{0,12}?(\d+(?:\.\d+)?)").expect("valid decimal ratio regex")
});

/// A logo usage rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandLogoRule {
    pub text: String,
    pub polarity: LogoPolarity,
}

impl BrandLogoRule {
    pub fn new(text: impl Into<String>, polarity: LogoPolarity) -> Self {
        Self {
            text: text.into().trim().to_string(),
            polarity,
        }
    }

    /// Width/height ratio named by this rule, if it is machine-checkable.
    ///
    /// Only DO rules contribute allowed ratios; "don't stretch to 2:1" is
    /// a prohibition, not a whitelist entry.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.polarity != LogoPolarity::Do {
            return None;
        }
        if let Some(caps) = RATIO_PATTERN.captures(&self.text) {
            let w: f64 = caps[1].parse().ok()?;
            let h: f64 = caps[2].parse().ok()?;
            if w > 0.0 && h > 0.0 {
                return Some(w / h);
            }
            return None;
        }
        let caps = DECIMAL_RATIO_PATTERN.captures(&self.text)?;
        let ratio: f64 = caps[1].parse().ok()?;
        (ratio > 0.0).then_some(ratio)
    }
}

/// Logo rules plus the ratios extracted from the checkable ones
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoGuidelines {
    pub rules: Vec<BrandLogoRule>,
    /// Allowed width/height ratios (sorted, deduplicated)
    pub allowed_ratios: Vec<f64>,
}

impl LogoGuidelines {
    pub fn from_rules(rules: Vec<BrandLogoRule>) -> Self {
        let mut allowed_ratios: Vec<f64> = rules.iter().filter_map(|r| r.aspect_ratio()).collect();
        allowed_ratios.sort_by(|a, b| a.total_cmp(b));
        allowed_ratios.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        Self { rules, allowed_ratios }
    }

    /// Rules that cannot be verified mechanically and need a human
    pub fn advisory_rules(&self) -> impl Iterator<Item = &BrandLogoRule> {
        self.rules.iter().filter(|r| r.aspect_ratio().is_none())
    }
}

// ─── Voice ─────────────────────────────────────────────────────────

/// Verbal identity: tone attributes and words the brand never uses
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfile {
    pub attributes: Vec<String>,
    pub forbidden_keywords: BTreeSet<String>,
}

impl VoiceProfile {
    pub fn new<A, K>(attributes: A, forbidden_keywords: K) -> Self
    where
        A: IntoIterator<Item = String>,
        K: IntoIterator<Item = String>,
    {
        let mut seen = BTreeSet::new();
        let attributes = attributes
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && seen.insert(a.to_lowercase()))
            .collect();

        let mut seen_keywords = BTreeSet::new();
        let forbidden_keywords = forbidden_keywords
            .into_iter()
            .map(|k| k.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|k| !k.is_empty() && seen_keywords.insert(k.to_lowercase()))
            .collect();

        Self {
            attributes,
            forbidden_keywords,
        }
    }
}

// ─── Brand Kit ─────────────────────────────────────────────────────

/// Structured, machine-checkable brand rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandKit {
    pub id: Uuid,
    /// Assigned by the registry on publish; 0 for an unpublished kit
    pub version: u32,
    pub name: Option<String>,
    /// Unique by hex
    pub colors: Vec<BrandColor>,
    /// Unique by family (case-insensitive)
    pub typography: Vec<BrandTypography>,
    pub logo: LogoGuidelines,
    pub voice: VoiceProfile,
    /// ΔE threshold for a passing color match
    pub color_tolerance: f64,
    pub created_at: DateTime<Utc>,
}

impl BrandKit {
    /// Assemble a kit, enforcing the uniqueness invariants: colors are
    /// deduplicated by hex (first occurrence wins its slot, but a later
    /// duplicate's name fills an unnamed entry), typography by family
    /// (weights of duplicates are merged).
    pub fn from_parts(
        colors: Vec<BrandColor>,
        typography: Vec<BrandTypography>,
        logo_rules: Vec<BrandLogoRule>,
        voice: VoiceProfile,
        color_tolerance: Option<f64>,
    ) -> Self {
        let mut unique_colors: Vec<BrandColor> = Vec::with_capacity(colors.len());
        let mut color_slots: HashMap<String, usize> = HashMap::new();
        for color in colors {
            match color_slots.get(&color.hex) {
                Some(&slot) => {
                    let kept = &mut unique_colors[slot];
                    if !kept.has_name() && color.has_name() {
                        kept.name = color.name;
                    }
                    if kept.text_color_rule.is_none() {
                        kept.text_color_rule = color.text_color_rule;
                    }
                }
                None => {
                    color_slots.insert(color.hex.clone(), unique_colors.len());
                    unique_colors.push(color);
                }
            }
        }

        let mut unique_fonts: Vec<BrandTypography> = Vec::with_capacity(typography.len());
        let mut font_slots: HashMap<String, usize> = HashMap::new();
        for font in typography {
            let key = typography::family_key(&font.family);
            match font_slots.get(&key) {
                Some(&slot) => {
                    let kept = &mut unique_fonts[slot];
                    kept.weights.extend(font.weights);
                    if kept.use_case.is_none() {
                        kept.use_case = font.use_case;
                    }
                }
                None => {
                    font_slots.insert(key, unique_fonts.len());
                    unique_fonts.push(font);
                }
            }
        }

        let tolerance = color_tolerance
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or(DEFAULT_COLOR_TOLERANCE);

        Self {
            id: Uuid::new_v4(),
            version: 0,
            name: None,
            colors: unique_colors,
            typography: unique_fonts,
            logo: LogoGuidelines::from_rules(logo_rules),
            voice,
            color_tolerance: tolerance,
            created_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn color_by_hex(&self, hex: &str) -> Option<&BrandColor> {
        let hex = canonical_hex(hex)?;
        self.colors.iter().find(|c| c.hex == hex)
    }

    pub fn typography_for(&self, family: &str) -> Option<&BrandTypography> {
        let key = typography::family_key(family);
        self.typography
            .iter()
            .find(|t| typography::family_key(&t.family) == key)
    }

    /// Whether the kit carries anything checkable at all
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.typography.is_empty()
    }
}
