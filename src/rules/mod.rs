//! ComplianceRuleSet: the compiled, read-only form of a BrandKit
//!
//! `compile` is pure and deterministic. Every lookup is a `BTreeMap` or
//! `BTreeSet`, so two compiles of the same kit serialize byte-for-byte
//! identically. The rule set carries the SHA-256 digest of the kit's
//! canonical content so an audit run names exactly which rules it was
//! scored against.
//!
//! Color distance is CIE76 ΔE in CIELAB (D65 white point); the tolerance
//! is expressed in the same ΔE units.

use crate::brand::{typography, BrandKit, Rgb};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// An allowed palette color, keyed by canonical hex in the rule set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedColor {
    pub hex: String,
    /// Canonical name; the hex when the kit leaves it unnamed
    pub name: String,
    pub rgb: Rgb,
    pub text_color_rule: Option<String>,
}

/// An approved family and its allowed weights
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedFamily {
    /// Display name as written in the kit
    pub family: String,
    pub weights: BTreeSet<String>,
}

/// Nearest allowed color to a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatch<'a> {
    pub color: &'a AllowedColor,
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRuleSet {
    pub kit_version: u32,
    /// SHA-256 of the kit's canonical content (hex)
    pub kit_digest: String,
    /// hex → allowed color
    pub colors: BTreeMap<String, AllowedColor>,
    /// ΔE threshold for PASS; MEDIUM up to twice this
    pub color_tolerance: f64,
    /// family key (case-folded) → allowed family
    pub families: BTreeMap<String, AllowedFamily>,
    /// Lower-cased forbidden keywords
    pub forbidden_keywords: BTreeSet<String>,
    /// Allowed logo width/height ratios
    pub logo_ratios: Vec<f64>,
    /// Logo rules that need human review, as "DO: …" / "DONT: …"
    pub advisory_logo_rules: Vec<String>,
    #[serde(skip)]
    keyword_matcher: OnceCell<Option<Regex>>,
}

impl PartialEq for ComplianceRuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.kit_version == other.kit_version
            && self.kit_digest == other.kit_digest
            && self.colors == other.colors
            && self.color_tolerance == other.color_tolerance
            && self.families == other.families
            && self.forbidden_keywords == other.forbidden_keywords
            && self.logo_ratios == other.logo_ratios
            && self.advisory_logo_rules == other.advisory_logo_rules
    }
}

impl ComplianceRuleSet {
    /// Compile a kit. No external calls.
    pub fn compile(kit: &BrandKit) -> Self {
        let colors: BTreeMap<String, AllowedColor> = kit
            .colors
            .iter()
            .map(|c| {
                (
                    c.hex.clone(),
                    AllowedColor {
                        hex: c.hex.clone(),
                        name: c.label().to_string(),
                        rgb: c.rgb,
                        text_color_rule: c.text_color_rule.clone(),
                    },
                )
            })
            .collect();

        let mut families: BTreeMap<String, AllowedFamily> = BTreeMap::new();
        for font in &kit.typography {
            families
                .entry(typography::family_key(&font.family))
                .and_modify(|f| f.weights.extend(font.weights.iter().cloned()))
                .or_insert_with(|| AllowedFamily {
                    family: font.family.clone(),
                    weights: font.weights.clone(),
                });
        }

        let forbidden_keywords: BTreeSet<String> = kit
            .voice
            .forbidden_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let advisory_logo_rules = kit
            .logo
            .advisory_rules()
            .map(|r| {
                let polarity = match r.polarity {
                    crate::brand::LogoPolarity::Do => "DO",
                    crate::brand::LogoPolarity::Dont => "DONT",
                };
                format!("{}: {}", polarity, r.text)
            })
            .collect();

        let rules = Self {
            kit_version: kit.version,
            kit_digest: kit_digest(kit),
            colors,
            color_tolerance: kit.color_tolerance,
            families,
            forbidden_keywords,
            logo_ratios: kit.logo.allowed_ratios.clone(),
            advisory_logo_rules,
            keyword_matcher: OnceCell::new(),
        };

        tracing::debug!(
            "Compiled rule set for kit v{} ({}): {} colors, {} families, {} keywords",
            rules.kit_version,
            &rules.kit_digest[..12],
            rules.colors.len(),
            rules.families.len(),
            rules.forbidden_keywords.len()
        );
        rules
    }

    /// Canonical name for an allowed hex
    pub fn color_name(&self, hex: &str) -> Option<&str> {
        let hex = crate::brand::canonical_hex(hex)?;
        self.colors.get(&hex).map(|c| c.name.as_str())
    }

    /// Nearest allowed color by ΔE. Ties resolve to the lowest hex.
    pub fn nearest_color(&self, sample: Rgb) -> Option<ColorMatch<'_>> {
        let lab = sample.to_lab();
        self.colors
            .values()
            .map(|c| ColorMatch {
                color: c,
                distance: lab.delta_e(&c.rgb.to_lab()),
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    pub fn family(&self, family: &str) -> Option<&AllowedFamily> {
        self.families.get(&typography::family_key(family))
    }

    /// Every distinct forbidden keyword found in `text`, as whole words,
    /// case-insensitively. Sorted.
    pub fn keyword_hits(&self, text: &str) -> Vec<String> {
        let Some(matcher) = self.keyword_matcher() else {
            return Vec::new();
        };
        let hits: BTreeSet<String> = matcher
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
            .collect();
        hits.into_iter().collect()
    }

    fn keyword_matcher(&self) -> Option<&Regex> {
        self.keyword_matcher
            .get_or_init(|| {
                if self.forbidden_keywords.is_empty() {
                    return None;
                }
                // Longest first so "risk free" wins over "risk"
                let mut keywords: Vec<&String> = self.forbidden_keywords.iter().collect();
                keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
                let alternation = keywords
                    .iter()
                    .map(|k| whole_word_pattern(k))
                    .collect::<Vec<_>>()
                    .join("|");
                match Regex::new(&format!(r"(?i)({})", alternation)) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::error!("Forbidden keyword matcher failed to compile: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }
}

/// SHA-256 over the kit's canonical JSON, excluding id and timestamp
pub fn kit_digest(kit: &BrandKit) -> String {
    let canonical = serde_json::json!({
        "version": kit.version,
        "colors": kit.colors,
        "typography": kit.typography,
        "logo": kit.logo,
        "voice": kit.voice,
        "colorTolerance": kit.color_tolerance,
    });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Escaped keyword whose neighbours must not be word characters. A word
/// edge takes `\b`; a punctuation edge ("100%", "#1") takes `\B`, which
/// holds exactly when the neighbour is also a non-word character.
fn whole_word_pattern(keyword: &str) -> String {
    let edge = |c: Option<char>| match c {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => r"\B",
    };
    format!(
        "{}{}{}",
        edge(keyword.chars().next()),
        regex::escape(keyword),
        edge(keyword.chars().next_back())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::{
        BrandColor, BrandLogoRule, BrandTypography, ColorUsage, LogoPolarity, VoiceProfile,
    };

    fn kit() -> BrandKit {
        BrandKit::from_parts(
            vec![
                BrandColor::new("Aubergine", "#4A154B", ColorUsage::Core)
                    .unwrap()
                    .with_text_rule("white text only"),
                BrandColor::new("", "#FFFFFF", ColorUsage::Secondary).unwrap(),
            ],
            vec![BrandTypography::new("Lato", ["Bold", "Regular"], None).unwrap()],
            vec![
                BrandLogoRule::new("Horizontal lockup 4:1", LogoPolarity::Do),
                BrandLogoRule::new("Never rotate the logo", LogoPolarity::Dont),
            ],
            VoiceProfile::new(vec![], vec!["Guaranteed".into(), "risk free".into()]),
            Some(10.0),
        )
    }

    #[test]
    fn test_compile_is_deterministic() {
        let kit = kit();
        let a = ComplianceRuleSet::compile(&kit);
        let b = ComplianceRuleSet::compile(&kit);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_digest_ignores_identity_but_tracks_content() {
        let a = kit();
        let b = kit();
        assert_ne!(a.id, b.id);
        assert_eq!(kit_digest(&a), kit_digest(&b));

        let mut c = kit();
        c.color_tolerance = 5.0;
        assert_ne!(kit_digest(&a), kit_digest(&c));
    }

    #[test]
    fn test_lookups() {
        let rules = ComplianceRuleSet::compile(&kit());
        assert_eq!(rules.color_name("4a154b"), Some("Aubergine"));
        assert_eq!(rules.color_name("#FFFFFF"), Some("#FFFFFF"));
        assert_eq!(rules.color_name("#000000"), None);
        assert!(rules.family("  LATO ").unwrap().weights.contains("Bold"));
        assert!(rules.forbidden_keywords.contains("guaranteed"));
        assert_eq!(rules.logo_ratios, vec![4.0]);
        assert_eq!(rules.advisory_logo_rules, vec!["DONT: Never rotate the logo"]);
    }

    #[test]
    fn test_nearest_color() {
        let rules = ComplianceRuleSet::compile(&kit());
        let m = rules.nearest_color(Rgb::new(0x4A, 0x15, 0x4C)).unwrap();
        assert_eq!(m.color.name, "Aubergine");
        assert!(m.distance < 2.0);
        let m = rules.nearest_color(Rgb::new(0xFA, 0xFA, 0xFA)).unwrap();
        assert_eq!(m.color.hex, "#FFFFFF");
    }

    #[test]
    fn test_keyword_hits_whole_word_case_insensitive() {
        let rules = ComplianceRuleSet::compile(&kit());
        assert_eq!(rules.keyword_hits("Guaranteed results"), vec!["guaranteed"]);
        assert_eq!(
            rules.keyword_hits("Totally RISK FREE and guaranteed!"),
            vec!["guaranteed", "risk free"]
        );
        assert!(rules.keyword_hits("unguaranteed outcomes").is_empty());
        assert!(rules.keyword_hits("").is_empty());
    }

    #[test]
    fn test_keyword_hits_with_punctuation_edges() {
        let kit = BrandKit::from_parts(
            vec![],
            vec![BrandTypography::new("Lato", ["Bold"], None).unwrap()],
            vec![],
            VoiceProfile::new(Vec::<String>::new(), vec!["100%".to_string(), "#1".to_string()]),
            None,
        );
        let rules = ComplianceRuleSet::compile(&kit);
        assert_eq!(rules.keyword_hits("100% natural ingredients"), vec!["100%"]);
        assert_eq!(rules.keyword_hits("The #1 choice"), vec!["#1"]);
        assert_eq!(rules.keyword_hits("Rated #1, 100%."), vec!["#1", "100%"]);
        assert!(rules.keyword_hits("1100% growth").is_empty());
        assert!(rules.keyword_hits("issue#12").is_empty());
    }

    #[test]
    fn test_empty_keyword_set_never_matches() {
        let kit = BrandKit::from_parts(
            vec![],
            vec![BrandTypography::new("Lato", ["Bold"], None).unwrap()],
            vec![],
            VoiceProfile::default(),
            None,
        );
        let rules = ComplianceRuleSet::compile(&kit);
        assert!(rules.keyword_hits("anything at all").is_empty());
        assert!(rules.nearest_color(Rgb::new(0, 0, 0)).is_none());
    }
}
