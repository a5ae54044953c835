//! Font weight vocabulary
//!
//! Guideline documents spell weights every way imaginable ("bold", "BOLD",
//! "700", "Semi Bold", "demi"). Matching is case-insensitive against a
//! fixed vocabulary; anything unrecognized is kept verbatim (trimmed).

/// Canonical weight names, lightest first
pub const WEIGHT_VOCABULARY: &[&str] = &[
    "Thin",
    "ExtraLight",
    "Light",
    "Regular",
    "Medium",
    "SemiBold",
    "Bold",
    "ExtraBold",
    "Black",
    "Italic",
];

/// (alias, canonical): aliases are compared after lowercasing and
/// stripping spaces, hyphens and underscores
const WEIGHT_ALIASES: &[(&str, &str)] = &[
    ("thin", "Thin"),
    ("hairline", "Thin"),
    ("100", "Thin"),
    ("extralight", "ExtraLight"),
    ("ultralight", "ExtraLight"),
    ("200", "ExtraLight"),
    ("light", "Light"),
    ("300", "Light"),
    ("regular", "Regular"),
    ("normal", "Regular"),
    ("book", "Regular"),
    ("roman", "Regular"),
    ("400", "Regular"),
    ("medium", "Medium"),
    ("500", "Medium"),
    ("semibold", "SemiBold"),
    ("demibold", "SemiBold"),
    ("demi", "SemiBold"),
    ("600", "SemiBold"),
    ("bold", "Bold"),
    ("700", "Bold"),
    ("extrabold", "ExtraBold"),
    ("ultrabold", "ExtraBold"),
    ("800", "ExtraBold"),
    ("black", "Black"),
    ("heavy", "Black"),
    ("900", "Black"),
    ("italic", "Italic"),
    ("oblique", "Italic"),
];

/// Normalize a weight name to the canonical vocabulary.
pub fn normalize_weight(raw: &str) -> String {
    let trimmed = raw.trim();
    let key: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .to_lowercase();

    WEIGHT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Whether a weight name is part of the fixed vocabulary
pub fn is_known_weight(name: &str) -> bool {
    WEIGHT_VOCABULARY.contains(&name)
}

/// Normalize a family name for lookup (trimmed, case-folded, single spaces)
pub fn family_key(family: &str) -> String {
    family
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
