//! Color math: hex canonicalization, RGB/CMYK derivation, CIELAB distance
//!
//! Hex is the source of truth for every brand color. RGB and CMYK are
//! derived from it and convert back losslessly (CMYK is kept fractional,
//! never rounded to whole percents). Perceptual distance is CIE76 ΔE
//! computed in CIELAB under the D65 white point, so a tolerance of 10
//! means "ten ΔE units", where ~2.3 is a just-noticeable difference.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?[0-9A-Fa-f]{6}$").expect("valid hex regex"));

/// D65 reference white (2° observer)
const WHITE_X: f64 = 95.047;
const WHITE_Y: f64 = 100.0;
const WHITE_Z: f64 = 108.883;

/// Canonicalize a hex string to `#RRGGBB` (uppercase).
///
/// Returns `None` for anything not matching `^#?[0-9A-Fa-f]{6}$`.
pub fn canonical_hex(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !HEX_PATTERN.is_match(trimmed) {
        return None;
    }
    let digits = trimmed.trim_start_matches('#');
    Some(format!("#{}", digits.to_ascii_uppercase()))
}

/// 8-bit sRGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = canonical_hex(raw)?;
        let bytes = hex::decode(&hex[1..]).ok()?;
        Some(Self::new(bytes[0], bytes[1], bytes[2]))
    }

    pub fn to_hex(self) -> String {
        format!("#{}", hex::encode_upper([self.r, self.g, self.b]))
    }

    pub fn to_cmyk(self) -> Cmyk {
        Cmyk::from_rgb(self)
    }

    pub fn to_lab(self) -> Lab {
        Lab::from_rgb(self)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// CMYK in percent (0.0–100.0 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

impl Cmyk {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let r = rgb.r as f64 / 255.0;
        let g = rgb.g as f64 / 255.0;
        let b = rgb.b as f64 / 255.0;
        let k = 1.0 - r.max(g).max(b);
        if (1.0 - k).abs() < f64::EPSILON {
            return Self { c: 0.0, m: 0.0, y: 0.0, k: 100.0 };
        }
        Self {
            c: (1.0 - r - k) / (1.0 - k) * 100.0,
            m: (1.0 - g - k) / (1.0 - k) * 100.0,
            y: (1.0 - b - k) / (1.0 - k) * 100.0,
            k: k * 100.0,
        }
    }

    pub fn to_rgb(self) -> Rgb {
        let k = self.k / 100.0;
        let channel = |v: f64| -> u8 {
            (255.0 * (1.0 - v / 100.0) * (1.0 - k)).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(channel(self.c), channel(self.m), channel(self.y))
    }
}

impl std::fmt::Display for Cmyk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cmyk({:.0}%, {:.0}%, {:.0}%, {:.0}%)",
            self.c, self.m, self.y, self.k
        )
    }
}

/// CIELAB coordinates (D65)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub fn from_rgb(rgb: Rgb) -> Self {
        let linear = |c: u8| -> f64 {
            let v = c as f64 / 255.0;
            if v <= 0.04045 {
                v / 12.92
            } else {
                ((v + 0.055) / 1.055).powf(2.4)
            }
        };
        let r = linear(rgb.r) * 100.0;
        let g = linear(rgb.g) * 100.0;
        let b = linear(rgb.b) * 100.0;

        let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
        let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
        let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

        let f = |t: f64| -> f64 {
            if t > 0.008856 {
                t.cbrt()
            } else {
                7.787 * t + 16.0 / 116.0
            }
        };
        let fx = f(x / WHITE_X);
        let fy = f(y / WHITE_Y);
        let fz = f(z / WHITE_Z);

        Self {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// CIE76 ΔE
    pub fn delta_e(&self, other: &Lab) -> f64 {
        ((self.l - other.l).powi(2) + (self.a - other.a).powi(2) + (self.b - other.b).powi(2))
            .sqrt()
    }
}

/// CIE76 ΔE between two sRGB colors
pub fn delta_e(a: Rgb, b: Rgb) -> f64 {
    a.to_lab().delta_e(&b.to_lab())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_hex() {
        assert_eq!(canonical_hex("4a154b").as_deref(), Some("#4A154B"));
        assert_eq!(canonical_hex(" #ff00AA ").as_deref(), Some("#FF00AA"));
        assert_eq!(canonical_hex("#FFF"), None);
        assert_eq!(canonical_hex("#GG0000"), None);
        assert_eq!(canonical_hex("##FF0000"), None);
    }

    #[test]
    fn test_rgb_from_hex() {
        let rgb = Rgb::from_hex("#4A154B").unwrap();
        assert_eq!(rgb, Rgb::new(0x4A, 0x15, 0x4B));
        assert_eq!(rgb.to_hex(), "#4A154B");
    }

    #[test]
    fn test_hex_rgb_cmyk_round_trip_across_color_space() {
        // Prime stride visits every region of the 24-bit cube; both ends included
        for value in (0u32..=0xFF_FFFF).step_by(997).chain([0xFF_FFFF]) {
            let hex = format!("#{:06X}", value);
            let rgb = Rgb::from_hex(&hex).unwrap();
            assert_eq!(rgb.to_hex(), hex);
            assert_eq!(Rgb::from_hex(&hex.to_lowercase()), Some(rgb));
            let back = rgb.to_cmyk().to_rgb();
            assert!((rgb.r as i16 - back.r as i16).abs() <= 1, "{} r", hex);
            assert!((rgb.g as i16 - back.g as i16).abs() <= 1, "{} g", hex);
            assert!((rgb.b as i16 - back.b as i16).abs() <= 1, "{} b", hex);
        }
    }

    #[test]
    fn test_cmyk_round_trip_within_one_unit() {
        for hex in ["#4A154B", "#FFFFFF", "#000000", "#ECB22E", "#36C5F0", "#010203", "#FE7F01"] {
            let rgb = Rgb::from_hex(hex).unwrap();
            let back = rgb.to_cmyk().to_rgb();
            assert!((rgb.r as i16 - back.r as i16).abs() <= 1, "{} r", hex);
            assert!((rgb.g as i16 - back.g as i16).abs() <= 1, "{} g", hex);
            assert!((rgb.b as i16 - back.b as i16).abs() <= 1, "{} b", hex);
        }
    }

    #[test]
    fn test_cmyk_pure_black() {
        let cmyk = Rgb::new(0, 0, 0).to_cmyk();
        assert_eq!(cmyk.k, 100.0);
        assert_eq!(cmyk.c, 0.0);
    }

    #[test]
    fn test_delta_e_near_identical_is_small() {
        let a = Rgb::from_hex("#4A154B").unwrap();
        let b = Rgb::from_hex("#4A154C").unwrap();
        let d = delta_e(a, b);
        assert!(d > 0.0 && d < 2.0, "expected ~1 ΔE, got {}", d);
    }

    #[test]
    fn test_delta_e_red_vs_aubergine_is_large() {
        let a = Rgb::from_hex("#4A154B").unwrap();
        let b = Rgb::from_hex("#FF0000").unwrap();
        assert!(delta_e(a, b) > 20.0);
    }

    #[test]
    fn test_lab_white_is_l100() {
        let lab = Rgb::new(255, 255, 255).to_lab();
        assert!((lab.l - 100.0).abs() < 0.1);
        assert!(lab.a.abs() < 0.5 && lab.b.abs() < 0.5);
    }
}
