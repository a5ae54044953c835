//! Document format detection from magic bytes, plus a cheap PDF page count
//! used to reject oversized documents before paying for an external call.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

/// Matches page objects (`/Type /Page`) but not the page-tree node (`/Type /Pages`)
static PDF_PAGE_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Type\s*/Page(?:[^s]|$)").expect("valid pdf page regex"));

/// Detected document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Png,
    Jpeg,
    Gif,
    Webp,
    Tiff,
    Unknown,
}

impl DocumentFormat {
    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.len() < 4 {
            return Self::Unknown;
        }

        match &bytes[..4] {
            [0x25, 0x50, 0x44, 0x46] => Self::Pdf,  // %PDF
            [0x89, 0x50, 0x4E, 0x47] => Self::Png,  // \x89PNG
            [0xFF, 0xD8, 0xFF, _] => Self::Jpeg,
            [0x47, 0x49, 0x46, 0x38] => Self::Gif,  // GIF8
            [0x49, 0x49, 0x2A, 0x00] | [0x4D, 0x4D, 0x00, 0x2A] => Self::Tiff,
            [0x52, 0x49, 0x46, 0x46] if bytes.len() >= 12 && &bytes[8..12] == b"WEBP" => Self::Webp,
            _ => Self::Unknown,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Unknown => "application/octet-stream",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Gif | Self::Webp | Self::Tiff)
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "PDF"),
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG"),
            Self::Gif => write!(f, "GIF"),
            Self::Webp => write!(f, "WEBP"),
            Self::Tiff => write!(f, "TIFF"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Count page objects in a PDF body. Returns `None` when none are visible
/// (compressed object streams hide them), in which case the ceiling is
/// enforced on the extracted pages instead.
pub fn count_pdf_pages(bytes: &[u8]) -> Option<usize> {
    let count = PDF_PAGE_OBJECT.find_iter(bytes).count();
    (count > 0).then_some(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes() {
        assert_eq!(DocumentFormat::from_magic_bytes(b"%PDF-1.7\n"), DocumentFormat::Pdf);
        assert_eq!(
            DocumentFormat::from_magic_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]),
            DocumentFormat::Png
        );
        assert_eq!(
            DocumentFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            DocumentFormat::Jpeg
        );
        assert_eq!(
            DocumentFormat::from_magic_bytes(b"RIFF\x00\x00\x00\x00WEBPVP8 "),
            DocumentFormat::Webp
        );
        assert_eq!(DocumentFormat::from_magic_bytes(b"PK\x03\x04"), DocumentFormat::Unknown);
        assert_eq!(DocumentFormat::from_magic_bytes(b"%P"), DocumentFormat::Unknown);
    }

    #[test]
    fn test_count_pdf_pages_skips_page_tree() {
        let pdf = b"%PDF-1.4\n1 0 obj << /Type /Pages /Kids [2 0 R 3 0 R] >>\n\
                    2 0 obj << /Type /Page /Parent 1 0 R >>\n\
                    3 0 obj << /Type/Page /Parent 1 0 R >>\n";
        assert_eq!(count_pdf_pages(pdf), Some(2));
    }

    #[test]
    fn test_count_pdf_pages_none_when_hidden() {
        assert_eq!(count_pdf_pages(b"%PDF-1.5\n/ObjStm compressed"), None);
    }
}
