//! Prompt text for the chat-backed capabilities

use crate::ingest::PageContent;

/// Cap on guideline text sent for interpretation, in characters
pub const MAX_INTERPRET_CHARS: usize = 120_000;

pub const EXTRACTION_SYSTEM: &str = "You are a document layout analyst. You read marketing and \
brand documents page by page and report every visible region. Always respond with valid JSON \
and nothing else.";

pub const INTERPRET_SYSTEM: &str = "You are a brand-identity specialist. You turn brand \
guideline documents into structured data. Only report values that are stated in the document; \
never invent colors, fonts or rules. Always respond with valid JSON and nothing else.";

/// Instructions for page extraction. The response shape mirrors
/// `PageContent` so it deserializes directly.
pub fn extraction_prompt(document_name: &str) -> String {
    format!(
        "Analyze every page of the attached document `{}`.\n\n\
         For each page report its size in points and every layout region: text blocks, \
         logos, images and solid shapes. Coordinates are relative to the page (0.0-1.0, \
         origin top-left).\n\n\
         For each region report:\n\
         - `bbox`: {{\"x\", \"y\", \"width\", \"height\"}}\n\
         - `kind`: one of \"text\", \"logo\", \"image\", \"shape\"\n\
         - `text`: the exact text, for text regions\n\
         - `font`: {{\"family\", \"weight\"}} when identifiable\n\
         - `color`: the dominant color as #RRGGBB (text color for text, fill for shapes)\n\n\
         Respond in JSON format:\n\
         ```json\n\
         {{\n\
           \"pages\": [\n\
             {{\n\
               \"pageNumber\": 1,\n\
               \"width\": 612,\n\
               \"height\": 792,\n\
               \"regions\": [\n\
                 {{\"bbox\": {{\"x\": 0.1, \"y\": 0.05, \"width\": 0.3, \"height\": 0.08}}, \
                 \"kind\": \"logo\", \"color\": \"#4A154B\"}}\n\
               ]\n\
             }}\n\
           ]\n\
         }}\n\
         ```",
        document_name
    )
}

/// Full user prompt for schema-constrained interpretation
pub fn interpretation_prompt(
    instructions: &str,
    schema: &serde_json::Value,
    pages: &[PageContent],
) -> String {
    let mut prompt = String::with_capacity(8192);
    prompt.push_str(instructions);
    prompt.push_str("\n\n## Output Schema\nRespond with a single JSON object matching:\n```json\n");
    prompt.push_str(&serde_json::to_string_pretty(schema).unwrap_or_default());
    prompt.push_str("\n```\n\n## Document\n");

    let mut budget = MAX_INTERPRET_CHARS;
    for page in pages {
        let text = page_digest(page);
        if text.trim().is_empty() {
            continue;
        }
        let header = format!("\n### Page {}\n", page.page_number);
        if budget <= header.len() {
            break;
        }
        budget -= header.len();
        prompt.push_str(&header);

        let take: String = text.chars().take(budget).collect();
        budget -= take.chars().count().min(budget);
        prompt.push_str(&take);
        prompt.push('\n');
        if budget == 0 {
            tracing::warn!(
                "Guideline text truncated at page {} ({} char budget)",
                page.page_number,
                MAX_INTERPRET_CHARS
            );
            break;
        }
    }
    prompt
}

/// Region text in extraction order, with color samples written out so
/// swatch-only pages still reach the interpreter
fn page_digest(page: &PageContent) -> String {
    page.regions
        .iter()
        .filter_map(|r| {
            let text = r.text.as_deref().map(str::trim).filter(|t| !t.is_empty());
            let color = r.color.as_deref().map(str::trim).filter(|c| !c.is_empty());
            match (text, color) {
                (Some(t), Some(c)) => Some(format!("{} (color sample {})", t, c)),
                (Some(t), None) => Some(t.to_string()),
                (None, Some(c)) => Some(format!("Color sample {}", c)),
                (None, None) => None,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Region;
    use crate::inspection::BoundingBox;

    #[test]
    fn test_interpretation_prompt_includes_pages_and_schema() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 0.1).unwrap();
        let pages = vec![
            PageContent::new(1, vec![Region::text(bbox, "Aubergine #4A154B")]),
            PageContent::new(2, vec![]),
            PageContent::new(3, vec![Region::text(bbox, "Use Lato Bold")]),
        ];
        let prompt = interpretation_prompt(
            "Extract the brand kit.",
            &serde_json::json!({"type": "object"}),
            &pages,
        );
        assert!(prompt.starts_with("Extract the brand kit."));
        assert!(prompt.contains("\"type\": \"object\""));
        assert!(prompt.contains("### Page 1\nAubergine #4A154B"));
        assert!(!prompt.contains("### Page 2"));
        assert!(prompt.contains("### Page 3\nUse Lato Bold"));
    }

    #[test]
    fn test_color_samples_reach_the_prompt() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.2, 0.2).unwrap();
        let pages = vec![PageContent::new(
            4,
            vec![Region::logo(bbox).with_color("#4A154B"), Region::text(bbox, "Lato").with_color("#000000")],
        )];
        let prompt = interpretation_prompt("x", &serde_json::json!({}), &pages);
        assert!(prompt.contains("### Page 4\nColor sample #4A154B\nLato (color sample #000000)"));
    }

    #[test]
    fn test_budget_counts_characters_not_bytes() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 0.1).unwrap();
        let wide = "é".repeat(MAX_INTERPRET_CHARS / 2);
        let pages = vec![
            PageContent::new(1, vec![Region::text(bbox, wide.clone())]),
            PageContent::new(2, vec![Region::text(bbox, "Second page")]),
        ];
        let prompt = interpretation_prompt("x", &serde_json::json!({}), &pages);
        assert!(prompt.contains(&wide));
        assert!(prompt.contains("### Page 2\nSecond page"));
    }

    #[test]
    fn test_extraction_prompt_names_document() {
        assert!(extraction_prompt("flyer.pdf").contains("`flyer.pdf`"));
    }
}
