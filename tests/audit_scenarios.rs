//! Integration test: end-to-end audits against a fixed brand kit
//!
//! Every external call is a fixed-output stub, so these runs are fully
//! deterministic.

mod common;

use brandguard::inspection::{InspectionLevel, InspectionStatus, InspectionType};
use brandguard::ingest::RegionKind;
use brandguard::{ComplianceStatus, PageContent, Region};
use common::{aubergine_kit, bbox, engine, pdf, ScriptedDocuments};

#[tokio::test]
async fn scenario_a_near_color_passes_and_names_palette_color() {
    let pages = vec![PageContent::new(
        1,
        vec![Region::text(bbox(0.1, 0.1, 0.5, 0.1), "Hello").with_color("#4A154C")],
    )];
    let (engine, _) = engine(ScriptedDocuments::new().with("flyer.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());

    let report = engine.audit(&pdf("doc-a", "flyer.pdf"), &kit).await.unwrap();
    let color = report
        .run
        .results
        .iter()
        .find(|r| r.inspection_type() == InspectionType::Color)
        .unwrap();
    assert_eq!(color.level(), InspectionLevel::Pass);
    assert_eq!(color.status(), InspectionStatus::Pass);
    assert!(color.message().contains("Aubergine"), "{}", color.message());
}

#[tokio::test]
async fn scenario_b_far_color_is_critical() {
    let pages = vec![PageContent::new(
        1,
        vec![Region::text(bbox(0.1, 0.1, 0.5, 0.1), "Sale").with_color("#FF0000")],
    )];
    let (engine, _) = engine(ScriptedDocuments::new().with("flyer.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());

    let report = engine.audit(&pdf("doc-b", "flyer.pdf"), &kit).await.unwrap();
    let color = &report.run.results[0];
    assert_eq!(color.inspection_type(), InspectionType::Color);
    assert_eq!(color.level(), InspectionLevel::Critical);
    assert_eq!(color.status(), InspectionStatus::Fail);
    assert_eq!(report.run.status, ComplianceStatus::Critical);
    assert!(!report.gate_passed);
}

#[tokio::test]
async fn scenario_c_forbidden_keyword_case_insensitive() {
    let pages = vec![PageContent::new(
        1,
        vec![Region::text(bbox(0.1, 0.6, 0.8, 0.1), "Guaranteed results")],
    )];
    let (engine, _) = engine(ScriptedDocuments::new().with("ad.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());

    let report = engine.audit(&pdf("doc-c", "ad.pdf"), &kit).await.unwrap();
    assert_eq!(report.run.results.len(), 1);
    let text = &report.run.results[0];
    assert_eq!(text.inspection_type(), InspectionType::TextBody);
    assert_eq!(text.level(), InspectionLevel::Critical);
    assert!(text.message().contains("guaranteed"));
}

#[tokio::test]
async fn scenario_d_no_regions_is_compliant() {
    let pages = vec![PageContent::new(1, vec![]), PageContent::new(2, vec![])];
    let (engine, _) = engine(ScriptedDocuments::new().with("blank.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());

    let report = engine.audit(&pdf("doc-d", "blank.pdf"), &kit).await.unwrap();
    assert!(report.run.results.is_empty());
    assert_eq!(report.run.score, 100);
    assert_eq!(report.run.status, ComplianceStatus::Compliant);
    assert_eq!(report.pages_audited, 2);
    assert!(report.gate_passed);
}

#[tokio::test]
async fn mixed_document_ordering_levels_and_score() {
    let pages = vec![
        PageContent::new(
            2,
            vec![Region::text(bbox(0.1, 0.1, 0.3, 0.1), "Page two copy").with_font("Lato", Some("Regular"))],
        ),
        PageContent::new(
            1,
            vec![
                // Logo at 4:1 on a 1000x1000 page; kit has one advisory rule
                Region::logo(bbox(0.1, 0.05, 0.4, 0.1)),
                Region::text(bbox(0.1, 0.5, 0.8, 0.2), "Body copy")
                    .with_font("Lato", Some("light"))
                    .with_color("#4A154B"),
                Region {
                    bbox: None,
                    kind: RegionKind::Text,
                    text: Some("lost box".into()),
                    ..Default::default()
                },
            ],
        )
        .with_size(1000.0, 1000.0),
    ];
    let (engine, _) = engine(ScriptedDocuments::new().with("deck.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());

    let report = engine.audit(&pdf("deck", "deck.pdf"), &kit).await.unwrap();
    let summary: Vec<(u32, InspectionType, InspectionLevel)> = report
        .run
        .results
        .iter()
        .map(|r| (r.page_number(), r.inspection_type(), r.level()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, InspectionType::Logo, InspectionLevel::Pass),
            (1, InspectionType::Color, InspectionLevel::Pass),
            (1, InspectionType::Font, InspectionLevel::Medium),
            (1, InspectionType::TextBody, InspectionLevel::Pass),
            (2, InspectionType::Font, InspectionLevel::Pass),
            (2, InspectionType::TextBody, InspectionLevel::Pass),
        ]
    );
    assert_eq!(report.regions_skipped, 1);
    assert_eq!(report.regions_evaluated, 3);
    // 5 of 6 pass
    assert_eq!(report.run.score, 83);
    assert_eq!(report.run.status, ComplianceStatus::ActionRequired);
    assert_eq!(report.review_items, vec!["DONT: Don't rotate the logo".to_string()]);

    for r in &report.run.results {
        assert_eq!(r.status() == InspectionStatus::Pass, r.level() == InspectionLevel::Pass);
    }
}

#[tokio::test]
async fn reaudit_creates_new_run_with_identical_content() {
    let pages = vec![PageContent::new(
        1,
        vec![
            Region::text(bbox(0.0, 0.0, 0.5, 0.1), "Guaranteed").with_color("#FF0000"),
            Region::text(bbox(0.0, 0.2, 0.5, 0.1), "Fine").with_font("Helvetica", None),
        ],
    )];
    let (engine, documents) = engine(ScriptedDocuments::new().with("flyer.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());
    let doc = pdf("doc-idem", "flyer.pdf");

    let first = engine.audit(&doc, &kit).await.unwrap();
    let second = engine.audit(&doc, &kit).await.unwrap();

    assert_ne!(first.run.id, second.run.id);
    assert_eq!(first.run.content_digest, second.run.content_digest);
    assert_eq!(first.run.results.len(), second.run.results.len());
    for (a, b) in first.run.results.iter().zip(&second.run.results) {
        assert_ne!(a.id(), b.id());
        assert_eq!(a.content_key(), b.content_key());
    }
    assert_eq!(engine.history().for_document("doc-idem").len(), 2);
    assert_eq!(documents.call_count(), 2);
}

#[tokio::test]
async fn unparseable_sample_and_image_regions() {
    let pages = vec![PageContent::new(
        1,
        vec![
            Region::logo(bbox(0.0, 0.0, 0.2, 0.2))
                .with_kind(RegionKind::Image)
                .with_color("not-a-color"),
            Region::logo(bbox(0.0, 0.5, 0.2, 0.2)).with_kind(RegionKind::Shape),
        ],
    )];
    let (engine, _) = engine(ScriptedDocuments::new().with("photo.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());

    let report = engine.audit(&pdf("photo", "photo.pdf"), &kit).await.unwrap();
    assert_eq!(report.run.results.len(), 1);
    assert_eq!(report.run.results[0].inspection_type(), InspectionType::Imagery);
    assert_eq!(report.regions_evaluated, 1);
}

#[tokio::test]
async fn malformed_region_in_extraction_output_is_skipped_alone() {
    let pages: Vec<PageContent> = serde_json::from_value(serde_json::json!([{
        "pageNumber": 1,
        "regions": [
            {"bbox": {"x": 0.1, "y": 0.1, "width": 0.5, "height": 0.1}, "kind": "text", "text": "Guaranteed"},
            {"bbox": {"x": 0.1, "y": 0.3}, "kind": "text", "text": "partial box"},
            {"bbox": {"x": 0.1, "y": 0.5, "width": 0.2, "height": 0.2}, "kind": "chart", "color": "#4A154B"}
        ]
    }]))
    .unwrap();
    let (engine, _) = engine(ScriptedDocuments::new().with("report.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());

    let report = engine.audit(&pdf("report", "report.pdf"), &kit).await.unwrap();
    let summary: Vec<(InspectionType, InspectionLevel)> = report
        .run
        .results
        .iter()
        .map(|r| (r.inspection_type(), r.level()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (InspectionType::TextBody, InspectionLevel::Critical),
            (InspectionType::Color, InspectionLevel::Pass),
        ]
    );
    assert_eq!(report.regions_skipped, 1);
    assert_eq!(report.regions_evaluated, 2);
}

#[tokio::test]
async fn compliant_logo_with_free_text_rules_stays_compliant() {
    let pages = vec![PageContent::new(1, vec![Region::logo(bbox(0.1, 0.1, 0.4, 0.1))]).with_size(1000.0, 1000.0)];
    let (engine, _) = engine(ScriptedDocuments::new().with("banner.pdf", pages));
    let kit = engine.registry().publish(aubergine_kit());

    let report = engine.audit(&pdf("banner", "banner.pdf"), &kit).await.unwrap();
    assert_eq!(report.run.results.len(), 1);
    let logo = &report.run.results[0];
    assert_eq!(logo.inspection_type(), InspectionType::Logo);
    assert_eq!(logo.status(), InspectionStatus::Pass);
    assert!(logo.message().contains("Don't rotate the logo"));
    assert_eq!(report.run.score, 100);
    assert_eq!(report.run.status, ComplianceStatus::Compliant);
    assert_eq!(report.review_items, vec!["DONT: Don't rotate the logo".to_string()]);
}
