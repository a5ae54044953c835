//! Fixed-output capability stubs shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use brandguard::ai::SchemaContract;
use brandguard::brand::{
    BrandColor, BrandKit, BrandLogoRule, BrandTypography, ColorUsage, LogoPolarity, VoiceProfile,
};
use brandguard::inspection::BoundingBox;
use brandguard::policy::{PolicyConfig, PolicyEngine};
use brandguard::{
    BrandGuardEngine, CapabilityError, Document, DocumentCapability, InterpretCapability,
    PageContent,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Returns scripted pages keyed by document name
#[derive(Default)]
pub struct ScriptedDocuments {
    pages: HashMap<String, Result<Vec<PageContent>, CapabilityError>>,
    /// When set, `extract` waits for a notification before answering
    pub gate: Option<Arc<Notify>>,
    pub calls: AtomicU32,
}

impl ScriptedDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, pages: Vec<PageContent>) -> Self {
        self.pages.insert(name.to_string(), Ok(pages));
        self
    }

    pub fn failing(mut self, name: &str, error: CapabilityError) -> Self {
        self.pages.insert(name.to_string(), Err(error));
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentCapability for ScriptedDocuments {
    fn name(&self) -> &str {
        "scripted-documents"
    }

    async fn extract(&self, document: &Document) -> Result<Vec<PageContent>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.pages
            .get(&document.name)
            .cloned()
            .unwrap_or_else(|| Err(CapabilityError::Malformed(format!("no script for {}", document.name))))
    }
}

/// Returns the same interpretation for every guideline
pub struct FixedInterpretation {
    pub response: serde_json::Value,
    pub calls: AtomicU32,
}

impl FixedInterpretation {
    pub fn new(response: serde_json::Value) -> Self {
        Self {
            response,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl InterpretCapability for FixedInterpretation {
    fn name(&self) -> &str {
        "fixed-interpretation"
    }

    async fn interpret(
        &self,
        _pages: &[PageContent],
        _contract: &SchemaContract,
    ) -> Result<serde_json::Value, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Policy with millisecond backoff so retry paths stay fast
pub fn fast_policy() -> PolicyEngine {
    PolicyEngine::new(PolicyConfig {
        backoff_base_ms: 1,
        ..Default::default()
    })
}

pub fn engine(documents: ScriptedDocuments) -> (BrandGuardEngine, Arc<ScriptedDocuments>) {
    engine_with(documents, FixedInterpretation::new(serde_json::json!({})), fast_policy())
}

pub fn engine_with(
    documents: ScriptedDocuments,
    interpretation: FixedInterpretation,
    policy: PolicyEngine,
) -> (BrandGuardEngine, Arc<ScriptedDocuments>) {
    let documents = Arc::new(documents);
    let engine = BrandGuardEngine::new(documents.clone(), Arc::new(interpretation), policy);
    (engine, documents)
}

pub fn pdf(id: &str, name: &str) -> Document {
    Document::new(id, name, b"%PDF-1.7\n%stub\n".to_vec())
}

pub fn bbox(x: f64, y: f64, width: f64, height: f64) -> BoundingBox {
    BoundingBox::new(x, y, width, height).expect("valid test box")
}

/// Aubergine palette, Lato, "guaranteed" forbidden, tolerance 10
pub fn aubergine_kit() -> BrandKit {
    BrandKit::from_parts(
        vec![
            BrandColor::new("Aubergine", "#4A154B", ColorUsage::Core).expect("valid hex"),
            BrandColor::new("White", "#FFFFFF", ColorUsage::Secondary).expect("valid hex"),
        ],
        vec![BrandTypography::new("Lato", ["Bold", "Regular"], Some("body".into())).expect("weights")],
        vec![
            BrandLogoRule::new("Use the horizontal lockup at 4:1", LogoPolarity::Do),
            BrandLogoRule::new("Don't rotate the logo", LogoPolarity::Dont),
        ],
        VoiceProfile::new(vec!["Friendly".into()], vec!["guaranteed".into()]),
        Some(10.0),
    )
    .with_name("Aubergine Co")
}
