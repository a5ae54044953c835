//! Versioned brand-kit registry
//!
//! Re-ingesting a guideline publishes a new version; old versions are
//! retained so historical audit runs can name the exact kit they were
//! scored against.

use super::BrandKit;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct BrandKitRegistry {
    versions: RwLock<BTreeMap<u32, Arc<BrandKit>>>,
}

impl BrandKitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a kit as the next version. The kit is frozen behind an `Arc`.
    pub fn publish(&self, mut kit: BrandKit) -> Arc<BrandKit> {
        let mut versions = self
            .versions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = versions.keys().next_back().map(|v| v + 1).unwrap_or(1);
        kit.version = next;
        let kit = Arc::new(kit);
        versions.insert(next, Arc::clone(&kit));
        tracing::info!(
            "Published brand kit v{} ({} colors, {} families, {} logo rules)",
            next,
            kit.colors.len(),
            kit.typography.len(),
            kit.logo.rules.len()
        );
        kit
    }

    pub fn get(&self, version: u32) -> Option<Arc<BrandKit>> {
        self.versions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&version)
            .cloned()
    }

    pub fn latest(&self) -> Option<Arc<BrandKit>> {
        self.versions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .next_back()
            .cloned()
    }

    /// All published version numbers, oldest first
    pub fn versions(&self) -> Vec<u32> {
        self.versions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.versions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::{BrandColor, ColorUsage, VoiceProfile};

    fn kit(hex: &str) -> BrandKit {
        BrandKit::from_parts(
            vec![BrandColor::new("c", hex, ColorUsage::Core).unwrap()],
            vec![],
            vec![],
            VoiceProfile::default(),
            None,
        )
    }

    #[test]
    fn test_publish_assigns_increasing_versions() {
        let registry = BrandKitRegistry::new();
        assert!(registry.is_empty());
        let v1 = registry.publish(kit("#000000"));
        let v2 = registry.publish(kit("#FFFFFF"));
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_eq!(registry.versions(), vec![1, 2]);
    }

    #[test]
    fn test_old_versions_are_retained() {
        let registry = BrandKitRegistry::new();
        registry.publish(kit("#000000"));
        registry.publish(kit("#FFFFFF"));
        assert_eq!(registry.get(1).unwrap().colors[0].hex, "#000000");
        assert_eq!(registry.latest().unwrap().colors[0].hex, "#FFFFFF");
        assert!(registry.get(3).is_none());
    }
}
