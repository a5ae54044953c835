//! Audit history and in-flight tracking
//!
//! `AuditHistory` is append-only: a re-audit adds a new run and never
//! touches the old one. `InFlightAudits` admits at most one running audit
//! per (document, kit version); the returned guard releases the slot on
//! drop, so an abandoned (cancelled) audit frees it too.

use super::AuditRun;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

// ─── History ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct AuditHistory {
    runs: RwLock<Vec<Arc<AuditRun>>>,
}

impl AuditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed run
    pub fn record(&self, run: AuditRun) -> Arc<AuditRun> {
        let run = Arc::new(run);
        self.runs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::clone(&run));
        run
    }

    /// Every run for a document, oldest first
    pub fn for_document(&self, document_id: &str) -> Vec<Arc<AuditRun>> {
        self.runs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|r| r.document_id == document_id)
            .cloned()
            .collect()
    }

    /// Most recent run for a document against a specific kit version
    pub fn latest_for(&self, document_id: &str, kit_version: u32) -> Option<Arc<AuditRun>> {
        self.runs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .rev()
            .find(|r| r.document_id == document_id && r.kit_version == kit_version)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.runs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── In-Flight Guard ───────────────────────────────────────────────

type AuditKey = (String, u32);

#[derive(Default)]
pub struct InFlightAudits {
    active: Mutex<HashSet<AuditKey>>,
}

impl InFlightAudits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for (document, kit version). `None` when an audit
    /// for the same pair is already running.
    pub fn try_acquire(
        self: &Arc<Self>,
        document_id: &str,
        kit_version: u32,
    ) -> Option<InFlightGuard> {
        let key = (document_id.to_string(), kit_version);
        let inserted = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.clone());
        inserted.then(|| InFlightGuard {
            owner: Arc::clone(self),
            key,
        })
    }

    pub fn is_active(&self, document_id: &str, kit_version: u32) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&(document_id.to_string(), kit_version))
    }
}

/// Held for the duration of one audit
pub struct InFlightGuard {
    owner: Arc<InFlightAudits>,
    key: AuditKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
        tracing::debug!("Released in-flight slot for '{}' v{}", self.key.0, self.key.1);
    }
}
