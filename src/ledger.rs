//! Duty ledger — per-person clean counts plus the rotation order.
//!
//! The fairness key of a person is `(count, rotation index)`: the lowest
//! count is up next, ties go to whoever sits earliest in the rotation.
//! Crediting a person bumps their count and moves them to the tail.
//!
//! The ledger is the only durable state on the sensor node. Every mutation
//! is followed by a best-effort write through [`LedgerStore`]; a failed
//! write is logged and the in-memory state stays authoritative, so the
//! next successful mutation reconciles the files.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::app::ports::LedgerStore;
use crate::registry::IdentityRegistry;

/// Counts and rotation over the full known-person set.
#[derive(Debug, Clone)]
pub struct DutyLedger {
    counts: BTreeMap<String, u32>,
    /// Always a permutation of the known-person set.
    rotation: Vec<String>,
}

impl DutyLedger {
    /// Fresh ledger: everyone at zero, rotation in registry order.
    pub fn new(registry: &IdentityRegistry) -> Self {
        Self {
            counts: registry.names().iter().map(|n| (n.clone(), 0)).collect(),
            rotation: registry.names().to_vec(),
        }
    }

    /// Load from `store`, healing whatever was persisted.
    ///
    /// Counts: unknown names are dropped, missing known names start at 0.
    /// Rotation: filtered to known names, de-duplicated keeping the first
    /// occurrence, then missing names appended in registry order. Read
    /// failures are logged and treated as "nothing stored".
    pub fn load(registry: &IdentityRegistry, store: &impl LedgerStore) -> Self {
        let stored_counts = store.load_counts().unwrap_or_else(|e| {
            warn!("Ledger: counts unreadable ({}), starting from zero", e);
            None
        });
        let stored_rotation = store.load_rotation().unwrap_or_else(|e| {
            warn!("Ledger: duty order unreadable ({}), using registry order", e);
            None
        });
        Self::from_parts(registry, stored_counts, stored_rotation)
    }

    /// Build a healed ledger from raw persisted parts.
    pub fn from_parts(
        registry: &IdentityRegistry,
        counts: Option<BTreeMap<String, u32>>,
        rotation: Option<Vec<String>>,
    ) -> Self {
        let stored = counts.unwrap_or_default();
        let counts = registry
            .names()
            .iter()
            .map(|n| (n.clone(), stored.get(n).copied().unwrap_or(0)))
            .collect();

        let mut healed: Vec<String> = Vec::with_capacity(registry.names().len());
        for name in rotation.unwrap_or_default() {
            if registry.is_known(&name) && !healed.contains(&name) {
                healed.push(name);
            }
        }
        for name in registry.names() {
            if !healed.contains(name) {
                healed.push(name.clone());
            }
        }

        Self {
            counts,
            rotation: healed,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Who is due next: minimum count, earliest rotation index on ties.
    /// `None` only when nobody is registered.
    pub fn next_up(&self) -> Option<&str> {
        self.ordered().into_iter().next()
    }

    /// Every known person sorted by the fairness key.
    pub fn ordered(&self) -> Vec<&str> {
        let mut keyed: Vec<(u32, usize, &str)> = self
            .rotation
            .iter()
            .enumerate()
            .map(|(idx, name)| (self.count(name), idx, name.as_str()))
            .collect();
        keyed.sort_unstable();
        keyed.into_iter().map(|(_, _, name)| name).collect()
    }

    pub fn count(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<String, u32> {
        &self.counts
    }

    pub fn rotation(&self) -> &[String] {
        &self.rotation
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    // ── Mutations ─────────────────────────────────────────────

    /// Record a completed clean by `name`: count + 1, move to the rotation
    /// tail, persist both. Returns `false` (and changes nothing) for a
    /// name outside the known set.
    pub fn credit(&mut self, name: &str, store: &mut impl LedgerStore) -> bool {
        let Some(count) = self.counts.get_mut(name) else {
            warn!("Ledger: refusing to credit unknown person '{}'", name);
            return false;
        };
        *count += 1;

        if let Some(pos) = self.rotation.iter().position(|n| n == name) {
            let person = self.rotation.remove(pos);
            self.rotation.push(person);
        }

        info!(
            "Ledger: credited {} (now {}), order={:?}",
            name,
            self.count(name),
            self.rotation
        );
        self.persist_counts(store);
        self.persist_rotation(store);
        true
    }

    /// Zero every count. The rotation order is kept.
    pub fn reset_counts(&mut self, store: &mut impl LedgerStore) {
        for count in self.counts.values_mut() {
            *count = 0;
        }
        info!("Ledger: all counts reset");
        self.persist_counts(store);
    }

    fn persist_counts(&self, store: &mut impl LedgerStore) {
        if let Err(e) = store.save_counts(&self.counts) {
            warn!("Ledger: saving counts failed: {}", e);
        }
    }

    fn persist_rotation(&self, store: &mut impl LedgerStore) {
        if let Err(e) = store.save_rotation(&self.rotation) {
            warn!("Ledger: saving duty order failed: {}", e);
        }
    }
}
