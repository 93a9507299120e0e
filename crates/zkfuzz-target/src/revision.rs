//! Revision-keyed lookup of injection sources.

use crate::targets::{InjectionSource, SourceProvider, Target};
use crate::taxonomy::Label;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;
use zkfuzz_core::{Error, Result};

static BUILTIN: Lazy<RevisionRegistry> = Lazy::new(RevisionRegistry::builtin);

/// Maps `(target, commit or alias)` to the provider for that revision.
///
/// Lookups are exact; an unknown key never falls back to another revision.
#[derive(Debug, Default, Clone)]
pub struct RevisionRegistry {
    providers: HashMap<(Target, String), SourceProvider>,
}

impl RevisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every revision shipped with the crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for &target in Target::ALL {
            for revision in target.revisions() {
                registry.register(target, revision.commit, revision.provider);
                for alias in revision.aliases {
                    registry.register(target, alias, revision.provider);
                }
            }
        }
        registry
    }

    /// Shared read-only registry of the built-in revisions
    pub fn global() -> &'static RevisionRegistry {
        &BUILTIN
    }

    pub fn register(&mut self, target: Target, key: &str, provider: SourceProvider) {
        self.providers.insert((target, key.to_string()), provider);
    }

    pub fn lookup(&self, target: Target, revision: &str) -> Result<InjectionSource> {
        let provider = self
            .providers
            .get(&(target, revision.to_string()))
            .ok_or_else(|| Error::UnsupportedRevision {
                target: target.to_string(),
                revision: revision.to_string(),
            })?;
        debug!(zkvm = %target, revision, "Resolved injection source");
        Ok(provider())
    }

    pub fn supports(&self, target: Target, revision: &str) -> bool {
        self.providers.contains_key(&(target, revision.to_string()))
    }

    /// Registered keys for `target`, sorted
    pub fn keys(&self, target: Target) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .providers
            .keys()
            .filter(|(t, _)| *t == target)
            .map(|(_, key)| key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}
