//! Supported zkVM targets and their injection catalogues.

pub mod jolt;
pub mod risc0;
pub mod sp1;

use crate::taxonomy::{enabled_injection_kinds, select_label, Label};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use zkfuzz_core::{Result, TargetConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Risc0,
    Sp1,
    Jolt,
}

impl Label for Target {
    const ALL: &'static [Self] = &[Target::Risc0, Target::Sp1, Target::Jolt];

    fn name(self) -> &'static str {
        match self {
            Target::Risc0 => "risc0",
            Target::Sp1 => "sp1",
            Target::Jolt => "jolt",
        }
    }
}

impl Target {
    pub fn revisions(self) -> &'static [Revision] {
        match self {
            Target::Risc0 => risc0::REVISIONS,
            Target::Sp1 => sp1::REVISIONS,
            Target::Jolt => jolt::REVISIONS,
        }
    }

    /// Names of every injection kind the target knows
    pub fn injection_names(self) -> Vec<&'static str> {
        match self {
            Target::Risc0 => risc0::InjectionKind::ALL.iter().map(|k| k.name()).collect(),
            Target::Sp1 => sp1::InjectionKind::ALL.iter().map(|k| k.name()).collect(),
            Target::Jolt => jolt::InjectionKind::ALL.iter().map(|k| k.name()).collect(),
        }
    }

    /// Pick one of the injection kinds `config` enables for this target.
    ///
    /// `Ok(None)` when fault injection is off or nothing is enabled; no
    /// randomness is consumed in that case.
    pub fn select_injection<R: Rng + ?Sized>(
        self,
        config: &TargetConfig,
        rng: &mut R,
    ) -> Result<Option<&'static str>> {
        if !config.fault_injection {
            return Ok(None);
        }
        match self {
            Target::Risc0 => pick::<risc0::InjectionKind, R>(config, rng),
            Target::Sp1 => pick::<sp1::InjectionKind, R>(config, rng),
            Target::Jolt => pick::<jolt::InjectionKind, R>(config, rng),
        }
    }
}

fn pick<K: Label, R: Rng + ?Sized>(
    config: &TargetConfig,
    rng: &mut R,
) -> Result<Option<&'static str>> {
    let enabled = enabled_injection_kinds::<K>(config)?;
    if enabled.is_empty() {
        return Ok(None);
    }
    Ok(Some(select_label(&enabled, &[], rng)?.name()))
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source file that replaces a path inside the target checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionSource {
    /// Path relative to the checkout root
    pub relative_path: &'static str,
    pub text: &'static str,
}

pub type SourceProvider = fn() -> InjectionSource;

/// One supported upstream revision: a commit plus the branch or tag names
/// that point at it.
#[derive(Debug, Clone, Copy)]
pub struct Revision {
    pub commit: &'static str,
    pub aliases: &'static [&'static str],
    pub provider: SourceProvider,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use zkfuzz_core::Error;

    #[test]
    fn test_target_names() {
        assert_eq!(Target::from_name("sp1"), Some(Target::Sp1));
        assert_eq!(Target::from_name("SP1"), None);
        assert_eq!(Target::Jolt.to_string(), "jolt");
    }

    #[test]
    fn test_select_injection_respects_enabled_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let config = TargetConfig {
            fault_injection: true,
            enabled_injections: vec!["memory_load".to_string(), "syscall".to_string()],
            ..Default::default()
        };
        for _ in 0..50 {
            let kind = Target::Sp1.select_injection(&config, &mut rng).unwrap();
            assert!(matches!(kind, Some("memory_load") | Some("syscall")));
        }

        // memory_load is an sp1 kind, not a risc0 one.
        let err = Target::Risc0.select_injection(&config, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_select_injection_disabled() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let untouched = rng.clone();
        let config = TargetConfig {
            fault_injection: false,
            enabled_injections: vec!["syscall".to_string()],
            ..Default::default()
        };
        assert_eq!(Target::Sp1.select_injection(&config, &mut rng).unwrap(), None);

        let nothing_enabled = TargetConfig {
            fault_injection: true,
            ..Default::default()
        };
        assert_eq!(Target::Sp1.select_injection(&nothing_enabled, &mut rng).unwrap(), None);
        assert_eq!(rng, untouched);
    }
}
