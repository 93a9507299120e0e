//! Configuration types for fuzzing targets.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::ProjectFlags;

/// Default budget for compiling one guest project
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(600);

/// Default budget for executing one guest program
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

// Fields appear in fixed h, m, s order, each at most once.
static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:h([0-9]+))?(?:m([0-9]+))?(?:s([0-9]+))?$").expect("valid duration pattern")
});

/// Parse the compact `h<digits>m<digits>s<digits>` form into seconds.
///
/// Every field is optional but at least one must be present. Returns `None`
/// for anything else, including values that overflow `u64`.
pub fn parse_duration(text: &str) -> Option<u64> {
    let captures = DURATION_PATTERN.captures(text)?;

    let mut total: u64 = 0;
    let mut seen_field = false;
    for (group, scale) in [(1, 3600u64), (2, 60), (3, 1)] {
        if let Some(field) = captures.get(group) {
            seen_field = true;
            let value: u64 = field.as_str().parse().ok()?;
            total = total.checked_add(value.checked_mul(scale)?)?;
        }
    }

    seen_field.then_some(total)
}

/// A timeout given either as a plain second count or as compact duration text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutSetting {
    Seconds(u64),
    Text(String),
}

impl TimeoutSetting {
    /// Resolve to a concrete duration, falling back to `default` on bad text
    pub fn resolve(&self, default: Duration) -> Duration {
        match self {
            TimeoutSetting::Seconds(secs) => Duration::from_secs(*secs),
            TimeoutSetting::Text(text) => match parse_duration(text) {
                Some(secs) => Duration::from_secs(secs),
                None => {
                    tracing::warn!(
                        "Unparseable timeout '{}', using default of {}s",
                        text,
                        default.as_secs()
                    );
                    default
                }
            },
        }
    }
}

/// Per-target fuzzing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Target name (`risc0`, `sp1`, `jolt`)
    pub name: String,
    /// Injection kinds this target may select, by name
    pub enabled_injections: Vec<String>,
    /// Preferred instruction kinds, by name; empty disables preference
    pub preferred_instructions: Vec<String>,
    /// Commit hash or alias of the vendored zkVM checkout
    pub revision: String,
    /// Remote to clone from when the checkout is missing
    pub remote_url: Option<String>,
    /// Where the zkVM source lives on disk
    pub checkout_dir: Option<String>,
    /// Toolchain pin used to build guests
    pub toolchain: Option<String>,
    /// Patch the vendored zkVM with the injection source
    pub fault_injection: bool,
    /// Ask the generated guest project to collect execution traces
    pub trace_collection: bool,
    pub build_timeout: TimeoutSetting,
    pub run_timeout: TimeoutSetting,
    /// Build argv, run inside the generated project; empty skips the build step
    pub build_command: Vec<String>,
    /// Run argv, run inside the generated project; empty skips execution
    pub run_command: Vec<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            name: "risc0".to_string(),
            enabled_injections: Vec::new(),
            preferred_instructions: Vec::new(),
            revision: "main".to_string(),
            remote_url: None,
            checkout_dir: None,
            toolchain: None,
            fault_injection: false,
            trace_collection: false,
            build_timeout: TimeoutSetting::Seconds(DEFAULT_BUILD_TIMEOUT.as_secs()),
            run_timeout: TimeoutSetting::Seconds(DEFAULT_RUN_TIMEOUT.as_secs()),
            build_command: Vec::new(),
            run_command: Vec::new(),
        }
    }
}

impl TargetConfig {
    pub fn flags(&self) -> ProjectFlags {
        ProjectFlags {
            fault_injection: self.fault_injection,
            trace_collection: self.trace_collection,
        }
    }

    pub fn build_timeout(&self) -> Duration {
        self.build_timeout.resolve(DEFAULT_BUILD_TIMEOUT)
    }

    pub fn run_timeout(&self) -> Duration {
        self.run_timeout.resolve(DEFAULT_RUN_TIMEOUT)
    }

    /// Whether generated guests are run at all; the build step is optional
    pub fn executes(&self) -> bool {
        !self.run_command.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_duration_examples() {
        assert_eq!(parse_duration("h1m1s1"), Some(3661));
        assert_eq!(parse_duration("h0001m001s01"), Some(3661));
        assert_eq!(parse_duration("s10"), Some(10));
        assert_eq!(parse_duration("m10"), Some(600));
        assert_eq!(parse_duration("h2"), Some(7200));
        assert_eq!(parse_duration("h1s5"), Some(3605));
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("h1abc"), None);
        assert_eq!(parse_duration("h1h1"), None);
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("s1m1"), None);
        assert_eq!(parse_duration("h 1"), None);
        assert_eq!(parse_duration("d1"), None);
        assert_eq!(parse_duration("h99999999999999999999"), None);
    }

    #[test]
    fn test_timeout_resolution() {
        let default = Duration::from_secs(42);
        assert_eq!(TimeoutSetting::Seconds(5).resolve(default), Duration::from_secs(5));
        assert_eq!(
            TimeoutSetting::Text("m2".to_string()).resolve(default),
            Duration::from_secs(120)
        );
        assert_eq!(TimeoutSetting::Text("soon".to_string()).resolve(default), default);
    }

    #[test]
    fn test_timeout_deserializes_either_form() {
        let secs: TimeoutSetting = serde_json::from_str("30").unwrap();
        assert_eq!(secs, TimeoutSetting::Seconds(30));

        let text: TimeoutSetting = serde_json::from_str("\"h1m30\"").unwrap();
        assert_eq!(text, TimeoutSetting::Text("h1m30".to_string()));
    }

    #[test]
    fn test_target_config_defaults() {
        let config: TargetConfig = serde_json::from_str(r#"{"name": "sp1"}"#).unwrap();
        assert_eq!(config.name, "sp1");
        assert_eq!(config.build_timeout(), DEFAULT_BUILD_TIMEOUT);
        assert_eq!(config.run_timeout(), DEFAULT_RUN_TIMEOUT);
        assert!(!config.executes());
        assert_eq!(config.flags(), ProjectFlags::default());
    }

    proptest! {
        #[test]
        fn prop_parse_duration_sums_fields(h in 0u64..10_000, m in 0u64..10_000, s in 0u64..10_000) {
            let text = format!("h{}m{}s{}", h, m, s);
            prop_assert_eq!(parse_duration(&text), Some(h * 3600 + m * 60 + s));
        }

        #[test]
        fn prop_parse_duration_never_panics(text in ".{0,24}") {
            let _ = parse_duration(&text);
        }

        #[test]
        fn prop_foreign_characters_are_unparseable(prefix in "[hms0-9]{0,6}", bad in "[a-gi-ln-rt-z ,:]", suffix in "[hms0-9]{0,6}") {
            let text = format!("{}{}{}", prefix, bad, suffix);
            prop_assert_eq!(parse_duration(&text), None);
        }
    }
}
