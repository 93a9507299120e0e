//! Classification of a finished build/run.

use crate::panic::{parse_panics, PanicInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static OUTPUT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*output:\s*(\d+)\s*$").expect("static regex compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutClass {
    Build,
    Run,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// Well-formed output that differs from the expected value
    Mismatch { expected: u32, actual: u32 },
    /// Abnormal termination; `panics` is empty when `raw` could not be parsed
    Crashed { panics: Vec<PanicInfo>, raw: String },
    TimedOut(TimeoutClass),
    /// Inconclusive, the target never ran
    BuildFailed { log: String },
}

impl Outcome {
    /// Whether the outcome should be reported as a fuzzing finding
    pub fn is_finding(&self) -> bool {
        matches!(
            self,
            Outcome::Mismatch { .. } | Outcome::Crashed { .. } | Outcome::TimedOut(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Mismatch { .. } => "mismatch",
            Outcome::Crashed { .. } => "crashed",
            Outcome::TimedOut(TimeoutClass::Build) => "build_timeout",
            Outcome::TimedOut(TimeoutClass::Run) => "run_timeout",
            Outcome::BuildFailed { .. } => "build_failed",
        }
    }
}

/// Classify a completed run from the expected value, the parsed output and
/// any crash text. Crash text wins over output.
pub fn classify(expected: u32, actual: Option<u32>, crash_text: Option<&str>) -> Outcome {
    if let Some(raw) = crash_text {
        return Outcome::Crashed {
            panics: parse_panics(raw),
            raw: raw.to_string(),
        };
    }
    match actual {
        Some(actual) if actual == expected => Outcome::Passed,
        Some(actual) => Outcome::Mismatch { expected, actual },
        None => Outcome::Crashed {
            panics: Vec::new(),
            raw: String::new(),
        },
    }
}

/// What the executor observed for one build + run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    BuildTimedOut,
    BuildFailed { log: String },
    RunTimedOut,
    Exited {
        success: bool,
        stdout: String,
        stderr: String,
    },
}

impl RunReport {
    pub fn classify(&self, expected: u32) -> Outcome {
        match self {
            RunReport::BuildTimedOut => Outcome::TimedOut(TimeoutClass::Build),
            RunReport::RunTimedOut => Outcome::TimedOut(TimeoutClass::Run),
            RunReport::BuildFailed { log } => Outcome::BuildFailed { log: log.clone() },
            RunReport::Exited {
                success: true,
                stdout,
                stderr,
            } => match parse_guest_output(stdout) {
                Some(actual) => classify(expected, Some(actual), None),
                // Exited cleanly without reporting a value.
                None => classify(expected, None, Some(&join_streams(stdout, stderr))),
            },
            RunReport::Exited {
                success: false,
                stdout,
                stderr,
            } => classify(expected, None, Some(&join_streams(stdout, stderr))),
        }
    }
}

/// Value of the last `output: <decimal>` line on stdout
pub fn parse_guest_output(stdout: &str) -> Option<u32> {
    stdout
        .lines()
        .rev()
        .find_map(|line| OUTPUT_LINE.captures(line))
        .and_then(|caps| caps[1].parse().ok())
}

fn join_streams(stdout: &str, stderr: &str) -> String {
    match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{}\n{}", stdout, stderr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRASH: &str = "thread 'main' panicked at src/main.rs:3:5:\nattempt to divide by zero\n";

    #[test]
    fn test_classify_basic() {
        assert_eq!(classify(7, Some(7), None), Outcome::Passed);
        assert_eq!(
            classify(7, Some(8), None),
            Outcome::Mismatch {
                expected: 7,
                actual: 8
            }
        );

        match classify(7, Some(7), Some(CRASH)) {
            Outcome::Crashed { panics, raw } => {
                assert_eq!(panics.len(), 1);
                assert_eq!(raw, CRASH);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_crash_is_still_crashed() {
        match classify(1, None, Some("Killed")) {
            Outcome::Crashed { panics, raw } => {
                assert!(panics.is_empty());
                assert_eq!(raw, "Killed");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_classification_is_idempotent() {
        let triples = [
            (5, Some(5), None),
            (5, Some(6), None),
            (5, None, Some(CRASH)),
            (5, None, Some("garbage")),
            (5, None, None),
        ];
        for (expected, actual, crash) in triples {
            assert_eq!(
                classify(expected, actual, crash),
                classify(expected, actual, crash)
            );
        }
    }

    #[test]
    fn test_report_classification() {
        assert_eq!(
            RunReport::BuildTimedOut.classify(0),
            Outcome::TimedOut(TimeoutClass::Build)
        );
        assert_eq!(
            RunReport::RunTimedOut.classify(0),
            Outcome::TimedOut(TimeoutClass::Run)
        );
        assert_eq!(
            RunReport::BuildFailed {
                log: "error[E0308]".to_string()
            }
            .classify(0),
            Outcome::BuildFailed {
                log: "error[E0308]".to_string()
            }
        );

        let passed = RunReport::Exited {
            success: true,
            stdout: "cycles: 1024\noutput: 42\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(passed.classify(42), Outcome::Passed);
        assert!(matches!(passed.classify(41), Outcome::Mismatch { actual: 42, .. }));

        let crashed = RunReport::Exited {
            success: false,
            stdout: String::new(),
            stderr: CRASH.to_string(),
        };
        assert!(matches!(
            crashed.classify(42),
            Outcome::Crashed { ref panics, .. } if panics.len() == 1
        ));

        let silent = RunReport::Exited {
            success: true,
            stdout: "done\n".to_string(),
            stderr: String::new(),
        };
        assert!(matches!(silent.classify(42), Outcome::Crashed { .. }));
    }

    #[test]
    fn test_parse_guest_output() {
        assert_eq!(parse_guest_output("output: 1\noutput: 2\n"), Some(2));
        assert_eq!(parse_guest_output("  output:  4294967295 "), Some(u32::MAX));
        assert_eq!(parse_guest_output("output: 4294967296"), None);
        assert_eq!(parse_guest_output("result: 3"), None);
    }

    #[test]
    fn test_outcome_json() {
        let json = serde_json::to_string(&Outcome::TimedOut(TimeoutClass::Run)).unwrap();
        assert_eq!(json, r#"{"outcome":"timed_out","detail":"run"}"#);

        let crashed = classify(3, None, Some(CRASH));
        let restored: Outcome =
            serde_json::from_str(&serde_json::to_string(&crashed).unwrap()).unwrap();
        assert_eq!(restored, crashed);
    }

    #[test]
    fn test_findings() {
        assert!(!Outcome::Passed.is_finding());
        assert!(!Outcome::BuildFailed { log: String::new() }.is_finding());
        assert!(Outcome::TimedOut(TimeoutClass::Run).is_finding());
        assert_eq!(Outcome::TimedOut(TimeoutClass::Build).label(), "build_timeout");
    }
}
