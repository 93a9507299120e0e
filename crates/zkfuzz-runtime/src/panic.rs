//! Parsing of panic reports out of raw build/run output.
//!
//! Three layouts are recognised:
//!
//! ```text
//! thread 'main' panicked at src/main.rs:4:5:
//! attempt to add with overflow
//!
//! thread 'main' panicked at 'attempt to add with overflow', src/main.rs:4:5
//!
//! Guest panicked: attempt to add with overflow
//! ```
//!
//! Anything else is ignored, so unparseable text yields no records.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static CURRENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:thread '([^']*)' )?panicked at (.+?):(\d+):(\d+):\s*$")
        .expect("static regex compiles")
});

static LEGACY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"thread '([^']*)' panicked at '(.*)', (.+?):(\d+):(\d+)\s*$")
        .expect("static regex compiles")
});

static GUEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Guest panicked: (.*?)\s*$").expect("static regex compiles"));

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One parsed panic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanicInfo {
    pub message: String,
    pub location: Option<SourceLocation>,
    pub thread: Option<String>,
}

impl PanicInfo {
    /// Key for grouping equivalent crashes.
    ///
    /// Numbers in the message are masked so that, for example, two index
    /// errors with different indices share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let message = DIGITS.replace_all(&self.message, "#");
        match &self.location {
            Some(location) => format!("{}|{}", location, message),
            None => format!("?|{}", message),
        }
    }
}

/// Extract every recognised panic from `text`, in order of appearance
pub fn parse_panics(text: &str) -> Vec<PanicInfo> {
    let lines: Vec<&str> = text.lines().collect();
    let mut panics = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(caps) = GUEST.captures(line) {
            let rest = caps.get(1).map_or("", |m| m.as_str());
            // Newer guests forward the full panic header after the prefix.
            if let Some(inner) = CURRENT.captures(rest) {
                let message = following_message(&lines, i + 1);
                panics.push(PanicInfo {
                    message: message.unwrap_or_default(),
                    location: location(&inner[2], &inner[3], &inner[4]),
                    thread: None,
                });
                i += if message_present(&lines, i + 1) { 2 } else { 1 };
            } else {
                panics.push(PanicInfo {
                    message: rest.to_string(),
                    location: None,
                    thread: None,
                });
                i += 1;
            }
            continue;
        }

        if let Some(caps) = LEGACY.captures(line) {
            panics.push(PanicInfo {
                message: caps[2].to_string(),
                location: location(&caps[3], &caps[4], &caps[5]),
                thread: Some(caps[1].to_string()),
            });
            i += 1;
            continue;
        }

        if let Some(caps) = CURRENT.captures(line) {
            panics.push(PanicInfo {
                message: following_message(&lines, i + 1).unwrap_or_default(),
                location: location(&caps[2], &caps[3], &caps[4]),
                thread: caps.get(1).map(|m| m.as_str().to_string()),
            });
            i += if message_present(&lines, i + 1) { 2 } else { 1 };
            continue;
        }

        i += 1;
    }

    panics
}

fn location(file: &str, line: &str, column: &str) -> Option<SourceLocation> {
    Some(SourceLocation {
        file: file.to_string(),
        line: line.parse().ok()?,
        column: column.parse().ok()?,
    })
}

fn message_present(lines: &[&str], index: usize) -> bool {
    following_message(lines, index).is_some()
}

/// The message line after a header, unless that line opens a panic of its own
fn following_message(lines: &[&str], index: usize) -> Option<String> {
    let line = lines.get(index)?.trim();
    let is_header = CURRENT.is_match(line) || LEGACY.is_match(line) || GUEST.is_match(line);
    if line.is_empty() || line.starts_with("note:") || is_header {
        return None;
    }
    Some(line.to_string())
}
