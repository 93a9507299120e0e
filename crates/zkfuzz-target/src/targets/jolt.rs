//! a16z Jolt.

use super::{InjectionSource, Revision};
use crate::taxonomy::Label;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionKind {
    ArithmeticResult,
    LookupTable,
    RegisterWrite,
    ShiftAmount,
}

impl Label for InjectionKind {
    const ALL: &'static [Self] = &[
        InjectionKind::ArithmeticResult,
        InjectionKind::LookupTable,
        InjectionKind::RegisterWrite,
        InjectionKind::ShiftAmount,
    ];

    fn name(self) -> &'static str {
        match self {
            InjectionKind::ArithmeticResult => "arithmetic_result",
            InjectionKind::LookupTable => "lookup_table",
            InjectionKind::RegisterWrite => "register_write",
            InjectionKind::ShiftAmount => "shift_amount",
        }
    }
}

pub const REVISIONS: &[Revision] = &[Revision {
    commit: "0e6f7a2b5c9d41e38f7a60b2c4d1e9f8a3b57c26",
    aliases: &["main-2024-11"],
    provider: hooks,
}];

fn hooks() -> InjectionSource {
    InjectionSource {
        relative_path: "tracer/src/emulator/zkfuzz.rs",
        text: HOOKS,
    }
}

const HOOKS: &str = r#"// zkfuzz fault hooks for jolt tracer
fn enabled(kind: &str) -> bool {
    std::env::var("ZKFUZZ_INJECT")
        .map(|v| v.split(',').any(|k| k == kind))
        .unwrap_or(false)
}

pub fn arithmetic_result(value: u64) -> u64 {
    if enabled("arithmetic_result") { value ^ 1 } else { value }
}

pub fn lookup_table(index: usize) -> usize {
    if enabled("lookup_table") { index.wrapping_add(1) } else { index }
}

pub fn register_write(rd: usize) -> usize {
    if enabled("register_write") && rd != 0 { (rd % 31) + 1 } else { rd }
}

pub fn shift_amount(shamt: u64) -> u64 {
    if enabled("shift_amount") { shamt & 0x3f } else { shamt & 0x1f }
}
"#;
