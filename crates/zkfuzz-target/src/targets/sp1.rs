//! Succinct SP1.

use super::{InjectionSource, Revision};
use crate::taxonomy::Label;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionKind {
    ArithmeticResult,
    BranchCondition,
    MemoryLoad,
    ShiftAmount,
    Syscall,
}

impl Label for InjectionKind {
    const ALL: &'static [Self] = &[
        InjectionKind::ArithmeticResult,
        InjectionKind::BranchCondition,
        InjectionKind::MemoryLoad,
        InjectionKind::ShiftAmount,
        InjectionKind::Syscall,
    ];

    fn name(self) -> &'static str {
        match self {
            InjectionKind::ArithmeticResult => "arithmetic_result",
            InjectionKind::BranchCondition => "branch_condition",
            InjectionKind::MemoryLoad => "memory_load",
            InjectionKind::ShiftAmount => "shift_amount",
            InjectionKind::Syscall => "syscall",
        }
    }
}

pub const REVISIONS: &[Revision] = &[Revision {
    commit: "c1d0e3b2a7f54b6e8d9c0a1f2e3d4c5b6a798081",
    aliases: &["v4.1.0", "dev"],
    provider: hooks_v4,
}];

fn hooks_v4() -> InjectionSource {
    InjectionSource {
        relative_path: "crates/core/executor/src/zkfuzz.rs",
        text: HOOKS_V4,
    }
}

const HOOKS_V4: &str = r#"// zkfuzz fault hooks for sp1 v4
fn enabled(kind: &str) -> bool {
    std::env::var("ZKFUZZ_INJECT")
        .map(|v| v.split(',').any(|k| k == kind))
        .unwrap_or(false)
}

pub fn arithmetic_result(a: u32) -> u32 {
    if enabled("arithmetic_result") { a ^ 0x8000_0000 } else { a }
}

pub fn branch_condition(taken: bool) -> bool {
    if enabled("branch_condition") { !taken } else { taken }
}

pub fn memory_load(word: u32) -> u32 {
    if enabled("memory_load") { word.swap_bytes() } else { word }
}

pub fn shift_amount(shamt: u32) -> u32 {
    if enabled("shift_amount") { shamt & 0x3f } else { shamt & 0x1f }
}

pub fn syscall(code: u32) -> u32 {
    if enabled("syscall") { code.wrapping_add(1) } else { code }
}
"#;
