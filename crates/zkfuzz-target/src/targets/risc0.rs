//! RISC Zero.

use super::{InjectionSource, Revision};
use crate::taxonomy::Label;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionKind {
    ArithmeticResult,
    BranchCondition,
    MemoryStore,
    RegisterWrite,
}

impl Label for InjectionKind {
    const ALL: &'static [Self] = &[
        InjectionKind::ArithmeticResult,
        InjectionKind::BranchCondition,
        InjectionKind::MemoryStore,
        InjectionKind::RegisterWrite,
    ];

    fn name(self) -> &'static str {
        match self {
            InjectionKind::ArithmeticResult => "arithmetic_result",
            InjectionKind::BranchCondition => "branch_condition",
            InjectionKind::MemoryStore => "memory_store",
            InjectionKind::RegisterWrite => "register_write",
        }
    }
}

pub const REVISIONS: &[Revision] = &[
    Revision {
        commit: "9bb5a5d7e6c3b0b1a5e84bd3f2cc24ba0e4f9c1e",
        aliases: &["v1.2.0", "release-1.2"],
        provider: hooks_v1_2,
    },
    Revision {
        commit: "4f1a8e0c2d77b6e9158a6a30c9be1f0d82c35a47",
        aliases: &["v2.0.0", "release-2.0"],
        provider: hooks_v2_0,
    },
];

fn hooks_v1_2() -> InjectionSource {
    InjectionSource {
        relative_path: "risc0/circuit/rv32im/src/prove/emu/zkfuzz.rs",
        text: HOOKS_V1_2,
    }
}

fn hooks_v2_0() -> InjectionSource {
    InjectionSource {
        relative_path: "risc0/circuit/rv32im/src/execute/zkfuzz.rs",
        text: HOOKS_V2_0,
    }
}

const HOOKS_V1_2: &str = r#"// zkfuzz fault hooks for risc0 v1.2 (emulator path)
fn enabled(kind: &str) -> bool {
    std::env::var("ZKFUZZ_INJECT")
        .map(|v| v.split(',').any(|k| k == kind))
        .unwrap_or(false)
}

pub fn arithmetic_result(result: u32) -> u32 {
    if enabled("arithmetic_result") { result ^ 1 } else { result }
}

pub fn branch_condition(taken: bool) -> bool {
    if enabled("branch_condition") { !taken } else { taken }
}

pub fn memory_store(word: u32) -> u32 {
    if enabled("memory_store") { word.rotate_left(8) } else { word }
}

pub fn register_write(rd: usize) -> usize {
    if enabled("register_write") && rd != 0 { (rd % 31) + 1 } else { rd }
}
"#;

const HOOKS_V2_0: &str = r#"// zkfuzz fault hooks for risc0 v2.0 (executor path)
fn enabled(kind: &str) -> bool {
    std::env::var("ZKFUZZ_INJECT")
        .map(|v| v.split(',').any(|k| k == kind))
        .unwrap_or(false)
}

#[inline]
pub fn arithmetic_result(result: u32) -> u32 {
    if enabled("arithmetic_result") { result.wrapping_add(1) } else { result }
}

#[inline]
pub fn branch_condition(taken: bool) -> bool {
    if enabled("branch_condition") { !taken } else { taken }
}

#[inline]
pub fn memory_store(word: u32) -> u32 {
    if enabled("memory_store") { word & 0xffff_fffe } else { word }
}

#[inline]
pub fn register_write(rd: usize) -> usize {
    if enabled("register_write") && rd != 0 { (rd % 31) + 1 } else { rd }
}
"#;
