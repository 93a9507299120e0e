//! Closed label sets for fault injections and guest instructions.
//!
//! Labels carry no behavior. They only name what a patch or a generated guest
//! should exercise, and are picked with a seeded rng restricted to the set a
//! target has enabled.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use zkfuzz_core::{weighted_select, Error, Result, TargetConfig};

/// Relative weight of a preferred label against a non-preferred one
pub const PREFERRED_WEIGHT: f64 = 4.0;

/// A closed, named variant set
pub trait Label: Copy + Eq + Hash + Debug + 'static {
    /// Every variant, in canonical order
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|label| label.name() == name)
    }
}

/// Parse configured names into labels, in canonical order without duplicates.
///
/// Unknown names are configuration errors.
pub fn parse_labels<L: Label>(names: &[String]) -> Result<Vec<L>> {
    let mut wanted = Vec::with_capacity(names.len());
    for name in names {
        let label = L::from_name(name.trim())
            .ok_or_else(|| Error::Config(format!("unknown label '{}'", name)))?;
        wanted.push(label);
    }
    Ok(L::ALL
        .iter()
        .copied()
        .filter(|label| wanted.contains(label))
        .collect())
}

pub fn label_names<L: Label>(labels: &[L]) -> Vec<&'static str> {
    labels.iter().map(|label| label.name()).collect()
}

/// Pick one of `enabled`.
///
/// With no preference the draw is uniform. Otherwise labels that are also in
/// `preferred` weigh [`PREFERRED_WEIGHT`] and the rest weigh 1. A preferred
/// label that is not enabled is never returned.
pub fn select_label<L: Label, R: Rng + ?Sized>(
    enabled: &[L],
    preferred: &[L],
    rng: &mut R,
) -> Result<L> {
    if enabled.is_empty() {
        return Err(Error::EmptyInput("no enabled labels".to_string()));
    }
    if preferred.is_empty() {
        return Ok(enabled[rng.gen_range(0..enabled.len())]);
    }

    let weights: HashMap<L, f64> = enabled
        .iter()
        .map(|label| {
            let weight = if preferred.contains(label) {
                PREFERRED_WEIGHT
            } else {
                1.0
            };
            (*label, weight)
        })
        .collect();
    weighted_select(enabled, &weights, rng).copied()
}

/// RV32IM instruction categories a guest can be steered toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrKind {
    Add,
    Sub,
    Mul,
    Mulh,
    Mulhu,
    Mulhsu,
    Div,
    Divu,
    Rem,
    Remu,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sra,
    Slt,
    Sltu,
    Branch,
    Load,
    Store,
    Lui,
    Auipc,
    Jal,
    Jalr,
    Ecall,
}

impl Label for InstrKind {
    const ALL: &'static [Self] = &[
        InstrKind::Add,
        InstrKind::Sub,
        InstrKind::Mul,
        InstrKind::Mulh,
        InstrKind::Mulhu,
        InstrKind::Mulhsu,
        InstrKind::Div,
        InstrKind::Divu,
        InstrKind::Rem,
        InstrKind::Remu,
        InstrKind::And,
        InstrKind::Or,
        InstrKind::Xor,
        InstrKind::Sll,
        InstrKind::Srl,
        InstrKind::Sra,
        InstrKind::Slt,
        InstrKind::Sltu,
        InstrKind::Branch,
        InstrKind::Load,
        InstrKind::Store,
        InstrKind::Lui,
        InstrKind::Auipc,
        InstrKind::Jal,
        InstrKind::Jalr,
        InstrKind::Ecall,
    ];

    fn name(self) -> &'static str {
        match self {
            InstrKind::Add => "add",
            InstrKind::Sub => "sub",
            InstrKind::Mul => "mul",
            InstrKind::Mulh => "mulh",
            InstrKind::Mulhu => "mulhu",
            InstrKind::Mulhsu => "mulhsu",
            InstrKind::Div => "div",
            InstrKind::Divu => "divu",
            InstrKind::Rem => "rem",
            InstrKind::Remu => "remu",
            InstrKind::And => "and",
            InstrKind::Or => "or",
            InstrKind::Xor => "xor",
            InstrKind::Sll => "sll",
            InstrKind::Srl => "srl",
            InstrKind::Sra => "sra",
            InstrKind::Slt => "slt",
            InstrKind::Sltu => "sltu",
            InstrKind::Branch => "branch",
            InstrKind::Load => "load",
            InstrKind::Store => "store",
            InstrKind::Lui => "lui",
            InstrKind::Auipc => "auipc",
            InstrKind::Jal => "jal",
            InstrKind::Jalr => "jalr",
            InstrKind::Ecall => "ecall",
        }
    }
}

/// Preferred instruction kinds for a target; empty disables preference
pub fn preferred_instructions(config: &TargetConfig) -> Result<Vec<InstrKind>> {
    parse_labels(&config.preferred_instructions)
}

/// Injection kinds a target has switched on, in canonical order
pub fn enabled_injection_kinds<K: Label>(config: &TargetConfig) -> Result<Vec<K>> {
    parse_labels(&config.enabled_injections)
}
