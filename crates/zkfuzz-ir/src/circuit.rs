//! Circuits and bundles of related circuits.

use crate::eval::{evaluate, Env};
use crate::expr::{Expr, Kind};
use serde::{Deserialize, Serialize};
use zkfuzz_core::Result;

/// A declared guest input and the value it is fed during runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    pub kind: Kind,
    pub value: u32,
}

impl Input {
    pub fn new(name: impl Into<String>, kind: Kind, value: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
        }
    }
}

/// One generated guest program
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Circuit {
    pub name: String,
    pub inputs: Vec<Input>,
    pub output_kind: Kind,
    pub root: Expr,
    /// Names of the rewrite rules applied to reach this circuit, in order
    pub rewrites: Vec<String>,
    /// Set when a semantics-changing rule was applied
    pub perturbed: bool,
}

impl Circuit {
    pub fn new(name: impl Into<String>, inputs: Vec<Input>, root: Expr) -> Self {
        Self {
            name: name.into(),
            output_kind: root.kind(),
            inputs,
            root,
            rewrites: Vec::new(),
            perturbed: false,
        }
    }

    pub fn env(&self) -> Env {
        self.inputs
            .iter()
            .map(|input| (input.name.clone(), input.value))
            .collect()
    }

    /// Output of the circuit under its recorded input assignment
    pub fn evaluate(&self) -> Result<u32> {
        evaluate(&self.root, &self.env())
    }

    pub fn is_seed(&self) -> bool {
        self.rewrites.is_empty() && !self.perturbed
    }
}

/// A seed circuit followed by its rewritten variants.
///
/// Built once by the generator; fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    circuits: Vec<Circuit>,
    expected: u32,
}

impl Bundle {
    pub(crate) fn new(circuits: Vec<Circuit>, expected: u32) -> Self {
        Self { circuits, expected }
    }

    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    /// The circuit every variant was derived from
    pub fn seed(&self) -> &Circuit {
        &self.circuits[0]
    }

    pub fn variants(&self) -> &[Circuit] {
        &self.circuits[1..]
    }

    /// Seed output under the recorded inputs; the ground truth for comparison
    pub fn expected(&self) -> u32 {
        self.expected
    }

    /// Inputs shared by every circuit in the bundle
    pub fn inputs(&self) -> &[Input] {
        &self.seed().inputs
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    /// Serialize the bundle to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize a bundle from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bundle: Bundle = bincode::deserialize(bytes)?;
        if bundle.circuits.is_empty() {
            return Err(zkfuzz_core::Error::EmptyInput(
                "bundle without circuits".to_string(),
            ));
        }
        Ok(bundle)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
