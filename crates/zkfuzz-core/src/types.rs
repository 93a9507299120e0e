//! Core type definitions shared across the harness.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one fuzzing campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub Uuid);

impl CampaignId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CampaignId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Switches handed to the guest project generator alongside a bundle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFlags {
    pub fault_injection: bool,
    pub trace_collection: bool,
}

/// Inclusive numeric range used for value and budget bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy + fmt::Display> Bounds<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Reject ranges whose lower end exceeds the upper end
    pub fn validate(&self, what: &str) -> crate::Result<()> {
        if self.min > self.max {
            return Err(crate::Error::InvalidBounds(format!(
                "{}: min {} exceeds max {}",
                what, self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}
