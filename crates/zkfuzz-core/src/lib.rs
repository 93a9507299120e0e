//! Core types and utilities for the zkfuzz differential zkVM fuzzing harness.

pub mod types;
pub mod config;
pub mod error;
pub mod sampling;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use sampling::{bernoulli, choose_weighted, weighted_select, Weighted};
