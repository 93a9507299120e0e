//! Intermediate representation for generated guest circuits.
//!
//! A circuit is a typed expression tree over 32-bit field values and
//! booleans. Rewrite rules turn one circuit into semantically equal ones, and
//! the bundle generator packages a seed with its variants so that any
//! disagreement between their executed outputs points at the zkVM.

pub mod circuit;
pub mod emit;
pub mod eval;
pub mod expr;
pub mod generator;
pub mod rewrite;
pub mod validation;

pub use circuit::{Bundle, Circuit, Input};
pub use emit::{EmitterConfig, GuestEmitter};
pub use eval::{evaluate, Env};
pub use expr::{BinaryOp, Expr, Kind, Operator, UnaryOp};
pub use generator::{BundleGenerator, Budgets, GenerationConfig, RewriteDistribution, ShapeConfig};
pub use rewrite::{Effect, RewriteContext, RewriteRule, RuleSet};
pub use validation::{check_kinds, validate_circuit};
