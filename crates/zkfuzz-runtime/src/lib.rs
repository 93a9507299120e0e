//! Execution side of the harness: running generated guests under a target
//! zkVM and classifying what came back.

pub mod executor;
pub mod outcome;
pub mod panic;

pub use executor::{run_command, CommandOutput, CommandSpec, Executor};
pub use outcome::{classify, parse_guest_output, Outcome, RunReport, TimeoutClass};
pub use panic::{parse_panics, PanicInfo, SourceLocation};
