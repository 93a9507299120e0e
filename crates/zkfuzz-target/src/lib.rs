//! zkVM targets: label taxonomy, per-revision injection sources and
//! checkout management.

pub mod repository;
pub mod revision;
pub mod targets;
pub mod taxonomy;

pub use repository::{install, GitCli, InstallReport, InstallRequest, Repository};
pub use revision::RevisionRegistry;
pub use targets::{InjectionSource, Revision, SourceProvider, Target};
pub use taxonomy::{
    enabled_injection_kinds, label_names, parse_labels, preferred_instructions, select_label,
    InstrKind, Label,
};
