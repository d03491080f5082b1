//! Pipeline scheduler configuration compiler
//!
//! Turns a hierarchy of partial Scheduler documents into the configuration a
//! CI bot consumes: per-repository jobs, merge-queue settings, branch
//! protection and plugin settings. Documents name a parent; each
//! repository's chain is merged most-specific-wins and the merged leaves are
//! projected into `config.yaml` and `plugins.yaml`. The reverse direction
//! rebuilds Scheduler documents from an existing configuration.

pub mod chain;
pub mod compile;
pub mod config;
pub mod merge;
pub mod project;
pub mod render;
pub mod reverse;
pub mod source;

pub use chain::{
    generate_chains, resolve_chains, ChainError, ChainSet, LeafSet, LookupWarning, SchedulerLeaf,
};
pub use compile::{compile, CompileError, Compiled};
pub use config::{CompilerConfig, EffectiveConfig};
pub use merge::{build, MergeError};
pub use project::{project, Projection, ProjectionError};
pub use reverse::{reconstruct, ReverseError};
