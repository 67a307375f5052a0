//! This crate provides a table-driven Turing Machine execution engine with
//! submachine composition: a transition's action can delegate execution to
//! another machine that operates on the same tape and head position,
//! returning control to the caller once it halts. Arithmetic operations are
//! built by composing small reusable machines this way.
//!
//! The crate includes the tape and transition-table data model, the generic
//! engine with step/run/observer/cancellation support, an explicit
//! submachine registry, and a catalog of built-in arithmetic programs.

pub mod machine;
pub mod programs;
pub mod registry;
pub mod tape;
pub mod types;

/// Re-exports the engine, cancellation token, and configuration snapshot.
pub use machine::{CancelToken, Machine, Snapshot};
/// Re-exports the built-in program catalog and the standard token registry.
pub use programs::{builtin, standard_registry, PROGRAMS};
/// Re-exports the `Registry` struct from the registry module.
pub use registry::Registry;
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the core data types for programs, rules, and outcomes.
pub use types::{
    Action, MachineError, Outcome, Program, Rule, Step, Transition, TransitionTable, Write,
};
