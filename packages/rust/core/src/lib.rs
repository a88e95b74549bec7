//! Core domain logic and pipeline orchestration for prgen.
//!
//! This crate ties together project classification, change collection,
//! prompting, output cleanup and document assembly into the end-to-end
//! flows behind each command (e.g., `generate_pr`).

pub mod assembler;
pub mod checklist;
pub mod classify;
pub mod notes;
pub mod output;
pub mod pipeline;
pub mod prompt;

pub use assembler::{OptionalSection, assemble, assemble_with};
pub use classify::{MarkerSnapshot, classify, detect_dir};
pub use notes::NotesSource;
pub use pipeline::{
    CommitOutcome, PrDraft, PrOutcome, PrRequest, ProgressReporter, ReviewOutcome, SilentProgress,
};
