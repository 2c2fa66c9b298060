//! Orchestration de beatcorpus : extraction parallèle, rapport et CLI.
//!
//! The binary `beatcorpus` is a thin layer over this crate; the integration
//! tests drive [`batch::run_batch`] directly.

pub mod batch;
pub mod cli;
pub mod commands;
pub mod process;
pub mod report;

pub use batch::run_batch;
pub use process::{BeatFailure, RecordOutcome, process_record};
pub use report::BatchReport;
