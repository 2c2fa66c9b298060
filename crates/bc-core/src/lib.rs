//! Shared model, configuration and error types for beatcorpus.
//!
//! This crate holds the record/beat data model, the beat windower, the class
//! vocabulary and the seam traits used across the workspace.

pub mod beat;
pub mod config;
pub mod error;
pub mod frame;
pub mod natsort;
pub mod record;
pub mod traits;
pub mod vocab;

pub use beat::{Beat, BeatWindow, WindowOffsets, window_beats};
pub use config::PipelineConfig;
pub use error::CoreError;
pub use frame::GrayCanvas;
pub use record::{Annotation, Record, RecordRef};
pub use vocab::ClassVocabulary;
