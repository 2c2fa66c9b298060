//! Lecture des records WFDB (header, signal, annotations MIT) pour beatcorpus.

pub mod annotation;
pub mod discover;
pub mod error;
pub mod header;
pub mod signal;
pub mod wfdb;
pub mod writer;

pub use discover::discover_records;
pub use error::SourceError;
pub use wfdb::WfdbSource;
