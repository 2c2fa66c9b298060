use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conditions non fatales relevées pendant la sélection équilibrée.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitWarning {
    /// Class has fewer images than the quota; all of them are used.
    #[error("Quota non atteint pour {label} : {available}/{quota} images")]
    QuotaUnmet {
        /// Class label.
        label: String,
        /// Images available in the corpus.
        available: usize,
        /// Requested quota.
        quota: usize,
    },

    /// Class directory absent or empty; counts as zero available.
    #[error("Aucune image pour la classe {label}")]
    CorpusEmpty {
        /// Class label.
        label: String,
    },
}

/// Errors raised while materializing a split.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Image size differs from the expected array shape.
    #[error("Image {path} : {width}×{height}, attendu {expected_width}×{expected_height}")]
    ImageSize {
        /// Offending file.
        path: String,
        /// Actual width.
        width: u32,
        /// Actual height.
        height: u32,
        /// Expected width.
        expected_width: u32,
        /// Expected height.
        expected_height: u32,
    },

    /// Image label is not part of the vocabulary.
    #[error("Label hors vocabulaire : {0}")]
    UnknownLabel(String),
}
