use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file or directory does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// A record carries fewer than two annotations and therefore no beat.
    #[error("Record {record} : {count} annotation(s), au moins 2 requises")]
    InsufficientAnnotations {
        /// Record identifier.
        record: String,
        /// Number of annotations actually present.
        count: usize,
    },
}
