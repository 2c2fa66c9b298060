use thiserror::Error;

/// Échecs du rendu d'un beat. Un échec ne concerne qu'un seul beat.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Window holds no sample once truncated to the signal length.
    #[error("Fenêtre vide : record {record}, beat {beat}")]
    EmptyWindow {
        /// Record identifier.
        record: String,
        /// Beat index within the record.
        beat: usize,
    },

    /// Canvas or output size unusable for rendering.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// Resampling to the output size failed.
    #[error("Redimensionnement impossible : {0}")]
    Resize(String),

    /// PNG encoding failed.
    #[error("Encodage PNG impossible : {0}")]
    Encode(#[from] image::ImageError),

    /// Directory creation, temp file or rename failed.
    #[error("Écriture impossible ({path}) : {source}")]
    Io {
        /// Path involved.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
