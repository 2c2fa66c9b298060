use thiserror::Error;

/// Errors originating from the WFDB reader.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Malformed header line.
    #[error("Header invalide (ligne {line}) : {reason}")]
    Header {
        /// 1-based line number in the header file.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Signal storage format this reader does not decode.
    #[error("Format de signal non supporté : {0}")]
    UnsupportedFormat(String),

    /// Header declares no signal.
    #[error("Aucun signal déclaré dans le header")]
    NoSignal,

    /// Annotation stream ended in the middle of a word or payload.
    #[error("Fichier d'annotations tronqué à l'octet {offset}")]
    TruncatedAnnotations {
        /// Byte offset where decoding stopped.
        offset: usize,
    },

    /// Symbol has no MIT annotation code.
    #[error("Symbole d'annotation inconnu : {0}")]
    UnknownSymbol(String),
}
