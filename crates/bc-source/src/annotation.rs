use std::path::Path;

use anyhow::{Context, Result};
use bc_core::record::Annotation;

use crate::error::SourceError;

// Pseudo-codes du format MIT.
const SKIP: u16 = 59;
const NUM: u16 = 60;
const SUB: u16 = 61;
const CHN: u16 = 62;
const AUX: u16 = 63;

/// Plus grand intervalle encodable dans un mot (10 bits).
pub(crate) const MAX_SHORT_INTERVAL: i64 = 0x3FF;

/// Symboles des codes d'annotation standard, indexés par code.
/// Une chaîne vide marque un code sans symbole (non émis).
const SYMBOLS: [&str; 42] = [
    "", "N", "L", "R", "a", "V", "F", "J", "A", "S", "E", "j", "/", "Q", "~", "", "|", "", "s",
    "T", "*", "D", "\"", "=", "p", "B", "^", "t", "+", "u", "?", "!", "[", "]", "e", "n", "@",
    "x", "f", "(", ")", "r",
];

/// Symbole associé à un code d'annotation.
///
/// # Example
/// ```
/// use bc_source::annotation::code_to_symbol;
/// assert_eq!(code_to_symbol(1), Some("N"));
/// assert_eq!(code_to_symbol(12), Some("/"));
/// assert_eq!(code_to_symbol(0), None);
/// ```
#[must_use]
pub fn code_to_symbol(code: u16) -> Option<&'static str> {
    SYMBOLS
        .get(code as usize)
        .copied()
        .filter(|s| !s.is_empty())
}

/// Code d'annotation d'un symbole.
///
/// # Errors
/// Returns [`SourceError::UnknownSymbol`] if the symbol is not in the standard table.
pub fn symbol_to_code(symbol: &str) -> Result<u16, SourceError> {
    SYMBOLS
        .iter()
        .position(|s| !s.is_empty() && *s == symbol)
        .map(|i| i as u16)
        .ok_or_else(|| SourceError::UnknownSymbol(symbol.to_string()))
}

/// Décode un flux d'annotations au format binaire MIT.
///
/// Each 16-bit little-endian word holds a 6-bit code and a 10-bit interval
/// added to the running sample index. `SKIP` carries a 32-bit interval in
/// PDP-11 order, `AUX` a payload padded to an even length. `0/0` ends the stream.
///
/// # Errors
/// Returns [`SourceError::TruncatedAnnotations`] if the stream stops inside a payload.
///
/// # Example
/// ```
/// use bc_source::annotation::decode_annotations;
/// // N @ 18, V @ 20, fin.
/// let bytes = [18, 0x04, 2, 0x14, 0, 0];
/// let anns = decode_annotations(&bytes).unwrap();
/// assert_eq!(anns.len(), 2);
/// assert_eq!((anns[1].sample, anns[1].symbol.as_str()), (20, "V"));
/// ```
pub fn decode_annotations(bytes: &[u8]) -> Result<Vec<Annotation>, SourceError> {
    let mut anns = Vec::new();
    let mut time: i64 = 0;
    let mut pos = 0usize;

    let word_at = |pos: usize| -> Result<u16, SourceError> {
        bytes
            .get(pos..pos + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .ok_or(SourceError::TruncatedAnnotations { offset: pos })
    };

    while pos + 1 < bytes.len() {
        let word = word_at(pos)?;
        pos += 2;
        let code = word >> 10;
        let value = word & 0x3FF;

        match code {
            0 if value == 0 => break,
            SKIP => {
                let high = word_at(pos)?;
                let low = word_at(pos + 2)?;
                pos += 4;
                time += i64::from(((u32::from(high) << 16) | u32::from(low)) as i32);
            }
            NUM | SUB | CHN => {}
            AUX => {
                let len = usize::from(value);
                let padded = len + (len & 1);
                if pos + padded > bytes.len() {
                    return Err(SourceError::TruncatedAnnotations { offset: pos });
                }
                pos += padded;
            }
            _ => {
                time += i64::from(value);
                if let Some(symbol) = code_to_symbol(code) {
                    anns.push(Annotation::new(time, symbol));
                }
            }
        }
    }

    Ok(anns)
}

/// Lit un fichier d'annotations MIT.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn read_annotations(path: &Path) -> Result<Vec<Annotation>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Impossible de lire {}", path.display()))?;
    decode_annotations(&bytes).with_context(|| format!("Annotations invalides : {}", path.display()))
}
