//! Écriture de records WFDB minimaux : header, données format 16, annotations MIT.
//!
//! Enough to produce fixtures the reader accepts, and to export synthetic records.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use bc_core::record::Annotation;

use crate::annotation::{MAX_SHORT_INTERVAL, symbol_to_code};

const SKIP_WORD: u16 = 59 << 10;

/// Écrit `<id>.hea` et `<id>.dat` (un signal, format 16) dans `dir`.
///
/// Samples are stored as `round(value * gain)` with a zero baseline; NaN is
/// written as the invalid marker `-32768`.
///
/// # Errors
/// Returns an error if a file cannot be written.
pub fn write_record(dir: &Path, id: &str, frequency: f64, gain: f64, samples: &[f32]) -> Result<()> {
    let header = format_header(id, frequency, gain, samples.len());
    let hea = dir.join(format!("{id}.hea"));
    std::fs::write(&hea, header).with_context(|| format!("Écriture impossible : {}", hea.display()))?;

    let dat = dir.join(format!("{id}.dat"));
    std::fs::write(&dat, encode_format16(samples, gain))
        .with_context(|| format!("Écriture impossible : {}", dat.display()))?;
    Ok(())
}

/// Texte du header mono-signal.
#[must_use]
pub fn format_header(id: &str, frequency: f64, gain: f64, n_samples: usize) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{id} 1 {frequency} {n_samples}");
    let _ = writeln!(s, "{id}.dat 16 {gain}(0)/mV 16 0 0 0 0 MLII");
    s
}

/// Encode des valeurs physiques en format 16 (i16 little-endian).
#[must_use]
pub fn encode_format16(samples: &[f32], gain: f64) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&v| {
            let adc = if v.is_finite() {
                (f64::from(v) * gain)
                    .round()
                    .clamp(-32767.0, f64::from(i16::MAX)) as i16
            } else {
                i16::MIN
            };
            adc.to_le_bytes()
        })
        .collect()
}

/// Encode des annotations au format binaire MIT, terminé par `0/0`.
///
/// Intervals above 1023 samples (or negative) are carried by a `SKIP` word.
///
/// # Errors
/// Returns an error if a symbol has no standard code.
///
/// # Example
/// ```
/// use bc_core::record::Annotation;
/// use bc_source::annotation::decode_annotations;
/// use bc_source::writer::encode_annotations;
/// let anns = vec![Annotation::new(18, "N"), Annotation::new(5000, "V")];
/// let bytes = encode_annotations(&anns).unwrap();
/// assert_eq!(decode_annotations(&bytes).unwrap(), anns);
/// ```
pub fn encode_annotations(annotations: &[Annotation]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(annotations.len() * 2 + 2);
    let mut time: i64 = 0;
    for ann in annotations {
        let code = symbol_to_code(&ann.symbol)?;
        let mut delta = ann.sample - time;
        if !(0..=MAX_SHORT_INTERVAL).contains(&delta) {
            let skip = delta as i32 as u32;
            out.extend(SKIP_WORD.to_le_bytes());
            out.extend(((skip >> 16) as u16).to_le_bytes());
            out.extend(((skip & 0xFFFF) as u16).to_le_bytes());
            delta = 0;
        }
        out.extend(((code << 10) | delta as u16).to_le_bytes());
        time = ann.sample;
    }
    out.extend([0, 0]);
    Ok(out)
}

/// Écrit `<id>.<ext>` contenant les annotations.
///
/// # Errors
/// Returns an error if a symbol is unknown or the file cannot be written.
pub fn write_annotations(dir: &Path, id: &str, ext: &str, annotations: &[Annotation]) -> Result<()> {
    let path = dir.join(format!("{id}.{ext}"));
    let bytes = encode_annotations(annotations)?;
    std::fs::write(&path, bytes).with_context(|| format!("Écriture impossible : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::read_annotations;
    use crate::header::read_header;
    use crate::signal::read_channel0;

    #[test]
    fn written_record_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let samples = [0.0f32, 0.5, -1.25, f32::NAN, 2.0];
        write_record(dir.path(), "7", 360.0, 200.0, &samples).unwrap();

        let header = read_header(&dir.path().join("7.hea")).unwrap();
        assert_eq!(header.n_samples, Some(5));
        let read = read_channel0(dir.path(), &header).unwrap();
        assert_eq!(read.len(), 5);
        assert!((read[1] - 0.5).abs() < 1e-6);
        assert!((read[2] + 1.25).abs() < 1e-6);
        assert!(read[3].is_nan());
    }

    #[test]
    fn long_gaps_use_skip() {
        let dir = tempfile::tempdir().unwrap();
        let anns = vec![
            Annotation::new(0, "+"),
            Annotation::new(1023, "N"),
            Annotation::new(651_000, "A"),
            Annotation::new(651_001, "/"),
        ];
        write_annotations(dir.path(), "7", "atr", &anns).unwrap();
        assert_eq!(read_annotations(&dir.path().join("7.atr")).unwrap(), anns);
    }

    #[test]
    fn unknown_symbol_fails() {
        assert!(encode_annotations(&[Annotation::new(3, "Z")]).is_err());
    }
}
