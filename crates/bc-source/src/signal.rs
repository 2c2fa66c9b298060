use std::path::Path;

use anyhow::{Context, Result};

use crate::error::SourceError;
use crate::header::{Header, SignalSpec};

/// Valeur ADC marquant un échantillon invalide, par format.
fn invalid_adc(format: u16) -> i32 {
    match format {
        212 => -2048,
        80 => -128,
        _ => -32768,
    }
}

/// Décode un flux d'octets en valeurs ADC brutes selon le format.
///
/// # Errors
/// Returns [`SourceError::UnsupportedFormat`] for formats other than 212, 16 and 80.
///
/// # Example
/// ```
/// use bc_source::signal::decode_samples;
/// // 212 : deux échantillons 12 bits dans 3 octets.
/// let adc = decode_samples(212, &[0x01, 0xF0, 0x02]).unwrap();
/// assert_eq!(adc, vec![1, -254]);
/// ```
pub fn decode_samples(format: u16, bytes: &[u8]) -> Result<Vec<i32>, SourceError> {
    match format {
        212 => Ok(decode_212(bytes)),
        16 => Ok(bytes
            .chunks_exact(2)
            .map(|b| i32::from(i16::from_le_bytes([b[0], b[1]])))
            .collect()),
        80 => Ok(bytes.iter().map(|&b| i32::from(b) - 128).collect()),
        other => Err(SourceError::UnsupportedFormat(format!("format {other}"))),
    }
}

/// Paires d'échantillons 12 bits compactées : `b0 = lo(s0)`, `b1 = hi(s1)|hi(s0)`, `b2 = lo(s1)`.
fn decode_212(bytes: &[u8]) -> Vec<i32> {
    let sign12 = |v: i32| if v > 2047 { v - 4096 } else { v };
    let mut out = Vec::with_capacity(bytes.len() * 2 / 3 + 1);
    let mut chunks = bytes.chunks_exact(3);
    for c in &mut chunks {
        let (b0, b1, b2) = (i32::from(c[0]), i32::from(c[1]), i32::from(c[2]));
        out.push(sign12(b0 | ((b1 & 0x0F) << 8)));
        out.push(sign12(b2 | ((b1 & 0xF0) << 4)));
    }
    // Trailing pair with a single sample.
    if let [b0, b1] = chunks.remainder() {
        out.push(sign12(i32::from(*b0) | ((i32::from(*b1) & 0x0F) << 8)));
    }
    out
}

/// Lit le canal 0 d'un record et le convertit en unités physiques.
///
/// Signals sharing channel 0's data file are interleaved frame by frame; only
/// channel 0 is kept. With several samples per frame they are averaged. Invalid
/// ADC values become NaN.
///
/// # Errors
/// Returns an error if the data file cannot be read or its format is unsupported.
pub fn read_channel0(dir: &Path, header: &Header) -> Result<Vec<f32>> {
    let spec = header.signals.first().ok_or(SourceError::NoSignal)?;
    let group: Vec<&SignalSpec> = header
        .signals
        .iter()
        .filter(|s| s.file_name == spec.file_name)
        .collect();
    if group.iter().any(|s| s.format != spec.format) {
        return Err(SourceError::UnsupportedFormat(format!(
            "formats mixtes dans {}",
            spec.file_name
        ))
        .into());
    }

    let path = dir.join(&spec.file_name);
    let bytes = std::fs::read(&path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let start = (spec.byte_offset as usize).min(bytes.len());
    let adc = decode_samples(spec.format, &bytes[start..])
        .with_context(|| format!("Décodage impossible : {}", path.display()))?;

    if spec.skew != 0 {
        log::debug!("{}: skew {} ignoré", header.record_name, spec.skew);
    }

    let frame_len: usize = group.iter().map(|s| s.samples_per_frame).sum();
    let spf = spec.samples_per_frame;
    let mut n_frames = adc.len() / frame_len;
    // 0 échantillon déclaré = longueur non spécifiée.
    if let Some(declared) = header.n_samples.filter(|&n| n > 0) {
        if declared > n_frames {
            log::warn!(
                "{}: {declared} échantillons déclarés, {n_frames} présents",
                header.record_name
            );
        }
        n_frames = n_frames.min(declared);
    }

    let invalid = invalid_adc(spec.format);
    let samples = adc
        .chunks_exact(frame_len)
        .take(n_frames)
        .map(|frame| {
            let own = &frame[..spf];
            if own.contains(&invalid) {
                return f32::NAN;
            }
            let mean = own.iter().map(|&v| f64::from(v)).sum::<f64>() / spf as f64;
            spec.to_physical(mean.round() as i32)
        })
        .collect();
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_header;

    #[test]
    fn format_212_sign_extension() {
        // s0 = 0x800 (-2048), s1 = 0x7FF (2047)
        let adc = decode_samples(212, &[0x00, 0x78, 0xFF]).unwrap();
        assert_eq!(adc, vec![-2048, 2047]);
    }

    #[test]
    fn format_212_odd_tail() {
        let adc = decode_samples(212, &[0x10, 0x00, 0x20, 0x05, 0x01]).unwrap();
        assert_eq!(adc, vec![16, 32, 0x105]);
    }

    #[test]
    fn formats_16_and_80() {
        assert_eq!(decode_samples(16, &[0xFF, 0xFF, 0x10, 0x00]).unwrap(), vec![-1, 16]);
        assert_eq!(decode_samples(80, &[0, 128, 255]).unwrap(), vec![-128, 0, 127]);
        assert!(decode_samples(8, &[0]).is_err());
    }

    #[test]
    fn channel0_is_deinterleaved_and_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let header = parse_header("r 2 360 3\nr.dat 16 100(10) 16 0\nr.dat 16 200 16 0\n").unwrap();
        let frames: [[i16; 2]; 3] = [[110, 1], [210, 2], [-32768, 3]];
        let bytes: Vec<u8> = frames
            .iter()
            .flat_map(|f| f.iter().flat_map(|v| v.to_le_bytes()))
            .collect();
        std::fs::write(dir.path().join("r.dat"), bytes).unwrap();

        let samples = read_channel0(dir.path(), &header).unwrap();
        assert_eq!(samples.len(), 3);
        assert!((samples[0] - 1.0).abs() < 1e-6);
        assert!((samples[1] - 2.0).abs() < 1e-6);
        assert!(samples[2].is_nan());
    }

    #[test]
    fn declared_length_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let header = parse_header("r 1 360 2\nr.dat 80\n").unwrap();
        std::fs::write(dir.path().join("r.dat"), [128u8, 129, 130, 131]).unwrap();
        let samples = read_channel0(dir.path(), &header).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn declared_zero_length_reads_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let header = parse_header("r 1 360 0\nr.dat 80\n").unwrap();
        assert_eq!(header.n_samples, Some(0));
        std::fs::write(dir.path().join("r.dat"), [128u8, 129, 130, 131]).unwrap();
        let samples = read_channel0(dir.path(), &header).unwrap();
        assert_eq!(samples.len(), 4);
    }

    #[test]
    fn missing_data_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let header = parse_header("r 1 360\nr.dat 16\n").unwrap();
        assert!(read_channel0(dir.path(), &header).is_err());
    }
}
