use std::path::Path;

use anyhow::{Context, Result};

use crate::error::SourceError;

/// Gain ADC par défaut quand le header l'omet ou le met à 0.
pub const DEFAULT_GAIN: f64 = 200.0;
/// Fréquence d'échantillonnage par défaut.
pub const DEFAULT_FREQUENCY: f64 = 250.0;

/// Header d'un record WFDB mono-segment (`<record>.hea`).
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    /// Record name as written on the record line.
    pub record_name: String,
    /// Sampling frequency in Hz.
    pub frequency: f64,
    /// Samples per signal, when declared.
    pub n_samples: Option<usize>,
    /// One entry per signal, in declaration order.
    pub signals: Vec<SignalSpec>,
}

/// Spécification d'un signal (une ligne de signal du header).
#[derive(Clone, Debug, PartialEq)]
pub struct SignalSpec {
    /// Data file name, relative to the header's directory.
    pub file_name: String,
    /// Storage format code (212, 16, 80...).
    pub format: u16,
    /// Samples of this signal per frame.
    pub samples_per_frame: usize,
    /// Skew in frames. Read but not applied.
    pub skew: usize,
    /// Byte offset of the first sample in the data file.
    pub byte_offset: u64,
    /// ADC units per physical unit.
    pub gain: f64,
    /// ADC value corresponding to 0 physical units.
    pub baseline: i32,
    /// Physical units (e.g. "mV").
    pub units: String,
    /// ADC resolution in bits.
    pub adc_resolution: u32,
    /// ADC value at the middle of the input range.
    pub adc_zero: i32,
    /// Free text description (lead name).
    pub description: String,
}

impl SignalSpec {
    /// Converts a raw ADC value to physical units.
    #[inline]
    #[must_use]
    pub fn to_physical(&self, adc: i32) -> f32 {
        ((f64::from(adc) - f64::from(self.baseline)) / self.gain) as f32
    }
}

/// Lit et parse un header depuis le disque.
///
/// # Errors
/// Returns an error if the file cannot be read or is malformed.
pub fn read_header(path: &Path) -> Result<Header> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_header(&content).with_context(|| format!("Header invalide : {}", path.display()))
}

/// Parse le texte d'un header.
///
/// # Errors
/// Returns [`SourceError::Header`] on malformed lines, [`SourceError::UnsupportedFormat`]
/// for multi-segment records and [`SourceError::NoSignal`] if no signal is declared.
///
/// # Example
/// ```
/// use bc_source::header::parse_header;
/// let h = parse_header("100 2 360 650000\n100.dat 212 200 11 1024 995 -22131 0 MLII\n100.dat 212 200 11 1024 1011 20052 0 V5\n").unwrap();
/// assert_eq!(h.signals.len(), 2);
/// assert_eq!(h.signals[0].format, 212);
/// assert_eq!(h.signals[0].description, "MLII");
/// assert_eq!(h.n_samples, Some(650_000));
/// ```
pub fn parse_header(content: &str) -> Result<Header, SourceError> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let (line_no, record_line) = lines.next().ok_or_else(|| SourceError::Header {
        line: 1,
        reason: "header vide".into(),
    })?;

    let tokens: Vec<&str> = record_line.split_whitespace().collect();
    let record_name = tokens[0].to_string();
    if record_name.contains('/') {
        return Err(SourceError::UnsupportedFormat(format!(
            "record multi-segment {record_name}"
        )));
    }
    let n_signals: usize = parse_field(tokens.get(1), line_no, "nombre de signaux")?;
    if n_signals == 0 {
        return Err(SourceError::NoSignal);
    }
    let frequency = match tokens.get(2).copied() {
        Some(tok) => {
            let head = tok.split(['/', '(']).next().unwrap_or(tok);
            head.parse::<f64>().map_err(|_| SourceError::Header {
                line: line_no,
                reason: format!("fréquence invalide : {tok}"),
            })?
        }
        None => DEFAULT_FREQUENCY,
    };
    let n_samples = tokens
        .get(3)
        .map(|tok| parse_field::<usize>(Some(tok), line_no, "nombre d'échantillons"))
        .transpose()?;

    let mut signals = Vec::with_capacity(n_signals);
    for _ in 0..n_signals {
        let found = signals.len();
        let (line_no, line) = lines.next().ok_or_else(|| SourceError::Header {
            line: line_no,
            reason: format!("{n_signals} signaux déclarés, {found} trouvés"),
        })?;
        signals.push(parse_signal_line(line, line_no)?);
    }

    Ok(Header {
        record_name,
        frequency,
        n_samples,
        signals,
    })
}

fn parse_field<T: std::str::FromStr>(
    tok: Option<&&str>,
    line: usize,
    what: &str,
) -> Result<T, SourceError> {
    let tok = tok.ok_or_else(|| SourceError::Header {
        line,
        reason: format!("{what} manquant"),
    })?;
    tok.parse().map_err(|_| SourceError::Header {
        line,
        reason: format!("{what} invalide : {tok}"),
    })
}

/// `file format[xN][:skew][+offset] [gain[(baseline)][/units] [res [zero [init [cksum [bsize [desc...]]]]]]]`
fn parse_signal_line(line: &str, line_no: usize) -> Result<SignalSpec, SourceError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let file_name = tokens[0].to_string();
    let fmt_tok = tokens.get(1).ok_or_else(|| SourceError::Header {
        line: line_no,
        reason: "format manquant".into(),
    })?;
    let (format, samples_per_frame, skew, byte_offset) = parse_format_spec(fmt_tok, line_no)?;

    let adc_zero: i32 = tokens
        .get(4)
        .map(|t| parse_field(Some(t), line_no, "adc_zero"))
        .transpose()?
        .unwrap_or(0);

    let (gain, baseline, units) = match tokens.get(2) {
        Some(tok) => parse_gain_spec(tok, line_no)?,
        None => (0.0, None, String::new()),
    };
    let gain = if gain == 0.0 { DEFAULT_GAIN } else { gain };

    let adc_resolution = tokens
        .get(3)
        .map(|t| parse_field(Some(t), line_no, "adc_resolution"))
        .transpose()?
        .unwrap_or(match format {
            212 => 12,
            80 => 8,
            _ => 16,
        });

    let description = tokens.get(8..).map(|d| d.join(" ")).unwrap_or_default();

    Ok(SignalSpec {
        file_name,
        format,
        samples_per_frame,
        skew,
        byte_offset,
        gain,
        baseline: baseline.unwrap_or(adc_zero),
        units: if units.is_empty() { "mV".into() } else { units },
        adc_resolution,
        adc_zero,
        description,
    })
}

fn parse_format_spec(tok: &str, line: usize) -> Result<(u16, usize, usize, u64), SourceError> {
    let bad = || SourceError::Header {
        line,
        reason: format!("format invalide : {tok}"),
    };
    let digits = |s: &str| -> usize { s.chars().take_while(char::is_ascii_digit).count() };

    let n = digits(tok);
    let format: u16 = tok[..n].parse().map_err(|_| bad())?;
    let (mut spf, mut skew, mut offset) = (1usize, 0usize, 0u64);

    let mut rest = &tok[n..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[marker.len_utf8()..];
        let n = digits(body);
        let value = &body[..n];
        match marker {
            'x' => spf = value.parse().map_err(|_| bad())?,
            ':' => skew = value.parse().map_err(|_| bad())?,
            '+' => offset = value.parse().map_err(|_| bad())?,
            _ => return Err(bad()),
        }
        rest = &body[n..];
    }
    Ok((format, spf.max(1), skew, offset))
}

fn parse_gain_spec(tok: &str, line: usize) -> Result<(f64, Option<i32>, String), SourceError> {
    let bad = || SourceError::Header {
        line,
        reason: format!("gain invalide : {tok}"),
    };
    let (value_part, units) = match tok.split_once('/') {
        Some((v, u)) => (v, u.to_string()),
        None => (tok, String::new()),
    };
    let (gain_str, baseline) = match value_part.split_once('(') {
        Some((g, b)) => {
            let b = b.trim_end_matches(')');
            (g, Some(b.parse::<i32>().map_err(|_| bad())?))
        }
        None => (value_part, None),
    };
    let gain = gain_str.parse::<f64>().map_err(|_| bad())?;
    Ok((gain, baseline, units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mitdb_style_header() {
        let h = parse_header(
            "# comment line\n100 2 360 650000\n\
             100.dat 212 200 11 1024 995 -22131 0 MLII\n\
             100.dat 212 200 11 1024 1011 20052 0 V5\n\
             # Age: 69 Sex: M\n",
        )
        .unwrap();
        assert_eq!(h.record_name, "100");
        assert!((h.frequency - 360.0).abs() < f64::EPSILON);
        let s = &h.signals[0];
        assert_eq!(s.file_name, "100.dat");
        assert_eq!(s.baseline, 1024);
        assert_eq!(s.adc_resolution, 11);
        assert!((s.gain - 200.0).abs() < f64::EPSILON);
        assert!((s.to_physical(1224) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn extended_specs() {
        let h = parse_header("rec 1 500/1(0) 1000\nrec.dat 16x2:1+512 400(-10)/uV 16 0 0 0 0 lead I\n")
            .unwrap();
        let s = &h.signals[0];
        assert_eq!(s.format, 16);
        assert_eq!(s.samples_per_frame, 2);
        assert_eq!(s.skew, 1);
        assert_eq!(s.byte_offset, 512);
        assert_eq!(s.baseline, -10);
        assert_eq!(s.units, "uV");
        assert_eq!(s.description, "lead I");
        assert!((h.frequency - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn minimal_signal_line_uses_defaults() {
        let h = parse_header("x 1\nx.dat 80\n").unwrap();
        let s = &h.signals[0];
        assert!((s.gain - DEFAULT_GAIN).abs() < f64::EPSILON);
        assert_eq!(s.baseline, 0);
        assert_eq!(s.adc_resolution, 8);
        assert_eq!(h.n_samples, None);
        assert!((h.frequency - DEFAULT_FREQUENCY).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(parse_header(""), Err(SourceError::Header { .. })));
        assert!(matches!(
            parse_header("multi/3 2 360\n"),
            Err(SourceError::UnsupportedFormat(_))
        ));
        assert!(matches!(parse_header("r 0 360\n"), Err(SourceError::NoSignal)));
        assert!(matches!(
            parse_header("r 2 360\nr.dat 212\n"),
            Err(SourceError::Header { .. })
        ));
        assert!(parse_header("r 1\nr.dat abc\n").is_err());
    }
}
