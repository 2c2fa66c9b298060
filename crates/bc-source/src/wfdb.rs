use anyhow::{Context, Result};
use bc_core::record::{Record, RecordRef};
use bc_core::traits::WaveformSource;

use crate::annotation::read_annotations;
use crate::header::read_header;
use crate::signal::read_channel0;

/// Source WFDB : `<id>.hea` + fichier(s) de données + annotations `<id>.<ext>`.
///
/// # Example
/// ```no_run
/// use bc_core::record::RecordRef;
/// use bc_core::traits::WaveformSource;
/// use bc_source::WfdbSource;
/// use std::path::Path;
///
/// let source = WfdbSource::new("hea", "atr");
/// let record = source.load(&RecordRef::new(Path::new("data/mitdb"), "100")).unwrap();
/// println!("{} échantillons, {} annotations", record.len(), record.annotations.len());
/// ```
#[derive(Clone, Debug)]
pub struct WfdbSource {
    header_extension: String,
    annotation_extension: String,
}

impl WfdbSource {
    /// Crée une source avec les extensions de header et d'annotations données.
    #[must_use]
    pub fn new(header_extension: &str, annotation_extension: &str) -> Self {
        Self {
            header_extension: header_extension.to_string(),
            annotation_extension: annotation_extension.to_string(),
        }
    }
}

impl Default for WfdbSource {
    fn default() -> Self {
        Self::new("hea", "atr")
    }
}

impl WaveformSource for WfdbSource {
    fn load(&self, record: &RecordRef) -> Result<Record> {
        let header_path = record.file_with_extension(&self.header_extension);
        let header = read_header(&header_path)?;
        let samples = read_channel0(&record.dir, &header)
            .with_context(|| format!("Record {} : signal illisible", record.id))?;

        let ann_path = record.file_with_extension(&self.annotation_extension);
        let mut annotations = read_annotations(&ann_path)?;
        // Stable : l'ordre relatif des annotations simultanées est conservé.
        if !annotations.is_sorted_by_key(|a| a.sample) {
            log::warn!("Record {} : annotations non triées, réordonnées", record.id);
            annotations.sort_by_key(|a| a.sample);
        }

        log::debug!(
            "Record {} : {} échantillons @ {} Hz, {} annotations",
            record.id,
            samples.len(),
            header.frequency,
            annotations.len()
        );
        Ok(Record {
            id: record.id.clone(),
            samples,
            annotations,
        })
    }
}
