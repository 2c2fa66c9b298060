use std::path::{Path, PathBuf};

use bc_core::beat::{WindowOffsets, window_beats};
use bc_core::error::CoreError;
use bc_core::record::RecordRef;
use bc_core::traits::WaveformSource;
use bc_render::BeatRenderer;
use serde::Serialize;

/// Échec du rendu d'un beat isolé.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BeatFailure {
    /// Beat index within the record.
    pub index: usize,
    /// Rendered error message.
    pub error: String,
}

/// Bilan du traitement d'un record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    /// Record identifier.
    pub record_id: String,
    /// Beats produced by the windower.
    pub beats_total: usize,
    /// Beats successfully written.
    pub beats_written: usize,
    /// Beats that failed to render, in order.
    pub beat_failures: Vec<BeatFailure>,
    /// Set when the record could not be loaded (or its task panicked).
    pub load_error: Option<String>,
    /// Set when the record has fewer than two annotations.
    pub insufficient_annotations: bool,
    /// Set when the batch was stopped before this record started.
    pub skipped: bool,
    /// Files written, in beat order.
    #[serde(skip)]
    pub written: Vec<PathBuf>,
}

impl RecordOutcome {
    /// Outcome of a record never started.
    #[must_use]
    pub fn skipped(record_id: &str) -> Self {
        Self {
            record_id: record_id.to_string(),
            skipped: true,
            ..Self::default()
        }
    }

    /// Outcome of a record whose loading failed.
    #[must_use]
    pub fn load_failed(record_id: &str, error: String) -> Self {
        Self {
            record_id: record_id.to_string(),
            load_error: Some(error),
            ..Self::default()
        }
    }

    /// `true` if the record failed as a whole.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.load_error.is_some()
    }
}

/// Traite un record : chargement, fenêtrage, rendu de chaque beat.
///
/// A load failure ends the record; a render failure only skips its beat and
/// the following beats are still rendered.
pub fn process_record(
    source: &dyn WaveformSource,
    record: &RecordRef,
    offsets: WindowOffsets,
    renderer: &mut BeatRenderer,
    corpus_root: &Path,
) -> RecordOutcome {
    let loaded = match source.load(record) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("Record {} ignoré : {e:#}", record.id);
            return RecordOutcome::load_failed(&record.id, format!("{e:#}"));
        }
    };

    let mut outcome = RecordOutcome {
        record_id: record.id.clone(),
        ..RecordOutcome::default()
    };

    let beats = match window_beats(&loaded, offsets) {
        Ok(beats) => beats,
        Err(e @ CoreError::InsufficientAnnotations { .. }) => {
            log::info!("{e}");
            outcome.insufficient_annotations = true;
            return outcome;
        }
        Err(e) => {
            outcome.load_error = Some(e.to_string());
            return outcome;
        }
    };

    outcome.beats_total = beats.len();
    for beat in &beats {
        match renderer.render(&loaded, beat, corpus_root) {
            Ok(path) => {
                outcome.beats_written += 1;
                outcome.written.push(path);
            }
            Err(e) => {
                log::warn!("Record {} beat {} : {e}", record.id, beat.index);
                outcome.beat_failures.push(BeatFailure {
                    index: beat.index,
                    error: e.to_string(),
                });
            }
        }
    }

    log::debug!(
        "Record {} : {}/{} beats écrits",
        record.id,
        outcome.beats_written,
        outcome.beats_total
    );
    outcome
}
