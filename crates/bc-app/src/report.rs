use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::process::RecordOutcome;

/// Bilan d'une extraction complète.
#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    /// One outcome per dispatched record, in natural record order.
    pub records: Vec<RecordOutcome>,
    /// Wall-clock duration of the batch, in seconds.
    pub elapsed_secs: f64,
}

impl BatchReport {
    /// Assemble un rapport.
    #[must_use]
    pub fn new(records: Vec<RecordOutcome>, elapsed: Duration) -> Self {
        Self {
            records,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    /// Beats written across all records.
    #[must_use]
    pub fn total_beats(&self) -> usize {
        self.records.iter().map(|r| r.beats_written).sum()
    }

    /// Records that could not be processed at all.
    pub fn failed_records(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.records.iter().filter(|r| r.is_failure())
    }

    /// Beats that failed to render, across all records.
    #[must_use]
    pub fn failed_beats(&self) -> usize {
        self.records.iter().map(|r| r.beat_failures.len()).sum()
    }

    /// Records never started because the batch was stopped.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.records.iter().filter(|r| r.skipped).count()
    }

    /// Records with fewer than two annotations.
    #[must_use]
    pub fn insufficient_count(&self) -> usize {
        self.records.iter().filter(|r| r.insufficient_annotations).count()
    }

    /// Log le résumé de fin de run.
    pub fn log_summary(&self) {
        log::info!(
            "Extraction terminée en {:.1}s : {} beat(s) écrits, {} record(s)",
            self.elapsed_secs,
            self.total_beats(),
            self.records.len()
        );
        for r in self.failed_records() {
            log::warn!("Record {} en échec : {}", r.record_id, r.load_error.as_deref().unwrap_or("?"));
        }
        let failed_beats = self.failed_beats();
        if failed_beats > 0 {
            log::warn!("{failed_beats} beat(s) non rendus");
        }
        let skipped = self.skipped_count();
        if skipped > 0 {
            log::warn!("{skipped} record(s) non traités (arrêt demandé)");
        }
    }

    /// Résumé lisible, une ligne par élément notable.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} beat(s) écrits depuis {} record(s) en {:.1}s",
            self.total_beats(),
            self.records.len(),
            self.elapsed_secs
        )];
        lines.extend(self.failed_records().map(|r| {
            format!(
                "  échec {} : {}",
                r.record_id,
                r.load_error.as_deref().unwrap_or("?")
            )
        }));
        let failed_beats = self.failed_beats();
        if failed_beats > 0 {
            lines.push(format!("  {failed_beats} beat(s) non rendus"));
        }
        let insufficient = self.insufficient_count();
        if insufficient > 0 {
            lines.push(format!("  {insufficient} record(s) avec moins de 2 annotations"));
        }
        let skipped = self.skipped_count();
        if skipped > 0 {
            lines.push(format!("  {skipped} record(s) non traités"));
        }
        lines.join("\n")
    }

    /// Écrit le rapport en JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path).with_context(|| format!("Création de {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).context("Sérialisation du rapport")?;
        writer.flush()?;
        Ok(())
    }
}
