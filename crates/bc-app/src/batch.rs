use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use bc_core::config::PipelineConfig;
use bc_core::natsort::natural_cmp;
use bc_core::record::RecordRef;
use bc_core::traits::WaveformSource;
use bc_render::BeatRenderer;

use crate::process::{RecordOutcome, process_record};
use crate::report::BatchReport;

/// Extrait les beats de tous les records sur un pool de `workers` threads.
///
/// One task per record, dispatched in the given order (FIFO). Each task sends
/// its [`RecordOutcome`] back over a channel; the call returns once every task
/// has finished. Tasks that start after `stop` is raised report themselves as
/// skipped; running ones complete. A panicking task is reported as a failed
/// record and does not affect the others.
///
/// # Errors
/// Returns an error only if the worker pool or the corpus root cannot be set up.
pub fn run_batch(
    records: &[RecordRef],
    source: &dyn WaveformSource,
    config: &PipelineConfig,
    stop: &AtomicBool,
) -> Result<BatchReport> {
    let start = Instant::now();
    let corpus_root = config.extract.corpus_dir.as_path();
    std::fs::create_dir_all(corpus_root)
        .with_context(|| format!("Création du corpus {}", corpus_root.display()))?;

    let workers = config.extract.workers.max(1);
    log::info!("{} record(s), {workers} worker(s)", records.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("bc-worker-{i}"))
        .build()
        .context("Création du pool de workers")?;

    let (tx, rx) = flume::unbounded::<RecordOutcome>();
    pool.scope_fifo(|scope| {
        for record in records {
            let tx = tx.clone();
            scope.spawn_fifo(move |_| {
                let outcome = if stop.load(Ordering::Relaxed) {
                    RecordOutcome::skipped(&record.id)
                } else {
                    run_isolated(source, record, config, corpus_root)
                };
                let _ = tx.send(outcome);
            });
        }
    });
    drop(tx);

    let mut outcomes: Vec<RecordOutcome> = rx.into_iter().collect();
    outcomes.sort_by(|a, b| natural_cmp(&a.record_id, &b.record_id));

    let report = BatchReport::new(outcomes, start.elapsed());
    report.log_summary();
    Ok(report)
}

/// Traite un record en capturant un éventuel panic.
fn run_isolated(
    source: &dyn WaveformSource,
    record: &RecordRef,
    config: &PipelineConfig,
    corpus_root: &Path,
) -> RecordOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut renderer = match BeatRenderer::new(&config.render) {
            Ok(r) => r,
            Err(e) => return RecordOutcome::load_failed(&record.id, e.to_string()),
        };
        process_record(
            source,
            record,
            config.extract.offsets(),
            &mut renderer,
            corpus_root,
        )
    }));
    result.unwrap_or_else(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        log::error!("Record {} : panic pendant le traitement : {msg}", record.id);
        RecordOutcome::load_failed(&record.id, format!("panic : {msg}"))
    })
}
