use std::sync::atomic::AtomicBool;

use anyhow::Result;
use bc_core::config::PipelineConfig;
use bc_core::error::CoreError;
use bc_dataset::index::{MANIFEST_FILE, index_corpus, read_manifest, write_manifest};
use bc_dataset::{ExportSummary, SplitPlan, plan_split};
use bc_source::{WfdbSource, discover_records};

use crate::batch::run_batch;
use crate::cli::{ExtractArgs, IndexArgs, SplitArgs};
use crate::report::BatchReport;

/// Sous-commande `extract` : découverte, extraction parallèle, rapport.
///
/// # Errors
/// Returns an error if the input root is missing or the batch cannot start.
pub fn extract(config: &PipelineConfig, args: &ExtractArgs, stop: &AtomicBool) -> Result<BatchReport> {
    let input = &config.extract.input_dir;
    if !input.is_dir() {
        return Err(CoreError::FileNotFound {
            path: input.display().to_string(),
        }
        .into());
    }
    let records = discover_records(input, &config.extract.header_extension)?;
    if records.is_empty() {
        log::warn!("Aucun record dans {}", input.display());
    }

    let source = WfdbSource::new(
        &config.extract.header_extension,
        &config.extract.annotation_extension,
    );
    let report = run_batch(&records, &source, config, stop)?;

    if let Some(path) = &args.report {
        report.write_json(path)?;
        log::info!("Rapport écrit : {}", path.display());
    }
    Ok(report)
}

/// Sous-commande `index` : comptes par classe, manifest optionnel.
///
/// # Errors
/// Returns an error if the corpus root is missing or the manifest cannot be written.
pub fn index(config: &PipelineConfig, args: &IndexArgs) -> Result<()> {
    let corpus = &config.extract.corpus_dir;
    let pool = index_corpus(corpus)?;
    for label in pool.class_dirs() {
        println!("{label:>4} : {}", pool.count(label));
    }
    println!("Total : {}", pool.total());

    if args.write_manifest || args.manifest.is_some() {
        let path = args
            .manifest
            .clone()
            .unwrap_or_else(|| corpus.join(MANIFEST_FILE));
        write_manifest(&pool, &path)?;
        println!("Manifest : {}", path.display());
    }
    Ok(())
}

/// Sous-commande `split` : plan, sauvegarde optionnelle, export JPEG.
///
/// Counts come from the plan; pixels are only loaded when exporting.
///
/// # Errors
/// Returns an error if the corpus cannot be indexed or an export step fails.
pub fn split(config: &PipelineConfig, args: &SplitArgs) -> Result<(SplitPlan, Option<ExportSummary>)> {
    let split = &config.split;
    let pool = match &args.manifest {
        Some(path) => read_manifest(path)?,
        None => index_corpus(&config.extract.corpus_dir)?,
    };
    let vocab = split.vocabulary()?;
    let plan = plan_split(&pool, &vocab, split.quota, split.test_fraction, split.seed);
    if let Some(path) = &args.plan {
        plan.save(path)?;
        log::info!("Plan écrit : {}", path.display());
    }

    let (width, height) = (config.render.image_width, config.render.image_height);
    println!(
        "train : {} image(s), test : {} image(s), {} classe(s), {width}x{height}",
        plan.train.len(),
        plan.test.len(),
        plan.vocabulary.len()
    );

    let summary = if args.no_export {
        None
    } else {
        let summary = plan.materialize(width, height)?.export_dirs(&split.output_dir)?;
        println!(
            "Export {} : {} train, {} test",
            split.output_dir.display(),
            summary.train,
            summary.test
        );
        Some(summary)
    };
    for w in &plan.warnings {
        println!("attention : {w}");
    }
    Ok((plan, summary))
}
