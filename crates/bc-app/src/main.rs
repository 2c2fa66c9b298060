use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use bc_app::cli::{self, Command};
use bc_app::commands;
use bc_core::config::{PipelineConfig, load_config};
use clap::Parser;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config, appliquer les overrides CLI, valider
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);
    config.render.clamp_all();
    config.validate()?;

    match &cli.command {
        Command::Extract(args) => {
            // Ctrl+C : les records en cours terminent, les suivants sont sautés.
            let stop = Arc::new(AtomicBool::new(false));
            let stop_flag = Arc::clone(&stop);
            ctrlc::set_handler(move || {
                log::warn!("Arrêt demandé, fin des records en cours...");
                stop_flag.store(true, Ordering::Relaxed);
            })
            .context("Installation du handler Ctrl+C")?;

            let report = commands::extract(&config, args, &stop)?;
            println!("{}", report.summary());
            println!("Corpus : {}", config.extract.corpus_dir.display());
            Ok(())
        }
        Command::Index(args) => commands::index(&config, args),
        Command::Split(args) => commands::split(&config, args).map(|_| ()),
    }
}

/// Charge --config s'il existe, sinon les défauts.
fn resolve_config(cli: &cli::Cli) -> Result<PipelineConfig> {
    if cli.config.exists() {
        load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(PipelineConfig::default())
    }
}
