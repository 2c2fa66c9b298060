use std::path::PathBuf;

use bc_core::config::PipelineConfig;
use clap::{Args, Parser, Subcommand};

/// beatcorpus : records ECG annotés vers corpus d'images de beats équilibré.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Étape à exécuter.
    #[command(subcommand)]
    pub command: Command,
}

/// Sous-commandes.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extraire les beats de tous les records et écrire le corpus d'images.
    Extract(ExtractArgs),
    /// Indexer le corpus (comptes par classe, manifest optionnel).
    Index(IndexArgs),
    /// Sélection équilibrée, découpe train/test et export.
    Split(SplitArgs),
}

/// Options de `extract`.
#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Dossier des records (headers + données + annotations).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Racine du corpus d'images.
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Nombre de workers (défaut : nombre de CPU).
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Échantillons retranchés à l'annotation courante (début de fenêtre).
    #[arg(long)]
    pub start_offset: Option<u32>,

    /// Échantillons retranchés à l'annotation suivante (fin de fenêtre).
    #[arg(long)]
    pub end_offset: Option<u32>,

    /// Extension des fichiers d'annotations (défaut : atr).
    #[arg(long)]
    pub annotation_ext: Option<String>,

    /// Écrire le rapport d'extraction en JSON.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Options de `index`.
#[derive(Args, Debug, Default)]
pub struct IndexArgs {
    /// Racine du corpus d'images.
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Écrire le manifest JSON (défaut : <corpus>/manifest.json).
    #[arg(long, default_value_t = false)]
    pub write_manifest: bool,

    /// Chemin du manifest.
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

/// Options de `split`.
#[derive(Args, Debug, Default)]
pub struct SplitArgs {
    /// Racine du corpus d'images.
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// Réutiliser un manifest au lieu de rescanner le corpus.
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Images maximum par classe.
    #[arg(short, long)]
    pub quota: Option<usize>,

    /// Fraction réservée au test, dans (0, 1).
    #[arg(long)]
    pub test_fraction: Option<f32>,

    /// Graine du mélange.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Vocabulaire ordonné, séparé par des virgules (ex: L,N,V,A,R).
    #[arg(long, value_delimiter = ',')]
    pub classes: Option<Vec<String>>,

    /// Dossier de sortie (train/ et test/).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Écrire le plan de découpe en JSON.
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Ne pas exporter les dossiers train/test.
    #[arg(long, default_value_t = false)]
    pub no_export: bool,
}

macro_rules! apply {
    ($dst:expr, $($field:ident <- $src:expr),+ $(,)?) => {
        $(
            if let Some(v) = $src.clone() {
                $dst.$field = v;
            }
        )+
    };
}

impl Cli {
    /// Applique les options de la sous-commande par-dessus la configuration.
    pub fn apply_overrides(&self, config: &mut PipelineConfig) {
        match &self.command {
            Command::Extract(a) => {
                apply!(config.extract,
                    input_dir <- a.input,
                    corpus_dir <- a.corpus,
                    workers <- a.workers,
                    start_offset <- a.start_offset,
                    end_offset <- a.end_offset,
                    annotation_extension <- a.annotation_ext,
                );
            }
            Command::Index(a) => {
                apply!(config.extract, corpus_dir <- a.corpus);
            }
            Command::Split(a) => {
                apply!(config.extract, corpus_dir <- a.corpus);
                apply!(config.split,
                    quota <- a.quota,
                    test_fraction <- a.test_fraction,
                    seed <- a.seed,
                    classes <- a.classes,
                    output_dir <- a.output,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_flags_override_config() {
        let cli = Cli::parse_from([
            "beatcorpus", "extract", "--input", "mitdb", "-w", "3", "--start-offset", "90",
        ]);
        let mut config = PipelineConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.extract.input_dir, PathBuf::from("mitdb"));
        assert_eq!(config.extract.workers, 3);
        assert_eq!(config.extract.start_offset, 90);
        assert_eq!(config.extract.end_offset, 100);
    }

    #[test]
    fn split_classes_are_comma_separated() {
        let cli = Cli::parse_from([
            "beatcorpus", "--log-level", "info", "split", "--classes", "N,V,/", "-q", "10",
        ]);
        let mut config = PipelineConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.split.classes, ["N", "V", "/"]);
        assert_eq!(config.split.quota, 10);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn global_config_after_subcommand() {
        let cli = Cli::parse_from(["beatcorpus", "index", "--config", "alt.toml", "--write-manifest"]);
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        assert!(matches!(cli.command, Command::Index(IndexArgs { write_manifest: true, .. })));
    }
}
