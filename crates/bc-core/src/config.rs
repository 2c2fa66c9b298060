use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::beat::WindowOffsets;
use crate::error::CoreError;
use crate::vocab::{ClassVocabulary, DEFAULT_CLASSES};

/// Configuration complète du pipeline.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use bc_core::config::PipelineConfig;
/// let config = PipelineConfig::default();
/// assert_eq!(config.extract.start_offset, 100);
/// assert_eq!(config.render.image_width, 224);
/// assert!((config.split.test_fraction - 0.2).abs() < f32::EPSILON);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Record discovery, windowing and worker pool.
    pub extract: ExtractConfig,
    /// Plot rasterization and output bitmap.
    pub render: RenderConfig,
    /// Corpus balancing and train/test partition.
    pub split: SplitConfig,
}

/// Extraction des beats.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExtractConfig {
    /// Dossier contenant les paires header/données.
    pub input_dir: PathBuf,
    /// Racine du corpus d'images (`<corpus>/<label>/image_<record>_<beat>.png`).
    pub corpus_dir: PathBuf,
    /// Taille du pool de workers (un record par worker).
    pub workers: usize,
    /// Échantillons retranchés à l'annotation courante.
    pub start_offset: u32,
    /// Échantillons retranchés à l'annotation suivante.
    pub end_offset: u32,
    /// Extension des headers, sert à découvrir les records.
    pub header_extension: String,
    /// Extension du fichier d'annotations.
    pub annotation_extension: String,
}

/// Rendu d'un beat en bitmap.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RenderConfig {
    // === Canvas de tracé ===
    /// Largeur du canvas avant resize (6.4in @ 125dpi).
    pub canvas_width: u32,
    /// Hauteur du canvas avant resize (4.8in @ 125dpi).
    pub canvas_height: u32,
    /// Bords de la zone de tracé, en fraction du canvas (gauche, droite, bas, haut).
    pub plot_left: f32,
    /// See `plot_left`.
    pub plot_right: f32,
    /// See `plot_left`.
    pub plot_bottom: f32,
    /// See `plot_left`.
    pub plot_top: f32,
    /// Marge ajoutée autour des données, en fraction de leur étendue.
    pub data_margin: f32,
    /// Épaisseur du trait en pixels canvas.
    pub line_width: f32,
    /// Luminance du trait [0, 255].
    pub line_luminance: u8,
    /// Luminance du fond [0, 255].
    pub background: u8,

    // === Sortie ===
    /// Largeur finale de l'image.
    pub image_width: u32,
    /// Hauteur finale de l'image.
    pub image_height: u32,
}

/// Sélection équilibrée et partition train/test.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SplitConfig {
    /// Classes retenues, dans l'ordre de priorité (fixe aussi l'index one-hot).
    pub classes: Vec<String>,
    /// Nombre maximal d'images par classe.
    pub quota: usize,
    /// Fraction du pool sélectionné réservée au test, dans (0, 1).
    pub test_fraction: f32,
    /// Graine du mélange global.
    pub seed: u64,
    /// Dossier de sortie des partitions `train/` et `test/`.
    pub output_dir: PathBuf,
}

/// Nombre de workers par défaut : parallélisme disponible de l'hôte.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/mit-bih_waveform"),
            corpus_dir: PathBuf::from("beat_write_dir"),
            workers: default_workers(),
            start_offset: 100,
            end_offset: 100,
            header_extension: "hea".into(),
            annotation_extension: "atr".into(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            plot_left: 0.125,
            plot_right: 0.9,
            plot_bottom: 0.11,
            plot_top: 0.88,
            data_margin: 0.05,
            line_width: 2.6,
            line_luminance: 100,
            background: 255,
            image_width: 224,
            image_height: 224,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            classes: DEFAULT_CLASSES.iter().map(|s| (*s).to_string()).collect(),
            quota: 5000,
            test_fraction: 0.2,
            seed: 42,
            output_dir: PathBuf::from("dataset"),
        }
    }
}

impl ExtractConfig {
    /// Offsets de fenêtrage.
    #[must_use]
    pub fn offsets(&self) -> WindowOffsets {
        WindowOffsets {
            start: self.start_offset,
            end: self.end_offset,
        }
    }
}

impl RenderConfig {
    /// Clamp cosmetic fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.plot_left = self.plot_left.clamp(0.0, 0.49);
        self.plot_bottom = self.plot_bottom.clamp(0.0, 0.49);
        self.plot_right = self.plot_right.clamp(0.51, 1.0);
        self.plot_top = self.plot_top.clamp(0.51, 1.0);
        self.data_margin = self.data_margin.clamp(0.0, 0.5);
        self.line_width = self.line_width.clamp(0.5, 32.0);
    }
}

impl SplitConfig {
    /// Vocabulaire validé construit depuis `classes`.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] on an empty or duplicated class list.
    pub fn vocabulary(&self) -> Result<ClassVocabulary, CoreError> {
        ClassVocabulary::new(self.classes.iter().cloned())
    }
}

impl PipelineConfig {
    /// Vérifie les erreurs fatales avant tout travail.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] describing the first invalid field.
    ///
    /// # Example
    /// ```
    /// use bc_core::config::PipelineConfig;
    /// let mut config = PipelineConfig::default();
    /// assert!(config.validate().is_ok());
    /// config.split.test_fraction = 1.0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.extract.workers == 0 {
            return Err(CoreError::Config("workers doit être ≥ 1".into()));
        }
        if self.render.image_width == 0 || self.render.image_height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: self.render.image_width,
                height: self.render.image_height,
            });
        }
        if self.render.canvas_width < 2 || self.render.canvas_height < 2 {
            return Err(CoreError::InvalidDimensions {
                width: self.render.canvas_width,
                height: self.render.canvas_height,
            });
        }
        let f = self.split.test_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(CoreError::Config(format!(
                "test_fraction doit être dans (0, 1), reçu {f}"
            )));
        }
        if self.split.quota == 0 {
            return Err(CoreError::Config("quota doit être ≥ 1".into()));
        }
        self.split.vocabulary()?;
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    extract: Option<ExtractSection>,
    render: Option<RenderSection>,
    split: Option<SplitSection>,
}

/// Extract section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct ExtractSection {
    input_dir: Option<PathBuf>,
    corpus_dir: Option<PathBuf>,
    workers: Option<usize>,
    start_offset: Option<u32>,
    end_offset: Option<u32>,
    header_extension: Option<String>,
    annotation_extension: Option<String>,
}

/// Render section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct RenderSection {
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
    plot_left: Option<f32>,
    plot_right: Option<f32>,
    plot_bottom: Option<f32>,
    plot_top: Option<f32>,
    data_margin: Option<f32>,
    line_width: Option<f32>,
    line_luminance: Option<u8>,
    background: Option<u8>,
    image_width: Option<u32>,
    image_height: Option<u32>,
}

/// Split section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct SplitSection {
    classes: Option<Vec<String>>,
    quota: Option<usize>,
    test_fraction: Option<f32>,
    seed: Option<u64>,
    output_dir: Option<PathBuf>,
}

macro_rules! merge {
    ($dst:expr, $src:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(v) = $src.$field {
                $dst.$field = v;
            }
        )+
    };
}

/// Parse un contenu TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the content is not valid TOML for this schema.
///
/// # Example
/// ```
/// use bc_core::config::parse_config;
/// let config = parse_config("[split]\nquota = 10\n").unwrap();
/// assert_eq!(config.split.quota, 10);
/// assert_eq!(config.extract.end_offset, 100);
/// ```
pub fn parse_config(content: &str) -> Result<PipelineConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = PipelineConfig::default();

    if let Some(e) = file.extract {
        merge!(
            config.extract,
            e,
            input_dir,
            corpus_dir,
            workers,
            start_offset,
            end_offset,
            header_extension,
            annotation_extension,
        );
    }
    if let Some(r) = file.render {
        merge!(
            config.render,
            r,
            canvas_width,
            canvas_height,
            plot_left,
            plot_right,
            plot_bottom,
            plot_top,
            data_margin,
            line_width,
            line_luminance,
            background,
            image_width,
            image_height,
        );
    }
    if let Some(s) = file.split {
        merge!(config.split, s, classes, quota, test_fraction, seed, output_dir);
    }

    config.render.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use bc_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_default_toml_matches_defaults() {
        let config = parse_config(include_str!("../../../config/default.toml")).unwrap();
        let defaults = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extract.workers, defaults.extract.workers);
        assert_eq!(config.extract.corpus_dir, defaults.extract.corpus_dir);
        assert_eq!(config.render.canvas_width, defaults.render.canvas_width);
        assert_eq!(config.render.image_height, defaults.render.image_height);
        assert_eq!(config.split.classes, defaults.split.classes);
        assert_eq!(config.split.seed, defaults.split.seed);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = parse_config(
            r#"
            [extract]
            workers = 4
            start_offset = 90

            [split]
            classes = ["N", "V"]
            "#,
        )
        .unwrap();
        assert_eq!(config.extract.workers, 4);
        assert_eq!(config.extract.start_offset, 90);
        assert_eq!(config.extract.end_offset, 100);
        assert_eq!(config.split.classes, ["N", "V"]);
        assert_eq!(config.split.quota, 5000);
        assert_eq!(config.render.canvas_width, 800);
    }

    #[test]
    fn empty_file_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.extract.annotation_extension, "atr");
    }

    #[test]
    fn unknown_types_fail() {
        assert!(parse_config("[split]\nquota = \"many\"\n").is_err());
    }

    #[test]
    fn render_fields_are_clamped() {
        let config = parse_config("[render]\nline_width = 500.0\nplot_left = 0.9\n").unwrap();
        assert!((config.render.line_width - 32.0).abs() < f32::EPSILON);
        assert!(config.render.plot_left < 0.5);
    }

    #[test]
    fn validate_rejects_fatal_values() {
        let mut config = PipelineConfig::default();
        config.split.test_fraction = 0.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.extract.workers = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.split.classes.clear();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.render.image_height = 0;
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidDimensions { .. })
        ));
    }
}
