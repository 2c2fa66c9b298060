use std::path::{Path, PathBuf};

use bc_core::beat::Beat;
use bc_core::config::RenderConfig;
use bc_core::frame::GrayCanvas;
use bc_core::record::Record;
use bc_core::vocab::class_dir_name;

use crate::error::RenderError;
use crate::persist::write_png_atomic;
use crate::rasterizer::{LineRasterizer, PlotStyle};
use crate::resize::Resizer;

/// Chemin de l'image d'un beat : `<corpus>/<classe>/image_<record>_<beat>.png`.
///
/// # Example
/// ```
/// use bc_core::beat::{Beat, BeatWindow};
/// use bc_render::renderer::beat_image_path;
/// use std::path::Path;
/// let beat = Beat {
///     record_id: "100".into(),
///     index: 7,
///     window: BeatWindow { start: 0, end: 10 },
///     label: "/".into(),
/// };
/// assert_eq!(beat_image_path(Path::new("out"), &beat), Path::new("out/_/image_100_7.png"));
/// ```
#[must_use]
pub fn beat_image_path(corpus_root: &Path, beat: &Beat) -> PathBuf {
    corpus_root
        .join(class_dir_name(&beat.label))
        .join(format!("image_{}_{}.png", beat.record_id, beat.index))
}

/// Rendu complet d'un beat : tracé, réduction, écriture PNG.
///
/// Holds per-task scratch state; create one per worker task.
pub struct BeatRenderer {
    rasterizer: LineRasterizer,
    resizer: Resizer,
    out_width: u32,
    out_height: u32,
}

impl BeatRenderer {
    /// Crée un renderer depuis la configuration.
    ///
    /// # Errors
    /// Returns [`RenderError::InvalidDimensions`] for a degenerate canvas or output size.
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        if config.image_width == 0 || config.image_height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: config.image_width,
                height: config.image_height,
            });
        }
        Ok(Self {
            rasterizer: LineRasterizer::new(PlotStyle::from(config))?,
            resizer: Resizer::new(),
            out_width: config.image_width,
            out_height: config.image_height,
        })
    }

    /// Image finale d'un beat, sans l'écrire.
    ///
    /// The window is truncated to the record length.
    ///
    /// # Errors
    /// Returns [`RenderError::EmptyWindow`] if nothing is left to draw.
    pub fn render_image(&mut self, record: &Record, beat: &Beat) -> Result<GrayCanvas, RenderError> {
        let end = beat.window.end.min(record.len());
        let start = beat.window.start.min(end);
        if start == end {
            return Err(RenderError::EmptyWindow {
                record: beat.record_id.clone(),
                beat: beat.index,
            });
        }
        if end < beat.window.end {
            log::debug!(
                "Record {} beat {} : fenêtre tronquée à {end} (demandé {})",
                beat.record_id,
                beat.index,
                beat.window.end
            );
        }
        let canvas = self.rasterizer.plot(&record.samples[start..end]);
        self.resizer.resize(&canvas, self.out_width, self.out_height)
    }

    /// Rend un beat et l'écrit sous `corpus_root`. Renvoie le chemin écrit.
    ///
    /// An existing file at the same path is overwritten.
    ///
    /// # Errors
    /// Any [`RenderError`]; nothing is left at the destination path on failure.
    pub fn render(&mut self, record: &Record, beat: &Beat, corpus_root: &Path) -> Result<PathBuf, RenderError> {
        let image = self.render_image(record, beat)?;
        let path = beat_image_path(corpus_root, beat);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| RenderError::Io {
                path: dir.display().to_string(),
                source,
            })?;
        }
        write_png_atomic(&image, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_core::beat::BeatWindow;

    fn record(n: usize) -> Record {
        Record {
            id: "100".into(),
            samples: (0..n).map(|i| (i as f32 * 0.07).sin()).collect(),
            annotations: Vec::new(),
        }
    }

    fn beat(index: usize, start: usize, end: usize, label: &str) -> Beat {
        Beat {
            record_id: "100".into(),
            index,
            window: BeatWindow { start, end },
            label: label.into(),
        }
    }

    #[test]
    fn writes_224_png_under_label_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = BeatRenderer::new(&RenderConfig::default()).unwrap();
        let path = r.render(&record(500), &beat(3, 40, 300, "V"), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("V").join("image_100_3.png"));

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (224, 224));
        assert!(img.pixels().any(|p| p.0[0] < 200));
    }

    #[test]
    fn window_past_end_is_truncated() {
        let mut r = BeatRenderer::new(&RenderConfig::default()).unwrap();
        assert!(r.render_image(&record(100), &beat(0, 50, 400, "N")).is_ok());
    }

    #[test]
    fn empty_window_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = BeatRenderer::new(&RenderConfig::default()).unwrap();
        let err = r.render(&record(100), &beat(1, 150, 200, "N"), dir.path()).unwrap_err();
        assert!(matches!(err, RenderError::EmptyWindow { beat: 1, .. }));
        let err = r.render(&record(100), &beat(2, 60, 60, "N"), dir.path()).unwrap_err();
        assert!(matches!(err, RenderError::EmptyWindow { .. }));
        assert!(!dir.path().join("N").exists());
    }

    #[test]
    fn same_beat_renders_identically() {
        let mut r = BeatRenderer::new(&RenderConfig::default()).unwrap();
        let rec = record(400);
        let b = beat(0, 10, 250, "A");
        assert_eq!(r.render_image(&rec, &b).unwrap(), r.render_image(&rec, &b).unwrap());
    }
}
