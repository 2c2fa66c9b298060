use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bc_core::frame::GrayCanvas;
use bc_core::vocab::{ClassVocabulary, class_dir_name};
use image::{ExtendedColorType, ImageFormat};
use rayon::prelude::*;

use crate::error::DatasetError;
use crate::split::SplitResult;

/// Nombre de fichiers écrits par partition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Files under `train/`.
    pub train: usize,
    /// Files under `test/`.
    pub test: usize,
}

impl SplitResult {
    /// Exporte `train/` et `test/` sous `out_dir`, en JPEG.
    ///
    /// Layout: `<out>/<partition>/<label>/<label><index>.jpeg`, with `index`
    /// counting from 0 per label within each partition, in split order. Existing
    /// `train/` and `test/` directories are replaced; other content of `out_dir`
    /// is left alone.
    ///
    /// # Errors
    /// Returns an error if a directory or file cannot be written.
    pub fn export_dirs(&self, out_dir: &Path) -> Result<ExportSummary> {
        let train = export_partition(&self.train, &self.vocabulary, &out_dir.join("train"))?;
        let test = export_partition(&self.test, &self.vocabulary, &out_dir.join("test"))?;
        log::info!("Export {} : {train} train, {test} test", out_dir.display());
        Ok(ExportSummary { train, test })
    }
}

fn export_partition(images: &[(GrayCanvas, usize)], vocab: &ClassVocabulary, dir: &Path) -> Result<usize> {
    // Une partition reflète un seul split : l'export précédent est supprimé.
    if dir.exists() {
        log::debug!("Nettoyage de {}", dir.display());
        fs::remove_dir_all(dir).with_context(|| format!("Suppression de {}", dir.display()))?;
    }
    let mut counters: HashMap<usize, usize> = HashMap::new();
    let mut jobs: Vec<(PathBuf, &GrayCanvas)> = Vec::with_capacity(images.len());
    for (canvas, class_index) in images {
        let label = vocab
            .labels()
            .get(*class_index)
            .ok_or_else(|| DatasetError::UnknownLabel(format!("index {class_index}")))?;
        let name = class_dir_name(label);
        let counter = counters.entry(*class_index).or_insert(0);
        let class_dir = dir.join(&name);
        if *counter == 0 {
            fs::create_dir_all(&class_dir).with_context(|| format!("Création de {}", class_dir.display()))?;
        }
        jobs.push((class_dir.join(format!("{name}{counter}.jpeg")), canvas));
        *counter += 1;
    }

    jobs.par_iter().try_for_each(|(path, canvas)| -> Result<()> {
        image::save_buffer_with_format(
            path,
            &canvas.data,
            canvas.width,
            canvas.height,
            ExtendedColorType::L8,
            ImageFormat::Jpeg,
        )
        .with_context(|| format!("Écriture de {}", path.display()))
    })?;
    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_per_label_indices() {
        let out = tempfile::tempdir().unwrap();
        let vocab = ClassVocabulary::new(["N", "/"]).unwrap();
        let img = |v| GrayCanvas::new(8, 8, v);
        let result = SplitResult {
            vocabulary: vocab,
            width: 8,
            height: 8,
            train: vec![(img(10), 0), (img(20), 1), (img(30), 0)],
            test: vec![(img(40), 1)],
        };

        let summary = result.export_dirs(out.path()).unwrap();
        assert_eq!(summary, ExportSummary { train: 3, test: 1 });
        for rel in ["train/N/N0.jpeg", "train/N/N1.jpeg", "train/_/_0.jpeg", "test/_/_0.jpeg"] {
            assert!(out.path().join(rel).is_file(), "{rel}");
        }
        let decoded = image::open(out.path().join("train/N/N1.jpeg")).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert!(decoded.pixels().all(|p| p.0[0].abs_diff(30) <= 2));
    }

    #[test]
    fn smaller_reexport_replaces_partitions() {
        let out = tempfile::tempdir().unwrap();
        let vocab = ClassVocabulary::new(["N", "V"]).unwrap();
        let img = |v| GrayCanvas::new(4, 4, v);
        let big = SplitResult {
            vocabulary: vocab.clone(),
            width: 4,
            height: 4,
            train: vec![(img(10), 0), (img(20), 0), (img(30), 1)],
            test: vec![(img(40), 0)],
        };
        big.export_dirs(out.path()).unwrap();
        fs::write(out.path().join("keep.txt"), b"").unwrap();

        let small = SplitResult {
            train: vec![(img(50), 0)],
            test: vec![],
            ..big
        };
        assert_eq!(small.export_dirs(out.path()).unwrap(), ExportSummary { train: 1, test: 0 });

        assert!(out.path().join("train/N/N0.jpeg").is_file());
        assert!(!out.path().join("train/N/N1.jpeg").exists());
        assert!(!out.path().join("train/V").exists());
        assert!(!out.path().join("test/N").exists());
        assert!(out.path().join("keep.txt").is_file());
    }
}
