use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bc_core::frame::GrayCanvas;
use bc_core::vocab::ClassVocabulary;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, SplitWarning};
use crate::index::{ClassPool, ImageRef};

/// Image sélectionnée, étiquetée par sa classe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledImage {
    /// Image file.
    pub image: ImageRef,
    /// Class label.
    pub label: String,
    /// Position of `label` in the vocabulary.
    pub class_index: usize,
}

/// Résultat de la phase 1 : images retenues par classe, plus les avertissements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Selected images, grouped by class in vocabulary order.
    pub items: Vec<LabeledImage>,
    /// `(label, selected count)` in vocabulary order.
    pub per_class: Vec<(String, usize)>,
    /// Shortfalls relative to the quota.
    pub warnings: Vec<SplitWarning>,
}

/// Phase 1 : plafonne chaque classe du vocabulaire à `quota` images.
///
/// Classes are visited in vocabulary order; each takes `min(quota, available)`
/// images from the front of its (sorted) pool. Every class below the quota
/// raises [`SplitWarning::QuotaUnmet`]; an absent or empty one also raises
/// [`SplitWarning::CorpusEmpty`] first.
///
/// # Example
/// ```
/// use bc_core::vocab::ClassVocabulary;
/// use bc_dataset::index::{ClassPool, ImageRef};
/// use bc_dataset::split::select_balanced;
/// use std::path::Path;
///
/// let mut pool = ClassPool::new(Path::new("corpus"));
/// pool.insert("N", (0..5).map(|i| ImageRef::from_path(format!("N/image_1_{i}.png").into())).collect());
/// let vocab = ClassVocabulary::new(["N", "V"]).unwrap();
/// let sel = select_balanced(&pool, &vocab, 3);
/// assert_eq!(sel.items.len(), 3);
/// assert_eq!(sel.warnings.len(), 2);
/// ```
#[must_use]
pub fn select_balanced(pool: &ClassPool, vocab: &ClassVocabulary, quota: usize) -> Selection {
    vocab
        .labels()
        .iter()
        .enumerate()
        .fold(Selection::default(), |mut sel, (class_index, label)| {
            let available = pool.images(label);
            let take = quota.min(available.len());
            if available.is_empty() {
                sel.warnings.push(SplitWarning::CorpusEmpty {
                    label: label.clone(),
                });
            }
            if available.len() < quota {
                sel.warnings.push(SplitWarning::QuotaUnmet {
                    label: label.clone(),
                    available: available.len(),
                    quota,
                });
            }
            sel.items
                .extend(available[..take].iter().map(|image| LabeledImage {
                    image: image.clone(),
                    label: label.clone(),
                    class_index,
                }));
            sel.per_class.push((label.clone(), take));
            sel
        })
}

/// Nombre d'images de test : `ceil(fraction × n)`, borné à `n`.
///
/// # Example
/// ```
/// use bc_dataset::split::test_count;
/// assert_eq!(test_count(25, 0.2), 5);
/// assert_eq!(test_count(26, 0.2), 6);
/// assert_eq!(test_count(0, 0.2), 0);
/// ```
#[must_use]
pub fn test_count(n: usize, test_fraction: f32) -> usize {
    // 0.2_f32 vaut 0.2000000030 : sans tolérance, 0.2 × 25 donnerait 6.
    let exact = f64::from(test_fraction) * n as f64;
    ((exact - 1e-6).ceil().max(0.0) as usize).min(n)
}

/// Partition train/test par références, persistable en JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitPlan {
    /// Vocabulary used for class indices and one-hot vectors.
    pub vocabulary: ClassVocabulary,
    /// Requested per-class quota.
    pub quota: usize,
    /// Requested test fraction.
    pub test_fraction: f32,
    /// Shuffle seed.
    pub seed: u64,
    /// Training partition.
    pub train: Vec<LabeledImage>,
    /// Test partition.
    pub test: Vec<LabeledImage>,
    /// Shortfalls raised during selection.
    pub warnings: Vec<SplitWarning>,
}

impl SplitPlan {
    /// Phase 2 : mélange global seedé de la sélection, puis découpe.
    ///
    /// The first `ceil(test_fraction × n)` shuffled images form the test set,
    /// the rest the training set. The split is global, not per class.
    #[must_use]
    pub fn from_selection(
        selection: Selection,
        vocabulary: ClassVocabulary,
        quota: usize,
        test_fraction: f32,
        seed: u64,
    ) -> Self {
        let mut items = selection.items;
        let mut rng = StdRng::seed_from_u64(seed);
        items.shuffle(&mut rng);

        let n_test = test_count(items.len(), test_fraction);
        let train = items.split_off(n_test);
        Self {
            vocabulary,
            quota,
            test_fraction,
            seed,
            train,
            test: items,
            warnings: selection.warnings,
        }
    }

    /// Total selected images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    /// `true` when nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Écrit le plan en JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path).with_context(|| format!("Création de {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).context("Sérialisation du plan")?;
        writer.flush()?;
        Ok(())
    }

    /// Relit un plan écrit par [`SplitPlan::save`].
    ///
    /// # Errors
    /// Returns an error if the file is missing or invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path).with_context(|| format!("Ouverture de {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Plan invalide : {}", path.display()))
    }

    /// Charge les pixels de toutes les images (en parallèle).
    ///
    /// Every image must be `width`×`height` once converted to luminance.
    ///
    /// # Errors
    /// Returns an error on the first unreadable or mis-sized image.
    pub fn materialize(&self, width: u32, height: u32) -> Result<SplitResult> {
        let load = |part: &[LabeledImage]| -> Result<Vec<(GrayCanvas, usize)>> {
            part.par_iter()
                .map(|item| Ok((load_gray(&item.image.path, width, height)?, item.class_index)))
                .collect()
        };
        Ok(SplitResult {
            vocabulary: self.vocabulary.clone(),
            width,
            height,
            train: load(&self.train)?,
            test: load(&self.test)?,
        })
    }
}

/// Construit le plan complet depuis un pool : sélection puis découpe.
///
/// # Example
/// ```
/// use bc_core::vocab::ClassVocabulary;
/// use bc_dataset::index::{ClassPool, ImageRef};
/// use bc_dataset::split::plan_split;
/// use std::path::Path;
///
/// let mut pool = ClassPool::new(Path::new("corpus"));
/// pool.insert("N", (0..20).map(|i| ImageRef::from_path(format!("N/image_1_{i}.png").into())).collect());
/// let plan = plan_split(&pool, &ClassVocabulary::new(["N"]).unwrap(), 10, 0.2, 42);
/// assert_eq!((plan.train.len(), plan.test.len()), (8, 2));
/// ```
#[must_use]
pub fn plan_split(
    pool: &ClassPool,
    vocab: &ClassVocabulary,
    quota: usize,
    test_fraction: f32,
    seed: u64,
) -> SplitPlan {
    let selection = select_balanced(pool, vocab, quota);
    for (label, n) in &selection.per_class {
        log::info!("Classe {label} : {n} image(s) retenue(s)");
    }
    for w in &selection.warnings {
        log::warn!("{w}");
    }
    SplitPlan::from_selection(selection, vocab.clone(), quota, test_fraction, seed)
}

/// Lit une image en luminance et vérifie sa taille.
fn load_gray(path: &Path, width: u32, height: u32) -> Result<GrayCanvas> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?
        .into_luma8();
    if img.dimensions() != (width, height) {
        return Err(DatasetError::ImageSize {
            path: path.display().to_string(),
            width: img.width(),
            height: img.height(),
            expected_width: width,
            expected_height: height,
        }
        .into());
    }
    let (w, h) = img.dimensions();
    GrayCanvas::from_raw(w, h, img.into_raw())
        .ok_or_else(|| anyhow::anyhow!("Buffer incohérent : {}", path.display()))
}

/// Partition train/test avec pixels chargés.
#[derive(Clone, Debug)]
pub struct SplitResult {
    /// Vocabulary for one-hot encoding.
    pub vocabulary: ClassVocabulary,
    /// Image width.
    pub width: u32,
    /// Image height.
    pub height: u32,
    /// Training images with class index.
    pub train: Vec<(GrayCanvas, usize)>,
    /// Test images with class index.
    pub test: Vec<(GrayCanvas, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn pool_with(counts: &[(&str, usize)]) -> ClassPool {
        let mut pool = ClassPool::new(Path::new("corpus"));
        for (label, n) in counts {
            let images = (0..*n)
                .map(|i| ImageRef::from_path(PathBuf::from(format!("corpus/{label}/image_1_{i}.png"))))
                .collect();
            pool.insert(label, images);
        }
        pool
    }

    #[test]
    fn full_quota_selects_five_q() {
        let pool = pool_with(&[("L", 15), ("N", 40), ("V", 10), ("A", 12), ("R", 11), ("Q", 50)]);
        let sel = select_balanced(&pool, &ClassVocabulary::default(), 10);
        assert_eq!(sel.items.len(), 50);
        assert!(sel.warnings.is_empty());
        assert!(sel.items.iter().all(|i| i.label != "Q"));
    }

    #[test]
    fn short_class_raises_quota_unmet() {
        let pool = pool_with(&[("L", 15), ("N", 40), ("V", 10), ("A", 6), ("R", 11)]);
        let sel = select_balanced(&pool, &ClassVocabulary::default(), 10);
        assert_eq!(sel.items.len(), 46);
        assert_eq!(
            sel.warnings,
            vec![SplitWarning::QuotaUnmet {
                label: "A".into(),
                available: 6,
                quota: 10
            }]
        );
        let a = sel.per_class.iter().find(|(l, _)| l == "A").unwrap();
        assert_eq!(a.1, 6);
    }

    #[test]
    fn missing_class_is_empty_and_short_of_quota() {
        let pool = pool_with(&[("N", 10)]);
        let sel = select_balanced(&pool, &ClassVocabulary::new(["N", "A"]).unwrap(), 10);
        assert_eq!(
            sel.warnings,
            vec![
                SplitWarning::CorpusEmpty { label: "A".into() },
                SplitWarning::QuotaUnmet {
                    label: "A".into(),
                    available: 0,
                    quota: 10
                },
            ]
        );
        assert_eq!(sel.items.len(), 10);
        assert_eq!(sel.per_class, vec![("N".to_string(), 10), ("A".to_string(), 0)]);
    }

    #[test]
    fn one_hot_index_follows_vocabulary_order() {
        let pool = pool_with(&[("V", 2), ("L", 2)]);
        let vocab = ClassVocabulary::new(["V", "L"]).unwrap();
        let sel = select_balanced(&pool, &vocab, 5);
        assert!(sel.items.iter().all(|i| vocab.index_of(&i.label) == Some(i.class_index)));
        assert_eq!(sel.items[0].class_index, 0);
        assert_eq!(sel.items[0].label, "V");
    }

    #[test]
    fn split_is_disjoint_sized_and_seeded() {
        let pool = pool_with(&[("L", 15), ("N", 40), ("V", 10), ("A", 6), ("R", 11)]);
        let vocab = ClassVocabulary::default();
        let plan = plan_split(&pool, &vocab, 10, 0.2, 42);
        assert_eq!(plan.len(), 46);
        assert_eq!(plan.test.len(), 10);
        assert_eq!(plan.train.len(), 36);

        let train: HashSet<_> = plan.train.iter().map(|i| i.image.path.clone()).collect();
        assert!(plan.test.iter().all(|i| !train.contains(&i.image.path)));

        assert_eq!(plan_split(&pool, &vocab, 10, 0.2, 42), plan);
        assert_ne!(plan_split(&pool, &vocab, 10, 0.2, 7).test, plan.test);
    }

    #[test]
    fn plan_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let pool = pool_with(&[("N", 5), ("V", 5)]);
        let plan = plan_split(&pool, &ClassVocabulary::new(["N", "V"]).unwrap(), 5, 0.3, 1);
        let path = dir.path().join("split.json");
        plan.save(&path).unwrap();
        assert_eq!(SplitPlan::load(&path).unwrap(), plan);
    }

    #[test]
    fn materialize_checks_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let class_dir = dir.path().join("N");
        fs::create_dir_all(&class_dir).unwrap();
        for i in 0..4 {
            image::GrayImage::from_pixel(8, 8, image::Luma([i * 60]))
                .save(class_dir.join(format!("image_1_{i}.png")))
                .unwrap();
        }
        image::GrayImage::from_pixel(4, 8, image::Luma([0]))
            .save(class_dir.join("image_1_9.png"))
            .unwrap();

        let pool = crate::index::index_corpus(dir.path()).unwrap();
        let vocab = ClassVocabulary::new(["N"]).unwrap();

        let ok = plan_split(&pool, &vocab, 4, 0.25, 3).materialize(8, 8).unwrap();
        assert_eq!((ok.train.len(), ok.test.len()), (3, 1));

        let bad = plan_split(&pool, &vocab, 5, 0.25, 3).materialize(8, 8);
        assert!(bad.is_err());
    }
}
