use bc_core::frame::GrayCanvas;
use bc_core::vocab::ClassVocabulary;

use crate::split::SplitResult;

/// Tenseurs denses consommés par un classifieur externe.
///
/// `pixels` is `[n, height, width]` row-major in `[0, 1]`, `labels` is
/// `[n, n_classes]` one-hot.
#[derive(Clone, Debug, PartialEq)]
pub struct Arrays {
    /// Normalized pixels, `n * height * width` values.
    pub pixels: Vec<f32>,
    /// One-hot labels, `n * n_classes` values.
    pub labels: Vec<f32>,
    /// Number of images.
    pub n: usize,
    /// Image height.
    pub height: usize,
    /// Image width.
    pub width: usize,
    /// Vocabulary size.
    pub n_classes: usize,
}

impl Arrays {
    /// Assemble les tableaux d'une partition.
    #[must_use]
    pub fn from_images(images: &[(GrayCanvas, usize)], vocab: &ClassVocabulary, width: u32, height: u32) -> Self {
        let plane = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(images.len() * plane);
        let mut labels = Vec::with_capacity(images.len() * vocab.len());
        for (canvas, class_index) in images {
            pixels.extend(canvas.data.iter().map(|&v| f32::from(v) / 255.0));
            labels.extend(vocab.one_hot(*class_index));
        }
        Self {
            pixels,
            labels,
            n: images.len(),
            height: height as usize,
            width: width as usize,
            n_classes: vocab.len(),
        }
    }

    /// Pixels of image `i`.
    #[must_use]
    pub fn image(&self, i: usize) -> &[f32] {
        let plane = self.height * self.width;
        &self.pixels[i * plane..(i + 1) * plane]
    }

    /// One-hot label of image `i`.
    #[must_use]
    pub fn label(&self, i: usize) -> &[f32] {
        &self.labels[i * self.n_classes..(i + 1) * self.n_classes]
    }

    /// Class index of image `i` (argmax of its one-hot row).
    #[must_use]
    pub fn class_of(&self, i: usize) -> Option<usize> {
        self.label(i).iter().position(|&v| v > 0.5)
    }
}

impl SplitResult {
    /// Tableaux de la partition train.
    #[must_use]
    pub fn train_arrays(&self) -> Arrays {
        Arrays::from_images(&self.train, &self.vocabulary, self.width, self.height)
    }

    /// Tableaux de la partition test.
    #[must_use]
    pub fn test_arrays(&self) -> Arrays {
        Arrays::from_images(&self.test, &self.vocabulary, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_core::traits::{Classifier, Score};

    #[test]
    fn pixels_normalized_and_labels_one_hot() {
        let vocab = ClassVocabulary::default();
        let images = vec![
            (GrayCanvas::from_raw(2, 1, vec![0, 255]).unwrap(), 2),
            (GrayCanvas::from_raw(2, 1, vec![51, 102]).unwrap(), 0),
        ];
        let a = Arrays::from_images(&images, &vocab, 2, 1);
        assert_eq!(a.n, 2);
        assert_eq!(a.image(0), &[0.0, 1.0]);
        assert!((a.image(1)[0] - 0.2).abs() < 1e-6);
        assert_eq!(a.label(0), &[0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(a.class_of(1), Some(0));
        assert!(a.pixels.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    /// Classe = plus proche luminance moyenne.
    struct MeanBrightness {
        centroids: Vec<f32>,
    }

    impl Classifier for MeanBrightness {
        type Batch = Arrays;

        fn fit(&mut self, train: &Arrays) -> anyhow::Result<()> {
            let mut sums = vec![(0.0f32, 0usize); train.n_classes];
            for i in 0..train.n {
                let c = train.class_of(i).ok_or_else(|| anyhow::anyhow!("label vide"))?;
                let mean = train.image(i).iter().sum::<f32>() / train.image(i).len() as f32;
                sums[c].0 += mean;
                sums[c].1 += 1;
            }
            self.centroids = sums.iter().map(|(s, n)| if *n == 0 { f32::NAN } else { s / *n as f32 }).collect();
            Ok(())
        }

        fn evaluate(&self, test: &Arrays) -> anyhow::Result<Score> {
            let correct = (0..test.n)
                .filter(|&i| {
                    let mean = test.image(i).iter().sum::<f32>() / test.image(i).len() as f32;
                    let predicted = self
                        .centroids
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| c.is_finite())
                        .min_by(|a, b| (a.1 - mean).abs().total_cmp(&(b.1 - mean).abs()))
                        .map(|(k, _)| k);
                    predicted == test.class_of(i)
                })
                .count();
            let accuracy = correct as f32 / test.n.max(1) as f32;
            Ok(Score { loss: 1.0 - accuracy, accuracy })
        }
    }

    #[test]
    fn classifier_consumes_arrays() {
        let vocab = ClassVocabulary::default();
        let flat = |v: u8, class: usize| (GrayCanvas::new(4, 4, v), class);
        let train = Arrays::from_images(&[flat(10, 1), flat(20, 1), flat(240, 2), flat(250, 2)], &vocab, 4, 4);
        let test = Arrays::from_images(&[flat(15, 1), flat(230, 2)], &vocab, 4, 4);

        let mut model = MeanBrightness { centroids: Vec::new() };
        model.fit(&train).unwrap();
        let score = model.evaluate(&test).unwrap();
        assert!((score.accuracy - 1.0).abs() < f32::EPSILON);
        assert!(score.loss.abs() < f32::EPSILON);
    }

    #[test]
    fn empty_partition() {
        let a = Arrays::from_images(&[], &ClassVocabulary::default(), 224, 224);
        assert_eq!((a.n, a.pixels.len(), a.labels.len()), (0, 0, 0));
    }
}
