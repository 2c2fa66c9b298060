use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Classes retenues par défaut, dans l'ordre de priorité de sélection.
pub const DEFAULT_CLASSES: &[&str] = &["L", "N", "V", "A", "R"];

/// Vocabulaire ordonné des classes.
///
/// L'ordre fixe à la fois la priorité de sélection et l'index utilisé
/// pour les vecteurs one-hot.
///
/// # Example
/// ```
/// use bc_core::vocab::ClassVocabulary;
/// let vocab = ClassVocabulary::default();
/// assert_eq!(vocab.index_of("V"), Some(2));
/// assert_eq!(vocab.one_hot(2), vec![0.0, 0.0, 1.0, 0.0, 0.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassVocabulary {
    labels: Vec<String>,
}

impl ClassVocabulary {
    /// Build a vocabulary from an ordered label list.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the list is empty or holds duplicates.
    pub fn new<I, S>(labels: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(CoreError::Config("vocabulaire de classes vide".into()));
        }
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(CoreError::Config("label de classe vide".into()));
            }
            if labels[..i].contains(label) {
                return Err(CoreError::Config(format!("classe dupliquée : {label}")));
            }
        }
        Ok(Self { labels })
    }

    /// Labels in priority order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always `false` for a validated vocabulary.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Position of `label`, if part of the vocabulary.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// One-hot vector of length `len()` with a 1.0 at `index`.
    /// An out-of-range index yields an all-zero vector.
    #[must_use]
    pub fn one_hot(&self, index: usize) -> Vec<f32> {
        let mut v = vec![0.0; self.labels.len()];
        if let Some(slot) = v.get_mut(index) {
            *slot = 1.0;
        }
        v
    }
}

impl Default for ClassVocabulary {
    fn default() -> Self {
        Self {
            labels: DEFAULT_CLASSES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Nom de dossier du corpus pour un label.
///
/// `/` (paced beat) cannot be a directory name and is stored as `_`.
///
/// # Example
/// ```
/// use bc_core::vocab::class_dir_name;
/// assert_eq!(class_dir_name("/"), "_");
/// assert_eq!(class_dir_name("N"), "N");
/// ```
#[must_use]
pub fn class_dir_name(label: &str) -> String {
    label.replace('/', "_")
}
