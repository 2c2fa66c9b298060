use std::path::{Path, PathBuf};

/// Marqueur expert : position en échantillons + symbole de classe.
///
/// # Example
/// ```
/// use bc_core::record::Annotation;
/// let a = Annotation::new(360, "N");
/// assert_eq!(a.symbol, "N");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Sample index of the event. Strictly increasing within a record.
    pub sample: i64,
    /// Class label (e.g. "N", "V", "/").
    pub symbol: String,
}

impl Annotation {
    /// Build an annotation.
    #[must_use]
    pub fn new(sample: i64, symbol: impl Into<String>) -> Self {
        Self {
            sample,
            symbol: symbol.into(),
        }
    }
}

/// Un enregistrement chargé : un canal d'amplitudes + ses annotations.
///
/// Immuable une fois chargé, jeté après l'extraction des beats.
#[derive(Clone, Debug, Default)]
pub struct Record {
    /// Record identifier (file stem, e.g. "100").
    pub id: String,
    /// Amplitude samples of channel 0, physical units.
    pub samples: Vec<f32>,
    /// Annotations in ascending sample order.
    pub annotations: Vec<Annotation>,
}

impl Record {
    /// Number of samples in the channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when the channel holds no sample.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Référence vers un record sur disque : dossier racine + identifiant.
///
/// # Example
/// ```
/// use bc_core::record::RecordRef;
/// use std::path::Path;
/// let r = RecordRef::new(Path::new("data/mitdb"), "100");
/// assert_eq!(r.file_with_extension("hea"), Path::new("data/mitdb/100.hea"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordRef {
    /// Directory holding the record files.
    pub dir: PathBuf,
    /// Record identifier (header file stem).
    pub id: String,
}

impl RecordRef {
    /// Build a reference.
    #[must_use]
    pub fn new(dir: &Path, id: impl Into<String>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            id: id.into(),
        }
    }

    /// `<dir>/<id>.<ext>`
    #[must_use]
    pub fn file_with_extension(&self, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{ext}", self.id))
    }
}
