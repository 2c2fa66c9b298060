use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bc_core::error::CoreError;
use bc_core::natsort::natural_cmp;
use bc_core::vocab::class_dir_name;
use serde::{Deserialize, Serialize};

/// Nom par défaut du manifest, à la racine du corpus.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Référence vers une image du corpus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Path of the PNG file.
    pub path: PathBuf,
    /// Record id parsed from `image_<record>_<beat>`, if the name matches.
    pub record_id: Option<String>,
    /// Beat index parsed from the file name, if the name matches.
    pub beat_index: Option<usize>,
}

impl ImageRef {
    /// Build a reference, parsing record and beat ids from the file stem.
    #[must_use]
    pub fn from_path(path: PathBuf) -> Self {
        let parsed = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(parse_image_name);
        let (record_id, beat_index) = match parsed {
            Some((r, b)) => (Some(r), Some(b)),
            None => (None, None),
        };
        Self {
            path,
            record_id,
            beat_index,
        }
    }
}

/// `image_<record>_<beat>` → `(record, beat)`.
///
/// # Example
/// ```
/// use bc_dataset::index::parse_image_name;
/// assert_eq!(parse_image_name("image_100_7"), Some(("100".to_string(), 7)));
/// assert_eq!(parse_image_name("image_x_y_12"), Some(("x_y".to_string(), 12)));
/// assert_eq!(parse_image_name("beat_3"), None);
/// ```
#[must_use]
pub fn parse_image_name(stem: &str) -> Option<(String, usize)> {
    let rest = stem.strip_prefix("image_")?;
    let (record, beat) = rest.rsplit_once('_')?;
    if record.is_empty() {
        return None;
    }
    Some((record.to_string(), beat.parse().ok()?))
}

/// Index du corpus : dossier de classe → images, triées naturellement.
///
/// Les clés sont les noms de dossiers (`_` pour le label `/`) ; les accès
/// par label passent par [`class_dir_name`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPool {
    /// Corpus root the pool was built from.
    pub root: PathBuf,
    classes: BTreeMap<String, Vec<ImageRef>>,
}

impl ClassPool {
    /// Pool vide pour `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            classes: BTreeMap::new(),
        }
    }

    /// Ajoute une classe (remplace l'existante).
    pub fn insert(&mut self, label: &str, images: Vec<ImageRef>) {
        self.classes.insert(class_dir_name(label), images);
    }

    /// Images of `label`, empty if the class is absent.
    #[must_use]
    pub fn images(&self, label: &str) -> &[ImageRef] {
        self.classes
            .get(&class_dir_name(label))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of images available for `label`.
    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.images(label).len()
    }

    /// Directory names of all indexed classes, sorted.
    pub fn class_dirs(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Total number of images.
    #[must_use]
    pub fn total(&self) -> usize {
        self.classes.values().map(Vec::len).sum()
    }
}

/// Scanne `root` : chaque sous-dossier est une classe, ses `.png` les membres.
///
/// Non récursif sous chaque classe. Les images sont triées par nom de fichier
/// en ordre naturel, ce qui rend l'index reproductible d'une plateforme à l'autre.
///
/// # Errors
/// Returns [`CoreError::FileNotFound`] if `root` is not a directory, or an I/O error.
pub fn index_corpus(root: &Path) -> Result<ClassPool> {
    if !root.is_dir() {
        return Err(CoreError::FileNotFound {
            path: root.display().to_string(),
        }
        .into());
    }

    let mut pool = ClassPool::new(root);
    for entry in fs::read_dir(root).with_context(|| format!("Lecture de {}", root.display()))? {
        let class_dir = entry?.path();
        if !class_dir.is_dir() {
            continue;
        }
        let Some(name) = class_dir.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        let images = scan_class(&class_dir)?;
        log::debug!("Classe {name} : {} image(s)", images.len());
        pool.classes.insert(name.to_string(), images);
    }
    log::info!("Corpus {} : {} image(s)", root.display(), pool.total());
    Ok(pool)
}

fn scan_class(dir: &Path) -> Result<Vec<ImageRef>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Lecture de {}", dir.display()))? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| {
        let name = |p: &Path| p.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        natural_cmp(&name(a), &name(b))
    });
    Ok(files.into_iter().map(ImageRef::from_path).collect())
}

/// Écrit le pool en JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_manifest(pool: &ClassPool, path: &Path) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Création de {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, pool).context("Sérialisation du manifest")?;
    writer.flush()?;
    Ok(())
}

/// Relit un manifest écrit par [`write_manifest`].
///
/// # Errors
/// Returns an error if the file is missing or not a valid manifest.
pub fn read_manifest(path: &Path) -> Result<ClassPool> {
    let file = fs::File::open(path).with_context(|| format!("Ouverture de {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Manifest invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for n in names {
            fs::write(dir.join(n), b"").unwrap();
        }
    }

    #[test]
    fn indexes_classes_in_natural_order() {
        let root = tempfile::tempdir().unwrap();
        touch(
            &root.path().join("N"),
            &["image_100_10.png", "image_100_2.png", "image_9_0.png", "notes.txt"],
        );
        touch(&root.path().join("_"), &["image_102_0.png"]);
        touch(&root.path().join("V"), &[]);
        fs::write(root.path().join("stray.png"), b"").unwrap();
        fs::create_dir_all(root.path().join("N").join("nested")).unwrap();

        let pool = index_corpus(root.path()).unwrap();
        let names: Vec<_> = pool
            .images("N")
            .iter()
            .map(|i| i.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["image_9_0.png", "image_100_2.png", "image_100_10.png"]);
        assert_eq!(pool.count("/"), 1);
        assert_eq!(pool.count("V"), 0);
        assert_eq!(pool.count("A"), 0);
        assert_eq!(pool.total(), 4);
        assert_eq!(pool.images("N")[1].beat_index, Some(2));
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = index_corpus(Path::new("/nonexistent/bc/corpus")).unwrap_err();
        assert!(err.downcast_ref::<CoreError>().is_some());
    }

    #[test]
    fn manifest_roundtrip() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("L"), &["image_1_0.png", "image_1_1.png"]);
        let pool = index_corpus(root.path()).unwrap();
        let manifest = root.path().join(MANIFEST_FILE);
        write_manifest(&pool, &manifest).unwrap();
        assert_eq!(read_manifest(&manifest).unwrap(), pool);
        // The manifest file itself is not a class.
        assert_eq!(index_corpus(root.path()).unwrap(), pool);
    }

    #[test]
    fn unparsable_names_keep_no_ids() {
        let r = ImageRef::from_path(PathBuf::from("N/custom.png"));
        assert_eq!((r.record_id, r.beat_index), (None, None));
    }
}
