use std::fs;
use std::path::Path;

use anyhow::Result;
use bc_core::error::CoreError;
use bc_core::natsort::natural_cmp;
use bc_core::record::RecordRef;

/// Liste les records d'un dossier : un record par fichier `<id>.<header_ext>`.
///
/// Non récursif. L'extension est comparée à la casse près, comme le chargement
/// qui reconstruit `<id>.<header_ext>`. Les identifiants sont triés en ordre
/// naturel (`"2" < "10"`) pour que l'ordre de traitement soit reproductible.
///
/// # Errors
/// Returns [`CoreError::FileNotFound`] if `dir` is not a directory, or an I/O error.
///
/// # Example
/// ```
/// use bc_source::discover::discover_records;
/// let dir = std::env::temp_dir().join("bc_discover_doc");
/// std::fs::create_dir_all(&dir).unwrap();
/// std::fs::write(dir.join("10.hea"), "").unwrap();
/// std::fs::write(dir.join("9.hea"), "").unwrap();
/// let ids: Vec<_> = discover_records(&dir, "hea").unwrap().into_iter().map(|r| r.id).collect();
/// assert_eq!(ids, ["9", "10"]);
/// ```
pub fn discover_records(dir: &Path, header_ext: &str) -> Result<Vec<RecordRef>> {
    if !dir.is_dir() {
        return Err(CoreError::FileNotFound {
            path: dir.display().to_string(),
        }
        .into());
    }

    let mut records = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext == header_ext);
        if !matches {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            records.push(RecordRef::new(dir, stem));
        } else {
            log::warn!("Nom de fichier non UTF-8 ignoré : {}", path.display());
        }
    }

    records.sort_by(|a, b| natural_cmp(&a.id, &b.id));
    log::debug!("{} record(s) dans {}", records.len(), dir.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_headers_in_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["201.hea", "100.hea", "100.dat", "100.atr", "notes.txt", "23.hea", "7.HEA"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("sub.hea")).unwrap();

        let ids: Vec<String> = discover_records(dir.path(), "hea")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["23", "100", "201"]);
    }

    #[test]
    fn empty_dir_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_records(dir.path(), "hea").unwrap().is_empty());
    }

    #[test]
    fn missing_dir_is_file_not_found() {
        let err = discover_records(Path::new("/nonexistent/bc/dir"), "hea").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FileNotFound { .. })
        ));
    }
}
