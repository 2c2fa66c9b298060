use anyhow::Result;

use crate::record::{Record, RecordRef};

/// Fournit les records (échantillons + annotations) au pipeline.
///
/// Implémenté par : `WfdbSource`. Les tests utilisent des sources en mémoire.
///
/// # Example
/// ```
/// use bc_core::traits::WaveformSource;
/// use bc_core::record::{Record, RecordRef};
///
/// struct EmptySource;
/// impl WaveformSource for EmptySource {
///     fn load(&self, record: &RecordRef) -> anyhow::Result<Record> {
///         Ok(Record { id: record.id.clone(), ..Record::default() })
///     }
/// }
/// ```
pub trait WaveformSource: Send + Sync {
    /// Charge un record complet.
    ///
    /// CONTRAT : les annotations sont renvoyées triées par index croissant.
    ///
    /// # Errors
    /// Any failure to read or decode the record. The caller skips the record.
    fn load(&self, record: &RecordRef) -> Result<Record>;
}

/// Score renvoyé par un classifieur externe après évaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Score {
    /// Loss on the evaluated partition.
    pub loss: f32,
    /// Accuracy on the evaluated partition, in `[0, 1]`.
    pub accuracy: f32,
}

/// Collaborateur externe qui consomme les tableaux produits par le splitter.
///
/// Le pipeline ne dépend que de ce contrat : tableaux en entrée, un score en sortie.
///
/// # Example
/// ```
/// use bc_core::traits::{Classifier, Score};
///
/// struct Constant;
/// impl Classifier for Constant {
///     type Batch = ();
///     fn fit(&mut self, _train: &()) -> anyhow::Result<()> { Ok(()) }
///     fn evaluate(&self, _test: &()) -> anyhow::Result<Score> { Ok(Score::default()) }
/// }
/// ```
pub trait Classifier {
    /// Array representation consumed by the model.
    type Batch;

    /// Entraîne le modèle sur la partition train.
    ///
    /// # Errors
    /// Implementation-defined training failure.
    fn fit(&mut self, train: &Self::Batch) -> Result<()>;

    /// Évalue sur la partition test.
    ///
    /// # Errors
    /// Implementation-defined evaluation failure.
    fn evaluate(&self, test: &Self::Batch) -> Result<Score>;
}
