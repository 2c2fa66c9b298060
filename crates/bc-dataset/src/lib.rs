//! Index du corpus d'images et découpage équilibré train/test.
//!
//! [`index::index_corpus`] builds a [`ClassPool`] from the on-disk corpus,
//! [`split::plan_split`] caps each class at the quota and partitions the
//! selection with a seeded shuffle. [`split::SplitPlan::materialize`] loads the
//! pixels, from which arrays or `train/` `test/` directories are derived.

pub mod arrays;
pub mod error;
pub mod export;
pub mod index;
pub mod split;

pub use arrays::Arrays;
pub use error::{DatasetError, SplitWarning};
pub use export::ExportSummary;
pub use index::{ClassPool, ImageRef, index_corpus};
pub use split::{SplitPlan, SplitResult, plan_split, select_balanced};
