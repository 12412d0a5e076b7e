pub mod diff;
pub mod error;
pub mod index_reader;
pub mod pipeline;
pub mod reference_loader;

pub use diff::{content_preview, deletion_set};
pub use error::LoadError;
pub use index_reader::read_index;
pub use pipeline::{DeleteOutcome, ReconcileOptions, ReconcileReport, Reconciler};
pub use reference_loader::{ReferenceLoader, parse_reference_csv};
