use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use common::Snapshot;
use object_store::{ObjectStore, path::Path};

use crate::LoadError;

pub const ID_COLUMN: &str = "id";
pub const CONTENT_COLUMN: &str = "content";

const UTF8_BOM: &str = "\u{feff}";

/// Loads the reference CSV from object storage
pub struct ReferenceLoader {
    store: Arc<dyn ObjectStore>,
}

impl ReferenceLoader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Download `blob` in full and parse it into a snapshot
    pub async fn load(&self, blob: &str) -> Result<Snapshot, LoadError> {
        let path = Path::from(blob);
        let storage_error = |source: object_store::Error| LoadError::Storage {
            path: path.to_string(),
            source,
        };

        let bytes = self
            .store
            .get(&path)
            .await
            .map_err(storage_error)?
            .bytes()
            .await
            .map_err(storage_error)?;
        log::debug!("Downloaded {} byte(s) from '{path}'", bytes.len());

        parse_reference_csv(&bytes)
    }
}

/// Parse CSV text with a header row into a snapshot keyed by the `id` column.
///
/// Every column is read as text, so ids compare as strings regardless of
/// what they look like. Rows with an empty id are skipped; empty content is
/// kept as an empty string. Rows that end early read the missing cells as
/// empty, rows with more fields than the header are an error.
pub fn parse_reference_csv(data: &[u8]) -> Result<Snapshot, LoadError> {
    let text = std::str::from_utf8(data)?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    // Only the header names are needed, every column is forced to text below
    let format = Format::default().with_header(true);
    let (inferred, _) = format.infer_schema(Cursor::new(text.as_bytes()), Some(0))?;

    let schema = Arc::new(Schema::new(
        inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let id_idx = column_index(&schema, ID_COLUMN)?;
    let content_idx = column_index(&schema, CONTENT_COLUMN)?;

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_truncated_rows(true)
        .build(Cursor::new(text.as_bytes()))?;

    let mut snapshot = Snapshot::new();
    let mut skipped = 0usize;

    for batch in reader {
        let batch = batch?;
        let ids = batch.column(id_idx).as_string::<i32>();
        let contents = batch.column(content_idx).as_string::<i32>();

        for row in 0..batch.num_rows() {
            if ids.is_null(row) || ids.value(row).is_empty() {
                skipped += 1;
                continue;
            }
            let content = if contents.is_null(row) {
                ""
            } else {
                contents.value(row)
            };
            snapshot.insert(ids.value(row), content);
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} reference row(s) without an id");
    }

    Ok(snapshot)
}

fn column_index(schema: &Schema, name: &str) -> Result<usize, LoadError> {
    schema
        .index_of(name)
        .map_err(|_| LoadError::MissingColumn(name.to_string()))
}
