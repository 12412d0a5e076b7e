/// Fatal errors while loading the reference file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to download reference file '{path}': {source}")]
    Storage {
        path: String,
        #[source]
        source: object_store::Error,
    },
    #[error("Reference file is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Failed to parse reference CSV: {0}")]
    Csv(#[from] arrow::error::ArrowError),
    #[error("Reference CSV is missing required column '{0}'")]
    MissingColumn(String),
}
