use common::Snapshot;
use common::config::ReconcileConfig;
use search_client::{SearchClient, SearchError};

use crate::{LoadError, ReferenceLoader, content_preview, deletion_set, read_index};

const CONTENT_NOT_AVAILABLE: &str = "Content not available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Characters of content shown per deletion candidate
    pub preview_chars: usize,
    /// Skip the delete request
    pub dry_run: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileConfig::default().into()
    }
}

impl From<ReconcileConfig> for ReconcileOptions {
    fn from(config: ReconcileConfig) -> Self {
        Self {
            preview_chars: config.preview_chars,
            dry_run: config.dry_run,
        }
    }
}

/// What happened to the deletion set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    NothingToDelete,
    Deleted { count: usize },
    DeleteFailed { status: Option<u16>, message: String },
    DryRun { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Documents returned by the index search
    pub indexed: usize,
    /// Rows in the reference file
    pub referenced: usize,
    /// Ids selected for deletion, in index order
    pub deletion_set: Vec<String>,
    pub outcome: DeleteOutcome,
}

/// Reader -> Loader -> diff -> (conditional) delete, run once
pub struct Reconciler {
    search: SearchClient,
    loader: ReferenceLoader,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(search: SearchClient, loader: ReferenceLoader, options: ReconcileOptions) -> Self {
        Self {
            search,
            loader,
            options,
        }
    }

    /// Run a single reconciliation against the reference file `blob`.
    ///
    /// Only reference loading errors are returned; search and delete failures
    /// are logged and reflected in the report.
    #[tracing::instrument(skip(self), fields(index = %self.search.index_name()))]
    pub async fn run(&self, blob: &str) -> Result<ReconcileReport, LoadError> {
        let index = read_index(&self.search).await;

        let reference = self.loader.load(blob).await?;
        log::info!("Loaded {} reference row(s) from '{blob}'", reference.len());

        let to_delete = deletion_set(&index, &reference);

        let outcome = if to_delete.is_empty() {
            log::info!("No documents to delete. Every indexed document is present in the reference file.");
            DeleteOutcome::NothingToDelete
        } else {
            self.log_candidates(&index, &to_delete);
            if self.options.dry_run {
                log::info!(
                    "Dry run: {} document(s) would be deleted",
                    to_delete.len()
                );
                DeleteOutcome::DryRun {
                    count: to_delete.len(),
                }
            } else {
                self.delete(&to_delete).await
            }
        };

        Ok(ReconcileReport {
            indexed: index.len(),
            referenced: reference.len(),
            deletion_set: to_delete,
            outcome,
        })
    }

    fn log_candidates(&self, index: &Snapshot, ids: &[String]) {
        log::info!("Deleting the following documents:");
        for id in ids {
            let content = index.get(id).unwrap_or(CONTENT_NOT_AVAILABLE);
            log::info!(
                "ID: {id}, {}",
                content_preview(content, self.options.preview_chars)
            );
        }
    }

    async fn delete(&self, ids: &[String]) -> DeleteOutcome {
        match self.search.delete_documents(ids).await {
            Ok(count) => {
                log::info!("Successfully deleted {count} documents.");
                DeleteOutcome::Deleted { count }
            }
            Err(SearchError::Api { status, message }) => {
                log::error!("Error during deletion: {status}, {message}");
                DeleteOutcome::DeleteFailed {
                    status: Some(status),
                    message,
                }
            }
            Err(e) => {
                log::error!("Error during deletion: {e}");
                DeleteOutcome::DeleteFailed {
                    status: e.status(),
                    message: e.to_string(),
                }
            }
        }
    }
}
