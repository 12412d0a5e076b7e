use common::Snapshot;
use search_client::{SearchClient, SearchError};

/// Fetch the current contents of the index as a snapshot.
///
/// Any failure is logged and yields an empty snapshot, so a failed search
/// looks exactly like an empty index to the caller and leads to no deletions.
pub async fn read_index(client: &SearchClient) -> Snapshot {
    match client.search_all().await {
        Ok(documents) => {
            let returned = documents.len();
            let snapshot: Snapshot = documents.into_iter().collect();
            if snapshot.len() != returned {
                log::warn!(
                    "Index '{}' returned {} duplicate id(s)",
                    client.index_name(),
                    returned - snapshot.len()
                );
            }
            log::info!(
                "Fetched {} document(s) from index '{}'",
                snapshot.len(),
                client.index_name()
            );
            snapshot
        }
        Err(SearchError::Api { status, message }) => {
            log::error!("Error during search: {status}, {message}");
            Snapshot::new()
        }
        Err(e) => {
            log::error!("Error during search: {e}");
            Snapshot::new()
        }
    }
}
