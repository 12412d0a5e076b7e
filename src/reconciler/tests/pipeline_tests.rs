use std::sync::Arc;

use object_store::{ObjectStore, PutPayload, memory::InMemory, path::Path};
use reconciler::{DeleteOutcome, LoadError, ReconcileOptions, Reconciler, ReferenceLoader};
use search_client::SearchClient;
use search_client::testing::MockSearchService;
use serde_json::json;

const BLOB: &str = "reference.csv";

/// Spawn the mock, put `csv` into an in-memory store and wire a reconciler
async fn setup(mock: &MockSearchService, csv: &str, options: ReconcileOptions) -> Reconciler {
    let base_url = mock.spawn().await.unwrap();
    let client = SearchClient::new(&base_url, "docs", "admin-key", "2024-07-01");

    let store = Arc::new(InMemory::new());
    store
        .put(&Path::from(BLOB), PutPayload::from(csv.as_bytes().to_vec()))
        .await
        .unwrap();

    Reconciler::new(client, ReferenceLoader::new(store), options)
}

#[tokio::test]
async fn test_deletes_ids_missing_from_reference() {
    let mock = MockSearchService::new().with_documents([("A", "x"), ("B", "y")]);
    let reconciler = setup(&mock, "id,content\nA,x\n", ReconcileOptions::default()).await;

    let report = reconciler.run(BLOB).await.unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(report.referenced, 1);
    assert_eq!(report.deletion_set, vec!["B".to_string()]);
    assert_eq!(report.outcome, DeleteOutcome::Deleted { count: 1 });

    assert_eq!(
        mock.index_batches(),
        vec![json!({"value": [{"@search.action": "delete", "id": "B"}]})]
    );
    assert_eq!(mock.document_ids(), vec!["A".to_string()]);
}

#[tokio::test]
async fn test_identical_snapshots_send_no_delete() {
    let mock = MockSearchService::new().with_documents([("A", "x"), ("B", "y")]);
    let reconciler = setup(&mock, "id,content\nA,x\nB,y\n", ReconcileOptions::default()).await;

    let report = reconciler.run(BLOB).await.unwrap();

    assert!(report.deletion_set.is_empty());
    assert_eq!(report.outcome, DeleteOutcome::NothingToDelete);
    assert!(mock.index_batches().is_empty());
    assert_eq!(mock.requests().len(), 1, "only the search request is sent");
}

#[tokio::test]
async fn test_numeric_csv_ids_match_string_index_ids() {
    let mock = MockSearchService::new().with_documents([("5", "five"), ("6", "six")]);
    let reconciler = setup(&mock, "id,content\n5,five\n", ReconcileOptions::default()).await;

    let report = reconciler.run(BLOB).await.unwrap();

    assert_eq!(report.deletion_set, vec!["6".to_string()]);
}

#[tokio::test]
async fn test_failed_search_deletes_nothing() {
    let mock = MockSearchService::new()
        .with_documents([("A", "x"), ("B", "y")])
        .fail_search(403, "Forbidden");
    let reconciler = setup(&mock, "id,content\n", ReconcileOptions::default()).await;

    let report = reconciler.run(BLOB).await.unwrap();

    assert_eq!(report.indexed, 0);
    assert_eq!(report.outcome, DeleteOutcome::NothingToDelete);
    assert!(mock.index_batches().is_empty());
    assert_eq!(mock.document_ids().len(), 2);
}

#[tokio::test]
async fn test_missing_id_column_is_fatal_before_delete() {
    let mock = MockSearchService::new().with_documents([("A", "x")]);
    let reconciler = setup(&mock, "key,content\nZ,z\n", ReconcileOptions::default()).await;

    let err = reconciler.run(BLOB).await.unwrap_err();

    assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "id"));
    assert!(mock.index_batches().is_empty());
}

#[tokio::test]
async fn test_missing_blob_is_fatal() {
    let mock = MockSearchService::new().with_documents([("A", "x")]);
    let reconciler = setup(&mock, "id,content\n", ReconcileOptions::default()).await;

    let err = reconciler.run("other.csv").await.unwrap_err();

    assert!(matches!(err, LoadError::Storage { .. }));
    assert!(mock.index_batches().is_empty());
}

#[tokio::test]
async fn test_failed_delete_is_reported_not_raised() {
    let mock = MockSearchService::new()
        .with_documents([("A", "x"), ("B", "y")])
        .fail_delete(400, r#"{"error":{"message":"bad batch"}}"#);
    let reconciler = setup(&mock, "id,content\nA,x\n", ReconcileOptions::default()).await;

    let report = reconciler.run(BLOB).await.unwrap();

    match report.outcome {
        DeleteOutcome::DeleteFailed { status, message } => {
            assert_eq!(status, Some(400));
            assert!(message.contains("bad batch"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(mock.document_ids().len(), 2);
}

#[tokio::test]
async fn test_dry_run_sends_no_delete() {
    let mock = MockSearchService::new().with_documents([("A", "x"), ("B", "y"), ("C", "z")]);
    let options = ReconcileOptions {
        dry_run: true,
        ..Default::default()
    };
    let reconciler = setup(&mock, "id,content\nB,y\n", options).await;

    let report = reconciler.run(BLOB).await.unwrap();

    assert_eq!(report.deletion_set, vec!["A".to_string(), "C".to_string()]);
    assert_eq!(report.outcome, DeleteOutcome::DryRun { count: 2 });
    assert!(mock.index_batches().is_empty());
}

#[tokio::test]
async fn test_delete_batch_preserves_index_order() {
    let mock = MockSearchService::new()
        .with_documents([("z", "1"), ("m", "2"), ("a", "3"), ("keep", "4")]);
    let reconciler = setup(&mock, "id,content\nkeep,4\n", ReconcileOptions::default()).await;

    reconciler.run(BLOB).await.unwrap();

    let batch = &mock.index_batches()[0];
    let ids: Vec<&str> = batch["value"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["z", "m", "a"]);
}
