//! Typed records over testkit stores.

use std::sync::Arc;

use thrap::{ChainedRecords, RecordStorage, RefStore};
use thrap_store::SqliteEngine;
use thrap_testkit::Record;

#[tokio::test]
async fn test_record_revisions_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let engine = SqliteEngine::open(dir.path().join("records.db")).unwrap();
    let records: ChainedRecords<Record, _> =
        ChainedRecords::new(Arc::new(RefStore::new(engine)), "records").unwrap();

    records.create("r1", Record::new("r1", 0)).await.unwrap();
    for revision in 1..5 {
        let version = records
            .update("r1", Record::new("r1", revision))
            .await
            .unwrap();
        assert_eq!(version.height, u64::from(revision) + 1);
    }

    let revisions: Vec<u32> = records
        .history("r1")
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.record.revision)
        .collect();
    assert_eq!(revisions, vec![4, 3, 2, 1, 0]);
}

#[test]
fn test_record_json_shape() {
    let mut record = Record::new("r1", 3);
    record.tags.push("prod".to_string());
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"id": "r1", "revision": 3, "tags": ["prod"]})
    );
}
