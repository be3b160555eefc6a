use std::{sync::Arc, time::Duration};

use super::*;
use crate::io::fetch::MemoryFetcher;

const BODY: &[u8] = br#"[
    {"name": "Mama Bear", "path": "mama_bear/"},
    {"name": "Baby Bear", "path": "https://example.org/data/baby_bear"},
    {"name": "Mama Bear", "path": "shadowed"}
]"#;

#[test]
fn relative_paths_resolve_against_collection_dir() {
    let c = Collection::parse(BODY, "https://example.org/sets/collection.json").unwrap();
    assert_eq!(c.len(), 3);
    assert_eq!(
        c.dataset_url("Mama Bear"),
        Some("https://example.org/sets/mama_bear/")
    );
    assert_eq!(
        c.dataset_url("Baby Bear"),
        Some("https://example.org/data/baby_bear")
    );
    assert_eq!(c.dataset_url("Papa Bear"), None);
    assert_eq!(c.names(), vec!["Mama Bear", "Baby Bear", "Mama Bear"]);
    assert_eq!(c.url(), Some("https://example.org/sets/collection.json"));
}

#[test]
fn malformed_collection_is_a_decode_error() {
    let err = Collection::parse(br#"{"name": "x"}"#, "c.json").unwrap_err();
    assert!(matches!(err, ColorizerError::Decode(_)));
}

#[test]
fn single_dataset_is_named_after_its_url() {
    let c = Collection::single("data/ds/ ");
    assert_eq!(c.names(), vec!["data/ds"]);
    assert!(c.url().is_none());

    let ds = c.dataset("data/ds", DatasetOpts::default()).unwrap();
    assert_eq!(ds.base_url(), "data/ds");
    assert!(c.dataset("other", DatasetOpts::default()).is_err());
}

#[tokio::test]
async fn from_url_fetches_only_json() {
    let mem = Arc::new(MemoryFetcher::new());
    mem.insert("mem://root/collection.json", BODY.to_vec());
    let client = FetchClient::new(mem.clone(), Duration::from_secs(1));

    let c = Collection::from_url("mem://root/collection.json", &client)
        .await
        .unwrap();
    assert_eq!(c.dataset_url("Mama Bear"), Some("mem://root/mama_bear/"));

    let single = Collection::from_url("mem://root/ds", &client).await.unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(mem.total_requests(), 1);
}
