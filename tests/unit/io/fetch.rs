use super::*;

#[test]
fn format_path_strips_one_trailing_slash_and_whitespace() {
    assert_eq!(format_path("  https://x.org/data/ "), "https://x.org/data");
    assert_eq!(format_path("data"), "data");
    assert_eq!(format_path(""), "");
}

#[test]
fn resolve_url_joins_with_single_slash() {
    assert_eq!(resolve_url("https://x.org/ds/", "manifest.json"), "https://x.org/ds/manifest.json");
    assert_eq!(resolve_url("/tmp/ds", "f0.png"), "/tmp/ds/f0.png");
}

#[test]
fn url_classification() {
    assert!(is_url("http://a"));
    assert!(is_url("https://a"));
    assert!(is_url("//cdn.example/a"));
    assert!(!is_url("datasets/a"));
    assert!(!is_url("/abs/path"));

    assert!(is_json("collection.json"));
    assert!(!is_json("collection.json/"));
    assert!(!is_json("frame.png"));
}

#[test]
fn parent_url_drops_last_segment() {
    assert_eq!(parent_url("https://x.org/c/collection.json"), "https://x.org/c");
    assert_eq!(parent_url("collection.json"), ".");
}

#[tokio::test]
async fn memory_fetcher_counts_requests() {
    let mem = Arc::new(MemoryFetcher::new());
    mem.insert("mem://a", b"abc".to_vec());
    let client = FetchClient::new(mem.clone(), Duration::from_millis(50));

    assert_eq!(client.get("mem://a").await.unwrap(), b"abc");
    assert!(client.get("mem://missing").await.is_err());
    assert_eq!(mem.request_count("mem://a"), 1);
    assert_eq!(mem.request_count("mem://missing"), 1);
    assert_eq!(mem.total_requests(), 2);
}

#[tokio::test]
async fn get_json_reports_decode_errors() {
    let mem = Arc::new(MemoryFetcher::new());
    mem.insert("mem://bad.json", b"{not json".to_vec());
    let client = FetchClient::new(mem, Duration::from_millis(50));

    let err = client
        .get_json::<serde_json::Value>("mem://bad.json")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("decode error:"));
}
