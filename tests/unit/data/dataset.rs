use std::time::Duration;

use serde_json::json;

use super::*;
use crate::{io::fetch::MemoryFetcher, loaders::decode};

fn seeded() -> Arc<MemoryFetcher> {
    let mem = Arc::new(MemoryFetcher::new());
    mem.insert_json(
        "mem://ds/manifest.json",
        &json!({
            "frames": ["f0.png", "f1.png"],
            "features": {"area": "area.json", "speed": "speed.json"},
            "featureMetadata": {"area": {"units": "px"}},
            "tracks": "tracks.json",
            "times": "times.json",
            "centroids": "centroids.json",
            "outliers": "outliers.json"
        }),
    );
    mem.insert_json("mem://ds/area.json", &json!({"data": [10, 20, 30], "min": 0, "max": 100}));
    mem.insert_json("mem://ds/speed.json", &json!([0.5, null, 2.5]));
    mem.insert_json("mem://ds/tracks.json", &json!([5, 5, 7]));
    mem.insert_json("mem://ds/times.json", &json!([0, 1, 1]));
    mem.insert_json("mem://ds/centroids.json", &json!([4, 8, 12, 16, 20, 24]));
    mem.insert_json("mem://ds/outliers.json", &json!([false, true, false]));
    mem.insert(
        "mem://ds/f0.png",
        decode::encode_label_png(2, 2, &[0, 1, 2, 3]).unwrap(),
    );
    mem.insert(
        "mem://ds/f1.png",
        decode::encode_label_png(3, 1, &[3, 0, 0]).unwrap(),
    );
    mem
}

fn dataset(mem: &Arc<MemoryFetcher>) -> Dataset {
    let client = FetchClient::new(mem.clone(), Duration::from_secs(2));
    Dataset::with_client("mem://ds/", DatasetOpts::default(), client)
}

#[tokio::test]
async fn open_populates_features_and_object_table() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    assert!(ds.is_open());
    assert_eq!(ds.number_of_frames(), 2);
    assert_eq!(ds.feature_names(), vec!["area", "speed"]);
    assert!(ds.has_feature("area") && !ds.has_feature("volume"));
    assert_eq!(ds.feature_units("area"), Some("px"));
    assert_eq!(ds.feature_units("speed"), None);

    let area = ds.get_feature_data("area").unwrap();
    assert_eq!(area.data, vec![10.0, 20.0, 30.0]);
    assert_eq!((area.min, area.max), (0.0, 100.0));
    let speed = ds.get_feature_data("speed").unwrap();
    assert_eq!((speed.min, speed.max), (0.5, 2.5));

    assert_eq!(ds.objects().count(), 3);
    assert_eq!(ds.is_outlier(1), Some(true));
    assert!(ds.outliers_texture().is_some());
    assert!(ds.bounds().is_none());
    assert_eq!(ds.frame_resolution(), Resolution::new(1, 1));
}

#[tokio::test]
async fn open_is_idempotent() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();
    let after_first = mem.total_requests();
    ds.open().await.unwrap();
    assert_eq!(mem.total_requests(), after_first);
    assert_eq!(mem.request_count("mem://ds/manifest.json"), 1);
}

#[tokio::test]
async fn tracks_follow_the_parallel_arrays() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    let five = ds.build_track(5);
    assert_eq!(five.ids(), &[0, 1]);
    assert_eq!(five.times(), &[0, 1]);
    assert_eq!(five.centroids(), &[[1.0, 2.0], [3.0, 4.0]]);
    assert!(five.bounds().is_empty());
    assert_eq!(five, ds.build_track(5));

    let seven = ds.build_track(7);
    assert_eq!(seven.ids(), &[2]);
    assert_eq!(seven.times(), &[1]);

    assert!(ds.build_track(99).is_empty());
}

#[tokio::test]
async fn sentinel_and_option_lookups() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    assert_eq!(ds.get_time(2), 1);
    assert_eq!(ds.get_track_id(0), 5);
    assert_eq!(ds.get_time(3), 0);
    assert_eq!(ds.time_of(3), None);
    assert_eq!(ds.time_of(0), Some(0));
    assert_eq!(ds.track_id_of(17), None);
}

#[tokio::test]
async fn feature_plot_pairs_times_with_values() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    let track = ds.build_track(5);
    let plot = ds.build_track_feature_plot(&track, "area").unwrap();
    assert_eq!(plot.domain, vec![0, 1]);
    assert_eq!(plot.range, vec![10.0, 20.0]);
    assert!(ds.build_track_feature_plot(&track, "volume").is_none());
}

#[tokio::test]
async fn frames_load_once_and_record_resolution() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    let f1 = ds.load_frame(1).await.unwrap().unwrap();
    assert_eq!(ds.frame_resolution(), Resolution::new(3, 1));
    assert_eq!(f1.object_id_at(0, 0), Some(2));

    let again = ds.load_frame(1).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&f1, &again));
    assert_eq!(mem.request_count("mem://ds/f1.png"), 1);
    assert_eq!(ds.cached_frames(), 1);
}

#[tokio::test]
async fn out_of_range_frames_touch_nothing() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    assert!(ds.load_frame(0).await.unwrap().is_none());

    ds.open().await.unwrap();
    let before = mem.total_requests();
    assert!(ds.load_frame(-1).await.unwrap().is_none());
    assert!(ds.load_frame(2).await.unwrap().is_none());
    assert!(ds.load_frame(i64::MAX).await.unwrap().is_none());
    assert_eq!(mem.total_requests(), before);
}

#[tokio::test]
async fn concurrent_frame_requests_share_one_load() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    let (a, b) = tokio::join!(ds.load_frame(0), ds.load_frame(0));
    let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(mem.request_count("mem://ds/f0.png"), 1);
    assert_eq!(ds.texture_ledger().stats().uploads, 4); // 2 features, outliers, 1 frame
}

#[tokio::test]
async fn failed_frame_load_is_not_cached() {
    let mem = seeded();
    mem.insert("mem://ds/f1.png", b"not an image".to_vec());
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    let err = ds.load_frame(1).await.unwrap_err();
    assert!(matches!(err, ColorizerError::Shared(_)));
    assert!(ds.load_frame(1).await.is_err());
    assert_eq!(mem.request_count("mem://ds/f1.png"), 2);
    assert_eq!(ds.cached_frames(), 0);
}

#[tokio::test]
async fn picking_resolves_tracks() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();
    let frame = ds.load_frame(0).await.unwrap().unwrap();

    assert_eq!(ds.pick_object(&frame, 0, 0), None);
    assert_eq!(ds.pick_object(&frame, 1, 0), Some(0));
    let track = ds.pick_track(&frame, 1, 1).unwrap();
    assert_eq!(track.track_id(), 7);
    assert!(ds.pick_track(&frame, 0, 0).is_none());
}

#[tokio::test]
async fn optional_failures_leave_fields_unset() {
    let mem = seeded();
    mem.insert("mem://ds/tracks.json", b"{{{".to_vec());
    mem.insert_json(
        "mem://ds/centroids.json",
        &json!([1, 2]), // too short for three objects
    );
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    assert!(ds.track_ids().is_none());
    assert!(ds.centroids().is_none());
    assert_eq!(ds.times(), Some(&[0, 1, 1][..]));
    assert!(ds.build_track(5).is_empty());
    assert_eq!(ds.get_track_id(0), 0);
}

#[tokio::test]
async fn failed_feature_stays_declared_without_data() {
    let mem = seeded();
    mem.insert("mem://ds/speed.json", b"{{{".to_vec());
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    assert_eq!(ds.feature_names(), vec!["area", "speed"]);
    assert!(ds.has_feature("speed"));
    assert!(ds.get_feature_data("speed").is_none());
    assert!(ds.get_feature_data("area").is_some());
    assert!(ds.build_track_feature_plot(&ds.build_track(5), "speed").is_none());
}

#[tokio::test]
async fn missing_times_default_track_times_to_zero() {
    let mem = Arc::new(MemoryFetcher::new());
    mem.insert_json(
        "mem://ds/manifest.json",
        &json!({"frames": [], "features": {}, "tracks": "tracks.json"}),
    );
    mem.insert_json("mem://ds/tracks.json", &json!([1, 2, 1]));
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();

    let track = ds.build_track(1);
    assert_eq!(track.ids(), &[0, 2]);
    assert_eq!(track.times(), &[0, 0]);
    assert!(ds.load_frame(0).await.unwrap().is_none());
}

#[tokio::test]
async fn manifest_failures_propagate_and_allow_retry() {
    let mem = seeded();
    mem.insert("mem://ds/manifest.json", b"[]".to_vec());
    let mut ds = dataset(&mem);

    let err = ds.open().await.unwrap_err();
    assert!(matches!(err, ColorizerError::Manifest(_)));
    assert!(!ds.is_open());
    assert_eq!(ds.number_of_frames(), 0);

    mem.insert_json(
        "mem://ds/manifest.json",
        &json!({"frames": ["f0.png"], "features": {}}),
    );
    ds.open().await.unwrap();
    assert_eq!(ds.number_of_frames(), 1);
}

#[tokio::test]
async fn missing_manifest_is_a_fetch_error() {
    let mem = Arc::new(MemoryFetcher::new());
    let mut ds = dataset(&mem);
    let err = ds.open().await.unwrap_err();
    assert!(matches!(err, ColorizerError::Fetch { .. }));
}

#[tokio::test]
async fn dispose_releases_every_texture() {
    let mem = seeded();
    let mut ds = dataset(&mem);
    ds.open().await.unwrap();
    ds.load_frame(0).await.unwrap();
    ds.load_frame(1).await.unwrap();
    assert_eq!(ds.texture_ledger().stats().live_textures, 5);

    ds.dispose();
    ds.dispose();
    let stats = ds.texture_ledger().stats();
    assert_eq!(stats.live_textures, 0);
    assert_eq!(stats.live_bytes, 0);
    assert_eq!(stats.releases, 5);

    assert!(matches!(ds.load_frame(0).await, Err(ColorizerError::Disposed)));
    assert!(matches!(ds.open().await, Err(ColorizerError::Disposed)));
}

#[test]
fn dispose_before_open_is_safe() {
    let mem = Arc::new(MemoryFetcher::new());
    let mut ds = dataset(&mem);
    ds.dispose();
    assert!(ds.is_disposed());
    assert_eq!(ds.texture_ledger().stats(), Default::default());
}
