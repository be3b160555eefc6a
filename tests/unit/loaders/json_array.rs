use std::{sync::Arc, time::Duration};

use super::*;
use crate::io::fetch::MemoryFetcher;

#[test]
fn bare_array_computes_extrema() {
    let src = JsonArraySource::parse(b"[3, -1.5, 8, 0]").unwrap();
    assert_eq!(src.len(), 4);
    assert_eq!(src.min(), -1.5);
    assert_eq!(src.max(), 8.0);
    assert_eq!(
        src.buffer(FeatureDataType::F32),
        FeatureArray::F32(vec![3.0, -1.5, 8.0, 0.0])
    );
}

#[test]
fn wrapped_array_uses_provided_extrema_verbatim() {
    let src = JsonArraySource::parse(br#"{"data": [1, 2, 3], "min": 0, "max": 10}"#).unwrap();
    assert_eq!(src.min(), 0.0);
    assert_eq!(src.max(), 10.0);
}

#[test]
fn wrapped_array_without_extrema_falls_back_to_computed() {
    let src = JsonArraySource::parse(br#"{"data": [5, 2, 9]}"#).unwrap();
    assert_eq!((src.min(), src.max()), (2.0, 9.0));
}

#[test]
fn booleans_and_nulls() {
    let src =
        JsonArraySource::parse(br#"{"data": [true, false, null, true], "min": false, "max": true}"#)
            .unwrap();
    assert_eq!(src.buffer(FeatureDataType::U8), FeatureArray::U8(vec![1, 0, 0, 1]));
    assert_eq!((src.min(), src.max()), (0.0, 1.0));
    assert!(src.values()[2].is_nan());
}

#[test]
fn nulls_are_ignored_for_computed_extrema() {
    let src = JsonArraySource::parse(b"[null, 4, null, 2]").unwrap();
    assert_eq!((src.min(), src.max()), (2.0, 4.0));

    let empty = JsonArraySource::parse(b"[null]").unwrap();
    assert_eq!((empty.min(), empty.max()), (0.0, 0.0));
}

#[test]
fn integer_views_of_the_same_data() {
    let src = JsonArraySource::parse(b"[5, 5, 7]").unwrap();
    assert_eq!(src.buffer(FeatureDataType::U32), FeatureArray::U32(vec![5, 5, 7]));
    assert_eq!(src.buffer(FeatureDataType::U16), FeatureArray::U16(vec![5, 5, 7]));

    let tex = src.texture(FeatureDataType::U32);
    assert_eq!((tex.width(), tex.height()), (2, 2));
}

#[test]
fn wrong_shape_is_a_decode_error() {
    let err = JsonArraySource::parse(br#"{"values": [1]}"#).unwrap_err();
    assert!(matches!(err, ColorizerError::Decode(_)));
    assert!(JsonArraySource::parse(br#"["a", "b"]"#).is_err());
}

#[tokio::test]
async fn loader_fetches_and_parses() {
    let mem = Arc::new(MemoryFetcher::new());
    mem.insert("mem://ds/area.json", br#"{"data": [1.5, 2.5]}"#.to_vec());
    let loader = JsonArrayLoader::new(FetchClient::new(mem.clone(), Duration::from_secs(1)));

    let src = loader.load("mem://ds/area.json").await.unwrap();
    assert_eq!(src.len(), 2);
    assert_eq!(src.max(), 2.5);
    assert_eq!(mem.request_count("mem://ds/area.json"), 1);

    assert!(loader.load("mem://ds/missing.json").await.is_err());
}
