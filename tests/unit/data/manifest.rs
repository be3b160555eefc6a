use super::*;

#[test]
fn minimal_manifest_leaves_optional_files_unset() {
    let m = DatasetManifest::parse(br#"{"frames": ["f0.png"], "features": {}}"#).unwrap();
    assert_eq!(m.frames, vec!["f0.png"]);
    assert!(m.features.is_empty());
    assert!(m.tracks.is_none() && m.times.is_none() && m.centroids.is_none());
    assert!(m.feature_metadata.is_empty());
}

#[test]
fn full_manifest_with_metadata_and_unknown_fields() {
    let m = DatasetManifest::parse(
        br#"{
            "frames": ["f0.png", "f1.png"],
            "features": {"area": "area.json", "speed": "speed.png"},
            "featureMetadata": {"area": {"units": "um^2"}},
            "tracks": "tracks.json",
            "times": "times.json",
            "centroids": "centroids.json",
            "bounds": "bounds.json",
            "outliers": "outliers.json",
            "version": 3
        }"#,
    )
    .unwrap();
    assert_eq!(m.features.keys().collect::<Vec<_>>(), vec!["area", "speed"]);
    assert_eq!(m.feature_metadata["area"].units, "um^2");
    assert_eq!(m.bounds.as_deref(), Some("bounds.json"));
}

#[test]
fn missing_required_fields_is_a_manifest_error() {
    let err = DatasetManifest::parse(br#"{"frames": []}"#).unwrap_err();
    assert!(matches!(err, ColorizerError::Manifest(_)));
    assert!(err.to_string().starts_with("manifest error:"));

    assert!(DatasetManifest::parse(b"not json").is_err());
}

#[test]
fn blank_paths_are_rejected() {
    assert!(DatasetManifest::parse(br#"{"frames": [" "], "features": {}}"#).is_err());
    assert!(DatasetManifest::parse(br#"{"frames": [], "features": {"a": ""}}"#).is_err());
}
