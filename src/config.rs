use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::io::fetch::DEFAULT_FETCH_TIMEOUT_MS;

/// Frames kept resident by default.
pub const MAX_CACHED_FRAMES: usize = 60;

/// Applied to raw centroid coordinates before they reach a [`crate::Track`].
pub const DEFAULT_CENTROID_SCALE_FACTOR: f32 = 0.25;

pub const DEFAULT_MANIFEST_FILENAME: &str = "manifest.json";

/// Options for opening a [`crate::Dataset`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetOpts {
    /// Frame cache capacity. Values below 1 are treated as 1.
    pub max_cached_frames: usize,
    /// Abort budget for every fetch, in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Multiplier for centroid coordinates. Centroid data and frame pixels are known to disagree
    /// in resolution for some datasets; this stays configurable until that is settled.
    pub centroid_scale_factor: f32,
    /// Manifest file name under the dataset base URL.
    pub manifest_filename: String,
}

impl Default for DatasetOpts {
    fn default() -> Self {
        Self {
            max_cached_frames: MAX_CACHED_FRAMES,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            centroid_scale_factor: DEFAULT_CENTROID_SCALE_FACTOR,
            manifest_filename: DEFAULT_MANIFEST_FILENAME.to_string(),
        }
    }
}

impl DatasetOpts {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
