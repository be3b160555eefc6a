#![forbid(unsafe_code)]

//! Dataset loading and frame caching for segmented time-lapse microscopy viewers.
//!
//! A [`Dataset`] is opened from a base URL holding a `manifest.json`. Opening loads every
//! feature array and per-object array; frames (label images whose pixels encode object ids) are
//! loaded on demand through a bounded [`FrameCache`]. Tracks are rebuilt from the per-object
//! arrays on request.

pub mod config;
pub mod data;
pub mod foundation;
pub mod io;
pub mod loaders;

pub use config::DatasetOpts;
pub use data::{
    collection::{Collection, CollectionEntry},
    dataset::{Dataset, FeatureData, TrackPlot},
    frame_cache::FrameCache,
    manifest::{DatasetManifest, FeatureMetadata},
    object_table::ObjectTable,
    track::{Track, TrackPoint},
};
pub use foundation::core::{FeatureArray, FeatureDataType, Resolution};
pub use foundation::error::{ColorizerError, ColorizerResult};
pub use foundation::texture::{LedgerStats, Texture, TextureFormat, TextureLedger};
pub use io::fetch::{FetchClient, Fetcher, FsFetcher, HttpFetcher, MemoryFetcher};
pub use loaders::{
    ArrayLoader, ArraySource, FrameLoader,
    frame::{Frame, ImageFrameLoader},
    json_array::JsonArrayLoader,
    packed_image::PackedImageArrayLoader,
};
