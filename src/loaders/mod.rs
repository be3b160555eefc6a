//! Array and frame loaders.
//!
//! Two independent resource kinds share the same fetch-then-decode contract:
//! - feature/auxiliary arrays, exposed through [`ArraySource`],
//! - label frames, decoded into [`frame::Frame`].

use futures_util::future::BoxFuture;

use crate::foundation::{
    core::{FeatureArray, FeatureDataType},
    error::ColorizerResult,
    texture::Texture,
};

pub mod decode;
pub mod frame;
pub mod json_array;
pub mod packed_image;

/// A named numeric array, independent of its on-disk encoding.
pub trait ArraySource: Send + Sync + std::fmt::Debug {
    /// Number of elements.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CPU buffer with every element converted to `ty`.
    fn buffer(&self, ty: FeatureDataType) -> FeatureArray;

    /// Upload-ready texture holding the same values as [`ArraySource::buffer`].
    fn texture(&self, ty: FeatureDataType) -> Texture {
        Texture::from_array(&self.buffer(ty))
    }

    /// Smallest value, ignoring "no data" entries.
    fn min(&self) -> f32;

    /// Largest value, ignoring "no data" entries.
    fn max(&self) -> f32;
}

/// Fetches a URL and decodes it into an [`ArraySource`].
pub trait ArrayLoader: Send + Sync {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<Box<dyn ArraySource>>>;
}

/// Fetches a URL and decodes it into a label [`frame::Frame`].
pub trait FrameLoader: Send + Sync {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<frame::Frame>>;
}
