use futures_util::{FutureExt as _, future::BoxFuture};

use crate::{
    foundation::{
        core::{FeatureArray, FeatureDataType, finite_extrema},
        error::ColorizerResult,
    },
    io::fetch::FetchClient,
    loaders::{ArrayLoader, ArraySource, decode},
};

/// Array decoded from an image whose RGBA channels pack one `u32` per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedArraySource {
    values: Vec<u32>,
    min: u32,
    max: u32,
}

impl PackedArraySource {
    pub fn parse(bytes: &[u8]) -> ColorizerResult<Self> {
        let raster = decode::decode_packed_image(bytes)?;
        Ok(Self::from_values(raster.values))
    }

    pub fn from_values(values: Vec<u32>) -> Self {
        let (min, max) = finite_extrema(values.iter().map(|&v| f64::from(v))).unwrap_or((0.0, 0.0));
        Self {
            values,
            min: min as u32,
            max: max as u32,
        }
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }
}

impl ArraySource for PackedArraySource {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn buffer(&self, ty: FeatureDataType) -> FeatureArray {
        FeatureArray::from_u32_values(ty, &self.values)
    }

    fn min(&self) -> f32 {
        self.min as f32
    }

    fn max(&self) -> f32 {
        self.max as f32
    }
}

/// Loads arrays stored as packed RGBA images.
#[derive(Clone, Debug)]
pub struct PackedImageArrayLoader {
    client: FetchClient,
}

impl PackedImageArrayLoader {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

impl ArrayLoader for PackedImageArrayLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<Box<dyn ArraySource>>> {
        async move {
            let bytes = self.client.get(url).await?;
            let source = PackedArraySource::parse(&bytes)?;
            tracing::debug!(url, len = source.len(), "loaded packed image array");
            Ok(Box::new(source) as Box<dyn ArraySource>)
        }
        .boxed()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/loaders/packed_image.rs"]
mod tests;
