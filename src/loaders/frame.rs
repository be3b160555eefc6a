use std::collections::BTreeSet;

use futures_util::{FutureExt as _, future::BoxFuture};

use crate::{
    foundation::{
        core::Resolution,
        error::{ColorizerError, ColorizerResult},
        texture::{Texture, TextureDesc, TextureFormat, TextureLedger},
    },
    io::fetch::FetchClient,
    loaders::{FrameLoader, decode},
};

/// Raw pixel values below this are reserved; 0 is background.
pub const RESERVED_INDICES: u32 = 1;

/// One decoded label image. Each texel is the raw pixel value of an `R32Uint` texture.
#[derive(Debug)]
pub struct Frame {
    resolution: Resolution,
    ids: Texture,
}

impl Frame {
    /// Build a frame from row-major raw pixel values.
    pub fn from_raw_values(width: u32, height: u32, values: Vec<u32>) -> ColorizerResult<Self> {
        let resolution = Resolution::new(width, height);
        if values.len() != resolution.pixels() {
            return Err(ColorizerError::validation(format!(
                "frame has {} pixels, expected {width}x{height}",
                values.len()
            )));
        }
        let desc = TextureDesc {
            width: width.max(1),
            height: height.max(1),
            format: TextureFormat::R32Uint,
        };
        let mut texels: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        texels.resize(desc.byte_len(), 0);
        Ok(Self {
            resolution,
            ids: Texture::new(desc, texels),
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn texture(&self) -> &Texture {
        &self.ids
    }

    pub(crate) fn attach(&mut self, ledger: &std::sync::Arc<TextureLedger>) {
        self.ids.attach(ledger);
    }

    /// Release the frame's GPU residency. Returns `true` only the first time.
    pub fn release(&self) -> bool {
        self.ids.release()
    }

    pub fn raw_value_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.resolution.width || y >= self.resolution.height {
            return None;
        }
        self.ids.texel_u32(x, y)
    }

    /// Object id under pixel `(x, y)`, or `None` for background and out-of-frame pixels.
    pub fn object_id_at(&self, x: u32, y: u32) -> Option<u32> {
        self.raw_value_at(x, y)?.checked_sub(RESERVED_INDICES)
    }

    /// Distinct object ids present in the frame, ascending.
    pub fn object_ids(&self) -> BTreeSet<u32> {
        self.ids
            .texels()
            .chunks_exact(4)
            .take(self.resolution.pixels())
            .filter_map(|b| {
                u32::from_le_bytes([b[0], b[1], b[2], b[3]]).checked_sub(RESERVED_INDICES)
            })
            .collect()
    }
}

/// Loads label frames from PNG (or any decodable) images.
#[derive(Clone, Debug)]
pub struct ImageFrameLoader {
    client: FetchClient,
}

impl ImageFrameLoader {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

impl FrameLoader for ImageFrameLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ColorizerResult<Frame>> {
        async move {
            let bytes = self.client.get(url).await?;
            let raster = decode::decode_label_image(&bytes)?;
            Frame::from_raw_values(raster.width, raster.height, raster.values)
        }
        .boxed()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/loaders/frame.rs"]
mod tests;
