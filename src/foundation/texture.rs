use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
};

use crate::foundation::core::{FeatureArray, FeatureDataType};

/// Texel format of an uploadable texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8Uint,
    R16Uint,
    R32Uint,
    R32Float,
}

impl TextureFormat {
    pub fn bytes_per_texel(self) -> usize {
        match self {
            Self::R8Uint => 1,
            Self::R16Uint => 2,
            Self::R32Uint | Self::R32Float => 4,
        }
    }
}

impl From<FeatureDataType> for TextureFormat {
    fn from(ty: FeatureDataType) -> Self {
        match ty {
            FeatureDataType::U8 => Self::R8Uint,
            FeatureDataType::U16 => Self::R16Uint,
            FeatureDataType::U32 => Self::R32Uint,
            FeatureDataType::F32 => Self::R32Float,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.format.bytes_per_texel())
    }
}

/// Snapshot of [`TextureLedger`] counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub live_textures: usize,
    pub live_bytes: usize,
    pub uploads: u64,
    pub releases: u64,
}

/// Accounts for every texture currently resident on the GPU side.
///
/// There is no automatic reclamation of GPU memory: a texture stays counted here until its owner
/// calls [`Texture::release`] (or drops it).
#[derive(Debug, Default)]
pub struct TextureLedger {
    live_textures: AtomicUsize,
    live_bytes: AtomicUsize,
    uploads: AtomicU64,
    releases: AtomicU64,
}

impl TextureLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            live_textures: self.live_textures.load(Ordering::Acquire),
            live_bytes: self.live_bytes.load(Ordering::Acquire),
            uploads: self.uploads.load(Ordering::Acquire),
            releases: self.releases.load(Ordering::Acquire),
        }
    }

    fn acquire(&self, bytes: usize) {
        self.live_textures.fetch_add(1, Ordering::AcqRel);
        self.live_bytes.fetch_add(bytes, Ordering::AcqRel);
        self.uploads.fetch_add(1, Ordering::AcqRel);
    }

    fn give_back(&self, bytes: usize) {
        self.live_textures.fetch_sub(1, Ordering::AcqRel);
        self.live_bytes.fetch_sub(bytes, Ordering::AcqRel);
        self.releases.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Default)]
struct Residency {
    ledger: Option<Arc<TextureLedger>>,
    bytes: usize,
    released: AtomicBool,
}

impl Residency {
    fn release(&self) -> bool {
        let Some(ledger) = &self.ledger else {
            return false;
        };
        if self
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        ledger.give_back(self.bytes);
        true
    }
}

impl Drop for Residency {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owning handle for an upload-ready 2D texture.
///
/// Texels stay readable on the CPU side after release; release only ends GPU residency.
#[derive(Debug)]
pub struct Texture {
    desc: TextureDesc,
    texels: Arc<[u8]>,
    residency: Residency,
}

impl Texture {
    /// Build a texture from tightly packed little-endian texels.
    pub fn new(desc: TextureDesc, texels: Vec<u8>) -> Self {
        debug_assert_eq!(texels.len(), desc.byte_len());
        Self {
            desc,
            texels: Arc::from(texels),
            residency: Residency::default(),
        }
    }

    /// Lay `array` out on a near-square grid, zero padding the last row.
    pub fn from_array(array: &FeatureArray) -> Self {
        let (width, height) = grid_dims(array.len());
        let format = TextureFormat::from(array.data_type());
        let desc = TextureDesc {
            width,
            height,
            format,
        };
        let mut texels = array.to_le_bytes();
        texels.resize(desc.byte_len(), 0);
        Self::new(desc, texels)
    }

    pub fn desc(&self) -> TextureDesc {
        self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn texels(&self) -> &[u8] {
        &self.texels
    }

    /// Register this texture as resident with `ledger`. A second attach is ignored.
    pub fn attach(&mut self, ledger: &Arc<TextureLedger>) {
        if self.residency.ledger.is_some() {
            return;
        }
        let bytes = self.desc.byte_len();
        ledger.acquire(bytes);
        self.residency = Residency {
            ledger: Some(Arc::clone(ledger)),
            bytes,
            released: AtomicBool::new(false),
        };
    }

    pub fn is_attached(&self) -> bool {
        self.residency.ledger.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.residency.released.load(Ordering::Acquire)
    }

    /// Release GPU residency. Returns `true` only for the call that actually released.
    pub fn release(&self) -> bool {
        self.residency.release()
    }

    /// Read the `R32Uint` texel at `(x, y)`.
    pub fn texel_u32(&self, x: u32, y: u32) -> Option<u32> {
        if self.desc.format != TextureFormat::R32Uint
            || x >= self.desc.width
            || y >= self.desc.height
        {
            return None;
        }
        let i = (y as usize * self.desc.width as usize + x as usize) * 4;
        let bytes: [u8; 4] = self.texels.get(i..i + 4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }
}

/// Near-square `(width, height)` holding `len` texels; never zero-sized.
pub fn grid_dims(len: usize) -> (u32, u32) {
    if len == 0 {
        return (1, 1);
    }
    let width = (len as f64).sqrt().ceil() as usize;
    let height = len.div_ceil(width);
    (width.max(1) as u32, height.max(1) as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/texture.rs"]
mod tests;
