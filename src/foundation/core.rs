use serde::{Deserialize, Serialize};

/// Element type requested from an array source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureDataType {
    /// 8-bit unsigned integer (outlier masks).
    U8,
    /// 16-bit unsigned integer (centroids, bounds).
    U16,
    /// 32-bit unsigned integer (track ids, times).
    U32,
    /// 32-bit float (feature values).
    F32,
}

impl FeatureDataType {
    /// Size of one element in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// CPU-side typed buffer produced by an array source.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureArray {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl FeatureArray {
    /// Convert `values` to `ty` with `as` semantics (saturating, NaN becomes 0 for integers).
    pub fn from_f64_values(ty: FeatureDataType, values: &[f64]) -> Self {
        match ty {
            FeatureDataType::U8 => Self::U8(values.iter().map(|&v| v as u8).collect()),
            FeatureDataType::U16 => Self::U16(values.iter().map(|&v| v as u16).collect()),
            FeatureDataType::U32 => Self::U32(values.iter().map(|&v| v as u32).collect()),
            FeatureDataType::F32 => Self::F32(values.iter().map(|&v| v as f32).collect()),
        }
    }

    /// Convert raw `u32` payloads to `ty`. Narrowing keeps the low bits, floats convert
    /// numerically.
    pub fn from_u32_values(ty: FeatureDataType, values: &[u32]) -> Self {
        match ty {
            FeatureDataType::U8 => Self::U8(values.iter().map(|&v| v as u8).collect()),
            FeatureDataType::U16 => Self::U16(values.iter().map(|&v| v as u16).collect()),
            FeatureDataType::U32 => Self::U32(values.to_vec()),
            FeatureDataType::F32 => Self::F32(values.iter().map(|&v| v as f32).collect()),
        }
    }

    pub fn data_type(&self) -> FeatureDataType {
        match self {
            Self::U8(_) => FeatureDataType::U8,
            Self::U16(_) => FeatureDataType::U16,
            Self::U32(_) => FeatureDataType::U32,
            Self::F32(_) => FeatureDataType::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Little-endian bytes of every element, in order.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Self::U8(v) => v.clone(),
            Self::U16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }

    pub fn into_u8(self) -> Option<Vec<u8>> {
        match self {
            Self::U8(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_u16(self) -> Option<Vec<u16>> {
        match self {
            Self::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_u32(self) -> Option<Vec<u32>> {
        match self {
            Self::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_f32(self) -> Option<Vec<f32>> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }
}

/// Pixel dimensions of a decoded frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count.
    pub fn pixels(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

impl Default for Resolution {
    /// Resolution reported before any frame has been loaded.
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Minimum and maximum over finite values, or `None` when there are none.
pub fn finite_extrema(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
