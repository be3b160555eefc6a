use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::{ColorizerError, ColorizerResult};

/// A decoded raster where each pixel has been unpacked into one `u32`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedRaster {
    pub width: u32,
    pub height: u32,
    /// Row-major, one value per pixel.
    pub values: Vec<u32>,
}

/// Decode an image whose pixels carry a label id in the RGB channels (`r | g << 8 | b << 16`).
///
/// Alpha is ignored; label writers set it to 255.
pub fn decode_label_image(bytes: &[u8]) -> ColorizerResult<PackedRaster> {
    decode_with(bytes, |px| unpack_u32([px[0], px[1], px[2], 0]))
}

/// Decode an image whose RGBA channels pack a full little-endian `u32` per pixel.
pub fn decode_packed_image(bytes: &[u8]) -> ColorizerResult<PackedRaster> {
    decode_with(bytes, |px| unpack_u32([px[0], px[1], px[2], px[3]]))
}

fn decode_with(bytes: &[u8], unpack: impl Fn(&[u8]) -> u32) -> ColorizerResult<PackedRaster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let values = rgba.as_raw().chunks_exact(4).map(unpack).collect();
    Ok(PackedRaster {
        width,
        height,
        values,
    })
}

pub fn pack_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

pub fn unpack_u32(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes(rgba)
}

/// Encode `values` as an RGBA PNG, one value per pixel, with no padding pixels.
///
/// The height is the largest divisor of `values.len()` not above its square root.
pub fn encode_packed_png(values: &[u32]) -> ColorizerResult<Vec<u8>> {
    if values.is_empty() {
        return Err(ColorizerError::validation(
            "cannot encode an empty array as an image",
        ));
    }
    let len = values.len();
    let height = (1..=len.isqrt())
        .rev()
        .find(|h| len % h == 0)
        .unwrap_or(1);
    let width = len / height;
    let texels = values.iter().flat_map(|&v| pack_u32(v)).collect();
    encode_rgba_png(width as u32, height as u32, texels)
}

/// Encode a label raster (`ids[y * width + x]`, 0 = background) as an RGBA PNG with opaque alpha.
pub fn encode_label_png(width: u32, height: u32, ids: &[u32]) -> ColorizerResult<Vec<u8>> {
    if ids.len() != (width as usize) * (height as usize) {
        return Err(ColorizerError::validation(format!(
            "label raster has {} values, expected {width}x{height}",
            ids.len()
        )));
    }
    if ids.iter().any(|&id| id > 0x00FF_FFFF) {
        return Err(ColorizerError::validation(
            "label ids must fit in 24 bits",
        ));
    }
    let texels = ids
        .iter()
        .flat_map(|&id| {
            let [r, g, b, _] = pack_u32(id);
            [r, g, b, 255]
        })
        .collect();
    encode_rgba_png(width, height, texels)
}

fn encode_rgba_png(width: u32, height: u32, texels: Vec<u8>) -> ColorizerResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, texels)
        .ok_or_else(|| ColorizerError::validation("texel buffer does not match dimensions"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}
