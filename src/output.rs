//! Turning a finished raster into something to look at: ASCII art or a grayscale PNG.

use std::path::Path;

use anyhow::Context as _;

use crate::{foundation::core::Raster, foundation::error::FractaleResult};

/// Coarse reading of a squared magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// `|z|² <= 1`
    Bounded,
    /// `1 < |z|² <= 4`
    Borderline,
    /// Anything larger, including `+inf` and NaN.
    Divergent,
}

impl Classification {
    pub fn glyph(self) -> char {
        match self {
            Classification::Bounded => '*',
            Classification::Borderline => '.',
            Classification::Divergent => ' ',
        }
    }
}

pub fn classify(value: f32) -> Classification {
    if value <= 1.0 {
        Classification::Bounded
    } else if value <= 4.0 {
        Classification::Borderline
    } else {
        Classification::Divergent
    }
}

/// One line per raster row, each terminated by `\n`.
pub fn raster_to_ascii(raster: &Raster) -> String {
    let mut out = String::with_capacity(raster.data.len() + raster.height() as usize);
    for row in raster.rows() {
        out.extend(row.iter().map(|v| classify(*v).glyph()));
        out.push('\n');
    }
    out
}

/// 8-bit gray levels: `value * 256` clamped to `0..=255`; non-finite values are white.
pub fn raster_to_gray8(raster: &Raster) -> Vec<u8> {
    raster
        .data
        .iter()
        .map(|v| {
            if v.is_finite() {
                (v * 256.0).clamp(0.0, 255.0) as u8
            } else {
                255
            }
        })
        .collect()
}

pub fn write_png(path: &Path, raster: &Raster) -> FractaleResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &raster_to_gray8(raster),
        raster.width(),
        raster.height(),
        image::ColorType::L8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
