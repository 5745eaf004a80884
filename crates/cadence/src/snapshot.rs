use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};

use cadence_core::video::Surface;

/// Decode `surface` to 8-bit RGB rows.
pub fn surface_to_rgb(surface: &Surface) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(surface.width() * surface.height() * 3);
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let [_, r, g, b] = surface.pixel(x, y).to_be_bytes();
            rgb.extend_from_slice(&[r, g, b]);
        }
    }
    rgb
}

pub fn write_png(path: &Path, surface: &Surface) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let width = u32::try_from(surface.width()).context("surface too wide for PNG")?;
    let height = u32::try_from(surface.height()).context("surface too tall for PNG")?;

    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&surface_to_rgb(surface))?;
    writer.finish()?;
    Ok(())
}
