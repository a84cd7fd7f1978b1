use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;

use super::color::{self, NormBounds};
use super::palette::Palette;
use crate::engine::HeatMap;

/// How pixels are laid out and whether the time axis is split across
/// multiple files.
pub struct ExportOptions {
    /// Put time on the X axis and frequency on Y (transposed layout).
    pub rotate: bool,
    /// Write at most this many windows per file (0 = single file).
    /// Only meaningful for the non-rotated layout.
    pub max_ffts_per_file: usize,
}

/// Render `map` through `bounds` and write it to `path`. The format
/// follows the extension (.png or .bmp). An empty map writes nothing.
pub fn save(map: &HeatMap, bounds: NormBounds, path: &Path, opts: &ExportOptions) -> Result<()> {
    if map.is_empty() {
        log::warn!(
            "Heat map is empty (zero windows); not writing {}",
            path.display()
        );
        return Ok(());
    }

    let palette = Palette::heat();
    let rgb = color::grid_to_rgb(&map.grid, map.fft_size, bounds, &palette);

    if opts.rotate {
        let rotated = rotate_rgb(&rgb, map.num_ffts, map.fft_size);
        write_image(rotated, map.num_ffts as u32, map.fft_size as u32, path)
    } else if opts.max_ffts_per_file > 0 {
        let row_bytes = 3 * map.fft_size;
        for (index, chunk) in rgb.chunks(opts.max_ffts_per_file * row_bytes).enumerate() {
            let out = numbered_path(path, index);
            write_image(
                chunk.to_vec(),
                map.fft_size as u32,
                (chunk.len() / row_bytes) as u32,
                &out,
            )?;
        }
        Ok(())
    } else {
        write_image(rgb, map.fft_size as u32, map.num_ffts as u32, path)
    }
}

fn write_image(rgb: Vec<u8>, width: u32, height: u32, path: &Path) -> Result<()> {
    let img = RgbImage::from_raw(width, height, rgb)
        .context("RGB buffer does not match the image dimensions")?;
    img.save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {} ({}x{})", path.display(), width, height);
    Ok(())
}

/// Transpose the window-major buffer so pixel (t, f) of the rotated
/// output reads grid cell [t][f].
fn rotate_rgb(rgb: &[u8], num_ffts: usize, fft_size: usize) -> Vec<u8> {
    let mut out = vec![0u8; rgb.len()];
    for t in 0..num_ffts {
        for f in 0..fft_size {
            let src = 3 * (t * fft_size + f);
            let dst = 3 * (f * num_ffts + t);
            out[dst..dst + 3].copy_from_slice(&rgb[src..src + 3]);
        }
    }
    out
}

/// `heatmap.png` with index 1 becomes `heatmap_1.png`.
fn numbered_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("heatmap");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, index, ext),
        None => format!("{}_{}", stem, index),
    };
    path.with_file_name(name)
}
