// Frame grid batcher: tiles sampled frames into one contact sheet.
//
// A vision call is priced per request, not per embedded sub-image, so
// packing rows*cols frames into one composite divides the per-frame cost
// by the cell count. One unreadable frame never sinks its batch: it is
// logged and skipped, and the grid is padded with blank cells so the
// layout the prompt describes always holds.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::{debug, warn};

/// Largest cell edge in a composite. A 3×3 sheet of 4K frames would
/// otherwise push the data-URL payload past typical request limits.
const MAX_CELL_EDGE: u32 = 640;

/// Split frame paths into grid-sized batches, final partial batch included.
pub fn batch_images(paths: &[PathBuf], batch_size: usize) -> Vec<Vec<PathBuf>> {
    if batch_size == 0 {
        return Vec::new();
    }
    paths.chunks(batch_size).map(|chunk| chunk.to_vec()).collect()
}

/// Compose up to rows*cols frames into a single rows×cols contact sheet.
///
/// Cell size is the maximum width and height among the frames that actually
/// loaded (capped at MAX_CELL_EDGE), so frames are never upscaled; they are
/// downscaled only as needed to fit, keeping aspect ratio, and centered on
/// a black background. Slots beyond the supplied (or readable) frames stay
/// black. Returns None only when zero frames loaded.
pub fn create_image_grid(
    paths: &[PathBuf],
    rows: u32,
    cols: u32,
    output: Option<&Path>,
) -> Option<RgbImage> {
    if rows == 0 || cols == 0 {
        return None;
    }

    let capacity = (rows as usize) * (cols as usize);
    let mut loaded: Vec<RgbImage> = Vec::new();
    for path in paths.iter().take(capacity) {
        match image::open(path) {
            Ok(img) => loaded.push(img.to_rgb8()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable frame");
            }
        }
    }

    if loaded.is_empty() {
        warn!(supplied = paths.len(), "No readable frames, no grid produced");
        return None;
    }

    // Cell dimensions come from what loaded, not a fixed constant, so the
    // sharpest frame keeps its native resolution. The cap bounds the
    // base64 payload a full grid produces on 4K source material.
    let cell_w = loaded
        .iter()
        .map(|img| img.width())
        .max()
        .unwrap_or(1)
        .min(MAX_CELL_EDGE);
    let cell_h = loaded
        .iter()
        .map(|img| img.height())
        .max()
        .unwrap_or(1)
        .min(MAX_CELL_EDGE);

    let mut canvas = RgbImage::from_pixel(cols * cell_w, rows * cell_h, Rgb([0, 0, 0]));

    for (i, img) in loaded.iter().enumerate() {
        let (w, h) = img.dimensions();
        // Downscale-only fit: a frame already at or under cell size is
        // placed as-is rather than blurred up.
        let scale = (cell_w as f64 / w as f64)
            .min(cell_h as f64 / h as f64)
            .min(1.0);
        let scaled = if scale < 1.0 {
            let new_w = ((w as f64 * scale).round() as u32).max(1);
            let new_h = ((h as f64 * scale).round() as u32).max(1);
            imageops::resize(img, new_w, new_h, FilterType::Triangle)
        } else {
            img.clone()
        };

        let row = (i as u32) / cols;
        let col = (i as u32) % cols;
        let x = col * cell_w + (cell_w - scaled.width()) / 2;
        let y = row * cell_h + (cell_h - scaled.height()) / 2;
        imageops::replace(&mut canvas, &scaled, x as i64, y as i64);
    }

    debug!(
        loaded = loaded.len(),
        capacity,
        width = canvas.width(),
        height = canvas.height(),
        "Composed frame grid"
    );

    if let Some(path) = output {
        if let Err(e) = canvas.save(path) {
            warn!(path = %path.display(), error = %e, "Failed to save grid composite");
        }
    }

    Some(canvas)
}
