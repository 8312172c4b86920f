use image::{ImageFormat, Rgb, RgbImage};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::error::ReportError;
use crate::filter::ChartDataset;

/// Pixel size of the rasterised chart; twice the 500x300 box it is placed in.
pub const IMAGE_WIDTH: u32 = 1000;
pub const IMAGE_HEIGHT: u32 = 600;

const MARGIN: u32 = 40;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const PALETTE: [Rgb<u8>; 3] = [Rgb([66, 133, 244]), Rgb([219, 68, 55]), Rgb([244, 180, 0])];

/// A chart image on disk that is removed when the guard goes out of scope.
#[derive(Debug)]
pub struct TempImage {
    path: PathBuf,
}

impl TempImage {
    /// Takes ownership of whatever is (or will be) at `path`.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed temporary chart image"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), %err, "could not remove temporary chart image"),
        }
    }
}

/// Horizontal centre of bar `index` out of `count`, as a fraction of the
/// image width.
pub fn bar_center(index: usize, count: usize) -> f32 {
    let slot = (IMAGE_WIDTH - 2 * MARGIN) / count.max(1) as u32;
    (MARGIN + index as u32 * slot + slot / 2) as f32 / IMAGE_WIDTH as f32
}

/// Top of the value axis (where the largest bar ends), as a fraction of the
/// image height measured from the bottom.
pub fn axis_top() -> f32 {
    (IMAGE_HEIGHT - MARGIN) as f32 / IMAGE_HEIGHT as f32
}

/// Bottom of the value axis, as a fraction of the image height from the bottom.
pub fn axis_base() -> f32 {
    MARGIN as f32 / IMAGE_HEIGHT as f32
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for x in x0..x1.min(img.width()) {
        for y in y0..y1.min(img.height()) {
            img.put_pixel(x, y, color);
        }
    }
}

/// Draws the first series of `dataset` as vertical bars.
///
/// An empty dataset yields just the axes.
pub fn draw_chart(dataset: &ChartDataset) -> RgbImage {
    let mut img = RgbImage::from_pixel(IMAGE_WIDTH, IMAGE_HEIGHT, BACKGROUND);
    let base = IMAGE_HEIGHT - MARGIN;
    fill_rect(&mut img, MARGIN, MARGIN, MARGIN + 2, base, AXIS);
    fill_rect(&mut img, MARGIN, base, IMAGE_WIDTH - MARGIN, base + 2, AXIS);

    let bars = dataset.bars();
    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    if bars.is_empty() || max <= 0.0 {
        return img;
    }

    let plot_width = IMAGE_WIDTH - 2 * MARGIN;
    let slot = plot_width / bars.len() as u32;
    let bar_width = slot * 3 / 5;
    let plot_height = (base - MARGIN) as f64;
    for (i, (_, value)) in bars.iter().enumerate() {
        let height = ((value / max) * plot_height).round() as u32;
        let center = (bar_center(i, bars.len()) * IMAGE_WIDTH as f32).round() as u32;
        let x0 = center - bar_width / 2;
        fill_rect(
            &mut img,
            x0,
            base - height,
            x0 + bar_width,
            base,
            PALETTE[i % PALETTE.len()],
        );
    }
    img
}

/// Renders the chart to a PNG at `path` and hands back its cleanup guard.
///
/// The guard is created before writing so a failed write is cleaned up too.
pub fn rasterize_chart(dataset: &ChartDataset, path: &Path) -> Result<TempImage, ReportError> {
    let guard = TempImage::adopt(path);
    draw_chart(dataset).save_with_format(guard.path(), ImageFormat::Png)?;
    debug!(path = %path.display(), "rasterized chart");
    Ok(guard)
}
