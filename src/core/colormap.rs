use crate::types::{DisplayRange, LstError, LstResult, RasterGrid};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use rayon::prelude::*;
use std::path::Path;

/// Rendering parameters
#[derive(Debug, Clone)]
pub struct RenderParams {
    /// Lower display-range percentile over valid pixels
    pub lower_percentile: f64,
    /// Upper display-range percentile over valid pixels
    pub upper_percentile: f64,
    /// Alpha for valid pixels. Deliberately below 255 so the overlay never
    /// fully hides the base map.
    pub alpha: u8,
    /// Integer nearest-neighbor upsampling factor
    pub scale: u32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            lower_percentile: 2.0,
            upper_percentile: 98.0,
            alpha: 200,
            scale: 20,
        }
    }
}

/// Heat-ramp renderer turning a reprojected grid into an RGBA overlay
pub struct ColormapRenderer {
    params: RenderParams,
}

impl ColormapRenderer {
    pub fn new() -> Self {
        Self {
            params: RenderParams::default(),
        }
    }

    pub fn with_params(params: RenderParams) -> Self {
        Self { params }
    }

    /// Render a grid into an upsampled RGBA image plus the display range used
    ///
    /// A pixel is invalid when it equals the nodata value or is NaN; invalid
    /// pixels are fully transparent. Valid pixels are normalized against the
    /// percentile display range (clipped to [0, 1]) and mapped through the
    /// heat ramp with the configured constant alpha.
    pub fn render(
        &self,
        grid: &RasterGrid,
        nodata: Option<f64>,
    ) -> LstResult<(RgbaImage, DisplayRange)> {
        let (height, width) = grid.dim();
        let nodata = nodata.map(|v| v as f32);
        let is_valid = |v: f32| !v.is_nan() && Some(v) != nodata;

        let range = self.display_range(grid, is_valid);
        let span = range.max - range.min;
        log::info!("Display range ({}-{}%): {:.2} to {:.2}",
            self.params.lower_percentile,
            self.params.upper_percentile,
            range.min,
            range.max
        );

        let alpha = self.params.alpha;
        let mut rgba = vec![0u8; width * height * 4];
        rgba.par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(row, pixels)| {
                for col in 0..width {
                    let value = grid[[row, col]];
                    if !is_valid(value) {
                        continue; // stays fully transparent
                    }
                    let t = if span > 0.0 {
                        ((value as f64 - range.min) / span).clamp(0.0, 1.0)
                    } else {
                        // Constant field: normalization must not divide by zero
                        0.5
                    };
                    let (r, g, b) = heat_color(t);
                    pixels[col * 4] = r;
                    pixels[col * 4 + 1] = g;
                    pixels[col * 4 + 2] = b;
                    pixels[col * 4 + 3] = alpha;
                }
            });

        let image = RgbaImage::from_raw(width as u32, height as u32, rgba).ok_or_else(|| {
            LstError::Processing(format!("RGBA buffer does not fit {}x{} image", width, height))
        })?;

        let image = if self.params.scale > 1 {
            imageops::resize(
                &image,
                width as u32 * self.params.scale,
                height as u32 * self.params.scale,
                FilterType::Nearest,
            )
        } else {
            image
        };

        Ok((image, range))
    }

    /// Render and persist as PNG, returning the display range and final size
    pub fn render_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        grid: &RasterGrid,
        nodata: Option<f64>,
    ) -> LstResult<(DisplayRange, (u32, u32))> {
        let (image, range) = self.render(grid, nodata)?;
        image.save(path.as_ref())?;
        log::info!(
            "Saved: {} ({}x{})",
            path.as_ref().display(),
            image.width(),
            image.height()
        );
        Ok((range, image.dimensions()))
    }

    /// Percentile display range over valid pixels; [0, 1] when none are valid
    fn display_range<F: Fn(f32) -> bool>(&self, grid: &RasterGrid, is_valid: F) -> DisplayRange {
        let mut valid: Vec<f32> = grid.iter().copied().filter(|&v| is_valid(v)).collect();
        if valid.is_empty() {
            log::warn!("No valid pixels; falling back to display range [0, 1]");
            return DisplayRange { min: 0.0, max: 1.0 };
        }
        valid.sort_by(|a, b| a.partial_cmp(b).unwrap());
        log::debug!(
            "Value range: {:.2} to {:.2} over {} valid pixels",
            valid[0],
            valid[valid.len() - 1],
            valid.len()
        );

        DisplayRange {
            min: percentile(&valid, self.params.lower_percentile),
            max: percentile(&valid, self.params.upper_percentile),
        }
    }
}

impl Default for ColormapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear-interpolation percentile between closest ranks over sorted values
fn percentile(sorted: &[f32], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0] as f64;
    }
    let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] as f64 * (1.0 - frac) + sorted[hi] as f64 * frac
}

/// Four-segment heat ramp over normalized [0, 1]
///
/// blue -> cyan -> yellow -> orange -> red, one segment per quarter.
/// Channels truncate toward zero when narrowed to u8.
fn heat_color(t: f64) -> (u8, u8, u8) {
    if t < 0.25 {
        let s = t / 0.25;
        (0, (255.0 * s) as u8, 255)
    } else if t < 0.5 {
        let s = (t - 0.25) / 0.25;
        ((255.0 * s) as u8, 255, (255.0 * (1.0 - s)) as u8)
    } else if t < 0.75 {
        let s = (t - 0.5) / 0.25;
        (255, (255.0 * (1.0 - s * 0.35)) as u8, 0)
    } else {
        let s = (t - 0.75) / 0.25;
        (255, (165.0 * (1.0 - s)) as u8, 0)
    }
}
