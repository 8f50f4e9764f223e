//! Per-frame feature extraction.

use image::{GrayImage, Luma, RgbImage};

use super::edges::edge_strength;
use crate::error::{MediaError, MediaResult};

/// Bins per channel in the color histogram.
pub const HISTOGRAM_BINS: usize = 16;

/// L1-normalized 16-bin histograms of the three color channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram {
    pub r: [f64; HISTOGRAM_BINS],
    pub g: [f64; HISTOGRAM_BINS],
    pub b: [f64; HISTOGRAM_BINS],
}

impl ColorHistogram {
    /// Histogram of an RGB raster. Each channel sums to 1.0 for a
    /// non-empty image.
    pub fn of(image: &RgbImage) -> Self {
        let mut counts = [[0u64; HISTOGRAM_BINS]; 3];
        for pixel in image.pixels() {
            for (channel, &value) in pixel.0.iter().enumerate() {
                counts[channel][bin_of(value)] += 1;
            }
        }
        Self {
            r: normalize_l1(&counts[0]),
            g: normalize_l1(&counts[1]),
            b: normalize_l1(&counts[2]),
        }
    }

    pub fn channels(&self) -> [&[f64; HISTOGRAM_BINS]; 3] {
        [&self.r, &self.g, &self.b]
    }
}

fn bin_of(value: u8) -> usize {
    value as usize * HISTOGRAM_BINS / 256
}

fn normalize_l1(counts: &[u64; HISTOGRAM_BINS]) -> [f64; HISTOGRAM_BINS] {
    let total: u64 = counts.iter().sum();
    let mut out = [0.0; HISTOGRAM_BINS];
    if total == 0 {
        return out;
    }
    for (o, &c) in out.iter_mut().zip(counts) {
        *o = c as f64 / total as f64;
    }
    out
}

/// Feature vector of one sampled frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatures {
    /// Decoded presentation time in seconds
    pub timestamp: f64,
    /// Mean luminance in [0, 255]
    pub avg_brightness: f64,
    pub avg_r: f64,
    pub avg_g: f64,
    pub avg_b: f64,
    /// Mean of the Canny edge map, in [0, 255]
    pub edge_strength: f64,
    pub color_histogram: ColorHistogram,
}

/// Computes [`FrameFeatures`] from decoded rasters.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    canny_low: f32,
    canny_high: f32,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(50.0, 150.0)
    }
}

impl FeatureExtractor {
    pub fn new(canny_low: f32, canny_high: f32) -> Self {
        Self {
            canny_low,
            canny_high,
        }
    }

    /// Extract features. An empty raster is reported as a decode failure,
    /// since no mean can be taken over zero pixels.
    pub fn extract(&self, index: u64, timestamp: f64, image: &RgbImage) -> MediaResult<FrameFeatures> {
        let pixel_count = image.width() as u64 * image.height() as u64;
        if pixel_count == 0 {
            return Err(MediaError::decode(index, "empty raster"));
        }
        if !timestamp.is_finite() {
            return Err(MediaError::decode(index, "non-finite timestamp"));
        }

        let mut sums = [0u64; 3];
        for pixel in image.pixels() {
            for (sum, &value) in sums.iter_mut().zip(pixel.0.iter()) {
                *sum += value as u64;
            }
        }
        let n = pixel_count as f64;

        let gray = luminance(image);
        let luma_sum: u64 = gray.as_raw().iter().map(|&v| v as u64).sum();

        Ok(FrameFeatures {
            timestamp,
            avg_brightness: luma_sum as f64 / n,
            avg_r: sums[0] as f64 / n,
            avg_g: sums[1] as f64 / n,
            avg_b: sums[2] as f64 / n,
            edge_strength: edge_strength(&gray, self.canny_low, self.canny_high),
            color_histogram: ColorHistogram::of(image),
        })
    }
}

/// Rec.601 luma, rounded to the nearest integer.
pub fn luminance(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (src, dst) in image.pixels().zip(gray.pixels_mut()) {
        let [r, g, b] = src.0;
        let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        *dst = Luma([y.round().clamp(0.0, 255.0) as u8]);
    }
    gray
}
