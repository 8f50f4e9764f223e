//! Canny edge detection on luminance images.
//!
//! Follows the classic formulation without pre-blur: 3x3 Sobel gradients,
//! L1 gradient magnitude, non-maximum suppression along the quantized
//! gradient direction, then double-threshold hysteresis with
//! 8-connectivity. Edge pixels are 255, everything else 0.

use image::{GrayImage, Luma};

/// tan(22.5°) and tan(67.5°), the direction quantization boundaries.
const TAN_22_5: f32 = 0.414_213_56;
const TAN_67_5: f32 = 2.414_213_6;

const NONE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Compute a binary Canny edge map.
pub fn canny(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let w = width as usize;
    let h = height as usize;
    let (gx, gy) = sobel(gray);
    let magnitude: Vec<f32> = gx.iter().zip(&gy).map(|(x, y)| x.abs() + y.abs()).collect();

    let mag_at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0.0
        } else {
            magnitude[y as usize * w + x as usize]
        }
    };

    // Non-maximum suppression and threshold classification
    let mut class = vec![NONE; w * h];
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let m = magnitude[idx];
            if m <= low {
                continue;
            }

            let ax = gx[idx].abs();
            let ay = gy[idx].abs();
            let (xi, yi) = (x as isize, y as isize);
            let (n1, n2) = if ay <= ax * TAN_22_5 {
                (mag_at(xi - 1, yi), mag_at(xi + 1, yi))
            } else if ay >= ax * TAN_67_5 {
                (mag_at(xi, yi - 1), mag_at(xi, yi + 1))
            } else if (gx[idx] > 0.0) == (gy[idx] > 0.0) {
                (mag_at(xi - 1, yi - 1), mag_at(xi + 1, yi + 1))
            } else {
                (mag_at(xi + 1, yi - 1), mag_at(xi - 1, yi + 1))
            };

            if m > n1 && m >= n2 {
                class[idx] = if m > high { STRONG } else { WEAK };
            }
        }
    }

    // Hysteresis: grow strong edges through connected weak pixels
    let mut stack: Vec<usize> = class
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == STRONG)
        .map(|(i, _)| i)
        .collect();

    while let Some(idx) = stack.pop() {
        let (x, y) = ((idx % w) as isize, (idx / w) as isize);
        out.put_pixel(x as u32, y as u32, Luma([255]));

        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if class[n] == WEAK {
                    class[n] = STRONG;
                    stack.push(n);
                }
            }
        }
    }

    out
}

/// Mean intensity of a Canny edge map of `gray`.
pub fn edge_strength(gray: &GrayImage, low: f32, high: f32) -> f64 {
    let edges = canny(gray, low, high);
    let count = edges.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = edges.as_raw().iter().map(|&v| v as u64).sum();
    sum as f64 / count as f64
}

/// 3x3 Sobel derivatives with replicated borders.
fn sobel(gray: &GrayImage) -> (Vec<f32>, Vec<f32>) {
    let (width, height) = gray.dimensions();
    let w = width as i64;
    let h = height as i64;
    let raw = gray.as_raw();

    let px = |x: i64, y: i64| -> f32 {
        let cx = x.clamp(0, w - 1) as usize;
        let cy = y.clamp(0, h - 1) as usize;
        raw[cy * width as usize + cx] as f32
    };

    let mut gx = Vec::with_capacity((w * h) as usize);
    let mut gy = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            let dx = (px(x + 1, y - 1) + 2.0 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2.0 * px(x - 1, y) + px(x - 1, y + 1));
            let dy = (px(x - 1, y + 1) + 2.0 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2.0 * px(x, y - 1) + px(x + 1, y - 1));
            gx.push(dx);
            gy.push(dy);
        }
    }
    (gx, gy)
}
