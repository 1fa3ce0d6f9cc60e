//! Candle extraction from a rasterized chart
//!
//! The pipeline is: grayscale, inverse binarization (fixed threshold OR
//! Otsu), 2x2 close-then-open cleanup, 8-connected blobs sorted left to
//! right, size filtering, then a linear mapping from pixel rows to prices.
//!
//! Open and close cannot be recovered from a silhouette. They are placed
//! symmetrically around the blob midpoint, displaced in proportion to the
//! blob width, with a shared Gaussian jitter. High and low are widened
//! afterwards so every candle encloses its body.

use std::collections::VecDeque;
use std::ops::Deref;

use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, Rgba};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, warn};

use crate::{config::ExtractorConfig, synthetic::SyntheticGenerator, Candle, Result};

/// Borrowed, decoded image: row-major, channels interleaved
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
    /// 1 (gray), 3 (RGB) or 4 (RGBA, alpha ignored)
    pub channels: usize,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize, channels: usize) -> Self {
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Check dimensions, channel count and buffer length agree
    pub fn validate(&self) -> std::result::Result<(), ExtractionFailure> {
        self.dimensions()?;
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(ExtractionFailure::InvalidBuffer(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        let expected = self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(self.channels))
            .ok_or_else(|| ExtractionFailure::InvalidBuffer("dimensions overflow".into()))?;
        if self.data.len() != expected {
            return Err(ExtractionFailure::InvalidBuffer(format!(
                "expected {expected} bytes, got {}",
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Validated luma plane of the buffer
    fn to_luma(&self) -> std::result::Result<GrayImage, ExtractionFailure> {
        self.validate()?;
        let (width, height) = self.dimensions()?;
        let mismatch = || ExtractionFailure::InvalidBuffer("buffer does not fit dimensions".into());

        match self.channels {
            1 => GrayImage::from_raw(width, height, self.data.to_vec()).ok_or_else(mismatch),
            3 => ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(width, height, self.data)
                .map(|rgb| luma_plane(&rgb))
                .ok_or_else(mismatch),
            _ => ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(width, height, self.data)
                .map(|rgba| luma_plane(&rgba))
                .ok_or_else(mismatch),
        }
    }

    fn dimensions(&self) -> std::result::Result<(u32, u32), ExtractionFailure> {
        if self.width == 0 || self.height == 0 {
            return Err(ExtractionFailure::InvalidBuffer(format!(
                "zero dimension {}x{}",
                self.width, self.height
            )));
        }
        match (u32::try_from(self.width), u32::try_from(self.height)) {
            (Ok(w), Ok(h)) => Ok((w, h)),
            _ => Err(ExtractionFailure::InvalidBuffer("dimensions overflow".into())),
        }
    }
}

/// Why extraction produced no candles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionFailure {
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    #[error("no foreground blobs found")]
    NoBlobs,

    #[error("no blob survived size filtering")]
    NoCandles,
}

/// Where a candle sequence came from
#[derive(Debug, Clone, PartialEq)]
pub enum CandleSource {
    Image,
    Synthetic { reason: ExtractionFailure },
}

/// Candles plus provenance
#[derive(Debug, Clone)]
pub struct Extraction {
    pub candles: Vec<Candle>,
    pub source: CandleSource,
}

impl Extraction {
    pub fn is_synthetic(&self) -> bool {
        matches!(self.source, CandleSource::Synthetic { .. })
    }
}

/// Bounding box of one connected foreground region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

// ============================================================
// EXTRACTOR
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct CandleExtractor {
    config: ExtractorConfig,
}

impl CandleExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Recover candles from `image`, oldest (leftmost) first.
    pub fn extract<R: Rng + ?Sized>(
        &self,
        image: &PixelBuffer<'_>,
        rng: &mut R,
    ) -> std::result::Result<Vec<Candle>, ExtractionFailure> {
        let gray = grayscale(image)?;
        let (width, height) = (image.width, image.height);

        let mut mask = threshold_inv(&gray, self.config.fixed_threshold);
        if self.config.use_otsu {
            let otsu = otsu_threshold(&gray);
            debug!(otsu, fixed = self.config.fixed_threshold, "binarization thresholds");
            for (m, fg) in mask.pixels_mut().zip(threshold_inv(&gray, otsu).pixels()) {
                m.0[0] |= fg.0[0];
            }
        }

        // close, then open
        let mask = erode(&dilate(&mask));
        let mask = dilate(&erode(&mask));

        let mut blobs = find_blobs(&mask);
        if blobs.is_empty() {
            return Err(ExtractionFailure::NoBlobs);
        }
        blobs.sort_by_key(|b| b.x);
        blobs.truncate(self.config.max_blobs);

        let max_w = width as f64 * self.config.max_width_ratio.get();
        let max_h = height as f64 * self.config.max_height_ratio.get();
        let candles: Vec<Candle> = blobs
            .iter()
            .filter(|b| b.w >= self.config.min_blob_width && b.h >= self.config.min_blob_height)
            .filter(|b| (b.w as f64) <= max_w && (b.h as f64) <= max_h)
            .enumerate()
            .map(|(index, b)| self.blob_to_candle(b, height, index, rng))
            .collect();

        debug!(blobs = blobs.len(), candles = candles.len(), "extracted candles");
        if candles.is_empty() {
            return Err(ExtractionFailure::NoCandles);
        }
        Ok(candles)
    }

    /// Extract, or fall back to synthetic candles on any failure.
    pub fn extract_or_synthesize<R: Rng + ?Sized>(
        &self,
        image: &PixelBuffer<'_>,
        synthetic: &SyntheticGenerator,
        rng: &mut R,
    ) -> Extraction {
        match self.extract(image, rng) {
            Ok(candles) => Extraction {
                candles,
                source: CandleSource::Image,
            },
            Err(reason) => {
                warn!(error = %reason, "candle extraction failed, using synthetic candles");
                Extraction {
                    candles: synthetic.generate_default(rng),
                    source: CandleSource::Synthetic { reason },
                }
            }
        }
    }

    fn blob_to_candle<R: Rng + ?Sized>(
        &self,
        blob: &Blob,
        image_height: usize,
        index: usize,
        rng: &mut R,
    ) -> Candle {
        let scale = self.config.price_scale;
        let price_at = |row: f64| scale - row / image_height as f64 * scale;

        let high = price_at(blob.y as f64);
        let low = price_at((blob.y + blob.h) as f64);
        let mid = price_at(blob.y as f64 + blob.h as f64 / 2.0);

        let offset = blob.w as f64 * self.config.body_width_factor;
        let z: f64 = StandardNormal.sample(rng);
        let jitter = z * self.config.jitter_sigma;

        Candle::enclosing(
            mid + offset + jitter,
            mid - offset + jitter,
            high,
            low,
            self.config.wick_pad,
            (blob.w * blob.h) as f64,
            index,
        )
    }
}

// ============================================================
// IMAGE OPERATIONS
// ============================================================

/// Luma with 0.299/0.587/0.114 weights in 14-bit fixed point
#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    ((r * 4899 + g * 9617 + b * 1868 + 8192) >> 14) as u8
}

fn luma_plane<P, C>(image: &ImageBuffer<P, C>) -> GrayImage
where
    P: Pixel<Subpixel = u8>,
    C: Deref<Target = [u8]>,
{
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let px = image.get_pixel(x, y).channels();
        Luma([luma(px[0], px[1], px[2])])
    })
}

/// Grayscale plane of `image`, rejecting malformed buffers
pub fn grayscale(image: &PixelBuffer<'_>) -> std::result::Result<GrayImage, ExtractionFailure> {
    image.to_luma()
}

/// Foreground where `gray <= threshold`
fn threshold_inv(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut mask = gray.clone();
    for px in mask.pixels_mut() {
        px.0[0] = if px.0[0] <= threshold { FOREGROUND } else { 0 };
    }
    mask
}

/// Threshold maximizing between-class variance
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let total = gray.as_raw().len();
    if total == 0 {
        return 0;
    }
    let mut hist = [0usize; 256];
    for px in gray.pixels() {
        hist[px.0[0] as usize] += 1;
    }
    let p: Vec<f64> = hist.iter().map(|&n| n as f64 / total as f64).collect();
    let mu: f64 = p.iter().enumerate().map(|(i, &pi)| i as f64 * pi).sum();

    let eps = f32::EPSILON as f64;
    let (mut q1, mut mu1) = (0.0f64, 0.0f64);
    let (mut best_sigma, mut best) = (0.0f64, 0u8);

    for (i, &pi) in p.iter().enumerate() {
        mu1 *= q1;
        q1 += pi;
        let q2 = 1.0 - q1;
        if q1.min(q2) < eps || q1.max(q2) > 1.0 - eps {
            continue;
        }
        mu1 = (mu1 + i as f64 * pi) / q1;
        let mu2 = (mu - q1 * mu1) / q2;
        let sigma = q1 * q2 * (mu1 - mu2) * (mu1 - mu2);
        if sigma > best_sigma {
            best_sigma = sigma;
            best = i as u8;
        }
    }
    best
}

const FOREGROUND: u8 = 255;

// 2x2 rectangular kernel anchored at its bottom-right cell
const KERNEL: [(i32, i32); 4] = [(-1, -1), (0, -1), (-1, 0), (0, 0)];

fn morph(mask: &GrayImage, dilation: bool) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut neighbours = KERNEL.iter().filter_map(|&(dx, dy)| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            Some(mask.get_pixel(nx, ny).0[0] == FOREGROUND)
        });
        let hit = if dilation {
            neighbours.any(|v| v)
        } else {
            neighbours.all(|v| v)
        };
        Luma([if hit { FOREGROUND } else { 0 }])
    })
}

fn dilate(mask: &GrayImage) -> GrayImage {
    morph(mask, true)
}

fn erode(mask: &GrayImage) -> GrayImage {
    morph(mask, false)
}

/// Bounding boxes of 8-connected foreground regions, in scan order
pub fn find_blobs(mask: &GrayImage) -> Vec<Blob> {
    let (width, height) = (mask.width() as usize, mask.height() as usize);
    let foreground: Vec<bool> = mask.pixels().map(|px| px.0[0] == FOREGROUND).collect();
    let mut seen = vec![false; foreground.len()];
    let mut blobs = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..foreground.len() {
        if !foreground[start] || seen[start] {
            continue;
        }
        seen[start] = true;
        queue.push_back(start);
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);

        while let Some(pos) = queue.pop_front() {
            let (x, y) = (pos % width, pos / width);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy))
                    else {
                        continue;
                    };
                    if nx >= width || ny >= height {
                        continue;
                    }
                    let n = ny * width + nx;
                    if foreground[n] && !seen[n] {
                        seen[n] = true;
                        queue.push_back(n);
                    }
                }
            }
        }

        blobs.push(Blob {
            x: min_x,
            y: min_y,
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
        });
    }
    blobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{validate_bars, OHLCVExt};
    use rand::{rngs::StdRng, SeedableRng};

    /// White canvas with black rectangles (x, y, w, h)
    fn canvas(width: usize, height: usize, rects: &[(usize, usize, usize, usize)]) -> Vec<u8> {
        let mut data = vec![255u8; width * height];
        for &(x, y, w, h) in rects {
            for row in y..y + h {
                for col in x..x + w {
                    data[row * width + col] = 0;
                }
            }
        }
        data
    }

    fn extractor_without_jitter() -> CandleExtractor {
        CandleExtractor::new(ExtractorConfig {
            jitter_sigma: 0.0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_grayscale_weights() {
        let px = [255u8, 255, 255, 0, 0, 0, 255, 0, 0];
        let image = PixelBuffer::new(&px, 3, 1, 3);
        assert_eq!(grayscale(&image).unwrap().into_raw(), vec![255, 0, 76]);

        let rgba = [255u8, 0, 0, 7, 0, 255, 0, 7];
        let image = PixelBuffer::new(&rgba, 2, 1, 4);
        assert_eq!(grayscale(&image).unwrap().into_raw(), vec![76, 150]);
    }

    #[test]
    fn test_grayscale_rejects_malformed_buffers() {
        let data = [0u8; 11];
        assert!(matches!(
            grayscale(&PixelBuffer::new(&data, 2, 2, 3)),
            Err(ExtractionFailure::InvalidBuffer(_))
        ));
        assert!(grayscale(&PixelBuffer::new(&data, 11, 1, 1)).is_ok());
    }

    #[test]
    fn test_otsu_bimodal() {
        let mut gray = vec![0u8; 50];
        gray.extend(vec![255u8; 50]);
        assert_eq!(otsu_threshold(&GrayImage::from_raw(100, 1, gray).unwrap()), 0);
        assert_eq!(otsu_threshold(&GrayImage::from_pixel(4, 4, Luma([255]))), 0);
    }

    #[test]
    fn test_close_fills_single_pixel_gap() {
        #[rustfmt::skip]
        let raw = vec![
            255, 255, 255, 255,
            255,   0, 255, 255,
            255, 255, 255, 255,
            255, 255, 255, 255,
        ];
        let mask = GrayImage::from_raw(4, 4, raw).unwrap();
        let closed = erode(&dilate(&mask));
        assert_eq!(closed.get_pixel(1, 1).0[0], FOREGROUND);
    }

    #[test]
    fn test_buffer_validation() {
        let data = [0u8; 12];
        assert!(PixelBuffer::new(&data, 2, 2, 3).validate().is_ok());
        assert!(PixelBuffer::new(&data, 2, 2, 2).validate().is_err());
        assert!(PixelBuffer::new(&data, 3, 2, 3).validate().is_err());
        assert!(PixelBuffer::new(&[], 0, 0, 1).validate().is_err());
    }

    #[test]
    fn test_blobs_are_eight_connected() {
        #[rustfmt::skip]
        let raw = vec![
            255, 0,   0,
            0,   255, 0,
            0,   0,   255,
        ];
        let blobs = find_blobs(&GrayImage::from_raw(3, 3, raw).unwrap());
        assert_eq!(blobs, vec![Blob { x: 0, y: 0, w: 3, h: 3 }]);
    }

    #[test]
    fn test_extracts_rectangles_left_to_right() {
        // drawn out of order; the sort restores left-to-right
        let data = canvas(100, 100, &[(50, 30, 4, 20), (10, 40, 4, 20), (30, 20, 4, 20)]);
        let image = PixelBuffer::new(&data, 100, 100, 1);
        let candles = extractor_without_jitter()
            .extract(&image, &mut StdRng::seed_from_u64(0))
            .unwrap();

        assert_eq!(candles.len(), 3);
        assert!(validate_bars(&candles).is_ok());
        // higher on the image means higher prices
        assert!(candles[1].high > candles[0].high);
        assert!(candles[1].high > candles[2].high);
        for (i, c) in candles.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.volume, 80.0);
            assert!((c.open - c.close - 1.6).abs() < 1e-9);
            assert!((c.range() - 21.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_wide_artifacts_are_filtered() {
        let data = canvas(100, 100, &[(10, 50, 50, 3)]);
        let image = PixelBuffer::new(&data, 100, 100, 1);
        let result = extractor_without_jitter().extract(&image, &mut StdRng::seed_from_u64(0));
        assert_eq!(result, Err(ExtractionFailure::NoCandles));
    }

    #[test]
    fn test_blank_image_falls_back() {
        let data = vec![255u8; 64 * 32];
        let image = PixelBuffer::new(&data, 64, 32, 1);
        let extractor = CandleExtractor::default();
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(extractor.extract(&image, &mut rng), Err(ExtractionFailure::NoBlobs));

        let extraction =
            extractor.extract_or_synthesize(&image, &SyntheticGenerator::default(), &mut rng);
        assert!(extraction.is_synthetic());
        assert_eq!(extraction.candles.len(), 20);
    }

    #[test]
    fn test_jitter_keeps_invariant() {
        let data = canvas(60, 60, &[(5, 5, 3, 3), (20, 10, 2, 4), (40, 30, 3, 12)]);
        let image = PixelBuffer::new(&data, 60, 60, 1);
        let extractor = CandleExtractor::new(ExtractorConfig {
            jitter_sigma: 5.0,
            ..Default::default()
        })
        .unwrap();
        let candles = extractor.extract(&image, &mut StdRng::seed_from_u64(11)).unwrap();
        for c in &candles {
            assert!(c.low <= c.body_bottom() && c.high >= c.body_top());
        }
    }
}
