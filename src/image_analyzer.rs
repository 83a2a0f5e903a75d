use crate::consts::{MATCH_STATS_REGIONS, REFERENCE_HEIGHT, REFERENCE_WIDTH, StatRegion};
use crate::error::ExtractError;
use crate::ocr::TextRecognizer;
use crate::policy::{Binarization, Policy};
use image::GrayImage;
use indexmap::IndexMap;
use opencv::{
    core::{self, AlgorithmHint, Mat, Rect, Size, Vector},
    imgcodecs::{self, IMREAD_COLOR},
    imgproc::{self},
    prelude::*,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

/// Region name to recognized text, in region table order.
pub type StatsRecord = IndexMap<String, String>;

const SLOW_EXTRACTION: Duration = Duration::from_secs(5);

pub struct ImageAnalyzer {
    recognizer: Arc<dyn TextRecognizer>,
    regions: Vec<StatRegion>,
    strict_ocr: bool,
    dump_dir: Option<PathBuf>,
}

impl ImageAnalyzer {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            regions: MATCH_STATS_REGIONS.to_vec(),
            strict_ocr: false,
            dump_dir: None,
        }
    }

    /// Replace the built-in region table.
    pub fn with_regions(mut self, regions: Vec<StatRegion>) -> Self {
        self.regions = regions;
        self
    }

    /// Abort the whole extraction when OCR fails for a region instead of
    /// recording an empty value.
    pub fn strict_ocr(mut self, strict: bool) -> Self {
        self.strict_ocr = strict;
        self
    }

    /// Write every binarized crop to `dir` as `<region>.png`.
    pub fn dump_crops_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }

    pub fn regions(&self) -> &[StatRegion] {
        &self.regions
    }

    pub fn analyze_file(&self, path: &Path) -> Result<StatsRecord, ExtractError> {
        let bytes = std::fs::read(path)?;
        self.analyze_bytes(&bytes)
    }

    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<StatsRecord, ExtractError> {
        let img = decode_image(bytes)?;
        self.analyze(&img)
    }

    /// Run every region of the table over a decoded image.
    ///
    /// The returned record always holds one entry per region.
    pub fn analyze(&self, img: &Mat) -> Result<StatsRecord, ExtractError> {
        let now = Instant::now();

        let normalized = normalize_resolution(img)?;
        let gray = to_grayscale(&normalized)?;
        let prepare_time = now.elapsed();

        let mut record = StatsRecord::with_capacity(self.regions.len());
        for region in &self.regions {
            let value = self.read_region(&gray, region)?;
            log::debug!("{} = '{}'", region.name, value);
            record.insert(region.name.to_string(), value);
        }

        let total_time = now.elapsed();
        if total_time > SLOW_EXTRACTION {
            log::warn!(
                "Extraction took too long: {:?} (prepare {:?})",
                total_time,
                prepare_time
            );
        }

        Ok(record)
    }

    fn read_region(&self, gray: &Mat, region: &StatRegion) -> Result<String, ExtractError> {
        let Some(rect) = clip_to_image(region.rect(), gray.cols(), gray.rows()) else {
            log::debug!("Region {} lies outside the image, skipping", region.name);
            return Ok(String::new());
        };

        let binary = binarize_region(gray, rect, region.policy)?;
        if let Some(dir) = &self.dump_dir {
            dump_crop(dir, region.name, &binary);
        }
        let crop = mat_to_gray_image(&binary)?;

        match self.recognizer.recognize(&crop, &region.policy.ocr_config()) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(err) if self.strict_ocr => Err(ExtractError::Ocr {
                region: region.name,
                message: format!("{err:#}"),
            }),
            Err(err) => {
                log::warn!("OCR failed for {}: {:#}", region.name, err);
                Ok(String::new())
            }
        }
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<Mat, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::ImageDecode("empty input".to_string()));
    }

    let buffer = Vector::<u8>::from_slice(bytes);
    let img = imgcodecs::imdecode(&buffer, IMREAD_COLOR)
        .map_err(|e| ExtractError::ImageDecode(e.message))?;

    if img.empty() {
        return Err(ExtractError::ImageDecode(
            "unsupported or corrupt image data".to_string(),
        ));
    }

    Ok(img)
}

/// Scale to the reference canvas. Images already at 1920x1080 are copied
/// untouched.
pub fn normalize_resolution(img: &Mat) -> Result<Mat, ExtractError> {
    if img.cols() == REFERENCE_WIDTH && img.rows() == REFERENCE_HEIGHT {
        return Ok(img.try_clone()?);
    }

    let mut resized = Mat::default();
    imgproc::resize(
        img,
        &mut resized,
        Size::new(REFERENCE_WIDTH, REFERENCE_HEIGHT),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;
    Ok(resized)
}

pub fn to_grayscale(img: &Mat) -> Result<Mat, ExtractError> {
    let code = match img.channels() {
        1 => return Ok(img.try_clone()?),
        4 => imgproc::COLOR_BGRA2GRAY,
        _ => imgproc::COLOR_BGR2GRAY,
    };

    let mut gray = Mat::default();
    imgproc::cvt_color(img, &mut gray, code, 0, AlgorithmHint::ALGO_HINT_DEFAULT)?;
    Ok(gray)
}

/// Intersect `rect` with a `cols` x `rows` image, `None` when nothing is left.
pub fn clip_to_image(rect: Rect, cols: i32, rows: i32) -> Option<Rect> {
    let x1 = rect.x.max(0);
    let y1 = rect.y.max(0);
    let x2 = (rect.x + rect.width).min(cols);
    let y2 = (rect.y + rect.height).min(rows);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
}

/// Crop, upscale 2x with cubic interpolation and threshold per policy.
pub fn binarize_region(gray: &Mat, rect: Rect, policy: Policy) -> Result<Mat, ExtractError> {
    let roi = Mat::roi(gray, rect)?;

    let mut upscaled = Mat::default();
    imgproc::resize(
        &roi,
        &mut upscaled,
        Size::new(rect.width * 2, rect.height * 2),
        0.0,
        0.0,
        imgproc::INTER_CUBIC,
    )?;

    let threshold_type = match policy.binarization() {
        Binarization::Normal => imgproc::THRESH_BINARY,
        Binarization::Inverted => imgproc::THRESH_BINARY_INV,
    };
    let mut binary = Mat::default();
    imgproc::threshold(
        &upscaled,
        &mut binary,
        policy.threshold(),
        255.0,
        threshold_type,
    )?;

    Ok(binary)
}

fn mat_to_gray_image(mat: &Mat) -> Result<GrayImage, ExtractError> {
    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    GrayImage::from_raw(width, height, mat.data_bytes()?.to_vec()).ok_or_else(|| {
        ExtractError::OpenCv(opencv::Error::new(
            core::StsUnmatchedSizes,
            format!("binary crop of {width}x{height} is not a packed 8-bit image"),
        ))
    })
}

fn dump_crop(dir: &Path, name: &str, binary: &Mat) {
    let path = dir.join(format!("{name}.png"));
    match imgcodecs::imwrite(&path.to_string_lossy(), binary, &Vector::default()) {
        Ok(true) => {}
        Ok(false) => log::warn!("Could not write crop {}", path.display()),
        Err(e) => log::warn!("Could not write crop {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use opencv::core::{CV_8UC1, CV_8UC3, Scalar};

    #[test]
    fn clip_keeps_inner_rect() {
        let rect = Rect::new(10, 20, 30, 40);
        assert_eq!(clip_to_image(rect, 100, 100), Some(rect));
    }

    #[test]
    fn clip_trims_to_bounds() {
        assert_eq!(
            clip_to_image(Rect::new(-5, 90, 20, 20), 100, 100),
            Some(Rect::new(0, 90, 15, 10))
        );
    }

    #[test]
    fn clip_outside_is_none() {
        assert_eq!(clip_to_image(Rect::new(100, 0, 10, 10), 100, 100), None);
        assert_eq!(clip_to_image(Rect::new(0, 0, 0, 10), 100, 100), None);
        assert_eq!(clip_to_image(Rect::new(-20, 0, 20, 10), 100, 100), None);
    }

    #[test]
    fn reference_sized_image_is_not_resampled() -> Result<()> {
        let mut img = Mat::new_rows_cols_with_default(
            REFERENCE_HEIGHT,
            REFERENCE_WIDTH,
            CV_8UC3,
            Scalar::all(40.0),
        )?;
        imgproc::rectangle(
            &mut img,
            Rect::new(101, 203, 7, 3),
            Scalar::new(250.0, 10.0, 90.0, 0.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        let normalized = normalize_resolution(&img)?;
        assert_eq!(normalized.data_bytes()?, img.data_bytes()?);
        Ok(())
    }

    #[test]
    fn other_resolutions_are_scaled_to_reference() -> Result<()> {
        let img = Mat::new_rows_cols_with_default(900, 1600, CV_8UC3, Scalar::all(0.0))?;
        let normalized = normalize_resolution(&img)?;
        assert_eq!(normalized.cols(), REFERENCE_WIDTH);
        assert_eq!(normalized.rows(), REFERENCE_HEIGHT);
        Ok(())
    }

    #[test]
    fn binarize_doubles_crop_and_applies_polarity() -> Result<()> {
        // Light background with a dark block in the middle.
        let mut gray = Mat::new_rows_cols_with_default(100, 100, CV_8UC1, Scalar::all(230.0))?;
        imgproc::rectangle(
            &mut gray,
            Rect::new(40, 40, 20, 20),
            Scalar::all(20.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;
        let rect = Rect::new(30, 30, 40, 40);

        let inverted = binarize_region(&gray, rect, Policy::SingleDigit)?;
        assert_eq!((inverted.cols(), inverted.rows()), (80, 80));
        assert_eq!(*inverted.at_2d::<u8>(0, 0)?, 0);
        assert_eq!(*inverted.at_2d::<u8>(40, 40)?, 255);

        let normal = binarize_region(&gray, rect, Policy::Dial)?;
        assert_eq!(*normal.at_2d::<u8>(0, 0)?, 255);
        assert_eq!(*normal.at_2d::<u8>(40, 40)?, 0);
        Ok(())
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        assert!(matches!(
            decode_image(b"definitely not a png"),
            Err(ExtractError::ImageDecode(_))
        ));
        assert!(matches!(decode_image(&[]), Err(ExtractError::ImageDecode(_))));
    }

    #[test]
    fn grayscale_handles_all_channel_counts() -> Result<()> {
        for kind in [CV_8UC1, CV_8UC3, core::CV_8UC4] {
            let img = Mat::new_rows_cols_with_default(4, 4, kind, Scalar::all(128.0))?;
            assert_eq!(to_grayscale(&img)?.channels(), 1);
        }
        Ok(())
    }
}
