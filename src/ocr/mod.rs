// OCR boundary

use crate::policy::OcrConfig;
use anyhow::Result;
use image::GrayImage;

pub mod tesseract_ocr;

/// Trait for OCR engines that read text out of a single binarized crop
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text in `img`
    ///
    /// # Arguments
    ///
    /// * `img` - Binarized region, already upscaled
    /// * `config` - Whitelist and page segmentation for this region
    ///
    /// # Returns
    ///
    /// The raw engine output, surrounding whitespace included
    fn recognize(&self, img: &GrayImage, config: &OcrConfig) -> Result<String>;
}
