// Tesseract-based text recognition

use super::TextRecognizer;
use crate::policy::{EngineMode, OcrConfig, PageSegmentation};
use anyhow::{Context, Result};
use image::GrayImage;
use tesseract::{OcrEngineMode, PageSegMode, Tesseract};

/// Tesseract engine, one API instance per call. Only the init parameters
/// are kept between calls.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    datapath: Option<String>,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(datapath: Option<String>, language: impl Into<String>) -> Self {
        Self {
            datapath,
            language: language.into(),
        }
    }

    /// Fail early if the engine or its language data is missing on this host.
    pub fn check_available(&self) -> Result<()> {
        Tesseract::new(self.datapath.as_deref(), Some(&self.language)).with_context(|| {
            format!(
                "Tesseract could not be initialized with language '{}'",
                self.language
            )
        })?;
        Ok(())
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(None, "eng")
    }
}

fn engine_mode(mode: EngineMode) -> OcrEngineMode {
    match mode {
        EngineMode::Default => OcrEngineMode::Default,
        EngineMode::LstmOnly => OcrEngineMode::LstmOnly,
    }
}

fn page_seg_mode(mode: PageSegmentation) -> PageSegMode {
    match mode {
        PageSegmentation::SingleBlock => PageSegMode::PsmSingleBlock,
        PageSegmentation::SingleLine => PageSegMode::PsmSingleLine,
        PageSegmentation::SingleChar => PageSegMode::PsmSingleChar,
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, img: &GrayImage, config: &OcrConfig) -> Result<String> {
        let (width, height) = img.dimensions();

        let mut tesseract = Tesseract::new_with_oem(
            self.datapath.as_deref(),
            Some(&self.language),
            engine_mode(config.engine_mode),
        )?;
        tesseract.set_page_seg_mode(page_seg_mode(config.page_segmentation));

        let text = tesseract
            .set_variable("tessedit_char_whitelist", config.whitelist)?
            .set_frame(img.as_raw(), width as i32, height as i32, 1, width as i32)?
            .get_text()?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;
    use image::Luma;

    #[test]
    fn maps_every_policy_config() {
        for policy in [
            Policy::Dial,
            Policy::ZeroSensitiveDigit,
            Policy::SingleDigit,
            Policy::MultiDigit,
        ] {
            let config = policy.ocr_config();
            // Only checks that each variant has a mapping.
            let _ = engine_mode(config.engine_mode);
            let _ = page_seg_mode(config.page_segmentation);
        }
    }

    #[test]
    #[ignore] // needs tesseract and eng.traineddata on the host
    fn blank_crop_reads_as_whitespace() -> Result<()> {
        let engine = TesseractRecognizer::default();
        engine.check_available()?;

        let blank = GrayImage::from_pixel(80, 96, Luma([255]));
        let text = engine.recognize(&blank, &Policy::SingleDigit.ocr_config())?;
        assert!(text.trim().is_empty(), "got '{text}'");
        Ok(())
    }
}
