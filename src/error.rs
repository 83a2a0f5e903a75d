use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not decode image: {0}")]
    ImageDecode(String),
    #[error("could not read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("image processing failed: {0}")]
    OpenCv(#[from] opencv::Error),
    #[error("OCR failed for region {region}: {message}")]
    Ocr { region: &'static str, message: String },
}

impl ExtractError {
    /// True when the input itself is at fault rather than the processing.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, ExtractError::ImageDecode(_))
    }
}
