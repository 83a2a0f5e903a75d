#![allow(dead_code)]

use anyhow::Result;
use image::GrayImage;
use match_stats_ocr::{ocr::TextRecognizer, policy::OcrConfig};
use opencv::{
    core::{CV_8UC3, Mat, Scalar, Vector},
    imgcodecs,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reports the whitelist it was called with and the number of white pixels,
/// padded with whitespace like a real engine.
#[derive(Default)]
pub struct WhitelistEcho {
    calls: AtomicUsize,
}

impl WhitelistEcho {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for WhitelistEcho {
    fn recognize(&self, img: &GrayImage, config: &OcrConfig) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let white = img.pixels().filter(|p| p.0[0] == 255).count();
        Ok(format!("  {}|{}\n", config.whitelist, white))
    }
}

pub struct FailingRecognizer;

impl TextRecognizer for FailingRecognizer {
    fn recognize(&self, _img: &GrayImage, _config: &OcrConfig) -> Result<String> {
        anyhow::bail!("engine not reachable")
    }
}

/// Solid BGR screen of the given size.
pub fn uniform_screen(width: i32, height: i32, value: f64) -> Result<Mat> {
    Ok(Mat::new_rows_cols_with_default(
        height,
        width,
        CV_8UC3,
        Scalar::all(value),
    )?)
}

pub fn encode_png(img: &Mat) -> Result<Vec<u8>> {
    let mut buffer = Vector::<u8>::new();
    if !imgcodecs::imencode(".png", img, &mut buffer, &Vector::default())? {
        anyhow::bail!("PNG encoding failed");
    }
    Ok(buffer.to_vec())
}
