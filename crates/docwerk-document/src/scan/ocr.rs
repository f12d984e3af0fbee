// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR fallback for scanned PDFs.
//
// Recognises text on the page images embedded in a PDF using the `ocrs`
// crate, a pure-Rust OCR engine backed by neural network models executed via
// `rten`. Only available with the `ocr` feature.
//
// # Model Setup
//
// The engine needs two model files in one directory:
//
// - `text-detection.rten`: locates text regions in the image.
// - `text-recognition.rten`: decodes characters from detected regions.
//
// Running `ocrs-cli` once downloads them to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is the default location.

use std::path::{Path, PathBuf};

use docwerk_core::CancelSignal;
use docwerk_core::error::{DocwerkError, Result};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;
use crate::pdf::reader::PdfReader;

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where to load models from.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Use `dir` when given, the default cache directory otherwise.
    pub fn from_optional_dir(dir: Option<&Path>) -> Self {
        dir.map(Self::from_dir).unwrap_or_default()
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for model in [&self.detection_model_path, &self.recognition_model_path] {
            if !model.exists() {
                return Err(DocwerkError::Ocr(format!(
                    "model not found at {}; run `ocrs-cli` once to download models",
                    model.display()
                )));
            }
        }
        Ok(())
    }
}

/// Loaded OCR models. Loading is the expensive step; recognition reuses them.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load both models named by `config`.
    ///
    /// `ocrs` and `rten` must be built in release mode; debug builds are
    /// 10-100x slower.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR models");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            DocwerkError::Ocr(format!(
                "failed to load detection model from {}: {}",
                config.detection_model_path.display(),
                err
            ))
        })?;
        let recognition_model = Model::load_file(&config.recognition_model_path).map_err(|err| {
            DocwerkError::Ocr(format!(
                "failed to load recognition model from {}: {}",
                config.recognition_model_path.display(),
                err
            ))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| DocwerkError::Ocr(format!("failed to initialise OCR engine: {}", err)))?;

        Ok(Self { engine })
    }

    /// Recognise all text in one image, lines separated by newlines.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            DocwerkError::Ocr(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| DocwerkError::Ocr(format!("OCR preprocessing failed: {}", err)))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| DocwerkError::Ocr(format!("OCR text recognition failed: {}", err)))?;

        debug!(lines = text.lines().count(), "OCR recognition complete");
        Ok(text)
    }

    /// Recognise every JPEG page image in the PDF at `path`, in object order.
    /// Cancellation is checked before each image.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn recognize_pdf(&self, path: &Path, cancel: &CancelSignal) -> Result<String> {
        let images = PdfReader::open(path)?.jpeg_images();
        if images.is_empty() {
            return Err(DocwerkError::Ocr(format!(
                "no page images to recognise in {}",
                path.display()
            )));
        }

        let mut pages = Vec::with_capacity(images.len());
        for (index, bytes) in images.iter().enumerate() {
            cancel.check()?;
            let processor = match ImageProcessor::from_bytes(bytes) {
                Ok(processor) => processor,
                Err(err) => {
                    warn!(index, %err, "Skipping undecodable page image");
                    continue;
                }
            };
            let text = self.recognize_text(processor.as_dynamic())?;
            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        info!(images = images.len(), recognised = pages.len(), "OCR fallback complete");
        Ok(pages.join("\n\n"))
    }
}
