// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, downscale and re-encode embedded page images using
// the `image` crate. Used by the compressor and the OCR fallback.

use docwerk_core::error::{DocwerkError, Result};
use image::DynamicImage;
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`,
/// so steps chain:
///
/// ```ignore
/// let smaller = ImageProcessor::from_bytes(&jpeg)?
///     .fit_within(1755)
///     .to_jpeg_bytes(75)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| DocwerkError::Image(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Longer of width and height.
    pub fn long_edge(&self) -> u32 {
        self.image.width().max(self.image.height())
    }

    pub fn is_grayscale(&self) -> bool {
        matches!(self.image, DynamicImage::ImageLuma8(_))
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Downscale so neither edge exceeds `max_edge`, preserving aspect ratio.
    /// Images already within bounds are returned untouched.
    #[instrument(skip(self), fields(max_edge))]
    pub fn fit_within(self, max_edge: u32) -> Self {
        if self.long_edge() <= max_edge || max_edge == 0 {
            return self;
        }
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            max_edge,
            "Downscaling image"
        );
        let resized = self
            .image
            .resize(max_edge, max_edge, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as JPEG with the given quality (1-100). Grayscale images stay
    /// single-channel; everything else is written as RGB.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        let encoded = if self.is_grayscale() {
            self.image.to_luma8().write_with_encoder(encoder)
        } else {
            self.image.to_rgb8().write_with_encoder(encoder)
        };
        encoded.map_err(|err| DocwerkError::Image(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::jpeg_bytes;

    #[test]
    fn fit_within_preserves_aspect_ratio() {
        let processor = ImageProcessor::from_bytes(&jpeg_bytes(400, 200)).expect("decode");
        let resized = processor.fit_within(100);
        assert_eq!(resized.width(), 100);
        assert_eq!(resized.height(), 50);
    }

    #[test]
    fn fit_within_leaves_small_images_alone() {
        let processor = ImageProcessor::from_bytes(&jpeg_bytes(40, 30)).expect("decode");
        let same = processor.fit_within(100);
        assert_eq!((same.width(), same.height()), (40, 30));
    }

    #[test]
    fn grayscale_jpeg_round_trips_as_luma() {
        let gray = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(
            image::GrayImage::from_fn(64, 64, |x, y| image::Luma([((x + y) * 2) as u8])),
        ));
        let bytes = gray.to_jpeg_bytes(60).expect("encode");
        let decoded = ImageProcessor::from_bytes(&bytes).expect("decode again");
        assert!(decoded.is_grayscale());
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        let err = ImageProcessor::from_bytes(b"not an image").err().expect("must fail");
        assert!(matches!(err, DocwerkError::Image(_)));
    }
}
