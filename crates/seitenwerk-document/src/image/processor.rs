// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, flatten, and rescale watermark rasters, then hand
// them over as PDF image XObjects. Operates on in-memory images using the
// `image` crate.

use std::fmt;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Object, Stream};
use seitenwerk_core::ImageSource;
use seitenwerk_core::error::{Result, SeitenwerkError};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let resource = ImageProcessor::open("logo.png")?
///     .flatten_onto_white()
///     .scale_percent(50)
///     .into_resource();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            SeitenwerkError::OverlayResource(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            SeitenwerkError::OverlayResource(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    pub fn from_source(source: &ImageSource) -> Result<Self> {
        match source {
            ImageSource::Path(path) => Self::open(path),
            ImageSource::Bytes(data) => Self::from_bytes(data),
        }
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

    // -- Transformations ------------------------------------------------------

    /// Composite any transparency onto a white background. Paletted and
    /// grayscale images come out as plain RGB.
    pub fn flatten_onto_white(self) -> Self {
        if !self.image.color().has_alpha() {
            return Self {
                image: DynamicImage::ImageRgb8(self.image.to_rgb8()),
            };
        }

        let rgba = self.image.to_rgba8();
        let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let alpha = u32::from(a);
            let blend = |channel: u8| -> u8 {
                ((u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
            };
            image::Rgb([blend(r), blend(g), blend(b)])
        });
        debug!("Transparency flattened onto white");
        Self {
            image: DynamicImage::ImageRgb8(flattened),
        }
    }

    /// Rescale both dimensions by `percent`, each clamped to at least 1 px.
    /// Uses Lanczos3 filtering.
    #[instrument(skip(self), fields(percent))]
    pub fn scale_percent(self, percent: u32) -> Self {
        let scale = |dimension: u32| -> u32 {
            ((u64::from(dimension) * u64::from(percent)) / 100).clamp(1, u64::from(u32::MAX))
                as u32
        };
        let (width, height) = (scale(self.image.width()), scale(self.image.height()));
        if (width, height) == (self.image.width(), self.image.height()) {
            return self;
        }

        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            width,
            height,
            "Rescaling image"
        );
        let resized =
            self.image
                .resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Freeze the current image as an RGB overlay resource.
    pub fn into_resource(self) -> ImageResource {
        let rgb = self.image.to_rgb8();
        ImageResource {
            id: Uuid::new_v4(),
            width: rgb.width(),
            height: rgb.height(),
            rgb: rgb.into_raw(),
        }
    }

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| {
                SeitenwerkError::Document(format!("image encoding failed: {}", err))
            })?;
        Ok(buffer)
    }
}

/// A decoded, rescaled watermark raster, alive for one compositor call.
///
/// The `id` is unique per preparation, so concurrent calls never share or
/// overwrite each other's resource.
pub struct ImageResource {
    id: Uuid,
    width: u32,
    height: u32,
    /// Packed 8-bit RGB samples, row-major.
    rgb: Vec<u8>,
}

impl fmt::Debug for ImageResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageResource")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl ImageResource {
    /// Decode, flatten, and rescale an overlay image source.
    #[instrument(skip_all, fields(scale_percent = scale_percent))]
    pub fn prepare(source: &ImageSource, scale_percent: u32) -> Result<Self> {
        let resource = ImageProcessor::from_source(source)?
            .flatten_onto_white()
            .scale_percent(scale_percent)
            .into_resource();
        debug!(
            id = %resource.id,
            width = resource.width,
            height = resource.height,
            "Overlay image prepared"
        );
        Ok(resource)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// A Flate-compressed `DeviceRGB` image XObject.
    pub fn to_xobject(&self) -> Result<Stream> {
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(i64::from(self.width))),
            ("Height", Object::Integer(i64::from(self.height))),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]);
        let mut stream = Stream::new(dict, self.rgb.clone());
        stream.compress().map_err(|err| {
            SeitenwerkError::Document(format!("cannot compress overlay image: {}", err))
        })?;
        Ok(stream)
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32, pixel: image::Rgba<u8>) -> Vec<u8> {
    ImageProcessor::from_dynamic(DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width, height, pixel,
    )))
    .to_png_bytes()
    .expect("PNG encodes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_pixels_become_white() {
        let bytes = png_bytes(2, 2, image::Rgba([0, 0, 0, 0]));
        let resource = ImageProcessor::from_bytes(&bytes)
            .unwrap()
            .flatten_onto_white()
            .into_resource();
        assert!(resource.rgb.iter().all(|&sample| sample == 255));
    }

    #[test]
    fn opaque_pixels_keep_colour() {
        let bytes = png_bytes(1, 1, image::Rgba([10, 20, 30, 255]));
        let resource = ImageProcessor::from_bytes(&bytes)
            .unwrap()
            .flatten_onto_white()
            .into_resource();
        assert_eq!(resource.rgb, vec![10, 20, 30]);
    }

    #[test]
    fn scale_halves_dimensions() {
        let bytes = png_bytes(40, 20, image::Rgba([0, 0, 255, 255]));
        let resource = ImageResource::prepare(&ImageSource::Bytes(bytes), 50).unwrap();
        assert_eq!((resource.width(), resource.height()), (20, 10));
        assert_eq!(resource.rgb.len(), 20 * 10 * 3);
    }

    #[test]
    fn scale_never_reaches_zero() {
        let bytes = png_bytes(3, 3, image::Rgba([0, 0, 0, 255]));
        let resource = ImageResource::prepare(&ImageSource::Bytes(bytes), 1).unwrap();
        assert_eq!((resource.width(), resource.height()), (1, 1));
    }

    #[test]
    fn undecodable_bytes_are_overlay_errors() {
        let err = ImageResource::prepare(&ImageSource::Bytes(b"nope".to_vec()), 50).unwrap_err();
        assert!(matches!(err, SeitenwerkError::OverlayResource(_)));
    }

    #[test]
    fn missing_file_is_overlay_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ImageSource::Path(dir.path().join("missing.png"));
        assert!(matches!(
            ImageResource::prepare(&source, 50),
            Err(SeitenwerkError::OverlayResource(_))
        ));
    }

    #[test]
    fn preparations_are_unique() {
        let bytes = png_bytes(1, 1, image::Rgba([0, 0, 0, 255]));
        let source = ImageSource::Bytes(bytes);
        let first = ImageResource::prepare(&source, 100).unwrap();
        let second = ImageResource::prepare(&source, 100).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn xobject_is_compressed_rgb() {
        // Large enough for Flate to shrink; tiny rasters are stored as is.
        let bytes = png_bytes(64, 64, image::Rgba([200, 100, 50, 255]));
        let resource = ImageResource::prepare(&ImageSource::Bytes(bytes), 100).unwrap();
        let stream = resource.to_xobject().unwrap();
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 64);
        assert!(stream.dict.has(b"Filter"));
        assert_eq!(stream.decompressed_content().unwrap(), resource.rgb);
    }
}
