// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image harvesting — walk the image XObjects of selected pages and hand each
// one out as a self-contained, encoded file.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Object, ObjectId, Stream};
use seitenwerk_core::PageSelection;
use seitenwerk_core::error::Result;
use seitenwerk_core::naming;
use tracing::{debug, info, instrument, warn};

use super::processor::ImageProcessor;
use crate::pdf::Document;

/// Form XObjects are followed at most this deep.
const MAX_FORM_DEPTH: usize = 16;

/// File format of a harvested image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormatTag {
    /// DCT-encoded stream, emitted verbatim.
    Jpeg,
    /// JPX-encoded stream, emitted verbatim.
    Jpeg2000,
    /// 8-bit raster re-encoded as PNG.
    Png,
    /// Decoded stream bytes with no recognised pixel layout.
    Raw,
}

impl ImageFormatTag {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Jpeg2000 => "jp2",
            Self::Png => "png",
            Self::Raw => "bin",
        }
    }
}

impl fmt::Display for ImageFormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One embedded image, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedImage {
    /// 1-based page number.
    pub page: u32,
    /// 1-based position among the images of that page.
    pub index: u32,
    pub bytes: Vec<u8>,
    pub format: ImageFormatTag,
}

impl HarvestedImage {
    pub fn file_name(&self) -> String {
        naming::extracted_image(self.page, self.index, self.format.extension())
    }
}

/// Lazy sequence of the images on the selected pages.
///
/// Pages are visited in ascending order and images in the order the page's
/// /XObject dictionary lists them. Images drawn through a Form XObject are
/// listed where the form appears; an image object reached twice on the same
/// page is reported once. Each image is only decoded when the iterator
/// reaches it. The sequence cannot be restarted.
pub struct ImageHarvester<'d> {
    doc: &'d Document,
    pages: std::vec::IntoIter<u32>,
    current_page: u32,
    pending: std::vec::IntoIter<&'d Stream>,
    index: u32,
}

impl<'d> ImageHarvester<'d> {
    /// Validate the selection up front; iteration itself never fails on
    /// page numbers.
    pub fn new(doc: &'d Document, selection: &PageSelection) -> Result<Self> {
        let pages: Vec<u32> = selection.resolve(doc.page_count())?.iter().collect();
        debug!(pages = pages.len(), "Harvesting images");
        Ok(Self {
            doc,
            pages: pages.into_iter(),
            current_page: 0,
            pending: Vec::new().into_iter(),
            index: 0,
        })
    }

    /// Write every remaining image into `dir` (created if missing) and return
    /// the written paths in sequence order.
    #[instrument(skip(self), fields(dir = %dir.as_ref().display()))]
    pub fn write_images(self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for image in self {
            let image = image?;
            let path = dir.join(image.file_name());
            std::fs::write(&path, &image.bytes)?;
            written.push(path);
        }
        info!(count = written.len(), "Extracted images to {}", dir.display());
        Ok(written)
    }

    /// Image XObject streams of one page, in dictionary order.
    fn page_images(&self, number: u32) -> Result<Vec<&'d Stream>> {
        let doc = self.doc;
        let page_id = doc.page_id(number)?;
        let mut walk = XObjectWalk {
            doc,
            images: Vec::new(),
            seen: HashSet::new(),
        };
        if let Some(resources) = doc.page_resources(page_id) {
            walk.visit(resources, 0);
        }
        Ok(walk.images)
    }
}

/// Depth-first collection of image XObjects through nested forms.
struct XObjectWalk<'d> {
    doc: &'d Document,
    images: Vec<&'d Stream>,
    /// Indirect XObjects already visited; also breaks form cycles.
    seen: HashSet<ObjectId>,
}

impl<'d> XObjectWalk<'d> {
    fn visit(&mut self, resources: &'d Dictionary, depth: usize) {
        let doc = self.doc;
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|xobjects| doc.resolve(xobjects))
            .and_then(|xobjects| xobjects.as_dict().ok())
        else {
            return;
        };

        for (_, value) in xobjects.iter() {
            if let Object::Reference(id) = value
                && !self.seen.insert(*id)
            {
                continue;
            }
            let Some(stream) = doc.resolve(value).and_then(|value| value.as_stream().ok()) else {
                continue;
            };
            match name_of(doc, stream.dict.get(b"Subtype").ok()) {
                Some(b"Image") => self.images.push(stream),
                Some(b"Form") if depth < MAX_FORM_DEPTH => {
                    if let Some(inner) = stream
                        .dict
                        .get(b"Resources")
                        .ok()
                        .and_then(|inner| doc.resolve(inner))
                        .and_then(|inner| inner.as_dict().ok())
                    {
                        self.visit(inner, depth + 1);
                    }
                }
                Some(b"Form") => warn!(depth, "Form XObjects nested too deep, skipping"),
                _ => {}
            }
        }
    }
}

impl Iterator for ImageHarvester<'_> {
    type Item = Result<HarvestedImage>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(stream) = self.pending.next() {
                self.index += 1;
                let (bytes, format) = encode(self.doc, stream);
                return Some(Ok(HarvestedImage {
                    page: self.current_page,
                    index: self.index,
                    bytes,
                    format,
                }));
            }

            let number = self.pages.next()?;
            match self.page_images(number) {
                Ok(images) => {
                    self.current_page = number;
                    self.index = 0;
                    self.pending = images.into_iter();
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

// -- Stream decoding ----------------------------------------------------------

fn encode(doc: &Document, stream: &Stream) -> (Vec<u8>, ImageFormatTag) {
    let filters = filters(doc, stream);
    match filters.as_slice() {
        [only] if only == b"DCTDecode" => return (stream.content.clone(), ImageFormatTag::Jpeg),
        [only] if only == b"JPXDecode" => {
            return (stream.content.clone(), ImageFormatTag::Jpeg2000);
        }
        _ => {}
    }

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        match stream.decompressed_content() {
            Ok(samples) => samples,
            Err(err) => {
                warn!(%err, "Cannot decode image stream, keeping encoded bytes");
                return (stream.content.clone(), ImageFormatTag::Raw);
            }
        }
    };

    match to_png(doc, stream, &samples) {
        Some(png) => (png, ImageFormatTag::Png),
        None => (samples, ImageFormatTag::Raw),
    }
}

/// Colour components of a direct (non-indexed) colour space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Components {
    Gray,
    Rgb,
    Cmyk,
}

impl Components {
    fn from_count(count: i64) -> Option<Self> {
        match count {
            1 => Some(Self::Gray),
            3 => Some(Self::Rgb),
            4 => Some(Self::Cmyk),
            _ => None,
        }
    }

    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Some(Self::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(Self::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(Self::Cmyk),
            _ => None,
        }
    }

    fn count(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }
}

/// An image colour space the harvester can turn into pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ColorSpace {
    Direct(Components),
    /// Palette of `base` colours, one entry per sample value.
    Indexed { base: Components, lookup: Vec<u8> },
}

fn color_space(doc: &Document, object: &Object) -> Option<ColorSpace> {
    let object = doc.resolve(object)?;
    if let Object::Array(parts) = object
        && matches!(name_of(doc, parts.first()), Some(b"Indexed" | b"I"))
    {
        let base = base_components(doc, parts.get(1)?)?;
        let lookup = match doc.resolve(parts.get(3)?)? {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(stream) => stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone()),
            _ => return None,
        };
        return Some(ColorSpace::Indexed { base, lookup });
    }
    base_components(doc, object).map(ColorSpace::Direct)
}

/// Components of a device, calibrated or ICC-based colour space.
fn base_components(doc: &Document, object: &Object) -> Option<Components> {
    match doc.resolve(object)? {
        Object::Name(name) => Components::from_name(name),
        Object::Array(parts) => match name_of(doc, parts.first())? {
            b"ICCBased" => {
                let profile = doc.resolve(parts.get(1)?)?.as_stream().ok()?;
                let count = profile
                    .dict
                    .get(b"N")
                    .ok()
                    .and_then(|count| doc.resolve(count))
                    .and_then(|count| count.as_i64().ok());
                count.and_then(Components::from_count).or_else(|| {
                    name_of(doc, profile.dict.get(b"Alternate").ok())
                        .and_then(Components::from_name)
                })
            }
            name => Components::from_name(name),
        },
        _ => None,
    }
}

/// Re-encode Gray, RGB, CMYK or palette samples as PNG.
fn to_png(doc: &Document, stream: &Stream, samples: &[u8]) -> Option<Vec<u8>> {
    let dict = &stream.dict;
    let integer = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|value| doc.resolve(value))
            .and_then(|value| value.as_i64().ok())
    };
    let bits = integer(b"BitsPerComponent")?;
    let width = u32::try_from(integer(b"Width")?).ok()?;
    let height = u32::try_from(integer(b"Height")?).ok()?;
    if width == 0 || height == 0 {
        return None;
    }

    let (components, samples) = match color_space(doc, dict.get(b"ColorSpace").ok()?)? {
        ColorSpace::Direct(components) if bits == 8 => (components, Cow::Borrowed(samples)),
        ColorSpace::Direct(_) => return None,
        ColorSpace::Indexed { base, lookup } => {
            let expanded = expand_palette(samples, width, height, bits, base, &lookup)?;
            (base, Cow::Owned(expanded))
        }
    };

    let image = raster(components, width, height, &samples)?;
    ImageProcessor::from_dynamic(image)
        .to_png_bytes()
        .map_err(|err| warn!(%err, "PNG re-encoding failed"))
        .ok()
}

/// Build an 8-bit image from packed samples. `None` when the sample buffer is
/// too short or its size does not fit in memory.
fn raster(
    components: Components,
    width: u32,
    height: u32,
    samples: &[u8],
) -> Option<DynamicImage> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    let samples = samples.get(..pixels.checked_mul(components.count())?)?;
    let image = match components {
        Components::Gray => {
            DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, samples.to_vec())?)
        }
        Components::Rgb => {
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, samples.to_vec())?)
        }
        Components::Cmyk => {
            let rgb = samples
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let k = 255 - u16::from(cmyk[3]);
                    let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
                    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
                })
                .collect();
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, rgb)?)
        }
    };
    Some(image)
}

/// Replace each 1, 2, 4 or 8-bit palette index by its colour. Rows start on a
/// byte boundary; indices past the end of the palette become black.
fn expand_palette(
    samples: &[u8],
    width: u32,
    height: u32,
    bits: i64,
    base: Components,
    lookup: &[u8],
) -> Option<Vec<u8>> {
    let bits = match bits {
        1 | 2 | 4 | 8 => bits as usize,
        _ => return None,
    };
    let (width, height) = (width as usize, height as usize);
    let row_len = width.checked_mul(bits)?.div_ceil(8);
    if samples.len() < row_len.checked_mul(height)? {
        return None;
    }

    let entry_len = base.count();
    let mask = ((1u16 << bits) - 1) as u8;
    let mut expanded = Vec::with_capacity(width.checked_mul(height)?.checked_mul(entry_len)?);
    for row in samples.chunks_exact(row_len).take(height) {
        for x in 0..width {
            let bit = x * bits;
            let shift = 8 - bits - bit % 8;
            let index = usize::from((row[bit / 8] >> shift) & mask);
            match lookup.get(index * entry_len..(index + 1) * entry_len) {
                Some(colour) => expanded.extend_from_slice(colour),
                None => expanded.extend(std::iter::repeat_n(0, entry_len)),
            }
        }
    }
    Some(expanded)
}

fn filters(doc: &Document, stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter").ok().and_then(|value| doc.resolve(value)) {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(names)) => names
            .iter()
            .filter_map(|name| name.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn name_of<'a>(doc: &'a Document, value: Option<&'a Object>) -> Option<&'a [u8]> {
    doc.resolve(value?)?.as_name().ok()
}
