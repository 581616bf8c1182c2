// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark compositor — render overlay placements onto every page of a copy
// of the source document.

use std::collections::HashMap;
use std::sync::Arc;

use lopdf::{Dictionary, Object, ObjectId, Stream};
use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::{OverlayKind, OverlayParameters};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::canvas::{ContentCanvas, OverlayContent, OverlaySurface, render_placement};
use super::geometry::{OverlayShape, compute_placements};
use super::glyph::{CidFont, GlyphSource, StandardFont};
use crate::image::ImageResource;
use crate::pdf::Document;
use crate::pdf::builder::DocumentBuilder;
use crate::pdf::compose::{ProgressCallback, Tracker};

/// Applies text or image watermarks.
///
/// Holds only configuration (glyph sources and an optional progress
/// callback); every `apply` call works on its own copy of the source and its
/// own overlay resources.
pub struct WatermarkCompositor<'a> {
    glyph_sources: Vec<Arc<dyn GlyphSource>>,
    fallback: Arc<dyn GlyphSource>,
    progress: Option<ProgressCallback<'a>>,
}

impl Default for WatermarkCompositor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> WatermarkCompositor<'a> {
    /// Helvetica for Latin text, STSong-Light for Chinese.
    pub fn new() -> Self {
        Self::with_glyph_sources(vec![
            Arc::new(StandardFont::helvetica()),
            Arc::new(CidFont::chinese_simplified()),
        ])
    }

    /// Sources are tried in order; Helvetica is used when none covers the
    /// overlay text.
    pub fn with_glyph_sources(glyph_sources: Vec<Arc<dyn GlyphSource>>) -> Self {
        Self {
            glyph_sources,
            fallback: Arc::new(StandardFont::helvetica()),
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: impl FnMut(f32) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// The first configured glyph source that can show `text`.
    pub fn glyph_source_for(&self, text: &str) -> Arc<dyn GlyphSource> {
        match self.glyph_sources.iter().find(|source| source.covers(text)) {
            Some(source) => Arc::clone(source),
            None => {
                warn!(
                    fallback = self.fallback.name(),
                    "No glyph source covers the watermark text, some characters will be replaced"
                );
                Arc::clone(&self.fallback)
            }
        }
    }

    /// Watermark every page of `source` and return the result.
    ///
    /// Either every page is watermarked or an error is returned; the source is
    /// never modified.
    #[instrument(skip_all, fields(pages = source.page_count(), layout = ?params.layout))]
    pub fn apply(&mut self, source: &Document, params: &OverlayParameters) -> Result<Document> {
        params.validate()?;

        // Resolve the overlay before touching any page so that a bad image
        // fails the call up front.
        let (shape, content) = match &params.kind {
            OverlayKind::Text(text) => {
                let font = self.glyph_source_for(&text.content);
                let shape = OverlayShape::Text {
                    width: font.text_width(&text.content, text.font_size_pt),
                    font_size: text.font_size_pt,
                    opacity: text.opacity,
                };
                let content = OverlayContent::Text {
                    text: &text.content,
                    font,
                    font_size: text.font_size_pt,
                    color: text.color,
                };
                (shape, content)
            }
            OverlayKind::Image(image) => {
                let resource =
                    Arc::new(ImageResource::prepare(&image.source, image.scale_percent)?);
                let shape = OverlayShape::Image {
                    width: resource.width() as f32,
                    height: resource.height() as f32,
                    rotation_deg: image.rotation_deg,
                    opacity: image.opacity,
                };
                (shape, OverlayContent::Image(resource))
            }
        };

        info!("Applying watermark");

        let mut builder = DocumentBuilder::new();
        builder.push_pages(source, 1..=source.page_count() as u32, || {})?;
        let mut result = builder.finish();

        let pages = result.pages();
        let mut tracker = Tracker::new(pages.len(), self.progress.as_mut());
        let mut merger = SurfaceMerger::default();
        for page in &pages {
            let (origin_x, origin_y) = page.origin();
            let mut canvas = ContentCanvas::reserving(bound_resource_names(&result, page.id));
            let placements = compute_placements(page.size(), &shape, params.layout);
            for mut placement in placements.iter().copied() {
                placement.x += origin_x;
                placement.y += origin_y;
                render_placement(&mut canvas, &placement, &content);
            }
            merger.merge(result.lopdf_mut(), page.id, canvas.finish()?)?;
            debug!(page = page.number, placements = placements.len(), "Page watermarked");
            tracker.step();
        }

        Ok(result)
    }
}

/// Layers overlay surfaces onto pages of one result document, installing each
/// shared resource (font, graphics state, image) once.
#[derive(Default)]
struct SurfaceMerger {
    fonts: HashMap<String, ObjectId>,
    ext_states: HashMap<u32, ObjectId>,
    images: HashMap<Uuid, ObjectId>,
    /// `q` stream opening every watermarked page.
    save_state: Option<ObjectId>,
}

impl SurfaceMerger {
    /// Isolate the page's own content in `q ... Q` and append the overlay after
    /// it, so the overlay is drawn on top with a clean graphics state.
    fn merge(
        &mut self,
        doc: &mut lopdf::Document,
        page_id: ObjectId,
        surface: OverlaySurface,
    ) -> Result<()> {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|err| SeitenwerkError::Document(format!("cannot read page: {}", err)))?;
        let existing_contents = match page.get(b"Contents") {
            Ok(Object::Array(parts)) => parts.clone(),
            Ok(single) => vec![single.clone()],
            Err(_) => Vec::new(),
        };
        let mut resources = match page.get(b"Resources") {
            Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };

        let OverlaySurface {
            content,
            resources: used,
        } = surface;

        if !used.fonts.is_empty() {
            let mut fonts = sub_dictionary(doc, &resources, b"Font");
            for (name, glyph) in &used.fonts {
                let id = *self
                    .fonts
                    .entry(glyph.name().to_string())
                    .or_insert_with(|| glyph.install(doc));
                fonts.set(name.as_bytes().to_vec(), Object::Reference(id));
            }
            resources.set("Font", Object::Dictionary(fonts));
        }

        if !used.ext_states.is_empty() {
            let mut states = sub_dictionary(doc, &resources, b"ExtGState");
            for (name, alpha) in &used.ext_states {
                let id = *self.ext_states.entry(alpha.to_bits()).or_insert_with(|| {
                    doc.add_object(Dictionary::from_iter(vec![
                        ("Type", Object::Name(b"ExtGState".to_vec())),
                        ("ca", Object::Real(*alpha)),
                        ("CA", Object::Real(*alpha)),
                    ]))
                });
                states.set(name.as_bytes().to_vec(), Object::Reference(id));
            }
            resources.set("ExtGState", Object::Dictionary(states));
        }

        if !used.images.is_empty() {
            let mut xobjects = sub_dictionary(doc, &resources, b"XObject");
            for (name, image) in &used.images {
                let id = match self.images.get(&image.id()) {
                    Some(&id) => id,
                    None => {
                        let id = doc.add_object(image.to_xobject()?);
                        self.images.insert(image.id(), id);
                        id
                    }
                };
                xobjects.set(name.as_bytes().to_vec(), Object::Reference(id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        let save_state = *self.save_state.get_or_insert_with(|| {
            doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()))
        });
        let mut overlay = b"Q\n".to_vec();
        overlay.extend(content);
        let mut overlay_stream = Stream::new(Dictionary::new(), overlay);
        overlay_stream
            .compress()
            .map_err(|err| SeitenwerkError::Document(format!("cannot compress overlay: {}", err)))?;
        let overlay_id = doc.add_object(overlay_stream);

        let mut contents = Vec::with_capacity(existing_contents.len() + 2);
        contents.push(Object::Reference(save_state));
        contents.extend(existing_contents);
        contents.push(Object::Reference(overlay_id));

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| SeitenwerkError::Document(format!("cannot update page: {}", err)))?;
        page.set("Contents", Object::Array(contents));
        page.set("Resources", Object::Dictionary(resources));
        Ok(())
    }
}

/// Resource categories an overlay adds entries to.
const OVERLAY_CATEGORIES: [&[u8]; 3] = [b"Font", b"ExtGState", b"XObject"];

/// Names the page already binds in the overlay's resource categories.
fn bound_resource_names(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let Some(resources) = doc.page_resources(page_id) else {
        return Vec::new();
    };
    OVERLAY_CATEGORIES
        .into_iter()
        .filter_map(|category| resources.get(category).ok())
        .filter_map(|value| doc.resolve(value))
        .filter_map(|value| value.as_dict().ok())
        .flat_map(|dict| {
            dict.iter()
                .map(|(name, _)| String::from_utf8_lossy(name).into_owned())
        })
        .collect()
}

/// A copy of one resource category, resolving an indirect dictionary.
fn sub_dictionary(doc: &lopdf::Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key) {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    }
}
