// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drawing surface for overlays — a small 2D canvas abstraction and its PDF
// content-stream implementation.

use std::collections::HashSet;
use std::sync::Arc;

use lopdf::Object;
use lopdf::content::{Content, Operation};
use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::{OverlayPlacement, Rgb};

use super::glyph::GlyphSource;
use crate::image::ImageResource;

/// The drawing operations the compositor needs from a rendering backend.
///
/// Transform changes apply to everything drawn afterwards until the matching
/// `restore_state`.
pub trait Canvas {
    fn save_state(&mut self);
    fn restore_state(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    /// Counter-clockwise, in degrees.
    fn rotate(&mut self, degrees: f32);
    fn set_font(&mut self, font: &Arc<dyn GlyphSource>, size: f32);
    /// Fill colour plus the alpha used for both text and images.
    fn set_fill_color(&mut self, color: Rgb, alpha: f32);
    /// Draw `text` with its baseline starting at `(x, y)`.
    fn draw_text(&mut self, x: f32, y: f32, text: &str);
    /// Draw `image` stretched over the `width` x `height` box at `(x, y)`.
    fn draw_image(
        &mut self,
        image: &Arc<ImageResource>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    );
}

/// What to draw at each placement.
#[derive(Debug, Clone)]
pub enum OverlayContent<'a> {
    Text {
        text: &'a str,
        font: Arc<dyn GlyphSource>,
        font_size: f32,
        color: Rgb,
    },
    Image(Arc<ImageResource>),
}

/// Draw one overlay instance, rotated around the centre of its box.
pub fn render_placement(
    canvas: &mut dyn Canvas,
    placement: &OverlayPlacement,
    content: &OverlayContent<'_>,
) {
    let (cx, cy) = placement.center();
    let (half_w, half_h) = (placement.width / 2.0, placement.height / 2.0);

    canvas.save_state();
    canvas.translate(cx, cy);
    if placement.rotation_deg != 0.0 {
        canvas.rotate(placement.rotation_deg);
    }
    match content {
        OverlayContent::Text {
            text,
            font,
            font_size,
            color,
        } => {
            canvas.set_font(font, *font_size);
            canvas.set_fill_color(*color, placement.opacity);
            canvas.draw_text(-half_w, -half_h, text);
        }
        OverlayContent::Image(image) => {
            canvas.set_fill_color(Rgb::new(1.0, 1.0, 1.0), placement.opacity);
            canvas.draw_image(image, -half_w, -half_h, placement.width, placement.height);
        }
    }
    canvas.restore_state();
}

// -- PDF content stream canvas ------------------------------------------------

/// Resources an overlay surface refers to by name.
#[derive(Debug, Default)]
pub struct SurfaceResources {
    pub fonts: Vec<(String, Arc<dyn GlyphSource>)>,
    /// Graphics states carrying fill and stroke alpha.
    pub ext_states: Vec<(String, f32)>,
    pub images: Vec<(String, Arc<ImageResource>)>,
}

/// A finished overlay: content stream bytes plus the resources it names.
#[derive(Debug)]
pub struct OverlaySurface {
    pub content: Vec<u8>,
    pub resources: SurfaceResources,
}

/// Records canvas calls as PDF content stream operators.
///
/// Resource names are generated so they can be merged into an existing page's
/// resource dictionaries next to the page's own names. Names passed to
/// [`ContentCanvas::reserving`] are never generated.
#[derive(Debug, Default)]
pub struct ContentCanvas {
    operations: Vec<Operation>,
    resources: SurfaceResources,
    /// Names already bound on the target page or handed out by this canvas.
    taken: HashSet<String>,
    /// Encoder for subsequent `draw_text` calls.
    font: Option<Arc<dyn GlyphSource>>,
    font_operands: Vec<Object>,
}

impl ContentCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// A canvas whose resource names stay clear of `names`.
    pub fn reserving(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            taken: names.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn finish(self) -> Result<OverlaySurface> {
        let content = Content {
            operations: self.operations,
        }
        .encode()
        .map_err(|err| SeitenwerkError::Document(format!("cannot encode overlay: {}", err)))?;
        Ok(OverlaySurface {
            content,
            resources: self.resources,
        })
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    fn font_name(&mut self, font: &Arc<dyn GlyphSource>) -> String {
        if let Some((name, _)) = self
            .resources
            .fonts
            .iter()
            .find(|(_, known)| known.name() == font.name())
        {
            return name.clone();
        }
        let name = fresh_name(&mut self.taken, "SwF");
        self.resources.fonts.push((name.clone(), Arc::clone(font)));
        name
    }

    fn ext_state_name(&mut self, alpha: f32) -> String {
        if let Some((name, _)) = self
            .resources
            .ext_states
            .iter()
            .find(|(_, known)| *known == alpha)
        {
            return name.clone();
        }
        let name = fresh_name(&mut self.taken, "SwGs");
        self.resources.ext_states.push((name.clone(), alpha));
        name
    }

    fn image_name(&mut self, image: &Arc<ImageResource>) -> String {
        if let Some((name, _)) = self
            .resources
            .images
            .iter()
            .find(|(_, known)| known.id() == image.id())
        {
            return name.clone();
        }
        let name = fresh_name(&mut self.taken, "SwImg");
        self.resources.images.push((name.clone(), Arc::clone(image)));
        name
    }
}

/// The first `{prefix}{n}` (n = 1, 2, ...) not in `taken`, which is claimed.
fn fresh_name(taken: &mut HashSet<String>, prefix: &str) -> String {
    let mut counter = 1;
    loop {
        let candidate = format!("{prefix}{counter}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

impl Canvas for ContentCanvas {
    fn save_state(&mut self) {
        self.op("q", vec![]);
    }

    fn restore_state(&mut self) {
        self.op("Q", vec![]);
    }

    fn translate(&mut self, x: f32, y: f32) {
        let matrix = [1.0, 0.0, 0.0, 1.0, x, y];
        self.op("cm", matrix.into_iter().map(Object::Real).collect());
    }

    fn rotate(&mut self, degrees: f32) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let matrix = [cos, sin, -sin, cos, 0.0, 0.0];
        self.op("cm", matrix.into_iter().map(Object::Real).collect());
    }

    fn set_font(&mut self, font: &Arc<dyn GlyphSource>, size: f32) {
        let font_name = self.font_name(font);
        self.font = Some(Arc::clone(font));
        self.font_operands = vec![name(&font_name), Object::Real(size)];
    }

    fn set_fill_color(&mut self, color: Rgb, alpha: f32) {
        let state = self.ext_state_name(alpha);
        self.op("gs", vec![name(&state)]);
        self.op(
            "rg",
            vec![
                Object::Real(color.r),
                Object::Real(color.g),
                Object::Real(color.b),
            ],
        );
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str) {
        let Some(font) = self.font.clone() else {
            // No font selected; nothing sensible to draw.
            return;
        };
        self.op("BT", vec![]);
        self.op("Tf", self.font_operands.clone());
        self.op("Td", vec![Object::Real(x), Object::Real(y)]);
        self.op("Tj", vec![font.encode(text)]);
        self.op("ET", vec![]);
    }

    fn draw_image(
        &mut self,
        image: &Arc<ImageResource>,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) {
        let image_name = self.image_name(image);
        self.op("q", vec![]);
        let matrix = [width, 0.0, 0.0, height, x, y];
        self.op("cm", matrix.into_iter().map(Object::Real).collect());
        self.op("Do", vec![name(&image_name)]);
        self.op("Q", vec![]);
    }
}


#[cfg(test)]
mod tests {
    use super::recording::RecordingCanvas;
    use super::*;
    use crate::overlay::glyph::StandardFont;

    fn placement(rotation_deg: f32) -> OverlayPlacement {
        OverlayPlacement {
            x: 100.0,
            y: 200.0,
            width: 80.0,
            height: 20.0,
            rotation_deg,
            opacity: 0.25,
        }
    }

    fn helvetica() -> Arc<dyn GlyphSource> {
        Arc::new(StandardFont::helvetica())
    }

    #[test]
    fn text_rotates_around_box_centre() {
        let mut canvas = RecordingCanvas::default();
        let content = OverlayContent::Text {
            text: "DRAFT",
            font: helvetica(),
            font_size: 20.0,
            color: Rgb::GREY,
        };
        render_placement(&mut canvas, &placement(45.0), &content);
        assert_eq!(
            canvas.calls,
            vec![
                "save",
                "translate 140 210",
                "rotate 45",
                "font Helvetica 20",
                "fill 0.25",
                "text -40 -10 DRAFT",
                "restore",
            ]
        );
    }

    #[test]
    fn unrotated_image_skips_rotate() {
        let mut canvas = RecordingCanvas::default();
        let bytes = crate::image::processor::png_bytes(2, 2, image::Rgba([0, 0, 0, 255]));
        let image = Arc::new(
            ImageResource::prepare(&seitenwerk_core::ImageSource::Bytes(bytes), 100).unwrap(),
        );
        render_placement(&mut canvas, &placement(0.0), &OverlayContent::Image(image));
        assert!(!canvas.calls.iter().any(|call| call.starts_with("rotate")));
        assert!(canvas.calls.contains(&"image -40 -10 80 20".to_string()));
    }

    #[test]
    fn content_canvas_shares_resource_names() {
        let font = helvetica();
        let mut canvas = ContentCanvas::new();
        for _ in 0..3 {
            render_placement(
                &mut canvas,
                &placement(30.0),
                &OverlayContent::Text {
                    text: "X",
                    font: Arc::clone(&font),
                    font_size: 12.0,
                    color: Rgb::GREY,
                },
            );
        }
        let surface = canvas.finish().unwrap();
        assert_eq!(surface.resources.fonts.len(), 1);
        assert_eq!(surface.resources.ext_states, vec![("SwGs1".to_string(), 0.25)]);

        let text = String::from_utf8(surface.content).unwrap();
        assert_eq!(text.matches("BT").count(), 3);
        assert!(text.contains("/SwF1"));
        assert!(text.contains("/SwGs1 gs"));
    }

    #[test]
    fn reserved_names_are_skipped() {
        let mut canvas = ContentCanvas::reserving(["SwF1".to_string(), "SwGs1".to_string()]);
        render_placement(
            &mut canvas,
            &placement(0.0),
            &OverlayContent::Text {
                text: "X",
                font: helvetica(),
                font_size: 12.0,
                color: Rgb::GREY,
            },
        );
        let surface = canvas.finish().unwrap();
        assert_eq!(surface.resources.fonts[0].0, "SwF2");
        assert_eq!(surface.resources.ext_states, vec![("SwGs2".to_string(), 0.25)]);

        let text = String::from_utf8(surface.content).unwrap();
        assert!(text.contains("/SwF2"));
        assert!(!text.contains("/SwF1 "));
    }

    #[test]
    fn draw_text_without_font_is_ignored() {
        let mut canvas = ContentCanvas::new();
        canvas.draw_text(0.0, 0.0, "lost");
        assert!(canvas.finish().unwrap().content.is_empty());
    }
}
