// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for page composition and overlays.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeitenwerkError};

/// Where insertion pages go relative to the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertMode {
    /// Before the first target page.
    Head,
    /// After the last target page.
    Tail,
    /// After the first `n` target pages (0 = before page 1).
    Position(usize),
}

/// Page box dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter, used when a page carries no usable MediaBox.
    pub const LETTER: Self = Self::new(612.0, 792.0);
}

/// RGB colour with components in 0.0–1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const GREY: Self = Self::new(0.5, 0.5, 0.5);
}

impl Default for Rgb {
    fn default() -> Self {
        Self::GREY
    }
}

/// The five anchors a single overlay can be pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Position {
    pub const ALL: [Self; 5] = [
        Self::Center,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Parse the user-facing keyword (`center`, `top-left`, `top_left`, ...).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "center" | "centre" => Some(Self::Center),
            "top_left" => Some(Self::TopLeft),
            "top_right" => Some(Self::TopRight),
            "bottom_left" => Some(Self::BottomLeft),
            "bottom_right" => Some(Self::BottomRight),
            _ => None,
        }
    }
}

/// One overlay instance per page, or a grid covering the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Single(Position),
    Tiled,
}

impl Default for Layout {
    fn default() -> Self {
        Self::Tiled
    }
}

/// Text watermark content and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub content: String,
    pub font_size_pt: f32,
    pub color: Rgb,
    /// 0.0 (invisible) to 1.0 (opaque).
    pub opacity: f32,
}

/// Where the watermark raster comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Image watermark source and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageOverlay {
    pub source: ImageSource,
    /// Rescale factor applied to the decoded raster, in percent.
    pub scale_percent: u32,
    /// Counter-clockwise rotation around each placement's centre.
    pub rotation_deg: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Text(TextOverlay),
    Image(ImageOverlay),
}

/// Everything needed to watermark a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayParameters {
    pub kind: OverlayKind,
    pub layout: Layout,
}

impl OverlayParameters {
    pub fn text(overlay: TextOverlay, layout: Layout) -> Self {
        Self {
            kind: OverlayKind::Text(overlay),
            layout,
        }
    }

    pub fn image(overlay: ImageOverlay, layout: Layout) -> Self {
        Self {
            kind: OverlayKind::Image(overlay),
            layout,
        }
    }

    /// Opacity attached to every placement.
    pub fn opacity(&self) -> f32 {
        match &self.kind {
            OverlayKind::Text(text) => text.opacity,
            OverlayKind::Image(image) => image.opacity,
        }
    }

    /// Reject parameters no page could be rendered with.
    pub fn validate(&self) -> Result<()> {
        let opacity = self.opacity();
        if !(0.0..=1.0).contains(&opacity) {
            return Err(SeitenwerkError::InvalidParameter(format!(
                "opacity must be within 0.0-1.0, got {opacity}"
            )));
        }
        match &self.kind {
            OverlayKind::Text(text) => {
                if text.content.trim().is_empty() {
                    return Err(SeitenwerkError::InvalidParameter(
                        "watermark text is empty".into(),
                    ));
                }
                if !(text.font_size_pt.is_finite() && text.font_size_pt > 0.0) {
                    return Err(SeitenwerkError::InvalidParameter(format!(
                        "font size must be positive, got {}",
                        text.font_size_pt
                    )));
                }
            }
            OverlayKind::Image(image) => {
                if image.scale_percent == 0 {
                    return Err(SeitenwerkError::InvalidParameter(
                        "image scale must be at least 1%".into(),
                    ));
                }
                if !image.rotation_deg.is_finite() {
                    return Err(SeitenwerkError::InvalidParameter(
                        "image rotation must be a finite angle".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One computed overlay instance on a page.
///
/// `(x, y)` is the lower-left corner of the unrotated overlay box; the box is
/// rotated by `rotation_deg` around its own centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation_deg: f32,
    pub opacity: f32,
}

impl OverlayPlacement {
    /// Rotation pivot.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
