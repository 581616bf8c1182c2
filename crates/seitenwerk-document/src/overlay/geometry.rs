// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay geometry — where each watermark instance goes on a page. Pure
// arithmetic; nothing here draws.

use seitenwerk_core::{Layout, OverlayPlacement, PageSize, Position};

/// Fixed tilt of tiled text.
pub const TILED_TEXT_ROTATION_DEG: f32 = 30.0;
/// Fixed tilt of a single text overlay.
pub const SINGLE_TEXT_ROTATION_DEG: f32 = 45.0;
/// Distance of the corner anchors from the page edges, as a fraction.
pub const EDGE_MARGIN: f32 = 0.05;
/// Horizontal tile pitch as a multiple of the overlay width.
const TILE_PITCH: f32 = 1.2;
/// Extra vertical gap between rows of tiled text, in points.
const TEXT_ROW_GAP_PT: f32 = 100.0;
/// Spacing floor so that degenerate overlays still produce a finite grid.
const MIN_SPACING_PT: f32 = 1.0;
/// Ceiling on grid positions along one axis. Spacing is widened on oversized
/// pages so the grid still spans the page.
pub const MAX_TILES_PER_AXIS: usize = 512;
/// Page extents and spacings are clamped to this so grid arithmetic stays
/// finite.
const MAX_COORDINATE: f32 = f32::MAX / 8.0;

/// The measured overlay box the engine lays out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayShape {
    /// Text measured with the glyph source that will render it.
    Text {
        width: f32,
        font_size: f32,
        opacity: f32,
    },
    /// A prepared raster at its drawn size.
    Image {
        width: f32,
        height: f32,
        rotation_deg: f32,
        opacity: f32,
    },
}

impl OverlayShape {
    fn size(&self) -> (f32, f32) {
        match *self {
            Self::Text {
                width, font_size, ..
            } => (width, font_size),
            Self::Image { width, height, .. } => (width, height),
        }
    }

    fn opacity(&self) -> f32 {
        match *self {
            Self::Text { opacity, .. } | Self::Image { opacity, .. } => opacity,
        }
    }

    fn rotation(&self, layout: Layout) -> f32 {
        match (*self, layout) {
            (Self::Text { .. }, Layout::Tiled) => TILED_TEXT_ROTATION_DEG,
            (Self::Text { .. }, Layout::Single(_)) => SINGLE_TEXT_ROTATION_DEG,
            (Self::Image { rotation_deg, .. }, _) => rotation_deg,
        }
    }

    /// Distance between neighbouring tiles along x and y.
    fn spacing(&self) -> (f32, f32) {
        let (x, y) = match *self {
            Self::Text {
                width, font_size, ..
            } => (width * TILE_PITCH, font_size + TEXT_ROW_GAP_PT),
            Self::Image { width, height, .. } => (width * TILE_PITCH, height * TILE_PITCH),
        };
        (x.max(MIN_SPACING_PT), y.max(MIN_SPACING_PT))
    }
}

// -- Anchors ------------------------------------------------------------------

/// How the overlay box sits relative to its anchor point along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    /// The box starts at the anchor.
    Start,
    /// The box is centred on the anchor.
    Center,
    /// The box ends at the anchor.
    End,
}

impl Align {
    fn offset(self, extent: f32) -> f32 {
        match self {
            Self::Start => 0.0,
            Self::Center => extent / 2.0,
            Self::End => extent,
        }
    }
}

/// Anchor point as page fractions, plus box alignment on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AnchorFormula {
    fx: f32,
    fy: f32,
    align_x: Align,
    align_y: Align,
}

const fn anchor_formula(position: Position) -> AnchorFormula {
    const NEAR: f32 = EDGE_MARGIN;
    const FAR: f32 = 1.0 - EDGE_MARGIN;
    let (fx, fy, align_x, align_y) = match position {
        Position::Center => (0.5, 0.5, Align::Center, Align::Center),
        Position::TopLeft => (NEAR, FAR, Align::Start, Align::End),
        Position::TopRight => (FAR, FAR, Align::End, Align::End),
        Position::BottomLeft => (NEAR, NEAR, Align::Start, Align::Start),
        Position::BottomRight => (FAR, NEAR, Align::End, Align::Start),
    };
    AnchorFormula {
        fx,
        fy,
        align_x,
        align_y,
    }
}

// -- Placement ----------------------------------------------------------------

/// Compute every overlay instance for one page.
///
/// Coordinates are relative to the page's lower-left corner. A single layout
/// yields exactly one placement; a tiled layout covers the page plus one tile
/// of margin on each side.
pub fn compute_placements(
    page: PageSize,
    shape: &OverlayShape,
    layout: Layout,
) -> Vec<OverlayPlacement> {
    let (width, height) = shape.size();
    let rotation_deg = shape.rotation(layout);
    let opacity = shape.opacity();
    let place = |x: f32, y: f32| OverlayPlacement {
        x,
        y,
        width,
        height,
        rotation_deg,
        opacity,
    };

    match layout {
        Layout::Single(position) => {
            let formula = anchor_formula(position);
            vec![place(
                formula.fx * page.width - formula.align_x.offset(width),
                formula.fy * page.height - formula.align_y.offset(height),
            )]
        }
        Layout::Tiled => {
            let (spacing_x, spacing_y) = shape.spacing();
            let xs = grid_axis(page.width, spacing_x);
            let ys = grid_axis(page.height, spacing_y);
            ys.iter()
                .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
                .map(|(x, y)| place(x, y))
                .collect()
        }
    }
}

/// Grid coordinates from `-spacing` up to (and past) `extent + spacing`.
///
/// Values are computed by index rather than accumulated so that long rows do
/// not drift. At most [`MAX_TILES_PER_AXIS`] values are produced.
fn grid_axis(extent: f32, spacing: f32) -> Vec<f32> {
    let extent = if extent.is_nan() {
        0.0
    } else {
        extent.clamp(0.0, MAX_COORDINATE)
    };
    let widest = extent / (MAX_TILES_PER_AXIS - 3) as f32;
    let spacing = spacing.max(widest).clamp(MIN_SPACING_PT, MAX_COORDINATE);

    let at = |step: usize| -spacing + step as f32 * spacing;
    let steps = ((extent + 2.0 * spacing) / spacing).ceil();
    let mut count = (steps as usize).clamp(2, MAX_TILES_PER_AXIS);
    // Rounding must never drop the last tile short of the far edge.
    if count < MAX_TILES_PER_AXIS && at(count - 1) < extent {
        count += 1;
    }
    (0..count).map(at).collect()
}
