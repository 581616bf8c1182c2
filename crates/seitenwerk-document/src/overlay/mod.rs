// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay module — watermark geometry, glyph sources, the drawing canvas, and
// the compositor that puts them on pages.

pub mod canvas;
pub mod compositor;
pub mod geometry;
pub mod glyph;

pub use canvas::{Canvas, ContentCanvas, OverlayContent, render_placement};
pub use compositor::WatermarkCompositor;
pub use geometry::{OverlayShape, compute_placements};
pub use glyph::{CidFont, GlyphSource, StandardFont};
