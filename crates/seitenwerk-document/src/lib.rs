// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// seitenwerk-document — Document processing for Seitenwerk.
//
// Provides page composition (merge, split, insert, replace), watermark overlays
// (geometry, glyph sources, compositing), password protection, and
// embedded-image extraction.

pub mod image;
pub mod overlay;
pub mod pdf;

// Re-export the primary types so callers can use `seitenwerk_document::Composer` etc.
pub use image::{HarvestedImage, ImageFormatTag, ImageHarvester};
pub use overlay::{GlyphSource, WatermarkCompositor, compute_placements};
pub use pdf::{Composer, Document, Page};
