// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — watermark raster preparation and embedded-image extraction.

pub mod harvest;
pub mod processor;

pub use harvest::{HarvestedImage, ImageFormatTag, ImageHarvester};
pub use processor::{ImageProcessor, ImageResource};
