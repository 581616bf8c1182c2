// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seitenwerk — Core types, page-range parsing, and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod naming;
pub mod range;
pub mod types;

pub use config::AppConfig;
pub use error::SeitenwerkError;
pub use range::{PageRangeSet, PageSelection};
pub use types::*;
