// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Seitenwerk.

use thiserror::Error;

/// Top-level error type for all Seitenwerk operations.
#[derive(Debug, Error)]
pub enum SeitenwerkError {
    // -- Expression / parameter validation --
    #[error("malformed page expression: {token:?}")]
    MalformedExpression { token: String },

    #[error("page {page} out of range (1-{max_page})")]
    OutOfRange { page: u64, max_page: usize },

    #[error("page count mismatch: {targets} target page(s) but {sources} replacement page(s)")]
    CountMismatch { targets: usize, sources: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no input documents supplied")]
    NoInput,

    // -- Document model --
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("document operation failed: {0}")]
    Document(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    // -- Overlays --
    #[error("overlay resource unusable: {0}")]
    OverlayResource(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SeitenwerkError {
    /// Whether the error was raised while validating caller input, before any
    /// document was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MalformedExpression { .. }
                | Self::OutOfRange { .. }
                | Self::CountMismatch { .. }
                | Self::InvalidParameter(_)
                | Self::NoInput
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SeitenwerkError>;
