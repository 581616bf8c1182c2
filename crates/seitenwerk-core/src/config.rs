// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SeitenwerkError};
use crate::types::{Layout, Rgb};

/// Persistent user settings. The core never reads these implicitly; the
/// presentation layer loads them and passes explicit values down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory results are written to (None = current directory).
    pub output_dir: Option<PathBuf>,
    /// Replace existing output files instead of refusing.
    pub overwrite_existing: bool,
    /// Defaults for the watermark command.
    pub watermark: WatermarkDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            overwrite_existing: false,
            watermark: WatermarkDefaults::default(),
        }
    }
}

/// Watermark values used when the caller leaves them unspecified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkDefaults {
    pub text: String,
    pub font_size_pt: f32,
    pub color: Rgb,
    pub text_opacity: f32,
    pub image_scale_percent: u32,
    pub image_rotation_deg: f32,
    pub image_opacity: f32,
    pub layout: Layout,
}

impl Default for WatermarkDefaults {
    fn default() -> Self {
        Self {
            text: "CONFIDENTIAL".into(),
            font_size_pt: 30.0,
            color: Rgb::GREY,
            text_opacity: 0.2,
            image_scale_percent: 50,
            image_rotation_deg: 0.0,
            image_opacity: 0.2,
            layout: Layout::Tiled,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|err| {
            SeitenwerkError::Config(format!("{} is not valid: {}", path.display(), err))
        })?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Write settings as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Directory results go to.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
