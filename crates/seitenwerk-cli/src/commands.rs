// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command implementations — run the document engine and write its results,
// leaving existing files alone unless overwriting is enabled.

use std::path::{Path, PathBuf};

use chrono::Local;
use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::{
    AppConfig, ImageOverlay, ImageSource, InsertMode, Layout, OverlayParameters, PageRangeSet,
    PageSelection, Position, TextOverlay, naming,
};
use seitenwerk_document::{Composer, Document, ImageHarvester, WatermarkCompositor};
use tracing::{debug, info};

use crate::{Command, GlobalArgs, InsertAt, OverlayChoice, SplitMode};

/// Where and how results are written.
#[derive(Debug)]
struct Output {
    dir: PathBuf,
    name: Option<String>,
    overwrite: bool,
}

impl Output {
    fn new(global: &GlobalArgs, config: &AppConfig) -> Self {
        Self {
            dir: global
                .output_dir
                .clone()
                .unwrap_or_else(|| config.output_dir()),
            name: global.name.clone(),
            overwrite: global.force || config.overwrite_existing,
        }
    }

    /// `--name` wins over the generated default.
    fn file(&self, default_name: String) -> PathBuf {
        let name = match &self.name {
            Some(name) => naming::with_pdf_extension(name),
            None => default_name,
        };
        self.dir.join(name)
    }

    fn stem<'a>(&'a self, input_stem: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(input_stem)
    }

    /// Fail before anything is written if a target already exists.
    fn claim(&self, paths: &[PathBuf]) -> Result<()> {
        if self.overwrite {
            return Ok(());
        }
        match paths.iter().find(|path| path.exists()) {
            Some(existing) => Err(SeitenwerkError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", existing.display()),
            ))),
            None => Ok(()),
        }
    }

    fn write(&self, outputs: Vec<(PathBuf, Document)>) -> Result<()> {
        let paths: Vec<PathBuf> = outputs.iter().map(|(path, _)| path.clone()).collect();
        self.claim(&paths)?;
        std::fs::create_dir_all(&self.dir)?;
        for (path, mut doc) in outputs {
            doc.write(&path)?;
            println!("{}", path.display());
        }
        Ok(())
    }
}

/// Run one command to completion.
pub fn run(global: &GlobalArgs, command: Command) -> Result<()> {
    let config = match &global.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let output = Output::new(global, &config);
    debug!(?output, "Output settings");

    let mut composer = Composer::with_progress(|fraction| {
        debug!(percent = (fraction * 100.0).round(), "Progress");
    });

    match command {
        Command::Merge { inputs } => {
            let sources = inputs.iter().map(Document::open).collect::<Result<Vec<_>>>()?;
            let refs: Vec<&Document> = sources.iter().collect();
            let merged = composer.merge(&refs)?;
            output.write(vec![(output.file(naming::merged(&Local::now())), merged)])
        }

        Command::Split { input, mode } => {
            let source = Document::open(&input)?;
            let input_stem = naming::stem_of(&input);
            let stem = output.stem(&input_stem);
            let outputs = split(&mut composer, &source, &mode)?;
            let named = match outputs {
                SplitOutput::Pages(docs) => docs
                    .into_iter()
                    .enumerate()
                    .map(|(i, doc)| (output.dir.join(naming::split_page(stem, i + 1)), doc))
                    .collect(),
                SplitOutput::Parts(docs) => docs
                    .into_iter()
                    .enumerate()
                    .map(|(i, doc)| (output.dir.join(naming::split_part(stem, i + 1)), doc))
                    .collect(),
                SplitOutput::Extract(doc) => {
                    vec![(output.file(naming::custom_range(&Local::now())), doc)]
                }
            };
            output.write(named)
        }

        Command::Insert {
            target,
            insertion,
            pages,
            at,
        } => {
            let target = Document::open(&target)?;
            let insertion = Document::open(&insertion)?;
            let selection = PageSelection::from_expression(&pages, insertion.page_count())?;
            let result = composer.insert(&target, &insertion, &selection, insert_mode(&at))?;
            output.write(vec![(output.file(naming::inserted(&Local::now())), result)])
        }

        Command::Replace {
            target,
            replacement,
            targets,
            sources,
        } => {
            let target = Document::open(&target)?;
            let replacement = Document::open(&replacement)?;
            let targets = PageRangeSet::parse(&targets, target.page_count())?;
            let sources = PageRangeSet::parse(&sources, replacement.page_count())?;
            let result = composer.replace(&target, &replacement, &targets, &sources)?;
            output.write(vec![(output.file(naming::replaced(&Local::now())), result)])
        }

        Command::Watermark {
            input,
            overlay,
            font_size,
            scale,
            rotation,
            opacity,
            position,
            tiled,
        } => {
            let layout = layout(position.as_deref(), tiled, config.watermark.layout)?;
            let params = overlay_parameters(
                &config,
                overlay,
                WatermarkStyle {
                    font_size,
                    scale,
                    rotation,
                    opacity_percent: opacity,
                },
                layout,
            );
            let source = Document::open(&input)?;
            let path = output.file(naming::watermarked(&naming::stem_of(&input)));
            output.claim(std::slice::from_ref(&path))?;

            let result = WatermarkCompositor::new()
                .with_progress(|fraction| {
                    debug!(percent = (fraction * 100.0).round(), "Progress");
                })
                .apply(&source, &params)?;
            output.write(vec![(path, result)])
        }

        Command::ExtractImages { input, pages } => {
            let source = Document::open(&input)?;
            let selection = PageSelection::from_expression(&pages, source.page_count())?;
            let dir_name = match &output.name {
                Some(name) => name.clone(),
                None => naming::images_dir(&naming::stem_of(&input)),
            };
            let dir = output.dir.join(dir_name);
            if !output.overwrite && is_non_empty_dir(&dir) {
                return Err(SeitenwerkError::Io(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("{} already contains files", dir.display()),
                )));
            }

            let written = ImageHarvester::new(&source, &selection)?.write_images(&dir)?;
            info!(count = written.len(), "Images extracted");
            for path in &written {
                println!("{}", path.display());
            }
            Ok(())
        }

        Command::Encrypt { input, password } => {
            let source = Document::open(&input)?;
            let encrypted = source.encrypt(&password)?;
            output.write(vec![(
                output.file(naming::encrypted(&naming::stem_of(&input))),
                encrypted,
            )])
        }
    }
}

// -- Argument mapping ---------------------------------------------------------

enum SplitOutput {
    Pages(Vec<Document>),
    Parts(Vec<Document>),
    Extract(Document),
}

fn split(composer: &mut Composer<'_>, source: &Document, mode: &SplitMode) -> Result<SplitOutput> {
    if let Some(every) = mode.every {
        return composer.split_by_count(source, every).map(SplitOutput::Parts);
    }
    if let Some(expression) = &mode.ranges {
        let ranges = PageRangeSet::parse(expression, source.page_count())?;
        return composer.split_by_ranges(source, &ranges).map(SplitOutput::Extract);
    }
    composer.split_single(source).map(SplitOutput::Pages)
}

fn insert_mode(at: &InsertAt) -> InsertMode {
    match (at.head, at.tail, at.at) {
        (true, _, _) => InsertMode::Head,
        (_, true, _) => InsertMode::Tail,
        (_, _, Some(n)) => InsertMode::Position(n),
        // clap guarantees one of the three.
        _ => InsertMode::Tail,
    }
}

fn layout(position: Option<&str>, tiled: bool, default: Layout) -> Result<Layout> {
    match (position, tiled) {
        (Some(keyword), _) => Position::from_keyword(keyword)
            .map(Layout::Single)
            .ok_or_else(|| {
                SeitenwerkError::InvalidParameter(format!("unknown watermark position \"{keyword}\""))
            }),
        (None, true) => Ok(Layout::Tiled),
        (None, false) => Ok(default),
    }
}

/// Style flags left unset fall back to the configured defaults.
#[derive(Debug, Default)]
struct WatermarkStyle {
    font_size: Option<f32>,
    scale: Option<u32>,
    rotation: Option<f32>,
    opacity_percent: Option<f32>,
}

fn overlay_parameters(
    config: &AppConfig,
    overlay: OverlayChoice,
    style: WatermarkStyle,
    layout: Layout,
) -> OverlayParameters {
    let defaults = &config.watermark;
    let opacity = |fallback: f32| style.opacity_percent.map_or(fallback, |percent| percent / 100.0);

    match overlay.image {
        Some(path) => OverlayParameters::image(
            ImageOverlay {
                source: ImageSource::Path(path),
                scale_percent: style.scale.unwrap_or(defaults.image_scale_percent),
                rotation_deg: style.rotation.unwrap_or(defaults.image_rotation_deg),
                opacity: opacity(defaults.image_opacity),
            },
            layout,
        ),
        None => OverlayParameters::text(
            TextOverlay {
                content: overlay.text.unwrap_or_else(|| defaults.text.clone()),
                font_size_pt: style.font_size.unwrap_or(defaults.font_size_pt),
                color: defaults.color,
                opacity: opacity(defaults.text_opacity),
            },
            layout,
        ),
    }
}

fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_some())
}
