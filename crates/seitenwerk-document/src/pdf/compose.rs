// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composition — merge, split, insert, and replace pages across documents.
//
// Every operation reads its sources and builds a new result document; sources
// are never modified and no page content is re-encoded.

use std::collections::HashMap;

use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::{InsertMode, PageRangeSet, PageSelection};
use tracing::{debug, info, instrument};

use super::builder::DocumentBuilder;
use super::document::Document;

/// Advisory progress reporting: called with the completed fraction (0.0, 1.0]
/// after each page.
pub type ProgressCallback<'a> = Box<dyn FnMut(f32) + 'a>;

/// Stateless page composition over immutable source documents.
///
/// The only thing a `Composer` holds is an optional progress callback; each
/// call computes its own totals.
///
/// ```ignore
/// let merged = Composer::new().merge(&[&a, &b])?;
/// let parts = Composer::with_progress(|f| println!("{:.0}%", f * 100.0))
///     .split_by_count(&merged, 2)?;
/// ```
#[derive(Default)]
pub struct Composer<'a> {
    progress: Option<ProgressCallback<'a>>,
}

impl<'a> Composer<'a> {
    pub fn new() -> Self {
        Self { progress: None }
    }

    pub fn with_progress(callback: impl FnMut(f32) + 'a) -> Self {
        Self {
            progress: Some(Box::new(callback)),
        }
    }

    // -- Merge ----------------------------------------------------------------

    /// Concatenate every page of every source, in input order.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub fn merge(&mut self, sources: &[&Document]) -> Result<Document> {
        if sources.is_empty() {
            return Err(SeitenwerkError::NoInput);
        }

        let total: usize = sources.iter().map(|doc| doc.page_count()).sum();
        info!(total_pages = total, "Merging PDFs");

        let mut tracker = Tracker::new(total, self.progress.as_mut());
        let mut builder = DocumentBuilder::new();
        for source in sources {
            builder.push_pages(source, page_numbers(source), || tracker.step())?;
        }

        debug!(pages = builder.page_count(), "Merge complete");
        Ok(builder.finish())
    }

    // -- Split ----------------------------------------------------------------

    /// One single-page document per source page.
    #[instrument(skip_all, fields(pages = source.page_count()))]
    pub fn split_single(&mut self, source: &Document) -> Result<Vec<Document>> {
        self.split_by_count(source, 1)
    }

    /// Consecutive chunks of `pages_per_chunk` pages; the last may be shorter.
    #[instrument(skip_all, fields(pages = source.page_count(), pages_per_chunk = pages_per_chunk))]
    pub fn split_by_count(
        &mut self,
        source: &Document,
        pages_per_chunk: usize,
    ) -> Result<Vec<Document>> {
        if pages_per_chunk < 1 {
            return Err(SeitenwerkError::InvalidParameter(
                "pages per chunk must be at least 1".into(),
            ));
        }

        let total = source.page_count();
        info!(total, pages_per_chunk, "Splitting PDF");

        let mut tracker = Tracker::new(total, self.progress.as_mut());
        let numbers: Vec<u32> = page_numbers(source).collect();
        let mut outputs = Vec::with_capacity(total.div_ceil(pages_per_chunk));
        for chunk in numbers.chunks(pages_per_chunk) {
            let mut builder = DocumentBuilder::new();
            builder.push_pages(source, chunk.iter().copied(), || tracker.step())?;
            outputs.push(builder.finish());
        }

        debug!(outputs = outputs.len(), "Split complete");
        Ok(outputs)
    }

    /// The selected pages, ascending, as a single document.
    #[instrument(skip_all, fields(pages = source.page_count(), selected = ranges.len()))]
    pub fn split_by_ranges(&mut self, source: &Document, ranges: &PageRangeSet) -> Result<Document> {
        ranges.check_within(source.page_count())?;
        info!(ranges = %ranges, "Extracting page ranges");

        let mut tracker = Tracker::new(ranges.len(), self.progress.as_mut());
        let mut builder = DocumentBuilder::new();
        builder.push_pages(source, ranges.iter(), || tracker.step())?;
        Ok(builder.finish())
    }

    // -- Insert ---------------------------------------------------------------

    /// Place the selected insertion pages at the head, tail, or after the first
    /// `n` target pages.
    #[instrument(skip_all, fields(target_pages = target.page_count(), mode = ?mode))]
    pub fn insert(
        &mut self,
        target: &Document,
        insertion: &Document,
        selection: &PageSelection,
        mode: InsertMode,
    ) -> Result<Document> {
        let target_count = target.page_count();
        let split_at = match mode {
            InsertMode::Head => 0,
            InsertMode::Tail => target_count,
            InsertMode::Position(n) if n <= target_count => n,
            InsertMode::Position(n) => {
                return Err(SeitenwerkError::OutOfRange {
                    page: n as u64,
                    max_page: target_count,
                });
            }
        };
        let inserted = selection.resolve(insertion.page_count())?;

        info!(split_at, inserted = inserted.len(), "Inserting pages");

        let mut tracker = Tracker::new(target_count + inserted.len(), self.progress.as_mut());
        let mut builder = DocumentBuilder::new();
        let target_numbers: Vec<u32> = page_numbers(target).collect();
        let (before, after) = target_numbers.split_at(split_at);

        builder.push_pages(target, before.iter().copied(), || tracker.step())?;
        builder.push_pages(insertion, inserted.iter(), || tracker.step())?;
        builder.push_pages(target, after.iter().copied(), || tracker.step())?;
        Ok(builder.finish())
    }

    // -- Replace --------------------------------------------------------------

    /// Substitute target pages with replacement pages, pairing both sets in
    /// ascending order. All other target pages stay in place.
    #[instrument(skip_all, fields(targets = target_positions.len(), sources = source_positions.len()))]
    pub fn replace(
        &mut self,
        target: &Document,
        replacement: &Document,
        target_positions: &PageRangeSet,
        source_positions: &PageRangeSet,
    ) -> Result<Document> {
        if target_positions.len() != source_positions.len() {
            return Err(SeitenwerkError::CountMismatch {
                targets: target_positions.len(),
                sources: source_positions.len(),
            });
        }
        target_positions.check_within(target.page_count())?;
        source_positions.check_within(replacement.page_count())?;

        let mapping: HashMap<u32, u32> = target_positions
            .iter()
            .zip(source_positions.iter())
            .collect();
        info!(replaced = mapping.len(), "Replacing pages");

        let mut tracker = Tracker::new(target.page_count(), self.progress.as_mut());
        let mut builder = DocumentBuilder::new();
        for number in page_numbers(target) {
            match mapping.get(&number) {
                Some(&source_number) => builder.push_page(replacement, source_number)?,
                None => builder.push_page(target, number)?,
            };
            tracker.step();
        }
        Ok(builder.finish())
    }
}

/// 1-based page numbers of a document.
fn page_numbers(doc: &Document) -> std::ops::RangeInclusive<u32> {
    1..=doc.page_count() as u32
}

/// Turns page steps into fractions for the optional callback.
pub(crate) struct Tracker<'c, 'a> {
    total: usize,
    done: usize,
    callback: Option<&'c mut ProgressCallback<'a>>,
}

impl<'c, 'a> Tracker<'c, 'a> {
    pub(crate) fn new(total: usize, callback: Option<&'c mut ProgressCallback<'a>>) -> Self {
        Self {
            total,
            done: 0,
            callback,
        }
    }

    pub(crate) fn step(&mut self) {
        self.done += 1;
        if let Some(callback) = self.callback.as_mut()
            && self.total > 0
        {
            callback(self.done as f32 / self.total as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{page_text, sample_pdf, sample_pdf_sized};

    fn texts(doc: &Document) -> Vec<String> {
        (1..=doc.page_count() as u32)
            .map(|number| {
                let text = page_text(doc, number);
                let start = text.find('(').map_or(0, |i| i + 1);
                let end = text[start..].find(')').map_or(text.len(), |i| start + i);
                text[start..end].to_string()
            })
            .collect()
    }

    #[test]
    fn merge_concatenates_in_order() {
        let a = sample_pdf(2, "A");
        let b = sample_pdf(1, "B");
        let merged = Composer::new().merge(&[&a, &b]).unwrap();
        assert_eq!(texts(&merged), vec!["A-Page-1", "A-Page-2", "B-Page-1"]);
    }

    #[test]
    fn merge_without_sources_fails() {
        assert!(matches!(
            Composer::new().merge(&[]),
            Err(SeitenwerkError::NoInput)
        ));
    }

    #[test]
    fn merge_same_document_twice() {
        let a = sample_pdf(2, "A");
        let merged = Composer::new().merge(&[&a, &a]).unwrap();
        assert_eq!(merged.page_count(), 4);
        assert_eq!(texts(&merged)[2], "A-Page-1");
    }

    #[test]
    fn split_single_after_merge_round_trips() {
        let a = sample_pdf(2, "A");
        let b = sample_pdf(3, "B");
        let merged = Composer::new().merge(&[&a, &b]).unwrap();
        let parts = Composer::new().split_single(&merged).unwrap();

        assert_eq!(parts.len(), a.page_count() + b.page_count());
        let sources = [(&a, 1), (&a, 2), (&b, 1), (&b, 2), (&b, 3)];
        for (part, (source, number)) in parts.iter().zip(sources) {
            assert_eq!(part.page_count(), 1);
            assert_eq!(
                part.page_fingerprint(1).unwrap(),
                source.page_fingerprint(number).unwrap()
            );
        }
    }

    #[test]
    fn split_by_count_chunks() {
        let source = sample_pdf(3, "S");
        let parts = Composer::new().split_by_count(&source, 2).unwrap();
        let counts: Vec<usize> = parts.iter().map(Document::page_count).collect();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(texts(&parts[1]), vec!["S-Page-3"]);
    }

    #[test]
    fn split_by_count_zero_is_invalid() {
        let source = sample_pdf(3, "S");
        assert!(matches!(
            Composer::new().split_by_count(&source, 0),
            Err(SeitenwerkError::InvalidParameter(_))
        ));
    }

    #[test]
    fn split_by_ranges_keeps_ascending_order() {
        let source = sample_pdf(3, "S");
        let ranges = PageRangeSet::parse("3,1", 3).unwrap();
        let output = Composer::new().split_by_ranges(&source, &ranges).unwrap();
        assert_eq!(texts(&output), vec!["S-Page-1", "S-Page-3"]);
    }

    #[test]
    fn split_preserves_dimensions() {
        let source = sample_pdf_sized(2, "S", [0.0, 0.0, 200.0, 300.0]);
        let parts = Composer::new().split_single(&source).unwrap();
        let page = parts[1].page(1).unwrap();
        assert_eq!((page.width(), page.height()), (200.0, 300.0));
    }

    #[test]
    fn insert_at_position_zero_goes_first() {
        let target = sample_pdf(3, "T");
        let insertion = sample_pdf(2, "I");
        let output = Composer::new()
            .insert(&target, &insertion, &PageSelection::All, InsertMode::Position(0))
            .unwrap();
        assert_eq!(
            texts(&output),
            vec!["I-Page-1", "I-Page-2", "T-Page-1", "T-Page-2", "T-Page-3"]
        );
    }

    #[test]
    fn insert_at_page_count_goes_last() {
        let target = sample_pdf(3, "T");
        let insertion = sample_pdf(2, "I");
        let output = Composer::new()
            .insert(&target, &insertion, &PageSelection::All, InsertMode::Position(3))
            .unwrap();
        assert_eq!(
            texts(&output),
            vec!["T-Page-1", "T-Page-2", "T-Page-3", "I-Page-1", "I-Page-2"]
        );
    }

    #[test]
    fn insert_in_the_middle_with_selection() {
        let target = sample_pdf(3, "T");
        let insertion = sample_pdf(4, "I");
        let selection = PageSelection::from_expression("2,4", 4).unwrap();
        let output = Composer::new()
            .insert(&target, &insertion, &selection, InsertMode::Position(1))
            .unwrap();
        assert_eq!(
            texts(&output),
            vec!["T-Page-1", "I-Page-2", "I-Page-4", "T-Page-2", "T-Page-3"]
        );
    }

    #[test]
    fn insert_head_and_tail() {
        let target = sample_pdf(1, "T");
        let insertion = sample_pdf(1, "I");
        let head = Composer::new()
            .insert(&target, &insertion, &PageSelection::All, InsertMode::Head)
            .unwrap();
        let tail = Composer::new()
            .insert(&target, &insertion, &PageSelection::All, InsertMode::Tail)
            .unwrap();
        assert_eq!(texts(&head), vec!["I-Page-1", "T-Page-1"]);
        assert_eq!(texts(&tail), vec!["T-Page-1", "I-Page-1"]);
    }

    #[test]
    fn insert_past_end_is_out_of_range() {
        let target = sample_pdf(3, "T");
        let insertion = sample_pdf(1, "I");
        let err = Composer::new()
            .insert(&target, &insertion, &PageSelection::All, InsertMode::Position(4))
            .unwrap_err();
        assert!(matches!(
            err,
            SeitenwerkError::OutOfRange { page: 4, max_page: 3 }
        ));
    }

    #[test]
    fn replace_pairs_positions() {
        let target = sample_pdf(4, "T");
        let replacement = sample_pdf(3, "R");
        let targets = PageRangeSet::parse("2,4", 4).unwrap();
        let sources = PageRangeSet::parse("1-2", 3).unwrap();
        let output = Composer::new()
            .replace(&target, &replacement, &targets, &sources)
            .unwrap();
        assert_eq!(
            texts(&output),
            vec!["T-Page-1", "R-Page-1", "T-Page-3", "R-Page-2"]
        );
    }

    #[test]
    fn replace_single_page() {
        let target = sample_pdf(3, "T");
        let replacement = sample_pdf(3, "R");
        let targets = PageRangeSet::parse("3", 3).unwrap();
        let sources = PageRangeSet::parse("2", 3).unwrap();
        let output = Composer::new()
            .replace(&target, &replacement, &targets, &sources)
            .unwrap();
        assert_eq!(texts(&output), vec!["T-Page-1", "T-Page-2", "R-Page-2"]);
    }

    #[test]
    fn replace_count_mismatch() {
        let target = sample_pdf(3, "T");
        let replacement = sample_pdf(3, "R");
        let targets = PageRangeSet::parse("1,2", 3).unwrap();
        let sources = PageRangeSet::parse("1", 3).unwrap();
        assert!(matches!(
            Composer::new().replace(&target, &replacement, &targets, &sources),
            Err(SeitenwerkError::CountMismatch {
                targets: 2,
                sources: 1
            })
        ));
    }

    #[test]
    fn sources_are_untouched() {
        let a = sample_pdf(2, "A");
        let before = a.page_fingerprint(1).unwrap();
        let _ = Composer::new().merge(&[&a]).unwrap();
        let _ = Composer::new().split_single(&a).unwrap();
        assert_eq!(a.page_count(), 2);
        assert_eq!(a.page_fingerprint(1).unwrap(), before);
    }

    #[test]
    fn progress_reaches_one() {
        let a = sample_pdf(3, "A");
        let b = sample_pdf(1, "B");
        let mut seen = Vec::new();
        Composer::with_progress(|fraction| seen.push(fraction))
            .merge(&[&a, &b])
            .unwrap();
        assert_eq!(seen, vec![0.25, 0.5, 0.75, 1.0]);
    }
}
