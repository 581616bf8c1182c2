// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range expressions — parse "1-3,5" style input into a validated,
// deduplicated, ascending set of 1-based page numbers.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::error::{Result, SeitenwerkError};

/// Validated, deduplicated, strictly ascending set of 1-based page numbers.
///
/// Only constructed through [`PageRangeSet::parse`], [`PageRangeSet::all`] or
/// [`PageRangeSet::from_pages`], all of which check the bounds of the document
/// the set is meant for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PageRangeSet {
    pages: Vec<u32>,
}

impl PageRangeSet {
    /// Parse a comma-separated expression of page numbers and `start-end`
    /// pairs against a document of `max_page` pages.
    ///
    /// An inverted pair (`5-3`) expands to nothing rather than failing. The
    /// empty string is *not* "all pages"; it fails as a malformed token. Use
    /// [`PageSelection::from_expression`] for the "blank means everything"
    /// policy.
    pub fn parse(expression: &str, max_page: usize) -> Result<Self> {
        let mut pages = BTreeSet::new();

        for token in expression.split(',') {
            match token.split_once('-') {
                Some((start, end)) => {
                    let start = parse_number(start, token)?;
                    let end = parse_number(end, token)?;
                    if start > end {
                        debug!(token, "inverted range expands to nothing");
                        continue;
                    }
                    // Endpoints bound every member, so checking them first
                    // avoids expanding absurd ranges like "1-99999999999".
                    check_bounds(start, max_page)?;
                    check_bounds(end, max_page)?;
                    pages.extend(start as u32..=end as u32);
                }
                None => {
                    let page = parse_number(token, token)?;
                    check_bounds(page, max_page)?;
                    pages.insert(page as u32);
                }
            }
        }

        Ok(Self {
            pages: pages.into_iter().collect(),
        })
    }

    /// Every page of a `page_count`-page document.
    pub fn all(page_count: usize) -> Self {
        Self {
            pages: (1..=page_count as u32).collect(),
        }
    }

    /// Build a set from arbitrary page numbers, sorting and deduplicating them
    /// and checking each against `max_page`.
    pub fn from_pages(pages: impl IntoIterator<Item = u32>, max_page: usize) -> Result<Self> {
        let mut set = BTreeSet::new();
        for page in pages {
            check_bounds(u64::from(page), max_page)?;
            set.insert(page);
        }
        Ok(Self {
            pages: set.into_iter().collect(),
        })
    }

    /// Re-check the set against a (possibly different) document size.
    pub fn check_within(&self, max_page: usize) -> Result<()> {
        match self.pages.last() {
            Some(&last) => check_bounds(u64::from(last), max_page),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.binary_search(&page).is_ok()
    }

    /// 1-based page numbers in ascending order.
    pub fn as_slice(&self) -> &[u32] {
        &self.pages
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }

    /// 0-based page ordinals in ascending order.
    pub fn zero_based(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.iter().map(|&page| page as usize - 1)
    }
}

impl fmt::Display for PageRangeSet {
    /// Renders the set back as a compact expression, e.g. `1-3,5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut index = 0;
        while index < self.pages.len() {
            let start = self.pages[index];
            let mut end = start;
            while index + 1 < self.pages.len() && self.pages[index + 1] == end + 1 {
                index += 1;
                end += 1;
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}-{end}")?;
            }
            index += 1;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PageRangeSet {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

/// Which pages of a document an operation should use.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// Every page, in document order.
    #[default]
    All,
    /// An explicit, validated set.
    Pages(PageRangeSet),
}

impl PageSelection {
    /// Blank input selects every page; anything else must parse.
    pub fn from_expression(expression: &str, max_page: usize) -> Result<Self> {
        if expression.trim().is_empty() {
            Ok(Self::All)
        } else {
            PageRangeSet::parse(expression, max_page).map(Self::Pages)
        }
    }

    /// Resolve to a concrete set for a `page_count`-page document.
    pub fn resolve(&self, page_count: usize) -> Result<PageRangeSet> {
        match self {
            Self::All => Ok(PageRangeSet::all(page_count)),
            Self::Pages(set) => {
                set.check_within(page_count)?;
                Ok(set.clone())
            }
        }
    }
}

impl From<PageRangeSet> for PageSelection {
    fn from(set: PageRangeSet) -> Self {
        Self::Pages(set)
    }
}

fn parse_number(text: &str, token: &str) -> Result<u64> {
    text.trim()
        .parse::<u64>()
        .map_err(|_| SeitenwerkError::MalformedExpression {
            token: token.trim().to_string(),
        })
}

fn check_bounds(page: u64, max_page: usize) -> Result<()> {
    if page < 1 || page > max_page as u64 {
        return Err(SeitenwerkError::OutOfRange { page, max_page });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_singles_and_ranges() {
        let set = PageRangeSet::parse("1-3,5", 10).unwrap();
        assert_eq!(set.as_slice(), &[1, 2, 3, 5]);
    }

    #[test]
    fn inverted_range_is_empty() {
        let set = PageRangeSet::parse("5-3", 10).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn inverted_range_is_not_bounds_checked() {
        let set = PageRangeSet::parse("50-30,2", 10).unwrap();
        assert_eq!(set.as_slice(), &[2]);
    }

    #[test]
    fn out_of_range_reports_page_and_max() {
        let err = PageRangeSet::parse("11", 10).unwrap_err();
        assert!(matches!(
            err,
            SeitenwerkError::OutOfRange {
                page: 11,
                max_page: 10
            }
        ));
    }

    #[test]
    fn page_zero_is_out_of_range() {
        let err = PageRangeSet::parse("0-2", 10).unwrap_err();
        assert!(matches!(err, SeitenwerkError::OutOfRange { page: 0, .. }));
    }

    #[test]
    fn huge_range_fails_without_expanding() {
        let err = PageRangeSet::parse("1-99999999999", 10).unwrap_err();
        assert!(matches!(
            err,
            SeitenwerkError::OutOfRange {
                page: 99_999_999_999,
                ..
            }
        ));
    }

    #[test]
    fn deduplicates_and_sorts() {
        let set = PageRangeSet::parse("4, 1-3, 2-4, 1", 10).unwrap();
        assert_eq!(set.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn whitespace_around_numbers_is_ignored() {
        let set = PageRangeSet::parse(" 2 - 4 , 7 ", 10).unwrap();
        assert_eq!(set.as_slice(), &[2, 3, 4, 7]);
    }

    #[test]
    fn malformed_tokens_are_named() {
        for (input, bad) in [("1,a", "a"), ("1-x", "1-x"), ("1-2-3", "1-2-3"), ("1,,2", "")] {
            match PageRangeSet::parse(input, 10) {
                Err(SeitenwerkError::MalformedExpression { token }) => assert_eq!(token, bad),
                other => panic!("{input:?} should be malformed, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_string_is_malformed_not_all() {
        let err = PageRangeSet::parse("", 10).unwrap_err();
        assert!(matches!(err, SeitenwerkError::MalformedExpression { .. }));
    }

    #[test]
    fn output_is_strictly_ascending() {
        for input in ["9,1,5-7", "3-3,3", "10,9,8,7", "2-6,1-3,8"] {
            let set = PageRangeSet::parse(input, 10).unwrap();
            assert!(set.as_slice().windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn display_compacts_runs() {
        let set = PageRangeSet::parse("5,1,2,3,7,8", 10).unwrap();
        assert_eq!(set.to_string(), "1-3,5,7-8");
    }

    #[test]
    fn zero_based_ordinals() {
        let set = PageRangeSet::parse("1,3", 3).unwrap();
        assert_eq!(set.zero_based().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn blank_selection_means_all() {
        assert_eq!(
            PageSelection::from_expression("  ", 3).unwrap(),
            PageSelection::All
        );
        let resolved = PageSelection::All.resolve(3).unwrap();
        assert_eq!(resolved.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn selection_resolve_rechecks_bounds() {
        let set = PageRangeSet::parse("4", 5).unwrap();
        let err = PageSelection::Pages(set).resolve(3).unwrap_err();
        assert!(matches!(err, SeitenwerkError::OutOfRange { page: 4, max_page: 3 }));
    }

    #[test]
    fn from_pages_validates() {
        let set = PageRangeSet::from_pages([3, 1, 3], 3).unwrap();
        assert_eq!(set.as_slice(), &[1, 3]);
        assert!(PageRangeSet::from_pages([0], 3).is_err());
    }
}
