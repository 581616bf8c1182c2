// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output file naming conventions.

use std::path::Path;

use chrono::{DateTime, TimeZone};

/// Extension appended to every composed document.
pub const PDF_EXTENSION: &str = "pdf";

/// Compact sortable timestamp, e.g. `20261018143005`.
pub fn timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y%m%d%H%M%S").to_string()
}

/// File stem of an input path (`/a/report.pdf` -> `report`).
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Append `.pdf` unless the name already ends with it (case-insensitive).
pub fn with_pdf_extension(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{name}.{PDF_EXTENSION}")
    }
}

pub fn merged<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_merged.{PDF_EXTENSION}", timestamp(at))
}

pub fn split_page(stem: &str, page: usize) -> String {
    format!("{stem}_page_{page}.{PDF_EXTENSION}")
}

pub fn split_part(stem: &str, part: usize) -> String {
    format!("{stem}_part_{part}.{PDF_EXTENSION}")
}

pub fn custom_range<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_custom_range.{PDF_EXTENSION}", timestamp(at))
}

pub fn inserted<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_inserted.{PDF_EXTENSION}", timestamp(at))
}

pub fn replaced<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_replaced.{PDF_EXTENSION}", timestamp(at))
}

pub fn watermarked(stem: &str) -> String {
    format!("{stem}_watermarked.{PDF_EXTENSION}")
}

pub fn encrypted(stem: &str) -> String {
    format!("{stem}_encrypted.{PDF_EXTENSION}")
}

/// Directory extracted images are written into.
pub fn images_dir(stem: &str) -> String {
    format!("{stem}_images")
}

/// Name of one extracted image: `page_007_img_002.png`.
pub fn extracted_image(page: u32, index: u32, extension: &str) -> String {
    format!("page_{page:03}_img_{index:03}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 14, 30, 5).unwrap()
    }

    #[test]
    fn timestamped_names() {
        assert_eq!(merged(&fixed()), "20261018143005_merged.pdf");
        assert_eq!(custom_range(&fixed()), "20261018143005_custom_range.pdf");
        assert_eq!(inserted(&fixed()), "20261018143005_inserted.pdf");
        assert_eq!(replaced(&fixed()), "20261018143005_replaced.pdf");
    }

    #[test]
    fn stem_based_names() {
        let stem = stem_of(Path::new("/tmp/annual report.pdf"));
        assert_eq!(stem, "annual report");
        assert_eq!(watermarked(&stem), "annual report_watermarked.pdf");
        assert_eq!(encrypted(&stem), "annual report_encrypted.pdf");
        assert_eq!(split_page(&stem, 3), "annual report_page_3.pdf");
        assert_eq!(split_part(&stem, 1), "annual report_part_1.pdf");
        assert_eq!(images_dir(&stem), "annual report_images");
    }

    #[test]
    fn extracted_image_is_zero_padded() {
        assert_eq!(extracted_image(7, 2, "png"), "page_007_img_002.png");
        assert_eq!(extracted_image(1234, 10, "jpg"), "page_1234_img_010.jpg");
    }

    #[test]
    fn pdf_extension_added_once() {
        assert_eq!(with_pdf_extension("out"), "out.pdf");
        assert_eq!(with_pdf_extension("out.PDF"), "out.PDF");
    }
}
