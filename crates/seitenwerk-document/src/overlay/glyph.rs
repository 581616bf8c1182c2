// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph sources — fonts that can measure, encode, and install themselves for
// watermark text.

use std::fmt;

use lopdf::{Dictionary, Object, ObjectId, StringFormat};

/// A font the compositor can draw overlay text with.
///
/// Implementations only need the font's metrics and its PDF dictionaries; no
/// font program is embedded.
pub trait GlyphSource: fmt::Debug + Send + Sync {
    /// PostScript name, unique per source. Used to share one installed font
    /// between pages.
    fn name(&self) -> &str;

    /// Whether every character of `text` can be shown.
    fn covers(&self, text: &str) -> bool;

    /// Advance width of `text` at `size` points.
    fn text_width(&self, text: &str, size: f32) -> f32;

    /// `text` as a string operand for the `Tj` operator. Characters the source
    /// cannot show are replaced rather than dropped.
    fn encode(&self, text: &str) -> Object;

    /// Add the font dictionaries to `doc` and return the font object's id.
    fn install(&self, doc: &mut lopdf::Document) -> ObjectId;
}

// -- Standard 14 font ---------------------------------------------------------

/// Helvetica advance widths for the printable ASCII range 0x20..=0x7E, in
/// 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Width used for Latin-1 characters outside the table.
const HELVETICA_FALLBACK_WIDTH: u16 = 556;

/// One of the PDF standard fonts with WinAnsi encoding. Covers ASCII and the
/// Latin-1 supplement.
#[derive(Debug, Clone)]
pub struct StandardFont {
    base_font: &'static str,
}

impl StandardFont {
    /// The default glyph source.
    pub fn helvetica() -> Self {
        Self {
            base_font: "Helvetica",
        }
    }

    fn covers_char(c: char) -> bool {
        matches!(u32::from(c), 0x20..=0x7E | 0xA0..=0xFF)
    }

    fn char_width(c: char) -> u16 {
        match u32::from(c) {
            code @ 0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize],
            _ => HELVETICA_FALLBACK_WIDTH,
        }
    }
}

impl Default for StandardFont {
    fn default() -> Self {
        Self::helvetica()
    }
}

impl GlyphSource for StandardFont {
    fn name(&self) -> &str {
        self.base_font
    }

    fn covers(&self, text: &str) -> bool {
        text.chars().all(Self::covers_char)
    }

    fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| if Self::covers_char(c) { c } else { '?' })
            .map(|c| u32::from(Self::char_width(c)))
            .sum();
        units as f32 * size / 1000.0
    }

    fn encode(&self, text: &str) -> Object {
        // WinAnsi agrees with Latin-1 on every covered code point.
        let bytes = text
            .chars()
            .map(|c| if Self::covers_char(c) { u32::from(c) as u8 } else { b'?' })
            .collect();
        Object::String(bytes, StringFormat::Literal)
    }

    fn install(&self, doc: &mut lopdf::Document) -> ObjectId {
        doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(self.base_font.as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]))
    }
}

// -- CID font -----------------------------------------------------------------

/// A non-embedded CJK font addressed through a UCS-2 CMap. Viewers substitute
/// a locally installed face. Covers the Basic Multilingual Plane.
#[derive(Debug, Clone)]
pub struct CidFont {
    base_font: &'static str,
    cmap: &'static str,
    ordering: &'static str,
    supplement: i64,
}

impl CidFont {
    /// Adobe-GB1 Song, for Simplified Chinese text.
    pub fn chinese_simplified() -> Self {
        Self {
            base_font: "STSong-Light",
            cmap: "UniGB-UCS2-H",
            ordering: "GB1",
            supplement: 2,
        }
    }

    fn char_width(c: char) -> u32 {
        if c.is_ascii() { 500 } else { 1000 }
    }
}

impl GlyphSource for CidFont {
    fn name(&self) -> &str {
        self.base_font
    }

    fn covers(&self, text: &str) -> bool {
        text.chars().all(|c| c.len_utf16() == 1)
    }

    fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(Self::char_width).sum();
        units as f32 * size / 1000.0
    }

    fn encode(&self, text: &str) -> Object {
        let bytes = text
            .chars()
            .map(|c| if c.len_utf16() == 1 { c } else { '?' })
            .flat_map(|c| (u32::from(c) as u16).to_be_bytes())
            .collect();
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    fn install(&self, doc: &mut lopdf::Document) -> ObjectId {
        let descriptor_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"FontDescriptor".to_vec())),
            ("FontName", Object::Name(self.base_font.as_bytes().to_vec())),
            ("Flags", Object::Integer(6)),
            (
                "FontBBox",
                Object::Array(vec![
                    Object::Integer(-25),
                    Object::Integer(-254),
                    Object::Integer(1000),
                    Object::Integer(880),
                ]),
            ),
            ("ItalicAngle", Object::Integer(0)),
            ("Ascent", Object::Integer(880)),
            ("Descent", Object::Integer(-120)),
            ("CapHeight", Object::Integer(880)),
            ("StemV", Object::Integer(93)),
        ]));

        let cid_font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"CIDFontType0".to_vec())),
            ("BaseFont", Object::Name(self.base_font.as_bytes().to_vec())),
            (
                "CIDSystemInfo",
                Object::Dictionary(Dictionary::from_iter(vec![
                    ("Registry", Object::string_literal("Adobe")),
                    ("Ordering", Object::string_literal(self.ordering)),
                    ("Supplement", Object::Integer(self.supplement)),
                ])),
            ),
            ("FontDescriptor", Object::Reference(descriptor_id)),
            ("DW", Object::Integer(1000)),
            // Half-width proportional Latin.
            (
                "W",
                Object::Array(vec![
                    Object::Integer(1),
                    Object::Integer(95),
                    Object::Integer(500),
                ]),
            ),
        ]));

        doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("BaseFont", Object::Name(self.base_font.as_bytes().to_vec())),
            ("Encoding", Object::Name(self.cmap.as_bytes().to_vec())),
            (
                "DescendantFonts",
                Object::Array(vec![Object::Reference(cid_font_id)]),
            ),
        ]))
    }
}
