// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the seitenwerk-document crate: page-range parsing,
// tiled overlay geometry, and merging.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, Stream};

use seitenwerk_core::{Layout, PageRangeSet, PageSize};
use seitenwerk_document::overlay::OverlayShape;
use seitenwerk_document::{Composer, Document, compute_placements};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An in-memory Letter-sized PDF with `pages` one-line pages.
fn synthetic_pdf(pages: u32) -> Document {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let kids = (1..=pages)
        .map(|number| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                    Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("Page {number}"))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                content.encode().expect("content encodes"),
            ));
            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
                (
                    "Resources",
                    Object::Dictionary(Dictionary::from_iter(vec![(
                        "Font",
                        Object::Dictionary(Dictionary::from_iter(vec![(
                            "F1",
                            Object::Reference(font_id),
                        )])),
                    )])),
                ),
            ]));
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(i64::from(pages))),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("synthetic PDF saves");
    Document::from_bytes(&bytes).expect("synthetic PDF loads")
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Parse a mixed expression against a 500-page document.
fn bench_parse_ranges(c: &mut Criterion) {
    c.bench_function("parse_ranges (mixed, 500 pages)", |b| {
        b.iter(|| PageRangeSet::parse(black_box("1-50, 75, 100-250, 240-260, 499"), 500));
    });
}

/// Tiled text on an A4 page; small text means a dense grid.
fn bench_tiled_placements(c: &mut Criterion) {
    let shape = OverlayShape::Text {
        width: 40.0,
        font_size: 10.0,
        opacity: 0.2,
    };
    c.bench_function("tiled_placements (A4, dense text)", |b| {
        b.iter(|| compute_placements(black_box(PageSize::new(595.0, 842.0)), &shape, Layout::Tiled));
    });
}

/// Merge two 50-page documents.
fn bench_merge(c: &mut Criterion) {
    let first = synthetic_pdf(50);
    let second = synthetic_pdf(50);
    c.bench_function("merge (2 x 50 pages)", |b| {
        b.iter(|| {
            let merged = Composer::new().merge(&[&first, &second]);
            black_box(merged.map(|doc| doc.page_count()))
        });
    });
}

criterion_group!(benches, bench_parse_ranges, bench_tiled_placements, bench_merge);
criterion_main!(benches);
