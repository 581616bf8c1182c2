// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the document model and page composition (merge, split, insert,
// replace).

pub(crate) mod builder;
pub mod compose;
pub mod document;

pub use compose::Composer;
pub use document::{Document, DocumentId, Page};

/// In-memory PDFs with identifiable pages for unit tests.
#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::content::{Content, Operation};
    use lopdf::{Dictionary, Object, ObjectId, Stream};

    use super::Document;

    pub(crate) const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

    /// `pages` pages whose content draws `{prefix}-Page-{n}`.
    pub(crate) fn sample_pdf(pages: u32, prefix: &str) -> Document {
        sample_pdf_sized(pages, prefix, LETTER)
    }

    pub(crate) fn sample_bytes(pages: u32, prefix: &str) -> Vec<u8> {
        let mut doc = build(pages, prefix, Some(LETTER), None, |_, _| None);
        save(&mut doc)
    }

    pub(crate) fn sample_pdf_sized(pages: u32, prefix: &str, media_box: [f32; 4]) -> Document {
        let mut doc = build(pages, prefix, Some(media_box), None, |_, _| None);
        Document::from_bytes(&save(&mut doc)).expect("sample PDF loads")
    }

    /// MediaBox set on the /Pages node only.
    pub(crate) fn sample_with_inherited_box(pages: u32, media_box: [f32; 4]) -> Document {
        let mut doc = build(pages, "Inherited", None, Some(media_box), |_, _| None);
        Document::from_bytes(&save(&mut doc)).expect("sample PDF loads")
    }

    /// Each page gets the image XObjects returned by `images(doc, page)`.
    pub(crate) fn sample_with_images(
        pages: u32,
        images: impl Fn(&mut lopdf::Document, u32) -> Option<Vec<(String, ObjectId)>>,
    ) -> Document {
        let mut doc = build(pages, "Img", Some(LETTER), None, images);
        Document::from_bytes(&save(&mut doc)).expect("sample PDF loads")
    }

    pub(crate) fn page_text(doc: &Document, number: u32) -> String {
        String::from_utf8_lossy(&doc.page_content(number).expect("page content")).into_owned()
    }

    fn build(
        pages: u32,
        prefix: &str,
        page_box: Option<[f32; 4]>,
        tree_box: Option<[f32; 4]>,
        images: impl Fn(&mut lopdf::Document, u32) -> Option<Vec<(String, ObjectId)>>,
    ) -> lopdf::Document {
        let mut doc = lopdf::Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Courier".to_vec())),
        ]));

        let mut kids = Vec::new();
        for number in 1..=pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                    Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("{prefix}-Page-{number}"))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                content.encode().expect("content encodes"),
            ));

            let mut resources = Dictionary::from_iter(vec![(
                "Font",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "F1",
                    Object::Reference(font_id),
                )])),
            )]);
            if let Some(entries) = images(&mut doc, number) {
                let mut xobjects = Dictionary::new();
                for (name, id) in entries {
                    xobjects.set(name.into_bytes(), Object::Reference(id));
                }
                resources.set("XObject", Object::Dictionary(xobjects));
            }

            let mut page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Dictionary(resources)),
            ]);
            if let Some(media_box) = page_box {
                page.set("MediaBox", quad(media_box));
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let mut pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(i64::from(pages))),
            ("Kids", Object::Array(kids)),
        ]);
        if let Some(media_box) = tree_box {
            pages_dict.set("MediaBox", quad(media_box));
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    fn quad(values: [f32; 4]) -> Object {
        Object::Array(values.iter().map(|&value| Object::Real(value)).collect())
    }

    fn save(doc: &mut lopdf::Document) -> Vec<u8> {
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("sample PDF saves");
        buffer
    }
}
