// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result-document assembly — copy pages from one or more source documents
// into a fresh page tree.

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Object, ObjectId};
use seitenwerk_core::error::{Result, SeitenwerkError};
use tracing::{debug, warn};

use super::document::{Document, DocumentId};

/// Attributes a page may inherit from its ancestors in the page tree. They are
/// materialised on each copied page because the copy gets a new parent.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Builds a new document page by page.
///
/// Every copied page gets a fresh page dictionary, while the objects it refers
/// to (content streams, fonts, images) are copied once per source object and
/// shared by all pages that use them.
pub(crate) struct DocumentBuilder {
    doc: lopdf::Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    /// Source object -> object in `doc`.
    copied: HashMap<(DocumentId, ObjectId), ObjectId>,
    /// Source page -> first copy of it in `doc`.
    copied_pages: HashMap<(DocumentId, ObjectId), ObjectId>,
    /// Ids handed out for links to source pages that have not been copied
    /// yet. The page takes over the id when it is copied.
    pending_pages: HashMap<(DocumentId, ObjectId), ObjectId>,
}

impl DocumentBuilder {
    pub(crate) fn new() -> Self {
        let mut doc = lopdf::Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            copied: HashMap::new(),
            copied_pages: HashMap::new(),
            pending_pages: HashMap::new(),
        }
    }

    pub(crate) fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append page `number` (1-based) of `source`, returning the new page id.
    pub(crate) fn push_page(&mut self, source: &Document, number: u32) -> Result<ObjectId> {
        let source_page_id = source.page_id(number)?;
        let page = source
            .lopdf()
            .get_dictionary(source_page_id)
            .map_err(|err| {
                SeitenwerkError::Document(format!("cannot read page {}: {}", number, err))
            })?;

        let key = (source.id(), source_page_id);
        let new_id = self
            .pending_pages
            .remove(&key)
            .unwrap_or_else(|| self.doc.new_object_id());
        self.copied_pages.entry(key).or_insert(new_id);

        let mut new_page = self.copy_dictionary(source, page);
        for key in INHERITABLE_KEYS {
            if !new_page.has(key)
                && let Some(inherited) = source.inherited_attribute(source_page_id, key)
            {
                let copied = self.copy_object(source, inherited);
                new_page.set(key.to_vec(), copied);
            }
        }
        new_page.set("Type", Object::Name(b"Page".to_vec()));
        new_page.set("Parent", Object::Reference(self.pages_id));

        self.doc.objects.insert(new_id, Object::Dictionary(new_page));
        self.kids.push(new_id);

        debug!(source = %source.id(), number, position = self.kids.len(), "Page copied");
        Ok(new_id)
    }

    /// Append several pages of `source` in the given order, reporting each one.
    pub(crate) fn push_pages(
        &mut self,
        source: &Document,
        numbers: impl IntoIterator<Item = u32>,
        mut on_page: impl FnMut(),
    ) -> Result<()> {
        for number in numbers {
            self.push_page(source, number)?;
            on_page();
        }
        Ok(())
    }

    /// Write the page tree and hand the result over.
    ///
    /// Links to source pages that never made it into the result become
    /// `null`.
    pub(crate) fn finish(mut self) -> Document {
        let dangling: HashSet<ObjectId> = self.pending_pages.into_values().collect();
        if !dangling.is_empty() {
            debug!(links = dangling.len(), "Dropping links to pages outside the result");
            for object in self.doc.objects.values_mut() {
                drop_references(object, &dangling);
            }
        }

        let kids = self.kids.iter().map(|&id| Object::Reference(id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(self.kids.len() as i64)),
            ])),
        );
        Document::from_lopdf(self.doc)
    }

    // -- Object copying -------------------------------------------------------

    fn copy_object(&mut self, source: &Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(source, *id),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_object(source, item))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(source, dict)),
            Object::Stream(stream) => {
                // Keep the encoded bytes and filters untouched.
                let mut copy = stream.clone();
                copy.dict = self.copy_dictionary(source, &stream.dict);
                Object::Stream(copy)
            }
            other => other.clone(),
        }
    }

    /// /Parent is skipped everywhere; the caller re-links copied pages.
    fn copy_dictionary(&mut self, source: &Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            let value = self.copy_object(source, value);
            copy.set(key.clone(), value);
        }
        copy
    }

    fn copy_reference(&mut self, source: &Document, id: ObjectId) -> Object {
        let key = (source.id(), id);
        if let Some(&existing) = self.copied.get(&key) {
            return Object::Reference(existing);
        }

        let object = match source.lopdf().get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                return Object::Null;
            }
        };

        // Links to other pages (annotation /P, link destinations) point at the
        // page's copy, which may only be placed later in the build.
        if is_page(object) {
            if let Some(&page_id) = self.copied_pages.get(&key) {
                return Object::Reference(page_id);
            }
            let doc = &mut self.doc;
            let placeholder = *self
                .pending_pages
                .entry(key)
                .or_insert_with(|| doc.new_object_id());
            return Object::Reference(placeholder);
        }

        // Reserve the id before recursing so reference cycles terminate.
        let new_id = self.doc.new_object_id();
        self.copied.insert(key, new_id);
        let copy = self.copy_object(source, object);
        self.doc.objects.insert(new_id, copy);
        Object::Reference(new_id)
    }
}

fn drop_references(object: &mut Object, dangling: &HashSet<ObjectId>) {
    match object {
        Object::Reference(id) => {
            let id = *id;
            if dangling.contains(&id) {
                *object = Object::Null;
            }
        }
        Object::Array(items) => {
            for item in items {
                drop_references(item, dangling);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                drop_references(value, dangling);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                drop_references(value, dangling);
            }
        }
        _ => {}
    }
}

fn is_page(object: &Object) -> bool {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|kind| kind.as_name().ok())
        == Some(b"Page".as_slice())
}
