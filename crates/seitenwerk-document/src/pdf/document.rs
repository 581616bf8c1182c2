// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document model — open, inspect, encrypt, and write PDF documents using the
// `lopdf` crate.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use lopdf::{Dictionary, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions};
use seitenwerk_core::PageSize;
use seitenwerk_core::error::{Result, SeitenwerkError};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Page-tree inheritance is walked at most this deep; malformed files can
/// contain /Parent cycles.
const MAX_TREE_DEPTH: usize = 32;

/// Identity of one `Document` value, independent of its file path.
///
/// Result documents built by the composer key their copied-object cache on
/// this so that two opens of the same file never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of a document: its 1-based position, object id, and page box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    /// 1-based position within the owning document.
    pub number: u32,
    /// Page dictionary object id within the owning document.
    pub id: ObjectId,
    /// `[llx, lly, urx, ury]` in points.
    pub media_box: [f32; 4],
}

impl Page {
    pub fn width(&self) -> f32 {
        (self.media_box[2] - self.media_box[0]).abs()
    }

    pub fn height(&self) -> f32 {
        (self.media_box[3] - self.media_box[1]).abs()
    }

    pub fn size(&self) -> PageSize {
        PageSize::new(self.width(), self.height())
    }

    /// Lower-left corner of the page box; overlays are drawn relative to it.
    pub fn origin(&self) -> (f32, f32) {
        (
            self.media_box[0].min(self.media_box[2]),
            self.media_box[1].min(self.media_box[3]),
        )
    }
}

/// An ordered sequence of pages backed by a `lopdf::Document`.
///
/// Either a *source* opened from a file or bytes, or a *result* produced by
/// the composer or compositor. Sources are only ever read by this crate.
pub struct Document {
    id: DocumentId,
    inner: lopdf::Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<PathBuf>,
    /// Page object ids in document order, built on first lookup and dropped
    /// whenever the inner document is handed out mutably.
    page_ids: OnceLock<Vec<ObjectId>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("pages", &self.page_count())
            .field("source_path", &self.source_path)
            .finish()
    }
}

impl Document {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let inner = lopdf::Document::load(path_ref).map_err(|err| SeitenwerkError::Open {
            path: path_ref.display().to_string(),
            reason: err.to_string(),
        })?;

        let mut document = Self::from_lopdf(inner);
        document.source_path = Some(path_ref.to_path_buf());
        debug!(pages = document.page_count(), id = %document.id, "PDF loaded");
        Ok(document)
    }

    /// Load a PDF already held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let inner = lopdf::Document::load_mem(data).map_err(|err| SeitenwerkError::Open {
            path: "<memory>".to_string(),
            reason: err.to_string(),
        })?;
        let document = Self::from_lopdf(inner);
        debug!(pages = document.page_count(), "PDF loaded from bytes");
        Ok(document)
    }

    pub(crate) fn from_lopdf(inner: lopdf::Document) -> Self {
        Self {
            id: DocumentId::new(),
            inner,
            source_path: None,
            page_ids: OnceLock::new(),
        }
    }

    // -- Inspection -----------------------------------------------------------

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_ids().len()
    }

    /// Return the source path if the document was created via [`Document::open`].
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Whether the document carries an /Encrypt dictionary.
    pub fn is_encrypted(&self) -> bool {
        self.inner.is_encrypted()
    }

    /// All pages in document order.
    pub fn pages(&self) -> Vec<Page> {
        self.page_ids()
            .iter()
            .zip(1..)
            .map(|(&id, number)| Page {
                number,
                id,
                media_box: self.media_box(id),
            })
            .collect()
    }

    /// A single page by 1-based number.
    pub fn page(&self, number: u32) -> Result<Page> {
        let id = self.page_id(number)?;
        Ok(Page {
            number,
            id,
            media_box: self.media_box(id),
        })
    }

    /// Decoded content stream bytes of a page, joined in /Contents order with a
    /// newline between parts.
    pub fn page_content(&self, number: u32) -> Result<Vec<u8>> {
        let page_id = self.page_id(number)?;
        let page = self.inner.get_dictionary(page_id).map_err(|err| {
            SeitenwerkError::Document(format!("cannot read page {}: {}", number, err))
        })?;

        let mut content = Vec::new();
        match page.get(b"Contents") {
            Ok(Object::Array(parts)) => {
                for (index, part) in parts.iter().enumerate() {
                    if index > 0 {
                        content.push(b'\n');
                    }
                    content.extend(self.stream_bytes(part)?);
                }
            }
            Ok(single) => content.extend(self.stream_bytes(single)?),
            Err(_) => {}
        }
        Ok(content)
    }

    /// SHA-256 of a page's decoded content, hex encoded. Equal fingerprints mean
    /// the page was carried over without re-encoding.
    pub fn page_fingerprint(&self, number: u32) -> Result<String> {
        let content = self.page_content(number)?;
        Ok(hex::encode(Sha256::digest(&content)))
    }

    // -- Encryption -----------------------------------------------------------

    /// Produce a password-protected copy (RC4 128-bit standard security
    /// handler, same user and owner password).
    #[instrument(skip_all, fields(pages = self.page_count()))]
    pub fn encrypt(&self, password: &str) -> Result<Document> {
        if password.is_empty() {
            return Err(SeitenwerkError::InvalidParameter(
                "encryption password is empty".into(),
            ));
        }
        if self.is_encrypted() {
            return Err(SeitenwerkError::Encryption(
                "document is already encrypted".into(),
            ));
        }

        let mut inner = self.inner.clone();
        if inner.trailer.get(b"ID").is_err() {
            // The standard handler derives its key from the file identifier.
            let seed = Uuid::new_v4().into_bytes().to_vec();
            inner.trailer.set(
                "ID",
                Object::Array(vec![
                    Object::String(seed.clone(), lopdf::StringFormat::Hexadecimal),
                    Object::String(seed, lopdf::StringFormat::Hexadecimal),
                ]),
            );
        }

        let version = EncryptionVersion::V2 {
            document: &inner,
            owner_password: password,
            user_password: password,
            key_length: 128,
            permissions: Permissions::all(),
        };
        let state = EncryptionState::try_from(version)
            .map_err(|err| SeitenwerkError::Encryption(err.to_string()))?;
        inner
            .encrypt(&state)
            .map_err(|err| SeitenwerkError::Encryption(err.to_string()))?;

        info!("Document encrypted");
        Ok(Self::from_lopdf(inner))
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.inner.save_to(&mut output).map_err(|err| {
            SeitenwerkError::Io(std::io::Error::other(format!(
                "failed to serialise PDF: {}",
                err
            )))
        })?;
        Ok(output)
    }

    /// Write the document to `path`. Serialisation happens first, so a failure
    /// never leaves a truncated file behind.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn write(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            pages = self.page_count(),
            bytes = bytes.len(),
            "Wrote PDF to {}",
            path.as_ref().display()
        );
        Ok(())
    }

    // -- Crate-internal access ------------------------------------------------

    pub(crate) fn lopdf(&self) -> &lopdf::Document {
        &self.inner
    }

    pub(crate) fn lopdf_mut(&mut self) -> &mut lopdf::Document {
        self.page_ids.take();
        &mut self.inner
    }

    fn page_ids(&self) -> &[ObjectId] {
        self.page_ids
            .get_or_init(|| self.inner.get_pages().into_values().collect())
    }

    /// Object id of page `number` (1-based).
    pub(crate) fn page_id(&self, number: u32) -> Result<ObjectId> {
        let ids = self.page_ids();
        (number as usize)
            .checked_sub(1)
            .and_then(|index| ids.get(index))
            .copied()
            .ok_or(SeitenwerkError::OutOfRange {
                page: u64::from(number),
                max_page: ids.len(),
            })
    }

    /// Look up a page attribute, walking up the page tree for inheritable keys.
    pub(crate) fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.inner.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.inner.get_dictionary(parent).ok()?;
        }
        None
    }

    /// Follow a reference one level; direct objects are returned unchanged.
    pub(crate) fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.inner.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// The page's effective /Resources dictionary, if any.
    pub(crate) fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let resources = self.inherited_attribute(page_id, b"Resources")?;
        self.resolve(resources)?.as_dict().ok()
    }

    fn media_box(&self, page_id: ObjectId) -> [f32; 4] {
        let media_box = self
            .inherited_attribute(page_id, b"MediaBox")
            .and_then(|object| self.resolve(object))
            .and_then(|object| object.as_array().ok())
            .and_then(|values| number_quad(values.as_slice()));

        match media_box {
            Some(media_box) => media_box,
            None => {
                warn!(?page_id, "page has no usable MediaBox, assuming US Letter");
                let letter = PageSize::LETTER;
                [0.0, 0.0, letter.width, letter.height]
            }
        }
    }

    fn stream_bytes(&self, object: &Object) -> Result<Vec<u8>> {
        let stream = self
            .resolve(object)
            .and_then(|object| object.as_stream().ok())
            .ok_or_else(|| SeitenwerkError::Document("page content is not a stream".into()))?;

        if stream.dict.has(b"Filter") {
            stream
                .decompressed_content()
                .map_err(|err| SeitenwerkError::Document(format!("cannot decode content: {}", err)))
        } else {
            Ok(stream.content.clone())
        }
    }
}

/// Read a PDF number (integer or real) as f32.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

fn number_quad(values: &[Object]) -> Option<[f32; 4]> {
    if values.len() != 4 {
        return None;
    }
    let mut quad = [0.0; 4];
    for (slot, value) in quad.iter_mut().zip(values) {
        *slot = number(value)?;
    }
    Some(quad)
}
