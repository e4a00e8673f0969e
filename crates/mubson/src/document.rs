//! Mutable document tree with copy-on-write semantics over immutable
//! wire-format buffers.
//!
//! A [`Document`] is realized by four data structures:
//!
//! - The *element arena*: an append-only `Vec` of [`ElementRep`] records.
//!   Records are never removed or moved, so an arena index identifies the
//!   same logical node for the whole life of the document, across growth,
//!   edits, and lazy materialization.
//! - The *byte-source registry*: the immutable buffers that provide value
//!   bytes for parts of the tree. Slot 0 always denotes the leaf builder;
//!   slot 1 holds the input buffer when the document wraps one.
//! - The *leaf builder*: a growing buffer into which every newly created
//!   leaf (and self-contained sub-container) is encoded exactly once. A
//!   record points at its element by offset.
//! - The *name heap*: NUL-delimited storage for the field names of nodes
//!   that have no backing bytes (freshly made objects and arrays, and
//!   renamed containers).
//!
//! A document constructed over an input buffer is not unpacked eagerly.
//! Records for children and siblings are created on demand as navigation
//! crosses them; subtrees that are never visited never get records. On
//! serialization, untouched regions are block-copied from their backing
//! buffer instead of being re-walked.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use crate::damage::{DamageEvent, DamageVector, InPlaceUpdates};
use crate::element::Element;
use crate::encode::{self, DocWriter};
use crate::error::Result;
use crate::wire::{self, RawElement, Type};

/// Index of an element record in the arena.
///
/// Child and sibling slots hold either a real index, [`RepIdx::INVALID`]
/// (no such neighbor), or [`RepIdx::OPAQUE`] (the neighbor exists in the
/// backing bytes but has not been materialized yet). The sentinels are
/// reserved high values outside the legal index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct RepIdx(pub(crate) u32);

impl RepIdx {
    /// The root element always occupies arena slot 0.
    pub(crate) const ROOT: RepIdx = RepIdx(0);
    /// No such neighbor; end of a child list.
    pub(crate) const INVALID: RepIdx = RepIdx(u32::MAX);
    /// Neighbor exists in the backing bytes but has no record yet.
    pub(crate) const OPAQUE: RepIdx = RepIdx(u32::MAX - 1);
    /// Highest index that does not collide with the sentinels.
    pub(crate) const MAX: RepIdx = RepIdx(u32::MAX - 2);

    #[inline]
    pub(crate) fn is_valid(self) -> bool {
        self.0 <= Self::MAX.0
    }
}

/// Index of a registered byte source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ObjIdx(u16);

impl ObjIdx {
    /// The leaf builder's buffer.
    pub(crate) const LEAF: ObjIdx = ObjIdx(0);
    /// The record has no backing byte source.
    pub(crate) const INVALID: ObjIdx = ObjIdx(u16::MAX);
    const MAX: u16 = u16::MAX - 1;
}

/// One arena record: where a node's bytes live and how the node is wired
/// into the tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ElementRep {
    /// Backing byte source, or `ObjIdx::INVALID` for nodes made from
    /// scratch.
    pub(crate) obj: ObjIdx,
    /// True iff the bytes at `(obj, offset)` are a complete, currently
    /// valid encoded element for this node. Cleared on the whole ancestor
    /// chain when a descendant changes.
    pub(crate) serialized: bool,
    /// Container kind when there are no backing bytes to consult.
    pub(crate) array: bool,
    /// Element offset within `obj` when backed; name-heap offset otherwise.
    pub(crate) offset: u32,
    pub(crate) left_sibling: RepIdx,
    pub(crate) right_sibling: RepIdx,
    pub(crate) left_child: RepIdx,
    pub(crate) right_child: RepIdx,
    pub(crate) parent: RepIdx,
}

impl ElementRep {
    /// A record with no backing bytes and no relatives.
    pub(crate) fn detached() -> ElementRep {
        ElementRep {
            obj: ObjIdx::INVALID,
            serialized: false,
            array: false,
            offset: 0,
            left_sibling: RepIdx::INVALID,
            right_sibling: RepIdx::INVALID,
            left_child: RepIdx::INVALID,
            right_child: RepIdx::INVALID,
            parent: RepIdx::INVALID,
        }
    }
}

/// Whether a document accumulates byte-level patches for eligible updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InPlaceMode {
    Enabled,
    Disabled,
}

static NEXT_DOC_ID: AtomicU32 = AtomicU32::new(0);

const EMPTY: &[u8] = &[];

/// A mutable document tree.
///
/// Reads are zero-copy against the registered buffers. Mutations append to
/// the internal arenas; nothing is ever reclaimed, so handles stay valid
/// until the document is dropped. Navigation that merely reads may still
/// materialize records, which is why the lazy accessors take `&mut self`.
///
/// # Example
///
/// ```
/// use mubson::{json_to_bytes, Document, InPlaceMode};
///
/// let bytes = json_to_bytes(r#"{"a": 1, "b": 2}"#).unwrap();
/// let mut doc = Document::from_bytes(&bytes, InPlaceMode::Disabled).unwrap();
///
/// let root = doc.root();
/// let a = doc.left_child(root);
/// assert_eq!(doc.field_name(a), "a");
///
/// let c = doc.make_int32("c", 3);
/// doc.push_back(root, c).unwrap();
///
/// let mut out = Vec::new();
/// doc.write_to(&mut out);
/// assert_eq!(out, json_to_bytes(r#"{"a": 1, "b": 2, "c": 3}"#).unwrap());
/// ```
pub struct Document<'a> {
    pub(crate) doc_id: u32,
    elements: Vec<ElementRep>,
    /// Byte sources; slot 0 is a placeholder for the leaf builder.
    objects: Vec<Cow<'a, [u8]>>,
    /// NUL-delimited names; offset 0 is pre-seeded with the empty name.
    field_names: Vec<u8>,
    /// The leaf builder's buffer.
    leaf: Vec<u8>,
    /// Damage queue; `None` once in-place updates are off the table.
    damages: Option<DamageVector>,
}

impl Document<'static> {
    /// Create an empty document: a root object with no children.
    #[must_use]
    pub fn new() -> Document<'static> {
        Document::empty(InPlaceMode::Disabled)
    }

    /// Create a document over an owned buffer.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `data` is not a well-formed document.
    pub fn from_vec(data: Vec<u8>, mode: InPlaceMode) -> Result<Document<'static>> {
        Document::with_source(Cow::Owned(data), mode)
    }
}

impl Default for Document<'static> {
    fn default() -> Self {
        Document::new()
    }
}

impl<'a> Document<'a> {
    /// Create a document over a borrowed buffer (zero-copy).
    ///
    /// The buffer must outlive the document; its bytes are never copied
    /// unless an edit requires re-encoding.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `data` is not a well-formed document.
    pub fn from_bytes(data: &'a [u8], mode: InPlaceMode) -> Result<Document<'a>> {
        Document::with_source(Cow::Borrowed(data), mode)
    }

    fn with_source(data: Cow<'a, [u8]>, mode: InPlaceMode) -> Result<Document<'a>> {
        wire::validate_buffer(&data)?;
        let mut doc = Document::empty(mode);
        let obj = doc.insert_object(data);
        let root = doc.rep_mut(RepIdx::ROOT);
        root.obj = obj;
        // Strictly a lie: the root has no encoded element of its own. The
        // flag lets serialization detect a pristine tree and emit the input
        // buffer verbatim; it must never be dereferenced as an element.
        root.serialized = true;
        root.left_child = RepIdx::OPAQUE;
        root.right_child = RepIdx::OPAQUE;
        Ok(doc)
    }

    fn empty(mode: InPlaceMode) -> Document<'a> {
        let mut root = ElementRep::detached();
        root.offset = 0; // the pre-seeded empty name
        Document {
            doc_id: NEXT_DOC_ID.fetch_add(1, AtomicOrdering::Relaxed),
            elements: vec![root],
            objects: vec![Cow::Borrowed(EMPTY)],
            field_names: vec![0],
            leaf: Vec::new(),
            damages: match mode {
                InPlaceMode::Enabled => Some(DamageVector::new()),
                InPlaceMode::Disabled => None,
            },
        }
    }

    /// Number of element records currently in the arena.
    ///
    /// Grows as navigation materializes nodes and as `make_*` constructors
    /// run; never shrinks.
    #[inline]
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    // --- Arena / registry / name heap internals ---

    #[inline]
    pub(crate) fn rep(&self, idx: RepIdx) -> &ElementRep {
        debug_assert!(idx.is_valid());
        &self.elements[idx.0 as usize]
    }

    #[inline]
    pub(crate) fn rep_mut(&mut self, idx: RepIdx) -> &mut ElementRep {
        debug_assert!(idx.is_valid());
        &mut self.elements[idx.0 as usize]
    }

    pub(crate) fn insert_rep(&mut self, rep: ElementRep) -> RepIdx {
        let idx = RepIdx(self.elements.len() as u32);
        assert!(idx.is_valid(), "element arena exhausted");
        self.elements.push(rep);
        idx
    }

    fn insert_object(&mut self, data: Cow<'a, [u8]>) -> ObjIdx {
        let idx = self.objects.len();
        assert!(idx <= ObjIdx::MAX as usize, "byte-source registry exhausted");
        self.objects.push(data);
        ObjIdx(idx as u16)
    }

    /// Bytes of the registered source `obj`. Slot 0 resolves to the leaf
    /// builder's current buffer.
    pub(crate) fn object_bytes(&self, obj: ObjIdx) -> &[u8] {
        debug_assert!(obj != ObjIdx::INVALID);
        if obj == ObjIdx::LEAF {
            &self.leaf
        } else {
            &self.objects[obj.0 as usize]
        }
    }

    pub(crate) fn leaf_mut(&mut self) -> &mut Vec<u8> {
        &mut self.leaf
    }

    /// Append `name` to the name heap; returns its offset. The empty name
    /// always resolves to the pre-seeded offset 0.
    pub(crate) fn insert_field_name(&mut self, name: &str) -> u32 {
        if name.is_empty() {
            return 0;
        }
        debug_assert!(!name.as_bytes().contains(&0), "field name with interior NUL");
        let offset = self.field_names.len() as u32;
        self.field_names.extend_from_slice(name.as_bytes());
        self.field_names.push(0);
        offset
    }

    fn field_name_at(&self, offset: u32) -> &str {
        let start = offset as usize;
        let nul = self.field_names[start..]
            .iter()
            .position(|&b| b == 0)
            .expect("name heap entries are NUL-terminated");
        std::str::from_utf8(&self.field_names[start..start + nul])
            .expect("name heap entries are UTF-8")
    }

    /// View of the encoded element backing `rep`.
    pub(crate) fn raw_element(&self, rep: ElementRep) -> RawElement<'_> {
        RawElement::new(self.object_bytes(rep.obj), rep.offset)
    }

    // --- Record interrogation ---

    /// True iff the record's value can be read from backing bytes. The
    /// root is marked serialized but has no element encoding of its own.
    pub(crate) fn rep_has_value(&self, idx: RepIdx) -> bool {
        idx != RepIdx::ROOT && self.rep(idx).serialized
    }

    pub(crate) fn rep_type(&self, idx: RepIdx) -> Type {
        if idx == RepIdx::ROOT {
            return Type::Object;
        }
        let rep = *self.rep(idx);
        if rep.serialized || rep.obj != ObjIdx::INVALID {
            self.raw_element(rep).element_type()
        } else if rep.array {
            Type::Array
        } else {
            Type::Object
        }
    }

    pub(crate) fn rep_is_leaf(&self, idx: RepIdx) -> bool {
        !self.rep_type(idx).is_container()
    }

    pub(crate) fn rep_field_name(&self, idx: RepIdx) -> &str {
        if idx == RepIdx::ROOT {
            return "";
        }
        let rep = *self.rep(idx);
        if rep.serialized || rep.obj != ObjIdx::INVALID {
            self.raw_element(rep).field_name()
        } else {
            self.field_name_at(rep.offset)
        }
    }

    pub(crate) fn rep_field_name_owned(&self, idx: RepIdx) -> String {
        self.rep_field_name(idx).to_owned()
    }

    // --- Lazy materialization ---

    /// Resolve the left child of `index`, materializing it if opaque. May
    /// also settle an empty container's child slots.
    pub(crate) fn resolve_left_child(&mut self, index: RepIdx) -> RepIdx {
        debug_assert!(index.is_valid());
        let rep = *self.rep(index);
        if rep.left_child != RepIdx::OPAQUE {
            return rep.left_child;
        }
        // An opaque child slot implies live backing bytes.
        debug_assert!(rep.serialized);
        let child = {
            let data = self.object_bytes(rep.obj);
            let doc_offset = if index == RepIdx::ROOT {
                // The root is serialized without an element encoding of its
                // own; its children live in the source buffer's own region.
                0
            } else {
                RawElement::new(data, rep.offset).value_offset()
            };
            RawElement::first_in_document(data, doc_offset)
                .map(|el| (el.offset(), el.element_type().is_container()))
        };
        match child {
            Some((offset, container)) => {
                let mut new_rep = ElementRep::detached();
                new_rep.serialized = true;
                new_rep.obj = rep.obj;
                new_rep.offset = offset;
                new_rep.parent = index;
                new_rep.right_sibling = RepIdx::OPAQUE;
                if container {
                    new_rep.left_child = RepIdx::OPAQUE;
                    new_rep.right_child = RepIdx::OPAQUE;
                }
                let inserted = self.insert_rep(new_rep);
                self.rep_mut(index).left_child = inserted;
                inserted
            }
            None => {
                let rep = self.rep_mut(index);
                rep.left_child = RepIdx::INVALID;
                rep.right_child = RepIdx::INVALID;
                RepIdx::INVALID
            }
        }
    }

    /// Resolve the right sibling of `index`, materializing it if opaque.
    /// Reaching the end of the child list also settles the parent's right
    /// child, which is the only way a lazy right child ever gets pinned.
    pub(crate) fn resolve_right_sibling(&mut self, index: RepIdx) -> RepIdx {
        debug_assert!(index.is_valid());
        let rep = *self.rep(index);
        if rep.right_sibling != RepIdx::OPAQUE {
            return rep.right_sibling;
        }
        // An opaque sibling can outlive our own `serialized` flag (edits
        // below us dirty the flag, not the bytes), but never our backing
        // bytes themselves.
        debug_assert!(rep.obj != ObjIdx::INVALID);
        let next = {
            let raw = self.raw_element(rep);
            raw.next_sibling()
                .map(|el| (el.offset(), el.element_type().is_container()))
        };
        match next {
            Some((offset, container)) => {
                let mut new_rep = ElementRep::detached();
                new_rep.serialized = true;
                new_rep.obj = rep.obj;
                new_rep.offset = offset;
                new_rep.parent = rep.parent;
                new_rep.left_sibling = index;
                new_rep.right_sibling = RepIdx::OPAQUE;
                if container {
                    new_rep.left_child = RepIdx::OPAQUE;
                    new_rep.right_child = RepIdx::OPAQUE;
                }
                let inserted = self.insert_rep(new_rep);
                self.rep_mut(index).right_sibling = inserted;
                inserted
            }
            None => {
                self.rep_mut(index).right_sibling = RepIdx::INVALID;
                // We just proved we are the last child, so our parent's
                // (necessarily opaque) right child is us.
                let parent = rep.parent;
                debug_assert!(parent.is_valid());
                debug_assert!(self.rep(parent).right_child == RepIdx::OPAQUE);
                self.rep_mut(parent).right_child = index;
                RepIdx::INVALID
            }
        }
    }

    /// Resolve the right child of `index`, walking the whole child list if
    /// it is still opaque.
    pub(crate) fn resolve_right_child(&mut self, index: RepIdx) -> RepIdx {
        debug_assert!(index.is_valid());
        if self.rep(index).right_child != RepIdx::OPAQUE {
            return self.rep(index).right_child;
        }
        let mut current = self.resolve_left_child(index);
        while current != RepIdx::INVALID {
            let next = self.resolve_right_sibling(current);
            if next == RepIdx::INVALID {
                break;
            }
            current = next;
        }
        debug_assert!(self.rep(index).right_child == current);
        current
    }

    /// Clear `serialized` on `index` and every serialized ancestor: the
    /// backing bytes no longer reflect the subtree and it must be re-walked
    /// on serialization.
    pub(crate) fn mark_dirty(&mut self, mut index: RepIdx) {
        while index != RepIdx::INVALID {
            debug_assert!(!self.rep_is_leaf(index));
            let rep = self.rep_mut(index);
            if !rep.serialized {
                break;
            }
            rep.serialized = false;
            index = rep.parent;
        }
    }

    // --- In-place update plumbing ---

    /// Current in-place configuration.
    #[must_use]
    pub fn in_place_mode(&self) -> InPlaceMode {
        if self.damages.is_some() {
            InPlaceMode::Enabled
        } else {
            InPlaceMode::Disabled
        }
    }

    #[inline]
    pub(crate) fn in_place_enabled(&self) -> bool {
        self.damages.is_some()
    }

    /// Stop producing damage events, irreversibly. Called automatically by
    /// every structural edit and by any ineligible value replacement.
    pub fn disable_in_place_updates(&mut self) {
        self.damages = None;
    }

    /// Reserve capacity for `expected` damage events.
    pub fn reserve_damage_events(&mut self, expected: usize) {
        if let Some(damages) = self.damages.as_mut() {
            damages.reserve(expected);
        }
    }

    pub(crate) fn record_damage(&mut self, target_offset: u32, source_offset: u32, size: u32) {
        let damages = self
            .damages
            .as_mut()
            .expect("damage recorded with in-place updates disabled");
        damages.push(DamageEvent {
            target_offset,
            source_offset,
            size,
        });
    }

    /// Take the accumulated damage events and a snapshot of their source
    /// bytes, leaving the queue empty for further rounds. Returns `None`
    /// once in-place updates have been disabled.
    pub fn in_place_updates(&mut self) -> Option<InPlaceUpdates> {
        let damages = std::mem::take(self.damages.as_mut()?);
        Some(InPlaceUpdates {
            damages,
            source: self.leaf.clone(),
        })
    }

    // --- Element construction ---

    pub(crate) fn handle(&self, idx: RepIdx) -> Element {
        Element {
            doc: self.doc_id,
            idx,
        }
    }

    /// Record a freshly encoded leaf at `offset` in the leaf builder.
    fn insert_leaf_rep(&mut self, offset: u32) -> RepIdx {
        let mut rep = ElementRep::detached();
        rep.obj = ObjIdx::LEAF;
        rep.serialized = true;
        rep.offset = offset;
        self.insert_rep(rep)
    }

    fn make_leaf(&mut self, offset: u32) -> Element {
        let idx = self.insert_leaf_rep(offset);
        self.handle(idx)
    }

    /// Create a detached double element.
    pub fn make_double(&mut self, name: &str, value: f64) -> Element {
        let offset = encode::append_double(&mut self.leaf, name, value);
        self.make_leaf(offset)
    }

    /// Create a detached string element.
    pub fn make_string(&mut self, name: &str, value: &str) -> Element {
        let offset = encode::append_string(&mut self.leaf, name, value);
        self.make_leaf(offset)
    }

    /// Create a detached binary element.
    pub fn make_binary(&mut self, name: &str, subtype: u8, data: &[u8]) -> Element {
        let offset = encode::append_binary(&mut self.leaf, name, subtype, data);
        self.make_leaf(offset)
    }

    /// Create a detached object-id element.
    pub fn make_object_id(&mut self, name: &str, id: [u8; 12]) -> Element {
        let offset = encode::append_object_id(&mut self.leaf, name, id);
        self.make_leaf(offset)
    }

    /// Create a detached boolean element.
    pub fn make_bool(&mut self, name: &str, value: bool) -> Element {
        let offset = encode::append_bool(&mut self.leaf, name, value);
        self.make_leaf(offset)
    }

    /// Create a detached datetime element.
    pub fn make_date(&mut self, name: &str, millis: i64) -> Element {
        let offset = encode::append_date(&mut self.leaf, name, millis);
        self.make_leaf(offset)
    }

    /// Create a detached null element.
    pub fn make_null(&mut self, name: &str) -> Element {
        let offset = encode::append_null(&mut self.leaf, name);
        self.make_leaf(offset)
    }

    /// Create a detached regex element.
    pub fn make_regex(&mut self, name: &str, pattern: &str, options: &str) -> Element {
        let offset = encode::append_regex(&mut self.leaf, name, pattern, options);
        self.make_leaf(offset)
    }

    /// Create a detached int32 element.
    pub fn make_int32(&mut self, name: &str, value: i32) -> Element {
        let offset = encode::append_int32(&mut self.leaf, name, value);
        self.make_leaf(offset)
    }

    /// Create a detached timestamp element.
    pub fn make_timestamp(&mut self, name: &str, value: u64) -> Element {
        let offset = encode::append_timestamp(&mut self.leaf, name, value);
        self.make_leaf(offset)
    }

    /// Create a detached int64 element.
    pub fn make_int64(&mut self, name: &str, value: i64) -> Element {
        let offset = encode::append_int64(&mut self.leaf, name, value);
        self.make_leaf(offset)
    }

    /// Create a detached min-key element.
    pub fn make_min_key(&mut self, name: &str) -> Element {
        let offset = encode::append_min_key(&mut self.leaf, name);
        self.make_leaf(offset)
    }

    /// Create a detached max-key element.
    pub fn make_max_key(&mut self, name: &str) -> Element {
        let offset = encode::append_max_key(&mut self.leaf, name);
        self.make_leaf(offset)
    }

    /// Create a detached, empty object element. Its name lives in the name
    /// heap until the element is serialized.
    pub fn make_object(&mut self, name: &str) -> Element {
        let mut rep = ElementRep::detached();
        rep.offset = self.insert_field_name(name);
        let idx = self.insert_rep(rep);
        self.handle(idx)
    }

    /// Create a detached, empty array element.
    pub fn make_array(&mut self, name: &str) -> Element {
        let mut rep = ElementRep::detached();
        rep.array = true;
        rep.offset = self.insert_field_name(name);
        let idx = self.insert_rep(rep);
        self.handle(idx)
    }

    /// Create a detached object element whose contents are copied from a
    /// pre-encoded document region. Children materialize lazily.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `document` is malformed.
    pub fn make_object_from(&mut self, name: &str, document: &[u8]) -> Result<Element> {
        let total = wire::validate_buffer(document)?;
        let offset = encode::append_object(&mut self.leaf, name, &document[..total]);
        Ok(self.make_container_leaf(offset))
    }

    /// Create a detached array element whose contents are copied from a
    /// pre-encoded document region (names are taken as positions on
    /// emission).
    ///
    /// # Errors
    ///
    /// Returns a validation error if `document` is malformed.
    pub fn make_array_from(&mut self, name: &str, document: &[u8]) -> Result<Element> {
        let total = wire::validate_buffer(document)?;
        let offset = encode::append_array(&mut self.leaf, name, &document[..total]);
        Ok(self.make_container_leaf(offset))
    }

    /// Create a detached element from one pre-encoded element.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `element` is not exactly one
    /// well-formed element.
    pub fn make_raw(&mut self, element: &[u8]) -> Result<Element> {
        wire::validate_standalone_element(element)?;
        let offset = self.leaf.len() as u32;
        self.leaf.extend_from_slice(element);
        Ok(self.make_container_leaf(offset))
    }

    fn make_container_leaf(&mut self, offset: u32) -> Element {
        let idx = self.insert_leaf_rep(offset);
        if !self.rep_is_leaf(idx) {
            let rep = self.rep_mut(idx);
            rep.left_child = RepIdx::OPAQUE;
            rep.right_child = RepIdx::OPAQUE;
        }
        self.handle(idx)
    }

    /// Create a detached copy of `element`, optionally under a new name.
    /// Works for any node, including edited containers, by serializing it
    /// first.
    pub fn make_from_element(&mut self, name: Option<&str>, element: Element) -> Element {
        self.expect_ok(element);
        // Serialize to the side first: the leaf builder cannot be read and
        // appended to at the same time.
        let mut tmp = Vec::new();
        {
            let mut writer = DocWriter::new(&mut tmp);
            self.write_element(element.idx, name, &mut writer);
        }
        let offset = self.leaf.len() as u32;
        self.leaf.extend_from_slice(&tmp);
        self.make_container_leaf(offset)
    }

    // --- Serialization ---

    /// Serialize the whole tree as a document region appended to `out`.
    ///
    /// A pristine tree (no edits anywhere) is emitted as a verbatim copy
    /// of the input buffer.
    pub fn write_to(&mut self, out: &mut Vec<u8>) {
        let root = *self.rep(RepIdx::ROOT);
        if root.serialized {
            debug_assert!(root.obj != ObjIdx::INVALID);
            let data = self.object_bytes(root.obj);
            let total = i32::from_le_bytes(
                data[..4].try_into().expect("buffer validated on construction"),
            ) as usize;
            out.extend_from_slice(&data[..total]);
            return;
        }
        let mut writer = DocWriter::new(out);
        writer.begin();
        self.write_children(RepIdx::ROOT, false, &mut writer);
        writer.end();
    }

    /// Serialize one element (type byte, name, payload) appended to `out`.
    ///
    /// # Panics
    ///
    /// Panics if `element` is the root (use [`write_to`](Self::write_to))
    /// or not a handle of this document.
    pub fn write_element_to(&mut self, element: Element, out: &mut Vec<u8>) {
        self.expect_ok(element);
        assert!(
            element.idx != RepIdx::ROOT,
            "the root serializes as a document body, not an element"
        );
        let mut writer = DocWriter::new(out);
        self.write_element(element.idx, None, &mut writer);
    }

    /// Serialize a container's children as an array body appended to
    /// `out`, renaming them `"0"`, `"1"`, … in order.
    ///
    /// # Panics
    ///
    /// Panics if `element` is not an array of this document.
    pub fn write_array_to(&mut self, element: Element, out: &mut Vec<u8>) {
        self.expect_ok(element);
        assert!(
            self.rep_type(element.idx) == Type::Array,
            "write_array_to on a non-array element"
        );
        let mut writer = DocWriter::new(out);
        writer.begin();
        self.write_children(element.idx, true, &mut writer);
        writer.end();
    }

    /// Serialize the element at `idx`, re-naming it when `name_override`
    /// is set. Serialized nodes are block-copied; edited containers are
    /// re-walked child by child.
    pub(crate) fn write_element(
        &mut self,
        idx: RepIdx,
        name_override: Option<&str>,
        writer: &mut DocWriter<'_>,
    ) {
        if self.rep_has_value(idx) {
            let rep = *self.rep(idx);
            let raw = self.raw_element(rep);
            encode::append_element(writer.buf(), name_override, raw);
            return;
        }
        let ty = self.rep_type(idx);
        debug_assert!(ty.is_container(), "serializing a dirtied leaf");
        let name = match name_override {
            Some(name) => name.to_owned(),
            None => self.rep_field_name_owned(idx),
        };
        writer.begin_nested(ty, &name);
        self.write_children(idx, ty == Type::Array, writer);
        writer.end();
    }

    fn write_children(&mut self, idx: RepIdx, as_array: bool, writer: &mut DocWriter<'_>) {
        let mut child = self.resolve_left_child(idx);
        let mut position = 0u32;
        while child != RepIdx::INVALID {
            if as_array {
                let index_name = position.to_string();
                self.write_element(child, Some(&index_name), writer);
            } else {
                self.write_element(child, None, writer);
            }
            position += 1;
            child = self.resolve_right_sibling(child);
        }
    }
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("elements", &self.elements.len())
            .field("sources", &self.objects.len())
            .field("leaf_len", &self.leaf.len())
            .field("in_place", &self.in_place_mode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"a": 1, "b": 2} with int32 values
    const TWO_INTS: [u8; 19] = [
        0x13, 0x00, 0x00, 0x00, // total_size = 19
        0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00, // a: 1
        0x10, b'b', 0x00, 0x02, 0x00, 0x00, 0x00, // b: 2
        0x00, // terminator
    ];

    #[test]
    fn test_construction_is_lazy() {
        let mut doc = Document::from_bytes(&TWO_INTS, InPlaceMode::Disabled).unwrap();
        // Only the root record exists until navigation demands more.
        assert_eq!(doc.element_count(), 1);

        let a = doc.resolve_left_child(RepIdx::ROOT);
        assert_eq!(doc.element_count(), 2);
        assert_eq!(doc.rep_field_name(a), "a");
        assert_eq!(doc.rep(a).right_sibling, RepIdx::OPAQUE);
    }

    #[test]
    fn test_end_of_list_pins_right_child() {
        let mut doc = Document::from_bytes(&TWO_INTS, InPlaceMode::Disabled).unwrap();
        let a = doc.resolve_left_child(RepIdx::ROOT);
        let b = doc.resolve_right_sibling(a);
        assert_eq!(doc.rep_field_name(b), "b");

        assert_eq!(doc.resolve_right_sibling(b), RepIdx::INVALID);
        assert_eq!(doc.rep(RepIdx::ROOT).right_child, b);
        // No extra records were created for the walk.
        assert_eq!(doc.element_count(), 3);
    }

    #[test]
    fn test_pristine_write_is_verbatim() {
        let mut doc = Document::from_bytes(&TWO_INTS, InPlaceMode::Disabled).unwrap();
        // Navigation alone must not dirty the tree.
        let a = doc.resolve_left_child(RepIdx::ROOT);
        doc.resolve_right_sibling(a);

        let mut out = Vec::new();
        doc.write_to(&mut out);
        assert_eq!(out, TWO_INTS);
    }

    #[test]
    fn test_empty_document_writes_empty_region() {
        let mut doc = Document::new();
        let mut out = Vec::new();
        doc.write_to(&mut out);
        assert_eq!(out, vec![0x05, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_make_leaf_records_offsets() {
        let mut doc = Document::new();
        let x = doc.make_int32("x", 1);
        let y = doc.make_bool("y", true);
        assert!(x.ok() && y.ok());
        assert_eq!(doc.rep(x.idx).obj, ObjIdx::LEAF);
        assert_eq!(doc.rep(x.idx).offset, 0);
        assert_eq!(doc.rep(y.idx).offset, 7);
        assert_eq!(doc.rep_field_name(y.idx), "y");
    }

    #[test]
    fn test_name_heap_empty_name_is_shared() {
        let mut doc = Document::new();
        assert_eq!(doc.insert_field_name(""), 0);
        let first = doc.insert_field_name("alpha");
        let second = doc.insert_field_name("beta");
        assert_eq!(doc.field_name_at(first), "alpha");
        assert_eq!(doc.field_name_at(second), "beta");
        assert_eq!(doc.field_name_at(0), "");
    }

    #[test]
    fn test_make_object_from_copies_into_leaf() {
        let mut doc = Document::new();
        let obj = doc.make_object_from("o", &TWO_INTS).unwrap();
        assert_eq!(doc.rep(obj.idx).obj, ObjIdx::LEAF);
        assert_eq!(doc.rep(obj.idx).left_child, RepIdx::OPAQUE);

        let first = doc.resolve_left_child(obj.idx);
        assert_eq!(doc.rep_field_name(first), "a");
    }
}
