//! Element handles and the element-level API.
//!
//! An [`Element`] is a small copyable token: the owning document's id plus
//! an arena index. It stays valid for the whole life of its document; arena
//! growth, edits, and lazy materialization never invalidate it. All
//! operations live on [`Document`], taking the handle as an argument -
//! `&mut self` where navigation may materialize records, `&self` where it
//! cannot.
//!
//! Using a handle with a document other than the one that issued it, or
//! navigating from a handle that is not [`ok`](Element::ok), is a
//! programming error and panics; the recoverable failures of the mutation
//! API are returned as [`Error`] values instead.

use std::cmp::Ordering;

use crate::document::{Document, ElementRep, ObjIdx, RepIdx};
use crate::encode;
use crate::error::{Error, Result};
use crate::wire::{self, RawElement, Type, Value};

/// A handle to one node of a [`Document`].
///
/// Handles returned by walking off the end of a sibling list (or up from
/// the root) answer `ok() == false`; everything else about them is
/// off-limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element {
    pub(crate) doc: u32,
    pub(crate) idx: RepIdx,
}

impl Element {
    /// Check that this handle refers to a node (rather than the end of a
    /// list).
    #[inline]
    #[must_use]
    pub fn ok(&self) -> bool {
        self.idx.is_valid()
    }
}

impl<'a> Document<'a> {
    fn expect_mine(&self, element: Element) {
        assert!(
            element.doc == self.doc_id,
            "element handle used with a document that did not create it"
        );
    }

    pub(crate) fn expect_ok(&self, element: Element) {
        self.expect_mine(element);
        assert!(element.ok(), "operation on an invalid element handle");
    }

    // --- Navigation ---

    /// The root object. Always present, nameless, and never detachable.
    #[must_use]
    pub fn root(&self) -> Element {
        self.handle(RepIdx::ROOT)
    }

    /// Parent of `element`; not `ok()` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self, element: Element) -> Element {
        self.expect_ok(element);
        let parent = self.rep(element.idx).parent;
        debug_assert!(parent != RepIdx::OPAQUE);
        self.handle(parent)
    }

    /// Left sibling of `element`; not `ok()` at the front of the list.
    #[must_use]
    pub fn left_sibling(&self, element: Element) -> Element {
        self.expect_ok(element);
        let left = self.rep(element.idx).left_sibling;
        // Anything reachable left-to-right has its left side settled.
        debug_assert!(left != RepIdx::OPAQUE);
        self.handle(left)
    }

    /// Right sibling of `element`, materializing it on first visit; not
    /// `ok()` at the end of the list.
    #[must_use]
    pub fn right_sibling(&mut self, element: Element) -> Element {
        self.expect_ok(element);
        let right = self.resolve_right_sibling(element.idx);
        self.handle(right)
    }

    /// First child of `element`, materializing it on first visit; not
    /// `ok()` for leaves and empty containers.
    #[must_use]
    pub fn left_child(&mut self, element: Element) -> Element {
        self.expect_ok(element);
        let child = self.resolve_left_child(element.idx);
        self.handle(child)
    }

    /// Last child of `element`, materializing the whole child list if it
    /// is still opaque.
    #[must_use]
    pub fn right_child(&mut self, element: Element) -> Element {
        self.expect_ok(element);
        let child = self.resolve_right_child(element.idx);
        self.handle(child)
    }

    /// Check whether `element` has at least one child.
    #[must_use]
    pub fn has_children(&mut self, element: Element) -> bool {
        self.expect_ok(element);
        self.resolve_left_child(element.idx) != RepIdx::INVALID
    }

    // --- Inspection ---

    /// Wire type of `element`. The root is always an object.
    #[must_use]
    pub fn element_type(&self, element: Element) -> Type {
        self.expect_ok(element);
        self.rep_type(element.idx)
    }

    /// Field name of `element`. The root's name is empty.
    #[must_use]
    pub fn field_name(&self, element: Element) -> &str {
        self.expect_ok(element);
        self.rep_field_name(element.idx)
    }

    /// Check whether `element`'s value can be read from backing bytes.
    /// Edited containers (and the root) have no value of their own.
    #[must_use]
    pub fn has_value(&self, element: Element) -> bool {
        self.expect_ok(element);
        self.rep_has_value(element.idx)
    }

    /// Typed view of `element`'s value, or `None` when it has none.
    #[must_use]
    pub fn value(&self, element: Element) -> Option<Value<'_>> {
        self.expect_ok(element);
        if !self.rep_has_value(element.idx) {
            return None;
        }
        let rep = *self.rep(element.idx);
        Some(self.raw_element(rep).value())
    }

    /// Check for a numeric type (double, int32, int64).
    #[must_use]
    pub fn is_numeric(&self, element: Element) -> bool {
        self.element_type(element).is_numeric()
    }

    /// Check for an integer type (int32, int64).
    #[must_use]
    pub fn is_integral(&self, element: Element) -> bool {
        self.element_type(element).is_integral()
    }

    // --- Topology mutation ---

    /// Check that `element` roots a clean subtree and may be wired in as
    /// somebody's child or sibling.
    fn check_attachable(&self, element: Element) -> Result<()> {
        let rep = self.rep(element.idx);
        if rep.left_sibling != RepIdx::INVALID {
            return Err(Error::DanglingLeftSibling);
        }
        if rep.right_sibling != RepIdx::INVALID {
            return Err(Error::DanglingRightSibling);
        }
        if rep.parent != RepIdx::INVALID {
            return Err(Error::DanglingParent);
        }
        if element.idx == RepIdx::ROOT {
            return Err(Error::CannotAttachRoot);
        }
        Ok(())
    }

    /// Attach `new` directly to the left of `element`.
    ///
    /// # Errors
    ///
    /// Fails if `new` is not attachable or `element` has no parent.
    pub fn add_sibling_left(&mut self, element: Element, new: Element) -> Result<()> {
        self.expect_ok(element);
        self.expect_ok(new);
        self.check_attachable(new)?;

        let this_rep = *self.rep(element.idx);
        debug_assert!(this_rep.parent != RepIdx::OPAQUE);
        if this_rep.parent == RepIdx::INVALID {
            return Err(Error::SiblingOfParentless);
        }
        self.disable_in_place_updates();

        {
            let new_rep = self.rep_mut(new.idx);
            new_rep.parent = this_rep.parent;
            new_rep.right_sibling = element.idx;
            new_rep.left_sibling = this_rep.left_sibling;
        }
        if this_rep.left_sibling != RepIdx::INVALID {
            self.rep_mut(this_rep.left_sibling).right_sibling = new.idx;
        }
        self.rep_mut(element.idx).left_sibling = new.idx;

        // If we were our parent's left child, the new element now is.
        let parent_rep = self.rep_mut(this_rep.parent);
        if parent_rep.left_child == element.idx {
            parent_rep.left_child = new.idx;
        }
        self.mark_dirty(this_rep.parent);
        Ok(())
    }

    /// Attach `new` directly to the right of `element`.
    ///
    /// # Errors
    ///
    /// Fails if `new` is not attachable or `element` has no parent.
    pub fn add_sibling_right(&mut self, element: Element, new: Element) -> Result<()> {
        self.expect_ok(element);
        self.expect_ok(new);
        self.check_attachable(new)?;

        let parent = self.rep(element.idx).parent;
        debug_assert!(parent != RepIdx::OPAQUE);
        if parent == RepIdx::INVALID {
            return Err(Error::SiblingOfParentless);
        }
        self.disable_in_place_updates();

        // Our right sibling must be real before we can splice in front of
        // it.
        let right = match self.rep(element.idx).right_sibling {
            RepIdx::OPAQUE => self.resolve_right_sibling(element.idx),
            other => other,
        };

        {
            let new_rep = self.rep_mut(new.idx);
            new_rep.parent = parent;
            new_rep.left_sibling = element.idx;
            new_rep.right_sibling = right;
        }
        self.rep_mut(element.idx).right_sibling = new.idx;
        if right != RepIdx::INVALID {
            self.rep_mut(right).left_sibling = new.idx;
        }

        // If we were our parent's right child, the new element now is.
        let parent_rep = self.rep_mut(parent);
        if parent_rep.right_child == element.idx {
            parent_rep.right_child = new.idx;
        }
        self.mark_dirty(parent);
        Ok(())
    }

    fn add_child(&mut self, parent: Element, child: Element, front: bool) -> Result<()> {
        self.expect_ok(parent);
        self.expect_ok(child);
        self.check_attachable(child)?;
        if self.rep_is_leaf(parent.idx) {
            return Err(Error::AddChildToLeaf);
        }
        self.disable_in_place_updates();

        if front {
            let first = self.resolve_left_child(parent.idx);
            if first != RepIdx::INVALID {
                let first = self.handle(first);
                return self.add_sibling_left(first, child);
            }
        } else {
            let last = self.resolve_right_child(parent.idx);
            if last != RepIdx::INVALID {
                let last = self.handle(last);
                return self.add_sibling_right(last, child);
            }
        }

        // No children: the new element becomes both first and last.
        let parent_rep = self.rep_mut(parent.idx);
        debug_assert!(
            parent_rep.left_child == RepIdx::INVALID && parent_rep.right_child == RepIdx::INVALID
        );
        parent_rep.left_child = child.idx;
        parent_rep.right_child = child.idx;
        self.rep_mut(child.idx).parent = parent.idx;
        self.mark_dirty(parent.idx);
        Ok(())
    }

    /// Attach `child` as the first child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if `child` is not attachable or `parent` is a leaf.
    pub fn push_front(&mut self, parent: Element, child: Element) -> Result<()> {
        self.add_child(parent, child, true)
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if `child` is not attachable or `parent` is a leaf.
    pub fn push_back(&mut self, parent: Element, child: Element) -> Result<()> {
        self.add_child(parent, child, false)
    }

    /// Detach `element` from its parent and siblings. The record stays in
    /// the arena; the handle remains valid and the node may be attached
    /// again elsewhere.
    ///
    /// # Errors
    ///
    /// Fails with `Error::RemoveParentless` if `element` is the root or
    /// already detached.
    pub fn remove(&mut self, element: Element) -> Result<()> {
        self.expect_ok(element);
        // Realize an opaque right sibling now; we must rewire it below.
        self.resolve_right_sibling(element.idx);

        let this_rep = *self.rep(element.idx);
        if this_rep.parent == RepIdx::INVALID {
            return Err(Error::RemoveParentless);
        }
        self.disable_in_place_updates();

        if this_rep.right_sibling != RepIdx::INVALID {
            self.rep_mut(this_rep.right_sibling).left_sibling = this_rep.left_sibling;
        }
        if this_rep.left_sibling != RepIdx::INVALID {
            self.rep_mut(this_rep.left_sibling).right_sibling = this_rep.right_sibling;
        }
        let parent_rep = self.rep_mut(this_rep.parent);
        if parent_rep.right_child == element.idx {
            parent_rep.right_child = this_rep.left_sibling;
        }
        if parent_rep.left_child == element.idx {
            parent_rep.left_child = this_rep.right_sibling;
        }
        self.mark_dirty(this_rep.parent);

        let rep = self.rep_mut(element.idx);
        rep.parent = RepIdx::INVALID;
        rep.left_sibling = RepIdx::INVALID;
        rep.right_sibling = RepIdx::INVALID;
        Ok(())
    }

    /// Give `element` a new field name.
    ///
    /// # Errors
    ///
    /// Fails with `Error::RenameRoot` on the root.
    pub fn rename(&mut self, element: Element, new_name: &str) -> Result<()> {
        self.expect_ok(element);
        if element.idx == RepIdx::ROOT {
            return Err(Error::RenameRoot);
        }
        self.disable_in_place_updates();

        let rep = *self.rep(element.idx);
        if rep.obj != ObjIdx::INVALID && !self.rep_is_leaf(element.idx) {
            // A byte-backed container. Realize the relatives we could
            // otherwise no longer find, then detach from the bytes and
            // keep only the container kind.
            let array = self.rep_type(element.idx) == Type::Array;
            self.resolve_left_child(element.idx);
            self.resolve_right_sibling(element.idx);
            self.mark_dirty(element.idx);
            let rep = self.rep_mut(element.idx);
            rep.array = array;
            rep.obj = ObjIdx::INVALID;
        }

        if self.rep_has_value(element.idx) {
            // Leaves are rebuilt under the new name and spliced in.
            let replacement = self.make_from_element(Some(new_name), element);
            self.splice_value(element, replacement, false)
        } else {
            let offset = self.insert_field_name(new_name);
            self.rep_mut(element.idx).offset = offset;
            Ok(())
        }
    }

    // --- Value replacement ---

    /// Wire `value`'s record into `element`'s slot, keeping `element`'s
    /// place among its relatives. The donor record is cleared so stale
    /// handles to it read as detached.
    fn splice_value(&mut self, element: Element, value: Element, in_place: bool) -> Result<()> {
        debug_assert!(element.ok() && value.ok());
        if element.idx == RepIdx::ROOT {
            return Err(Error::SetValueRoot);
        }
        if !in_place {
            self.disable_in_place_updates();
        }
        // Realize an opaque right sibling while the backing bytes can
        // still tell us where it is.
        self.resolve_right_sibling(element.idx);

        let this_rep = *self.rep(element.idx);
        let mut value_rep = *self.rep(value.idx);
        if this_rep.parent != RepIdx::INVALID {
            value_rep.parent = this_rep.parent;
            value_rep.left_sibling = this_rep.left_sibling;
            value_rep.right_sibling = this_rep.right_sibling;
        }
        *self.rep_mut(element.idx) = value_rep;
        *self.rep_mut(value.idx) = ElementRep::detached();
        self.mark_dirty(this_rep.parent);
        Ok(())
    }

    /// Replace `element`'s value with a freshly encoded leaf.
    ///
    /// When `fixed_width` is set and in-place mode is still live, an
    /// equal-size replacement of a byte-backed leaf is recorded as damage
    /// events (type byte if it changed, then the value payload) instead of
    /// invalidating the input buffer. Everything else splices and turns
    /// in-place mode off.
    fn set_leaf_value(
        &mut self,
        element: Element,
        fixed_width: bool,
        append: &dyn Fn(&mut Vec<u8>, &str) -> u32,
    ) -> Result<()> {
        self.expect_ok(element);
        if element.idx == RepIdx::ROOT {
            return Err(Error::SetValueRoot);
        }
        let name = self.rep_field_name_owned(element.idx);
        let offset = append(self.leaf_mut(), &name);
        let new_idx = {
            let mut rep = ElementRep::detached();
            rep.obj = ObjIdx::LEAF;
            rep.serialized = true;
            rep.offset = offset;
            let idx = self.insert_rep(rep);
            if !self.rep_is_leaf(idx) {
                let rep = self.rep_mut(idx);
                rep.left_child = RepIdx::OPAQUE;
                rep.right_child = RepIdx::OPAQUE;
            }
            idx
        };
        let new = self.handle(new_idx);

        let mut in_place = false;
        let eligible = fixed_width
            && self.in_place_enabled()
            && self.rep_has_value(element.idx)
            && self.rep(element.idx).obj != ObjIdx::LEAF;
        if eligible {
            let this_rep = *self.rep(element.idx);
            let new_rep = *self.rep(new_idx);
            let (this_total, this_type, this_name_size, this_value_size) = {
                let raw = self.raw_element(this_rep);
                (
                    raw.total_size(),
                    raw.element_type(),
                    raw.name_size(),
                    raw.value_size(),
                )
            };
            let (new_total, new_type) = {
                let raw = self.raw_element(new_rep);
                (raw.total_size(), raw.element_type())
            };
            if this_total == new_total {
                in_place = true;
                let target_base = this_rep.offset;
                let source_base = new_rep.offset;
                if this_type != new_type {
                    self.record_damage(target_base, source_base, 1);
                }
                // Name sizes match because the totals and value widths do;
                // only the payload (and possibly the type byte) changes.
                let value_at = 1 + this_name_size as u32;
                self.record_damage(
                    target_base + value_at,
                    source_base + value_at,
                    this_value_size as u32,
                );
            }
        }
        self.splice_value(element, new, in_place)
    }

    /// Replace with a double value. Eligible for in-place update.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_double(&mut self, element: Element, value: f64) -> Result<()> {
        self.set_leaf_value(element, true, &|buf, name| {
            encode::append_double(buf, name, value)
        })
    }

    /// Replace with a string value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_string(&mut self, element: Element, value: &str) -> Result<()> {
        self.set_leaf_value(element, false, &|buf, name| {
            encode::append_string(buf, name, value)
        })
    }

    /// Replace with a binary value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_binary(&mut self, element: Element, subtype: u8, data: &[u8]) -> Result<()> {
        self.set_leaf_value(element, false, &|buf, name| {
            encode::append_binary(buf, name, subtype, data)
        })
    }

    /// Replace with an object-id value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_object_id(&mut self, element: Element, id: [u8; 12]) -> Result<()> {
        self.set_leaf_value(element, false, &|buf, name| {
            encode::append_object_id(buf, name, id)
        })
    }

    /// Replace with a boolean value. Eligible for in-place update.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_bool(&mut self, element: Element, value: bool) -> Result<()> {
        self.set_leaf_value(element, true, &|buf, name| {
            encode::append_bool(buf, name, value)
        })
    }

    /// Replace with a datetime value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_date(&mut self, element: Element, millis: i64) -> Result<()> {
        self.set_leaf_value(element, false, &|buf, name| {
            encode::append_date(buf, name, millis)
        })
    }

    /// Replace with a null value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_null(&mut self, element: Element) -> Result<()> {
        self.set_leaf_value(element, false, &encode::append_null)
    }

    /// Replace with a regex value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_regex(&mut self, element: Element, pattern: &str, options: &str) -> Result<()> {
        self.set_leaf_value(element, false, &|buf, name| {
            encode::append_regex(buf, name, pattern, options)
        })
    }

    /// Replace with an int32 value. Eligible for in-place update.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_int32(&mut self, element: Element, value: i32) -> Result<()> {
        self.set_leaf_value(element, true, &|buf, name| {
            encode::append_int32(buf, name, value)
        })
    }

    /// Replace with a timestamp value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_timestamp(&mut self, element: Element, value: u64) -> Result<()> {
        self.set_leaf_value(element, false, &|buf, name| {
            encode::append_timestamp(buf, name, value)
        })
    }

    /// Replace with an int64 value. Eligible for in-place update.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_int64(&mut self, element: Element, value: i64) -> Result<()> {
        self.set_leaf_value(element, true, &|buf, name| {
            encode::append_int64(buf, name, value)
        })
    }

    /// Replace with a min-key value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_min_key(&mut self, element: Element) -> Result<()> {
        self.set_leaf_value(element, false, &encode::append_min_key)
    }

    /// Replace with a max-key value.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetValueRoot` on the root.
    pub fn set_max_key(&mut self, element: Element) -> Result<()> {
        self.set_leaf_value(element, false, &encode::append_max_key)
    }

    /// Replace with an object copied from pre-encoded document bytes.
    ///
    /// # Errors
    ///
    /// Fails on the root, or if `document` is malformed.
    pub fn set_object(&mut self, element: Element, document: &[u8]) -> Result<()> {
        let total = wire::validate_buffer(document)?;
        let document = &document[..total];
        self.set_leaf_value(element, false, &|buf, name| {
            encode::append_object(buf, name, document)
        })
    }

    /// Replace with an array copied from pre-encoded document bytes.
    ///
    /// # Errors
    ///
    /// Fails on the root, or if `document` is malformed.
    pub fn set_array(&mut self, element: Element, document: &[u8]) -> Result<()> {
        let total = wire::validate_buffer(document)?;
        let document = &document[..total];
        self.set_leaf_value(element, false, &|buf, name| {
            encode::append_array(buf, name, document)
        })
    }

    /// Replace with the value of one pre-encoded element. The element's
    /// own field name is ignored; the target keeps its name. Fixed-width
    /// values dispatch through their typed setters and may update in
    /// place.
    ///
    /// # Errors
    ///
    /// Fails with `Error::SetTerminator` for the 0x00 terminator byte, a
    /// validation error for malformed bytes, or `Error::SetValueRoot` on
    /// the root.
    pub fn set_raw(&mut self, element: Element, bytes: &[u8]) -> Result<()> {
        if bytes.first() == Some(&0) {
            return Err(Error::SetTerminator);
        }
        wire::validate_standalone_element(bytes)?;
        let raw = RawElement::new(bytes, 0);
        match raw.value() {
            Value::Double(v) => self.set_double(element, v),
            Value::String(v) => self.set_string(element, v),
            Value::Object(doc) => self.set_object(element, doc),
            Value::Array(doc) => self.set_array(element, doc),
            Value::Binary { subtype, data } => self.set_binary(element, subtype, data),
            Value::ObjectId(id) => self.set_object_id(element, id),
            Value::Bool(v) => self.set_bool(element, v),
            Value::DateTime(v) => self.set_date(element, v),
            Value::Null => self.set_null(element),
            Value::Regex { pattern, options } => self.set_regex(element, pattern, options),
            Value::Int32(v) => self.set_int32(element, v),
            Value::Timestamp(v) => self.set_timestamp(element, v),
            Value::Int64(v) => self.set_int64(element, v),
            Value::MinKey => self.set_min_key(element),
            Value::MaxKey => self.set_max_key(element),
        }
    }

    // --- Comparison ---

    /// Compare two nodes of this document with the format's native total
    /// order: canonical type rank, then (optionally) field names, then
    /// values, recursing through containers in lockstep.
    ///
    /// # Panics
    ///
    /// Panics if either handle belongs to another document.
    #[must_use]
    pub fn compare(&mut self, a: Element, b: Element, consider_field_names: bool) -> Ordering {
        self.expect_ok(a);
        self.expect_ok(b);
        if a.idx == b.idx {
            return Ordering::Equal;
        }

        // Whenever one side has backing bytes we can compare against its
        // encoding; copy it aside first since walking the other side may
        // materialize records.
        if self.rep_has_value(a.idx) {
            let bytes = self.raw_element(*self.rep(a.idx)).bytes().to_vec();
            return self
                .compare_element_with_bytes(b.idx, &bytes, consider_field_names)
                .reverse();
        }
        if self.rep_has_value(b.idx) {
            let bytes = self.raw_element(*self.rep(b.idx)).bytes().to_vec();
            return self.compare_element_with_bytes(a.idx, &bytes, consider_field_names);
        }

        // Two edited containers.
        let type_a = self.rep_type(a.idx);
        let type_b = self.rep_type(b.idx);
        let rank = type_a.canonical().cmp(&type_b.canonical());
        if rank != Ordering::Equal {
            return rank;
        }
        if consider_field_names {
            let names = self
                .rep_field_name(a.idx)
                .cmp(self.rep_field_name(b.idx));
            if names != Ordering::Equal {
                return names;
            }
        }
        // Array positions are synthetic, so array children compare without
        // names.
        let child_names = type_a != Type::Array && type_b != Type::Array;
        let mut left = self.resolve_left_child(a.idx);
        let mut right = self.resolve_left_child(b.idx);
        loop {
            if left == RepIdx::INVALID {
                return if right == RepIdx::INVALID {
                    Ordering::Equal
                } else {
                    Ordering::Less
                };
            }
            if right == RepIdx::INVALID {
                return Ordering::Greater;
            }
            let left_handle = self.handle(left);
            let right_handle = self.handle(right);
            let result = self.compare(left_handle, right_handle, child_names);
            if result != Ordering::Equal {
                return result;
            }
            left = self.resolve_right_sibling(left);
            right = self.resolve_right_sibling(right);
        }
    }

    /// Compare a node against one pre-encoded element.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed bytes.
    pub fn compare_with_raw(
        &mut self,
        element: Element,
        bytes: &[u8],
        consider_field_names: bool,
    ) -> Result<Ordering> {
        self.expect_ok(element);
        wire::validate_standalone_element(bytes)?;
        Ok(self.compare_element_with_bytes(element.idx, bytes, consider_field_names))
    }

    /// `bytes` must hold exactly one validated element.
    fn compare_element_with_bytes(
        &mut self,
        idx: RepIdx,
        bytes: &[u8],
        consider_field_names: bool,
    ) -> Ordering {
        let other = RawElement::new(bytes, 0);
        if self.rep_has_value(idx) {
            let rep = *self.rep(idx);
            let raw = self.raw_element(rep);
            return wire::compare_elements(raw, other, consider_field_names);
        }

        // An edited container against an encoded element.
        let ty = self.rep_type(idx);
        let rank = ty.canonical().cmp(&other.element_type().canonical());
        if rank != Ordering::Equal {
            return rank;
        }
        if consider_field_names {
            let names = self.rep_field_name(idx).cmp(other.field_name());
            if names != Ordering::Equal {
                return names;
            }
        }
        let child_names = ty != Type::Array && other.element_type() != Type::Array;
        let mut left = self.resolve_left_child(idx);
        let mut right = RawElement::first_in_document(bytes, other.value_offset());
        loop {
            match (left == RepIdx::INVALID, right) {
                (true, None) => return Ordering::Equal,
                (true, Some(_)) => return Ordering::Less,
                (false, None) => return Ordering::Greater,
                (false, Some(right_el)) => {
                    let result =
                        self.compare_element_with_bytes(left, right_el.bytes(), child_names);
                    if result != Ordering::Equal {
                        return result;
                    }
                    left = self.resolve_right_sibling(left);
                    right = right_el.next_sibling();
                }
            }
        }
    }
}
