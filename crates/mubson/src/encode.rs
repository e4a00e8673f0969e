//! Encoding utilities for writing elements and documents.
//!
//! The `append_*` functions serialize one named element into a growing
//! buffer and return the byte offset where the element starts. They back
//! the document's leaf builder: every newly created leaf is encoded once
//! and then referenced by its offset.
//!
//! [`DocWriter`] produces whole document regions, backpatching each
//! region's `int32` size prefix when it is closed.

use crate::wire::{RawElement, Type};

/// Append the type byte and field name, returning the element's offset.
fn append_header(buf: &mut Vec<u8>, ty: Type, name: &str) -> u32 {
    let start = buf.len() as u32;
    buf.push(ty.byte());
    append_cstring(buf, name);
    start
}

/// Append `s` followed by a NUL.
///
/// Field names must not contain interior NUL bytes; the wire format cannot
/// represent them.
pub(crate) fn append_cstring(buf: &mut Vec<u8>, s: &str) {
    debug_assert!(!s.as_bytes().contains(&0), "cstring with interior NUL");
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

/// Append a double element.
pub fn append_double(buf: &mut Vec<u8>, name: &str, value: f64) -> u32 {
    let start = append_header(buf, Type::Double, name);
    buf.extend_from_slice(&value.to_le_bytes());
    start
}

/// Append a string element (`int32` length including NUL, bytes, NUL).
pub fn append_string(buf: &mut Vec<u8>, name: &str, value: &str) -> u32 {
    let start = append_header(buf, Type::String, name);
    let len = value.len() as i32 + 1;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(value.as_bytes());
    buf.push(0);
    start
}

/// Append an object element embedding pre-encoded document bytes.
pub fn append_object(buf: &mut Vec<u8>, name: &str, document: &[u8]) -> u32 {
    let start = append_header(buf, Type::Object, name);
    buf.extend_from_slice(document);
    start
}

/// Append an array element embedding pre-encoded document bytes.
pub fn append_array(buf: &mut Vec<u8>, name: &str, document: &[u8]) -> u32 {
    let start = append_header(buf, Type::Array, name);
    buf.extend_from_slice(document);
    start
}

/// Append a binary element.
pub fn append_binary(buf: &mut Vec<u8>, name: &str, subtype: u8, data: &[u8]) -> u32 {
    let start = append_header(buf, Type::Binary, name);
    buf.extend_from_slice(&(data.len() as i32).to_le_bytes());
    buf.push(subtype);
    buf.extend_from_slice(data);
    start
}

/// Append an object-id element.
pub fn append_object_id(buf: &mut Vec<u8>, name: &str, id: [u8; 12]) -> u32 {
    let start = append_header(buf, Type::ObjectId, name);
    buf.extend_from_slice(&id);
    start
}

/// Append a boolean element.
pub fn append_bool(buf: &mut Vec<u8>, name: &str, value: bool) -> u32 {
    let start = append_header(buf, Type::Bool, name);
    buf.push(u8::from(value));
    start
}

/// Append a datetime element (milliseconds since the epoch).
pub fn append_date(buf: &mut Vec<u8>, name: &str, millis: i64) -> u32 {
    let start = append_header(buf, Type::DateTime, name);
    buf.extend_from_slice(&millis.to_le_bytes());
    start
}

/// Append a null element.
pub fn append_null(buf: &mut Vec<u8>, name: &str) -> u32 {
    append_header(buf, Type::Null, name)
}

/// Append a regex element (pattern and options cstrings).
pub fn append_regex(buf: &mut Vec<u8>, name: &str, pattern: &str, options: &str) -> u32 {
    let start = append_header(buf, Type::Regex, name);
    append_cstring(buf, pattern);
    append_cstring(buf, options);
    start
}

/// Append an int32 element.
pub fn append_int32(buf: &mut Vec<u8>, name: &str, value: i32) -> u32 {
    let start = append_header(buf, Type::Int32, name);
    buf.extend_from_slice(&value.to_le_bytes());
    start
}

/// Append a timestamp element.
pub fn append_timestamp(buf: &mut Vec<u8>, name: &str, value: u64) -> u32 {
    let start = append_header(buf, Type::Timestamp, name);
    buf.extend_from_slice(&value.to_le_bytes());
    start
}

/// Append an int64 element.
pub fn append_int64(buf: &mut Vec<u8>, name: &str, value: i64) -> u32 {
    let start = append_header(buf, Type::Int64, name);
    buf.extend_from_slice(&value.to_le_bytes());
    start
}

/// Append a min-key element.
pub fn append_min_key(buf: &mut Vec<u8>, name: &str) -> u32 {
    append_header(buf, Type::MinKey, name)
}

/// Append a max-key element.
pub fn append_max_key(buf: &mut Vec<u8>, name: &str) -> u32 {
    append_header(buf, Type::MaxKey, name)
}

/// Re-encode `element` under `name` (or verbatim when `name` is `None`).
pub fn append_element(buf: &mut Vec<u8>, name: Option<&str>, element: RawElement<'_>) -> u32 {
    match name {
        None => {
            let start = buf.len() as u32;
            buf.extend_from_slice(element.bytes());
            start
        }
        Some(name) => {
            let start = append_header(buf, element.element_type(), name);
            buf.extend_from_slice(element.value_bytes());
            start
        }
    }
}

/// Incremental writer for (possibly nested) document regions.
///
/// Each `begin*` call opens a region whose `int32` size prefix is patched
/// by the matching [`end`](DocWriter::end). Elements are appended between
/// the two, either verbatim or through the `append_*` functions on the
/// underlying buffer obtained via [`buf`](DocWriter::buf).
pub struct DocWriter<'b> {
    buf: &'b mut Vec<u8>,
    /// Offsets of the open regions' size prefixes.
    frames: Vec<usize>,
}

impl<'b> DocWriter<'b> {
    /// Create a writer appending to `buf`.
    pub fn new(buf: &'b mut Vec<u8>) -> Self {
        Self {
            buf,
            frames: Vec::new(),
        }
    }

    /// Open a document region with no element header (a root body).
    pub fn begin(&mut self) {
        self.frames.push(self.buf.len());
        self.buf.extend_from_slice(&[0; 4]);
    }

    /// Open a nested container element: type byte, name, then the region.
    pub fn begin_nested(&mut self, ty: Type, name: &str) {
        debug_assert!(ty.is_container());
        self.buf.push(ty.byte());
        append_cstring(self.buf, name);
        self.begin();
    }

    /// Close the innermost open region: write the terminator and backpatch
    /// the size prefix.
    ///
    /// # Panics
    ///
    /// Panics if no region is open.
    pub fn end(&mut self) {
        let frame = self.frames.pop().expect("no open document region");
        self.buf.push(0);
        let total = (self.buf.len() - frame) as i32;
        self.buf[frame..frame + 4].copy_from_slice(&total.to_le_bytes());
    }

    /// Access the underlying buffer for element appends.
    pub fn buf(&mut self) -> &mut Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{validate_standalone_element, RawElement, Value};

    #[test]
    fn test_append_int32() {
        let mut buf = Vec::new();
        let off = append_int32(&mut buf, "a", 1);
        assert_eq!(off, 0);
        assert_eq!(buf, vec![0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00]);
        assert!(validate_standalone_element(&buf).is_ok());
    }

    #[test]
    fn test_append_string() {
        let mut buf = Vec::new();
        append_string(&mut buf, "s", "hi");
        assert_eq!(
            buf,
            vec![
                0x02, b's', 0x00, // string "s"
                0x03, 0x00, 0x00, 0x00, // len = 3 (incl. NUL)
                b'h', b'i', 0x00, // "hi"
            ]
        );
    }

    #[test]
    fn test_append_binary() {
        let mut buf = Vec::new();
        append_binary(&mut buf, "b", 0x00, &[0xAA, 0xBB]);
        assert_eq!(
            buf,
            vec![
                0x05, b'b', 0x00, // binary "b"
                0x02, 0x00, 0x00, 0x00, // len = 2
                0x00, // subtype
                0xAA, 0xBB,
            ]
        );
    }

    #[test]
    fn test_append_offsets_accumulate() {
        let mut buf = Vec::new();
        let first = append_bool(&mut buf, "x", true);
        let second = append_null(&mut buf, "y");
        assert_eq!(first, 0);
        assert_eq!(second, 4); // bool element is 4 bytes
        let el = RawElement::new(&buf, second);
        assert_eq!(el.field_name(), "y");
        assert!(matches!(el.value(), Value::Null));
    }

    #[test]
    fn test_append_element_rename() {
        let mut buf = Vec::new();
        append_int32(&mut buf, "long_name", 7);
        let el = RawElement::new(&buf, 0);

        let mut out = Vec::new();
        append_element(&mut out, Some("n"), el);
        assert_eq!(out, vec![0x10, b'n', 0x00, 0x07, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_doc_writer_nesting() {
        let mut buf = Vec::new();
        let mut writer = DocWriter::new(&mut buf);
        writer.begin();
        append_int32(writer.buf(), "a", 1);
        writer.begin_nested(Type::Object, "o");
        append_int32(writer.buf(), "b", 2);
        writer.end();
        writer.end();

        assert_eq!(
            buf,
            vec![
                0x1B, 0x00, 0x00, 0x00, // total_size = 27
                0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00, // a: 1
                0x03, b'o', 0x00, // object "o"
                0x0C, 0x00, 0x00, 0x00, // total_size = 12
                0x10, b'b', 0x00, 0x02, 0x00, 0x00, 0x00, // b: 2
                0x00, // inner terminator
                0x00, // outer terminator
            ]
        );
    }
}
