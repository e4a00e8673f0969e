//! Zero-copy views over the wire encoding.
//!
//! A document is `int32 total_size | element* | 0x00`, where `total_size`
//! counts itself, the elements, and the terminator. An element is
//! `u8 type | cstring name | payload`, with the payload layout determined by
//! the type byte. All integers are little-endian.
//!
//! | Byte   | Type      | Payload                                     |
//! |--------|-----------|---------------------------------------------|
//! | `0x01` | Double    | 8-byte f64                                  |
//! | `0x02` | String    | `int32 len` (incl. NUL) + bytes + `\0`      |
//! | `0x03` | Object    | embedded document                           |
//! | `0x04` | Array     | embedded document, names `"0"`, `"1"`, …    |
//! | `0x05` | Binary    | `int32 len` + subtype byte + bytes          |
//! | `0x07` | ObjectId  | 12 bytes                                    |
//! | `0x08` | Bool      | 1 byte                                      |
//! | `0x09` | DateTime  | 8-byte i64 (ms since epoch)                 |
//! | `0x0A` | Null      | empty                                       |
//! | `0x0B` | Regex     | cstring pattern + cstring options           |
//! | `0x10` | Int32     | 4-byte i32                                  |
//! | `0x11` | Timestamp | 8-byte u64                                  |
//! | `0x12` | Int64     | 8-byte i64                                  |
//! | `0x7F` | MaxKey    | empty                                       |
//! | `0xFF` | MinKey    | empty                                       |
//!
//! [`RawElement`] does NOT store parsed data - it stores a reference to the
//! backing buffer and reads on demand via accessor methods. Accessors assume
//! the buffer passed one [`validate_document`] pass; buffers are validated
//! once at document construction, never during navigation.

use std::cmp::Ordering;

use crate::error::{Error, Result};

/// Nesting depth accepted by [`validate_document`].
const MAX_DEPTH: usize = 100;

/// Element type encoded in the leading byte of every element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Type {
    Double = 0x01,
    String = 0x02,
    Object = 0x03,
    Array = 0x04,
    Binary = 0x05,
    ObjectId = 0x07,
    Bool = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    Regex = 0x0B,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl Type {
    /// Parse a type from its wire byte.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTypeByte` for bytes outside the supported set
    /// (including the 0x00 document terminator).
    pub fn from_byte(b: u8) -> Result<Type> {
        match b {
            0x01 => Ok(Type::Double),
            0x02 => Ok(Type::String),
            0x03 => Ok(Type::Object),
            0x04 => Ok(Type::Array),
            0x05 => Ok(Type::Binary),
            0x07 => Ok(Type::ObjectId),
            0x08 => Ok(Type::Bool),
            0x09 => Ok(Type::DateTime),
            0x0A => Ok(Type::Null),
            0x0B => Ok(Type::Regex),
            0x10 => Ok(Type::Int32),
            0x11 => Ok(Type::Timestamp),
            0x12 => Ok(Type::Int64),
            0x7F => Ok(Type::MaxKey),
            0xFF => Ok(Type::MinKey),
            other => Err(Error::InvalidTypeByte(other)),
        }
    }

    /// Get the wire byte for this type.
    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Get the type name as a string (for error messages).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Type::Double => "double",
            Type::String => "string",
            Type::Object => "object",
            Type::Array => "array",
            Type::Binary => "binary",
            Type::ObjectId => "objectid",
            Type::Bool => "bool",
            Type::DateTime => "datetime",
            Type::Null => "null",
            Type::Regex => "regex",
            Type::Int32 => "int32",
            Type::Timestamp => "timestamp",
            Type::Int64 => "int64",
            Type::MaxKey => "maxkey",
            Type::MinKey => "minkey",
        }
    }

    /// Canonical rank used when comparing values of different types.
    ///
    /// All numeric types share one rank, so they compare by numeric value.
    #[must_use]
    pub fn canonical(self) -> i32 {
        match self {
            Type::MinKey => -1,
            Type::Null => 5,
            Type::Double | Type::Int32 | Type::Int64 => 10,
            Type::String => 15,
            Type::Object => 20,
            Type::Array => 25,
            Type::Binary => 30,
            Type::ObjectId => 35,
            Type::Bool => 40,
            Type::DateTime | Type::Timestamp => 45,
            Type::Regex => 50,
            Type::MaxKey => 127,
        }
    }

    /// Check if this is an object or array.
    #[inline]
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Type::Object | Type::Array)
    }

    /// Check if this is a numeric type.
    #[inline]
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Double | Type::Int32 | Type::Int64)
    }

    /// Check if this is an integer type.
    #[inline]
    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(self, Type::Int32 | Type::Int64)
    }
}

/// A typed view of an element's payload for pattern matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// 64-bit floating point number.
    Double(f64),
    /// UTF-8 string (zero-copy reference, NUL terminator stripped).
    String(&'a str),
    /// Embedded document bytes (`int32` size through terminator).
    Object(&'a [u8]),
    /// Embedded document bytes with `"0"`, `"1"`, … names.
    Array(&'a [u8]),
    /// Binary data with its subtype byte.
    Binary { subtype: u8, data: &'a [u8] },
    /// 12-byte object identifier.
    ObjectId([u8; 12]),
    /// Boolean value.
    Bool(bool),
    /// Milliseconds since the epoch.
    DateTime(i64),
    /// Null value.
    Null,
    /// Regular expression pattern and options.
    Regex { pattern: &'a str, options: &'a str },
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit internal timestamp (seconds in the high half, counter low).
    Timestamp(u64),
    /// 64-bit signed integer.
    Int64(i64),
    /// Sorts before every other value.
    MinKey,
    /// Sorts after every other value.
    MaxKey,
}

/// A zero-copy view of one encoded element at an offset in a buffer.
#[derive(Clone, Copy)]
pub struct RawElement<'a> {
    /// The complete backing buffer.
    data: &'a [u8],
    /// Offset of this element's type byte.
    offset: usize,
}

impl<'a> RawElement<'a> {
    /// Create a view of the element at `offset`.
    ///
    /// The buffer must have passed validation; accessors index into it
    /// without re-checking bounds.
    #[inline]
    #[must_use]
    pub fn new(data: &'a [u8], offset: u32) -> Self {
        debug_assert!((offset as usize) < data.len());
        Self {
            data,
            offset: offset as usize,
        }
    }

    /// Get the offset of this element's type byte.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset as u32
    }

    /// Get the element type.
    #[inline]
    #[must_use]
    pub fn element_type(&self) -> Type {
        Type::from_byte(self.data[self.offset]).expect("element validated on construction")
    }

    /// Get the field name size in bytes, including the NUL terminator.
    #[must_use]
    pub fn name_size(&self) -> usize {
        let start = self.offset + 1;
        let nul = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .expect("element validated on construction");
        nul + 1
    }

    /// Get the field name.
    #[must_use]
    pub fn field_name(&self) -> &'a str {
        let start = self.offset + 1;
        let end = start + self.name_size() - 1;
        std::str::from_utf8(&self.data[start..end]).expect("element validated on construction")
    }

    /// Get the absolute offset of the value payload.
    #[inline]
    #[must_use]
    pub fn value_offset(&self) -> u32 {
        (self.offset + 1 + self.name_size()) as u32
    }

    /// Get the value payload size in bytes.
    #[must_use]
    pub fn value_size(&self) -> usize {
        let v = self.value_offset() as usize;
        match self.element_type() {
            Type::Double | Type::DateTime | Type::Timestamp | Type::Int64 => 8,
            Type::Int32 => 4,
            Type::Bool => 1,
            Type::Null | Type::MinKey | Type::MaxKey => 0,
            Type::ObjectId => 12,
            Type::String => 4 + read_i32(self.data, v) as usize,
            Type::Object | Type::Array => read_i32(self.data, v) as usize,
            Type::Binary => 4 + 1 + read_i32(self.data, v) as usize,
            Type::Regex => {
                let pattern = cstring_size(self.data, v);
                pattern + cstring_size(self.data, v + pattern)
            }
        }
    }

    /// Get the total encoded size: type byte + name + payload.
    #[inline]
    #[must_use]
    pub fn total_size(&self) -> usize {
        1 + self.name_size() + self.value_size()
    }

    /// Get the full encoded element bytes.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        &self.data[self.offset..self.offset + self.total_size()]
    }

    /// Get the value payload bytes.
    #[must_use]
    pub fn value_bytes(&self) -> &'a [u8] {
        let v = self.value_offset() as usize;
        &self.data[v..v + self.value_size()]
    }

    /// Get a typed view of the value for pattern matching.
    #[must_use]
    pub fn value(&self) -> Value<'a> {
        let v = self.value_offset() as usize;
        match self.element_type() {
            Type::Double => Value::Double(f64::from_le_bytes(read8(self.data, v))),
            Type::String => {
                let len = read_i32(self.data, v) as usize;
                let bytes = &self.data[v + 4..v + 4 + len - 1];
                Value::String(
                    std::str::from_utf8(bytes).expect("string validated on construction"),
                )
            }
            Type::Object => Value::Object(self.value_bytes()),
            Type::Array => Value::Array(self.value_bytes()),
            Type::Binary => {
                let len = read_i32(self.data, v) as usize;
                Value::Binary {
                    subtype: self.data[v + 4],
                    data: &self.data[v + 5..v + 5 + len],
                }
            }
            Type::ObjectId => {
                let mut id = [0u8; 12];
                id.copy_from_slice(&self.data[v..v + 12]);
                Value::ObjectId(id)
            }
            Type::Bool => Value::Bool(self.data[v] != 0),
            Type::DateTime => Value::DateTime(i64::from_le_bytes(read8(self.data, v))),
            Type::Null => Value::Null,
            Type::Regex => {
                let psize = cstring_size(self.data, v);
                let osize = cstring_size(self.data, v + psize);
                Value::Regex {
                    pattern: std::str::from_utf8(&self.data[v..v + psize - 1])
                        .expect("regex validated on construction"),
                    options: std::str::from_utf8(&self.data[v + psize..v + psize + osize - 1])
                        .expect("regex validated on construction"),
                }
            }
            Type::Int32 => Value::Int32(read_i32(self.data, v)),
            Type::Timestamp => Value::Timestamp(u64::from_le_bytes(read8(self.data, v))),
            Type::Int64 => Value::Int64(i64::from_le_bytes(read8(self.data, v))),
            Type::MinKey => Value::MinKey,
            Type::MaxKey => Value::MaxKey,
        }
    }

    /// First element of the document region starting at `doc_offset`, or
    /// `None` for an empty document.
    #[must_use]
    pub fn first_in_document(data: &'a [u8], doc_offset: u32) -> Option<RawElement<'a>> {
        let first = doc_offset as usize + 4;
        if data[first] == 0 {
            None
        } else {
            Some(RawElement::new(data, first as u32))
        }
    }

    /// Element immediately after this one, or `None` at the terminator.
    #[must_use]
    pub fn next_sibling(&self) -> Option<RawElement<'a>> {
        let next = self.offset + self.total_size();
        if self.data[next] == 0 {
            None
        } else {
            Some(RawElement::new(self.data, next as u32))
        }
    }
}

impl std::fmt::Debug for RawElement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawElement")
            .field("offset", &format_args!("{:#x}", self.offset))
            .field("type", &self.element_type().name())
            .field("name", &self.field_name())
            .finish()
    }
}

#[inline]
fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
fn read8(data: &[u8], offset: usize) -> [u8; 8] {
    data[offset..offset + 8]
        .try_into()
        .expect("8-byte payload validated on construction")
}

/// Byte length of the cstring at `offset`, including the NUL.
fn cstring_size(data: &[u8], offset: usize) -> usize {
    data[offset..]
        .iter()
        .position(|&b| b == 0)
        .expect("cstring validated on construction")
        + 1
}

// --- Validation ---

/// Validate the document region at the start of `data` and return its
/// declared total size. Trailing bytes beyond the declared size are allowed
/// and ignored.
///
/// # Errors
///
/// Returns an error if the region is truncated, misdeclares its size, is
/// missing its terminator, nests too deeply, or contains an element with an
/// unknown type byte, an unterminated or non-UTF-8 name, or a malformed
/// payload.
pub fn validate_buffer(data: &[u8]) -> Result<usize> {
    validate_document(data, 0, 0)
}

/// Validate a single standalone encoded element occupying all of `data`.
///
/// # Errors
///
/// As [`validate_buffer`], plus `Error::SizeMismatch` if the element does
/// not span the entire slice.
pub fn validate_standalone_element(data: &[u8]) -> Result<()> {
    let consumed = validate_element(data, 0, data.len(), 0)?;
    if consumed != data.len() {
        return Err(Error::SizeMismatch {
            declared: consumed as i32,
            available: data.len(),
        });
    }
    Ok(())
}

/// Validate the document region at `offset`; returns the declared size.
fn validate_document(data: &[u8], offset: usize, depth: usize) -> Result<usize> {
    if depth > MAX_DEPTH {
        return Err(Error::NestingTooDeep);
    }
    if data.len() < offset + 5 {
        return Err(Error::DocumentTooSmall);
    }
    let declared = read_i32(data, offset);
    let available = data.len() - offset;
    if declared < 5 || declared as usize > available {
        return Err(Error::SizeMismatch {
            declared,
            available,
        });
    }
    let end = offset + declared as usize;
    if data[end - 1] != 0 {
        return Err(Error::MissingTerminator);
    }
    let mut cursor = offset + 4;
    while data[cursor] != 0 {
        cursor += validate_element(data, cursor, end - 1, depth)?;
        if cursor > end - 1 {
            return Err(Error::TruncatedElement);
        }
    }
    if cursor != end - 1 {
        // The first 0x00 inside the region must be the terminator itself.
        return Err(Error::MissingTerminator);
    }
    Ok(declared as usize)
}

/// Validate one element at `offset`, bounded by `limit` (exclusive); returns
/// its total encoded size.
fn validate_element(data: &[u8], offset: usize, limit: usize, depth: usize) -> Result<usize> {
    if offset >= limit {
        return Err(Error::TruncatedElement);
    }
    let ty = Type::from_byte(data[offset])?;

    let name_start = offset + 1;
    let Some(nul) = data[name_start..limit].iter().position(|&b| b == 0) else {
        return Err(Error::UnterminatedName);
    };
    if std::str::from_utf8(&data[name_start..name_start + nul]).is_err() {
        return Err(Error::InvalidFieldName);
    }
    let v = name_start + nul + 1;

    let value_size = match ty {
        Type::Double | Type::DateTime | Type::Timestamp | Type::Int64 => 8,
        Type::Int32 => 4,
        Type::Bool => 1,
        Type::Null | Type::MinKey | Type::MaxKey => 0,
        Type::ObjectId => 12,
        Type::String => {
            if v + 4 > limit {
                return Err(Error::TruncatedElement);
            }
            let len = read_i32(data, v);
            if len < 1 || v + 4 + len as usize > limit {
                return Err(Error::InvalidString);
            }
            let bytes = &data[v + 4..v + 4 + len as usize];
            if bytes[len as usize - 1] != 0
                || std::str::from_utf8(&bytes[..len as usize - 1]).is_err()
            {
                return Err(Error::InvalidString);
            }
            4 + len as usize
        }
        Type::Object | Type::Array => {
            let declared = validate_document(data, v, depth + 1)?;
            if v + declared > limit {
                return Err(Error::TruncatedElement);
            }
            declared
        }
        Type::Binary => {
            if v + 4 > limit {
                return Err(Error::TruncatedElement);
            }
            let len = read_i32(data, v);
            if len < 0 || v + 4 + 1 + len as usize > limit {
                return Err(Error::TruncatedElement);
            }
            4 + 1 + len as usize
        }
        Type::Regex => {
            let Some(pnul) = data[v..limit].iter().position(|&b| b == 0) else {
                return Err(Error::UnterminatedName);
            };
            let ostart = v + pnul + 1;
            let Some(onul) = data[ostart..limit].iter().position(|&b| b == 0) else {
                return Err(Error::UnterminatedName);
            };
            if std::str::from_utf8(&data[v..v + pnul]).is_err()
                || std::str::from_utf8(&data[ostart..ostart + onul]).is_err()
            {
                return Err(Error::InvalidString);
            }
            pnul + 1 + onul + 1
        }
    };
    if v + value_size > limit {
        return Err(Error::TruncatedElement);
    }
    Ok(1 + (nul + 1) + value_size)
}

// --- Comparison ---

/// Compare two encoded elements with the format's native total order:
/// canonical type rank, then (optionally) field name, then value.
#[must_use]
pub fn compare_elements(
    a: RawElement<'_>,
    b: RawElement<'_>,
    consider_field_names: bool,
) -> Ordering {
    let rank = a
        .element_type()
        .canonical()
        .cmp(&b.element_type().canonical());
    if rank != Ordering::Equal {
        return rank;
    }
    if consider_field_names {
        let names = a.field_name().cmp(b.field_name());
        if names != Ordering::Equal {
            return names;
        }
    }
    compare_values(&a.value(), &b.value())
}

/// Compare two document regions by walking their elements in lockstep.
/// The shorter document compares less when one is a prefix of the other.
#[must_use]
pub fn compare_documents(a: &[u8], b: &[u8], consider_field_names: bool) -> Ordering {
    let mut left = RawElement::first_in_document(a, 0);
    let mut right = RawElement::first_in_document(b, 0);
    loop {
        match (left, right) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let result = compare_elements(x, y, consider_field_names);
                if result != Ordering::Equal {
                    return result;
                }
                left = x.next_sibling();
                right = y.next_sibling();
            }
        }
    }
}

fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Ordering {
    use Value::*;
    match (a, b) {
        (Double(x), Double(y)) => x.total_cmp(y),
        (Double(x), Int32(y)) => x.total_cmp(&f64::from(*y)),
        (Double(x), Int64(y)) => x.total_cmp(&(*y as f64)),
        (Int32(x), Double(y)) => f64::from(*x).total_cmp(y),
        (Int64(x), Double(y)) => (*x as f64).total_cmp(y),
        (Int32(x), Int32(y)) => x.cmp(y),
        (Int32(x), Int64(y)) => i64::from(*x).cmp(y),
        (Int64(x), Int32(y)) => x.cmp(&i64::from(*y)),
        (Int64(x), Int64(y)) => x.cmp(y),
        (String(x), String(y)) => x.cmp(y),
        (Object(x), Object(y)) => compare_documents(x, y, true),
        (Array(x), Array(y)) => compare_documents(x, y, false),
        (
            Binary {
                subtype: sa,
                data: da,
            },
            Binary {
                subtype: sb,
                data: db,
            },
        ) => da
            .len()
            .cmp(&db.len())
            .then(sa.cmp(sb))
            .then_with(|| da.cmp(db)),
        (ObjectId(x), ObjectId(y)) => x.cmp(y),
        (Bool(x), Bool(y)) => x.cmp(y),
        (DateTime(x), DateTime(y)) => x.cmp(y),
        (Timestamp(x), Timestamp(y)) => x.cmp(y),
        (DateTime(x), Timestamp(y)) => i128::from(*x).cmp(&i128::from(*y)),
        (Timestamp(x), DateTime(y)) => i128::from(*x).cmp(&i128::from(*y)),
        (
            Regex {
                pattern: pa,
                options: oa,
            },
            Regex {
                pattern: pb,
                options: ob,
            },
        ) => pa.cmp(pb).then(oa.cmp(ob)),
        (Null, Null) | (MinKey, MinKey) | (MaxKey, MaxKey) => Ordering::Equal,
        _ => unreachable!("mismatched value kinds share a canonical rank"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"a": 1} with a being an int32
    const INT_DOC: [u8; 12] = [
        0x0C, 0x00, 0x00, 0x00, // total_size = 12
        0x10, b'a', 0x00, // int32 "a"
        0x01, 0x00, 0x00, 0x00, // 1
        0x00, // terminator
    ];

    #[test]
    fn test_parse_int_element() {
        assert_eq!(validate_buffer(&INT_DOC).unwrap(), 12);
        let el = RawElement::first_in_document(&INT_DOC, 0).unwrap();
        assert_eq!(el.offset(), 4);
        assert_eq!(el.element_type(), Type::Int32);
        assert_eq!(el.field_name(), "a");
        assert_eq!(el.name_size(), 2);
        assert_eq!(el.value_offset(), 7);
        assert_eq!(el.value_size(), 4);
        assert_eq!(el.total_size(), 7);
        assert!(matches!(el.value(), Value::Int32(1)));
        assert!(el.next_sibling().is_none());
    }

    #[test]
    fn test_parse_string_element() {
        let doc = [
            0x0F, 0x00, 0x00, 0x00, // total_size = 15
            0x02, b's', 0x00, // string "s"
            0x03, 0x00, 0x00, 0x00, // len = 3 (incl. NUL)
            b'h', b'i', 0x00, // "hi"
            0x00, // terminator
        ];
        assert_eq!(validate_buffer(&doc).unwrap(), 15);
        let el = RawElement::first_in_document(&doc, 0).unwrap();
        assert_eq!(el.element_type(), Type::String);
        assert_eq!(el.value_size(), 7);
        assert!(matches!(el.value(), Value::String("hi")));
    }

    #[test]
    fn test_empty_document() {
        let doc = [0x05, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(validate_buffer(&doc).unwrap(), 5);
        assert!(RawElement::first_in_document(&doc, 0).is_none());
    }

    #[test]
    fn test_trailing_bytes_allowed() {
        let mut doc = INT_DOC.to_vec();
        doc.extend_from_slice(&[0xAA, 0xBB]);
        assert_eq!(validate_buffer(&doc).unwrap(), 12);
    }

    #[test]
    fn test_validate_rejects_malformed() {
        assert!(matches!(
            validate_buffer(&[0x01]),
            Err(Error::DocumentTooSmall)
        ));

        // Declared size larger than the buffer.
        let doc = [0x20, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            validate_buffer(&doc),
            Err(Error::SizeMismatch { declared: 32, .. })
        ));

        // Unknown type byte.
        let doc = [
            0x08, 0x00, 0x00, 0x00, // total_size = 8
            0x6F, b'a', 0x00, // bogus type
            0x00,
        ];
        assert!(matches!(
            validate_buffer(&doc),
            Err(Error::InvalidTypeByte(0x6F))
        ));

        // Name never terminated before the end of the element area.
        let doc = [
            0x08, 0x00, 0x00, 0x00, // total_size = 8
            0x0A, b'a', b'b', // null element, runaway name
            0x00,
        ];
        assert!(matches!(
            validate_buffer(&doc),
            Err(Error::UnterminatedName)
        ));
    }

    #[test]
    fn test_walk_siblings() {
        let doc = [
            0x13, 0x00, 0x00, 0x00, // total_size = 19
            0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00, // a: 1
            0x10, b'b', 0x00, 0x02, 0x00, 0x00, 0x00, // b: 2
            0x00, // terminator
        ];
        assert_eq!(validate_buffer(&doc).unwrap(), 19);
        let a = RawElement::first_in_document(&doc, 0).unwrap();
        assert_eq!(a.field_name(), "a");
        let b = a.next_sibling().unwrap();
        assert_eq!(b.field_name(), "b");
        assert!(matches!(b.value(), Value::Int32(2)));
        assert!(b.next_sibling().is_none());
    }

    #[test]
    fn test_compare_numeric_cross_width() {
        assert_eq!(
            compare_values(&Value::Int32(2), &Value::Int64(10)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::Double(2.5), &Value::Int32(2)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Value::Int64(3), &Value::Double(3.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_compare_canonical_ranks() {
        assert!(Type::MinKey.canonical() < Type::Null.canonical());
        assert!(Type::Null.canonical() < Type::Int32.canonical());
        assert!(Type::String.canonical() < Type::Object.canonical());
        assert!(Type::Object.canonical() < Type::Array.canonical());
        assert!(Type::Regex.canonical() < Type::MaxKey.canonical());
    }

    #[test]
    fn test_compare_documents_prefix() {
        let one = [
            0x0C, 0x00, 0x00, 0x00, 0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
        ];
        let two = [
            0x13, 0x00, 0x00, 0x00, // total_size = 19
            0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00, // a: 1
            0x10, b'b', 0x00, 0x02, 0x00, 0x00, 0x00, // b: 2
            0x00,
        ];
        assert_eq!(compare_documents(&one, &two, true), Ordering::Less);
        assert_eq!(compare_documents(&two, &one, true), Ordering::Greater);
        assert_eq!(compare_documents(&one, &one, true), Ordering::Equal);
    }
}
