//! JSON serialization and deserialization for documents.
//!
//! The bridge maps JSON onto the wire format and back. Types with no JSON
//! counterpart use single-purpose object spellings, stable in both
//! directions:
//!
//! | Wire type | JSON                                      |
//! |-----------|-------------------------------------------|
//! | null      | `null`                                    |
//! | bool      | `true` / `false`                          |
//! | int32     | integer that fits in 32 bits              |
//! | int64     | `{"$numberLong": "123"}`                  |
//! | double    | other number                              |
//! | string    | string                                    |
//! | object    | object                                    |
//! | array     | array                                     |
//! | binary    | `{"$binary": "<base64>", "$type": 0}`     |
//! | objectid  | `{"$oid": "<24 hex chars>"}`              |
//! | datetime  | `{"$date": 1700000000000}`                |
//! | regex     | `{"$regex": "^a", "$options": "i"}`       |
//! | timestamp | `{"$timestamp": {"t": 1, "i": 2}}`        |
//! | minkey    | `{"$minKey": 1}`                          |
//! | maxkey    | `{"$maxKey": 1}`                          |
//!
//! # Example
//!
//! ```
//! use mubson::{from_json, to_json};
//!
//! let mut doc = from_json(r#"{"name": "alice", "age": 30}"#).unwrap();
//! let json = to_json(&mut doc).unwrap();
//! assert_eq!(json, r#"{"name":"alice","age":30}"#);
//! ```

use base64::Engine as _;
use serde_json::{json, Map, Number, Value as JsonValue};

use crate::document::{Document, InPlaceMode};
use crate::element::Element;
use crate::encode::{self, DocWriter};
use crate::error::{Error, Result};
use crate::wire::{Type, Value};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Parse a JSON object into a document.
///
/// The document owns a canonically encoded buffer; in-place updates are
/// disabled (parse into [`Document::from_vec`] with
/// [`json_to_bytes`] to pick a mode).
///
/// # Errors
///
/// Returns `Error::JsonParse` for invalid JSON or a non-object top level.
pub fn from_json(json: &str) -> Result<Document<'static>> {
    Document::from_vec(json_to_bytes(json)?, InPlaceMode::Disabled)
}

/// Encode a JSON object as a canonical document buffer.
///
/// # Errors
///
/// Returns `Error::JsonParse` for invalid JSON or a non-object top level.
pub fn json_to_bytes(json: &str) -> Result<Vec<u8>> {
    let value: JsonValue =
        serde_json::from_str(json).map_err(|e| Error::JsonParse(e.to_string()))?;
    let JsonValue::Object(map) = value else {
        return Err(Error::JsonParse(
            "top-level JSON value must be an object".to_owned(),
        ));
    };
    let mut buf = Vec::new();
    let mut writer = DocWriter::new(&mut buf);
    writer.begin();
    write_members(&mut writer, &map)?;
    writer.end();
    Ok(buf)
}

/// Serialize a document as a JSON string.
///
/// Takes `&mut` because walking the tree may materialize records.
///
/// # Errors
///
/// Returns `Error::NonFiniteFloat` for NaN or infinite doubles, and
/// `Error::JsonSerialize` if the JSON writer fails.
pub fn to_json(doc: &mut Document<'_>) -> Result<String> {
    let root = doc.root();
    let value = container_to_json(doc, root, false)?;
    serde_json::to_string(&value).map_err(|e| Error::JsonSerialize(e.to_string()))
}

fn write_members(writer: &mut DocWriter<'_>, map: &Map<String, JsonValue>) -> Result<()> {
    for (name, value) in map {
        write_value(writer, name, value)?;
    }
    Ok(())
}

fn write_value(writer: &mut DocWriter<'_>, name: &str, value: &JsonValue) -> Result<()> {
    match value {
        JsonValue::Null => {
            encode::append_null(writer.buf(), name);
        }
        JsonValue::Bool(b) => {
            encode::append_bool(writer.buf(), name, *b);
        }
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(narrow) => encode::append_int32(writer.buf(), name, narrow),
                    Err(_) => encode::append_int64(writer.buf(), name, i),
                };
            } else if let Some(f) = n.as_f64() {
                encode::append_double(writer.buf(), name, f);
            } else {
                return Err(Error::JsonParse(format!("number {n} out of range")));
            }
        }
        JsonValue::String(s) => {
            encode::append_string(writer.buf(), name, s);
        }
        JsonValue::Array(items) => {
            writer.begin_nested(Type::Array, name);
            for (index, item) in items.iter().enumerate() {
                let index_name = index.to_string();
                write_value(writer, &index_name, item)?;
            }
            writer.end();
        }
        JsonValue::Object(map) => {
            if let Some(extended) = write_extended(writer, name, map) {
                return extended;
            }
            writer.begin_nested(Type::Object, name);
            write_members(writer, map)?;
            writer.end();
        }
    }
    Ok(())
}

/// Handle the `$`-prefixed object spellings; `None` means a plain object.
fn write_extended(
    writer: &mut DocWriter<'_>,
    name: &str,
    map: &Map<String, JsonValue>,
) -> Option<Result<()>> {
    if map.len() == 1 {
        if let Some(JsonValue::String(hex)) = map.get("$oid") {
            return Some(parse_object_id(hex).map(|id| {
                encode::append_object_id(writer.buf(), name, id);
            }));
        }
        if let Some(millis) = map.get("$date") {
            return Some(match millis.as_i64() {
                Some(millis) => {
                    encode::append_date(writer.buf(), name, millis);
                    Ok(())
                }
                None => Err(Error::JsonParse(format!("invalid $date {millis}"))),
            });
        }
        if let Some(JsonValue::String(digits)) = map.get("$numberLong") {
            return Some(match digits.parse::<i64>() {
                Ok(v) => {
                    encode::append_int64(writer.buf(), name, v);
                    Ok(())
                }
                Err(_) => Err(Error::JsonParse(format!("invalid $numberLong {digits:?}"))),
            });
        }
        if let Some(ts) = map.get("$timestamp") {
            let fields = (
                ts.get("t").and_then(JsonValue::as_u64),
                ts.get("i").and_then(JsonValue::as_u64),
            );
            return Some(match fields {
                (Some(t), Some(i)) if t <= u64::from(u32::MAX) && i <= u64::from(u32::MAX) => {
                    encode::append_timestamp(writer.buf(), name, t << 32 | i);
                    Ok(())
                }
                _ => Err(Error::JsonParse(format!("invalid $timestamp {ts}"))),
            });
        }
        if map.contains_key("$minKey") {
            encode::append_min_key(writer.buf(), name);
            return Some(Ok(()));
        }
        if map.contains_key("$maxKey") {
            encode::append_max_key(writer.buf(), name);
            return Some(Ok(()));
        }
    }
    if map.len() == 2 {
        if let (Some(JsonValue::String(payload)), Some(subtype)) =
            (map.get("$binary"), map.get("$type"))
        {
            let subtype = match subtype.as_u64() {
                Some(s) if s <= u64::from(u8::MAX) => s as u8,
                _ => return Some(Err(Error::JsonParse(format!("invalid $type {subtype}")))),
            };
            return Some(match BASE64.decode(payload) {
                Ok(data) => {
                    encode::append_binary(writer.buf(), name, subtype, &data);
                    Ok(())
                }
                Err(e) => Err(Error::JsonParse(format!("invalid $binary: {e}"))),
            });
        }
        if let (Some(JsonValue::String(pattern)), Some(JsonValue::String(options))) =
            (map.get("$regex"), map.get("$options"))
        {
            encode::append_regex(writer.buf(), name, pattern, options);
            return Some(Ok(()));
        }
    }
    None
}

fn container_to_json(doc: &mut Document<'_>, el: Element, as_array: bool) -> Result<JsonValue> {
    if as_array {
        let mut items = Vec::new();
        let mut child = doc.left_child(el);
        while child.ok() {
            items.push(element_to_json(doc, child)?);
            child = doc.right_sibling(child);
        }
        Ok(JsonValue::Array(items))
    } else {
        let mut map = Map::new();
        let mut child = doc.left_child(el);
        while child.ok() {
            let name = doc.field_name(child).to_owned();
            map.insert(name, element_to_json(doc, child)?);
            child = doc.right_sibling(child);
        }
        Ok(JsonValue::Object(map))
    }
}

fn element_to_json(doc: &mut Document<'_>, el: Element) -> Result<JsonValue> {
    match doc.element_type(el) {
        Type::Object => container_to_json(doc, el, false),
        Type::Array => container_to_json(doc, el, true),
        _ => {
            let value = doc.value(el).expect("leaves always carry a value");
            scalar_to_json(&value)
        }
    }
}

fn scalar_to_json(value: &Value<'_>) -> Result<JsonValue> {
    Ok(match value {
        Value::Double(f) => {
            JsonValue::Number(Number::from_f64(*f).ok_or(Error::NonFiniteFloat(*f))?)
        }
        Value::String(s) => JsonValue::String((*s).to_owned()),
        Value::Binary { subtype, data } => {
            json!({"$binary": BASE64.encode(data), "$type": subtype})
        }
        Value::ObjectId(id) => json!({"$oid": object_id_hex(id)}),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::DateTime(millis) => json!({"$date": millis}),
        Value::Null => JsonValue::Null,
        Value::Regex { pattern, options } => json!({"$regex": pattern, "$options": options}),
        Value::Int32(v) => JsonValue::from(*v),
        Value::Timestamp(v) => {
            json!({"$timestamp": {"t": (v >> 32) as u32, "i": *v as u32}})
        }
        Value::Int64(v) => json!({"$numberLong": v.to_string()}),
        Value::MinKey => json!({"$minKey": 1}),
        Value::MaxKey => json!({"$maxKey": 1}),
        Value::Object(_) | Value::Array(_) => {
            unreachable!("containers are handled by the tree walk")
        }
    })
}

fn parse_object_id(hex: &str) -> Result<[u8; 12]> {
    if hex.len() != 24 || !hex.is_ascii() {
        return Err(Error::JsonParse(format!("invalid $oid {hex:?}")));
    }
    let mut id = [0u8; 12];
    for (i, byte) in id.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
            .map_err(|_| Error::JsonParse(format!("invalid $oid {hex:?}")))?;
    }
    Ok(id)
}

fn object_id_hex(id: &[u8; 12]) -> String {
    use std::fmt::Write as _;
    let mut hex = String::with_capacity(24);
    for byte in id {
        write!(hex, "{byte:02x}").expect("writing to a String cannot fail");
    }
    hex
}
