//! Table-driven JSON bridge round-trips.

use serde::Deserialize;

use mubson::{from_json, json_to_bytes, to_json, Document, InPlaceMode};

#[derive(Deserialize)]
struct BridgeCase {
    description: String,
    json: serde_json::Value,
}

const CASES: &str = r#"[
    {"description": "empty object", "json": {}},
    {"description": "flat scalars", "json": {"a": 1, "b": "two", "c": true, "d": null}},
    {"description": "preserved key order", "json": {"zeta": 1, "alpha": 2, "mid": 3}},
    {"description": "number widths", "json": {"i32": 2147483647, "f": 0.5, "neg": -12}},
    {"description": "int64 spelling", "json": {"n": {"$numberLong": "9000000000"}}},
    {"description": "nested objects", "json": {"a": {"b": {"c": {"d": 1}}}}},
    {"description": "arrays", "json": {"xs": [1, [2, 3], {"four": 4}, "five"]}},
    {"description": "object id", "json": {"id": {"$oid": "507f1f77bcf86cd799439011"}}},
    {"description": "datetime", "json": {"when": {"$date": 1700000000000}}},
    {"description": "binary", "json": {"blob": {"$binary": "AAEC", "$type": 0}}},
    {"description": "regex", "json": {"re": {"$regex": "^a.*z$", "$options": "im"}}},
    {"description": "timestamp", "json": {"ts": {"$timestamp": {"t": 4, "i": 9}}}},
    {"description": "key sentinels", "json": {"lo": {"$minKey": 1}, "hi": {"$maxKey": 1}}},
    {"description": "empty containers", "json": {"obj": {}, "arr": []}},
    {"description": "unicode strings", "json": {"greeting": "grüß dich 世界"}}
]"#;

#[test]
fn test_bridge_roundtrip() {
    let cases: Vec<BridgeCase> = serde_json::from_str(CASES).expect("failed to parse test table");
    for case in &cases {
        let json_str = serde_json::to_string(&case.json).unwrap();

        let mut doc = from_json(&json_str)
            .unwrap_or_else(|e| panic!("from_json failed for '{}': {e}", case.description));
        let result = to_json(&mut doc)
            .unwrap_or_else(|e| panic!("to_json failed for '{}': {e}", case.description));

        assert_eq!(
            json_str, result,
            "round-trip mismatch for '{}'",
            case.description
        );
    }
}

#[test]
fn test_bridge_bytes_roundtrip() {
    // Encoding, reopening, and re-serializing must reproduce the buffer.
    let cases: Vec<BridgeCase> = serde_json::from_str(CASES).expect("failed to parse test table");
    for case in &cases {
        let json_str = serde_json::to_string(&case.json).unwrap();
        let bytes = json_to_bytes(&json_str).unwrap();

        let mut doc = Document::from_bytes(&bytes, InPlaceMode::Disabled)
            .unwrap_or_else(|e| panic!("reopen failed for '{}': {e}", case.description));
        let mut out = Vec::new();
        doc.write_to(&mut out);

        assert_eq!(out, bytes, "byte mismatch for '{}'", case.description);
    }
}

#[test]
fn test_json_after_edits() {
    let mut doc = from_json(r#"{"a": 1, "b": {"c": 2}}"#).unwrap();
    let root = doc.root();
    let a = doc.left_child(root);
    let b = doc.right_sibling(a);

    doc.set_string(a, "one").unwrap();
    let d = doc.make_bool("d", true);
    doc.push_back(b, d).unwrap();

    assert_eq!(
        to_json(&mut doc).unwrap(),
        r#"{"a":"one","b":{"c":2,"d":true}}"#
    );
}

#[test]
fn test_json_rejects_bad_input() {
    assert!(from_json("{").is_err());
    assert!(from_json("42").is_err());
    assert!(from_json(r#"{"id": {"$oid": "nope"}}"#).is_err());
    assert!(from_json(r#"{"n": {"$numberLong": "forty"}}"#).is_err());
    assert!(from_json(r#"{"b": {"$binary": "!!!", "$type": 0}}"#).is_err());
}
