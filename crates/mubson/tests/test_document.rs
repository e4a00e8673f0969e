//! Tree construction, lazy materialization, topology edits, and
//! serialization round-trips.

use mubson::{json_to_bytes, Document, Error, InPlaceMode, Type, Value};

fn open(json: &str) -> Document<'static> {
    Document::from_vec(json_to_bytes(json).unwrap(), InPlaceMode::Disabled).unwrap()
}

#[test]
fn test_lazy_materialization_allocates_on_demand() {
    let mut doc = open(r#"{"xs": {"x": "x", "X": "X"}, "ys": {"y": "y"}}"#);
    // Construction materializes nothing but the root.
    assert_eq!(doc.element_count(), 1);

    let root = doc.root();
    let xs = doc.left_child(root);
    assert!(xs.ok());
    assert_eq!(doc.field_name(xs), "xs");
    // Only xs was materialized; its children and ys are still opaque.
    assert_eq!(doc.element_count(), 2);
}

#[test]
fn test_end_of_list_installs_right_child() {
    let mut doc = open(r#"{"xs": {"x": "x", "X": "X"}, "ys": {"y": "y"}}"#);
    let root = doc.root();
    let xs = doc.left_child(root);
    let ys = doc.right_sibling(xs);
    assert!(ys.ok());
    assert_eq!(doc.field_name(ys), "ys");
    assert_eq!(doc.element_count(), 3);

    let end = doc.right_sibling(ys);
    assert!(!end.ok());
    // Proving ys is last pinned the root's right child without
    // materializing anything new.
    assert_eq!(doc.right_child(root), ys);
    assert_eq!(doc.element_count(), 3);
}

#[test]
fn test_roundtrip_without_edits_is_byte_equal() {
    let fixtures = [
        r#"{}"#,
        r#"{"a": 1}"#,
        r#"{"a": 1, "b": 2}"#,
        r#"{"xs": {"x": "x", "X": "X"}, "ys": {"y": "y"}}"#,
        r#"{"mixed": [1, "two", {"three": 3}, [4]], "tail": null}"#,
        r#"{"t": true, "f": false, "d": 2.25, "big": {"$numberLong": "9000000000"}}"#,
        r#"{"oid": {"$oid": "507f1f77bcf86cd799439011"}, "when": {"$date": 1700000000000}}"#,
        r#"{"bin": {"$binary": "aGVsbG8=", "$type": 0}, "re": {"$regex": "^a+", "$options": "i"}}"#,
        r#"{"lo": {"$minKey": 1}, "hi": {"$maxKey": 1}, "ts": {"$timestamp": {"t": 7, "i": 3}}}"#,
    ];
    for json in fixtures {
        let bytes = json_to_bytes(json).unwrap();
        let mut doc = Document::from_bytes(&bytes, InPlaceMode::Disabled).unwrap();

        // Navigate a little first: reads must not dirty the tree.
        let root = doc.root();
        let mut child = doc.left_child(root);
        while child.ok() {
            child = doc.right_sibling(child);
        }

        let mut out = Vec::new();
        doc.write_to(&mut out);
        assert_eq!(out, bytes, "round-trip failed for {json}");
    }
}

#[test]
fn test_push_back_and_serialize() {
    let mut doc = open(r#"{"a": 1, "b": 2}"#);
    let root = doc.root();
    let c = doc.make_int32("c", 3);
    doc.push_back(root, c).unwrap();

    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(out, json_to_bytes(r#"{"a": 1, "b": 2, "c": 3}"#).unwrap());
}

#[test]
fn test_push_front_and_sibling_inserts() {
    let mut doc = open(r#"{"b": 2}"#);
    let root = doc.root();

    let a = doc.make_int32("a", 1);
    doc.push_front(root, a).unwrap();
    let d = doc.make_int32("d", 4);
    doc.push_back(root, d).unwrap();
    let b = doc.right_sibling(a);
    let c = doc.make_int32("c", 3);
    doc.add_sibling_right(b, c).unwrap();
    let z = doc.make_int32("z", 0);
    doc.add_sibling_left(a, z).unwrap();

    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(
        out,
        json_to_bytes(r#"{"z": 0, "a": 1, "b": 2, "c": 3, "d": 4}"#).unwrap()
    );
}

#[test]
fn test_remove_then_reattach_restores_original() {
    let original = json_to_bytes(r#"{"a": 1, "b": 2}"#).unwrap();
    let mut doc = Document::from_bytes(&original, InPlaceMode::Disabled).unwrap();
    let root = doc.root();
    let a = doc.left_child(root);
    let b = doc.right_sibling(a);

    doc.remove(b).unwrap();
    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(out, json_to_bytes(r#"{"a": 1}"#).unwrap());

    // The inverse edit restores the original bytes.
    doc.push_back(root, b).unwrap();
    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(out, original);
}

#[test]
fn test_attach_errors_and_recovery() {
    let mut doc = Document::new();
    let root = doc.root();
    let e1 = doc.make_int32("x", 1);

    doc.push_back(root, e1).unwrap();
    assert_eq!(doc.push_back(root, e1), Err(Error::DanglingParent));

    doc.remove(e1).unwrap();
    doc.push_back(root, e1).unwrap();

    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(out, json_to_bytes(r#"{"x": 1}"#).unwrap());
}

#[test]
fn test_handle_stability_across_edits() {
    let mut doc = open(r#"{"a": 1, "b": 2, "c": 3}"#);
    let root = doc.root();
    let a = doc.left_child(root);
    let b = doc.right_sibling(a);
    let c = doc.right_sibling(b);

    doc.remove(a).unwrap();
    let front = doc.make_string("front", "f");
    doc.push_front(root, front).unwrap();
    doc.set_int32(c, 33).unwrap();

    // Old handles still address the same logical nodes.
    assert_eq!(doc.field_name(b), "b");
    assert!(matches!(doc.value(b), Some(Value::Int32(2))));
    assert_eq!(doc.field_name(c), "c");
    assert!(matches!(doc.value(c), Some(Value::Int32(33))));
    // And the detached node can come back.
    doc.push_back(root, a).unwrap();

    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(
        out,
        json_to_bytes(r#"{"front": "f", "b": 2, "c": 33, "a": 1}"#).unwrap()
    );
}

#[test]
fn test_rename_leaf_and_container() {
    let mut doc = open(r#"{"a": 1, "sub": {"x": 1, "y": 2}}"#);
    let root = doc.root();
    let a = doc.left_child(root);
    let sub = doc.right_sibling(a);

    doc.rename(a, "alpha").unwrap();
    doc.rename(sub, "nested").unwrap();

    // Renaming kept values and children intact.
    assert_eq!(doc.field_name(a), "alpha");
    assert!(matches!(doc.value(a), Some(Value::Int32(1))));
    let x = doc.left_child(sub);
    assert_eq!(doc.field_name(x), "x");

    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(
        out,
        json_to_bytes(r#"{"alpha": 1, "nested": {"x": 1, "y": 2}}"#).unwrap()
    );
}

#[test]
fn test_build_document_from_scratch() {
    let mut doc = Document::new();
    let root = doc.root();

    let name = doc.make_string("name", "amy");
    doc.push_back(root, name).unwrap();
    let tags = doc.make_array("tags");
    doc.push_back(root, tags).unwrap();
    let first = doc.make_string("whatever", "admin");
    doc.push_back(tags, first).unwrap();
    let second = doc.make_string("ignored", "ops");
    doc.push_back(tags, second).unwrap();
    let meta = doc.make_object("meta");
    doc.push_back(root, meta).unwrap();
    let level = doc.make_int32("level", 9);
    doc.push_back(meta, level).unwrap();

    let mut out = Vec::new();
    doc.write_to(&mut out);
    // Array children serialize under synthesized index names, whatever
    // their records say.
    assert_eq!(
        out,
        json_to_bytes(r#"{"name": "amy", "tags": ["admin", "ops"], "meta": {"level": 9}}"#)
            .unwrap()
    );
}

#[test]
fn test_write_array_to_synthesizes_index_names() {
    let mut doc = open(r#"{"arr": [10, 20, 30]}"#);
    let root = doc.root();
    let arr = doc.left_child(root);
    assert_eq!(doc.element_type(arr), Type::Array);

    let mut body = Vec::new();
    doc.write_array_to(arr, &mut body);

    // The body must equal the embedded array region of the input.
    let expected = match doc.value(arr) {
        Some(Value::Array(region)) => region.to_vec(),
        other => panic!("expected an array value, got {other:?}"),
    };
    assert_eq!(body, expected);
}

#[test]
fn test_write_element_to_single_element() {
    let mut doc = open(r#"{"a": 1}"#);
    let root = doc.root();
    let a = doc.left_child(root);

    let mut out = Vec::new();
    doc.write_element_to(a, &mut out);
    assert_eq!(out, vec![0x10, b'a', 0x00, 0x01, 0x00, 0x00, 0x00]);
}

#[test]
fn test_make_object_from_and_set_object() {
    let inner = json_to_bytes(r#"{"x": 1}"#).unwrap();
    let mut doc = open(r#"{"a": 1}"#);
    let root = doc.root();

    let obj = doc.make_object_from("o", &inner).unwrap();
    doc.push_back(root, obj).unwrap();
    let a = doc.left_child(root);
    doc.set_object(a, &json_to_bytes(r#"{"y": 2}"#).unwrap()).unwrap();

    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(
        out,
        json_to_bytes(r#"{"a": {"y": 2}, "o": {"x": 1}}"#).unwrap()
    );
}

#[test]
fn test_make_from_element_copies_subtrees() {
    let mut doc = open(r#"{"sub": {"x": 1, "y": [true, false]}}"#);
    let root = doc.root();
    let sub = doc.left_child(root);

    let copy = doc.make_from_element(Some("twin"), sub);
    doc.push_back(root, copy).unwrap();

    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(
        out,
        json_to_bytes(
            r#"{"sub": {"x": 1, "y": [true, false]}, "twin": {"x": 1, "y": [true, false]}}"#
        )
        .unwrap()
    );
}

#[test]
fn test_set_raw_dispatches_on_type() {
    let mut doc = open(r#"{"a": 1}"#);
    let root = doc.root();
    let a = doc.left_child(root);

    // A pre-encoded string element; its own name is ignored.
    let raw = vec![
        0x02, b'n', 0x00, // string "n"
        0x03, 0x00, 0x00, 0x00, // len = 3
        b'h', b'i', 0x00, // "hi"
    ];
    doc.set_raw(a, &raw).unwrap();
    assert_eq!(doc.field_name(a), "a");
    assert!(matches!(doc.value(a), Some(Value::String("hi"))));

    assert_eq!(doc.set_raw(a, &[0x00]), Err(Error::SetTerminator));
}

#[test]
fn test_compare_trees_and_raw() {
    let mut doc = open(r#"{"obj": {"a": 1, "b": 2}}"#);
    let root = doc.root();
    let obj = doc.left_child(root);

    // Equal to its own encoding.
    let encoded = {
        let mut out = Vec::new();
        doc.write_element_to(obj, &mut out);
        out
    };
    assert_eq!(
        doc.compare_with_raw(obj, &encoded, true).unwrap(),
        std::cmp::Ordering::Equal
    );

    // A dirty copy still compares equal to the pristine encoding.
    let twin = doc.make_from_element(Some("obj"), obj);
    let extra = doc.make_int32("c", 3);
    doc.push_back(twin, extra).unwrap();
    assert_eq!(
        doc.compare_with_raw(twin, &encoded, true).unwrap(),
        std::cmp::Ordering::Greater
    );
    assert_eq!(doc.compare(obj, twin, true), std::cmp::Ordering::Less);
}

#[test]
fn test_validation_rejects_garbage() {
    assert!(matches!(
        Document::from_bytes(&[0x01, 0x02], InPlaceMode::Disabled),
        Err(Error::DocumentTooSmall)
    ));
    let bad = [0xFF, 0xFF, 0xFF, 0xFF, 0x00];
    assert!(Document::from_bytes(&bad, InPlaceMode::Disabled).is_err());
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let mut bytes = json_to_bytes(r#"{"a": 1}"#).unwrap();
    let clean = bytes.clone();
    bytes.extend_from_slice(&[0xDE, 0xAD]);

    let mut doc = Document::from_bytes(&bytes, InPlaceMode::Disabled).unwrap();
    let mut out = Vec::new();
    doc.write_to(&mut out);
    assert_eq!(out, clean);
}
