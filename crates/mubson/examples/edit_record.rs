//! Example of loading, editing, and patching a record in place.
//!
//! cargo run --package mubson --example edit_record

use mubson::{json_to_bytes, to_json, Document, InPlaceMode};

fn main() -> Result<(), mubson::Error> {
    let bytes = json_to_bytes(r#"{"user": "amy", "logins": 3, "tags": ["admin"]}"#)?;

    let mut doc = Document::from_bytes(&bytes, InPlaceMode::Enabled)?;
    let root = doc.root();

    // Navigate: root -> "logins", and bump it. The replacement is the same
    // encoded size, so it is recorded as a byte patch.
    let user = doc.left_child(root);
    let logins = doc.right_sibling(user);
    doc.set_int32(logins, 4)?;

    let updates = doc.in_place_updates().expect("still in-place eligible");
    let mut patched = bytes.clone();
    updates.apply(&mut patched);

    let mut reopened = Document::from_bytes(&patched, InPlaceMode::Disabled)?;
    println!("patched: {}", to_json(&mut reopened)?);

    // Structural edits fall back to full re-serialization.
    let tags = doc.right_sibling(logins);
    let extra = doc.make_string("", "ops");
    doc.push_back(tags, extra)?;

    let mut rewritten = Vec::new();
    doc.write_to(&mut rewritten);
    let mut reopened = Document::from_vec(rewritten, InPlaceMode::Disabled)?;
    println!("rewritten: {}", to_json(&mut reopened)?);

    Ok(())
}
