//! A mutable document tree over a binary key-value record format.
//!
//! Wire-format buffers are immutable and expensive to parse. [`Document`]
//! loads one, lets you navigate to arbitrary points, insert, remove,
//! rename, and retype fields, and then either re-serializes bit-exactly or
//! - when only same-size primitive values changed - hands back a
//! [`damage log`](DamageEvent) of byte patches that can be applied to the
//! original buffer in place.
//!
//! Records for nested content are materialized lazily: subtrees that are
//! never visited are never unpacked, and untouched regions are
//! block-copied on output.
//!
//! ```
//! use mubson::{json_to_bytes, Document, InPlaceMode};
//!
//! let bytes = json_to_bytes(r#"{"user": {"name": "amy", "logins": 3}}"#).unwrap();
//! let mut doc = Document::from_bytes(&bytes, InPlaceMode::Enabled).unwrap();
//!
//! let root = doc.root();
//! let user = doc.left_child(root);
//! let name = doc.left_child(user);
//! let logins = doc.right_sibling(name);
//! doc.set_int32(logins, 4).unwrap();
//!
//! // Same-size replacement: patch the original buffer instead of
//! // re-serializing.
//! let updates = doc.in_place_updates().unwrap();
//! let mut patched = bytes.clone();
//! updates.apply(&mut patched);
//!
//! let mut rewritten = Vec::new();
//! doc.write_to(&mut rewritten);
//! assert_eq!(patched, rewritten);
//! ```

pub mod damage;
pub mod document;
pub mod element;
pub mod encode;
pub mod error;
pub mod json;
pub mod wire;

pub use damage::{DamageEvent, DamageVector, InPlaceUpdates};
pub use document::{Document, InPlaceMode};
pub use element::Element;
pub use error::{Error, Result};
pub use json::{from_json, json_to_bytes, to_json};
pub use wire::{RawElement, Type, Value};
