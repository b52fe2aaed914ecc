//! Tree ⇄ document conversion.
//!
//! A document is a nested mapping keyed by node keys. Leaves store their
//! value (optionally base64 of its YAML form, optionally wrapped in the
//! extended `$value/$hidden/$editable` form); subsections store a nested
//! mapping, carrying their own `$hidden/$editable` keys when extended.

pub mod codec;
pub mod document;

pub use codec::{decode_document, decode_value, encode_document, encode_value, BASE64_LINE_WIDTH};
pub use document::{
    apply_document, check_extended, to_document, Extended, EXT_EDITABLE, EXT_HIDDEN, EXT_VALUE,
};
