//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The materialized value tree.
//!
//! `Value` is the fully-owned, cycle-free tree a `PlistReader` produces by
//! walking the raw entry table starting from the trailer's root index
//! (spec.md §4.4, §4.5). Containers recurse eagerly and are not memoized:
//! two references to the same object index become two independent,
//! structurally-equal `Value` subtrees, not one shared node. Cycle-safe,
//! reference-preserving traversal is the archive analyzer's job
//! (`crate::archive`), which walks the raw entry table directly instead.

use ordered_float::OrderedFloat;

/// A fully-materialized node of a bplist document.
///
/// Strings are kept as their raw code units (7-bit ASCII bytes, or UTF-16BE
/// code units already swapped to host order) rather than decoded to `String`,
/// so a malformed-but-parseable document round-trips through the tree without
/// a lossy decode; `crate::printer` decodes them for display.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(OrderedFloat<f64>),
    Date(OrderedFloat<f64>),
    Data(Vec<u8>),
    AsciiString(Vec<u8>),
    UnicodeString(Vec<u16>),
    Uid(u64),
    Array(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(Value, Value)>),
}

impl Value {
    /// Decodes an `AsciiString` or `UnicodeString` node to an owned `String`,
    /// or `None` for any other variant.
    pub fn as_decoded_string(&self) -> Option<String> {
        match self {
            Value::AsciiString(bytes) => {
                Some(bytes.iter().map(|&byte| byte as char).collect())
            }
            Value::UnicodeString(units) => String::from_utf16(units).ok(),
            _ => None,
        }
    }

    /// Returns `true` if this value is a string node decoding to exactly
    /// `key`.
    pub fn is_string_key(&self, key: &str) -> bool {
        self.as_decoded_string().as_deref() == Some(key)
    }
}

/// Looks up a value in a `Value::Dict`'s ordered pairs by a plain string key,
/// comparing against both ASCII and Unicode string entries (spec.md §4.5).
/// Returns the first matching entry's value, preserving the dictionary's
/// encounter order on ties.
pub fn value_for_string_key<'a>(dict: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    dict.iter()
        .find(|(candidate_key, _)| candidate_key.is_string_key(key))
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_decoded_string_ascii() {
        let value = Value::AsciiString(b"top".to_vec());
        assert_eq!(value.as_decoded_string().as_deref(), Some("top"));
    }

    #[test]
    fn test_as_decoded_string_unicode() {
        let value = Value::UnicodeString(vec![0x0048, 0x0069]);
        assert_eq!(value.as_decoded_string().as_deref(), Some("Hi"));
    }

    #[test]
    fn test_value_for_string_key_matches_mixed_encodings() {
        let dict = vec![
            (Value::AsciiString(b"$archiver".to_vec()), Value::Int(1)),
            (Value::UnicodeString(vec![0x0024, 0x0074, 0x006F, 0x0070]), Value::Int(2)),
        ];
        assert_eq!(value_for_string_key(&dict, "$archiver"), Some(&Value::Int(1)));
        assert_eq!(value_for_string_key(&dict, "$top"), Some(&Value::Int(2)));
        assert_eq!(value_for_string_key(&dict, "$missing"), None);
    }
}
