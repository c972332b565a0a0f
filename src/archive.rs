//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The keyed-archiver convention analyzer.
//!
//! `UnarchivedModel` recognizes the `NSKeyedArchiver` convention on top of a
//! materialized `Value` tree: a root dictionary carrying `$archiver`,
//! `$version`, `$top` and `$objects`, where `$objects` is a flat table of
//! class-tagged dictionaries and cross-object references are `Uid` leaves
//! indexing into that table. This layer is what restores the object graph's
//! sharing and cycles that `crate::value`'s eager, non-memoized
//! materialization deliberately discards: instances are expanded once, keyed
//! by their `$objects` index, and a reference encountered a second time
//! resolves to the same index rather than re-expanding.
//!
//! Two corrections relative to a widely-copied but buggy reference decoder
//! are load-bearing here: the archiver name must compare equal to exactly
//! `"NSKeyedArchiver"`, and a class entry's own name comes from `$classname`
//! while its superclass chain comes from `$classes` (not the other way
//! around, and not from a plain `"classname"` key).

use std::collections::BTreeMap;
use std::rc::Rc;

use ordered_float::OrderedFloat;

use crate::error::{Error, Result};
use crate::value::{value_for_string_key, Value};

/// The keyed-archiver version this analyzer recognizes. Every document
/// produced by `NSKeyedArchiver` declares this value; anything else is
/// treated as an unrecognized or future archive format.
const SUPPORTED_ARCHIVE_VERSION: i64 = 100_000;

/// Guards `resolve_instance`/`resolve_value` against runaway or cyclic
/// expansion. Instances are memoized before recursing into their members,
/// so a cycle through `$class`-tagged dicts always terminates; a cycle
/// through a non-instance `Uid` (one that does not resolve to a
/// `$class`-tagged dict) has nothing to memoize against and would recurse
/// forever without this bound. Mirrors `crate::reader::MAX_MATERIALIZATION_DEPTH`.
const MAX_EXPANSION_DEPTH: usize = 512;

/// A class, as declared by one entry of `$objects`: its own name and its
/// superclass chain, nearest ancestor first.
#[derive(Clone, Debug, PartialEq)]
pub struct UnarchivedClass {
    pub classname: String,
    pub supers: Vec<String>,
}

/// A value inside the unarchived object graph. Scalars and containers mirror
/// `crate::value::Value`; `Instance` is a non-owning reference to an entry of
/// `UnarchivedModel::objects_by_index`, standing in for what was a `Uid`
/// cross-reference in the underlying `$objects` table.
#[derive(Clone, Debug, PartialEq)]
pub enum UnarchivedValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(OrderedFloat<f64>),
    Date(OrderedFloat<f64>),
    Data(Vec<u8>),
    String(String),
    Array(Vec<UnarchivedValue>),
    Set(Vec<UnarchivedValue>),
    Dict(Vec<(UnarchivedValue, UnarchivedValue)>),
    /// A reference to another object in the graph, by its `$objects` index.
    Instance(usize),
}

/// One expanded object: the class it was archived as, and its non-`$class`
/// members in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct UnarchivedInstance {
    pub class: Rc<UnarchivedClass>,
    pub members: Vec<(String, UnarchivedValue)>,
}

/// The result of recognizing the keyed-archiver convention in a `Value` tree.
///
/// `objects_by_index` owns every reachable instance, keyed by its original
/// position in `$objects`; `Instance` values elsewhere in the graph are
/// non-owning handles into this map. A document that does not follow the
/// convention (or follows it inconsistently) yields `is_valid: false` with
/// an empty graph rather than an error, since recognizing the convention is
/// inherently a best-effort classification over an arbitrary `Value` tree.
#[derive(Clone, Debug, Default)]
pub struct UnarchivedModel {
    pub is_valid: bool,
    pub root: Option<usize>,
    pub objects_by_index: BTreeMap<usize, UnarchivedInstance>,
}

impl UnarchivedModel {
    /// Attempts to recognize the keyed-archiver convention atop `root`,
    /// returning an invalid, empty model if `root` does not follow it.
    pub fn from_value(root: &Value) -> UnarchivedModel {
        try_build(root).unwrap_or_default()
    }
}

fn try_build(root: &Value) -> Result<UnarchivedModel> {
    let top_level = as_dict(root)?;

    let archiver = value_for_string_key(top_level, "$archiver")
        .and_then(Value::as_decoded_string)
        .ok_or_else(|| Error::Message("missing $archiver".to_string()))?;
    if archiver != "NSKeyedArchiver" {
        return Err(Error::Message(format!("unrecognized archiver `{}`", archiver)));
    }

    let version = value_for_string_key(top_level, "$version");
    if !matches!(version, Some(Value::Int(SUPPORTED_ARCHIVE_VERSION))) {
        return Err(Error::Message("missing or unsupported $version".to_string()));
    }

    let top_dict = value_for_string_key(top_level, "$top")
        .ok_or_else(|| Error::Message("missing $top".to_string()))
        .and_then(as_dict)?;
    let root_index = match value_for_string_key(top_dict, "root") {
        Some(Value::Uid(index)) => *index as usize,
        _ => return Err(Error::Message("missing or malformed $top.root".to_string())),
    };

    let objects = match value_for_string_key(top_level, "$objects") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => return Err(Error::Message("missing or malformed $objects".to_string())),
    };

    let mut objects_by_index = BTreeMap::new();
    resolve_instance(objects, root_index, &mut objects_by_index, 0)?;

    Ok(UnarchivedModel {
        is_valid: true,
        root: Some(root_index),
        objects_by_index,
    })
}

fn as_dict(value: &Value) -> Result<&[(Value, Value)]> {
    match value {
        Value::Dict(pairs) => Ok(pairs),
        _ => Err(Error::Message("expected a dictionary".to_string())),
    }
}

/// Expands `$objects[index]` into an `UnarchivedInstance`, memoizing it
/// before recursing into its members so a member that refers back to this
/// same index (directly or transitively) observes a placeholder instead of
/// recursing again.
fn resolve_instance(
    objects: &[Value],
    index: usize,
    memo: &mut BTreeMap<usize, UnarchivedInstance>,
    depth: usize,
) -> Result<()> {
    if memo.contains_key(&index) {
        return Ok(());
    }
    if depth > MAX_EXPANSION_DEPTH {
        return Err(Error::Message(
            "maximum nesting depth exceeded while expanding archive object graph".to_string(),
        ));
    }

    let object = objects.get(index).ok_or(Error::InvalidObjectReference)?;
    let dict = as_dict(object)?;

    let class_index = match value_for_string_key(dict, "$class") {
        Some(Value::Uid(class_index)) => *class_index as usize,
        _ => return Err(Error::Message("instance is missing $class".to_string())),
    };
    let class = resolve_class(objects, class_index)?;

    memo.insert(
        index,
        UnarchivedInstance {
            class,
            members: Vec::new(),
        },
    );

    let mut members = Vec::with_capacity(dict.len());
    for (key, value) in dict {
        if key.is_string_key("$class") {
            continue;
        }
        if let Some(name) = key.as_decoded_string() {
            members.push((name, resolve_value(objects, value, memo, depth + 1)?));
        }
    }

    if let Some(instance) = memo.get_mut(&index) {
        instance.members = members;
    }
    Ok(())
}

/// Resolves the class entry at `$objects[index]`. `$classname` is the
/// class's own name; `$classes` is its superclass chain. (A widely-copied
/// reference decoder reads a plain `"classname"` key for both, which is
/// wrong on two counts: the key name, and conflating the class with its own
/// superclass list.)
fn resolve_class(objects: &[Value], index: usize) -> Result<Rc<UnarchivedClass>> {
    let object = objects.get(index).ok_or(Error::InvalidObjectReference)?;
    let dict = as_dict(object)?;

    let classname = value_for_string_key(dict, "$classname")
        .and_then(Value::as_decoded_string)
        .ok_or_else(|| Error::Message("class entry is missing $classname".to_string()))?;

    let supers = match value_for_string_key(dict, "$classes") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_decoded_string).collect(),
        _ => Vec::new(),
    };

    Ok(Rc::new(UnarchivedClass { classname, supers }))
}

fn resolve_value(
    objects: &[Value],
    value: &Value,
    memo: &mut BTreeMap<usize, UnarchivedInstance>,
    depth: usize,
) -> Result<UnarchivedValue> {
    if depth > MAX_EXPANSION_DEPTH {
        return Err(Error::Message(
            "maximum nesting depth exceeded while expanding archive object graph".to_string(),
        ));
    }

    Ok(match value {
        Value::Null => UnarchivedValue::Null,
        Value::Bool(flag) => UnarchivedValue::Bool(*flag),
        Value::Int(int) => UnarchivedValue::Int(*int),
        Value::Real(real) => UnarchivedValue::Real(*real),
        Value::Date(date) => UnarchivedValue::Date(*date),
        Value::Data(bytes) => UnarchivedValue::Data(bytes.clone()),
        Value::AsciiString(_) | Value::UnicodeString(_) => {
            UnarchivedValue::String(value.as_decoded_string().unwrap_or_default())
        }
        Value::Array(items) => UnarchivedValue::Array(
            items
                .iter()
                .map(|item| resolve_value(objects, item, memo, depth + 1))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Set(items) => UnarchivedValue::Set(
            items
                .iter()
                .map(|item| resolve_value(objects, item, memo, depth + 1))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Dict(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                out.push((
                    resolve_value(objects, key, memo, depth + 1)?,
                    resolve_value(objects, value, memo, depth + 1)?,
                ));
            }
            UnarchivedValue::Dict(out)
        }
        Value::Uid(reference) => {
            let index = *reference as usize;
            let referenced = objects.get(index).ok_or(Error::InvalidObjectReference)?;
            let is_class_tagged_instance =
                matches!(referenced, Value::Dict(pairs) if value_for_string_key(pairs, "$class").is_some());
            if is_class_tagged_instance {
                resolve_instance(objects, index, memo, depth + 1)?;
                UnarchivedValue::Instance(index)
            } else {
                resolve_value(objects, referenced, memo, depth + 1)?
            }
        }
    })
}
