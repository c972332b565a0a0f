//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The reader: header/trailer validation and the object-table scan.
//!
//! `PlistReader` is the component D orchestration: validate the fixed-format
//! segments, scan the object table once into a `Vec<RawEntry>` in
//! declaration order, and materialize a `Value` tree starting from the
//! trailer's root index. The object table is read sequentially rather than
//! through the offset table's random-access offsets; the offset table is
//! still decoded and sanity-checked, for fidelity with the format and to
//! catch files whose advertised layout is inconsistent with itself.

use std::fs;
use std::path::Path;

use ordered_float::OrderedFloat;

use crate::document::{HEADER_SIZE, HEADER_VERSION_00, TRAILER_SIZE};
use crate::error::{Error, Result};
use crate::parser;
use crate::raw::{self, RawEntry};
use crate::source::ByteSource;
use crate::value::Value;

/// Guards the recursive `Value` materialization against runaway or cyclic
/// references. The `Value` tree is explicitly non-goal-scoped to be acyclic
/// (spec.md): cycle-safe traversal belongs to `crate::archive`, which walks
/// the raw entry table by index instead of recursing through owned nodes.
const MAX_MATERIALIZATION_DEPTH: usize = 512;

/// A parsed and materialized binary property list document.
#[derive(Debug, Clone)]
pub struct PlistReader {
    /// Whether the document parsed and materialized successfully. A reader
    /// is only ever returned in the valid state; this mirrors the original
    /// implementation's `isValid` flag for callers migrating from it.
    pub is_valid: bool,
    /// The raw 8-byte header, magic number and version bytes, as read.
    pub header_buffer: [u8; HEADER_SIZE],
    /// The fully materialized value tree, rooted at the trailer's declared
    /// root object index.
    pub plist_root: Value,
}

impl Default for PlistReader {
    fn default() -> Self {
        PlistReader {
            is_valid: false,
            header_buffer: [0u8; HEADER_SIZE],
            plist_root: Value::Null,
        }
    }
}

impl PlistReader {
    /// Reads and decodes a bplist document from a file on disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())
            .map_err(|_| Error::CouldNotOpenFile(path.as_ref().display().to_string()))?;
        Self::from_bytes(&data)
    }

    /// Reads and decodes a bplist document already in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE + TRAILER_SIZE {
            return Err(Error::NotValidPlistFile);
        }

        let mut header_buffer = [0u8; HEADER_SIZE];
        header_buffer.copy_from_slice(&data[..HEADER_SIZE]);

        let (_, header) = parser::document::header(&header_buffer)
            .map_err(|_| Error::NotValidPlistFile)?;
        if header.version != HEADER_VERSION_00 {
            return Err(Error::UnsupportedVersion);
        }

        let trailer_bytes = &data[data.len() - TRAILER_SIZE..];
        let (_, trailer) = parser::document::trailer(trailer_bytes)
            .map_err(|_| Error::MissingOrInvalidTrailer)?;

        if !(1..=8).contains(&trailer.offset_table_entry_size)
            || !(1..=8).contains(&trailer.object_reference_size)
        {
            return Err(Error::MissingOrInvalidTrailer);
        }

        let body_end = data.len() - TRAILER_SIZE;
        if trailer.offset_table_offset < HEADER_SIZE || trailer.offset_table_offset > body_end {
            return Err(Error::MissingOrInvalidOffsetTable);
        }

        let offset_table_byte_len = trailer
            .number_of_objects
            .checked_mul(trailer.offset_table_entry_size)
            .ok_or(Error::MissingOrInvalidOffsetTable)?;
        let offset_table_end = trailer
            .offset_table_offset
            .checked_add(offset_table_byte_len)
            .ok_or(Error::MissingOrInvalidOffsetTable)?;
        if offset_table_end > body_end {
            return Err(Error::MissingOrInvalidOffsetTable);
        }

        let offset_table_slice = &data[trailer.offset_table_offset..offset_table_end];
        let (_, offset_table) = parser::document::offset_table(
            trailer.number_of_objects,
            trailer.offset_table_entry_size,
        )(offset_table_slice)
        .map_err(|_| Error::MissingOrInvalidOffsetTable)?;

        // The offset table is expected to list objects in non-decreasing
        // file order; a regression here means the file's own bookkeeping is
        // internally inconsistent, even if the object table itself would
        // otherwise scan cleanly.
        if offset_table.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(Error::MissingOrInvalidOffsetTable);
        }

        if trailer.root_object >= trailer.number_of_objects {
            return Err(Error::InvalidRootObject);
        }

        let object_table_bytes = &data[HEADER_SIZE..trailer.offset_table_offset];
        let mut source = ByteSource::new(object_table_bytes);
        let mut entries = Vec::with_capacity(trailer.number_of_objects);
        for _ in 0..trailer.number_of_objects {
            let (residual, entry) = raw::decode_one(source.remaining(), trailer.object_reference_size)?;
            source.advance_to(residual);
            entries.push(entry);
        }

        for entry in &entries {
            validate_references(entry, entries.len())?;
        }

        let plist_root = materialize(&entries, trailer.root_object, 0)?;

        Ok(PlistReader {
            is_valid: true,
            header_buffer,
            plist_root,
        })
    }
}

fn validate_references(entry: &RawEntry, object_count: usize) -> Result<()> {
    let check = |index: &usize| {
        if *index < object_count {
            Ok(())
        } else {
            Err(Error::InvalidObjectReference)
        }
    };
    match entry {
        RawEntry::Array(refs) | RawEntry::Set(refs) => refs.iter().try_for_each(check),
        RawEntry::Dict(pairs) => pairs.iter().try_for_each(|(key, value)| {
            check(key)?;
            check(value)
        }),
        _ => Ok(()),
    }
}

fn materialize(entries: &[RawEntry], index: usize, depth: usize) -> Result<Value> {
    if depth > MAX_MATERIALIZATION_DEPTH {
        return Err(Error::Message(
            "maximum nesting depth exceeded while materializing value tree".to_string(),
        ));
    }

    let entry = entries.get(index).ok_or(Error::InvalidObjectReference)?;
    Ok(match entry {
        RawEntry::Null => Value::Null,
        RawEntry::BoolFalse => Value::Bool(false),
        RawEntry::BoolTrue => Value::Bool(true),
        // Fill bytes are alignment padding within the object table and are
        // never legitimately referenced; treated as Null if they ever are.
        RawEntry::Fill => Value::Null,
        RawEntry::Int(value) => Value::Int(*value),
        RawEntry::Real(value) => Value::Real(OrderedFloat(*value)),
        RawEntry::Date(value) => Value::Date(OrderedFloat(*value)),
        RawEntry::Data(bytes) => Value::Data(bytes.clone()),
        RawEntry::AsciiString(bytes) => Value::AsciiString(bytes.clone()),
        RawEntry::UnicodeString(units) => Value::UnicodeString(units.clone()),
        RawEntry::Uid(value) => Value::Uid(*value),
        RawEntry::Array(refs) => Value::Array(
            refs.iter()
                .map(|&i| materialize(entries, i, depth + 1))
                .collect::<Result<Vec<_>>>()?,
        ),
        RawEntry::Set(refs) => Value::Set(
            refs.iter()
                .map(|&i| materialize(entries, i, depth + 1))
                .collect::<Result<Vec<_>>>()?,
        ),
        RawEntry::Dict(pairs) => {
            let mut entries_out = Vec::with_capacity(pairs.len());
            for &(key, value) in pairs {
                entries_out.push((
                    materialize(entries, key, depth + 1)?,
                    materialize(entries, value, depth + 1)?,
                ));
            }
            Value::Dict(entries_out)
        }
    })
}
