//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Human-readable tree printer.
//!
//! Renders a `Value` tree, or an `UnarchivedModel`'s object graph, as
//! indented text to any `io::Write` sink. Strings are decoded here, at
//! render time, rather than in the tree itself.

use std::io::{self, Write};

use crate::archive::{UnarchivedModel, UnarchivedValue};
use crate::value::Value;

/// Number of spaces of indentation per nesting level.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Writes an indented textual rendering of `value` to `sink`.
pub fn print_value<W: Write>(sink: &mut W, value: &Value, indent_width: usize) -> io::Result<()> {
    write_value(sink, value, 0, indent_width)
}

fn pad<W: Write>(sink: &mut W, depth: usize, indent_width: usize) -> io::Result<()> {
    write!(sink, "{:width$}", "", width = depth * indent_width)
}

fn write_value<W: Write>(sink: &mut W, value: &Value, depth: usize, indent_width: usize) -> io::Result<()> {
    match value {
        Value::Null => writeln!(sink, "null"),
        Value::Bool(flag) => writeln!(sink, "{}", flag),
        Value::Int(int) => writeln!(sink, "{}", int),
        Value::Real(real) => writeln!(sink, "{}", real.into_inner()),
        Value::Date(date) => writeln!(sink, "date({})", date.into_inner()),
        Value::Data(bytes) => writeln!(sink, "data<{} bytes>", bytes.len()),
        Value::AsciiString(_) | Value::UnicodeString(_) => {
            writeln!(sink, "{:?}", value.as_decoded_string().unwrap_or_default())
        }
        Value::Uid(uid) => writeln!(sink, "uid({})", uid),
        Value::Array(items) => {
            writeln!(sink, "array ({} items)", items.len())?;
            for item in items {
                pad(sink, depth + 1, indent_width)?;
                write_value(sink, item, depth + 1, indent_width)?;
            }
            Ok(())
        }
        Value::Set(items) => {
            writeln!(sink, "set ({} items)", items.len())?;
            for item in items {
                pad(sink, depth + 1, indent_width)?;
                write_value(sink, item, depth + 1, indent_width)?;
            }
            Ok(())
        }
        Value::Dict(pairs) => {
            writeln!(sink, "dict ({} entries)", pairs.len())?;
            for (key, entry_value) in pairs {
                pad(sink, depth + 1, indent_width)?;
                write!(sink, "{} => ", describe_key(key))?;
                write_value(sink, entry_value, depth + 1, indent_width)?;
            }
            Ok(())
        }
    }
}

fn describe_key(key: &Value) -> String {
    key.as_decoded_string()
        .map(|decoded| format!("{:?}", decoded))
        .unwrap_or_else(|| format!("{:?}", key))
}

/// Writes an indented textual rendering of an unarchived object graph,
/// starting from its root instance.
pub fn print_model<W: Write>(sink: &mut W, model: &UnarchivedModel, indent_width: usize) -> io::Result<()> {
    if !model.is_valid {
        return writeln!(sink, "<not a recognized keyed archive>");
    }
    match model.root {
        Some(root) => write_instance(sink, model, root, 0, indent_width, &mut Vec::new()),
        None => writeln!(sink, "<empty archive>"),
    }
}

fn write_instance<W: Write>(
    sink: &mut W,
    model: &UnarchivedModel,
    index: usize,
    depth: usize,
    indent_width: usize,
    visiting: &mut Vec<usize>,
) -> io::Result<()> {
    let instance = match model.objects_by_index.get(&index) {
        Some(instance) => instance,
        None => return writeln!(sink, "<dangling reference {}>", index),
    };

    writeln!(sink, "{} #{}", instance.class.classname, index)?;
    if visiting.contains(&index) {
        return Ok(());
    }
    visiting.push(index);

    for (name, value) in &instance.members {
        pad(sink, depth + 1, indent_width)?;
        write!(sink, "{} = ", name)?;
        write_unarchived_value(sink, model, value, depth + 1, indent_width, visiting)?;
    }

    visiting.pop();
    Ok(())
}

fn write_unarchived_value<W: Write>(
    sink: &mut W,
    model: &UnarchivedModel,
    value: &UnarchivedValue,
    depth: usize,
    indent_width: usize,
    visiting: &mut Vec<usize>,
) -> io::Result<()> {
    match value {
        UnarchivedValue::Null => writeln!(sink, "null"),
        UnarchivedValue::Bool(flag) => writeln!(sink, "{}", flag),
        UnarchivedValue::Int(int) => writeln!(sink, "{}", int),
        UnarchivedValue::Real(real) => writeln!(sink, "{}", real.into_inner()),
        UnarchivedValue::Date(date) => writeln!(sink, "date({})", date.into_inner()),
        UnarchivedValue::Data(bytes) => writeln!(sink, "data<{} bytes>", bytes.len()),
        UnarchivedValue::String(string) => writeln!(sink, "{:?}", string),
        UnarchivedValue::Array(items) => {
            writeln!(sink, "array ({} items)", items.len())?;
            for item in items {
                pad(sink, depth + 1, indent_width)?;
                write_unarchived_value(sink, model, item, depth + 1, indent_width, visiting)?;
            }
            Ok(())
        }
        UnarchivedValue::Set(items) => {
            writeln!(sink, "set ({} items)", items.len())?;
            for item in items {
                pad(sink, depth + 1, indent_width)?;
                write_unarchived_value(sink, model, item, depth + 1, indent_width, visiting)?;
            }
            Ok(())
        }
        UnarchivedValue::Dict(pairs) => {
            writeln!(sink, "dict ({} entries)", pairs.len())?;
            for (key, entry_value) in pairs {
                pad(sink, depth + 1, indent_width)?;
                write!(sink, "{} => ", describe_unarchived_key(key))?;
                write_unarchived_value(sink, model, entry_value, depth + 1, indent_width, visiting)?;
            }
            Ok(())
        }
        UnarchivedValue::Instance(index) => write_instance(sink, model, *index, depth, indent_width, visiting),
    }
}

fn describe_unarchived_key(key: &UnarchivedValue) -> String {
    match key {
        UnarchivedValue::String(string) => format!("{:?}", string),
        other => format!("{:?}", other),
    }
}
