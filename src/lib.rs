//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! A native Rust decoder for binary property list (`bplist00`) streams,
//! layered with a recognizer for the `NSKeyedArchiver` convention that
//! reconstructs the class/instance object graph it encodes.
//!
//! The crate is organized in the same order data flows through it:
//!
//! - [`bigendian`] — wire/host byte-order conversions.
//! - [`source`] — a bounds-checked byte cursor.
//! - [`document`] and [`parser`] — the fixed-format header/trailer and the
//!   `nom` parsers for them.
//! - [`raw`] — the marker decoder, producing one [`raw::RawEntry`] per
//!   object in declaration order.
//! - [`reader`] — [`reader::PlistReader`], which scans the object table and
//!   materializes a [`value::Value`] tree rooted at the trailer's root index.
//! - [`archive`] — [`archive::UnarchivedModel`], which recognizes the
//!   `NSKeyedArchiver` convention atop a `Value` tree and restores object
//!   identity and sharing that the `Value` tree itself does not preserve.
//! - [`printer`] — a human-readable tree dump of either representation.

mod bigendian;
pub mod document;
pub mod parser;
mod source;

pub mod raw;
pub mod value;
pub mod reader;
pub mod archive;
pub mod printer;

mod error;

pub use crate::archive::{UnarchivedClass, UnarchivedInstance, UnarchivedModel, UnarchivedValue};
pub use crate::error::{Error, Result};
pub use crate::reader::PlistReader;
pub use crate::value::Value;
