//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::fmt::{self, Display};

pub type Result<T> = std::result::Result<T, Error>;

/// Binary property list and keyed-archive decoding error.
///
/// The first four variants are the ones surfaced by the public reader API
/// (`PlistReader::from_path`/`from_bytes`); the remainder describe faults an
/// implementation treats as fatal because they indicate a corrupted or
/// internally inconsistent file whose remainder cannot be interpreted.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The input file could not be opened for reading.
    CouldNotOpenFile(String),
    /// The header magic number is missing or does not read `bplist`.
    NotValidPlistFile,
    /// A marker byte named an unused or reserved object format, a malformed
    /// count-or-F sub-marker, or the (intentionally unimplemented) 128-bit
    /// integer format.
    UnknownObjectType,
    /// A real (floating point) marker declared a payload narrower than 4 bytes.
    IllegalRealLength,
    /// The version marker following the header magic is not `00`.
    UnsupportedVersion,
    /// The trailer is missing, truncated, or its fields are inconsistent
    /// with the rest of the file.
    MissingOrInvalidTrailer,
    /// The offset table is missing, truncated, or overlaps the trailer.
    MissingOrInvalidOffsetTable,
    /// An array, set, or dict payload referenced an index outside
    /// `[0, numObjects)`.
    InvalidObjectReference,
    /// The root object index named in the trailer is out of range.
    InvalidRootObject,
    /// A read ran past the end of the input.
    Eof,
    /// Generic decode-time failure message, analogous to `serde`'s `custom`.
    Message(String),
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CouldNotOpenFile(path) => write!(formatter, "could not open file: {}", path),
            Error::NotValidPlistFile => formatter.write_str("missing or invalid bplist header"),
            Error::UnknownObjectType => formatter.write_str("unknown or unsupported object marker"),
            Error::IllegalRealLength => formatter.write_str("real object declared an illegal payload length"),
            Error::UnsupportedVersion => formatter.write_str("document is not a version 00 bplist"),
            Error::MissingOrInvalidTrailer => formatter.write_str("missing or invalid bplist trailer"),
            Error::MissingOrInvalidOffsetTable => formatter.write_str("missing or invalid bplist offset table"),
            Error::InvalidObjectReference => formatter.write_str("reference to an object outside the object table"),
            Error::InvalidRootObject => formatter.write_str("root object index is out of range"),
            Error::Eof => formatter.write_str("unexpected end of input"),
            Error::Message(msg) => formatter.write_str(msg),
        }
    }
}

impl std::error::Error for Error {}
