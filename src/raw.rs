//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # The marker decoder and the raw entry table.
//!
//! One [`RawEntry`] is produced per object in the file, in declaration
//! order; `decode_one` is the marker decoder itself, splitting a marker
//! byte into a high nibble (object format family) and low nibble (count or
//! width) and dispatching per the table in spec.md §4.3. Multi-byte reads
//! bottom out in `crate::parser::utils::be_u64_n`/`be_usize_n`, which apply
//! the zero-extend-then-host-swap primitive from `crate::bigendian`.

use std::convert::{TryFrom, TryInto};

use ascii::AsciiStr;
use nom::bytes::complete::take;
use nom::multi::many_m_n;
use nom::number::complete::be_u16;

use crate::error::{Error, Result};
use crate::parser::utils::be_usize_n;

/// One decoded object from the object table, keyed by its declaration
/// index (spec.md §3.1). References inside `Array`/`Set`/`Dict` payloads
/// are plain indices into the same table.
#[derive(Clone, Debug, PartialEq)]
pub enum RawEntry {
    Null,
    BoolFalse,
    BoolTrue,
    Fill,
    Int(i64),
    Real(f64),
    Date(f64),
    Data(Vec<u8>),
    AsciiString(Vec<u8>),
    UnicodeString(Vec<u16>),
    Uid(u64),
    Array(Vec<usize>),
    Set(Vec<usize>),
    Dict(Vec<(usize, usize)>),
}

/// Zero-extends a big-endian byte sequence of up to 8 bytes to a `u64`,
/// placing the bytes at the low end of the buffer before the host swap,
/// per spec.md §4.3's "Integer promotion" note.
fn promote_u64(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    let mut buffer = [0u8; 8];
    buffer[8 - bytes.len()..].copy_from_slice(bytes);
    u64::from_be_bytes(buffer)
}

/// As `promote_u64`, but reinterpreted as a signed 64-bit integer. The
/// format stores true signed values only at width 8; narrower integer
/// payloads are not sign-extended (spec.md §4.3).
fn promote_i64(bytes: &[u8]) -> i64 {
    promote_u64(bytes) as i64
}

fn take_u8(input: &[u8]) -> Result<(&[u8], u8)> {
    let (input, bytes) = take::<_, _, ()>(1usize)(input).map_err(|_| Error::Eof)?;
    Ok((input, bytes[0]))
}

fn take_bytes(input: &[u8], n: usize) -> Result<(&[u8], &[u8])> {
    take::<_, _, ()>(n)(input).map_err(|_| Error::Eof)
}

/// Decodes a "count-or-F" length field (spec.md §4.3): if the low nibble is
/// less than 15 it *is* the count; otherwise the next marker byte must
/// itself be an integer object whose decoded value is the count.
fn count_or_f(input: &[u8], low_nibble: u8) -> Result<(&[u8], usize)> {
    if low_nibble != 0x0F {
        return Ok((input, low_nibble as usize));
    }

    let (input, sub_marker) = take_u8(input)?;
    let sub_high = sub_marker >> 4;
    let sub_low = sub_marker & 0x0F;
    if sub_high != 0x1 {
        return Err(Error::UnknownObjectType);
    }

    let width = 1usize << sub_low;
    if width > 8 {
        return Err(Error::UnknownObjectType);
    }

    let (input, raw) = take_bytes(input, width)?;
    let value = promote_u64(raw);
    let count = usize::try_from(value).map_err(|_| Error::UnknownObjectType)?;
    Ok((input, count))
}

/// Decodes `count` big-endian object references, each `object_reference_size`
/// bytes wide.
fn take_refs(input: &[u8], count: usize, object_reference_size: usize) -> Result<(&[u8], Vec<usize>)> {
    many_m_n(count, count, be_usize_n(object_reference_size))(input)
        .map_err(|_| Error::Eof)
}

/// Decodes one object marker and its payload, advancing past it.
///
/// `object_reference_size` comes from the trailer and governs the width of
/// references inside `Array`/`Set`/`Dict` payloads.
pub fn decode_one<'a>(
    input: &'a [u8],
    object_reference_size: usize,
) -> Result<(&'a [u8], RawEntry)> {
    let (input, marker) = take_u8(input)?;
    let high = marker >> 4;
    let low = marker & 0x0F;

    match high {
        0x0 => match low {
            0x0 => Ok((input, RawEntry::Null)),
            0x8 => Ok((input, RawEntry::BoolFalse)),
            0x9 => Ok((input, RawEntry::BoolTrue)),
            0xF => Ok((input, RawEntry::Fill)),
            _ => Err(Error::UnknownObjectType),
        },

        0x1 => {
            let width = 1usize << low;
            if width > 8 {
                return Err(Error::UnknownObjectType);
            }
            let (input, raw) = take_bytes(input, width)?;
            Ok((input, RawEntry::Int(promote_i64(raw))))
        }

        0x2 => {
            let width = 1usize << low;
            if width < 4 {
                return Err(Error::IllegalRealLength);
            }
            match width {
                4 => {
                    let (input, raw) = take_bytes(input, 4)?;
                    let bits = u32::from_be_bytes(raw.try_into().unwrap());
                    Ok((input, RawEntry::Real(f32::from_bits(bits) as f64)))
                }
                8 => {
                    let (input, raw) = take_bytes(input, 8)?;
                    let bits = u64::from_be_bytes(raw.try_into().unwrap());
                    Ok((input, RawEntry::Real(f64::from_bits(bits))))
                }
                _ => Err(Error::UnknownObjectType),
            }
        }

        0x3 => {
            // A date is always an 8-byte double regardless of the low nibble.
            let (input, raw) = take_bytes(input, 8)?;
            let bits = u64::from_be_bytes(raw.try_into().unwrap());
            Ok((input, RawEntry::Date(f64::from_bits(bits))))
        }

        0x4 => {
            let (input, count) = count_or_f(input, low)?;
            let (input, raw) = take_bytes(input, count)?;
            Ok((input, RawEntry::Data(raw.to_vec())))
        }

        0x5 => {
            let (input, count) = count_or_f(input, low)?;
            let (input, raw) = take_bytes(input, count)?;
            AsciiStr::from_ascii(raw).map_err(|_| Error::UnknownObjectType)?;
            Ok((input, RawEntry::AsciiString(raw.to_vec())))
        }

        0x6 => {
            let (input, count) = count_or_f(input, low)?;
            let (input, units) = many_m_n(count, count, be_u16)(input)
                .map_err(|_: nom::Err<()>| Error::Eof)?;
            Ok((input, RawEntry::UnicodeString(units)))
        }

        0x8 => {
            // UID marker; width is lowNibble+1, 1..=16 bytes. `RawEntry::Uid`
            // only has room for 64 bits, so a UID wider than 8 bytes is only
            // representable if its extra high-order bytes are all zero.
            let width = (low as usize) + 1;
            let (input, raw) = take_bytes(input, width)?;
            if width > 8 {
                let (high, low_bytes) = raw.split_at(width - 8);
                if high.iter().any(|&byte| byte != 0) {
                    return Err(Error::UnknownObjectType);
                }
                Ok((input, RawEntry::Uid(promote_u64(low_bytes))))
            } else {
                Ok((input, RawEntry::Uid(promote_u64(raw))))
            }
        }

        0xA => {
            let (input, count) = count_or_f(input, low)?;
            let (input, refs) = take_refs(input, count, object_reference_size)?;
            Ok((input, RawEntry::Array(refs)))
        }

        0xC => {
            let (input, count) = count_or_f(input, low)?;
            let (input, refs) = take_refs(input, count, object_reference_size)?;
            Ok((input, RawEntry::Set(refs)))
        }

        0xD => {
            let (input, count) = count_or_f(input, low)?;
            let (input, keys) = take_refs(input, count, object_reference_size)?;
            let (input, values) = take_refs(input, count, object_reference_size)?;
            Ok((input, RawEntry::Dict(keys.into_iter().zip(values).collect())))
        }

        // 0x7, 0x9, 0xB, 0xE, 0xF: reserved/unused marker families.
        _ => Err(Error::UnknownObjectType),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(mut input: &[u8], object_reference_size: usize) -> Vec<RawEntry> {
        let mut entries = Vec::new();
        while !input.is_empty() {
            let (rest, entry) = decode_one(input, object_reference_size).unwrap();
            entries.push(entry);
            input = rest;
        }
        entries
    }

    #[test]
    fn test_null_bool_fill() {
        let entries = decode_all(&[0b0000_0000, 0b0000_1000, 0b0000_1001, 0b0000_1111], 1);
        assert_eq!(entries, vec![RawEntry::Null, RawEntry::BoolFalse, RawEntry::BoolTrue, RawEntry::Fill]);
    }

    #[test]
    fn test_unused_nibble_is_unknown_object_type() {
        assert_eq!(decode_one(&[0b0111_0000], 1), Err(Error::UnknownObjectType));
        assert_eq!(decode_one(&[0b1001_0000], 1), Err(Error::UnknownObjectType));
    }

    #[test]
    fn test_int_widths() {
        let input = &[
            0b0001_0000, 0x05,
            0b0001_0001, 0x01, 0x2C,
            0b0001_0011, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
        ];
        let entries = decode_all(input, 1);
        assert_eq!(entries, vec![RawEntry::Int(5), RawEntry::Int(300), RawEntry::Int(-1)]);
    }

    #[test]
    fn test_real_illegal_length() {
        // highNibble 0x2, lowNibble 0x1 -> width 2, which is < 4.
        assert_eq!(decode_one(&[0b0010_0001, 0x00, 0x00], 1), Err(Error::IllegalRealLength));
    }

    #[test]
    fn test_real_float_and_double() {
        let input = &[
            0b0010_0010, 0xC0, 0x20, 0x00, 0x00,
            0b0010_0011, 0xC0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let entries = decode_all(input, 1);
        assert_eq!(entries, vec![RawEntry::Real(-2.5), RawEntry::Real(-2.5)]);
    }

    #[test]
    fn test_date() {
        let input = &[0b0011_0011, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode_one(input, 1), Ok((&input[9..], RawEntry::Date(0.0))));
    }

    #[test]
    fn test_data_inline_and_count_or_f() {
        let input = &[
            0b0100_0001, 0x0F,
            0b0100_1111, 0b0001_0000, 0b0000_0001, 0x2A,
        ];
        let entries = decode_all(input, 1);
        assert_eq!(entries, vec![RawEntry::Data(vec![0x0F]), RawEntry::Data(vec![0x2A])]);
    }

    #[test]
    fn test_ascii_string_empty() {
        assert_eq!(decode_one(&[0b0101_0000], 1), Ok((&[][..], RawEntry::AsciiString(vec![]))));
    }

    #[test]
    fn test_ascii_string_rejects_non_ascii() {
        assert_eq!(decode_one(&[0b0101_0001, 0x80], 1), Err(Error::UnknownObjectType));
    }

    #[test]
    fn test_unicode_string() {
        let input = &[0b0110_0010, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(
            decode_one(input, 1),
            Ok((&[][..], RawEntry::UnicodeString(vec![0x0048, 0x0069])))
        );
    }

    #[test]
    fn test_uid_width() {
        assert_eq!(
            decode_one(&[0b1000_0001, 0x01, 0x02], 1),
            Ok((&[][..], RawEntry::Uid(0x0102)))
        );
    }

    #[test]
    fn test_uid_wide_but_zero_padded() {
        let mut input = vec![0b1000_1111]; // lowNibble 15 -> width 16
        input.extend_from_slice(&[0u8; 14]);
        input.extend_from_slice(&[0x01, 0x02]);
        assert_eq!(decode_one(&input, 1), Ok((&[][..], RawEntry::Uid(0x0102))));
    }

    #[test]
    fn test_uid_wide_and_too_large_is_unknown_object_type() {
        let mut input = vec![0b1000_1111];
        input.extend_from_slice(&[0xFF; 16]);
        assert_eq!(decode_one(&input, 1), Err(Error::UnknownObjectType));
    }

    #[test]
    fn test_array_with_1byte_refs() {
        let input = &[0b1010_0010, 0x00, 0x01];
        assert_eq!(
            decode_one(input, 1),
            Ok((&[][..], RawEntry::Array(vec![0, 1])))
        );
    }

    #[test]
    fn test_set_with_1byte_refs() {
        let input = &[0b1100_0010, 0x02, 0x03];
        assert_eq!(
            decode_one(input, 1),
            Ok((&[][..], RawEntry::Set(vec![2, 3])))
        );
    }

    #[test]
    fn test_dict_interleaving() {
        let input = &[0b1101_0010, 0x00, 0x01, 0x02, 0x03];
        assert_eq!(
            decode_one(input, 1),
            Ok((&[][..], RawEntry::Dict(vec![(0, 2), (1, 3)])))
        );
    }

    #[test]
    fn test_eof_on_truncated_payload() {
        assert_eq!(decode_one(&[0b0001_0011, 0x00, 0x00], 1), Err(Error::Eof));
    }
}
