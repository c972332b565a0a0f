//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use nom::{
    IResult,
    bytes::complete::take,
    combinator::map_res,
};

use std::convert::TryFrom;

use crate::bigendian;

/// Returns a parser which recognizes a variable-length big-endian number
/// between 1 and 8 bytes long, inclusive, and zero-extends it to 64 bits.
///
/// This is the decoder's single most-used building block (spec.md §9):
/// rather than one routine per integer width, every width reduces to
/// "read n bytes big-endian, zero-extend to 64, host-swap."  The bytes are
/// placed at the low end of an 8-byte buffer (preserving big-endian
/// ordering), then reinterpreted in native order so the subsequent
/// `bigendian::u64_swap_to_host` is the only swap applied: on a big-endian
/// host it is a no-op, on little-endian it performs the actual byte-order
/// conversion. Building the buffer with `from_be_bytes` here and then
/// swapping again would double-convert and corrupt the value on
/// little-endian hosts.
pub fn be_u64_n(
    n: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], u64> {
    assert!(n >= 1 && n <= 8, "number must be between 1 and 8 bytes, inclusive");
    move |input: &[u8]| {
        let (input, bytes) = take(n)(input)?;
        let mut buffer = [0u8; 8];
        buffer[8 - n..].copy_from_slice(bytes);
        let native_value = u64::from_ne_bytes(buffer);
        Ok((input, bigendian::u64_swap_to_host(native_value)))
    }
}

/// Returns a parser which recognizes a variable-length unsigned big-endian
/// number between 1 and 8 bytes long, inclusive, converted safely into a
/// `usize` (which varies based on the pointer width of the platform).
pub fn be_usize_n(
    n: usize
) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    move |input: &[u8]| {
        map_res(
            be_u64_n(n),
            |value| usize::try_from(value)
        )(input)
    }
}

#[cfg(test)]
mod tests {
    use super::{be_u64_n, be_usize_n};

    #[test]
    fn test_be_usize_n_length_1() {
        let (input, result) = be_usize_n(1)(&[0x05]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 5);
    }

    #[test]
    fn test_be_usize_n_length_3() {
        let (input, result) = be_usize_n(3)(&[0x00, 0x01, 0xFF]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 511);
    }

    #[test]
    fn test_be_u64_n_length_8() {
        let (input, result) = be_u64_n(8)(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xFF]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 72057594037928447);
    }

    #[test]
    fn test_be_u64_n_length_1_is_unsigned() {
        let (input, result) = be_u64_n(1)(&[0xFF]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 255);
    }
}
