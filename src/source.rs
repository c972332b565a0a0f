//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! # Bounds-checked byte cursor.
//!
//! `ByteSource` is the thin seek/read abstraction the reader drives the
//! object-table scan and the header/trailer reads through. It owns no data;
//! it borrows the whole document buffer and only ever hands back sub-slices
//! of it, so a read past the end is always caught here rather than panicking
//! deeper in a `nom` combinator.

use crate::error::{Error, Result};

pub struct ByteSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteSource { data, pos: 0 }
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Current absolute position of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to an absolute offset. Fails if the offset is past
    /// the end of the buffer.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::Eof);
        }
        self.pos = offset;
        Ok(())
    }

    /// The unread remainder of the buffer, from the current cursor position.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Reads exactly `n` bytes and advances the cursor past them.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::Eof)?;
        if end > self.data.len() {
            return Err(Error::Eof);
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Advances the cursor by `consumed` bytes, as measured by the
    /// difference between a slice handed out by `remaining` and the residual
    /// slice a `nom` parser returned after reading from it.
    pub fn advance_to(&mut self, residual: &'a [u8]) {
        let consumed = self.remaining().len() - residual.len();
        self.pos += consumed;
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_exact_advances_cursor() {
        let mut source = ByteSource::new(&[1, 2, 3, 4]);
        assert_eq!(source.read_exact(2).unwrap(), &[1, 2]);
        assert_eq!(source.position(), 2);
        assert_eq!(source.read_exact(2).unwrap(), &[3, 4]);
        assert!(source.is_at_end());
    }

    #[test]
    fn test_read_exact_past_end_is_eof() {
        let mut source = ByteSource::new(&[1, 2]);
        assert_eq!(source.read_exact(3), Err(Error::Eof));
    }

    #[test]
    fn test_seek_past_end_is_eof() {
        let mut source = ByteSource::new(&[1, 2]);
        assert_eq!(source.seek(3), Err(Error::Eof));
    }

    #[test]
    fn test_advance_to_tracks_consumed_bytes() {
        let mut source = ByteSource::new(&[1, 2, 3, 4, 5]);
        let residual = &source.remaining()[3..];
        source.advance_to(residual);
        assert_eq!(source.position(), 3);
    }
}
