//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! `nom`-based parsers for the fixed-format parts of a bplist document
//! (header, offset table, trailer) and the integer-promotion building block
//! they and `crate::raw` share.

pub mod document;
pub mod utils;
