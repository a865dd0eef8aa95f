// SPDX-License-Identifier: Apache-2.0

//! Column alignment for source code formatters.
//!
//! The formatter decides which tokens are alignment candidates and feeds
//! them to an [`AlignStack`] one line at a time. The stack groups candidates
//! that sit close enough to each other, both in lines (`span`) and in columns
//! (`threshold`), and moves each group's tokens onto a common right edge
//! through the [`TokenArena`] the formatter provides.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod entry_sequence;
pub use entry_sequence::{Entry, EntrySequence, SequenceError};

mod align_stack;
pub use align_stack::AlignStack;

mod token;
pub use token::{Padding, Token, TokenArena, TokenId, TokenList};

mod options;
pub use options::{AlignKind, AlignOptions, OptionError, OptionErrorKind, StackConfig};
