// SPDX-License-Identifier: Apache-2.0

//! Ordered sequence of `(token handle, seqnum)` entries.
//!
//! Removal leaves a tombstone in the slot so that the indices of the other
//! entries stay valid while a caller walks the sequence by index. A later
//! [`EntrySequence::compact`] drops the tombstones and renumbers the
//! survivors densely, keeping their relative order.

use alloc::vec::Vec;

/// A token handle paired with the line counter value it was added under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<H> {
    pub token: H,
    pub seqnum: usize,
}

impl<H> Entry<H> {
    pub fn new(token: H, seqnum: usize) -> Self {
        Self { token, seqnum }
    }
}

/// Error type for EntrySequence index operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// Index is outside `[0, len)`.
    OutOfRange { index: usize, len: usize },
    /// The slot was removed and has not been compacted away yet.
    Removed { index: usize },
}

impl core::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SequenceError::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for sequence of length {len}")
            }
            SequenceError::Removed { index } => write!(f, "entry {index} was removed"),
        }
    }
}

/// Append-only, randomly indexable list of [`Entry`] values.
///
/// `len()` counts slots, including tombstones left by [`EntrySequence::remove`],
/// until the next [`EntrySequence::compact`].
#[derive(Debug, Clone)]
pub struct EntrySequence<H> {
    slots: Vec<Option<Entry<H>>>,
}

impl<H> Default for EntrySequence<H> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<H: Copy> EntrySequence<H> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Appends an entry at the end of the sequence.
    pub fn push(&mut self, token: H, seqnum: usize) {
        self.slots.push(Some(Entry::new(token, seqnum)));
    }

    /// Number of slots, live or tombstoned.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the live entry at `index`.
    pub fn get(&self, index: usize) -> Result<&Entry<H>, SequenceError> {
        match self.slots.get(index) {
            Some(Some(entry)) => Ok(entry),
            Some(None) => Err(SequenceError::Removed { index }),
            None => Err(SequenceError::OutOfRange {
                index,
                len: self.slots.len(),
            }),
        }
    }

    /// Tombstones the slot at `index` and hands back the entry it held.
    ///
    /// The indices of all other slots are unchanged until [`Self::compact`].
    pub fn remove(&mut self, index: usize) -> Result<Entry<H>, SequenceError> {
        let len = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) => slot.take().ok_or(SequenceError::Removed { index }),
            None => Err(SequenceError::OutOfRange { index, len }),
        }
    }

    /// Tombstones every live entry matching `stale`, in order, and returns
    /// how many were removed.
    ///
    /// Like [`Self::remove`], indices stay put until [`Self::compact`].
    pub fn remove_where<F>(&mut self, mut stale: F) -> usize
    where
        F: FnMut(&Entry<H>) -> bool,
    {
        let mut removed = 0;
        for slot in self.slots.iter_mut() {
            if slot.as_ref().is_some_and(&mut stale) {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    /// Drops tombstoned slots, preserving the order of the survivors.
    pub fn compact(&mut self) {
        self.slots.retain(Option::is_some);
    }

    /// Clears the sequence.
    pub fn reset(&mut self) {
        self.slots.clear();
    }

    /// Overwrites `other` with an independent copy of this sequence.
    ///
    /// Tombstones are copied too, so indices mean the same thing in both.
    /// Token handles are copied by value and keep referring to the same
    /// external tokens.
    pub fn clone_into(&self, other: &mut Self) {
        other.slots.clear();
        other.slots.extend_from_slice(&self.slots);
    }

    /// Iterates over the live entries in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entry<H>> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// The last live entry, if any.
    pub fn last(&self) -> Option<&Entry<H>> {
        self.iter().next_back()
    }
}
