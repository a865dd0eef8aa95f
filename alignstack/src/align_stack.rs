// SPDX-License-Identifier: Apache-2.0

//! Column alignment stack.
//!
//! An [`AlignStack`] collects at most one candidate token per line and lines
//! them up on a common right edge. Candidates whose column is too far from
//! the current edge (more than `threshold` columns either way) are parked in
//! a deferred list and retried whenever the edge grows. Once `span` lines go
//! by without an admission the group is flushed: every admitted token is
//! moved so that it ends on the edge, and the deferred tokens get a fresh
//! start against an empty group.
//!
//! The seqnum is a line counter, advanced through [`AlignStack::new_lines`].

use alloc::vec::Vec;
use log::{debug, trace};

use crate::entry_sequence::{Entry, EntrySequence};
use crate::options::StackConfig;
use crate::token::TokenArena;

/// Pending re-admission work.
///
/// Kept on a LIFO list so that a replay pass started while another one is
/// running completes before the rest of the outer pass, without recursion.
#[derive(Debug, Clone, Copy)]
enum Task<H> {
    /// Run the admission check again for a previously deferred entry.
    Replay(Entry<H>),
    /// End of a replay pass: flush if the span was exceeded.
    CheckSpan,
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Admission {
    Deferred,
    Admitted,
    /// Admitted and pushed the right edge out.
    Widened,
}

/// Aligns one run of candidate tokens across consecutive lines.
///
/// Generic over the token handle type `H`; the tokens themselves live in a
/// [`TokenArena`] that is passed to every operation that may read or move
/// them.
#[derive(Debug, Clone)]
pub struct AlignStack<H> {
    /// Tokens in the current alignment group, in admission order.
    admitted: EntrySequence<H>,
    /// Tokens that failed the threshold check.
    deferred: EntrySequence<H>,
    /// Snapshot of `deferred` taken at the start of a replay pass.
    scratch: EntrySequence<H>,
    tasks: Vec<Task<H>>,
    max_col: usize,
    span: usize,
    threshold: usize,
    seqnum: usize,
    last_admission_seqnum: usize,
    last_flushed_seqnum: usize,
}

impl<H: Copy + core::fmt::Debug> Default for AlignStack<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy + core::fmt::Debug> AlignStack<H> {
    pub fn new() -> Self {
        Self {
            admitted: EntrySequence::new(),
            deferred: EntrySequence::new(),
            scratch: EntrySequence::new(),
            tasks: Vec::new(),
            max_col: 0,
            span: 0,
            threshold: 0,
            seqnum: 0,
            last_admission_seqnum: 0,
            last_flushed_seqnum: 0,
        }
    }

    /// Creates a stack that is already started with `config`.
    pub fn with_config(config: StackConfig) -> Self {
        let mut stack = Self::new();
        stack.start_with(config);
        stack
    }

    /// Resets both lists and all counters for a new run.
    ///
    /// May be called on a stack that is in use; anything pending is dropped
    /// without being aligned.
    pub fn start(&mut self, span: usize, threshold: usize) {
        debug!("Start({span}, {threshold})");
        self.admitted.reset();
        self.deferred.reset();
        self.scratch.reset();
        self.tasks.clear();
        self.span = span;
        self.threshold = threshold;
        self.max_col = 0;
        self.seqnum = 0;
        self.last_admission_seqnum = 0;
        self.last_flushed_seqnum = 0;
    }

    /// [`Self::start`] with a resolved [`StackConfig`].
    pub fn start_with(&mut self, config: StackConfig) {
        self.start(config.span, config.threshold);
    }

    /// Adds a candidate on the current line.
    pub fn add<A>(&mut self, arena: &mut A, token: H)
    where
        A: TokenArena<Handle = H>,
    {
        self.add_at(arena, token, 0);
    }

    /// Adds a candidate under an explicit seqnum; 0 uses the current line.
    pub fn add_at<A>(&mut self, arena: &mut A, token: H, seqnum: usize)
    where
        A: TokenArena<Handle = H>,
    {
        let seqnum = if seqnum == 0 { self.seqnum } else { seqnum };
        self.admit(arena, Entry::new(token, seqnum));
        self.run_tasks(arena);
    }

    /// Advances the line counter and flushes once the span is exceeded.
    ///
    /// Does nothing while no token is admitted.
    pub fn new_lines<A>(&mut self, arena: &mut A, count: usize)
    where
        A: TokenArena<Handle = H>,
    {
        self.advance(arena, count);
        self.run_tasks(arena);
    }

    /// Aligns every admitted token and starts a new group.
    pub fn flush<A>(&mut self, arena: &mut A)
    where
        A: TokenArena<Handle = H>,
    {
        self.flush_group(arena);
        self.run_tasks(arena);
    }

    /// Aligns what is admitted and drops whatever is still deferred.
    pub fn end<A>(&mut self, arena: &mut A)
    where
        A: TokenArena<Handle = H>,
    {
        if !self.admitted.is_empty() {
            debug!("End");
            self.flush(arena);
        }
        if !self.deferred.is_empty() {
            debug!("End: dropping {} deferred", self.deferred.len());
        }
        self.admitted.reset();
        self.deferred.reset();
    }

    /// Tokens in the current group, in admission order.
    pub fn admitted(&self) -> &EntrySequence<H> {
        &self.admitted
    }

    /// Tokens waiting for the right edge to come closer.
    pub fn deferred(&self) -> &EntrySequence<H> {
        &self.deferred
    }

    /// Current right edge; 0 while the group is empty.
    pub fn max_col(&self) -> usize {
        self.max_col
    }

    /// Line counter of the current run.
    pub fn seqnum(&self) -> usize {
        self.seqnum
    }

    /// Highest seqnum admitted so far; the span is counted from here.
    pub fn last_admission_seqnum(&self) -> usize {
        self.last_admission_seqnum
    }

    /// Lines a group may run past its last admission.
    pub fn span(&self) -> usize {
        self.span
    }

    /// Allowed distance from the right edge; 0 admits anything.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Runs the threshold check and files the entry accordingly.
    fn check<A>(&mut self, arena: &A, entry: Entry<H>) -> Admission
    where
        A: TokenArena<Handle = H>,
    {
        let column = arena.column(entry.token);
        let line = arena.origin_line(entry.token);
        let fits = self.max_col == 0
            || self.threshold == 0
            || column.abs_diff(self.max_col) <= self.threshold;

        if !fits {
            self.deferred.push(entry.token, entry.seqnum);
            debug!(
                "Add-skipped [{}/{}/{}]: line {}, col {} <= {} + {}",
                entry.seqnum,
                self.last_admission_seqnum,
                self.seqnum,
                line,
                column,
                self.max_col,
                self.threshold
            );
            return Admission::Deferred;
        }

        if entry.seqnum > self.last_admission_seqnum {
            self.last_admission_seqnum = entry.seqnum;
        }
        self.admitted.push(entry.token, entry.seqnum);

        let endcol = column + arena.length(entry.token);
        if endcol > self.max_col {
            debug!(
                "Add-aligned [{}/{}/{}]: line {}, col {} : max_col old {}, new {}",
                entry.seqnum,
                self.last_admission_seqnum,
                self.seqnum,
                line,
                column,
                self.max_col,
                endcol
            );
            self.max_col = endcol;
            Admission::Widened
        } else {
            debug!(
                "Add-aligned [{}/{}/{}]: line {}, col {} : col {} <= {}",
                entry.seqnum,
                self.last_admission_seqnum,
                self.seqnum,
                line,
                column,
                endcol,
                self.max_col
            );
            Admission::Admitted
        }
    }

    fn admit<A>(&mut self, arena: &A, entry: Entry<H>)
    where
        A: TokenArena<Handle = H>,
    {
        // A wider edge may bring deferred tokens within the threshold
        if self.check(arena, entry) == Admission::Widened && !self.deferred.is_empty() {
            self.schedule_readd();
        }
    }

    /// Moves every deferred entry onto the task list, in deferral order.
    fn schedule_readd(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        self.deferred.clone_into(&mut self.scratch);
        self.deferred.reset();

        self.tasks.push(Task::CheckSpan);
        self.tasks
            .extend(self.scratch.iter().rev().map(|entry| Task::Replay(*entry)));
    }

    fn run_tasks<A>(&mut self, arena: &mut A)
    where
        A: TokenArena<Handle = H>,
    {
        while let Some(task) = self.tasks.pop() {
            match task {
                Task::Replay(entry) => {
                    trace!("ReAddSkipped [{}] {:?}", entry.seqnum, entry.token);
                    self.admit(arena, entry);
                }
                Task::CheckSpan => self.advance(arena, 0),
            }
        }
    }

    fn advance<A>(&mut self, arena: &mut A, count: usize)
    where
        A: TokenArena<Handle = H>,
    {
        if self.admitted.is_empty() {
            return;
        }
        self.seqnum += count;
        if self.seqnum > self.last_admission_seqnum.saturating_add(self.span) {
            debug!("Newlines<{count}>: flushing at {}", self.seqnum);
            self.flush_group(arena);
        } else {
            trace!("Newlines<{count}>");
        }
    }

    /// Emits the current group and prepares the deferred list for replay.
    fn flush_group<A>(&mut self, arena: &mut A)
    where
        A: TokenArena<Handle = H>,
    {
        debug!(
            "Flush: {} admitted, {} deferred, max_col {}",
            self.admitted.len(),
            self.deferred.len(),
            self.max_col
        );

        // Right-align each token's end on the common edge
        for entry in self.admitted.iter() {
            let column = self.max_col.saturating_sub(arena.length(entry.token));
            trace!(
                "indent {:?} (line {}) to column {}",
                entry.token,
                arena.origin_line(entry.token),
                column
            );
            arena.indent_to_column(entry.token, column);
        }

        if let Some(last) = self.admitted.last() {
            self.last_flushed_seqnum = last.seqnum;
            self.admitted.reset();
        }
        self.max_col = 0;

        if self.deferred.is_empty() {
            // Nothing pending, restart the span window from here
            self.last_admission_seqnum = self.seqnum;
        } else {
            self.prune_deferred();
            self.schedule_readd();
        }
    }

    /// Drops deferred entries that belong to lines before the flushed group.
    fn prune_deferred(&mut self) {
        let last_flushed = self.last_flushed_seqnum;
        let dropped = self.deferred.remove_where(|entry| {
            let stale = entry.seqnum < last_flushed;
            if stale {
                trace!("dropping stale [{}] {:?}", entry.seqnum, entry.token);
            }
            stale
        });
        if dropped > 0 {
            debug!("Flush: dropped {dropped} stale deferred");
        }
        self.deferred.compact();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    /// Arena of `(column, length)` pairs that records every indent call.
    #[derive(Default)]
    struct Recorder {
        tokens: Vec<(usize, usize)>,
        applied: Vec<(usize, usize)>,
    }

    impl Recorder {
        fn token(&mut self, column: usize, length: usize) -> usize {
            self.tokens.push((column, length));
            self.tokens.len() - 1
        }
    }

    impl TokenArena for Recorder {
        type Handle = usize;

        fn origin_line(&self, token: usize) -> usize {
            token + 1
        }
        fn column(&self, token: usize) -> usize {
            self.tokens[token].0
        }
        fn length(&self, token: usize) -> usize {
            self.tokens[token].1
        }
        fn indent_to_column(&mut self, token: usize, column: usize) {
            self.tokens[token].0 = column;
            self.applied.push((token, column));
        }
    }

    fn handles(seq: &EntrySequence<usize>) -> Vec<usize> {
        seq.iter().map(|e| e.token).collect()
    }

    #[test]
    fn test_first_token_always_admitted() {
        let mut arena = Recorder::default();
        let a = arena.token(40, 3);
        let mut stack = AlignStack::new();
        stack.start(3, 1);
        stack.add(&mut arena, a);
        assert_eq!(handles(stack.admitted()), vec![a]);
        assert_eq!(stack.max_col(), 43);
    }

    #[test]
    fn test_zero_threshold_admits_everything() {
        let mut arena = Recorder::default();
        let a = arena.token(0, 2);
        let b = arena.token(80, 2);
        let mut stack = AlignStack::new();
        stack.start(3, 0);
        stack.add(&mut arena, a);
        stack.add(&mut arena, b);
        assert_eq!(handles(stack.admitted()), vec![a, b]);
        assert!(stack.deferred().is_empty());
        assert_eq!(stack.max_col(), 82);
    }

    #[test]
    fn test_narrower_token_does_not_move_edge() {
        let mut arena = Recorder::default();
        let a = arena.token(4, 6);
        let b = arena.token(5, 1);
        let mut stack = AlignStack::new();
        stack.start(3, 2);
        stack.add(&mut arena, a);
        stack.add(&mut arena, b);
        assert_eq!(stack.max_col(), 10);
        assert_eq!(handles(stack.admitted()), vec![a, b]);
    }

    #[test]
    fn test_new_lines_is_noop_when_empty() {
        let mut arena = Recorder::default();
        let mut stack: AlignStack<usize> = AlignStack::new();
        stack.start(1, 0);
        stack.new_lines(&mut arena, 5);
        assert_eq!(stack.seqnum(), 0);
        assert!(arena.applied.is_empty());
    }

    #[test]
    fn test_explicit_seqnum_moves_last_admission() {
        let mut arena = Recorder::default();
        let a = arena.token(0, 1);
        let b = arena.token(0, 1);
        let mut stack = AlignStack::new();
        stack.start(2, 0);
        stack.add_at(&mut arena, a, 4);
        stack.add_at(&mut arena, b, 2);
        assert_eq!(stack.last_admission_seqnum(), 4);
    }

    #[test]
    fn test_start_resets_used_stack() {
        let mut arena = Recorder::default();
        let a = arena.token(0, 10);
        let b = arena.token(30, 1);
        let mut stack = AlignStack::new();
        stack.start(1, 2);
        stack.add(&mut arena, a);
        stack.add(&mut arena, b);
        stack.new_lines(&mut arena, 1);

        stack.start(5, 7);
        assert!(stack.admitted().is_empty());
        assert!(stack.deferred().is_empty());
        assert_eq!(stack.max_col(), 0);
        assert_eq!(stack.seqnum(), 0);
        assert_eq!(stack.last_admission_seqnum(), 0);
        assert_eq!((stack.span(), stack.threshold()), (5, 7));
        assert!(arena.applied.is_empty());
    }

    #[test]
    fn test_flush_right_aligns() {
        let mut arena = Recorder::default();
        let a = arena.token(2, 10);
        let b = arena.token(0, 25);
        let mut stack = AlignStack::with_config(StackConfig::new(3, 0));
        stack.add(&mut arena, a);
        stack.add(&mut arena, b);
        stack.flush(&mut arena);
        assert_eq!(arena.applied, vec![(a, 15), (b, 0)]);
        assert_eq!(stack.max_col(), 0);
        assert!(stack.admitted().is_empty());
    }

    #[test]
    fn test_flush_prunes_every_stale_entry() {
        let mut arena = Recorder::default();
        let a = arena.token(0, 10);
        let b = arena.token(30, 1);
        let c = arena.token(40, 1);
        let d = arena.token(50, 1);
        let e = arena.token(9, 2);
        let mut stack = AlignStack::new();
        stack.start(10, 2);
        stack.add_at(&mut arena, a, 1);
        stack.add_at(&mut arena, b, 1);
        stack.add_at(&mut arena, c, 2);
        stack.add_at(&mut arena, d, 3);
        stack.add_at(&mut arena, e, 3);
        assert_eq!(handles(stack.deferred()), vec![b, c, d]);

        // b and c predate e; d shares its line and starts the next group
        stack.flush(&mut arena);
        assert_eq!(arena.applied, vec![(a, 1), (e, 9)]);
        assert_eq!(handles(stack.admitted()), vec![d]);
        assert!(stack.deferred().is_empty());
        assert_eq!(stack.max_col(), 51);
    }

    #[test]
    fn test_nested_replay_finishes_before_outer_pass() {
        let mut arena = Recorder::default();
        let a = arena.token(0, 10);
        let e1 = arena.token(17, 1);
        let e2 = arena.token(14, 3);
        let e3 = arena.token(15, 1);
        let t = arena.token(11, 1);
        let mut stack = AlignStack::new();
        stack.start(5, 2);
        for token in [a, e1, e2, e3] {
            stack.add(&mut arena, token);
        }
        assert_eq!(handles(stack.deferred()), vec![e1, e2, e3]);

        // t widens to 12: e1 is still too far, e2 fits and widens to 17,
        // which replays e1 (edge 18) before e3 is looked at; e3 is then
        // three columns short and stays deferred.
        stack.add(&mut arena, t);
        assert_eq!(handles(stack.admitted()), vec![a, t, e2, e1]);
        assert_eq!(handles(stack.deferred()), vec![e3]);
        assert_eq!(stack.max_col(), 18);
    }
}
