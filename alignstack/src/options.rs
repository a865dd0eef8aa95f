// SPDX-License-Identifier: Apache-2.0

//! Resolved alignment options.
//!
//! An [`AlignStack`](crate::AlignStack) only ever sees a [`StackConfig`]: the
//! span and threshold for one alignment run. [`AlignOptions`] holds the named
//! alignment settings of a formatter configuration and resolves them into a
//! `StackConfig` per kind of alignment pass, plus the tab settings used when
//! lines are rebuilt.

use alloc::string::{String, ToString};

use crate::token::Padding;

/// Span and threshold for one alignment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackConfig {
    /// Lines a group may stretch past its last admission before it is flushed.
    pub span: usize,
    /// Allowed column deviation from the group's right edge; 0 admits anything.
    pub threshold: usize,
}

impl StackConfig {
    pub const fn new(span: usize, threshold: usize) -> Self {
        Self { span, threshold }
    }
}

/// The alignment passes a formatter runs, each with its own span setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignKind {
    /// `=` in a run of assignments.
    Assign,
    /// Comments that end a line.
    RightComment,
}

/// Value type of a named option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgType {
    Bool,
    Num,
}

/// Option names, sorted so that lookups can binary search.
const OPTION_TABLE: &[(&str, ArgType)] = &[
    ("align_assign_span", ArgType::Num),
    ("align_assign_thresh", ArgType::Num),
    ("align_right_cmt_span", ArgType::Num),
    ("align_with_tabs", ArgType::Bool),
    ("input_tab_size", ArgType::Num),
    ("output_tab_size", ArgType::Num),
];

const DEFAULT_TAB_SIZE: usize = 8;

fn lookup(name: &str) -> Option<ArgType> {
    OPTION_TABLE
        .binary_search_by(|(entry, _)| (*entry).cmp(name))
        .ok()
        .and_then(|idx| OPTION_TABLE.get(idx))
        .map(|(_, arg)| *arg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionErrorKind {
    UnknownOption,
    InvalidValue,
    MissingValue,
}

/// Error produced while applying named options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionError {
    kind: OptionErrorKind,
    name: String,
    /// 1-based line in the options text, 0 when set directly.
    line: usize,
}

impl OptionError {
    fn new(kind: OptionErrorKind, name: &str, line: usize) -> Self {
        Self {
            kind,
            name: name.to_string(),
            line,
        }
    }

    pub fn kind(&self) -> OptionErrorKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl core::fmt::Display for OptionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let what = match self.kind {
            OptionErrorKind::UnknownOption => "unknown option",
            OptionErrorKind::InvalidValue => "invalid value for",
            OptionErrorKind::MissingValue => "missing value for",
        };
        if self.line == 0 {
            write!(f, "{what} `{}`", self.name)
        } else {
            write!(f, "line {}: {what} `{}`", self.line, self.name)
        }
    }
}

/// Named alignment settings. Every span defaults to 0, which disables the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignOptions {
    pub align_assign_span: usize,
    pub align_assign_thresh: usize,
    pub align_right_cmt_span: usize,
    /// Pad alignment gaps with tabs up to the last tab stop.
    pub align_with_tabs: bool,
    /// Columns per tab when reading input.
    pub input_tab_size: usize,
    /// Columns per tab when padding with tabs.
    pub output_tab_size: usize,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            align_assign_span: 0,
            align_assign_thresh: 0,
            align_right_cmt_span: 0,
            align_with_tabs: false,
            input_tab_size: DEFAULT_TAB_SIZE,
            output_tab_size: DEFAULT_TAB_SIZE,
        }
    }
}

impl AlignOptions {
    /// All recognised option names, in sorted order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        OPTION_TABLE.iter().map(|(name, _)| *name)
    }

    /// Resolves the span and threshold for one pass.
    ///
    /// Returns `None` when the pass is disabled (span 0). Only the assignment
    /// pass has a threshold setting.
    pub fn stack_config(&self, kind: AlignKind) -> Option<StackConfig> {
        let (span, threshold) = match kind {
            AlignKind::Assign => (self.align_assign_span, self.align_assign_thresh),
            AlignKind::RightComment => (self.align_right_cmt_span, 0),
        };
        if span == 0 {
            return None;
        }
        Some(StackConfig::new(span, threshold))
    }

    /// How rebuilt lines fill the gaps before moved tokens.
    pub fn padding(&self) -> Padding {
        if self.align_with_tabs && self.output_tab_size > 0 {
            Padding::Tabs {
                width: self.output_tab_size,
            }
        } else {
            Padding::Spaces
        }
    }

    /// Sets one option from its textual value.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        self.set_at(name, value, 0)
    }

    fn set_at(&mut self, name: &str, value: &str, line: usize) -> Result<(), OptionError> {
        let invalid = || OptionError::new(OptionErrorKind::InvalidValue, name, line);
        match lookup(name) {
            None => Err(OptionError::new(OptionErrorKind::UnknownOption, name, line)),
            Some(ArgType::Num) => {
                let parsed = value.parse::<usize>().map_err(|_| invalid())?;
                self.num_slot(name).map(|slot| *slot = parsed).ok_or_else(invalid)
            }
            Some(ArgType::Bool) => {
                let parsed = if value == "1" || value.eq_ignore_ascii_case("true") {
                    true
                } else if value == "0" || value.eq_ignore_ascii_case("false") {
                    false
                } else {
                    return Err(invalid());
                };
                self.bool_slot(name).map(|slot| *slot = parsed).ok_or_else(invalid)
            }
        }
    }

    /// Applies `name = value` lines on top of the current settings.
    ///
    /// Blank lines are skipped and `#` starts a comment.
    pub fn apply(&mut self, text: &str) -> Result<(), OptionError> {
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let (name, value) = match content.split_once('=') {
                Some((name, value)) => (name.trim(), value.trim()),
                None => (content, ""),
            };
            if value.is_empty() {
                if lookup(name).is_none() {
                    return Err(OptionError::new(OptionErrorKind::UnknownOption, name, line));
                }
                return Err(OptionError::new(OptionErrorKind::MissingValue, name, line));
            }
            self.set_at(name, value, line)?;
        }
        Ok(())
    }

    /// Parses options text starting from the defaults.
    pub fn parse(text: &str) -> Result<Self, OptionError> {
        let mut options = Self::default();
        options.apply(text)?;
        Ok(options)
    }

    fn num_slot(&mut self, name: &str) -> Option<&mut usize> {
        Some(match name {
            "align_assign_span" => &mut self.align_assign_span,
            "align_assign_thresh" => &mut self.align_assign_thresh,
            "align_right_cmt_span" => &mut self.align_right_cmt_span,
            "input_tab_size" => &mut self.input_tab_size,
            "output_tab_size" => &mut self.output_tab_size,
            _ => return None,
        })
    }

    fn bool_slot(&mut self, name: &str) -> Option<&mut bool> {
        Some(match name {
            "align_with_tabs" => &mut self.align_with_tabs,
            _ => return None,
        })
    }
}
