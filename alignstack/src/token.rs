// SPDX-License-Identifier: Apache-2.0

//! Token handles as seen by the alignment stack.
//!
//! The stack never owns tokens. It stores copyable handles and goes through
//! a [`TokenArena`] whenever it needs a token's position or has to move one.

use alloc::string::String;
use alloc::vec::Vec;

/// Storage for the tokens being aligned.
///
/// Columns are 0-based and measured in rendered characters.
pub trait TokenArena {
    /// Non-owning reference to a token in this arena.
    type Handle: Copy + core::fmt::Debug;

    /// Line the token came from in the input.
    fn origin_line(&self, token: Self::Handle) -> usize;
    /// Column the token currently starts at.
    fn column(&self, token: Self::Handle) -> usize;
    /// Rendered width of the token.
    fn length(&self, token: Self::Handle) -> usize;
    /// Moves the token so that it starts at `column`.
    ///
    /// Called by the stack once per admitted token when a group is flushed.
    fn indent_to_column(&mut self, token: Self::Handle, column: usize);
}

/// A token with its text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub origin_line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, origin_line: usize, column: usize) -> Self {
        Self {
            text: text.into(),
            origin_line,
            column,
        }
    }

    pub fn length(&self) -> usize {
        self.text.chars().count()
    }

    /// Column just past the last character of the token.
    pub fn end_column(&self) -> usize {
        self.column + self.length()
    }
}

/// Index of a token inside a [`TokenList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub usize);

/// How a rebuilt line fills the gap in front of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    #[default]
    Spaces,
    /// Tabs up to the last tab stop before the token, then spaces.
    Tabs { width: usize },
}

impl Padding {
    fn fill(self, out: &mut String, mut from: usize, to: usize) {
        if let Padding::Tabs { width } = self {
            if width > 0 {
                loop {
                    let stop = (from / width + 1) * width;
                    if stop > to {
                        break;
                    }
                    out.push('\t');
                    from = stop;
                }
            }
        }
        for _ in from..to {
            out.push(' ');
        }
    }
}

/// Input text of one line, kept so untouched lines render verbatim.
#[derive(Debug, Clone, Default)]
struct SourceLine {
    text: String,
    /// Column of the line's first token before anything on the line moved.
    moved_from: Option<usize>,
}

/// Tokens of a source file in input order.
///
/// Tokens must be pushed line by line, left to right; moving a token also
/// moves everything after it on the same line.
#[derive(Debug, Clone, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
    lines: Vec<SourceLine>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the text of the next input line and returns its origin line.
    ///
    /// Lines recorded here come out of [`Self::render`] unchanged unless one
    /// of their tokens is moved.
    pub fn add_line(&mut self, text: impl Into<String>) -> usize {
        self.lines.push(SourceLine {
            text: text.into(),
            moved_from: None,
        });
        self.lines.len()
    }

    pub fn push(&mut self, token: Token) -> TokenId {
        self.tokens.push(token);
        TokenId(self.tokens.len() - 1)
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &Token)> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .map(|(idx, token)| (TokenId(idx), token))
    }

    /// Rebuilds text from the current token positions, padding with spaces.
    pub fn render(&self) -> String {
        self.render_with(Padding::Spaces)
    }

    /// Rebuilds text from the current token positions.
    ///
    /// Emits one `\n`-terminated line per origin line, up to the last
    /// recorded line or token. Recorded lines nothing moved on are copied
    /// as they were; a moved line keeps its leading whitespace when its
    /// first token stayed put. Tokens that would overlap are kept one space
    /// apart.
    pub fn render_with(&self, padding: Padding) -> String {
        let last_token_line = self.tokens.last().map_or(0, |t| t.origin_line);
        let line_count = self.lines.len().max(last_token_line);

        let mut out = String::new();
        let mut rest = self.tokens.as_slice();
        for line in 1..=line_count {
            let split = rest
                .iter()
                .position(|t| t.origin_line > line)
                .unwrap_or(rest.len());
            let (on_line, tail) = rest.split_at(split);
            rest = tail;

            match self.lines.get(line - 1) {
                Some(source) if source.moved_from.is_none() => out.push_str(&source.text),
                source => render_line(&mut out, on_line, source, padding),
            }
            out.push('\n');
        }
        out
    }

    /// Column of the first token on the line of the token at `idx`.
    fn line_start_column(&self, idx: usize) -> Option<usize> {
        let line = self.tokens.get(idx)?.origin_line;
        self.tokens
            .get(..=idx)?
            .iter()
            .rev()
            .take_while(|t| t.origin_line == line)
            .last()
            .map(|t| t.column)
    }
}

fn render_line(out: &mut String, tokens: &[Token], source: Option<&SourceLine>, padding: Padding) {
    let mut width = 0;
    for (idx, token) in tokens.iter().enumerate() {
        let mut target = token.column;
        if idx == 0 {
            if let Some(SourceLine {
                text,
                moved_from: Some(column),
            }) = source
            {
                if *column == token.column {
                    out.extend(text.chars().take_while(|c| c.is_whitespace()));
                    width = target;
                }
            }
        } else if target <= width {
            target = width + 1;
        }
        padding.fill(out, width, target);
        out.push_str(&token.text);
        width = target + token.length();
    }
}

impl TokenArena for TokenList {
    type Handle = TokenId;

    fn origin_line(&self, token: TokenId) -> usize {
        self.get(token).map_or(0, |t| t.origin_line)
    }

    fn column(&self, token: TokenId) -> usize {
        self.get(token).map_or(0, |t| t.column)
    }

    fn length(&self, token: TokenId) -> usize {
        self.get(token).map_or(0, Token::length)
    }

    fn indent_to_column(&mut self, token: TokenId, column: usize) {
        let Some(line) = self
            .get(token)
            .filter(|t| t.column != column)
            .map(|t| t.origin_line)
        else {
            return;
        };
        if let Some(start) = self.line_start_column(token.0) {
            if let Some(source) = line.checked_sub(1).and_then(|idx| self.lines.get_mut(idx)) {
                source.moved_from.get_or_insert(start);
            }
        }

        let Some(moved) = self.tokens.get_mut(token.0) else {
            return;
        };
        let mut old_end = moved.end_column();
        moved.column = column;
        let mut new_end = moved.end_column();

        // Keep the gaps between the moved token and the rest of its line
        for next in self
            .tokens
            .iter_mut()
            .skip(token.0 + 1)
            .take_while(|t| t.origin_line == line)
        {
            let gap = next.column.saturating_sub(old_end);
            old_end = next.end_column();
            next.column = new_end + gap;
            new_end = next.end_column();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn list(tokens: &[(&str, usize, usize)]) -> TokenList {
        let mut list = TokenList::new();
        for &(text, line, column) in tokens {
            list.push(Token::new(text, line, column));
        }
        list
    }

    #[test]
    fn test_token_length_counts_chars() {
        let token = Token::new("größe", 1, 4);
        assert_eq!(token.length(), 5);
        assert_eq!(token.end_column(), 9);
    }

    #[test]
    fn test_render_keeps_columns() {
        let tokens = list(&[("int", 1, 0), ("a", 1, 4), ("=", 1, 6), ("x", 3, 2)]);
        assert_eq!(tokens.render(), "int a =\n\n  x\n");
    }

    #[test]
    fn test_indent_shifts_rest_of_line() {
        let mut tokens = list(&[
            ("a", 1, 0),
            ("=", 1, 2),
            ("1;", 1, 4),
            ("b", 2, 0),
            ("=", 2, 2),
        ]);
        tokens.indent_to_column(TokenId(1), 6);
        assert_eq!(tokens.column(TokenId(1)), 6);
        assert_eq!(tokens.column(TokenId(2)), 8);
        // Next line is untouched
        assert_eq!(tokens.column(TokenId(4)), 2);
        assert_eq!(tokens.render(), "a     = 1;\nb =\n");
    }

    fn recorded(lines: &[&str], tokens: &[(&str, usize, usize)]) -> TokenList {
        let mut list = TokenList::new();
        for line in lines {
            list.add_line(*line);
        }
        for &(text, line, column) in tokens {
            list.push(Token::new(text, line, column));
        }
        list
    }

    #[test]
    fn test_untouched_lines_render_verbatim() {
        let mut tokens = recorded(
            &["\tx  =\t1;", "", "y = 2;", ""],
            &[("x", 1, 8), ("=", 1, 11), ("1;", 1, 16), ("y", 3, 0), ("=", 3, 2), ("2;", 3, 4)],
        );
        assert_eq!(tokens.render(), "\tx  =\t1;\n\ny = 2;\n\n");

        // Moving a token to where it already is changes nothing
        tokens.indent_to_column(TokenId(4), 2);
        assert_eq!(tokens.render(), "\tx  =\t1;\n\ny = 2;\n\n");
    }

    #[test]
    fn test_moved_line_keeps_indent() {
        let mut tokens = recorded(
            &["\tx = 1;", "\tlonger = 2;"],
            &[("x", 1, 8), ("=", 1, 10), ("1;", 1, 12), ("longer", 2, 8), ("=", 2, 15), ("2;", 2, 17)],
        );
        tokens.indent_to_column(TokenId(1), 15);
        assert_eq!(tokens.render(), "\tx      = 1;\n\tlonger = 2;\n");

        // Moving the first token drops the recorded indent
        tokens.indent_to_column(TokenId(3), 4);
        assert_eq!(tokens.render(), "\tx      = 1;\n    longer = 2;\n");
    }

    #[test]
    fn test_tab_padding() {
        let mut tokens = recorded(&["a = 1;"], &[("a", 1, 0), ("=", 1, 2), ("1;", 1, 4)]);
        tokens.indent_to_column(TokenId(1), 10);
        assert_eq!(
            tokens.render_with(Padding::Tabs { width: 4 }),
            "a\t\t  = 1;\n"
        );
        assert_eq!(tokens.render_with(Padding::Tabs { width: 0 }), tokens.render());
    }

    #[test]
    fn test_missing_handle_is_ignored() {
        let mut tokens = list(&[("a", 1, 0)]);
        tokens.indent_to_column(TokenId(7), 3);
        assert_eq!(tokens.column(TokenId(7)), 0);
        assert_eq!(tokens.length(TokenId(7)), 0);
        assert_eq!(tokens.column(TokenId(0)), 0);
    }
}
