// SPDX-License-Identifier: Apache-2.0

//! Whitespace-and-operator splitter, just enough to find assignments and
//! trailing comments in C-like text.

use alignstack::{Token, TokenId, TokenList};

const OPERATOR_CHARS: &str = "=!<>+-*/%&|^";

/// Alignment candidates found on one line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineCandidates {
    /// First assignment operator on the line.
    pub assign: Option<TokenId>,
    /// Comment that follows code on the same line.
    pub trailing_comment: Option<TokenId>,
}

/// Tokens of a whole input plus the candidates of each line.
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: TokenList,
    pub lines: Vec<LineCandidates>,
}

/// `=` and compound assignments such as `+=`, but not comparisons.
pub fn is_assignment(text: &str) -> bool {
    text.ends_with('=') && !matches!(text, "==" | "!=" | "<=" | ">=")
}

/// Splits `source` into tokens, expanding tabs to `tab_size` columns.
pub fn lex(source: &str, tab_size: usize) -> Lexed {
    let mut lexed = Lexed::default();
    for line in source.lines() {
        let line_no = lexed.tokens.add_line(line);
        let candidates = lex_line(&mut lexed.tokens, line, line_no, tab_size);
        lexed.lines.push(candidates);
    }
    lexed
}

fn lex_line(tokens: &mut TokenList, line: &str, line_no: usize, tab_size: usize) -> LineCandidates {
    let chars: Vec<char> = line.chars().collect();
    let mut columns = Vec::with_capacity(chars.len());
    let mut column = 0;
    for &c in &chars {
        columns.push(column);
        column = match c {
            '\t' if tab_size > 0 => (column / tab_size + 1) * tab_size,
            _ => column + 1,
        };
    }
    let mut candidates = LineCandidates::default();
    let mut seen_code = false;
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;

        if c == '/' && chars.get(pos + 1) == Some(&'/') {
            let text: String = chars[start..].iter().collect();
            let id = tokens.push(Token::new(text, line_no, columns[start]));
            if seen_code {
                candidates.trailing_comment = Some(id);
            }
            break;
        }

        let is_op = |ch: char| OPERATOR_CHARS.contains(ch);
        if is_op(c) {
            while pos < chars.len() && is_op(chars[pos]) {
                pos += 1;
            }
        } else {
            while pos < chars.len() && !chars[pos].is_whitespace() && !is_op(chars[pos]) {
                pos += 1;
            }
        }

        let text: String = chars[start..pos].iter().collect();
        let assign = is_assignment(&text);
        let id = tokens.push(Token::new(text, line_no, columns[start]));
        if assign && candidates.assign.is_none() {
            candidates.assign = Some(id);
        }
        seen_code = true;
    }
    candidates
}
