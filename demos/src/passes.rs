// SPDX-License-Identifier: Apache-2.0

use alignstack::{AlignKind, AlignOptions, AlignStack, StackConfig, TokenId};
use log::{debug, info};

use crate::lexer::{lex, LineCandidates, Lexed};

/// Runs one alignment pass over every line, feeding at most one candidate
/// per line and one line break per line.
fn run_pass<F>(lexed: &mut Lexed, config: StackConfig, candidate: F) -> usize
where
    F: Fn(&LineCandidates) -> Option<TokenId>,
{
    let mut stack = AlignStack::with_config(config);
    let mut fed = 0;
    for line in &lexed.lines {
        if let Some(id) = candidate(line) {
            stack.add(&mut lexed.tokens, id);
            fed += 1;
        }
        stack.new_lines(&mut lexed.tokens, 1);
    }
    stack.end(&mut lexed.tokens);
    fed
}

/// Aligns assignments, then trailing comments, and renders the result.
///
/// Returns `source` unchanged when both passes are disabled.
pub fn align_source(source: &str, options: &AlignOptions) -> String {
    let assign = options.stack_config(AlignKind::Assign);
    let comment = options.stack_config(AlignKind::RightComment);
    if assign.is_none() && comment.is_none() {
        debug!("no alignment pass enabled");
        return source.to_string();
    }

    let mut lexed = lex(source, options.input_tab_size);
    debug!(
        "lexed {} tokens on {} lines",
        lexed.tokens.len(),
        lexed.lines.len()
    );

    if let Some(config) = assign {
        let fed = run_pass(&mut lexed, config, |line| line.assign);
        info!("assign pass: {fed} candidates, {config:?}");
    }
    if let Some(config) = comment {
        let fed = run_pass(&mut lexed, config, |line| line.trailing_comment);
        info!("comment pass: {fed} candidates, {config:?}");
    }

    let mut out = lexed.tokens.render_with(options.padding());
    if !source.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}
