// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The second formatting pass: re-scan the printed output and re-emit
//! every doc comment through the structured doc grammar.

use std::fmt;

use crate::phpdoc;
use crate::token::{Pos, Scanner, TokenKind};

/// A non-fatal doc-formatting failure; the caller logs it and keeps the
/// un-doc-formatted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocfmtError {
    pub message: String,
}

impl fmt::Display for DocfmtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DocfmtError {}

/// Rewrites the doc comments of already-formatted source. A doc comment
/// takes its indentation from the whitespace that follows it; the first
/// doc in a file keeps the blank line separating it from the code.
pub(crate) fn format_docs(filename: &str, src: &str) -> Result<String, DocfmtError> {
    let mut scan = Scanner::new(src, true);
    let mut out = String::with_capacity(src.len());
    let mut pending_indent = String::new();
    let mut first_doc = true;
    let mut doc: Option<phpdoc::Block> = None;
    loop {
        let mut tok = scan.next();
        if let Some(mut block) = doc.take() {
            pending_indent.clear();
            let mut tok_is_ws = false;
            if tok.kind == TokenKind::Whitespace {
                tok_is_ws = true;
                match tok.text.rfind('\n') {
                    Some(i) => {
                        block.indent = tok.text[i + 1..].to_string();
                        tok.text.truncate(i);
                    }
                    None => block.indent = tok.text.clone(),
                }
            }
            out.push_str(&phpdoc::print(&block));
            out.push_str(&block.indent);
            if tok_is_ws {
                if first_doc {
                    first_doc = false;
                } else {
                    continue;
                }
            }
        }
        if tok.kind == TokenKind::DocComment {
            match phpdoc::parse(&tok.text) {
                Ok(block) => {
                    doc = Some(block);
                    continue;
                }
                Err(err) => {
                    let pos = offset_pos(tok.pos, err.line, err.column);
                    return Err(DocfmtError {
                        message: format!("{filename}:{pos}: {}", err.message),
                    });
                }
            }
        }
        if !pending_indent.is_empty() {
            out.push_str(&pending_indent);
            pending_indent.clear();
        }
        match tok.kind {
            TokenKind::Eof => break,
            TokenKind::Whitespace => match tok.text.rfind('\n') {
                Some(i) => {
                    out.push_str(&tok.text[..i + 1]);
                    pending_indent = tok.text[i + 1..].to_string();
                }
                None => pending_indent = tok.text.clone(),
            },
            TokenKind::Namespace
            | TokenKind::Class
            | TokenKind::Interface
            | TokenKind::Trait
            | TokenKind::Enum => {
                // A "file doc" can no longer follow one of these.
                first_doc = false;
                out.push_str(&tok.text);
            }
            _ => out.push_str(&tok.text),
        }
    }
    if let Some(err) = scan.take_err() {
        return Err(DocfmtError {
            message: format!("{filename}:{}: {}", err.pos, err.message),
        });
    }
    Ok(out)
}

/// Shifts a position inside a doc comment by the comment's own position
/// in the file.
fn offset_pos(base: Pos, line: u32, column: u32) -> Pos {
    if line == 1 {
        Pos {
            line: base.line,
            column: base.column + column - 1,
        }
    } else {
        Pos {
            line: base.line + line - 1,
            column,
        }
    }
}
