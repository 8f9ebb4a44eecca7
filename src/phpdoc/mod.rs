// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Structured doc-comments: parsing `/** … */` blocks and re-emitting
//! them in canonical form with aligned tag columns.

mod parse;
mod token;
pub mod types;

pub use self::parse::parse;

use std::fmt;

use crate::printer::TabAligner;

use self::types::{Param, Type};

/// A doc-comment parse failure, positioned relative to the comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for DocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line:{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for DocError {}

/// One parsed doc block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Indentation of the lines following the opener, supplied by the
    /// caller from the surrounding whitespace.
    pub indent: String,
    /// The source opened with text on the `/**` line.
    pub prefer_oneline: bool,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    Tag(Tag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Param {
        param: Param,
        desc: String,
    },
    Return {
        typ: Type,
        desc: String,
    },
    Property {
        typ: Type,
        var: String,
        read_only: bool,
        write_only: bool,
        desc: String,
    },
    Method {
        is_static: bool,
        result: Option<Type>,
        name: String,
        params: Vec<Param>,
        desc: String,
    },
    Var {
        typ: Type,
        var: Option<String>,
        desc: String,
    },
    Throws {
        typ: Type,
        desc: String,
    },
    Extends {
        typ: Type,
        desc: String,
    },
    Implements {
        typ: Type,
        desc: String,
    },
    Uses {
        typ: Type,
        desc: String,
    },
    Template {
        param: String,
        bound: Option<Type>,
        desc: String,
    },
    TypeDef {
        name: String,
        typ: Type,
        desc: String,
    },
    Other {
        name: String,
        desc: String,
    },
}

impl Tag {
    /// The tag rendered as alignment cells: the tag word, then the
    /// payload columns. The description rides in the last cell.
    fn cells(&self) -> Vec<String> {
        fn with_desc(mut cells: Vec<String>, desc: &str) -> Vec<String> {
            if !desc.is_empty() {
                match cells.last_mut() {
                    Some(last) if !last.is_empty() => {
                        last.push(' ');
                        last.push_str(desc);
                    }
                    _ => cells.push(desc.to_string()),
                }
            }
            cells
        }

        match self {
            Tag::Param { param, desc } => {
                let mut name = String::new();
                if param.by_ref {
                    name.push('&');
                }
                if param.variadic {
                    name.push_str("...");
                }
                if let Some(var) = &param.name {
                    name.push('$');
                    name.push_str(var);
                }
                with_desc(
                    vec!["@param".to_string(), param.typ.to_string(), name],
                    desc,
                )
            }
            Tag::Return { typ, desc } => {
                with_desc(vec!["@return".to_string(), typ.to_string()], desc)
            }
            Tag::Property {
                typ,
                var,
                read_only,
                write_only,
                desc,
            } => {
                let tag = if *read_only {
                    "@property-read"
                } else if *write_only {
                    "@property-write"
                } else {
                    "@property"
                };
                with_desc(
                    vec![tag.to_string(), typ.to_string(), format!("${var}")],
                    desc,
                )
            }
            Tag::Method {
                is_static,
                result,
                name,
                params,
                desc,
            } => {
                let mut sig = String::new();
                if *is_static {
                    sig.push_str("static ");
                }
                if let Some(result) = result {
                    sig.push_str(&result.to_string());
                    sig.push(' ');
                }
                sig.push_str(name);
                sig.push('(');
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        sig.push_str(", ");
                    }
                    sig.push_str(&param.to_string());
                }
                sig.push(')');
                with_desc(vec!["@method".to_string(), sig], desc)
            }
            Tag::Var { typ, var, desc } => {
                let mut cells = vec!["@var".to_string(), typ.to_string()];
                if let Some(var) = var {
                    cells.push(format!("${var}"));
                }
                with_desc(cells, desc)
            }
            Tag::Throws { typ, desc } => {
                with_desc(vec!["@throws".to_string(), typ.to_string()], desc)
            }
            Tag::Extends { typ, desc } => {
                with_desc(vec!["@extends".to_string(), typ.to_string()], desc)
            }
            Tag::Implements { typ, desc } => {
                with_desc(vec!["@implements".to_string(), typ.to_string()], desc)
            }
            Tag::Uses { typ, desc } => {
                with_desc(vec!["@uses".to_string(), typ.to_string()], desc)
            }
            Tag::Template { param, bound, desc } => {
                let mut payload = param.clone();
                if let Some(bound) = bound {
                    payload.push_str(" of ");
                    payload.push_str(&bound.to_string());
                }
                with_desc(vec!["@template".to_string(), payload], desc)
            }
            Tag::TypeDef { name, typ, desc } => with_desc(
                vec![
                    "@phpstan-type".to_string(),
                    name.clone(),
                    typ.to_string(),
                ],
                desc,
            ),
            Tag::Other { name, desc } => with_desc(vec![format!("@{name}")], desc),
        }
    }
}

/// Prints a block in canonical form. The output always ends with a
/// newline; every line is prefixed with the block's indent.
pub fn print(block: &Block) -> String {
    if block.prefer_oneline && block.lines.len() <= 1 {
        let content = match block.lines.first() {
            Some(Line::Text(text)) => text.clone(),
            Some(Line::Tag(tag)) => tag
                .cells()
                .into_iter()
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        };
        if content.is_empty() {
            return format!("{}/** */\n", block.indent);
        }
        return format!("{}/** {} */\n", block.indent, content);
    }

    let mut w = TabAligner::new();
    w.text(&block.indent);
    w.text("/**");
    w.newline();
    for line in &block.lines {
        match line {
            Line::Text(text) => {
                w.text(&block.indent);
                w.text(" *");
                if !text.is_empty() {
                    w.text(" ");
                    w.text(text);
                }
                w.newline();
            }
            Line::Tag(tag) => {
                w.text(&block.indent);
                w.text(" * ");
                let cells = tag.cells();
                for (i, cell) in cells.iter().enumerate() {
                    if i > 0 {
                        w.cell_break();
                    }
                    w.text(cell);
                }
                w.newline();
            }
        }
    }
    w.text(&block.indent);
    w.text(" */");
    w.newline();
    w.finish()
}
