// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Scanner for the text of one `/** … */` comment.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DocKind {
    Eof,
    Newline,
    Whitespace,
    OpenDoc,  // /**
    CloseDoc, // */
    Asterisk, // a leading *
    Tag,      // @name, hyphens allowed
    Ident,
    Var,      // $name
    This,     // $this
    Static,
    Array,
    Object,
    Callable,
    Lparen,
    Rparen,
    Lbrack,
    Rbrack,
    Lbrace,
    Rbrace,
    Lt,
    Gt,
    Comma,
    Colon,
    DoubleColon,
    Qmark,
    Or,  // |
    And, // &
    Assign,
    Ellipsis,
    Backslash,
    Str,
    Int,
    Other,
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocKind::Eof => "EOF",
            DocKind::Newline => "newline",
            DocKind::Whitespace => "whitespace",
            DocKind::OpenDoc => "/**",
            DocKind::CloseDoc => "*/",
            DocKind::Asterisk => "*",
            DocKind::Tag => "tag",
            DocKind::Ident => "ident",
            DocKind::Var => "varname",
            DocKind::This => "$this",
            DocKind::Static => "static",
            DocKind::Array => "array",
            DocKind::Object => "object",
            DocKind::Callable => "callable",
            DocKind::Lparen => "(",
            DocKind::Rparen => ")",
            DocKind::Lbrack => "[",
            DocKind::Rbrack => "]",
            DocKind::Lbrace => "{",
            DocKind::Rbrace => "}",
            DocKind::Lt => "<",
            DocKind::Gt => ">",
            DocKind::Comma => ",",
            DocKind::Colon => ":",
            DocKind::DoubleColon => "::",
            DocKind::Qmark => "?",
            DocKind::Or => "|",
            DocKind::And => "&",
            DocKind::Assign => "=",
            DocKind::Ellipsis => "...",
            DocKind::Backslash => "\\",
            DocKind::Str => "string",
            DocKind::Int => "int",
            DocKind::Other => "text",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocToken {
    pub kind: DocKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for DocToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DocKind::Ident | DocKind::Var | DocKind::Str | DocKind::Int | DocKind::Tag
            | DocKind::Other => write!(f, "{}({:?})", self.kind, self.text),
            _ => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Debug)]
pub(crate) struct DocScanner {
    chars: Vec<char>,
    cursor: usize,
    line: u32,
    col: u32,
}

impl DocScanner {
    pub fn new(src: &str) -> Self {
        DocScanner {
            chars: src.chars().collect(),
            cursor: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.chars.get(self.cursor + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    pub fn next(&mut self) -> DocToken {
        let (line, column) = (self.line, self.col);
        let make = |kind, text: String| DocToken {
            kind,
            text,
            line,
            column,
        };
        let Some(c) = self.peek() else {
            return make(DocKind::Eof, String::new());
        };
        match c {
            '\n' => {
                self.bump();
                make(DocKind::Newline, "\n".to_string())
            }
            ' ' | '\t' | '\r' => {
                let mut text = String::new();
                while let Some(c @ (' ' | '\t' | '\r')) = self.peek() {
                    self.bump();
                    text.push(c);
                }
                make(DocKind::Whitespace, text)
            }
            '/' if self.peek2() == Some('*') => {
                // Only the /** opener appears inside a doc comment.
                self.bump();
                self.bump();
                let mut text = String::from("/*");
                while self.peek() == Some('*') {
                    self.bump();
                    text.push('*');
                }
                make(DocKind::OpenDoc, text)
            }
            '*' if self.peek2() == Some('/') => {
                self.bump();
                self.bump();
                make(DocKind::CloseDoc, "*/".to_string())
            }
            '*' => {
                self.bump();
                make(DocKind::Asterisk, "*".to_string())
            }
            '@' => {
                self.bump();
                let mut text = String::from("@");
                while let Some(c) = self.peek() {
                    if c == '_' || c == '-' || c.is_ascii_alphanumeric() {
                        self.bump();
                        text.push(c);
                    } else {
                        break;
                    }
                }
                if text.len() == 1 {
                    return make(DocKind::Other, text);
                }
                make(DocKind::Tag, text)
            }
            '$' => {
                self.bump();
                let name = self.scan_ident();
                if name.is_empty() {
                    return make(DocKind::Other, "$".to_string());
                }
                let kind = if name == "this" {
                    DocKind::This
                } else {
                    DocKind::Var
                };
                make(kind, format!("${name}"))
            }
            '\'' => {
                self.bump();
                let mut text = String::from("'");
                while let Some(c) = self.bump() {
                    text.push(c);
                    if c == '\\' {
                        if let Some(esc) = self.bump() {
                            text.push(esc);
                        }
                    } else if c == '\'' {
                        break;
                    }
                }
                make(DocKind::Str, text)
            }
            '"' => {
                self.bump();
                let mut text = String::from("\"");
                while let Some(c) = self.bump() {
                    text.push(c);
                    if c == '\\' {
                        if let Some(esc) = self.bump() {
                            text.push(esc);
                        }
                    } else if c == '"' {
                        break;
                    }
                }
                make(DocKind::Str, text)
            }
            '.' if self.peek2() == Some('.') => {
                self.bump();
                self.bump();
                if self.peek() == Some('.') {
                    self.bump();
                    return make(DocKind::Ellipsis, "...".to_string());
                }
                make(DocKind::Other, "..".to_string())
            }
            ':' if self.peek2() == Some(':') => {
                self.bump();
                self.bump();
                make(DocKind::DoubleColon, "::".to_string())
            }
            '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | ',' | ':' | '?' | '|' | '&' | '='
            | '\\' => {
                self.bump();
                let kind = match c {
                    '(' => DocKind::Lparen,
                    ')' => DocKind::Rparen,
                    '[' => DocKind::Lbrack,
                    ']' => DocKind::Rbrack,
                    '{' => DocKind::Lbrace,
                    '}' => DocKind::Rbrace,
                    '<' => DocKind::Lt,
                    '>' => DocKind::Gt,
                    ',' => DocKind::Comma,
                    ':' => DocKind::Colon,
                    '?' => DocKind::Qmark,
                    '|' => DocKind::Or,
                    '&' => DocKind::And,
                    '=' => DocKind::Assign,
                    _ => DocKind::Backslash,
                };
                make(kind, c.to_string())
            }
            _ if c.is_ascii_digit() => {
                let mut text = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        self.bump();
                        text.push(c);
                    } else {
                        break;
                    }
                }
                make(DocKind::Int, text)
            }
            _ if c == '_' || c.is_ascii_alphabetic() || c as u32 >= 0x80 => {
                let name = self.scan_ident();
                let kind = match name.as_str() {
                    "static" => DocKind::Static,
                    "array" => DocKind::Array,
                    "object" => DocKind::Object,
                    "callable" => DocKind::Callable,
                    _ => DocKind::Ident,
                };
                make(kind, name)
            }
            _ => {
                self.bump();
                make(DocKind::Other, c.to_string())
            }
        }
    }

    fn scan_ident(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            let ok = c == '_'
                || c.is_ascii_alphabetic()
                || c as u32 >= 0x80
                || (!name.is_empty() && c.is_ascii_digit());
            if !ok {
                break;
            }
            self.bump();
            name.push(c);
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::{DocKind::*, DocScanner};

    #[test]
    fn scans_a_param_tag_line() {
        let mut sc = DocScanner::new("/** @param ?int $x The x. */");
        let mut kinds = Vec::new();
        loop {
            let tok = sc.next();
            if tok.kind == Eof {
                break;
            }
            kinds.push((tok.kind, tok.text));
        }
        assert_eq!(
            kinds,
            vec![
                (OpenDoc, "/**".to_string()),
                (Whitespace, " ".to_string()),
                (Tag, "@param".to_string()),
                (Whitespace, " ".to_string()),
                (Qmark, "?".to_string()),
                (Ident, "int".to_string()),
                (Whitespace, " ".to_string()),
                (Var, "$x".to_string()),
                (Whitespace, " ".to_string()),
                (Ident, "The".to_string()),
                (Whitespace, " ".to_string()),
                (Ident, "x".to_string()),
                (Other, ".".to_string()),
                (Whitespace, " ".to_string()),
                (CloseDoc, "*/".to_string()),
            ]
        );
    }

    #[test]
    fn hyphenated_tags_scan_as_one_token() {
        let mut sc = DocScanner::new("@property-read @phpstan-type");
        assert_eq!(sc.next().text, "@property-read");
        sc.next();
        assert_eq!(sc.next().text, "@phpstan-type");
    }

    #[test]
    fn this_and_keywords_get_their_own_kinds() {
        let mut sc = DocScanner::new("$this $var static array object callable");
        let kinds: Vec<_> = std::iter::from_fn(|| {
            let tok = sc.next();
            (tok.kind != Eof).then_some(tok.kind)
        })
        .filter(|k| *k != Whitespace)
        .collect();
        assert_eq!(kinds, vec![This, Var, Static, Array, Object, Callable]);
    }

    #[test]
    fn positions_are_relative_to_the_comment() {
        let mut sc = DocScanner::new("/**\n * @param\n */");
        let mut tags = Vec::new();
        loop {
            let tok = sc.next();
            if tok.kind == Eof {
                break;
            }
            if tok.kind == Tag {
                tags.push((tok.line, tok.column));
            }
        }
        assert_eq!(tags, vec![(2, 4)]);
    }
}
