// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use std::fmt;

use crate::token::{is_line_comment, Scanner, Token, TokenKind};

use super::{can_use_as_cast, is_fetch_operator, File, Node, Scope, Stmt, TernaryMiddle};

/// A parse or scan failure with the position it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line:{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// Parses a single PHP file. Only the first error is reported; the
/// scanner and parser both stop at it.
pub fn parse(src: &str, legacy: bool) -> Result<File, SyntaxError> {
    let mut p = Parser {
        scan: Scanner::new(src, legacy),
        tok: Token::new(TokenKind::Illegal),
        err: None,
    };
    p.next();
    let file = p.parse_file();
    match p.err {
        Some(err) => Err(err),
        None => Ok(file),
    }
}

struct Parser {
    scan: Scanner,
    tok: Token,
    err: Option<SyntaxError>,
}

impl Parser {
    fn next(&mut self) {
        if self.tok.kind == TokenKind::Eof {
            return;
        }
        self.tok = self.scan.next();
        if self.tok.kind == TokenKind::Eof && self.err.is_none() {
            if let Some(err) = self.scan.take_err() {
                self.err = Some(SyntaxError {
                    line: err.pos.line,
                    column: err.pos.column,
                    message: err.message,
                });
            }
        }
    }

    fn got(&mut self, kind: TokenKind) -> bool {
        if self.tok.kind == kind {
            self.next();
            return true;
        }
        false
    }

    fn error(&mut self, message: String) {
        if self.err.is_none() {
            self.err = Some(SyntaxError {
                line: self.tok.pos.line,
                column: self.tok.pos.column,
                message,
            });
            self.tok.kind = TokenKind::Eof;
        }
    }

    fn parse_file(&mut self) -> File {
        let mut preamble = None;
        if self.tok.kind == TokenKind::InlineHtml {
            preamble = Some(self.tok.clone());
            self.next();
        }
        if !self.got(TokenKind::OpenTag) {
            self.error(format!("expecting <?php, found {}", self.tok));
            return File {
                preamble,
                scope: Scope::new(TokenKind::Illegal, TokenKind::OpenTag),
            };
        }
        let mut scope = self.parse_scope(TokenKind::Illegal, TokenKind::OpenTag);
        scope.indented = false;
        scope.offset_close = false;
        File { preamble, scope }
    }

    fn parse_scope(&mut self, kind: TokenKind, open: TokenKind) -> Scope {
        let mut s = Scope::new(kind, open);
        match open {
            TokenKind::OpenTag => s.close = TokenKind::Eof,
            TokenKind::Lbrace => {
                s.close = TokenKind::Rbrace;
                if kind == TokenKind::Match {
                    s.fix_comma = true;
                }
            }
            TokenKind::Lparen => {
                s.close = TokenKind::Rparen;
                if matches!(kind, TokenKind::Ident | TokenKind::Var | TokenKind::Function) {
                    s.fix_comma = true;
                }
            }
            TokenKind::Lbrack => {
                s.close = TokenKind::Rbrack;
                s.fix_comma = true;
            }
            _ => {
                self.error(format!("unknown pair for {open}"));
                return s;
            }
        }

        if self.tok.kind == TokenKind::Whitespace {
            s.multiline = self.tok.text.contains('\n');
            self.next();
        }
        if !s.multiline && is_line_comment(&self.tok) {
            s.comment_tag = Some(self.tok.clone());
            self.next();
            self.got(TokenKind::Whitespace);
            s.multiline = true;
        }

        let sep = if s.fix_comma {
            TokenKind::Comma
        } else {
            TokenKind::Semicolon
        };
        loop {
            let mut stmt = self.parse_stmt(&[sep]);
            let tsep = self.tok.clone();
            if self.got(sep) {
                stmt.nodes.push(Node::Tok(tsep));
            }
            let has_nodes = !stmt.nodes.is_empty();
            if has_nodes {
                if self.tok.kind == TokenKind::Whitespace && !self.tok.text.contains('\n') {
                    self.next();
                    // Attach a trailing same-line comment.
                    if is_line_comment(&self.tok) {
                        stmt.nodes.push(Node::Tok(self.tok.clone()));
                        self.next();
                    }
                }
            }
            if s.open != TokenKind::Lbrace {
                stmt.is_label = false;
            }
            if stmt.multiline {
                s.indented = true;
            }
            if s.open == TokenKind::Lparen && s.kind == TokenKind::Function {
                stmt.kind = TokenKind::Function;
            } else if s.open == TokenKind::Lbrace && s.kind == TokenKind::Class {
                stmt.kind = TokenKind::Class;
            }
            let trailing_newline = stmt.trailing_newline;
            if has_nodes {
                s.stmts.push(stmt);
            }

            match self.tok.kind {
                k if k == s.close => {
                    s.offset_close = s.indented && trailing_newline;
                    self.next();
                    break;
                }
                TokenKind::Eof
                | TokenKind::Rparen
                | TokenKind::Rbrace
                | TokenKind::Rbrack => {
                    self.error(format!("unexpected {}", self.tok.kind));
                    break;
                }
                _ => {}
            }
        }

        if s.open == TokenKind::Lbrace
            && s.kind != TokenKind::Fn
            && (s.stmts.is_empty() || !is_fetch_operator(s.kind))
        {
            s.multiline = true;
        }
        if s.multiline {
            s.indented = true;
        }
        s
    }

    fn parse_stmt(&mut self, separators: &[TokenKind]) -> Stmt {
        use TokenKind::*;
        let mut s = Stmt::default();
        let mut next_scope = OpenTag;
        loop {
            if self.tok.kind.is_keyword() {
                if matches!(s.last_tok(), Arrow | DoubleColon | Function | Const) {
                    self.tok.kind = Ident;
                }
            }
            let kind = self.tok.kind;
            match kind {
                Eof | Rparen | Rbrace | Rbrack => {
                    if let Some(Node::Tok(tok)) = s.nodes.last() {
                        if tok.kind == Whitespace {
                            let had_newline = tok.text.contains('\n');
                            s.nodes.pop();
                            s.trailing_newline = had_newline;
                        }
                    }
                    return s;
                }
                OpenTag => {
                    s.nodes.push(Node::Tok(self.tok.clone()));
                    self.next();
                    return s;
                }
                Declare | Namespace | Class | Interface | Trait | Enum | Function | Fn | If
                | Else | Switch | Match | For | Foreach | Do | While | Try | Catch | Finally
                | Hash | Arrow | DoubleColon => {
                    next_scope = kind;
                    if s.kind == Illegal {
                        s.kind = kind;
                    }
                    s.nodes.push(Node::Tok(self.tok.clone()));
                    self.next();
                }
                Lparen => {
                    let mut scope_kind = next_scope;
                    for node in s.nodes.iter().rev() {
                        let Node::Tok(tok) = node else { break };
                        match tok.kind {
                            Whitespace => continue,
                            Echo | Print | Static => scope_kind = Ident,
                            Ident | Var => {
                                if next_scope != Function {
                                    scope_kind = tok.kind;
                                }
                            }
                            Class | Function => {
                                // Anonymous declarations keep { on the
                                // same line.
                                next_scope = Fn;
                            }
                            _ => {}
                        }
                        break;
                    }
                    self.next();
                    let sub = self.parse_scope(scope_kind, Lparen);
                    if sub.close == Rparen && sub.stmts.len() == 1 {
                        let inner = &sub.stmts[0];
                        if inner.nodes.len() == 1 {
                            if let Node::Tok(tok) = &inner.nodes[0] {
                                if can_use_as_cast(tok) {
                                    s.nodes.push(Node::Tok(Token::with_text(
                                        Cast,
                                        format!("({})", tok.text),
                                    )));
                                    continue;
                                }
                            }
                        }
                    }
                    s.nodes.push(Node::Scope(sub));
                }
                Lbrace | Lbrack => {
                    if s.kind == Illegal {
                        s.kind = kind;
                    }
                    self.next();
                    let sub = self.parse_scope(next_scope, kind);
                    let sub_kind = sub.kind;
                    s.nodes.push(Node::Scope(sub));
                    if kind == Lbrace {
                        // In most cases, } marks the end of a statement.
                        if is_fetch_operator(sub_kind) || sub_kind == Match || sub_kind == Fn {
                            continue;
                        }
                        if sub_kind == Do {
                            if self.tok.kind == Whitespace {
                                self.next();
                            }
                            continue;
                        }
                        return s;
                    } else if s.kind == Hash {
                        return s;
                    }
                }
                Qmark => {
                    let qmark = self.tok.clone();
                    self.next();
                    let middle = self.parse_stmt(&[Colon, Semicolon, Comma]);
                    if self.got(Colon) {
                        s.nodes.push(Node::Ternary(TernaryMiddle {
                            nodes: middle.nodes,
                        }));
                    } else {
                        // Not a ternary after all (e.g. a nullable type).
                        s.nodes.push(Node::Tok(qmark));
                        s.nodes.extend(middle.nodes);
                    }
                }
                Colon => {
                    if separators.contains(&Colon) {
                        return s;
                    }
                    // A colon changes the meaning of the previous token:
                    // foo(return: true) passes a named argument, and
                    // default: is a kind of a label anyway.
                    for node in s.nodes.iter_mut().rev() {
                        let Node::Tok(tok) = node else { break };
                        if tok.kind == Whitespace {
                            continue;
                        }
                        if tok.kind.is_keyword() {
                            tok.kind = Ident;
                        }
                        break;
                    }
                    s.nodes.push(Node::Tok(self.tok.clone()));
                    self.next();
                    for node in &s.nodes {
                        let Node::Tok(tok) = node else { break };
                        match tok.kind {
                            Whitespace | Comment => continue,
                            Ident | Case => s.is_label = true,
                            _ => {}
                        }
                        break;
                    }
                    if s.is_label {
                        return s;
                    }
                }
                BitAnd | Add | Sub => {
                    let last = s.last_tok();
                    if last == Illegal || last == Colon || last.is_operator() || last.is_keyword()
                    {
                        // Unary position; re-kind so no space is added.
                        self.tok.kind = At;
                    }
                    s.nodes.push(Node::Tok(self.tok.clone()));
                    self.next();
                }
                _ => {
                    if kind == Whitespace && self.tok.text.contains('\n') {
                        s.multiline = true;
                    }
                    if separators.contains(&kind) {
                        return s;
                    }
                    s.nodes.push(Node::Tok(self.tok.clone()));
                    self.next();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::syntax::{Node, Scope};
    use crate::token::TokenKind::{self, *};

    fn outer(src: &str) -> Scope {
        let file = parse(src, false).expect("parse");
        file.scope
    }

    fn sub_scopes(nodes: &[Node]) -> Vec<&Scope> {
        nodes
            .iter()
            .filter_map(|n| match n {
                Node::Scope(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn brace_blocks_are_always_multiline() {
        let scope = outer("<?php if ($x) {echo 1;}\n");
        let stmt = &scope.stmts[0];
        assert_eq!(stmt.kind, If);
        let subs = sub_scopes(&stmt.nodes);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].open, Lparen);
        assert!(!subs[0].multiline);
        assert_eq!(subs[1].open, Lbrace);
        assert!(subs[1].multiline);
        assert!(subs[1].indented);
    }

    #[test]
    fn call_argument_lists_use_commas() {
        let scope = outer("<?php foo(1, 2);\n");
        let subs = sub_scopes(&scope.stmts[0].nodes);
        assert_eq!(subs[0].kind, Ident);
        assert!(subs[0].fix_comma);
    }

    #[test]
    fn array_literals_use_commas() {
        let scope = outer("<?php $a = [1, 2];\n");
        let subs = sub_scopes(&scope.stmts[0].nodes);
        assert_eq!(subs[0].open, Lbrack);
        assert!(subs[0].fix_comma);
    }

    #[test]
    fn grouping_parens_do_not_use_commas() {
        let scope = outer("<?php $a = ($b + $c);\n");
        let subs = sub_scopes(&scope.stmts[0].nodes);
        assert_eq!(subs[0].open, Lparen);
        assert!(!subs[0].fix_comma);
    }

    #[test]
    fn sole_cast_name_in_parens_folds_into_cast_token() {
        let scope = outer("<?php $a = (int) $b;\n");
        let stmt = &scope.stmts[0];
        let cast = stmt.nodes.iter().find_map(|n| match n {
            Node::Tok(t) if t.kind == TokenKind::Cast => Some(t.text.clone()),
            _ => None,
        });
        assert_eq!(cast.as_deref(), Some("(int)"));
        assert!(sub_scopes(&stmt.nodes).is_empty());
    }

    #[test]
    fn uppercase_cast_names_are_left_alone() {
        let scope = outer("<?php $a = (INT) $b;\n");
        assert_eq!(sub_scopes(&scope.stmts[0].nodes).len(), 1);
    }

    #[test]
    fn keyword_after_member_access_becomes_ident() {
        let scope = outer("<?php $o->class;\n");
        let stmt = &scope.stmts[0];
        let kinds: Vec<_> = stmt
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Tok(t) => Some(t.kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![Var, Arrow, Ident, Semicolon]);
    }

    #[test]
    fn named_argument_keyword_becomes_ident() {
        let scope = outer("<?php foo(return: true);\n");
        let subs = sub_scopes(&scope.stmts[0].nodes);
        let inner = &subs[0].stmts[0];
        let first = inner.nodes.iter().find_map(|n| match n {
            Node::Tok(t) => Some((t.kind, t.text.clone())),
            _ => None,
        });
        assert_eq!(first, Some((Ident, "return".to_string())));
        assert!(!inner.is_label);
    }

    #[test]
    fn case_statements_become_labels() {
        let scope = outer("<?php switch ($x) {\n\tcase 1:\n\t\tbreak;\n}\n");
        let switch_stmt = &scope.stmts[0];
        let body = sub_scopes(&switch_stmt.nodes)[1];
        assert!(body.stmts[0].is_label);
    }

    #[test]
    fn default_statements_become_labels_too() {
        let scope = outer("<?php switch ($x) {\n\tdefault:\n\t\tbreak;\n}\n");
        let body = sub_scopes(&scope.stmts[0].nodes)[1];
        assert!(body.stmts[0].is_label);
    }

    #[test]
    fn ternary_middle_is_modeled_explicitly() {
        let scope = outer("<?php $a = $b ? 1 : 2;\n");
        let stmt = &scope.stmts[0];
        let has_middle = stmt
            .nodes
            .iter()
            .any(|n| matches!(n, Node::Ternary(_)));
        assert!(has_middle);
    }

    #[test]
    fn nullable_type_qmark_is_flattened_back() {
        let scope = outer("<?php function f(?int $x) {}\n");
        // The ? before int is not a ternary; parsing must succeed and
        // keep the paren scope.
        let stmt = &scope.stmts[0];
        assert_eq!(stmt.kind, Function);
        assert_eq!(sub_scopes(&stmt.nodes).len(), 2);
    }

    #[test]
    fn unary_operators_are_rekinded() {
        let scope = outer("<?php $a = -$b;\n");
        let stmt = &scope.stmts[0];
        let kinds: Vec<_> = stmt
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Tok(t) if t.kind != Whitespace => Some(t.kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![Var, Assign, At, Var, Semicolon]);
    }

    #[test]
    fn class_body_statements_are_marked() {
        let scope = outer("<?php class C {\n\tconst X = 1;\n}\n");
        let body = sub_scopes(&scope.stmts[0].nodes)[0];
        assert_eq!(body.kind, Class);
        assert_eq!(body.stmts[0].kind, Class);
    }

    #[test]
    fn function_params_are_marked() {
        let scope = outer("<?php function f($a, $b) {}\n");
        let params = sub_scopes(&scope.stmts[0].nodes)[0];
        assert_eq!(params.kind, Function);
        assert!(params.fix_comma);
        assert!(params.stmts.iter().all(|st| st.kind == Function));
    }

    #[test]
    fn match_bodies_use_commas() {
        let scope = outer("<?php $x = match ($y) {\n\t1 => 'a',\n\tdefault => 'b',\n};\n");
        let stmt = &scope.stmts[0];
        let body = sub_scopes(&stmt.nodes)
            .into_iter()
            .find(|s| s.open == Lbrace)
            .unwrap();
        assert_eq!(body.kind, Match);
        assert!(body.fix_comma);
    }

    #[test]
    fn attribute_statement_ends_at_bracket() {
        let scope = outer("<?php #[Attr]\nclass C {}\n");
        assert_eq!(scope.stmts[0].kind, Hash);
        assert_eq!(scope.stmts[1].kind, Class);
    }

    #[test]
    fn unexpected_close_is_an_error() {
        let err = parse("<?php }\n", false).unwrap_err();
        assert_eq!(err.to_string(), "line:1:7: unexpected }");
        let err = parse("<?php foo(;\n", false).unwrap_err();
        assert!(err.message.starts_with("unexpected"));
    }

    #[test]
    fn scan_errors_surface_as_syntax_errors() {
        let err = parse("<?php 'oops\n", false).unwrap_err();
        assert_eq!(err.message, "string not terminated");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn missing_open_tag_is_an_error() {
        let err = parse("just text", false).unwrap_err();
        assert!(err.message.starts_with("expecting <?php"));
    }
}
