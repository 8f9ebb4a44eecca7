// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::token::{DocKind, DocScanner, DocToken};
use super::types::{Param, ShapeElem, Type};
use super::{Block, DocError, Line, Tag};

/// Parses one PHPDoc comment.
pub fn parse(src: &str) -> Result<Block, DocError> {
    let mut p = DocParser {
        scan: DocScanner::new(src),
        tok: DocToken {
            kind: DocKind::Other,
            text: String::new(),
            line: 1,
            column: 1,
        },
        prev: None,
        alt: None,
        err: None,
    };
    p.next0();
    let doc = p.parse_doc();
    match p.err {
        Some(err) => Err(err),
        None => Ok(doc),
    }
}

struct DocParser {
    scan: DocScanner,
    tok: DocToken,
    prev: Option<DocToken>,
    alt: Option<DocToken>,
    err: Option<DocError>,
}

impl DocParser {
    fn backup(&mut self) {
        if self.alt.is_some() {
            // Single-token lookahead only.
            return;
        }
        self.alt = Some(self.tok.clone());
        if let Some(prev) = self.prev.take() {
            self.tok = prev;
        }
    }

    fn next0(&mut self) {
        if self.tok.kind == DocKind::Eof {
            return;
        }
        if let Some(alt) = self.alt.take() {
            self.tok = alt;
            return;
        }
        self.tok = self.scan.next();
    }

    /// Like `next0`, but skips a following whitespace token.
    fn next(&mut self) {
        self.prev = Some(self.tok.clone());
        self.next0();
        if self.tok.kind == DocKind::Whitespace {
            self.next0();
        }
    }

    fn expect(&mut self, kind: DocKind) {
        if self.tok.kind != kind {
            self.error(format!("expecting {}, found {}", kind, self.tok));
        }
        self.next();
    }

    fn got(&mut self, kind: DocKind) -> bool {
        if self.tok.kind == kind {
            self.next();
            return true;
        }
        false
    }

    fn error(&mut self, message: String) {
        if self.err.is_none() {
            self.err = Some(DocError {
                line: self.tok.line,
                column: self.tok.column,
                message,
            });
            self.tok.kind = DocKind::Eof;
        }
    }

    fn parse_doc(&mut self) -> Block {
        let mut doc = Block {
            indent: String::new(),
            prefer_oneline: false,
            lines: Vec::new(),
        };
        loop {
            while self.tok.kind == DocKind::Newline {
                self.next0();
            }
            if self.tok.kind != DocKind::Whitespace {
                break;
            }
            doc.indent = self.tok.text.clone();
            self.next0();
        }
        self.expect(DocKind::OpenDoc);
        if !self.got(DocKind::Newline) {
            doc.prefer_oneline = true;
        }
        doc.lines = self.parse_lines();
        self.expect(DocKind::CloseDoc);
        doc
    }

    fn parse_lines(&mut self) -> Vec<Line> {
        let mut lines = Vec::new();
        while self.tok.kind != DocKind::CloseDoc && self.tok.kind != DocKind::Eof {
            lines.push(self.parse_line());
            if !self.got(DocKind::Newline) {
                break;
            }
        }
        lines
    }

    fn parse_line(&mut self) -> Line {
        if self.tok.kind == DocKind::Whitespace {
            self.next0();
        }
        if self.tok.kind == DocKind::Asterisk {
            self.next0();
        }
        if self.tok.kind == DocKind::Whitespace {
            self.next0();
        }
        if self.tok.kind == DocKind::Tag {
            Line::Tag(self.parse_tag())
        } else {
            Line::Text(self.parse_desc())
        }
    }

    fn parse_tag(&mut self) -> Tag {
        let name = self.tok.text.clone();
        self.expect(DocKind::Tag);
        match name.as_str() {
            "@param" => {
                let param = self.parse_param(true);
                let desc = self.parse_desc();
                Tag::Param { param, desc }
            }
            "@return" => {
                let typ = self.parse_type();
                let desc = self.parse_desc();
                Tag::Return { typ, desc }
            }
            "@property" | "@property-read" | "@property-write" => {
                let typ = self.parse_type();
                let var = self.tok.text.trim_start_matches('$').to_string();
                self.expect(DocKind::Var);
                let desc = self.parse_desc();
                Tag::Property {
                    typ,
                    var,
                    read_only: name.ends_with("-read"),
                    write_only: name.ends_with("-write"),
                    desc,
                }
            }
            "@method" => self.parse_method_tag(),
            "@var" => {
                let typ = self.parse_type();
                let mut var = None;
                if self.tok.kind == DocKind::Var {
                    var = Some(self.tok.text.trim_start_matches('$').to_string());
                    self.next();
                }
                let desc = self.parse_desc();
                Tag::Var { typ, var, desc }
            }
            "@throws" => {
                let typ = self.parse_type();
                let desc = self.parse_desc();
                Tag::Throws { typ, desc }
            }
            "@extends" => {
                let typ = self.parse_type();
                let desc = self.parse_desc();
                Tag::Extends { typ, desc }
            }
            "@implements" => {
                let typ = self.parse_type();
                let desc = self.parse_desc();
                Tag::Implements { typ, desc }
            }
            "@uses" => {
                let typ = self.parse_type();
                let desc = self.parse_desc();
                Tag::Uses { typ, desc }
            }
            "@template" => {
                let param = self.tok.text.clone();
                self.expect(DocKind::Ident);
                let mut bound = None;
                if self.tok.kind == DocKind::Ident
                    && (self.tok.text == "of" || self.tok.text == "as")
                {
                    self.next();
                    bound = Some(self.parse_type());
                }
                let desc = self.parse_desc();
                Tag::Template { param, bound, desc }
            }
            "@phpstan-type" => {
                let type_name = self.tok.text.clone();
                self.expect(DocKind::Ident);
                let typ = self.parse_type();
                let desc = self.parse_desc();
                Tag::TypeDef {
                    name: type_name,
                    typ,
                    desc,
                }
            }
            _ => Tag::Other {
                name: name.trim_start_matches('@').to_string(),
                desc: self.parse_desc(),
            },
        }
    }

    fn parse_method_tag(&mut self) -> Tag {
        let is_static = self.got(DocKind::Static);
        let mut result = Some(self.parse_type());
        let mut method = self.tok.text.clone();
        if !self.got(DocKind::Ident) {
            // What looked like the result type may have been the name.
            match result.take() {
                Some(Type::Named { global: false, parts }) if parts.len() == 1 => {
                    method = parts.into_iter().next().unwrap_or_default();
                }
                other => {
                    result = other;
                    self.expect(DocKind::Ident);
                }
            }
        }
        self.expect(DocKind::Lparen);
        let params = self.parse_param_list();
        if self.got(DocKind::Colon) {
            // A result type belongs before the name, not after the params.
            self.error("unexpected :, expecting description".to_string());
        }
        let desc = self.parse_desc();
        Tag::Method {
            is_static,
            result,
            name: method,
            params,
            desc,
        }
    }

    fn parse_param_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        while !self.got(DocKind::Rparen) {
            if self.tok.kind == DocKind::Eof {
                break;
            }
            let mut param = self.parse_param(false);
            if self.got(DocKind::Assign) {
                match self.parse_lit_type() {
                    Some(Type::Literal(value)) => param.default = Some(value),
                    _ => {
                        let found = self.tok.clone();
                        self.error(format!("expecting literal value, found {found}"));
                    }
                }
            }
            params.push(param);
            if self.got(DocKind::Rparen) {
                break;
            }
            self.expect(DocKind::Comma);
            if self.err.is_some() {
                break;
            }
        }
        params
    }

    fn parse_param(&mut self, mut need_var: bool) -> Param {
        let typ = self.parse_type();
        let by_ref = self.got(DocKind::And);
        if by_ref {
            need_var = true;
        }
        let variadic = self.got(DocKind::Ellipsis);
        if variadic {
            need_var = true;
        }
        let mut name = None;
        if self.tok.kind == DocKind::Var {
            name = Some(self.tok.text.trim_start_matches('$').to_string());
            self.next();
        } else if need_var {
            self.expect(DocKind::Var);
        }
        Param {
            typ,
            by_ref,
            variadic,
            name,
            default: None,
        }
    }

    fn parse_type(&mut self) -> Type {
        let typ = self.parse_atomic_type();
        match self.tok.kind {
            DocKind::Or => self.parse_union_type(typ),
            DocKind::And => self.parse_intersect_type(typ),
            _ => typ,
        }
    }

    fn parse_union_type(&mut self, init: Type) -> Type {
        let mut types = vec![init];
        while self.got(DocKind::Or) {
            types.push(self.parse_atomic_type());
        }
        Type::Union(types)
    }

    fn parse_intersect_type(&mut self, init: Type) -> Type {
        let mut types = vec![init];
        while self.got(DocKind::And) {
            match self.try_parse_atomic_type() {
                Some(typ) => types.push(typ),
                None => {
                    // The & belonged to a by-ref parameter.
                    self.backup();
                    break;
                }
            }
        }
        Type::Intersect(types)
    }

    fn parse_atomic_type(&mut self) -> Type {
        match self.try_parse_atomic_type() {
            Some(typ) => typ,
            None => {
                self.error(format!("expecting ( or basic type, found {}", self.tok));
                Type::Literal(String::new())
            }
        }
    }

    fn try_parse_atomic_type(&mut self) -> Option<Type> {
        let mut typ;
        if self.got(DocKind::Lparen) {
            let inner = self.parse_type();
            self.expect(DocKind::Rparen);
            typ = Type::Paren(Box::new(inner));
        } else if self.got(DocKind::This) {
            typ = Type::This;
        } else {
            let nullable = self.got(DocKind::Qmark);
            let mut fetchable = false;
            if self.got(DocKind::Array) {
                typ = self.parse_array_shape();
            } else if self.got(DocKind::Object) {
                typ = self.parse_object_shape();
            } else if self.got(DocKind::Callable) {
                typ = self.parse_callable();
            } else if let Some(named) = self.parse_named_type() {
                typ = named;
                fetchable = true;
            } else if let Some(lit) = self.parse_lit_type() {
                typ = lit;
                fetchable = true;
            } else {
                return None;
            }
            if fetchable && self.tok.kind == DocKind::DoubleColon {
                if nullable {
                    self.error("constant fetch cannot be nullable".to_string());
                    return None;
                }
                typ = self.parse_const_fetch(typ)?;
            } else if self.got(DocKind::Lt) {
                typ = self.parse_generic(typ);
            }
            if nullable {
                typ = Type::Nullable(Box::new(typ));
            }
        }
        while self.got(DocKind::Lbrack) {
            self.expect(DocKind::Rbrack);
            typ = Type::Array(Box::new(typ));
        }
        if self.tok.kind == DocKind::DoubleColon {
            self.error("unexpected ::".to_string());
            return None;
        }
        Some(typ)
    }

    fn parse_const_fetch(&mut self, class: Type) -> Option<Type> {
        self.next(); // ::
        let mut name = self.tok.text.clone();
        match self.tok.kind {
            DocKind::Ident | DocKind::Asterisk => {}
            _ => {
                self.error(format!("unexpected {}, expecting ident", self.tok));
                return None;
            }
        }
        self.next0();
        if name != "*" && self.tok.kind == DocKind::Asterisk {
            name.push('*');
            self.next0();
        }
        if self.tok.kind == DocKind::Whitespace {
            self.next0();
        }
        if self.got(DocKind::Asterisk) {
            self.error(format!("invalid position of *, did you mean to write {name}*?"));
        }
        Some(Type::ConstFetch {
            class: Box::new(class),
            name,
        })
    }

    fn parse_callable(&mut self) -> Type {
        if !self.got(DocKind::Lparen) {
            return Type::Callable {
                params: Vec::new(),
                result: None,
            };
        }
        let params = self.parse_param_list();
        let mut result = None;
        if self.got(DocKind::Colon) {
            result = Some(Box::new(self.parse_type()));
        }
        Type::Callable { params, result }
    }

    fn parse_array_shape(&mut self) -> Type {
        Type::ArrayShape(self.parse_shape_elems(false))
    }

    fn parse_object_shape(&mut self) -> Type {
        Type::ObjectShape(self.parse_shape_elems(true))
    }

    fn parse_shape_elems(&mut self, keys_required: bool) -> Vec<ShapeElem> {
        let mut elems: Vec<ShapeElem> = Vec::new();
        if !self.got(DocKind::Lbrace) {
            return elems;
        }
        loop {
            let mut key = None;
            let mut optional = false;
            match self.tok.kind {
                DocKind::Str | DocKind::Ident | DocKind::Int => {
                    let text = self.tok.text.clone();
                    if keys_required && self.tok.kind != DocKind::Ident {
                        self.error(format!("expecting ident, found {}", self.tok));
                        break;
                    }
                    key = Some(text);
                    self.next();
                    optional = self.got(DocKind::Qmark);
                    if keys_required {
                        self.expect(DocKind::Colon);
                    } else if !self.got(DocKind::Colon) {
                        key = None;
                        self.backup();
                    }
                }
                DocKind::Rbrace if !elems.is_empty() => break, // trailing comma
                _ if keys_required => {
                    self.error(format!("expecting ident, found {}", self.tok));
                    break;
                }
                _ => {}
            }
            let had = self.tok.clone();
            let typ = self.parse_type();
            if self.err.is_some() {
                self.err = None;
                self.error(format!("expecting array shape key, or value; found {had}"));
                break;
            }
            elems.push(ShapeElem { key, optional, typ });
            if !self.got(DocKind::Comma) {
                break;
            }
        }
        self.expect(DocKind::Rbrace);
        elems
    }

    fn parse_generic(&mut self, base: Type) -> Type {
        let mut params = Vec::new();
        loop {
            if !params.is_empty() && self.tok.kind == DocKind::Gt {
                break; // trailing comma
            }
            params.push(self.parse_type());
            if !self.got(DocKind::Comma) {
                break;
            }
        }
        self.expect(DocKind::Gt);
        Type::Generic {
            base: Box::new(base),
            params,
        }
    }

    fn parse_named_type(&mut self) -> Option<Type> {
        match self.tok.kind {
            DocKind::Static => {
                let parts = vec![self.tok.text.clone()];
                self.next();
                Some(Type::Named {
                    global: false,
                    parts,
                })
            }
            DocKind::Backslash | DocKind::Ident => {
                let global = self.got(DocKind::Backslash);
                let mut parts = Vec::new();
                loop {
                    parts.push(self.tok.text.clone());
                    self.expect(DocKind::Ident);
                    if !self.got(DocKind::Backslash) {
                        break;
                    }
                }
                Some(Type::Named { global, parts })
            }
            _ => None,
        }
    }

    fn parse_lit_type(&mut self) -> Option<Type> {
        match self.tok.kind {
            DocKind::Str | DocKind::Int | DocKind::Ident => {
                let value = self.tok.text.clone();
                self.next();
                Some(Type::Literal(value))
            }
            _ => None,
        }
    }

    /// Collects raw text through the end of the line and trims it.
    fn parse_desc(&mut self) -> String {
        let mut desc = String::new();
        loop {
            match self.tok.kind {
                DocKind::Newline | DocKind::CloseDoc | DocKind::Eof => break,
                _ => {
                    desc.push_str(&self.tok.text);
                    self.next0();
                }
            }
        }
        desc.trim().to_string()
    }
}
