// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The pretty-printer: tree in, normalized token stream out.
//!
//! Emission goes into a retractable buffer of tokens, whitespace marks,
//! and indent marks. Correctness hinges on the peephole operations: the
//! printer frequently looks at and removes the last emitted item before
//! deciding what comes next. Bytes are only produced at the very end,
//! when the buffer is rendered through the column aligner.

mod align;

pub(crate) use self::align::TabAligner;

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use crate::syntax::op::{OpTable, DECL_SENTINEL};
use crate::syntax::{is_fetch_operator, File, Node, Scope, Stmt, TernaryMiddle};
use crate::token::{is_line_comment, Pos, Token, TokenKind};

/// Formatting options as a small bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options(u8);

impl Options {
    /// Add trailing commas in multiline comma-separated scopes.
    pub const TRAILING_COMMA: Options = Options(1);
    /// Align elements in columns using spaces.
    pub const ALIGN_COLUMNS: Options = Options(1 << 1);
    /// PHP 7.4 compatibility: no trailing commas, and the concat
    /// operator keeps its old precedence.
    pub const LEGACY: Options = Options(1 << 2);
    /// The default, "standard" formatting style.
    pub const STANDARD: Options = Options(Self::TRAILING_COMMA.0 | Self::ALIGN_COLUMNS.0);

    pub fn contains(self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Options {
    type Output = Options;
    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

impl BitOrAssign for Options {
    fn bitor_assign(&mut self, rhs: Options) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Options {
    type Output = Options;
    fn bitand(self, rhs: Options) -> Options {
        Options(self.0 & rhs.0)
    }
}

impl BitAndAssign for Options {
    fn bitand_assign(&mut self, rhs: Options) {
        self.0 &= rhs.0;
    }
}

impl Not for Options {
    type Output = Options;
    fn not(self) -> Options {
        Options(!self.0)
    }
}

/// Whitespace marks in the output buffer. Next-column marks turn into
/// aligner cell breaks, or single spaces when alignment is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WsMark {
    NextCol,
    Newline,
    Space,
}

#[derive(Debug)]
enum OutItem {
    Tok(Token),
    Ws(WsMark),
    Indent(i32),
}

/// Pretty-prints a parsed file. Returns the formatted text plus any
/// non-fatal warnings (unknown tokens passed through verbatim).
pub fn print(file: &File, options: Options) -> (String, Vec<String>) {
    let mut options = options;
    if options.contains(Options::LEGACY) {
        options &= !Options::TRAILING_COMMA;
    }
    let mut p = Printer::new(options);
    p.print_file(file);
    let rendered = render(&p.items, options.contains(Options::ALIGN_COLUMNS));
    (rendered, p.warnings)
}

struct Printer {
    config: Options,
    ops: OpTable,
    items: Vec<OutItem>,
    warnings: Vec<String>,

    prev_indent: i32,
    indent: i32,

    align_next_assign: bool,
    remove_next_ws: bool,
    rm_ws_before_paren: bool,

    max_prec: i32,

    scope_kind: TokenKind,
    multiline: bool,
    scope_open: TokenKind,
}

struct TernaryDelta {
    extra: i32,
    continued: bool,
}

impl Printer {
    fn new(config: Options) -> Self {
        Printer {
            ops: OpTable::new(config.contains(Options::LEGACY)),
            config,
            items: Vec::new(),
            warnings: Vec::new(),
            prev_indent: 0,
            indent: 0,
            align_next_assign: false,
            remove_next_ws: false,
            rm_ws_before_paren: false,
            max_prec: 0,
            scope_kind: TokenKind::Illegal,
            multiline: false,
            scope_open: TokenKind::Illegal,
        }
    }

    fn push_ws(&mut self, ws: WsMark) {
        if ws == WsMark::Newline {
            self.remove_last_ws(WsMark::Space);
        }
        self.items.push(OutItem::Ws(ws));
    }

    fn push_indent(&mut self, level: i32) {
        self.items.push(OutItem::Indent(level));
    }

    /// Appends a synthetic token with its canonical spelling. EOF prints
    /// nothing.
    fn push_kind(&mut self, kind: TokenKind) {
        if kind == TokenKind::Eof {
            return;
        }
        let text = kind.canonical().unwrap_or_default();
        self.items.push(OutItem::Tok(Token::with_text(kind, text)));
    }

    fn last_token(&self) -> TokenKind {
        for item in self.items.iter().rev() {
            match item {
                OutItem::Ws(_) | OutItem::Indent(_) => continue,
                OutItem::Tok(tok) => return tok.kind,
            }
        }
        TokenKind::Illegal
    }

    fn last_is_token(&self) -> bool {
        matches!(self.items.last(), Some(OutItem::Tok(_)))
    }

    fn just_indented(&self) -> bool {
        matches!(self.items.last(), Some(OutItem::Indent(_)))
    }

    fn remove_last_ws(&mut self, ws: WsMark) -> bool {
        if matches!(self.items.last(), Some(OutItem::Ws(last)) if *last == ws) {
            self.items.pop();
            return true;
        }
        false
    }

    fn remove_last_indent(&mut self, level: i32) -> bool {
        if matches!(self.items.last(), Some(OutItem::Indent(last)) if *last == level) {
            self.items.pop();
            return true;
        }
        false
    }

    fn remove_last_kind(&mut self, kind: TokenKind) -> Option<Token> {
        if matches!(self.items.last(), Some(OutItem::Tok(tok)) if tok.kind == kind) {
            match self.items.pop() {
                Some(OutItem::Tok(tok)) => Some(tok),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Pops trailing whitespace and indent marks. If that exposes a line
    /// comment, a newline and indent are restored and `true` returned.
    fn remove_any_ws(&mut self) -> bool {
        while let Some(last) = self.items.last() {
            match last {
                OutItem::Ws(_) | OutItem::Indent(_) => {
                    self.items.pop();
                }
                OutItem::Tok(tok) => {
                    if is_line_comment(tok) {
                        self.push_ws(WsMark::Newline);
                        self.push_indent(self.indent);
                        return true;
                    }
                    return false;
                }
            }
        }
        false
    }

    fn print_file(&mut self, file: &File) {
        if let Some(pre) = &file.preamble {
            let mut pre = pre.clone();
            pre.text = pre.text.trim_start_matches([' ', '\t', '\n']).to_string();
            self.print_token(&pre);
        }
        self.print_scope(&file.scope);
        let fixed = self.remove_any_ws();
        if let Some(mut tail) = self.remove_last_kind(TokenKind::InlineHtml) {
            tail.text = tail.text.trim_end_matches([' ', '\t', '\n']).to_string();
            self.print_token(&tail);
        }
        if !fixed {
            self.push_ws(WsMark::Newline);
        }
    }

    fn print_node(&mut self, node: &Node) -> TernaryDelta {
        match node {
            Node::Tok(tok) => {
                self.print_token(tok);
                TernaryDelta {
                    extra: 0,
                    continued: false,
                }
            }
            Node::Scope(scope) => {
                self.print_scope(scope);
                TernaryDelta {
                    extra: 0,
                    continued: false,
                }
            }
            Node::Ternary(tm) => self.print_ternary(tm, false),
        }
    }

    fn print_scope(&mut self, scope: &Scope) {
        use TokenKind::*;
        match scope.open {
            Lparen => match self.last_token() {
                Rparen | Rbrack | Declare | Class | Function | Fn => {
                    self.remove_any_ws();
                }
                _ => {}
            },
            Lbrack => match self.last_token() {
                Rparen | Rbrack => {
                    self.remove_last_ws(WsMark::Space);
                }
                _ => {}
            },
            Lbrace => {
                // For implicit blocks, do nothing.
                if scope.kind != Lbrace {
                    let nl = self.remove_any_ws();
                    match scope.kind {
                        Arrow | DoubleColon => {}
                        OpenTag | Class | Interface | Trait | Enum | Function => {
                            if !nl {
                                self.push_ws(WsMark::Newline);
                                self.push_indent(self.indent);
                            }
                            self.align_next_assign = false;
                        }
                        _ => self.push_ws(WsMark::Space),
                    }
                }
            }
            _ => {}
        }
        if scope.open != Lbrace && self.rm_ws_before_paren {
            self.remove_last_ws(WsMark::Space);
        }
        self.push_kind(scope.open);
        if let Some(tag) = &scope.comment_tag {
            self.push_ws(WsMark::Space);
            self.print_token(tag);
        }
        if scope.open == OpenTag {
            if scope.multiline {
                self.push_ws(WsMark::Newline);
            } else {
                self.push_ws(WsMark::NextCol);
            }
        }
        if scope.indented {
            self.indent += 1;
        }
        if scope.multiline && !scope.stmts.is_empty() {
            self.push_ws(WsMark::Newline);
            self.push_indent(self.indent);
        } else if scope.is_oneliner() {
            self.push_ws(WsMark::Space);
        }

        let saved_multiline = self.multiline;
        let saved_kind = self.scope_kind;
        let saved_open = self.scope_open;
        self.scope_kind = scope.kind;
        self.multiline = scope.multiline || scope.open == OpenTag;
        self.scope_open = scope.open;
        for stmt in &scope.stmts {
            self.print_stmt(stmt);
        }
        self.multiline = saved_multiline;
        self.scope_kind = saved_kind;
        self.scope_open = saved_open;

        // Prevents blank lines when a branch ends empty.
        self.remove_last_indent(self.indent);
        self.remove_last_ws(WsMark::Newline);
        self.remove_next_ws = false;

        if scope.indented {
            self.indent -= 1;
        }

        if scope.is_oneliner() {
            self.remove_last_ws(WsMark::Space);
            self.push_ws(WsMark::Space);
        } else if scope.multiline || scope.offset_close {
            if self.config.contains(Options::TRAILING_COMMA)
                && scope.fix_comma
                && !scope.stmts.is_empty()
            {
                self.remove_last_ws(WsMark::Space);
                let comment = self.remove_last_kind(Comment);
                self.remove_last_ws(WsMark::Space);
                self.remove_last_ws(WsMark::NextCol);
                self.remove_last_kind(Comma);
                if self.last_is_token() {
                    self.push_kind(Comma);
                }
                if let Some(comment) = comment {
                    self.print_token(&comment);
                }
            }
            self.push_ws(WsMark::Newline);
            self.push_indent(self.indent);
        } else {
            self.remove_last_ws(WsMark::Space);
            self.remove_last_kind(Comma);
        }
        if scope.kind == For && scope.close == Rparen {
            let mut semi1 = self.remove_last_kind(Semicolon);
            let semi2 = self.remove_last_kind(Semicolon);
            if let Some(s2) = semi2 {
                self.remove_last_ws(WsMark::Space);
                if self.remove_last_kind(Lparen).is_some() {
                    // Infinite loops collapse in the K&R-derived style.
                    self.items
                        .push(OutItem::Tok(Token::with_text(Lparen, "(;;")));
                    semi1 = None;
                } else {
                    self.print_token(&s2);
                    self.push_ws(WsMark::Space);
                }
            }
            if let Some(s1) = semi1 {
                self.print_token(&s1);
            }
        }
        self.push_kind(scope.close);
        if (scope.close == Rbrace && !is_fetch_operator(scope.kind))
            || (scope.close == Rparen && scope.kind != OpenTag)
        {
            self.push_ws(WsMark::Space);
        }
        self.rm_ws_before_paren = false;
    }

    fn print_ternary(&mut self, tm: &TernaryMiddle, stmt_already_indented: bool) -> TernaryDelta {
        use TokenKind::*;
        let mut delta = TernaryDelta {
            extra: 0,
            continued: false,
        };
        self.remove_last_ws(WsMark::Space);
        self.push_ws(WsMark::Space);
        self.push_kind(Qmark);
        self.push_ws(WsMark::Space);
        self.rm_ws_before_paren = false;
        let mut has_any = false;
        let mut indented = false;
        for node in &tm.nodes {
            match node {
                Node::Tok(tok) if tok.kind == Whitespace => {
                    if !indented && tok.text.contains('\n') {
                        indented = true;
                        self.indent += 1;
                        delta.extra += 1;
                        delta.continued = true;
                    }
                }
                _ => has_any = true,
            }
            let inner = self.print_node(node);
            delta.extra += inner.extra;
        }
        if stmt_already_indented && self.remove_last_indent(self.indent) {
            self.push_indent(self.indent - 1);
        }
        self.remove_last_ws(WsMark::Space);
        if has_any {
            self.push_ws(WsMark::Space);
        }
        self.push_kind(Colon);
        self.push_ws(WsMark::Space);
        self.rm_ws_before_paren = false;
        delta
    }

    fn print_stmt(&mut self, stmt: &Stmt) {
        use TokenKind::*;
        let mut extra_indented: i32 = 0;
        let mut fat_arrow = false;
        let mut stmt_really_indented = false;
        let mut might_continue = false;
        let mut does_continue = false;
        if stmt.is_label {
            if self.remove_last_indent(self.indent) {
                self.push_indent(self.indent - 1);
            }
            self.indent -= 1;
            extra_indented -= 1;
        }
        let mut max_prec = -1;
        self.max_prec = max_prec;
        let mut stmt_kind = stmt.kind;
        let mut had_special_param_char = false;
        for (index, node) in stmt.nodes.iter().enumerate() {
            if max_prec == -1 {
                if matches!(stmt_kind, Class | Function | Fn) {
                    self.max_prec = DECL_SENTINEL;
                } else {
                    max_prec = self.ops.analyse(&stmt.nodes);
                    self.max_prec = max_prec;
                }
            }
            let mut add_space = false;
            match node {
                Node::Tok(tok) => {
                    let rest = &stmt.nodes[index + 1..];
                    match tok.kind {
                        DoubleArrow | Assign => {
                            // These change how operator spacing is
                            // decided for the rest of the statement.
                            max_prec = -1;
                            stmt_kind = tok.kind;
                        }
                        Colon => {
                            self.remove_last_ws(WsMark::Space);
                        }
                        Not => {
                            // Emphasize that instanceof binds tighter.
                            if self.ops.next_operator_is(rest, Instanceof) {
                                add_space = true;
                            }
                        }
                        At => {
                            // Covers -2 ** 2 and friends; At stands in
                            // for every unary operator here.
                            if self.ops.next_operator_is(rest, Pow) {
                                add_space = true;
                                self.max_prec = self.max_prec.max(2);
                            }
                        }
                        BitAnd | Ellipsis => had_special_param_char = true,
                        Var => {
                            if had_special_param_char && stmt_kind == Function {
                                self.remove_last_ws(WsMark::Space);
                                let ellipsis = self.remove_last_kind(Ellipsis);
                                self.remove_last_ws(WsMark::Space);
                                let amp = self.remove_last_kind(BitAnd);
                                self.remove_last_ws(WsMark::Space);
                                if self.last_token() != Lparen {
                                    self.push_ws(WsMark::Space);
                                }
                                if let Some(mut amp) = amp {
                                    // Disguised so no blank follows it.
                                    amp.kind = At;
                                    self.print_token(&amp);
                                }
                                if let Some(ellipsis) = ellipsis {
                                    self.print_token(&ellipsis);
                                }
                            }
                        }
                        _ => {}
                    }

                    if !self.multiline {
                        if tok.kind == Whitespace && tok.text.contains('\n') {
                            stmt_really_indented = true;
                        }
                        self.print_token(tok);
                        if add_space {
                            self.push_ws(WsMark::Space);
                        }
                        continue;
                    }
                    match tok.kind {
                        Comment => {
                            if stmt.is_label
                                && is_line_comment(tok)
                                && self.prev_indent > self.indent
                            {
                                self.remove_last_indent(self.indent);
                                self.push_indent(self.indent + 1);
                            }
                        }
                        DocComment => {}
                        Whitespace => {
                            if tok.text.contains('\n') {
                                if fat_arrow {
                                    self.indent += 1;
                                    extra_indented += 1;
                                } else if !does_continue && might_continue {
                                    self.indent += 1;
                                    extra_indented += 1;
                                    does_continue = true;
                                }
                            }
                        }
                        Colon => {
                            might_continue = false;
                            if does_continue {
                                self.indent -= 1;
                                extra_indented -= 1;
                                does_continue = false;
                            }
                        }
                        DoubleArrow => fat_arrow = true,
                        _ => {
                            fat_arrow = false;
                            might_continue = true;
                        }
                    }
                    self.print_token(tok);
                    if add_space {
                        self.push_ws(WsMark::Space);
                    }
                }
                Node::Ternary(tm) => {
                    self.max_prec = self.ops.analyse(&tm.nodes);
                    let already = does_continue || stmt_really_indented;
                    let delta = self.print_ternary(tm, already);
                    extra_indented += delta.extra;
                    if delta.continued {
                        does_continue = true;
                    }
                    max_prec = self.ops.analyse(&stmt.nodes[index..]);
                    self.max_prec = max_prec;
                }
                Node::Scope(scope) => {
                    max_prec = -1;
                    if does_continue && scope.multiline && scope.open == Lbrace {
                        self.indent -= 1;
                        extra_indented -= 1;
                        does_continue = false;
                        might_continue = false;
                    }
                    self.print_scope(scope);
                }
            }
        }
        self.indent -= extra_indented;
        if stmt.is_label {
            self.push_ws(WsMark::Newline);
            self.push_indent(self.indent);
            self.remove_next_ws = true;
        }
        self.align_next_assign = false;
        if matches!(stmt_kind, Namespace | Declare) {
            self.push_ws(WsMark::Newline);
            self.push_ws(WsMark::Newline);
            self.push_indent(self.indent);
            self.remove_next_ws = true;
        }
    }

    fn print_token(&mut self, tok: &Token) {
        use TokenKind::*;
        if tok.kind == Whitespace {
            if let Some(i) = tok.text.rfind('\n') {
                self.prev_indent = tok.text[i + 1..].chars().take_while(|c| *c == '\t').count()
                    as i32;
                if self.remove_next_ws {
                    return;
                }
                if tok.text[..i].contains('\n') {
                    self.push_ws(WsMark::Newline);
                }
                self.push_ws(WsMark::Newline);
                self.push_indent(self.indent);
            } else if !self.remove_next_ws {
                self.remove_last_ws(WsMark::Space);
                // No space after Foo::{$expr}.
                if self.last_token() != Rbrace {
                    self.push_ws(WsMark::Space);
                }
            }
            return;
        }
        self.remove_next_ws = false;
        self.rm_ws_before_paren = false;
        let mut print_space_after = false;
        match tok.kind {
            Illegal => {
                self.warnings.push(format!("unknown token: {:?}", tok.text));
            }
            OpenTag => print_space_after = true,
            Comment => {
                if !is_line_comment(tok) {
                    if !matches!(self.last_token(), Lparen | Lbrack) {
                        self.remove_last_ws(WsMark::Space);
                        self.push_ws(WsMark::Space);
                    }
                    print_space_after = true;
                } else {
                    if tok.text.trim() == "//" && self.last_token() != Comment {
                        // A bare // carries nothing; drop it.
                        return;
                    }
                    self.remove_last_ws(WsMark::Space);
                    if !self.just_indented() {
                        self.push_ws(WsMark::NextCol);
                    }
                }
            }
            If => {
                if self.last_token() == Else {
                    self.remove_any_ws();
                }
            }
            Else | Catch | Finally => {
                if self.last_token() == Rbrace {
                    self.remove_any_ws();
                    self.push_ws(WsMark::Space);
                }
            }
            Use => {
                self.remove_last_ws(WsMark::Space);
                if let Some(rparen) = self.remove_last_kind(Rparen) {
                    self.print_token(&rparen);
                    self.push_ws(WsMark::Space);
                }
            }
            Const | Case => self.align_next_assign = true,
            Static | Private | Protected | Public | Readonly | Final => {
                if tok.kind == Static {
                    self.rm_ws_before_paren = true;
                }
                if self.scope_open == Lbrace {
                    self.align_next_assign = true;
                }
            }
            Assign => {
                self.remove_last_ws(WsMark::Space);
                if self.align_next_assign {
                    self.push_ws(WsMark::NextCol);
                } else if self.scope_kind != Declare {
                    self.push_ws(WsMark::Space);
                }
            }
            DoubleArrow => {
                self.remove_last_ws(WsMark::Space);
                if self.multiline {
                    self.push_ws(WsMark::NextCol);
                } else {
                    self.push_ws(WsMark::Space);
                }
            }
            Semicolon | Comma => {
                self.remove_last_ws(WsMark::Space);
            }
            Backslash => {
                // Keep a leading space only when the previous token is
                // not an identifier (a leading \ in a qualified name).
                if self.remove_last_ws(WsMark::Space) && self.last_token() != Ident {
                    self.push_ws(WsMark::Space);
                }
                self.remove_next_ws = true;
            }
            Arrow | QmarkArrow | DoubleColon => {
                self.remove_last_ws(WsMark::Space);
                self.remove_next_ws = true;
            }
            Qmark | BitNot | At | Not | Dollar | Ellipsis => {
                self.remove_next_ws = true;
            }
            Cast => {
                if matches!(self.last_token(), Ident | Var | Rbrack) {
                    self.remove_last_ws(WsMark::Space);
                }
                if let Some(add) = self.ops.decide_spaces(self.max_prec, tok.kind) {
                    print_space_after = add;
                    self.remove_next_ws = !add;
                }
            }
            Var | Ident => {
                if tok.kind == Var && self.last_token() == Ident {
                    self.remove_last_ws(WsMark::Space);
                    self.push_ws(WsMark::Space);
                }
                self.rm_ws_before_paren = true;
            }
            Inc | Dec => {
                if matches!(self.last_token(), Ident | Var | Rbrack) {
                    self.remove_last_ws(WsMark::Space);
                } else {
                    self.remove_next_ws = true;
                }
            }
            _ => {
                if let Some(add) = self.ops.decide_spaces(self.max_prec, tok.kind) {
                    self.remove_last_ws(WsMark::Space);
                    if add {
                        self.push_ws(WsMark::Space);
                        print_space_after = true;
                    } else {
                        self.remove_next_ws = true;
                    }
                } else if spaces_around(tok.kind) {
                    self.remove_last_ws(WsMark::Space);
                    self.push_ws(WsMark::Space);
                }
            }
        }

        let mut out = tok.clone();
        out.pos = Pos::default();
        self.items.push(OutItem::Tok(out));

        match tok.kind {
            Assign if self.scope_kind == Declare => {
                self.remove_next_ws = true;
            }
            Assign | Comma => self.push_ws(WsMark::Space),
            _ => {
                if !self.remove_next_ws && (print_space_after || space_after(tok.kind)) {
                    self.push_ws(WsMark::Space);
                }
            }
        }
    }
}

fn spaces_around(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        As | Implements
            | Instanceof
            | Insteadof
            | Coalesce
            | AddAssign
            | SubAssign
            | MulAssign
            | QuoAssign
            | RemAssign
            | PowAssign
            | AndAssign
            | OrAssign
            | XorAssign
            | ShlAssign
            | ShrAssign
            | ConcatAssign
            | CoalesceAssign
            | And
            | Or
            | Xor
    )
}

fn space_after(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Colon
            | Abstract
            | Case
            | Catch
            | Clone
            | Do
            | DoubleArrow
            | Echo
            | Extends
            | Final
            | Finally
            | For
            | Foreach
            | From
            | Function
            | Global
            | If
            | Match
            | Namespace
            | New
            | Print
            | Private
            | Protected
            | Public
            | Readonly
            | Return
            | Semicolon
            | Static
            | Switch
            | Throw
            | Try
            | Use
            | While
            | Yield
    ) || spaces_around(kind)
}

/// Renders the output buffer. Blocks for column alignment are delimited
/// by indent-level changes and tokens containing newlines; whitespace
/// marks directly after an indent mark are dropped, except newlines.
fn render(items: &[OutItem], align: bool) -> String {
    let mut w = TabAligner::new();
    let mut just_indented = false;
    let mut prev_indent = 0i32;
    for item in items {
        match item {
            OutItem::Tok(tok) => {
                just_indented = false;
                if tok.text.contains('\n') {
                    w.flush();
                }
                w.text(&tok.text);
            }
            OutItem::Indent(level) => {
                just_indented = true;
                if *level != prev_indent {
                    prev_indent = *level;
                    w.flush();
                }
                for _ in 0..*level {
                    w.text("\t");
                }
            }
            OutItem::Ws(ws) => {
                let mut ws = *ws;
                if ws == WsMark::NextCol && !align {
                    ws = WsMark::Space;
                }
                if !just_indented || ws == WsMark::Newline {
                    match ws {
                        WsMark::Newline => w.newline(),
                        WsMark::Space => w.text(" "),
                        WsMark::NextCol => w.cell_break(),
                    }
                }
            }
        }
    }
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::{print, Options};
    use crate::syntax::parse;

    fn fmt(src: &str) -> String {
        fmt_opts(src, Options::STANDARD)
    }

    fn fmt_opts(src: &str, options: Options) -> String {
        let file = parse(src, options.contains(Options::LEGACY)).expect("parse");
        let (out, warnings) = print(&file, options);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        out
    }

    #[test]
    fn operator_spacing_follows_the_loosest_operator() {
        assert_eq!(fmt("<?php\necho $a+$b * $c;\n"), "<?php\n\necho $a + $b*$c;\n");
    }

    #[test]
    fn single_level_operators_keep_spaces() {
        assert_eq!(fmt("<?php\n$x = $a+$b;\n"), "<?php\n\n$x = $a + $b;\n");
    }

    #[test]
    fn brace_blocks_expand_to_multiple_lines() {
        assert_eq!(
            fmt("<?php\nif($x){echo 1;}\n"),
            "<?php\n\nif ($x) {\n\techo 1;\n}\n"
        );
    }

    #[test]
    fn infinite_for_loops_collapse() {
        assert_eq!(
            fmt("<?php\nfor(;;) {break;}\n"),
            "<?php\n\nfor (;;) {\n\tbreak;\n}\n"
        );
    }

    #[test]
    fn one_line_arrays_lose_trailing_commas() {
        assert_eq!(fmt("<?php\n$a = [1,2,3,];\n"), "<?php\n\n$a = [1, 2, 3];\n");
    }

    #[test]
    fn multiline_arrays_gain_trailing_commas() {
        assert_eq!(
            fmt("<?php\n$a = [\n1,\n2\n];\n"),
            "<?php\n\n$a = [\n\t1,\n\t2,\n];\n"
        );
    }

    #[test]
    fn legacy_mode_stops_adding_trailing_commas() {
        assert_eq!(
            fmt_opts(
                "<?php\n$a = [\n1,\n2\n];\n",
                Options::STANDARD | Options::LEGACY
            ),
            "<?php\n\n$a = [\n\t1,\n\t2\n];\n"
        );
    }

    #[test]
    fn assignment_columns_align_in_declaration_blocks() {
        assert_eq!(
            fmt("<?php\nclass C {\nconst X = 1;\nconst LONGER = 2;\n}\n"),
            "<?php\n\nclass C\n{\n\tconst X      = 1;\n\tconst LONGER = 2;\n}\n"
        );
    }

    #[test]
    fn alignment_collapses_to_single_spaces_when_disabled() {
        assert_eq!(
            fmt_opts(
                "<?php\nclass C {\nconst X = 1;\nconst LONGER = 2;\n}\n",
                Options::TRAILING_COMMA
            ),
            "<?php\n\nclass C\n{\n\tconst X = 1;\n\tconst LONGER = 2;\n}\n"
        );
    }

    #[test]
    fn named_function_braces_go_on_their_own_line() {
        assert_eq!(
            fmt("<?php\nfunction foo() { return 1; }\n"),
            "<?php\n\nfunction foo()\n{\n\treturn 1;\n}\n"
        );
    }

    #[test]
    fn member_access_is_set_solid() {
        assert_eq!(
            fmt("<?php\n$a -> b() :: c;\n"),
            "<?php\n\n$a->b()::c;\n"
        );
    }

    #[test]
    fn else_sticks_to_the_closing_brace() {
        assert_eq!(
            fmt("<?php\nif ($x) {\n1;\n}\nelse {\n2;\n}\n"),
            "<?php\n\nif ($x) {\n\t1;\n} else {\n\t2;\n}\n"
        );
    }

    #[test]
    fn else_if_and_elseif_normalize_to_the_same_spelling() {
        let want = "<?php\n\nif ($x) {\n\t1;\n} elseif ($y) {\n\t2;\n}\n";
        assert_eq!(fmt("<?php\nif ($x) {\n1;\n} elseif ($y) {\n2;\n}\n"), want);
        assert_eq!(fmt("<?php\nif ($x) {\n1;\n} else if ($y) {\n2;\n}\n"), want);
    }

    #[test]
    fn casts_bind_tightly_to_their_operand() {
        assert_eq!(fmt("<?php\n$a = (int) $b;\n"), "<?php\n\n$a = (int) $b;\n");
    }

    #[test]
    fn ternary_middles_keep_balanced_spaces() {
        assert_eq!(
            fmt("<?php\n$a = $b?1:2;\n"),
            "<?php\n\n$a = $b ? 1 : 2;\n"
        );
    }

    #[test]
    fn elvis_operator_stays_solid() {
        assert_eq!(fmt("<?php\n$a = $b?:2;\n"), "<?php\n\n$a = $b ?: 2;\n");
    }

    #[test]
    fn namespace_gets_a_blank_line() {
        assert_eq!(
            fmt("<?php\nnamespace A;\n$x = 1;\n"),
            "<?php\n\nnamespace A;\n\n$x = 1;\n"
        );
    }

    #[test]
    fn declare_assignment_stays_tight() {
        assert_eq!(
            fmt("<?php\ndeclare(strict_types = 1);\n$x = 1;\n"),
            "<?php\n\ndeclare(strict_types=1);\n\n$x = 1;\n"
        );
    }

    #[test]
    fn switch_labels_deindent_to_the_brace_level() {
        assert_eq!(
            fmt("<?php\nswitch ($x) {\ncase 1:\nbreak;\ndefault:\nbreak;\n}\n"),
            "<?php\n\nswitch ($x) {\ncase 1:\n\tbreak;\ndefault:\n\tbreak;\n}\n"
        );
    }

    #[test]
    fn no_output_line_ends_with_whitespace() {
        let out = fmt(
            "<?php\nclass C {\nconst X = 1;\n\npublic function f($a,$b) { return $a; }\n}\n",
        );
        for line in out.lines() {
            assert_eq!(line.trim_end(), line, "trailing whitespace in {line:?}");
        }
    }

    #[test]
    fn unknown_tokens_pass_through_with_a_warning() {
        let file = parse("<?php\n$a = 1 ` 2;\n", false).expect("parse");
        let (out, warnings) = print(&file, Options::STANDARD);
        assert!(out.contains('`'));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("unknown token"));
    }
}
