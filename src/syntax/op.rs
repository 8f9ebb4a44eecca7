// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operator precedence analysis driving the spacing decisions.
//!
//! Spacing around binary operators is derived from a single scalar per
//! statement: the loosest-binding precedence present. Operators at that
//! level get spaces, tighter ones are set solid.

use std::collections::HashMap;

use crate::syntax::Node;
use crate::token::TokenKind;

// Precedence levels, low binds looser. Comparison and equality are
// collapsed into one level on purpose.
const OP_TABLE: &[(i32, &[TokenKind])] = &[
    (1, &[TokenKind::Pow]),
    (2, &[TokenKind::Cast]),
    (4, &[TokenKind::Not]),
    (5, &[TokenKind::Mul, TokenKind::Quo, TokenKind::Rem]),
    (6, &[TokenKind::Add, TokenKind::Sub]),
    (7, &[TokenKind::Shl, TokenKind::Shr]),
    (8, &[TokenKind::Concat]),
    (
        9,
        &[
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::Leq,
            TokenKind::Geq,
            TokenKind::Eq,
            TokenKind::Neq,
            TokenKind::Identical,
            TokenKind::NotIdentical,
            TokenKind::Spaceship,
        ],
    ),
    (11, &[TokenKind::BitAnd]),
    (12, &[TokenKind::BitXor]),
    (13, &[TokenKind::BitOr]),
    (14, &[TokenKind::AndAnd]),
    (15, &[TokenKind::OrOr]),
    (16, &[TokenKind::Coalesce]),
];

/// Precedence assigned to the low-precedence word operators when they
/// appear next to comparison-or-looser operators.
const LOW_PREC_WORD: i32 = 22;

/// Sentinel above every table level; declaration signatures use it so no
/// table operator gets spaces.
pub(crate) const DECL_SENTINEL: i32 = 17;

/// The compiled precedence map. Legacy mode lowers `.` to the level of
/// `+`/`-`; the override is scoped to this instance.
#[derive(Debug)]
pub(crate) struct OpTable {
    prec: HashMap<TokenKind, i32>,
}

impl OpTable {
    pub fn new(legacy: bool) -> Self {
        let mut prec = HashMap::new();
        for &(level, kinds) in OP_TABLE {
            for &kind in kinds {
                prec.insert(kind, level);
            }
        }
        if legacy {
            prec.insert(TokenKind::Concat, 6);
        }
        OpTable { prec }
    }

    pub fn precedence(&self, kind: TokenKind) -> Option<i32> {
        self.prec.get(&kind).copied()
    }

    /// The maximum operator precedence among `nodes`, stopping at the
    /// first ternary middle. `&&`/`||` are obvious enough to be excluded
    /// so they don't tighten everything else; level 9 likewise.
    pub fn analyse(&self, nodes: &[Node]) -> i32 {
        let mut max = 0;
        let mut has_low_prec = false;
        let mut last = TokenKind::Illegal;
        for node in nodes {
            let tok = match node {
                Node::Ternary(_) => break,
                Node::Scope(_) => {
                    last = TokenKind::Illegal;
                    continue;
                }
                Node::Tok(tok) => tok,
            };
            match tok.kind {
                TokenKind::AndAnd | TokenKind::OrOr => continue,
                TokenKind::And | TokenKind::Or | TokenKind::Xor => {
                    has_low_prec = true;
                    continue;
                }
                _ => {}
            }
            if (tok.kind == TokenKind::Concat && last == TokenKind::Int)
                || (tok.kind == TokenKind::Int && last == TokenKind::Concat)
            {
                // Keep these blanks so adjacent ints aren't fused into
                // a float.
                return self.prec[&TokenKind::Concat];
            }
            if tok.kind != TokenKind::Whitespace {
                last = tok.kind;
            }
            if let Some(prec) = self.precedence(tok.kind) {
                if prec > max && prec != 9 {
                    max = prec;
                }
            }
        }
        if has_low_prec && max > 9 {
            max = LOW_PREC_WORD;
        }
        max
    }

    /// Whether `op` gets spaces under statement maximum `max`; `None` if
    /// `op` isn't a table operator or no maximum has been computed.
    pub fn decide_spaces(&self, max: i32, op: TokenKind) -> Option<bool> {
        if max < 0 {
            return None;
        }
        self.precedence(op).map(|prec| prec >= max)
    }

    /// Looks ahead through one run of non-operator tokens for `want`;
    /// used to spot `!$x instanceof Y` and unary minus before `**`.
    pub fn next_operator_is(&self, nodes: &[Node], want: TokenKind) -> bool {
        for node in nodes {
            let Node::Tok(tok) = node else { break };
            if tok.kind == want {
                return true;
            }
            if self.precedence(tok.kind).is_some() {
                break;
            }
            if tok.kind.is_operator() {
                break;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::OpTable;
    use crate::syntax::Node;
    use crate::token::{Token, TokenKind, TokenKind::*};

    fn nodes(kinds: &[(TokenKind, &str)]) -> Vec<Node> {
        kinds
            .iter()
            .map(|(kind, text)| Node::Tok(Token::with_text(*kind, *text)))
            .collect()
    }

    #[test]
    fn analyse_picks_the_loosest_operator() {
        let ops = OpTable::new(false);
        // $a + $b * $c
        let stmt = nodes(&[(Var, "$a"), (Add, "+"), (Var, "$b"), (Mul, "*"), (Var, "$c")]);
        assert_eq!(ops.analyse(&stmt), 6);
        assert_eq!(ops.decide_spaces(6, Add), Some(true));
        assert_eq!(ops.decide_spaces(6, Mul), Some(false));
    }

    #[test]
    fn logical_and_or_do_not_tighten_others() {
        let ops = OpTable::new(false);
        let stmt = nodes(&[(Var, "$a"), (AndAnd, "&&"), (Var, "$b"), (Add, "+"), (Int, "1")]);
        assert_eq!(ops.analyse(&stmt), 6);
    }

    #[test]
    fn concat_between_ints_keeps_spaces() {
        let ops = OpTable::new(false);
        let stmt = nodes(&[(Int, "1"), (Concat, "."), (Int, "2"), (Mul, "*"), (Int, "3")]);
        assert_eq!(ops.analyse(&stmt), 8);
    }

    #[test]
    fn low_precedence_words_promote_past_comparisons() {
        let ops = OpTable::new(false);
        let stmt = nodes(&[
            (Var, "$a"),
            (Coalesce, "??"),
            (Var, "$b"),
            (And, "and"),
            (Var, "$c"),
        ]);
        assert_eq!(ops.analyse(&stmt), 22);
    }

    #[test]
    fn legacy_mode_lowers_concat() {
        let ops = OpTable::new(true);
        assert_eq!(ops.precedence(Concat), Some(6));
        let modern = OpTable::new(false);
        assert_eq!(modern.precedence(Concat), Some(8));
    }

    #[test]
    fn next_operator_lookahead_stops_at_operators() {
        let ops = OpTable::new(false);
        let rest = nodes(&[(Var, "$x"), (Instanceof, "instanceof"), (Ident, "Foo")]);
        assert!(ops.next_operator_is(&rest, Instanceof));
        let rest = nodes(&[(Var, "$x"), (Add, "+"), (Instanceof, "instanceof")]);
        assert!(!ops.next_operator_is(&rest, Instanceof));
    }
}
