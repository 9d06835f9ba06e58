//! The fixed operator precedence ladder.
//!
//! One table serves two masters: the pretty-printer parenthesises by it, and
//! the parser's mixed-precedence warning (`a & b == c`) consults it to spot
//! relational operands of bitwise operators.

use crate::ast::{BinOp, ExprKind};

/// Precedence levels, loosest binding first. `==` and `<` share [`Prec::Rel`]
/// by design; the warning machinery exists because of that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Prec {
    Zero,
    Expr,
    Assign,
    Cond,
    OrOr,
    AndAnd,
    Or,
    Xor,
    And,
    Rel,
    Shift,
    Add,
    Mul,
    Pow,
    Unary,
    Postfix,
    Primary,
}

/// Precedence of a binary operator.
pub fn binop_prec(op: BinOp) -> Prec {
    match op {
        BinOp::OrOr => Prec::OrOr,
        BinOp::AndAnd => Prec::AndAnd,
        BinOp::Or => Prec::Or,
        BinOp::Xor => Prec::Xor,
        BinOp::And => Prec::And,
        BinOp::Equal
        | BinOp::NotEqual
        | BinOp::Identity
        | BinOp::NotIdentity
        | BinOp::In
        | BinOp::NotIn
        | BinOp::Less
        | BinOp::LessEq
        | BinOp::Greater
        | BinOp::GreaterEq => Prec::Rel,
        BinOp::Shl | BinOp::Shr | BinOp::Ushr => Prec::Shift,
        BinOp::Add | BinOp::Sub | BinOp::Concat => Prec::Add,
        BinOp::Mul | BinOp::Div | BinOp::Mod => Prec::Mul,
        BinOp::Pow => Prec::Pow,
    }
}

/// Precedence of a whole expression node.
pub fn expr_prec(kind: &ExprKind) -> Prec {
    match kind {
        ExprKind::Comma { .. } => Prec::Expr,
        ExprKind::Assign { .. } | ExprKind::BinAssign { .. } => Prec::Assign,
        ExprKind::Cond { .. } => Prec::Cond,
        ExprKind::Binary { op, .. } => binop_prec(*op),
        ExprKind::Unary { .. } | ExprKind::Cast { .. } | ExprKind::Delete { .. } => Prec::Unary,
        ExprKind::DotId { .. }
        | ExprKind::DotNew { .. }
        | ExprKind::PostInc { .. }
        | ExprKind::PostDec { .. }
        | ExprKind::Call { .. }
        | ExprKind::Index { .. }
        | ExprKind::Slice { .. } => Prec::Postfix,
        ExprKind::Interval { .. } => Prec::Assign,
        _ => Prec::Primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_and_relational_share_a_level() {
        assert_eq!(binop_prec(BinOp::Equal), binop_prec(BinOp::Less));
        assert_eq!(binop_prec(BinOp::Identity), Prec::Rel);
        assert_eq!(binop_prec(BinOp::In), Prec::Rel);
    }

    #[test]
    fn ladder_is_ordered() {
        assert!(Prec::Expr < Prec::Assign);
        assert!(binop_prec(BinOp::OrOr) < binop_prec(BinOp::AndAnd));
        assert!(binop_prec(BinOp::And) < binop_prec(BinOp::Equal));
        assert!(binop_prec(BinOp::Shl) < binop_prec(BinOp::Add));
        assert!(binop_prec(BinOp::Mul) < binop_prec(BinOp::Pow));
        assert!(binop_prec(BinOp::Pow) < Prec::Unary);
    }
}
