//! # Operator Precedence
//!
//! Binding strength of a generated expression. A parent asks for a minimum
//! strength at each operand slot; a child weaker than that gets parentheses.

/// C/C++ precedence levels, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// Slot accepts anything (statement position, call argument list)
    None,
    Comma,
    Assignment,
    Conditional,
    LogicalOr,
    LogicalAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Equality,
    Relational,
    Shift,
    Additive,
    Multiplicative,
    UnaryPrefix,
    UnaryPostfix,
    Member,
    Atomic,
}

impl Precedence {
    /// The next tighter level. Used for the right operand of
    /// non-associative operators such as `-` and `/`.
    pub fn tighter(self) -> Self {
        use Precedence::*;
        match self {
            None => Comma,
            Comma => Assignment,
            Assignment => Conditional,
            Conditional => LogicalOr,
            LogicalOr => LogicalAnd,
            LogicalAnd => BitwiseOr,
            BitwiseOr => BitwiseXor,
            BitwiseXor => BitwiseAnd,
            BitwiseAnd => Equality,
            Equality => Relational,
            Relational => Shift,
            Shift => Additive,
            Additive => Multiplicative,
            Multiplicative => UnaryPrefix,
            UnaryPrefix => UnaryPostfix,
            UnaryPostfix => Member,
            Member | Atomic => Atomic,
        }
    }

    pub fn needs_parens(self, slot: Precedence) -> bool {
        self < slot
    }
}

/// Wrap `code` in parentheses when its precedence is weaker than the slot.
pub fn parenthesize(code: String, order: Precedence, slot: Precedence) -> String {
    if order.needs_parens(slot) {
        format!("({})", code)
    } else {
        code
    }
}
