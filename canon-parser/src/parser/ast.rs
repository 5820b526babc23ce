//! The spanned abstract syntax tree produced by the parser.
//!
//! The AST mirrors the source text; it is intentionally not canonical. `a - b`, `-a`, and `a / b`
//! survive as distinct nodes so the reduction engine can decide how to rewrite them.

use std::ops::Range;

/// The digits used by radix literals, from lowest to highest value.
pub const DIGITS: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7',
    '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

/// An integer literal written in decimal, such as `144`.
#[derive(Debug, Clone, PartialEq)]
pub struct LitInt {
    /// The digits of the integer, as they appeared in the source.
    pub value: String,

    /// The region of the source code that this literal was parsed from.
    pub span: Range<usize>,
}

/// An integer literal written in a non-decimal base, such as `0xff` or `0b101`.
#[derive(Debug, Clone, PartialEq)]
pub struct LitRadix {
    /// The base of the literal: 2, 8, or 16.
    pub base: u8,

    /// The digits of the literal, without the base prefix.
    pub value: String,

    /// The region of the source code that this literal was parsed from.
    pub span: Range<usize>,
}

/// A symbol, such as `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct LitSym {
    /// The name of the symbol.
    pub name: String,

    /// The region of the source code that this symbol was parsed from.
    pub span: Range<usize>,
}

/// A literal value in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A decimal integer, such as `2` or `144`.
    Integer(LitInt),

    /// An integer in radix notation, such as `0xff`.
    Radix(LitRadix),

    /// A symbol, such as `x` or `y`.
    Symbol(LitSym),
}

impl Literal {
    /// Returns the span of the literal.
    pub fn span(&self) -> Range<usize> {
        match self {
            Literal::Integer(int) => int.span.clone(),
            Literal::Radix(radix) => radix.span.clone(),
            Literal::Symbol(sym) => sym.span.clone(),
        }
    }
}

/// A parenthesized expression, such as `(a + b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Paren {
    /// The expression inside the parentheses.
    pub inner: Box<Expr>,

    /// The region of the source code that this expression was parsed from, including the
    /// parentheses.
    pub span: Range<usize>,
}

/// The kind of a unary operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOpKind {
    /// Negation (`-`).
    Neg,
}

/// A unary operator with its span.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    /// The kind of operator.
    pub kind: UnaryOpKind,

    /// The region of the source code that this operator was parsed from.
    pub span: Range<usize>,
}

/// A unary expression, such as `-x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    /// The operator of the unary expression.
    pub op: UnaryOp,

    /// The operand of the unary expression.
    pub operand: Box<Expr>,

    /// The region of the source code that this expression was parsed from.
    pub span: Range<usize>,
}

/// The kind of a binary operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOpKind {
    /// Addition (`+`).
    Add,

    /// Subtraction (`-`).
    Sub,

    /// Multiplication (`*`).
    Mul,

    /// Division (`/`).
    Div,

    /// Exponentiation (`^`).
    Exp,
}

impl BinOpKind {
    /// Returns the precedence of the binary operator.
    pub fn precedence(self) -> Precedence {
        match self {
            BinOpKind::Add | BinOpKind::Sub => Precedence::Term,
            BinOpKind::Mul | BinOpKind::Div => Precedence::Factor,
            BinOpKind::Exp => Precedence::Exp,
        }
    }

    /// Returns the associativity of the binary operator.
    pub fn associativity(self) -> Associativity {
        match self {
            BinOpKind::Exp => Associativity::Right,
            _ => Associativity::Left,
        }
    }
}

/// A binary operator with its span.
#[derive(Debug, Clone, PartialEq)]
pub struct BinOp {
    /// The kind of operator.
    pub kind: BinOpKind,

    /// True if the operator was implied by adjacency, as in `2a`.
    pub implicit: bool,

    /// The region of the source code that this operator was parsed from. Empty for implicit
    /// operators.
    pub span: Range<usize>,
}

/// A binary expression, such as `1 + 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    /// The left-hand side of the binary expression.
    pub lhs: Box<Expr>,

    /// The operator of the binary expression.
    pub op: BinOp,

    /// The right-hand side of the binary expression.
    pub rhs: Box<Expr>,

    /// The region of the source code that this expression was parsed from.
    pub span: Range<usize>,
}

/// A function call, such as `conj(x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// The name of the function.
    pub name: LitSym,

    /// The arguments of the call.
    pub args: Vec<Expr>,

    /// The region of the source code that this call was parsed from.
    pub span: Range<usize>,
}

/// An expression in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),

    /// A parenthesized expression.
    Paren(Paren),

    /// A unary expression.
    Unary(Unary),

    /// A binary expression.
    Binary(Binary),

    /// A function call.
    Call(Call),
}

impl Expr {
    /// Returns the span of the expression.
    pub fn span(&self) -> Range<usize> {
        match self {
            Expr::Literal(literal) => literal.span(),
            Expr::Paren(paren) => paren.span.clone(),
            Expr::Unary(unary) => unary.span.clone(),
            Expr::Binary(binary) => binary.span.clone(),
            Expr::Call(call) => call.span.clone(),
        }
    }

    /// Strips any number of enclosing parentheses, returning the innermost expression.
    pub fn innermost(&self) -> &Expr {
        match self {
            Expr::Paren(paren) => paren.inner.innermost(),
            expr => expr,
        }
    }
}

/// The associativity of a binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Associativity {
    /// `a op b op c` is evaluated as `(a op b) op c`.
    Left,

    /// `a op b op c` is evaluated as `a op (b op c)`.
    Right,
}

/// The precedence of an operation, in order from lowest precedence (evaluated last) to highest
/// precedence (evaluated first).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precedence {
    /// Any precedence.
    Any,

    /// Precedence of addition (`+`) and subtraction (`-`), which separate terms.
    Term,

    /// Precedence of multiplication (`*`) and division (`/`), which separate factors.
    Factor,

    /// Precedence of unary negation (`-`).
    Neg,

    /// Precedence of exponentiation (`^`).
    Exp,
}

impl PartialOrd for Precedence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let left = *self as u8;
        let right = *other as u8;
        left.partial_cmp(&right)
    }
}
