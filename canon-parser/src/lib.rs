//! Parser for the bounded expression language consumed by the reduction engine.
//!
//! The parser turns a borrowed source string into a spanned AST. It performs **no** algebraic
//! rewriting; canonicalization is the job of the reduction engine in `canon-compute`. The
//! grammar covers integer literals (including `0b` / `0o` / `0x` radix notation), symbols, the
//! infix operators `+ - * / ^`, unary negation, parentheses, function-call syntax such as
//! `conj(x)`, and implicit multiplication (`2a`, `x(x + 1)`).

pub mod parser;
pub mod tokenizer;
