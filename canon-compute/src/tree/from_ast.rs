//! Conversion from the parser's AST into an arena [`Tree`].
//!
//! The conversion is shape-preserving: subtraction, division, and negation survive as their own
//! node kinds so the reduction engine, not the converter, decides how to canonicalize them.

use super::{Kind, NodeId, Tree};
use crate::primitive::{from_str_radix, int_from_str, rat};
use canon_parser::parser::ast::{BinOpKind, Expr as AstExpr, Literal, UnaryOpKind};
use std::{fmt, ops::Range};

/// An error that can occur while converting an AST into a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FromAstError {
    /// A call to a function this engine does not know.
    UnknownFunction {
        /// The name of the function.
        name: String,

        /// The region of the source code the call was parsed from.
        span: Range<usize>,
    },

    /// A known function was called with the wrong number of arguments.
    WrongArity {
        /// The name of the function.
        name: String,

        /// The number of arguments the function takes.
        expected: usize,

        /// The number of arguments that were given.
        found: usize,

        /// The region of the source code the call was parsed from.
        span: Range<usize>,
    },
}

impl fmt::Display for FromAstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFunction { name, .. } => {
                write!(f, "unknown function `{}`", name)
            },
            Self::WrongArity { name, expected, found, .. } => {
                write!(
                    f,
                    "`{}` takes {} argument(s), but {} were given",
                    name, expected, found,
                )
            },
        }
    }
}

impl std::error::Error for FromAstError {}

/// Converts a parsed AST into a new [`Tree`], designating the converted node as its root.
pub fn from_ast(ast: &AstExpr) -> Result<Tree, FromAstError> {
    let mut tree = Tree::new();
    let root = build(&mut tree, ast)?;
    tree.set_root(root);
    Ok(tree)
}

fn build(tree: &mut Tree, ast: &AstExpr) -> Result<NodeId, FromAstError> {
    Ok(match ast {
        AstExpr::Literal(literal) => match literal {
            Literal::Integer(int) => tree.rational(rat(int_from_str(&int.value))),
            Literal::Radix(radix) => {
                tree.based(from_str_radix(&radix.value, radix.base), radix.base)
            },
            Literal::Symbol(sym) => tree.symbol(&sym.name),
        },
        AstExpr::Paren(paren) => build(tree, &paren.inner)?,
        AstExpr::Unary(unary) => match unary.op.kind {
            UnaryOpKind::Neg => {
                let operand = build(tree, &unary.operand)?;
                tree.unary(Kind::Opposite, operand)
            },
        },
        AstExpr::Binary(binary) => {
            let lhs = build(tree, &binary.lhs)?;
            let rhs = build(tree, &binary.rhs)?;
            let kind = match binary.op.kind {
                BinOpKind::Add => Kind::Addition,
                BinOpKind::Sub => Kind::Subtraction,
                BinOpKind::Mul => Kind::Multiplication,
                BinOpKind::Div => Kind::Division,
                BinOpKind::Exp => Kind::Power,
            };
            tree.binary(kind, lhs, rhs)
        },
        AstExpr::Call(call) => {
            if call.name.name != "conj" {
                return Err(FromAstError::UnknownFunction {
                    name: call.name.name.clone(),
                    span: call.span.clone(),
                });
            }
            if call.args.len() != 1 {
                return Err(FromAstError::WrongArity {
                    name: call.name.name.clone(),
                    expected: 1,
                    found: call.args.len(),
                    span: call.span.clone(),
                });
            }
            let arg = build(tree, &call.args[0])?;
            tree.unary(Kind::Conjugate, arg)
        },
    })
}

#[cfg(test)]
mod tests {
    use canon_parser::parser::ast::{Call, LitSym};
    use canon_parser::parser::Parser;
    use super::*;

    fn tree_of(input: &str) -> Tree {
        let ast = Parser::new(input).try_parse_full().unwrap();
        from_ast(&ast).unwrap()
    }

    #[test]
    fn implicit_multiplication_builds_a_product() {
        let tree = tree_of("2a");
        let root = tree.root().unwrap();
        assert_eq!(tree.kind(root), Kind::Multiplication);
        assert_eq!(tree.number(tree.child(root, 0).unwrap()), Some(rat(2)));
        assert_eq!(tree.symbol_name(tree.child(root, 1).unwrap()), Some("a"));
    }

    #[test]
    fn radix_literal_keeps_its_base() {
        let tree = tree_of("0xff");
        let root = tree.root().unwrap();
        assert_eq!(tree.kind(root), Kind::BasedInteger);
        let (value, base) = tree.based_integer(root).unwrap();
        assert_eq!(*value, 255);
        assert_eq!(base, 16);
    }

    #[test]
    fn parentheses_do_not_produce_nodes() {
        let tree = tree_of("(x)");
        assert_eq!(tree.kind(tree.root().unwrap()), Kind::Symbol);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn conjugate_call() {
        let tree = tree_of("conj(x)");
        let root = tree.root().unwrap();
        assert_eq!(tree.kind(root), Kind::Conjugate);
        assert_eq!(tree.child_count(root), 1);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let ast = Parser::new("conj(x, y)").try_parse_full().unwrap();
        assert!(matches!(from_ast(&ast), Err(FromAstError::WrongArity { .. })));
    }

    #[test]
    fn unknown_function_is_rejected() {
        // the parser only builds calls for known names, so construct one directly
        let ast = AstExpr::Call(Call {
            name: LitSym { name: String::from("sin"), span: 0..3 },
            args: vec![AstExpr::Literal(Literal::Symbol(LitSym {
                name: String::from("x"),
                span: 4..5,
            }))],
            span: 0..6,
        });
        assert!(matches!(
            from_ast(&ast),
            Err(FromAstError::UnknownFunction { .. }),
        ));
    }
}
