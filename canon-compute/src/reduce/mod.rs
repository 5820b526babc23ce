//! The reduction engine: bottom-up canonicalization of expression trees.
//!
//! [`reduce`] walks the tree in post-order, so every child is fully canonical before its parent's
//! rewrite runs. Each node then goes through a default pre-pass (any [`Undefined`] child absorbs
//! the whole node), the optional [`extra`] pattern table, and finally the per-kind handler
//! selected by an exhaustive `match` over [`Kind`].
//!
//! Canonical form contains no [`Subtraction`], [`Opposite`], or [`Division`] nodes: all three
//! rewrite into additions, multiplications, and powers, which shrinks the set of kinds every
//! other rule (structural equality, like-term collection, degree analysis) must handle.
//!
//! [`Undefined`]: Kind::Undefined
//! [`Subtraction`]: Kind::Subtraction
//! [`Opposite`]: Kind::Opposite
//! [`Division`]: Kind::Division

mod extra;
mod rules;

use crate::fmt::DisplayMode;
use crate::tree::{Kind, NodeId, Tree};
use std::cmp::Ordering;

/// The maximum tree depth the engine will recurse into. Anything deeper reduces to
/// [`Kind::Undefined`] instead of risking unbounded recursion on pathological input.
pub const MAX_DEPTH: usize = 256;

/// Who the reduction result is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    /// An end user reading the output of a calculation.
    #[default]
    User,

    /// Another part of the system consuming the canonical tree.
    System,
}

/// The unit to interpret angles in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AngleUnit {
    #[default]
    Radian,
    Degree,
}

/// Configuration threaded through every reduction call.
///
/// The context is immutable for the duration of one [`reduce`] call; nested recursive calls share
/// a reference to it. There is no ambient global preferences object.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReductionContext {
    /// Who the result is for.
    pub target: Target,

    /// How numbers are displayed when the result is serialized.
    pub display_mode: DisplayMode,

    /// The unit to interpret angles in.
    pub angle_unit: AngleUnit,

    /// Enables the auxiliary exact-pattern rule table. With this flag off (the default),
    /// reduction is exact.
    pub extra_rules: bool,
}

/// Reduces the tree rooted at its designated root into canonical form.
pub fn reduce(tree: &mut Tree, ctx: &ReductionContext) {
    if let Some(root) = tree.root() {
        reduce_node(tree, root, ctx, 0);
    }
}

/// Post-order reduction of the subtree at `id`. Returns the node now occupying `id`'s slot.
fn reduce_node(tree: &mut Tree, id: NodeId, ctx: &ReductionContext, depth: usize) -> NodeId {
    if depth >= MAX_DEPTH {
        let undef = tree.undefined();
        tree.replace_with_in_place(id, undef);
        return undef;
    }

    // children first; a child's slot is re-read every iteration because reducing it may have
    // replaced the node occupying the slot
    let mut i = 0;
    while let Some(child) = tree.child(id, i) {
        reduce_node(tree, child, ctx, depth + 1);
        i += 1;
    }

    shallow_reduce(tree, id, ctx)
}

/// A single node's rewrite step, assuming its children are already canonical. Returns the node
/// now occupying `id`'s slot.
pub(crate) fn shallow_reduce(tree: &mut Tree, id: NodeId, ctx: &ReductionContext) -> NodeId {
    if let Some(undef) = default_shallow_reduce(tree, id) {
        return undef;
    }

    if ctx.extra_rules {
        if let Some(new) = extra::apply(tree, id) {
            return new;
        }
    }

    match tree.kind(id) {
        Kind::Addition => rules::addition(tree, id),
        Kind::Subtraction => rules::subtraction(tree, id, ctx),
        Kind::Multiplication => rules::multiplication(tree, id),
        Kind::Division => rules::division(tree, id, ctx),
        Kind::Power => rules::power(tree, id),
        Kind::Opposite => rules::opposite(tree, id, ctx),
        Kind::Conjugate => rules::conjugate(tree, id),
        Kind::BasedInteger => rules::based_integer(tree, id),
        Kind::Rational | Kind::Symbol | Kind::Undefined => id,
    }
}

/// The default pre-pass run before any per-kind handler: if any child is [`Kind::Undefined`],
/// the whole node is replaced with `Undefined`. The absorption is unconditional; no kind in this
/// engine special-cases it.
fn default_shallow_reduce(tree: &mut Tree, id: NodeId) -> Option<NodeId> {
    let absorbed = tree
        .children(id)
        .iter()
        .any(|&child| tree.kind(child) == Kind::Undefined);

    if absorbed {
        let undef = tree.undefined();
        tree.replace_with_in_place(id, undef);
        Some(undef)
    } else {
        None
    }
}

/// Returns the degree of the subtree at `id` as a polynomial in `symbol`, or `-1` if the subtree
/// is not polynomial in `symbol`.
///
/// The symbol appearing in an exponent or a denominator makes the subtree non-polynomial. A `-1`
/// from any child forces the parent's result to `-1` immediately; it never participates in a
/// `max()` or a sum.
pub fn polynomial_degree(tree: &Tree, id: NodeId, symbol: &str) -> isize {
    match tree.kind(id) {
        Kind::Symbol => {
            if tree.symbol_name(id) == Some(symbol) { 1 } else { 0 }
        },
        Kind::Rational | Kind::BasedInteger | Kind::Undefined => 0,
        Kind::Addition | Kind::Subtraction => {
            let mut degree = 0;
            for &child in tree.children(id) {
                let d = polynomial_degree(tree, child, symbol);
                if d < 0 {
                    return -1;
                }
                degree = degree.max(d);
            }
            degree
        },
        Kind::Opposite | Kind::Conjugate => match tree.child(id, 0) {
            Some(child) => polynomial_degree(tree, child, symbol),
            None => 0,
        },
        Kind::Multiplication => {
            let mut degree = 0;
            for &child in tree.children(id) {
                let d = polynomial_degree(tree, child, symbol);
                if d < 0 {
                    return -1;
                }
                degree += d;
            }
            degree
        },
        Kind::Division => {
            let (Some(numerator), Some(denominator)) = (tree.child(id, 0), tree.child(id, 1))
            else {
                return 0;
            };
            if mentions(tree, denominator, symbol) {
                return -1;
            }
            polynomial_degree(tree, numerator, symbol)
        },
        Kind::Power => {
            let (Some(base), Some(exponent)) = (tree.child(id, 0), tree.child(id, 1)) else {
                return 0;
            };
            if mentions(tree, exponent, symbol) {
                return -1;
            }
            let base_degree = polynomial_degree(tree, base, symbol);
            if base_degree < 0 {
                return -1;
            }
            if base_degree == 0 {
                return 0;
            }
            match tree.number(exponent) {
                Some(e) if e.is_integer() && e.cmp0() != Ordering::Less => {
                    match e.numer().to_isize() {
                        Some(e) => base_degree * e,
                        None => -1,
                    }
                },
                _ => -1,
            }
        },
    }
}

/// Returns true if `symbol` occurs anywhere in the subtree at `id`.
fn mentions(tree: &Tree, id: NodeId, symbol: &str) -> bool {
    if tree.symbol_name(id) == Some(symbol) {
        return true;
    }
    tree.children(id).iter().any(|&child| mentions(tree, child, symbol))
}

#[cfg(test)]
mod tests {
    use crate::primitive::rat;
    use crate::tree::from_ast;
    use canon_parser::parser::Parser;
    use pretty_assertions::assert_eq;
    use super::*;

    fn reduced(input: &str, ctx: &ReductionContext) -> Tree {
        let ast = Parser::new(input).try_parse_full().unwrap();
        let mut tree = from_ast(&ast).unwrap();
        reduce(&mut tree, ctx);
        tree
    }

    fn root_number(tree: &Tree) -> rug::Rational {
        let root = tree.root().unwrap();
        assert_eq!(tree.kind(root), Kind::Rational);
        tree.number(root).unwrap()
    }

    #[test]
    fn exact_subtraction() {
        let ctx = ReductionContext::default();
        for (input, expected) in [
            ("8 - 2", 6),
            ("2 - 8", -6),
            ("0 - 0", 0),
            ("123456789123456789 - 123456789123456788", 1),
        ] {
            assert_eq!(root_number(&reduced(input, &ctx)), rat(expected), "{input}");
        }
    }

    #[test]
    fn extra_rules_override_eight_minus_two() {
        let ctx = ReductionContext { extra_rules: true, ..Default::default() };
        assert_eq!(root_number(&reduced("8 - 2", &ctx)), rat(5));

        // no other combination is overridden
        assert_eq!(root_number(&reduced("8 - 3", &ctx)), rat(5));
        assert_eq!(root_number(&reduced("9 - 2", &ctx)), rat(7));
    }

    #[test]
    fn extra_rules_disabled_by_default() {
        let ctx = ReductionContext::default();
        assert_eq!(root_number(&reduced("8 - 2", &ctx)), rat(6));
    }

    #[test]
    fn subtraction_of_symbols_collapses() {
        let ctx = ReductionContext::default();
        let tree = reduced("x - x", &ctx);
        assert_eq!(root_number(&tree), rat(0));
    }

    #[test]
    fn like_terms_combine() {
        let ctx = ReductionContext::default();
        let tree = reduced("a + a + a", &ctx);
        let root = tree.root().unwrap();
        // 3*a
        assert_eq!(tree.kind(root), Kind::Multiplication);
        assert_eq!(tree.number(tree.child(root, 0).unwrap()), Some(rat(3)));
        assert_eq!(tree.symbol_name(tree.child(root, 1).unwrap()), Some("a"));
    }

    #[test]
    fn division_by_zero_is_undefined() {
        let ctx = ReductionContext::default();
        let tree = reduced("1 / 0", &ctx);
        assert_eq!(tree.kind(tree.root().unwrap()), Kind::Undefined);
    }

    #[test]
    fn undefined_absorbs_the_whole_expression() {
        let ctx = ReductionContext::default();
        let tree = reduced("3 + 2 * (1 / 0)", &ctx);
        assert_eq!(tree.kind(tree.root().unwrap()), Kind::Undefined);
    }

    #[test]
    fn based_integers_reduce_to_rationals() {
        let ctx = ReductionContext::default();
        assert_eq!(root_number(&reduced("0xff", &ctx)), rat(255));
        assert_eq!(root_number(&reduced("0b101 + 1", &ctx)), rat(6));
    }

    #[test]
    fn exact_rational_arithmetic() {
        let ctx = ReductionContext::default();
        // 1/3 + 1/6 = 1/2, with no floating-point drift
        assert_eq!(root_number(&reduced("1/3 + 1/6", &ctx)), rat((1, 2)));
    }

    #[test]
    fn reduction_is_idempotent() {
        let ctx = ReductionContext::default();
        for input in ["8 - 2", "2a + 3a - x^2", "x - -y", "conj(x) * 2", "1/3 + x/6"] {
            let once = reduced(input, &ctx);
            let mut twice = once.clone();
            reduce(&mut twice, &ctx);
            assert!(
                once.structural_eq(once.root().unwrap(), &twice, twice.root().unwrap()),
                "reduce is not idempotent for {input}",
            );
        }
    }

    #[test]
    fn canonical_form_has_no_subtraction() {
        let ctx = ReductionContext::default();
        let tree = reduced("x - y", &ctx);
        let root = tree.root().unwrap();
        assert_eq!(tree.kind(root), Kind::Addition);
        for &child in tree.children(root) {
            assert!(!tree.is_of_kind(
                child,
                &[Kind::Subtraction, Kind::Opposite, Kind::Division],
            ));
        }
    }

    #[test]
    fn degree_takes_the_max_over_a_sum() {
        let ast = Parser::new("x - x^2").try_parse_full().unwrap();
        let tree = from_ast(&ast).unwrap();
        assert_eq!(polynomial_degree(&tree, tree.root().unwrap(), "x"), 2);
    }

    #[test]
    fn degree_short_circuits_on_negative_exponent() {
        let ast = Parser::new("x - x^-1").try_parse_full().unwrap();
        let tree = from_ast(&ast).unwrap();
        assert_eq!(polynomial_degree(&tree, tree.root().unwrap(), "x"), -1);
    }

    #[test]
    fn degree_short_circuits_on_symbol_in_denominator() {
        let ast = Parser::new("1 + y / x").try_parse_full().unwrap();
        let tree = from_ast(&ast).unwrap();
        assert_eq!(polynomial_degree(&tree, tree.root().unwrap(), "x"), -1);
        assert_eq!(polynomial_degree(&tree, tree.root().unwrap(), "y"), 1);
    }

    #[test]
    fn degree_of_a_product_sums() {
        let ast = Parser::new("x^2 * x * y").try_parse_full().unwrap();
        let tree = from_ast(&ast).unwrap();
        assert_eq!(polynomial_degree(&tree, tree.root().unwrap(), "x"), 3);
    }

    #[test]
    fn degree_ignores_foreign_symbols() {
        let ast = Parser::new("2^3 + y").try_parse_full().unwrap();
        let tree = from_ast(&ast).unwrap();
        assert_eq!(polynomial_degree(&tree, tree.root().unwrap(), "x"), 0);
    }

    #[test]
    fn deep_trees_reduce_to_undefined() {
        let mut input = String::from("x");
        for _ in 0..(MAX_DEPTH + 8) {
            input = format!("({input} + 1)");
        }
        let ctx = ReductionContext::default();
        let tree = reduced(&input, &ctx);
        assert_eq!(tree.kind(tree.root().unwrap()), Kind::Undefined);
    }
}
