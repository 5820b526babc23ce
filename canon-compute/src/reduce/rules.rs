//! The per-kind rewrite handlers.
//!
//! Every handler assumes the node's children are already canonical, takes the node's children
//! with [`Tree::take_children`] before restructuring, and installs its result with
//! [`Tree::replace_with_in_place`]. Each returns the node now occupying the slot.

use crate::primitive::{rat, rat_pow};
use crate::tree::{Kind, NodeId, Tree};
use rug::Rational;
use super::{shallow_reduce, ReductionContext};

/// Numeric exponents above this magnitude are left symbolic rather than expanded into bignums.
const MAX_EXPONENT: u32 = 10_000;

/// `a - b` becomes `a + (-1 * b)`. The product is reduced before the sum so the sum sees a
/// canonical term.
pub(super) fn subtraction(tree: &mut Tree, id: NodeId, ctx: &ReductionContext) -> NodeId {
    let (Some(a), Some(b)) = (tree.child(id, 0), tree.child(id, 1)) else {
        return id;
    };

    tree.take_children(id);
    let minus_one = tree.integer(-1);
    let negated = tree.binary(Kind::Multiplication, minus_one, b);
    let negated = shallow_reduce(tree, negated, ctx);
    let sum = tree.binary(Kind::Addition, a, negated);
    tree.replace_with_in_place(id, sum);
    shallow_reduce(tree, sum, ctx)
}

/// `-a` becomes `-1 * a`.
pub(super) fn opposite(tree: &mut Tree, id: NodeId, ctx: &ReductionContext) -> NodeId {
    let Some(a) = tree.child(id, 0) else {
        return id;
    };

    tree.take_children(id);
    let minus_one = tree.integer(-1);
    let product = tree.binary(Kind::Multiplication, minus_one, a);
    tree.replace_with_in_place(id, product);
    shallow_reduce(tree, product, ctx)
}

/// Numeric quotients fold exactly; division by zero is undefined. A symbolic `a / b` becomes
/// `a * b^-1`.
pub(super) fn division(tree: &mut Tree, id: NodeId, ctx: &ReductionContext) -> NodeId {
    let (Some(a), Some(b)) = (tree.child(id, 0), tree.child(id, 1)) else {
        return id;
    };

    if let (Some(x), Some(y)) = (tree.number(a), tree.number(b)) {
        tree.take_children(id);
        tree.free_subtree(a);
        tree.free_subtree(b);
        let result = if y == 0 {
            tree.undefined()
        } else {
            tree.rational(x / y)
        };
        tree.replace_with_in_place(id, result);
        return result;
    }

    tree.take_children(id);
    let minus_one = tree.integer(-1);
    let inverse = tree.binary(Kind::Power, b, minus_one);
    let inverse = shallow_reduce(tree, inverse, ctx);
    let product = tree.binary(Kind::Multiplication, a, inverse);
    tree.replace_with_in_place(id, product);
    shallow_reduce(tree, product, ctx)
}

/// Flattens nested sums, folds the numeric terms exactly, collects structurally equal terms by
/// summing their numeric coefficients, drops vanished terms, and sorts what remains into
/// canonical order.
pub(super) fn addition(tree: &mut Tree, id: NodeId) -> NodeId {
    let terms = tree.take_children(id);
    let terms = flatten(tree, Kind::Addition, terms);

    let mut sum = Rational::new();
    let mut symbolic = Vec::new();
    for term in terms {
        match tree.number(term) {
            Some(value) => {
                sum += value;
                tree.free_subtree(term);
            },
            None => symbolic.push(term),
        }
    }

    // collect like terms by their non-numeric core
    let mut collected: Vec<(NodeId, Rational)> = Vec::new();
    'terms: for term in symbolic {
        let (coeff, core) = split_coefficient(tree, term);
        for (existing, total) in &mut collected {
            if tree.eq_subtree(*existing, core) {
                *total += coeff;
                tree.free_subtree(core);
                continue 'terms;
            }
        }
        collected.push((core, coeff));
    }

    let mut children = Vec::new();
    for (core, coeff) in collected {
        if coeff == 0 {
            tree.free_subtree(core);
        } else if coeff == 1 {
            children.push(core);
        } else {
            children.push(scale(tree, core, coeff));
        }
    }

    if sum != 0 || children.is_empty() {
        children.push(tree.rational(sum));
    }

    children.sort_by(|&a, &b| tree.cmp_subtree(a, b));
    rebuild(tree, id, children)
}

/// Flattens nested products, folds the numeric factors exactly (zero annihilates the whole
/// product), collects repeated bases into powers with summed numeric exponents, and sorts.
pub(super) fn multiplication(tree: &mut Tree, id: NodeId) -> NodeId {
    let factors = tree.take_children(id);
    let factors = flatten(tree, Kind::Multiplication, factors);

    let mut product = rat(1);
    let mut symbolic = Vec::new();
    for factor in factors {
        match tree.number(factor) {
            Some(value) => {
                product *= value;
                tree.free_subtree(factor);
            },
            None => symbolic.push(factor),
        }
    }

    if product == 0 {
        for factor in symbolic {
            tree.free_subtree(factor);
        }
        let zero = tree.integer(0);
        tree.replace_with_in_place(id, zero);
        return zero;
    }

    // collect repeated bases into powers with summed numeric exponents
    let mut collected: Vec<(NodeId, Rational)> = Vec::new();
    'factors: for factor in symbolic {
        let (base, exp) = split_exponent(tree, factor);
        for (existing, total) in &mut collected {
            if tree.eq_subtree(*existing, base) {
                *total += exp;
                tree.free_subtree(base);
                continue 'factors;
            }
        }
        collected.push((base, exp));
    }

    let mut children = Vec::new();
    for (base, exp) in collected {
        if exp == 0 {
            tree.free_subtree(base);
        } else if exp == 1 {
            children.push(base);
        } else {
            let e = tree.rational(exp);
            let pow = tree.binary(Kind::Power, base, e);
            let pow = power(tree, pow);
            match tree.number(pow) {
                Some(value) => {
                    product *= value;
                    tree.free_subtree(pow);
                },
                None => children.push(pow),
            }
        }
    }

    if product != 1 || children.is_empty() {
        children.push(tree.rational(product));
    }

    children.sort_by(|&a, &b| tree.cmp_subtree(a, b));
    rebuild(tree, id, children)
}

/// `x^0` is 1 (except `0^0`, which is undefined), `x^1` is `x`, and a numeric base raised to a
/// small integer exponent folds exactly. Everything else stays symbolic.
pub(super) fn power(tree: &mut Tree, id: NodeId) -> NodeId {
    let (Some(base), Some(exp)) = (tree.child(id, 0), tree.child(id, 1)) else {
        return id;
    };
    let Some(e) = tree.number(exp) else {
        return id;
    };

    if e == 0 {
        let base_is_zero = tree.number(base).map_or(false, |b| b == 0);
        tree.take_children(id);
        tree.free_subtree(base);
        tree.free_subtree(exp);
        let result = if base_is_zero {
            tree.undefined()
        } else {
            tree.integer(1)
        };
        tree.replace_with_in_place(id, result);
        return result;
    }

    if e == 1 {
        tree.take_children(id);
        tree.free_subtree(exp);
        tree.replace_with_in_place(id, base);
        return base;
    }

    if e.is_integer() {
        if let (Some(b), Some(small)) = (
            tree.number(base),
            e.numer().to_i32().filter(|n| n.unsigned_abs() <= MAX_EXPONENT),
        ) {
            tree.take_children(id);
            tree.free_subtree(base);
            tree.free_subtree(exp);
            let result = match rat_pow(&b, small) {
                Some(value) => tree.rational(value),
                None => tree.undefined(),
            };
            tree.replace_with_in_place(id, result);
            return result;
        }
    }

    id
}

/// The conjugate of a real number is itself, and conjugation is an involution. Anything else
/// stays wrapped.
pub(super) fn conjugate(tree: &mut Tree, id: NodeId) -> NodeId {
    let Some(a) = tree.child(id, 0) else {
        return id;
    };

    if tree.is_number(a) {
        tree.take_children(id);
        tree.replace_with_in_place(id, a);
        return a;
    }

    if tree.kind(a) == Kind::Conjugate {
        if let Some(inner) = tree.child(a, 0) {
            tree.take_children(id);
            tree.take_children(a);
            tree.free_subtree(a);
            tree.replace_with_in_place(id, inner);
            return inner;
        }
    }

    id
}

/// A based integer loses its display base and becomes a plain rational.
pub(super) fn based_integer(tree: &mut Tree, id: NodeId) -> NodeId {
    let Some(value) = tree.number(id) else {
        return id;
    };

    let replacement = tree.rational(value);
    tree.replace_with_in_place(id, replacement);
    replacement
}

/// Splices children of the same kind into the list, one level at a time.
fn flatten(tree: &mut Tree, kind: Kind, children: Vec<NodeId>) -> Vec<NodeId> {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        if tree.kind(child) == kind {
            let inner = tree.take_children(child);
            tree.free_subtree(child);
            flat.extend(flatten(tree, kind, inner));
        } else {
            flat.push(child);
        }
    }
    flat
}

/// Splits a term into its numeric coefficient and its non-numeric core, so `2*a` and `3*a` both
/// expose the core `a`. The term's shell is freed if splitting dissolves it.
fn split_coefficient(tree: &mut Tree, term: NodeId) -> (Rational, NodeId) {
    if tree.kind(term) != Kind::Multiplication {
        return (rat(1), term);
    }

    let mut coeff = rat(1);
    let factors = tree.take_children(term);
    let mut kept = Vec::with_capacity(factors.len());
    for factor in factors {
        match tree.number(factor) {
            Some(value) => {
                coeff *= value;
                tree.free_subtree(factor);
            },
            None => kept.push(factor),
        }
    }

    if kept.is_empty() {
        // a fully numeric product; only reachable for malformed input
        tree.free_subtree(term);
        let one = tree.integer(1);
        return (coeff, one);
    }
    if let [core] = kept[..] {
        tree.free_subtree(term);
        return (coeff, core);
    }
    tree.give_children(term, kept);
    (coeff, term)
}

/// Splits a factor into its base and numeric exponent, so `a` and `a^2` both expose the base
/// `a`. Factors without a numeric exponent are their own base with exponent 1.
fn split_exponent(tree: &mut Tree, factor: NodeId) -> (NodeId, Rational) {
    if tree.kind(factor) != Kind::Power {
        return (factor, rat(1));
    }
    let (Some(base), Some(exp)) = (tree.child(factor, 0), tree.child(factor, 1)) else {
        return (factor, rat(1));
    };
    let Some(value) = tree.number(exp) else {
        return (factor, rat(1));
    };

    tree.take_children(factor);
    tree.free_subtree(exp);
    tree.free_subtree(factor);
    (base, value)
}

/// Multiplies `core` by a numeric coefficient, splicing into `core`'s own factor list when it is
/// already a product so the result stays flat.
fn scale(tree: &mut Tree, core: NodeId, coeff: Rational) -> NodeId {
    let c = tree.rational(coeff);
    if tree.kind(core) == Kind::Multiplication {
        let mut factors = tree.take_children(core);
        factors.insert(0, c);
        tree.give_children(core, factors);
        core
    } else {
        tree.binary(Kind::Multiplication, c, core)
    }
}

/// Reinstalls the children of an n-ary node, downgrading to the sole child when only one
/// remains.
fn rebuild(tree: &mut Tree, id: NodeId, mut children: Vec<NodeId>) -> NodeId {
    if children.len() == 1 {
        if let Some(only) = children.pop() {
            tree.replace_with_in_place(id, only);
            return only;
        }
    }
    tree.give_children(id, children);
    id
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn subtraction_rewrites_into_a_sum() {
        let mut tree = Tree::new();
        let x = tree.symbol("x");
        let y = tree.symbol("y");
        let sub = tree.binary(Kind::Subtraction, x, y);
        tree.set_root(sub);

        let ctx = ReductionContext::default();
        let result = subtraction(&mut tree, sub, &ctx);

        assert_eq!(tree.root(), Some(result));
        assert_eq!(tree.kind(result), Kind::Addition);
        // the bare symbol sorts before the -1*y product
        let terms = tree.children(result).to_vec();
        assert_eq!(terms.len(), 2);
        assert_eq!(tree.symbol_name(terms[0]), Some("x"));
        assert_eq!(tree.kind(terms[1]), Kind::Multiplication);
        assert_eq!(tree.number(tree.child(terms[1], 0).unwrap()), Some(rat(-1)));
    }

    #[test]
    fn zero_annihilates_a_product() {
        let mut tree = Tree::new();
        let zero = tree.integer(0);
        let x = tree.symbol("x");
        let mul = tree.binary(Kind::Multiplication, x, zero);
        tree.set_root(mul);

        let result = multiplication(&mut tree, mul);
        assert_eq!(tree.number(result), Some(rat(0)));
        // the annihilated factor was freed with everything else
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn unit_factors_disappear() {
        let mut tree = Tree::new();
        let one = tree.integer(1);
        let x = tree.symbol("x");
        let mul = tree.binary(Kind::Multiplication, one, x);
        tree.set_root(mul);

        let result = multiplication(&mut tree, mul);
        assert_eq!(tree.symbol_name(result), Some("x"));
    }

    #[test]
    fn repeated_factors_become_a_power() {
        let mut tree = Tree::new();
        let x1 = tree.symbol("x");
        let x2 = tree.symbol("x");
        let mul = tree.binary(Kind::Multiplication, x1, x2);
        tree.set_root(mul);

        let result = multiplication(&mut tree, mul);
        assert_eq!(tree.kind(result), Kind::Power);
        assert_eq!(tree.number(tree.child(result, 1).unwrap()), Some(rat(2)));
    }

    #[test]
    fn power_special_cases() {
        let mut tree = Tree::new();

        let x = tree.symbol("x");
        let zero = tree.integer(0);
        let pow = tree.binary(Kind::Power, x, zero);
        tree.set_root(pow);
        let result = power(&mut tree, pow);
        assert_eq!(tree.number(result), Some(rat(1)));

        let mut tree = Tree::new();
        let zero = tree.integer(0);
        let zero2 = tree.integer(0);
        let pow = tree.binary(Kind::Power, zero, zero2);
        tree.set_root(pow);
        let result = power(&mut tree, pow);
        assert_eq!(tree.kind(result), Kind::Undefined);
    }

    #[test]
    fn huge_exponents_stay_symbolic() {
        let mut tree = Tree::new();
        let two = tree.integer(2);
        let exp = tree.integer(1_000_000);
        let pow = tree.binary(Kind::Power, two, exp);
        tree.set_root(pow);

        let result = power(&mut tree, pow);
        assert_eq!(result, pow);
        assert_eq!(tree.kind(result), Kind::Power);
    }

    #[test]
    fn conjugate_of_a_number_unwraps() {
        let mut tree = Tree::new();
        let n = tree.rational(rat((3, 4)));
        let conj = tree.unary(Kind::Conjugate, n);
        tree.set_root(conj);

        let result = conjugate(&mut tree, conj);
        assert_eq!(tree.number(result), Some(rat((3, 4))));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn conjugate_is_an_involution() {
        let mut tree = Tree::new();
        let x = tree.symbol("x");
        let inner = tree.unary(Kind::Conjugate, x);
        let outer = tree.unary(Kind::Conjugate, inner);
        tree.set_root(outer);

        let result = conjugate(&mut tree, outer);
        assert_eq!(result, x);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn nested_sums_flatten() {
        let mut tree = Tree::new();
        let a = tree.symbol("a");
        let b = tree.symbol("b");
        let inner = tree.binary(Kind::Addition, a, b);
        let c = tree.symbol("c");
        let outer = tree.binary(Kind::Addition, inner, c);
        tree.set_root(outer);

        let result = addition(&mut tree, outer);
        assert_eq!(tree.child_count(result), 3);
    }
}
