//! Bounded serialization of expression trees.
//!
//! [`render`] writes an infix rendition of a subtree into a caller-supplied byte buffer and
//! reports the number of bytes written. The buffer never grows: output that does not fit, or
//! that fills the buffer to within one byte of capacity, is reported as a [`TruncationError`].
//! The one-byte margin is deliberate; an exactly-full buffer cannot be distinguished from a
//! truncated one by the caller, so it is treated as truncated.
//!
//! Two renditions exist. [`Mode::Parseable`] produces text the parser reads back into a
//! structurally identical tree, using implicit multiplication (`2a`) and radix prefixes
//! (`0xff`). [`Mode::Displayable`] is for human eyes: every operator is explicit and radix
//! literals are shown in decimal.

use crate::tree::{Kind, NodeId, Tree};
use std::cmp::Ordering;
use std::fmt::{self, Write};

/// How the serialized text will be consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Output the parser can read back into the same tree.
    #[default]
    Parseable,

    /// Output for display; every operator is written explicitly.
    Displayable,
}

/// How numbers are rendered in [`Mode::Displayable`] output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Exact values: integers in decimal, other rationals as `num/den`.
    #[default]
    Decimal,

    /// Approximate scientific notation with a fixed number of significant digits. This affects
    /// display only; the underlying tree stays exact.
    Scientific,
}

/// The output did not fit in the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationError;

impl fmt::Display for TruncationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "serialized output does not fit in the buffer")
    }
}

impl std::error::Error for TruncationError {}

/// A [`fmt::Write`] cursor over a fixed byte buffer. Writing past the end fails instead of
/// growing.
struct Cursor<'buf> {
    buf: &'buf mut [u8],
    len: usize,
}

impl Write for Cursor<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let available = self.buf.len() - self.len;
        if bytes.len() > available {
            return Err(fmt::Error);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

/// Renders the subtree at `id` into `buf` and returns the number of bytes written.
///
/// Fails with [`TruncationError`] if the output does not fit, or if it fills the buffer to
/// within one byte of capacity. On failure the buffer contents are unspecified.
pub fn render(
    tree: &Tree,
    id: NodeId,
    buf: &mut [u8],
    mode: Mode,
    display_mode: DisplayMode,
    significant_digits: usize,
) -> Result<usize, TruncationError> {
    if buf.is_empty() {
        return Err(TruncationError);
    }
    let capacity = buf.len();

    let renderer = Renderer { tree, mode, display_mode, significant_digits };
    let mut cursor = Cursor { buf, len: 0 };
    renderer.node(&mut cursor, id).map_err(|_| TruncationError)?;

    if cursor.len >= capacity - 1 {
        return Err(TruncationError);
    }
    Ok(cursor.len)
}

struct Renderer<'a> {
    tree: &'a Tree,
    mode: Mode,
    display_mode: DisplayMode,
    significant_digits: usize,
}

impl Renderer<'_> {
    fn node(&self, out: &mut Cursor, id: NodeId) -> fmt::Result {
        match self.tree.kind(id) {
            Kind::Rational => self.rational(out, id),
            Kind::BasedInteger => self.based(out, id),
            Kind::Symbol => out.write_str(self.tree.symbol_name(id).unwrap_or("")),
            Kind::Undefined => out.write_str("undef"),
            Kind::Addition => self.infix(out, id, "+"),
            Kind::Subtraction => self.infix(out, id, "-"),
            Kind::Multiplication => self.product(out, id),
            Kind::Division => self.infix(out, id, "/"),
            Kind::Power => self.infix(out, id, "^"),
            Kind::Opposite => {
                out.write_str("-")?;
                match self.tree.child(id, 0) {
                    Some(child) => self.child(out, id, child, 1),
                    None => Ok(()),
                }
            },
            Kind::Conjugate => {
                // the call's own parentheses make inner parenthesization unnecessary
                out.write_str("conj(")?;
                if let Some(child) = self.tree.child(id, 0) {
                    self.node(out, child)?;
                }
                out.write_str(")")
            },
        }
    }

    fn rational(&self, out: &mut Cursor, id: NodeId) -> fmt::Result {
        let Some(value) = self.tree.number(id) else {
            return Ok(());
        };

        if self.display_mode == DisplayMode::Scientific && self.mode == Mode::Displayable {
            let precision = self.significant_digits.max(1) - 1;
            return write!(out, "{:.*e}", precision, value.to_f64());
        }

        if value.is_integer() {
            write!(out, "{}", value.numer())
        } else {
            write!(out, "{}/{}", value.numer(), value.denom())
        }
    }

    fn based(&self, out: &mut Cursor, id: NodeId) -> fmt::Result {
        let Some((value, base)) = self.tree.based_integer(id) else {
            return Ok(());
        };

        match self.mode {
            Mode::Parseable => {
                let prefix = match base {
                    2 => "0b",
                    8 => "0o",
                    _ => "0x",
                };
                write!(out, "{}{}", prefix, value.to_string_radix(i32::from(base)))
            },
            Mode::Displayable => write!(out, "{}", value),
        }
    }

    fn infix(&self, out: &mut Cursor, id: NodeId, op: &str) -> fmt::Result {
        for (i, &child) in self.tree.children(id).iter().enumerate() {
            if i > 0 {
                out.write_str(op)?;
            }
            self.child(out, id, child, i)?;
        }
        Ok(())
    }

    fn product(&self, out: &mut Cursor, id: NodeId) -> fmt::Result {
        let children = self.tree.children(id);
        for (i, &child) in children.iter().enumerate() {
            let parens = self.child_needs_parens(id, child, i);
            if i > 0 && !self.implicit_between(children[i - 1], child, parens) {
                out.write_str("*")?;
            }
            if parens {
                out.write_str("(")?;
                self.node(out, child)?;
                out.write_str(")")?;
            } else {
                self.node(out, child)?;
            }
        }
        Ok(())
    }

    /// Whether the `*` between two factors can be dropped: the left factor must be a
    /// non-negative integer and the right must be a symbol or a parenthesized group, so the
    /// tokenizer cannot glue the two back together.
    fn implicit_between(&self, left: NodeId, right: NodeId, right_parens: bool) -> bool {
        if self.mode != Mode::Parseable {
            return false;
        }
        let left_ok = self.tree.kind(left) == Kind::Rational
            && self
                .tree
                .number(left)
                .map_or(false, |v| v.is_integer() && v.cmp0() != Ordering::Less);
        left_ok && (right_parens || self.tree.kind(right) == Kind::Symbol)
    }

    fn child(&self, out: &mut Cursor, parent: NodeId, child: NodeId, index: usize) -> fmt::Result {
        if self.child_needs_parens(parent, child, index) {
            out.write_str("(")?;
            self.node(out, child)?;
            out.write_str(")")
        } else {
            self.node(out, child)
        }
    }

    /// The parenthesization policy. The leading operand keeps its meaning without parentheses
    /// except where an operator of higher binding power would rebind it; later operands are
    /// parenthesized when they are negative, or when their own operator binds more loosely than
    /// the parent's.
    fn child_needs_parens(&self, parent: NodeId, child: NodeId, index: usize) -> bool {
        let parent_kind = self.tree.kind(parent);
        let fraction = self.renders_as_fraction(child);

        if index == 0 {
            return match parent_kind {
                Kind::Multiplication | Kind::Division => {
                    self.tree.is_of_kind(child, &[Kind::Addition, Kind::Subtraction])
                },
                Kind::Power => {
                    fraction
                        || self.tree.sign(child) == Some(Ordering::Less)
                        || self.tree.is_of_kind(
                            child,
                            &[
                                Kind::Addition,
                                Kind::Subtraction,
                                Kind::Multiplication,
                                Kind::Division,
                                Kind::Power,
                                Kind::Opposite,
                            ],
                        )
                },
                _ => false,
            };
        }

        if self.tree.sign(child) == Some(Ordering::Less) {
            return true;
        }
        match parent_kind {
            Kind::Addition | Kind::Subtraction => {
                self.tree.is_of_kind(
                    child,
                    &[Kind::Subtraction, Kind::Opposite, Kind::Addition],
                ) || self.starts_negative(child)
            },
            Kind::Multiplication => self.tree.is_of_kind(
                child,
                &[Kind::Addition, Kind::Subtraction, Kind::Opposite, Kind::Division],
            ),
            Kind::Division => {
                fraction
                    || self.tree.is_of_kind(
                        child,
                        &[
                            Kind::Addition,
                            Kind::Subtraction,
                            Kind::Multiplication,
                            Kind::Division,
                            Kind::Opposite,
                        ],
                    )
            },
            Kind::Power => {
                fraction
                    || self.tree.is_of_kind(
                        child,
                        &[
                            Kind::Addition,
                            Kind::Subtraction,
                            Kind::Multiplication,
                            Kind::Division,
                            Kind::Opposite,
                        ],
                    )
            },
            Kind::Opposite => {
                fraction
                    || self.tree.is_of_kind(
                        child,
                        &[Kind::Addition, Kind::Subtraction, Kind::Opposite],
                    )
            },
            _ => false,
        }
    }

    /// True for a product whose leading factor is a negative number, such as the `-1*y` terms
    /// the reduction engine produces for subtraction.
    fn starts_negative(&self, id: NodeId) -> bool {
        self.tree.kind(id) == Kind::Multiplication
            && self
                .tree
                .child(id, 0)
                .and_then(|c| self.tree.sign(c))
                == Some(Ordering::Less)
    }

    /// True for a rational that renders with a `/` of its own, which binds like a division.
    fn renders_as_fraction(&self, id: NodeId) -> bool {
        self.tree.kind(id) == Kind::Rational
            && self.tree.number(id).map_or(false, |v| !v.is_integer())
    }
}

#[cfg(test)]
mod tests {
    use crate::primitive::rat;
    use crate::reduce::{reduce, ReductionContext};
    use crate::tree::from_ast;
    use canon_parser::parser::Parser;
    use pretty_assertions::assert_eq;
    use super::*;

    fn tree_of(input: &str) -> Tree {
        let ast = Parser::new(input).try_parse_full().unwrap();
        from_ast(&ast).unwrap()
    }

    fn rendered(tree: &Tree, mode: Mode) -> String {
        let mut buf = [0u8; 256];
        let len = render(
            tree,
            tree.root().unwrap(),
            &mut buf,
            mode,
            DisplayMode::Decimal,
            7,
        )
        .unwrap();
        String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    #[test]
    fn numbers_render_exactly() {
        let mut tree = Tree::new();
        let root = tree.rational(rat((-1, 3)));
        tree.set_root(root);
        assert_eq!(rendered(&tree, Mode::Displayable), "-1/3");
    }

    #[test]
    fn implicit_multiplication_is_parseable_only() {
        let tree = tree_of("2a");
        assert_eq!(rendered(&tree, Mode::Parseable), "2a");
        assert_eq!(rendered(&tree, Mode::Displayable), "2*a");
    }

    #[test]
    fn subtracting_a_negation_keeps_parentheses() {
        let tree = tree_of("a--b");
        assert_eq!(rendered(&tree, Mode::Displayable), "a-(-b)");
    }

    #[test]
    fn sums_parenthesize_negative_leading_products() {
        let mut tree = tree_of("x - y");
        reduce(&mut tree, &ReductionContext::default());
        assert_eq!(rendered(&tree, Mode::Displayable), "x+(-1*y)");
    }

    #[test]
    fn structural_parentheses_survive() {
        assert_eq!(rendered(&tree_of("(a+b)*2"), Mode::Displayable), "(a+b)*2");
        assert_eq!(rendered(&tree_of("(a+b)^2"), Mode::Displayable), "(a+b)^2");
        assert_eq!(rendered(&tree_of("a/(b*c)"), Mode::Displayable), "a/(b*c)");
        // right-associative powers need no parentheses on the exponent side
        assert_eq!(rendered(&tree_of("x^y^z"), Mode::Displayable), "x^y^z");
        assert_eq!(rendered(&tree_of("(x^y)^z"), Mode::Displayable), "(x^y)^z");
    }

    #[test]
    fn fractional_exponents_are_parenthesized() {
        let mut tree = Tree::new();
        let x = tree.symbol("x");
        let half = tree.rational(rat((1, 2)));
        let pow = tree.binary(Kind::Power, x, half);
        tree.set_root(pow);
        assert_eq!(rendered(&tree, Mode::Parseable), "x^(1/2)");
    }

    #[test]
    fn radix_literals_keep_their_base_when_parseable() {
        let tree = tree_of("0xff + 0b101");
        assert_eq!(rendered(&tree, Mode::Parseable), "0xff+0b101");
        assert_eq!(rendered(&tree, Mode::Displayable), "255+5");
    }

    #[test]
    fn parseable_output_round_trips() {
        for input in [
            "2a + 3",
            "a--b",
            "(a+b)*2",
            "x^(1/2)",
            "conj(x)*2",
            "0xff - 0o17",
            "1/3 + x/6",
            "-x^2",
        ] {
            let tree = tree_of(input);
            let text = rendered(&tree, Mode::Parseable);
            let back = tree_of(&text);
            assert!(
                tree.structural_eq(tree.root().unwrap(), &back, back.root().unwrap()),
                "{input} rendered as {text}, which parses differently",
            );
        }
    }

    #[test]
    fn exactly_full_buffers_are_reported_truncated() {
        let tree = tree_of("12345");
        let root = tree.root().unwrap();

        let mut buf = [0u8; 5];
        let result = render(&tree, root, &mut buf, Mode::Displayable, DisplayMode::Decimal, 7);
        assert_eq!(result, Err(TruncationError));

        let mut buf = [0u8; 6];
        let result = render(&tree, root, &mut buf, Mode::Displayable, DisplayMode::Decimal, 7);
        assert_eq!(result, Err(TruncationError));

        let mut buf = [0u8; 7];
        let result = render(&tree, root, &mut buf, Mode::Displayable, DisplayMode::Decimal, 7);
        assert_eq!(result, Ok(5));
        assert_eq!(&buf[..5], b"12345");
    }

    #[test]
    fn empty_buffers_are_truncated() {
        let tree = tree_of("1");
        let result = render(
            &tree,
            tree.root().unwrap(),
            &mut [],
            Mode::Displayable,
            DisplayMode::Decimal,
            7,
        );
        assert_eq!(result, Err(TruncationError));
    }

    #[test]
    fn scientific_display() {
        let mut tree = Tree::new();
        let root = tree.rational(rat((1, 4)));
        tree.set_root(root);

        let mut buf = [0u8; 64];
        let len = render(
            &tree,
            root,
            &mut buf,
            Mode::Displayable,
            DisplayMode::Scientific,
            3,
        )
        .unwrap();
        assert_eq!(std::str::from_utf8(&buf[..len]).unwrap(), "2.50e-1");

        // scientific mode never leaks into parseable output
        let len = render(
            &tree,
            root,
            &mut buf,
            Mode::Parseable,
            DisplayMode::Scientific,
            3,
        )
        .unwrap();
        assert_eq!(std::str::from_utf8(&buf[..len]).unwrap(), "1/4");
    }
}
