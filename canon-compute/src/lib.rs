//! Canonical reduction of expression trees.
//!
//! This crate is the core of the pipeline: it converts the AST produced by `canon-parser` into an
//! arena-backed expression [tree], normalizes that tree bottom-up with the [reduction
//! engine](reduce), and renders the result back into a caller-supplied, fixed-capacity buffer
//! with the [bounded serializer](fmt).
//!
//! All arithmetic performed during reduction is exact: integers and rationals are `rug` bignums,
//! and no floating-point value is ever produced. Reduction is deterministic and single-threaded;
//! the same input tree and [`ReductionContext`](reduce::ReductionContext) always produce the same
//! canonical tree.

pub mod fmt;
pub mod pipeline;
pub mod primitive;
pub mod reduce;
pub mod tree;
