//! Elliptic-curve script builders.
//!
//! The algebraic primitives take the gradient of the relevant line as a
//! witness instead of computing field inversions on-stack; with
//! `verify_gradient` the emitted script proves the witness correct
//! before using it. The point at infinity is the `0x00` byte-literal
//! sentinel, one per coordinate slot, and only
//! [`ec_fq::EllipticCurveFq::point_addition_with_unknown_points`]
//! branches on it.

pub mod ec_fq;
pub mod ec_fq2;
pub mod unrolled;

/// The infinity sentinel for a single coordinate slot: a `0x00` data
/// payload, distinct from the numeric zero `OP_0` pushes.
pub const INFINITY_COORDINATE: [u8; 1] = [0x00];
