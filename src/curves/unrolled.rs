//! Unrolled double-and-add scalar multiplication and fixed-base
//! multi-scalar multiplication.
//!
//! The loop is compiled for a fixed bound `M = floor(log2(max))`: the
//! witness supplies, for every one of the `M` iterations, exactly four
//! stack items (two markers, one or two gradients, zero padding), so
//! the emitted script is straight-line apart from the per-iteration
//! `OP_IF` gates and later constructions can index into the witness
//! region — that is what lets RefTx read a scalar's value back out of
//! the markers with [`extract_scalar_as_unsigned`].

use num_bigint::BigInt;
use num_traits::Zero;

use crate::builder::budget::unrolled_step_size;
use crate::builder::ops::{drop_bottom_constant, pick, roll, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::curves::ec_fq::EllipticCurveFq;
use crate::descriptor::{StackEllipticCurvePoint, StackFiniteFieldElement};
use crate::error::BuilderError;
use crate::opcode::Opcode;
use crate::script::Script;

/// Number of unrolled iterations for a given multiplier bound.
///
/// Scalars up to and including `max_multiplier` fit in
/// `floor(log2(max)) + 1` bits; the leading bit is implicit, leaving
/// `floor(log2(max))` compiled iterations.
pub fn iterations(max_multiplier: &BigInt) -> Result<usize, BuilderError> {
    let bits = max_multiplier.bits() as usize;
    if bits < 2 {
        return Err(BuilderError::MaxMultiplierTooSmall {
            max_multiplier_bits: bits,
        });
    }
    Ok(bits - 1)
}

/// Script builder for unrolled scalar multiplication over the base
/// field.
#[derive(Debug, Clone)]
pub struct EllipticCurveFqUnrolled {
    ec: EllipticCurveFq,
}

impl EllipticCurveFqUnrolled {
    pub fn new(ec: EllipticCurveFq) -> Self {
        Self { ec }
    }

    pub fn ec(&self) -> &EllipticCurveFq {
        &self.ec
    }

    /// Unrolled `a * P` for `0 <= a <= max_multiplier`.
    ///
    /// Stack in:
    /// `[q .. marker_a_is_zero, block_1, .., block_M, xP, yP]` where
    /// each block holds four witness items (see
    /// [`crate::unlock::unrolled::UnrolledMultiplicationUnlockingKey`]).
    /// Stack out: `[q .. xP yP xaP yaP]` — the base point stays, the
    /// product lands on top, the infinity sentinel `0x00 0x00` standing
    /// in when `a = 0`.
    ///
    /// Every gradient consumed along the way is verified; a wrong bit
    /// pattern leads the accumulator somewhere a later gradient check
    /// cannot justify.
    pub fn unrolled_multiplication(
        &self,
        max_multiplier: &BigInt,
        modulo_threshold: usize,
        check_constant: bool,
        clean_constant: bool,
    ) -> Result<Script, BuilderError> {
        let m = iterations(max_multiplier)?;
        let q_bits = self.ec.modulus().bits() as f64;

        let mut out = if check_constant {
            verify_bottom_constant(self.ec.modulus())
        } else {
            Script::new()
        };

        // T = P
        out.op(Opcode::Op2Dup);

        let mut current_size = q_bits;
        for i in (0..m).rev() {
            // Both the doubling and the conditional addition must fit
            // under the threshold, whichever of them executes.
            let size_after = unrolled_step_size(current_size);
            let take_modulo = size_after > modulo_threshold as f64 || i == 0;
            current_size = if take_modulo { q_bits } else { size_after };

            let flags = OpFlags {
                take_modulo,
                ..OpFlags::default()
            };

            // Stack: [.., block items, xP, yP, xT, yT]
            out.append(roll(4, 1)); // doubling marker
            out.op(Opcode::OpIf);
            {
                out.append(
                    self.ec
                        .point_algebraic_doubling(
                            flags,
                            true,
                            StackFiniteFieldElement::rolled(4),
                            StackEllipticCurvePoint::rolled(1),
                        )
                        .expect("fixed layout"),
                );
                out.append(roll(4, 1)); // addition marker
                out.op(Opcode::OpIf);
                {
                    out.append(
                        self.ec
                            .point_algebraic_addition(
                                flags,
                                true,
                                StackFiniteFieldElement::rolled(4),
                                StackEllipticCurvePoint::picked(3),
                                StackEllipticCurvePoint::rolled(1),
                            )
                            .expect("fixed layout"),
                    );
                }
                out.op(Opcode::OpElse);
                {
                    // Unused filler slot of a no-addition block.
                    out.append(roll(4, 1));
                    out.op(Opcode::OpDrop);
                }
                out.op(Opcode::OpEndIf);
            }
            out.op(Opcode::OpElse);
            {
                // Padded iteration: the whole block is dead weight.
                for _ in 0..3 {
                    out.append(roll(4, 1));
                    out.op(Opcode::OpDrop);
                }
            }
            out.op(Opcode::OpEndIf);
        }

        // Collapse to the infinity sentinel when the scalar is zero.
        out.append(roll(4, 1));
        out.op(Opcode::OpIf);
        out.op(Opcode::Op2Drop);
        out.push_data(&crate::curves::INFINITY_COORDINATE);
        out.push_data(&crate::curves::INFINITY_COORDINATE);
        out.op(Opcode::OpEndIf);

        if clean_constant {
            out.append(drop_bottom_constant());
        }

        Ok(out)
    }

    /// `sum_i a_i B_i` for hard-coded base points `B_i`.
    ///
    /// Stack in:
    /// `[q .. addition gradients, scalar witnesses (index 0 on top)]`;
    /// stack out: `[q .. xS yS]` (or the infinity sentinel). A base
    /// equal to `(0, 0)` is compiled as the infinity sentinel, and its
    /// product is forced to infinity by the witness's zero marker.
    pub fn msm_with_fixed_bases(
        &self,
        bases: &[(BigInt, BigInt)],
        max_multipliers: &[BigInt],
        modulo_threshold: usize,
        check_constant: bool,
        clean_constant: bool,
    ) -> Result<Script, BuilderError> {
        if bases.len() != max_multipliers.len() {
            return Err(BuilderError::WrongMultiplierCount {
                expected: bases.len(),
                got: max_multipliers.len(),
            });
        }
        assert!(!bases.is_empty(), "msm needs at least one base");

        let mut out = if check_constant {
            verify_bottom_constant(self.ec.modulus())
        } else {
            Script::new()
        };

        // One unrolled multiplication per base. Index 0's witness region
        // is shallowest (that is what keeps the extraction offsets
        // fixed), so it is consumed first; products park on the
        // altstack.
        for i in 0..bases.len() {
            let (x, y) = &bases[i];
            if x.is_zero() && y.is_zero() {
                out.push_data(&crate::curves::INFINITY_COORDINATE);
                out.push_data(&crate::curves::INFINITY_COORDINATE);
            } else {
                out.push_int(x);
                out.push_int(y);
            }
            out.append(self.unrolled_multiplication(
                &max_multipliers[i],
                modulo_threshold,
                false,
                false,
            )?);
            // Drop the base, keep the product.
            out.op(Opcode::Op2Swap).op(Opcode::Op2Drop);
            out.op(Opcode::OpToAltStack).op(Opcode::OpToAltStack);
        }

        // Fold the products highest index first with gradient-verified
        // additions; the gradients sit just below the working area,
        // first-needed shallowest.
        out.op(Opcode::OpFromAltStack).op(Opcode::OpFromAltStack);
        for i in 1..bases.len() {
            out.op(Opcode::OpFromAltStack).op(Opcode::OpFromAltStack);
            let last = i == bases.len() - 1;
            out.append(self.ec.point_addition_with_unknown_points(OpFlags {
                take_modulo: true,
                clean_constant: last && clean_constant,
                ..OpFlags::default()
            }));
        }
        if bases.len() == 1 && clean_constant {
            out.append(drop_bottom_constant());
        }

        Ok(out)
    }
}

/// Reads a scalar's value back out of the fixed-width witness region.
///
/// `bit_lengths[k]` is the iteration count of the `k`-th scalar's
/// witness (`iterations(max_multipliers[k])`); the witness regions sit
/// on top of the stack, index 0 shallowest, exactly as the unlocking
/// key lays them out. The markers are picked (never consumed) and
/// folded MSB-first into the unsigned scalar value, which is left on
/// top of the stack.
///
/// A zero scalar's all-zero marker pattern folds to 1; callers binding
/// meaningful values (the RefTx sighash chunks) rely on the chunk being
/// nonzero, which for a hash output is a certainty.
pub fn extract_scalar_as_unsigned(bit_lengths: &[usize], index: usize) -> Script {
    let offset: usize = bit_lengths[..index].iter().map(|m| 4 * m + 1).sum();
    let m = bit_lengths[index];

    let mut out = Script::new();
    for i in 0..m {
        // Addition marker, then doubling marker, of the i-th deepest
        // block; earlier picks deepen everything by two per round.
        out.append(pick((offset + 4 * m - 2 - 2 * i) as i64, 1));
        out.append(pick((offset + 4 * m - 3 - 2 * i) as i64, 1));
    }
    out.op(Opcode::Op1);
    for _ in 0..m {
        out.op(Opcode::OpSwap);
        out.op(Opcode::OpIf);
        out.op(Opcode::Op2).op(Opcode::OpMul);
        out.op(Opcode::OpSwap);
        out.op(Opcode::OpIf);
        out.op(Opcode::Op1Add);
        out.op(Opcode::OpEndIf);
        out.op(Opcode::OpElse);
        out.op(Opcode::OpNip);
        out.op(Opcode::OpEndIf);
    }
    out
}
