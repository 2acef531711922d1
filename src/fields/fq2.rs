//! Quadratic extension `F_q[u] / (u^2 - non_residue)`.
//!
//! An element `x0 + x1*u` occupies two stack slots `[x0, x1]` with `x1`
//! on top. All operations consume their operands from the top of the
//! stack and leave the result components in slot order.

use num_bigint::BigInt;

use crate::builder::ops::{
    fetch_bottom_constant, mod_core, mod_from_altstack, verify_bottom_constant,
};
use crate::builder::OpFlags;
use crate::opcode::Opcode;
use crate::script::Script;

/// Script builder for `F_q^2` arithmetic.
///
/// The non-residue is the constant `u^2`; the tower instantiations in
/// this crate use `-1`, with `1 + u` as the non-residue of the next
/// extension (see [`Fq2::mul_by_one_plus_u`]).
#[derive(Debug, Clone)]
pub struct Fq2 {
    modulus: BigInt,
    non_residue: BigInt,
}

impl Fq2 {
    pub fn new(modulus: BigInt, non_residue: BigInt) -> Self {
        assert!(
            non_residue != BigInt::from(0),
            "the non-residue of a quadratic extension cannot be zero"
        );
        Self {
            modulus,
            non_residue,
        }
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    pub fn non_residue(&self) -> &BigInt {
        &self.non_residue
    }

    fn preamble(&self, flags: OpFlags) -> Script {
        if flags.check_constant {
            verify_bottom_constant(&self.modulus)
        } else {
            Script::new()
        }
    }

    /// Reduction tail for the common staging where `c0` is on the stack
    /// top and `c1` waits on the altstack. Without reduction the pending
    /// component is simply pulled back.
    fn tail_with_alt(&self, flags: OpFlags) -> Script {
        let mut out = Script::new();
        if flags.take_modulo {
            out.append(fetch_bottom_constant(flags.clean_constant));
            out.append(mod_core(flags.positive_modulo, true));
            out.append(mod_from_altstack(
                flags.positive_modulo,
                flags.is_constant_reused,
            ));
        } else {
            out.op(Opcode::OpFromAltStack);
        }
        out
    }

    /// `[.., X, Y] -> [.., X + Y]`
    pub fn add(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        // (x1 + y1) to the altstack, (x0 + y0) on the stack.
        out.ops(&[Opcode::OpRot, Opcode::OpAdd, Opcode::OpToAltStack, Opcode::OpAdd]);
        out.append(self.tail_with_alt(flags));
        out
    }

    /// `[.., X, Y] -> [.., X - Y]`
    pub fn subtract(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.ops(&[
            Opcode::OpRot,
            Opcode::OpSwap,
            Opcode::OpSub,
            Opcode::OpToAltStack,
            Opcode::OpSub,
        ]);
        out.append(self.tail_with_alt(flags));
        out
    }

    /// `[.., X, Y, Z] -> [.., X + Y + Z]`
    ///
    /// When reducing, the inputs must already be non-negative.
    pub fn add_three(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        // (y1 + z1) to the altstack, then x0 + y0 + z0.
        out.ops(&[Opcode::OpRot, Opcode::OpAdd, Opcode::OpToAltStack]);
        out.ops(&[Opcode::OpAdd, Opcode::OpRot, Opcode::OpAdd]);
        if flags.take_modulo {
            out.append(fetch_bottom_constant(flags.clean_constant));
            out.append(mod_core(flags.positive_modulo, true));
            // Stack: x1 q c0'; rebuild [c0', q, x1 + y1 + z1] and reduce.
            out.ops(&[Opcode::OpSwap, Opcode::OpRot]);
            out.ops(&[Opcode::OpFromAltStack, Opcode::OpAdd]);
            out.append(crate::builder::ops::mod_value_on_top(
                flags.positive_modulo,
                flags.is_constant_reused,
            ));
        } else {
            out.op(Opcode::OpSwap);
            out.ops(&[Opcode::OpFromAltStack, Opcode::OpAdd]);
        }
        out
    }

    /// `[.., X] -> [.., -X]`
    pub fn negate(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.ops(&[Opcode::OpNegate, Opcode::OpToAltStack, Opcode::OpNegate]);
        out.append(self.tail_with_alt(flags));
        out
    }

    /// `[.., X, s] -> [.., s * X]` for a base-field scalar `s` on top.
    pub fn scalar_mul(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.ops(&[Opcode::OpTuck, Opcode::OpMul, Opcode::OpToAltStack, Opcode::OpMul]);
        out.append(self.tail_with_alt(flags));
        out
    }

    /// `[.., X, Y] -> [.., X * Y]`
    ///
    /// `(x0 + x1 u)(y0 + y1 u) = (x0 y0 + r x1 y1) + (x0 y1 + x1 y0) u`
    /// with `r` the non-residue.
    pub fn mul(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);

        // First component, leaving the operands untouched below it.
        out.ops(&[Opcode::Op2Over, Opcode::Op2Over]);
        out.ops(&[Opcode::OpRot, Opcode::OpMul, Opcode::OpToAltStack]);
        out.op(Opcode::OpMul);
        out.op(Opcode::OpFromAltStack);
        if self.non_residue == BigInt::from(-1) {
            out.op(Opcode::OpSub);
        } else {
            out.push_int(&self.non_residue);
            out.ops(&[Opcode::OpMul, Opcode::OpAdd]);
        }

        // Second component, consuming the operands.
        out.ops(&[Opcode::Op2Swap, Opcode::OpMul]);
        out.ops(&[Opcode::Op2Swap, Opcode::OpMul]);
        out.op(Opcode::OpAdd);

        if flags.take_modulo {
            out.op(Opcode::OpToAltStack);
            out.append(self.tail_with_alt(flags));
        }
        out
    }

    /// `[.., X] -> [.., X^2]`
    pub fn square(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);

        if self.non_residue == BigInt::from(-1) {
            // (x0 - x1)(x0 + x1) and 2 x0 x1.
            out.ops(&[Opcode::Op2Dup, Opcode::Op2Dup]);
            out.ops(&[Opcode::OpSub, Opcode::Op2Swap, Opcode::OpAdd, Opcode::OpMul]);
            if flags.take_modulo {
                out.append(fetch_bottom_constant(flags.clean_constant));
                out.append(mod_core(flags.positive_modulo, true));
                out.ops(&[Opcode::Op2Swap, Opcode::OpMul, Opcode::Op2, Opcode::OpMul]);
                out.op(Opcode::OpRot);
                // Stack: c0' (2 x0 x1) q — the modulus is back on top.
                out.append(mod_core(flags.positive_modulo, flags.is_constant_reused));
            } else {
                out.ops(&[
                    Opcode::OpRot,
                    Opcode::OpRot,
                    Opcode::OpMul,
                    Opcode::Op2,
                    Opcode::OpMul,
                ]);
            }
        } else {
            // 2 x0 x1 to the altstack, x0^2 + r x1^2 on the stack.
            out.ops(&[Opcode::Op2Dup, Opcode::Op2, Opcode::OpMul, Opcode::OpMul]);
            out.op(Opcode::OpToAltStack);
            out.op(Opcode::OpDup);
            out.push_int(&self.non_residue);
            out.ops(&[Opcode::OpMul, Opcode::OpMul]);
            out.ops(&[Opcode::OpSwap, Opcode::OpDup, Opcode::OpMul, Opcode::OpAdd]);
            out.append(self.tail_with_alt(flags));
        }
        out
    }

    /// `[.., X] -> [.., Conjugate(X)]`, the `q`-power Frobenius.
    pub fn conjugate(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.op(Opcode::OpNegate);
        if flags.take_modulo {
            out.op(Opcode::OpToAltStack);
            out.append(fetch_bottom_constant(flags.clean_constant));
            out.append(mod_core(flags.positive_modulo, true));
            out.append(mod_from_altstack(
                flags.positive_modulo,
                flags.is_constant_reused,
            ));
        }
        out
    }

    /// `[.., X] -> [.., X * u]`
    pub fn mul_by_u(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        if self.non_residue == BigInt::from(-1) {
            out.op(Opcode::OpNegate);
        } else {
            out.push_int(&self.non_residue);
            out.op(Opcode::OpMul);
        }
        if flags.take_modulo {
            out.append(fetch_bottom_constant(flags.clean_constant));
            out.append(mod_core(flags.positive_modulo, true));
            out.ops(&[Opcode::OpRot, Opcode::OpRot]);
            out.append(mod_core(
                flags.positive_modulo,
                flags.is_constant_reused,
            ));
        } else {
            out.op(Opcode::OpSwap);
        }
        out
    }

    /// `[.., X] -> [.., X * (1 + u)]`
    ///
    /// This is the non-residue multiplication of the degree-6 and
    /// degree-4 extensions built on top of this field.
    pub fn mul_by_one_plus_u(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.ops(&[Opcode::Op2Dup, Opcode::OpAdd, Opcode::OpToAltStack]);
        if self.non_residue == BigInt::from(-1) {
            out.ops(&[Opcode::OpNegate, Opcode::OpAdd]);
        } else {
            out.push_int(&self.non_residue);
            out.ops(&[Opcode::OpMul, Opcode::OpAdd]);
        }
        out.append(self.tail_with_alt(flags));
        out
    }
}
