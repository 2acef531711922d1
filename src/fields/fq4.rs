//! Quartic extension `F_q^4 = F_q^2[r] / (r^2 - xi)`, `xi = 1 + u`.
//!
//! An element `x0 + x1 r` occupies four stack slots `[x0, x1]`, each an
//! `F_q^2` pair. This is the coefficient field of the cubic `F_q^12`
//! representation the Miller loop works in.

use crate::builder::ops::reduce_top_items;
use crate::builder::ops::verify_bottom_constant;
use crate::builder::OpFlags;
use crate::fields::fq2::Fq2;
use crate::fields::tower::{self, SlotLayout};
use crate::opcode::Opcode;
use crate::script::Script;

/// Script builder for `F_q^4` arithmetic.
#[derive(Debug, Clone)]
pub struct Fq4 {
    fq2: Fq2,
}

impl Fq4 {
    pub fn new(fq2: Fq2) -> Self {
        Self { fq2 }
    }

    pub fn fq2(&self) -> &Fq2 {
        &self.fq2
    }

    fn preamble(&self, flags: OpFlags) -> Script {
        if flags.check_constant {
            verify_bottom_constant(self.fq2.modulus())
        } else {
            Script::new()
        }
    }

    fn tail(&self, flags: OpFlags) -> Script {
        if flags.take_modulo {
            reduce_top_items(
                4,
                flags.positive_modulo,
                flags.clean_constant,
                flags.is_constant_reused,
            )
        } else {
            Script::new()
        }
    }

    /// `[.., X, Y] -> [.., X + Y]`
    pub fn add(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(tower::add_slots(4));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X, Y] -> [.., X - Y]`
    pub fn subtract(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(tower::sub_slots(4));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., -X]`
    pub fn negate(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(tower::negate_slots(4));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X, Y] -> [.., X * Y]`
    pub fn mul(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        let layout = SlotLayout::fq4();
        out.append(tower::mul_layout(&self.fq2, &layout, &layout, &layout));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., X^2]`
    pub fn square(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(crate::builder::ops::pick(3, 4));
        let layout = SlotLayout::fq4();
        out.append(tower::mul_layout(&self.fq2, &layout, &layout, &layout));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., X * r]`: the non-residue fragment of the cubic
    /// extension above this field, `(x0 + x1 r) r = xi x1 + x0 r`.
    pub fn mul_by_r(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.op(Opcode::Op2Swap);
        out.op(Opcode::OpToAltStack).op(Opcode::OpToAltStack);
        out.append(self.fq2.mul_by_one_plus_u(OpFlags::bare()));
        out.op(Opcode::OpFromAltStack).op(Opcode::OpFromAltStack);
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., Conjugate(X)] = x0 - x1 r`, the `q^2`-power
    /// Frobenius of the quartic extension.
    pub fn conjugate(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.op(Opcode::OpNegate);
        out.op(Opcode::OpSwap);
        out.op(Opcode::OpNegate);
        out.op(Opcode::OpSwap);
        out.append(self.tail(flags));
        out
    }
}
