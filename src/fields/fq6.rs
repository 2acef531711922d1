//! Sextic extension `F_q^6 = F_q^2[v] / (v^3 - xi)`, `xi = 1 + u`.
//!
//! An element `x0 + x1 v + x2 v^2` occupies six stack slots
//! `[x0, x1, x2]`, each an `F_q^2` pair. This is the coefficient field
//! of the quadratic `F_q^12` representation the final exponentiation
//! works in.

use crate::builder::ops::{pick, reduce_top_items, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::fields::fq2::Fq2;
use crate::fields::tower::{self, SlotLayout};
use crate::script::Script;

/// Script builder for `F_q^6` arithmetic.
#[derive(Debug, Clone)]
pub struct Fq6 {
    fq2: Fq2,
}

impl Fq6 {
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
                6,
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
        out.append(tower::add_slots(6));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X, Y] -> [.., X - Y]`
    pub fn subtract(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(tower::sub_slots(6));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., -X]`
    pub fn negate(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(tower::negate_slots(6));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X, Y] -> [.., X * Y]`
    pub fn mul(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        let layout = SlotLayout::fq6();
        out.append(tower::mul_layout(&self.fq2, &layout, &layout, &layout));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., X^2]`
    pub fn square(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(pick(5, 6));
        let layout = SlotLayout::fq6();
        out.append(tower::mul_layout(&self.fq2, &layout, &layout, &layout));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., X * v]`: the non-residue fragment of the
    /// quadratic extension above this field,
    /// `(x0 + x1 v + x2 v^2) v = xi x2 + x0 v + x1 v^2`.
    pub fn mul_by_v(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        // Rotate the top slot pair to the bottom of the element and
        // multiply it by xi.
        out.append(crate::builder::ops::roll(5, 4));
        out.append(tower::to_altstack(4));
        out.append(self.fq2.mul_by_one_plus_u(OpFlags::bare()));
        out.append(tower::from_altstack(4));
        out.append(self.tail(flags));
        out
    }
}
