//! Degree-12 extension in its cubic-over-quadratic shape:
//! `F_q^12 = F_q^4[w] / (w^3 - r)`.
//!
//! An element `x0 + x1 w + x2 w^2` occupies twelve stack slots, each
//! `xi` an `F_q^4` pair of `F_q^2` coefficients. Line evaluations are
//! sparse in this representation, so the Miller loop accumulates here
//! and converts once, at the start of the final exponentiation, to the
//! quadratic shape via [`Fq12Cubic::to_quadratic`].

use crate::builder::ops::{pick, reduce_top_items, roll, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::fields::fq2::Fq2;
use crate::fields::fq4::Fq4;
use crate::fields::tower::{self, SlotLayout};
use crate::opcode::Opcode;
use crate::script::Script;

/// Script builder for the cubic `F_q^12` representation.
#[derive(Debug, Clone)]
pub struct Fq12Cubic {
    fq2: Fq2,
    fq4: Fq4,
}

impl Fq12Cubic {
    pub fn new(fq2: Fq2, fq4: Fq4) -> Self {
        Self { fq2, fq4 }
    }

    pub fn fq2(&self) -> &Fq2 {
        &self.fq2
    }

    pub fn fq4(&self) -> &Fq4 {
        &self.fq4
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
                12,
                flags.positive_modulo,
                flags.clean_constant,
                flags.is_constant_reused,
            )
        } else {
            Script::new()
        }
    }

    /// `[.., X, Y] -> [.., X * Y]`
    pub fn mul(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        let layout = SlotLayout::fq12_cubic();
        out.append(tower::mul_layout(&self.fq2, &layout, &layout, &layout));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., X^2]`
    pub fn square(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(pick(11, 12));
        let layout = SlotLayout::fq12_cubic();
        out.append(tower::mul_layout(&self.fq2, &layout, &layout, &layout));
        out.append(self.tail(flags));
        out
    }

    /// The isomorphism onto the quadratic representation.
    ///
    /// Writing the element as `((a, b), (c, d), (e, f))` in `F_q^2`
    /// pairs, the quadratic shape is `((a, e, d), (c, b, f))` — a fixed
    /// permutation of the six coefficient pairs, emitted as rolls.
    pub fn to_quadratic(&self) -> Script {
        let mut out = Script::new();
        // (a b c d e f) -> (b c d e f a)
        out.append(roll(11, 2));
        // -> (b c d f a e)
        out.op(Opcode::Op2Rot);
        // -> (b c f a e d)
        out.append(roll(7, 2));
        // -> (b f a e d c)
        out.append(roll(9, 2));
        // -> (f a e d c b)
        out.append(roll(11, 2));
        // -> (a e d c b f)
        out.append(roll(11, 2));
        out
    }
}
