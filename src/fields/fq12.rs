//! Degree-12 extension in its quadratic-over-cubic shape:
//! `F_q^12 = F_q^6[w] / (w^2 - v)`.
//!
//! An element `y0 + y1 w` occupies twelve stack slots `[y0, y1]`, each
//! half an `F_q^6` element. The final exponentiation runs in this
//! representation; the Miller loop's cubic representation is converted
//! through [`crate::fields::fq12_cubic::Fq12Cubic::to_quadratic`].

use num_bigint::BigInt;

use crate::builder::ops::{pick, reduce_top_items, roll, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::fields::fq2::Fq2;
use crate::fields::fq6::Fq6;
use crate::fields::tower::{self, SlotLayout};
use crate::opcode::Opcode;
use crate::script::Script;

/// One Frobenius constant `gamma_{n,j} = xi^{j (q^n - 1) / 6}` as an
/// `F_q^2` pair.
pub type Gamma = (BigInt, BigInt);

/// Script builder for `F_q^12` arithmetic.
///
/// `gammas[n - 1][j - 1]` holds `gamma_{n,j}` for the Frobenius powers
/// the final exponentiation uses (`n = 1, 2, 3`, `j = 1..=5`).
#[derive(Debug, Clone)]
pub struct Fq12 {
    fq2: Fq2,
    fq6: Fq6,
    gammas: Vec<Vec<Gamma>>,
}

impl Fq12 {
    pub fn new(fq2: Fq2, fq6: Fq6, gammas: Vec<Vec<Gamma>>) -> Self {
        for row in &gammas {
            assert_eq!(row.len(), 5, "five gamma constants per Frobenius power");
        }
        Self { fq2, fq6, gammas }
    }

    pub fn fq2(&self) -> &Fq2 {
        &self.fq2
    }

    pub fn fq6(&self) -> &Fq6 {
        &self.fq6
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
        let layout = SlotLayout::fq12_quadratic();
        out.append(tower::mul_layout(&self.fq2, &layout, &layout, &layout));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., X^2]`
    pub fn square(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(pick(11, 12));
        let layout = SlotLayout::fq12_quadratic();
        out.append(tower::mul_layout(&self.fq2, &layout, &layout, &layout));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X, Y] -> [.., X + Y]`
    pub fn add(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(tower::add_slots(12));
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., Conjugate(X)] = y0 - y1 w`.
    ///
    /// In the cyclotomic subgroup the conjugate is the inverse, which is
    /// why the hard exponentiation never divides.
    pub fn conjugate(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        for _ in 0..6 {
            out.append(roll(5, 1));
            out.op(Opcode::OpNegate);
        }
        out.append(self.tail(flags));
        out
    }

    /// `[.., X] -> [.., X^{q^n}]` for odd `n`.
    ///
    /// Slot `t^j` maps to `Conjugate(c_j) * gamma_{n,j}`; the
    /// conjugation is the `F_q^2` Frobenius, odd powers of which reduce
    /// to a single one.
    pub fn frobenius_odd(&self, n: usize, flags: OpFlags) -> Script {
        assert!(n % 2 == 1, "frobenius_odd requires an odd power, got {n}");
        self.frobenius(n, true, flags)
    }

    /// `[.., X] -> [.., X^{q^n}]` for even `n`: no conjugation, only
    /// the gamma multiplications.
    pub fn frobenius_even(&self, n: usize, flags: OpFlags) -> Script {
        assert!(n % 2 == 0, "frobenius_even requires an even power, got {n}");
        self.frobenius(n, false, flags)
    }

    fn frobenius(&self, n: usize, conjugate: bool, flags: OpFlags) -> Script {
        let gammas = &self.gammas[n - 1];
        let mut out = self.preamble(flags);
        for slot in SlotLayout::fq12_quadratic().slots() {
            // Cycle the deepest coefficient to the top and transform it
            // in place; after six rounds the order is restored.
            out.append(roll(11, 2));
            if conjugate {
                out.op(Opcode::OpNegate);
            }
            if slot.degree > 0 {
                let (re, im) = &gammas[slot.degree - 1];
                out.push_int(re);
                out.push_int(im);
                out.append(self.fq2.mul(OpFlags::bare()));
            }
        }
        out.append(self.tail(flags));
        out
    }
}
