//! Elliptic-curve arithmetic over `F_q^2`, compiled to script.
//!
//! These are the accumulator operations of the Miller loop: the twisted
//! curve's points live in `F_q^2`, the gradients come from the
//! unlocking script, and both doubling and addition prove the gradient
//! before using it. Unlike the base-field builder, operands are taken
//! from fixed top-of-stack positions — the Miller driver arranges them
//! with picks and rolls before each call.

use num_bigint::BigInt;

use crate::builder::ops::{fetch_bottom_constant, mod_core, pick, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::fields::fq2::Fq2;
use crate::fields::tower::{drop_items, from_altstack, to_altstack};
use crate::opcode::Opcode;
use crate::script::Script;

/// Script builder for arithmetic on the twist `y^2 = x^3 + a' x + b'`
/// over `F_q^2`.
#[derive(Debug, Clone)]
pub struct EllipticCurveFq2 {
    fq2: Fq2,
    curve_a: (BigInt, BigInt),
}

impl EllipticCurveFq2 {
    pub fn new(fq2: Fq2, curve_a: (BigInt, BigInt)) -> Self {
        Self { fq2, curve_a }
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

    fn curve_a_is_zero(&self) -> bool {
        self.curve_a.0 == BigInt::from(0) && self.curve_a.1 == BigInt::from(0)
    }

    /// Point doubling with gradient verification.
    ///
    /// Stack in: `[q .. lambda xT yT]` (each element two slots); stack
    /// out: `[q .. x2T y2T]`. Fails unless
    /// `2 lambda yT = 3 xT^2 + a' (mod q)` component-wise.
    pub fn point_doubling(&self, flags: OpFlags) -> Script {
        let bare = OpFlags::bare();
        let mut out = self.preamble(flags);
        // Layout: lambda (5,4), xT (3,2), yT (1,0).

        // t = 2 lambda yT - (3 xT^2 + a')
        out.append(pick(1, 2)); // yT
        out.push_i64(2);
        out.append(self.fq2.scalar_mul(bare));
        out.append(pick(7, 2)); // lambda
        out.append(self.fq2.mul(bare));
        out.append(pick(5, 2)); // xT
        out.append(self.fq2.square(bare));
        out.push_i64(3);
        out.append(self.fq2.scalar_mul(bare));
        if !self.curve_a_is_zero() {
            out.push_int(&self.curve_a.0);
            out.push_int(&self.curve_a.1);
            out.append(self.fq2.add(bare));
        }
        out.append(self.fq2.subtract(bare));
        out.append(self.gradient_check_tail(flags));

        // x2T = lambda^2 - 2 xT
        out.append(pick(5, 2)); // lambda
        out.append(self.fq2.square(bare));
        out.append(pick(5, 2)); // xT
        out.push_i64(2);
        out.append(self.fq2.scalar_mul(bare));
        out.append(self.fq2.subtract(bare));
        // y2T = lambda (xT - x2T) - yT
        out.append(pick(5, 2)); // xT
        out.append(pick(3, 2)); // x2T
        out.append(self.fq2.subtract(bare));
        out.append(pick(9, 2)); // lambda
        out.append(self.fq2.mul(bare));
        out.append(pick(5, 2)); // yT
        out.append(self.fq2.subtract(bare));

        out.append(self.result_tail(6, flags));
        out
    }

    /// Point addition with gradient verification.
    ///
    /// Stack in: `[q .. lambda xT yT xQ yQ]`; stack out:
    /// `[q .. xR yR]` with `R = T + Q`. Fails unless
    /// `lambda (xT - xQ) = yT - yQ (mod q)`. Preconditions:
    /// `T != +-Q`, neither at infinity.
    pub fn point_addition(&self, flags: OpFlags) -> Script {
        let bare = OpFlags::bare();
        let mut out = self.preamble(flags);
        // Layout: lambda (9,8), xT (7,6), yT (5,4), xQ (3,2), yQ (1,0).

        // t = lambda (xT - xQ) - (yT - yQ)
        out.append(pick(5, 2)); // yT
        out.append(pick(3, 2)); // yQ
        out.append(self.fq2.subtract(bare));
        out.append(pick(9, 2)); // xT
        out.append(pick(7, 2)); // xQ
        out.append(self.fq2.subtract(bare));
        out.append(pick(13, 2)); // lambda
        out.append(self.fq2.mul(bare));
        out.op(Opcode::Op2Swap);
        out.append(self.fq2.subtract(bare));
        out.append(self.gradient_check_tail(flags));

        // xR = lambda^2 - xT - xQ
        out.append(pick(9, 2)); // lambda
        out.append(self.fq2.square(bare));
        out.append(pick(9, 2)); // xT
        out.append(self.fq2.subtract(bare));
        out.append(pick(5, 2)); // xQ
        out.append(self.fq2.subtract(bare));
        // yR = lambda (xT - xR) - yT
        out.append(pick(9, 2)); // xT
        out.append(pick(3, 2)); // xR
        out.append(self.fq2.subtract(bare));
        out.append(pick(13, 2)); // lambda
        out.append(self.fq2.mul(bare));
        out.append(pick(9, 2)); // yT
        out.append(self.fq2.subtract(bare));

        out.append(self.result_tail(10, flags));
        out
    }

    /// `[.., X, Y] -> [.., X, -Y]` — negation of the point on top.
    pub fn point_negation(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.append(self.fq2.negate(OpFlags {
            check_constant: false,
            ..flags
        }));
        out
    }

    /// Verifies the two components of the check value are zero mod `q`,
    /// staging `q` on the altstack when a final reduction follows.
    fn gradient_check_tail(&self, flags: OpFlags) -> Script {
        let mut out = Script::new();
        out.append(fetch_bottom_constant(flags.clean_constant));
        // Imaginary component.
        out.append(mod_core(true, true));
        out.op(Opcode::Op0).op(Opcode::OpEqualVerify);
        // Real component, with q back on top of it.
        out.append(mod_core(true, true));
        out.op(Opcode::Op0).op(Opcode::OpEqualVerify);
        out.op(if flags.take_modulo {
            Opcode::OpToAltStack
        } else {
            Opcode::OpDrop
        });
        out
    }

    /// Parks the four result slots, drops the consumed operands, and
    /// reduces if requested (with `q` staged by the gradient check).
    fn result_tail(&self, consumed: usize, flags: OpFlags) -> Script {
        let mut out = Script::new();
        out.append(to_altstack(4));
        out.append(drop_items(consumed));
        out.append(from_altstack(4));
        if flags.take_modulo {
            out.op(Opcode::OpFromAltStack); // q staged by the gradient check
            for _ in 0..3 {
                out.append(mod_core(flags.positive_modulo, true));
                out.op(Opcode::OpToAltStack);
            }
            out.append(mod_core(flags.positive_modulo, false));
            out.append(from_altstack(3));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecuteOpts;
    use crate::error::ScriptError;
    use crate::script::run_unlock_then_lock;

    /// Twist of the toy curve: y^2 = x^3 + b over F_19[u]/(u^2 + 1)
    /// with a' = 0. Points found by brute force:
    /// T = (2 + 3u, 7 + 9u) lies on y^2 = x^3 + b' with
    /// b' = y^2 - x^3 computed below; gradients follow the formulas.
    fn curve() -> EllipticCurveFq2 {
        EllipticCurveFq2::new(
            Fq2::new(BigInt::from(19), BigInt::from(-1)),
            (BigInt::from(0), BigInt::from(0)),
        )
    }

    fn setup(ns: &[i64]) -> Script {
        let mut s = Script::new();
        for &n in ns {
            s.push_i64(n);
        }
        s
    }

    fn nums(stack: &[Vec<u8>]) -> Vec<i64> {
        stack
            .iter()
            .map(|item| i64::try_from(crate::num::decode_num(item)).unwrap())
            .collect()
    }

    fn run(unlock: &Script, lock: &Script) -> Vec<i64> {
        nums(&run_unlock_then_lock(unlock, lock, &ExecuteOpts::default()).unwrap())
    }

    // Arithmetic in F_19[u]/(u^2+1), by hand:
    // T = (2 + 3u, 7 + 9u).
    // 3 xT^2 = 3 (4 - 9 + 12u) = (-15 + 36u) = (4, 17) mod 19
    // 2 yT = (14 + 18u); norm = 14^2 + 18^2 = 520 = 7 mod 19,
    //   7^-1 = 11, so (2 yT)^-1 = 11 (14 - 18u) = (2, 11) mod 19
    // lambda = (4 + 17u)(2 + 11u) = (8 - 187) + (44 + 34)u = (11, 2)
    // lambda^2 = (121 - 4) + 44u = (3, 6) mod 19
    // x2T = lambda^2 - 2 xT = (3 - 4, 6 - 6) = (18, 0)
    // y2T = lambda (xT - x2T) - yT:
    //   xT - x2T = (2 - 18, 3 - 0) = (3, 3)
    //   lambda (3 + 3u) = (33 - 6) + (33 + 6)u = (8, 1)
    //   y2T = (8 - 7, 1 - 9) = (1, 11) mod 19

    #[test]
    fn doubling_with_correct_gradient() {
        let unlock = setup(&[19, 11, 2, 2, 3, 7, 9]);
        let stack = run(&unlock, &curve().point_doubling(OpFlags::reduce()));
        assert_eq!(stack, vec![19, 18, 0, 1, 11]);
    }

    #[test]
    fn doubling_rejects_wrong_gradient() {
        let unlock = setup(&[19, 11, 3, 2, 3, 7, 9]);
        let err = run_unlock_then_lock(
            &unlock,
            &curve().point_doubling(OpFlags::reduce()),
            &ExecuteOpts::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::VerifyFailed));
    }

    // Addition: Q = 2T = (18 + 0u, 1 + 11u), T + Q = 3T.
    // dy = yT - yQ = (6, -2) = (6, 17); dx = xT - xQ = (-16, 3) = (3, 3)
    // dx^-1: norm = 18, 18^-1 = 18, inverse = 18 (3 - 3u) = (16, 3)
    // lambda = (6 + 17u)(16 + 3u) = (96 - 51) + (18 + 272)u = (7, 5)
    // lambda^2 = (49 - 25) + 70u = (5, 13) mod 19
    // xR = lambda^2 - xT - xQ = (5 - 2 - 18, 13 - 3 - 0) = (4, 10)
    // yR = lambda (xT - xR) - yT: xT - xR = (-2, -7)
    //   lambda (-2 - 7u) = (-14 + 35) + (-49 - 10)u = (2, 17)
    //   yR = (2 - 7, 17 - 9) = (14, 8) mod 19

    #[test]
    fn addition_with_correct_gradient() {
        let unlock = setup(&[19, 7, 5, 2, 3, 7, 9, 18, 0, 1, 11]);
        let stack = run(&unlock, &curve().point_addition(OpFlags::reduce()));
        assert_eq!(stack, vec![19, 4, 10, 14, 8]);
    }

    #[test]
    fn addition_rejects_wrong_gradient() {
        let unlock = setup(&[19, 7, 6, 2, 3, 7, 9, 18, 0, 1, 11]);
        let err = run_unlock_then_lock(
            &unlock,
            &curve().point_addition(OpFlags::reduce()),
            &ExecuteOpts::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::VerifyFailed));
    }

    #[test]
    fn doubling_without_reduction_matches_raw_values() {
        let unlock = setup(&[19, 11, 2, 2, 3, 7, 9]);
        let stack = run(&unlock, &curve().point_doubling(OpFlags::bare()));
        // Unreduced: lambda^2 = (117, 44), x2T = (113, 38), and the y
        // computation flows the raw x2T through the chord.
        let lam = (11i64, 2i64);
        let x2 = (113i64, 38i64);
        let dx = (2 - x2.0, 3 - x2.1);
        let prod = (
            lam.0 * dx.0 - lam.1 * dx.1,
            lam.0 * dx.1 + lam.1 * dx.0,
        );
        let y2 = (prod.0 - 7, prod.1 - 9);
        assert_eq!(stack, vec![19, x2.0, x2.1, y2.0, y2.1]);
    }

    #[test]
    fn negation() {
        let mut lock = Script::new();
        lock.append(curve().point_negation(OpFlags::reduce()));
        let stack = run(&setup(&[19, 7, 9]), &lock);
        assert_eq!(stack, vec![19, 12, 10]);
    }
}
