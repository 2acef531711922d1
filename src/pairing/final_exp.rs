//! Final exponentiation: `f -> f^{(q^12 - 1) / r}`.
//!
//! The easy part raises to `(q^6 - 1)(q^2 + 1)` without ever inverting
//! on-stack: the inverse of the Miller output is a witness, proved by a
//! twelve-slot multiplication against the field identity. The hard part
//! raises to `(q^4 - q^2 + 1)/r` with the addition chain over the curve
//! parameter `u`, inside the cyclotomic subgroup where inversion is
//! conjugation and the `u`-power is a compile-time-unrolled
//! square-and-multiply.

use crate::builder::budget::ReductionTracker;
use crate::builder::ops::{pick, reduce_top_items, roll, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::fields::fq12::Fq12;
use crate::fields::fq12_cubic::Fq12Cubic;
use crate::fields::tower::{drop_items, from_altstack, to_altstack};
use crate::opcode::Opcode;
use crate::pairing::params::CurveParams;
use crate::script::Script;

/// Script builder for both halves of the final exponentiation.
#[derive(Debug, Clone)]
pub struct FinalExponentiation {
    params: CurveParams,
    fq12: Fq12,
    fq12_cubic: Fq12Cubic,
}

impl FinalExponentiation {
    pub fn new(params: CurveParams, fq12: Fq12, fq12_cubic: Fq12Cubic) -> Self {
        Self {
            params,
            fq12,
            fq12_cubic,
        }
    }

    /// Easy part with the witnessed inverse check:
    /// `f -> f^{(q^6 - 1)(q^2 + 1)}`.
    ///
    /// Stack in: `[q .. inverse(12) f(12)]` — `f` in the cubic
    /// representation as the Miller loop leaves it, the claimed inverse
    /// already in the quadratic one. Stack out: `[q .. g(12)]`
    /// (quadratic). Fails unless `inverse * f = 1` slot for slot.
    pub fn easy_exponentiation_with_inverse_check(&self, flags: OpFlags) -> Script {
        let bare = OpFlags::bare();
        let mut out = if flags.check_constant {
            verify_bottom_constant(self.fq12.fq2().modulus())
        } else {
            Script::new()
        };

        out.append(self.fq12_cubic.to_quadratic());

        // inverse * f = 1, checked on all twelve slots.
        out.append(pick(23, 12));
        out.append(pick(23, 12));
        out.append(self.fq12.mul(OpFlags::reduce()));
        for _ in 0..11 {
            out.op(Opcode::Op0);
            out.op(Opcode::OpEqualVerify);
        }
        out.op(Opcode::Op1);
        out.op(Opcode::OpEqualVerify);

        // Conjugate(f) * inverse = f^{q^6 - 1}, then multiply by its
        // q^2-power.
        out.append(self.fq12.conjugate(bare));
        out.append(self.fq12.mul(bare));
        out.append(pick(11, 12));
        out.append(self.fq12.frobenius_even(2, bare));
        out.append(self.fq12.mul(flags));
        out
    }

    /// Hard part: `g -> g^{(q^4 - q^2 + 1)/r}` for the BLS family,
    /// driven by the loop parameter `u`.
    pub fn hard_exponentiation(&self, modulo_threshold: usize, flags: OpFlags) -> Script {
        let bare = OpFlags::bare();
        let reduce = OpFlags::reduce();
        let u = self.params.loop_digits.clone();
        let u_half: Vec<i8> = u[1..].to_vec();

        let mut out = if flags.check_constant {
            verify_bottom_constant(self.fq12.fq2().modulus())
        } else {
            Script::new()
        };

        // t0 = g^2
        out.append(pick(11, 12));
        out.append(self.fq12.square(reduce));
        // t1 = t0^u
        out.append(pick(11, 12));
        out.append(self.cyclotomic_exponentiation(&u, modulo_threshold));
        // t2 = t1^(u/2)
        out.append(pick(11, 12));
        out.append(self.cyclotomic_exponentiation(&u_half, modulo_threshold));
        // t3 = Conjugate(g)
        out.append(pick(47, 12));
        out.append(self.fq12.conjugate(bare));
        // t1 = Conjugate(t1 * t3) * t2
        out.append(roll(35, 12));
        out.append(self.fq12.mul(bare));
        out.append(self.fq12.conjugate(bare));
        out.append(self.fq12.mul(reduce));
        // t2 = t1^u
        out.append(pick(11, 12));
        out.append(self.cyclotomic_exponentiation(&u, modulo_threshold));
        // t3 = t2^u
        out.append(pick(11, 12));
        out.append(self.cyclotomic_exponentiation(&u, modulo_threshold));
        // t3 = t3 * Conjugate(t1)
        out.append(pick(35, 12));
        out.append(self.fq12.conjugate(bare));
        out.append(self.fq12.mul(reduce));
        // t1 = t1^(q^3), t2 = t2^(q^2), then t1 * t2
        out.append(roll(35, 12));
        out.append(self.fq12.frobenius_odd(3, bare));
        out.append(roll(35, 12));
        out.append(self.fq12.frobenius_even(2, bare));
        out.append(self.fq12.mul(bare));
        // t2 = t3^u * t0 * g
        out.append(pick(23, 12));
        out.append(self.cyclotomic_exponentiation(&u, modulo_threshold));
        out.append(roll(47, 12));
        out.append(self.fq12.mul(bare));
        out.append(roll(47, 12));
        out.append(self.fq12.mul(bare));
        // t1 = t1 * t2
        out.append(self.fq12.mul(bare));
        // result = t1 * t3^q
        out.append(roll(23, 12));
        out.append(self.fq12.frobenius_odd(1, bare));
        out.append(self.fq12.mul(flags));
        out
    }

    /// Compile-time-unrolled square-and-multiply in the cyclotomic
    /// subgroup.
    ///
    /// Stack in: `[.., g(12)]`; stack out: `[.., g^e]` (reduced), `g`
    /// consumed. `digits` are signed, least significant first; negative
    /// digits multiply by the conjugate.
    pub fn cyclotomic_exponentiation(&self, digits: &[i8], modulo_threshold: usize) -> Script {
        let bare = OpFlags::bare();
        assert!(
            matches!(digits.last(), Some(&1) | Some(&-1)),
            "the exponent's leading digit must be non-zero"
        );
        let mut tracker =
            ReductionTracker::new(self.params.modulus_bits(), modulo_threshold);

        let mut out = pick(11, 12);
        if digits[digits.len() - 1] == -1 {
            out.append(self.fq12.conjugate(bare));
        }

        let mut reduced = true;
        for i in (0..digits.len() - 1).rev() {
            let last = i == 0 && digits[0] == 0;
            let take = tracker.step_square(last);
            out.append(self.fq12.square(OpFlags {
                take_modulo: take,
                ..OpFlags::default()
            }));
            reduced = take;
            if digits[i] != 0 {
                out.append(pick(23, 12));
                if digits[i] == -1 {
                    out.append(self.fq12.conjugate(bare));
                }
                let take = tracker.step_mul_by_reduced(i == 0);
                out.append(self.fq12.mul(OpFlags {
                    take_modulo: take,
                    ..OpFlags::default()
                }));
                reduced = take;
            }
        }
        if !reduced {
            out.append(reduce_top_items(12, true, false, false));
        }

        // Drop the base kept underneath.
        out.append(to_altstack(12));
        out.append(drop_items(12));
        out.append(from_altstack(12));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecuteOpts;
    use crate::error::ScriptError;
    use crate::fields::fq2::Fq2;
    use crate::fields::fq4::Fq4;
    use crate::fields::fq6::Fq6;
    use crate::script::run_unlock_then_lock;
    use num_bigint::BigInt;

    fn builder() -> FinalExponentiation {
        let params = CurveParams::bls12_381();
        // A toy modulus keeps the unit tests hand-checkable; the gamma
        // constants only matter for the Frobenius, unused here.
        let fq2 = Fq2::new(BigInt::from(19), BigInt::from(-1));
        let trivial = (0..3)
            .map(|_| (0..5).map(|_| (BigInt::from(1), BigInt::from(0))).collect())
            .collect();
        let fq12 = Fq12::new(fq2.clone(), Fq6::new(fq2.clone()), trivial);
        let fq12_cubic = Fq12Cubic::new(fq2.clone(), Fq4::new(fq2));
        FinalExponentiation::new(params, fq12, fq12_cubic)
    }

    fn setup(ns: &[i64]) -> Script {
        let mut s = Script::new();
        for &n in ns {
            s.push_i64(n);
        }
        s
    }

    #[test]
    fn inverse_check_rejects_wrong_inverse() {
        // f = 1 (cubic), claimed inverse = 2: 2 * 1 != 1.
        let mut unlock = setup(&[19]);
        unlock.append(setup(&[2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        unlock.append(setup(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let lock = builder().easy_exponentiation_with_inverse_check(OpFlags::reduce());
        let err = run_unlock_then_lock(&unlock, &lock, &ExecuteOpts::default()).unwrap_err();
        assert!(matches!(err, ScriptError::VerifyFailed));
    }

    #[test]
    fn easy_part_of_identity_is_identity() {
        // f = 1: inverse = 1, and 1^{(q^6-1)(q^2+1)} = 1.
        let mut unlock = setup(&[19]);
        unlock.append(setup(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        unlock.append(setup(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let lock = builder().easy_exponentiation_with_inverse_check(OpFlags::reduce());
        let stack = run_unlock_then_lock(&unlock, &lock, &ExecuteOpts::default()).unwrap();
        let nums: Vec<i64> = stack
            .iter()
            .map(|item| i64::try_from(crate::num::decode_num(item)).unwrap())
            .collect();
        assert_eq!(nums, vec![19, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn cyclotomic_exponentiation_small_exponent() {
        // Over the toy field, exponentiate the embedded scalar 2 by
        // e = 5 (digits 1,0,1): expect 32 in the constant slot. The
        // "conjugates" of an embedded scalar are the scalar itself, so
        // the subgroup restriction does not bite.
        let digits = [1i8, 0, 1];
        let mut unlock = setup(&[19]);
        unlock.append(setup(&[2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let lock = builder().cyclotomic_exponentiation(&digits, 4000);
        let stack = run_unlock_then_lock(&unlock, &lock, &ExecuteOpts::default()).unwrap();
        let nums: Vec<i64> = stack
            .iter()
            .map(|item| i64::try_from(crate::num::decode_num(item)).unwrap())
            .collect();
        // 2^5 = 32 = 13 mod 19
        assert_eq!(nums, vec![19, 13, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn cyclotomic_exponentiation_negative_digits() {
        // e = -1 (single digit): result is the conjugate. For the
        // embedded scalar 2, conjugation is the identity.
        let digits = [-1i8];
        let mut unlock = setup(&[19]);
        unlock.append(setup(&[2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let lock = builder().cyclotomic_exponentiation(&digits, 4000);
        let stack = run_unlock_then_lock(&unlock, &lock, &ExecuteOpts::default()).unwrap();
        assert_eq!(stack.len(), 13);
        assert_eq!(crate::num::decode_num(&stack[1]), BigInt::from(2));
    }
}
