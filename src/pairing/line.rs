//! Line evaluation for the M-twist.
//!
//! The line through `T` (tangent, or the chord towards `Q`) on the
//! twisted curve, evaluated at the base-curve point `P` after mapping
//! `P` onto the twist, is the sparse element
//!
//! `ev = (lambda xT - yT) - lambda xP * t^2 + yP * t^3`
//!
//! of the cubic `F_q^12` representation: an `F_q^2` constant term, an
//! `F_q^2` coefficient at `t^2`, and a base-field-only coefficient at
//! `t^3` (its imaginary half is structurally zero and never pushed, so
//! the evaluation occupies five stack slots).

use crate::builder::ops::{pick, reduce_top_items, roll, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::fields::fq2::Fq2;
use crate::fields::tower::{from_altstack, to_altstack};
use crate::opcode::Opcode;
use crate::script::Script;

/// Script builder for line evaluations.
#[derive(Debug, Clone)]
pub struct LineFunctions {
    fq2: Fq2,
}

impl LineFunctions {
    pub fn new(fq2: Fq2) -> Self {
        Self { fq2 }
    }

    /// Evaluates the line with gradient `lambda` through the twisted
    /// point `T` at `P`.
    ///
    /// Stack in: `[q .. lambda(2) xT(2) yT(2) xP yP]`; stack out:
    /// `[q .. c0(2) c3 c2(2)]`. The gradient is not checked here — the
    /// accumulator operations that consume the same witness prove it.
    pub fn line_evaluation(&self, flags: OpFlags) -> Script {
        let bare = OpFlags::bare();
        let mut out = if flags.check_constant {
            verify_bottom_constant(self.fq2.modulus())
        } else {
            Script::new()
        };

        // c2 = -lambda * xP, parked on the altstack.
        out.op(Opcode::OpSwap); // [.., yP, xP]
        out.op(Opcode::OpNegate);
        out.append(pick(7, 2)); // lambda
        out.append(roll(2, 1)); // -xP on top of the copy
        out.append(self.fq2.scalar_mul(bare));
        out.append(to_altstack(2));

        // c3 = yP, parked behind it.
        out.op(Opcode::OpToAltStack);

        // c0 = lambda * xT - yT.
        out.op(Opcode::Op2Rot); // lambda to the top
        out.op(Opcode::Op2Rot); // xT above it
        out.append(self.fq2.mul(bare));
        out.op(Opcode::Op2Swap); // yT on top
        out.append(self.fq2.subtract(bare));

        out.op(Opcode::OpFromAltStack); // yP
        out.append(from_altstack(2)); // c2

        if flags.take_modulo {
            out.append(reduce_top_items(
                5,
                flags.positive_modulo,
                flags.clean_constant,
                flags.is_constant_reused,
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecuteOpts;
    use crate::script::run_unlock_then_lock;
    use num_bigint::BigInt;

    fn line() -> LineFunctions {
        LineFunctions::new(Fq2::new(BigInt::from(19), BigInt::from(-1)))
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

    #[test]
    fn evaluation_components() {
        // lambda = 2 + 3u, T = (4 + 5u, 6 + 7u), P = (8, 9).
        // c0 = lambda xT - yT = (8 - 15 - 6, 10 + 12 - 7) = (-13, 15)
        //    = (6, 15) mod 19
        // c3 = yP = 9
        // c2 = -lambda xP = (-16, -24) = (3, 14) mod 19
        let unlock = setup(&[19, 2, 3, 4, 5, 6, 7, 8, 9]);
        let stack = nums(
            &run_unlock_then_lock(
                &unlock,
                &line().line_evaluation(OpFlags::reduce()),
                &ExecuteOpts::default(),
            )
            .unwrap(),
        );
        assert_eq!(stack, vec![19, 6, 15, 9, 3, 14]);
    }

    #[test]
    fn evaluation_width_is_five() {
        let unlock = setup(&[19, 2, 3, 4, 5, 6, 7, 8, 9]);
        let stack = run_unlock_then_lock(
            &unlock,
            &line().line_evaluation(OpFlags::bare()),
            &ExecuteOpts::default(),
        )
        .unwrap();
        // q + five components.
        assert_eq!(stack.len(), 6);
    }
}
