//! Sparse and dense products of Miller-loop operands.
//!
//! Line evaluations have most of their twelve coefficients structurally
//! zero; each product shape the Miller drivers need is an entry point
//! here, all backed by the table-driven emitter of
//! [`crate::fields::tower`] over the cubic representation's slot order.

use crate::builder::ops::{pick, reduce_top_items};
use crate::builder::OpFlags;
use crate::fields::fq2::Fq2;
use crate::fields::tower::{from_altstack, mul_layout, to_altstack, SlotLayout};
use crate::opcode::Opcode;
use crate::script::Script;

/// Script builders for the Miller-output algebra.
#[derive(Debug, Clone)]
pub struct MillerOps {
    fq2: Fq2,
}

impl MillerOps {
    pub fn new(fq2: Fq2) -> Self {
        Self { fq2 }
    }

    fn reduced(&self, items: usize, flags: OpFlags) -> Script {
        if flags.take_modulo {
            reduce_top_items(
                items,
                flags.positive_modulo,
                flags.clean_constant,
                flags.is_constant_reused,
            )
        } else {
            Script::new()
        }
    }

    /// `[.., ev, ev'] -> [.., ev * ev']` (5 + 5 -> 10 items).
    pub fn line_eval_times_eval(&self, flags: OpFlags) -> Script {
        let mut out = mul_layout(
            &self.fq2,
            &SlotLayout::line_evaluation(),
            &SlotLayout::line_evaluation(),
            &SlotLayout::eval_times_eval(),
        );
        out.append(self.reduced(10, flags));
        out
    }

    /// `[.., ev * ev', ev''] -> [.., ev * ev' * ev'']` (10 + 5 -> 12).
    pub fn line_eval_times_eval_times_eval(&self, flags: OpFlags) -> Script {
        let mut out = mul_layout(
            &self.fq2,
            &SlotLayout::eval_times_eval(),
            &SlotLayout::line_evaluation(),
            &SlotLayout::fq12_cubic(),
        );
        out.append(self.reduced(12, flags));
        out
    }

    /// `[.., e, e'] -> [.., e * e']` for two eval-times-eval operands
    /// (10 + 10 -> 12).
    pub fn line_eval_times_eval_times_eval_times_eval(&self, flags: OpFlags) -> Script {
        let mut out = mul_layout(
            &self.fq2,
            &SlotLayout::eval_times_eval(),
            &SlotLayout::eval_times_eval(),
            &SlotLayout::fq12_cubic(),
        );
        out.append(self.reduced(12, flags));
        out
    }

    /// `[.., f, ev] -> [.., f * ev]` (12 + 5 -> 12).
    pub fn miller_output_times_eval(&self, flags: OpFlags) -> Script {
        let mut out = mul_layout(
            &self.fq2,
            &SlotLayout::fq12_cubic(),
            &SlotLayout::line_evaluation(),
            &SlotLayout::fq12_cubic(),
        );
        out.append(self.reduced(12, flags));
        out
    }

    /// `[.., ev, f] -> [.., ev * f]` (5 + 12 -> 12).
    pub fn eval_times_miller_output(&self, flags: OpFlags) -> Script {
        let mut out = mul_layout(
            &self.fq2,
            &SlotLayout::line_evaluation(),
            &SlotLayout::fq12_cubic(),
            &SlotLayout::fq12_cubic(),
        );
        out.append(self.reduced(12, flags));
        out
    }

    /// `[.., ev * ev', f] -> [.., ev * ev' * f]` (10 + 12 -> 12).
    pub fn eval_times_eval_times_miller_output(&self, flags: OpFlags) -> Script {
        let mut out = mul_layout(
            &self.fq2,
            &SlotLayout::eval_times_eval(),
            &SlotLayout::fq12_cubic(),
            &SlotLayout::fq12_cubic(),
        );
        out.append(self.reduced(12, flags));
        out
    }

    /// `[.., f] -> [.., f^2]` in the cubic representation.
    pub fn miller_output_square(&self, flags: OpFlags) -> Script {
        let mut out = pick(11, 12);
        out.append(mul_layout(
            &self.fq2,
            &SlotLayout::fq12_cubic(),
            &SlotLayout::fq12_cubic(),
            &SlotLayout::fq12_cubic(),
        ));
        out.append(self.reduced(12, flags));
        out
    }

    /// `[.., f, g] -> [.., f * g]` in the cubic representation.
    pub fn miller_output_mul(&self, flags: OpFlags) -> Script {
        let mut out = mul_layout(
            &self.fq2,
            &SlotLayout::fq12_cubic(),
            &SlotLayout::fq12_cubic(),
            &SlotLayout::fq12_cubic(),
        );
        out.append(self.reduced(12, flags));
        out
    }

    /// Widens a single line evaluation to the dense cubic layout.
    ///
    /// `[c0(2), c3, c2(2)] -> [c0(2), c3 0, 0 0, 0 0, c2(2), 0 0]`
    pub fn pad_eval_to_miller_output(&self) -> Script {
        let mut out = Script::new();
        out.append(to_altstack(2)); // c2
        out.op(Opcode::Op0); // c3 imaginary half
        for _ in 0..4 {
            out.op(Opcode::Op0); // c1, c4
        }
        out.append(from_altstack(2));
        out.op(Opcode::Op0).op(Opcode::Op0); // c5
        out
    }

    /// Widens an eval-times-eval product to the dense cubic layout by
    /// inserting the zero `t^1` coefficient.
    pub fn pad_eval_times_eval_to_miller_output(&self) -> Script {
        let mut out = Script::new();
        out.append(to_altstack(6));
        out.op(Opcode::Op0).op(Opcode::Op0);
        out.append(from_altstack(6));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExecuteOpts;
    use crate::script::run_unlock_then_lock;
    use num_bigint::BigInt;

    fn ops() -> MillerOps {
        MillerOps::new(Fq2::new(BigInt::from(19), BigInt::from(-1)))
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

    #[test]
    fn pad_eval_is_dense_identity_embedding() {
        // ev = (1 + 2u) + 3 t^3 + (4 + 5u) t^2; dense cubic order is
        // (c0, c3, c1, c4, c2, c5).
        let stack = run(&setup(&[1, 2, 3, 4, 5]), &ops().pad_eval_to_miller_output());
        assert_eq!(stack, vec![1, 2, 3, 0, 0, 0, 0, 0, 4, 5, 0, 0]);
    }

    #[test]
    fn pad_eval_times_eval_inserts_t1() {
        let stack = run(
            &setup(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
            &ops().pad_eval_times_eval_to_miller_output(),
        );
        assert_eq!(stack, vec![1, 2, 3, 4, 0, 0, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn eval_squared_matches_hand_multiplication() {
        // ev = 1 + t^3 (c0 = 1, c3 = 1, c2 = 0):
        // ev^2 = 1 + 2 t^3 + t^6 = (1 + xi) + 2 t^3, xi = 1 + u.
        // eval_times_eval order: (c0, c3, c4, c2, c5).
        let ev = [1i64, 0, 1, 0, 0];
        let mut unlock = setup(&[19]);
        unlock.append(setup(&ev));
        unlock.append(setup(&ev));
        let stack = run(&unlock, &ops().line_eval_times_eval(OpFlags::reduce()));
        assert_eq!(
            stack,
            vec![19, 2, 1, 2, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn dense_mul_by_identity() {
        let mut unlock = setup(&[19]);
        unlock.append(setup(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]));
        // Identity in the cubic layout: c0 = 1, everything else 0.
        unlock.append(setup(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        let stack = run(&unlock, &ops().miller_output_mul(OpFlags::reduce()));
        assert_eq!(
            stack,
            vec![19, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
        );
    }

    #[test]
    fn square_matches_mul() {
        let f = [1i64, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let mut unlock = setup(&[19]);
        unlock.append(setup(&f));
        let squared = run(&unlock.clone(), &ops().miller_output_square(OpFlags::reduce()));

        let mut unlock2 = setup(&[19]);
        unlock2.append(setup(&f));
        unlock2.append(setup(&f));
        let mulled = run(&unlock2, &ops().miller_output_mul(OpFlags::reduce()));
        assert_eq!(squared, mulled);
    }
}
