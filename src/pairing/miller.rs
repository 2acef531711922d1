//! Miller-loop drivers.
//!
//! The loop over the signed digits of the curve parameter is unrolled
//! at compile time. Per iteration the twisted-curve accumulator is
//! doubled (and, on a non-zero digit, added to `±Q`) with
//! witness-supplied, script-verified gradients; the line evaluations of
//! those steps are folded into the running Miller value `f` with the
//! sparse products of [`super::miller_ops`]. Reductions are inserted
//! where the compile-time size tracker says the next operation would
//! overflow the budget.
//!
//! The triple driver runs three loops over a shared `f`: per iteration
//! it performs the three accumulator steps back to back, parks the six
//! line evaluations on the altstack, and folds their products into `f`
//! with one chain of sparse multiplications — roughly half the cost of
//! three independent loops.

use crate::builder::budget::ReductionTracker;
use crate::builder::ops::{drop_bottom_constant, pick, roll, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::curves::ec_fq2::EllipticCurveFq2;
use crate::fields::tower::{drop_items, from_altstack, to_altstack};
use crate::pairing::line::LineFunctions;
use crate::pairing::miller_ops::MillerOps;
use crate::pairing::params::CurveParams;
use crate::script::Script;

/// Script builder for single and triple Miller loops.
#[derive(Debug, Clone)]
pub struct MillerLoop {
    params: CurveParams,
    curve: EllipticCurveFq2,
    line: LineFunctions,
    ops: MillerOps,
}

/// Reduction decisions for one iteration.
struct StepFlags {
    f: OpFlags,
    t: OpFlags,
}

impl MillerLoop {
    pub fn new(
        params: CurveParams,
        curve: EllipticCurveFq2,
        line: LineFunctions,
        ops: MillerOps,
    ) -> Self {
        Self {
            params,
            curve,
            line,
            ops,
        }
    }

    pub fn params(&self) -> &CurveParams {
        &self.params
    }

    fn step_flags(
        &self,
        tracker: &mut ReductionTracker,
        digits: &[i8],
        index: usize,
    ) -> StepFlags {
        let last = index + 1 == digits.len();
        let next_digit_is_zero = !last && digits[index + 1] == 0;
        let f = OpFlags {
            take_modulo: tracker.step_f(next_digit_is_zero, last),
            ..OpFlags::default()
        };
        let t = OpFlags {
            take_modulo: tracker.step_t(last),
            ..OpFlags::default()
        };
        StepFlags { f, t }
    }

    /// Evaluation of the Miller loop at `P` and `Q`.
    ///
    /// Stack in: `[q .. gradients P(2) Q(4)]` — the gradients are the
    /// doubling (and, per non-zero digit, addition) gradients of the
    /// accumulator run, first-consumed shallowest. Stack out:
    /// `[q .. uQ(4) miller(P,Q)(12)]` with the Miller value in the
    /// cubic representation and the final accumulator left beneath it
    /// for callers that want subgroup checks.
    pub fn miller_loop(
        &self,
        modulo_threshold: usize,
        check_constant: bool,
        clean_constant: bool,
    ) -> Script {
        let digits = self.params.digits_msb_first();
        let mut tracker = ReductionTracker::new(self.params.modulus_bits(), modulo_threshold);

        let mut out = if check_constant {
            verify_bottom_constant(self.curve.fq2().modulus())
        } else {
            Script::new()
        };

        // [.., P, Q] -> [.., P, Q, -Q, T] with T = ±Q per the leading
        // digit.
        out.append(pick(3, 4));
        out.append(self.curve.point_negation(OpFlags::bare()));
        match digits[0] {
            1 => out.append(pick(7, 4)),
            -1 => out.append(pick(3, 4)),
            _ => unreachable!("the leading loop digit is non-zero"),
        };

        let mut have_f = false;
        for (index, &digit) in digits.iter().enumerate().skip(1) {
            let flags = self.step_flags(&mut tracker, &digits, index);
            out.append(self.single_iteration(digit, have_f, flags));
            have_f = true;
        }

        // Drop P, Q, -Q; keep the accumulator below f.
        // Stack: [P(2) Q(4) -Q(4) T(4) f(12)]
        out.append(roll(25, 10));
        out.append(drop_items(10));

        if clean_constant {
            out.append(drop_bottom_constant());
        }
        out
    }

    /// One iteration of the single loop.
    ///
    /// Entered with `[.., grads, P(2), Q(4), -Q(4), T(4)]` and `f` on
    /// top when `have_f`; leaves the same shape with the accumulator
    /// stepped and `f` folded.
    fn single_iteration(&self, digit: i8, have_f: bool, flags: StepFlags) -> Script {
        let bare = OpFlags::bare();
        let mut out = Script::new();
        if have_f {
            out.append(to_altstack(12));
        }

        // Point phase. Layout without f:
        // lambda_add?(2) lambda_dbl(2) P(2) Q(4) -Q(4) T(4)
        if digit == 0 {
            out.append(pick(15, 2)); // lambda_dbl
            out.append(pick(5, 4)); // T
            out.append(pick(19, 2)); // P
            out.append(self.line.line_evaluation(OpFlags::reduce()));
            out.append(to_altstack(5));
            out.append(roll(15, 2)); // lambda_dbl, consumed
            out.append(roll(5, 4)); // T, consumed
            out.append(self.curve.point_doubling(flags.t));
        } else {
            out.append(pick(15, 2)); // lambda_dbl
            out.append(pick(5, 4)); // T
            out.append(self.curve.point_doubling(flags.t)); // 2T on top
            out.append(pick(21, 2)); // lambda_add
            out.append(pick(5, 4)); // 2T
            if digit == 1 {
                out.append(pick(21, 4)); // Q
            } else {
                out.append(pick(17, 4)); // -Q
            }
            out.append(self.curve.point_addition(flags.t)); // R = 2T ± Q
            // Stack: lambda_dbl P Q -Q T 2T R
            out.append(roll(23, 2)); // lambda_dbl
            out.append(roll(13, 4)); // T, consumed
            out.append(pick(23, 2)); // P
            out.append(self.line.line_evaluation(OpFlags::reduce()));
            out.append(to_altstack(5));
            // Stack: lambda_add P Q -Q 2T R
            out.append(roll(19, 2)); // lambda_add
            out.append(roll(9, 4)); // 2T, consumed
            out.append(pick(19, 2)); // P
            out.append(self.line.line_evaluation(OpFlags::reduce()));
            out.append(to_altstack(5));
        }

        // Multiply phase.
        if digit == 0 {
            out.append(from_altstack(5)); // ev
            if have_f {
                out.append(from_altstack(12)); // f
                out.append(self.ops.miller_output_square(bare));
                out.append(self.ops.eval_times_miller_output(flags.f));
            } else {
                out.append(self.ops.pad_eval_to_miller_output());
                if flags.f.take_modulo {
                    out.append(crate::builder::ops::reduce_top_items(
                        12, true, false, false,
                    ));
                }
            }
        } else {
            out.append(from_altstack(5)); // ev_add
            out.append(from_altstack(5)); // ev_dbl
            out.append(self.ops.line_eval_times_eval(bare));
            if have_f {
                out.append(from_altstack(12)); // f
                out.append(self.ops.miller_output_square(bare));
                out.append(self.ops.eval_times_eval_times_miller_output(flags.f));
            } else {
                out.append(self.ops.pad_eval_times_eval_to_miller_output());
                if flags.f.take_modulo {
                    out.append(crate::builder::ops::reduce_top_items(
                        12, true, false, false,
                    ));
                }
            }
        }
        out
    }

    /// Fused evaluation of three Miller loops.
    ///
    /// Stack in: `[q .. gradients P1 P2 P3 Q1 Q2 Q3]`; stack out:
    /// `[q .. miller(P1,Q1) * miller(P2,Q2) * miller(P3,Q3)]` in the
    /// cubic representation. The per-iteration gradients of the three
    /// accumulators are interleaved, loop 1 first-consumed.
    pub fn triple_miller_loop(
        &self,
        modulo_threshold: usize,
        check_constant: bool,
        clean_constant: bool,
    ) -> Script {
        let digits = self.params.digits_msb_first();
        let mut tracker = ReductionTracker::new(self.params.modulus_bits(), modulo_threshold);

        let mut out = if check_constant {
            verify_bottom_constant(self.curve.fq2().modulus())
        } else {
            Script::new()
        };

        // [.., P1 P2 P3, Q1 Q2 Q3] ->
        // [.., P1 P2 P3, Q1 Q2 Q3, -Q1 -Q2 -Q3, T1 T2 T3]
        for _ in 0..3 {
            // Cycle the deepest Q to the top of the growing -Q block.
            out.append(pick(11, 4));
            out.append(self.curve.point_negation(OpFlags::bare()));
        }
        for _ in 0..3 {
            match digits[0] {
                // T_k = Q_k: the Q block sits 12 slots deeper.
                1 => out.append(pick(23, 4)),
                -1 => out.append(pick(11, 4)),
                _ => unreachable!("the leading loop digit is non-zero"),
            };
        }

        let mut have_f = false;
        for (index, &digit) in digits.iter().enumerate().skip(1) {
            let flags = self.step_flags(&mut tracker, &digits, index);
            out.append(self.triple_iteration(digit, have_f, flags));
            have_f = true;
        }

        // Drop P1..P3, Q1..Q3, -Q1..-Q3, T1..T3 beneath f.
        out.append(roll(53, 42));
        out.append(drop_items(42));

        if clean_constant {
            out.append(drop_bottom_constant());
        }
        out
    }

    /// One fused iteration.
    ///
    /// Entered with
    /// `[.., grads, P1 P2 P3 (6), Q1 Q2 Q3 (12), -Q.. (12), T.. (12)]`
    /// and `f` on top when `have_f`. Gradient region per iteration,
    /// deepest first: `add_3 add_2 add_1 dbl_3 dbl_2 dbl_1` (only the
    /// doubling entries on a zero digit); processing loop `k = 1, 2, 3`
    /// rotates the `T` block back into order.
    fn triple_iteration(&self, digit: i8, have_f: bool, flags: StepFlags) -> Script {
        let bare = OpFlags::bare();
        let mut out = Script::new();
        if have_f {
            out.append(to_altstack(12));
        }

        for k in 0..3u32 {
            // With everything above the gradient region fixed at
            // 6 + 12 + 12 + 12 = 42 items, the pending doubling
            // gradient is always the region's top element.
            let p_pos = 41 - 2 * k as i64;
            if digit == 0 {
                out.append(pick(43, 2)); // lambda_dbl_k
                out.append(pick(13, 4)); // T_k (deepest of the T block)
                out.append(pick(p_pos + 6, 1)); // xP_k
                out.append(pick(p_pos + 6, 1)); // yP_k, one deeper after the push
                out.append(self.line.line_evaluation(OpFlags::reduce()));
                out.append(to_altstack(5));
                out.append(roll(43, 2)); // lambda_dbl_k, consumed
                out.append(roll(13, 4)); // T_k, consumed
                out.append(self.curve.point_doubling(flags.t));
            } else {
                out.append(pick(43, 2)); // lambda_dbl_k
                out.append(pick(13, 4)); // T_k
                out.append(self.curve.point_doubling(flags.t)); // 2T_k
                out.append(pick(53 - 2 * k as i64, 2)); // lambda_add_k
                out.append(pick(5, 4)); // 2T_k
                if digit == 1 {
                    out.append(pick(45 - 4 * k as i64, 4)); // Q_k
                } else {
                    out.append(pick(33 - 4 * k as i64, 4)); // -Q_k
                }
                out.append(self.curve.point_addition(flags.t)); // R_k
                // Stack: .. T block, 2T_k, R_k
                out.append(roll(51, 2)); // lambda_dbl_k
                out.append(roll(21, 4)); // T_k original, consumed
                out.append(pick(p_pos + 10, 1)); // xP_k
                out.append(pick(p_pos + 10, 1)); // yP_k
                out.append(self.line.line_evaluation(OpFlags::reduce()));
                out.append(to_altstack(5));
                // Stack: .. T block (minus T_k), 2T_k, R_k
                out.append(roll(51 - 2 * k as i64, 2)); // lambda_add_k
                out.append(roll(9, 4)); // 2T_k, consumed
                out.append(pick(p_pos + 6, 1)); // xP_k
                out.append(pick(p_pos + 6, 1)); // yP_k
                out.append(self.line.line_evaluation(OpFlags::reduce()));
                out.append(to_altstack(5));
                // R_k stays on top: it is the new T_k, rotated into
                // place at the block's shallow end.
            }
        }

        // Fold the parked evaluations into f.
        if digit == 0 {
            // Altstack top-down: ev_3, ev_2, ev_1, (f).
            out.append(from_altstack(5)); // ev_3
            out.append(from_altstack(5)); // ev_2
            out.append(self.ops.line_eval_times_eval(bare));
            out.append(from_altstack(5)); // ev_1
            out.append(self.ops.line_eval_times_eval_times_eval(bare));
            if have_f {
                out.append(from_altstack(12));
                out.append(self.ops.miller_output_square(bare));
                out.append(self.ops.miller_output_mul(flags.f));
            } else if flags.f.take_modulo {
                out.append(crate::builder::ops::reduce_top_items(12, true, false, false));
            }
        } else {
            // Altstack top-down: ev_add_3, ev_dbl_3, ev_add_2,
            // ev_dbl_2, ev_add_1, ev_dbl_1, (f).
            out.append(from_altstack(5)); // ev_add_3
            out.append(from_altstack(5)); // ev_dbl_3
            out.append(self.ops.line_eval_times_eval(bare));
            out.append(from_altstack(5)); // ev_add_2
            out.append(self.ops.line_eval_times_eval_times_eval(bare));
            out.append(from_altstack(5)); // ev_dbl_2
            out.append(self.ops.miller_output_times_eval(bare));
            out.append(from_altstack(5)); // ev_add_1
            out.append(self.ops.miller_output_times_eval(bare));
            out.append(from_altstack(5)); // ev_dbl_1
            out.append(self.ops.miller_output_times_eval(if have_f {
                bare
            } else {
                flags.f
            }));
            if have_f {
                out.append(from_altstack(12));
                out.append(self.ops.miller_output_square(bare));
                out.append(self.ops.miller_output_mul(flags.f));
            }
        }
        out
    }
}
