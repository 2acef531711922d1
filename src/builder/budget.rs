//! Deferred-modulo budgeting.
//!
//! Chains of additions and multiplications are emitted without
//! reduction until the next operation could push an intermediate value
//! past the interpreter's number bound. The decision is made at compile
//! time from closed-form upper bounds on intermediate bit lengths; the
//! bounds here are the ones the emitting drivers consult.
//!
//! All sizes are bit lengths as `f64`, because the slack terms are
//! non-integer logarithms.

/// Slack of a sum of products of tower-field coefficients: a Miller
/// output coefficient is a sum of at most 13 products each at most
/// tripled by the non-residue, so the growth over the raw product is
/// `log2(13 * 3)`.
pub fn product_sum_slack() -> f64 {
    (13.0f64 * 3.0).log2()
}

/// Upper bound on the coordinates of `P + Q` / `2P` over the base
/// field, entered with coordinates of `current_size` bits and gradients
/// reduced modulo `q`: `log2(6 * q * max(xP, xQ))`.
pub fn ec_operation_size(current_size: f64, q_bits: f64) -> f64 {
    6.0f64.log2() + q_bits + current_size
}

/// Growth of one unrolled double-and-add iteration when neither the
/// doubling nor the conditional addition has been reduced yet. Both
/// operations must be budgeted for because the markers deciding them
/// are execution-time witness data.
pub fn unrolled_step_size(current_size: f64) -> f64 {
    2.0 * 4.0 * current_size
}

/// Bound on `f^2 * line_evaluation` with `f` of `size_f` bits and the
/// evaluation reduced modulo `q`.
pub fn miller_square_times_eval(size_f: f64, q_bits: f64) -> f64 {
    product_sum_slack() + 2.0 * size_f + product_sum_slack() + q_bits
}

/// Bound on `f^2 * line_evaluation * line_evaluation`.
pub fn miller_square_times_two_evals(size_f: f64, q_bits: f64) -> f64 {
    product_sum_slack() + 2.0 * size_f + 2.0 * (product_sum_slack() + q_bits)
}

/// Bound on the twisted-curve accumulator after one doubling or mixed
/// addition with a reduced gradient.
pub fn twisted_point_growth(size_t: f64, q_bits: f64) -> f64 {
    size_t + q_bits + 6.0f64.log2()
}

/// Bound on a dense tower-field squaring or multiplication where both
/// operands carry `size` bits.
pub fn tower_product_size(size: f64) -> f64 {
    product_sum_slack() + 2.0 * size
}

/// Compile-time tracker deciding where the Miller-loop driver inserts
/// batched reductions.
#[derive(Debug, Clone)]
pub struct ReductionTracker {
    q_bits: f64,
    threshold: f64,
    size_f: f64,
    size_t: f64,
}

impl ReductionTracker {
    pub fn new(q_bits: usize, modulo_threshold: usize) -> Self {
        Self {
            q_bits: q_bits as f64,
            threshold: modulo_threshold as f64,
            size_f: q_bits as f64,
            size_t: q_bits as f64,
        }
    }

    /// Decides whether `f` must be reduced before the next iteration,
    /// whose shape depends on the next loop digit. Updates the tracked
    /// size either way.
    pub fn step_f(&mut self, next_digit_is_zero: bool, force: bool) -> bool {
        let future = if next_digit_is_zero {
            miller_square_times_eval(self.size_f, self.q_bits)
        } else {
            miller_square_times_two_evals(self.size_f, self.q_bits)
        };
        if force || future > self.threshold {
            self.size_f = self.q_bits;
            true
        } else {
            self.size_f = future;
            false
        }
    }

    /// Same decision for the twisted-curve accumulator `T`.
    pub fn step_t(&mut self, force: bool) -> bool {
        let future = twisted_point_growth(self.size_t, self.q_bits);
        if force || future > self.threshold {
            self.size_t = self.q_bits;
            true
        } else {
            self.size_t = future;
            false
        }
    }

    /// Decision for a dense squaring in the cyclotomic subgroup.
    pub fn step_square(&mut self, force: bool) -> bool {
        let future = tower_product_size(self.size_f);
        if force || future > self.threshold {
            self.size_f = self.q_bits;
            true
        } else {
            self.size_f = future;
            false
        }
    }

    /// Decision for a multiplication by an operand already reduced
    /// modulo `q`.
    pub fn step_mul_by_reduced(&mut self, force: bool) -> bool {
        let future = product_sum_slack() + self.size_f + self.q_bits;
        if force || future > self.threshold {
            self.size_f = self.q_bits;
            true
        } else {
            self.size_f = future;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn slack_is_log2_of_39() {
        assert!((product_sum_slack() - 39.0f64.log2()).abs() < EPS);
    }

    #[test]
    fn ec_bound_matches_formula() {
        // log2(6 * q * max) with q_bits = 381, max = 400 bits
        let expected = 6.0f64.log2() + 381.0 + 400.0;
        assert!((ec_operation_size(400.0, 381.0) - expected).abs() < EPS);
    }

    #[test]
    fn unrolled_step_is_eight_times() {
        assert!((unrolled_step_size(381.0) - 8.0 * 381.0).abs() < EPS);
    }

    #[test]
    fn miller_bounds_match_formulas() {
        let (size_f, q) = (500.0, 381.0);
        let one = 39.0f64.log2() + 2.0 * size_f + 39.0f64.log2() + q;
        let two = 39.0f64.log2() + 2.0 * size_f + 2.0 * (39.0f64.log2() + q);
        assert!((miller_square_times_eval(size_f, q) - one).abs() < EPS);
        assert!((miller_square_times_two_evals(size_f, q) - two).abs() < EPS);
    }

    #[test]
    fn tracker_reduces_before_threshold() {
        // With a tight threshold every step must reduce.
        let mut tracker = ReductionTracker::new(381, 1000);
        assert!(tracker.step_f(true, false));
        assert!(tracker.step_t(false));

        // With a loose threshold the first step accumulates.
        let mut tracker = ReductionTracker::new(381, 100_000);
        assert!(!tracker.step_f(true, false));
        assert!(!tracker.step_t(false));

        // A forced step reduces regardless.
        assert!(tracker.step_f(true, true));
        assert!(tracker.step_t(true));
    }

    #[test]
    fn tracker_growth_then_reset() {
        let mut tracker = ReductionTracker::new(100, 100_000);
        assert!(!tracker.step_square(false));
        // Size roughly doubled; a few more squarings cross the bound.
        let mut reduced = false;
        for _ in 0..12 {
            reduced |= tracker.step_square(false);
        }
        assert!(reduced);
    }
}
