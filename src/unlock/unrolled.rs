//! Unlocking key for
//! [`crate::curves::unrolled::EllipticCurveFqUnrolled::unrolled_multiplication`].

use num_bigint::BigInt;
use num_traits::Zero;

use crate::curves::unrolled::iterations;
use crate::script::Script;

/// Gradients and markers for one unrolled scalar multiplication.
///
/// The witness is laid out in fixed-width blocks of four items, one per
/// compiled iteration, consumed most-significant side first:
///
/// - executed iteration, scalar bit 1: `grad_add 1 grad_dbl 1`
/// - executed iteration, scalar bit 0: `0 0 grad_dbl 1`
/// - padded iteration (beyond the scalar's length): `0 0 0 0`
///
/// preceded by the `marker_a_is_zero` item. `gradients[j]` holds the
/// gradient(s) of the `j`-th executed iteration in execution order:
/// always the doubling gradient first, the addition gradient second
/// when that iteration's bit is set (so `gradients.len()` is the
/// scalar's bit length minus one).
#[derive(Debug, Clone)]
pub struct UnrolledMultiplicationUnlockingKey {
    /// The base point, when it is supplied by the witness rather than
    /// hard-coded in the locking script.
    pub point: Option<(BigInt, BigInt)>,
    pub scalar: BigInt,
    pub gradients: Vec<Vec<BigInt>>,
    pub max_multiplier: BigInt,
}

impl UnrolledMultiplicationUnlockingKey {
    /// Lays out the witness. `load_point` pushes the base point last
    /// (on top), for locks that do not hard-code it.
    pub fn to_unlocking_script(&self, load_point: bool) -> Script {
        let m = iterations(&self.max_multiplier).expect("max multiplier fits the lock");
        let mut out = Script::new();

        if self.scalar.is_zero() {
            out.push_i64(1);
            for _ in 0..4 * m {
                out.push_i64(0);
            }
        } else {
            let n = self.scalar.bits() as usize - 1;
            assert_eq!(
                self.gradients.len(),
                n,
                "one gradient entry per executed iteration"
            );
            out.push_i64(0);
            // Last executed iteration deepest; pads shallowest.
            for j in (0..n).rev() {
                let step = &self.gradients[j];
                debug_assert_eq!(
                    step.len() == 2,
                    self.scalar.bit((n - 1 - j) as u64),
                    "gradient count disagrees with scalar bit"
                );
                if step.len() == 2 {
                    out.push_int(&step[1]);
                    out.push_i64(1);
                } else {
                    out.push_i64(0);
                    out.push_i64(0);
                }
                out.push_int(&step[0]);
                out.push_i64(1);
            }
            for _ in 0..4 * (m - n) {
                out.push_i64(0);
            }
        }

        if load_point {
            let (x, y) = self
                .point
                .as_ref()
                .expect("load_point requires the base point");
            out.push_int(x);
            out.push_int(y);
        }
        out
    }

    /// Total witness items this key occupies, as the extraction offsets
    /// need to know it.
    pub fn witness_len(&self) -> usize {
        let m = iterations(&self.max_multiplier).expect("max multiplier fits the lock");
        1 + 4 * m + if self.point.is_some() { 2 } else { 0 }
    }
}
