//! Unlocking key for
//! [`crate::curves::unrolled::EllipticCurveFqUnrolled::msm_with_fixed_bases`].

use num_bigint::BigInt;

use crate::script::Script;
use crate::unlock::unrolled::UnrolledMultiplicationUnlockingKey;

/// Witness for a fixed-base multi-scalar multiplication.
///
/// `scalar_keys[i]` unlocks the multiplication `a_i * B_i`;
/// `addition_gradients[k]` is the gradient of the `k`-th fold
/// `(sum of the higher-index products) + product`, working from the
/// highest index down. A fold involving the point at infinity (a zero
/// scalar, or inverse partial sums) carries no gradient and is `None`.
#[derive(Debug, Clone)]
pub struct MsmUnlockingKey {
    pub scalar_keys: Vec<UnrolledMultiplicationUnlockingKey>,
    pub addition_gradients: Vec<Option<BigInt>>,
}

impl MsmUnlockingKey {
    /// Lays out the witness: addition gradients deepest (first-needed
    /// shallowest), then the scalar witnesses with index 0 on top so
    /// the scalar-extraction offsets stay fixed.
    pub fn to_unlocking_script(&self) -> Script {
        let mut out = Script::new();
        for gradient in self.addition_gradients.iter().rev() {
            if let Some(gradient) = gradient {
                out.push_int(gradient);
            }
        }
        for key in self.scalar_keys.iter().rev() {
            out.append(key.to_unlocking_script(false));
        }
        out
    }

    /// Iteration counts of the scalar witnesses, in index order — the
    /// shape [`crate::curves::unrolled::extract_scalar_as_unsigned`]
    /// needs.
    pub fn bit_lengths(&self) -> Vec<usize> {
        self.scalar_keys
            .iter()
            .map(|key| {
                crate::curves::unrolled::iterations(&key.max_multiplier)
                    .expect("max multiplier fits the lock")
            })
            .collect()
    }
}
