//! Unlocking key for [`crate::groth16::Groth16::groth16_verifier`].

use num_bigint::BigInt;

use crate::script::Script;
use crate::unlock::msm::MsmUnlockingKey;
use crate::unlock::pairing::TriplePairingUnlockingKey;

/// Everything the prover supplies to a Groth16 lock.
///
/// Layout, deepest first: the inverse of the triple Miller output, the
/// interleaved pairing gradients (for the accumulator runs over `B`,
/// `-gamma`, `-delta`), the proof points `A`, `B`, `C`, the gradient of
/// the final `+ gamma_abc[0]` addition, and the MSM witness with public
/// input 0's region on top.
#[derive(Debug, Clone)]
pub struct Groth16UnlockingKey {
    pub public_inputs: Vec<BigInt>,
    /// `A` as `(x, y)`.
    pub a: (BigInt, BigInt),
    /// `B` as `(x0, x1, y0, y1)`.
    pub b: [BigInt; 4],
    /// `C` as `(x, y)`.
    pub c: (BigInt, BigInt),
    /// Triple-pairing witness: gradients for the three Miller
    /// accumulators plus the inverse Miller output. Its point fields
    /// are ignored here — the verifier rebuilds the operand order
    /// itself.
    pub pairing: TriplePairingUnlockingKey,
    /// Gradient of `msm + gamma_abc[0]`, absent when either side is the
    /// point at infinity.
    pub gradient_gamma_abc_zero: Option<BigInt>,
    pub msm: MsmUnlockingKey,
}

impl Groth16UnlockingKey {
    pub fn to_unlocking_script(&self, modulus: Option<&BigInt>) -> Script {
        let mut out = Script::new();
        if let Some(q) = modulus {
            out.push_int(q);
        }
        out.push_ints(&self.pairing.inverse_miller_output);
        out.append(self.pairing.gradients_script());
        out.push_int(&self.a.0);
        out.push_int(&self.a.1);
        for coordinate in &self.b {
            out.push_int(coordinate);
        }
        out.push_int(&self.c.0);
        out.push_int(&self.c.1);
        if let Some(gradient) = &self.gradient_gamma_abc_zero {
            out.push_int(gradient);
        }
        out.append(self.msm.to_unlocking_script());
        out
    }
}
