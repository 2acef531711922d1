//! The Groth16 verifier compiler.
//!
//! Emits a locking script for the verification equation
//!
//! `e(A, B) * e(gamma_abc[0] + sum_i a_i gamma_abc[i+1], -gamma) *
//!  e(C, -delta) = alpha_beta`
//!
//! with the verifying-key values hard-coded in the lock and everything
//! else — proof, public inputs, gradients, the Miller-output inverse —
//! supplied positionally by the witness
//! ([`crate::unlock::groth16::Groth16UnlockingKey`]).

use num_bigint::BigInt;

use crate::builder::ops::verify_bottom_constant;
use crate::builder::OpFlags;
use crate::curves::ec_fq::EllipticCurveFq;
use crate::curves::unrolled::EllipticCurveFqUnrolled;
use crate::error::BuilderError;
use crate::opcode::Opcode;
use crate::pairing::Pairing;
use crate::script::Script;

/// The verifying-key values a Groth16 lock hard-codes.
///
/// `alpha_beta` is `e(alpha, beta)` in the quadratic `F_q^12` slot
/// order; `minus_gamma` and `minus_delta` are twisted-curve points
/// (four slots each); `gamma_abc` are base-curve points, `gamma_abc[0]`
/// being the constant term of the statement combination (RefTx folds
/// its locked-in inputs into it before constructing the key).
#[derive(Debug, Clone)]
pub struct Groth16LockingKey {
    pub alpha_beta: Vec<BigInt>,
    pub minus_gamma: Vec<BigInt>,
    pub minus_delta: Vec<BigInt>,
    pub gamma_abc: Vec<(BigInt, BigInt)>,
}

/// Script builder for Groth16 verification.
#[derive(Debug, Clone)]
pub struct Groth16 {
    pairing: Pairing,
    unrolled: EllipticCurveFqUnrolled,
}

impl Groth16 {
    pub fn new(pairing: Pairing) -> Self {
        let params = pairing.params();
        let ec = EllipticCurveFq::new(params.modulus.clone(), params.curve_a.clone());
        let unrolled = EllipticCurveFqUnrolled::new(ec);
        Self { pairing, unrolled }
    }

    pub fn pairing(&self) -> &Pairing {
        &self.pairing
    }

    /// Subgroup order, the default bound for public inputs.
    pub fn order(&self) -> &BigInt {
        &self.pairing.params().order
    }

    /// The per-input unrolled iteration counts implied by
    /// `max_multipliers` (or the subgroup order), which is also the
    /// shape scalar extraction needs.
    pub fn multiplier_bit_lengths(
        &self,
        n_inputs: usize,
        max_multipliers: Option<&[BigInt]>,
    ) -> Result<Vec<usize>, BuilderError> {
        let bounds = self.resolve_multipliers(n_inputs, max_multipliers)?;
        bounds
            .iter()
            .map(|bound| crate::curves::unrolled::iterations(bound))
            .collect()
    }

    fn resolve_multipliers(
        &self,
        n_inputs: usize,
        max_multipliers: Option<&[BigInt]>,
    ) -> Result<Vec<BigInt>, BuilderError> {
        match max_multipliers {
            Some(bounds) => {
                if bounds.len() != n_inputs {
                    return Err(BuilderError::WrongMultiplierCount {
                        expected: n_inputs,
                        got: bounds.len(),
                    });
                }
                Ok(bounds.to_vec())
            }
            None => Ok(vec![self.order().clone(); n_inputs]),
        }
    }

    /// The Groth16 locking script.
    ///
    /// Stack in (the unlocking key's output):
    /// `[q, inverse(12), pairing gradients, A(2), B(4), C(2),
    ///   gradient_gamma_abc_zero, msm witness]`.
    /// Stack out: `[1]` on success, script failure otherwise (the final
    /// comparison leaves `OP_EQUAL`'s verdict).
    ///
    /// Every witness region is fixed-width, so any public input's value
    /// can be read back with
    /// [`crate::curves::unrolled::extract_scalar_as_unsigned`] before
    /// this script runs — that is what RefTx does with its sighash
    /// chunks.
    pub fn groth16_verifier(
        &self,
        locking_key: &Groth16LockingKey,
        modulo_threshold: usize,
        max_multipliers: Option<&[BigInt]>,
        check_constant: bool,
        clean_constant: bool,
    ) -> Result<Script, BuilderError> {
        let n_pub = locking_key.gamma_abc.len() - 1;
        let bounds = self.resolve_multipliers(n_pub, max_multipliers)?;

        let mut out = if check_constant {
            verify_bottom_constant(&self.pairing.params().modulus)
        } else {
            Script::new()
        };

        // sum_i a_i gamma_abc[i+1], then + gamma_abc[0] with the
        // witnessed gradient.
        let bases: Vec<(BigInt, BigInt)> = locking_key.gamma_abc[1..].to_vec();
        out.append(self.unrolled.msm_with_fixed_bases(
            &bases,
            &bounds,
            modulo_threshold,
            false,
            false,
        )?);
        let (x0, y0) = &locking_key.gamma_abc[0];
        out.push_int(x0);
        out.push_int(y0);
        out.append(
            self.unrolled
                .ec()
                .point_addition_with_unknown_points(OpFlags::reduce()),
        );

        // Marshal the pairing operands: [A, sum, C, B, -gamma, -delta].
        // Stack here: [.., A(2), B(4), C(2), sum(2)]
        out.append(crate::builder::ops::roll(3, 2)); // C above the sum
        out.append(crate::builder::ops::roll(7, 4)); // B to the top
        out.push_ints(&locking_key.minus_gamma);
        out.push_ints(&locking_key.minus_delta);

        out.append(
            self.pairing
                .triple_pairing(modulo_threshold, false, clean_constant),
        );

        // Compare with alpha_beta, slot by slot.
        for (index, value) in locking_key.alpha_beta.iter().enumerate().rev() {
            out.push_int(value);
            if index == 0 {
                out.op(Opcode::OpEqual);
            } else {
                out.op(Opcode::OpEqualVerify);
            }
        }
        Ok(out)
    }
}
