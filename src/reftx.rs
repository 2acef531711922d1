//! RefTx: a Groth16 verifier bound to the spending transaction.
//!
//! The circuit `C'(l_out, sighash(stx), u_stx)` takes the spending
//! transaction's sighash as a public input. The locking script reads
//! the sighash back out of the scalar-multiplication witness markers
//! (they are fixed-width, so the chunk positions are compile-time
//! constants), runs the Groth16 verifier over it, and then hands the
//! reassembled sighash to PUSHTX — so a valid proof unlocks the coin
//! only inside the one transaction shape the proof committed to.

use num_bigint::BigInt;
use num_traits::One;

use crate::builder::OpFlags;
use crate::curves::unrolled::extract_scalar_as_unsigned;
use crate::descriptor::StackBaseElement;
use crate::error::BuilderError;
use crate::groth16::{Groth16, Groth16LockingKey};
use crate::introspection::TransactionIntrospection;
use crate::opcode::Opcode;
use crate::script::Script;

/// Script builder for the RefTx lock.
#[derive(Debug, Clone)]
pub struct RefTx {
    groth16: Groth16,
}

impl RefTx {
    pub fn new(groth16: Groth16) -> Self {
        Self { groth16 }
    }

    pub fn groth16(&self) -> &Groth16 {
        &self.groth16
    }

    /// Byte width of one sighash chunk: the largest power-of-two size
    /// whose values stay below the subgroup order.
    pub fn sighash_chunk_bytes(&self) -> usize {
        let byte_size_r = self.groth16.order().bits() as usize / 8;
        for width in [32usize, 16, 8, 4, 2] {
            if byte_size_r > width {
                return width;
            }
        }
        1
    }

    /// Number of chunks the 32-byte sighash splits into.
    pub fn sighash_chunks(&self) -> usize {
        32 / self.sighash_chunk_bytes()
    }

    /// Per-input multiplier bounds with the sighash chunks prepended:
    /// chunk inputs are bounded by `2^(8 * chunk_bytes)`, the remaining
    /// user inputs by `user_bounds` (or the subgroup order).
    pub fn multipliers(
        &self,
        n_user_inputs: usize,
        user_bounds: Option<&[BigInt]>,
    ) -> Result<Vec<BigInt>, BuilderError> {
        let chunk_bound = BigInt::one() << (8 * self.sighash_chunk_bytes());
        let mut bounds = vec![chunk_bound; self.sighash_chunks()];
        match user_bounds {
            Some(user) => {
                if user.len() != n_user_inputs {
                    return Err(BuilderError::WrongMultiplierCount {
                        expected: n_user_inputs,
                        got: user.len(),
                    });
                }
                bounds.extend_from_slice(user);
            }
            None => bounds.extend(vec![self.groth16.order().clone(); n_user_inputs]),
        }
        Ok(bounds)
    }

    /// The RefTx locking script.
    ///
    /// `locking_key.gamma_abc[0]` must already hold the partial
    /// combination `gamma_abc[0] + sum_i l_out_i * gamma_abc[i+1]` of
    /// the locked-in outputs; its remaining bases cover the sighash
    /// chunks (first) and the spender's inputs `u_stx`.
    ///
    /// Stack in: the RefTx unlocking key's output
    /// (`[q, n, Gx, Gx_bytes, groth16 witness]`). Stack out: the
    /// `OP_CHECKSIG` verdict.
    pub fn locking_script(
        &self,
        sighash_flag: u8,
        locking_key: &Groth16LockingKey,
        modulo_threshold: usize,
        user_bounds: Option<&[BigInt]>,
        check_constant: bool,
    ) -> Result<Script, BuilderError> {
        let chunk_bytes = self.sighash_chunk_bytes();
        let n_chunks = self.sighash_chunks();
        let n_pub = locking_key.gamma_abc.len() - 1;
        if n_pub < n_chunks {
            return Err(BuilderError::WrongMultiplierCount {
                expected: n_chunks,
                got: n_pub,
            });
        }
        let bounds = self.multipliers(n_pub - n_chunks, user_bounds)?;
        let bit_lengths = self
            .groth16
            .multiplier_bit_lengths(n_pub, Some(&bounds))?;

        let mut out = Script::new();

        // Read each sighash chunk out of the witness markers and park
        // its bytes on the altstack. NUM2BIN one byte wide of the chunk
        // absorbs the sign slot, so short chunks widen correctly.
        for index in 0..n_chunks {
            out.append(extract_scalar_as_unsigned(&bit_lengths, index));
            out.push_i64(chunk_bytes as i64 + 1);
            out.op(Opcode::OpNum2Bin);
            out.push_i64(chunk_bytes as i64);
            out.ops(&[Opcode::OpSplit, Opcode::OpDrop, Opcode::OpToAltStack]);
        }

        out.append(self.groth16.groth16_verifier(
            locking_key,
            modulo_threshold,
            Some(&bounds),
            check_constant,
            true,
        )?);
        out.op(Opcode::OpVerify);

        // Reassemble sighash = chunk_0 || chunk_1 || ..
        out.op(Opcode::OpFromAltStack);
        for _ in 1..n_chunks {
            out.ops(&[Opcode::OpFromAltStack, Opcode::OpSwap, Opcode::OpCat]);
        }

        out.append(TransactionIntrospection::pushtx(
            sighash_flag,
            StackBaseElement::new(0),
            false,
            true,
            true,
            true,
            false,
            true,
        ));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::params::CurveParams;
    use crate::pairing::Pairing;

    fn reftx() -> RefTx {
        RefTx::new(Groth16::new(Pairing::new(CurveParams::bls12_381())))
    }

    #[test]
    fn bls12_381_sighash_chunks() {
        // r has 255 bits = 31 bytes, so chunks are 16 bytes, two of
        // them.
        let reftx = reftx();
        assert_eq!(reftx.sighash_chunk_bytes(), 16);
        assert_eq!(reftx.sighash_chunks(), 2);
    }

    #[test]
    fn multipliers_prepend_chunk_bounds() {
        let reftx = reftx();
        let bounds = reftx.multipliers(1, None).unwrap();
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0], BigInt::one() << 128);
        assert_eq!(bounds[1], BigInt::one() << 128);
        assert_eq!(&bounds[2], reftx.groth16.order());
    }

    #[test]
    fn multiplier_count_mismatch_is_rejected() {
        let reftx = reftx();
        let err = reftx
            .multipliers(2, Some(&[BigInt::from(8)]))
            .unwrap_err();
        assert!(matches!(err, BuilderError::WrongMultiplierCount { .. }));
    }
}
