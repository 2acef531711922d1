//! Unlocking key for [`crate::reftx::RefTx::locking_script`].

use num_bigint::{BigInt, Sign};

use crate::introspection::{generator_x, group_order, GX_BYTES};
use crate::script::Script;
use crate::unlock::groth16::Groth16UnlockingKey;

/// Witness for the RefTx lock: the Groth16 witness preceded by the
/// PUSHTX constants.
///
/// The sighash chunks must be the leading public inputs of the wrapped
/// Groth16 key, exactly as [`RefTxUnlockingKey::sighash_chunks`]
/// produces them.
#[derive(Debug, Clone)]
pub struct RefTxUnlockingKey {
    pub groth16: Groth16UnlockingKey,
}

impl RefTxUnlockingKey {
    /// Splits a sighash into the chunk scalars the verifier consumes:
    /// `chunk_bytes`-wide slices in transmission order, each read as a
    /// little-endian unsigned integer.
    pub fn sighash_chunks(sighash: &[u8; 32], chunk_bytes: usize) -> Vec<BigInt> {
        sighash
            .chunks(chunk_bytes)
            .map(|chunk| BigInt::from_bytes_le(Sign::Plus, chunk))
            .collect()
    }

    /// Lays out the witness: `q`, the secp256k1 constants for the
    /// PUSHTX tail, then the Groth16 witness.
    pub fn to_unlocking_script(&self, modulus: &BigInt, load_constants: bool) -> Script {
        let mut out = Script::new();
        out.push_int(modulus);
        if load_constants {
            out.push_int(&group_order());
            out.push_int(&generator_x());
            out.push_data(&GX_BYTES);
        }
        out.append(self.groth16.to_unlocking_script(None));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_is_little_endian_per_slice() {
        let mut sighash = [0u8; 32];
        sighash[0] = 0x01;
        sighash[16] = 0x02;
        let chunks = RefTxUnlockingKey::sighash_chunks(&sighash, 16);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], BigInt::from(1));
        assert_eq!(chunks[1], BigInt::from(2));
    }
}
