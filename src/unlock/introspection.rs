//! Unlocking keys for the PUSHTX locks.

use num_bigint::BigInt;

use crate::introspection::{generator_x, group_order, GX_BYTES};
use crate::script::Script;

/// Witness for [`crate::introspection::TransactionIntrospection::pushtx`]:
/// the raw sighash preimage (or sighash), optionally preceded by the
/// secp256k1 constants the lock reads from the stack bottom.
#[derive(Debug, Clone)]
pub struct PushTxUnlockingKey {
    /// The serialised sighash preimage of the spending transaction (or
    /// the 32-byte sighash itself for locks built with
    /// `is_sig_hash_preimage = false`).
    pub message: Vec<u8>,
}

impl PushTxUnlockingKey {
    pub fn to_unlocking_script(&self, load_constants: bool) -> Script {
        let mut out = Script::new();
        if load_constants {
            out.push_int(&group_order());
            out.push_int(&generator_x());
            out.push_data(&GX_BYTES);
        }
        out.push_data(&self.message);
        out
    }

    /// Whether a preimage satisfies the bit-shift lock's grinding
    /// condition: the sighash's low `security` bits are `0..01` and the
    /// shifted value still fills 32 bytes.
    pub fn satisfies_bit_shift(sighash: &[u8; 32], security: u32) -> bool {
        use num_bigint::Sign;
        let value = BigInt::from_bytes_be(Sign::Plus, sighash);
        let mask = (BigInt::from(1) << security) - 1;
        let shifted = &value >> security;
        (&value & &mask) == BigInt::from(1) && shifted >= (BigInt::from(1) << (31 * 8))
    }
}
