//! Transaction introspection: the PUSHTX covenant technique.
//!
//! A locking script cannot read the transaction spending it — but
//! `OP_CHECKSIG` can. PUSHTX synthesises, entirely in-script, a
//! canonical ECDSA signature for the generator public key with nonce
//! `k = 1`: `r = G_x` and `s = (h + G_x) mod n`, where `h` is the
//! integer of the sighash. `OP_CHECKSIG` against the compressed
//! generator then passes exactly when the sighash the interpreter
//! computes for the spending transaction matches the one the witness
//! supplied, which pins the transaction's shape to the stack data.
//!
//! The bit-shift variant trades the arithmetic for a fixed nonce
//! `k = 2^security` with precomputed `R = kG` and `P = aG` such that
//! `a R_x = -1 (mod n)`; the prover grinds `nSequence` until the
//! sighash ends in the required low bits.

use num_bigint::{BigInt, Sign};

use crate::builder::ops::{
    bytes_to_unsigned, fetch_bottom_constant, pick, reverse_endianness,
    reverse_endianness_bounded, roll,
};
use crate::descriptor::{MoveMode, StackBaseElement};
use crate::hash::hash256;
use crate::num::encode_num;
use crate::opcode::Opcode;
use crate::script::Script;

/// secp256k1 group order, big-endian.
pub const GROUP_ORDER_BYTES: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36,
    0x41, 0x41,
];

/// x-coordinate of the secp256k1 generator, big-endian.
pub const GX_BYTES: [u8; 32] = [
    0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95, 0xce, 0x87, 0x0b,
    0x07, 0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9, 0x59, 0xf2, 0x81, 0x5b, 0x16, 0xf8,
    0x17, 0x98,
];

/// Hard-coded data of the bit-shift variant, per security parameter.
///
/// `r_point` is `2^security * G` compressed, `pubkey` is `a * G` with
/// `a * R_x = -1 (mod n)`. The constants are carried from the original
/// construction; the procedure regenerating them for other security
/// values is not documented there and is deliberately not re-derived.
struct BitShiftData {
    signature_prefix: &'static [u8],
    r_point: &'static [u8; 33],
    pubkey: &'static [u8; 33],
}

const BIT_SHIFT_SECURITY_2: BitShiftData = BitShiftData {
    signature_prefix: &[0x30, 0x45, 0x02, 0x21, 0x00],
    r_point: &[
        0x02, 0xe4, 0x93, 0xdb, 0xf1, 0xc1, 0x0d, 0x80, 0xf3, 0x58, 0x1e, 0x49, 0x04, 0x93,
        0x0b, 0x14, 0x04, 0xcc, 0x6c, 0x13, 0x90, 0x0e, 0xe0, 0x75, 0x84, 0x74, 0xfa, 0x94,
        0xab, 0xe8, 0xc4, 0xcd, 0x13,
    ],
    pubkey: &[
        0x03, 0x42, 0x18, 0x42, 0x6b, 0x38, 0xc7, 0x5b, 0x70, 0x6d, 0xb9, 0x01, 0x0a, 0xad,
        0x77, 0x95, 0xfd, 0x05, 0xb8, 0x72, 0x06, 0x09, 0x21, 0xc0, 0x48, 0xd9, 0xa6, 0x79,
        0xd8, 0x87, 0x8c, 0x76, 0x60,
    ],
};

const BIT_SHIFT_SECURITY_3: BitShiftData = BitShiftData {
    signature_prefix: &[0x30, 0x44, 0x02, 0x20],
    r_point: &[
        0x02, 0x2f, 0x01, 0xe5, 0xe1, 0x5c, 0xca, 0x35, 0x1d, 0xaf, 0xf3, 0x84, 0x3f, 0xb7,
        0x0f, 0x3c, 0x2f, 0x0a, 0x1b, 0xdd, 0x05, 0xe5, 0xaf, 0x88, 0x8a, 0x67, 0x78, 0x4e,
        0xf3, 0xe1, 0x0a, 0x2a, 0x01,
    ],
    pubkey: &[
        0x03, 0xad, 0x36, 0xfa, 0xd5, 0x57, 0x27, 0xeb, 0xf7, 0x6f, 0x8a, 0xf9, 0x6c, 0x7c,
        0x2d, 0xf9, 0xa2, 0x98, 0xdc, 0x21, 0xd6, 0xc1, 0x52, 0x69, 0xfd, 0xed, 0xfd, 0x47,
        0xa7, 0x0b, 0x32, 0x76, 0x37,
    ],
};

/// secp256k1 group order as an integer.
pub fn group_order() -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &GROUP_ORDER_BYTES)
}

/// Generator x-coordinate as an integer.
pub fn generator_x() -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &GX_BYTES)
}

/// Signature checking tail shared by the PUSHTX variants.
fn checksig_tail(is_checksigverify: bool, is_opcodeseparator: bool) -> Script {
    let mut out = Script::new();
    if is_opcodeseparator {
        out.op(Opcode::OpCodeSeparator);
    }
    out.op(if is_checksigverify {
        Opcode::OpCheckSigVerify
    } else {
        Opcode::OpCheckSig
    });
    out
}

/// Script builders binding a lock to the transaction spending it.
pub struct TransactionIntrospection;

impl TransactionIntrospection {
    /// The PUSHTX locking fragment.
    ///
    /// Stack in: `[n, Gx, Gx_bytes, .., message, ..]` where the three
    /// constants sit at the stack bottom and `message` — addressed by
    /// `message_position` — is the sighash preimage
    /// (`is_sig_hash_preimage`) or the 32-byte sighash itself.
    /// Stack out: the `OP_CHECKSIG` verdict (or nothing with the verify
    /// variant); fails unless the message matches the spending
    /// transaction.
    pub fn pushtx(
        sighash_flag: u8,
        message: StackBaseElement,
        is_sig_hash_preimage: bool,
        rolling: bool,
        clean_constants: bool,
        verify_constants: bool,
        is_checksigverify: bool,
        is_opcodeseparator: bool,
    ) -> Script {
        let n = group_order();
        let gx = generator_x();
        let mut out = Script::new();

        if verify_constants {
            let mut preimage = GX_BYTES.to_vec();
            preimage.extend(encode_num(&gx));
            preimage.extend(encode_num(&n));
            out.push_data(&hash256(&preimage));
            for k in (1..=3).rev() {
                out.append(pick(-k, 1));
            }
            out.ops(&[Opcode::OpCat, Opcode::OpCat, Opcode::OpHash256, Opcode::OpEqualVerify]);
        }

        // Keep a copy of Gx_bytes for the public key, and assemble the
        // DER prefix 0x0220 || Gx || 0x02 around it.
        out.push_data(&[0x02, 0x20]);
        out.append(fetch_bottom_constant_at(3, clean_constants));
        out.op(Opcode::OpTuck);
        out.push_data(&[0x02]);
        out.ops(&[Opcode::OpCat, Opcode::OpCat]);

        // h = integer of the sighash, big-endian.
        out.append(
            message
                .shift(2)
                .move_with(if rolling { MoveMode::Roll } else { MoveMode::Pick }),
        );
        if is_sig_hash_preimage {
            out.op(Opcode::OpHash256);
        }
        out.append(reverse_endianness(32));
        out.append(bytes_to_unsigned());

        // s = (h + Gx) mod n, canonicalised to the low half.
        out.append(fetch_bottom_constant_at(2, clean_constants));
        out.op(Opcode::OpAdd);
        out.append(fetch_bottom_constant_at(1, clean_constants));
        out.ops(&[Opcode::OpTuck, Opcode::OpMod]);
        out.append(int_sig_to_s_component());

        // DER(Gx, s) || sighash flag.
        out.ops(&[Opcode::OpSize, Opcode::OpTuck, Opcode::OpToAltStack]);
        out.ops(&[Opcode::OpCat, Opcode::OpCat]);
        out.push_data(&[0x30]);
        out.op(Opcode::OpFromAltStack);
        out.push_i64(36);
        out.ops(&[Opcode::OpAdd, Opcode::OpCat, Opcode::OpSwap, Opcode::OpCat]);
        out.push_data(&[sighash_flag]);
        out.op(Opcode::OpCat);

        // Compressed generator from the kept Gx_bytes copy.
        out.push_data(&[0x02]);
        out.ops(&[Opcode::OpRot, Opcode::OpCat]);

        out.append(checksig_tail(is_checksigverify, is_opcodeseparator));
        out
    }

    /// The PUSHTX bit-shift locking fragment.
    ///
    /// Accepts any preimage whose double-hash, after shifting off
    /// `security` low bits, matches the precomputed point data; the
    /// prover grinds `nSequence` until the hash's low bits are
    /// `0..01`. No bottom constants are needed.
    pub fn pushtx_bit_shift(
        sighash_flag: u8,
        message: StackBaseElement,
        rolling: bool,
        is_checksigverify: bool,
        is_opcodeseparator: bool,
        security: u32,
    ) -> Script {
        let data = match security {
            2 => &BIT_SHIFT_SECURITY_2,
            3 => &BIT_SHIFT_SECURITY_3,
            _ => panic!("the bit-shift construction supports security 2 or 3, got {security}"),
        };

        let mut out = Script::new();
        out.append(
            message.move_with(if rolling { MoveMode::Roll } else { MoveMode::Pick }),
        );
        out.op(Opcode::OpHash256);
        out.push_i64(security as i64);
        out.op(Opcode::OpRShift);

        // DER(R_x, s) || flag, with everything but s precomputed.
        let mut prefix = data.signature_prefix.to_vec();
        prefix.extend_from_slice(&data.r_point[1..]);
        prefix.extend_from_slice(&[0x02, 0x20]);
        out.push_data(&prefix);
        out.ops(&[Opcode::OpSwap, Opcode::OpCat]);
        out.push_data(&[sighash_flag]);
        out.op(Opcode::OpCat);

        out.push_data(data.pubkey);
        out.append(checksig_tail(is_checksigverify, is_opcodeseparator));
        out
    }
}

/// Fetches the `k`-th constant from the stack bottom, rolling it out
/// when the constants are being cleaned.
fn fetch_bottom_constant_at(k: i64, remove: bool) -> Script {
    if k == 1 {
        fetch_bottom_constant(remove)
    } else if remove {
        roll(-k, 1)
    } else {
        pick(-k, 1)
    }
}

/// Canonicalises `[.., n, s]` into the DER s-component bytes:
/// `min(s, n - s)` in big-endian minimal form.
fn int_sig_to_s_component() -> Script {
    let mut out = Script::new();
    out.ops(&[
        Opcode::Op2Dup,
        Opcode::OpSwap,
        Opcode::Op2,
        Opcode::OpDiv,
        Opcode::OpGreaterThan,
        Opcode::OpIf,
        Opcode::OpSub,
        Opcode::OpElse,
        Opcode::OpNip,
        Opcode::OpEndIf,
    ]);
    out.append(reverse_endianness_bounded(32));
    out
}
