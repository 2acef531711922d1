//! The opcode vocabulary: pick/roll with short encodings, constant
//! verification, the batched-modulo patterns, and byte-string surgery.
//!
//! Everything here is a pure function from parameters to a script
//! fragment; fragments compose by concatenation only.

use num_bigint::BigInt;

use crate::opcode::Opcode;
use crate::script::Script;

/// Emits the script duplicating `n_elements` consecutive stack items to
/// the top, starting at `position` (distance from the top, `0` = top
/// element; the duplicated block keeps its order).
///
/// Short patterns are used where the protocol has a single opcode for
/// the job; positions in `[0, 16]` use the one-byte constants; a
/// negative `position` of `-k` addresses the `k`-th element from the
/// stack bottom via `OP_DEPTH`.
pub fn pick(position: i64, n_elements: usize) -> Script {
    let mut out = Script::new();
    match (position, n_elements) {
        (0, 1) => {
            out.op(Opcode::OpDup);
        }
        (1, 1) => {
            out.op(Opcode::OpOver);
        }
        (1, 2) => {
            out.op(Opcode::Op2Dup);
        }
        (2, 3) => {
            out.op(Opcode::Op3Dup);
        }
        (3, 2) => {
            out.op(Opcode::Op2Over);
        }
        _ if position < 0 => {
            for _ in 0..n_elements {
                out.append(deep_position(-position));
                out.op(Opcode::OpPick);
            }
        }
        _ => {
            for _ in 0..n_elements {
                out.push_i64(position);
                out.op(Opcode::OpPick);
            }
        }
    }
    out
}

/// Emits the script moving `n_elements` consecutive stack items to the
/// top, removing the originals. Same position conventions as [`pick`].
pub fn roll(position: i64, n_elements: usize) -> Script {
    let mut out = Script::new();
    match (position, n_elements) {
        (0, _) | (1, 2) => {} // already on top
        (1, 1) => {
            out.op(Opcode::OpSwap);
        }
        (2, 1) => {
            out.op(Opcode::OpRot);
        }
        (2, 2) => {
            out.op(Opcode::OpRot).op(Opcode::OpRot);
        }
        (3, 2) => {
            out.op(Opcode::Op2Swap);
        }
        (5, 2) => {
            out.op(Opcode::Op2Rot);
        }
        _ if position < 0 => {
            for _ in 0..n_elements {
                out.append(deep_position(-position));
                out.op(Opcode::OpRoll);
            }
        }
        _ => {
            for _ in 0..n_elements {
                out.push_i64(position);
                out.op(Opcode::OpRoll);
            }
        }
    }
    out
}

/// Pushes the stack index of the `k`-th element from the bottom
/// (`k >= 1`), i.e. `OP_DEPTH - k`.
fn deep_position(k: i64) -> Script {
    let mut out = Script::new();
    out.op(Opcode::OpDepth);
    if k == 1 {
        out.op(Opcode::Op1Sub);
    } else {
        out.push_i64(k);
        out.op(Opcode::OpSub);
    }
    out
}

/// Pushes a list of integers, first element landing deepest.
pub fn nums_to_script(nums: &[BigInt]) -> Script {
    let mut out = Script::new();
    out.push_ints(nums);
    out
}

/// The constant-verification preamble: asserts that the bottom stack
/// element equals `q`, so that composing scripts cannot silently change
/// the modulus the arithmetic below assumes.
pub fn verify_bottom_constant(q: &BigInt) -> Script {
    let mut out = pick(-1, 1);
    out.push_int(q);
    out.op(Opcode::OpEqualVerify);
    out
}

/// Fetches the bottom-of-stack constant to the top, rolling it out of
/// the stack when `remove` is set.
pub fn fetch_bottom_constant(remove: bool) -> Script {
    if remove {
        roll(-1, 1)
    } else {
        pick(-1, 1)
    }
}

/// Rolls the bottom-of-stack constant out and drops it.
pub fn drop_bottom_constant() -> Script {
    let mut out = roll(-1, 1);
    out.op(Opcode::OpDrop);
    out
}

/// The batched-modulo core. Expects `[.., value, q]` (modulus on top)
/// and reduces `value` modulo `q`.
///
/// With `positive` the result is mapped to the canonical representative
/// in `[0, q)` by adding `q` and reducing again; otherwise it stays in
/// `(-q, q)` with the dividend's sign.
///
/// With `keep_constant` the output is `[.., q, value % q]` (the modulus
/// stays, directly below the result); otherwise `[.., value % q]`.
pub fn mod_core(positive: bool, keep_constant: bool) -> Script {
    let mut out = Script::new();
    match (positive, keep_constant) {
        (true, true) => {
            out.ops(&[
                Opcode::OpTuck,
                Opcode::OpMod,
                Opcode::OpOver,
                Opcode::OpAdd,
                Opcode::OpOver,
                Opcode::OpMod,
            ]);
        }
        (true, false) => {
            out.ops(&[
                Opcode::OpTuck,
                Opcode::OpMod,
                Opcode::OpOver,
                Opcode::OpAdd,
                Opcode::OpSwap,
                Opcode::OpMod,
            ]);
        }
        (false, true) => {
            out.ops(&[Opcode::OpTuck, Opcode::OpMod]);
        }
        (false, false) => {
            out.op(Opcode::OpMod);
        }
    }
    out
}

/// [`mod_core`] for a stack shaped `[.., q, value]` (value on top).
pub fn mod_value_on_top(positive: bool, keep_constant: bool) -> Script {
    let mut out = Script::new();
    out.op(Opcode::OpSwap);
    out.append(mod_core(positive, keep_constant));
    out
}

/// The altstack drain step of a batched reduction: pulls the next
/// component from the altstack, rotates the modulus on top of it, and
/// reduces. Expects `[.., q, previous]` with one pending component on
/// the altstack.
pub fn mod_from_altstack(positive: bool, keep_constant: bool) -> Script {
    let mut out = Script::new();
    out.op(Opcode::OpFromAltStack).op(Opcode::OpRot);
    out.append(mod_core(positive, keep_constant));
    out
}

/// Reduces the `n` top stack items modulo `q`, preserving their order.
///
/// Expects `[.., v_0, .., v_{n-1}]` and `q` still at its home position
/// (fetched according to `clean_constant`). Leaves
/// `[.., r_0, .., r_{n-1}]`, with `q` directly below `r_{n-1}` when
/// `is_constant_reused`.
pub fn reduce_top_items(
    n: usize,
    positive: bool,
    clean_constant: bool,
    is_constant_reused: bool,
) -> Script {
    assert!(n > 0, "nothing to reduce");
    let mut out = Script::new();
    // Stage all but the deepest component on the altstack.
    for _ in 0..n - 1 {
        out.op(Opcode::OpToAltStack);
    }
    out.append(fetch_bottom_constant(clean_constant));
    out.append(mod_core(positive, true));
    for i in 0..n - 1 {
        let last = i == n - 2;
        out.append(mod_from_altstack(
            positive,
            !last || is_constant_reused,
        ));
    }
    if n == 1 && !is_constant_reused {
        // Single component: the keep-variant left q below the result.
        out.op(Opcode::OpSwap).op(Opcode::OpDrop);
    }
    out
}

/// Reverses the byte order of the top stack element, whose length is
/// known to be exactly `length` bytes.
///
/// Built from `OP_SPLIT`/`OP_CAT`: the string is peeled one byte at a
/// time onto the altstack, then reassembled back to front.
pub fn reverse_endianness(length: usize) -> Script {
    let mut out = Script::new();
    for _ in 0..length.saturating_sub(1) {
        out.op(Opcode::Op1);
        out.op(Opcode::OpSplit);
        out.op(Opcode::OpSwap);
        out.op(Opcode::OpToAltStack);
    }
    for _ in 0..length.saturating_sub(1) {
        out.op(Opcode::OpFromAltStack);
        out.op(Opcode::OpCat);
    }
    out
}

/// Reverses the byte order of the top stack element, a non-negative
/// script number of unknown length at most `max_length` bytes.
///
/// The number is widened to `max_length` bytes with `OP_NUM2BIN`,
/// reversed at fixed width, and the leading zero padding split off, so
/// the output is exactly the reversed minimal encoding.
pub fn reverse_endianness_bounded(max_length: usize) -> Script {
    let mut out = Script::new();
    out.op(Opcode::OpSize).op(Opcode::OpToAltStack);
    out.push_i64(max_length as i64);
    out.op(Opcode::OpNum2Bin);
    out.append(reverse_endianness(max_length));
    out.push_i64(max_length as i64);
    out.op(Opcode::OpFromAltStack);
    out.op(Opcode::OpSub);
    out.op(Opcode::OpSplit);
    out.op(Opcode::OpNip);
    out
}

/// Converts the top stack element, an arbitrary byte string, to the
/// non-negative number with the same little-endian magnitude.
///
/// Appends a zero byte so a set top bit cannot be read as a sign, then
/// minimises.
pub fn bytes_to_unsigned() -> Script {
    let mut out = Script::new();
    out.push_data(&[0x00]);
    out.op(Opcode::OpCat);
    out.op(Opcode::OpBin2Num);
    out
}
