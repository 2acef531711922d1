use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::ScriptError;
use crate::hash;
use crate::num::{decode_i64, decode_num, encode_num};
use crate::opcode::Opcode;
use crate::stack::{is_true, Stack};
use crate::token::Token;

/// Options for script execution.
///
/// Controls optional behavior such as real OP_CHECKSIG verification and
/// the interpreter's per-element byte bound.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOpts {
    /// The sighash digest for OP_CHECKSIG verification.
    ///
    /// When `None`, OP_CHECKSIG always pushes true (stub mode).
    /// When `Some` and the `secp256k1` feature is enabled,
    /// real ECDSA signature verification is performed.
    pub sighash: Option<[u8; 32]>,

    /// Maximum byte length of any stack element produced by an opcode.
    ///
    /// `None` means unbounded. Compiled field arithmetic defers modular
    /// reduction, so intermediate numbers legitimately grow to a few
    /// times the modulus width; the deferred-modulo budget exists to keep
    /// them under this bound. Setting it in tests turns a wrong budget
    /// into a hard [`ScriptError::NumberTooLarge`] instead of a silently
    /// oversized element.
    pub max_num_bytes: Option<usize>,
}

/// Executes a sequence of tokens on a fresh stack.
///
/// Returns `Ok(true)` if the script succeeds (top stack element is truthy).
/// Returns `Ok(false)` if the stack is empty or the top element is falsy.
/// Returns `Err(ScriptError)` if any operation fails during execution.
pub fn execute(tokens: &[Token]) -> Result<bool, ScriptError> {
    execute_with_opts(tokens, &ExecuteOpts::default())
}

/// Executes a sequence of tokens with configuration options.
///
/// See [`execute`] for return value semantics.
pub fn execute_with_opts(tokens: &[Token], opts: &ExecuteOpts) -> Result<bool, ScriptError> {
    let mut stack = Stack::new();
    execute_on_stack(tokens, &mut stack, opts)?;

    if stack.is_empty() {
        return Ok(false);
    }
    let top = stack.pop()?;
    Ok(is_true(&top))
}

/// Executes tokens on an existing stack.
///
/// Used by `script.rs` for two-phase execution where the unlocking script
/// runs first and the locking script runs on the resulting stack. The
/// altstack is fresh for each call, matching the interpreter's behavior
/// of clearing it between script phases.
pub(crate) fn execute_on_stack(
    tokens: &[Token],
    stack: &mut Stack,
    opts: &ExecuteOpts,
) -> Result<(), ScriptError> {
    let mut altstack = Stack::new();
    let mut exec_stack: Vec<bool> = Vec::new();

    for token in tokens {
        let executing = is_executing(&exec_stack);

        match token {
            // ── Conditional flow control (always processed) ──────────
            Token::Op(Opcode::OpIf) => {
                if executing {
                    let val = stack.pop()?;
                    exec_stack.push(is_true(&val));
                } else {
                    exec_stack.push(false);
                }
            }
            Token::Op(Opcode::OpNotIf) => {
                if executing {
                    let val = stack.pop()?;
                    exec_stack.push(!is_true(&val));
                } else {
                    exec_stack.push(false);
                }
            }
            Token::Op(Opcode::OpElse) => {
                let top = exec_stack
                    .last_mut()
                    .ok_or(ScriptError::UnbalancedConditional)?;
                *top = !*top;
            }
            Token::Op(Opcode::OpEndIf) => {
                if exec_stack.pop().is_none() {
                    return Err(ScriptError::UnbalancedConditional);
                }
            }

            // ── Skip everything else when not executing ──────────────
            _ if !executing => continue,

            // ── PushData ─────────────────────────────────────────────
            Token::PushData(data) => {
                stack.push(data.clone());
            }

            // ── Constants ────────────────────────────────────────────
            Token::Op(Opcode::Op0) => stack.push(vec![]),
            Token::Op(Opcode::Op1Negate) => stack.push(vec![0x81]),
            Token::Op(Opcode::Op1) => stack.push(vec![1]),
            Token::Op(Opcode::Op2) => stack.push(vec![2]),
            Token::Op(Opcode::Op3) => stack.push(vec![3]),
            Token::Op(Opcode::Op4) => stack.push(vec![4]),
            Token::Op(Opcode::Op5) => stack.push(vec![5]),
            Token::Op(Opcode::Op6) => stack.push(vec![6]),
            Token::Op(Opcode::Op7) => stack.push(vec![7]),
            Token::Op(Opcode::Op8) => stack.push(vec![8]),
            Token::Op(Opcode::Op9) => stack.push(vec![9]),
            Token::Op(Opcode::Op10) => stack.push(vec![10]),
            Token::Op(Opcode::Op11) => stack.push(vec![11]),
            Token::Op(Opcode::Op12) => stack.push(vec![12]),
            Token::Op(Opcode::Op13) => stack.push(vec![13]),
            Token::Op(Opcode::Op14) => stack.push(vec![14]),
            Token::Op(Opcode::Op15) => stack.push(vec![15]),
            Token::Op(Opcode::Op16) => stack.push(vec![16]),

            // ── Flow control ─────────────────────────────────────────
            Token::Op(Opcode::OpNop) => {}
            Token::Op(Opcode::OpVerify) => {
                let val = stack.pop()?;
                if !is_true(&val) {
                    return Err(ScriptError::VerifyFailed);
                }
            }
            Token::Op(Opcode::OpReturn) => {
                return Err(ScriptError::OpReturnEncountered);
            }

            // ── Altstack ─────────────────────────────────────────────
            Token::Op(Opcode::OpToAltStack) => {
                let top = stack.pop()?;
                altstack.push(top);
            }
            Token::Op(Opcode::OpFromAltStack) => {
                let top = altstack.pop().map_err(|_| ScriptError::AltStackUnderflow)?;
                stack.push(top);
            }

            // ── Stack manipulation ───────────────────────────────────
            Token::Op(Opcode::OpDup) => {
                let top = stack.peek()?.to_vec();
                stack.push(top);
            }
            Token::Op(Opcode::OpDrop) => {
                stack.pop()?;
            }
            Token::Op(Opcode::Op2Dup) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push(a.clone());
                stack.push(b.clone());
                stack.push(a);
                stack.push(b);
            }
            Token::Op(Opcode::Op3Dup) => {
                let c = stack.pop()?;
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push(a.clone());
                stack.push(b.clone());
                stack.push(c.clone());
                stack.push(a);
                stack.push(b);
                stack.push(c);
            }
            Token::Op(Opcode::Op2Drop) => {
                stack.pop()?;
                stack.pop()?;
            }
            Token::Op(Opcode::OpNip) => {
                let top = stack.pop()?;
                stack.pop()?;
                stack.push(top);
            }
            Token::Op(Opcode::OpOver) => {
                let item = stack.peek_at(1).map_err(|_| ScriptError::StackUnderflow)?;
                stack.push(item);
            }
            Token::Op(Opcode::Op2Over) => {
                if stack.len() < 4 {
                    return Err(ScriptError::StackUnderflow);
                }
                let a = stack.peek_at(3).unwrap();
                let b = stack.peek_at(2).unwrap();
                stack.push(a);
                stack.push(b);
            }
            Token::Op(Opcode::OpSwap) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push(b);
                stack.push(a);
            }
            Token::Op(Opcode::Op2Swap) => {
                let b2 = stack.pop()?;
                let b1 = stack.pop()?;
                let a2 = stack.pop()?;
                let a1 = stack.pop()?;
                stack.push(b1);
                stack.push(b2);
                stack.push(a1);
                stack.push(a2);
            }
            Token::Op(Opcode::OpRot) => {
                let c = stack.pop()?;
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push(b);
                stack.push(c);
                stack.push(a);
            }
            Token::Op(Opcode::Op2Rot) => {
                if stack.len() < 6 {
                    return Err(ScriptError::StackUnderflow);
                }
                let a2 = stack.take_at(4).unwrap();
                let a1 = stack.take_at(4).unwrap();
                stack.push(a1);
                stack.push(a2);
            }
            Token::Op(Opcode::OpTuck) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push(b.clone());
                stack.push(a);
                stack.push(b);
            }
            Token::Op(Opcode::OpPick) => {
                let depth = pop_index(stack)?;
                let item = stack.peek_at(depth)?;
                stack.push(item);
            }
            Token::Op(Opcode::OpRoll) => {
                let depth = pop_index(stack)?;
                let item = stack.take_at(depth)?;
                stack.push(item);
            }
            Token::Op(Opcode::OpDepth) => {
                let depth = stack.len();
                push_num(stack, BigInt::from(depth), opts)?;
            }

            // ── Splice ───────────────────────────────────────────────
            Token::Op(Opcode::OpCat) => {
                let b = stack.pop()?;
                let mut a = stack.pop()?;
                a.extend_from_slice(&b);
                check_len(&a, opts)?;
                stack.push(a);
            }
            Token::Op(Opcode::OpSplit) => {
                let at = pop_index(stack)?;
                let a = stack.pop()?;
                if at > a.len() {
                    return Err(ScriptError::InvalidSplice);
                }
                stack.push(a[..at].to_vec());
                stack.push(a[at..].to_vec());
            }
            Token::Op(Opcode::OpNum2Bin) => {
                let width = pop_index(stack)?;
                let n = decode_num(&stack.pop()?);
                let bytes = num_to_bin(&n, width)?;
                check_len(&bytes, opts)?;
                stack.push(bytes);
            }
            Token::Op(Opcode::OpBin2Num) => {
                let a = stack.pop()?;
                stack.push(encode_num(&decode_num(&a)));
            }
            Token::Op(Opcode::OpSize) => {
                let size = stack.peek()?.len();
                push_num(stack, BigInt::from(size), opts)?;
            }

            // ── Comparison ───────────────────────────────────────────
            Token::Op(Opcode::OpEqual) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                stack.push_bool(a == b);
            }
            Token::Op(Opcode::OpEqualVerify) => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                if a != b {
                    return Err(ScriptError::VerifyFailed);
                }
            }

            // ── Arithmetic ───────────────────────────────────────────
            Token::Op(Opcode::Op1Add) => {
                let a = pop_num(stack)?;
                push_num(stack, a + 1, opts)?;
            }
            Token::Op(Opcode::Op1Sub) => {
                let a = pop_num(stack)?;
                push_num(stack, a - 1, opts)?;
            }
            Token::Op(Opcode::OpNegate) => {
                let a = pop_num(stack)?;
                push_num(stack, -a, opts)?;
            }
            Token::Op(Opcode::OpAbs) => {
                let a = pop_num(stack)?;
                push_num(stack, a.abs(), opts)?;
            }
            Token::Op(Opcode::OpNot) => {
                let a = pop_num(stack)?;
                stack.push_bool(a.is_zero());
            }
            Token::Op(Opcode::Op0NotEqual) => {
                let a = pop_num(stack)?;
                stack.push_bool(!a.is_zero());
            }
            Token::Op(Opcode::OpAdd) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                push_num(stack, a + b, opts)?;
            }
            Token::Op(Opcode::OpSub) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                push_num(stack, a - b, opts)?;
            }
            Token::Op(Opcode::OpMul) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                push_num(stack, a * b, opts)?;
            }
            Token::Op(Opcode::OpDiv) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                if b.is_zero() {
                    return Err(ScriptError::DivisionByZero);
                }
                // BigInt division truncates toward zero, as the opcode does.
                push_num(stack, a / b, opts)?;
            }
            Token::Op(Opcode::OpMod) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                if b.is_zero() {
                    return Err(ScriptError::DivisionByZero);
                }
                // The remainder takes the dividend's sign.
                push_num(stack, a % b, opts)?;
            }
            Token::Op(Opcode::OpLShift) => {
                let n = pop_index(stack)?;
                let a = stack.pop()?;
                stack.push(shift_bits(&a, n, true));
            }
            Token::Op(Opcode::OpRShift) => {
                let n = pop_index(stack)?;
                let a = stack.pop()?;
                stack.push(shift_bits(&a, n, false));
            }
            Token::Op(Opcode::OpBoolAnd) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                stack.push_bool(!a.is_zero() && !b.is_zero());
            }
            Token::Op(Opcode::OpBoolOr) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                stack.push_bool(!a.is_zero() || !b.is_zero());
            }
            Token::Op(Opcode::OpNumEqual) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                stack.push_bool(a == b);
            }
            Token::Op(Opcode::OpNumEqualVerify) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                if a != b {
                    return Err(ScriptError::VerifyFailed);
                }
            }
            Token::Op(Opcode::OpNumNotEqual) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                stack.push_bool(a != b);
            }
            Token::Op(Opcode::OpLessThan) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                stack.push_bool(a < b);
            }
            Token::Op(Opcode::OpGreaterThan) => {
                let b = pop_num(stack)?;
                let a = pop_num(stack)?;
                stack.push_bool(a > b);
            }

            // ── Crypto ───────────────────────────────────────────────
            Token::Op(Opcode::OpRipemd160) => {
                let data = stack.pop()?;
                stack.push(hash::ripemd160(&data).to_vec());
            }
            Token::Op(Opcode::OpSha256) => {
                let data = stack.pop()?;
                stack.push(hash::sha256(&data).to_vec());
            }
            Token::Op(Opcode::OpHash160) => {
                let data = stack.pop()?;
                stack.push(hash::hash160(&data).to_vec());
            }
            Token::Op(Opcode::OpHash256) => {
                let data = stack.pop()?;
                stack.push(hash::hash256(&data).to_vec());
            }
            Token::Op(Opcode::OpCodeSeparator) => {
                // The engine verifies against a caller-provided sighash,
                // so the separator carries no state here.
            }
            Token::Op(Opcode::OpCheckSig) => {
                checksig(stack, opts)?;
            }
            Token::Op(Opcode::OpCheckSigVerify) => {
                checksig(stack, opts)?;
                let val = stack.pop()?;
                if !is_true(&val) {
                    return Err(ScriptError::VerifyFailed);
                }
            }
        }
    }

    if !exec_stack.is_empty() {
        return Err(ScriptError::UnbalancedConditional);
    }

    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Returns `true` if the execution stack indicates we are in an executing branch.
fn is_executing(exec_stack: &[bool]) -> bool {
    exec_stack.iter().all(|&v| v)
}

/// Pops a number off the stack.
fn pop_num(stack: &mut Stack) -> Result<BigInt, ScriptError> {
    Ok(decode_num(&stack.pop()?))
}

/// Pops a non-negative machine-sized index (stack depth, split position,
/// byte width, shift amount).
fn pop_index(stack: &mut Stack) -> Result<usize, ScriptError> {
    let n = decode_i64(&stack.pop()?)?;
    usize::try_from(n).map_err(|_| ScriptError::InvalidStackIndex)
}

/// Pushes a number in minimal encoding, enforcing the byte bound.
fn push_num(stack: &mut Stack, n: BigInt, opts: &ExecuteOpts) -> Result<(), ScriptError> {
    let bytes = encode_num(&n);
    check_len(&bytes, opts)?;
    stack.push(bytes);
    Ok(())
}

fn check_len(bytes: &[u8], opts: &ExecuteOpts) -> Result<(), ScriptError> {
    if let Some(max) = opts.max_num_bytes {
        if bytes.len() > max {
            return Err(ScriptError::NumberTooLarge);
        }
    }
    Ok(())
}

/// Renders `n` in `width` bytes of little-endian sign-magnitude form.
fn num_to_bin(n: &BigInt, width: usize) -> Result<Vec<u8>, ScriptError> {
    let mut magnitude = n.magnitude().to_bytes_le();
    if magnitude == [0] {
        magnitude.clear();
    }
    if magnitude.len() > width
        || (magnitude.len() == width && width > 0 && magnitude[width - 1] & 0x80 != 0)
    {
        return Err(ScriptError::InvalidSplice);
    }
    if magnitude.len() == width && !magnitude.is_empty() {
        // Top bit is clear, the sign can ride in the last byte.
        if n.sign() == num_bigint::Sign::Minus {
            magnitude[width - 1] |= 0x80;
        }
        return Ok(magnitude);
    }
    magnitude.resize(width, 0x00);
    if n.sign() == num_bigint::Sign::Minus {
        magnitude[width - 1] |= 0x80;
    }
    Ok(magnitude)
}

/// Logical bit shift of a byte string, big-endian bit order, length
/// preserved, zero fill; bits shifted past either end are discarded.
fn shift_bits(bytes: &[u8], n: usize, left: bool) -> Vec<u8> {
    use num_bigint::BigUint;

    let len = bytes.len();
    if len == 0 {
        return Vec::new();
    }
    let value = BigUint::from_bytes_be(bytes);
    let shifted = if left {
        (value << n) % (BigUint::from(1u8) << (8 * len))
    } else {
        value >> n
    };
    let mut out = shifted.to_bytes_be();
    if out == [0] {
        out.clear();
    }
    let mut padded = vec![0u8; len - out.len()];
    padded.extend_from_slice(&out);
    padded
}

/// OP_CHECKSIG implementation.
///
/// Default: stub mode (always pushes true).
/// With `secp256k1` feature + sighash: real ECDSA verification.
fn checksig(stack: &mut Stack, opts: &ExecuteOpts) -> Result<(), ScriptError> {
    let pubkey = stack.pop()?;
    let sig = stack.pop()?;

    #[cfg(feature = "secp256k1")]
    {
        if let Some(sighash) = opts.sighash {
            let result = verify_ecdsa(&sig, &pubkey, &sighash);
            stack.push_bool(result);
            return Ok(());
        }
    }

    // Stub mode: suppress unused warning when feature is off
    let _ = (&pubkey, &sig, &opts);
    stack.push(vec![0x01]);
    Ok(())
}

/// Real ECDSA signature verification using secp256k1.
#[cfg(feature = "secp256k1")]
fn verify_ecdsa(sig_bytes: &[u8], pubkey_bytes: &[u8], sighash: &[u8; 32]) -> bool {
    use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1};

    // Signature must have at least 1 byte (the hash type byte)
    if sig_bytes.is_empty() {
        return false;
    }

    // Last byte is the hash type. The synthesised PUSHTX signatures use
    // SIGHASH_ALL | FORKID or plain SIGHASH_ALL; either way the engine
    // verifies against the caller-supplied digest, so only the DER part
    // matters here.
    let der_sig = &sig_bytes[..sig_bytes.len() - 1];

    let secp = Secp256k1::verification_only();

    let signature = match Signature::from_der(der_sig) {
        Ok(s) => s,
        Err(_) => return false,
    };

    let public_key = match PublicKey::from_slice(pubkey_bytes) {
        Ok(k) => k,
        Err(_) => return false,
    };

    let message = Message::from_digest(*sighash);

    secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
}
