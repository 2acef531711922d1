use num_bigint::BigInt;

use crate::engine::{execute_on_stack, ExecuteOpts};
use crate::error::ScriptError;
use crate::num::encode_num;
use crate::opcode::Opcode;
use crate::stack::{is_true, Stack};
use crate::token::Token;
use crate::tokenizer::parse_script;

/// An emitted script: an ordered sequence of opcodes and byte literals.
///
/// This is the unit the compiler produces and composes. Concatenation is
/// the only composition (associative, not commutative; the empty script
/// is the identity), exposed through `+=` so builder code reads as a
/// sequence of appended fragments. Internally the script is an
/// opcode-typed vector that serialises once via [`Script::to_bytes`];
/// fragments are appended in place, never linked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    tokens: Vec<Token>,
}

impl Script {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Appends a single opcode.
    pub fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.tokens.push(Token::Op(opcode));
        self
    }

    /// Appends a sequence of opcodes.
    pub fn ops(&mut self, opcodes: &[Opcode]) -> &mut Self {
        for &opcode in opcodes {
            self.tokens.push(Token::Op(opcode));
        }
        self
    }

    /// Appends an opaque byte-literal push.
    pub fn push_data(&mut self, data: &[u8]) -> &mut Self {
        self.tokens.push(Token::PushData(data.to_vec()));
        self
    }

    /// Appends the push of a signed integer, using the one-byte constant
    /// opcodes for values in `[-1, 16]` and a minimally encoded data push
    /// otherwise.
    pub fn push_int(&mut self, n: &BigInt) -> &mut Self {
        if let Ok(small) = i64::try_from(n.clone()) {
            if let Some(opcode) = Opcode::from_small_int(small) {
                return self.op(opcode);
            }
        }
        self.push_data(&encode_num(n))
    }

    /// [`Script::push_int`] for machine integers.
    pub fn push_i64(&mut self, n: i64) -> &mut Self {
        if let Some(opcode) = Opcode::from_small_int(n) {
            return self.op(opcode);
        }
        self.push_data(&encode_num(&BigInt::from(n)))
    }

    /// Appends pushes for a slice of integers, first element deepest.
    pub fn push_ints(&mut self, nums: &[BigInt]) -> &mut Self {
        for n in nums {
            self.push_int(n);
        }
        self
    }

    /// Appends another script fragment.
    pub fn append(&mut self, other: Script) -> &mut Self {
        self.tokens.extend(other.tokens);
        self
    }

    /// The parsed token view of the script.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of items (opcodes + pushes).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the script is the empty (identity) script.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialises the script into consensus byte form, choosing the
    /// smallest push-data encoding for each literal.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for token in &self.tokens {
            match token {
                Token::Op(opcode) => out.push(opcode.to_byte()),
                Token::PushData(data) => match data.len() {
                    0 => out.push(Opcode::Op0.to_byte()),
                    1..=0x4b => {
                        out.push(data.len() as u8);
                        out.extend_from_slice(data);
                    }
                    0x4c..=0xff => {
                        out.push(0x4c);
                        out.push(data.len() as u8);
                        out.extend_from_slice(data);
                    }
                    0x100..=0xffff => {
                        out.push(0x4d);
                        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
                        out.extend_from_slice(data);
                    }
                    _ => {
                        out.push(0x4e);
                        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
                        out.extend_from_slice(data);
                    }
                },
            }
        }
        out
    }

    /// Parses consensus bytes back into a script.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScriptError> {
        Ok(Self {
            tokens: parse_script(bytes)?,
        })
    }
}

impl std::ops::AddAssign for Script {
    fn add_assign(&mut self, rhs: Script) {
        self.tokens.extend(rhs.tokens);
    }
}

impl std::ops::Add for Script {
    type Output = Script;

    fn add(mut self, rhs: Script) -> Script {
        self.tokens.extend(rhs.tokens);
        self
    }
}

impl std::fmt::Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

/// Validates a locking/unlocking script pair.
///
/// Executes the unlocking script on a fresh stack, then the locking
/// script on the resulting stack. This two-phase model matches Bitcoin's
/// execution behavior (post-2010), preventing the unlocking script from
/// injecting flow control into the lock.
///
/// Returns `Ok(true)` if the combined execution succeeds (top stack
/// element is truthy after both phases).
pub fn validate_unlock_then_lock(
    unlocking: &Script,
    locking: &Script,
    opts: &ExecuteOpts,
) -> Result<bool, ScriptError> {
    let mut stack = Stack::new();

    // Phase 1: the unlocking script lays out the witness.
    execute_on_stack(unlocking.tokens(), &mut stack, opts)?;

    // Phase 2: the locking script consumes it.
    execute_on_stack(locking.tokens(), &mut stack, opts)?;

    if stack.is_empty() {
        return Ok(false);
    }
    let top = stack.pop()?;
    Ok(is_true(&top))
}

/// Runs a locking/unlocking pair and returns the final stack, bottom
/// first.
///
/// Tests use this to check the exact stack layout a construction
/// documents, not just truthiness.
pub fn run_unlock_then_lock(
    unlocking: &Script,
    locking: &Script,
    opts: &ExecuteOpts,
) -> Result<Vec<Vec<u8>>, ScriptError> {
    let mut stack = Stack::new();
    execute_on_stack(unlocking.tokens(), &mut stack, opts)?;
    execute_on_stack(locking.tokens(), &mut stack, opts)?;
    Ok(stack.into_items())
}
