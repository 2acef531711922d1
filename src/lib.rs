//! Bitcoin Script compiler for on-chain Groth16 zero-knowledge proof
//! verification.
//!
//! Bitcoin Script is a stack machine with no loops, no function calls
//! and no modular reduction. This crate compiles the whole of a Groth16
//! verifier — prime-field and tower-field arithmetic, elliptic-curve
//! operations, Miller loops, the final exponentiation — into
//! straight-line sequences of script opcodes, with every
//! non-deterministic value (gradients, inverses, bit decompositions)
//! supplied by the spender and proved correct by the emitted script
//! itself.
//!
//! # Consensus warning
//!
//! **The bundled execution engine is NOT consensus-compatible with any
//! production node.** It exists so that every compiled locking script
//! can be executed against its mirror unlocking script in tests; number
//! encoding boundaries, error ordering and resource limits of real
//! interpreters are out of scope. Do not use it to validate real
//! transactions or protect real funds.
//!
//! # Layout
//!
//! The crate has two halves:
//!
//! - **Engine** ([`tokenizer`], [`engine`], [`opcode`], [`script`]): a
//!   big-number Bitcoin Script virtual machine in the post-Genesis
//!   style, with the two-phase unlock-then-lock validation model.
//! - **Compiler**: layered script builders, each returning a fragment
//!   that composes by concatenation —
//!   [`builder`] (stack primitives, batched modulo, size budgeting),
//!   [`descriptor`] (stack-layout contracts),
//!   [`fields`] (Fq through both Fq12 representations),
//!   [`curves`] (gradient-verified point arithmetic, unrolled
//!   multiplication, fixed-base MSM),
//!   [`pairing`] (Miller loops and the final exponentiation),
//!   [`groth16`], [`reftx`] and [`introspection`] (the verifier and
//!   its transaction-binding wrapper), and [`unlock`] (the mirror
//!   builders producing the witness each lock consumes).
//!
//! # Quick example
//!
//! ```rust
//! use num_bigint::BigInt;
//! use zk_bitcoin_script::builder::OpFlags;
//! use zk_bitcoin_script::engine::ExecuteOpts;
//! use zk_bitcoin_script::fields::fq2::Fq2;
//! use zk_bitcoin_script::script::{validate_unlock_then_lock, Script};
//!
//! // Multiplication in F_19[u]/(u^2 + 1): (5 + 10u)(2 + 10u) = 17 + 13u.
//! let fq2 = Fq2::new(BigInt::from(19), BigInt::from(-1));
//! let mut locking = fq2.mul(OpFlags::reduce());
//! locking.push_i64(13);
//! locking.op(zk_bitcoin_script::opcode::Opcode::OpEqualVerify);
//! locking.push_i64(17);
//! locking.op(zk_bitcoin_script::opcode::Opcode::OpEqual);
//!
//! let mut unlocking = Script::new();
//! for n in [19, 5, 10, 2, 10] {
//!     unlocking.push_i64(n);
//! }
//! assert!(validate_unlock_then_lock(&unlocking, &locking, &ExecuteOpts::default()).unwrap());
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Description                                        |
//! |-------------|----------------------------------------------------|
//! | `secp256k1` | Enables real ECDSA signature verification for      |
//! |             | OP_CHECKSIG via the `secp256k1` crate (used by the |
//! |             | PUSHTX tests).                                     |

pub mod builder;
pub mod curves;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod fields;
pub mod groth16;
pub mod hash;
pub mod hex;
pub mod introspection;
pub mod num;
pub mod opcode;
pub mod pairing;
pub mod reftx;
pub mod script;
pub(crate) mod stack;
pub mod token;
pub mod tokenizer;
pub mod unlock;
