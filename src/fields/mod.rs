//! Script builders for the prime field and its tower extensions.
//!
//! Every builder is an immutable value holding the modulus and the
//! constants of its extension; towers are wired bottom-up by passing
//! the subfield builder to the constructor. Each operation returns a
//! script fragment whose stack contract is documented on the method:
//! operands are consumed from the top of the stack, results are left on
//! the top, and the five [`crate::builder::OpFlags`] knobs control
//! reduction and handling of the modulus at the stack bottom.

pub mod fq;
pub mod fq12;
pub mod fq12_cubic;
pub mod fq2;
pub mod fq4;
pub mod fq6;
pub mod tower;
