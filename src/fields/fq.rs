//! Prime-field arithmetic compiled to script.

use num_bigint::BigInt;

use crate::builder::ops::{reduce_top_items, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::descriptor::StackNumber;
use crate::error::BuilderError;
use crate::opcode::Opcode;
use crate::script::Script;

/// Script builder for arithmetic modulo a prime `q`.
///
/// Operands are single stack numbers. Reduction is deferred: without
/// `take_modulo` the raw integer result is left on the stack, and the
/// caller is responsible for staying inside the interpreter's number
/// bound (see [`crate::builder::budget`]).
#[derive(Debug, Clone)]
pub struct Fq {
    modulus: BigInt,
}

impl Fq {
    pub fn new(modulus: BigInt) -> Self {
        Self { modulus }
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    fn preamble(&self, flags: OpFlags) -> Script {
        if flags.check_constant {
            verify_bottom_constant(&self.modulus)
        } else {
            Script::new()
        }
    }

    fn tail(&self, flags: OpFlags) -> Script {
        if flags.take_modulo {
            reduce_top_items(
                1,
                flags.positive_modulo,
                flags.clean_constant,
                flags.is_constant_reused,
            )
        } else {
            Script::new()
        }
    }

    /// `[.., x, y] -> [.., x + y]`
    pub fn add(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.op(Opcode::OpAdd);
        out.append(self.tail(flags));
        out
    }

    /// `[.., x, y] -> [.., x - y]`
    pub fn subtract(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.op(Opcode::OpSub);
        out.append(self.tail(flags));
        out
    }

    /// `[.., x] -> [.., -x]`
    pub fn negate(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.op(Opcode::OpNegate);
        out.append(self.tail(flags));
        out
    }

    /// `[.., x, y] -> [.., x * y]`
    pub fn mul(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.op(Opcode::OpMul);
        out.append(self.tail(flags));
        out
    }

    /// `[.., x] -> [.., x^2]`
    pub fn square(&self, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.op(Opcode::OpDup).op(Opcode::OpMul);
        out.append(self.tail(flags));
        out
    }

    /// `[.., x] -> [.., c * x]` for a compile-time constant `c`.
    pub fn scalar_mul_by_constant(&self, c: &BigInt, flags: OpFlags) -> Script {
        let mut out = self.preamble(flags);
        out.push_int(c);
        out.op(Opcode::OpMul);
        out.append(self.tail(flags));
        out
    }

    /// Signed sum of arbitrary stack numbers.
    ///
    /// `terms` are listed deepest first; each is picked or rolled per
    /// its descriptor and negated per its `negate` flag, and the result
    /// `sum_i (-1)^{negate_i} x_i` is left on top. Rolled terms vanish,
    /// picked terms stay in place.
    pub fn algebraic_sum(
        &self,
        terms: &[StackNumber],
        flags: OpFlags,
    ) -> Result<Script, BuilderError> {
        for pair in terms.windows(2) {
            if pair[0].position <= pair[1].position {
                return Err(BuilderError::WrongOrder {
                    expected_before: "deeper summand",
                    expected_after: "shallower summand",
                });
            }
        }

        let mut out = self.preamble(flags);
        let mut pending: Vec<StackNumber> = terms.to_vec();
        for i in 0..pending.len() {
            let term = pending[i];
            out.append(term.move_to_top());
            if term.negate {
                out.op(Opcode::OpNegate);
            }
            if i > 0 {
                out.op(Opcode::OpAdd);
            }
            for other in pending.iter_mut().skip(i + 1) {
                let mut delta = match term.mode {
                    crate::descriptor::MoveMode::Pick => 1,
                    crate::descriptor::MoveMode::Roll => {
                        if other.position < term.position {
                            1
                        } else {
                            0
                        }
                    }
                };
                if i > 0 {
                    // The fold consumed one item from the top.
                    delta -= 1;
                }
                other.position += delta;
            }
        }
        out.append(self.tail(flags));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MoveMode;
    use crate::engine::ExecuteOpts;
    use crate::script::run_unlock_then_lock;

    fn fq19() -> Fq {
        Fq::new(BigInt::from(19))
    }

    fn setup(ns: &[i64]) -> Script {
        let mut s = Script::new();
        for &n in ns {
            s.push_i64(n);
        }
        s
    }

    fn run(unlock: &Script, lock: &Script) -> Vec<Vec<u8>> {
        run_unlock_then_lock(unlock, lock, &ExecuteOpts::default()).unwrap()
    }

    #[test]
    fn add_no_modulo() {
        let stack = run(&setup(&[19, 15, 9]), &fq19().add(OpFlags::bare()));
        assert_eq!(stack, vec![vec![19], vec![24]]);
    }

    #[test]
    fn add_with_modulo() {
        let stack = run(&setup(&[19, 15, 9]), &fq19().add(OpFlags::reduce()));
        assert_eq!(stack, vec![vec![19], vec![5]]);
    }

    #[test]
    fn subtract_positive_representative() {
        let stack = run(&setup(&[19, 3, 9]), &fq19().subtract(OpFlags::reduce()));
        assert_eq!(stack, vec![vec![19], vec![13]]);
    }

    #[test]
    fn subtract_signed_representative() {
        let flags = OpFlags::reduce().with_positive_modulo(false);
        let stack = run(&setup(&[19, 3, 9]), &fq19().subtract(flags));
        assert_eq!(stack, vec![vec![19], vec![0x86]]); // -6
    }

    #[test]
    fn mul_and_clean() {
        let stack = run(&setup(&[19, 7, 8]), &fq19().mul(OpFlags::reduce_and_clean()));
        assert_eq!(stack, vec![vec![18]]); // 56 mod 19, q removed
    }

    #[test]
    fn square_reused_constant() {
        let flags = OpFlags::reduce().with_constant_reused(true);
        let stack = run(&setup(&[19, 5]), &fq19().square(flags));
        assert_eq!(stack, vec![vec![19], vec![19], vec![6]]); // 25 mod 19, q kept above
    }

    #[test]
    fn scalar_mul() {
        let lock = fq19().scalar_mul_by_constant(&BigInt::from(10), OpFlags::reduce());
        let stack = run(&setup(&[19, 6]), &lock);
        assert_eq!(stack, vec![vec![19], vec![3]]); // 60 mod 19
    }

    #[test]
    fn check_constant_rejects_wrong_modulus() {
        let lock = fq19().add(OpFlags::bare().with_check_constant(true));
        let err =
            run_unlock_then_lock(&setup(&[18, 1, 2]), &lock, &ExecuteOpts::default()).unwrap_err();
        assert!(matches!(err, crate::error::ScriptError::VerifyFailed));
    }

    #[test]
    fn algebraic_sum_signs_and_moves() {
        // Stack: [19, 8, 5, 3]; compute -8 + 5 - 3 rolling 8 and 3,
        // picking 5.
        let terms = [
            StackNumber::new(2, true, MoveMode::Roll),
            StackNumber::new(1, false, MoveMode::Pick),
            StackNumber::new(0, true, MoveMode::Roll),
        ];
        let lock = fq19().algebraic_sum(&terms, OpFlags::reduce()).unwrap();
        let stack = run(&setup(&[19, 8, 5, 3]), &lock);
        // -8 + 5 - 3 = -6 = 13 mod 19; the picked 5 survives.
        assert_eq!(stack, vec![vec![19], vec![5], vec![13]]);
    }

    #[test]
    fn algebraic_sum_requires_descending_positions() {
        let terms = [
            StackNumber::new(0, false, MoveMode::Roll),
            StackNumber::new(1, false, MoveMode::Roll),
        ];
        let err = fq19().algebraic_sum(&terms, OpFlags::bare()).unwrap_err();
        assert!(matches!(err, BuilderError::WrongOrder { .. }));
    }
}
