//! The pairing engine: Miller loops, final exponentiation, and the
//! single/triple pairing products that glue them.

pub mod final_exp;
pub mod line;
pub mod miller;
pub mod miller_ops;
pub mod params;

use crate::builder::ops::{drop_bottom_constant, pick, roll, verify_bottom_constant};
use crate::builder::OpFlags;
use crate::curves::ec_fq2::EllipticCurveFq2;
use crate::fields::fq12::Fq12;
use crate::fields::fq12_cubic::Fq12Cubic;
use crate::fields::fq2::Fq2;
use crate::fields::fq4::Fq4;
use crate::fields::fq6::Fq6;
use crate::fields::tower::drop_items;
use crate::opcode::Opcode;
use crate::script::Script;

use final_exp::FinalExponentiation;
use line::LineFunctions;
use miller::MillerLoop;
use miller_ops::MillerOps;
use params::{CurveParams, TwistType};

/// The assembled pairing compiler for one curve.
///
/// Construction order is explicit and bottom-up: the quadratic field
/// feeds every tower and builder above it, each taken by value — there
/// is no runtime wiring to mutate.
#[derive(Debug, Clone)]
pub struct Pairing {
    params: CurveParams,
    fq12: Fq12,
    miller: MillerLoop,
    final_exp: FinalExponentiation,
}

impl Pairing {
    pub fn new(params: CurveParams) -> Self {
        assert!(
            params.twist == TwistType::M,
            "only the M-twist line evaluation is implemented"
        );
        let fq2 = Fq2::new(params.modulus.clone(), params.fq2_non_residue.clone());
        let fq4 = Fq4::new(fq2.clone());
        let fq6 = Fq6::new(fq2.clone());
        let fq12 = Fq12::new(fq2.clone(), fq6, params.gammas.clone());
        let fq12_cubic = Fq12Cubic::new(fq2.clone(), fq4);
        let twisted_curve = EllipticCurveFq2::new(fq2.clone(), params.twist_a.clone());
        let line = LineFunctions::new(fq2.clone());
        let ops = MillerOps::new(fq2);
        let miller = MillerLoop::new(params.clone(), twisted_curve, line, ops);
        let final_exp = FinalExponentiation::new(params.clone(), fq12.clone(), fq12_cubic);
        Self {
            params,
            fq12,
            miller,
            final_exp,
        }
    }

    pub fn params(&self) -> &CurveParams {
        &self.params
    }

    pub fn fq12(&self) -> &Fq12 {
        &self.fq12
    }

    pub fn miller(&self) -> &MillerLoop {
        &self.miller
    }

    pub fn final_exp(&self) -> &FinalExponentiation {
        &self.final_exp
    }

    /// `e(P, Q)`.
    ///
    /// Stack in: `[q .. inverse(12) gradients P(2) Q(4)]` in the
    /// general case; when either operand is the infinity sentinel, the
    /// witness is just the sentinel-coordinate points themselves.
    /// Stack out: `[q .. e(P, Q)(12)]` in the quadratic representation
    /// — the identity when either operand is infinity.
    pub fn single_pairing(
        &self,
        modulo_threshold: usize,
        check_constant: bool,
        clean_constant: bool,
    ) -> Script {
        let mut out = if check_constant {
            verify_bottom_constant(&self.params.modulus)
        } else {
            Script::new()
        };

        // Q == infinity?
        out.append(pick(3, 4));
        for _ in 0..3 {
            out.op(Opcode::OpCat);
        }
        out.push_data(&[0x00; 4]);
        out.op(Opcode::OpEqual);
        out.op(Opcode::OpNotIf);
        {
            // P == infinity?
            out.append(pick(5, 2));
            out.op(Opcode::OpCat);
            out.push_data(&[0x00; 2]);
            out.op(Opcode::OpEqual);
            out.op(Opcode::OpNotIf);
            {
                out.append(self.miller.miller_loop(modulo_threshold, false, false));
                // Drop the accumulator; no subgroup checks are needed
                // for Groth16-style verification.
                out.append(roll(15, 4));
                out.append(drop_items(4));
                out.append(
                    self.final_exp
                        .easy_exponentiation_with_inverse_check(OpFlags::reduce()),
                );
                out.append(self.final_exp.hard_exponentiation(
                    modulo_threshold,
                    OpFlags {
                        take_modulo: true,
                        clean_constant,
                        ..OpFlags::default()
                    },
                ));
            }
            out.op(Opcode::OpElse);
            {
                // P at infinity: drop P and Q, push the identity.
                out.append(drop_items(6));
                out.append(self.push_identity());
                if clean_constant {
                    out.append(drop_bottom_constant());
                }
            }
            out.op(Opcode::OpEndIf);
        }
        out.op(Opcode::OpElse);
        {
            // Q at infinity: drop P and Q, push the identity.
            out.append(drop_items(6));
            out.append(self.push_identity());
            if clean_constant {
                out.append(drop_bottom_constant());
            }
        }
        out.op(Opcode::OpEndIf);
        out
    }

    /// `e(P1, Q1) * e(P2, Q2) * e(P3, Q3)`.
    ///
    /// Stack in:
    /// `[q .. inverse(12) gradients P1 P2 P3 Q1 Q2 Q3]`; stack out:
    /// `[q .. product(12)]` (quadratic representation). None of the
    /// operands may be the point at infinity.
    pub fn triple_pairing(
        &self,
        modulo_threshold: usize,
        check_constant: bool,
        clean_constant: bool,
    ) -> Script {
        let mut out = if check_constant {
            verify_bottom_constant(&self.params.modulus)
        } else {
            Script::new()
        };
        out.append(self.miller.triple_miller_loop(modulo_threshold, false, false));
        out.append(
            self.final_exp
                .easy_exponentiation_with_inverse_check(OpFlags::reduce()),
        );
        out.append(self.final_exp.hard_exponentiation(
            modulo_threshold,
            OpFlags {
                take_modulo: true,
                clean_constant,
                ..OpFlags::default()
            },
        ));
        out
    }

    /// Pushes the multiplicative identity of `F_q^12` (quadratic
    /// representation).
    fn push_identity(&self) -> Script {
        let mut out = Script::new();
        out.push_i64(1);
        for _ in 0..11 {
            out.push_i64(0);
        }
        out
    }
}
