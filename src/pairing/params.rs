//! Compile-time curve parameters.
//!
//! A pairing-friendly curve is a value of [`CurveParams`]; switching
//! curves means supplying a different record, not different code. The
//! BLS12-381 constructor derives its Frobenius constants from the
//! non-residue with the reference field arithmetic instead of carrying
//! a hard-coded table.

use ark_ff::{Field, PrimeField};
use num_bigint::{BigInt, BigUint};

use crate::fields::fq12::Gamma;

/// Whether the sextic twist multiplies the curve constant by the
/// non-residue (`M`) or divides by it (`D`). The line-evaluation shape
/// depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwistType {
    M,
    D,
}

/// Everything the pairing compiler needs to know about a curve.
#[derive(Debug, Clone)]
pub struct CurveParams {
    /// Base-field prime.
    pub modulus: BigInt,
    /// Subgroup order.
    pub order: BigInt,
    /// Signed digits of the Miller-loop exponent, least significant
    /// first; the most significant digit must be non-zero.
    pub loop_digits: Vec<i8>,
    /// `a` coefficient of the base curve.
    pub curve_a: BigInt,
    /// `a` coefficient of the twisted curve, as an `F_q^2` pair.
    pub twist_a: (BigInt, BigInt),
    pub twist: TwistType,
    /// Non-residue of the quadratic extension (`u^2`).
    pub fq2_non_residue: BigInt,
    /// Stack slots of a base-curve point.
    pub n_points_curve: usize,
    /// Stack slots of a twisted-curve point.
    pub n_points_twist: usize,
    /// Stack slots of a Miller-loop output.
    pub n_elements_miller_output: usize,
    /// Stack slots of a line evaluation.
    pub n_elements_evaluation_output: usize,
    /// Stack slots of a product of two line evaluations.
    pub n_elements_evaluation_times_evaluation: usize,
    /// `gamma_{n,j} = xi^{j (q^n - 1) / 6}` for `n = 1..=3`, `j = 1..=5`.
    pub gammas: Vec<Vec<Gamma>>,
}

impl CurveParams {
    /// The BLS12-381 record: `u = -0xd201000000010000`, M-twist
    /// `y^2 = x^3 + 4 (1 + u)`, towers over `xi = 1 + u`.
    pub fn bls12_381() -> Self {
        use ark_bls12_381::{Fq, Fq2, Fr};

        let modulus: BigUint = Fq::MODULUS.into();
        let order: BigUint = Fr::MODULUS.into();

        // |u| = 0xd201000000010000; u is negative, so every set bit
        // contributes a -1 digit.
        let u_magnitude: u64 = 0xd201_0000_0001_0000;
        let loop_digits: Vec<i8> = (0..64)
            .map(|i| if (u_magnitude >> i) & 1 == 1 { -1 } else { 0 })
            .collect();
        let loop_digits = trim_leading_zeros(loop_digits);

        // gamma_{n,j} = xi^{j (q^n - 1) / 6}, with xi = 1 + u.
        let xi = Fq2::new(Fq::from(1u64), Fq::from(1u64));
        let six = BigUint::from(6u8);
        let mut gammas = Vec::new();
        for n in 1u32..=3 {
            let exponent = (modulus.pow(n) - BigUint::from(1u8)) / &six;
            let base = xi.pow(exponent.to_u64_digits());
            let mut row = Vec::new();
            let mut power = base;
            for _ in 1..=5 {
                row.push(fq2_to_pair(&power));
                power *= base;
            }
            gammas.push(row);
        }

        Self {
            modulus: BigInt::from(modulus),
            order: BigInt::from(order),
            loop_digits,
            curve_a: BigInt::from(0),
            twist_a: (BigInt::from(0), BigInt::from(0)),
            twist: TwistType::M,
            fq2_non_residue: BigInt::from(-1),
            n_points_curve: 2,
            n_points_twist: 4,
            n_elements_miller_output: 12,
            n_elements_evaluation_output: 5,
            n_elements_evaluation_times_evaluation: 10,
            gammas,
        }
    }

    /// Bit length of the modulus, the unit of the reduction budget.
    pub fn modulus_bits(&self) -> usize {
        self.modulus.bits() as usize
    }

    /// The loop digits most significant first, as the drivers consume
    /// them.
    pub fn digits_msb_first(&self) -> Vec<i8> {
        let mut digits = self.loop_digits.clone();
        digits.reverse();
        digits
    }
}

fn trim_leading_zeros(mut digits: Vec<i8>) -> Vec<i8> {
    while digits.last() == Some(&0) {
        digits.pop();
    }
    assert!(
        !digits.is_empty(),
        "the Miller exponent cannot be zero"
    );
    digits
}

fn fq2_to_pair(value: &ark_bls12_381::Fq2) -> Gamma {
    (
        BigInt::from(BigUint::from(value.c0.into_bigint())),
        BigInt::from(BigUint::from(value.c1.into_bigint())),
    )
}
