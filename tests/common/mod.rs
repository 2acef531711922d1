//! Reference-side helpers for the integration tests.
//!
//! The compiled scripts consume witnesses — gradients, inverses, bit
//! decompositions — that a prover derives with ordinary field and curve
//! arithmetic. These helpers mirror, on `ark-bls12-381` types, exactly
//! the sequence of operations the emitted scripts verify, so every test
//! can lay out a witness and predict the expected stack slot for slot.

#![allow(dead_code)]

use ark_bls12_381::{Fq, Fq12, Fq2, Fq6, Fr, G1Affine, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, One, PrimeField, UniformRand, Zero};
use num_bigint::{BigInt, BigUint};

use zk_bitcoin_script::engine::ExecuteOpts;
use zk_bitcoin_script::pairing::params::CurveParams;
use zk_bitcoin_script::script::{run_unlock_then_lock, Script};
use zk_bitcoin_script::unlock::pairing::{Fq2Gradient, MillerGradients};

// ── Conversions ──────────────────────────────────────────────────────

pub fn fq_to_int(value: &Fq) -> BigInt {
    BigInt::from(BigUint::from(value.into_bigint()))
}

pub fn fq2_pair(value: &Fq2) -> (BigInt, BigInt) {
    (fq_to_int(&value.c0), fq_to_int(&value.c1))
}

pub fn fq2_ints(value: &Fq2) -> Vec<BigInt> {
    vec![fq_to_int(&value.c0), fq_to_int(&value.c1)]
}

/// The twelve stack integers of an `F_q^12` element in the quadratic
/// slot order the final exponentiation produces.
pub fn fq12_quadratic_slots(value: &Fq12) -> Vec<BigInt> {
    let mut out = Vec::with_capacity(12);
    for fq6 in [&value.c0, &value.c1] {
        for fq2 in [&fq6.c0, &fq6.c1, &fq6.c2] {
            out.extend(fq2_ints(fq2));
        }
    }
    out
}

/// The twelve stack integers in the cubic slot order the Miller loop
/// produces: `(a, b, c, d, e, f) = (y00, y11, y10, y02, y01, y12)`.
pub fn fq12_cubic_slots(value: &Fq12) -> Vec<BigInt> {
    let mut out = Vec::with_capacity(12);
    for fq2 in [
        &value.c0.c0,
        &value.c1.c1,
        &value.c1.c0,
        &value.c0.c2,
        &value.c0.c1,
        &value.c1.c2,
    ] {
        out.extend(fq2_ints(fq2));
    }
    out
}

pub fn int_to_fq(value: &BigInt) -> Fq {
    let (_, bytes) = value.to_bytes_le();
    Fq::from_le_bytes_mod_order(&bytes)
}

pub fn g1_coords(point: &G1Affine) -> (BigInt, BigInt) {
    (fq_to_int(point.x().unwrap()), fq_to_int(point.y().unwrap()))
}

pub fn g2_coords(point: &G2Affine) -> [BigInt; 4] {
    let x = point.x().unwrap();
    let y = point.y().unwrap();
    [
        fq_to_int(&x.c0),
        fq_to_int(&x.c1),
        fq_to_int(&y.c0),
        fq_to_int(&y.c1),
    ]
}

// ── Base-curve gradient mirrors ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G1Point {
    pub x: Fq,
    pub y: Fq,
}

impl G1Point {
    pub fn from_affine(point: &G1Affine) -> Self {
        Self {
            x: *point.x().unwrap(),
            y: *point.y().unwrap(),
        }
    }

    pub fn coords(&self) -> (BigInt, BigInt) {
        (fq_to_int(&self.x), fq_to_int(&self.y))
    }
}

pub fn g1_tangent(p: &G1Point) -> Fq {
    (p.x * p.x * Fq::from(3u64)) * (p.y + p.y).inverse().unwrap()
}

pub fn g1_chord(p: &G1Point, q: &G1Point) -> Fq {
    (p.y - q.y) * (p.x - q.x).inverse().unwrap()
}

pub fn g1_add(p: &G1Point, q: &G1Point) -> G1Point {
    let lambda = if p == q {
        g1_tangent(p)
    } else {
        g1_chord(p, q)
    };
    let x = lambda * lambda - p.x - q.x;
    let y = lambda * (p.x - x) - p.y;
    G1Point { x, y }
}

/// Gradients of the unrolled double-and-add, one entry per executed
/// iteration (doubling gradient first, addition gradient when the bit
/// is set), plus the product point.
pub fn g1_multiplication_gradients(scalar: u64, base: &G1Point) -> (Vec<Vec<BigInt>>, G1Point) {
    g1_multiplication_gradients_big(&BigInt::from(scalar), base)
}

/// [`g1_multiplication_gradients`] for scalars past 64 bits (the RefTx
/// sighash chunks are 128-bit).
pub fn g1_multiplication_gradients_big(
    scalar: &BigInt,
    base: &G1Point,
) -> (Vec<Vec<BigInt>>, G1Point) {
    assert!(scalar > &BigInt::from(0));
    let bits = scalar.bits() as usize;
    let mut t = *base;
    let mut gradients = Vec::new();
    for i in (0..bits - 1).rev() {
        let mut step = vec![fq_to_int(&g1_tangent(&t))];
        t = g1_add(&t, &t);
        if scalar.bit(i as u64) {
            step.push(fq_to_int(&g1_chord(&t, base)));
            t = g1_add(&t, base);
        }
        gradients.push(step);
    }
    (gradients, t)
}

// ── Twisted-curve accumulator and Miller mirrors ─────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct G2Point {
    pub x: Fq2,
    pub y: Fq2,
}

impl G2Point {
    pub fn from_affine(point: &G2Affine) -> Self {
        Self {
            x: *point.x().unwrap(),
            y: *point.y().unwrap(),
        }
    }

    pub fn negate(&self) -> Self {
        Self {
            x: self.x,
            y: -self.y,
        }
    }
}

pub fn g2_tangent(p: &G2Point) -> Fq2 {
    let three = Fq2::new(Fq::from(3u64), Fq::zero());
    (p.x * p.x * three) * (p.y + p.y).inverse().unwrap()
}

pub fn g2_chord(p: &G2Point, q: &G2Point) -> Fq2 {
    (p.y - q.y) * (p.x - q.x).inverse().unwrap()
}

pub fn g2_step(p: &G2Point, lambda: &Fq2, q: &G2Point) -> G2Point {
    let x = *lambda * lambda - p.x - q.x;
    let y = *lambda * (p.x - x) - p.y;
    G2Point { x, y }
}

/// The sparse line evaluation as a full `F_q^12` element:
/// `(lambda xT - yT) - lambda xP t^2 + yP t^3`.
pub fn line_evaluation(lambda: &Fq2, t: &G2Point, p: &G1Point) -> Fq12 {
    let c0 = *lambda * t.x - t.y;
    let c2 = -(*lambda * Fq2::new(p.x, Fq::zero()));
    let c3 = Fq2::new(p.y, Fq::zero());
    Fq12::new(Fq6::new(c0, c2, Fq2::zero()), Fq6::new(Fq2::zero(), c3, Fq2::zero()))
}

/// Per-iteration gradients of one Miller accumulator run over `Q`.
pub fn miller_gradients(q: &G2Point) -> MillerGradients {
    let params = CurveParams::bls12_381();
    let digits = params.digits_msb_first();
    let neg_q = q.negate();
    let mut t = match digits[0] {
        1 => *q,
        _ => neg_q,
    };
    let mut gradients = Vec::new();
    for &digit in &digits[1..] {
        let lambda_dbl = g2_tangent(&t);
        let mut step: Vec<Fq2Gradient> = vec![fq2_pair(&lambda_dbl)];
        let doubled = g2_step(&t, &lambda_dbl, &t);
        t = doubled;
        if digit != 0 {
            let other = if digit == 1 { *q } else { neg_q };
            let lambda_add = g2_chord(&t, &other);
            step.push(fq2_pair(&lambda_add));
            t = g2_step(&t, &lambda_add, &other);
        }
        gradients.push(step);
    }
    gradients
}

/// The Miller value the compiled loop accumulates for `(P, Q)`.
pub fn miller_value(p: &G1Point, q: &G2Point) -> Fq12 {
    let params = CurveParams::bls12_381();
    let digits = params.digits_msb_first();
    let neg_q = q.negate();
    let mut t = match digits[0] {
        1 => *q,
        _ => neg_q,
    };
    let mut f = Fq12::one();
    for &digit in &digits[1..] {
        f.square_in_place();
        let lambda_dbl = g2_tangent(&t);
        f *= line_evaluation(&lambda_dbl, &t, p);
        let doubled = g2_step(&t, &lambda_dbl, &t);
        t = doubled;
        if digit != 0 {
            let other = if digit == 1 { *q } else { neg_q };
            let lambda_add = g2_chord(&t, &other);
            f *= line_evaluation(&lambda_add, &t, p);
            t = g2_step(&t, &lambda_add, &other);
        }
    }
    f
}

/// Exponent of the final exponentiation, `(q^12 - 1) / r`.
pub fn final_exponent() -> BigUint {
    let q: BigUint = Fq::MODULUS.into();
    let r: BigUint = Fr::MODULUS.into();
    (q.pow(12) - BigUint::from(1u8)) / r
}

/// The pairing the compiled verifier computes: the Miller value raised
/// to the final exponent.
pub fn pairing_value(p: &G1Point, q: &G2Point) -> Fq12 {
    miller_value(p, q).pow(final_exponent().to_u64_digits())
}

// ── Script-side helpers ──────────────────────────────────────────────

pub fn push_all(script: &mut Script, values: &[BigInt]) {
    for value in values {
        script.push_int(value);
    }
}

pub fn run(unlock: &Script, lock: &Script) -> Vec<Vec<u8>> {
    run_unlock_then_lock(unlock, lock, &ExecuteOpts::default()).expect("script execution")
}

pub fn stack_ints(stack: &[Vec<u8>]) -> Vec<BigInt> {
    stack
        .iter()
        .map(|item| zk_bitcoin_script::num::decode_num(item))
        .collect()
}

/// Deterministic test points: scalar multiples of the generators.
pub fn g1_point(scalar: u64) -> G1Point {
    let point = (G1Affine::generator() * Fr::from(scalar)).into_affine();
    G1Point::from_affine(&point)
}

pub fn g2_point(scalar: u64) -> G2Point {
    let point = (G2Affine::generator() * Fr::from(scalar)).into_affine();
    G2Point::from_affine(&point)
}

pub fn random_fq2(rng: &mut impl rand::Rng) -> Fq2 {
    Fq2::rand(rng)
}
