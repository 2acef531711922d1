//! Groth16 end-to-end: a known dummy instance whose verification
//! equation holds by construction, driven through the full compiled
//! verifier, plus the tamper cases.

mod common;

use ark_ff::Field;
use num_bigint::BigInt;

use common::{
    fq12_quadratic_slots, g1_add, g1_chord, g1_multiplication_gradients, g1_point, g2_point,
    miller_gradients, miller_value, pairing_value, run, stack_ints, G1Point, G2Point,
};
use zk_bitcoin_script::engine::ExecuteOpts;
use zk_bitcoin_script::groth16::{Groth16, Groth16LockingKey};
use zk_bitcoin_script::pairing::params::CurveParams;
use zk_bitcoin_script::pairing::Pairing;
use zk_bitcoin_script::script::run_unlock_then_lock;
use zk_bitcoin_script::unlock::groth16::Groth16UnlockingKey;
use zk_bitcoin_script::unlock::msm::MsmUnlockingKey;
use zk_bitcoin_script::unlock::pairing::TriplePairingUnlockingKey;
use zk_bitcoin_script::unlock::unrolled::UnrolledMultiplicationUnlockingKey;

const THRESHOLD: usize = 4000;

struct DummyInstance {
    locking_key: Groth16LockingKey,
    unlocking_key: Groth16UnlockingKey,
    max_multipliers: Vec<BigInt>,
}

/// Builds an instance with one public input `a1`: the verifying-key
/// points are arbitrary generator multiples and `alpha_beta` is defined
/// as the pairing product itself, so the equation holds by
/// construction and every witness is derivable with the mirror.
fn dummy_instance(a1: u64) -> DummyInstance {
    let a = g1_point(5);
    let b = g2_point(6);
    let c = g1_point(7);
    let minus_gamma = g2_point(8).negate();
    let minus_delta = g2_point(9).negate();
    let gamma_abc_0 = g1_point(10);
    let gamma_abc_1 = g1_point(11);

    // msm = a1 * gamma_abc_1, statement = gamma_abc_0 + msm.
    let (msm_gradients, msm_point) = g1_multiplication_gradients(a1, &gamma_abc_1);
    let statement = g1_add(&msm_point, &gamma_abc_0);

    let alpha_beta = pairing_value(&a, &b)
        * pairing_value(&statement, &minus_gamma)
        * pairing_value(&c, &minus_delta);

    let miller_product = miller_value(&a, &b)
        * miller_value(&statement, &minus_gamma)
        * miller_value(&c, &minus_delta);
    let inverse = miller_product.inverse().expect("miller product is a unit");

    let q_coords = |q: &G2Point| -> [BigInt; 4] {
        [
            common::fq_to_int(&q.x.c0),
            common::fq_to_int(&q.x.c1),
            common::fq_to_int(&q.y.c0),
            common::fq_to_int(&q.y.c1),
        ]
    };

    let locking_key = Groth16LockingKey {
        alpha_beta: fq12_quadratic_slots(&alpha_beta),
        minus_gamma: q_coords(&minus_gamma).to_vec(),
        minus_delta: q_coords(&minus_delta).to_vec(),
        gamma_abc: vec![gamma_abc_0.coords(), gamma_abc_1.coords()],
    };

    let pairing_witness = TriplePairingUnlockingKey {
        p: [a.coords(), statement.coords(), c.coords()],
        q: [q_coords(&b), q_coords(&minus_gamma), q_coords(&minus_delta)],
        gradients: [
            miller_gradients(&b),
            miller_gradients(&minus_gamma),
            miller_gradients(&minus_delta),
        ],
        inverse_miller_output: fq12_quadratic_slots(&inverse),
    };

    let unlocking_key = Groth16UnlockingKey {
        public_inputs: vec![BigInt::from(a1)],
        a: a.coords(),
        b: q_coords(&b),
        c: c.coords(),
        pairing: pairing_witness,
        gradient_gamma_abc_zero: Some(common::fq_to_int(&g1_chord(&msm_point, &gamma_abc_0))),
        msm: MsmUnlockingKey {
            scalar_keys: vec![UnrolledMultiplicationUnlockingKey {
                point: None,
                scalar: BigInt::from(a1),
                gradients: msm_gradients,
                max_multiplier: BigInt::from(8u64),
            }],
            addition_gradients: Vec::new(),
        },
    };

    DummyInstance {
        locking_key,
        unlocking_key,
        max_multipliers: vec![BigInt::from(8u64)],
    }
}

fn groth16() -> Groth16 {
    Groth16::new(Pairing::new(CurveParams::bls12_381()))
}

#[test]
fn valid_dummy_proof_verifies() {
    let verifier = groth16();
    let instance = dummy_instance(3);
    let params = CurveParams::bls12_381();

    let lock = verifier
        .groth16_verifier(
            &instance.locking_key,
            THRESHOLD,
            Some(&instance.max_multipliers),
            false,
            true,
        )
        .unwrap();
    let unlock = instance
        .unlocking_key
        .to_unlocking_script(Some(&params.modulus));

    let stack = run(&unlock, &lock);
    // The final OP_EQUAL verdict, and nothing else.
    assert_eq!(stack_ints(&stack), vec![BigInt::from(1)]);
}

#[test]
fn corrupted_pairing_gradient_fails() {
    let verifier = groth16();
    let mut instance = dummy_instance(3);
    let params = CurveParams::bls12_381();
    instance.unlocking_key.pairing.gradients[0][0][0].0 += BigInt::from(1);

    let lock = verifier
        .groth16_verifier(
            &instance.locking_key,
            THRESHOLD,
            Some(&instance.max_multipliers),
            false,
            true,
        )
        .unwrap();
    let unlock = instance
        .unlocking_key
        .to_unlocking_script(Some(&params.modulus));
    assert!(run_unlock_then_lock(&unlock, &lock, &ExecuteOpts::default()).is_err());
}

#[test]
fn wrong_public_input_fails() {
    // The witness of a valid proof for input 3 cannot satisfy the same
    // lock run against the witness for input 5: the statement point
    // moves and the pairing equation misses alpha_beta.
    let verifier = groth16();
    let valid = dummy_instance(3);
    let other = dummy_instance(5);
    let params = CurveParams::bls12_381();

    // Same lock (alpha_beta for input 3), witness for input 5.
    let lock = verifier
        .groth16_verifier(
            &valid.locking_key,
            THRESHOLD,
            Some(&valid.max_multipliers),
            false,
            true,
        )
        .unwrap();
    // The witness of `other` is internally consistent for input 5, so
    // everything verifies until the hard-coded alpha_beta comparison.
    let unlock = other
        .unlocking_key
        .to_unlocking_script(Some(&params.modulus));

    let verdict = run_unlock_then_lock(&unlock, &lock, &ExecuteOpts::default());
    let succeeded = verdict
        .map(|stack| stack.last().map(|top| top == &vec![1u8]).unwrap_or(false))
        .unwrap_or(false);
    assert!(!succeeded);
}

#[test]
fn corrupted_msm_marker_fails() {
    let verifier = groth16();
    let mut instance = dummy_instance(3);
    let params = CurveParams::bls12_381();
    // Claim the scalar is 1 (a well-formed all-skip witness): the MSM
    // lands on the base itself and the final addition's gradient check
    // cannot be satisfied.
    instance.unlocking_key.msm.scalar_keys[0].scalar = BigInt::from(1);
    instance.unlocking_key.msm.scalar_keys[0].gradients = Vec::new();

    let lock = verifier
        .groth16_verifier(
            &instance.locking_key,
            THRESHOLD,
            Some(&instance.max_multipliers),
            false,
            true,
        )
        .unwrap();
    let unlock = instance
        .unlocking_key
        .to_unlocking_script(Some(&params.modulus));
    let verdict = run_unlock_then_lock(&unlock, &lock, &ExecuteOpts::default());
    assert!(verdict.is_err() || !verdict.unwrap().last().map(|top| top == &vec![1u8]).unwrap_or(false));
}
