//! Unlocking keys for the pairing constructions.

use num_bigint::BigInt;

use crate::script::Script;

/// An `F_q^2` gradient witness.
pub type Fq2Gradient = (BigInt, BigInt);

/// Per-iteration accumulator gradients of one Miller loop: the doubling
/// gradient always, the addition gradient appended on a non-zero digit.
pub type MillerGradients = Vec<Vec<Fq2Gradient>>;

fn push_gradient(out: &mut Script, gradient: &Fq2Gradient) {
    out.push_int(&gradient.0);
    out.push_int(&gradient.1);
}

/// Witness for [`crate::pairing::Pairing::single_pairing`].
///
/// The infinity cases degenerate to pushing the sentinel coordinates
/// alone; otherwise the inverse of the Miller output comes first
/// (deepest), then the per-iteration gradients with the first-consumed
/// pair shallowest, then `P` and `Q`.
#[derive(Debug, Clone)]
pub struct SinglePairingUnlockingKey {
    /// `P`, or `None` for the point at infinity.
    pub p: Option<(BigInt, BigInt)>,
    /// `Q` coordinates `(x0, x1, y0, y1)`, or `None` for infinity.
    pub q: Option<[BigInt; 4]>,
    pub gradients: MillerGradients,
    /// The claimed inverse of `miller(P, Q)`, quadratic slot order.
    pub inverse_miller_output: Vec<BigInt>,
}

impl SinglePairingUnlockingKey {
    pub fn to_unlocking_script(&self, modulus: Option<&BigInt>) -> Script {
        let mut out = Script::new();
        if let Some(q) = modulus {
            out.push_int(q);
        }

        match (&self.p, &self.q) {
            (Some(p), Some(q)) => {
                out.push_ints(&self.inverse_miller_output);
                for step in self.gradients.iter().rev() {
                    for gradient in step.iter().rev() {
                        push_gradient(&mut out, gradient);
                    }
                }
                out.push_int(&p.0);
                out.push_int(&p.1);
                for coordinate in q {
                    out.push_int(coordinate);
                }
            }
            (p, q) => {
                match p {
                    Some(p) => {
                        out.push_int(&p.0);
                        out.push_int(&p.1);
                    }
                    None => {
                        for _ in 0..2 {
                            out.push_data(&[0x00]);
                        }
                    }
                }
                match q {
                    Some(q) => {
                        for coordinate in q {
                            out.push_int(coordinate);
                        }
                    }
                    None => {
                        for _ in 0..4 {
                            out.push_data(&[0x00]);
                        }
                    }
                }
            }
        }
        out
    }
}

/// Witness for [`crate::pairing::Pairing::triple_pairing`].
///
/// The three loops' gradients are interleaved per iteration, loop 1
/// consumed first: within an iteration the layout is (deepest first)
/// `add_3 add_2 add_1 dbl_3 dbl_2 dbl_1`, with the addition entries
/// present only on a non-zero digit.
#[derive(Debug, Clone)]
pub struct TriplePairingUnlockingKey {
    pub p: [(BigInt, BigInt); 3],
    pub q: [[BigInt; 4]; 3],
    pub gradients: [MillerGradients; 3],
    /// Inverse of the product of the three Miller outputs, quadratic
    /// slot order.
    pub inverse_miller_output: Vec<BigInt>,
}

impl TriplePairingUnlockingKey {
    pub fn to_unlocking_script(&self, modulus: Option<&BigInt>) -> Script {
        let mut out = Script::new();
        if let Some(q) = modulus {
            out.push_int(q);
        }
        out.push_ints(&self.inverse_miller_output);
        out.append(self.gradients_script());
        for (x, y) in &self.p {
            out.push_int(x);
            out.push_int(y);
        }
        for q in &self.q {
            for coordinate in q {
                out.push_int(coordinate);
            }
        }
        out
    }

    /// Just the interleaved gradient region — Groth16 embeds it between
    /// the inverse and the proof points.
    pub fn gradients_script(&self) -> Script {
        let iterations = self.gradients[0].len();
        assert!(
            self.gradients.iter().all(|g| g.len() == iterations),
            "the three loops share the digit schedule"
        );

        let mut out = Script::new();
        for i in (0..iterations).rev() {
            let with_addition = self.gradients[0][i].len() == 2;
            if with_addition {
                for k in (0..3).rev() {
                    push_gradient(&mut out, &self.gradients[k][i][1]);
                }
            }
            for k in (0..3).rev() {
                push_gradient(&mut out, &self.gradients[k][i][0]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(n: i64) -> Fq2Gradient {
        (BigInt::from(n), BigInt::from(0))
    }

    #[test]
    fn triple_interleaving_order() {
        // One doubling-only iteration: region is dbl_3 dbl_2 dbl_1,
        // deepest first.
        let key = TriplePairingUnlockingKey {
            p: [
                (BigInt::from(1), BigInt::from(1)),
                (BigInt::from(2), BigInt::from(2)),
                (BigInt::from(3), BigInt::from(3)),
            ],
            q: std::array::from_fn(|_| std::array::from_fn(|_| BigInt::from(0))),
            gradients: [
                vec![vec![gradient(10)]],
                vec![vec![gradient(20)]],
                vec![vec![gradient(30)]],
            ],
            inverse_miller_output: vec![BigInt::from(0); 12],
        };
        let script = key.gradients_script();
        let tokens = script.tokens();
        // dbl_3 first (deepest), dbl_1 last (shallowest).
        assert_eq!(tokens.len(), 6);
        assert_eq!(format!("{}", tokens[0]), "<1e>"); // 30
        assert_eq!(format!("{}", tokens[2]), "<14>"); // 20
        assert_eq!(format!("{}", tokens[4]), "OP_10");
    }

    #[test]
    fn single_infinity_is_sentinels_only() {
        let key = SinglePairingUnlockingKey {
            p: None,
            q: Some(std::array::from_fn(|_| BigInt::from(7))),
            gradients: Vec::new(),
            inverse_miller_output: Vec::new(),
        };
        let script = key.to_unlocking_script(None);
        assert_eq!(script.len(), 6);
    }
}
