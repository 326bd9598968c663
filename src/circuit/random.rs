use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::aig::{Aig, AigBuilder, AigLit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomShape {
    pub inputs: usize,
    pub ands: usize,
    pub outputs: usize,
    pub window: usize,
}

impl Default for RandomShape {
    fn default() -> Self {
        Self {
            inputs: 6,
            ands: 24,
            outputs: 1,
            window: 8,
        }
    }
}

/// Deterministic random AIG for a given seed. Outputs are taken from the
/// last and gates (or inputs when there are none).
pub fn random_aig(shape: RandomShape, seed: u64) -> Aig {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = AigBuilder::new();
    let mut pool = Vec::<AigLit>::with_capacity(shape.inputs + shape.ands);

    for _ in 0..shape.inputs.max(1) {
        pool.push(b.input());
    }

    for _ in 0..shape.ands {
        let lo = pool.len().saturating_sub(shape.window.max(2));
        let x = pick(&mut rng, &pool, lo);
        let y = pick(&mut rng, &pool, lo);
        let lit = b.and(x, y);
        pool.push(lit);
    }

    let mut outputs = Vec::with_capacity(shape.outputs);
    for k in 0..shape.outputs {
        let idx = pool.len() - 1 - (k % pool.len());
        let lit = pool[idx];
        outputs.push(lit.negate_if(rng.random::<bool>()));
    }
    b.finish(outputs)
}

fn pick(rng: &mut ChaCha8Rng, pool: &[AigLit], lo: usize) -> AigLit {
    // rare constant fanins exercise the constant node in the encoder
    if rng.random_range(0..32) == 0 {
        return AigLit::TRUE;
    }
    let lit = pool[rng.random_range(lo..pool.len())];
    lit.negate_if(rng.random::<bool>())
}
