// Image Augmentation — stochastic training-time transforms
//
// Augmentations own a seeded generator, so runs are reproducible without
// global random state. Attach them to the training loader only; validation
// reads must stay deterministic.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::Sample;
use crate::transform::Transform;

/// Flip probability used by the catalog training recipe.
pub const DEFAULT_FLIP_PROB: f64 = 0.3;

/// Mirrors the image horizontally with probability `p`, independently per
/// fetched sample.
pub struct RandomHorizontalFlip {
    p: f64,
    rng: Mutex<StdRng>,
}

impl RandomHorizontalFlip {
    pub fn new(p: f64, seed: u64) -> Self {
        RandomHorizontalFlip {
            p,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Transform for RandomHorizontalFlip {
    fn apply(&self, mut sample: Sample) -> Sample {
        let roll: f64 = self.rng.lock().unwrap().gen();
        if roll >= self.p {
            return sample;
        }
        let [c, h, w] = sample.shape;
        let src = sample.pixels.clone();
        for ch in 0..c {
            for row in 0..h {
                for col in 0..w {
                    sample.pixels[ch * h * w + row * w + col] =
                        src[ch * h * w + row * w + (w - 1 - col)];
                }
            }
        }
        sample
    }
}
