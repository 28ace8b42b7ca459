// Transform — per-sample preprocessing applied by loaders after fetch

use crate::dataset::Sample;

/// A per-sample transformation, applied by loaders after fetch.
pub trait Transform: Send + Sync {
    fn apply(&self, sample: Sample) -> Sample;
}

/// Per-channel standardization: `(x - mean) / std` over the CHW planes.
#[derive(Debug, Clone)]
pub struct ChannelNormalize {
    mean: [f32; 3],
    std: [f32; 3],
}

impl ChannelNormalize {
    pub fn new(mean: [f32; 3], std: [f32; 3]) -> Self {
        ChannelNormalize { mean, std }
    }

    /// Normalize planar CHW `pixels` in place.
    pub fn apply_chw(&self, pixels: &mut [f32], shape: [usize; 3]) {
        let plane = shape[1] * shape[2];
        for c in 0..shape[0].min(3) {
            let (m, s) = (self.mean[c], self.std[c]);
            for v in &mut pixels[c * plane..(c + 1) * plane] {
                *v = (*v - m) / s;
            }
        }
    }
}

impl Transform for ChannelNormalize {
    fn apply(&self, mut sample: Sample) -> Sample {
        self.apply_chw(&mut sample.pixels, sample.shape);
        sample
    }
}

/// Applies several transforms in order.
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Compose { transforms }
    }
}

impl Transform for Compose {
    fn apply(&self, sample: Sample) -> Sample {
        self.transforms.iter().fold(sample, |s, t| t.apply(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_1x2x2(pixels: Vec<f32>) -> Sample {
        Sample {
            pixels,
            shape: [1, 2, 2],
            label: 0,
        }
    }

    #[test]
    fn test_channel_normalize() {
        let norm = ChannelNormalize::new([0.5, 0.0, 0.0], [0.5, 1.0, 1.0]);
        let out = norm.apply(sample_1x2x2(vec![0.0, 0.5, 1.0, 0.25]));
        assert_eq!(out.pixels, vec![-1.0, 0.0, 1.0, -0.5]);
    }

    #[test]
    fn test_normalize_is_per_channel() {
        let norm = ChannelNormalize::new([1.0, 2.0, 3.0], [1.0, 1.0, 1.0]);
        let sample = Sample {
            pixels: vec![1.0, 2.0, 3.0],
            shape: [3, 1, 1],
            label: 0,
        };
        let out = norm.apply(sample);
        assert_eq!(out.pixels, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_compose_applies_in_order() {
        let first = ChannelNormalize::new([1.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let second = ChannelNormalize::new([0.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let composed = Compose::new(vec![Box::new(first), Box::new(second)]);
        let out = composed.apply(sample_1x2x2(vec![3.0, 5.0, 1.0, 1.0]));
        assert_eq!(out.pixels, vec![1.0, 2.0, 0.0, 0.0]);
    }
}
