use super::{Batch, BatchTransform};
use crate::common::*;
use rand_distr::{Distribution, Normal};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GaussianNoiseInit {
    pub mean: R64,
    pub std: R64,
}

impl GaussianNoiseInit {
    pub fn build(self) -> Result<GaussianNoise> {
        let Self { mean, std } = self;
        ensure!(std >= 0.0, "noise std must be non-negative");
        let distribution = Normal::new(mean.raw() as f32, std.raw() as f32)
            .with_context(|| format!("invalid noise distribution N({}, {})", mean, std))?;
        Ok(GaussianNoise { distribution })
    }
}

impl Default for GaussianNoiseInit {
    fn default() -> Self {
        Self {
            mean: r64(0.0),
            std: r64(0.01),
        }
    }
}

/// Adds independent Gaussian noise to every pixel value.
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    distribution: Normal<f32>,
}

impl GaussianNoise {
    pub fn forward_one(&self, mut image: Array3<f32>, rng: &mut dyn RngCore) -> Array3<f32> {
        image.mapv_inplace(|value| value + self.distribution.sample(rng));
        image
    }
}

impl BatchTransform for GaussianNoise {
    fn forward(&self, batch: Batch, rng: &mut dyn RngCore) -> Result<Batch> {
        let Batch { images, labels } = batch;
        let images = images
            .into_iter()
            .map(|image| self.forward_one(image, rng))
            .collect();
        Batch::new(images, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn noise_statistics() -> Result<()> {
        let noise = GaussianNoiseInit {
            mean: r64(1.0),
            std: r64(0.5),
        }
        .build()?;
        let mut rng = StdRng::seed_from_u64(9);
        let output = noise.forward_one(Array3::zeros((64, 64, 3)), &mut rng);

        assert_abs_diff_eq!(output.mean().unwrap(), 1.0, epsilon = 0.05);
        assert_abs_diff_eq!(output.std(0.0), 0.5, epsilon = 0.05);
        Ok(())
    }

    #[test]
    fn zero_std_adds_mean() -> Result<()> {
        let noise = GaussianNoiseInit {
            mean: r64(2.0),
            std: r64(0.0),
        }
        .build()?;
        let mut rng = StdRng::seed_from_u64(9);
        let output = noise.forward_one(Array3::from_elem((2, 2, 3), 3.0), &mut rng);
        assert!(output.iter().all(|&value| value == 5.0));
        Ok(())
    }

    #[test]
    fn reject_negative_std() {
        let init = GaussianNoiseInit {
            mean: r64(0.0),
            std: r64(-1.0),
        };
        assert!(init.build().is_err());
    }
}
