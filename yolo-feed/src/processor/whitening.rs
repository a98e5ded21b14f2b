use super::{Batch, BatchTransform};
use crate::common::*;

/// Standardizes each image to zero mean and unit variance.
///
/// The standard deviation is floored at `1 / sqrt(n_values)` so that constant
/// images map to zeros.
#[derive(Debug, Clone, Default)]
pub struct Whitening;

impl Whitening {
    pub fn forward_one(&self, mut image: Array3<f32>) -> Array3<f32> {
        if image.is_empty() {
            return image;
        }
        let mean = image.mean().unwrap_or(0.0);
        let std = image.std(0.0);
        let min_std = 1.0 / (image.len() as f32).sqrt();
        let std = std.max(min_std);

        image.mapv_inplace(|value| (value - mean) / std);
        image
    }
}

impl BatchTransform for Whitening {
    fn forward(&self, batch: Batch, _rng: &mut dyn RngCore) -> Result<Batch> {
        let Batch { images, labels } = batch;
        let images = images
            .into_iter()
            .map(|image| self.forward_one(image))
            .collect();
        Batch::new(images, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn whitened_image_statistics() {
        let image = Array3::from_shape_fn((8, 8, 3), |(row, col, channel)| {
            (row * 31 + col * 7 + channel * 50) as f32
        });
        let output = Whitening.forward_one(image);

        assert_abs_diff_eq!(output.mean().unwrap(), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(output.std(0.0), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn constant_image_stays_finite() {
        let output = Whitening.forward_one(Array3::from_elem((4, 4, 3), 77.0));
        assert!(output.iter().all(|&value| value == 0.0));
    }
}
