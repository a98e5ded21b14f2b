//! Random crop on a zero padded image.

use super::{Batch, BatchTransform};
use crate::common::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RandomCropInit {
    pub padding: usize,
}

impl RandomCropInit {
    pub fn build(self) -> RandomCrop {
        RandomCrop {
            padding: self.padding,
        }
    }
}

impl Default for RandomCropInit {
    fn default() -> Self {
        Self { padding: 20 }
    }
}

/// Pads each image with zeros and crops a window of the original size.
///
/// Labels are passed through unchanged.
#[derive(Debug, Clone)]
pub struct RandomCrop {
    padding: usize,
}

impl RandomCrop {
    pub fn forward_one(&self, image: &Array3<f32>, rng: &mut dyn RngCore) -> Array3<f32> {
        let padding = self.padding;
        if padding == 0 {
            return image.clone();
        }

        let (height, width, channels) = image.dim();
        let mut padded = Array3::zeros((height + 2 * padding, width + 2 * padding, channels));
        padded
            .slice_mut(s![padding..(padding + height), padding..(padding + width), ..])
            .assign(image);

        let top = rng.gen_range(0..(2 * padding));
        let left = rng.gen_range(0..(2 * padding));
        padded
            .slice(s![top..(top + height), left..(left + width), ..])
            .to_owned()
    }
}

impl BatchTransform for RandomCrop {
    fn forward(&self, batch: Batch, rng: &mut dyn RngCore) -> Result<Batch> {
        let Batch { images, labels } = batch;
        let images = images
            .iter()
            .map(|image| self.forward_one(image, rng))
            .collect();
        Batch::new(images, labels)
    }
}
