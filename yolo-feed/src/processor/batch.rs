use crate::{
    common::*,
    dataset::{Image, NormalizedBox},
};
use image::{ImageBuffer, Rgb};

/// Image buffer with `f32` subpixels in `[0, 1]`.
pub(crate) type FloatImage = ImageBuffer<Rgb<f32>, Vec<f32>>;

/// Whether the batch is augmented for training or evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Train,
    Eval,
}

/// Images in `[height, width, 3]` layout with `f32` values, paired with their labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub images: Vec<Array3<f32>>,
    pub labels: Vec<Vec<NormalizedBox>>,
}

impl Batch {
    pub fn new(images: Vec<Array3<f32>>, labels: Vec<Vec<NormalizedBox>>) -> Result<Self> {
        ensure!(
            images.len() == labels.len(),
            "the number of images ({}) and label lists ({}) must match",
            images.len(),
            labels.len()
        );
        Ok(Self { images, labels })
    }

    /// Build a batch from decoded byte images.
    pub fn from_images(images: Vec<Image>, labels: Vec<Vec<NormalizedBox>>) -> Result<Self> {
        let images = images
            .into_iter()
            .map(|image| image.mapv(|value| value as f32))
            .collect();
        Self::new(images, labels)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Cast the pixel values to bytes. Out-of-range values saturate.
    pub fn into_augmented(self) -> AugmentedBatch {
        let Self { images, labels } = self;
        let images = images
            .into_iter()
            .map(|image| image.mapv(|value| value as u8))
            .collect();
        AugmentedBatch { images, labels }
    }
}

/// The output of the augmentation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedBatch {
    pub images: Vec<Image>,
    pub labels: Vec<Vec<NormalizedBox>>,
}

/// A step that consumes and produces a whole batch.
pub trait BatchTransform
where
    Self: Debug + Send + Sync,
{
    fn forward(&self, batch: Batch, rng: &mut dyn RngCore) -> Result<Batch>;
}

pub(crate) fn array_to_float_image(array: &Array3<f32>) -> FloatImage {
    let (height, width, _) = array.dim();
    ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let (row, col) = (y as usize, x as usize);
        Rgb([
            array[[row, col, 0]] / 255.0,
            array[[row, col, 1]] / 255.0,
            array[[row, col, 2]] / 255.0,
        ])
    })
}

pub(crate) fn float_image_to_array(image: &FloatImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn(
        (height as usize, width as usize, 3),
        |(row, col, channel)| image.get_pixel(col as u32, row as u32).0[channel] * 255.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn batch_size_mismatch() {
        let images = vec![Array3::<f32>::zeros((2, 2, 3))];
        assert!(Batch::new(images, vec![]).is_err());
    }

    #[test]
    fn cast_saturates() -> Result<()> {
        let mut image = Array3::<f32>::zeros((1, 3, 3));
        image[[0, 0, 0]] = -12.5;
        image[[0, 1, 0]] = 300.0;
        image[[0, 2, 0]] = 127.9;

        let output = Batch::new(vec![image], vec![vec![]])?.into_augmented();
        let output = &output.images[0];
        assert_eq!(output[[0, 0, 0]], 0);
        assert_eq!(output[[0, 1, 0]], 255);
        assert_eq!(output[[0, 2, 0]], 127);
        Ok(())
    }

    #[test]
    fn float_image_conversion() {
        let array = Array3::from_shape_fn((2, 3, 3), |(row, col, channel)| {
            (row * 100 + col * 10 + channel) as f32
        });
        let image = array_to_float_image(&array);
        assert_eq!(image.dimensions(), (3, 2));

        let restored = float_image_to_array(&image);
        restored
            .iter()
            .zip(array.iter())
            .for_each(|(&lhs, &rhs)| assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-3));
    }
}
