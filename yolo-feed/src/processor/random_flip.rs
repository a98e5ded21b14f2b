use super::{Batch, BatchTransform};
use crate::{common::*, dataset::NormalizedBox};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RandomFlipInit {
    pub probability: R64,
}

impl RandomFlipInit {
    pub fn build(self) -> Result<RandomFlip> {
        let probability = self.probability.raw();
        ensure!(
            (0.0..=1.0).contains(&probability),
            "flip probability must be in range [0, 1], but get {}",
            probability
        );
        Ok(RandomFlip { probability })
    }
}

impl Default for RandomFlipInit {
    fn default() -> Self {
        Self {
            probability: r64(0.5),
        }
    }
}

/// Mirrors images horizontally at random, together with their own labels.
#[derive(Debug, Clone)]
pub struct RandomFlip {
    probability: f64,
}

impl RandomFlip {
    pub fn forward_one(
        &self,
        image: Array3<f32>,
        labels: Vec<NormalizedBox>,
        rng: &mut dyn RngCore,
    ) -> (Array3<f32>, Vec<NormalizedBox>) {
        if rng.gen_bool(self.probability) {
            flip(&image, &labels)
        } else {
            (image, labels)
        }
    }
}

impl BatchTransform for RandomFlip {
    fn forward(&self, batch: Batch, rng: &mut dyn RngCore) -> Result<Batch> {
        let Batch { images, labels } = batch;
        let (images, labels) = images
            .into_iter()
            .zip(labels)
            .map(|(image, labels)| self.forward_one(image, labels, rng))
            .unzip();
        Batch::new(images, labels)
    }
}

/// Mirror an image along its width and mirror the labels accordingly.
pub fn flip(image: &Array3<f32>, labels: &[NormalizedBox]) -> (Array3<f32>, Vec<NormalizedBox>) {
    let image = image.slice(s![.., ..;-1, ..]).to_owned();
    let labels = labels
        .iter()
        .map(|label| label.flip_horizontal(1.0))
        .collect();
    (image, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn label(t: f64, l: f64, b: f64, r: f64) -> NormalizedBox {
        Label {
            rect: TLBR::from_tlbr([t, l, b, r]),
            class: NonZeroUsize::new(2).unwrap(),
        }
    }

    #[test]
    fn flip_mirrors_columns_and_labels() {
        let image = Array3::from_shape_fn((2, 3, 3), |(_, col, _)| col as f32);
        let labels = vec![label(0.1, 0.1, 0.4, 0.3)];

        let (output, output_labels) = flip(&image, &labels);
        assert_eq!(output[[0, 0, 0]], 2.0);
        assert_eq!(output[[1, 2, 1]], 0.0);

        let rect = &output_labels[0].rect;
        assert_abs_diff_eq!(rect.l(), 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.r(), 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.t(), 0.1);
        assert_abs_diff_eq!(rect.b(), 0.4);
        assert_eq!(output_labels[0].class.get(), 2);
    }

    #[test]
    fn unflipped_images_keep_labels() -> Result<()> {
        let never = RandomFlipInit {
            probability: r64(0.0),
        }
        .build()?;
        let always = RandomFlipInit {
            probability: r64(1.0),
        }
        .build()?;
        let image = Array3::from_shape_fn((2, 3, 3), |(_, col, _)| col as f32);
        let labels = vec![label(0.1, 0.1, 0.4, 0.3)];
        let mut rng = StdRng::seed_from_u64(5);

        let (output, output_labels) = never.forward_one(image.clone(), labels.clone(), &mut rng);
        assert_eq!(output, image);
        assert_eq!(output_labels, labels);

        let (output, output_labels) = always.forward_one(image.clone(), labels.clone(), &mut rng);
        assert_eq!(output, flip(&image, &labels).0);
        assert_ne!(output_labels, labels);
        Ok(())
    }

    #[test]
    fn forward_flips_labels_with_their_own_image() -> Result<()> {
        let flip = RandomFlipInit::default().build()?;

        // each image carries its index in the first column
        let n_images = 16;
        let images: Vec<_> = (0..n_images)
            .map(|index| {
                Array3::from_shape_fn((2, 4, 3), |(_, col, _)| {
                    if col == 0 {
                        index as f32
                    } else {
                        -1.0
                    }
                })
            })
            .collect();
        let labels: Vec<_> = (0..n_images)
            .map(|index| vec![label(0.1, 0.05 * index as f64, 0.5, 0.2 + 0.05 * index as f64)])
            .collect();
        let batch = Batch::new(images, labels.clone())?;

        let mut rng = StdRng::seed_from_u64(9);
        let output = flip.forward(batch, &mut rng)?;

        let mut n_flipped = 0;
        for (index, (image, output_labels)) in izip!(&output.images, &output.labels).enumerate() {
            let expected = &labels[index];
            if image[[0, 3, 0]] == index as f32 {
                n_flipped += 1;
                assert_eq!(image[[0, 0, 0]], -1.0);
                let rect = &output_labels[0].rect;
                assert_abs_diff_eq!(rect.l(), 1.0 - expected[0].rect.r(), epsilon = 1e-12);
                assert_abs_diff_eq!(rect.r(), 1.0 - expected[0].rect.l(), epsilon = 1e-12);
            } else {
                assert_eq!(image[[0, 0, 0]], index as f32);
                assert_eq!(output_labels, expected);
            }
        }

        // both branches are taken at probability 0.5
        assert!(n_flipped > 0 && n_flipped < n_images);
        Ok(())
    }

    #[test]
    fn reject_invalid_probability() {
        let init = RandomFlipInit {
            probability: r64(1.5),
        };
        assert!(init.build().is_err());
    }
}
