//! The ordered augmentation pipeline.

use super::{
    AugmentedBatch, Batch, BatchTransform, GaussianNoise, GaussianNoiseInit, RandomCrop,
    RandomCropInit, RandomFlip, RandomFlipInit, RandomResize, RandomResizeInit, Whitening,
};
use crate::{
    common::*,
    dataset::{Image, NormalizedBox},
};

/// Initializer of [AugmentationPipeline]. Disabled steps are `None` or `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AugmentationInit {
    pub resize: Option<RandomResizeInit>,
    pub crop: Option<RandomCropInit>,
    pub flip: Option<RandomFlipInit>,
    pub whiten: bool,
    pub noise: Option<GaussianNoiseInit>,
}

impl AugmentationInit {
    pub fn build(self) -> Result<AugmentationPipeline> {
        let Self {
            resize,
            crop,
            flip,
            whiten,
            noise,
        } = self;

        let resize = resize
            .map(|init| init.build().context("invalid resize parameters"))
            .transpose()?;
        let crop = crop.map(|init| init.build());
        let flip = flip
            .map(|init| init.build().context("invalid flip parameters"))
            .transpose()?;
        let whiten = whiten.then(|| Whitening);
        let noise = noise
            .map(|init| init.build().context("invalid noise parameters"))
            .transpose()?;

        Ok(AugmentationPipeline {
            resize,
            crop,
            flip,
            whiten,
            noise,
        })
    }
}

/// Applies resize, crop, flip, whitening and noise in this order.
#[derive(Debug, Clone)]
pub struct AugmentationPipeline {
    resize: Option<RandomResize>,
    crop: Option<RandomCrop>,
    flip: Option<RandomFlip>,
    whiten: Option<Whitening>,
    noise: Option<GaussianNoise>,
}

impl AugmentationPipeline {
    /// Augment a batch with a freshly seeded random generator.
    pub fn augment(
        &self,
        images: Vec<Image>,
        labels: Vec<Vec<NormalizedBox>>,
    ) -> Result<AugmentedBatch> {
        let mut rng = StdRng::from_entropy();
        self.augment_with_rng(images, labels, &mut rng)
    }

    pub fn augment_with_rng(
        &self,
        images: Vec<Image>,
        labels: Vec<Vec<NormalizedBox>>,
        rng: &mut dyn RngCore,
    ) -> Result<AugmentedBatch> {
        let batch = Batch::from_images(images, labels)?;
        let batch = self.forward(batch, rng)?;
        Ok(batch.into_augmented())
    }

    fn steps(&self) -> impl Iterator<Item = &dyn BatchTransform> {
        let resize = self.resize.as_ref().map(|step| step as &dyn BatchTransform);
        let crop = self.crop.as_ref().map(|step| step as &dyn BatchTransform);
        let flip = self.flip.as_ref().map(|step| step as &dyn BatchTransform);
        let whiten = self.whiten.as_ref().map(|step| step as &dyn BatchTransform);
        let noise = self.noise.as_ref().map(|step| step as &dyn BatchTransform);
        [resize, crop, flip, whiten, noise].into_iter().flatten()
    }
}

impl BatchTransform for AugmentationPipeline {
    fn forward(&self, batch: Batch, rng: &mut dyn RngCore) -> Result<Batch> {
        let batch_size = batch.len();
        let output = self
            .steps()
            .try_fold(batch, |batch, step| step.forward(batch, rng))?;
        trace!("augmented batch of {} images", batch_size);
        Ok(output)
    }
}
