//! The facade that serves training, validation and test batches of a dataset directory.

use crate::{
    common::*,
    config::Config,
    dataset::{AnnotationIndex, Image, ImageDecoder, NormalizedBox, Sample},
    encoder::{EncodedBatch, GridEncoder},
    error::LoaderResult,
    loader::{InMemoryDataset, StreamingLoader, StreamingLoaderInit, WholeSetLoader},
    processor::{AugmentationPipeline, AugmentedBatch, Mode},
};

/// Serves batches of a dataset directory with `train.txt`, `valid.txt` and `test.txt` manifests.
///
/// The training set is streamed endlessly by background workers, while the
/// validation and test sets are loaded into memory once on construction.
#[derive(Debug)]
pub struct ImageProcessor {
    train_loader: StreamingLoader,
    valid_set: InMemoryDataset,
    test_set: InMemoryDataset,
    encoder: GridEncoder,
    train_pipeline: AugmentationPipeline,
    eval_pipeline: AugmentationPipeline,
}

impl ImageProcessor {
    pub fn new(config: &Config, decoder: Arc<dyn ImageDecoder>) -> Result<Self> {
        let Config {
            dataset,
            loader,
            augmentation,
            ..
        } = config;

        ensure!(
            dataset.dir.is_dir(),
            "dataset directory '{}' does not exist",
            dataset.dir.display()
        );

        let encoder = dataset.grid_encoder()?;
        let image_size = dataset.image_size.get();
        let max_objects = dataset.max_objects_per_image.get();
        let train_pipeline = augmentation.to_init(Mode::Train, image_size).build()?;
        let eval_pipeline = augmentation.to_init(Mode::Eval, image_size).build()?;

        let train_loader = {
            let path = dataset.train_manifest();
            let index = AnnotationIndex::open(&path)?;
            info!("training set has {} records", index.len());

            StreamingLoaderInit {
                n_workers: loader.n_producer_threads.get(),
                queue_capacity: loader.queue_capacity.get(),
                max_objects,
            }
            .build(index.records().clone(), decoder.clone())
            .with_context(|| format!("failed to start loader on '{}'", path.display()))?
        };

        let whole_set_loader =
            WholeSetLoader::new(decoder, loader.n_whole_set_threads.get(), max_objects)?;
        let valid_set = whole_set_loader.load_manifest(dataset.valid_manifest())?;
        info!("validation set has {} samples", valid_set.len());
        let test_set = whole_set_loader.load_manifest(dataset.test_manifest())?;
        info!("test set has {} samples", test_set.len());

        Ok(Self {
            train_loader,
            valid_set,
            test_set,
            encoder,
            train_pipeline,
            eval_pipeline,
        })
    }

    /// Pull the next training batch, blocking until it is complete.
    pub fn next_train_batch(
        &self,
        batch_size: usize,
    ) -> LoaderResult<(Vec<Image>, Vec<Vec<NormalizedBox>>)> {
        let samples = self.train_loader.pull_batch(batch_size)?;
        Ok(samples
            .into_iter()
            .map(|Sample { image, labels }| (image, labels))
            .unzip())
    }

    pub fn get_valid_batch(
        &self,
        offset: usize,
        batch_size: usize,
    ) -> LoaderResult<(&[Image], &[Vec<NormalizedBox>])> {
        self.valid_set.get_batch(offset, batch_size)
    }

    pub fn get_test_batch(
        &self,
        offset: usize,
        batch_size: usize,
    ) -> LoaderResult<(&[Image], &[Vec<NormalizedBox>])> {
        self.test_set.get_batch(offset, batch_size)
    }

    /// The number of decoded training samples waiting in the queue, and the queue capacity.
    pub fn train_queue_fill(&self) -> (usize, usize) {
        (self.train_loader.queued(), self.train_loader.queue_capacity())
    }

    pub fn n_valid(&self) -> usize {
        self.valid_set.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_set.len()
    }

    /// Encode the labels of a batch into stacked grid targets.
    pub fn process_batch_labels<L>(&self, labels: &[L]) -> Result<EncodedBatch>
    where
        L: AsRef<[NormalizedBox]>,
    {
        self.encoder.encode_batch(labels)
    }

    /// Augment a batch with the configured pipeline of the given mode.
    pub fn augment(
        &self,
        images: Vec<Image>,
        labels: Vec<Vec<NormalizedBox>>,
        mode: Mode,
    ) -> Result<AugmentedBatch> {
        let pipeline = match mode {
            Mode::Train => &self.train_pipeline,
            Mode::Eval => &self.eval_pipeline,
        };
        pipeline.augment(images, labels)
    }

    /// Stop the training workers. Dropping the processor does the same.
    pub fn stop(&mut self) {
        self.train_loader.stop();
    }
}
