//! The one-shot loader for validation and test sets.

use super::load_sample;
use crate::{
    common::*,
    dataset::{AnnotationIndex, AnnotationRecord, Image, ImageDecoder, NormalizedBox, Sample},
    error::{LoaderError, LoaderResult},
    queue::DatasetQueue,
};

/// Loads every record of a manifest exactly once with a pool of worker threads.
#[derive(Debug, Clone)]
pub struct WholeSetLoader {
    decoder: Arc<dyn ImageDecoder>,
    n_workers: usize,
    max_objects: usize,
}

impl WholeSetLoader {
    pub fn new(
        decoder: Arc<dyn ImageDecoder>,
        n_workers: usize,
        max_objects: usize,
    ) -> LoaderResult<Self> {
        if n_workers == 0 {
            return Err(LoaderError::InvalidConfig(
                "the number of workers must be positive".into(),
            ));
        }

        Ok(Self {
            decoder,
            n_workers,
            max_objects,
        })
    }

    /// Parse a manifest and load all of its records.
    pub fn load_manifest(&self, path: impl AsRef<Path>) -> LoaderResult<InMemoryDataset> {
        let index = AnnotationIndex::open(path)?;
        self.load(index.records())
    }

    /// Load all records and wait for the workers to finish.
    ///
    /// Records whose image cannot be decoded are skipped. The order of the
    /// resulting samples is not related to the order of `records`.
    pub fn load(&self, records: &[AnnotationRecord]) -> LoaderResult<InMemoryDataset> {
        let n_records = records.len();
        if n_records == 0 {
            return Ok(InMemoryDataset::default());
        }

        let input = DatasetQueue::new(n_records)?;
        let output = DatasetQueue::new(n_records)?;
        records
            .iter()
            .try_for_each(|record| input.put(record.clone()))?;

        let since = Instant::now();
        let workers: Vec<_> = (0..self.n_workers)
            .map(|worker_index| {
                let input = input.clone();
                let output = output.clone();
                let decoder = self.decoder.clone();
                let max_objects = self.max_objects;
                let name = format!("whole-set-loader-{}", worker_index);

                let handle = thread::Builder::new()
                    .name(name.clone())
                    .spawn(move || -> LoaderResult<usize> {
                        let mut n_skipped = 0;

                        while let Some(record) = input.try_get() {
                            match load_sample(&*decoder, &record, max_objects) {
                                Ok(sample) => output.put(sample)?,
                                Err(err) => {
                                    warn!("worker {} skips a record: {:#}", worker_index, err);
                                    n_skipped += 1;
                                }
                            }
                        }

                        Ok(n_skipped)
                    })
                    .map_err(LoaderError::Spawn)?;
                Ok((name, handle))
            })
            .collect::<LoaderResult<_>>()?;

        let mut n_skipped = 0;
        for (name, handle) in workers {
            n_skipped += handle
                .join()
                .map_err(|_| LoaderError::WorkerPanicked(name))??;
        }

        let (images, labels): (Vec<_>, Vec<_>) = output
            .drain()
            .into_iter()
            .map(|Sample { image, labels }| (image, labels))
            .unzip();

        info!(
            "loaded {} of {} records in {:.2}s, {} skipped",
            images.len(),
            n_records,
            since.elapsed().as_secs_f64(),
            n_skipped
        );

        Ok(InMemoryDataset { images, labels })
    }
}

/// A fully loaded set of images and labels at aligned positions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InMemoryDataset {
    images: Vec<Image>,
    labels: Vec<Vec<NormalizedBox>>,
}

impl InMemoryDataset {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn labels(&self) -> &[Vec<NormalizedBox>] {
        &self.labels
    }

    /// The samples in `[offset, min(offset + batch_size, len))`.
    pub fn get_batch(
        &self,
        offset: usize,
        batch_size: usize,
    ) -> LoaderResult<(&[Image], &[Vec<NormalizedBox>])> {
        let len = self.len();
        if offset > len {
            return Err(LoaderError::OutOfRange { offset, len });
        }
        let end = offset.saturating_add(batch_size).min(len);
        Ok((&self.images[offset..end], &self.labels[offset..end]))
    }
}
