//! The endless training set loader.

use super::load_sample;
use crate::{
    common::*,
    dataset::{AnnotationRecord, ImageDecoder, Sample},
    error::{LoaderError, LoaderResult},
    queue::DatasetQueue,
};

/// Back-off of a worker after a pass in which no record could be loaded.
const EMPTY_PASS_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamingLoaderInit {
    pub n_workers: usize,
    pub queue_capacity: usize,
    pub max_objects: usize,
}

impl StreamingLoaderInit {
    /// Start the workers on the given records.
    pub fn build(
        self,
        records: Arc<[AnnotationRecord]>,
        decoder: Arc<dyn ImageDecoder>,
    ) -> LoaderResult<StreamingLoader> {
        let Self {
            n_workers,
            queue_capacity,
            max_objects,
        } = self;

        if records.is_empty() {
            return Err(LoaderError::InvalidConfig(
                "cannot stream from an empty manifest".into(),
            ));
        }
        if n_workers == 0 {
            return Err(LoaderError::InvalidConfig(
                "the number of workers must be positive".into(),
            ));
        }

        let queue = DatasetQueue::new(queue_capacity)?;
        let stop = Arc::new(AtomicBool::new(false));

        let workers: Vec<_> = (0..n_workers)
            .map(|worker_index| {
                let worker = StreamingWorker {
                    worker_index,
                    records: records.clone(),
                    decoder: decoder.clone(),
                    queue: queue.clone(),
                    stop: stop.clone(),
                    max_objects,
                };

                thread::Builder::new()
                    .name(format!("streaming-loader-{}", worker_index))
                    .spawn(move || worker.run())
                    .map_err(LoaderError::Spawn)
            })
            .collect::<Result<_, _>>()
            .map_err(|err| {
                // let the workers that did start shut down
                stop.store(true, Ordering::SeqCst);
                err
            })?;

        info!(
            "streaming loader started with {} workers over {} records",
            n_workers,
            records.len()
        );

        Ok(StreamingLoader {
            queue,
            stop,
            workers,
        })
    }
}

/// Keeps a bounded queue filled with samples drawn endlessly from a record list.
///
/// Every worker shuffles its own copy of the record order on each pass, so the
/// batch composition is an interleaving of the workers' orders.
#[derive(Debug)]
pub struct StreamingLoader {
    queue: DatasetQueue<Sample>,
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl StreamingLoader {
    /// Pop exactly `batch_size` samples, blocking until they are available.
    pub fn pull_batch(&self, batch_size: usize) -> LoaderResult<Vec<Sample>> {
        if self.workers.is_empty() {
            return Err(LoaderError::Disconnected);
        }
        (0..batch_size).map(|_| self.queue.get()).collect()
    }

    /// The number of samples waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Signal the workers to finish and wait for them.
    pub fn stop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.stop.store(true, Ordering::SeqCst);

        for handle in self.workers.drain(..) {
            let name = handle.thread().name().map(ToOwned::to_owned);
            if handle.join().is_err() {
                warn!("worker {:?} panicked", name);
            }
        }
        info!("streaming loader stopped");
    }
}

impl Drop for StreamingLoader {
    fn drop(&mut self) {
        self.stop();
    }
}

struct StreamingWorker {
    worker_index: usize,
    records: Arc<[AnnotationRecord]>,
    decoder: Arc<dyn ImageDecoder>,
    queue: DatasetQueue<Sample>,
    stop: Arc<AtomicBool>,
    max_objects: usize,
}

impl StreamingWorker {
    fn run(self) {
        let Self {
            worker_index,
            records,
            decoder,
            queue,
            stop,
            max_objects,
        } = self;

        let mut rng = StdRng::from_entropy();
        let mut order: Vec<usize> = (0..records.len()).collect();

        'pass: while !stop.load(Ordering::SeqCst) {
            order.shuffle(&mut rng);
            let mut n_loaded = 0;

            for &index in &order {
                if stop.load(Ordering::SeqCst) {
                    break 'pass;
                }

                let record = &records[index];
                let sample = match load_sample(&*decoder, record, max_objects) {
                    Ok(sample) => sample,
                    Err(err) => {
                        warn!("worker {} skips a record: {:#}", worker_index, err);
                        continue;
                    }
                };

                if queue.put_until(sample, &stop).is_err() {
                    break 'pass;
                }
                n_loaded += 1;
            }

            if n_loaded == 0 {
                warn!(
                    "worker {} could not load any of {} records",
                    worker_index,
                    records.len()
                );
                thread::sleep(EMPTY_PASS_BACKOFF);
            } else {
                trace!("worker {} finished a pass of {} samples", worker_index, n_loaded);
            }
        }

        debug!("worker {} exits", worker_index);
    }
}
