//! The bounded FIFO shared by loader workers and batch consumers.

use crate::{
    common::*,
    error::{LoaderError, LoaderResult},
};
use flume::{Receiver, Sender, SendTimeoutError, TryRecvError};

/// How often a blocked [DatasetQueue::put_until] checks its stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A fixed-capacity multi-producer multi-consumer queue.
///
/// `put` blocks while the queue is full and `get` blocks while it is empty.
/// Clones are handles on the same buffer.
#[derive(Debug)]
pub struct DatasetQueue<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
    capacity: usize,
}

impl<T> DatasetQueue<T> {
    pub fn new(capacity: usize) -> LoaderResult<Self> {
        if capacity == 0 {
            return Err(LoaderError::InvalidConfig(
                "queue capacity must be positive".into(),
            ));
        }
        let (sender, receiver) = flume::bounded(capacity);

        Ok(Self {
            sender,
            receiver,
            capacity,
        })
    }

    /// Insert an item, blocking while the queue is full.
    pub fn put(&self, item: T) -> LoaderResult<()> {
        self.sender
            .send(item)
            .map_err(|_| LoaderError::Disconnected)
    }

    /// Insert an item, blocking while the queue is full, until `stop` is raised.
    ///
    /// Returns the item back if the stop flag was raised before it could be inserted.
    pub fn put_until(&self, item: T, stop: &AtomicBool) -> Result<(), T> {
        let mut item = item;

        loop {
            if stop.load(Ordering::SeqCst) {
                return Err(item);
            }

            match self.sender.send_timeout(item, STOP_POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => item = returned,
                Err(SendTimeoutError::Disconnected(returned)) => return Err(returned),
            }
        }
    }

    /// Remove the oldest item, blocking while the queue is empty.
    pub fn get(&self) -> LoaderResult<T> {
        self.receiver.recv().map_err(|_| LoaderError::Disconnected)
    }

    /// Remove the oldest item if there is any.
    pub fn try_get(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all items currently in the queue without blocking.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.drain().collect()
    }
}

impl<T> Clone for DatasetQueue<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            capacity: self.capacity,
        }
    }
}
