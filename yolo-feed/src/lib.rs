//! Streaming data feeder for grid-based object detection training.

mod common;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod image_processor;
pub mod loader;
pub mod processor;
pub mod queue;

pub use error::{LoaderError, LoaderResult};
pub use image_processor::ImageProcessor;
