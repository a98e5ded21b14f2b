//! Multi-threaded loaders that decode images and normalize labels.

pub mod streaming;
pub mod whole_set;

pub use streaming::*;
pub use whole_set::*;

use crate::{
    common::*,
    dataset::{AnnotationRecord, ImageDecoder, Sample},
    encoder,
};

/// Decode the image of a record and normalize its boxes.
pub(crate) fn load_sample(
    decoder: &dyn ImageDecoder,
    record: &AnnotationRecord,
    max_objects: usize,
) -> Result<Sample> {
    let image = decoder.decode(&record.image_path)?;
    let (height, width, _) = image.dim();
    let labels = encoder::normalize(&record.boxes, width, height, max_objects)
        .with_context(|| format!("invalid image '{}'", record.image_path.display()))?;
    Ok(Sample { image, labels })
}
