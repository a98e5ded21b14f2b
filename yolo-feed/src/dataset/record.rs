use crate::common::*;

/// The class index of an object. Class ids start at 1.
pub type ClassId = NonZeroUsize;

/// A box in normalized image coordinates, all edges in `[0, 1]`.
pub type NormalizedBox = Label<TLBR<f64>, ClassId>;

/// A decoded image with shape `[height, width, 3]`.
pub type Image = Array3<u8>;

/// A box in pixel units as it is written in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
    pub class_id: ClassId,
}

/// The record with image path and boxes, but without image pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationRecord {
    pub image_path: PathBuf,
    pub boxes: Vec<RawBox>,
}

/// The record with image pixels and normalized boxes.
///
/// `labels` never holds more than the configured `max_objects` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub image: Image,
    pub labels: Vec<NormalizedBox>,
}
