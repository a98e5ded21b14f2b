//! Annotation records, samples and image decoding.

mod decoder;
mod manifest;
mod record;

pub use decoder::*;
pub use manifest::*;
pub use record::*;
