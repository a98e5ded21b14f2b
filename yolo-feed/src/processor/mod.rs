//! Batch augmentation building blocks.

mod batch;
pub use batch::*;

pub mod gaussian_noise;
pub mod pipeline;
pub mod random_crop;
pub mod random_flip;
pub mod random_resize;
pub mod whitening;

pub use gaussian_noise::*;
pub use pipeline::*;
pub use random_crop::*;
pub use random_flip::*;
pub use random_resize::*;
pub use whitening::*;
