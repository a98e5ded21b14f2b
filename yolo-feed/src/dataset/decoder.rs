use super::Image;
use crate::{
    common::*,
    error::{LoaderError, LoaderResult},
};
use image::RgbImage;

/// Reads an image file into an `[height, width, 3]` byte array.
pub trait ImageDecoder
where
    Self: Debug + Send + Sync,
{
    fn decode(&self, path: &Path) -> LoaderResult<Image>;
}

/// The decoder that reads image files from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> LoaderResult<Image> {
        let image = image::open(path)
            .map_err(|source| LoaderError::Decode {
                path: path.to_owned(),
                source,
            })?
            .to_rgb8();
        Ok(rgb_image_to_array(&image))
    }
}

pub(crate) fn rgb_image_to_array(image: &RgbImage) -> Image {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn(
        (height as usize, width as usize, 3),
        |(row, col, channel)| image.get_pixel(col as u32, row as u32).0[channel],
    )
}
