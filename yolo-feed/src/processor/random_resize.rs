//! Resizing with random aspect ratio jitter and placement.

use super::{array_to_float_image, float_image_to_array, Batch, BatchTransform, Mode};
use crate::{common::*, dataset::NormalizedBox};
use image::imageops::{self, FilterType};

/// Gray level of the canvas margins.
const CANVAS_FILL: f32 = 128.0;
/// Upper bound of label edges after placement.
const MAX_EDGE: f64 = 1.0 - 1e-6;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RandomResizeInit {
    pub image_size: usize,
    pub jitter: R64,
    pub scale_range: (R64, R64),
    pub mode: Mode,
}

impl RandomResizeInit {
    pub fn build(self) -> Result<RandomResize> {
        let Self {
            image_size,
            jitter,
            scale_range: (min_scale, max_scale),
            mode,
        } = self;

        ensure!(image_size > 0, "image_size must be positive");
        ensure!(
            (0.0..1.0).contains(&jitter.raw()),
            "jitter must be in range [0, 1), but get {}",
            jitter
        );
        ensure!(min_scale > 0.0, "scale min must be positive");
        ensure!(
            min_scale <= max_scale,
            "scale min must not exceed scale max"
        );

        Ok(RandomResize {
            image_size,
            jitter: jitter.raw(),
            scale_range: (min_scale.raw(), max_scale.raw()),
            mode,
        })
    }
}

impl Default for RandomResizeInit {
    fn default() -> Self {
        Self {
            image_size: 288,
            jitter: r64(0.2),
            scale_range: (r64(0.5), r64(1.5)),
            mode: Mode::Train,
        }
    }
}

/// Resizes every image to a square of `image_size` pixels.
///
/// In training mode the image is rescaled with a jittered aspect ratio and
/// placed at a random position on a gray canvas. Labels follow the image and
/// boxes that leave the canvas are dropped. In evaluation mode the image is
/// stretched to the square and labels are kept as is.
#[derive(Debug, Clone)]
pub struct RandomResize {
    image_size: usize,
    jitter: f64,
    scale_range: (f64, f64),
    mode: Mode,
}

impl RandomResize {
    pub fn forward_one(
        &self,
        image: &Array3<f32>,
        labels: &[NormalizedBox],
        rng: &mut dyn RngCore,
    ) -> Result<(Array3<f32>, Vec<NormalizedBox>)> {
        let (height, width, channels) = image.dim();
        ensure!(
            channels == 3,
            "channel size must be 3, but get {}",
            channels
        );
        ensure!(height > 0 && width > 0, "cannot resize an empty image");

        match self.mode {
            Mode::Eval => {
                let size = self.image_size;
                let resized = resize(image, size, size);
                Ok((resized, labels.to_vec()))
            }
            Mode::Train => self.forward_train(image, labels, rng),
        }
    }

    fn forward_train(
        &self,
        image: &Array3<f32>,
        labels: &[NormalizedBox],
        rng: &mut dyn RngCore,
    ) -> Result<(Array3<f32>, Vec<NormalizedBox>)> {
        let (height, width, _) = image.dim();
        let size = self.image_size;
        let size_f = size as f64;

        // sample the aspect ratio and scale
        let aspect = {
            let max_dw = (width as f64 * self.jitter).floor() as i64;
            let max_dh = (height as f64 * self.jitter).floor() as i64;
            let jittered_w = width as i64 + rng.gen_range(-max_dw..=max_dw);
            let jittered_h = height as i64 + rng.gen_range(-max_dh..=max_dh);
            jittered_w as f64 / jittered_h as f64
        };
        let scale = {
            let (min, max) = self.scale_range;
            rng.gen_range(min..=max)
        };

        let (new_h, new_w) = if aspect < 1.0 {
            let new_h = scale * size_f;
            (new_h, new_h * aspect)
        } else {
            let new_w = scale * size_f;
            (new_w / aspect, new_w)
        };
        let new_h = (new_h as usize).max(1);
        let new_w = (new_w as usize).max(1);
        trace!(
            "resize {}x{} image to {}x{} on {}x{} canvas",
            width,
            height,
            new_w,
            new_h,
            size,
            size
        );

        let resized = resize(image, new_h, new_w);

        // place the resized image on the canvas
        let (dst_y, src_y, len_y) = placement(size, new_h, rng);
        let (dst_x, src_x, len_x) = placement(size, new_w, rng);

        let mut canvas = Array3::from_elem((size, size, 3), CANVAS_FILL);
        canvas
            .slice_mut(s![dst_y..(dst_y + len_y), dst_x..(dst_x + len_x), ..])
            .assign(&resized.slice(s![src_y..(src_y + len_y), src_x..(src_x + len_x), ..]));

        // move labels along with the image
        let transform = {
            let top = (dst_y as f64 - src_y as f64) / size_f;
            let left = (dst_x as f64 - src_x as f64) / size_f;
            let src = TLBR::try_from_tlbr([0.0, 0.0, 1.0, 1.0])?;
            let tgt = TLBR::try_from_tlhw([top, left, new_h as f64 / size_f, new_w as f64 / size_f])?;
            Transform::from_rects(&src, &tgt)
        };
        let new_labels: Vec<_> = labels
            .iter()
            .map(|label| (&transform * label).clamp(0.0, MAX_EDGE))
            .filter(|label| {
                let keep = !label.rect.is_empty();
                if !keep {
                    trace!("drop box {:?} outside of canvas", label.rect);
                }
                keep
            })
            .collect();

        Ok((canvas, new_labels))
    }
}

impl BatchTransform for RandomResize {
    fn forward(&self, batch: Batch, rng: &mut dyn RngCore) -> Result<Batch> {
        let Batch { images, labels } = batch;
        let (images, labels): (Vec<_>, Vec<_>) = izip!(&images, &labels)
            .map(|(image, labels)| self.forward_one(image, labels, rng))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();
        Batch::new(images, labels)
    }
}

/// Returns `(canvas_offset, source_offset, length)` along one axis.
fn placement(canvas_len: usize, image_len: usize, rng: &mut dyn RngCore) -> (usize, usize, usize) {
    if canvas_len > image_len {
        (rng.gen_range(0..=(canvas_len - image_len)), 0, image_len)
    } else {
        (0, rng.gen_range(0..=(image_len - canvas_len)), canvas_len)
    }
}

/// Bilinear resize. Pixel values are clamped into `[0, 255]`.
fn resize(image: &Array3<f32>, new_h: usize, new_w: usize) -> Array3<f32> {
    let (height, width, _) = image.dim();
    if (height, width) == (new_h, new_w) {
        return image.mapv(|value| value.max(0.0).min(255.0));
    }
    let input = array_to_float_image(image);
    let output = imageops::resize(&input, new_w as u32, new_h as u32, FilterType::Triangle);
    float_image_to_array(&output)
}
