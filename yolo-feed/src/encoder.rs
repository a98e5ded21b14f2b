//! Label normalization and grid target encoding.

use crate::{
    common::*,
    dataset::{NormalizedBox, RawBox},
};

/// Number of values per row of [EncodedTarget::box_grid].
pub const BOX_FIELDS: usize = 6;

/// The dense training target of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTarget {
    /// One-hot class vectors with shape `[grid, grid, n_classes]`, indexed by `[y, x, class]`.
    pub class_grid: Array3<i32>,
    /// 1.0 on cells covered by any object, with shape `[grid, grid]`.
    pub class_mask: Array2<f32>,
    /// Rows of `(cell_x, cell_y, center_x, center_y, width, height)`, shape `[max_objects, 6]`.
    pub box_grid: Array2<f32>,
    pub object_count: usize,
}

/// Stacked targets of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    pub class_grids: Array4<i32>,
    pub class_masks: Array3<f32>,
    pub box_grids: Array3<f32>,
    pub object_counts: Array1<i32>,
}

/// Convert pixel boxes to normalized boxes.
///
/// Edges are divided by the image size and clamped into `[0, 1]`. Boxes with
/// inverted edges are dropped, and at most `max_objects` boxes are kept.
pub fn normalize(
    raw_boxes: &[RawBox],
    image_width: usize,
    image_height: usize,
    max_objects: usize,
) -> Result<Vec<NormalizedBox>> {
    ensure!(
        image_width > 0 && image_height > 0,
        "image size must be positive, but get {}x{}",
        image_width,
        image_height
    );
    let w = image_width as f64;
    let h = image_height as f64;

    let labels = raw_boxes
        .iter()
        .filter_map(|raw| {
            let RawBox {
                xmin,
                ymin,
                xmax,
                ymax,
                class_id,
            } = *raw;

            let left = (xmin as f64 / w).max(0.0).min(1.0);
            let right = (xmax as f64 / w).min(1.0).max(0.0);
            let top = (ymin as f64 / h).max(0.0).min(1.0);
            let bottom = (ymax as f64 / h).min(1.0).max(0.0);

            match TLBR::try_from_tlbr([top, left, bottom, right]) {
                Ok(rect) => Some(Label {
                    rect,
                    class: class_id,
                }),
                Err(_) => {
                    debug!("drop inverted box {:?}", raw);
                    None
                }
            }
        })
        .take(max_objects)
        .collect();
    Ok(labels)
}

/// Encode normalized boxes into a grid target.
///
/// Every cell overlapped by a box gets the box class. When boxes share a cell,
/// the later box in `labels` overwrites the class of the earlier one.
pub fn encode(
    labels: &[NormalizedBox],
    grid_size: usize,
    n_classes: usize,
    max_objects: usize,
) -> Result<EncodedTarget> {
    ensure!(grid_size > 0, "grid_size must be positive");
    ensure!(n_classes > 0, "n_classes must be positive");
    ensure!(
        labels.len() <= max_objects,
        "expect at most {} objects, but get {}",
        max_objects,
        labels.len()
    );

    let mut class_grid = Array3::<i32>::zeros((grid_size, grid_size, n_classes));
    let mut class_mask = Array2::<f32>::zeros((grid_size, grid_size));
    let mut box_grid = Array2::<f32>::zeros((max_objects, BOX_FIELDS));

    let grid = grid_size as f64;
    let to_cell = |value: f64| ((grid * value).floor().max(0.0) as usize).min(grid_size - 1);

    for (index, label) in labels.iter().enumerate() {
        let class_index = label.class.get() - 1;
        ensure!(
            class_index < n_classes,
            "class id {} exceeds the number of classes {}",
            label.class,
            n_classes
        );

        let rect = &label.rect;
        let [cy, cx, h, w] = rect.cycxhw();

        // box regression target
        let values = [
            to_cell(cx) as f32,
            to_cell(cy) as f32,
            cx as f32,
            cy as f32,
            w as f32,
            h as f32,
        ];
        box_grid
            .row_mut(index)
            .iter_mut()
            .zip(values)
            .for_each(|(dst, src)| *dst = src);

        // classification target
        let (l_cell, r_cell) = (to_cell(rect.l()), to_cell(rect.r()));
        let (t_cell, b_cell) = (to_cell(rect.t()), to_cell(rect.b()));

        let mut cells = class_grid.slice_mut(s![t_cell..=b_cell, l_cell..=r_cell, ..]);
        cells.fill(0);
        cells.slice_mut(s![.., .., class_index]).fill(1);
        class_mask
            .slice_mut(s![t_cell..=b_cell, l_cell..=r_cell])
            .fill(1.0);
    }

    Ok(EncodedTarget {
        class_grid,
        class_mask,
        box_grid,
        object_count: labels.len(),
    })
}

/// The grid encoding parameters shared by a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridEncoder {
    grid_size: usize,
    n_classes: usize,
    max_objects: usize,
}

impl GridEncoder {
    pub fn new(grid_size: usize, n_classes: usize, max_objects: usize) -> Result<Self> {
        ensure!(grid_size > 0, "grid_size must be positive");
        ensure!(n_classes > 0, "n_classes must be positive");
        ensure!(max_objects > 0, "max_objects must be positive");

        Ok(Self {
            grid_size,
            n_classes,
            max_objects,
        })
    }

    pub fn encode(&self, labels: &[NormalizedBox]) -> Result<EncodedTarget> {
        encode(labels, self.grid_size, self.n_classes, self.max_objects)
    }

    /// Encode every sample of a batch and stack the targets along a new leading axis.
    pub fn encode_batch<L>(&self, labels_batch: &[L]) -> Result<EncodedBatch>
    where
        L: AsRef<[NormalizedBox]>,
    {
        let Self {
            grid_size,
            n_classes,
            max_objects,
        } = *self;
        let batch_size = labels_batch.len();

        let mut class_grids = Array4::<i32>::zeros((batch_size, grid_size, grid_size, n_classes));
        let mut class_masks = Array3::<f32>::zeros((batch_size, grid_size, grid_size));
        let mut box_grids = Array3::<f32>::zeros((batch_size, max_objects, BOX_FIELDS));
        let mut object_counts = Array1::<i32>::zeros(batch_size);

        for (index, labels) in labels_batch.iter().enumerate() {
            let EncodedTarget {
                class_grid,
                class_mask,
                box_grid,
                object_count,
            } = self
                .encode(labels.as_ref())
                .with_context(|| format!("failed to encode labels of sample {}", index))?;

            class_grids
                .index_axis_mut(Axis(0), index)
                .assign(&class_grid);
            class_masks
                .index_axis_mut(Axis(0), index)
                .assign(&class_mask);
            box_grids.index_axis_mut(Axis(0), index).assign(&box_grid);
            object_counts[index] = object_count as i32;
        }

        Ok(EncodedBatch {
            class_grids,
            class_masks,
            box_grids,
            object_counts,
        })
    }
}
