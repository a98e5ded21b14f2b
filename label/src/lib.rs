use bbox::{Rect, Transform, TLBR};
use num_traits::Num;
use std::ops::Mul;

/// A rectangle tagged with a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

impl<T, C> Label<TLBR<T>, C>
where
    T: Copy + Num + PartialOrd,
    C: Copy,
{
    /// Mirror the label horizontally within a frame of the given width.
    pub fn flip_horizontal(&self, width: T) -> Self {
        Label {
            rect: self.rect.flip_horizontal(width),
            class: self.class,
        }
    }

    /// Clamp the rectangle into `[min, max]`, keeping the class.
    pub fn clamp(&self, min: T, max: T) -> Self {
        Label {
            rect: self.rect.clamp(min, max),
            class: self.class,
        }
    }
}

impl<'a, T, C> Mul<&'a Label<TLBR<T>, C>> for &'a Transform<T>
where
    T: Copy + Num + PartialOrd,
    C: Copy,
{
    type Output = Label<TLBR<T>, C>;

    fn mul(self, rhs: &'a Label<TLBR<T>, C>) -> Self::Output {
        Label {
            rect: self * &rhs.rect,
            class: rhs.class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bbox::RectNum;

    #[test]
    fn label_transform_keeps_class() {
        let label = Label {
            rect: TLBR::from_tlbr([0.1, 0.1, 0.5, 0.5]),
            class: 3usize,
        };
        let transform = Transform {
            sy: 0.5,
            sx: 0.5,
            ty: 0.25,
            tx: 0.0,
        };
        let output = &transform * &label;

        assert_eq!(output.class, 3);
        assert_abs_diff_eq!(output.rect.t(), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(output.rect.l(), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(output.rect.b(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(output.rect.r(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn label_flip_keeps_vertical_edges() {
        let label = Label {
            rect: TLBR::from_tlbr([0.2, 0.1, 0.6, 0.3]),
            class: 1usize,
        };
        let flipped = label.flip_horizontal(1.0);

        assert_eq!(flipped.class, 1);
        assert_abs_diff_eq!(flipped.rect.t(), 0.2);
        assert_abs_diff_eq!(flipped.rect.b(), 0.6);
        assert_abs_diff_eq!(flipped.rect.l(), 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(flipped.rect.r(), 0.9, epsilon = 1e-12);
    }
}
