use super::{Rect, TLBR};
use crate::common::*;

/// Axis-aligned scale and offset transform, `y' = y * sy + ty`, `x' = x * sx + tx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    /// The transform that maps `src` onto `tgt`.
    pub fn from_rects<R>(src: &R, tgt: &R) -> Self
    where
        R: Rect<Type = T>,
    {
        let sy = tgt.h() / src.h();
        let sx = tgt.w() / src.w();
        let ty = tgt.t() - src.t() * sy;
        let tx = tgt.l() - src.l() * sx;

        Self { sy, sx, ty, tx }
    }
}

impl<T> Mul<&TLBR<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = TLBR<T>;

    fn mul(self, rhs: &TLBR<T>) -> Self::Output {
        rhs.transform(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rect_transform_from_unit_rect() -> Result<()> {
        // a 150x75 image pasted at (x=10, y=20) on a 100x100 canvas
        let src = TLBR::from_tlbr([0.0, 0.0, 1.0, 1.0]);
        let tgt = TLBR::try_from_tlhw([0.2, 0.1, 0.75, 1.5])?;
        let transform = Transform::from_rects(&src, &tgt);

        assert_abs_diff_eq!(transform.sy, 0.75);
        assert_abs_diff_eq!(transform.sx, 1.5);
        assert_abs_diff_eq!(transform.ty, 0.2);
        assert_abs_diff_eq!(transform.tx, 0.1);

        let rect = &transform * &TLBR::from_tlbr([0.0, 0.2, 0.4, 0.4]);
        assert_abs_diff_eq!(rect.t(), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.l(), 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.b(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(rect.r(), 0.7, epsilon = 1e-12);
        Ok(())
    }
}
