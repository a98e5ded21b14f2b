use super::Rect;
use crate::{common::*, Transform};

/// Bounding box in TLBR format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> TLBR<T>
where
    T: Copy + Num,
{
    /// Apply a scale and offset transform on both axes.
    ///
    /// The result is not checked; a negative scale swaps the edges.
    pub fn transform(&self, transform: &Transform<T>) -> Self {
        TLBR {
            t: self.t * transform.sy + transform.ty,
            l: self.l * transform.sx + transform.tx,
            b: self.b * transform.sy + transform.ty,
            r: self.r * transform.sx + transform.tx,
        }
    }

    /// Mirror the box horizontally within a frame of the given width.
    pub fn flip_horizontal(&self, width: T) -> Self {
        TLBR {
            t: self.t,
            l: width - self.r,
            b: self.b,
            r: width - self.l,
        }
    }
}

impl<T> TLBR<T>
where
    T: Copy + PartialOrd,
{
    /// Clamp the four edges into `[min, max]` independently.
    ///
    /// The result may be empty, but it is never inverted when the input is not.
    pub fn clamp(&self, min: T, max: T) -> Self {
        let clamp = |value: T| {
            if value < min {
                min
            } else if value > max {
                max
            } else {
                value
            }
        };

        TLBR {
            t: clamp(self.t),
            l: clamp(self.l),
            b: clamp(self.b),
            r: clamp(self.r),
        }
    }
}

impl<T> Rect for TLBR<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn cy(&self) -> Self::Type {
        let two = T::one() + T::one();
        (self.t + self.b) / two
    }

    fn cx(&self) -> Self::Type {
        let two = T::one() + T::one();
        (self.l + self.r) / two
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");

        Ok(Self { t, l, b, r })
    }

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let b = t + h;
        let r = l + w;
        Self::try_from_tlbr([t, l, b, r])
    }
}
