use crate::common::*;

/// The generic rectangle.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd + Copy,
{
    fn tlbr(&self) -> [Self::Type; 4] {
        [self.t(), self.l(), self.b(), self.r()]
    }

    /// The corner-and-size form used by annotation files, x before y.
    fn xywh(&self) -> [Self::Type; 4] {
        [self.l(), self.t(), self.w(), self.h()]
    }

    /// Check if the point lies in the closed rectangle, boundaries included.
    fn contains_point(&self, x: Self::Type, y: Self::Type) -> bool {
        self.l() <= x && x <= self.r() && self.t() <= y && y <= self.b()
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd + Copy,
{
}
