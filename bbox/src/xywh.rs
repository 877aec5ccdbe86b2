use super::{CyCxHW, Rect};
use crate::common::*;

/// Bounding box in XYWH format, the top-left corner followed by the size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XYWH<T> {
    pub(crate) x: T,
    pub(crate) y: T,
    pub(crate) w: T,
    pub(crate) h: T,
}

impl<T> XYWH<T> {
    /// Build a box without checking the size.
    ///
    /// Only meant for reproducing legacy annotations which may carry a
    /// negative extent.
    pub fn from_raw_xywh(xywh: [T; 4]) -> Self {
        let [x, y, w, h] = xywh;
        Self { x, y, w, h }
    }
}

impl<T> XYWH<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn try_from_xywh(xywh: [T; 4]) -> Result<Self> {
        let [x, y, w, h] = xywh;
        let zero = T::zero();
        ensure!(
            w >= zero && h >= zero,
            "box width and height must be non-negative"
        );
        Ok(Self { x, y, w, h })
    }

    pub fn from_xywh(xywh: [T; 4]) -> Self {
        Self::try_from_xywh(xywh).unwrap()
    }

    /// The `[x, y, w, h, score]` row stored in annotation bundles.
    pub fn to_row_with_score(&self, score: T) -> [T; 5] {
        [self.x, self.y, self.w, self.h, score]
    }
}

impl<T> Rect for XYWH<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.y
    }

    fn l(&self) -> Self::Type {
        self.x
    }

    fn b(&self) -> Self::Type {
        self.y + self.h
    }

    fn r(&self) -> Self::Type {
        self.x + self.w
    }

    fn cy(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.y + self.h / two
    }

    fn cx(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.x + self.w / two
    }

    fn h(&self) -> Self::Type {
        self.h
    }

    fn w(&self) -> Self::Type {
        self.w
    }
}

impl<T> From<&CyCxHW<T>> for XYWH<T>
where
    T: Copy + Num,
{
    fn from(from: &CyCxHW<T>) -> Self {
        let two = T::one() + T::one();
        let CyCxHW { cy, cx, h, w } = *from;
        Self {
            x: cx - w / two,
            y: cy - h / two,
            w,
            h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RectNum, TLBR};
    use approx::assert_abs_diff_eq;

    #[test]
    fn xywh_from_center_form() {
        let tlbr = TLBR::try_enclosing([[1.0, 2.0], [5.0, 8.0]]).unwrap();
        let xywh = XYWH::from(&CyCxHW::from(&tlbr));
        assert_eq!(xywh.xywh(), [1.0, 2.0, 4.0, 6.0]);
        assert_eq!(xywh.tlbr(), tlbr.tlbr());
        assert_abs_diff_eq!(xywh.cy(), 5.0);
        assert_abs_diff_eq!(xywh.cx(), 3.0);
    }

    #[test]
    fn row_with_score() {
        let xywh = XYWH::from_xywh([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(xywh.to_row_with_score(1.0), [1.0, 2.0, 3.0, 4.0, 1.0]);
    }

    #[test]
    fn negative_size_is_rejected() {
        assert!(XYWH::try_from_xywh([0.0, 0.0, -1.0, 2.0]).is_err());
    }

    #[test]
    fn raw_box_keeps_negative_extent() {
        let xywh = XYWH::from_raw_xywh([0.0, 0.0, 2.0, -3.0]);
        assert_eq!(xywh.xywh(), [0.0, 0.0, 2.0, -3.0]);
    }
}
