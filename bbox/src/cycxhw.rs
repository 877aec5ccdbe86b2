use super::TLBR;
use crate::common::*;

/// Bounding box in CyCxHW format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CyCxHW<T> {
    pub(crate) cy: T,
    pub(crate) cx: T,
    pub(crate) h: T,
    pub(crate) w: T,
}

impl<T> CyCxHW<T>
where
    T: Copy + Num + PartialOrd,
{
    /// Scale height and width by the same factor, keeping the center fixed.
    pub fn try_scale(&self, scale: T) -> Result<Self> {
        let zero = T::zero();
        ensure!(scale > zero, "scaling factor must be positive");

        let Self { cy, cx, h, w, .. } = *self;

        let h = h * scale;
        let w = w * scale;
        debug_assert!(h >= zero && w >= zero);
        Ok(Self { cy, cx, h, w })
    }
}

impl<T> From<&TLBR<T>> for CyCxHW<T>
where
    T: Copy + Num,
{
    fn from(from: &TLBR<T>) -> Self {
        let two = T::one() + T::one();
        let TLBR { t, l, b, r, .. } = *from;
        let h = b - t;
        let w = r - l;
        let cy = t + h / two;
        let cx = l + w / two;
        Self { cy, cx, h, w }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn center_of_enclosing_box() {
        let tlbr = TLBR::try_enclosing([[20.0, 10.0], [60.0, 30.0]]).unwrap();
        let CyCxHW { cy, cx, h, w } = CyCxHW::from(&tlbr);
        assert_abs_diff_eq!(cy, 20.0);
        assert_abs_diff_eq!(cx, 40.0);
        assert_abs_diff_eq!(h, 20.0);
        assert_abs_diff_eq!(w, 40.0);
    }

    #[test]
    fn scale_keeps_center() {
        let rect = CyCxHW {
            cy: 20.0,
            cx: 40.0,
            h: 20.0,
            w: 40.0,
        };
        let scaled = rect.try_scale(1.5).unwrap();

        assert_abs_diff_eq!(scaled.cy, rect.cy);
        assert_abs_diff_eq!(scaled.cx, rect.cx);
        assert_abs_diff_eq!(scaled.h, 30.0);
        assert_abs_diff_eq!(scaled.w, 60.0);
    }

    #[test]
    fn unit_scale_is_identity() {
        let rect = CyCxHW {
            cy: 6.75,
            cx: 4.0,
            h: 7.0,
            w: 11.0,
        };
        assert_eq!(rect.try_scale(1.0).unwrap(), rect);
    }

    #[test]
    fn scale_rejects_non_positive_factor() {
        let rect = CyCxHW {
            cy: 0.0,
            cx: 0.0,
            h: 1.0,
            w: 1.0,
        };
        assert!(rect.try_scale(0.0).is_err());
        assert!(rect.try_scale(-2.0).is_err());
    }
}
