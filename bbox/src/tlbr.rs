use super::Rect;
use crate::common::*;

/// Bounding box in TLBR format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TLBR<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) b: T,
    pub(crate) r: T,
}

impl<T> TLBR<T>
where
    T: Float,
{
    /// The smallest box enclosing all `[x, y]` points.
    ///
    /// Returns `None` if the iterator yields no points.
    pub fn try_enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [T; 2]>,
    {
        points.into_iter().fold(None, |rect, [x, y]| {
            let rect = match rect {
                Some(Self { t, l, b, r }) => Self {
                    t: t.min(y),
                    l: l.min(x),
                    b: b.max(y),
                    r: r.max(x),
                },
                None => Self {
                    t: y,
                    l: x,
                    b: y,
                    r: x,
                },
            };
            Some(rect)
        })
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
        let one = T::one();
        let two = one + one;
        self.t + self.h() / two
    }

    fn cx(&self) -> Self::Type {
        let one = T::one();
        let two = one + one;
        self.l + self.w() / two
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;
    use approx::assert_abs_diff_eq;

    #[test]
    fn enclosing_points() {
        let points = [[3.0, 4.0], [1.0, 8.0], [5.0, 2.0]];
        let rect = TLBR::try_enclosing(points).unwrap();
        assert_eq!(rect.tlbr(), [2.0, 1.0, 8.0, 5.0]);
        assert_abs_diff_eq!(rect.cy(), 5.0);
        assert_abs_diff_eq!(rect.cx(), 3.0);
    }

    #[test]
    fn enclosing_single_point() {
        let rect = TLBR::try_enclosing([[7.5, -1.0]]).unwrap();
        assert_eq!([rect.h(), rect.w()], [0.0, 0.0]);
        assert!(rect.contains_point(7.5, -1.0));
    }

    #[test]
    fn enclosing_nothing() {
        let rect = TLBR::<f64>::try_enclosing(std::iter::empty());
        assert!(rect.is_none());
    }
}
