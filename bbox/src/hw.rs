use crate::common::*;

/// The height and width of an image frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HW<T> {
    w: T,
    h: T,
}

impl<T> HW<T>
where
    T: Num + PartialOrd + Copy,
{
    pub fn try_from_hw(hw: [T; 2]) -> Result<Self> {
        let [h, w] = hw;
        let zero = T::zero();
        ensure!(
            h >= zero && w >= zero,
            "height and width parameters must be non-negative"
        );
        Ok(Self { w, h })
    }

    pub fn from_hw(hw: [T; 2]) -> Self {
        Self::try_from_hw(hw).unwrap()
    }

    /// Check if the pixel coordinate falls inside the frame.
    ///
    /// The far edges are excluded, so a point at `x == w` or `y == h` is
    /// outside.
    pub fn contains(&self, x: T, y: T) -> bool {
        let zero = T::zero();
        zero <= x && x < self.w && zero <= y && y < self.h
    }
}
