//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box given by its minimum and maximum corners.
///
/// The empty box has `min = +inf` and `max = -inf`, so expanding it by any
/// point yields that point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Smallest coordinate on each axis.
    pub min: Point3<f64>,
    /// Largest coordinate on each axis.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Box spanning two corners, sorted per axis.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// The empty box.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing every point.
    ///
    /// ```
    /// use cad_types::{Aabb, Point3};
    ///
    /// let pts = [Point3::new(0.0, 2.0, 0.0), Point3::new(-1.0, 0.0, 5.0)];
    /// let aabb = Aabb::from_points(pts.iter());
    /// assert_eq!(aabb.min, Point3::new(-1.0, 0.0, 0.0));
    /// assert_eq!(aabb.max, Point3::new(0.0, 2.0, 5.0));
    /// ```
    #[must_use]
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.expand_to_include(p);
        }
        aabb
    }

    /// `true` when no point has been added.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to contain `point`.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Extent along each axis; zero for the empty box.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        if self.is_empty() {
            Vector3::zeros()
        } else {
            self.max - self.min
        }
    }

    /// Centre point; the origin for the empty box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        if self.is_empty() {
            Point3::origin()
        } else {
            nalgebra::center(&self.min, &self.max)
        }
    }

    /// Box volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Length of the main diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.size().norm()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_box_has_no_extent() {
        let aabb = Aabb::empty();
        assert!(aabb.is_empty());
        assert_eq!(aabb.size(), Vector3::zeros());
        assert_relative_eq!(aabb.volume(), 0.0);
    }

    #[test]
    fn new_sorts_corners() {
        let aabb = Aabb::new(Point3::new(2.0, 0.0, 1.0), Point3::new(0.0, 3.0, -1.0));
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, -1.0));
        assert_eq!(aabb.max, Point3::new(2.0, 3.0, 1.0));
    }

    #[test]
    fn volume_and_diagonal() {
        let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 2.0, 2.0));
        assert_relative_eq!(aabb.volume(), 4.0);
        assert_relative_eq!(aabb.diagonal(), 3.0);
        assert_eq!(aabb.center(), Point3::new(0.5, 1.0, 1.0));
    }
}
