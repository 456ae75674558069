//! crates/tp_core/src/geometry.rs
//! The minimal geometry vocabulary the engine consumes: closed tagged union
//! `Geometry` plus the dimension/length contract each variant must satisfy.
//! Nothing here does numerical geometry beyond what the integrator and
//! rotation math need (§1 Non-goals).

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Point3) -> Point3 {
        Point3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn scale(&self, k: f64) -> Point3 {
        Point3::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn add(&self, other: &Point3) -> Point3 {
        Point3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Point3) -> Point3 {
        Point3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Renormalize onto the unit sphere. A zero vector is returned unchanged
    /// (there is no well-defined direction to normalize to).
    pub fn renormalize(&self) -> Point3 {
        let n = self.norm();
        if n < f64::EPSILON {
            *self
        } else {
            self.scale(1.0 / n)
        }
    }

    pub fn distance_to(&self, other: &Point3) -> f64 {
        self.sub(other).norm()
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment2 {
    pub a: Point2,
    pub b: Point2,
}

impl Segment2 {
    pub fn new(a: Point2, b: Point2) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f64 {
        self.a.distance_to(&self.b)
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polyline2 {
    pub points: Vec<Point2>,
}

impl Polyline2 {
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Sum of segment lengths; `0.0` for zero or one point, `NaN` is never
    /// produced here (an empty polyline has length `0.0`, matching §3.2's
    /// contract that only an *empty geometry* reports `NaN`).
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polyline3 {
    pub points: Vec<Point3>,
}

impl Polyline3 {
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }
}

/// A simple (non-self-intersecting) closed 2-D region, stored as its ring of
/// vertices. The ring is implicitly closed (last vertex connects to first).
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolygonRegion2 {
    pub ring: Vec<Point2>,
}

impl PolygonRegion2 {
    pub fn new(ring: Vec<Point2>) -> Self {
        Self { ring }
    }

    /// Perimeter length of the closed ring; `0.0` for fewer than two
    /// vertices.
    pub fn length(&self) -> f64 {
        if self.ring.len() < 2 {
            return 0.0;
        }
        let open: f64 = self
            .ring
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum();
        open + self.ring[self.ring.len() - 1].distance_to(&self.ring[0])
    }

    /// Signed area via the shoelace formula (positive = counter-clockwise).
    /// Used by the frame service's area-weighted net-rotation average.
    pub fn signed_area(&self) -> f64 {
        if self.ring.len() < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..self.ring.len() {
            let p0 = self.ring[i];
            let p1 = self.ring[(i + 1) % self.ring.len()];
            acc += p0.x * p1.y - p1.x * p0.y;
        }
        acc * 0.5
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Point-in-polygon test (even-odd rule), used by the reconstruction
    /// solver's "lowest plate id wins" partition assignment.
    pub fn contains(&self, p: &Point2) -> bool {
        let mut inside = false;
        let n = self.ring.len();
        if n < 3 {
            return false;
        }
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.ring[i];
            let vj = self.ring[j];
            let crosses = (vi.y > p.y) != (vj.y > p.y);
            if crosses {
                let x_at_y = vj.x + (p.y - vj.y) / (vi.y - vj.y) * (vi.x - vj.x);
                if p.x < x_at_y {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

/// Closed tagged union of the geometry kinds an event may carry. Each
/// variant knows its dimension and a `length()` (0 for points, matching
/// §3.2; a polygon with fewer than 3 vertices also reports 0, never `NaN`
/// unless explicitly constructed empty — see `Geometry::length`).
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Geometry {
    Point2(Point2),
    Point3(Point3),
    Segment2(Segment2),
    Polyline2(Polyline2),
    Polyline3(Polyline3),
    PolygonRegion2(PolygonRegion2),
}

impl Geometry {
    pub fn dimension(&self) -> u8 {
        match self {
            Geometry::Point2(_) | Geometry::Segment2(_) | Geometry::Polyline2(_) => 2,
            Geometry::Point3(_) | Geometry::Polyline3(_) => 3,
            Geometry::PolygonRegion2(_) => 2,
        }
    }

    /// `0` for points; `NaN` only for a polyline/polygon with no vertices at
    /// all (an explicitly empty geometry, distinct from "too few to have
    /// area").
    pub fn length(&self) -> f64 {
        match self {
            Geometry::Point2(_) | Geometry::Point3(_) => 0.0,
            Geometry::Segment2(s) => s.length(),
            Geometry::Polyline2(p) => {
                if p.points.is_empty() {
                    f64::NAN
                } else {
                    p.length()
                }
            }
            Geometry::Polyline3(p) => {
                if p.points.is_empty() {
                    f64::NAN
                } else {
                    p.length()
                }
            }
            Geometry::PolygonRegion2(r) => {
                if r.ring.is_empty() {
                    f64::NAN
                } else {
                    r.length()
                }
            }
        }
    }

    /// Stable tag used by the canonical codec's sum-type encoding (§4.2).
    /// Indices are stable across schema revisions; never reorder or remove
    /// a variant without assigning a tombstone slot.
    pub fn variant_index(&self) -> u8 {
        match self {
            Geometry::Point2(_) => 0,
            Geometry::Point3(_) => 1,
            Geometry::Segment2(_) => 2,
            Geometry::Polyline2(_) => 3,
            Geometry::Polyline3(_) => 4,
            Geometry::PolygonRegion2(_) => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_length_is_zero() {
        assert_eq!(Geometry::Point2(Point2::new(1.0, 2.0)).length(), 0.0);
        assert_eq!(Geometry::Point3(Point3::new(1.0, 2.0, 3.0)).length(), 0.0);
    }

    #[test]
    fn empty_polyline_length_is_nan() {
        assert!(Geometry::Polyline2(Polyline2::default()).length().is_nan());
        assert!(Geometry::Polyline3(Polyline3::default()).length().is_nan());
    }

    #[test]
    fn segment_length_matches_distance() {
        let s = Segment2::new(Point2::new(0.0, 0.0), Point2::new(3.0, 4.0));
        assert!((s.length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn polygon_area_of_unit_square() {
        let square = PolygonRegion2::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]);
        assert!((square.area() - 1.0).abs() < 1e-12);
        assert!(square.contains(&Point2::new(0.5, 0.5)));
        assert!(!square.contains(&Point2::new(2.0, 2.0)));
    }

    #[test]
    fn point3_renormalize_projects_onto_unit_sphere() {
        let p = Point3::new(2.0, 0.0, 0.0);
        let r = p.renormalize();
        assert!((r.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn variant_indices_are_stable_and_distinct() {
        let indices: Vec<u8> = [
            Geometry::Point2(Point2::default()).variant_index(),
            Geometry::Point3(Point3::default()).variant_index(),
            Geometry::Segment2(Segment2::new(Point2::default(), Point2::default()))
                .variant_index(),
            Geometry::Polyline2(Polyline2::default()).variant_index(),
            Geometry::Polyline3(Polyline3::default()).variant_index(),
            Geometry::PolygonRegion2(PolygonRegion2::default()).variant_index(),
        ]
        .to_vec();
        let mut sorted = indices.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), indices.len());
    }
}
