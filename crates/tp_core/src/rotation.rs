//! crates/tp_core/src/rotation.rs
//! Unit quaternion rotations and the Rodrigues vector-rotation formula
//! (§4.8). All rotation is around axes through the origin; the caller is
//! responsible for translating points onto/off the unit sphere as needed.

use crate::geometry::Point3;

const IDENTITY_ANGLE_EPS: f64 = 1e-12;

/// A rotation represented as a unit quaternion `(x, y, z, w)`.
///
/// Stored normalized. `compose(a, b)` follows the convention "`a` applied
/// after `b`" (i.e. `compose(a, b).apply_to_point(p) == a.apply_to_point(&b.apply_to_point(p))`),
/// matching standard quaternion composition order `a * b`.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Renormalize onto the unit sphere of quaternions. A near-zero
    /// quaternion (should never arise from valid construction) collapses to
    /// identity rather than dividing by a near-zero norm.
    pub fn normalized(&self) -> Quaternion {
        let n = self.norm();
        if n < f64::EPSILON {
            Quaternion::IDENTITY
        } else {
            Quaternion {
                x: self.x / n,
                y: self.y / n,
                z: self.z / n,
                w: self.w / n,
            }
        }
    }

    /// Construct from an axis and angle (radians). A zero-length axis
    /// yields identity (documented fallback, not an error) since there is
    /// no rotation axis to honor.
    pub fn from_axis_angle(axis: Point3, theta: f64) -> Quaternion {
        let n = axis.norm();
        if n < f64::EPSILON {
            return Quaternion::IDENTITY;
        }
        let half = theta * 0.5;
        let s = half.sin();
        let k = axis.scale(1.0 / n);
        Quaternion {
            x: k.x * s,
            y: k.y * s,
            z: k.z * s,
            w: half.cos(),
        }
        .normalized()
    }

    /// Hamilton product: `self` applied after `other`.
    pub fn compose(&self, other: &Quaternion) -> Quaternion {
        let (a, b) = (self, other);
        Quaternion {
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        }
        .normalized()
    }

    /// Conjugate, which is the inverse for a unit quaternion.
    pub fn inverse(&self) -> Quaternion {
        Quaternion {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    /// Apply `q p q*` to a point, treating it as a pure quaternion `(p, 0)`.
    pub fn apply_to_point(&self, p: &Point3) -> Point3 {
        let qv = Point3::new(self.x, self.y, self.z);
        let uv = qv.cross(p);
        let uuv = qv.cross(&uv);
        // p + 2w(qv x p) + 2(qv x (qv x p))
        p.add(&uv.scale(2.0 * self.w)).add(&uuv.scale(2.0))
    }

    /// Rotation angle magnitude in `[0, pi]`.
    pub fn angle(&self) -> f64 {
        2.0 * self.w.clamp(-1.0, 1.0).acos()
    }

    pub fn is_identity(&self) -> bool {
        self.angle().abs() < IDENTITY_ANGLE_EPS
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Quaternion::IDENTITY
    }
}

/// Rodrigues' rotation formula: rotate `p` by angle `theta` around `axis`.
///
/// `p' = p cos(theta) + (k x p) sin(theta) + k (k . p)(1 - cos(theta))`
/// after normalizing `axis` to `k`. Returns `p` unchanged if the axis length
/// is below machine epsilon (no well-defined rotation axis).
pub fn rodrigues_rotate(p: &Point3, axis: &Point3, theta: f64) -> Point3 {
    let n = axis.norm();
    if n < f64::EPSILON {
        return *p;
    }
    let k = axis.scale(1.0 / n);
    let cos_t = theta.cos();
    let sin_t = theta.sin();
    let term1 = p.scale(cos_t);
    let term2 = k.cross(p).scale(sin_t);
    let term3 = k.scale(k.dot(p) * (1.0 - cos_t));
    term1.add(&term2).add(&term3)
}
