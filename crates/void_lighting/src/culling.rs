//! Light culling volumes
//!
//! Frustum planes are extracted from a view-projection matrix with the
//! Gribb/Hartmann method, assuming glam's right-handed `[0, 1]` depth range.
//! Every plane normal points inward, toward the visible region.

use glam::{Mat4, Vec3, Vec4};

use crate::light::Light;

/// Plane in 3D space (`normal · p + distance = 0`)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Offset along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane, normalizing the coefficients
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let len = normal.length();
        if len > 1e-10 {
            Self {
                normal: normal / len,
                distance: distance / len,
            }
        } else {
            Self::default()
        }
    }

    /// Plane through `point` facing `normal`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.try_normalize().unwrap_or(Vec3::Y);
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    fn from_row(row: Vec4) -> Self {
        Self::new(row.truncate(), row.w)
    }

    /// Signed distance, positive in front of the plane
    #[inline]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vec3::Y,
            distance: 0.0,
        }
    }
}

/// Bounding sphere of a light's region of influence
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    /// Center
    pub center: Vec3,
    /// Radius
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Influence sphere of a light, `None` when the light is unbounded
    ///
    /// Only point and spot lights with a cutoff distance are bounded.
    pub fn of_light(light: &Light) -> Option<Self> {
        if !light.light_type().is_positional() {
            return None;
        }
        match light.range() {
            Some(range) if range > 0.0 => Some(Self::new(light.position(), range)),
            _ => None,
        }
    }
}

/// Result of a containment test
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Containment {
    /// Entirely inside
    Inside,
    /// Entirely outside
    Outside,
    /// Crossing the boundary
    Intersecting,
}

impl Containment {
    /// At least partially inside
    #[inline]
    pub fn is_visible(&self) -> bool {
        *self != Containment::Outside
    }
}

/// View frustum (left, right, bottom, top, near, far)
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    /// Inward-facing planes
    pub planes: [Plane; 6],
}

impl Frustum {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;
    pub const BOTTOM: usize = 2;
    pub const TOP: usize = 3;
    pub const NEAR: usize = 4;
    pub const FAR: usize = 5;

    /// Extract the planes of a view-projection matrix
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                // Depth range [0, 1]: near is z >= 0
                Plane::from_row(r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Classify a sphere against the frustum
    pub fn classify_sphere(&self, center: Vec3, radius: f32) -> Containment {
        let mut result = Containment::Inside;
        for plane in &self.planes {
            let dist = plane.distance_to_point(center);
            if dist < -radius {
                return Containment::Outside;
            }
            if dist < radius {
                result = Containment::Intersecting;
            }
        }
        result
    }

    /// Whether a sphere is at least partially inside
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// Whether a point is inside
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Whether a light can affect anything inside the frustum
    ///
    /// Unbounded lights (ambient, hemisphere, directional, or positional
    /// lights without a cutoff) always pass.
    pub fn affects(&self, light: &Light) -> bool {
        match BoundingSphere::of_light(light) {
            Some(sphere) => self.intersects_sphere(sphere.center, sphere.radius),
            None => true,
        }
    }
}
