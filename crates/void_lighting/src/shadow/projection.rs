//! Shadow camera construction
//!
//! Each shadow-casting light type builds a different projection:
//!
//! - Directional: one orthographic camera along the light direction
//! - Point: six 90° perspective cameras, one per world axis (cube map)
//! - Spot: one perspective camera covering the cone
//!
//! All view matrices go through [`look_along`], which swaps to a secondary
//! up axis when the forward vector is nearly parallel to the up hint.

use core::f32::consts::{FRAC_PI_2, PI};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::config::OrthoBounds;

/// |forward · up| above this is treated as degenerate
pub const UP_SWAP_THRESHOLD: f32 = 0.99;

/// Cube face directions in +X, -X, +Y, -Y, +Z, -Z order
pub const CUBE_FACE_DIRECTIONS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

const MIN_FOV: f32 = 0.01;
const MAX_FOV: f32 = PI - 0.01;

/// View and projection pair for one shadow render
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowCamera {
    /// World to light-view transform
    pub view: Mat4,
    /// Light-view to clip transform
    pub projection: Mat4,
}

impl ShadowCamera {
    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Shadow projection of one light, shaped by its type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShadowProjection {
    /// Directional light
    Orthographic(ShadowCamera),
    /// Point light, faces in [`CUBE_FACE_DIRECTIONS`] order
    Cube([ShadowCamera; 6]),
    /// Spot light
    Perspective(ShadowCamera),
}

impl ShadowProjection {
    /// All cameras of this projection
    pub fn cameras(&self) -> &[ShadowCamera] {
        match self {
            ShadowProjection::Orthographic(camera) | ShadowProjection::Perspective(camera) => {
                core::slice::from_ref(camera)
            }
            ShadowProjection::Cube(faces) => faces,
        }
    }

    /// First camera (the only one for directional and spot lights)
    pub fn primary(&self) -> &ShadowCamera {
        &self.cameras()[0]
    }

    /// Number of shadow renders this projection needs
    pub fn face_count(&self) -> usize {
        self.cameras().len()
    }
}

/// Choose an up vector that is not parallel to `forward`
pub fn stable_up(forward: Vec3, up_hint: Vec3) -> Vec3 {
    let up = up_hint.try_normalize().unwrap_or(Vec3::Y);
    if forward.dot(up).abs() <= UP_SWAP_THRESHOLD {
        return up;
    }
    if up.dot(Vec3::Y).abs() > UP_SWAP_THRESHOLD {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Right-handed view matrix at `eye` looking along `forward`
pub fn look_along(eye: Vec3, forward: Vec3, up_hint: Vec3) -> Mat4 {
    let forward = forward.try_normalize().unwrap_or(Vec3::NEG_Y);
    Mat4::look_at_rh(eye, eye + forward, stable_up(forward, up_hint))
}

/// Orthographic shadow camera for a directional light
pub fn orthographic(
    eye: Vec3,
    direction: Vec3,
    up_hint: Vec3,
    bounds: &OrthoBounds,
    near: f32,
    far: f32,
) -> ShadowCamera {
    ShadowCamera {
        view: look_along(eye, direction, up_hint),
        projection: Mat4::orthographic_rh(
            bounds.left,
            bounds.right,
            bounds.bottom,
            bounds.top,
            near,
            far,
        ),
    }
}

/// Perspective shadow camera, `fov` is the full vertical field of view
pub fn perspective(
    eye: Vec3,
    direction: Vec3,
    up_hint: Vec3,
    fov: f32,
    near: f32,
    far: f32,
) -> ShadowCamera {
    ShadowCamera {
        view: look_along(eye, direction, up_hint),
        projection: Mat4::perspective_rh(fov.clamp(MIN_FOV, MAX_FOV), 1.0, near, far),
    }
}

/// Six-face cube shadow cameras for an omnidirectional light
pub fn cube(eye: Vec3, up_hint: Vec3, near: f32, far: f32) -> [ShadowCamera; 6] {
    let projection = Mat4::perspective_rh(FRAC_PI_2, 1.0, near, far);
    CUBE_FACE_DIRECTIONS.map(|face| ShadowCamera {
        view: look_along(eye, face, up_hint),
        projection,
    })
}
