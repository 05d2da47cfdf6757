//! Directional light (sun-like source at infinity)
//!
//! The direction is authoritative. Position and target only exist to place
//! the orthographic shadow camera and, when a target is set, to derive the
//! direction as `normalize(target - position)`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{blinn_phong, Contribution, FragmentData, LightCommon, LightModel, LightType};
use crate::shadow::{projection, ShadowProjection};
use crate::uniform::UniformTable;

/// Default direction: straight down
pub const DEFAULT_DIRECTION: Vec3 = Vec3::NEG_Y;

/// Optional exponential distance falloff for directional lights
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistanceFalloff {
    /// Distance scale of the exponential term
    pub half_life: f32,
    /// Contribution is exactly zero beyond this distance (0 = unbounded)
    pub max_distance: f32,
}

impl DistanceFalloff {
    /// Create a falloff, clamping to valid ranges
    pub fn new(half_life: f32, max_distance: f32) -> Self {
        let mut falloff = Self { half_life, max_distance };
        falloff.validate();
        falloff
    }

    /// Clamp to valid ranges
    pub fn validate(&mut self) {
        self.half_life = if self.half_life.is_finite() { self.half_life.max(1e-4) } else { 1.0 };
        self.max_distance = if self.max_distance.is_nan() { 0.0 } else { self.max_distance.max(0.0) };
    }

    /// Falloff factor at distance `d`
    pub fn attenuation(&self, d: f32) -> f32 {
        if self.max_distance > 0.0 && d > self.max_distance {
            return 0.0;
        }
        (-d.max(0.0) / self.half_life).exp().clamp(0.0, 1.0)
    }
}

/// Directional light parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    direction: Vec3,
    target: Option<Vec3>,
    falloff: Option<DistanceFalloff>,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTION)
    }
}

impl DirectionalLight {
    /// Create a light shining along `direction`
    pub fn new(direction: Vec3) -> Self {
        Self {
            direction: direction.try_normalize().unwrap_or(DEFAULT_DIRECTION),
            target: None,
            falloff: None,
        }
    }

    /// Unit direction the light travels in
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Target point, if the direction is derived from one
    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    /// Distance falloff, if any
    pub fn falloff(&self) -> Option<DistanceFalloff> {
        self.falloff
    }

    /// Set the direction directly; clears any target
    pub fn set_direction(&mut self, direction: Vec3) {
        self.target = None;
        if let Some(direction) = direction.try_normalize() {
            self.direction = direction;
        }
    }

    /// Aim at `target` from `position`, or drop the target with `None`
    pub fn set_target(&mut self, position: Vec3, target: Option<Vec3>) {
        self.target = target;
        self.retarget(position);
    }

    /// Set the distance falloff
    pub fn set_falloff(&mut self, falloff: Option<DistanceFalloff>) {
        self.falloff = falloff.map(|f| DistanceFalloff::new(f.half_life, f.max_distance));
    }

    /// Recompute the direction after the light moved
    pub(crate) fn retarget(&mut self, position: Vec3) {
        if let Some(direction) = self.target.and_then(|t| (t - position).try_normalize()) {
            self.direction = direction;
        }
    }

    pub(crate) fn validate(&mut self, position: Vec3) {
        self.direction = self.direction.try_normalize().unwrap_or(DEFAULT_DIRECTION);
        if let Some(falloff) = self.falloff.as_mut() {
            falloff.validate();
        }
        self.retarget(position);
    }

    /// Falloff between the light position and a fragment
    pub fn distance_attenuation(&self, light_position: Vec3, fragment_position: Vec3) -> f32 {
        match self.falloff {
            Some(falloff) => falloff.attenuation(light_position.distance(fragment_position)),
            None => 1.0,
        }
    }
}

impl LightModel for DirectionalLight {
    const TYPE: LightType = LightType::Directional;

    fn contribution(&self, common: &LightCommon, fragment: &FragmentData) -> Contribution {
        let attenuation = self.distance_attenuation(common.position, fragment.position);
        if attenuation <= 0.0 {
            return Contribution::ZERO;
        }
        blinn_phong(common.radiance(), -self.direction, fragment, attenuation)
    }

    fn write_uniforms(&self, _common: &LightCommon, table: &mut UniformTable) {
        table.set("directional_direction", self.direction);
        let falloff = self.falloff.unwrap_or(DistanceFalloff {
            half_life: 0.0,
            max_distance: 0.0,
        });
        table.set("directional_falloff", self.falloff.is_some());
        table.set("directional_half_life", falloff.half_life);
        table.set("directional_max_distance", falloff.max_distance);
    }

    fn shadow_projection(&self, common: &LightCommon) -> Option<ShadowProjection> {
        let shadow = &common.shadow;
        Some(ShadowProjection::Orthographic(projection::orthographic(
            common.position,
            self.direction,
            common.up,
            &shadow.ortho,
            shadow.near,
            shadow.far,
        )))
    }
}
