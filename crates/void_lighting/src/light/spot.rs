//! Spot light: a point light restricted to a cone
//!
//! Composes a [`PointLight`] for distance attenuation and adds an angular
//! term. For a fragment at angle θ from the cone axis:
//!
//! ```text
//! θ > angle                    → 0
//! θ ≤ angle · (1 − penumbra)   → 1
//! otherwise                    → (angle − θ) / (angle · penumbra)
//! ```

use core::f32::consts::FRAC_PI_2;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::point::{Attenuation, PointLight};
use super::{Contribution, FragmentData, LightCommon, LightModel, LightType};
use crate::shadow::{projection, ShadowProjection};
use crate::uniform::UniformTable;

/// Largest accepted cone half-angle
pub const MAX_SPOT_ANGLE: f32 = FRAC_PI_2;

/// Default cone half-angle (60°)
pub const DEFAULT_SPOT_ANGLE: f32 = core::f32::consts::FRAC_PI_3;

/// Both attenuation factors of a spot light and their product
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotAttenuation {
    /// Point-light distance term
    pub distance: f32,
    /// Cone term
    pub angle: f32,
    /// `distance * angle`
    pub total: f32,
}

/// Spot light parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    point: PointLight,
    direction: Vec3,
    target: Option<Vec3>,
    angle: f32,
    penumbra: f32,
    #[serde(skip)]
    cos_angle: f32,
    #[serde(skip)]
    cos_inner: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self::new(Vec3::NEG_Y, DEFAULT_SPOT_ANGLE, 0.0)
    }
}

fn clamp_angle(angle: f32) -> f32 {
    if angle.is_nan() { 0.0 } else { angle.clamp(0.0, MAX_SPOT_ANGLE) }
}

fn clamp_penumbra(penumbra: f32) -> f32 {
    if penumbra.is_nan() { 0.0 } else { penumbra.clamp(0.0, 1.0) }
}

impl SpotLight {
    /// Create a spot light pointing along `direction`
    pub fn new(direction: Vec3, angle: f32, penumbra: f32) -> Self {
        let mut spot = Self {
            point: PointLight::default(),
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
            target: None,
            angle: clamp_angle(angle),
            penumbra: clamp_penumbra(penumbra),
            cos_angle: 0.0,
            cos_inner: 0.0,
        };
        spot.refresh_cosines();
        spot
    }

    /// Replace the distance attenuation parameters
    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.point = PointLight::new(attenuation);
        self
    }

    /// Underlying point light (distance attenuation)
    pub fn point(&self) -> &PointLight {
        &self.point
    }

    pub(crate) fn point_mut(&mut self) -> &mut PointLight {
        &mut self.point
    }

    /// Unit cone axis
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Target point, if the axis is derived from one
    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    /// Cone half-angle in radians
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Fraction of the half-angle used as the soft edge
    pub fn penumbra(&self) -> f32 {
        self.penumbra
    }

    /// Half-angle of the fully lit inner cone
    pub fn inner_angle(&self) -> f32 {
        self.angle * (1.0 - self.penumbra)
    }

    /// Cached `cos(angle)`
    pub fn cos_angle(&self) -> f32 {
        self.cos_angle
    }

    /// Cached `cos(angle · (1 − penumbra))`
    pub fn cos_inner(&self) -> f32 {
        self.cos_inner
    }

    /// Set the cone half-angle (clamped to `[0, π/2]`)
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = clamp_angle(angle);
        self.refresh_cosines();
    }

    /// Set the penumbra fraction (clamped to `[0, 1]`)
    pub fn set_penumbra(&mut self, penumbra: f32) {
        self.penumbra = clamp_penumbra(penumbra);
        self.refresh_cosines();
    }

    /// Set the cone axis directly; clears any target
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

    pub(crate) fn retarget(&mut self, position: Vec3) {
        if let Some(direction) = self.target.and_then(|t| (t - position).try_normalize()) {
            self.direction = direction;
        }
    }

    pub(crate) fn validate(&mut self, position: Vec3) {
        self.point.validate();
        self.direction = self.direction.try_normalize().unwrap_or(Vec3::NEG_Y);
        self.angle = clamp_angle(self.angle);
        self.penumbra = clamp_penumbra(self.penumbra);
        self.refresh_cosines();
        self.retarget(position);
    }

    fn refresh_cosines(&mut self) {
        self.cos_angle = self.angle.cos();
        self.cos_inner = self.inner_angle().cos();
    }

    /// Cone term for a fragment `theta` radians off the axis
    pub fn angle_attenuation(&self, theta: f32) -> f32 {
        if theta > self.angle {
            return 0.0;
        }
        let inner = self.inner_angle();
        if theta <= inner {
            return 1.0;
        }
        ((self.angle - theta) / (self.angle * self.penumbra)).clamp(0.0, 1.0)
    }

    /// Distance term at `d`
    pub fn distance_attenuation(&self, d: f32) -> f32 {
        self.point.distance_attenuation(d)
    }

    /// Angle between the cone axis and the ray from `light_position` to `point`
    pub fn angle_to(&self, light_position: Vec3, point: Vec3) -> f32 {
        match (point - light_position).try_normalize() {
            Some(to_point) => self.direction.dot(to_point).clamp(-1.0, 1.0).acos(),
            None => 0.0,
        }
    }

    /// Both attenuation factors for a fragment
    pub fn attenuation_at(&self, light_position: Vec3, fragment_position: Vec3) -> SpotAttenuation {
        let distance = self.distance_attenuation(light_position.distance(fragment_position));
        let angle = self.angle_attenuation(self.angle_to(light_position, fragment_position));
        SpotAttenuation {
            distance,
            angle,
            total: distance * angle,
        }
    }
}

impl LightModel for SpotLight {
    const TYPE: LightType = LightType::Spot;

    fn contribution(&self, common: &LightCommon, fragment: &FragmentData) -> Contribution {
        let cos_theta = match (fragment.position - common.position).try_normalize() {
            Some(to_fragment) => self.direction.dot(to_fragment).clamp(-1.0, 1.0),
            None => 1.0,
        };
        if cos_theta < self.cos_angle {
            return Contribution::ZERO;
        }
        let angular = self.angle_attenuation(cos_theta.acos());
        self.point.shade(common, fragment, angular)
    }

    fn write_uniforms(&self, _common: &LightCommon, table: &mut UniformTable) {
        table.set("spot_direction", self.direction);
        table.set("spot_angle", self.angle);
        table.set("spot_penumbra", self.penumbra);
        table.set("spot_angle_cos", self.cos_angle);
        table.set("spot_penumbra_cos", self.cos_inner);
        self.point.attenuation().write_uniforms("spot", table);
    }

    fn shadow_projection(&self, common: &LightCommon) -> Option<ShadowProjection> {
        Some(ShadowProjection::Perspective(projection::perspective(
            common.position,
            self.direction,
            common.up,
            self.angle * 2.0,
            common.shadow.near,
            common.shadow.far,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f32::consts::PI;

    fn scenario_spot() -> SpotLight {
        SpotLight::new(Vec3::NEG_Z, PI / 6.0, 0.5)
    }

    #[test]
    fn test_angle_attenuation_scenario() {
        let spot = scenario_spot();
        assert_eq!(spot.angle_attenuation(0.0), 1.0);
        assert_eq!(spot.angle_attenuation(spot.inner_angle()), 1.0);
        assert_abs_diff_eq!(spot.angle_attenuation(15.0f32.to_radians()), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(spot.angle_attenuation(22.5f32.to_radians()), 0.5, epsilon = 1e-5);
        assert_eq!(spot.angle_attenuation(31.0f32.to_radians()), 0.0);
    }

    #[test]
    fn test_angle_attenuation_band_is_continuous() {
        let spot = scenario_spot();
        let inner = spot.inner_angle();
        let outer = spot.angle();
        let eps = 1e-4;

        assert_abs_diff_eq!(spot.angle_attenuation(inner + eps), 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(spot.angle_attenuation(outer - eps), 0.0, epsilon = 1e-2);

        let steps = 50;
        for i in 1..steps {
            let theta = inner + (outer - inner) * i as f32 / steps as f32;
            let a = spot.angle_attenuation(theta);
            assert!(a > 0.0 && a < 1.0, "theta {theta} gave {a}");
        }
    }

    #[test]
    fn test_zero_penumbra_is_hard_edge() {
        let spot = SpotLight::new(Vec3::NEG_Z, 0.5, 0.0);
        assert_eq!(spot.angle_attenuation(0.5), 1.0);
        assert_eq!(spot.angle_attenuation(0.5001), 0.0);
    }

    #[test]
    fn test_setters_clamp_and_refresh_cosines() {
        let mut spot = SpotLight::default();
        spot.set_angle(3.0);
        assert_eq!(spot.angle(), MAX_SPOT_ANGLE);

        spot.set_penumbra(-1.0);
        assert_eq!(spot.penumbra(), 0.0);
        spot.set_penumbra(2.0);
        assert_eq!(spot.penumbra(), 1.0);

        spot.set_angle(PI / 4.0);
        spot.set_penumbra(0.5);
        assert_abs_diff_eq!(spot.cos_angle(), (PI / 4.0).cos(), epsilon = 1e-6);
        assert_abs_diff_eq!(spot.cos_inner(), (PI / 8.0).cos(), epsilon = 1e-6);
    }

    #[test]
    fn test_attenuation_at_exposes_both_factors() {
        let spot = scenario_spot().with_attenuation(Attenuation {
            distance: 20.0,
            ..Default::default()
        });
        let light_position = Vec3::ZERO;

        // On axis, 4 units away
        let on_axis = spot.attenuation_at(light_position, Vec3::new(0.0, 0.0, -4.0));
        assert_eq!(on_axis.angle, 1.0);
        assert_abs_diff_eq!(on_axis.distance, spot.distance_attenuation(4.0), epsilon = 1e-7);
        assert_abs_diff_eq!(on_axis.total, on_axis.distance, epsilon = 1e-7);

        // 45° off axis: outside a 30° cone
        let outside = spot.attenuation_at(light_position, Vec3::new(4.0, 0.0, -4.0));
        assert_eq!(outside.angle, 0.0);
        assert_eq!(outside.total, 0.0);
    }

    #[test]
    fn test_contribution_outside_cone_is_zero() {
        let mut common = LightCommon::new("spot");
        common.position = Vec3::new(0.0, 5.0, 0.0);
        let spot = SpotLight::new(Vec3::NEG_Y, PI / 6.0, 0.2);

        let outside = spot.contribution(
            &common,
            &FragmentData::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Y, Vec3::new(0.0, 5.0, 5.0)),
        );
        assert_eq!(outside, Contribution::ZERO);

        let inside = spot.contribution(
            &common,
            &FragmentData::new(Vec3::ZERO, Vec3::Y, Vec3::new(0.0, 5.0, 5.0)),
        );
        assert!(inside.diffuse.x > 0.0);
        assert_abs_diff_eq!(inside.attenuation, spot.distance_attenuation(5.0), epsilon = 1e-6);
    }

    #[test]
    fn test_contribution_in_penumbra_is_scaled() {
        let mut common = LightCommon::new("spot");
        common.position = Vec3::ZERO;
        let spot = scenario_spot();

        let theta = 22.5f32.to_radians();
        let fragment_position = Vec3::new(theta.sin(), 0.0, -theta.cos()) * 2.0;
        let c = spot.contribution(
            &common,
            &FragmentData::new(fragment_position, -fragment_position.normalize(), Vec3::ZERO),
        );

        let expected = spot.distance_attenuation(2.0) * 0.5;
        assert_abs_diff_eq!(c.attenuation, expected, epsilon = 1e-4);
    }

    #[test]
    fn test_shadow_fov_covers_cone() {
        let common = LightCommon::new("spot");
        let spot = SpotLight::new(Vec3::NEG_Y, PI / 6.0, 0.0);
        let projection = spot.shadow_projection(&common).unwrap();
        assert_eq!(projection.face_count(), 1);

        let expected = glam::Mat4::perspective_rh(spot.angle() * 2.0, 1.0, common.shadow.near, common.shadow.far);
        assert_eq!(projection.primary().projection, expected);
    }
}
