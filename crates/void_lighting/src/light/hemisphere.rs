//! Hemisphere light: sky/ground gradient ambient term

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{Contribution, FragmentData, LightCommon, LightModel, LightType};
use crate::uniform::UniformTable;

/// Ambient light blending from a ground color (facing down) to the light's
/// own color (facing along the up axis)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HemisphereLight {
    ground_color: Vec3,
}

impl Default for HemisphereLight {
    fn default() -> Self {
        Self::new(Vec3::splat(0.25))
    }
}

impl HemisphereLight {
    /// Create with the given ground color
    pub fn new(ground_color: Vec3) -> Self {
        Self {
            ground_color: super::clamp_color(ground_color),
        }
    }

    /// Color received by surfaces facing away from the up axis
    pub fn ground_color(&self) -> Vec3 {
        self.ground_color
    }

    /// Set the ground color (channels clamped to [0, 1])
    pub fn set_ground_color(&mut self, color: Vec3) {
        self.ground_color = super::clamp_color(color);
    }

    pub(crate) fn validate(&mut self) {
        self.ground_color = super::clamp_color(self.ground_color);
    }
}

impl LightModel for HemisphereLight {
    const TYPE: LightType = LightType::Hemisphere;

    fn contribution(&self, common: &LightCommon, fragment: &FragmentData) -> Contribution {
        let up = common.up.try_normalize().unwrap_or(Vec3::Y);
        let normal = fragment.normal.try_normalize().unwrap_or(up);
        let weight = 0.5 * normal.dot(up) + 0.5;
        let scale = common.intensity * common.intensity_scale;
        Contribution {
            ambient: self.ground_color.lerp(common.color, weight) * scale,
            attenuation: 1.0,
            ..Contribution::ZERO
        }
    }

    fn write_uniforms(&self, common: &LightCommon, table: &mut UniformTable) {
        table.set("hemisphere_ground_color", self.ground_color);
        table.set("hemisphere_direction", common.up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gradient_follows_normal() {
        let mut common = LightCommon::new("sky");
        common.color = Vec3::new(0.0, 0.0, 1.0);
        let light = HemisphereLight::new(Vec3::new(1.0, 0.0, 0.0));

        let up = light.contribution(&common, &FragmentData::new(Vec3::ZERO, Vec3::Y, Vec3::Z));
        assert_abs_diff_eq!(up.ambient.distance(Vec3::Z), 0.0, epsilon = 1e-6);

        let down = light.contribution(&common, &FragmentData::new(Vec3::ZERO, Vec3::NEG_Y, Vec3::Z));
        assert_abs_diff_eq!(down.ambient.distance(Vec3::X), 0.0, epsilon = 1e-6);

        let side = light.contribution(&common, &FragmentData::new(Vec3::ZERO, Vec3::X, Vec3::Z));
        assert_abs_diff_eq!(side.ambient.distance(Vec3::new(0.5, 0.0, 0.5)), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ground_color_clamped() {
        let light = HemisphereLight::new(Vec3::new(2.0, -1.0, 0.5));
        assert_eq!(light.ground_color(), Vec3::new(1.0, 0.0, 0.5));
    }
}
