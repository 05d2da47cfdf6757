//! Ambient light: a constant additive term

use serde::{Deserialize, Serialize};

use super::{Contribution, FragmentData, LightCommon, LightModel, LightType};
use crate::uniform::UniformTable;

/// Uniform light with no position, direction or attenuation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight;

impl LightModel for AmbientLight {
    const TYPE: LightType = LightType::Ambient;

    fn contribution(&self, common: &LightCommon, _fragment: &FragmentData) -> Contribution {
        Contribution {
            ambient: common.radiance(),
            attenuation: 1.0,
            ..Contribution::ZERO
        }
    }

    fn write_uniforms(&self, _common: &LightCommon, _table: &mut UniformTable) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_contribution_ignores_fragment() {
        let mut common = LightCommon::new("ambient");
        common.color = Vec3::new(0.2, 0.4, 0.6);
        common.intensity = 0.5;

        let a = AmbientLight.contribution(
            &common,
            &FragmentData::new(Vec3::ZERO, Vec3::Y, Vec3::new(0.0, 1.0, 5.0)),
        );
        let b = AmbientLight.contribution(
            &common,
            &FragmentData::new(Vec3::splat(100.0), Vec3::NEG_X, Vec3::ZERO),
        );

        assert_eq!(a, b);
        assert_eq!(a.ambient, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(a.diffuse, Vec3::ZERO);
        assert_eq!(a.specular, Vec3::ZERO);
    }
}
