//! Omnidirectional point light
//!
//! Distance attenuation:
//!
//! ```text
//! if distance > 0 and d > distance: 0
//! raw = 1 / (constant + linear·d + quadratic·d²·decay)
//! if distance > 0: raw *= exp(-d / (distance · 0.5))
//! attenuation = clamp(raw, 0, 1)
//! ```
//!
//! Shadows are six 90° perspective cameras, one per world axis.

use serde::{Deserialize, Serialize};

use super::{blinn_phong, Contribution, FragmentData, LightCommon, LightModel, LightType};
use crate::shadow::{projection, ShadowProjection};
use crate::uniform::UniformTable;

/// Smallest accepted decay exponent
pub const MIN_DECAY: f32 = 0.1;

/// Distance attenuation parameters shared by point and spot lights
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    /// Hard cutoff distance (0 = unbounded)
    pub distance: f32,
    /// Decay exponent applied to the quadratic term
    pub decay: f32,
    /// Constant coefficient
    pub constant: f32,
    /// Linear coefficient
    pub linear: f32,
    /// Quadratic coefficient
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            distance: 0.0,
            decay: 2.0,
            constant: 1.0,
            linear: 0.0,
            quadratic: 1.0,
        }
    }
}

fn non_negative(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.max(0.0) }
}

impl Attenuation {
    /// Clamp to valid ranges
    pub fn validate(&mut self) {
        self.distance = non_negative(self.distance);
        self.decay = if self.decay.is_nan() { MIN_DECAY } else { self.decay.max(MIN_DECAY) };
        self.constant = non_negative(self.constant);
        self.linear = non_negative(self.linear);
        self.quadratic = non_negative(self.quadratic);
    }

    /// Attenuation factor at distance `d`, always within [0, 1]
    pub fn at_distance(&self, d: f32) -> f32 {
        let d = non_negative(d);
        if self.distance > 0.0 && d > self.distance {
            return 0.0;
        }

        let denominator = self.constant + self.linear * d + self.quadratic * d * d * self.decay;
        let mut raw = if denominator > f32::EPSILON { 1.0 / denominator } else { 1.0 };
        if self.distance > 0.0 {
            raw *= (-d / (self.distance * 0.5)).exp();
        }
        raw.clamp(0.0, 1.0)
    }

    /// Write `<prefix>_distance`, `<prefix>_decay` and the coefficients
    pub(crate) fn write_uniforms(&self, prefix: &str, table: &mut UniformTable) {
        table.set(format!("{prefix}_distance"), self.distance);
        table.set(format!("{prefix}_decay"), self.decay);
        table.set(format!("{prefix}_constant"), self.constant);
        table.set(format!("{prefix}_linear"), self.linear);
        table.set(format!("{prefix}_quadratic"), self.quadratic);
    }
}

/// Point light parameters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    attenuation: Attenuation,
}

impl PointLight {
    /// Create a point light with the given attenuation
    pub fn new(mut attenuation: Attenuation) -> Self {
        attenuation.validate();
        Self { attenuation }
    }

    /// Create a point light with a cutoff distance and decay
    pub fn with_range(distance: f32, decay: f32) -> Self {
        Self::new(Attenuation {
            distance,
            decay,
            ..Default::default()
        })
    }

    /// Attenuation parameters
    pub fn attenuation(&self) -> &Attenuation {
        &self.attenuation
    }

    /// Cutoff distance (0 = unbounded)
    pub fn distance(&self) -> f32 {
        self.attenuation.distance
    }

    /// Decay exponent
    pub fn decay(&self) -> f32 {
        self.attenuation.decay
    }

    /// Set the cutoff distance
    pub fn set_distance(&mut self, distance: f32) {
        self.attenuation.distance = distance;
        self.attenuation.validate();
    }

    /// Set the decay exponent (clamped to [`MIN_DECAY`])
    pub fn set_decay(&mut self, decay: f32) {
        self.attenuation.decay = decay;
        self.attenuation.validate();
    }

    /// Set constant, linear and quadratic coefficients
    pub fn set_coefficients(&mut self, constant: f32, linear: f32, quadratic: f32) {
        self.attenuation.constant = constant;
        self.attenuation.linear = linear;
        self.attenuation.quadratic = quadratic;
        self.attenuation.validate();
    }

    pub(crate) fn validate(&mut self) {
        self.attenuation.validate();
    }

    /// Distance attenuation at `d`
    pub fn distance_attenuation(&self, d: f32) -> f32 {
        self.attenuation.at_distance(d)
    }

    /// Shade a fragment with an extra multiplicative factor folded into the
    /// distance attenuation (1 for plain point lights, the cone term for spots)
    pub(crate) fn shade(
        &self,
        common: &LightCommon,
        fragment: &FragmentData,
        factor: f32,
    ) -> Contribution {
        let to_light = common.position - fragment.position;
        let attenuation = self.distance_attenuation(to_light.length()) * factor;
        if attenuation <= 0.0 {
            return Contribution::ZERO;
        }
        let direction = to_light.try_normalize().unwrap_or(fragment.normal);
        blinn_phong(common.radiance(), direction, fragment, attenuation)
    }
}

impl LightModel for PointLight {
    const TYPE: LightType = LightType::Point;

    fn contribution(&self, common: &LightCommon, fragment: &FragmentData) -> Contribution {
        self.shade(common, fragment, 1.0)
    }

    fn write_uniforms(&self, _common: &LightCommon, table: &mut UniformTable) {
        self.attenuation.write_uniforms("point", table);
    }

    fn shadow_projection(&self, common: &LightCommon) -> Option<ShadowProjection> {
        Some(ShadowProjection::Cube(projection::cube(
            common.position,
            common.up,
            common.shadow.near,
            common.shadow.far,
        )))
    }
}
