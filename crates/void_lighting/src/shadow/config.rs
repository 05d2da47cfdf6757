//! Per-light shadow settings
//!
//! Serde-friendly so light records and manager snapshots can carry them.

use serde::{Deserialize, Serialize};

/// Smallest accepted shadow map resolution
pub const MIN_SHADOW_MAP_SIZE: u32 = 256;
/// Largest accepted shadow map resolution
pub const MAX_SHADOW_MAP_SIZE: u32 = 8192;

/// Orthographic frustum extents for directional light shadows
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrthoBounds {
    /// Left plane
    pub left: f32,
    /// Right plane
    pub right: f32,
    /// Top plane
    pub top: f32,
    /// Bottom plane
    pub bottom: f32,
}

impl OrthoBounds {
    /// Symmetric bounds of the given half extent
    pub fn symmetric(half_extent: f32) -> Self {
        let h = half_extent.abs();
        Self {
            left: -h,
            right: h,
            top: h,
            bottom: -h,
        }
    }
}

impl Default for OrthoBounds {
    fn default() -> Self {
        Self::symmetric(10.0)
    }
}

/// Shadow settings carried by every light
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    /// Whether this light wants to cast shadows
    pub enabled: bool,

    /// Shadow map resolution (power of 2)
    pub map_size: u32,

    /// Depth bias to prevent shadow acne
    pub bias: f32,

    /// Normal-based offset to prevent peter-panning
    pub normal_bias: f32,

    /// Near plane for the shadow camera
    pub near: f32,

    /// Far plane for the shadow camera
    pub far: f32,

    /// Orthographic extents (directional lights only)
    pub ortho: OrthoBounds,

    /// Shadow strength (0 = no shadow, 1 = full shadow)
    pub strength: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            map_size: 1024,
            bias: 0.005,
            normal_bias: 0.02,
            near: 0.5,
            far: 500.0,
            ortho: OrthoBounds::default(),
            strength: 1.0,
        }
    }
}

impl ShadowSettings {
    /// Defaults for a directional light
    pub fn directional() -> Self {
        Self {
            bias: 0.002,
            normal_bias: 0.01,
            map_size: 2048,
            ..Default::default()
        }
    }

    /// Defaults for a point light (cube shadow)
    pub fn point() -> Self {
        Self {
            bias: 0.01,
            normal_bias: 0.03,
            near: 0.05,
            far: 100.0,
            map_size: 512,
            ..Default::default()
        }
    }

    /// Defaults for a spot light
    pub fn spot() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            ..Default::default()
        }
    }

    /// Apply a partial update and clamp the result
    pub fn apply(&mut self, options: &ShadowOptions) {
        if let Some(enabled) = options.enabled {
            self.enabled = enabled;
        }
        if let Some(map_size) = options.map_size {
            self.map_size = map_size;
        }
        if let Some(bias) = options.bias {
            self.bias = bias;
        }
        if let Some(normal_bias) = options.normal_bias {
            self.normal_bias = normal_bias;
        }
        if let Some(near) = options.near {
            self.near = near;
        }
        if let Some(far) = options.far {
            self.far = far;
        }
        if let Some(ortho) = options.ortho {
            self.ortho = ortho;
        }
        if let Some(strength) = options.strength {
            self.strength = strength;
        }
        self.validate();
    }

    /// Clamp values to valid ranges
    pub fn validate(&mut self) {
        self.map_size = self
            .map_size
            .clamp(MIN_SHADOW_MAP_SIZE, MAX_SHADOW_MAP_SIZE)
            .next_power_of_two();
        self.near = if self.near.is_finite() { self.near.max(1e-4) } else { 0.1 };
        if !(self.far > self.near) {
            self.far = self.near + 1.0;
        }
        self.strength = self.strength.clamp(0.0, 1.0);
        if !self.bias.is_finite() {
            self.bias = 0.0;
        }
        self.normal_bias = if self.normal_bias.is_finite() { self.normal_bias.max(0.0) } else { 0.0 };
    }

    /// Texel size of the shadow map in UV units
    pub fn texel_size(&self) -> f32 {
        1.0 / self.map_size as f32
    }
}

/// Partial shadow configuration accepted by `Light::configure_shadow`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowOptions {
    /// Enable or disable shadow casting
    pub enabled: Option<bool>,
    /// Shadow map resolution
    pub map_size: Option<u32>,
    /// Depth bias
    pub bias: Option<f32>,
    /// Normal bias
    pub normal_bias: Option<f32>,
    /// Shadow camera near plane
    pub near: Option<f32>,
    /// Shadow camera far plane
    pub far: Option<f32>,
    /// Orthographic extents (directional lights)
    pub ortho: Option<OrthoBounds>,
    /// Shadow strength
    pub strength: Option<f32>,
}

impl ShadowOptions {
    /// Options that only toggle shadow casting
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Default::default()
        }
    }

    /// Set the map resolution
    pub fn with_map_size(mut self, map_size: u32) -> Self {
        self.map_size = Some(map_size);
        self
    }

    /// Set near/far planes
    pub fn with_planes(mut self, near: f32, far: f32) -> Self {
        self.near = Some(near);
        self.far = Some(far);
        self
    }

    /// Set the depth bias
    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = Some(bias);
        self
    }

    /// Set orthographic extents
    pub fn with_ortho(mut self, ortho: OrthoBounds) -> Self {
        self.ortho = Some(ortho);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_drops_nan_bias() {
        let mut settings = ShadowSettings::point();
        settings.bias = f32::NAN;
        settings.normal_bias = f32::NAN;
        settings.validate();
        assert_eq!(settings.bias, 0.0);
        assert_eq!(settings.normal_bias, 0.0);
    }

    #[test]
    fn test_validate_clamps_map_size() {
        let mut settings = ShadowSettings {
            map_size: 100,
            ..Default::default()
        };
        settings.validate();
        assert_eq!(settings.map_size, MIN_SHADOW_MAP_SIZE);

        settings.map_size = 3000;
        settings.validate();
        assert_eq!(settings.map_size, 4096);

        settings.map_size = 100_000;
        settings.validate();
        assert_eq!(settings.map_size, MAX_SHADOW_MAP_SIZE);
    }

    #[test]
    fn test_validate_fixes_planes() {
        let mut settings = ShadowSettings {
            near: 5.0,
            far: 1.0,
            ..Default::default()
        };
        settings.validate();
        assert!(settings.far > settings.near);
    }

    #[test]
    fn test_apply_partial_options() {
        let mut settings = ShadowSettings::spot();
        settings.apply(&ShadowOptions::enabled(true).with_map_size(2048).with_planes(1.0, 50.0));

        assert!(settings.enabled);
        assert_eq!(settings.map_size, 2048);
        assert_eq!(settings.near, 1.0);
        assert_eq!(settings.far, 50.0);
        // Untouched fields keep their preset values
        assert_eq!(settings.bias, ShadowSettings::spot().bias);
    }
}
