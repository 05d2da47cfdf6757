//! Light manager configuration

use serde::{Deserialize, Serialize};

use crate::error::{LightError, Result};

/// Upper bound accepted for `max_lights`
pub const MAX_LIGHTS_LIMIT: usize = 1024;

/// Upper bound accepted for `max_shadow_maps`
pub const MAX_SHADOW_MAPS_LIMIT: usize = 64;

/// Named performance budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    /// 4 lights, no shadows
    Low,
    /// 8 lights, 1 shadow map
    Medium,
    /// 16 lights, 4 shadow maps
    High,
    /// Configured maxima
    #[default]
    Ultra,
}

impl BudgetTier {
    /// All tiers from cheapest to most expensive
    pub const ALL: [BudgetTier; 4] = [
        BudgetTier::Low,
        BudgetTier::Medium,
        BudgetTier::High,
        BudgetTier::Ultra,
    ];

    /// Tier caps as `(lights, shadow maps)`, `None` meaning uncapped
    pub fn caps(self) -> Option<(usize, usize)> {
        match self {
            BudgetTier::Low => Some((4, 0)),
            BudgetTier::Medium => Some((8, 1)),
            BudgetTier::High => Some((16, 4)),
            BudgetTier::Ultra => None,
        }
    }

    /// Tier name
    pub fn name(self) -> &'static str {
        match self {
            BudgetTier::Low => "low",
            BudgetTier::Medium => "medium",
            BudgetTier::High => "high",
            BudgetTier::Ultra => "ultra",
        }
    }
}

/// Which lights survive when the active set exceeds its cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep the first lights in registration order
    RegistrationOrder,
    /// Keep unbounded lights, then the closest to the camera
    #[default]
    NearestFirst,
    /// Keep last frame's shadow casters, then the closest to the camera
    ShadowCastersFirst,
}

/// Light manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightManagerConfig {
    /// Maximum simultaneously active lights
    pub max_lights: usize,

    /// Maximum simultaneously shadow-casting lights
    pub max_shadow_maps: usize,

    /// Global shadow switch
    pub shadow_enabled: bool,

    /// Drop bounded lights outside the view frustum
    pub frustum_culling: bool,

    /// Drop bounded lights farther than this from the camera
    pub culling_distance: Option<f32>,

    /// Policy for capping the active set
    pub eviction: EvictionPolicy,

    /// Initial performance budget
    pub budget_tier: BudgetTier,
}

impl Default for LightManagerConfig {
    fn default() -> Self {
        Self {
            max_lights: 16,
            max_shadow_maps: 4,
            shadow_enabled: true,
            frustum_culling: true,
            culling_distance: None,
            eviction: EvictionPolicy::default(),
            budget_tier: BudgetTier::default(),
        }
    }
}

impl LightManagerConfig {
    /// Configuration for constrained hardware
    pub fn low_end() -> Self {
        Self {
            max_lights: 8,
            max_shadow_maps: 1,
            culling_distance: Some(50.0),
            budget_tier: BudgetTier::Medium,
            ..Default::default()
        }
    }

    /// Configuration for desktop-class hardware
    pub fn high_end() -> Self {
        Self {
            max_lights: 64,
            max_shadow_maps: 8,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.validate();
        Ok(config)
    }

    /// Parse a JSON configuration, rejecting values outside accepted ranges
    pub fn from_json_strict(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        let mut validated = config.clone();
        validated.validate();
        if validated != config {
            return Err(LightError::InvalidConfig(format!(
                "values out of range: {}",
                json.trim()
            )));
        }
        Ok(config)
    }

    /// Clamp every option to its accepted range
    pub fn validate(&mut self) {
        self.max_lights = self.max_lights.clamp(1, MAX_LIGHTS_LIMIT);
        self.max_shadow_maps = self.max_shadow_maps.min(MAX_SHADOW_MAPS_LIMIT).min(self.max_lights);
        self.culling_distance = self
            .culling_distance
            .filter(|d| d.is_finite() && *d > 0.0);
    }

    /// Set the active light cap
    pub fn with_max_lights(mut self, max_lights: usize) -> Self {
        self.max_lights = max_lights;
        self.validate();
        self
    }

    /// Set the shadow map cap
    pub fn with_max_shadow_maps(mut self, max_shadow_maps: usize) -> Self {
        self.max_shadow_maps = max_shadow_maps;
        self.validate();
        self
    }

    /// Enable or disable shadows globally
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadow_enabled = enabled;
        self
    }

    /// Enable or disable frustum culling
    pub fn with_frustum_culling(mut self, enabled: bool) -> Self {
        self.frustum_culling = enabled;
        self
    }

    /// Set the culling distance
    pub fn with_culling_distance(mut self, distance: Option<f32>) -> Self {
        self.culling_distance = distance;
        self.validate();
        self
    }

    /// Set the eviction policy
    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Effective `(lights, shadow maps)` caps under `tier`
    pub fn caps_for(&self, tier: BudgetTier) -> (usize, usize) {
        let shadows = if self.shadow_enabled { self.max_shadow_maps } else { 0 };
        match tier.caps() {
            Some((lights, shadow_maps)) => (self.max_lights.min(lights), shadows.min(shadow_maps)),
            None => (self.max_lights, shadows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LightManagerConfig::default();
        assert_eq!(config.max_lights, 16);
        assert_eq!(config.max_shadow_maps, 4);
        assert!(config.shadow_enabled);
        assert!(config.frustum_culling);
        assert_eq!(config.eviction, EvictionPolicy::NearestFirst);
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = LightManagerConfig {
            max_lights: 0,
            max_shadow_maps: 500,
            culling_distance: Some(-1.0),
            ..Default::default()
        };
        config.validate();
        assert_eq!(config.max_lights, 1);
        assert_eq!(config.max_shadow_maps, 1);
        assert_eq!(config.culling_distance, None);
    }

    #[test]
    fn test_tier_caps() {
        let config = LightManagerConfig::default().with_max_lights(32).with_max_shadow_maps(6);
        assert_eq!(config.caps_for(BudgetTier::Low), (4, 0));
        assert_eq!(config.caps_for(BudgetTier::Medium), (8, 1));
        assert_eq!(config.caps_for(BudgetTier::High), (16, 4));
        assert_eq!(config.caps_for(BudgetTier::Ultra), (32, 6));

        let small = LightManagerConfig::default().with_max_lights(2).with_shadows(false);
        assert_eq!(small.caps_for(BudgetTier::High), (2, 0));
    }

    #[test]
    fn test_from_json() {
        let config = LightManagerConfig::from_json(
            r#"{ "max_lights": 8, "eviction": "shadow_casters_first", "budget_tier": "high" }"#,
        )
        .unwrap();
        assert_eq!(config.max_lights, 8);
        assert_eq!(config.max_shadow_maps, 4);
        assert_eq!(config.eviction, EvictionPolicy::ShadowCastersFirst);
        assert_eq!(config.budget_tier, BudgetTier::High);

        assert!(matches!(
            LightManagerConfig::from_json("{ not json"),
            Err(LightError::Serialization(_))
        ));
        assert!(matches!(
            LightManagerConfig::from_json_strict(r#"{ "max_lights": 0 }"#),
            Err(LightError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_presets_are_valid() {
        for preset in [
            LightManagerConfig::default(),
            LightManagerConfig::low_end(),
            LightManagerConfig::high_end(),
        ] {
            let mut validated = preset.clone();
            validated.validate();
            assert_eq!(validated, preset);
        }
    }
}
