//! Light manager statistics

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::light::LightType;

use super::config::BudgetTier;

/// Counters from the last frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightStats {
    /// Frames updated so far
    pub frame: u64,
    /// Registered lights
    pub total_lights: usize,
    /// Lights reachable through visible, enabled groups
    pub visible_lights: usize,
    /// Lights removed by frustum or distance culling
    pub culled_lights: usize,
    /// Lights dropped by the light cap
    pub evicted_lights: usize,
    /// Shadow casters dropped by the shadow cap
    pub evicted_shadow_casters: usize,
    /// Lights in the active set
    pub active_lights: usize,
    /// Shadow-casting lights in the active set
    pub shadow_casters: usize,
    /// Active lights per type, indexed by [`LightType::index`]
    pub active_by_type: [usize; LightType::COUNT],
    /// Groups in the arena, including tombstones
    pub groups: usize,
    /// Budget tier in effect
    pub tier: BudgetTier,
    /// Duration of the last update
    pub last_update: Duration,
    /// Exponential moving average of update duration
    pub average_update: Duration,
}

impl LightStats {
    /// Active lights of one type
    pub fn active_of(&self, light_type: LightType) -> usize {
        self.active_by_type[light_type.index()]
    }

    /// Last update time in milliseconds
    pub fn last_update_ms(&self) -> f64 {
        self.last_update.as_secs_f64() * 1000.0
    }

    pub(crate) fn record_timing(&mut self, elapsed: Duration) {
        self.last_update = elapsed;
        self.average_update = if self.frame <= 1 {
            elapsed
        } else {
            // 0.9 / 0.1 smoothing
            self.average_update.mul_f64(0.9) + elapsed.mul_f64(0.1)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_average() {
        let mut stats = LightStats {
            frame: 1,
            ..Default::default()
        };
        stats.record_timing(Duration::from_millis(10));
        assert_eq!(stats.average_update, Duration::from_millis(10));

        stats.frame = 2;
        stats.record_timing(Duration::from_millis(20));
        assert_eq!(stats.last_update, Duration::from_millis(20));
        let average = stats.average_update.as_secs_f64() * 1000.0;
        assert!((average - 11.0).abs() < 1e-6);
        assert!((stats.last_update_ms() - 20.0).abs() < 1e-9);
    }
}
