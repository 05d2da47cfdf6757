//! Per-light animation state advanced by `Light::update`

use core::f32::consts::TAU;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Simple procedural animation applied to a light each frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum LightAnimation {
    /// Static light
    #[default]
    None,
    /// Sinusoidal intensity modulation
    Pulse {
        /// Cycles per second
        frequency: f32,
        /// Relative swing around the base intensity (0..1)
        amplitude: f32,
    },
    /// Circular motion in the XZ plane around `center`
    Orbit {
        /// Orbit center (its Y is kept)
        center: Vec3,
        /// Orbit radius
        radius: f32,
        /// Angular speed in radians per second
        speed: f32,
    },
}

/// Animation output for a point in time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSample {
    /// Multiplier applied on top of the configured intensity
    pub intensity_scale: f32,
    /// New world position, if the animation moves the light
    pub position: Option<Vec3>,
}

impl LightAnimation {
    /// Whether this animation changes anything over time
    pub fn is_animated(&self) -> bool {
        !matches!(self, LightAnimation::None)
    }

    /// Evaluate the animation `elapsed` seconds after it started
    pub fn sample(&self, elapsed: f32) -> AnimationSample {
        match *self {
            LightAnimation::None => AnimationSample {
                intensity_scale: 1.0,
                position: None,
            },
            LightAnimation::Pulse { frequency, amplitude } => {
                let amplitude = amplitude.clamp(0.0, 1.0);
                AnimationSample {
                    intensity_scale: (1.0 + amplitude * (TAU * frequency * elapsed).sin()).max(0.0),
                    position: None,
                }
            }
            LightAnimation::Orbit { center, radius, speed } => {
                let (sin, cos) = (speed * elapsed).sin_cos();
                AnimationSample {
                    intensity_scale: 1.0,
                    position: Some(center + Vec3::new(cos * radius, 0.0, sin * radius)),
                }
            }
        }
    }
}
