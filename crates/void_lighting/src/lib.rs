//! Void Lighting - Light Sources, Groups and Shader Uniforms
//!
//! Illumination for the Void Engine renderer. Lights are plain data with
//! CPU-side shading math that mirrors the generated WGSL, so contributions
//! can be evaluated and tested without a GPU.
//!
//! # Features
//!
//! - Ambient, directional, point, spot and hemisphere lights
//! - Dirty tracking with lazily rebuilt uniform tables and shadow matrices
//! - Hierarchical light groups with cached per-type queries
//! - Frame budgeting: frustum and distance culling, light and shadow caps
//! - GPU-ready Pod structs and a WGSL template per light capacity
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  LightManager                    │
//! │  ┌─────────────┐  ┌──────────┐  ┌────────────┐  │
//! │  │ LightGraph  │  │ Frustum  │  │ LightStats │  │
//! │  │ (groups +   │  │ culling  │  │ + events   │  │
//! │  │  lights)    │  │          │  │            │  │
//! │  └─────────────┘  └──────────┘  └────────────┘  │
//! └─────────────────────────────────────────────────┘
//!                        │ active lights
//!                        ▼
//!                 ┌──────────────┐
//!                 │LightUniforms │──▶ Pod buckets + ShaderTemplate
//!                 └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_lighting::prelude::*;
//!
//! let mut manager = LightManager::new(LightManagerConfig::default());
//! let sun = manager.add_light(Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0))?;
//! let lamp = manager.add_light(Light::point(Vec3::new(0.0, 2.0, 0.0), Vec3::ONE, 2.0, 10.0, 2.0))?;
//!
//! manager.update(1.0 / 60.0, &CameraView::at(Vec3::new(0.0, 1.0, 5.0)));
//!
//! let mut uniforms = LightUniforms::new(16);
//! manager.sync_uniforms(&mut uniforms);
//! ```

pub mod buffer;
pub mod culling;
pub mod error;
pub mod graph;
pub mod group;
pub mod id;
pub mod light;
pub mod manager;
pub mod shader;
pub mod shadow;
pub mod uniform;

pub use buffer::{
    GpuAmbientLight, GpuDirectionalLight, GpuHemisphereLight, GpuPointLight, GpuSpotLight,
    LightCounts, LightUniforms,
};
pub use culling::{BoundingSphere, Containment, Frustum, Plane};
pub use error::{LightError, Result};
pub use graph::LightGraph;
pub use group::{GroupCache, GroupTransform, LightGroup};
pub use id::{GroupId, LightId, ShadowMapHandle};
pub use light::{
    Contribution, FragmentData, Light, LightKind, LightOptions, LightRecord, LightType,
};
pub use manager::{
    BudgetTier, CameraView, EvictionPolicy, LightEvent, LightManager, LightManagerConfig,
    LightStats,
};
pub use shader::ShaderTemplate;
pub use shadow::{ShadowOptions, ShadowProjection, ShadowSettings};
pub use uniform::{UniformSlot, UniformTable, UniformValue};

pub use glam::{Mat4, Quat, Vec3};

pub mod prelude {
    //! Common imports for lighting
    pub use crate::buffer::LightUniforms;
    pub use crate::culling::Frustum;
    pub use crate::error::{LightError, Result};
    pub use crate::group::GroupTransform;
    pub use crate::id::{GroupId, LightId, ShadowMapHandle};
    pub use crate::light::{
        DistanceFalloff, FragmentData, Light, LightAnimation, LightOptions, LightType,
    };
    pub use crate::manager::{
        BudgetTier, CameraView, EvictionPolicy, LightEvent, LightManager, LightManagerConfig,
    };
    pub use crate::shadow::ShadowOptions;
    pub use glam::{Mat4, Vec3};
}
