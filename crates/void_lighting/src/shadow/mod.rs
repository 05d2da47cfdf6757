//! Shadow configuration and projection
//!
//! The lighting crate only decides *which* lights cast shadows and builds
//! their view/projection matrices. Depth rendering and sampling belong to the
//! render backend, which hands back an opaque
//! [`ShadowMapHandle`](crate::id::ShadowMapHandle) per shadow map.
//!
//! - **Config**: per-light shadow settings and partial updates
//! - **Projection**: orthographic, cube and perspective shadow cameras

pub mod config;
pub mod projection;

pub use config::{OrthoBounds, ShadowOptions, ShadowSettings};
pub use projection::{ShadowCamera, ShadowProjection, CUBE_FACE_DIRECTIONS};
