//! GPU light uniforms
//!
//! Collects the visible lights of a frame into per-type buckets:
//! - GPU-ready light data structures (Pod/Zeroable) matching the WGSL
//!   structs in [`crate::shader`]
//! - Named uniform slots (`point_color[0]`, `num_point_lights`, ...)
//! - Per-bucket capacity enforcement with overflow counting
//!
//! This is backend-agnostic; buffer creation and upload belong to the
//! render backend.

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::light::{Light, LightType};
use crate::shader::ShaderTemplate;
use crate::uniform::{UniformSlot, UniformTable, UniformValue};

/// GPU-ready ambient light data
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuAmbientLight {
    /// Light color (linear RGB)
    pub color: [f32; 3],
    /// Effective intensity
    pub intensity: f32,
}

impl GpuAmbientLight {
    /// Size in bytes
    pub const SIZE: usize = core::mem::size_of::<Self>();
}

/// GPU-ready directional light data
///
/// Matches shader struct layout with proper alignment.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuDirectionalLight {
    /// Light position, the origin of distance falloff
    pub position: [f32; 3],
    /// Non-zero when distance falloff is enabled
    pub has_falloff: u32,
    /// Light direction (normalized, world space)
    pub direction: [f32; 3],
    /// Falloff distance scale
    pub half_life: f32,
    /// Light color (linear RGB)
    pub color: [f32; 3],
    /// Effective intensity
    pub intensity: f32,
    /// Shadow view-projection matrix (4x4 column-major)
    pub shadow_matrix: [[f32; 4]; 4],
    /// Falloff cutoff (0 = unbounded)
    pub max_distance: f32,
    /// Shadow depth bias
    pub shadow_bias: f32,
    /// Non-zero when a shadow projection is live
    pub cast_shadow: u32,
    /// Shadow map array index (-1 if no shadows)
    pub shadow_map_index: i32,
}

impl GpuDirectionalLight {
    /// Size in bytes (must be 16-byte aligned)
    pub const SIZE: usize = core::mem::size_of::<Self>();
}

/// GPU-ready point light data
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuPointLight {
    /// World position
    pub position: [f32; 3],
    /// Cutoff distance (0 = unbounded)
    pub distance: f32,
    /// Light color (linear RGB)
    pub color: [f32; 3],
    /// Effective intensity
    pub intensity: f32,
    /// Attenuation coefficients [constant, linear, quadratic]
    pub attenuation: [f32; 3],
    /// Decay exponent
    pub decay: f32,
    /// Shadow depth bias
    pub shadow_bias: f32,
    /// Shadow camera near plane
    pub shadow_near: f32,
    /// Shadow camera far plane
    pub shadow_far: f32,
    /// Shadow cubemap index (-1 if no shadows)
    pub shadow_map_index: i32,
    /// Non-zero when a shadow projection is live
    pub cast_shadow: u32,
    /// Padding
    pub _pad: [u32; 3],
}

impl GpuPointLight {
    /// Size in bytes
    pub const SIZE: usize = core::mem::size_of::<Self>();
}

/// GPU-ready spot light data
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuSpotLight {
    /// World position
    pub position: [f32; 3],
    /// Cutoff distance (0 = unbounded)
    pub distance: f32,
    /// Light direction (normalized)
    pub direction: [f32; 3],
    /// Cosine of the outer cone angle
    pub cos_angle: f32,
    /// Light color (linear RGB)
    pub color: [f32; 3],
    /// Cosine of the inner (full intensity) cone angle
    pub cos_inner: f32,
    /// Attenuation coefficients [constant, linear, quadratic]
    pub attenuation: [f32; 3],
    /// Decay exponent
    pub decay: f32,
    /// Shadow view-projection matrix
    pub shadow_matrix: [[f32; 4]; 4],
    /// Effective intensity
    pub intensity: f32,
    /// Shadow depth bias
    pub shadow_bias: f32,
    /// Non-zero when a shadow projection is live
    pub cast_shadow: u32,
    /// Shadow map index (-1 if no shadows)
    pub shadow_map_index: i32,
}

impl GpuSpotLight {
    /// Size in bytes
    pub const SIZE: usize = core::mem::size_of::<Self>();
}

/// GPU-ready hemisphere light data
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuHemisphereLight {
    /// Sky color (linear RGB)
    pub sky_color: [f32; 3],
    /// Effective intensity
    pub intensity: f32,
    /// Ground color (linear RGB)
    pub ground_color: [f32; 3],
    /// Padding
    pub _pad0: f32,
    /// Up axis the gradient follows
    pub direction: [f32; 3],
    /// Padding
    pub _pad1: f32,
}

impl GpuHemisphereLight {
    /// Size in bytes
    pub const SIZE: usize = core::mem::size_of::<Self>();
}

/// Light counts for shader uniform
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightCounts {
    /// Number of ambient lights
    pub ambient: u32,
    /// Number of directional lights
    pub directional: u32,
    /// Number of point lights
    pub point: u32,
    /// Number of spot lights
    pub spot: u32,
    /// Number of hemisphere lights
    pub hemisphere: u32,
    /// Padding
    pub _pad: [u32; 3],
}

impl LightCounts {
    /// Count for one light type
    pub fn of(&self, light_type: LightType) -> u32 {
        match light_type {
            LightType::Ambient => self.ambient,
            LightType::Directional => self.directional,
            LightType::Point => self.point,
            LightType::Spot => self.spot,
            LightType::Hemisphere => self.hemisphere,
        }
    }
}

fn shadow_map_index(light: &Light) -> i32 {
    light
        .shadow_map()
        .and_then(|handle| i32::try_from(handle.0).ok())
        .unwrap_or(-1)
}

fn shadow_matrix(light: &Light) -> [[f32; 4]; 4] {
    light.shadow_matrix().unwrap_or(Mat4::IDENTITY).to_cols_array_2d()
}

fn extract_ambient(light: &Light) -> GpuAmbientLight {
    GpuAmbientLight {
        color: light.color().to_array(),
        intensity: light.effective_intensity(),
    }
}

fn extract_directional(light: &Light) -> Option<GpuDirectionalLight> {
    let directional = light.as_directional()?;
    let falloff = directional.falloff();
    Some(GpuDirectionalLight {
        position: light.position().to_array(),
        has_falloff: falloff.is_some() as u32,
        direction: directional.direction().to_array(),
        half_life: falloff.map_or(1.0, |f| f.half_life),
        color: light.color().to_array(),
        intensity: light.effective_intensity(),
        shadow_matrix: shadow_matrix(light),
        max_distance: falloff.map_or(0.0, |f| f.max_distance),
        shadow_bias: light.shadow().bias,
        cast_shadow: light.shadow_projection().is_some() as u32,
        shadow_map_index: shadow_map_index(light),
    })
}

fn extract_point(light: &Light) -> Option<GpuPointLight> {
    let attenuation = light.as_point()?.attenuation();
    let shadow = light.shadow();
    Some(GpuPointLight {
        position: light.position().to_array(),
        distance: attenuation.distance,
        color: light.color().to_array(),
        intensity: light.effective_intensity(),
        attenuation: [attenuation.constant, attenuation.linear, attenuation.quadratic],
        decay: attenuation.decay,
        shadow_bias: shadow.bias,
        shadow_near: shadow.near,
        shadow_far: shadow.far,
        shadow_map_index: shadow_map_index(light),
        cast_shadow: light.shadow_projection().is_some() as u32,
        _pad: [0; 3],
    })
}

fn extract_spot(light: &Light) -> Option<GpuSpotLight> {
    let spot = light.as_spot()?;
    let attenuation = spot.point().attenuation();
    Some(GpuSpotLight {
        position: light.position().to_array(),
        distance: attenuation.distance,
        direction: spot.direction().to_array(),
        cos_angle: spot.cos_angle(),
        color: light.color().to_array(),
        cos_inner: spot.cos_inner(),
        attenuation: [attenuation.constant, attenuation.linear, attenuation.quadratic],
        decay: attenuation.decay,
        shadow_matrix: shadow_matrix(light),
        intensity: light.effective_intensity(),
        shadow_bias: light.shadow().bias,
        cast_shadow: light.shadow_projection().is_some() as u32,
        shadow_map_index: shadow_map_index(light),
    })
}

fn extract_hemisphere(light: &Light) -> Option<GpuHemisphereLight> {
    let hemisphere = light.as_hemisphere()?;
    Some(GpuHemisphereLight {
        sky_color: light.color().to_array(),
        intensity: light.effective_intensity(),
        ground_color: hemisphere.ground_color().to_array(),
        _pad0: 0.0,
        direction: light.up().to_array(),
        _pad1: 0.0,
    })
}

/// CPU-side light uniforms for one frame
///
/// Every bucket holds at most `max_lights` entries; lights beyond that are
/// dropped and counted in [`LightUniforms::overflow_count`].
#[derive(Clone, Debug)]
pub struct LightUniforms {
    max_lights: usize,
    /// Ambient lights
    pub ambient_lights: Vec<GpuAmbientLight>,
    /// Directional lights
    pub directional_lights: Vec<GpuDirectionalLight>,
    /// Point lights
    pub point_lights: Vec<GpuPointLight>,
    /// Spot lights
    pub spot_lights: Vec<GpuSpotLight>,
    /// Hemisphere lights
    pub hemisphere_lights: Vec<GpuHemisphereLight>,
    tables: [Vec<UniformTable>; LightType::COUNT],
    slots: Vec<UniformSlot>,
    overflow_count: u32,
    total_overflow: u64,
    updates: u64,
    template: ShaderTemplate,
}

impl LightUniforms {
    /// Create uniforms holding up to `max_lights` lights per type
    pub fn new(max_lights: usize) -> Self {
        let max_lights = max_lights.max(1);
        Self {
            max_lights,
            ambient_lights: Vec::with_capacity(max_lights),
            directional_lights: Vec::with_capacity(max_lights),
            point_lights: Vec::with_capacity(max_lights),
            spot_lights: Vec::with_capacity(max_lights),
            hemisphere_lights: Vec::with_capacity(max_lights),
            tables: Default::default(),
            slots: Vec::new(),
            overflow_count: 0,
            total_overflow: 0,
            updates: 0,
            template: ShaderTemplate::new(max_lights),
        }
    }

    /// Clear all buckets
    pub fn clear(&mut self) {
        self.ambient_lights.clear();
        self.directional_lights.clear();
        self.point_lights.clear();
        self.spot_lights.clear();
        self.hemisphere_lights.clear();
        for table in &mut self.tables {
            table.clear();
        }
        self.slots.clear();
        self.overflow_count = 0;
    }

    /// Rebuild every bucket from `lights`
    ///
    /// Invisible and disposed lights are skipped.
    pub fn update_from_lights<'a, I>(&mut self, lights: I)
    where
        I: IntoIterator<Item = &'a Light>,
    {
        self.clear();
        self.updates += 1;

        for light in lights {
            if light.is_disposed() || !light.is_visible() {
                continue;
            }
            if !self.push(light) {
                self.overflow_count += 1;
            }
        }

        if self.overflow_count > 0 {
            self.total_overflow += u64::from(self.overflow_count);
            log::warn!(
                "Light uniforms full ({} per type): dropped {} lights",
                self.max_lights,
                self.overflow_count
            );
        }

        self.rebuild_slots();
    }

    /// Add one light to its bucket; false if the bucket is full
    fn push(&mut self, light: &Light) -> bool {
        let light_type = light.light_type();
        if self.tables[light_type.index()].len() >= self.max_lights {
            return false;
        }

        let pushed = match light_type {
            LightType::Ambient => {
                self.ambient_lights.push(extract_ambient(light));
                true
            }
            LightType::Directional => extract_directional(light)
                .map(|gpu| self.directional_lights.push(gpu))
                .is_some(),
            LightType::Point => extract_point(light).map(|gpu| self.point_lights.push(gpu)).is_some(),
            LightType::Spot => extract_spot(light).map(|gpu| self.spot_lights.push(gpu)).is_some(),
            LightType::Hemisphere => extract_hemisphere(light)
                .map(|gpu| self.hemisphere_lights.push(gpu))
                .is_some(),
        };

        if pushed {
            self.tables[light_type.index()].push(light.uniform_table());
        }
        pushed
    }

    fn rebuild_slots(&mut self) {
        for light_type in LightType::ALL {
            let tables = &self.tables[light_type.index()];
            for (index, table) in tables.iter().enumerate() {
                for slot in table.slots() {
                    self.slots.push(UniformSlot {
                        name: format!("{}[{}]", slot.name, index),
                        value: slot.value,
                    });
                }
            }
            self.slots.push(UniformSlot {
                name: format!("num_{}_lights", light_type.name()),
                value: UniformValue::Int(tables.len() as i32),
            });
        }
    }

    /// Flattened named uniforms of the last update
    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    /// Look up one flattened uniform, e.g. `point_color[0]`
    pub fn slot(&self, name: &str) -> Option<&UniformValue> {
        self.slots.iter().find(|slot| slot.name == name).map(|slot| &slot.value)
    }

    /// Named tables of one bucket, in bucket order
    pub fn tables(&self, light_type: LightType) -> &[UniformTable] {
        &self.tables[light_type.index()]
    }

    /// Get light counts for shader
    pub fn counts(&self) -> LightCounts {
        LightCounts {
            ambient: self.ambient_lights.len() as u32,
            directional: self.directional_lights.len() as u32,
            point: self.point_lights.len() as u32,
            spot: self.spot_lights.len() as u32,
            hemisphere: self.hemisphere_lights.len() as u32,
            _pad: [0; 3],
        }
    }

    /// Light counts as bytes for GPU upload
    pub fn counts_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(&self.counts()).to_vec()
    }

    /// Ambient lights as bytes for GPU upload
    pub fn ambient_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.ambient_lights)
    }

    /// Directional lights as bytes for GPU upload
    pub fn directional_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.directional_lights)
    }

    /// Point lights as bytes for GPU upload
    pub fn point_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.point_lights)
    }

    /// Spot lights as bytes for GPU upload
    pub fn spot_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.spot_lights)
    }

    /// Hemisphere lights as bytes for GPU upload
    pub fn hemisphere_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.hemisphere_lights)
    }

    /// Lights dropped by the last update
    pub fn overflow_count(&self) -> u32 {
        self.overflow_count
    }

    /// Lights dropped over all updates
    pub fn total_overflow(&self) -> u64 {
        self.total_overflow
    }

    /// Number of updates so far
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Per-type capacity
    pub fn capacity(&self) -> usize {
        self.max_lights
    }

    /// Get total light count
    pub fn total_lights(&self) -> usize {
        self.tables.iter().map(Vec::len).sum()
    }

    /// Check if any bucket holds a light
    pub fn has_lights(&self) -> bool {
        self.total_lights() > 0
    }

    /// WGSL source sized for this capacity
    pub fn shader_template(&self) -> &ShaderTemplate {
        &self.template
    }
}

impl Default for LightUniforms {
    fn default() -> Self {
        Self::new(crate::manager::LightManagerConfig::default().max_lights)
    }
}
