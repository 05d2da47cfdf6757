//! WGSL shader templates
//!
//! The fragment template declares structs matching the `#[repr(C)]` layouts
//! in [`crate::buffer`] and one evaluation function per light type that
//! mirrors [`Light::calculate_contribution`](crate::light::Light::calculate_contribution).
//! The only parameter is `MAX_LIGHTS`, baked in at construction.

use serde::{Deserialize, Serialize};

use crate::light::LightType;

/// Bind group holding the light buffers
pub const LIGHT_BIND_GROUP: u32 = 1;

const CAMERA: &str = r#"
struct CameraUniforms {
    view_projection: mat4x4<f32>,
    position: vec3<f32>,
    _pad0: f32,
};

@group(0) @binding(0)
var<uniform> camera: CameraUniforms;
"#;

const VERTEX: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_projection * vec4<f32>(in.position, 1.0);
    out.world_position = in.position;
    out.normal = in.normal;
    return out;
}
"#;

const STRUCTS: &str = r#"
struct LightCounts {
    ambient: u32,
    directional: u32,
    point: u32,
    spot: u32,
    hemisphere: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

struct AmbientLight {
    color: vec3<f32>,
    intensity: f32,
};

struct DirectionalLight {
    position: vec3<f32>,
    has_falloff: u32,
    direction: vec3<f32>,
    half_life: f32,
    color: vec3<f32>,
    intensity: f32,
    shadow_matrix: mat4x4<f32>,
    max_distance: f32,
    shadow_bias: f32,
    cast_shadow: u32,
    shadow_map_index: i32,
};

struct PointLight {
    position: vec3<f32>,
    distance: f32,
    color: vec3<f32>,
    intensity: f32,
    coefficients: vec3<f32>,
    decay: f32,
    shadow_bias: f32,
    shadow_near: f32,
    shadow_far: f32,
    shadow_map_index: i32,
    cast_shadow: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

struct SpotLight {
    position: vec3<f32>,
    distance: f32,
    direction: vec3<f32>,
    cos_angle: f32,
    color: vec3<f32>,
    cos_inner: f32,
    coefficients: vec3<f32>,
    decay: f32,
    shadow_matrix: mat4x4<f32>,
    intensity: f32,
    shadow_bias: f32,
    cast_shadow: u32,
    shadow_map_index: i32,
};

struct HemisphereLight {
    sky_color: vec3<f32>,
    intensity: f32,
    ground_color: vec3<f32>,
    _pad0: f32,
    direction: vec3<f32>,
    _pad1: f32,
};

struct LightContribution {
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    ambient: vec3<f32>,
    attenuation: f32,
};
"#;

const COMMON: &str = r#"
const SPECULAR_SHININESS: f32 = 32.0;
const AMBIENT_FRACTION: f32 = 0.05;

fn zero_contribution() -> LightContribution {
    var out: LightContribution;
    out.diffuse = vec3<f32>(0.0);
    out.specular = vec3<f32>(0.0);
    out.ambient = vec3<f32>(0.0);
    out.attenuation = 0.0;
    return out;
}

fn blinn_phong(radiance: vec3<f32>, to_light: vec3<f32>, normal: vec3<f32>, to_view: vec3<f32>, attenuation: f32) -> LightContribution {
    var out = zero_contribution();
    let n_dot_l = max(dot(normal, to_light), 0.0);
    let weighted = radiance * attenuation;
    out.diffuse = weighted * n_dot_l;
    if (n_dot_l > 0.0) {
        let half_dir = normalize(to_light + to_view);
        out.specular = weighted * pow(max(dot(normal, half_dir), 0.0), SPECULAR_SHININESS);
    }
    out.ambient = weighted * AMBIENT_FRACTION;
    out.attenuation = attenuation;
    return out;
}

fn distance_attenuation(d: f32, distance_limit: f32, decay: f32, coefficients: vec3<f32>) -> f32 {
    if (distance_limit > 0.0 && d > distance_limit) {
        return 0.0;
    }
    let denominator = coefficients.x + coefficients.y * d + coefficients.z * d * d * decay;
    var raw = 1.0;
    if (denominator > 1.1920929e-7) {
        raw = 1.0 / denominator;
    }
    if (distance_limit > 0.0) {
        raw = raw * exp(-d / (distance_limit * 0.5));
    }
    return clamp(raw, 0.0, 1.0);
}
"#;

const AMBIENT_FN: &str = r#"
fn evaluate_ambient_light(light: AmbientLight) -> LightContribution {
    var out = zero_contribution();
    out.ambient = light.color * light.intensity;
    out.attenuation = 1.0;
    return out;
}
"#;

const DIRECTIONAL_FN: &str = r#"
fn evaluate_directional_light(light: DirectionalLight, position: vec3<f32>, normal: vec3<f32>, to_view: vec3<f32>) -> LightContribution {
    var attenuation = 1.0;
    if (light.has_falloff != 0u) {
        let d = distance(light.position, position);
        if (light.max_distance > 0.0 && d > light.max_distance) {
            return zero_contribution();
        }
        attenuation = clamp(exp(-d / light.half_life), 0.0, 1.0);
    }
    return blinn_phong(light.color * light.intensity, -light.direction, normal, to_view, attenuation);
}
"#;

const POINT_FN: &str = r#"
fn evaluate_point_light(light: PointLight, position: vec3<f32>, normal: vec3<f32>, to_view: vec3<f32>) -> LightContribution {
    let to_light = light.position - position;
    let attenuation = distance_attenuation(length(to_light), light.distance, light.decay, light.coefficients);
    if (attenuation <= 0.0) {
        return zero_contribution();
    }
    return blinn_phong(light.color * light.intensity, normalize(to_light), normal, to_view, attenuation);
}
"#;

const SPOT_FN: &str = r#"
fn evaluate_spot_light(light: SpotLight, position: vec3<f32>, normal: vec3<f32>, to_view: vec3<f32>) -> LightContribution {
    let to_light = light.position - position;
    let l = normalize(to_light);
    let cos_theta = dot(-l, light.direction);
    if (cos_theta < light.cos_angle) {
        return zero_contribution();
    }
    let theta = acos(clamp(cos_theta, -1.0, 1.0));
    let outer = acos(light.cos_angle);
    let inner = acos(light.cos_inner);
    var angular = 1.0;
    if (theta > inner) {
        angular = clamp((outer - theta) / max(outer - inner, 1e-6), 0.0, 1.0);
    }
    let attenuation = distance_attenuation(length(to_light), light.distance, light.decay, light.coefficients) * angular;
    if (attenuation <= 0.0) {
        return zero_contribution();
    }
    return blinn_phong(light.color * light.intensity, l, normal, to_view, attenuation);
}
"#;

const HEMISPHERE_FN: &str = r#"
fn evaluate_hemisphere_light(light: HemisphereLight, normal: vec3<f32>) -> LightContribution {
    var out = zero_contribution();
    let weight = 0.5 * dot(normal, light.direction) + 0.5;
    out.ambient = mix(light.ground_color, light.sky_color, weight) * light.intensity;
    out.attenuation = 1.0;
    return out;
}
"#;

const BINDINGS: &str = r#"
@group(1) @binding(0)
var<uniform> light_counts: LightCounts;
@group(1) @binding(1)
var<uniform> ambient_lights: array<AmbientLight, MAX_LIGHTS>;
@group(1) @binding(2)
var<uniform> directional_lights: array<DirectionalLight, MAX_LIGHTS>;
@group(1) @binding(3)
var<uniform> point_lights: array<PointLight, MAX_LIGHTS>;
@group(1) @binding(4)
var<uniform> spot_lights: array<SpotLight, MAX_LIGHTS>;
@group(1) @binding(5)
var<uniform> hemisphere_lights: array<HemisphereLight, MAX_LIGHTS>;
"#;

const FRAGMENT_MAIN: &str = r#"
struct FragmentInput {
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

fn accumulate(total: vec3<f32>, c: LightContribution) -> vec3<f32> {
    return total + c.diffuse + c.specular + c.ambient;
}

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    let normal = normalize(in.normal);
    let to_view = normalize(camera.position - in.world_position);
    var color = vec3<f32>(0.0);

    for (var i = 0u; i < min(light_counts.ambient, MAX_LIGHTS); i = i + 1u) {
        color = accumulate(color, evaluate_ambient_light(ambient_lights[i]));
    }
    for (var i = 0u; i < min(light_counts.directional, MAX_LIGHTS); i = i + 1u) {
        color = accumulate(color, evaluate_directional_light(directional_lights[i], in.world_position, normal, to_view));
    }
    for (var i = 0u; i < min(light_counts.point, MAX_LIGHTS); i = i + 1u) {
        color = accumulate(color, evaluate_point_light(point_lights[i], in.world_position, normal, to_view));
    }
    for (var i = 0u; i < min(light_counts.spot, MAX_LIGHTS); i = i + 1u) {
        color = accumulate(color, evaluate_spot_light(spot_lights[i], in.world_position, normal, to_view));
    }
    for (var i = 0u; i < min(light_counts.hemisphere, MAX_LIGHTS); i = i + 1u) {
        color = accumulate(color, evaluate_hemisphere_light(hemisphere_lights[i], normal));
    }
    return vec4<f32>(color, 1.0);
}
"#;

/// WGSL evaluation function for one light type
pub fn light_function(light_type: LightType) -> &'static str {
    match light_type {
        LightType::Ambient => AMBIENT_FN,
        LightType::Directional => DIRECTIONAL_FN,
        LightType::Point => POINT_FN,
        LightType::Spot => SPOT_FN,
        LightType::Hemisphere => HEMISPHERE_FN,
    }
}

/// Name of the WGSL evaluation function for one light type
pub fn light_function_name(light_type: LightType) -> String {
    format!("evaluate_{}_light", light_type.name())
}

impl LightType {
    /// WGSL evaluation function for this type
    pub fn shader_function(self) -> &'static str {
        light_function(self)
    }
}

/// Vertex and fragment source for forward lighting
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderTemplate {
    /// Light capacity baked into the source
    pub max_lights: usize,
    /// Vertex stage
    pub vertex: String,
    /// Fragment stage
    pub fragment: String,
}

impl ShaderTemplate {
    /// Build the template for `max_lights` lights per type
    pub fn new(max_lights: usize) -> Self {
        let header = format!("const MAX_LIGHTS: u32 = {}u;\n", max_lights.max(1));

        let vertex = [CAMERA, VERTEX].concat();

        let mut fragment = header;
        for part in [CAMERA, STRUCTS, COMMON] {
            fragment.push_str(part);
        }
        for light_type in LightType::ALL {
            fragment.push_str(light_function(light_type));
        }
        fragment.push_str(BINDINGS);
        fragment.push_str(FRAGMENT_MAIN);

        Self {
            max_lights,
            vertex,
            fragment,
        }
    }
}
