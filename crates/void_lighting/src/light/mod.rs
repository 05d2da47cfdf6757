//! Light sources
//!
//! Every light is a [`Light`]: shared state (identity, transform, color,
//! intensity, shadow settings, caches) plus a closed [`LightKind`] variant
//! carrying the type-specific parameters and math.
//!
//! # Dirty tracking
//!
//! Every setter marks the light dirty. The uniform table is rebuilt lazily by
//! [`Light::shader_uniforms`], and shadow matrices are rebuilt by
//! [`Light::update`] only when the light changed since the last build.
//!
//! # Disposal
//!
//! [`Light::dispose`] releases the attached shadow map handle exactly once.
//! Any setter called afterwards returns [`LightError::LightDisposed`].

pub mod ambient;
pub mod animation;
pub mod directional;
pub mod hemisphere;
pub mod point;
pub mod spot;

pub use ambient::AmbientLight;
pub use animation::{AnimationSample, LightAnimation};
pub use directional::{DirectionalLight, DistanceFalloff};
pub use hemisphere::HemisphereLight;
pub use point::{Attenuation, PointLight, MIN_DECAY};
pub use spot::{SpotAttenuation, SpotLight, MAX_SPOT_ANGLE};

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{LightError, Result};
use crate::id::{GroupId, LightId, ShadowMapHandle};
use crate::shadow::{ShadowOptions, ShadowProjection, ShadowSettings};
use crate::uniform::UniformTable;

/// Blinn-Phong specular exponent
pub const SPECULAR_SHININESS: f32 = 32.0;

/// Ambient share of the attenuated diffuse weight for direct lights
pub const AMBIENT_FRACTION: f32 = 0.05;

/// Light type tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LightType {
    /// Constant additive term
    Ambient,
    /// Source at infinity
    Directional,
    /// Omnidirectional source
    Point,
    /// Cone-restricted source
    Spot,
    /// Sky/ground gradient
    Hemisphere,
}

impl LightType {
    /// Number of light types
    pub const COUNT: usize = 5;

    /// All light types in bucket order
    pub const ALL: [LightType; Self::COUNT] = [
        LightType::Ambient,
        LightType::Directional,
        LightType::Point,
        LightType::Spot,
        LightType::Hemisphere,
    ];

    /// Dense index in `0..COUNT`
    pub const fn index(self) -> usize {
        match self {
            LightType::Ambient => 0,
            LightType::Directional => 1,
            LightType::Point => 2,
            LightType::Spot => 3,
            LightType::Hemisphere => 4,
        }
    }

    /// Uniform name prefix
    pub const fn name(self) -> &'static str {
        match self {
            LightType::Ambient => "ambient",
            LightType::Directional => "directional",
            LightType::Point => "point",
            LightType::Spot => "spot",
            LightType::Hemisphere => "hemisphere",
        }
    }

    /// Whether lights of this type can cast shadows
    pub const fn supports_shadows(self) -> bool {
        matches!(self, LightType::Directional | LightType::Point | LightType::Spot)
    }

    /// Whether lights of this type have a bounded region of influence
    pub const fn is_positional(self) -> bool {
        matches!(self, LightType::Point | LightType::Spot)
    }
}

/// Surface sample evaluated by [`Light::calculate_contribution`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentData {
    /// World-space fragment position
    pub position: Vec3,
    /// Surface normal (normalized on use)
    pub normal: Vec3,
    /// World-space viewer position
    pub view_position: Vec3,
}

impl FragmentData {
    /// Create a fragment sample
    pub fn new(position: Vec3, normal: Vec3, view_position: Vec3) -> Self {
        Self {
            position,
            normal,
            view_position,
        }
    }
}

/// Color contribution of one light to one fragment
///
/// Terms are already scaled by `attenuation`, so contributions from several
/// lights can simply be summed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Contribution {
    /// Lambertian term
    pub diffuse: Vec3,
    /// Blinn-Phong term
    pub specular: Vec3,
    /// Ambient term
    pub ambient: Vec3,
    /// Scalar attenuation that was applied
    pub attenuation: f32,
}

impl Contribution {
    /// No light at all
    pub const ZERO: Self = Self {
        diffuse: Vec3::ZERO,
        specular: Vec3::ZERO,
        ambient: Vec3::ZERO,
        attenuation: 0.0,
    };

    /// Sum of all color terms
    pub fn total(&self) -> Vec3 {
        self.diffuse + self.specular + self.ambient
    }
}

/// Type-specific light behaviour
pub trait LightModel {
    /// Type tag of this model
    const TYPE: LightType;

    /// Shade one fragment
    fn contribution(&self, common: &LightCommon, fragment: &FragmentData) -> Contribution;

    /// Append type-specific uniform slots
    fn write_uniforms(&self, common: &LightCommon, table: &mut UniformTable);

    /// Build the shadow projection, `None` for types without shadows
    fn shadow_projection(&self, _common: &LightCommon) -> Option<ShadowProjection> {
        None
    }
}

/// Lambert diffuse + Blinn-Phong specular + small ambient share
pub(crate) fn blinn_phong(
    radiance: Vec3,
    to_light: Vec3,
    fragment: &FragmentData,
    attenuation: f32,
) -> Contribution {
    let normal = fragment.normal.try_normalize().unwrap_or(to_light);
    let n_dot_l = normal.dot(to_light).max(0.0);
    let weighted = radiance * attenuation;

    let specular = if n_dot_l > 0.0 {
        let to_view = (fragment.view_position - fragment.position)
            .try_normalize()
            .unwrap_or(normal);
        let half = (to_light + to_view).try_normalize().unwrap_or(normal);
        weighted * normal.dot(half).max(0.0).powf(SPECULAR_SHININESS)
    } else {
        Vec3::ZERO
    };

    Contribution {
        diffuse: weighted * n_dot_l,
        specular,
        ambient: weighted * AMBIENT_FRACTION,
        attenuation,
    }
}

pub(crate) fn clamp_color(color: Vec3) -> Vec3 {
    let channel = |c: f32| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) };
    Vec3::new(channel(color.x), channel(color.y), channel(color.z))
}

fn clamp_intensity(intensity: f32) -> f32 {
    if intensity.is_nan() { 0.0 } else { intensity.max(0.0) }
}

/// State shared by every light type
#[derive(Clone, Debug, PartialEq)]
pub struct LightCommon {
    pub(crate) name: String,
    pub(crate) position: Vec3,
    pub(crate) up: Vec3,
    pub(crate) color: Vec3,
    pub(crate) intensity: f32,
    pub(crate) intensity_scale: f32,
    pub(crate) visible: bool,
    pub(crate) shadow: ShadowSettings,
}

impl LightCommon {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            up: Vec3::Y,
            color: Vec3::ONE,
            intensity: 1.0,
            intensity_scale: 1.0,
            visible: true,
            shadow: ShadowSettings::default(),
        }
    }

    /// Color times effective intensity
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity * self.intensity_scale
    }
}

/// Closed set of light variants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    /// Ambient light
    Ambient(AmbientLight),
    /// Directional light
    Directional(DirectionalLight),
    /// Point light
    Point(PointLight),
    /// Spot light
    Spot(SpotLight),
    /// Hemisphere light
    Hemisphere(HemisphereLight),
}

impl LightKind {
    /// Type tag
    pub fn light_type(&self) -> LightType {
        match self {
            LightKind::Ambient(_) => AmbientLight::TYPE,
            LightKind::Directional(_) => DirectionalLight::TYPE,
            LightKind::Point(_) => PointLight::TYPE,
            LightKind::Spot(_) => SpotLight::TYPE,
            LightKind::Hemisphere(_) => HemisphereLight::TYPE,
        }
    }

    fn contribution(&self, common: &LightCommon, fragment: &FragmentData) -> Contribution {
        match self {
            LightKind::Ambient(l) => l.contribution(common, fragment),
            LightKind::Directional(l) => l.contribution(common, fragment),
            LightKind::Point(l) => l.contribution(common, fragment),
            LightKind::Spot(l) => l.contribution(common, fragment),
            LightKind::Hemisphere(l) => l.contribution(common, fragment),
        }
    }

    fn write_uniforms(&self, common: &LightCommon, table: &mut UniformTable) {
        match self {
            LightKind::Ambient(l) => l.write_uniforms(common, table),
            LightKind::Directional(l) => l.write_uniforms(common, table),
            LightKind::Point(l) => l.write_uniforms(common, table),
            LightKind::Spot(l) => l.write_uniforms(common, table),
            LightKind::Hemisphere(l) => l.write_uniforms(common, table),
        }
    }

    fn shadow_projection(&self, common: &LightCommon) -> Option<ShadowProjection> {
        match self {
            LightKind::Ambient(l) => l.shadow_projection(common),
            LightKind::Directional(l) => l.shadow_projection(common),
            LightKind::Point(l) => l.shadow_projection(common),
            LightKind::Spot(l) => l.shadow_projection(common),
            LightKind::Hemisphere(l) => l.shadow_projection(common),
        }
    }

    /// Re-derive target-based directions after the light moved
    fn retarget(&mut self, position: Vec3) {
        match self {
            LightKind::Directional(l) => l.retarget(position),
            LightKind::Spot(l) => l.retarget(position),
            _ => {}
        }
    }

    /// Clamp every parameter and refresh derived values
    fn validate(&mut self, position: Vec3) {
        match self {
            LightKind::Ambient(_) => {}
            LightKind::Directional(l) => l.validate(position),
            LightKind::Point(l) => l.validate(),
            LightKind::Spot(l) => l.validate(position),
            LightKind::Hemisphere(l) => l.validate(),
        }
    }

    fn default_shadow(&self) -> ShadowSettings {
        match self {
            LightKind::Directional(_) => ShadowSettings::directional(),
            LightKind::Point(_) => ShadowSettings::point(),
            LightKind::Spot(_) => ShadowSettings::spot(),
            LightKind::Ambient(_) | LightKind::Hemisphere(_) => ShadowSettings::default(),
        }
    }
}

/// Creation options accepted by `LightManager::create_light`
///
/// Every field is optional; unset fields fall back to type defaults and
/// fields that do not apply to the requested type are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightOptions {
    /// Display name
    pub name: Option<String>,
    /// Linear RGB color
    pub color: Option<Vec3>,
    /// Intensity multiplier
    pub intensity: Option<f32>,
    /// World position
    pub position: Option<Vec3>,
    /// Direction (directional, spot)
    pub direction: Option<Vec3>,
    /// Target point (directional, spot)
    pub target: Option<Vec3>,
    /// Cutoff distance (point, spot)
    pub distance: Option<f32>,
    /// Decay exponent (point, spot)
    pub decay: Option<f32>,
    /// Cone half-angle (spot)
    pub angle: Option<f32>,
    /// Penumbra fraction (spot)
    pub penumbra: Option<f32>,
    /// Ground color (hemisphere)
    pub ground_color: Option<Vec3>,
    /// Enable shadow casting
    pub cast_shadow: Option<bool>,
    /// Initial visibility
    pub visible: Option<bool>,
}

/// Identity-free value snapshot of a light
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightRecord {
    /// Display name
    pub name: String,
    /// World position
    pub position: Vec3,
    /// Up hint for shadow cameras
    pub up: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Base intensity
    pub intensity: f32,
    /// Visibility
    pub visible: bool,
    /// Shadow settings
    pub shadow: ShadowSettings,
    /// Animation
    pub animation: LightAnimation,
    /// Variant parameters
    pub kind: LightKind,
}

/// A light source
#[derive(Debug)]
pub struct Light {
    id: LightId,
    common: LightCommon,
    kind: LightKind,
    animation: LightAnimation,
    elapsed: f32,
    uniforms: UniformTable,
    uniforms_dirty: bool,
    shadow_dirty: bool,
    shadow_projection: Option<ShadowProjection>,
    shadow_map: Option<ShadowMapHandle>,
    parent: Option<GroupId>,
    disposed: bool,
}

impl Light {
    /// Create a light of the given kind with default shared state
    pub fn new(mut kind: LightKind) -> Self {
        kind.validate(Vec3::ZERO);
        let mut common = LightCommon::new(kind.light_type().name());
        common.shadow = kind.default_shadow();
        let light = Self {
            id: LightId::next(),
            common,
            kind,
            animation: LightAnimation::None,
            elapsed: 0.0,
            uniforms: UniformTable::new(),
            uniforms_dirty: true,
            shadow_dirty: true,
            shadow_projection: None,
            shadow_map: None,
            parent: None,
            disposed: false,
        };
        log::debug!("Created {:?} light {}", light.light_type(), light.id);
        light
    }

    /// Ambient light
    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Ambient(AmbientLight))
            .with_color(color)
            .with_intensity(intensity)
    }

    /// Directional light shining along `direction`
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Directional(DirectionalLight::new(direction)))
            .with_color(color)
            .with_intensity(intensity)
    }

    /// Point light with a cutoff distance (0 = unbounded) and decay
    pub fn point(position: Vec3, color: Vec3, intensity: f32, distance: f32, decay: f32) -> Self {
        Self::new(LightKind::Point(PointLight::with_range(distance, decay)))
            .with_position(position)
            .with_color(color)
            .with_intensity(intensity)
    }

    /// Spot light at `position` pointing along `direction`
    pub fn spot(position: Vec3, direction: Vec3, angle: f32, penumbra: f32) -> Self {
        Self::new(LightKind::Spot(SpotLight::new(direction, angle, penumbra))).with_position(position)
    }

    /// Hemisphere light
    pub fn hemisphere(sky_color: Vec3, ground_color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Hemisphere(HemisphereLight::new(ground_color)))
            .with_color(sky_color)
            .with_intensity(intensity)
    }

    /// Build a light of `light_type` from creation options
    pub fn from_options(light_type: LightType, options: &LightOptions) -> Self {
        let attenuation = Attenuation {
            distance: options.distance.unwrap_or(0.0),
            decay: options.decay.unwrap_or(Attenuation::default().decay),
            ..Default::default()
        };
        let direction = options.direction.unwrap_or(directional::DEFAULT_DIRECTION);

        let kind = match light_type {
            LightType::Ambient => LightKind::Ambient(AmbientLight),
            LightType::Directional => LightKind::Directional(DirectionalLight::new(direction)),
            LightType::Point => LightKind::Point(PointLight::new(attenuation)),
            LightType::Spot => LightKind::Spot(
                SpotLight::new(
                    direction,
                    options.angle.unwrap_or(spot::DEFAULT_SPOT_ANGLE),
                    options.penumbra.unwrap_or(0.0),
                )
                .with_attenuation(attenuation),
            ),
            LightType::Hemisphere => LightKind::Hemisphere(
                options
                    .ground_color
                    .map(HemisphereLight::new)
                    .unwrap_or_default(),
            ),
        };

        let mut light = Self::new(kind);
        if let Some(name) = &options.name {
            light.common.name = name.clone();
        }
        if let Some(position) = options.position {
            light = light.with_position(position);
        }
        if let Some(color) = options.color {
            light = light.with_color(color);
        }
        if let Some(intensity) = options.intensity {
            light = light.with_intensity(intensity);
        }
        if let Some(visible) = options.visible {
            light.common.visible = visible;
        }
        if let Some(target) = options.target {
            let position = light.common.position;
            match &mut light.kind {
                LightKind::Directional(l) => l.set_target(position, Some(target)),
                LightKind::Spot(l) => l.set_target(position, Some(target)),
                _ => {}
            }
        }
        if let Some(cast_shadow) = options.cast_shadow {
            light = light.with_shadows(cast_shadow);
        }
        light
    }

    /// Rebuild a light from a record; values are clamped as by the setters
    pub fn from_record(record: LightRecord) -> Self {
        let LightRecord {
            name,
            position,
            up,
            color,
            intensity,
            visible,
            mut shadow,
            animation,
            mut kind,
        } = record;

        kind.validate(position);
        shadow.validate();
        let mut light = Self::new(kind)
            .with_position(position)
            .with_color(color)
            .with_intensity(intensity)
            .with_up(up)
            .with_animation(animation);
        if !light.light_type().supports_shadows() {
            shadow.enabled = false;
        }
        light.common.name = name;
        light.common.visible = visible;
        light.common.shadow = shadow;
        light
    }

    // ==================== Builders ====================

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.common.name = name.into();
        self
    }

    /// Set the world position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.common.position = position;
        self.kind.retarget(position);
        self
    }

    /// Set the color (channels clamped to [0, 1])
    pub fn with_color(mut self, color: Vec3) -> Self {
        self.common.color = clamp_color(color);
        self
    }

    /// Set the intensity (clamped to >= 0)
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.common.intensity = clamp_intensity(intensity);
        self
    }

    /// Set the up hint used by shadow cameras
    pub fn with_up(mut self, up: Vec3) -> Self {
        self.common.up = up.try_normalize().unwrap_or(Vec3::Y);
        self
    }

    /// Enable or disable shadow casting (ignored for types without shadows)
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        if self.light_type().supports_shadows() {
            self.common.shadow.enabled = enabled;
        } else if enabled {
            log::warn!("{:?} light {} cannot cast shadows", self.light_type(), self.id);
        }
        self
    }

    /// Attach an animation
    pub fn with_animation(mut self, animation: LightAnimation) -> Self {
        self.animation = animation;
        self
    }

    // ==================== Accessors ====================

    /// Stable identifier
    pub fn id(&self) -> LightId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.common.name
    }

    /// Type tag
    pub fn light_type(&self) -> LightType {
        self.kind.light_type()
    }

    /// Variant parameters
    pub fn kind(&self) -> &LightKind {
        &self.kind
    }

    /// Shared state
    pub fn common(&self) -> &LightCommon {
        &self.common
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.common.position
    }

    /// Up hint
    pub fn up(&self) -> Vec3 {
        self.common.up
    }

    /// Linear RGB color
    pub fn color(&self) -> Vec3 {
        self.common.color
    }

    /// Configured intensity
    pub fn intensity(&self) -> f32 {
        self.common.intensity
    }

    /// Intensity after animation
    pub fn effective_intensity(&self) -> f32 {
        self.common.intensity * self.common.intensity_scale
    }

    /// Whether the light participates in rendering
    pub fn is_visible(&self) -> bool {
        self.common.visible
    }

    /// Shadow settings
    pub fn shadow(&self) -> &ShadowSettings {
        &self.common.shadow
    }

    /// Whether the light is configured to cast shadows
    pub fn casts_shadow(&self) -> bool {
        self.common.shadow.enabled && self.light_type().supports_shadows()
    }

    /// Animation
    pub fn animation(&self) -> &LightAnimation {
        &self.animation
    }

    /// Unit direction for directional and spot lights
    pub fn direction(&self) -> Option<Vec3> {
        match &self.kind {
            LightKind::Directional(l) => Some(l.direction()),
            LightKind::Spot(l) => Some(l.direction()),
            _ => None,
        }
    }

    /// Cutoff distance for point and spot lights (0 = unbounded)
    pub fn range(&self) -> Option<f32> {
        match &self.kind {
            LightKind::Point(l) => Some(l.distance()),
            LightKind::Spot(l) => Some(l.point().distance()),
            _ => None,
        }
    }

    /// Directional parameters
    pub fn as_directional(&self) -> Option<&DirectionalLight> {
        match &self.kind {
            LightKind::Directional(l) => Some(l),
            _ => None,
        }
    }

    /// Point parameters
    pub fn as_point(&self) -> Option<&PointLight> {
        match &self.kind {
            LightKind::Point(l) => Some(l),
            _ => None,
        }
    }

    /// Spot parameters
    pub fn as_spot(&self) -> Option<&SpotLight> {
        match &self.kind {
            LightKind::Spot(l) => Some(l),
            _ => None,
        }
    }

    /// Hemisphere parameters
    pub fn as_hemisphere(&self) -> Option<&HemisphereLight> {
        match &self.kind {
            LightKind::Hemisphere(l) => Some(l),
            _ => None,
        }
    }

    /// Whether cached uniforms or shadow matrices are stale
    pub fn is_dirty(&self) -> bool {
        self.uniforms_dirty || self.shadow_dirty
    }

    /// Whether `dispose` has been called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Shadow projection from the last update, if the light cast shadows
    pub fn shadow_projection(&self) -> Option<&ShadowProjection> {
        self.shadow_projection.as_ref()
    }

    /// Shadow map handle attached by the backend
    pub fn shadow_map(&self) -> Option<ShadowMapHandle> {
        self.shadow_map
    }

    /// Owning group
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<GroupId>) {
        self.parent = parent;
    }

    // ==================== Mutators ====================

    fn guard(&self) -> Result<()> {
        if self.disposed {
            Err(LightError::LightDisposed(self.id))
        } else {
            Ok(())
        }
    }

    fn mark_dirty(&mut self) {
        self.uniforms_dirty = true;
        self.shadow_dirty = true;
    }

    fn unsupported(&self, operation: &'static str) -> LightError {
        LightError::UnsupportedOperation {
            operation,
            light_type: self.light_type(),
        }
    }

    /// Rename the light
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.guard()?;
        self.common.name = name.into();
        Ok(())
    }

    /// Move the light; target-derived directions follow
    pub fn set_position(&mut self, position: Vec3) -> Result<()> {
        self.guard()?;
        self.common.position = position;
        self.kind.retarget(position);
        self.mark_dirty();
        Ok(())
    }

    /// Set the color (channels clamped to [0, 1])
    pub fn set_color(&mut self, color: Vec3) -> Result<()> {
        self.guard()?;
        self.common.color = clamp_color(color);
        self.mark_dirty();
        Ok(())
    }

    /// Set the intensity (clamped to >= 0)
    pub fn set_intensity(&mut self, intensity: f32) -> Result<()> {
        self.guard()?;
        self.common.intensity = clamp_intensity(intensity);
        self.mark_dirty();
        Ok(())
    }

    /// Show or hide the light
    pub fn set_visible(&mut self, visible: bool) -> Result<()> {
        self.guard()?;
        self.common.visible = visible;
        self.mark_dirty();
        Ok(())
    }

    /// Set the up hint used by shadow cameras
    pub fn set_up(&mut self, up: Vec3) -> Result<()> {
        self.guard()?;
        self.common.up = up.try_normalize().unwrap_or(Vec3::Y);
        self.mark_dirty();
        Ok(())
    }

    /// Replace the animation and restart its clock
    pub fn set_animation(&mut self, animation: LightAnimation) -> Result<()> {
        self.guard()?;
        self.animation = animation;
        self.elapsed = 0.0;
        self.common.intensity_scale = 1.0;
        self.mark_dirty();
        Ok(())
    }

    /// Apply partial shadow settings
    pub fn configure_shadow(&mut self, options: &ShadowOptions) -> Result<()> {
        self.guard()?;
        if !self.light_type().supports_shadows() {
            return Err(LightError::ShadowsUnsupported(self.light_type()));
        }
        self.common.shadow.apply(options);
        self.mark_dirty();
        Ok(())
    }

    /// Set the direction (directional, spot); clears any target
    pub fn set_direction(&mut self, direction: Vec3) -> Result<()> {
        self.guard()?;
        match &mut self.kind {
            LightKind::Directional(l) => l.set_direction(direction),
            LightKind::Spot(l) => l.set_direction(direction),
            _ => return Err(self.unsupported("set_direction")),
        }
        self.mark_dirty();
        Ok(())
    }

    /// Aim at a target (directional, spot); `None` keeps the current direction
    pub fn set_target(&mut self, target: Option<Vec3>) -> Result<()> {
        self.guard()?;
        let position = self.common.position;
        match &mut self.kind {
            LightKind::Directional(l) => l.set_target(position, target),
            LightKind::Spot(l) => l.set_target(position, target),
            _ => return Err(self.unsupported("set_target")),
        }
        self.mark_dirty();
        Ok(())
    }

    /// Set the exponential falloff (directional)
    pub fn set_falloff(&mut self, falloff: Option<DistanceFalloff>) -> Result<()> {
        self.guard()?;
        match &mut self.kind {
            LightKind::Directional(l) => l.set_falloff(falloff),
            _ => return Err(self.unsupported("set_falloff")),
        }
        self.mark_dirty();
        Ok(())
    }

    fn point_params_mut(&mut self, operation: &'static str) -> Result<&mut PointLight> {
        self.guard()?;
        let light_type = self.light_type();
        match &mut self.kind {
            LightKind::Point(l) => Ok(l),
            LightKind::Spot(l) => Ok(l.point_mut()),
            _ => Err(LightError::UnsupportedOperation { operation, light_type }),
        }
    }

    /// Set the cutoff distance (point, spot)
    pub fn set_distance(&mut self, distance: f32) -> Result<()> {
        self.point_params_mut("set_distance")?.set_distance(distance);
        self.mark_dirty();
        Ok(())
    }

    /// Set the decay exponent (point, spot), clamped to [`MIN_DECAY`]
    pub fn set_decay(&mut self, decay: f32) -> Result<()> {
        self.point_params_mut("set_decay")?.set_decay(decay);
        self.mark_dirty();
        Ok(())
    }

    /// Set the attenuation coefficients (point, spot)
    pub fn set_attenuation_coefficients(
        &mut self,
        constant: f32,
        linear: f32,
        quadratic: f32,
    ) -> Result<()> {
        self.point_params_mut("set_attenuation_coefficients")?
            .set_coefficients(constant, linear, quadratic);
        self.mark_dirty();
        Ok(())
    }

    /// Set the cone half-angle (spot)
    pub fn set_angle(&mut self, angle: f32) -> Result<()> {
        self.guard()?;
        match &mut self.kind {
            LightKind::Spot(l) => l.set_angle(angle),
            _ => return Err(self.unsupported("set_angle")),
        }
        self.mark_dirty();
        Ok(())
    }

    /// Set the penumbra fraction (spot)
    pub fn set_penumbra(&mut self, penumbra: f32) -> Result<()> {
        self.guard()?;
        match &mut self.kind {
            LightKind::Spot(l) => l.set_penumbra(penumbra),
            _ => return Err(self.unsupported("set_penumbra")),
        }
        self.mark_dirty();
        Ok(())
    }

    /// Set the ground color (hemisphere)
    pub fn set_ground_color(&mut self, color: Vec3) -> Result<()> {
        self.guard()?;
        match &mut self.kind {
            LightKind::Hemisphere(l) => l.set_ground_color(color),
            _ => return Err(self.unsupported("set_ground_color")),
        }
        self.mark_dirty();
        Ok(())
    }

    /// Attach a backend shadow map, returning the one it replaces
    pub fn attach_shadow_map(&mut self, handle: ShadowMapHandle) -> Result<Option<ShadowMapHandle>> {
        self.guard()?;
        if !self.light_type().supports_shadows() {
            return Err(LightError::ShadowsUnsupported(self.light_type()));
        }
        Ok(self.shadow_map.replace(handle))
    }

    // ==================== Evaluation ====================

    /// Shade one fragment
    pub fn calculate_contribution(&self, fragment: &FragmentData) -> Contribution {
        if self.disposed || !self.common.visible {
            return Contribution::ZERO;
        }
        self.kind.contribution(&self.common, fragment)
    }

    /// Uniform table, rebuilt only if the light changed
    pub fn shader_uniforms(&mut self) -> &UniformTable {
        if self.uniforms_dirty && !self.disposed {
            self.rebuild_uniforms();
        }
        &self.uniforms
    }

    /// Freshly built uniform table, bypassing the cache
    pub fn uniform_table(&self) -> UniformTable {
        let mut table = UniformTable::new();
        self.write_uniform_table(&mut table);
        table
    }

    /// WGSL evaluation function for this light's type
    pub fn shader_code(&self) -> &'static str {
        crate::shader::light_function(self.light_type())
    }

    fn rebuild_uniforms(&mut self) {
        let mut table = std::mem::take(&mut self.uniforms);
        table.clear();
        self.write_uniform_table(&mut table);
        self.uniforms = table;
        self.uniforms_dirty = false;
    }

    fn write_uniform_table(&self, table: &mut UniformTable) {
        let light_type = self.light_type();
        let prefix = light_type.name();
        let common = &self.common;

        table.set(format!("{prefix}_color"), common.color);
        table.set(format!("{prefix}_intensity"), common.intensity * common.intensity_scale);
        table.set(format!("{prefix}_position"), common.position);
        self.kind.write_uniforms(common, table);

        if light_type.supports_shadows() {
            let shadow = &common.shadow;
            table.set(format!("{prefix}_cast_shadow"), self.shadow_projection.is_some());
            table.set(format!("{prefix}_shadow_bias"), shadow.bias);
            table.set(format!("{prefix}_shadow_normal_bias"), shadow.normal_bias);
            table.set(format!("{prefix}_shadow_near"), shadow.near);
            table.set(format!("{prefix}_shadow_far"), shadow.far);
            table.set(format!("{prefix}_shadow_map_size"), shadow.map_size as f32);
            if let Some(matrix) = self.shadow_matrix() {
                table.set(format!("{prefix}_shadow_matrix"), matrix);
            }
        }
    }

    /// Single-camera shadow view-projection (directional and spot lights)
    pub fn shadow_matrix(&self) -> Option<Mat4> {
        match &self.shadow_projection {
            Some(ShadowProjection::Orthographic(camera) | ShadowProjection::Perspective(camera)) => {
                Some(camera.view_projection())
            }
            _ => None,
        }
    }

    /// Advance animation and rebuild shadow matrices when shadows are on
    pub fn update(&mut self, delta_time: f32) {
        let cast_shadow = self.casts_shadow();
        self.step(delta_time, cast_shadow);
    }

    /// Per-frame step with shadow participation decided by the caller
    pub(crate) fn step(&mut self, delta_time: f32, cast_shadow: bool) {
        if self.disposed {
            return;
        }

        if self.animation.is_animated() {
            self.elapsed += delta_time.max(0.0);
            let sample = self.animation.sample(self.elapsed);
            self.common.intensity_scale = sample.intensity_scale;
            if let Some(position) = sample.position {
                self.common.position = position;
                self.kind.retarget(position);
            }
            self.mark_dirty();
        }

        if cast_shadow {
            if self.shadow_dirty || self.shadow_projection.is_none() {
                self.shadow_projection = self.kind.shadow_projection(&self.common);
                self.shadow_dirty = false;
                self.uniforms_dirty = true;
            }
        } else if self.shadow_projection.take().is_some() {
            self.uniforms_dirty = true;
        }
    }

    /// Drop the shadow projection of a light that left the caster set
    pub(crate) fn release_shadow(&mut self) {
        if self.shadow_projection.take().is_some() {
            self.uniforms_dirty = true;
        }
    }

    // ==================== Lifecycle ====================

    /// Release resources; returns the shadow map handle the first time only
    pub fn dispose(&mut self) -> Option<ShadowMapHandle> {
        if self.disposed {
            return None;
        }
        self.disposed = true;
        self.shadow_projection = None;
        self.uniforms.clear();
        log::debug!("Disposed light {}", self.id);
        self.shadow_map.take()
    }

    /// Deep value copy with a fresh identity and no parent or shadow map
    pub fn duplicate(&self) -> Light {
        Light {
            id: LightId::next(),
            common: self.common.clone(),
            kind: self.kind.clone(),
            animation: self.animation,
            elapsed: self.elapsed,
            uniforms: UniformTable::new(),
            uniforms_dirty: true,
            shadow_dirty: true,
            shadow_projection: None,
            shadow_map: None,
            parent: None,
            disposed: false,
        }
    }

    /// Identity-free value snapshot
    pub fn to_record(&self) -> LightRecord {
        LightRecord {
            name: self.common.name.clone(),
            position: self.common.position,
            up: self.common.up,
            color: self.common.color,
            intensity: self.common.intensity,
            visible: self.common.visible,
            shadow: self.common.shadow.clone(),
            animation: self.animation,
            kind: self.kind.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f32::consts::PI;

    fn sample_lights() -> Vec<Light> {
        vec![
            Light::ambient(Vec3::new(0.1, 0.2, 0.3), 0.5),
            Light::directional(Vec3::new(1.0, -1.0, 0.0), Vec3::ONE, 3.0).with_shadows(true),
            Light::point(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 0.5, 0.2), 4.0, 10.0, 2.0),
            Light::spot(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, PI / 6.0, 0.5)
                .with_name("flashlight")
                .with_animation(LightAnimation::Pulse { frequency: 2.0, amplitude: 0.25 }),
            Light::hemisphere(Vec3::new(0.5, 0.7, 1.0), Vec3::new(0.3, 0.2, 0.1), 0.8),
        ]
    }

    #[test]
    fn test_setters_clamp() {
        let mut light = Light::point(Vec3::ZERO, Vec3::ONE, 1.0, 0.0, 2.0);

        light.set_intensity(-5.0).unwrap();
        assert_eq!(light.intensity(), 0.0);

        light.set_color(Vec3::new(2.0, -1.0, 0.5)).unwrap();
        assert_eq!(light.color(), Vec3::new(1.0, 0.0, 0.5));

        light.set_decay(0.0).unwrap();
        assert_eq!(light.as_point().unwrap().decay(), MIN_DECAY);
    }

    #[test]
    fn test_spot_setters_clamp() {
        let mut light = Light::spot(Vec3::ZERO, Vec3::NEG_Y, 0.5, 0.2);
        light.set_angle(10.0).unwrap();
        light.set_penumbra(4.0).unwrap();

        let spot = light.as_spot().unwrap();
        assert_eq!(spot.angle(), MAX_SPOT_ANGLE);
        assert_eq!(spot.penumbra(), 1.0);
    }

    #[test]
    fn test_uniforms_rebuilt_lazily() {
        let mut light = Light::point(Vec3::new(1.0, 2.0, 3.0), Vec3::ONE, 2.0, 10.0, 2.0);
        assert!(light.is_dirty());

        let table = light.shader_uniforms().clone();
        assert_eq!(table.get("point_intensity").and_then(|v| v.as_float()), Some(2.0));
        assert_eq!(
            table.get("point_position").and_then(|v| v.as_vec3()),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(table.get("point_distance").and_then(|v| v.as_float()), Some(10.0));

        // No change: same table
        assert_eq!(light.shader_uniforms(), &table);

        light.set_intensity(4.0).unwrap();
        assert_eq!(
            light.shader_uniforms().get("point_intensity").and_then(|v| v.as_float()),
            Some(4.0)
        );
    }

    #[test]
    fn test_uniform_names_per_type() {
        for mut light in sample_lights() {
            let prefix = light.light_type().name();
            let table = light.shader_uniforms();
            for field in ["color", "intensity", "position"] {
                assert!(
                    table.get(&format!("{prefix}_{field}")).is_some(),
                    "missing {prefix}_{field}"
                );
            }
        }
    }

    #[test]
    fn test_unsupported_operations() {
        let mut point = Light::point(Vec3::ZERO, Vec3::ONE, 1.0, 0.0, 2.0);
        assert!(matches!(
            point.set_angle(0.3),
            Err(LightError::UnsupportedOperation { operation: "set_angle", light_type: LightType::Point })
        ));

        let mut ambient = Light::ambient(Vec3::ONE, 1.0);
        assert!(matches!(
            ambient.configure_shadow(&ShadowOptions::enabled(true)),
            Err(LightError::ShadowsUnsupported(LightType::Ambient))
        ));
        assert!(!ambient.casts_shadow());
        assert!(ambient.set_direction(Vec3::X).is_err());
    }

    #[test]
    fn test_shadow_projection_follows_configuration() {
        let mut light = Light::spot(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 0.5, 0.0);
        light.update(0.016);
        assert!(light.shadow_projection().is_none());

        light.configure_shadow(&ShadowOptions::enabled(true)).unwrap();
        light.update(0.016);
        assert!(matches!(light.shadow_projection(), Some(ShadowProjection::Perspective(_))));
        assert_eq!(
            light.shader_uniforms().get("spot_cast_shadow").and_then(|v| v.as_bool()),
            Some(true)
        );
        assert!(light.shader_uniforms().get("spot_shadow_matrix").is_some());

        light.configure_shadow(&ShadowOptions::enabled(false)).unwrap();
        light.update(0.016);
        assert!(light.shadow_projection().is_none());
        assert_eq!(
            light.shader_uniforms().get("spot_cast_shadow").and_then(|v| v.as_bool()),
            Some(false)
        );
    }

    #[test]
    fn test_shadow_matrices_rebuilt_only_when_dirty() {
        let mut light = Light::point(Vec3::ZERO, Vec3::ONE, 1.0, 10.0, 2.0).with_shadows(true);
        light.update(0.016);
        let first = light.shadow_projection().cloned().unwrap();
        assert!(!light.shadow_dirty);

        light.update(0.016);
        assert_eq!(light.shadow_projection(), Some(&first));

        light.set_position(Vec3::new(5.0, 0.0, 0.0)).unwrap();
        assert!(light.is_dirty());
        light.update(0.016);
        assert_ne!(light.shadow_projection(), Some(&first));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut light = Light::spot(Vec3::ZERO, Vec3::NEG_Y, 0.5, 0.0);
        assert_eq!(light.attach_shadow_map(ShadowMapHandle(3)).unwrap(), None);

        assert_eq!(light.dispose(), Some(ShadowMapHandle(3)));
        assert_eq!(light.dispose(), None);
        assert!(light.is_disposed());
    }

    #[test]
    fn test_mutators_fail_after_dispose() {
        let mut light = Light::point(Vec3::ZERO, Vec3::ONE, 1.0, 0.0, 2.0);
        let id = light.id();
        light.dispose();

        assert!(matches!(light.set_intensity(2.0), Err(LightError::LightDisposed(d)) if d == id));
        assert!(matches!(light.set_position(Vec3::X), Err(LightError::LightDisposed(_))));
        assert!(matches!(light.set_distance(4.0), Err(LightError::LightDisposed(_))));
        assert!(light.attach_shadow_map(ShadowMapHandle(1)).is_err());

        // Evaluation of a disposed light is inert rather than an error
        let fragment = FragmentData::new(Vec3::Z, Vec3::NEG_Z, Vec3::ZERO);
        assert_eq!(light.calculate_contribution(&fragment), Contribution::ZERO);
        light.update(0.016);
        assert!(light.shader_uniforms().is_empty());
    }

    #[test]
    fn test_target_follows_position() {
        let mut light = Light::spot(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y, 0.5, 0.0);
        light.set_target(Some(Vec3::new(10.0, 10.0, 0.0))).unwrap();
        assert_abs_diff_eq!(light.direction().unwrap().distance(Vec3::X), 0.0, epsilon = 1e-6);

        light.set_position(Vec3::new(10.0, 20.0, 0.0)).unwrap();
        assert_abs_diff_eq!(light.direction().unwrap().distance(Vec3::NEG_Y), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_duplicate_copies_values_not_identity() {
        for light in sample_lights() {
            let copy = light.duplicate();
            assert_ne!(copy.id(), light.id());
            assert_eq!(copy.to_record(), light.to_record());
            assert!(copy.parent().is_none());
            assert!(copy.shadow_map().is_none());
        }
    }

    #[test]
    fn test_record_round_trip_through_json() {
        for light in sample_lights() {
            let json = serde_json::to_string(&light.to_record()).unwrap();
            let record: LightRecord = serde_json::from_str(&json).unwrap();
            let restored = Light::from_record(record);

            assert_ne!(restored.id(), light.id());
            assert_eq!(restored.to_record(), light.to_record());
        }
    }

    #[test]
    fn test_from_record_clamps() {
        let record = Light::spot(Vec3::ZERO, Vec3::NEG_Y, 0.5, 0.1).to_record();
        let mut value = serde_json::to_value(&record).unwrap();
        value["intensity"] = (-3.0).into();
        value["kind"]["Spot"]["penumbra"] = 7.0.into();

        let restored = Light::from_record(serde_json::from_value(value).unwrap());

        assert_eq!(restored.intensity(), 0.0);
        let spot = restored.as_spot().unwrap();
        assert_eq!(spot.penumbra(), 1.0);
        assert_abs_diff_eq!(spot.cos_angle(), 0.5f32.cos(), epsilon = 1e-6);
    }

    #[test]
    fn test_from_options() {
        let options = LightOptions {
            name: Some("lamp".into()),
            position: Some(Vec3::new(0.0, 3.0, 0.0)),
            intensity: Some(2.0),
            distance: Some(8.0),
            decay: Some(1.0),
            cast_shadow: Some(true),
            ..Default::default()
        };
        let light = Light::from_options(LightType::Point, &options);

        assert_eq!(light.name(), "lamp");
        assert_eq!(light.position(), Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(light.intensity(), 2.0);
        assert_eq!(light.range(), Some(8.0));
        assert_eq!(light.as_point().unwrap().decay(), 1.0);
        assert!(light.casts_shadow());

        let spot = Light::from_options(
            LightType::Spot,
            &LightOptions {
                position: Some(Vec3::new(0.0, 4.0, 0.0)),
                target: Some(Vec3::ZERO),
                angle: Some(0.4),
                ..Default::default()
            },
        );
        assert_abs_diff_eq!(spot.direction().unwrap().distance(Vec3::NEG_Y), 0.0, epsilon = 1e-6);
        assert_eq!(spot.as_spot().unwrap().angle(), 0.4);

        let ambient = Light::from_options(
            LightType::Ambient,
            &LightOptions {
                cast_shadow: Some(true),
                ..Default::default()
            },
        );
        assert!(!ambient.casts_shadow());
    }

    #[test]
    fn test_pulse_animation_modulates_intensity() {
        let mut light = Light::point(Vec3::ZERO, Vec3::ONE, 2.0, 0.0, 2.0)
            .with_animation(LightAnimation::Pulse { frequency: 1.0, amplitude: 0.5 });
        light.update(0.25);

        assert_eq!(light.intensity(), 2.0);
        assert_abs_diff_eq!(light.effective_intensity(), 3.0, epsilon = 1e-4);
        let uniform = light.shader_uniforms().get("point_intensity").and_then(|v| v.as_float());
        assert_abs_diff_eq!(uniform.unwrap(), 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_invisible_light_contributes_nothing() {
        let mut light = Light::ambient(Vec3::ONE, 1.0);
        light.set_visible(false).unwrap();
        let fragment = FragmentData::new(Vec3::ZERO, Vec3::Y, Vec3::Z);
        assert_eq!(light.calculate_contribution(&fragment), Contribution::ZERO);
    }
}
