//! Light manager
//!
//! Top-level coordinator. Owns the [`LightGraph`], decides every frame which
//! lights are active and which of those cast shadows, steps them, and reports
//! what happened through [`LightStats`] and [`LightEvent`]s.
//!
//! # Frame pipeline
//!
//! 1. Gather visible lights reachable through visible, enabled groups, in
//!    registration order.
//! 2. Cull bounded lights outside the frustum and positional lights beyond
//!    the culling distance. Culling filters the view; lights stay registered.
//! 3. Cap the active set and the shadow casters according to the budget
//!    tier and the [`EvictionPolicy`].
//! 4. Step every active light with its shadow participation.
//! 5. Record timing and emit events.

pub mod config;
pub mod events;
pub mod stats;

pub use config::{BudgetTier, EvictionPolicy, LightManagerConfig};
pub use events::LightEvent;
pub use stats::LightStats;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;

use crossbeam_channel::Receiver;
use glam::{Mat4, Vec3};

use crate::buffer::LightUniforms;
use crate::culling::{BoundingSphere, Frustum};
use crate::error::{LightError, Result};
use crate::graph::LightGraph;
use crate::group::LightGroup;
use crate::id::{GroupId, LightId, ShadowMapHandle};
use crate::light::{Light, LightOptions, LightType};

use events::EventHub;

/// Camera inputs for one frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    /// World-space camera position
    pub position: Vec3,
    /// View-projection matrix, used for frustum culling when set
    pub view_projection: Option<Mat4>,
}

impl CameraView {
    /// Camera at `position` without a frustum
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            view_projection: None,
        }
    }

    /// Perspective camera looking at `target`
    pub fn look_at(position: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let view = Mat4::look_at_rh(position, target, Vec3::Y);
        let projection = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self {
            position,
            view_projection: Some(projection * view),
        }
    }

    /// Frustum of the view-projection matrix
    pub fn frustum(&self) -> Option<Frustum> {
        self.view_projection.as_ref().map(Frustum::from_view_projection)
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

struct Candidate {
    id: LightId,
    rank: usize,
    distance: f32,
    positional: bool,
    wants_shadow: bool,
    was_caster: bool,
}

/// Light manager
pub struct LightManager {
    config: LightManagerConfig,
    tier: BudgetTier,
    graph: LightGraph,
    frustum: Option<Frustum>,
    active: Vec<LightId>,
    shadow_casters: Vec<LightId>,
    previous_casters: HashSet<LightId>,
    frame: u64,
    stats: LightStats,
    events: EventHub,
    disposed: bool,
}

impl Default for LightManager {
    fn default() -> Self {
        Self::new(LightManagerConfig::default())
    }
}

impl LightManager {
    /// Create a manager; the configuration is validated first
    pub fn new(mut config: LightManagerConfig) -> Self {
        config.validate();
        let tier = config.budget_tier;
        log::debug!(
            "Light manager: max_lights={}, max_shadow_maps={}, tier={}",
            config.max_lights,
            config.max_shadow_maps,
            tier.name()
        );
        Self {
            config,
            tier,
            graph: LightGraph::new(),
            frustum: None,
            active: Vec::new(),
            shadow_casters: Vec::new(),
            previous_casters: HashSet::new(),
            frame: 0,
            stats: LightStats {
                tier,
                ..Default::default()
            },
            events: EventHub::default(),
            disposed: false,
        }
    }

    /// Configuration
    pub fn config(&self) -> &LightManagerConfig {
        &self.config
    }

    /// Budget tier in effect
    pub fn tier(&self) -> BudgetTier {
        self.tier
    }

    /// Effective `(lights, shadow maps)` caps
    pub fn caps(&self) -> (usize, usize) {
        self.config.caps_for(self.tier)
    }

    /// Root group
    pub fn root(&self) -> GroupId {
        self.graph.root()
    }

    /// Light arena
    pub fn graph(&self) -> &LightGraph {
        &self.graph
    }

    /// Mutable light arena; membership changes made here emit no events
    pub fn graph_mut(&mut self) -> &mut LightGraph {
        &mut self.graph
    }

    /// Subscribe to events
    pub fn subscribe(&mut self) -> Receiver<LightEvent> {
        self.events.subscribe()
    }

    // ==================== Lights ====================

    /// Construct a light of `light_type` and register it under the root
    pub fn create_light(&mut self, light_type: LightType, options: &LightOptions) -> Result<LightId> {
        self.add_light(Light::from_options(light_type, options))
    }

    /// Register a light under the root
    pub fn add_light(&mut self, light: Light) -> Result<LightId> {
        let root = self.graph.root();
        self.add_light_to(light, root)
    }

    /// Register a light under `group`
    pub fn add_light_to(&mut self, light: Light, group: GroupId) -> Result<LightId> {
        let light_type = light.light_type();
        let id = self.graph.insert_light(light, Some(group))?;
        self.events.emit(LightEvent::LightAdded {
            light: id,
            light_type,
            group: Some(group),
        });
        Ok(id)
    }

    /// Unregister a light and hand it back
    pub fn remove_light(&mut self, id: LightId) -> Result<Light> {
        let light = self.graph.take_light(id)?;
        self.forget(id);
        self.events.emit(LightEvent::LightRemoved { light: id });
        Ok(light)
    }

    /// Unregister and dispose a light, returning its shadow map handle
    pub fn dispose_light(&mut self, id: LightId) -> Result<Option<ShadowMapHandle>> {
        let mut light = self.remove_light(id)?;
        Ok(light.dispose())
    }

    /// Move a light to `group` (or detach it with `None`)
    pub fn move_light(&mut self, light: LightId, group: Option<GroupId>) -> Result<()> {
        let from = self
            .graph
            .light(light)
            .ok_or(LightError::LightNotFound(light))?
            .parent();
        self.graph.reparent_light(light, group)?;
        if from != group {
            self.events.emit(LightEvent::LightMoved {
                light,
                from,
                to: group,
            });
        }
        Ok(())
    }

    /// Registered light
    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.graph.light(id)
    }

    /// Mutable access to a light; invalidates its group caches
    pub fn light_mut(&mut self, id: LightId) -> Result<&mut Light> {
        self.graph.light_mut(id)
    }

    /// Registered lights in registration order
    pub fn lights(&self) -> impl Iterator<Item = &Light> + '_ {
        self.graph.lights()
    }

    /// Number of registered lights
    pub fn light_count(&self) -> usize {
        self.graph.len()
    }

    fn forget(&mut self, id: LightId) {
        self.active.retain(|l| *l != id);
        self.shadow_casters.retain(|l| *l != id);
        self.previous_casters.remove(&id);
    }

    // ==================== Groups ====================

    /// Create a group under the root
    pub fn create_group(&mut self, name: impl Into<String>) -> Result<GroupId> {
        let root = self.graph.root();
        self.create_group_in(name, root)
    }

    /// Create a group under `parent`
    pub fn create_group_in(&mut self, name: impl Into<String>, parent: GroupId) -> Result<GroupId> {
        let group = self.graph.create_group(name, Some(parent))?;
        self.events.emit(LightEvent::GroupAdded {
            group,
            parent: Some(parent),
        });
        Ok(group)
    }

    /// Attach `child` under `parent`, transferring it from its previous parent
    pub fn add_group(&mut self, parent: GroupId, child: GroupId) -> Result<()> {
        self.graph.add_child(parent, child)?;
        self.events.emit(LightEvent::GroupAdded {
            group: child,
            parent: Some(parent),
        });
        Ok(())
    }

    /// Detach a group subtree from the hierarchy; its lights stay registered
    pub fn remove_group(&mut self, group: GroupId) -> Result<()> {
        self.graph.reparent_group(group, None)?;
        self.events.emit(LightEvent::GroupRemoved { group });
        Ok(())
    }

    /// Dispose a group subtree and every light in it
    pub fn dispose_group(&mut self, group: GroupId) -> Result<Vec<ShadowMapHandle>> {
        let before: Vec<LightId> = self.graph.light_ids().to_vec();
        let released = self.graph.dispose_group(group)?;
        for id in before {
            if !self.graph.contains_light(id) {
                self.forget(id);
                self.events.emit(LightEvent::LightRemoved { light: id });
            }
        }
        self.events.emit(LightEvent::GroupRemoved { group });
        Ok(released)
    }

    /// Group by id
    pub fn group(&self, id: GroupId) -> Option<&LightGroup> {
        self.graph.group(id)
    }

    // ==================== Culling inputs ====================

    /// Override the camera frustum used for culling
    pub fn set_frustum(&mut self, frustum: Option<Frustum>) {
        self.frustum = frustum;
    }

    /// Frustum override
    pub fn frustum(&self) -> Option<&Frustum> {
        self.frustum.as_ref()
    }

    /// Set the culling distance (non-positive or non-finite disables it)
    pub fn set_culling_distance(&mut self, distance: Option<f32>) {
        self.config.culling_distance = distance;
        self.config.validate();
    }

    /// Culling distance
    pub fn culling_distance(&self) -> Option<f32> {
        self.config.culling_distance
    }

    // ==================== Frame ====================

    /// Per-frame entry point
    ///
    /// The explicit frustum from [`set_frustum`](Self::set_frustum) takes
    /// precedence over the camera's own view-projection.
    pub fn update(&mut self, delta_time: f32, camera: &CameraView) -> &LightStats {
        if self.disposed {
            return &self.stats;
        }
        let start = Instant::now();
        self.frame += 1;

        let root = self.graph.root();
        let visible = match self.graph.reachable_lights(root) {
            Ok(visible) => visible,
            Err(err) => {
                log::warn!("Light gather failed: {}", err);
                Vec::new()
            }
        };

        let frustum = if self.config.frustum_culling {
            self.frustum.clone().or_else(|| camera.frustum())
        } else {
            None
        };
        let culling_distance = self.config.culling_distance;

        let mut candidates = Vec::with_capacity(visible.len());
        let mut culled = 0;
        for (rank, id) in visible.iter().enumerate() {
            let Some(light) = self.graph.light(*id) else {
                continue;
            };
            if !passes_culling(light, frustum.as_ref(), culling_distance, camera.position) {
                culled += 1;
                continue;
            }
            let positional = light.light_type().is_positional();
            candidates.push(Candidate {
                id: *id,
                rank,
                distance: if positional { light.position().distance(camera.position) } else { 0.0 },
                positional,
                wants_shadow: light.casts_shadow(),
                was_caster: self.previous_casters.contains(id),
            });
        }

        let (max_lights, max_shadows) = self.caps();

        // Light cap
        let mut evicted = Vec::new();
        if candidates.len() > max_lights {
            match self.config.eviction {
                EvictionPolicy::RegistrationOrder => {}
                EvictionPolicy::NearestFirst => candidates.sort_by(nearest_first),
                EvictionPolicy::ShadowCastersFirst => {
                    candidates.sort_by(|a, b| b.was_caster.cmp(&a.was_caster).then_with(|| nearest_first(a, b)))
                }
            }
            evicted = candidates.split_off(max_lights).into_iter().map(|c| c.id).collect::<Vec<_>>();
            candidates.sort_by_key(|c| c.rank);
            log::warn!(
                "Light cap {} exceeded, {} lights evicted ({:?})",
                max_lights,
                evicted.len(),
                self.config.eviction
            );
        }

        // Shadow cap: last frame's casters first, then nearest
        let mut wanting: Vec<&Candidate> = candidates.iter().filter(|c| c.wants_shadow).collect();
        wanting.sort_by(|a, b| {
            b.was_caster
                .cmp(&a.was_caster)
                .then_with(|| a.distance.total_cmp(&b.distance))
                .then_with(|| a.rank.cmp(&b.rank))
        });
        let evicted_shadows = wanting.len().saturating_sub(max_shadows);
        if evicted_shadows > 0 {
            log::warn!("Shadow cap {} exceeded, {} casters dropped", max_shadows, evicted_shadows);
        }
        let casters: HashSet<LightId> = wanting.iter().take(max_shadows).map(|c| c.id).collect();

        self.active = candidates.iter().map(|c| c.id).collect();
        self.shadow_casters = candidates
            .iter()
            .filter(|c| casters.contains(&c.id))
            .map(|c| c.id)
            .collect();

        let mut active_by_type = [0; LightType::COUNT];
        for id in &self.active {
            let cast_shadow = casters.contains(id);
            if let Some(light) = self.graph.light_untracked(*id) {
                light.step(delta_time, cast_shadow);
                active_by_type[light.light_type().index()] += 1;
            }
        }
        for id in self.previous_casters.difference(&casters) {
            if self.active.contains(id) {
                continue;
            }
            if let Some(light) = self.graph.light_untracked(*id) {
                light.release_shadow();
            }
        }
        self.previous_casters = casters;

        self.stats.frame = self.frame;
        self.stats.total_lights = self.graph.len();
        self.stats.visible_lights = visible.len();
        self.stats.culled_lights = culled;
        self.stats.evicted_lights = evicted.len();
        self.stats.evicted_shadow_casters = evicted_shadows;
        self.stats.active_lights = self.active.len();
        self.stats.shadow_casters = self.shadow_casters.len();
        self.stats.active_by_type = active_by_type;
        self.stats.groups = self.graph.groups().count();
        self.stats.tier = self.tier;
        self.stats.record_timing(start.elapsed());

        log::trace!(
            "Frame {}: {} active, {} shadow casters, {} culled",
            self.frame,
            self.stats.active_lights,
            self.stats.shadow_casters,
            culled
        );

        if !evicted.is_empty() {
            self.events.emit(LightEvent::LightsEvicted {
                frame: self.frame,
                lights: evicted,
            });
        }
        self.events.emit(LightEvent::Updated {
            frame: self.frame,
            active_lights: self.stats.active_lights,
            shadow_casters: self.stats.shadow_casters,
        });
        &self.stats
    }

    /// Active light ids in registration order
    pub fn active_lights(&self) -> &[LightId] {
        &self.active
    }

    /// Active lights in registration order
    pub fn active(&self) -> impl Iterator<Item = &Light> + '_ {
        self.active.iter().filter_map(move |id| self.graph.light(*id))
    }

    /// Whether a light made it into the active set last frame
    pub fn is_active(&self, id: LightId) -> bool {
        self.active.contains(&id)
    }

    /// Shadow-casting light ids in registration order
    pub fn shadow_casters(&self) -> &[LightId] {
        &self.shadow_casters
    }

    /// Switch the performance budget
    pub fn optimize_lights(&mut self, tier: BudgetTier) {
        self.tier = tier;
        self.stats.tier = tier;
        let (max_lights, max_shadow_maps) = self.caps();
        log::debug!(
            "Budget tier {}: {} lights, {} shadow maps",
            tier.name(),
            max_lights,
            max_shadow_maps
        );
        self.events.emit(LightEvent::BudgetChanged {
            tier,
            max_lights,
            max_shadow_maps,
        });
    }

    /// Statistics from the last update
    pub fn stats(&self) -> &LightStats {
        &self.stats
    }

    /// Rebuild `uniforms` from the active set
    pub fn sync_uniforms(&self, uniforms: &mut LightUniforms) {
        uniforms.update_from_lights(self.active());
    }

    /// Dispose every group and light; returns released shadow map handles
    pub fn dispose(&mut self) -> Vec<ShadowMapHandle> {
        if self.disposed {
            return Vec::new();
        }
        self.disposed = true;
        let released = self.graph.dispose_all();
        self.active.clear();
        self.shadow_casters.clear();
        self.previous_casters.clear();
        log::debug!("Light manager disposed, {} shadow maps released", released.len());
        self.events.emit(LightEvent::Disposed);
        released
    }

    /// Whether `dispose` has been called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn passes_culling(
    light: &Light,
    frustum: Option<&Frustum>,
    culling_distance: Option<f32>,
    camera: Vec3,
) -> bool {
    if let Some(frustum) = frustum {
        if !frustum.affects(light) {
            return false;
        }
    }
    if let Some(limit) = culling_distance {
        if light.light_type().is_positional() {
            let reach = BoundingSphere::of_light(light).map_or(0.0, |s| s.radius);
            if light.position().distance(camera) - reach > limit {
                return false;
            }
        }
    }
    true
}

fn nearest_first(a: &Candidate, b: &Candidate) -> Ordering {
    a.positional
        .cmp(&b.positional)
        .then_with(|| a.distance.total_cmp(&b.distance))
        .then_with(|| a.rank.cmp(&b.rank))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::ShadowOptions;

    fn point_at(x: f32) -> Light {
        Light::point(Vec3::new(x, 0.0, 0.0), Vec3::ONE, 1.0, 0.0, 2.0)
    }

    #[test]
    fn test_create_light_registers_under_root() {
        let mut manager = LightManager::default();
        let events = manager.subscribe();
        let id = manager
            .create_light(LightType::Spot, &LightOptions::default())
            .unwrap();

        assert_eq!(manager.light(id).unwrap().light_type(), LightType::Spot);
        assert_eq!(manager.light(id).unwrap().parent(), Some(manager.root()));
        assert_eq!(
            events.try_recv().unwrap(),
            LightEvent::LightAdded {
                light: id,
                light_type: LightType::Spot,
                group: Some(manager.root()),
            }
        );
    }

    #[test]
    fn test_nearest_first_eviction() {
        let config = LightManagerConfig::default().with_max_lights(2);
        let mut manager = LightManager::new(config);
        let far = manager.add_light(point_at(30.0)).unwrap();
        let ambient = manager.add_light(Light::ambient(Vec3::ONE, 0.1)).unwrap();
        let near = manager.add_light(point_at(1.0)).unwrap();
        let events = manager.subscribe();

        let stats = manager.update(0.016, &CameraView::at(Vec3::ZERO)).clone();
        assert_eq!(manager.active_lights(), &[ambient, near]);
        assert_eq!(stats.evicted_lights, 1);
        assert!(events
            .try_iter()
            .any(|e| e == LightEvent::LightsEvicted { frame: 1, lights: vec![far] }));
    }

    #[test]
    fn test_registration_order_eviction() {
        let config = LightManagerConfig::default()
            .with_max_lights(2)
            .with_eviction(EvictionPolicy::RegistrationOrder);
        let mut manager = LightManager::new(config);
        let first = manager.add_light(point_at(30.0)).unwrap();
        let second = manager.add_light(point_at(20.0)).unwrap();
        manager.add_light(point_at(1.0)).unwrap();

        manager.update(0.016, &CameraView::at(Vec3::ZERO));
        assert_eq!(manager.active_lights(), &[first, second]);
    }

    #[test]
    fn test_shadow_casters_first_eviction() {
        let config = LightManagerConfig::default()
            .with_max_lights(1)
            .with_eviction(EvictionPolicy::ShadowCastersFirst);
        let mut manager = LightManager::new(config);
        let far = manager.add_light(point_at(30.0).with_shadows(true)).unwrap();
        manager.update(0.016, &CameraView::at(Vec3::ZERO));
        assert_eq!(manager.shadow_casters(), &[far]);

        // A closer light arrives; last frame's caster keeps its slot
        manager.add_light(point_at(1.0)).unwrap();
        manager.update(0.016, &CameraView::at(Vec3::ZERO));
        assert_eq!(manager.active_lights(), &[far]);
    }

    #[test]
    fn test_shadow_cap_prefers_previous_casters() {
        let config = LightManagerConfig::default().with_max_shadow_maps(1);
        let mut manager = LightManager::new(config);
        let far = manager.add_light(point_at(10.0).with_shadows(true)).unwrap();
        manager.update(0.016, &CameraView::at(Vec3::ZERO));
        assert_eq!(manager.shadow_casters(), &[far]);

        let near = manager.add_light(point_at(1.0).with_shadows(true)).unwrap();
        let stats = manager.update(0.016, &CameraView::at(Vec3::ZERO)).clone();
        assert_eq!(manager.shadow_casters(), &[far]);
        assert_eq!(stats.evicted_shadow_casters, 1);
        assert!(manager.light(far).unwrap().shadow_projection().is_some());
        assert!(manager.light(near).unwrap().shadow_projection().is_none());
        assert!(manager.is_active(near));
    }

    #[test]
    fn test_budget_tiers() {
        let mut manager = LightManager::new(LightManagerConfig::default().with_max_lights(32));
        for i in 0..10 {
            manager
                .add_light(point_at(i as f32).with_shadows(true))
                .unwrap();
        }
        let events = manager.subscribe();

        manager.optimize_lights(BudgetTier::Low);
        let stats = manager.update(0.016, &CameraView::default()).clone();
        assert_eq!(stats.active_lights, 4);
        assert_eq!(stats.shadow_casters, 0);
        assert_eq!(
            events.try_recv().unwrap(),
            LightEvent::BudgetChanged { tier: BudgetTier::Low, max_lights: 4, max_shadow_maps: 0 }
        );

        manager.optimize_lights(BudgetTier::Medium);
        let stats = manager.update(0.016, &CameraView::default()).clone();
        assert_eq!((stats.active_lights, stats.shadow_casters), (8, 1));

        manager.optimize_lights(BudgetTier::Ultra);
        let stats = manager.update(0.016, &CameraView::default()).clone();
        assert_eq!((stats.active_lights, stats.shadow_casters), (10, 4));
    }

    #[test]
    fn test_global_shadow_switch() {
        let mut manager = LightManager::new(LightManagerConfig::default().with_shadows(false));
        let id = manager.add_light(point_at(1.0).with_shadows(true)).unwrap();
        manager.update(0.016, &CameraView::default());
        assert!(manager.shadow_casters().is_empty());
        assert!(manager.light(id).unwrap().shadow_projection().is_none());
    }

    #[test]
    fn test_culled_caster_loses_shadow_projection() {
        let config = LightManagerConfig::default().with_culling_distance(Some(10.0));
        let mut manager = LightManager::new(config);
        let id = manager.add_light(point_at(5.0).with_shadows(true)).unwrap();

        manager.update(0.016, &CameraView::at(Vec3::ZERO));
        assert_eq!(manager.shadow_casters(), &[id]);
        assert!(manager.light(id).unwrap().shadow_projection().is_some());

        manager.update(0.016, &CameraView::at(Vec3::new(100.0, 0.0, 0.0)));
        assert!(!manager.is_active(id));
        assert!(manager.shadow_casters().is_empty());
        let light = manager.light_mut(id).unwrap();
        assert!(light.shadow_projection().is_none());
        assert_eq!(
            light.shader_uniforms().get("point_cast_shadow"),
            Some(&crate::uniform::UniformValue::Bool(false))
        );
    }

    #[test]
    fn test_root_group_cannot_be_disposed() {
        let mut manager = LightManager::default();
        let root = manager.root();
        assert!(matches!(manager.dispose_group(root), Err(LightError::RootGroup)));
        assert!(manager.create_light(LightType::Point, &LightOptions::default()).is_ok());
        assert!(!manager.group(root).unwrap().is_disposed());
    }

    #[test]
    fn test_frustum_culling() {
        let mut manager = LightManager::default();
        let ahead = manager
            .add_light(Light::point(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE, 1.0, 2.0, 2.0))
            .unwrap();
        let behind = manager
            .add_light(Light::point(Vec3::new(0.0, 0.0, 10.0), Vec3::ONE, 1.0, 2.0, 2.0))
            .unwrap();
        let sun = manager.add_light(Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0)).unwrap();

        let camera = CameraView::look_at(Vec3::ZERO, Vec3::NEG_Z, 1.0, 1.0, 0.1, 100.0);
        let stats = manager.update(0.016, &camera).clone();
        assert_eq!(manager.active_lights(), &[ahead, sun]);
        assert_eq!(stats.culled_lights, 1);
        assert!(manager.light(behind).is_some());

        let mut config_off = LightManager::new(LightManagerConfig::default().with_frustum_culling(false));
        config_off.add_light(Light::point(Vec3::new(0.0, 0.0, 10.0), Vec3::ONE, 1.0, 2.0, 2.0)).unwrap();
        config_off.update(0.016, &camera);
        assert_eq!(config_off.active_lights().len(), 1);
    }

    #[test]
    fn test_hidden_group_lights_are_inactive() {
        let mut manager = LightManager::default();
        let group = manager.create_group("hidden").unwrap();
        let id = manager.add_light_to(point_at(1.0), group).unwrap();
        manager.graph_mut().set_group_visible(group, false).unwrap();

        manager.update(0.016, &CameraView::default());
        assert!(!manager.is_active(id));
        assert_eq!(manager.stats().visible_lights, 0);
    }

    #[test]
    fn test_move_light_emits_event() {
        let mut manager = LightManager::default();
        let group = manager.create_group("g").unwrap();
        let id = manager.add_light(point_at(1.0)).unwrap();
        let events = manager.subscribe();

        manager.move_light(id, Some(group)).unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            LightEvent::LightMoved { light: id, from: Some(manager.root()), to: Some(group) }
        );
        assert_eq!(manager.group(group).unwrap().lights(), &[id]);
    }

    #[test]
    fn test_remove_and_dispose_light() {
        let mut manager = LightManager::default();
        let id = manager.add_light(point_at(1.0)).unwrap();
        manager
            .light_mut(id)
            .unwrap()
            .configure_shadow(&ShadowOptions::enabled(true))
            .unwrap();
        manager.light_mut(id).unwrap().attach_shadow_map(ShadowMapHandle(4)).unwrap();
        manager.update(0.016, &CameraView::default());
        assert!(manager.is_active(id));

        assert_eq!(manager.dispose_light(id).unwrap(), Some(ShadowMapHandle(4)));
        assert!(!manager.is_active(id));
        assert!(manager.dispose_light(id).is_err());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let mut manager = LightManager::default();
        let group = manager.create_group("g").unwrap();
        let id = manager.add_light_to(point_at(1.0), group).unwrap();
        manager.light_mut(id).unwrap().attach_shadow_map(ShadowMapHandle(1)).unwrap();
        let events = manager.subscribe();

        assert_eq!(manager.dispose(), vec![ShadowMapHandle(1)]);
        assert!(manager.dispose().is_empty());
        assert!(manager.is_disposed());
        assert_eq!(manager.light_count(), 0);
        assert!(manager.create_light(LightType::Point, &LightOptions::default()).is_err());
        assert_eq!(events.try_iter().filter(|e| *e == LightEvent::Disposed).count(), 1);
    }
}
