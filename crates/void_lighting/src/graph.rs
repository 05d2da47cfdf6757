//! Light graph
//!
//! Arena owning every registered [`Light`] and [`LightGroup`], keyed by id.
//!
//! Membership changes go through exactly two operations,
//! [`LightGraph::reparent_light`] and [`LightGraph::reparent_group`]. Both
//! detach from the previous parent before attaching to the new one, so an
//! entity never appears in two groups at once. The add/remove helpers are
//! thin wrappers around them.
//!
//! Categorized queries refresh group caches lazily: children rebuild first,
//! then the parent folds its own visible lights and its active children's
//! caches. A query that finds a valid cache does no work.

use std::collections::HashMap;

use glam::Mat4;

use crate::error::{LightError, Result};
use crate::group::{GroupCache, GroupTransform, LightGroup};
use crate::id::{GroupId, LightId, ShadowMapHandle};
use crate::light::{Light, LightType};

/// Hierarchy depth past which ancestor walks stop
const MAX_DEPTH: usize = 1024;

/// Arena of lights and groups
#[derive(Debug)]
pub struct LightGraph {
    root: GroupId,
    groups: HashMap<GroupId, LightGroup>,
    lights: HashMap<LightId, Light>,
    /// Registration order
    order: Vec<LightId>,
}

impl Default for LightGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl LightGraph {
    /// Create a graph with an empty root group
    pub fn new() -> Self {
        let root = LightGroup::new("root");
        let root_id = root.id();
        let mut groups = HashMap::new();
        groups.insert(root_id, root);
        Self {
            root: root_id,
            groups,
            lights: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Root group
    pub fn root(&self) -> GroupId {
        self.root
    }

    // ==================== Lookup ====================

    /// Registered light
    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(&id)
    }

    /// Mutable access to a light; invalidates its group and all ancestors
    pub fn light_mut(&mut self, id: LightId) -> Result<&mut Light> {
        let parent = self
            .lights
            .get(&id)
            .ok_or(LightError::LightNotFound(id))?
            .parent();
        if let Some(parent) = parent {
            self.invalidate(parent);
        }
        self.lights.get_mut(&id).ok_or(LightError::LightNotFound(id))
    }

    /// Mutable access without cache invalidation
    ///
    /// Callers must not change visibility, type or shadow configuration.
    pub(crate) fn light_untracked(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.get_mut(&id)
    }

    /// Whether a light is registered
    pub fn contains_light(&self, id: LightId) -> bool {
        self.lights.contains_key(&id)
    }

    /// Registered lights in registration order
    pub fn lights(&self) -> impl Iterator<Item = &Light> + '_ {
        self.order.iter().filter_map(move |id| self.lights.get(id))
    }

    /// Registered light ids in registration order
    pub fn light_ids(&self) -> &[LightId] {
        &self.order
    }

    /// Number of registered lights
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no lights are registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Group by id (including disposed tombstones)
    pub fn group(&self, id: GroupId) -> Option<&LightGroup> {
        self.groups.get(&id)
    }

    /// All groups, in no particular order
    pub fn groups(&self) -> impl Iterator<Item = &LightGroup> + '_ {
        self.groups.values()
    }

    fn live_group(&self, id: GroupId) -> Result<&LightGroup> {
        let group = self.groups.get(&id).ok_or(LightError::GroupNotFound(id))?;
        if group.disposed {
            return Err(LightError::GroupDisposed(id));
        }
        Ok(group)
    }

    fn live_group_mut(&mut self, id: GroupId) -> Result<&mut LightGroup> {
        let group = self.groups.get_mut(&id).ok_or(LightError::GroupNotFound(id))?;
        if group.disposed {
            return Err(LightError::GroupDisposed(id));
        }
        Ok(group)
    }

    // ==================== Registration ====================

    /// Register a light under `parent` (or detached with `None`)
    pub fn insert_light(&mut self, light: Light, parent: Option<GroupId>) -> Result<LightId> {
        let id = light.id();
        if light.is_disposed() {
            return Err(LightError::LightDisposed(id));
        }
        if let Some(parent) = parent {
            self.live_group(parent)?;
        }

        let mut light = light;
        light.set_parent(None);
        if self.lights.insert(id, light).is_none() {
            self.order.push(id);
        }
        self.reparent_light(id, parent)?;
        log::debug!("Registered light {} under {:?}", id, parent);
        Ok(id)
    }

    /// Unregister a light and hand it back
    pub fn take_light(&mut self, id: LightId) -> Result<Light> {
        self.reparent_light(id, None)?;
        self.order.retain(|l| *l != id);
        let mut light = self.lights.remove(&id).ok_or(LightError::LightNotFound(id))?;
        light.set_parent(None);
        Ok(light)
    }

    /// Unregister and dispose a light
    pub fn dispose_light(&mut self, id: LightId) -> Result<Option<ShadowMapHandle>> {
        let mut light = self.take_light(id)?;
        Ok(light.dispose())
    }

    /// Create a group under `parent` (or detached with `None`)
    pub fn create_group(
        &mut self,
        name: impl Into<String>,
        parent: Option<GroupId>,
    ) -> Result<GroupId> {
        if let Some(parent) = parent {
            self.live_group(parent)?;
        }
        let group = LightGroup::new(name);
        let id = group.id();
        self.groups.insert(id, group);
        self.reparent_group(id, parent)?;
        log::debug!("Created group {} under {:?}", id, parent);
        Ok(id)
    }

    // ==================== Ownership ====================

    /// Move a light to `new_parent`, detaching it from its current group
    pub fn reparent_light(&mut self, id: LightId, new_parent: Option<GroupId>) -> Result<()> {
        let old_parent = self
            .lights
            .get(&id)
            .ok_or(LightError::LightNotFound(id))?
            .parent();
        if let Some(parent) = new_parent {
            self.live_group(parent)?;
        }
        if old_parent == new_parent {
            return Ok(());
        }

        if let Some(old) = old_parent {
            if let Some(group) = self.groups.get_mut(&old) {
                group.lights.retain(|l| *l != id);
            }
            self.invalidate(old);
        }
        if let Some(new) = new_parent {
            self.live_group_mut(new)?.lights.push(id);
            self.invalidate(new);
        }
        if let Some(light) = self.lights.get_mut(&id) {
            light.set_parent(new_parent);
        }
        Ok(())
    }

    /// Move a group to `new_parent`, detaching it from its current parent
    pub fn reparent_group(&mut self, id: GroupId, new_parent: Option<GroupId>) -> Result<()> {
        if id == self.root {
            return Err(LightError::RootGroup);
        }
        let old_parent = self.live_group(id)?.parent;
        if let Some(parent) = new_parent {
            self.live_group(parent)?;
            if parent == id || self.is_ancestor(parent, id) {
                return Err(LightError::CycleDetected { parent, child: id });
            }
        }
        if old_parent == new_parent {
            return Ok(());
        }

        if let Some(old) = old_parent {
            if let Some(group) = self.groups.get_mut(&old) {
                group.children.retain(|g| *g != id);
            }
            self.invalidate(old);
        }
        if let Some(new) = new_parent {
            self.live_group_mut(new)?.children.push(id);
            self.invalidate(new);
        }
        if let Some(group) = self.groups.get_mut(&id) {
            group.parent = new_parent;
        }
        Ok(())
    }

    /// Add a light to a group, transferring it from any previous group
    pub fn add_light(&mut self, group: GroupId, light: LightId) -> Result<()> {
        self.reparent_light(light, Some(group))
    }

    /// Detach a light from `group`; `false` if it was not a member
    pub fn remove_light(&mut self, group: GroupId, light: LightId) -> Result<bool> {
        self.live_group(group)?;
        let member = self.lights.get(&light).map(Light::parent) == Some(Some(group));
        if member {
            self.reparent_light(light, None)?;
        }
        Ok(member)
    }

    /// Add a child group, transferring it from any previous parent
    pub fn add_child(&mut self, parent: GroupId, child: GroupId) -> Result<()> {
        self.reparent_group(child, Some(parent))
    }

    /// Detach a child group from `parent`; `false` if it was not a child
    pub fn remove_child(&mut self, parent: GroupId, child: GroupId) -> Result<bool> {
        self.live_group(parent)?;
        let member = self.groups.get(&child).map(|g| g.parent) == Some(Some(parent));
        if member {
            self.reparent_group(child, None)?;
        }
        Ok(member)
    }

    /// Whether `ancestor` appears in the parent chain of `group`
    pub fn is_ancestor(&self, group: GroupId, ancestor: GroupId) -> bool {
        self.ancestors(group).contains(&ancestor)
    }

    /// Parent chain of `group`, nearest first
    pub fn ancestors(&self, group: GroupId) -> Vec<GroupId> {
        let mut chain = Vec::new();
        let mut current = self.groups.get(&group).and_then(|g| g.parent);
        while let Some(id) = current {
            if chain.len() >= MAX_DEPTH {
                break;
            }
            chain.push(id);
            current = self.groups.get(&id).and_then(|g| g.parent);
        }
        chain
    }

    /// Whether `group` is the root or hangs below it
    pub fn is_attached(&self, group: GroupId) -> bool {
        group == self.root || self.is_ancestor(group, self.root)
    }

    /// Bump the generation of `group` and every ancestor
    pub(crate) fn invalidate(&mut self, group: GroupId) {
        let mut current = Some(group);
        let mut depth = 0;
        while let Some(id) = current {
            let Some(node) = self.groups.get_mut(&id) else {
                break;
            };
            node.bump();
            current = node.parent;
            depth += 1;
            if depth > MAX_DEPTH {
                break;
            }
        }
    }

    // ==================== Group state ====================

    /// Show or hide a group's subtree
    pub fn set_group_visible(&mut self, id: GroupId, visible: bool) -> Result<()> {
        let group = self.live_group_mut(id)?;
        if group.visible != visible {
            group.visible = visible;
            self.invalidate(id);
        }
        Ok(())
    }

    /// Enable or disable a group's subtree
    pub fn set_group_enabled(&mut self, id: GroupId, enabled: bool) -> Result<()> {
        let group = self.live_group_mut(id)?;
        if group.enabled != enabled {
            group.enabled = enabled;
            self.invalidate(id);
        }
        Ok(())
    }

    /// Rename a group
    pub fn set_group_name(&mut self, id: GroupId, name: impl Into<String>) -> Result<()> {
        self.live_group_mut(id)?.set_name(name);
        Ok(())
    }

    /// Set a group's placement relative to its parent
    pub fn set_group_transform(&mut self, id: GroupId, transform: GroupTransform) -> Result<()> {
        self.live_group_mut(id)?.set_transform(transform);
        Ok(())
    }

    /// Composed placement from the root down to `id`
    pub fn world_matrix(&self, id: GroupId) -> Result<Mat4> {
        let group = self.groups.get(&id).ok_or(LightError::GroupNotFound(id))?;
        let mut matrix = group.transform().to_matrix();
        for ancestor in self.ancestors(id) {
            if let Some(node) = self.groups.get(&ancestor) {
                matrix = node.transform().to_matrix() * matrix;
            }
        }
        Ok(matrix)
    }

    // ==================== Cached queries ====================

    /// Rebuild the cache of `id` (children first) if it is stale
    fn refresh(&mut self, id: GroupId) -> Result<()> {
        let group = self.live_group(id)?;
        if group.is_cache_valid() {
            return Ok(());
        }

        let lights = group.lights.clone();
        let children: Vec<GroupId> = group
            .children
            .iter()
            .copied()
            .filter(|c| self.groups.get(c).is_some_and(LightGroup::is_active))
            .collect();

        for child in &children {
            self.refresh(*child)?;
        }

        let mut cache = GroupCache::default();
        for light in lights.iter().filter_map(|l| self.lights.get(l)) {
            if light.is_visible() {
                cache.push(light);
            }
        }
        for child in &children {
            if let Some(node) = self.groups.get(child) {
                cache.extend(node.cache());
            }
        }

        log::trace!("Rebuilt cache of group {}", id);
        self.live_group_mut(id)?.install_cache(cache);
        Ok(())
    }

    fn cache(&mut self, id: GroupId) -> Result<&GroupCache> {
        self.refresh(id)?;
        Ok(self.live_group(id)?.cache())
    }

    /// Visible lights of one type in the subtree of `group`
    pub fn lights_by_type(&mut self, group: GroupId, light_type: LightType) -> Result<&[LightId]> {
        Ok(self.cache(group)?.lights(light_type))
    }

    /// Visible ambient lights in the subtree
    pub fn ambient_lights(&mut self, group: GroupId) -> Result<&[LightId]> {
        self.lights_by_type(group, LightType::Ambient)
    }

    /// Visible directional lights in the subtree
    pub fn directional_lights(&mut self, group: GroupId) -> Result<&[LightId]> {
        self.lights_by_type(group, LightType::Directional)
    }

    /// Visible point lights in the subtree
    pub fn point_lights(&mut self, group: GroupId) -> Result<&[LightId]> {
        self.lights_by_type(group, LightType::Point)
    }

    /// Visible spot lights in the subtree
    pub fn spot_lights(&mut self, group: GroupId) -> Result<&[LightId]> {
        self.lights_by_type(group, LightType::Spot)
    }

    /// Visible hemisphere lights in the subtree
    pub fn hemisphere_lights(&mut self, group: GroupId) -> Result<&[LightId]> {
        self.lights_by_type(group, LightType::Hemisphere)
    }

    /// Visible shadow-casting lights in the subtree
    pub fn shadow_casters(&mut self, group: GroupId) -> Result<&[LightId]> {
        Ok(self.cache(group)?.shadow_casters())
    }

    /// Whether any visible light in the subtree casts shadows
    pub fn has_shadows(&mut self, group: GroupId) -> Result<bool> {
        Ok(!self.cache(group)?.shadow_casters().is_empty())
    }

    /// Number of visible lights in the subtree
    pub fn light_count(&mut self, group: GroupId) -> Result<usize> {
        Ok(self.cache(group)?.light_count())
    }

    /// Visible lights reachable from `group` through active groups, in
    /// registration order
    pub fn reachable_lights(&mut self, group: GroupId) -> Result<Vec<LightId>> {
        let cache = self.cache(group)?;
        let mut reachable: Vec<LightId> = LightType::ALL
            .iter()
            .flat_map(|t| cache.lights(*t).iter().copied())
            .collect();
        let rank: HashMap<LightId, usize> =
            self.order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        reachable.sort_by_key(|id| rank.get(id).copied().unwrap_or(usize::MAX));
        Ok(reachable)
    }

    // ==================== Lifecycle ====================

    /// Advance every visible light in enabled groups of the subtree
    pub fn update_group(&mut self, id: GroupId, delta_time: f32) -> Result<()> {
        let group = self.live_group(id)?;
        if !group.enabled {
            return Ok(());
        }
        let lights = group.lights.clone();
        let children = group.children.clone();

        for id in &lights {
            if let Some(light) = self.lights.get_mut(id) {
                if light.is_visible() {
                    light.update(delta_time);
                }
            }
        }
        for child in children {
            if self.groups.get(&child).is_some_and(|g| g.enabled && !g.disposed) {
                self.update_group(child, delta_time)?;
            }
        }
        Ok(())
    }

    /// Detach every light and child group, leaving them registered
    pub fn clear_group(&mut self, id: GroupId) -> Result<()> {
        let group = self.live_group_mut(id)?;
        let lights = std::mem::take(&mut group.lights);
        let children = std::mem::take(&mut group.children);

        for light in lights {
            if let Some(light) = self.lights.get_mut(&light) {
                light.set_parent(None);
            }
        }
        for child in children {
            if let Some(child) = self.groups.get_mut(&child) {
                child.parent = None;
            }
        }
        self.invalidate(id);
        Ok(())
    }

    /// Dispose a group, its lights and its child groups recursively
    ///
    /// The group stays in the arena as a disposed tombstone, so disposing it
    /// again is a no-op. Returns the shadow map handles released.
    /// The root group is only disposed through [`dispose_all`](Self::dispose_all).
    pub fn dispose_group(&mut self, id: GroupId) -> Result<Vec<ShadowMapHandle>> {
        if id == self.root {
            return Err(LightError::RootGroup);
        }
        let mut released = Vec::new();
        self.dispose_group_into(id, &mut released)?;
        Ok(released)
    }

    fn dispose_group_into(&mut self, id: GroupId, released: &mut Vec<ShadowMapHandle>) -> Result<()> {
        let group = self.groups.get(&id).ok_or(LightError::GroupNotFound(id))?;
        if group.disposed {
            return Ok(());
        }
        let lights = group.lights.clone();
        let children = group.children.clone();
        let parent = group.parent;

        for child in children {
            self.dispose_group_into(child, released)?;
        }
        for light in lights {
            if let Some(mut light) = self.lights.remove(&light) {
                self.order.retain(|l| *l != light.id());
                released.extend(light.dispose());
            }
        }

        if let Some(parent) = parent {
            if let Some(node) = self.groups.get_mut(&parent) {
                node.children.retain(|g| *g != id);
            }
            self.invalidate(parent);
        }
        if let Some(group) = self.groups.get_mut(&id) {
            group.lights.clear();
            group.children.clear();
            group.parent = None;
            group.disposed = true;
            group.bump();
        }
        log::debug!("Disposed group {}", id);
        Ok(())
    }

    /// Dispose every group and light, including detached ones
    pub fn dispose_all(&mut self) -> Vec<ShadowMapHandle> {
        let mut released = Vec::new();
        let groups: Vec<GroupId> = self.groups.keys().copied().collect();
        for group in groups {
            if let Err(err) = self.dispose_group_into(group, &mut released) {
                log::warn!("Failed to dispose group {}: {}", group, err);
            }
        }
        for id in std::mem::take(&mut self.order) {
            if let Some(mut light) = self.lights.remove(&id) {
                released.extend(light.dispose());
            }
        }
        released
    }
}
